use crate::device_connectivity::interface::{DeviceConnectivity, DeviceConnectivityEvent};
use crate::library::logger::interface::Logger;
use std::sync::mpsc::channel;
use std::sync::Arc;

pub struct DeviceConnectivityFake {
    logger: Arc<dyn Logger + Send + Sync>,
    script: Vec<DeviceConnectivityEvent>,
}

impl DeviceConnectivityFake {
    pub fn new(script: Vec<DeviceConnectivityEvent>, logger: Arc<dyn Logger + Send + Sync>) -> Self {
        Self {
            logger: logger.with_namespace("connectivity").with_namespace("fake"),
            script,
        }
    }
}

impl DeviceConnectivity for DeviceConnectivityFake {
    fn events(&self) -> std::sync::mpsc::Receiver<DeviceConnectivityEvent> {
        let (tx, rx) = channel();
        for event in &self.script {
            let _ = self.logger.info(&format!("Emitting {:?}", event));
            let _ = tx.send(*event);
        }
        rx
    }
}
