use crate::device_permission::interface::{Capability, DevicePermission};
use crate::library::logger::interface::Logger;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub struct DevicePermissionFake {
    granted: AtomicBool,
    logger: Arc<dyn Logger + Send + Sync>,
}

impl DevicePermissionFake {
    pub fn new(granted: bool, logger: Arc<dyn Logger + Send + Sync>) -> Self {
        Self {
            granted: AtomicBool::new(granted),
            logger: logger.with_namespace("permission").with_namespace("fake"),
        }
    }

    #[allow(dead_code)]
    pub fn set_granted(&self, granted: bool) {
        self.granted.store(granted, Ordering::SeqCst);
    }
}

impl DevicePermission for DevicePermissionFake {
    fn ensure_granted(
        &self,
        capabilities: &[Capability],
    ) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        let granted = self.granted.load(Ordering::SeqCst);
        self.logger
            .info(&format!("{:?} granted={}", capabilities, granted))?;
        Ok(granted)
    }
}
