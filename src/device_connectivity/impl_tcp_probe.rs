use crate::device_connectivity::interface::{DeviceConnectivity, DeviceConnectivityEvent};
use crate::library::logger::interface::Logger;
use std::net::{TcpStream, ToSocketAddrs};
use std::sync::mpsc::{channel, Receiver};
use std::sync::Arc;
use std::time::Duration;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(3);

/// Polls a TCP connect to a well-known address and reports flips.
pub struct DeviceConnectivityTcpProbe {
    probe_addr: String,
    interval: Duration,
    logger: Arc<dyn Logger + Send + Sync>,
}

impl DeviceConnectivityTcpProbe {
    pub fn new(probe_addr: String, interval: Duration, logger: Arc<dyn Logger + Send + Sync>) -> Self {
        Self {
            probe_addr,
            interval,
            logger: logger.with_namespace("connectivity").with_namespace("tcp_probe"),
        }
    }
}

pub fn probe(addr: &str, timeout: Duration) -> bool {
    let Ok(addrs) = addr.to_socket_addrs() else {
        return false;
    };
    addrs
        .into_iter()
        .any(|socket_addr| TcpStream::connect_timeout(&socket_addr, timeout).is_ok())
}

/// `None` while the status is unchanged.
pub fn status_change(previous: Option<bool>, connected: bool) -> Option<DeviceConnectivityEvent> {
    if previous == Some(connected) {
        return None;
    }
    Some(if connected {
        DeviceConnectivityEvent::Connected
    } else {
        DeviceConnectivityEvent::Disconnected
    })
}

impl DeviceConnectivity for DeviceConnectivityTcpProbe {
    fn events(&self) -> Receiver<DeviceConnectivityEvent> {
        let (tx, rx) = channel();
        let probe_addr = self.probe_addr.clone();
        let interval = self.interval;
        let logger = self.logger.clone();

        std::thread::spawn(move || {
            let mut previous = None;
            loop {
                let connected = probe(&probe_addr, CONNECT_TIMEOUT);
                if let Some(event) = status_change(previous, connected) {
                    let _ = logger.info(&format!("{} is now {:?}", probe_addr, event));
                    if tx.send(event).is_err() {
                        break;
                    }
                }
                previous = Some(connected);
                std::thread::sleep(interval);
            }
        });

        rx
    }
}
