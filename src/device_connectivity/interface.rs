#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceConnectivityEvent {
    Connected,
    Disconnected,
}

pub trait DeviceConnectivity {
    /// Emits the current status first, then only on change.
    fn events(&self) -> std::sync::mpsc::Receiver<DeviceConnectivityEvent>;
}
