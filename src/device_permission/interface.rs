#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Camera,
    Storage,
}

pub const REQUIRED_CAPABILITIES: [Capability; 2] = [Capability::Camera, Capability::Storage];

pub trait DevicePermission {
    /// True only when every capability is available.
    fn ensure_granted(
        &self,
        capabilities: &[Capability],
    ) -> Result<bool, Box<dyn std::error::Error + Send + Sync>>;
}
