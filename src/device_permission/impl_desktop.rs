use crate::device_permission::interface::{Capability, DevicePermission};
use crate::library::logger::interface::Logger;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Desktop stand-in for runtime permissions: the camera counts as granted when
/// the capture program can be found, storage when a temp file can be created.
pub struct DevicePermissionDesktop {
    capture_program: Option<String>,
    logger: Arc<dyn Logger + Send + Sync>,
}

impl DevicePermissionDesktop {
    pub fn new(capture_command: &[String], logger: Arc<dyn Logger + Send + Sync>) -> Self {
        Self {
            capture_program: capture_command.first().cloned(),
            logger: logger.with_namespace("permission").with_namespace("desktop"),
        }
    }

    fn camera_available(&self) -> bool {
        match &self.capture_program {
            Some(program) => {
                find_program(program, std::env::var_os("PATH").as_deref().map(Path::new))
                    .is_some()
            }
            None => false,
        }
    }

    fn storage_available(&self) -> bool {
        tempfile::tempfile().is_ok()
    }
}

pub fn find_program(program: &str, path_var: Option<&Path>) -> Option<PathBuf> {
    let candidate = Path::new(program);
    if candidate.components().count() > 1 {
        return candidate.is_file().then(|| candidate.to_path_buf());
    }
    let path_var = path_var?;
    std::env::split_paths(path_var.as_os_str())
        .map(|dir| dir.join(program))
        .find(|full| full.is_file())
}

impl DevicePermission for DevicePermissionDesktop {
    fn ensure_granted(
        &self,
        capabilities: &[Capability],
    ) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        let mut granted = true;
        for capability in capabilities {
            let available = match capability {
                Capability::Camera => self.camera_available(),
                Capability::Storage => self.storage_available(),
            };
            if !available {
                self.logger
                    .warn(&format!("{:?} is not available", capability))?;
                granted = false;
            }
        }
        Ok(granted)
    }
}
