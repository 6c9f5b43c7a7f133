use crate::device_image_source::interface::{DeviceImageSource, Image};
use crate::library::logger::interface::Logger;
use std::path::Path;
use std::process::{Command, Stdio};
use std::sync::Arc;

const OUTPUT_PLACEHOLDER: &str = "{output}";
const PHOTO_FILENAME: &str = "photo.jpg";
const IMAGE_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "gif", "webp"];

/// Still capture through an external camera program, gallery through the
/// native file dialog.
pub struct DeviceImageSourceDesktop {
    capture_command: Vec<String>,
    logger: Arc<dyn Logger + Send + Sync>,
}

impl DeviceImageSourceDesktop {
    pub fn new(capture_command: Vec<String>, logger: Arc<dyn Logger + Send + Sync>) -> Self {
        Self {
            capture_command,
            logger: logger.with_namespace("image_source").with_namespace("desktop"),
        }
    }

    fn capture_into(
        &self,
        output: &Path,
    ) -> Result<Option<Vec<u8>>, Box<dyn std::error::Error + Send + Sync>> {
        let (program, args) = build_capture_command(&self.capture_command, output)?;

        self.logger.info(&format!("Running {} {:?}", program, args))?;

        let status = Command::new(&program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|e| format!("Failed to spawn {program}: {e}"))?;

        if !status.success() {
            self.logger
                .warn(&format!("{} exited with status {}", program, status))?;
            return Ok(None);
        }

        let bytes = std::fs::read(output)?;
        if bytes.is_empty() {
            self.logger.warn("Capture produced an empty file")?;
            return Ok(None);
        }
        Ok(Some(bytes))
    }
}

pub fn build_capture_command(
    template: &[String],
    output: &Path,
) -> Result<(String, Vec<String>), Box<dyn std::error::Error + Send + Sync>> {
    let (program, rest) = template
        .split_first()
        .ok_or("Capture command is empty")?;
    let output = output.to_str().ok_or("Capture path is not valid UTF-8")?;

    let mut args: Vec<String> = rest
        .iter()
        .map(|arg| arg.replace(OUTPUT_PLACEHOLDER, output))
        .collect();
    if !rest.iter().any(|arg| arg.contains(OUTPUT_PLACEHOLDER)) {
        args.push(output.to_string());
    }

    Ok((program.clone(), args))
}

impl DeviceImageSource for DeviceImageSourceDesktop {
    fn request_capture(&self) -> Result<Option<Image>, Box<dyn std::error::Error + Send + Sync>> {
        // Removed when dropped, so no hand-off file outlives the capture.
        let output = tempfile::Builder::new()
            .prefix("whatsit-")
            .suffix(".jpg")
            .tempfile()?;

        let bytes = self.capture_into(output.path())?;
        Ok(bytes.map(|bytes| Image {
            bytes,
            file_name: PHOTO_FILENAME.to_string(),
        }))
    }

    fn request_pick(&self) -> Result<Option<Image>, Box<dyn std::error::Error + Send + Sync>> {
        let picked = rfd::FileDialog::new()
            .set_title("Photo Library")
            .add_filter("Images", &IMAGE_EXTENSIONS)
            .pick_file();

        let Some(path) = picked else {
            self.logger.info("No photo selected")?;
            return Ok(None);
        };

        let bytes = std::fs::read(&path)?;
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or(PHOTO_FILENAME)
            .to_string();

        self.logger
            .info(&format!("Picked {} ({} bytes)", path.display(), bytes.len()))?;
        Ok(Some(Image { bytes, file_name }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::logger::impl_console::LoggerConsole;
    use std::path::PathBuf;

    fn logger() -> Arc<dyn Logger + Send + Sync> {
        Arc::new(LoggerConsole::new(chrono::FixedOffset::east_opt(0).unwrap()))
    }

    fn strings(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|p| p.to_string()).collect()
    }

    #[test]
    fn placeholder_is_substituted() {
        let (program, args) = build_capture_command(
            &strings(&["fswebcam", "--no-banner", "{output}"]),
            &PathBuf::from("/tmp/x.jpg"),
        )
        .unwrap();
        assert_eq!(program, "fswebcam");
        assert_eq!(args, strings(&["--no-banner", "/tmp/x.jpg"]));
    }

    #[test]
    fn output_is_appended_without_placeholder() {
        let (_, args) =
            build_capture_command(&strings(&["imagesnap"]), &PathBuf::from("/tmp/y.jpg")).unwrap();
        assert_eq!(args, strings(&["/tmp/y.jpg"]));
    }

    #[test]
    fn empty_command_is_rejected() {
        assert!(build_capture_command(&[], &PathBuf::from("/tmp/z.jpg")).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn capture_reads_and_removes_output() {
        let source = DeviceImageSourceDesktop::new(
            strings(&["sh", "-c", "printf jpeg > \"$0\"", "{output}"]),
            logger(),
        );
        let image = source.request_capture().unwrap().unwrap();
        assert_eq!(image.bytes, b"jpeg".to_vec());
        assert_eq!(image.file_name, "photo.jpg");
    }

    #[cfg(unix)]
    #[test]
    fn failing_capture_is_no_image() {
        let source = DeviceImageSourceDesktop::new(strings(&["sh", "-c", "exit 3"]), logger());
        assert!(source.request_capture().unwrap().is_none());
    }

    #[cfg(unix)]
    #[test]
    fn capture_writing_nothing_is_no_image() {
        let source = DeviceImageSourceDesktop::new(strings(&["true", "{output}"]), logger());
        assert!(source.request_capture().unwrap().is_none());
    }

    #[test]
    fn missing_program_is_an_error() {
        let source = DeviceImageSourceDesktop::new(
            strings(&["whatsit-no-such-camera-program", "{output}"]),
            logger(),
        );
        assert!(source.request_capture().is_err());
    }
}
