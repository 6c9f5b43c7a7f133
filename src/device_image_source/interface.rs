use std::fmt;

#[derive(Clone, PartialEq)]
pub struct Image {
    pub bytes: Vec<u8>,
    pub file_name: String,
}

impl fmt::Debug for Image {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Image")
            .field("file_name", &self.file_name)
            .field("len", &self.bytes.len())
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSourceKind {
    Camera,
    Gallery,
}

/// `Ok(None)` means the player backed out or nothing was produced.
pub trait DeviceImageSource {
    fn request_capture(&self) -> Result<Option<Image>, Box<dyn std::error::Error + Send + Sync>>;
    fn request_pick(&self) -> Result<Option<Image>, Box<dyn std::error::Error + Send + Sync>>;
}
