use crate::device_image_source::interface::{DeviceImageSource, Image};
use crate::library::logger::interface::Logger;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub struct DeviceImageSourceFake {
    logger: Arc<dyn Logger + Send + Sync>,
    gallery_empty: AtomicBool,
}

impl DeviceImageSourceFake {
    pub fn new(logger: Arc<dyn Logger + Send + Sync>) -> Self {
        Self {
            logger: logger.with_namespace("image_source").with_namespace("fake"),
            gallery_empty: AtomicBool::new(false),
        }
    }

    #[allow(dead_code)]
    pub fn set_gallery_empty(&self, empty: bool) {
        self.gallery_empty.store(empty, Ordering::SeqCst);
    }

    fn image(file_name: &str) -> Image {
        Image {
            bytes: vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0xFF, 0xD9],
            file_name: file_name.to_string(),
        }
    }
}

impl DeviceImageSource for DeviceImageSourceFake {
    fn request_capture(&self) -> Result<Option<Image>, Box<dyn std::error::Error + Send + Sync>> {
        self.logger.info("Capturing photo...")?;
        Ok(Some(Self::image("photo.jpg")))
    }

    fn request_pick(&self) -> Result<Option<Image>, Box<dyn std::error::Error + Send + Sync>> {
        if self.gallery_empty.load(Ordering::SeqCst) {
            self.logger.info("Gallery pick cancelled")?;
            return Ok(None);
        }
        self.logger.info("Picking photo...")?;
        Ok(Some(Self::image("gallery.jpg")))
    }
}
