use crate::device_connectivity::{
    impl_fake::DeviceConnectivityFake,
    interface::{DeviceConnectivity, DeviceConnectivityEvent},
};
use crate::device_dialog::{impl_fake::DeviceDialogFake, interface::Answer};
use crate::device_image_source::impl_fake::DeviceImageSourceFake;
use crate::device_permission::impl_fake::DevicePermissionFake;
use crate::game::main::Game;
use crate::image_classifier::impl_fake::ImageClassifierFake;
use crate::library::logger::{impl_console::LoggerConsole, interface::Logger};
use std::sync::Arc;

pub struct Fixture {
    pub logger: Arc<dyn Logger + Send + Sync>,
    pub device_image_source: Arc<DeviceImageSourceFake>,
    pub device_permission: Arc<DevicePermissionFake>,
    pub device_connectivity: Arc<dyn DeviceConnectivity + Send + Sync>,
    pub device_dialog: Arc<DeviceDialogFake>,
    pub image_classifier: Arc<ImageClassifierFake>,
}

impl Fixture {
    pub fn new(script: Vec<Answer>) -> Self {
        Self::with_connectivity(script, vec![DeviceConnectivityEvent::Connected])
    }

    pub fn with_connectivity(script: Vec<Answer>, connectivity: Vec<DeviceConnectivityEvent>) -> Self {
        let logger: Arc<dyn Logger + Send + Sync> =
            Arc::new(LoggerConsole::new(chrono::FixedOffset::east_opt(0).unwrap()));

        Self {
            device_image_source: Arc::new(DeviceImageSourceFake::new(logger.clone())),
            device_permission: Arc::new(DevicePermissionFake::new(true, logger.clone())),
            device_connectivity: Arc::new(DeviceConnectivityFake::new(connectivity, logger.clone())),
            device_dialog: Arc::new(DeviceDialogFake::new(script, logger.clone())),
            image_classifier: Arc::new(ImageClassifierFake::new(0.6, logger.clone())),
            logger,
        }
    }

    pub fn game(&self) -> Game {
        Game::new(
            self.logger.clone(),
            self.device_image_source.clone(),
            self.device_permission.clone(),
            self.device_connectivity.clone(),
            self.device_dialog.clone(),
            self.image_classifier.clone(),
        )
        .unwrap()
    }

    pub fn prompt_messages(&self) -> Vec<String> {
        self.device_dialog
            .prompts()
            .into_iter()
            .map(|prompt| prompt.message)
            .collect()
    }

    pub fn advisory_messages(&self) -> Vec<String> {
        self.device_dialog
            .advisories()
            .into_iter()
            .map(|advisory| advisory.message)
            .collect()
    }
}
