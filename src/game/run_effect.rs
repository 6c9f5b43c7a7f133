use crate::device_connectivity::interface::DeviceConnectivity;
use crate::device_dialog::interface::{Answer, DeviceDialog};
use crate::device_image_source::interface::{DeviceImageSource, Image};
use crate::device_permission::interface::{DevicePermission, REQUIRED_CAPABILITIES};
use crate::game::core::{Dialog, Effect, Event};
use crate::game::render::{render_dialog, render_notice};
use crate::image_classifier::interface::ImageClassifier;
use crate::library::logger::interface::Logger;
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

#[derive(Clone)]
pub struct RunEffect {
    logger: Arc<dyn Logger + Send + Sync>,
    device_image_source: Arc<dyn DeviceImageSource + Send + Sync>,
    device_permission: Arc<dyn DevicePermission + Send + Sync>,
    device_connectivity: Arc<dyn DeviceConnectivity + Send + Sync>,
    device_dialog: Arc<dyn DeviceDialog + Send + Sync>,
    image_classifier: Arc<dyn ImageClassifier + Send + Sync>,
    runtime: Handle,
    classification: Arc<Mutex<Option<JoinHandle<()>>>>,
    event_sender: Sender<Event>,
}

impl RunEffect {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        logger: Arc<dyn Logger + Send + Sync>,
        device_image_source: Arc<dyn DeviceImageSource + Send + Sync>,
        device_permission: Arc<dyn DevicePermission + Send + Sync>,
        device_connectivity: Arc<dyn DeviceConnectivity + Send + Sync>,
        device_dialog: Arc<dyn DeviceDialog + Send + Sync>,
        image_classifier: Arc<dyn ImageClassifier + Send + Sync>,
        runtime: Handle,
        event_sender: Sender<Event>,
    ) -> Self {
        Self {
            logger,
            device_image_source,
            device_permission,
            device_connectivity,
            device_dialog,
            image_classifier,
            runtime,
            classification: Arc::new(Mutex::new(None)),
            event_sender,
        }
    }

    /// Effects that only hand work off; run on the loop thread.
    pub fn is_immediate(effect: &Effect) -> bool {
        matches!(
            effect,
            Effect::ShowNotice(_)
                | Effect::Classify { .. }
                | Effect::CancelClassification
                | Effect::Exit
        )
    }

    pub fn cancel_classification(&self) {
        let previous = self
            .classification
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(task) = previous {
            if !task.is_finished() {
                let _ = self.logger.info("Cancelling classification in flight");
            }
            task.abort();
        }
    }

    pub fn run_effect(&self, effect: Effect) {
        let _ = self.logger.info(&format!("Running effect: {:?}", effect));

        match effect {
            Effect::SubscribeToConnectivity => {
                let events = self.device_connectivity.events();
                while let Ok(event) = events.recv() {
                    if self.event_sender.send(Event::ConnectivityEvent(event)).is_err() {
                        break;
                    }
                }
            }
            Effect::SubscribeToDialogEvents => {
                let Some(events) = self.device_dialog.events() else {
                    let _ = self.logger.warn("Dialog events already taken");
                    return;
                };
                while let Ok(event) = events.recv() {
                    if self.event_sender.send(Event::DialogEvent(event)).is_err() {
                        break;
                    }
                }
            }
            Effect::RequestPermission => {
                let granted = self.device_permission.ensure_granted(&REQUIRED_CAPABILITIES);
                let _ = self.event_sender.send(Event::PermissionDone(granted));
            }
            Effect::ShowDialog(dialog) => {
                let prompt = render_dialog(&dialog, &mut rand::rng());
                match self.device_dialog.ask(&prompt) {
                    Ok(answer) => {
                        let _ = self.event_sender.send(answered(&dialog, answer));
                    }
                    Err(e) => {
                        let _ = self
                            .logger
                            .info(&format!("{:?} dialog withdrawn: {}", dialog, e));
                    }
                }
            }
            Effect::ShowNotice(notice) => {
                if let Err(e) = self.device_dialog.notify(&render_notice(notice)) {
                    let _ = self.logger.warn(&format!("Could not show {:?}: {}", notice, e));
                }
            }
            Effect::Capture { request } => {
                let image = self.device_image_source.request_capture();
                self.send_image(request, image);
            }
            Effect::Pick { request } => {
                let image = self.device_image_source.request_pick();
                self.send_image(request, image);
            }
            Effect::Classify { image, round } => {
                let classifier = self.image_classifier.clone();
                let event_sender = self.event_sender.clone();
                let task = self.runtime.spawn(async move {
                    let result = classifier.classify(&image).await;
                    let _ = event_sender.send(Event::ClassifyDone { round, result });
                });

                let previous = self
                    .classification
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .replace(task);
                if let Some(previous) = previous {
                    previous.abort();
                }
            }
            Effect::CancelClassification => self.cancel_classification(),
            Effect::Exit => {}
        }
    }

    fn send_image(
        &self,
        request: u64,
        result: Result<Option<Image>, Box<dyn std::error::Error + Send + Sync>>,
    ) {
        if let Err(e) = &result {
            let _ = self.logger.error(&format!("Image source failed: {}", e));
        }
        let _ = self.event_sender.send(Event::ImageDone { request, result });
    }
}

fn answered(dialog: &Dialog, answer: Answer) -> Event {
    match dialog {
        Dialog::Start => Event::StartAnswered(answer),
        Dialog::SourceChoice => Event::SourceAnswered(answer),
        Dialog::Guess { .. } => Event::GuessAnswered(answer),
        Dialog::Results { .. } => Event::ResultsAnswered(answer),
        Dialog::ClassificationFailed { .. } => Event::FailureAnswered(answer),
    }
}
