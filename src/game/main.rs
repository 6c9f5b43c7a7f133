use crate::device_connectivity::interface::DeviceConnectivity;
use crate::device_dialog::interface::DeviceDialog;
use crate::device_image_source::interface::DeviceImageSource;
use crate::device_permission::interface::DevicePermission;
use crate::game::core::{init, transition, Effect, Event, Model, Score};
use crate::game::run_effect::RunEffect;
use crate::image_classifier::interface::ImageClassifier;
use crate::library::logger::interface::Logger;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use tokio::runtime::Runtime;

/// One play session. Owns the score and every piece of background work;
/// dropping it cancels the classification in flight.
pub struct Game {
    logger: Arc<dyn Logger + Send + Sync>,
    run_effect: RunEffect,
    event_sender: Sender<Event>,
    event_receiver: Receiver<Event>,
    runtime: Option<Runtime>,
}

impl Game {
    pub fn new(
        logger: Arc<dyn Logger + Send + Sync>,
        device_image_source: Arc<dyn DeviceImageSource + Send + Sync>,
        device_permission: Arc<dyn DevicePermission + Send + Sync>,
        device_connectivity: Arc<dyn DeviceConnectivity + Send + Sync>,
        device_dialog: Arc<dyn DeviceDialog + Send + Sync>,
        image_classifier: Arc<dyn ImageClassifier + Send + Sync>,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("whatsit-classify")
            .enable_all()
            .build()?;
        let (event_sender, event_receiver) = channel();
        let logger = logger.with_namespace("game");

        let run_effect = RunEffect::new(
            logger.clone(),
            device_image_source,
            device_permission,
            device_connectivity,
            device_dialog,
            image_classifier,
            runtime.handle().clone(),
            event_sender.clone(),
        );

        Ok(Self {
            logger,
            run_effect,
            event_sender,
            event_receiver,
            runtime: Some(runtime),
        })
    }

    pub fn event_sender(&self) -> Sender<Event> {
        self.event_sender.clone()
    }

    /// Returns true once `Exit` has been seen.
    fn spawn_effects(&self, effects: Vec<Effect>) -> bool {
        let mut exit = false;
        for effect in effects {
            if effect == Effect::Exit {
                exit = true;
            }
            if RunEffect::is_immediate(&effect) {
                self.run_effect.run_effect(effect);
            } else {
                let run_effect = self.run_effect.clone();
                std::thread::spawn(move || run_effect.run_effect(effect));
            }
        }
        exit
    }

    /// Drives the session until the player stops or the front end closes.
    pub fn run(&self) -> Result<Score, Box<dyn std::error::Error + Send + Sync>> {
        let (mut model, effects) = init();
        let _ = self.logger.info(&format!("\ninit model:\n\t{:?}", model));

        if self.spawn_effects(effects) {
            return Ok(model.score);
        }

        loop {
            let event = self.event_receiver.recv()?;

            let _ = self.logger.info(&format!(
                "\nold model:\n\t{:?}\n\nevent:\n\t{:?}",
                model, event,
            ));
            let (new_model, effects) = transition(model, event);
            let _ = self.logger.info(&format!(
                "\nnew model:\n\t{:?}\n\neffects:\n\t{:?}",
                new_model, effects
            ));
            model = new_model;

            if self.spawn_effects(effects) {
                break;
            }
        }

        self.log_final(&model);
        Ok(model.score)
    }

    fn log_final(&self, model: &Model) {
        let _ = self.logger.info(&format!(
            "Session over after {} rounds: {} right, {} wrong",
            model.score.rounds(),
            model.score.right,
            model.score.wrong
        ));
    }
}

impl Drop for Game {
    fn drop(&mut self) {
        self.run_effect.cancel_classification();
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}
