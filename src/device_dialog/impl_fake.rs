use crate::device_dialog::interface::{Advisory, Answer, DeviceDialog, DeviceDialogEvent, Prompt};
use crate::library::logger::interface::Logger;
use std::collections::VecDeque;
use std::error::Error;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Mutex, PoisonError};

/// Answers prompts from a script and closes itself once the script runs out.
pub struct DeviceDialogFake {
    logger: Arc<dyn Logger + Send + Sync>,
    script: Mutex<VecDeque<Answer>>,
    prompts: Mutex<Vec<Prompt>>,
    advisories: Mutex<Vec<Advisory>>,
    event_sender: Sender<DeviceDialogEvent>,
    event_receiver: Mutex<Option<Receiver<DeviceDialogEvent>>>,
}

impl DeviceDialogFake {
    pub fn new(script: Vec<Answer>, logger: Arc<dyn Logger + Send + Sync>) -> Self {
        let (event_sender, event_receiver) = channel();
        Self {
            logger: logger.with_namespace("dialog").with_namespace("fake"),
            script: Mutex::new(script.into()),
            prompts: Mutex::new(vec![]),
            advisories: Mutex::new(vec![]),
            event_sender,
            event_receiver: Mutex::new(Some(event_receiver)),
        }
    }

    pub fn prompts(&self) -> Vec<Prompt> {
        self.prompts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn advisories(&self) -> Vec<Advisory> {
        self.advisories
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl DeviceDialog for DeviceDialogFake {
    fn ask(&self, prompt: &Prompt) -> Result<Answer, Box<dyn Error + Send + Sync>> {
        self.logger.info(&format!("ask {:?}", prompt))?;
        self.prompts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(prompt.clone());

        let next = self
            .script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();

        match next {
            Some(answer) => {
                self.logger.info(&format!("answer {:?}", answer))?;
                Ok(answer)
            }
            None => {
                self.logger.info("script exhausted, closing")?;
                let _ = self.event_sender.send(DeviceDialogEvent::Closed);
                Err("Dialog closed".into())
            }
        }
    }

    fn notify(&self, advisory: &Advisory) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.logger.info(&format!("notify {:?}", advisory))?;
        self.advisories
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(advisory.clone());
        Ok(())
    }

    fn events(&self) -> Option<Receiver<DeviceDialogEvent>> {
        self.event_receiver
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}
