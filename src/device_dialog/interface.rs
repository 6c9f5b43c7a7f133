use std::error::Error;
use std::sync::mpsc::Receiver;

/// A two-button question, like an alert dialog with positive and negative
/// buttons.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub title: String,
    pub message: String,
    pub positive: String,
    pub negative: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Answer {
    Positive,
    Negative,
}

/// Shown without waiting for the player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Advisory {
    pub title: Option<String>,
    pub message: String,
}

/// Actions the player can take outside of any prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceDialogEvent {
    Replay,
    Closed,
}

pub trait DeviceDialog {
    /// Blocks until answered. Errors when the prompt is withdrawn (closed,
    /// replaced by a newer prompt, replay requested); the reason for the
    /// withdrawal arrives separately through `events`.
    fn ask(&self, prompt: &Prompt) -> Result<Answer, Box<dyn Error + Send + Sync>>;

    fn notify(&self, advisory: &Advisory) -> Result<(), Box<dyn Error + Send + Sync>>;

    /// Only the first caller gets the receiver.
    fn events(&self) -> Option<Receiver<DeviceDialogEvent>>;
}
