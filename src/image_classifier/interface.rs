use crate::device_image_source::interface::Image;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub label: String,
    pub score: f32,
}

/// Carried inside game events, so every variant owns plain data.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClassifyError {
    #[error("No API key configured for the classification service")]
    MissingApiKey,
    #[error("Could not reach the classification service: {0}")]
    Transport(String),
    #[error("Classification service answered {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Unexpected response from the classification service: {0}")]
    MalformedResponse(String),
    #[error("The service could not classify the image: {0}")]
    Image(String),
    #[error("Nothing recognised with a score of at least {threshold}")]
    NoConfidentLabel { threshold: f32 },
}

#[async_trait]
pub trait ImageClassifier {
    /// Top label for the image, never below the configured threshold.
    async fn classify(&self, image: &Image) -> Result<Classification, ClassifyError>;
}
