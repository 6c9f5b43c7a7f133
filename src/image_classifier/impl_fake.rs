use crate::device_image_source::interface::Image;
use crate::image_classifier::interface::{Classification, ClassifyError, ImageClassifier};
use crate::library::logger::interface::Logger;
use async_trait::async_trait;
use rand::distr::{Distribution, Uniform};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

const OBJECTS: [&str; 18] = [
    "dog", "cat", "person", "car", "chair", "table", "bird", "tree", "bicycle", "book", "laptop",
    "phone", "cup", "bottle", "keyboard", "mouse", "plant", "clock",
];

/// Answers from a script when one is queued, otherwise with a random object.
pub struct ImageClassifierFake {
    logger: Arc<dyn Logger + Send + Sync>,
    threshold: f32,
    scripted: Mutex<VecDeque<Result<Classification, ClassifyError>>>,
}

impl ImageClassifierFake {
    pub fn new(threshold: f32, logger: Arc<dyn Logger + Send + Sync>) -> Self {
        Self {
            logger: logger.with_namespace("image_classifier").with_namespace("fake"),
            threshold,
            scripted: Mutex::new(VecDeque::new()),
        }
    }

    #[allow(dead_code)]
    pub fn push_result(&self, result: Result<Classification, ClassifyError>) {
        self.scripted
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(result);
    }

    fn random_classification(&self) -> Result<Classification, ClassifyError> {
        let mut rng = rand::rng();

        let index_dist = Uniform::new(0, OBJECTS.len())
            .map_err(|e| ClassifyError::MalformedResponse(e.to_string()))?;
        let score_dist = Uniform::new_inclusive(self.threshold, 1.0)
            .map_err(|e| ClassifyError::MalformedResponse(e.to_string()))?;

        Ok(Classification {
            label: OBJECTS[index_dist.sample(&mut rng)].to_string(),
            score: score_dist.sample(&mut rng),
        })
    }
}

#[async_trait]
impl ImageClassifier for ImageClassifierFake {
    async fn classify(&self, image: &Image) -> Result<Classification, ClassifyError> {
        let _ = self.logger.info(&format!("Classifying {:?}", image));

        let scripted = self
            .scripted
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();

        let result = match scripted {
            Some(result) => result,
            None => self.random_classification(),
        };

        let _ = self.logger.info(&format!("Result {:?}", result));
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::logger::impl_console::LoggerConsole;

    fn fixture() -> ImageClassifierFake {
        let logger = Arc::new(LoggerConsole::new(chrono::FixedOffset::east_opt(0).unwrap()));
        ImageClassifierFake::new(0.6, logger)
    }

    fn image() -> Image {
        Image {
            bytes: vec![1, 2, 3],
            file_name: "photo.jpg".to_string(),
        }
    }

    #[tokio::test]
    async fn random_result_respects_threshold() {
        let classifier = fixture();
        for _ in 0..20 {
            let classification = classifier.classify(&image()).await.unwrap();
            assert!(classification.score >= 0.6);
            assert!(OBJECTS.contains(&classification.label.as_str()));
        }
    }

    #[tokio::test]
    async fn scripted_results_come_first_in_order() {
        let classifier = fixture();
        classifier.push_result(Err(ClassifyError::Transport("offline".to_string())));
        classifier.push_result(Ok(Classification {
            label: "teapot".to_string(),
            score: 0.9,
        }));

        assert_eq!(
            classifier.classify(&image()).await,
            Err(ClassifyError::Transport("offline".to_string()))
        );
        assert_eq!(
            classifier.classify(&image()).await.unwrap().label,
            "teapot".to_string()
        );
    }
}
