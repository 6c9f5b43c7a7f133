use crate::config::ClassifierConfig;
use crate::device_image_source::interface::Image;
use crate::image_classifier::interface::{Classification, ClassifyError, ImageClassifier};
use crate::library::logger::interface::Logger;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::sync::Arc;

const CLASSIFY_PATH: &str = "/v3/classify";
const API_KEY_USER: &str = "apikey";

// Watson Visual Recognition v3 response types. Only the fields used for the
// top label are declared.

#[derive(Debug, Deserialize)]
struct ClassifiedImages {
    #[serde(default)]
    images: Vec<ClassifiedImage>,
}

#[derive(Debug, Deserialize)]
struct ClassifiedImage {
    #[serde(default)]
    classifiers: Vec<ClassifierResult>,
    error: Option<ErrorInfo>,
}

#[derive(Debug, Deserialize)]
struct ClassifierResult {
    #[serde(default)]
    classes: Vec<ClassResult>,
}

#[derive(Debug, Deserialize)]
struct ClassResult {
    class: String,
    score: f32,
}

#[derive(Debug, Deserialize)]
struct ErrorInfo {
    description: String,
}

pub struct ImageClassifierWatson {
    config: ClassifierConfig,
    client: reqwest::Client,
    logger: Arc<dyn Logger + Send + Sync>,
}

impl ImageClassifierWatson {
    pub fn new(
        config: ClassifierConfig,
        logger: Arc<dyn Logger + Send + Sync>,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            config,
            client: builder.build()?,
            logger: logger
                .with_namespace("image_classifier")
                .with_namespace("watson"),
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}{}",
            self.config.service_url.trim_end_matches('/'),
            CLASSIFY_PATH
        )
    }

    fn form(&self, image: &Image) -> Result<Form, ClassifyError> {
        let part = Part::bytes(image.bytes.clone())
            .file_name(image.file_name.clone())
            .mime_str(mime_type(&image.file_name))
            .map_err(|e| ClassifyError::Transport(e.to_string()))?;

        Ok(Form::new()
            .part("images_file", part)
            .text("threshold", self.config.threshold.to_string())
            .text("classifier_ids", self.config.classifier_ids.join(",")))
    }
}

pub fn mime_type(file_name: &str) -> &'static str {
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => "image/jpeg",
    }
}

/// Highest-scoring class of the first classifier of the first image. The
/// service already filters by threshold; it is checked again here so a
/// lenient endpoint cannot surface a weak guess.
pub fn top_label(body: &str, threshold: f32) -> Result<Classification, ClassifyError> {
    let response: ClassifiedImages =
        serde_json::from_str(body).map_err(|e| ClassifyError::MalformedResponse(e.to_string()))?;

    let image = response
        .images
        .into_iter()
        .next()
        .ok_or_else(|| ClassifyError::MalformedResponse("no images in response".to_string()))?;

    if let Some(error) = image.error {
        return Err(ClassifyError::Image(error.description));
    }

    let classifier = image.classifiers.into_iter().next().ok_or_else(|| {
        ClassifyError::MalformedResponse("no classifiers in response".to_string())
    })?;

    classifier
        .classes
        .into_iter()
        .filter(|class| class.score >= threshold)
        .max_by(|a, b| a.score.total_cmp(&b.score))
        .map(|class| Classification {
            label: class.class,
            score: class.score,
        })
        .ok_or(ClassifyError::NoConfidentLabel { threshold })
}

#[async_trait]
impl ImageClassifier for ImageClassifierWatson {
    async fn classify(&self, image: &Image) -> Result<Classification, ClassifyError> {
        if self.config.api_key.is_empty() {
            return Err(ClassifyError::MissingApiKey);
        }

        let _ = self.logger.info(&format!(
            "POST {} {:?} threshold={}",
            self.endpoint(),
            image,
            self.config.threshold
        ));

        let response = self
            .client
            .post(self.endpoint())
            .query(&[("version", self.config.version_date.as_str())])
            .basic_auth(API_KEY_USER, Some(&self.config.api_key))
            .multipart(self.form(image)?)
            .send()
            .await
            .map_err(|e| ClassifyError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ClassifyError::Transport(e.to_string()))?;

        if !status.is_success() {
            let _ = self
                .logger
                .warn(&format!("Classify failed with {}: {}", status, body));
            return Err(ClassifyError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let classification = top_label(&body, self.config.threshold)?;
        let _ = self.logger.info(&format!(
            "Top label {} ({:.3})",
            classification.label, classification.score
        ));
        Ok(classification)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::logger::impl_console::LoggerConsole;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread::JoinHandle;

    const RESPONSE: &str = r#"{
        "custom_classes": 0,
        "images": [{
            "classifiers": [{
                "classifier_id": "default",
                "name": "default",
                "classes": [
                    {"class": "animal", "score": 0.88, "type_hierarchy": "/animal"},
                    {"class": "beagle", "score": 0.93},
                    {"class": "dog", "score": 0.61}
                ]
            }],
            "image": "photo.jpg"
        }],
        "images_processed": 1
    }"#;

    #[test]
    fn picks_highest_scoring_class() {
        let classification = top_label(RESPONSE, 0.6).unwrap();
        assert_eq!(classification.label, "beagle");
        assert_eq!(classification.score, 0.93);
    }

    #[test]
    fn class_below_threshold_is_not_a_guess() {
        let body = r#"{"images": [{"classifiers": [{"classes": [
            {"class": "cloud", "score": 0.59}
        ]}]}]}"#;
        assert_eq!(
            top_label(body, 0.6),
            Err(ClassifyError::NoConfidentLabel { threshold: 0.6 })
        );
    }

    #[test]
    fn score_at_threshold_is_accepted() {
        let body = r#"{"images": [{"classifiers": [{"classes": [
            {"class": "cloud", "score": 0.6}
        ]}]}]}"#;
        assert_eq!(top_label(body, 0.6).unwrap().label, "cloud");
    }

    #[test]
    fn empty_classes_is_no_confident_label() {
        let body = r#"{"images": [{"classifiers": [{"classes": []}]}]}"#;
        assert!(matches!(
            top_label(body, 0.6),
            Err(ClassifyError::NoConfidentLabel { .. })
        ));
    }

    #[test]
    fn image_error_is_reported() {
        let body = r#"{"images": [{"classifiers": [], "error": {
            "code": 400, "description": "Image size limit exceeded", "error_id": "input_error"
        }}]}"#;
        assert_eq!(
            top_label(body, 0.6),
            Err(ClassifyError::Image("Image size limit exceeded".to_string()))
        );
    }

    #[test]
    fn malformed_bodies_are_rejected() {
        assert!(matches!(
            top_label("<html>", 0.6),
            Err(ClassifyError::MalformedResponse(_))
        ));
        assert!(matches!(
            top_label(r#"{"images": []}"#, 0.6),
            Err(ClassifyError::MalformedResponse(_))
        ));
        assert!(matches!(
            top_label(r#"{"images": [{"classifiers": []}]}"#, 0.6),
            Err(ClassifyError::MalformedResponse(_))
        ));
    }

    #[test]
    fn mime_type_follows_extension() {
        assert_eq!(mime_type("photo.jpg"), "image/jpeg");
        assert_eq!(mime_type("scan.PNG"), "image/png");
        assert_eq!(mime_type("noextension"), "image/jpeg");
    }

    #[tokio::test]
    async fn missing_api_key_fails_without_a_request() {
        let logger = Arc::new(LoggerConsole::new(chrono::FixedOffset::east_opt(0).unwrap()));
        let classifier = ImageClassifierWatson::new(ClassifierConfig::default(), logger).unwrap();
        let image = Image {
            bytes: vec![0xFF, 0xD8],
            file_name: "photo.jpg".to_string(),
        };
        assert_eq!(
            classifier.classify(&image).await,
            Err(ClassifyError::MissingApiKey)
        );
    }

    /// Serves one HTTP response on a local port and hands back the raw request.
    fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());

        let server = std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = Vec::new();
            let mut chunk = [0u8; 4096];
            loop {
                let n = stream.read(&mut chunk).unwrap();
                request.extend_from_slice(&chunk[..n]);
                if n == 0 || request_complete(&request) {
                    break;
                }
            }
            write!(
                stream,
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            )
            .unwrap();
            String::from_utf8_lossy(&request).into_owned()
        });

        (url, server)
    }

    fn request_complete(request: &[u8]) -> bool {
        let text = String::from_utf8_lossy(request);
        let Some((head, body)) = text.split_once("\r\n\r\n") else {
            return false;
        };
        let content_length = head.lines().find_map(|line| {
            let (name, value) = line.split_once(':')?;
            name.eq_ignore_ascii_case("content-length")
                .then(|| value.trim().parse::<usize>().ok())
                .flatten()
        });
        match content_length {
            Some(length) => body.len() >= length,
            None => body.ends_with("0\r\n\r\n"),
        }
    }

    fn header<'a>(request: &'a str, name: &str) -> Option<&'a str> {
        request.lines().find_map(|line| {
            let (key, value) = line.split_once(':')?;
            key.eq_ignore_ascii_case(name).then(|| value.trim())
        })
    }

    fn classifier_for(url: String) -> ImageClassifierWatson {
        let logger = Arc::new(LoggerConsole::new(chrono::FixedOffset::east_opt(0).unwrap()));
        let config = ClassifierConfig {
            service_url: url,
            api_key: "secret".to_string(),
            ..ClassifierConfig::default()
        };
        ImageClassifierWatson::new(config, logger).unwrap()
    }

    #[tokio::test]
    async fn classify_sends_version_auth_threshold_and_classifier_ids() {
        let (url, server) = serve_once("200 OK", RESPONSE);
        let image = Image {
            bytes: vec![0xFF, 0xD8, 0xFF, 0xD9],
            file_name: "photo.jpg".to_string(),
        };

        let classification = classifier_for(url).classify(&image).await.unwrap();
        let request = server.join().unwrap();

        assert_eq!(classification.label, "beagle");
        assert!(request.starts_with("POST /v3/classify?version=2018-03-19 HTTP/1.1\r\n"));
        assert_eq!(
            header(&request, "authorization"),
            Some("Basic YXBpa2V5OnNlY3JldA==")
        );
        assert!(header(&request, "content-type")
            .unwrap()
            .starts_with("multipart/form-data; boundary="));
        assert!(request.contains("name=\"threshold\"\r\n\r\n0.6\r\n"));
        assert!(request.contains("name=\"classifier_ids\"\r\n\r\ndefault\r\n"));
        assert!(request.contains("name=\"images_file\"; filename=\"photo.jpg\""));
        assert!(request.contains("Content-Type: image/jpeg"));
    }

    #[tokio::test]
    async fn classify_reports_error_status_with_body() {
        let (url, server) = serve_once("401 Unauthorized", r#"{"error": "bad key"}"#);
        let image = Image {
            bytes: vec![0xFF, 0xD8],
            file_name: "photo.jpg".to_string(),
        };

        let result = classifier_for(url).classify(&image).await;
        server.join().unwrap();

        assert_eq!(
            result,
            Err(ClassifyError::Status {
                status: 401,
                body: r#"{"error": "bad key"}"#.to_string(),
            })
        );
    }

    #[test]
    fn endpoint_ignores_trailing_slash() {
        let logger = Arc::new(LoggerConsole::new(chrono::FixedOffset::east_opt(0).unwrap()));
        let config = ClassifierConfig {
            service_url: "http://localhost:9000/api/".to_string(),
            ..ClassifierConfig::default()
        };
        let classifier = ImageClassifierWatson::new(config, logger).unwrap();
        assert_eq!(classifier.endpoint(), "http://localhost:9000/api/v3/classify");
    }
}
