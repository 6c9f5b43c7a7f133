use chrono::Offset;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_API_KEY: &str = "WHATSIT_API_KEY";
pub const ENV_SERVICE_URL: &str = "WHATSIT_SERVICE_URL";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frontend {
    Gui,
    Console,
}

/// Settings for the Watson Visual Recognition v3 classify call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub service_url: String,
    pub api_key: String,
    pub version_date: String,
    /// Minimum class score, sent with the request and enforced on the response.
    pub threshold: f32,
    pub classifier_ids: Vec<String>,
    /// 0 leaves the request without a timeout.
    pub timeout_secs: u64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            service_url: "https://gateway.watsonplatform.net/visual-recognition/api".to_string(),
            api_key: String::new(),
            version_date: "2018-03-19".to_string(),
            threshold: 0.6,
            classifier_ids: vec!["default".to_string()],
            timeout_secs: 0,
        }
    }
}

impl ClassifierConfig {
    pub fn timeout(&self) -> Option<Duration> {
        match self.timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub frontend: Frontend,
    pub classifier: ClassifierConfig,
    /// Program and arguments for a still capture; `{output}` is replaced with
    /// the JPEG path to write.
    pub capture_command: Vec<String>,
    pub connectivity_probe_addr: String,
    pub connectivity_probe_interval_secs: u64,
    pub logger_utc_offset_hours: i32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            frontend: Frontend::Gui,
            classifier: ClassifierConfig::default(),
            capture_command: vec![
                "fswebcam".to_string(),
                "--no-banner".to_string(),
                "-r".to_string(),
                "640x480".to_string(),
                "{output}".to_string(),
            ],
            connectivity_probe_addr: "8.8.8.8:53".to_string(),
            connectivity_probe_interval_secs: 5,
            logger_utc_offset_hours: 0,
        }
    }
}

impl Config {
    /// ~/.config/whatsit/config.json
    pub fn default_path() -> PathBuf {
        let mut p = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        p.push("whatsit");
        p.push("config.json");
        p
    }

    /// Load from disk, falling back to defaults when the file is missing.
    /// A file that exists but does not parse is an error.
    pub fn load(path: &Path) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let config = match fs::read_to_string(path) {
            Ok(data) => serde_json::from_str(&data)
                .map_err(|e| format!("Invalid config {}: {e}", path.display()))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(e) => return Err(e.into()),
        };
        Ok(config.with_env_overrides(|key| std::env::var(key).ok()))
    }

    pub fn with_env_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(api_key) = lookup(ENV_API_KEY).filter(|v| !v.is_empty()) {
            self.classifier.api_key = api_key;
        }
        if let Some(url) = lookup(ENV_SERVICE_URL).filter(|v| !v.is_empty()) {
            self.classifier.service_url = url;
        }
        self
    }

    pub fn logger_timezone(&self) -> chrono::FixedOffset {
        chrono::FixedOffset::east_opt(self.logger_utc_offset_hours * 3600)
            .unwrap_or_else(|| chrono::Utc.fix())
    }

    pub fn connectivity_probe_interval(&self) -> Duration {
        Duration::from_secs(self.connectivity_probe_interval_secs.max(1))
    }
}
