use std::env;
use std::path::PathBuf;
use std::time::Duration;

use relief_ml::{ClassifierSettings, RemoteSettings, DEFAULT_REMOTE_ENDPOINT};

const DEFAULT_BIND: &str = "0.0.0.0:5000";
const DEFAULT_RESPONSES_PATH: &str = "data/disaster_responses.csv";
const DEFAULT_MODEL_PATH: &str = "models/classifier.json";
const DEFAULT_LOG_DIR: &str = "logs";
const DEFAULT_REMOTE_TIMEOUT_SECONDS: u64 = 10;

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub bind: String,
    pub responses_path: PathBuf,
    pub model_path: PathBuf,
    pub remote: Option<RemoteSettings>,
    pub log_dir: Option<PathBuf>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl ServiceConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Empty `RELIEF_REMOTE_CLASSIFIER_URL` or `RELIEF_LOG_DIR` disables that piece.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let bind = lookup("RELIEF_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string());
        let responses_path: PathBuf = lookup("RELIEF_RESPONSES_PATH")
            .unwrap_or_else(|| DEFAULT_RESPONSES_PATH.to_string())
            .into();
        let model_path: PathBuf = lookup("RELIEF_MODEL_PATH")
            .unwrap_or_else(|| DEFAULT_MODEL_PATH.to_string())
            .into();

        let timeout = Duration::from_secs(
            lookup("RELIEF_REMOTE_TIMEOUT_SECONDS")
                .and_then(|value| value.parse::<u64>().ok())
                .filter(|seconds| *seconds > 0)
                .unwrap_or(DEFAULT_REMOTE_TIMEOUT_SECONDS),
        );
        let remote = non_empty(
            lookup("RELIEF_REMOTE_CLASSIFIER_URL")
                .unwrap_or_else(|| DEFAULT_REMOTE_ENDPOINT.to_string()),
        )
        .map(|endpoint| RemoteSettings {
            endpoint,
            token: lookup("RELIEF_REMOTE_CLASSIFIER_TOKEN").and_then(non_empty),
            timeout,
        });

        let log_dir = non_empty(
            lookup("RELIEF_LOG_DIR").unwrap_or_else(|| DEFAULT_LOG_DIR.to_string()),
        )
        .map(PathBuf::from);

        Self {
            bind,
            responses_path,
            model_path,
            remote,
            log_dir,
        }
    }

    pub fn classifier_settings(&self) -> ClassifierSettings {
        ClassifierSettings {
            model_path: self.model_path.clone(),
            remote: self.remote.clone(),
        }
    }
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
