use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_REMOTE_ENDPOINT: &str =
    "https://api-inference.huggingface.co/models/bhadresh-savani/distilbert-base-uncased-emotion";

#[derive(Debug, Clone)]
pub struct RemoteSettings {
    pub endpoint: String,
    pub token: Option<String>,
    pub timeout: Duration,
}

#[derive(Debug, Error)]
pub enum RemoteClassifierError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("classifier request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("classifier service returned an error: {0}")]
    Service(String),
    #[error("classifier returned no labels")]
    NoLabels,
}

#[derive(Debug, Clone, Deserialize)]
struct LabelScore {
    label: String,
    score: f32,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum InferenceResponse {
    Nested(Vec<Vec<LabelScore>>),
    Flat(Vec<LabelScore>),
    Error { error: String },
}

/// Hosted text-classification model called with the raw message.
#[derive(Debug, Clone)]
pub struct RemoteTextClassifier {
    client: Client,
    endpoint: String,
    token: Option<String>,
}

impl RemoteTextClassifier {
    pub fn new(settings: &RemoteSettings) -> Result<Self, RemoteClassifierError> {
        let client = Client::builder()
            .connect_timeout(settings.timeout.min(Duration::from_secs(5)))
            .timeout(settings.timeout)
            .build()
            .map_err(RemoteClassifierError::Client)?;

        Ok(Self {
            client,
            endpoint: settings.endpoint.clone(),
            token: settings.token.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Lowercased label of the top-scoring class.
    pub async fn top_label(&self, text: &str) -> Result<String, RemoteClassifierError> {
        let mut request = self
            .client
            .post(&self.endpoint)
            .json(&serde_json::json!({ "inputs": text }));
        if let Some(token) = self.token.as_deref() {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        let body: InferenceResponse = response.json().await?;
        if !status.is_success() {
            if let InferenceResponse::Error { error } = body {
                return Err(RemoteClassifierError::Service(error));
            }
            return Err(RemoteClassifierError::Service(status.to_string()));
        }

        top_label(body)
    }
}

fn top_label(body: InferenceResponse) -> Result<String, RemoteClassifierError> {
    let candidates = match body {
        InferenceResponse::Nested(batches) => batches.into_iter().next().unwrap_or_default(),
        InferenceResponse::Flat(labels) => labels,
        InferenceResponse::Error { error } => return Err(RemoteClassifierError::Service(error)),
    };

    candidates
        .into_iter()
        .fold(None::<LabelScore>, |best, candidate| match best {
            Some(current) if current.score >= candidate.score => Some(current),
            _ => Some(candidate),
        })
        .map(|best| best.label.to_lowercase())
        .ok_or(RemoteClassifierError::NoLabels)
}
