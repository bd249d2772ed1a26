mod linear;
mod remote;

use std::path::PathBuf;

use relief_core::{classify_intent_keywords, normalize_text, Intent};
use tracing::{info, warn};

pub use linear::{ArtifactError, LinearPipeline, Norm, PredictError};
pub use remote::{
    RemoteClassifierError, RemoteSettings, RemoteTextClassifier, DEFAULT_REMOTE_ENDPOINT,
};

#[derive(Debug, Clone)]
pub struct ClassifierSettings {
    pub model_path: PathBuf,
    /// `None` disables the hosted model.
    pub remote: Option<RemoteSettings>,
}

/// Result of one classification. A failed prediction is not an error: the
/// caller substitutes a random intent for `Fallback`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Predicted(Intent),
    Fallback { reason: String },
}

/// Intent strategy, chosen once at startup.
#[derive(Debug, Clone)]
pub enum IntentClassifier {
    /// Local TF-IDF + linear SVM pipeline, fed normalized text.
    Trained(LinearPipeline),
    /// Hosted pretrained model, fed the raw message. Its labels are used as-is.
    Remote(RemoteTextClassifier),
    /// Ordered keyword rules when neither of the above is available.
    Keywords,
}

impl IntentClassifier {
    pub fn select(settings: &ClassifierSettings) -> Self {
        if settings.model_path.exists() {
            match LinearPipeline::from_path(&settings.model_path) {
                Ok(pipeline) => {
                    info!(
                        path = %settings.model_path.display(),
                        classes = pipeline.classes().len(),
                        "trained intent pipeline loaded"
                    );
                    return Self::Trained(pipeline);
                }
                Err(err) => warn!(error = %err, "failed loading trained intent pipeline"),
            }
        } else {
            info!(
                path = %settings.model_path.display(),
                "no trained intent pipeline found"
            );
        }

        if let Some(remote) = settings.remote.as_ref() {
            match RemoteTextClassifier::new(remote) {
                Ok(classifier) => {
                    info!(endpoint = %classifier.endpoint(), "using remote intent classifier");
                    return Self::Remote(classifier);
                }
                Err(err) => warn!(error = %err, "failed building remote intent classifier"),
            }
        }

        info!("using keyword intent rules");
        Self::Keywords
    }

    pub fn strategy_name(&self) -> &'static str {
        match self {
            Self::Trained(_) => "trained-linear-svm",
            Self::Remote(_) => "remote-pretrained",
            Self::Keywords => "keywords",
        }
    }

    pub async fn classify(&self, message: &str) -> Classification {
        match self {
            Self::Trained(pipeline) => {
                let normalized = normalize_text(message);
                match pipeline.predict(&[normalized.as_str()]) {
                    Ok(intents) => match intents.into_iter().next() {
                        Some(intent) => Classification::Predicted(intent),
                        None => fallback("pipeline returned no prediction".to_string()),
                    },
                    Err(err) => fallback(err.to_string()),
                }
            }
            Self::Remote(classifier) => match classifier.top_label(message).await {
                Ok(label) => Classification::Predicted(Intent::parse(&label)),
                Err(err) => fallback(err.to_string()),
            },
            Self::Keywords => {
                Classification::Predicted(classify_intent_keywords(&normalize_text(message)))
            }
        }
    }
}

fn fallback(reason: String) -> Classification {
    warn!(reason = %reason, "intent classification failed");
    Classification::Fallback { reason }
}
