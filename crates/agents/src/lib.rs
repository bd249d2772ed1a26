use std::sync::Arc;
use std::time::Instant;

use rand::seq::IndexedRandom;
use relief_core::{
    extract_features, normalize_text, ChatResult, Intent, ResponseTable, GENERIC_RESPONSES,
};
use relief_ml::{Classification, IntentClassifier};
use relief_observability::AppMetrics;
use tracing::{debug, instrument};

/// Turns a message into one intent, one canned response and the keyword
/// features. Holds only read-only state, so one instance serves every request.
#[derive(Clone)]
pub struct ReliefResponder {
    classifier: Arc<IntentClassifier>,
    responses: Arc<ResponseTable>,
    metrics: Arc<AppMetrics>,
}

impl ReliefResponder {
    pub fn new(
        classifier: Arc<IntentClassifier>,
        responses: Arc<ResponseTable>,
        metrics: Arc<AppMetrics>,
    ) -> Self {
        Self {
            classifier,
            responses,
            metrics,
        }
    }

    pub fn classifier(&self) -> &IntentClassifier {
        &self.classifier
    }

    pub fn responses(&self) -> &ResponseTable {
        &self.responses
    }

    #[instrument(skip(self, message), fields(strategy = self.classifier.strategy_name()))]
    pub async fn respond(&self, message: &str) -> ChatResult {
        let started = Instant::now();
        self.metrics.inc_request();

        let normalized = normalize_text(message);
        let features = extract_features(message);

        let intent = match self.classifier.classify(message).await {
            Classification::Predicted(intent) => intent,
            Classification::Fallback { .. } => {
                self.metrics.inc_classifier_fallback();
                self.random_intent()
            }
        };

        let response = match self.responses.candidates(&intent) {
            Some(candidates) => pick(candidates),
            None => {
                self.metrics.inc_generic_response();
                pick(GENERIC_RESPONSES)
            }
        };

        self.metrics.observe_latency(started.elapsed());
        debug!(
            normalized = %normalized,
            intent = %intent,
            location = %features.location,
            disaster_type = %features.disaster_type,
            "message resolved"
        );

        ChatResult {
            intent,
            response,
            disaster_type: features.disaster_type,
            location: features.location,
        }
    }

    fn random_intent(&self) -> Intent {
        self.responses
            .intents()
            .choose(&mut rand::rng())
            .cloned()
            .unwrap_or(Intent::RequestInformation)
    }
}

fn pick<S: AsRef<str>>(candidates: &[S]) -> String {
    candidates
        .choose(&mut rand::rng())
        .map(|candidate| candidate.as_ref().to_string())
        .unwrap_or_else(|| GENERIC_RESPONSES[0].to_string())
}
