use std::collections::HashMap;
use std::fs;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use relief_core::Intent;
use serde::Deserialize;
use thiserror::Error;

// Same default token pattern as the vectorizer the artifact was exported from.
static TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\w\w+\b").expect("valid token regex"));

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("failed reading classifier artifact {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("classifier artifact is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid classifier artifact: {0}")]
    Invalid(String),
}

#[derive(Debug, Error, PartialEq)]
pub enum PredictError {
    #[error("empty prediction batch")]
    EmptyBatch,
    #[error("coefficient row {row} has {actual} weights but the vectorizer yields {expected} features")]
    ShapeMismatch {
        row: usize,
        expected: usize,
        actual: usize,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Norm {
    #[default]
    L2,
    L1,
    None,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TfidfVectorizer {
    vocabulary: HashMap<String, usize>,
    idf: Vec<f32>,
    #[serde(default)]
    sublinear_tf: bool,
    #[serde(default)]
    norm: Norm,
}

impl TfidfVectorizer {
    pub fn n_features(&self) -> usize {
        self.idf.len()
    }

    /// Sparse TF-IDF row as `(feature index, weight)` pairs.
    pub fn transform(&self, text: &str) -> Vec<(usize, f32)> {
        let lower = text.to_lowercase();
        let mut counts: HashMap<usize, f32> = HashMap::new();
        for token in TOKEN.find_iter(&lower) {
            if let Some(&index) = self.vocabulary.get(token.as_str()) {
                *counts.entry(index).or_default() += 1.0;
            }
        }

        let mut row = counts
            .into_iter()
            .map(|(index, count)| {
                let tf = if self.sublinear_tf {
                    1.0 + count.ln()
                } else {
                    count
                };
                (index, tf * self.idf[index])
            })
            .collect::<Vec<_>>();
        row.sort_by_key(|(index, _)| *index);

        let norm = match self.norm {
            Norm::L2 => row.iter().map(|(_, w)| w * w).sum::<f32>().sqrt(),
            Norm::L1 => row.iter().map(|(_, w)| w.abs()).sum::<f32>(),
            Norm::None => 0.0,
        };
        if norm > 0.0 {
            for (_, weight) in row.iter_mut() {
                *weight /= norm;
            }
        }
        row
    }

    fn validate(&self) -> Result<(), ArtifactError> {
        if self.vocabulary.is_empty() {
            return Err(ArtifactError::Invalid("empty vocabulary".to_string()));
        }
        if let Some((term, index)) = self
            .vocabulary
            .iter()
            .find(|(_, index)| **index >= self.idf.len())
        {
            return Err(ArtifactError::Invalid(format!(
                "term {term:?} maps to feature {index} but only {} idf weights exist",
                self.idf.len()
            )));
        }
        Ok(())
    }
}

/// One-vs-rest linear model: one weight row and intercept per class, or a
/// single row for the two-class case.
#[derive(Debug, Clone, Deserialize)]
pub struct LinearSvc {
    classes: Vec<String>,
    coef: Vec<Vec<f32>>,
    intercept: Vec<f32>,
}

impl LinearSvc {
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    fn decision_function(
        &self,
        row: &[(usize, f32)],
        n_features: usize,
    ) -> Result<Vec<f32>, PredictError> {
        self.coef
            .iter()
            .zip(&self.intercept)
            .enumerate()
            .map(|(class_row, (weights, bias))| {
                if weights.len() != n_features {
                    return Err(PredictError::ShapeMismatch {
                        row: class_row,
                        expected: n_features,
                        actual: weights.len(),
                    });
                }
                Ok(row
                    .iter()
                    .map(|(index, value)| weights[*index] * value)
                    .sum::<f32>()
                    + bias)
            })
            .collect()
    }

    fn label_for(&self, scores: &[f32]) -> &str {
        if scores.len() == 1 {
            let index = usize::from(scores[0] > 0.0);
            return &self.classes[index];
        }

        let mut best = 0;
        for (index, score) in scores.iter().enumerate() {
            if *score > scores[best] {
                best = index;
            }
        }
        &self.classes[best]
    }

    fn validate(&self) -> Result<(), ArtifactError> {
        if self.classes.len() < 2 {
            return Err(ArtifactError::Invalid(
                "classifier needs at least two classes".to_string(),
            ));
        }
        let expected_rows = if self.classes.len() == 2 {
            1
        } else {
            self.classes.len()
        };
        if self.coef.len() != expected_rows {
            return Err(ArtifactError::Invalid(format!(
                "{} classes need {expected_rows} coefficient rows, found {}",
                self.classes.len(),
                self.coef.len()
            )));
        }
        if self.intercept.len() != self.coef.len() {
            return Err(ArtifactError::Invalid(format!(
                "{} coefficient rows but {} intercepts",
                self.coef.len(),
                self.intercept.len()
            )));
        }
        Ok(())
    }
}

/// Trained text pipeline: TF-IDF features into a linear SVM.
#[derive(Debug, Clone, Deserialize)]
pub struct LinearPipeline {
    vectorizer: TfidfVectorizer,
    classifier: LinearSvc,
}

impl LinearPipeline {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ArtifactError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ArtifactError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, ArtifactError> {
        let pipeline: Self = serde_json::from_str(raw)?;
        pipeline.vectorizer.validate()?;
        pipeline.classifier.validate()?;
        Ok(pipeline)
    }

    pub fn classes(&self) -> &[String] {
        self.classifier.classes()
    }

    /// Predicts one intent per input text, in batch order.
    pub fn predict(&self, batch: &[&str]) -> Result<Vec<Intent>, PredictError> {
        if batch.is_empty() {
            return Err(PredictError::EmptyBatch);
        }

        let n_features = self.vectorizer.n_features();
        batch
            .iter()
            .map(|text| {
                let row = self.vectorizer.transform(text);
                let scores = self.classifier.decision_function(&row, n_features)?;
                Ok(Intent::parse(self.classifier.label_for(&scores)))
            })
            .collect()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const THREE_CLASS_ARTIFACT: &str = r#"{
        "vectorizer": {
            "vocabulary": {"rescue": 0, "trapped": 1, "doctor": 2, "injured": 3, "food": 4, "water": 5},
            "idf": [1.2, 1.5, 1.4, 1.3, 1.1, 1.0]
        },
        "classifier": {
            "classes": ["request_medical_aid", "request_rescue", "request_supplies"],
            "coef": [
                [-0.5, -0.4, 1.8, 1.6, -0.3, -0.2],
                [1.9, 1.7, -0.4, -0.2, -0.5, -0.6],
                [-0.6, -0.5, -0.3, -0.4, 1.8, 1.5]
            ],
            "intercept": [-0.1, 0.05, -0.2]
        }
    }"#;

    #[test]
    fn predicts_highest_scoring_class() {
        let pipeline = LinearPipeline::from_json_str(THREE_CLASS_ARTIFACT).unwrap();
        let predicted = pipeline
            .predict(&[
                "help flood in nainital need rescue",
                "my brother is injured we need a doctor",
                "no food or water left",
            ])
            .unwrap();

        assert_eq!(
            predicted,
            vec![
                Intent::RequestRescue,
                Intent::RequestMedicalAid,
                Intent::RequestSupplies
            ]
        );
    }

    #[test]
    fn out_of_vocabulary_text_uses_intercepts() {
        let pipeline = LinearPipeline::from_json_str(THREE_CLASS_ARTIFACT).unwrap();
        assert_eq!(
            pipeline.predict(&["completely unrelated"]).unwrap(),
            vec![Intent::RequestRescue]
        );
    }

    #[test]
    fn two_class_model_uses_sign_of_single_row() {
        let artifact = r#"{
            "vectorizer": {"vocabulary": {"power": 0, "missing": 1}, "idf": [1.0, 1.0], "norm": "none"},
            "classifier": {
                "classes": ["missing_person", "power_failure"],
                "coef": [[2.0, -2.0]],
                "intercept": [0.0]
            }
        }"#;
        let pipeline = LinearPipeline::from_json_str(artifact).unwrap();

        assert_eq!(
            pipeline.predict(&["power is gone", "my son is missing"]).unwrap(),
            vec![Intent::PowerFailure, Intent::MissingPerson]
        );
    }

    #[test]
    fn tfidf_rows_are_l2_normalized() {
        let pipeline = LinearPipeline::from_json_str(THREE_CLASS_ARTIFACT).unwrap();
        let row = pipeline.vectorizer.transform("rescue rescue trapped");
        let norm = row.iter().map(|(_, w)| w * w).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
        assert_eq!(row.iter().map(|(i, _)| *i).collect::<Vec<_>>(), vec![0, 1]);
    }

    #[test]
    fn rejects_mismatched_intercepts() {
        let artifact = THREE_CLASS_ARTIFACT.replace("[-0.1, 0.05, -0.2]", "[-0.1]");
        assert!(matches!(
            LinearPipeline::from_json_str(&artifact),
            Err(ArtifactError::Invalid(_))
        ));
    }

    #[test]
    fn reports_shape_mismatch_at_predict_time() {
        let artifact = THREE_CLASS_ARTIFACT.replace(
            "[-0.6, -0.5, -0.3, -0.4, 1.8, 1.5]",
            "[-0.6, -0.5, -0.3]",
        );
        let pipeline = LinearPipeline::from_json_str(&artifact).unwrap();
        assert_eq!(
            pipeline.predict(&["food"]),
            Err(PredictError::ShapeMismatch {
                row: 2,
                expected: 6,
                actual: 3
            })
        );
    }

    #[test]
    fn empty_batch_is_an_error() {
        let pipeline = LinearPipeline::from_json_str(THREE_CLASS_ARTIFACT).unwrap();
        assert_eq!(pipeline.predict(&[]), Err(PredictError::EmptyBatch));
    }
}
