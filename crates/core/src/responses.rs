use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::models::Intent;

/// Used when the predicted intent has no entry in the table.
pub const GENERIC_RESPONSES: &[&str] = &[
    "I understand this is a difficult situation. How can I assist you further?",
    "I'm here to help. Could you provide more details about your situation?",
    "Let me connect you with the appropriate disaster relief services.",
    "Your safety is our priority. Please stay in a secure location if possible.",
    "I'm processing your request. Please stand by for assistance.",
];

const BUILTIN_RESPONSES: &[(&str, &str)] = &[
    ("request_rescue", "Rescue team is being sent. Stay safe."),
    (
        "request_medical_aid",
        "Medical assistance is on the way. Please stay calm.",
    ),
    (
        "request_supplies",
        "Relief team will reach shortly with essentials.",
    ),
    (
        "request_information",
        "You can contact the nearest relief center for more information.",
    ),
    (
        "missing_person",
        "We are searching for the missing person. Please stay available for updates.",
    ),
    (
        "power_failure",
        "The power supply will be restored soon. Please stay prepared.",
    ),
    (
        "evacuation_request",
        "Evacuation teams are being mobilized. Stay safe and follow instructions.",
    ),
];

#[derive(Debug, Error)]
pub enum ResponseTableError {
    #[error("failed reading response table {path}: {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },
    #[error("response table {0} has no usable rows")]
    Empty(String),
}

#[derive(Debug, Deserialize)]
struct ResponseRow {
    intent: String,
    response: String,
}

/// Where a table came from, reported on `/health`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableSource {
    File,
    Builtin,
}

/// Intent to canned response candidates. Built once, never mutated.
#[derive(Debug, Clone)]
pub struct ResponseTable {
    intents: Vec<Intent>,
    candidates: HashMap<Intent, Vec<String>>,
    source: TableSource,
}

impl ResponseTable {
    pub fn builtin() -> Self {
        let mut table = Self::empty(TableSource::Builtin);
        for (intent, response) in BUILTIN_RESPONSES {
            table.push(Intent::parse(intent), response.to_string());
        }
        table
    }

    /// Reads `intent,response` rows. Repeated intents accumulate candidates.
    pub fn from_csv_path(path: impl AsRef<Path>) -> Result<Self, ResponseTableError> {
        let path = path.as_ref();
        let display = path.display().to_string();
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(|source| ResponseTableError::Csv {
                path: display.clone(),
                source,
            })?;

        let mut table = Self::empty(TableSource::File);
        for row in reader.deserialize::<ResponseRow>() {
            let row = row.map_err(|source| ResponseTableError::Csv {
                path: display.clone(),
                source,
            })?;
            if row.intent.is_empty() || row.response.is_empty() {
                continue;
            }
            table.push(Intent::parse(&row.intent), row.response);
        }

        if table.is_empty() {
            return Err(ResponseTableError::Empty(display));
        }
        Ok(table)
    }

    /// File table when it loads, built-in mapping otherwise.
    pub fn load_or_builtin(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::from_csv_path(path) {
            Ok(table) => {
                tracing::info!(
                    path = %path.display(),
                    intents = table.len(),
                    "response table loaded"
                );
                let missing = table.missing_known_intents();
                if !missing.is_empty() {
                    tracing::warn!(
                        missing = ?missing.iter().map(Intent::as_str).collect::<Vec<_>>(),
                        "known intents without responses get generic replies"
                    );
                }
                let extra = table.extra_intents().count();
                if extra > 0 {
                    tracing::debug!(extra, "response table carries non-standard intent labels");
                }
                table
            }
            Err(err) => {
                tracing::warn!(error = %err, "using built-in response table");
                Self::builtin()
            }
        }
    }

    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (Intent, S)>,
        S: Into<String>,
    {
        let mut table = Self::empty(TableSource::File);
        for (intent, response) in entries {
            table.push(intent, response.into());
        }
        table
    }

    pub fn candidates(&self, intent: &Intent) -> Option<&[String]> {
        self.candidates.get(intent).map(Vec::as_slice)
    }

    pub fn contains(&self, intent: &Intent) -> bool {
        self.candidates.contains_key(intent)
    }

    /// Keys in first-seen order.
    pub fn intents(&self) -> &[Intent] {
        &self.intents
    }

    pub fn len(&self) -> usize {
        self.intents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intents.is_empty()
    }

    /// Classifier labels the table has no candidates for, in `Intent::KNOWN` order.
    pub fn missing_known_intents(&self) -> Vec<Intent> {
        Intent::KNOWN
            .into_iter()
            .filter(|intent| !self.contains(intent))
            .collect()
    }

    /// Keys outside the known intents, reachable only through an external model.
    pub fn extra_intents(&self) -> impl Iterator<Item = &Intent> {
        self.intents.iter().filter(|intent| !intent.is_known())
    }

    pub fn source(&self) -> TableSource {
        self.source
    }

    fn empty(source: TableSource) -> Self {
        Self {
            intents: Vec::new(),
            candidates: HashMap::new(),
            source,
        }
    }

    fn push(&mut self, intent: Intent, response: String) {
        let entry = self.candidates.entry(intent.clone()).or_insert_with(|| {
            self.intents.push(intent);
            Vec::new()
        });
        if !entry.contains(&response) {
            entry.push(response);
        }
    }
}
