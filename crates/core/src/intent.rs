use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::Intent;

static NON_ALPHA: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-zA-Z\s]").expect("valid non-alpha regex"));
static WHITESPACE_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

/// Lowercases, drops everything but ASCII letters and whitespace, and
/// collapses whitespace to single spaces.
pub fn normalize_text(input: &str) -> String {
    let lower = input.to_lowercase();
    let letters = NON_ALPHA.replace_all(&lower, "");
    WHITESPACE_RUN
        .replace_all(&letters, " ")
        .trim()
        .to_string()
}

struct KeywordGroup {
    intent: Intent,
    keywords: &'static [&'static str],
}

// Checked in order; the first group with any hit wins.
static KEYWORD_GROUPS: Lazy<Vec<KeywordGroup>> = Lazy::new(|| {
    vec![
        KeywordGroup {
            intent: Intent::RequestRescue,
            keywords: &["rescue", "save", "help", "stuck", "trapped"],
        },
        KeywordGroup {
            intent: Intent::RequestMedicalAid,
            keywords: &["medical", "doctor", "hospital", "injured", "hurt", "wound"],
        },
        KeywordGroup {
            intent: Intent::RequestSupplies,
            keywords: &["food", "water", "supplies", "blanket", "medicine", "essentials"],
        },
        KeywordGroup {
            intent: Intent::RequestInformation,
            keywords: &["information", "update", "news", "status", "situation"],
        },
        KeywordGroup {
            intent: Intent::MissingPerson,
            keywords: &["missing", "lost", "find", "locate", "disappeared"],
        },
        KeywordGroup {
            intent: Intent::PowerFailure,
            keywords: &["power", "electricity", "outage", "blackout"],
        },
        KeywordGroup {
            intent: Intent::EvacuationRequest,
            keywords: &["evacuate", "evacuation", "leave", "escape"],
        },
        KeywordGroup {
            intent: Intent::DamageReport,
            keywords: &["damage", "collapsed"],
        },
    ]
});

pub fn classify_intent_keywords(text: &str) -> Intent {
    let lower = text.to_lowercase();

    KEYWORD_GROUPS
        .iter()
        .find(|group| contains_any(&lower, group.keywords))
        .map(|group| group.intent.clone())
        .unwrap_or(Intent::RequestInformation)
}

pub(crate) fn contains_any(input: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| input.contains(needle))
}
