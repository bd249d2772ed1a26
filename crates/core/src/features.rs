use crate::models::{ExtractedFeatures, UNKNOWN_FEATURE};

pub const DISTRICTS: &[&str] = &[
    "nainital",
    "chamoli",
    "dehradun",
    "rudraprayag",
    "tehri",
    "pithoragarh",
    "almora",
    "uttarkashi",
    "bageshwar",
    "pauri",
];

pub const REGIONS: &[&str] = &["kumaon", "garhwal"];

pub const DISASTER_TYPES: &[&str] = &[
    "flood",
    "landslide",
    "earthquake",
    "fire",
    "cloudburst",
    "drought",
    "hailstorm",
];

/// Districts first, then the broader regions. First hit in list order wins.
pub fn extract_location(text: &str) -> String {
    let lower = text.to_lowercase();
    first_match(&lower, DISTRICTS)
        .or_else(|| first_match(&lower, REGIONS))
        .map(capitalize)
        .unwrap_or_else(|| UNKNOWN_FEATURE.to_string())
}

pub fn extract_disaster_type(text: &str) -> String {
    let lower = text.to_lowercase();
    first_match(&lower, DISASTER_TYPES)
        .map(capitalize)
        .unwrap_or_else(|| UNKNOWN_FEATURE.to_string())
}

pub fn extract_features(text: &str) -> ExtractedFeatures {
    ExtractedFeatures {
        location: extract_location(text),
        disaster_type: extract_disaster_type(text),
    }
}

fn first_match(haystack: &str, terms: &[&'static str]) -> Option<&'static str> {
    terms.iter().copied().find(|term| haystack.contains(term))
}

fn capitalize(term: &str) -> String {
    let mut chars = term.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn district_wins_over_region() {
        assert_eq!(
            extract_location("Landslide in Garhwal near CHAMOLI"),
            "Chamoli"
        );
        assert_eq!(extract_location("roads shut across kumaon"), "Kumaon");
    }

    #[test]
    fn first_listed_term_wins_not_first_in_text() {
        // almora appears first in the text but nainital is earlier in the list
        assert_eq!(extract_location("from almora to nainital"), "Nainital");
        assert_eq!(
            extract_disaster_type("fire after the earthquake"),
            "Earthquake"
        );
    }

    #[test]
    fn substring_matches_count() {
        assert_eq!(extract_disaster_type("FLOODING everywhere"), "Flood");
        assert_eq!(extract_disaster_type("wildfires spreading"), "Fire");
    }

    #[test]
    fn unknown_iff_no_term_is_a_substring() {
        let samples = [
            "Help! Flood in Nainital, need rescue",
            "nothing to see here",
            "Hailstorm over Pauri",
            "",
            "Garhwal drought",
        ];

        for sample in samples {
            let lower = sample.to_lowercase();
            let any_place = DISTRICTS
                .iter()
                .chain(REGIONS.iter())
                .any(|term| lower.contains(term));
            let any_disaster = DISASTER_TYPES.iter().any(|term| lower.contains(term));

            assert_eq!(extract_location(sample) == UNKNOWN_FEATURE, !any_place);
            assert_eq!(
                extract_disaster_type(sample) == UNKNOWN_FEATURE,
                !any_disaster
            );
        }
    }

    #[test]
    fn extracts_both_features() {
        let features = extract_features("Help! Flood in Nainital, need rescue");
        assert_eq!(features.location, "Nainital");
        assert_eq!(features.disaster_type, "Flood");
    }
}
