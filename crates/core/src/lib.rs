pub mod features;
pub mod intent;
pub mod models;
pub mod responses;

pub use features::{extract_disaster_type, extract_features, extract_location};
pub use intent::{classify_intent_keywords, normalize_text};
pub use models::*;
pub use responses::{ResponseTable, ResponseTableError, TableSource, GENERIC_RESPONSES};
