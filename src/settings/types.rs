//! Settings document

use crate::types::{json_to_u64, JsonObject, JsonValue};
use serde::{Deserialize, Serialize};

/// Key holding the desired page size
pub const DESIRED_PAGE_SIZE_KEY: &str = "desired_page_size";

/// Persisted settings.
///
/// Kept as a loose JSON object so a hand-edited or partially written file
/// never prevents startup; unusable values read as absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Settings {
    values: JsonObject,
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Desired page size, `None` unless a positive integer is stored
    pub fn desired_page_size(&self) -> Option<u64> {
        self.values
            .get(DESIRED_PAGE_SIZE_KEY)
            .and_then(json_to_u64)
            .filter(|size| *size > 0)
    }

    pub fn set_desired_page_size(&mut self, size: u64) {
        self.values
            .insert(DESIRED_PAGE_SIZE_KEY.to_string(), JsonValue::from(size));
    }

    /// Raw stored value
    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        self.values.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
