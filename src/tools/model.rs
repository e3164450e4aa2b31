use serde::{Deserialize, Serialize};

/// Tool that can be used by the model
///
/// Server-side tools such as Google Search are executed by the Gemini service
/// itself: the model decides whether to call them and folds the results into
/// its answer without a client round-trip.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Tool {
    /// Google Search tool
    GoogleSearch {
        /// The Google Search configuration
        #[serde(rename = "googleSearch")]
        google_search: GoogleSearchConfig,
    },
}

/// Empty configuration for Google Search tool
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GoogleSearchConfig {}

impl Tool {
    /// Create a new Google Search tool
    pub fn google_search() -> Self {
        Self::GoogleSearch {
            google_search: GoogleSearchConfig {},
        }
    }
}
