//! # Core Gemini API Data Primitives
//!
//! This module defines the building blocks shared by requests and responses:
//! `Content`, `Part`, and `Role`.

use serde::{Deserialize, Serialize};
use url::Url;

/// Role of a message in a conversation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Message from the user
    User,
    /// Message from the model
    Model,
}

/// Content part that can be included in a message
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Part {
    /// Text content
    Text {
        /// The text content
        text: String,
        /// Whether this is a thought summary (Gemini 2.5 series only)
        #[serde(skip_serializing_if = "Option::is_none")]
        thought: Option<bool>,
    },
    /// Reference to a file previously uploaded through the Files API
    FileData {
        #[serde(rename = "fileData")]
        file_data: FileData,
    },
}

/// URI-based reference to uploaded data
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FileData {
    /// The MIME type of the referenced data
    pub mime_type: String,
    /// The URI returned by the Files API
    pub file_uri: Url,
}

/// Content of a message
#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Content {
    /// Parts of the content
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parts: Option<Vec<Part>>,
    /// Role of the content
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

impl Content {
    /// Create a new text content
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            parts: Some(vec![Part::Text {
                text: text.into(),
                thought: None,
            }]),
            role: None,
        }
    }

    /// Create a content holding a file reference followed by text.
    ///
    /// The file goes first; Gemini documents that media placed before the
    /// prompt text gives better results for a single video.
    pub fn text_with_file(text: impl Into<String>, file_data: FileData) -> Self {
        Self {
            parts: Some(vec![
                Part::FileData { file_data },
                Part::Text {
                    text: text.into(),
                    thought: None,
                },
            ]),
            role: None,
        }
    }

    /// Add a role to this content
    pub fn with_role(mut self, role: Role) -> Self {
        self.role = Some(role);
        self
    }
}
