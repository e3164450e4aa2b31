//! Data models for the Files API.

use serde::{Deserialize, Serialize};
use strum::AsRefStr;
use time::OffsetDateTime;
use url::Url;

use crate::common::serde::{i64_as_string, mime_as_string};

/// Metadata for a file uploaded to the Gemini API.
///
/// Uploaded files are kept by the service for 48 hours. Video files are
/// processed after upload and can only be referenced in generation requests
/// once their [`state`](File::state) is [`FileState::Active`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct File {
    /// Resource name, e.g. `files/abc-123`
    pub name: String,

    /// Human-readable display name (max 512 chars)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    /// MIME type of the file
    #[serde(default, skip_serializing_if = "Option::is_none", with = "mime_as_string::optional")]
    pub mime_type: Option<mime::Mime>,

    /// Size of the file in bytes
    #[serde(default, skip_serializing_if = "Option::is_none", with = "i64_as_string::optional")]
    pub size_bytes: Option<i64>,

    /// Creation timestamp
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub create_time: Option<OffsetDateTime>,

    /// Last update timestamp
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub update_time: Option<OffsetDateTime>,

    /// Time after which the service deletes the file
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub expiration_time: Option<OffsetDateTime>,

    /// Base64 encoded SHA-256 hash of the uploaded bytes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256_hash: Option<String>,

    /// URI used to reference the file in generation requests
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<Url>,

    /// Processing state
    #[serde(default)]
    pub state: FileState,

    /// Error status, set when processing failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<Status>,

    /// Metadata for video files
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_metadata: Option<VideoMetadata>,
}

/// Processing state of an uploaded file.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum FileState {
    /// The default value; the service has not reported a state yet
    #[default]
    StateUnspecified,
    /// File is being processed and cannot be used for inference yet
    Processing,
    /// File is processed and available for inference
    Active,
    /// File failed processing
    Failed,
}

/// Error status attached to a file whose processing failed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Status {
    #[serde(default)]
    pub code: i32,
    #[serde(default)]
    pub message: String,
}

/// Metadata for a video file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VideoMetadata {
    /// Duration of the video as a protobuf duration string, e.g. `"13s"`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_duration: Option<String>,
}
