use mime::Mime;
use std::fmt;
use strum::AsRefStr;
use url::Url;

use crate::{
    files::{File, FileState},
    orchestrator::error::{EmptyQuestionSnafu, Error, NotReadySnafu},
};

/// Processing state of a remote video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum AssetState {
    Pending,
    Ready,
    Failed,
}

impl From<FileState> for AssetState {
    fn from(state: FileState) -> Self {
        match state {
            FileState::StateUnspecified | FileState::Processing => AssetState::Pending,
            FileState::Active => AssetState::Ready,
            FileState::Failed => AssetState::Failed,
        }
    }
}

/// Bytes of a video to register with the inference service.
#[derive(Clone, PartialEq)]
pub struct VideoUpload {
    pub display_name: String,
    pub mime_type: Mime,
    pub bytes: Vec<u8>,
}

impl fmt::Debug for VideoUpload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VideoUpload")
            .field("display_name", &self.display_name)
            .field("mime_type", &self.mime_type)
            .field("bytes.len", &self.bytes.len())
            .finish()
    }
}

/// A reference to a video registered with the remote service.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteHandle {
    /// Service-assigned identifier, e.g. `files/abc-123`
    pub name: String,
    /// URI used to reference the video in generation requests
    pub uri: Option<Url>,
    pub mime_type: Option<Mime>,
    pub state: AssetState,
    /// Message reported by the service when processing failed
    pub failure: Option<String>,
}

impl RemoteHandle {
    pub fn new(name: impl Into<String>, state: AssetState) -> Self {
        Self {
            name: name.into(),
            uri: None,
            mime_type: None,
            state,
            failure: None,
        }
    }
}

impl From<File> for RemoteHandle {
    fn from(file: File) -> Self {
        Self {
            state: file.state.into(),
            failure: file.error.map(|status| status.message),
            name: file.name,
            uri: file.uri,
            mime_type: file.mime_type,
        }
    }
}

/// A [`RemoteHandle`] whose state is known to be [`AssetState::Ready`].
#[derive(Debug, Clone, PartialEq)]
pub struct ReadyAsset(RemoteHandle);

impl ReadyAsset {
    pub fn handle(&self) -> &RemoteHandle {
        &self.0
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }
}

impl TryFrom<RemoteHandle> for ReadyAsset {
    type Error = Error;

    fn try_from(handle: RemoteHandle) -> Result<Self, Self::Error> {
        if handle.state == AssetState::Ready {
            Ok(Self(handle))
        } else {
            NotReadySnafu {
                name: handle.name,
                state: handle.state.as_ref(),
            }
            .fail()
        }
    }
}

/// A ready video paired with a non-blank question.
#[derive(Debug, Clone)]
pub struct AnalysisRequest<'a> {
    asset: &'a ReadyAsset,
    question: &'a str,
}

impl<'a> AnalysisRequest<'a> {
    pub fn new(asset: &'a ReadyAsset, question: &'a str) -> Result<Self, Error> {
        let question = validate_question(question)?;
        Ok(Self { asset, question })
    }

    pub fn asset(&self) -> &ReadyAsset {
        self.asset
    }

    /// The question with surrounding whitespace removed.
    pub fn question(&self) -> &str {
        self.question
    }

    /// The single combined prompt sent to the agent.
    ///
    /// Whether to search the web, and for what, is left to the agent.
    pub fn prompt(&self) -> String {
        format!(
            "First analyze this video, then answer the following question using both \
             the video analysis and web research where it helps: {}\n\n\
             Provide a comprehensive response focusing on practical, actionable information.",
            self.question
        )
    }
}

pub(crate) fn validate_question(question: &str) -> Result<&str, Error> {
    let trimmed = question.trim();
    if trimmed.is_empty() {
        EmptyQuestionSnafu.fail()
    } else {
        Ok(trimmed)
    }
}

/// The agent's answer, as markdown-formatted text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisResult(String);

impl AnalysisResult {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl From<String> for AnalysisResult {
    fn from(text: String) -> Self {
        Self(text)
    }
}

impl fmt::Display for AnalysisResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::ErrorKind;
    use serde_json::json;

    #[test]
    fn file_states_map_to_asset_states() {
        assert_eq!(AssetState::from(FileState::StateUnspecified), AssetState::Pending);
        assert_eq!(AssetState::from(FileState::Processing), AssetState::Pending);
        assert_eq!(AssetState::from(FileState::Active), AssetState::Ready);
        assert_eq!(AssetState::from(FileState::Failed), AssetState::Failed);
    }

    #[test]
    fn handle_from_failed_file_keeps_reason() {
        let file: File = serde_json::from_value(json!({
            "name": "files/h1",
            "mimeType": "video/mp4",
            "uri": "https://example.com/v1beta/files/h1",
            "state": "FAILED",
            "error": { "code": 13, "message": "video could not be decoded" }
        }))
        .unwrap();

        let handle = RemoteHandle::from(file);
        assert_eq!(handle.name, "files/h1");
        assert_eq!(handle.state, AssetState::Failed);
        assert_eq!(handle.failure.as_deref(), Some("video could not be decoded"));
        assert!(handle.uri.is_some());
    }

    #[test]
    fn only_ready_handles_become_ready_assets() {
        let ready = ReadyAsset::try_from(RemoteHandle::new("files/h1", AssetState::Ready)).unwrap();
        assert_eq!(ready.name(), "files/h1");

        let err = ReadyAsset::try_from(RemoteHandle::new("files/h2", AssetState::Pending))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Precondition);
        assert_eq!(
            err.to_string(),
            "'files/h2' is not ready for inference (state: PENDING)"
        );
    }

    #[test]
    fn blank_questions_are_rejected() {
        let ready = ReadyAsset::try_from(RemoteHandle::new("files/h1", AssetState::Ready)).unwrap();
        for question in ["", "   ", "\n\t "] {
            let err = AnalysisRequest::new(&ready, question).unwrap_err();
            assert!(matches!(err, Error::EmptyQuestion));
        }
    }

    #[test]
    fn prompt_embeds_trimmed_question() {
        let ready = ReadyAsset::try_from(RemoteHandle::new("files/h1", AssetState::Ready)).unwrap();
        let request = AnalysisRequest::new(&ready, "  What product is shown?\n").unwrap();

        assert_eq!(request.question(), "What product is shown?");
        let prompt = request.prompt();
        assert!(prompt.starts_with("First analyze this video"));
        assert!(prompt.contains("web research"));
        assert!(prompt.contains(": What product is shown?\n\n"));
    }
}
