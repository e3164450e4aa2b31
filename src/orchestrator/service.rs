use async_trait::async_trait;

use crate::orchestrator::asset::{RemoteHandle, VideoUpload};

/// Error type returned across the inference service boundary.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The remote multimodal inference service.
///
/// Implementations own the wire protocol; the orchestrator only sequences
/// calls and interprets [`RemoteHandle::state`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InferenceService: Send + Sync {
    /// Registers a video and returns the handle assigned to it.
    async fn upload(&self, video: VideoUpload) -> Result<RemoteHandle, BoxError>;

    /// Fetches the current state of a previously uploaded video.
    async fn get(&self, name: &str) -> Result<RemoteHandle, BoxError>;

    /// Runs `prompt` against the referenced video and returns the answer text.
    ///
    /// Any tool use (such as web search) happens inside the service.
    async fn generate(&self, prompt: &str, asset: &RemoteHandle) -> Result<String, BoxError>;
}
