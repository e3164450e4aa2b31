//! Upload, readiness polling, and question answering for a single video.
//!
//! The [`Orchestrator`] sequences three calls against an [`InferenceService`]:
//! register the video, wait until the service has processed it, then ask the
//! question. [`Orchestrator::analyze`] runs all three for a [`StagedVideo`]
//! and removes its temporary file on every exit path.
//!
//! ## Example usage:
//! ```rust,ignore
//! use video_analyst::{orchestrator::stage_video, GeminiAgent, Orchestrator, PollPolicy};
//!
//! let agent = GeminiAgent::new(gemini, Arc::new(AgentConfig::default()));
//! let orchestrator = Orchestrator::new(agent, PollPolicy::default());
//! let staged = stage_video(Path::new("sample.mp4")).await?;
//! let answer = orchestrator.analyze(staged, "What product is shown?").await?;
//! println!("{answer}");
//! ```

use snafu::{ensure, ResultExt};
use std::{path::Path, time::Duration};
use tokio::time::Instant;
use tracing::{debug, info, instrument};

use crate::staging::{StagedVideo, VideoFormat};

pub mod asset;
pub mod error;
pub mod service;

#[cfg(test)]
mod tests;

pub use asset::{AnalysisRequest, AnalysisResult, AssetState, ReadyAsset, RemoteHandle, VideoUpload};
pub use error::{Error, ErrorKind};
pub use service::{BoxError, InferenceService};

use error::{
    InferenceSnafu, MissingVideoSnafu, ProcessingSnafu, ReadVideoSnafu, StageSnafu,
    StatusCheckSnafu, TimeoutSnafu, UnsupportedFormatSnafu, UploadSnafu,
};

/// How often, and for how long, to poll a pending video.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Wait between two state checks
    pub interval: Duration,
    /// Upper bound on the total wait before giving up
    pub timeout: Duration,
}

impl PollPolicy {
    pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(2);
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(600);

    pub fn new(interval: Duration, timeout: Duration) -> Self {
        Self { interval, timeout }
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_INTERVAL, Self::DEFAULT_TIMEOUT)
    }
}

/// Sequences upload, readiness wait, and inference for one video at a time.
///
/// The orchestrator holds no per-request state, so a single instance can
/// serve any number of sequential requests.
#[derive(Debug, Clone)]
pub struct Orchestrator<S> {
    service: S,
    policy: PollPolicy,
}

impl<S: InferenceService> Orchestrator<S> {
    pub fn new(service: S, policy: PollPolicy) -> Self {
        Self { service, policy }
    }

    /// Uploads the video at `path` and returns the handle the service assigned.
    ///
    /// The file must exist and have one of the [`VideoFormat`] extensions.
    pub async fn register_asset(&self, path: &Path) -> Result<RemoteHandle, Error> {
        let display_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.register(path, display_name).await
    }

    #[instrument(skip_all, fields(video.path = %path.display(), display_name = %display_name))]
    async fn register(&self, path: &Path, display_name: String) -> Result<RemoteHandle, Error> {
        let (format, bytes) = read_video(path).await?;

        let upload = VideoUpload {
            display_name: display_name.clone(),
            mime_type: format.mime_type(),
            bytes,
        };
        let handle = self
            .service
            .upload(upload)
            .await
            .context(UploadSnafu { display_name })?;

        info!(
            asset.name = %handle.name,
            asset.state = handle.state.as_ref(),
            "video registered"
        );
        Ok(handle)
    }

    /// Polls the service until `handle` is ready.
    ///
    /// Returns immediately for a handle that is already ready. Sleeps for the
    /// policy interval between checks and gives up with [`Error::Timeout`]
    /// once the policy timeout has elapsed. The last sleep is shortened so the
    /// total wait never exceeds the timeout.
    #[instrument(skip_all, fields(
        asset.name = %handle.name,
        poll.interval.secs = self.policy.interval.as_secs_f64(),
        timeout.secs = self.policy.timeout.as_secs(),
    ))]
    pub async fn await_ready(&self, mut handle: RemoteHandle) -> Result<ReadyAsset, Error> {
        let start = Instant::now();
        let mut attempt = 0u32;

        loop {
            match handle.state {
                AssetState::Ready => {
                    info!(poll.attempts = attempt, "video ready");
                    return ReadyAsset::try_from(handle);
                }
                AssetState::Failed => {
                    return ProcessingSnafu {
                        name: handle.name,
                        reason: handle.failure,
                    }
                    .fail();
                }
                AssetState::Pending => {}
            }

            let waited = start.elapsed();
            ensure!(
                waited < self.policy.timeout,
                TimeoutSnafu {
                    name: handle.name.clone(),
                    waited,
                }
            );

            attempt += 1;
            let pause = self.policy.interval.min(self.policy.timeout - waited);
            debug!(
                poll.attempt = attempt,
                poll.pause.secs = pause.as_secs_f64(),
                "video still processing; waiting"
            );
            tokio::time::sleep(pause).await;

            handle = self
                .service
                .get(&handle.name)
                .await
                .context(StatusCheckSnafu {
                    name: handle.name.clone(),
                })?;
        }
    }

    /// Asks `question` about a ready video.
    ///
    /// A blank question is rejected before any remote call is made.
    #[instrument(skip_all, fields(asset.name = %asset.name()))]
    pub async fn ask(&self, asset: &ReadyAsset, question: &str) -> Result<AnalysisResult, Error> {
        let request = AnalysisRequest::new(asset, question)?;
        let text = self
            .service
            .generate(&request.prompt(), request.asset().handle())
            .await
            .context(InferenceSnafu {
                name: asset.name(),
            })?;

        info!(answer.len = text.len(), "answer received");
        Ok(AnalysisResult::from(text))
    }

    /// Registers, waits for, and questions a staged video.
    ///
    /// The staged file is removed before this returns, whatever the outcome.
    #[instrument(skip_all, fields(video.format = video.format().extension()))]
    pub async fn analyze(
        &self,
        video: StagedVideo,
        question: &str,
    ) -> Result<AnalysisResult, Error> {
        let result = self.run(&video, question).await;
        video.close();
        result
    }

    async fn run(&self, video: &StagedVideo, question: &str) -> Result<AnalysisResult, Error> {
        asset::validate_question(question)?;
        let handle = self.register(video.path(), video.display_name()).await?;
        let ready = self.await_ready(handle).await?;
        self.ask(&ready, question).await
    }
}

/// Copies the video at `path` into a [`StagedVideo`] named after the source file.
///
/// Fails with a precondition error when the file is missing or its format is
/// not supported.
#[instrument(skip_all, fields(video.path = %path.display()))]
pub async fn stage_video(path: &Path) -> Result<StagedVideo, Error> {
    let (format, bytes) = read_video(path).await?;
    let staged = StagedVideo::from_bytes(&bytes, format).context(StageSnafu { path })?;
    Ok(match path.file_name().and_then(|name| name.to_str()) {
        Some(name) => staged.with_display_name(name),
        None => staged,
    })
}

async fn read_video(path: &Path) -> Result<(VideoFormat, Vec<u8>), Error> {
    let format = VideoFormat::from_path(path).context(UnsupportedFormatSnafu { path })?;
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok((format, bytes)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => MissingVideoSnafu { path }.fail(),
        Err(e) => Err(e).context(ReadVideoSnafu { path }),
    }
}
