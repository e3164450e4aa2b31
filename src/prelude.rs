//! # Prelude for video-analyst
//!
//! Re-exports the types needed to run an analysis end to end.
//!
//! ```rust,ignore
//! use video_analyst::prelude::*;
//! ```

pub use crate::agent::{AgentConfig, GeminiAgent};
pub use crate::client::{Error as ClientError, Gemini};
pub use crate::orchestrator::{
    AnalysisResult, AssetState, Error as OrchestratorError, ErrorKind, InferenceService,
    Orchestrator, PollPolicy, ReadyAsset, RemoteHandle,
};
pub use crate::staging::{StagedVideo, VideoFormat};
pub use crate::tools::Tool;
