//! # video-analyst
//!
//! Ask questions about a video with Gemini. The video is uploaded through the
//! Files API, polled until processing finishes, and then questioned by an
//! agent that may ground its answer in Google Search.

mod client;
mod common;
mod generation;
mod models;
mod tools;

pub mod agent;
pub mod config;
pub mod files;
pub mod orchestrator;
pub mod prelude;
pub mod staging;


pub use agent::{AgentConfig, Error as AgentError, GeminiAgent};
pub use client::{Error as ClientError, Gemini, DEFAULT_BASE_URL, DEFAULT_MODEL};
pub use files::{File, FileBuilder, FileState};
pub use generation::{
    Candidate, ContentBuilder, FinishReason, GenerateContentRequest, GenerationConfig,
    GenerationResponse, GroundingChunk, GroundingMetadata, PromptFeedback, UsageMetadata,
    WebSource,
};
pub use models::{Content, FileData, Part, Role};
pub use orchestrator::{
    AnalysisRequest, AnalysisResult, AssetState, BoxError, Error as OrchestratorError, ErrorKind,
    InferenceService, Orchestrator, PollPolicy, ReadyAsset, RemoteHandle, VideoUpload,
};
pub use staging::{Error as StagingError, StagedVideo, VideoFormat};
pub use tools::{GoogleSearchConfig, Tool};
