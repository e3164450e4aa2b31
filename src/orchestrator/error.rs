use snafu::Snafu;
use std::{path::PathBuf, time::Duration};

use crate::{orchestrator::service::BoxError, staging};

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("video file '{}' does not exist", path.display()))]
    MissingVideo { path: PathBuf },

    #[snafu(display("video file '{}' has an unsupported format", path.display()))]
    UnsupportedFormat {
        source: staging::Error,
        path: PathBuf,
    },

    #[snafu(display("question must not be empty"))]
    EmptyQuestion,

    #[snafu(display("failed to read video file '{}'", path.display()))]
    ReadVideo {
        source: std::io::Error,
        path: PathBuf,
    },

    #[snafu(display("failed to stage video file '{}'", path.display()))]
    Stage {
        source: staging::Error,
        path: PathBuf,
    },

    #[snafu(display("inference service rejected upload of '{display_name}'"))]
    Upload {
        source: BoxError,
        display_name: String,
    },

    #[snafu(display("failed to check processing state of '{name}'"))]
    StatusCheck { source: BoxError, name: String },

    #[snafu(display(
        "remote processing of '{name}' failed: {}",
        reason.as_deref().unwrap_or("no reason given")
    ))]
    Processing {
        name: String,
        reason: Option<String>,
    },

    #[snafu(display("'{name}' was still processing after {waited:?}"))]
    Timeout { name: String, waited: Duration },

    #[snafu(display("'{name}' is not ready for inference (state: {state})"))]
    NotReady { name: String, state: String },

    #[snafu(display("inference request for '{name}' failed"))]
    Inference { source: BoxError, name: String },
}

/// Coarse classification of orchestration failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum ErrorKind {
    /// Input was invalid before any remote work started
    Precondition,
    /// The video could not be read or the service rejected it
    Upload,
    /// The service failed to process the video, or its state could not be read
    Processing,
    /// The video did not become ready within the poll policy's timeout
    Timeout,
    /// The generation call failed
    Inference,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::MissingVideo { .. }
            | Error::UnsupportedFormat { .. }
            | Error::EmptyQuestion
            | Error::NotReady { .. } => ErrorKind::Precondition,
            Error::ReadVideo { .. } | Error::Stage { .. } | Error::Upload { .. } => {
                ErrorKind::Upload
            }
            Error::StatusCheck { .. } | Error::Processing { .. } => ErrorKind::Processing,
            Error::Timeout { .. } => ErrorKind::Timeout,
            Error::Inference { .. } => ErrorKind::Inference,
        }
    }
}
