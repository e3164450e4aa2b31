//! Request-scoped temporary copies of user-supplied videos.
//!
//! A [`StagedVideo`] owns a uniquely named temporary file holding the bytes
//! of one uploaded video. The file lives exactly as long as the value: it is
//! removed by [`StagedVideo::close`] or, failing that, on drop.

use mime::Mime;
use snafu::{OptionExt, ResultExt, Snafu};
use std::{io::Write, path::Path};
use strum::{EnumIter, IntoEnumIterator};
use tempfile::{Builder, TempPath};
use tracing::{debug, warn};

const TEMP_PREFIX: &str = "video-analyst-";

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display(
        "unsupported video format '{extension}'; expected one of: {}",
        VideoFormat::supported_extensions().join(", ")
    ))]
    UnsupportedFormat { extension: String },

    #[snafu(display("failed to create temporary file for staged video"))]
    CreateTemp { source: std::io::Error },

    #[snafu(display("failed to write staged video"))]
    WriteTemp { source: std::io::Error },
}

/// Video container formats accepted for analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter)]
pub enum VideoFormat {
    Mp4,
    Mov,
    Avi,
}

impl VideoFormat {
    /// Resolves a format from a file extension, ignoring case and a leading dot.
    pub fn from_extension(extension: &str) -> Result<Self, Error> {
        let normalized = extension.trim_start_matches('.').to_ascii_lowercase();
        Self::iter()
            .find(|format| format.extension() == normalized)
            .context(UnsupportedFormatSnafu {
                extension: extension.to_string(),
            })
    }

    /// Resolves a format from the extension of `path`.
    pub fn from_path(path: &Path) -> Result<Self, Error> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default();
        Self::from_extension(extension)
    }

    pub fn extension(self) -> &'static str {
        match self {
            VideoFormat::Mp4 => "mp4",
            VideoFormat::Mov => "mov",
            VideoFormat::Avi => "avi",
        }
    }

    /// The MIME type the inference service expects for this container.
    pub fn mime_type(self) -> Mime {
        mime_guess::from_ext(self.extension()).first_or_octet_stream()
    }

    pub fn supported_extensions() -> Vec<&'static str> {
        Self::iter().map(Self::extension).collect()
    }
}

/// A video held in a request-scoped temporary file.
#[derive(Debug)]
pub struct StagedVideo {
    path: TempPath,
    format: VideoFormat,
    original_name: Option<String>,
}

impl StagedVideo {
    /// Stages raw bytes, e.g. from an upload form, under a fresh temporary name.
    ///
    /// The temporary file keeps the extension of `format`, so the container
    /// type of the upload is preserved rather than normalized.
    pub fn from_bytes(bytes: &[u8], format: VideoFormat) -> Result<Self, Error> {
        let suffix = format!(".{}", format.extension());
        let mut file = Builder::new()
            .prefix(TEMP_PREFIX)
            .suffix(&suffix)
            .tempfile()
            .context(CreateTempSnafu)?;
        file.write_all(bytes).context(WriteTempSnafu)?;
        file.flush().context(WriteTempSnafu)?;

        let path = file.into_temp_path();
        debug!(staged.path = %path.display(), staged.size = bytes.len(), "video staged");

        Ok(Self {
            path,
            format,
            original_name: None,
        })
    }

    /// Sets the name presented to the remote service, usually the name of
    /// the file the bytes came from.
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.original_name = Some(name.into());
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> VideoFormat {
        self.format
    }

    /// Name to present to the remote service: the original file name when
    /// known, otherwise the temporary file's name.
    pub fn display_name(&self) -> String {
        self.original_name.clone().unwrap_or_else(|| {
            self.path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| format!("video.{}", self.format.extension()))
        })
    }

    /// Deletes the temporary file. Failures are logged, not returned.
    pub fn close(self) {
        let path = self.path.to_path_buf();
        match self.path.close() {
            Ok(()) => debug!(staged.path = %path.display(), "staged video removed"),
            Err(e) => warn!(
                staged.path = %path.display(),
                error = %e,
                "failed to remove staged video"
            ),
        }
    }
}
