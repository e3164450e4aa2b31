use mime::Mime;
use std::sync::Arc;

use crate::{
    client::{Error as ClientError, GeminiClient},
    files::model::File,
};

/// A builder for creating a file resource.
pub struct FileBuilder {
    client: Arc<GeminiClient>,
    file_bytes: Vec<u8>,
    display_name: Option<String>,
    mime_type: Option<Mime>,
}

impl FileBuilder {
    pub(crate) fn new<B: Into<Vec<u8>>>(client: Arc<GeminiClient>, file_bytes: B) -> Self {
        Self {
            client,
            file_bytes: file_bytes.into(),
            display_name: None,
            mime_type: None,
        }
    }

    /// The display name of the file.
    pub fn display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    /// The MIME type of the file.
    ///
    /// When not set, the type is guessed from the display name's extension.
    pub fn with_mime_type(mut self, mime_type: Mime) -> Self {
        self.mime_type = Some(mime_type);
        self
    }

    fn resolved_mime_type(&self) -> Mime {
        self.mime_type.clone().unwrap_or_else(|| {
            self.display_name
                .as_deref()
                .and_then(|name| mime_guess::from_path(name).first())
                .unwrap_or(mime::APPLICATION_OCTET_STREAM)
        })
    }

    /// Upload the file, returning the metadata the service assigned to it.
    pub async fn upload(self) -> Result<File, ClientError> {
        let mime_type = self.resolved_mime_type();
        self.client
            .upload_file(self.display_name, self.file_bytes, mime_type)
            .await
    }
}
