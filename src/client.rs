use reqwest::{
    header::{HeaderMap, HeaderValue, InvalidHeaderValue},
    Client, ClientBuilder, RequestBuilder, Response,
};
use serde::{de::DeserializeOwned, Deserialize};
use snafu::{OptionExt, ResultExt, Snafu};
use std::sync::Arc;
use tracing::instrument;
use url::Url;

use crate::{
    files::{File, FileBuilder},
    generation::{ContentBuilder, GenerateContentRequest, GenerationResponse},
};

/// Base URL of the Gemini REST API.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/";
const UPLOAD_PATH: &str = "/upload/v1beta/files";
const API_KEY_HEADER: &str = "x-goog-api-key";
const UPLOAD_URL_HEADER: &str = "x-goog-upload-url";

/// Default model used by the video agent.
pub const DEFAULT_MODEL: &str = "models/gemini-2.0-flash";

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("missing API key"))]
    MissingApiKey,

    #[snafu(display("API key is not a valid header value"))]
    InvalidApiKey { source: InvalidHeaderValue },

    #[snafu(display("failed to construct HTTP client"))]
    ConstructHttpClient { source: reqwest::Error },

    #[snafu(display("failed to parse base URL '{base_url}'"))]
    ParseBaseUrl {
        source: url::ParseError,
        base_url: String,
    },

    #[snafu(display("failed to construct URL (probably incorrect model name): {suffix}"))]
    ConstructUrl {
        source: url::ParseError,
        suffix: String,
    },

    #[snafu(display("failed to perform request to '{url}'"))]
    PerformRequest { source: reqwest::Error, url: Url },

    #[snafu(display(
        "bad response from server; code {code}; description: {}",
        description.as_deref().unwrap_or("none")
    ))]
    BadResponse {
        /// HTTP status code
        code: u16,
        /// HTTP error description
        description: Option<String>,
    },

    #[snafu(display("response is missing the '{header}' header"))]
    MissingResponseHeader { header: String },

    #[snafu(display("failed to deserialize JSON response"))]
    DecodeResponse { source: reqwest::Error },
}

/// Internal client for making requests to the Gemini API
#[derive(Debug)]
pub(crate) struct GeminiClient {
    http_client: Client,
    pub model: String,
    base_url: Url,
}

impl GeminiClient {
    fn new(api_key: &str, model: String, base_url: Url) -> Result<Self, Error> {
        if api_key.trim().is_empty() {
            return MissingApiKeySnafu.fail();
        }

        let mut api_key = HeaderValue::from_str(api_key).context(InvalidApiKeySnafu)?;
        api_key.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, api_key);

        let http_client = ClientBuilder::new()
            .default_headers(headers)
            .build()
            .context(ConstructHttpClientSnafu)?;

        Ok(Self {
            http_client,
            model,
            base_url,
        })
    }

    /// Generate content
    #[instrument(skip_all, fields(model = %self.model))]
    pub(crate) async fn generate_content_raw(
        &self,
        request: GenerateContentRequest,
    ) -> Result<GenerationResponse, Error> {
        let url = self.build_url(&format!("{}:generateContent", self.model))?;
        self.post_json(url, &request).await
    }

    /// Upload a file using the resumable upload protocol.
    ///
    /// The first request opens an upload session and returns its URL in a
    /// response header; the second sends the bytes and finalizes the file.
    #[instrument(skip_all, fields(
        file.size = file_bytes.len(),
        mime.type = %mime_type,
        display_name = display_name.as_deref(),
    ))]
    pub(crate) async fn upload_file(
        &self,
        display_name: Option<String>,
        file_bytes: Vec<u8>,
        mime_type: mime::Mime,
    ) -> Result<File, Error> {
        let start_url = self
            .base_url
            .join(UPLOAD_PATH)
            .context(ConstructUrlSnafu {
                suffix: UPLOAD_PATH.to_string(),
            })?;

        let metadata = serde_json::json!({ "file": { "displayName": display_name } });
        let session = self
            .perform(
                start_url.clone(),
                self.http_client
                    .post(start_url.clone())
                    .header("X-Goog-Upload-Protocol", "resumable")
                    .header("X-Goog-Upload-Command", "start")
                    .header("X-Goog-Upload-Header-Content-Length", file_bytes.len())
                    .header("X-Goog-Upload-Header-Content-Type", mime_type.to_string())
                    .json(&metadata),
            )
            .await?;

        let upload_url = session
            .headers()
            .get(UPLOAD_URL_HEADER)
            .and_then(|value| value.to_str().ok())
            .context(MissingResponseHeaderSnafu {
                header: UPLOAD_URL_HEADER,
            })?;
        let upload_url = Url::parse(upload_url).context(ConstructUrlSnafu {
            suffix: upload_url.to_string(),
        })?;

        let response = self
            .perform(
                upload_url.clone(),
                self.http_client
                    .post(upload_url)
                    .header("X-Goog-Upload-Offset", 0)
                    .header("X-Goog-Upload-Command", "upload, finalize")
                    .body(file_bytes),
            )
            .await?;

        #[derive(Deserialize)]
        struct UploadResponse {
            file: File,
        }

        let uploaded: UploadResponse = response.json().await.context(DecodeResponseSnafu)?;
        Ok(uploaded.file)
    }

    /// Get file metadata
    #[instrument(skip_all, fields(file.name = name))]
    pub(crate) async fn get_file(&self, name: &str) -> Result<File, Error> {
        let url = self.build_url(name)?;
        let response = self
            .perform(url.clone(), self.http_client.get(url))
            .await?;
        response.json().await.context(DecodeResponseSnafu)
    }

    /// Post JSON to an endpoint and decode the response body
    async fn post_json<Req, Res>(&self, url: Url, request: &Req) -> Result<Res, Error>
    where
        Req: serde::Serialize,
        Res: DeserializeOwned,
    {
        let response = self
            .perform(url.clone(), self.http_client.post(url).json(request))
            .await?;
        response.json().await.context(DecodeResponseSnafu)
    }

    async fn perform(&self, url: Url, request: RequestBuilder) -> Result<Response, Error> {
        let response = request.send().await.context(PerformRequestSnafu { url })?;
        Self::check_response(response).await
    }

    /// Checks if the response status is successful and converts an unsuccessful
    /// response into a `BadResponse` error carrying the body text.
    async fn check_response(response: Response) -> Result<Response, Error> {
        let status = response.status();
        if !status.is_success() {
            let description = response.text().await.ok();
            BadResponseSnafu {
                code: status.as_u16(),
                description,
            }
            .fail()
        } else {
            Ok(response)
        }
    }

    /// Build a URL relative to the API base
    fn build_url(&self, suffix: &str) -> Result<Url, Error> {
        self.base_url.join(suffix).context(ConstructUrlSnafu {
            suffix: suffix.to_string(),
        })
    }
}

/// Client for the Gemini API
#[derive(Clone, Debug)]
pub struct Gemini {
    client: Arc<GeminiClient>,
}

impl Gemini {
    /// Create a new client with the specified API key
    pub fn new(api_key: impl AsRef<str>) -> Result<Self, Error> {
        Self::with_model(api_key, DEFAULT_MODEL.to_string())
    }

    /// Create a new client with the specified API key and model
    pub fn with_model(api_key: impl AsRef<str>, model: String) -> Result<Self, Error> {
        Self::with_model_and_base_url(api_key, model, DEFAULT_BASE_URL)
    }

    /// Create a new client with the specified API key, model, and base URL
    pub fn with_model_and_base_url(
        api_key: impl AsRef<str>,
        model: String,
        base_url: &str,
    ) -> Result<Self, Error> {
        let base_url = parse_base_url(base_url)?;
        let client = GeminiClient::new(api_key.as_ref(), normalize_model(model), base_url)?;
        Ok(Self {
            client: Arc::new(client),
        })
    }

    /// The fully-qualified model name used for generation requests.
    pub fn model(&self) -> &str {
        &self.client.model
    }

    /// Start building a content generation request
    pub fn generate_content(&self) -> ContentBuilder {
        ContentBuilder::new(self.client.clone())
    }

    /// Start building a file upload
    pub fn create_file<B: Into<Vec<u8>>>(&self, bytes: B) -> FileBuilder {
        FileBuilder::new(self.client.clone(), bytes)
    }

    /// Fetch the current metadata of an uploaded file by its name, e.g. `files/abc123`.
    pub async fn get_file(&self, name: &str) -> Result<File, Error> {
        self.client.get_file(name).await
    }
}

/// Accepts model ids with or without the `models/` prefix.
fn normalize_model(model: String) -> String {
    if model.starts_with("models/") || model.starts_with("tunedModels/") {
        model
    } else {
        format!("models/{model}")
    }
}

/// `Url::join` drops the last path segment unless the base ends with a slash.
fn parse_base_url(base_url: &str) -> Result<Url, Error> {
    let with_slash = if base_url.ends_with('/') {
        base_url.to_string()
    } else {
        format!("{base_url}/")
    };
    Url::parse(&with_slash).context(ParseBaseUrlSnafu { base_url })
}
