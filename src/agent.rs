//! The hosted Gemini agent behind the [`InferenceService`] port.

use async_trait::async_trait;
use snafu::{OptionExt, ResultExt, Snafu};
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::{
    client::{Error as ClientError, Gemini, DEFAULT_MODEL},
    generation::{FinishReason, GenerationResponse},
    models::FileData,
    orchestrator::{BoxError, InferenceService, RemoteHandle, VideoUpload},
    tools::Tool,
};

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("client invocation error"))]
    Client { source: ClientError },

    #[snafu(display("'{name}' is missing its {field} and cannot be referenced"))]
    MissingReference { name: String, field: &'static str },

    #[snafu(display("model returned no answer ({reason})"))]
    EmptyAnswer { reason: String },
}

/// Immutable configuration of the analyst agent.
///
/// Shared between requests through an [`Arc`]; nothing in it changes after
/// construction.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentConfig {
    pub name: String,
    pub model: String,
    /// System instruction sent with every request
    pub instructions: String,
    pub tools: Vec<Tool>,
    pub temperature: Option<f32>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: "Multimodal Analyst".to_string(),
            model: DEFAULT_MODEL.to_string(),
            instructions: "You are a multimodal analyst. You can watch videos and search the \
                           web. Use markdown to format your answers."
                .to_string(),
            tools: vec![Tool::google_search()],
            temperature: None,
        }
    }
}

impl AgentConfig {
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

/// A Gemini model configured with the analyst instructions and tools.
#[derive(Debug, Clone)]
pub struct GeminiAgent {
    gemini: Gemini,
    config: Arc<AgentConfig>,
}

impl GeminiAgent {
    pub fn new(gemini: Gemini, config: Arc<AgentConfig>) -> Self {
        Self { gemini, config }
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    #[instrument(skip_all, fields(agent.name = %self.config.name, asset.name = %asset.name))]
    async fn answer(&self, prompt: &str, asset: &RemoteHandle) -> Result<String, Error> {
        let file_data = file_data_for(asset)?;

        let mut builder = self
            .gemini
            .generate_content()
            .with_system_instruction(self.config.instructions.as_str())
            .with_user_message_and_file(prompt, file_data);
        for tool in &self.config.tools {
            builder = builder.with_tool(tool.clone());
        }
        if let Some(temperature) = self.config.temperature {
            builder = builder.with_temperature(temperature);
        }

        let response = builder.execute().await.context(ClientSnafu)?;
        log_grounding(&response);
        answer_text(&response)
    }
}

fn file_data_for(asset: &RemoteHandle) -> Result<FileData, Error> {
    let file_uri = asset.uri.clone().context(MissingReferenceSnafu {
        name: asset.name.as_str(),
        field: "URI",
    })?;
    let mime_type = asset.mime_type.as_ref().context(MissingReferenceSnafu {
        name: asset.name.as_str(),
        field: "MIME type",
    })?;
    Ok(FileData {
        mime_type: mime_type.to_string(),
        file_uri,
    })
}

fn log_grounding(response: &GenerationResponse) {
    let Some(grounding) = response.grounding_metadata() else {
        debug!("answer was not grounded in web search");
        return;
    };
    for query in &grounding.web_search_queries {
        debug!(search.query = %query, "agent searched the web");
    }
    for source in grounding.grounding_chunks.iter().filter_map(|c| c.web.as_ref()) {
        debug!(
            source.uri = source.uri.as_deref(),
            source.title = source.title.as_deref(),
            "answer grounded on web source"
        );
    }
}

fn answer_text(response: &GenerationResponse) -> Result<String, Error> {
    let text = response.text();
    if !text.trim().is_empty() {
        return Ok(text);
    }

    let reason = match (response.block_reason(), response.finish_reason()) {
        (Some(block), _) => format!("prompt blocked: {block}"),
        (None, Some(FinishReason::Stop)) | (None, None) => "empty response".to_string(),
        (None, Some(finish)) => format!("finish reason: {finish:?}"),
    };
    EmptyAnswerSnafu { reason }.fail()
}

#[async_trait]
impl InferenceService for GeminiAgent {
    async fn upload(&self, video: VideoUpload) -> Result<RemoteHandle, BoxError> {
        let file = self
            .gemini
            .create_file(video.bytes)
            .display_name(video.display_name)
            .with_mime_type(video.mime_type)
            .upload()
            .await?;
        Ok(file.into())
    }

    async fn get(&self, name: &str) -> Result<RemoteHandle, BoxError> {
        let file = self.gemini.get_file(name).await?;
        Ok(file.into())
    }

    async fn generate(&self, prompt: &str, asset: &RemoteHandle) -> Result<String, BoxError> {
        Ok(self.answer(prompt, asset).await?)
    }
}
