use std::sync::Arc;
use tracing::instrument;

use crate::{
    client::{Error as ClientError, GeminiClient},
    generation::{GenerateContentRequest, GenerationConfig, GenerationResponse},
    models::{Content, FileData, Role},
    tools::Tool,
};

/// Builder for content generation requests
#[derive(Clone)]
pub struct ContentBuilder {
    client: Arc<GeminiClient>,
    pub contents: Vec<Content>,
    generation_config: Option<GenerationConfig>,
    tools: Option<Vec<Tool>>,
    system_instruction: Option<Content>,
}

impl ContentBuilder {
    /// Creates a new `ContentBuilder`.
    pub(crate) fn new(client: Arc<GeminiClient>) -> Self {
        Self {
            client,
            contents: Vec::new(),
            generation_config: None,
            tools: None,
            system_instruction: None,
        }
    }

    /// Sets the system instruction for the request.
    ///
    /// System instructions are used to provide high-level guidance to the model, such as
    /// setting a persona, providing context, or defining the desired output format.
    pub fn with_system_instruction(mut self, text: impl Into<String>) -> Self {
        self.system_instruction = Some(Content::text(text));
        self
    }

    /// Adds a user message, together with coordinates for a previously uploaded file.
    ///
    /// Uploading a file and using it avoids encoding large files and sending them, in particular
    /// when this would need to happen more than once with a file.
    pub fn with_user_message_and_file(
        mut self,
        text: impl Into<String>,
        file_data: FileData,
    ) -> Self {
        let content = Content::text_with_file(text, file_data).with_role(Role::User);
        self.contents.push(content);
        self
    }

    /// Sets the temperature for the request.
    ///
    /// Temperature controls the randomness of the output. Higher values (e.g., 1.0) produce
    /// more creative results, while lower values (e.g., 0.2) produce more deterministic results.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.generation_config
            .get_or_insert_with(Default::default)
            .temperature = Some(temperature);
        self
    }

    /// Adds a tool to the request.
    pub fn with_tool(mut self, tool: Tool) -> Self {
        self.tools.get_or_insert_with(Vec::new).push(tool);
        self
    }

    /// Builds the `GenerateContentRequest`.
    pub fn build(self) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: self.contents,
            generation_config: self.generation_config,
            tools: self.tools,
            system_instruction: self.system_instruction,
        }
    }

    /// Executes the content generation request.
    #[instrument(skip_all, fields(
        messages.parts.count = self.contents.len(),
        tools.present = self.tools.is_some(),
        system.instruction.present = self.system_instruction.is_some(),
    ))]
    pub async fn execute(self) -> Result<GenerationResponse, ClientError> {
        let client = self.client.clone();
        let request = self.build();
        client.generate_content_raw(request).await
    }
}

#[cfg(test)]
mod tests {
    use crate::{models::FileData, Gemini, Tool};
    use serde_json::json;

    #[test]
    fn request_carries_file_tool_and_instruction() {
        let gemini = Gemini::new("key").unwrap();
        let file_data = FileData {
            mime_type: "video/mp4".to_string(),
            file_uri: "https://example.com/v1beta/files/h1".parse().unwrap(),
        };

        let request = gemini
            .generate_content()
            .with_system_instruction("Use markdown to format your answers.")
            .with_user_message_and_file("What product is shown?", file_data)
            .with_tool(Tool::google_search())
            .with_temperature(0.4)
            .build();

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["tools"], json!([{ "googleSearch": {} }]));
        assert_eq!(
            value["systemInstruction"],
            json!({ "parts": [{ "text": "Use markdown to format your answers." }] })
        );
        assert_eq!(value["contents"][0]["role"], "user");
        assert_eq!(
            value["contents"][0]["parts"][0]["fileData"]["fileUri"],
            "https://example.com/v1beta/files/h1"
        );
        assert_eq!(value["contents"][0]["parts"][1]["text"], "What product is shown?");
        assert_eq!(value["generationConfig"]["temperature"], json!(0.4f32));
    }

    #[test]
    fn plain_request_omits_optional_sections() {
        let gemini = Gemini::new("key").unwrap();
        let file_data = FileData {
            mime_type: "video/mp4".to_string(),
            file_uri: "https://example.com/v1beta/files/h1".parse().unwrap(),
        };
        let request = gemini
            .generate_content()
            .with_user_message_and_file("hi", file_data)
            .build();
        let value = serde_json::to_value(&request).unwrap();

        assert!(value.get("tools").is_none());
        assert!(value.get("systemInstruction").is_none());
        assert!(value.get("generationConfig").is_none());
    }
}
