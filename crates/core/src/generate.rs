//! SEO metadata generation through a chat-completions API.
//!
//! The generator sends one prompt per record and expects the reply to be a
//! JSON object with exactly `meta_keywords` and `meta_description`. Anything
//! else (transport failure, non-2xx status, unexpected response shape,
//! commentary around the JSON) is a [`GenerationError`]. No retries happen
//! here.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::GeneratorSettings;
use crate::error::GenerationError;
use crate::record::GeneratedMeta;
use crate::{MetagenError, Result};

/// Upper bound asked of the model for `meta_description`.
pub const DESCRIPTION_MAX_CHARS: usize = 160;

/// Non-2xx bodies are cut to this many characters in errors.
const ERROR_BODY_CHARS: usize = 200;

/// Produces keywords and a description for an article.
#[async_trait]
pub trait MetaGenerator: Send + Sync {
    async fn generate(&self, title: &str, content: &str) -> std::result::Result<GeneratedMeta, GenerationError>;
}

/// Builds the instruction sent to the model.
pub fn build_prompt(title: &str, content: &str) -> String {
    format!(
        "Generate SEO-optimized meta_keywords and meta_description for an article, following these rules:\n\
         1. **meta_keywords**: 5-10 keywords or key phrases relevant to the content, separated by commas. \
         Use only meaningful terms and leave out stop words.\n\
         2. **meta_description**: a short description of at most {max} characters that intrigues the reader \
         or states the benefit to them. It must include the primary keyword and a call to action.\n\
         Do not repeat the call to action (for example, \"Discover\" and \"Read\" in one description is redundant).\n\
         3. **Tone**: formal but accessible. Write in the language of the article.\n\n\
         Source data:\n\
         - Title: {title}\n\
         - Content: {content}\n\n\
         Answer strictly in JSON with no explanations, for example:\n\
         {{\"meta_keywords\": \"key, words\", \"meta_description\": \"description\"}}\n\
         Do not add any other fields or text.",
        max = DESCRIPTION_MAX_CHARS,
        title = title,
        content = content,
    )
}

/// Removes Markdown code fences the model sometimes wraps JSON in.
pub fn strip_code_fences(raw: &str) -> String {
    raw.replace("```json", "").replace("```", "").trim().to_string()
}

/// Parses the message content of a completion into metadata.
pub fn parse_payload(raw: &str) -> std::result::Result<GeneratedMeta, GenerationError> {
    let cleaned = strip_code_fences(raw);
    let meta: GeneratedMeta =
        serde_json::from_str(&cleaned).map_err(|e| GenerationError::InvalidPayload(e.to_string()))?;

    let meta_keywords = meta.meta_keywords.trim().to_string();
    let meta_description = meta.meta_description.trim().to_string();

    if meta_keywords.is_empty() {
        return Err(GenerationError::BlankField("meta_keywords"));
    }
    if meta_description.is_empty() {
        return Err(GenerationError::BlankField("meta_description"));
    }

    Ok(GeneratedMeta { meta_keywords, meta_description })
}

/// Pulls `choices[0].message.content` out of a completion body and parses it.
pub fn parse_completion(body: &str) -> std::result::Result<GeneratedMeta, GenerationError> {
    let response: ChatResponse =
        serde_json::from_str(body).map_err(|e| GenerationError::MalformedResponse(e.to_string()))?;

    let choice = response.choices.into_iter().next().ok_or(GenerationError::EmptyChoices)?;
    let content = choice
        .message
        .and_then(|m| m.content)
        .ok_or(GenerationError::MissingContent)?;

    parse_payload(&content)
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    temperature: f32,
    max_tokens: u32,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// DeepSeek chat-completions client (any OpenAI-compatible endpoint works).
#[derive(Debug, Clone)]
pub struct DeepSeekGenerator {
    client: Client,
    settings: GeneratorSettings,
}

impl DeepSeekGenerator {
    /// Creates a client with the configured request timeout.
    pub fn new(settings: GeneratorSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|e| MetagenError::ConfigError(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { client, settings })
    }

    pub fn settings(&self) -> &GeneratorSettings {
        &self.settings
    }

    fn transport_error(&self, err: reqwest::Error) -> GenerationError {
        if err.is_timeout() {
            GenerationError::Timeout { timeout: self.settings.timeout.as_secs() }
        } else {
            GenerationError::Http(err)
        }
    }
}

#[async_trait]
impl MetaGenerator for DeepSeekGenerator {
    async fn generate(&self, title: &str, content: &str) -> std::result::Result<GeneratedMeta, GenerationError> {
        let prompt = build_prompt(title, content);
        let request = ChatRequest {
            model: &self.settings.model,
            messages: [ChatMessage { role: "user", content: &prompt }],
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_tokens,
            response_format: ResponseFormat { kind: "json_object" },
        };

        debug!(model = %self.settings.model, prompt_chars = prompt.chars().count(), "requesting metadata");

        let response = self
            .client
            .post(self.settings.api_url.clone())
            .bearer_auth(&self.settings.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| self.transport_error(e))?;

        if !status.is_success() {
            return Err(GenerationError::Status {
                status: status.as_u16(),
                body: body.chars().take(ERROR_BODY_CHARS).collect(),
            });
        }

        let meta = parse_completion(&body)?;
        let description_chars = meta.meta_description.chars().count();
        if description_chars > DESCRIPTION_MAX_CHARS {
            warn!(description_chars, "generated description exceeds the requested length");
        }
        Ok(meta)
    }
}
