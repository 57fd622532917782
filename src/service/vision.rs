//! Skin analysis: builds the vision request and runs it.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tracing::{debug, info};

use crate::api::openai_client::OpenAiClient;
use crate::config::{OpenAiConfig, VISION_PROMPT_MODEL};
use crate::error::DermisError;
use crate::service::prompt_store::PromptStore;
use crate::types::openai::{ContentPart, InputMessage, ResponsesRequest};
use crate::types::profile::UserDetail;

const OCTET_STREAM_PREFIX: &str = "data:application/octet-stream;base64,";
const PNG_PREFIX: &str = "data:image/png;base64,";
const DEFAULT_MIME: &str = "image/png";

pub const ANALYSIS_NOTICE: &str = "Analysis executed successfully";

pub const HTML_FORMAT_INSTRUCTION: &str = "IMPORTANT: Format your response using HTML tags for proper structure:
- Use <h2> for main section headings
- Use <h3> for sub-section headings
- Use <p class=\"final-result-para\"> for paragraphs
- Use <ul> and <li> for lists
- Use <strong> for emphasis
Structure your response with clear HTML formatting to make it easy to read and understand.

Note: Avoid too much margin bottom between <p> tags.";

const PROFILE_LINES: [(&str, &str); 4] = [
    ("fullName", "Name"),
    ("age", "Age"),
    ("gender", "Gender"),
    ("skinType", "Skin Type"),
];

/// Camera captures arrive as octet-stream; the model only accepts image types.
pub fn normalize_data_uri(image: &str) -> String {
    match image.strip_prefix(OCTET_STREAM_PREFIX) {
        Some(payload) => format!("{PNG_PREFIX}{payload}"),
        None => image.to_string(),
    }
}

pub fn data_uri_mime(image: &str) -> &str {
    image
        .strip_prefix("data:")
        .and_then(|rest| rest.split_once(';'))
        .map(|(mime, _)| mime)
        .filter(|mime| !mime.is_empty())
        .unwrap_or(DEFAULT_MIME)
}

/// Raw bytes behind a `data:<mime>;base64,<payload>` URI (or a bare base64 string).
pub fn decode_data_uri(image: &str) -> Result<Vec<u8>, DermisError> {
    let payload = image
        .split_once(";base64,")
        .map(|(_, p)| p)
        .unwrap_or(image);
    Ok(STANDARD.decode(payload.trim())?)
}

pub fn build_user_text(air_quality: &str, user: &UserDetail) -> String {
    let mut lines = vec![air_quality.to_string()];
    for (key, label) in PROFILE_LINES {
        if let Some(value) = user.meaningful_field(key) {
            lines.push(format!("{label}: {value}"));
        }
    }
    lines.join("\n")
}

pub fn build_request(
    cfg: &OpenAiConfig,
    instruction: &str,
    user_text: String,
    image: &str,
) -> ResponsesRequest {
    ResponsesRequest {
        model: cfg.vision_model.clone(),
        input: vec![
            InputMessage::developer(instruction),
            InputMessage::user(vec![
                ContentPart::text(user_text),
                ContentPart::image(image),
                ContentPart::text(HTML_FORMAT_INSTRUCTION),
            ]),
        ],
        max_output_tokens: cfg.vision_max_output_tokens,
        temperature: None,
    }
}

#[derive(Clone)]
pub struct VisionService {
    client: OpenAiClient,
    prompts: PromptStore,
    cfg: OpenAiConfig,
}

impl VisionService {
    pub fn new(client: OpenAiClient, prompts: PromptStore, cfg: OpenAiConfig) -> Self {
        Self {
            client,
            prompts,
            cfg,
        }
    }

    /// Returns the model's HTML analysis for a normalized image data URI.
    pub async fn analyze(
        &self,
        image: &str,
        user: &UserDetail,
        air_quality: &str,
    ) -> Result<String, DermisError> {
        let instruction = self
            .prompts
            .get(VISION_PROMPT_MODEL)
            .await?
            .ok_or(DermisError::PromptMissing("Vision"))?;

        let user_text = build_user_text(air_quality, user);
        debug!(user_text = %user_text, "vision user text");

        let request = build_request(&self.cfg, &instruction, user_text, image);
        let html = self.client.respond(&request).await?;
        info!(model = %request.model, image_bytes = image.len(), chars = html.len(), "analysis completed");
        Ok(html)
    }
}
