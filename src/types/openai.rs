//! Request and response shapes for the OpenAI Responses API (`POST /v1/responses`).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
pub struct ResponsesRequest {
    pub model: String,
    pub input: Vec<InputMessage>,
    pub max_output_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct InputMessage {
    pub role: Role,
    pub content: MessageContent,
}

impl InputMessage {
    pub fn developer(instruction: impl Into<String>) -> Self {
        Self {
            role: Role::Developer,
            content: MessageContent::Text(instruction.into()),
        }
    }

    pub fn user(parts: Vec<ContentPart>) -> Self {
        Self {
            role: Role::User,
            content: MessageContent::Parts(parts),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Developer,
    User,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    InputText { text: String },
    InputImage { image_url: String },
}

impl ContentPart {
    pub fn text(text: impl Into<String>) -> Self {
        Self::InputText { text: text.into() }
    }

    pub fn image(data_uri: impl Into<String>) -> Self {
        Self::InputImage {
            image_url: data_uri.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ResponsesReply {
    #[serde(default)]
    pub output: Option<Vec<OutputItem>>,
    #[serde(default)]
    pub error: Option<ReplyError>,
}

#[derive(Debug, Deserialize)]
pub struct OutputItem {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub content: Option<Vec<OutputContent>>,
}

#[derive(Debug, Deserialize)]
pub struct OutputContent {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ReplyError {
    #[serde(default)]
    pub message: Option<String>,
}

impl ResponsesReply {
    /// Concatenates every `output_text` part of every `message` item.
    /// Falls back to `output[0].content[0].text` when no message text exists.
    pub fn output_text(&self) -> String {
        let Some(output) = self.output.as_deref() else {
            return String::new();
        };

        let joined: String = output
            .iter()
            .filter(|item| item.kind.as_deref() == Some("message"))
            .filter_map(|item| item.content.as_deref())
            .flatten()
            .filter(|part| part.kind.as_deref() == Some("output_text"))
            .filter_map(|part| part.text.as_deref())
            .collect();

        if !joined.is_empty() {
            return joined;
        }

        output
            .first()
            .and_then(|item| item.content.as_deref())
            .and_then(|parts| parts.first())
            .and_then(|part| part.text.clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn reply(value: serde_json::Value) -> ResponsesReply {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn joins_output_text_across_messages_and_skips_reasoning() {
        let r = reply(json!({
            "output": [
                {"type": "reasoning", "summary": []},
                {"type": "message", "content": [
                    {"type": "output_text", "text": "<h2>Skin</h2>"},
                    {"type": "refusal", "refusal": "no"},
                    {"type": "output_text", "text": "<p>ok</p>"}
                ]},
                {"type": "message", "content": [{"type": "output_text", "text": "!"}]}
            ],
            "error": null
        }));
        assert_eq!(r.output_text(), "<h2>Skin</h2><p>ok</p>!");
        assert!(r.error.is_none());
    }

    #[test]
    fn falls_back_to_first_content_text() {
        let r = reply(json!({
            "output": [{"type": "custom", "content": [{"type": "text", "text": "raw"}]}]
        }));
        assert_eq!(r.output_text(), "raw");
    }

    #[test]
    fn missing_output_yields_empty_text() {
        assert_eq!(reply(json!({})).output_text(), "");
        assert_eq!(reply(json!({"output": null})).output_text(), "");
    }

    #[test]
    fn vision_request_serializes_typed_parts() {
        let req = ResponsesRequest {
            model: "gpt-5-mini".into(),
            input: vec![
                InputMessage::developer("inspect"),
                InputMessage::user(vec![
                    ContentPart::text("Age: 30"),
                    ContentPart::image("data:image/png;base64,AAAA"),
                ]),
            ],
            max_output_tokens: 5000,
            temperature: None,
        };
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(v["input"][0], json!({"role": "developer", "content": "inspect"}));
        assert_eq!(v["input"][1]["content"][0]["type"], "input_text");
        assert_eq!(
            v["input"][1]["content"][1],
            json!({"type": "input_image", "image_url": "data:image/png;base64,AAAA"})
        );
        assert!(v.get("temperature").is_none());
    }
}
