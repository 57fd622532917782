use serde::Serialize;

/// `{msg, notice, result?}` envelope shared by every JSON endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ApiReply<T: Serialize = serde_json::Value> {
    pub msg: ReplyStatus,
    pub notice: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<T>,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReplyStatus {
    Success,
    Error,
}

impl ApiReply {
    pub fn error(notice: impl Into<String>) -> Self {
        Self {
            msg: ReplyStatus::Error,
            notice: notice.into(),
            result: None,
        }
    }

    /// Success without a `result` member.
    pub fn done(notice: impl Into<String>) -> Self {
        Self {
            msg: ReplyStatus::Success,
            notice: notice.into(),
            result: None,
        }
    }
}

impl<T: Serialize> ApiReply<T> {
    pub fn success(notice: impl Into<String>, result: T) -> Self {
        Self {
            msg: ReplyStatus::Success,
            notice: notice.into(),
            result: Some(result),
        }
    }
}

/// Analysis replies also carry the archived image link (`null` when not archived).
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReply {
    pub msg: ReplyStatus,
    pub notice: String,
    pub result: String,
    #[serde(rename = "fileUrl")]
    pub file_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MagicReply {
    pub msg: ReplyStatus,
    pub notice: String,
    pub result: String,
    #[serde(rename = "personalizedText")]
    pub personalized_text: String,
}
