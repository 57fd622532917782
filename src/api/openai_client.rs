use crate::api::openai_api::OpenAiApi;
use crate::config::OpenAiConfig;
use crate::error::DermisError;
use crate::types::openai::{ResponsesReply, ResponsesRequest};
use backon::ExponentialBuilder;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::StatusCode;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Higher-level caller over the stateless [`OpenAiApi`]: rate limiting, status
/// checks and text extraction.
#[derive(Clone)]
pub struct OpenAiClient {
    http: reqwest::Client,
    url: Url,
    api_key: Arc<str>,
    limiter: Arc<DefaultDirectRateLimiter>,
    max_retries: usize,
}

impl OpenAiClient {
    pub fn new(http: reqwest::Client, cfg: &OpenAiConfig) -> Result<Self, DermisError> {
        let per_minute = NonZeroU32::new(cfg.requests_per_minute).unwrap_or(NonZeroU32::MIN);
        Ok(Self {
            http,
            url: cfg.responses_url()?,
            api_key: Arc::from(cfg.api_key.as_str()),
            limiter: Arc::new(RateLimiter::direct(Quota::per_minute(per_minute))),
            max_retries: cfg.max_retries,
        })
    }

    fn retry_policy(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(Duration::from_millis(500))
            .with_max_delay(Duration::from_secs(3))
            .with_max_times(self.max_retries)
            .with_jitter()
    }

    /// Send one Responses request and return the concatenated output text.
    pub async fn respond(&self, request: &ResponsesRequest) -> Result<String, DermisError> {
        if self.api_key.is_empty() {
            return Err(DermisError::NotConfigured("OpenAI API key"));
        }

        self.limiter.until_ready().await;

        let resp = OpenAiApi::try_post_responses(
            self.http.clone(),
            &self.url,
            self.api_key.as_ref(),
            self.retry_policy(),
            request,
        )
        .await?;

        let status = resp.status();
        if status != StatusCode::OK {
            let body = resp.text().await.unwrap_or_default();
            warn!(model = %request.model, status = %status, body = %body, "OpenAI rejected request");
            return Err(DermisError::UpstreamStatus(status));
        }

        let bytes = resp.bytes().await?;
        let reply: ResponsesReply = serde_json::from_slice(&bytes)
            .map_err(|e| DermisError::UpstreamDecode(e.to_string()))?;

        if let Some(err) = reply.error {
            return Err(DermisError::OpenAi(
                err.message.unwrap_or_else(|| "Unknown error".to_string()),
            ));
        }

        let text = reply.output_text();
        if text.is_empty() {
            return Err(DermisError::EmptyCompletion);
        }
        debug!(model = %request.model, chars = text.len(), "OpenAI response received");
        Ok(text)
    }
}
