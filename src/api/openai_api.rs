use crate::error::{DermisError, IsRetryable};
use backon::{ExponentialBuilder, Retryable};
use tracing::error;
use url::Url;

pub struct OpenAiApi;

impl OpenAiApi {
    /// POST a Responses API body, retrying transport errors and 5xx.
    pub async fn try_post_responses<T>(
        client: reqwest::Client,
        url: &Url,
        api_key: impl AsRef<str>,
        retry_policy: ExponentialBuilder,
        body: &T,
    ) -> Result<reqwest::Response, DermisError>
    where
        T: serde::Serialize,
    {
        (|| async {
            let resp = client
                .post(url.clone())
                .bearer_auth(api_key.as_ref())
                .json(body)
                .send()
                .await?;
            let status = resp.status();
            if status.is_server_error() {
                error!("OpenAI upstream error (will retry): {}", status);
                return Err(DermisError::UpstreamStatus(status));
            }
            Ok(resp)
        })
        .retry(retry_policy)
        .when(|e: &DermisError| e.is_retryable())
        .await
    }
}
