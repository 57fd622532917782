use super::endpoints::GoogleOauthEndpoints;
use crate::error::{DermisError, IsRetryable};
use crate::google_oauth::credentials::GoogleCredential;
use backon::{ExponentialBuilder, Retryable};
use chrono::Utc;
use oauth2::TokenResponse;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::warn;

fn default_retry_policy() -> ExponentialBuilder {
    ExponentialBuilder::default()
        .with_min_delay(Duration::from_secs(1))
        .with_max_delay(Duration::from_secs(3))
        .with_max_times(3)
        .with_jitter()
}

/// Hands out Google access tokens, refreshing lazily when the cached one is stale.
///
/// The mutex is held across the refresh so concurrent callers wait for a single
/// token exchange instead of racing their own.
#[derive(Clone)]
pub struct GoogleTokenSource {
    http: reqwest::Client,
    cred: Arc<Mutex<GoogleCredential>>,
}

impl GoogleTokenSource {
    pub fn new(cred: GoogleCredential, http: reqwest::Client) -> Self {
        Self {
            http,
            cred: Arc::new(Mutex::new(cred)),
        }
    }

    pub async fn access_token(&self) -> Result<String, DermisError> {
        let mut cred = self.cred.lock().await;
        if let Some(token) = cred.valid_access_token(Utc::now()) {
            return Ok(token.to_string());
        }

        let snapshot = cred.clone();
        let http = self.http.clone();
        let token = (|| async {
            GoogleOauthEndpoints::refresh_access_token(&snapshot, http.clone()).await
        })
        .retry(default_retry_policy())
        .when(|e: &DermisError| e.is_retryable())
        .notify(|err, dur: Duration| {
            warn!("Google token refresh retrying after error {}, sleeping {:?}", err, dur);
        })
        .await?;

        let access = token.access_token().secret().to_string();
        cred.apply_refresh(access.clone(), token.expires_in());
        Ok(access)
    }
}
