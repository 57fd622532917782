use crate::config::GOOGLE_TOKEN_URI;
use crate::error::DermisError;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{fs, path::Path};

/// Authorized-user credential used for the Drive and Sheets archive.
///
/// Same file format `gcloud auth application-default login` writes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GoogleCredential {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default = "expired")]
    pub expiry: DateTime<Utc>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn expired() -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH
}

fn default_token_uri() -> String {
    GOOGLE_TOKEN_URI.to_string()
}

impl GoogleCredential {
    pub fn from_payload(payload: &Value) -> Result<Self, DermisError> {
        let cred: GoogleCredential = serde_json::from_value(payload.clone())?;
        if cred.refresh_token.is_empty() {
            return Err(DermisError::Oauth2Token(
                "credential file has an empty refresh_token".to_string(),
            ));
        }
        Ok(cred)
    }

    pub fn load_from_file(path: &Path) -> Result<Self, DermisError> {
        let contents = fs::read_to_string(path)?;
        let value: Value = serde_json::from_str(&contents)?;
        Self::from_payload(&value)
    }

    /// Usable access token, treating anything within a minute of expiry as stale.
    pub fn valid_access_token(&self, now: DateTime<Utc>) -> Option<&str> {
        let token = self.access_token.as_deref().filter(|t| !t.is_empty())?;
        (self.expiry - Duration::seconds(60) > now).then_some(token)
    }

    pub fn apply_refresh(&mut self, access_token: String, expires_in: Option<std::time::Duration>) {
        let lifetime = expires_in
            .and_then(|d| Duration::from_std(d).ok())
            .unwrap_or_else(|| Duration::seconds(3600));
        self.access_token = Some(access_token);
        self.expiry = Utc::now() + lifetime;
    }
}
