use lettre::Address;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::DermisError;

/// Consent-form payload posted as the `user_detail` JSON string.
///
/// The wizard has shipped several shapes of this object (with `address` or
/// `cityName`, numeric or string `age`), so it stays an open map.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(transparent)]
pub struct UserDetail(Map<String, Value>);

impl UserDetail {
    /// Parses the raw form value; anything but a non-empty JSON object is rejected.
    pub fn parse(raw: &str) -> Option<Self> {
        match serde_json::from_str::<Value>(raw).ok()? {
            Value::Object(map) if !map.is_empty() => Some(Self(map)),
            _ => None,
        }
    }

    /// Field rendered as text; `None` when absent or null.
    pub fn field(&self, key: &str) -> Option<String> {
        match self.0.get(key)? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            Value::Array(items) => Some(
                items
                    .iter()
                    .map(|v| v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string()))
                    .collect::<Vec<_>>()
                    .join(", "),
            ),
            other => Some(other.to_string()),
        }
    }

    /// Like [`field`](Self::field) but also treats `""`, `"0"`, `0` and `false` as missing.
    pub fn meaningful_field(&self, key: &str) -> Option<String> {
        match self.0.get(key)? {
            Value::Bool(false) => None,
            Value::Number(n) if n.as_f64() == Some(0.0) => None,
            _ => self
                .field(key)
                .filter(|s| !s.trim().is_empty() && s.as_str() != "0"),
        }
    }

    pub fn field_or_empty(&self, key: &str) -> String {
        self.field(key).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedbackForm {
    #[serde(default)]
    pub suggestion: String,
    #[serde(default)]
    pub email: String,
}

impl FeedbackForm {
    pub fn validate(&self) -> Result<Address, DermisError> {
        if self.suggestion.trim().chars().count() < 10 {
            return Err(DermisError::bad_request(
                "Please provide at least 10 characters of feedback",
            ));
        }
        self.email
            .trim()
            .parse::<Address>()
            .map_err(|_| DermisError::bad_request("Please enter a valid email address"))
    }
}

/// Body of the `personalize-magic` route.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalizationData {
    pub user_data: UserProfile,
    pub environment_data: EnvironmentSnapshot,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skin_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_concern: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentSnapshot {
    pub city: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aqi: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aqi_category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dominant_pollutant: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub humidity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uv_index: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weather_desc: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pm25: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pm10: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub no2: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub o3: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub so2: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub co: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wind_speed: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cloud_cover: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility: Option<f64>,
}
