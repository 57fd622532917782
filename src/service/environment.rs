use serde::Serialize;
use tracing::warn;
use url::Url;

use crate::api::google_api::GoogleApi;
use crate::config::{AIR_QUALITY_URL, WEATHER_URL};
use crate::error::DermisError;
use crate::types::environment::{
    AIR_QUALITY_UNAVAILABLE, AirQualityData, Coordinates, WeatherData,
};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentReport {
    pub air_quality: Option<AirQualityData>,
    pub weather: Option<WeatherData>,
    pub air_quality_text: String,
}

/// Current air quality and weather for a location via Google Maps Platform.
#[derive(Clone)]
pub struct EnvironmentService {
    http: reqwest::Client,
    api_key: Option<String>,
    air_quality_url: Url,
    weather_url: Url,
}

impl EnvironmentService {
    pub fn new(http: reqwest::Client, api_key: Option<String>) -> Self {
        Self {
            http,
            api_key: api_key.filter(|k| !k.is_empty()),
            air_quality_url: AIR_QUALITY_URL.clone(),
            weather_url: WEATHER_URL.clone(),
        }
    }

    pub fn with_endpoints(mut self, air_quality_url: Url, weather_url: Url) -> Self {
        self.air_quality_url = air_quality_url;
        self.weather_url = weather_url;
        self
    }

    /// Both lookups run concurrently; a failed half comes back as `None`.
    pub async fn lookup(&self, at: Coordinates) -> Result<EnvironmentReport, DermisError> {
        let key = self
            .api_key
            .as_deref()
            .ok_or(DermisError::NotConfigured("Google Maps API key"))?;
        if !at.is_valid() {
            return Err(DermisError::bad_request("Invalid coordinates"));
        }

        let (air, weather) = tokio::join!(
            GoogleApi::lookup_air_quality(&self.http, &self.air_quality_url, key, at),
            GoogleApi::lookup_weather(&self.http, &self.weather_url, key, at),
        );

        let air_quality = air
            .inspect_err(|e| warn!(error = %e, "air quality lookup failed"))
            .ok()
            .and_then(AirQualityData::from_lookup);
        let weather = weather
            .inspect_err(|e| warn!(error = %e, "weather lookup failed"))
            .ok()
            .map(WeatherData::from);

        let air_quality_text = air_quality
            .as_ref()
            .map(AirQualityData::to_prompt_text)
            .unwrap_or_else(|| AIR_QUALITY_UNAVAILABLE.to_string());

        Ok(EnvironmentReport {
            air_quality,
            weather,
            air_quality_text,
        })
    }
}
