//! Air-quality and weather shapes, both as Google returns them and as the
//! wizard posts them back in the `air_quality` form field.

use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

pub const AIR_QUALITY_UNAVAILABLE: &str = "Air quality data not available";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AirQualityData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aqi: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dominant_pollutant: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pollutants: Option<Vec<Pollutant>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indexes: Option<Vec<AqiIndex>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AqiIndex {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub aqi: Option<i64>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub dominant_pollutant: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pollutant {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub concentration: Option<Concentration>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Concentration {
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default)]
    pub units: Option<String>,
}

fn or_unknown(v: Option<&str>) -> &str {
    v.filter(|s| !s.is_empty()).unwrap_or("Unknown")
}

fn display_units(units: Option<&str>) -> &str {
    match units {
        Some("PARTS_PER_BILLION") => "ppb",
        Some("MICROGRAMS_PER_CUBIC_METER") => "µg/m³",
        Some(other) => other,
        None => "",
    }
}

impl AirQualityData {
    /// Builds the wizard-facing summary from a Google `currentConditions:lookup`
    /// reply, preferring the universal (`uaqi`) index. `None` without indexes.
    pub fn from_lookup(lookup: AirQualityLookup) -> Option<Self> {
        let indexes = lookup.indexes.filter(|i| !i.is_empty())?;
        let primary = indexes
            .iter()
            .find(|i| i.code.as_deref() == Some("uaqi"))
            .unwrap_or(&indexes[0]);

        Some(Self {
            aqi: primary.aqi,
            category: primary.category.clone(),
            dominant_pollutant: primary.dominant_pollutant.clone(),
            pollutants: lookup.pollutants,
            timestamp: lookup.date_time,
            indexes: Some(indexes),
        })
    }

    /// Plain-text rendering fed to the vision model.
    pub fn to_prompt_text(&self) -> String {
        let mut out = String::new();

        match self.indexes.as_deref() {
            Some(indexes) if !indexes.is_empty() => {
                out.push_str("Air Quality Indexes:\n");
                for index in indexes {
                    let aqi = index.aqi.map(|a| a.to_string());
                    let _ = write!(
                        out,
                        "- {}: {} ({})",
                        or_unknown(index.display_name.as_deref()),
                        or_unknown(aqi.as_deref()),
                        or_unknown(index.category.as_deref()),
                    );
                    if let Some(dominant) = index.dominant_pollutant.as_deref() {
                        let _ = write!(out, " - Dominant Pollutant: {}", dominant.to_uppercase());
                    }
                    out.push('\n');
                }
            }
            _ => {
                let aqi = self.aqi.filter(|a| *a != 0).map(|a| a.to_string());
                let _ = writeln!(out, "Air Quality Index (AQI): {}", or_unknown(aqi.as_deref()));
                let _ = writeln!(out, "Category: {}", or_unknown(self.category.as_deref()));
                let _ = writeln!(
                    out,
                    "Dominant Pollutant: {}",
                    or_unknown(self.dominant_pollutant.as_deref())
                );
            }
        }

        let measured: Vec<(&Pollutant, f64)> = self
            .pollutants
            .iter()
            .flatten()
            .filter_map(|p| Some((p, p.concentration.as_ref()?.value?)))
            .collect();
        if !measured.is_empty() {
            out.push_str("\nPollutant Concentrations:\n");
            for (p, value) in measured {
                let units = p.concentration.as_ref().and_then(|c| c.units.as_deref());
                let _ = writeln!(
                    out,
                    "- {} ({}): {} {}",
                    or_unknown(p.display_name.as_deref()),
                    or_unknown(p.full_name.as_deref()),
                    value,
                    display_units(units),
                );
            }
        }

        out.trim().to_string()
    }
}

/// Renders the posted `air_quality` field: JSON snapshots are formatted,
/// free text passes through, absence becomes [`AIR_QUALITY_UNAVAILABLE`].
pub fn air_quality_text(raw: Option<&str>) -> String {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return AIR_QUALITY_UNAVAILABLE.to_string();
    };
    if raw.starts_with('{')
        && let Ok(data) = serde_json::from_str::<AirQualityData>(raw)
    {
        return data.to_prompt_text();
    }
    raw.to_string()
}

/// Google Air Quality `currentConditions:lookup` reply.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AirQualityLookup {
    #[serde(default)]
    pub date_time: Option<String>,
    #[serde(default)]
    pub indexes: Option<Vec<AqiIndex>>,
    #[serde(default)]
    pub pollutants: Option<Vec<Pollutant>>,
}

/// Google Weather `currentConditions:lookup` reply (only the fields we read).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherLookup {
    #[serde(default)]
    pub temperature: Option<Measured>,
    #[serde(default)]
    pub relative_humidity: Option<f64>,
    #[serde(default)]
    pub uv_index: Option<f64>,
    #[serde(default)]
    pub weather_condition: Option<WeatherCondition>,
    #[serde(default)]
    pub wind: Option<Wind>,
    #[serde(default)]
    pub cloud_cover: Option<f64>,
    #[serde(default)]
    pub visibility: Option<Distance>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Measured {
    #[serde(default)]
    pub degrees: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WeatherCondition {
    #[serde(default)]
    pub description: Option<LocalizedText>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LocalizedText {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Wind {
    #[serde(default)]
    pub speed: Option<Speed>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Speed {
    #[serde(default)]
    pub value: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Distance {
    #[serde(default)]
    pub distance: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WeatherData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub humidity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uv_index: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wind_speed: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cloud_cover: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility: Option<f64>,
}

impl From<WeatherLookup> for WeatherData {
    fn from(w: WeatherLookup) -> Self {
        Self {
            temperature: w.temperature.and_then(|t| t.degrees),
            humidity: w.relative_humidity,
            uv_index: w.uv_index,
            condition: w.weather_condition.and_then(|c| c.description?.text),
            wind_speed: w.wind.and_then(|wd| wd.speed?.value),
            cloud_cover: w.cloud_cover,
            visibility: w.visibility.and_then(|v| v.distance),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lng)
    }
}
