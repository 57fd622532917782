//! Personalized "magic section" copy: an LLM rewrite of a fixed template,
//! with a deterministic rule-based writer when the model is unavailable.

use moka::future::Cache;
use std::time::Duration;
use tracing::{debug, warn};

use crate::api::openai_client::OpenAiClient;
use crate::config::OpenAiConfig;
use crate::error::DermisError;
use crate::types::openai::{ContentPart, InputMessage, ResponsesRequest};
use crate::types::profile::{EnvironmentSnapshot, PersonalizationData, UserProfile};

pub const PERSONALIZED_NOTICE: &str = "Text personalized successfully";
pub const FALLBACK_NOTICE: &str = "Text personalized with local rules";

const TEMPLATE: &str = "Your World's Whisper to Your Skin: How We Craft Smarter
We don't guess—we *get* your backdrop. Pulling live deets like:
- **Air Quality (AQI/PM2.5)**: Smog in **[CITY]**? Antioxidant armor (think liposome vitamin C—sips in protection without the weight).
- **Water Quality**: Mineral-heavy taps? Soothing hyaluronics to melt away that parched pull.
- **UV & Humidity**: Fierce rays or sticky air? Tailored shields—matte in the tropics, rich in the chill.
Blend with your age/gender/skin intel = your no-BS recipe. (E.g., 28yo oily type in sunny Sydney? Niacinamide gel with UV-synced mattifiers—clearer, bouncier by week 3.)";

const INSTRUCTION: &str = "You are a Dynamic Text Personalizer for a skincare app. Your job: Take a static text template and user/env data, then rewrite it to feel hyper-personal—like a custom note from a skincare coach.

Rules:
- Inject data naturally: Swap placeholders (e.g., [CITY]) with exact values; adapt examples to match user profile (e.g., if age=42, skin=oily, high UV—suggest \"niacinamide mist for oil-taming glow\").
- Keep tone warm, witty, global: Empathetic, fun, empowering (e.g., \"Your city's haze? We've got shields!\").
- Brevity: Output exactly matches the template structure/length—trim fluff, no additions.
- Personalization Logic:
  - Env: Tie to skincare (e.g., high AQI → \"antioxidant boost\"; high humidity → \"matte textures\").
  - User: Blend age/gender/skin (e.g., \"For your 30s oily vibe...\").
  - Examples: Always 1 tailored \"E.g.\" sentence; quantify wins (e.g., \"smoother by week 2\").
- Output ONLY the modified text—no intros, explanations, or code. Use markdown for lists/bolds.
- If data missing, use neutrals (e.g., \"your city\" for [CITY]).


Modify the template by injecting the data. Make the \"E.g.\" example user-specific (e.g., tie skin/env to a rec like \"ceramide lock for rainy days\"). Keep structure identical.";

const CLOSING: &str = "Instructions: Modify the template by injecting the data. Make the \"E.g.\" example user-specific (e.g., tie skin/env to a rec like \"ceramide lock for rainy days\"). Keep structure identical.";

pub fn build_user_context(data: &PersonalizationData) -> Result<String, DermisError> {
    let user = serde_json::to_string_pretty(&data.user_data)?;
    let env = serde_json::to_string_pretty(&data.environment_data)?;
    Ok(format!(
        "Template Text to Modify:\n{TEMPLATE}\n\nRaw Data (JSON—use only this for personalization):\n{{\n    user:{user}\n    env:{env}\n}}\n\n{CLOSING}"
    ))
}

pub fn build_request(
    cfg: &OpenAiConfig,
    data: &PersonalizationData,
) -> Result<ResponsesRequest, DermisError> {
    Ok(ResponsesRequest {
        model: cfg.magic_model.clone(),
        input: vec![
            InputMessage::developer(INSTRUCTION),
            InputMessage::user(vec![ContentPart::text(build_user_context(data)?)]),
        ],
        max_output_tokens: cfg.magic_max_output_tokens,
        temperature: Some(cfg.magic_temperature),
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Personalized {
    Model(String),
    Fallback(String),
}

impl Personalized {
    pub fn notice(&self) -> &'static str {
        match self {
            Personalized::Model(_) => PERSONALIZED_NOTICE,
            Personalized::Fallback(_) => FALLBACK_NOTICE,
        }
    }

    pub fn into_text(self) -> String {
        match self {
            Personalized::Model(t) | Personalized::Fallback(t) => t,
        }
    }
}

#[derive(Clone)]
pub struct Personalizer {
    client: OpenAiClient,
    cfg: OpenAiConfig,
    cache: Cache<String, String>,
}

impl Personalizer {
    pub fn new(client: OpenAiClient, cfg: OpenAiConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(1_000)
            .time_to_live(Duration::from_secs(cfg.magic_cache_ttl_secs))
            .build();
        Self { client, cfg, cache }
    }

    /// Model copy for `data`, served from cache for identical bodies. Model
    /// failures fall back to [`fallback_text`] and are not cached.
    pub async fn personalize(&self, data: &PersonalizationData) -> Result<Personalized, DermisError> {
        let key = serde_json::to_string(data)?;
        if let Some(hit) = self.cache.get(&key).await {
            debug!("magic section served from cache");
            return Ok(Personalized::Model(hit));
        }

        let request = build_request(&self.cfg, data)?;
        match self.client.respond(&request).await {
            Ok(text) => {
                self.cache.insert(key, text.clone()).await;
                Ok(Personalized::Model(text))
            }
            Err(e) => {
                warn!(error = %e, "magic personalization failed, using local rules");
                Ok(Personalized::Fallback(fallback_text(data)))
            }
        }
    }
}

fn air_line(city: &str, aqi: Option<f64>) -> String {
    match aqi {
        Some(aqi) if aqi > 100.0 => format!(
            "**Air Quality (AQI/PM2.5)**: Heavy pollution in **{city}**? Your skin needs serious antioxidant armor—think liposome vitamin C and ferulic acid combos that sink deep without the heaviness."
        ),
        Some(aqi) if aqi > 50.0 => format!(
            "**Air Quality (AQI/PM2.5)**: Moderate haze in **{city}**? Antioxidant armor (think liposome vitamin C—sips in protection without the weight)."
        ),
        Some(_) => format!(
            "**Air Quality (AQI/PM2.5)**: Fresh air in **{city}**! Lucky you—we'll still add light antioxidants for everyday protection."
        ),
        None => String::new(),
    }
}

fn climate_line(humidity: Option<f64>, uv: Option<f64>) -> &'static str {
    match (humidity, uv) {
        (Some(h), Some(uv)) if h > 70.0 && uv > 6.0 => {
            "**UV & Humidity**: High rays in sticky air? Lightweight SPF 50+ with a matte finish—protection without the slick."
        }
        (Some(h), Some(_)) if h > 70.0 => {
            "**UV & Humidity**: High humidity? Gel-based formulas that won't feel heavy—breathable protection that works with your climate."
        }
        (Some(h), Some(_)) if h < 40.0 => {
            "**UV & Humidity**: Dry air? Rich creams with ceramides to lock in moisture and keep your barrier strong."
        }
        (Some(_), Some(_)) => {
            "**UV & Humidity**: Balanced climate? Versatile formulas that adapt—neither too rich nor too light."
        }
        (Some(h), None) if h > 70.0 => {
            "**Humidity**: Sticky air? Lighter gels that won't add to the weight."
        }
        (Some(_), None) => {
            "**Humidity**: Low humidity? Richer creams to lock in every drop of moisture."
        }
        (None, _) => "",
    }
}

fn age_group(age: u32) -> &'static str {
    match age {
        0..25 => "early 20s",
        25..35 => "30s",
        35..45 => "40s",
        _ => "mature",
    }
}

fn concern_phrase(concerns: &[String]) -> &'static str {
    if concerns.is_empty() {
        return "healthy skin";
    }
    let has = |c: &str| concerns.iter().any(|x| x == c);
    if has("acne") {
        "fighting breakouts"
    } else if has("fine-lines") {
        "smoothing fine lines"
    } else if has("redness") {
        "calming redness"
    } else if has("dullness") {
        "boosting radiance"
    } else {
        "all-around glow"
    }
}

fn example_line(user: &UserProfile, env: &EnvironmentSnapshot) -> String {
    let (Some(age), Some(skin)) = (
        user.age.filter(|a| *a > 0),
        user.skin_type.as_deref().filter(|s| !s.is_empty()),
    ) else {
        return String::new();
    };
    let city = env.city.as_str();
    let concern = concern_phrase(user.top_concern.as_deref().unwrap_or_default());
    let climate_city = match env.humidity {
        Some(h) if h > 70.0 => format!("humid {city}"),
        Some(h) if h > 0.0 && h < 40.0 => format!("dry {city}"),
        _ => city.to_string(),
    };
    let polluted = env.aqi.is_some_and(|a| a > 50.0);

    match skin {
        "combination" => format!(
            "(E.g., {age}yo combination type in {climate_city}? Peptide emulsion with humectant layers—balanced, dewy by week 3.)"
        ),
        "oily" if polluted => format!(
            "(E.g., {age}yo with oily skin in polluted {city}? Niacinamide serum + lightweight antioxidants—{concern}, matte finish by week 2.)"
        ),
        "dry" => format!(
            "(E.g., {age}yo with dry skin in {city}? Hyaluronic acid + ceramide cream—plump, hydrated glow by week 2.)"
        ),
        "sensitive" => format!(
            "(E.g., {age}yo sensitive skin in {city}? Centella + niacinamide—calm, soothed, {concern} by week 3.)"
        ),
        other => {
            let focus = match other {
                "oily" => "Oil-control",
                _ => "Balanced",
            };
            format!(
                "(E.g., {age}yo {other} skin in {city}? {focus} formulas tailored to your {} routine—{concern}, visible results by week 2-3.)",
                age_group(age)
            )
        }
    }
}

/// Rule-based copy used when the model call fails.
pub fn fallback_text(data: &PersonalizationData) -> String {
    let env = &data.environment_data;
    let air = air_line(&env.city, env.aqi);
    let climate = climate_line(env.humidity, env.uv_index);
    let example = example_line(&data.user_data, env);

    format!(
        "**Your World's Whisper to Your Skin: How We Craft Smarter**\n\n\
         We don't guess—we *get* your backdrop. Pulling live deets like:\n\n\
         - {air}\n\
         - **Water Quality**: High minerals? Soothing hyaluronics to melt away that parched pull.\n\
         - {climate}\n\n\
         Blend with your age/gender/skin intel = your no-BS recipe. {example}"
    )
}
