use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::LazyLock;
use url::Url;

pub const OPENAI_DEFAULT_BASE: &str = "https://api.openai.com/v1/";
pub const GOOGLE_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

pub static DRIVE_UPLOAD_URL: LazyLock<Url> = LazyLock::new(|| {
    Url::parse("https://www.googleapis.com/upload/drive/v3/files").expect("valid drive url")
});
pub static SHEETS_BASE_URL: LazyLock<Url> = LazyLock::new(|| {
    Url::parse("https://sheets.googleapis.com/v4/spreadsheets/").expect("valid sheets url")
});
pub static AIR_QUALITY_URL: LazyLock<Url> = LazyLock::new(|| {
    Url::parse("https://airquality.googleapis.com/v1/currentConditions:lookup")
        .expect("valid air quality url")
});
pub static WEATHER_URL: LazyLock<Url> = LazyLock::new(|| {
    Url::parse("https://weather.googleapis.com/v1/currentConditions:lookup")
        .expect("valid weather url")
});

/// Models that own a row in the `prompts` table.
pub const VISION_PROMPT_MODEL: &str = "vision";
pub const SEARCH_PROMPT_MODEL: &str = "search";

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct Config {
    pub basic: BasicConfig,
    pub openai: OpenAiConfig,
    pub prompts: PromptConfig,
    pub mail: MailConfig,
    pub google: Option<GoogleConfig>,
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

impl Config {
    /// Layering: built-in defaults, then `dermis.toml`, then `DERMIS_*` env vars.
    pub fn load() -> Result<Self, figment::Error> {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file("dermis.toml"))
            .merge(Env::prefixed("DERMIS_").split("__"))
            .extract()
    }

    /// Admin page path under `basic.admin_url`; `""` yields the dashboard.
    pub fn admin_url(&self, page: &str) -> String {
        let base = self.basic.admin_url.trim_end_matches('/');
        format!("{base}/{page}")
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BasicConfig {
    pub listen_addr: String,
    pub database_url: String,
    pub loglevel: String,
    /// Master secret for the private cookie jar. At least 64 bytes; a random
    /// key is generated when empty, which logs every admin out on restart.
    pub session_secret: String,
    pub admin_url: String,
    pub body_limit_mb: usize,
    pub cors_origin: String,
    pub insecure_cookie: bool,
}

impl Default for BasicConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8000".to_string(),
            database_url: "sqlite://dermis.sqlite".to_string(),
            loglevel: "info".to_string(),
            session_secret: String::new(),
            admin_url: "/skin-disease/admin/".to_string(),
            body_limit_mb: 30,
            cors_origin: "*".to_string(),
            insecure_cookie: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub base_url: Url,
    pub vision_model: String,
    pub vision_max_output_tokens: u32,
    pub magic_model: String,
    pub magic_max_output_tokens: u32,
    pub magic_temperature: f32,
    pub magic_cache_ttl_secs: u64,
    pub timeout_secs: u64,
    pub requests_per_minute: u32,
    pub max_retries: usize,
    pub proxy: Option<Url>,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: Url::parse(OPENAI_DEFAULT_BASE).expect("valid default openai url"),
            vision_model: "gpt-5-mini".to_string(),
            vision_max_output_tokens: 5000,
            magic_model: "gpt-4.1-mini".to_string(),
            magic_max_output_tokens: 500,
            magic_temperature: 0.3,
            magic_cache_ttl_secs: 600,
            timeout_secs: 60,
            requests_per_minute: 60,
            max_retries: 2,
            proxy: None,
        }
    }
}

impl OpenAiConfig {
    /// `{base_url}/responses`; a base without a trailing slash keeps its last segment.
    pub fn responses_url(&self) -> Result<Url, url::ParseError> {
        let mut base = self.base_url.clone();
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        base.join("responses")
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PromptConfig {
    pub cache_ttl_secs: u64,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self { cache_ttl_secs: 1 }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MailConfig {
    pub transport: MailTransportConfig,
    pub from_email: String,
    pub from_name: String,
    pub feedback_to: String,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            transport: MailTransportConfig::File {
                path: PathBuf::from("mails"),
            },
            from_email: "no-reply@localhost".to_string(),
            from_name: "Skin Analysis".to_string(),
            feedback_to: "feedback@localhost".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum MailTransportConfig {
    Smtp {
        host: String,
        port: u16,
        username: String,
        password: String,
        #[serde(default = "default_true")]
        use_tls: bool,
    },
    File {
        path: PathBuf,
    },
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GoogleConfig {
    /// Authorized-user credential JSON (client_id, client_secret, refresh_token).
    pub credentials_path: Option<PathBuf>,
    pub spreadsheet_id: Option<String>,
    #[serde(default = "default_sheet_range")]
    pub sheet_range: String,
    pub drive_folder_id: Option<String>,
    pub maps_api_key: Option<String>,
}

fn default_sheet_range() -> String {
    "Sheet1!A:L".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BootstrapAdmin {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub fullname: String,
}
