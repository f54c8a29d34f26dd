use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use dotenv::dotenv;
use std::{env, fmt, path::PathBuf, str::FromStr};

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum AppEnvironment {
    Development,
    Production,
    Testing,
}

impl FromStr for AppEnvironment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" => Ok(AppEnvironment::Development),
            "production" => Ok(AppEnvironment::Production),
            "testing" => Ok(AppEnvironment::Testing),
            _ => Err(ConfigError::Message(format!("Invalid environment: {}", s))),
        }
    }
}

#[derive(Deserialize, Clone)]
#[serde(rename_all = "snake_case")]
pub struct AppConfig {
    #[serde(default = "default_env")]
    pub env: AppEnvironment,

    #[serde(default = "default_name")]
    pub name: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_worker_count")]
    pub worker_count: usize,

    #[serde(default)]
    pub database_url: String,

    #[serde(default = "default_cors_origins")]
    pub cors_allowed_origins: Vec<String>,

    #[serde(default)]
    pub media: MediaConfig,
}

/// Image pipeline settings: where files land, how they are addressed,
/// and the fixed sizes every upload is rendered at.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct MediaConfig {
    #[serde(default = "default_upload_dir")]
    pub upload_dir: PathBuf,

    #[serde(default = "default_url_prefix")]
    pub url_prefix: String,

    #[serde(default = "default_small_width")]
    pub small_width: u32,

    #[serde(default = "default_medium_width")]
    pub medium_width: u32,

    #[serde(default = "default_large_width")]
    pub large_width: u32,

    #[serde(default = "default_variant_quality")]
    pub variant_quality: u8,

    #[serde(default = "default_placeholder_width")]
    pub placeholder_width: u32,

    #[serde(default = "default_placeholder_sigma")]
    pub placeholder_sigma: f32,

    #[serde(default = "default_placeholder_quality")]
    pub placeholder_quality: u8,

    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

fn default_env() -> AppEnvironment {
    AppEnvironment::Development
}
fn default_name() -> String {
    "Media-API".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_worker_count() -> usize {
    num_cpus::get()
}
fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}
fn default_upload_dir() -> PathBuf {
    PathBuf::from("public/uploads")
}
fn default_url_prefix() -> String {
    "/public/uploads".to_string()
}
fn default_small_width() -> u32 {
    320
}
fn default_medium_width() -> u32 {
    640
}
fn default_large_width() -> u32 {
    1024
}
fn default_variant_quality() -> u8 {
    80
}
fn default_placeholder_width() -> u32 {
    64
}
fn default_placeholder_sigma() -> f32 {
    5.0
}
fn default_placeholder_quality() -> u8 {
    30
}
fn default_max_upload_bytes() -> usize {
    10 * 1024 * 1024
}

impl Default for MediaConfig {
    fn default() -> Self {
        MediaConfig {
            upload_dir: default_upload_dir(),
            url_prefix: default_url_prefix(),
            small_width: default_small_width(),
            medium_width: default_medium_width(),
            large_width: default_large_width(),
            variant_quality: default_variant_quality(),
            placeholder_width: default_placeholder_width(),
            placeholder_sigma: default_placeholder_sigma(),
            placeholder_quality: default_placeholder_quality(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

impl AppConfig {
    pub fn new() -> Result<Self, ConfigError> {
        dotenv().ok();

        let raw_env = env::var("APP_ENV").unwrap_or_else(|_| "development".into());
        let env_name = AppEnvironment::from_str(&raw_env)
            .map_err(|_| ConfigError::Message(format!("Invalid APP_ENV value: {}", raw_env)))?;

        // APP_MEDIA__UPLOAD_DIR -> media.upload_dir, APP_DATABASE_URL -> database_url
        let builder = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env_name)).required(false))
            .add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("cors_allowed_origins")
                    .ignore_empty(true),
            );

        let mut config: Self = builder.build()?.try_deserialize()?;

        config.env = env_name;
        config.database_url = fill_or_env(config.database_url, "DATABASE_URL")?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if self.database_url.trim().is_empty() {
            errors.push("DATABASE_URL cannot be empty".to_string());
        }
        if self.is_production() && self.cors_origins().iter().any(|o| o == "*") {
            errors.push("Wildcard CORS (*) is not allowed in production".to_string());
        }
        errors.extend(self.media.problems());

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Message(errors.join(", ")))
        }
    }

    pub fn is_production(&self) -> bool {
        self.env == AppEnvironment::Production
    }

    pub fn cors_origins(&self) -> Vec<String> {
        self.cors_allowed_origins
            .iter()
            .flat_map(|origin| origin.split(','))
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

impl MediaConfig {
    /// Target widths in ascending order: small, medium, large.
    pub fn widths(&self) -> [u32; 3] {
        [self.small_width, self.medium_width, self.large_width]
    }

    fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();

        if self.upload_dir.as_os_str().is_empty() {
            problems.push("MEDIA upload_dir cannot be empty".to_string());
        }
        if self.widths().contains(&0) || self.placeholder_width == 0 {
            problems.push("MEDIA widths must be greater than zero".to_string());
        }
        if !(self.small_width < self.medium_width && self.medium_width < self.large_width) {
            problems.push("MEDIA widths must be ascending (small < medium < large)".to_string());
        }
        for (name, quality) in [
            ("variant_quality", self.variant_quality),
            ("placeholder_quality", self.placeholder_quality),
        ] {
            if !(1..=100).contains(&quality) {
                problems.push(format!("MEDIA {name} must be within 1..=100"));
            }
        }
        if !self.placeholder_sigma.is_finite() || self.placeholder_sigma <= 0.0 {
            problems.push("MEDIA placeholder_sigma must be a positive number".to_string());
        }
        if self.max_upload_bytes == 0 {
            problems.push("MEDIA max_upload_bytes must be greater than zero".to_string());
        }

        problems
    }
}

fn fill_or_env(current: String, env_key: &str) -> Result<String, ConfigError> {
    if current.trim().is_empty() {
        env::var(env_key).map_err(|_| ConfigError::Message(format!("{env_key} must be set")))
    } else {
        Ok(current)
    }
}

impl fmt::Display for AppEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AppEnvironment::Development => "development",
            AppEnvironment::Production => "production",
            AppEnvironment::Testing => "testing",
        };
        write!(f, "{s}")
    }
}

trait Redact {
    fn redact(&self) -> &str;
}

impl Redact for str {
    fn redact(&self) -> &str {
        if self.is_empty() {
            "[MISSING]"
        } else {
            "[REDACTED]"
        }
    }
}

impl Redact for String {
    fn redact(&self) -> &str {
        self.as_str().redact()
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("name", &self.name)
            .field("port", &self.port)
            .field("host", &self.host)
            .field("worker_count", &self.worker_count)
            .field("database_url", &self.database_url.redact())
            .field("cors_allowed_origins", &self.cors_allowed_origins)
            .field("media", &self.media)
            .finish()
    }
}
