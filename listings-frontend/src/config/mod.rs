use axum_extra::extract::cookie::SameSite;
use serde::Deserialize;
use std::time::Duration;

/// Profile used when `ENV` is not set.
pub const DEFAULT_PROFILE: &str = "development";

#[derive(Deserialize, Clone, Debug)]
pub struct Settings {
    pub server: ServerSettings,
    pub upstream: UpstreamSettings,
    #[serde(default)]
    pub session: SessionSettings,
    #[serde(default)]
    pub telemetry: TelemetrySettings,
}

#[derive(Deserialize, Clone, Debug)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Directory served under `/static`.
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_static_dir() -> String {
    "listings-frontend/static".to_string()
}

/// The property-listing REST API this front end relays to.
#[derive(Deserialize, Clone, Debug)]
pub struct UpstreamSettings {
    #[serde(default = "default_upstream_url")]
    pub url: String,
    /// Upper bound for a single upstream call, connect through body.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Extra attempts for idempotent reads after a transient failure.
    #[serde(default = "default_read_retries")]
    pub read_retries: u32,
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

fn default_upstream_url() -> String {
    "http://localhost:3030".to_string()
}

fn default_timeout_ms() -> u64 {
    5_000
}

fn default_read_retries() -> u32 {
    1
}

fn default_retry_backoff_ms() -> u64 {
    200
}

impl UpstreamSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}

/// Attributes applied to the `accessToken` and `uid` cookies.
#[derive(Deserialize, Clone, Debug)]
pub struct SessionSettings {
    #[serde(default)]
    pub secure: bool,
    #[serde(default = "default_true")]
    pub http_only: bool,
    #[serde(default)]
    pub same_site: SameSitePolicy,
    #[serde(default = "default_max_age_secs")]
    pub max_age_secs: i64,
}

fn default_true() -> bool {
    true
}

fn default_max_age_secs() -> i64 {
    24 * 60 * 60
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            secure: false,
            http_only: true,
            same_site: SameSitePolicy::default(),
            max_age_secs: default_max_age_secs(),
        }
    }
}

#[derive(Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SameSitePolicy {
    Strict,
    #[default]
    Lax,
    None,
}

impl From<SameSitePolicy> for SameSite {
    fn from(policy: SameSitePolicy) -> Self {
        match policy {
            SameSitePolicy::Strict => SameSite::Strict,
            SameSitePolicy::Lax => SameSite::Lax,
            SameSitePolicy::None => SameSite::None,
        }
    }
}

#[derive(Deserialize, Clone, Debug)]
pub struct TelemetrySettings {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// OTLP/gRPC collector; span export is disabled when absent.
    #[serde(default)]
    pub otlp_endpoint: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            otlp_endpoint: None,
        }
    }
}

/// Load settings for the profile named by `ENV`.
///
/// Sources, later ones winning: `config/base.yaml`, `config/<profile>.yaml`,
/// `APP_*` environment variables (`__` separates nesting), and `PORT`.
pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    let profile = std::env::var("ENV").unwrap_or_else(|_| DEFAULT_PROFILE.to_string());
    let port = std::env::var("PORT").ok();

    let base_path =
        std::env::current_dir().map_err(|e| config::ConfigError::Foreign(Box::new(e)))?;

    // Check if we're already in listings-frontend directory or need to navigate to it
    let configuration_directory = if base_path.ends_with("listings-frontend") {
        base_path.join("config")
    } else {
        base_path.join("listings-frontend").join("config")
    };

    let settings = config::Config::builder()
        .add_source(config::File::from(configuration_directory.join("base.yaml")).required(true))
        .add_source(
            config::File::from(configuration_directory.join(format!("{}.yaml", profile)))
                .required(false),
        )
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .set_override_option("server.port", port)?
        .build()?;

    settings.try_deserialize::<Settings>()
}
