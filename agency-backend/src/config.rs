use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_SESSION_TTL_HOURS: i64 = 24;
/// Every Monday at 06:00 UTC
const DEFAULT_SPHERESYNC_CRON: &str = "0 0 6 * * Mon *";
/// Every 15 minutes
const DEFAULT_EMAIL_RETRY_CRON: &str = "0 */15 * * * * *";

#[derive(Clone)]
pub struct Config {
    pub secret_key: String,
    pub port: u16,
    pub database_url: String,
    pub session_ttl_hours: i64,
    pub spheresync_cron: String,
    pub email_retry_cron: String,
    pub integrations: IntegrationsConfig,
}

impl Config {
    pub fn from_env(integrations: IntegrationsConfig) -> Result<Self, String> {
        let secret_key = env::var("SECRET_KEY")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| "SECRET_KEY must be set".to_string())?;

        Ok(Self {
            secret_key,
            port: parse_or_default("PORT", DEFAULT_PORT),
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "./.db/agency.db".to_string()),
            session_ttl_hours: parse_or_default("SESSION_TTL_HOURS", DEFAULT_SESSION_TTL_HOURS),
            spheresync_cron: env::var("SPHERESYNC_CRON")
                .unwrap_or_else(|_| DEFAULT_SPHERESYNC_CRON.to_string()),
            email_retry_cron: env::var("EMAIL_RETRY_CRON")
                .unwrap_or_else(|_| DEFAULT_EMAIL_RETRY_CRON.to_string()),
            integrations,
        })
    }
}

fn parse_or_default<T: std::str::FromStr + std::fmt::Display + Copy>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            log::warn!("[config] {}={:?} is not valid, using {}", name, raw, default);
            default
        }),
        Err(_) => default,
    }
}

/// Endpoints and non-secret identifiers for the external systems.
/// Credentials live in the `external_api_keys` table or the environment.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct IntegrationsConfig {
    pub dnc: DncConfig,
    pub clickup: ClickUpConfig,
    pub resend: ResendConfig,
    pub metricool: MetricoolConfig,
    pub opentoclose: OpenToCloseConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DncConfig {
    pub base_url: String,
    /// Lookups in flight at once during a bulk check
    pub concurrency: usize,
    /// Contacts checked more recently than this are skipped unless forced
    pub recheck_after_days: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClickUpConfig {
    pub base_url: String,
    pub list_id: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ResendConfig {
    pub base_url: String,
    pub from_address: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MetricoolConfig {
    pub base_url: String,
    pub blog_id: String,
    pub user_id: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OpenToCloseConfig {
    pub base_url: String,
    pub page_size: usize,
    pub max_pages: usize,
}

impl Default for DncConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.dnc-check.example.com/v1".to_string(),
            concurrency: 4,
            recheck_after_days: 30,
        }
    }
}

impl Default for ClickUpConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.clickup.com/api/v2".to_string(),
            list_id: String::new(),
        }
    }
}

impl Default for ResendConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.resend.com".to_string(),
            from_address: "Agency Hub <noreply@example.com>".to_string(),
        }
    }
}

impl Default for MetricoolConfig {
    fn default() -> Self {
        Self {
            base_url: "https://app.metricool.com/api/v2".to_string(),
            blog_id: String::new(),
            user_id: String::new(),
        }
    }
}

impl Default for OpenToCloseConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.opentoclose.com/v1".to_string(),
            page_size: 100,
            max_pages: 50,
        }
    }
}

/// Locate the config directory: ./config first, then ../config (for running from the crate dir)
pub fn find_config_dir() -> Option<PathBuf> {
    ["./config", "../config"]
        .iter()
        .map(Path::new)
        .find(|p| p.exists())
        .map(Path::to_path_buf)
}

/// Load `integrations.ron`. A missing file falls back to defaults; a broken one is an error.
pub fn load_integrations(config_dir: Option<&Path>) -> Result<IntegrationsConfig, String> {
    let Some(dir) = config_dir else {
        log::warn!("[config] No config directory found, using default integration endpoints");
        return Ok(IntegrationsConfig::default());
    };

    let path = dir.join("integrations.ron");
    if !path.exists() {
        log::warn!("[config] {:?} not found, using default integration endpoints", path);
        return Ok(IntegrationsConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .map_err(|e| format!("Failed to read {:?}: {}", path, e))?;
    let config = parse_integrations(&content).map_err(|e| format!("Failed to parse {:?}: {}", path, e))?;

    log::info!("[config] Loaded integration endpoints from {:?}", path);
    Ok(config)
}

fn parse_integrations(content: &str) -> Result<IntegrationsConfig, ron::error::SpannedError> {
    ron::from_str(content)
}
