//! Clients for the external systems the agency works with
//!
//! Each system sits behind a small trait so the services that use it can be
//! exercised with fakes. `Integrations` builds the real clients on demand,
//! resolving credentials from the database first and the environment second.

pub mod clickup;
pub mod dnc_api;
pub mod http_retry;
pub mod metricool;
pub mod opentoclose;
pub mod resend;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::config::IntegrationsConfig;
use crate::controllers::api_keys::{resolve_key, ApiKeyId};
use crate::db::{Database, TransactionUpsert};
use crate::models::SocialPost;
use http_retry::{is_reqwest_error_retryable, HttpRetryManager};

pub use clickup::ClickUpClient;
pub use dnc_api::DncApiClient;
pub use metricool::MetricoolClient;
pub use opentoclose::OpenToCloseClient;
pub use resend::ResendClient;

const REQUEST_TIMEOUT_SECS: u64 = 30;
/// Longest response body kept in an error message
const MAX_ERROR_BODY_CHARS: usize = 500;

#[derive(Debug, Error)]
pub enum IntegrationError {
    #[error("{0} is not configured")]
    MissingApiKey(&'static str),

    #[error("{0}")]
    MissingConfig(String),

    #[error("Failed to read {key} from the key store: {source}")]
    KeyStore {
        key: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{service} returned {status}: {body}")]
    Status {
        service: &'static str,
        status: u16,
        body: String,
    },

    #[error("Unexpected response from {service}: {message}")]
    Decode {
        service: &'static str,
        message: String,
    },
}

impl IntegrationError {
    /// Transient failures worth another attempt later
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(e) => is_reqwest_error_retryable(e),
            Self::Status { status, .. } => HttpRetryManager::is_retryable_status(*status),
            _ => false,
        }
    }
}

pub type IntegrationResult<T> = Result<T, IntegrationError>;

/// Turn a non-2xx response into `IntegrationError::Status`
pub(crate) async fn check_status(
    service: &'static str,
    resp: reqwest::Response,
) -> IntegrationResult<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(IntegrationError::Status {
        service,
        status: status.as_u16(),
        body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
    })
}

#[async_trait]
pub trait DncRegistry: Send + Sync {
    /// Key used for backoff tracking
    fn endpoint_key(&self) -> &str {
        "dnc"
    }

    /// Whether the 10-digit number is on a do-not-call list
    async fn is_on_dnc(&self, phone: &str) -> IntegrationResult<bool>;
}

/// A task to create in the task tracker
#[derive(Debug, Clone, PartialEq)]
pub struct TrackerTask {
    pub name: String,
    pub description: String,
    pub due_date: Option<DateTime<Utc>>,
    pub tags: Vec<String>,
}

#[async_trait]
pub trait TaskTracker: Send + Sync {
    /// Returns the tracker's id for the new task
    async fn create_task(&self, task: &TrackerTask) -> IntegrationResult<String>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub html: String,
}

#[async_trait]
pub trait EmailSender: Send + Sync {
    /// Key used for backoff tracking
    fn endpoint_key(&self) -> &str;

    /// Returns the provider's message id
    async fn send(&self, email: &OutgoingEmail) -> IntegrationResult<String>;
}

#[async_trait]
pub trait SocialScheduler: Send + Sync {
    /// Returns the scheduler's id for the post
    async fn schedule(&self, post: &SocialPost) -> IntegrationResult<String>;
}

#[async_trait]
pub trait TransactionSource: Send + Sync {
    fn page_size(&self) -> usize;

    async fn fetch_page(&self, offset: usize, limit: usize) -> IntegrationResult<Vec<TransactionUpsert>>;
}

/// Builds configured clients for the integrations
pub struct Integrations {
    http: Client,
    config: IntegrationsConfig,
    db: Arc<Database>,
}

impl Integrations {
    pub fn new(config: IntegrationsConfig, db: Arc<Database>) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|e| {
                log::warn!("[integrations] Falling back to default HTTP client: {}", e);
                Client::new()
            });
        Self { http, config, db }
    }

    pub fn config(&self) -> &IntegrationsConfig {
        &self.config
    }

    /// Database value first, then the environment variable of the same name
    fn api_key(&self, id: ApiKeyId) -> IntegrationResult<String> {
        resolve_key(&self.db, id)
            .map_err(|source| IntegrationError::KeyStore { key: id.as_str(), source })?
            .map(|(value, _)| value)
            .ok_or(IntegrationError::MissingApiKey(id.as_str()))
    }

    pub fn dnc(&self) -> IntegrationResult<DncApiClient> {
        Ok(DncApiClient::new(
            self.http.clone(),
            &self.config.dnc.base_url,
            self.api_key(ApiKeyId::DncApiKey)?,
        ))
    }

    pub fn clickup(&self) -> IntegrationResult<ClickUpClient> {
        if self.config.clickup.list_id.trim().is_empty() {
            return Err(IntegrationError::MissingConfig(
                "ClickUp list_id is not set in integrations.ron".to_string(),
            ));
        }
        Ok(ClickUpClient::new(
            self.http.clone(),
            &self.config.clickup.base_url,
            &self.config.clickup.list_id,
            self.api_key(ApiKeyId::ClickupApiToken)?,
        ))
    }

    pub fn resend(&self) -> IntegrationResult<ResendClient> {
        Ok(ResendClient::new(
            self.http.clone(),
            &self.config.resend.base_url,
            &self.config.resend.from_address,
            self.api_key(ApiKeyId::ResendApiKey)?,
        ))
    }

    pub fn metricool(&self) -> IntegrationResult<MetricoolClient> {
        let cfg = &self.config.metricool;
        if cfg.blog_id.trim().is_empty() || cfg.user_id.trim().is_empty() {
            return Err(IntegrationError::MissingConfig(
                "Metricool blog_id and user_id must be set in integrations.ron".to_string(),
            ));
        }
        Ok(MetricoolClient::new(
            self.http.clone(),
            &cfg.base_url,
            &cfg.blog_id,
            &cfg.user_id,
            self.api_key(ApiKeyId::MetricoolApiToken)?,
        ))
    }

    pub fn opentoclose(&self) -> IntegrationResult<OpenToCloseClient> {
        Ok(OpenToCloseClient::new(
            self.http.clone(),
            &self.config.opentoclose.base_url,
            self.config.opentoclose.page_size,
            self.api_key(ApiKeyId::OpentocloseApiToken)?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IntegrationsConfig;

    #[test]
    fn test_status_errors_classified() {
        let transient = IntegrationError::Status {
            service: "resend",
            status: 503,
            body: String::new(),
        };
        let permanent = IntegrationError::Status {
            service: "resend",
            status: 422,
            body: "invalid `to` field".to_string(),
        };
        assert!(transient.is_retryable());
        assert!(!permanent.is_retryable());
        assert!(!IntegrationError::MissingApiKey("RESEND_API_KEY").is_retryable());
        assert_eq!(permanent.to_string(), "resend returned 422: invalid `to` field");
    }

    #[test]
    fn test_key_from_database() {
        let db = Arc::new(Database::in_memory().unwrap());
        db.upsert_api_key("RESEND_API_KEY", "re_test_123").unwrap();
        let integrations = Integrations::new(IntegrationsConfig::default(), db);

        assert_eq!(integrations.api_key(ApiKeyId::ResendApiKey).unwrap(), "re_test_123");
        assert!(integrations.resend().is_ok());
    }

    #[test]
    fn test_key_store_failure_is_not_missing_key() {
        let db = Arc::new(Database::in_memory().unwrap());
        db.conn().execute("DROP TABLE external_api_keys", []).unwrap();
        let integrations = Integrations::new(IntegrationsConfig::default(), db);

        assert!(matches!(
            integrations.resend(),
            Err(IntegrationError::KeyStore { key: "RESEND_API_KEY", .. })
        ));
    }

    #[test]
    fn test_missing_list_id_is_config_error() {
        let db = Arc::new(Database::in_memory().unwrap());
        db.upsert_api_key("CLICKUP_API_TOKEN", "pk_123").unwrap();
        let integrations = Integrations::new(IntegrationsConfig::default(), db);

        assert!(matches!(integrations.clickup(), Err(IntegrationError::MissingConfig(_))));
    }
}
