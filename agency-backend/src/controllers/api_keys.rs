use actix_web::{web, HttpRequest, HttpResponse, Responder};
use serde::{Deserialize, Serialize};

use crate::db::Database;
use crate::error::ServiceError;
use crate::middleware::session_auth::validate_request;
use crate::models::ApiKeyResponse;
use crate::AppState;
use super::service_error_response;

/// Credentials the integrations can use. The name doubles as the
/// environment variable checked when no row is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiKeyId {
    ClickupApiToken,
    ResendApiKey,
    MetricoolApiToken,
    OpentocloseApiToken,
    DncApiKey,
}

const ALL_KEYS: [ApiKeyId; 5] = [
    ApiKeyId::ClickupApiToken,
    ApiKeyId::ResendApiKey,
    ApiKeyId::MetricoolApiToken,
    ApiKeyId::OpentocloseApiToken,
    ApiKeyId::DncApiKey,
];

/// Static description of one credential, shown on the settings page
#[derive(Debug, Clone, Copy, Serialize)]
pub struct KeyInfo {
    pub name: &'static str,
    pub provider: &'static str,
    pub purpose: &'static str,
    pub settings_url: &'static str,
}

impl ApiKeyId {
    pub fn info(self) -> KeyInfo {
        let (name, provider, purpose, settings_url) = match self {
            Self::ClickupApiToken => (
                "CLICKUP_API_TOKEN",
                "ClickUp",
                "Creates SphereSync call and text tasks",
                "https://app.clickup.com/settings/apps",
            ),
            Self::ResendApiKey => (
                "RESEND_API_KEY",
                "Resend",
                "Sends client emails",
                "https://resend.com/api-keys",
            ),
            Self::MetricoolApiToken => (
                "METRICOOL_API_TOKEN",
                "Metricool",
                "Schedules social posts",
                "https://app.metricool.com/settings/api",
            ),
            Self::OpentocloseApiToken => (
                "OPENTOCLOSE_API_TOKEN",
                "OpenToClose",
                "Syncs transactions",
                "https://app.opentoclose.com/settings",
            ),
            Self::DncApiKey => (
                "DNC_API_KEY",
                "DNC Registry",
                "Do-not-call lookups",
                "https://www.donotcall.gov",
            ),
        };
        KeyInfo { name, provider, purpose, settings_url }
    }

    pub fn as_str(self) -> &'static str {
        self.info().name
    }

    pub fn all() -> &'static [ApiKeyId] {
        &ALL_KEYS
    }

    pub fn from_key_name(s: &str) -> Option<ApiKeyId> {
        ALL_KEYS.iter().copied().find(|k| k.as_str() == s)
    }
}

/// Where a credential was found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum KeySource {
    Database,
    Environment,
}

/// Stored row first, then the environment variable of the same name.
/// Blank values count as absent.
pub fn resolve_key(db: &Database, id: ApiKeyId) -> rusqlite::Result<Option<(String, KeySource)>> {
    let stored = db
        .get_api_key(id.as_str())?
        .map(|k| k.api_key)
        .filter(|v| !v.trim().is_empty());
    if let Some(value) = stored {
        return Ok(Some((value, KeySource::Database)));
    }
    Ok(std::env::var(id.as_str())
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(|v| (v, KeySource::Environment)))
}

#[derive(Debug, Deserialize)]
pub struct UpsertApiKeyRequest {
    pub key_name: String,
    pub api_key: String,
}

#[derive(Debug, Deserialize)]
pub struct DeleteApiKeyRequest {
    pub key_name: String,
}

#[derive(Serialize)]
struct KeyStatus {
    #[serde(flatten)]
    info: KeyInfo,
    /// `None` when the key is not configured anywhere
    source: Option<KeySource>,
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/keys")
            .route("", web::get().to(list_api_keys))
            .route("", web::post().to(upsert_api_key))
            .route("", web::delete().to(delete_api_key))
            .route("/config", web::get().to(key_status)),
    );
}

fn parse_key_name(name: &str) -> Result<ApiKeyId, ServiceError> {
    ApiKeyId::from_key_name(name).ok_or_else(|| {
        let valid: Vec<&str> = ALL_KEYS.iter().map(|k| k.as_str()).collect();
        ServiceError::Validation(format!("Unknown key '{}'. Valid keys: {}", name, valid.join(", ")))
    })
}

async fn key_status(state: web::Data<AppState>, req: HttpRequest) -> impl Responder {
    if let Err(resp) = validate_request(&state.db, &req) {
        return resp;
    }

    let statuses: rusqlite::Result<Vec<KeyStatus>> = ALL_KEYS
        .iter()
        .map(|&id| -> rusqlite::Result<KeyStatus> {
            Ok(KeyStatus {
                info: id.info(),
                source: resolve_key(&state.db, id)?.map(|(_, source)| source),
            })
        })
        .collect();

    match statuses {
        Ok(keys) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "keys": keys
        })),
        Err(e) => service_error_response("Reading key status", e.into()),
    }
}

async fn list_api_keys(state: web::Data<AppState>, req: HttpRequest) -> impl Responder {
    if let Err(resp) = validate_request(&state.db, &req) {
        return resp;
    }

    match state.db.list_api_keys() {
        Ok(keys) => {
            let keys: Vec<ApiKeyResponse> = keys.iter().map(|k| k.to_response()).collect();
            HttpResponse::Ok().json(serde_json::json!({
                "success": true,
                "keys": keys
            }))
        }
        Err(e) => service_error_response("Listing API keys", e.into()),
    }
}

async fn upsert_api_key(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<UpsertApiKeyRequest>,
) -> impl Responder {
    if let Err(resp) = validate_request(&state.db, &req) {
        return resp;
    }

    let saved = parse_key_name(&body.key_name).and_then(|id| {
        let value = body.api_key.trim();
        if value.is_empty() {
            return Err(ServiceError::Validation("API key cannot be empty".to_string()));
        }
        Ok(state.db.upsert_api_key(id.as_str(), value)?)
    });

    match saved {
        Ok(key) => {
            log::info!("[API_KEYS] Saved {}", key.service_name);
            HttpResponse::Ok().json(serde_json::json!({
                "success": true,
                "key": key.to_response()
            }))
        }
        Err(e) => service_error_response("Saving API key", e),
    }
}

async fn delete_api_key(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<DeleteApiKeyRequest>,
) -> impl Responder {
    if let Err(resp) = validate_request(&state.db, &req) {
        return resp;
    }

    let deleted = parse_key_name(&body.key_name).and_then(|id| {
        if state.db.delete_api_key(id.as_str())? {
            Ok(id)
        } else {
            Err(ServiceError::NotFound(format!("Stored key {}", id.as_str())))
        }
    });

    match deleted {
        Ok(id) => {
            log::info!("[API_KEYS] Deleted {}", id.as_str());
            HttpResponse::Ok().json(serde_json::json!({ "success": true }))
        }
        Err(e) => service_error_response("Deleting API key", e),
    }
}
