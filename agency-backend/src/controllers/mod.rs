pub mod api_keys;
pub mod auth;
pub mod contacts;
pub mod dashboard;
pub mod emails;
pub mod health;
pub mod social;
pub mod spheresync;
pub mod transactions;

use actix_web::HttpResponse;

use crate::error::ServiceError;
use crate::integrations::IntegrationError;

/// JSON error body with the status matching the failure
pub fn service_error_response(context: &str, err: ServiceError) -> HttpResponse {
    let body = |message: String| {
        serde_json::json!({
            "success": false,
            "error": message
        })
    };

    match err {
        ServiceError::Validation(msg) => HttpResponse::BadRequest().json(body(msg)),
        ServiceError::NotFound(_) => HttpResponse::NotFound().json(body(err.to_string())),
        ServiceError::Integration(e) => integration_error_response(context, e),
        ServiceError::Database(e) => {
            log::error!("{}: {}", context, e);
            HttpResponse::InternalServerError().json(body(format!("{}: database error", context)))
        }
    }
}

/// Missing credentials are the caller's to fix; anything else is the upstream's fault
pub fn integration_error_response(context: &str, err: IntegrationError) -> HttpResponse {
    let body = serde_json::json!({
        "success": false,
        "error": err.to_string()
    });

    match err {
        IntegrationError::MissingApiKey(_) | IntegrationError::MissingConfig(_) => {
            HttpResponse::BadRequest().json(body)
        }
        IntegrationError::KeyStore { .. } => {
            log::error!("{}: {}", context, err);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "success": false,
                "error": format!("{}: database error", context)
            }))
        }
        _ => {
            log::error!("{}: {}", context, err);
            HttpResponse::BadGateway().json(body)
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use actix_web::web;
    use std::sync::Arc;

    use crate::config::{Config, IntegrationsConfig};
    use crate::db::Database;
    use crate::integrations::Integrations;
    use crate::AppState;

    pub const TEST_SECRET: &str = "correct-horse";

    pub fn app_state() -> web::Data<AppState> {
        let db = Arc::new(Database::in_memory().unwrap());
        let config = Config {
            secret_key: TEST_SECRET.to_string(),
            port: 0,
            database_url: ":memory:".to_string(),
            session_ttl_hours: 1,
            spheresync_cron: "0 0 6 * * Mon *".to_string(),
            email_retry_cron: "0 */15 * * * * *".to_string(),
            integrations: IntegrationsConfig::default(),
        };
        let integrations = Arc::new(Integrations::new(config.integrations.clone(), db.clone()));
        web::Data::new(AppState { db, config, integrations })
    }

    /// `Authorization` header value for a fresh session
    pub fn bearer(state: &web::Data<AppState>) -> (&'static str, String) {
        let session = state.db.create_session(1).unwrap();
        ("Authorization", format!("Bearer {}", session.token))
    }
}
