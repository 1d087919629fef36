use actix_web::{web, HttpRequest, HttpResponse, Responder};
use serde::{Deserialize, Serialize};

use crate::contacts;
use crate::db::ContactFilter;
use crate::middleware::session_auth::validate_request;
use crate::models::{Contact, NewContact};
use crate::AppState;
use super::{integration_error_response, service_error_response};

/// Upper bound on rows per import request
const MAX_IMPORT_ROWS: usize = 10_000;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    search: Option<String>,
    dnc: Option<bool>,
}

#[derive(Serialize)]
pub struct ContactsListResponse {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    contacts: Option<Vec<Contact>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ImportRequest {
    contacts: Vec<NewContact>,
}

#[derive(Debug, Deserialize)]
pub struct CleanupQuery {
    #[serde(default = "default_dry_run")]
    dry_run: bool,
}

fn default_dry_run() -> bool {
    true
}

#[derive(Debug, Default, Deserialize)]
pub struct DncCheckRequest {
    #[serde(default)]
    force: bool,
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/contacts")
            .route("", web::get().to(list_contacts))
            .route("/import", web::post().to(import_contacts))
            .route("/cleanup-duplicates", web::post().to(cleanup_duplicates))
            .route("/dnc-check", web::post().to(dnc_check)),
    );
}

async fn list_contacts(
    state: web::Data<AppState>,
    req: HttpRequest,
    query: web::Query<ListQuery>,
) -> impl Responder {
    if let Err(resp) = validate_request(&state.db, &req) {
        return resp;
    }

    let query = query.into_inner();
    let filter = ContactFilter {
        search: query.search,
        dnc: query.dnc,
    };

    match state.db.list_contacts(&filter) {
        Ok(contacts) => HttpResponse::Ok().json(ContactsListResponse {
            success: true,
            contacts: Some(contacts),
            error: None,
        }),
        Err(e) => {
            log::error!("Failed to list contacts: {}", e);
            HttpResponse::InternalServerError().json(ContactsListResponse {
                success: false,
                contacts: None,
                error: Some("Failed to retrieve contacts".to_string()),
            })
        }
    }
}

async fn import_contacts(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<ImportRequest>,
) -> impl Responder {
    if let Err(resp) = validate_request(&state.db, &req) {
        return resp;
    }

    if body.contacts.len() > MAX_IMPORT_ROWS {
        return HttpResponse::BadRequest().json(serde_json::json!({
            "success": false,
            "error": format!("At most {} contacts per import", MAX_IMPORT_ROWS)
        }));
    }

    match contacts::import_contacts(&state.db, &body.contacts) {
        Ok(summary) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "imported": summary.imported,
            "duplicates": summary.duplicates,
            "rejected": summary.rejected
        })),
        Err(e) => service_error_response("Contact import failed", e),
    }
}

async fn cleanup_duplicates(
    state: web::Data<AppState>,
    req: HttpRequest,
    query: web::Query<CleanupQuery>,
) -> impl Responder {
    if let Err(resp) = validate_request(&state.db, &req) {
        return resp;
    }

    match contacts::cleanup_duplicates(&state.db, query.dry_run) {
        Ok(summary) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "groups": summary.groups,
            "removed": summary.removed,
            "dry_run": summary.dry_run
        })),
        Err(e) => service_error_response("Duplicate cleanup failed", e),
    }
}

async fn dnc_check(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: Option<web::Json<DncCheckRequest>>,
) -> impl Responder {
    if let Err(resp) = validate_request(&state.db, &req) {
        return resp;
    }

    let force = body.map(|b| b.force).unwrap_or(false);
    let registry = match state.integrations.dnc() {
        Ok(client) => client,
        Err(e) => return integration_error_response("DNC check", e),
    };

    match contacts::run_dnc_check(&state.db, &registry, force, &state.integrations.config().dnc).await {
        Ok(summary) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "checked": summary.checked,
            "flagged": summary.flagged,
            "failed": summary.failed,
            "deferred": summary.deferred
        })),
        Err(e) => service_error_response("DNC check failed", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controllers::test_support::{app_state, bearer};
    use actix_web::{http::StatusCode, test, App};
    use serde_json::{json, Value};

    #[actix_web::test]
    async fn test_import_list_and_cleanup() {
        let state = app_state();
        let app = test::init_service(App::new().app_data(state.clone()).configure(config)).await;
        let auth = bearer(&state);

        let req = test::TestRequest::post()
            .uri("/api/contacts/import")
            .insert_header(auth.clone())
            .set_json(json!({
                "contacts": [
                    { "first_name": "Jane", "last_name": "Doe", "phone": "555-123-4567" },
                    { "first_name": "jane", "last_name": "doe", "phone": "(555) 123 4567" },
                    { "first_name": "Bad", "email": "nope" }
                ]
            }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["imported"], 1);
        assert_eq!(body["duplicates"], 1);
        assert_eq!(body["rejected"][0]["row"], 2);

        let req = test::TestRequest::get()
            .uri("/api/contacts?search=doe&dnc=false")
            .insert_header(auth.clone())
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["contacts"].as_array().unwrap().len(), 1);

        let req = test::TestRequest::post()
            .uri("/api/contacts/cleanup-duplicates")
            .insert_header(auth)
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["dry_run"], true);
        assert_eq!(body["removed"], 0);
    }

    #[actix_web::test]
    async fn test_dnc_check_without_key_is_bad_request() {
        // Key lookup falls back to the environment
        if std::env::var("DNC_API_KEY").is_ok() {
            return;
        }
        let state = app_state();
        let app = test::init_service(App::new().app_data(state.clone()).configure(config)).await;

        let req = test::TestRequest::post()
            .uri("/api/contacts/dnc-check")
            .insert_header(bearer(&state))
            .set_json(json!({ "force": true }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
