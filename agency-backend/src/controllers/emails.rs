use actix_web::{web, HttpRequest, HttpResponse, Responder};
use serde::Deserialize;

use crate::email;
use crate::middleware::session_auth::validate_request;
use crate::models::EmailStatus;
use crate::AppState;
use super::{integration_error_response, service_error_response};

const DEFAULT_LIST_LIMIT: usize = 100;
const MAX_LIST_LIMIT: usize = 1000;

#[derive(Debug, Deserialize)]
pub struct SendRequest {
    to: String,
    subject: String,
    html: String,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    status: Option<EmailStatus>,
    limit: Option<usize>,
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/emails")
            .route("", web::get().to(list_emails))
            .route("/send", web::post().to(send))
            .route("/retry", web::post().to(retry)),
    );
}

async fn list_emails(state: web::Data<AppState>, req: HttpRequest, query: web::Query<ListQuery>) -> impl Responder {
    if let Err(resp) = validate_request(&state.db, &req) {
        return resp;
    }

    let limit = query.limit.unwrap_or(DEFAULT_LIST_LIMIT).clamp(1, MAX_LIST_LIMIT);
    match state.db.list_emails(query.status, limit) {
        Ok(emails) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "emails": emails
        })),
        Err(e) => service_error_response("Listing emails", e.into()),
    }
}

async fn send(state: web::Data<AppState>, req: HttpRequest, body: web::Json<SendRequest>) -> impl Responder {
    if let Err(resp) = validate_request(&state.db, &req) {
        return resp;
    }

    let sender = match state.integrations.resend() {
        Ok(sender) => sender,
        Err(e) => return integration_error_response("Sending email", e),
    };

    match email::send_email(&state.db, &sender, &body.to, &body.subject, &body.html).await {
        Ok(log_row) => {
            let sent = log_row.status == EmailStatus::Sent;
            let error = log_row.last_error.clone();
            HttpResponse::Ok().json(serde_json::json!({
                "success": sent,
                "email": log_row,
                "error": error
            }))
        }
        Err(e) => service_error_response("Sending email failed", e),
    }
}

async fn retry(state: web::Data<AppState>, req: HttpRequest) -> impl Responder {
    if let Err(resp) = validate_request(&state.db, &req) {
        return resp;
    }

    let sender = match state.integrations.resend() {
        Ok(sender) => sender,
        Err(e) => return integration_error_response("Retrying emails", e),
    };

    match email::retry_failed(&state.db, &sender).await {
        Ok(summary) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "summary": summary
        })),
        Err(e) => service_error_response("Retrying emails failed", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controllers::test_support::{app_state, bearer};
    use actix_web::{http::StatusCode, test, App};
    use serde_json::Value;

    #[actix_web::test]
    async fn test_list_hides_body_and_filters() {
        let state = app_state();
        let first = state.db.insert_email("a@example.com", "One", "<p>secret</p>").unwrap();
        state.db.insert_email("b@example.com", "Two", "<p>two</p>").unwrap();
        state.db.mark_email_failed(first.id, "timeout", false).unwrap();
        let app = test::init_service(App::new().app_data(state.clone()).configure(config)).await;

        let req = test::TestRequest::get()
            .uri("/api/emails?status=failed")
            .insert_header(bearer(&state))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        let emails = body["emails"].as_array().unwrap();
        assert_eq!(emails.len(), 1);
        assert_eq!(emails[0]["to_address"], "a@example.com");
        assert!(emails[0].get("html_body").is_none());
    }

    #[actix_web::test]
    async fn test_requires_session() {
        let state = app_state();
        let app = test::init_service(App::new().app_data(state.clone()).configure(config)).await;

        let req = test::TestRequest::post().uri("/api/emails/retry").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);
    }
}
