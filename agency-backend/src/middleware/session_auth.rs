// Session authentication for protected routes.
// Handlers call `validate_request` first and return its error response as-is.

use actix_web::{HttpRequest, HttpResponse};

use crate::db::Database;
use crate::models::Session;

pub fn extract_token(req: &HttpRequest) -> Option<String> {
    req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .map(|s| s.trim_start_matches("Bearer ").trim().to_string())
        .filter(|s| !s.is_empty())
}

pub fn validate_request(db: &Database, req: &HttpRequest) -> Result<Session, HttpResponse> {
    let token = extract_token(req).ok_or_else(|| {
        HttpResponse::Unauthorized().json(serde_json::json!({
            "success": false,
            "error": "No authorization token provided"
        }))
    })?;

    match db.validate_session(&token) {
        Ok(Some(session)) => Ok(session),
        Ok(None) => Err(HttpResponse::Unauthorized().json(serde_json::json!({
            "success": false,
            "error": "Invalid or expired session"
        }))),
        Err(e) => {
            log::error!("Session validation error: {}", e);
            Err(HttpResponse::InternalServerError().json(serde_json::json!({
                "success": false,
                "error": "Internal server error"
            })))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::test::TestRequest;

    #[test]
    fn test_extract_token() {
        let req = TestRequest::default()
            .insert_header(("Authorization", "Bearer abc-123"))
            .to_http_request();
        assert_eq!(extract_token(&req), Some("abc-123".to_string()));

        let req = TestRequest::default()
            .insert_header(("Authorization", "Bearer "))
            .to_http_request();
        assert_eq!(extract_token(&req), None);
    }

    #[test]
    fn test_missing_or_expired_token_is_unauthorized() {
        let db = Database::in_memory().unwrap();

        let req = TestRequest::default().to_http_request();
        let resp = validate_request(&db, &req).unwrap_err();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let expired = db.create_session(-1).unwrap();
        let req = TestRequest::default()
            .insert_header(("Authorization", format!("Bearer {}", expired.token)))
            .to_http_request();
        let resp = validate_request(&db, &req).unwrap_err();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let live = db.create_session(1).unwrap();
        let req = TestRequest::default()
            .insert_header(("Authorization", format!("Bearer {}", live.token)))
            .to_http_request();
        assert_eq!(validate_request(&db, &req).unwrap().id, live.id);
    }
}
