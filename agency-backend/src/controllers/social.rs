use actix_web::{web, HttpRequest, HttpResponse, Responder};
use serde::Deserialize;

use crate::middleware::session_auth::validate_request;
use crate::models::{NewSocialPost, PostStatus};
use crate::social;
use crate::AppState;
use super::{integration_error_response, service_error_response};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    status: Option<PostStatus>,
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/social")
            .route("", web::get().to(list_posts))
            .route("/schedule", web::post().to(schedule)),
    );
}

async fn list_posts(state: web::Data<AppState>, req: HttpRequest, query: web::Query<ListQuery>) -> impl Responder {
    if let Err(resp) = validate_request(&state.db, &req) {
        return resp;
    }

    match state.db.list_social_posts(query.status) {
        Ok(posts) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "posts": posts
        })),
        Err(e) => service_error_response("Listing social posts", e.into()),
    }
}

async fn schedule(state: web::Data<AppState>, req: HttpRequest, body: web::Json<NewSocialPost>) -> impl Responder {
    if let Err(resp) = validate_request(&state.db, &req) {
        return resp;
    }

    let scheduler = match state.integrations.metricool() {
        Ok(client) => client,
        Err(e) => return integration_error_response("Social scheduling", e),
    };

    match social::schedule_post(&state.db, &scheduler, &body).await {
        Ok(post) => {
            let scheduled = post.status == PostStatus::Scheduled;
            let error = post.error.clone();
            HttpResponse::Ok().json(serde_json::json!({
                "success": scheduled,
                "post": post,
                "error": error
            }))
        }
        Err(e) => service_error_response("Social scheduling failed", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controllers::test_support::{app_state, bearer};
    use actix_web::{http::StatusCode, test, App};
    use serde_json::json;

    #[actix_web::test]
    async fn test_schedule_without_metricool_config() {
        let state = app_state();
        let app = test::init_service(App::new().app_data(state.clone()).configure(config)).await;

        let req = test::TestRequest::post()
            .uri("/api/social/schedule")
            .insert_header(bearer(&state))
            .set_json(json!({
                "platform": "facebook",
                "content": "Just sold!",
                "scheduled_for": "2099-01-01T12:00:00Z"
            }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_list_empty() {
        let state = app_state();
        let app = test::init_service(App::new().app_data(state.clone()).configure(config)).await;

        let req = test::TestRequest::get()
            .uri("/api/social?status=scheduled")
            .insert_header(bearer(&state))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["posts"], json!([]));
    }
}
