use actix_web::{web, HttpRequest, HttpResponse, Responder};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;

use crate::error::ServiceError;
use crate::middleware::session_auth::validate_request;
use crate::models::TaskStatus;
use crate::spheresync::{self, SphereWeek};
use crate::AppState;
use super::{integration_error_response, service_error_response};

#[derive(Debug, Deserialize)]
pub struct WeekQuery {
    date: Option<NaiveDate>,
}

/// Explicit week, or the current one when both are absent
#[derive(Debug, Default, Deserialize)]
pub struct WeekSelector {
    year: Option<i32>,
    week: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct TasksQuery {
    year: Option<i32>,
    week: Option<u32>,
    status: Option<TaskStatus>,
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/spheresync")
            .route("/week", web::get().to(get_week))
            .route("/generate", web::post().to(generate))
            .route("/tasks", web::get().to(list_tasks))
            .route("/tasks/{id}/complete", web::post().to(complete_task))
            .route("/tasks/{id}/skip", web::post().to(skip_task))
            .route("/push-clickup", web::post().to(push_clickup)),
    );
}

fn resolve_week(year: Option<i32>, week: Option<u32>) -> Result<SphereWeek, ServiceError> {
    match (year, week) {
        (None, None) => Ok(SphereWeek::of(Utc::now().date_naive())),
        (Some(year), Some(week)) => SphereWeek::new(year, week).map_err(ServiceError::Validation),
        _ => Err(ServiceError::Validation("year and week must be given together".to_string())),
    }
}

async fn get_week(state: web::Data<AppState>, req: HttpRequest, query: web::Query<WeekQuery>) -> impl Responder {
    if let Err(resp) = validate_request(&state.db, &req) {
        return resp;
    }

    let week = SphereWeek::of(query.date.unwrap_or_else(|| Utc::now().date_naive()));
    HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "year": week.year,
        "week": week.week,
        "start_date": week.start_date(),
        "end_date": week.end_date(),
        "letters": week.letters()
    }))
}

async fn generate(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: Option<web::Json<WeekSelector>>,
) -> impl Responder {
    if let Err(resp) = validate_request(&state.db, &req) {
        return resp;
    }

    let selector = body.map(|b| b.into_inner()).unwrap_or_default();
    let result = resolve_week(selector.year, selector.week).and_then(|week| spheresync::generate_week(&state.db, week));

    match result {
        Ok(summary) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "summary": summary
        })),
        Err(e) => service_error_response("SphereSync generation failed", e),
    }
}

async fn list_tasks(state: web::Data<AppState>, req: HttpRequest, query: web::Query<TasksQuery>) -> impl Responder {
    if let Err(resp) = validate_request(&state.db, &req) {
        return resp;
    }

    let week = match resolve_week(query.year, query.week) {
        Ok(week) => week,
        Err(e) => return service_error_response("Listing tasks", e),
    };

    match state.db.list_tasks(week, query.status) {
        Ok(tasks) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "year": week.year,
            "week": week.week,
            "tasks": tasks
        })),
        Err(e) => service_error_response("Listing tasks", e.into()),
    }
}

fn update_status(state: &AppState, task_id: i64, status: TaskStatus) -> HttpResponse {
    match spheresync::set_task_status(&state.db, task_id, status) {
        Ok(task) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "task": task
        })),
        Err(e) => service_error_response("Updating task", e),
    }
}

async fn complete_task(state: web::Data<AppState>, req: HttpRequest, path: web::Path<i64>) -> impl Responder {
    if let Err(resp) = validate_request(&state.db, &req) {
        return resp;
    }
    update_status(&state, path.into_inner(), TaskStatus::Completed)
}

async fn skip_task(state: web::Data<AppState>, req: HttpRequest, path: web::Path<i64>) -> impl Responder {
    if let Err(resp) = validate_request(&state.db, &req) {
        return resp;
    }
    update_status(&state, path.into_inner(), TaskStatus::Skipped)
}

async fn push_clickup(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: Option<web::Json<WeekSelector>>,
) -> impl Responder {
    if let Err(resp) = validate_request(&state.db, &req) {
        return resp;
    }

    let selector = body.map(|b| b.into_inner()).unwrap_or_default();
    let week = match resolve_week(selector.year, selector.week) {
        Ok(week) => week,
        Err(e) => return service_error_response("ClickUp push", e),
    };
    let tracker = match state.integrations.clickup() {
        Ok(tracker) => tracker,
        Err(e) => return integration_error_response("ClickUp push", e),
    };

    match spheresync::push_week_to_clickup(&state.db, &tracker, week).await {
        Ok(summary) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "pushed": summary.pushed,
            "failed": summary.failed
        })),
        Err(e) => service_error_response("ClickUp push failed", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewContact;
    use crate::controllers::test_support::{app_state, bearer};
    use actix_web::{http::StatusCode, test as actix_test, App};
    use serde_json::{json, Value};

    #[test]
    fn test_resolve_week() {
        assert!(resolve_week(None, None).is_ok());
        assert_eq!(resolve_week(Some(2026), Some(53)).unwrap().week, 53);
        assert!(matches!(resolve_week(Some(2027), Some(53)), Err(ServiceError::Validation(_))));
        assert!(matches!(resolve_week(Some(2026), None), Err(ServiceError::Validation(_))));
    }

    #[actix_web::test]
    async fn test_week_letters_for_date() {
        let state = app_state();
        let app = actix_test::init_service(App::new().app_data(state.clone()).configure(config)).await;

        let req = actix_test::TestRequest::get()
            .uri("/api/spheresync/week?date=2026-01-01")
            .insert_header(bearer(&state))
            .to_request();
        let body: Value = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["year"], 2026);
        assert_eq!(body["week"], 1);
        assert_eq!(body["start_date"], "2025-12-29");
        assert_eq!(body["letters"], json!({ "call": ["S", "X"], "text": "A" }));
    }

    #[actix_web::test]
    async fn test_generate_list_and_complete() {
        let state = app_state();
        state
            .db
            .insert_contact(&NewContact {
                first_name: Some("Sara".to_string()),
                last_name: Some("Smith".to_string()),
                phone: Some("5551234567".to_string()),
                ..Default::default()
            })
            .unwrap();
        let app = actix_test::init_service(App::new().app_data(state.clone()).configure(config)).await;
        let auth = bearer(&state);

        let req = actix_test::TestRequest::post()
            .uri("/api/spheresync/generate")
            .insert_header(auth.clone())
            .set_json(json!({ "year": 2026, "week": 1 }))
            .to_request();
        let body: Value = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["summary"]["created"], 1);

        let req = actix_test::TestRequest::get()
            .uri("/api/spheresync/tasks?year=2026&week=1&status=pending")
            .insert_header(auth.clone())
            .to_request();
        let body: Value = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["tasks"][0]["task_type"], "call");
        let task_id = body["tasks"][0]["id"].as_i64().unwrap();

        let req = actix_test::TestRequest::post()
            .uri(&format!("/api/spheresync/tasks/{}/complete", task_id))
            .insert_header(auth.clone())
            .to_request();
        let body: Value = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["task"]["status"], "completed");

        let req = actix_test::TestRequest::post()
            .uri("/api/spheresync/tasks/9999/skip")
            .insert_header(auth.clone())
            .to_request();
        assert_eq!(actix_test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

        let req = actix_test::TestRequest::post()
            .uri("/api/spheresync/generate")
            .insert_header(auth)
            .set_json(json!({ "year": 2026, "week": 60 }))
            .to_request();
        assert_eq!(actix_test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
    }
}
