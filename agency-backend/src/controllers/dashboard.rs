use actix_web::{web, HttpRequest, HttpResponse, Responder};
use chrono::{Datelike, Utc};
use serde::Serialize;

use crate::db::DashboardCounts;
use crate::middleware::session_auth::validate_request;
use crate::spheresync::{SphereWeek, WeekLetters};
use crate::AppState;

#[derive(Serialize)]
pub struct DashboardData {
    success: bool,
    week: SphereWeek,
    letters: WeekLetters,
    counts: DashboardCounts,
    timestamp: String,
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/api/dashboard").route(web::get().to(get_dashboard)));
}

async fn get_dashboard(state: web::Data<AppState>, req: HttpRequest) -> impl Responder {
    if let Err(resp) = validate_request(&state.db, &req) {
        return resp;
    }

    let now = Utc::now();
    let today = now.date_naive();
    let week = SphereWeek::of(today);

    match state.db.dashboard_counts(week, today.year()) {
        Ok(counts) => HttpResponse::Ok().json(DashboardData {
            success: true,
            week,
            letters: week.letters(),
            counts,
            timestamp: now.to_rfc3339(),
        }),
        Err(e) => {
            log::error!("Failed to load dashboard counts: {}", e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "success": false,
                "error": "Failed to load dashboard"
            }))
        }
    }
}
