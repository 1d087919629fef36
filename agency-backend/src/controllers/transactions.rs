use actix_web::{web, HttpRequest, HttpResponse, Responder};
use serde::{Deserialize, Serialize};

use crate::middleware::session_auth::validate_request;
use crate::models::{Transaction, TransactionStatus};
use crate::transactions;
use crate::AppState;
use super::{integration_error_response, service_error_response};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    status: Option<TransactionStatus>,
}

#[derive(Serialize)]
struct TransactionView {
    #[serde(flatten)]
    transaction: Transaction,
    gci: Option<f64>,
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/transactions")
            .route("", web::get().to(list_transactions))
            .route("/sync", web::post().to(sync)),
    );
}

async fn list_transactions(
    state: web::Data<AppState>,
    req: HttpRequest,
    query: web::Query<ListQuery>,
) -> impl Responder {
    if let Err(resp) = validate_request(&state.db, &req) {
        return resp;
    }

    match state.db.list_transactions(query.status) {
        Ok(list) => {
            let views: Vec<TransactionView> = list
                .into_iter()
                .map(|t| TransactionView {
                    gci: t.gci(),
                    transaction: t,
                })
                .collect();
            HttpResponse::Ok().json(serde_json::json!({
                "success": true,
                "transactions": views
            }))
        }
        Err(e) => service_error_response("Listing transactions", e.into()),
    }
}

async fn sync(state: web::Data<AppState>, req: HttpRequest) -> impl Responder {
    if let Err(resp) = validate_request(&state.db, &req) {
        return resp;
    }

    let source = match state.integrations.opentoclose() {
        Ok(source) => source,
        Err(e) => return integration_error_response("Transaction sync", e),
    };
    let max_pages = state.integrations.config().opentoclose.max_pages;

    match transactions::sync_transactions(&state.db, &source, max_pages).await {
        Ok(summary) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "fetched": summary.fetched,
            "inserted": summary.inserted,
            "updated": summary.updated
        })),
        Err(e) => service_error_response("Transaction sync failed", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controllers::test_support::{app_state, bearer};
    use crate::db::TransactionUpsert;
    use actix_web::{test, App};
    use serde_json::Value;

    #[actix_web::test]
    async fn test_list_includes_gci_and_filters() {
        let state = app_state();
        for (id, status) in [("a", TransactionStatus::Closed), ("b", TransactionStatus::Active)] {
            state
                .db
                .upsert_transaction(&TransactionUpsert {
                    external_id: id.to_string(),
                    address: "1 Main St".to_string(),
                    client_name: None,
                    status,
                    sale_price: Some(400_000.0),
                    commission_rate: Some(3.0),
                    close_date: None,
                })
                .unwrap();
        }
        let app = test::init_service(App::new().app_data(state.clone()).configure(config)).await;

        let req = test::TestRequest::get()
            .uri("/api/transactions?status=closed")
            .insert_header(bearer(&state))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        let list = body["transactions"].as_array().unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0]["external_id"], "a");
        assert_eq!(list[0]["gci"], 12_000.0);
    }
}
