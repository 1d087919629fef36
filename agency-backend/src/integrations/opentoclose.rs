//! Transaction records from OpenToClose
//!
//! Property records are loosely typed: ids and prices come back as numbers or
//! strings depending on the account, so the raw record is parsed leniently and
//! rows without an id or address are skipped.

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use super::{check_status, IntegrationError, IntegrationResult, TransactionSource};
use crate::db::TransactionUpsert;
use crate::models::TransactionStatus;

const SERVICE: &str = "opentoclose";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PropertyRecord {
    id: Value,
    #[serde(alias = "property_address", alias = "full_address")]
    address: Option<String>,
    #[serde(alias = "client", alias = "contact_name")]
    client_name: Option<String>,
    #[serde(alias = "transaction_status", alias = "property_status")]
    status: Option<String>,
    #[serde(alias = "price", alias = "purchase_price")]
    sale_price: Value,
    #[serde(alias = "commission", alias = "commission_percent")]
    commission_rate: Value,
    #[serde(alias = "closing_date", alias = "close_of_escrow")]
    close_date: Option<String>,
}

fn value_to_string(v: &Value) -> Option<String> {
    match v {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Numbers, or strings like "$450,000" and "2.5%"
fn value_to_f64(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let cleaned: String = s.chars().filter(|c| c.is_ascii_digit() || *c == '.').collect();
            cleaned.parse().ok()
        }
        _ => None,
    }
}

/// Accepts a bare date or the date part of a timestamp
fn parse_close_date(raw: &str) -> Option<NaiveDate> {
    let date_part = raw.trim().get(..10)?;
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

impl PropertyRecord {
    fn into_upsert(self) -> Option<TransactionUpsert> {
        let external_id = value_to_string(&self.id)?;
        let address = self.address.map(|a| a.trim().to_string()).filter(|a| !a.is_empty())?;

        Some(TransactionUpsert {
            external_id,
            address,
            client_name: self.client_name.filter(|c| !c.trim().is_empty()),
            status: TransactionStatus::from_external(self.status.as_deref().unwrap_or("")),
            sale_price: value_to_f64(&self.sale_price),
            commission_rate: value_to_f64(&self.commission_rate),
            close_date: self.close_date.as_deref().and_then(parse_close_date),
        })
    }
}

/// The list comes back bare or wrapped in `data`
fn parse_page(body: Value) -> IntegrationResult<Vec<TransactionUpsert>> {
    let items = match body {
        Value::Array(items) => items,
        Value::Object(mut obj) => match obj.remove("data") {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(IntegrationError::Decode {
                    service: SERVICE,
                    message: "expected a list of properties".to_string(),
                })
            }
        },
        _ => {
            return Err(IntegrationError::Decode {
                service: SERVICE,
                message: "expected a list of properties".to_string(),
            })
        }
    };

    let total = items.len();
    let parsed: Vec<TransactionUpsert> = items
        .into_iter()
        .filter_map(|item| serde_json::from_value::<PropertyRecord>(item).ok())
        .filter_map(PropertyRecord::into_upsert)
        .collect();

    if parsed.len() < total {
        log::warn!(
            "[TRANSACTIONS] Skipped {} property records without id or address",
            total - parsed.len()
        );
    }
    Ok(parsed)
}

pub struct OpenToCloseClient {
    http: Client,
    base_url: String,
    page_size: usize,
    token: String,
}

impl OpenToCloseClient {
    pub fn new(http: Client, base_url: &str, page_size: usize, token: String) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            page_size: page_size.max(1),
            token,
        }
    }
}

#[async_trait]
impl TransactionSource for OpenToCloseClient {
    fn page_size(&self) -> usize {
        self.page_size
    }

    async fn fetch_page(&self, offset: usize, limit: usize) -> IntegrationResult<Vec<TransactionUpsert>> {
        let resp = self
            .http
            .get(format!("{}/properties", self.base_url))
            .query(&[
                ("api_token", self.token.clone()),
                ("offset", offset.to_string()),
                ("limit", limit.to_string()),
            ])
            .send()
            .await?;
        let resp = check_status(SERVICE, resp).await?;

        parse_page(resp.json().await?)
    }
}
