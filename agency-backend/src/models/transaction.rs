use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TransactionStatus {
    Active,
    Pending,
    Closed,
    Cancelled,
}

impl TransactionStatus {
    /// Map a free-form status string from the transaction system
    pub fn from_external(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "pending" | "under contract" | "under_contract" => Self::Pending,
            "closed" | "sold" => Self::Closed,
            "cancelled" | "canceled" | "withdrawn" | "expired" => Self::Cancelled,
            _ => Self::Active,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub external_id: String,
    pub address: String,
    pub client_name: Option<String>,
    pub status: TransactionStatus,
    pub sale_price: Option<f64>,
    /// Percent, e.g. 3.0 for 3%
    pub commission_rate: Option<f64>,
    pub close_date: Option<NaiveDate>,
    pub synced_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    /// Gross commission income for this deal
    pub fn gci(&self) -> Option<f64> {
        match (self.sale_price, self.commission_rate) {
            (Some(price), Some(rate)) => Some(price * rate / 100.0),
            _ => None,
        }
    }
}
