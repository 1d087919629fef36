//! Transaction database operations

use chrono::{NaiveDate, Utc};
use rusqlite::{params, OptionalExtension, Result as SqliteResult, Row};

use crate::db::{parse_datetime, parse_enum, parse_optional_date};
use crate::models::{Transaction, TransactionStatus};
use super::super::Database;

const TRANSACTION_COLUMNS: &str = "id, external_id, address, client_name, status, sale_price, commission_rate,
     close_date, synced_at, created_at, updated_at";

/// Incoming transaction data keyed by the external system's id
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionUpsert {
    pub external_id: String,
    pub address: String,
    pub client_name: Option<String>,
    pub status: TransactionStatus,
    pub sale_price: Option<f64>,
    pub commission_rate: Option<f64>,
    pub close_date: Option<NaiveDate>,
}

fn row_to_transaction(row: &Row) -> SqliteResult<Transaction> {
    let status: String = row.get(4)?;
    let synced_at: String = row.get(8)?;
    let created_at: String = row.get(9)?;
    let updated_at: String = row.get(10)?;

    Ok(Transaction {
        id: row.get(0)?,
        external_id: row.get(1)?,
        address: row.get(2)?,
        client_name: row.get(3)?,
        status: parse_enum(4, &status)?,
        sale_price: row.get(5)?,
        commission_rate: row.get(6)?,
        close_date: parse_optional_date(7, row.get(7)?)?,
        synced_at: parse_datetime(8, &synced_at)?,
        created_at: parse_datetime(9, &created_at)?,
        updated_at: parse_datetime(10, &updated_at)?,
    })
}

impl Database {
    /// Insert or update by external id. Returns true when a new row was inserted.
    pub fn upsert_transaction(&self, tx_data: &TransactionUpsert) -> SqliteResult<bool> {
        let conn = self.conn();
        let now = Utc::now().to_rfc3339();
        let close_date = tx_data.close_date.map(|d| d.format("%Y-%m-%d").to_string());

        let existing: Option<i64> = conn
            .query_row(
                "SELECT id FROM transactions WHERE external_id = ?1",
                [&tx_data.external_id],
                |row| row.get(0),
            )
            .optional()?;

        match existing {
            Some(id) => {
                conn.execute(
                    "UPDATE transactions SET address = ?1, client_name = ?2, status = ?3, sale_price = ?4,
                        commission_rate = ?5, close_date = ?6, synced_at = ?7, updated_at = ?7
                     WHERE id = ?8",
                    params![
                        tx_data.address,
                        tx_data.client_name,
                        tx_data.status.to_string(),
                        tx_data.sale_price,
                        tx_data.commission_rate,
                        close_date,
                        &now,
                        id,
                    ],
                )?;
                Ok(false)
            }
            None => {
                conn.execute(
                    "INSERT INTO transactions (external_id, address, client_name, status, sale_price, commission_rate,
                        close_date, synced_at, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8, ?8)",
                    params![
                        tx_data.external_id,
                        tx_data.address,
                        tx_data.client_name,
                        tx_data.status.to_string(),
                        tx_data.sale_price,
                        tx_data.commission_rate,
                        close_date,
                        &now,
                    ],
                )?;
                Ok(true)
            }
        }
    }

    pub fn get_transaction_by_external_id(&self, external_id: &str) -> SqliteResult<Option<Transaction>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {} FROM transactions WHERE external_id = ?1", TRANSACTION_COLUMNS),
            [external_id],
            row_to_transaction,
        )
        .optional()
    }

    /// List transactions, most recent close date first (open deals last)
    pub fn list_transactions(&self, status: Option<TransactionStatus>) -> SqliteResult<Vec<Transaction>> {
        let conn = self.conn();
        let status_str = status.map(|s| s.to_string());

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM transactions WHERE (?1 IS NULL OR status = ?1)
             ORDER BY close_date IS NULL, close_date DESC, id DESC",
            TRANSACTION_COLUMNS
        ))?;

        let transactions = stmt
            .query_map([status_str], row_to_transaction)?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(transactions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upsert(external_id: &str, status: TransactionStatus, close: Option<&str>) -> TransactionUpsert {
        TransactionUpsert {
            external_id: external_id.to_string(),
            address: format!("{} Main St", external_id),
            client_name: Some("Pat Buyer".to_string()),
            status,
            sale_price: Some(300_000.0),
            commission_rate: Some(3.0),
            close_date: close.map(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").unwrap()),
        }
    }

    #[test]
    fn test_upsert_inserts_then_updates() {
        let db = Database::in_memory().unwrap();
        assert!(db.upsert_transaction(&upsert("100", TransactionStatus::Pending, None)).unwrap());

        let mut changed = upsert("100", TransactionStatus::Closed, Some("2026-03-15"));
        changed.sale_price = Some(310_000.0);
        assert!(!db.upsert_transaction(&changed).unwrap());

        let stored = db.get_transaction_by_external_id("100").unwrap().unwrap();
        assert_eq!(stored.status, TransactionStatus::Closed);
        assert_eq!(stored.sale_price, Some(310_000.0));
        assert_eq!(stored.close_date, NaiveDate::from_ymd_opt(2026, 3, 15));
        assert_eq!(db.list_transactions(None).unwrap().len(), 1);
    }

    #[test]
    fn test_list_filter_and_order() {
        let db = Database::in_memory().unwrap();
        db.upsert_transaction(&upsert("a", TransactionStatus::Closed, Some("2026-01-10"))).unwrap();
        db.upsert_transaction(&upsert("b", TransactionStatus::Active, None)).unwrap();
        db.upsert_transaction(&upsert("c", TransactionStatus::Closed, Some("2026-05-01"))).unwrap();

        let all: Vec<String> = db
            .list_transactions(None)
            .unwrap()
            .into_iter()
            .map(|t| t.external_id)
            .collect();
        assert_eq!(all, vec!["c", "a", "b"]);

        assert_eq!(db.list_transactions(Some(TransactionStatus::Closed)).unwrap().len(), 2);
    }
}
