//! API key database operations

use chrono::Utc;
use rusqlite::{OptionalExtension, Result as SqliteResult, Row};

use crate::db::parse_datetime;
use crate::models::ApiKey;
use super::super::Database;

fn row_to_api_key(row: &Row) -> SqliteResult<ApiKey> {
    let created_at_str: String = row.get(3)?;
    let updated_at_str: String = row.get(4)?;

    Ok(ApiKey {
        id: row.get(0)?,
        service_name: row.get(1)?,
        api_key: row.get(2)?,
        created_at: parse_datetime(3, &created_at_str)?,
        updated_at: parse_datetime(4, &updated_at_str)?,
    })
}

impl Database {
    /// Get an API key by service name
    pub fn get_api_key(&self, service_name: &str) -> SqliteResult<Option<ApiKey>> {
        let conn = self.conn();

        conn.query_row(
            "SELECT id, service_name, api_key, created_at, updated_at FROM external_api_keys WHERE service_name = ?1",
            [service_name],
            row_to_api_key,
        )
        .optional()
    }

    /// List all API keys
    pub fn list_api_keys(&self) -> SqliteResult<Vec<ApiKey>> {
        let conn = self.conn();

        let mut stmt = conn.prepare(
            "SELECT id, service_name, api_key, created_at, updated_at FROM external_api_keys ORDER BY service_name",
        )?;

        let api_keys = stmt
            .query_map([], row_to_api_key)?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(api_keys)
    }

    /// Insert or update an API key
    pub fn upsert_api_key(&self, service_name: &str, api_key: &str) -> SqliteResult<ApiKey> {
        let conn = self.conn();
        let now = Utc::now().to_rfc3339();

        conn.execute(
            "INSERT INTO external_api_keys (service_name, api_key, created_at, updated_at) VALUES (?1, ?2, ?3, ?3)
             ON CONFLICT(service_name) DO UPDATE SET api_key = excluded.api_key, updated_at = excluded.updated_at",
            [service_name, api_key, &now],
        )?;

        conn.query_row(
            "SELECT id, service_name, api_key, created_at, updated_at FROM external_api_keys WHERE service_name = ?1",
            [service_name],
            row_to_api_key,
        )
    }

    /// Delete an API key by service name
    pub fn delete_api_key(&self, service_name: &str) -> SqliteResult<bool> {
        let conn = self.conn();
        let rows_affected = conn.execute(
            "DELETE FROM external_api_keys WHERE service_name = ?1",
            [service_name],
        )?;
        Ok(rows_affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upsert_overwrites_value() {
        let db = Database::in_memory().unwrap();
        let first = db.upsert_api_key("CLICKUP_API_TOKEN", "pk_old").unwrap();
        let second = db.upsert_api_key("CLICKUP_API_TOKEN", "pk_new").unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.api_key, "pk_new");
        assert_eq!(db.list_api_keys().unwrap().len(), 1);
    }

    #[test]
    fn test_delete_api_key() {
        let db = Database::in_memory().unwrap();
        db.upsert_api_key("RESEND_API_KEY", "re_123").unwrap();

        assert!(db.delete_api_key("RESEND_API_KEY").unwrap());
        assert!(db.get_api_key("RESEND_API_KEY").unwrap().is_none());
        assert!(!db.delete_api_key("RESEND_API_KEY").unwrap());
    }
}
