//! Email log database operations

use chrono::Utc;
use rusqlite::{params, OptionalExtension, Result as SqliteResult, Row};

use crate::db::{parse_datetime, parse_enum, parse_optional_datetime};
use crate::models::{EmailLog, EmailStatus, MAX_EMAIL_ATTEMPTS};
use super::super::Database;

const EMAIL_COLUMNS: &str = "id, to_address, subject, html_body, status, attempts, last_error, provider_id,
     created_at, updated_at, sent_at";

fn row_to_email(row: &Row) -> SqliteResult<EmailLog> {
    let status: String = row.get(4)?;
    let created_at: String = row.get(8)?;
    let updated_at: String = row.get(9)?;

    Ok(EmailLog {
        id: row.get(0)?,
        to_address: row.get(1)?,
        subject: row.get(2)?,
        html_body: row.get(3)?,
        status: parse_enum(4, &status)?,
        attempts: row.get(5)?,
        last_error: row.get(6)?,
        provider_id: row.get(7)?,
        created_at: parse_datetime(8, &created_at)?,
        updated_at: parse_datetime(9, &updated_at)?,
        sent_at: parse_optional_datetime(10, row.get(10)?)?,
    })
}

impl Database {
    /// Log an outgoing email as pending
    pub fn insert_email(&self, to_address: &str, subject: &str, html_body: &str) -> SqliteResult<EmailLog> {
        let conn = self.conn();
        let now = Utc::now().to_rfc3339();

        conn.execute(
            "INSERT INTO email_logs (to_address, subject, html_body, status, attempts, created_at, updated_at)
             VALUES (?1, ?2, ?3, 'pending', 0, ?4, ?4)",
            params![to_address, subject, html_body, &now],
        )?;

        let id = conn.last_insert_rowid();
        conn.query_row(
            &format!("SELECT {} FROM email_logs WHERE id = ?1", EMAIL_COLUMNS),
            [id],
            row_to_email,
        )
    }

    pub fn get_email(&self, id: i64) -> SqliteResult<Option<EmailLog>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {} FROM email_logs WHERE id = ?1", EMAIL_COLUMNS),
            [id],
            row_to_email,
        )
        .optional()
    }

    pub fn mark_email_sent(&self, id: i64, provider_id: &str) -> SqliteResult<bool> {
        let conn = self.conn();
        let now = Utc::now().to_rfc3339();
        let rows_affected = conn.execute(
            "UPDATE email_logs SET status = 'sent', provider_id = ?1, attempts = attempts + 1,
                last_error = NULL, sent_at = ?2, updated_at = ?2
             WHERE id = ?3",
            params![provider_id, &now, id],
        )?;
        Ok(rows_affected > 0)
    }

    /// Record a failed attempt. `give_up` exhausts the attempt budget so the row is never retried.
    pub fn mark_email_failed(&self, id: i64, error: &str, give_up: bool) -> SqliteResult<bool> {
        let conn = self.conn();
        let now = Utc::now().to_rfc3339();
        let rows_affected = conn.execute(
            "UPDATE email_logs SET status = 'failed', last_error = ?1, updated_at = ?2,
                attempts = CASE WHEN ?3 THEN MAX(attempts + 1, ?4) ELSE attempts + 1 END
             WHERE id = ?5",
            params![error, &now, give_up, MAX_EMAIL_ATTEMPTS, id],
        )?;
        Ok(rows_affected > 0)
    }

    /// Failed emails that still have attempts left, oldest first
    pub fn list_retryable_emails(&self) -> SqliteResult<Vec<EmailLog>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM email_logs WHERE status = 'failed' AND attempts < ?1 ORDER BY id",
            EMAIL_COLUMNS
        ))?;

        let emails = stmt
            .query_map([MAX_EMAIL_ATTEMPTS], row_to_email)?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(emails)
    }

    /// Most recent emails first
    pub fn list_emails(&self, status: Option<EmailStatus>, limit: usize) -> SqliteResult<Vec<EmailLog>> {
        let conn = self.conn();
        let status_str = status.map(|s| s.to_string());

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM email_logs WHERE (?1 IS NULL OR status = ?1) ORDER BY id DESC LIMIT ?2",
            EMAIL_COLUMNS
        ))?;

        let emails = stmt
            .query_map(params![status_str, limit as i64], row_to_email)?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(emails)
    }
}
