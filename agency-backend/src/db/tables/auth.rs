//! Auth session database operations

use chrono::{Duration, Utc};
use rusqlite::{OptionalExtension, Result as SqliteResult};
use uuid::Uuid;

use crate::db::parse_datetime;
use crate::models::Session;
use super::super::Database;

impl Database {
    /// Create a new session valid for `ttl_hours`. Expired sessions are cleared first.
    pub fn create_session(&self, ttl_hours: i64) -> SqliteResult<Session> {
        let purged = self.purge_expired_sessions()?;
        if purged > 0 {
            log::debug!("[AUTH] Purged {} expired sessions", purged);
        }

        let conn = self.conn();
        let token = Uuid::new_v4().to_string();
        let now = Utc::now();
        let expires_at = now + Duration::hours(ttl_hours);

        conn.execute(
            "INSERT INTO auth_sessions (token, created_at, expires_at) VALUES (?1, ?2, ?3)",
            [&token, &now.to_rfc3339(), &expires_at.to_rfc3339()],
        )?;

        Ok(Session {
            id: conn.last_insert_rowid(),
            token,
            created_at: now,
            expires_at,
        })
    }

    /// Look up a session by token. Expired sessions are deleted and reported as missing.
    pub fn validate_session(&self, token: &str) -> SqliteResult<Option<Session>> {
        let conn = self.conn();

        let session = conn
            .query_row(
                "SELECT id, token, created_at, expires_at FROM auth_sessions WHERE token = ?1",
                [token],
                |row| {
                    let created_at: String = row.get(2)?;
                    let expires_at: String = row.get(3)?;
                    Ok(Session {
                        id: row.get(0)?,
                        token: row.get(1)?,
                        created_at: parse_datetime(2, &created_at)?,
                        expires_at: parse_datetime(3, &expires_at)?,
                    })
                },
            )
            .optional()?;

        match session {
            Some(s) if s.is_expired() => {
                conn.execute("DELETE FROM auth_sessions WHERE id = ?1", [s.id])?;
                Ok(None)
            }
            other => Ok(other),
        }
    }

    /// Delete every session past its expiry
    pub fn purge_expired_sessions(&self) -> SqliteResult<usize> {
        let mut conn = self.conn();
        let now = Utc::now();
        let tx = conn.transaction()?;

        let expired: Vec<i64> = {
            let mut stmt = tx.prepare("SELECT id, expires_at FROM auth_sessions")?;
            let rows = stmt.query_map([], |row| {
                let expires_at: String = row.get(1)?;
                Ok((row.get::<_, i64>(0)?, parse_datetime(1, &expires_at)?))
            })?;
            rows.filter_map(|r| match r {
                Ok((id, expires_at)) if expires_at < now => Some(Ok(id)),
                Ok(_) => None,
                Err(e) => Some(Err(e)),
            })
            .collect::<SqliteResult<Vec<_>>>()?
        };

        for id in &expired {
            tx.execute("DELETE FROM auth_sessions WHERE id = ?1", [id])?;
        }
        tx.commit()?;
        Ok(expired.len())
    }

    /// Delete a session by token
    pub fn delete_session(&self, token: &str) -> SqliteResult<bool> {
        let conn = self.conn();
        let rows_affected = conn.execute("DELETE FROM auth_sessions WHERE token = ?1", [token])?;
        Ok(rows_affected > 0)
    }
}
