//! Social post database operations

use chrono::Utc;
use rusqlite::{params, OptionalExtension, Result as SqliteResult, Row};

use crate::db::{parse_datetime, parse_enum};
use crate::models::{NewSocialPost, PostStatus, SocialPost};
use super::super::Database;

const POST_COLUMNS: &str =
    "id, platform, content, media_url, scheduled_for, status, external_id, error, created_at, updated_at";

fn row_to_post(row: &Row) -> SqliteResult<SocialPost> {
    let scheduled_for: String = row.get(4)?;
    let status: String = row.get(5)?;
    let created_at: String = row.get(8)?;
    let updated_at: String = row.get(9)?;

    Ok(SocialPost {
        id: row.get(0)?,
        platform: row.get(1)?,
        content: row.get(2)?,
        media_url: row.get(3)?,
        scheduled_for: parse_datetime(4, &scheduled_for)?,
        status: parse_enum(5, &status)?,
        external_id: row.get(6)?,
        error: row.get(7)?,
        created_at: parse_datetime(8, &created_at)?,
        updated_at: parse_datetime(9, &updated_at)?,
    })
}

impl Database {
    /// Store a new post as a draft
    pub fn insert_social_post(&self, post: &NewSocialPost) -> SqliteResult<SocialPost> {
        let conn = self.conn();
        let now = Utc::now().to_rfc3339();

        conn.execute(
            "INSERT INTO social_posts (platform, content, media_url, scheduled_for, status, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, 'draft', ?5, ?5)",
            params![
                post.platform,
                post.content,
                post.media_url,
                post.scheduled_for.to_rfc3339(),
                &now,
            ],
        )?;

        let id = conn.last_insert_rowid();
        conn.query_row(
            &format!("SELECT {} FROM social_posts WHERE id = ?1", POST_COLUMNS),
            [id],
            row_to_post,
        )
    }

    pub fn get_social_post(&self, id: i64) -> SqliteResult<Option<SocialPost>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {} FROM social_posts WHERE id = ?1", POST_COLUMNS),
            [id],
            row_to_post,
        )
        .optional()
    }

    /// Record the outcome of pushing a post to the scheduler
    pub fn update_social_post_status(
        &self,
        id: i64,
        status: PostStatus,
        external_id: Option<&str>,
        error: Option<&str>,
    ) -> SqliteResult<bool> {
        let conn = self.conn();
        let now = Utc::now().to_rfc3339();
        let rows_affected = conn.execute(
            "UPDATE social_posts SET status = ?1, external_id = COALESCE(?2, external_id), error = ?3, updated_at = ?4
             WHERE id = ?5",
            params![status.to_string(), external_id, error, &now, id],
        )?;
        Ok(rows_affected > 0)
    }

    /// Posts ordered by scheduled time
    pub fn list_social_posts(&self, status: Option<PostStatus>) -> SqliteResult<Vec<SocialPost>> {
        let conn = self.conn();
        let status_str = status.map(|s| s.to_string());

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM social_posts WHERE (?1 IS NULL OR status = ?1) ORDER BY scheduled_for, id",
            POST_COLUMNS
        ))?;

        let posts = stmt
            .query_map([status_str], row_to_post)?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(posts)
    }
}
