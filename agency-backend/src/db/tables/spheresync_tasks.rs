//! SphereSync task database operations

use chrono::Utc;
use rusqlite::{params, OptionalExtension, Result as SqliteResult, Row};

use crate::db::{parse_datetime, parse_enum, parse_optional_datetime};
use crate::models::{SphereTask, TaskStatus};
use crate::spheresync::{PlannedTask, SphereWeek};
use super::super::Database;

const TASK_SELECT: &str = "SELECT t.id, t.contact_id, TRIM(c.first_name || ' ' || c.last_name), c.phone,
        t.task_type, t.year, t.week_number, t.status, t.clickup_task_id, t.completed_at, t.created_at
     FROM spheresync_tasks t
     JOIN contacts c ON c.id = t.contact_id";

fn row_to_task(row: &Row) -> SqliteResult<SphereTask> {
    let task_type: String = row.get(4)?;
    let status: String = row.get(7)?;
    let created_at: String = row.get(10)?;

    Ok(SphereTask {
        id: row.get(0)?,
        contact_id: row.get(1)?,
        contact_name: row.get(2)?,
        contact_phone: row.get(3)?,
        task_type: parse_enum(4, &task_type)?,
        year: row.get(5)?,
        week_number: row.get(6)?,
        status: parse_enum(7, &status)?,
        clickup_task_id: row.get(8)?,
        completed_at: parse_optional_datetime(9, row.get(9)?)?,
        created_at: parse_datetime(10, &created_at)?,
    })
}

impl Database {
    /// Insert planned tasks for a week. Existing (contact, type, week) rows are left alone.
    /// Returns (created, already_present).
    pub fn insert_planned_tasks(&self, week: SphereWeek, planned: &[PlannedTask]) -> SqliteResult<(usize, usize)> {
        let mut conn = self.conn();
        let now = Utc::now().to_rfc3339();
        let tx = conn.transaction()?;
        let mut created = 0;

        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO spheresync_tasks (contact_id, task_type, year, week_number, status, created_at)
                 VALUES (?1, ?2, ?3, ?4, 'pending', ?5)",
            )?;
            for task in planned {
                created += stmt.execute(params![
                    task.contact_id,
                    task.task_type.to_string(),
                    week.year,
                    week.week,
                    &now,
                ])?;
            }
        }

        tx.commit()?;
        Ok((created, planned.len() - created))
    }

    pub fn get_task(&self, id: i64) -> SqliteResult<Option<SphereTask>> {
        let conn = self.conn();
        conn.query_row(&format!("{} WHERE t.id = ?1", TASK_SELECT), [id], row_to_task)
            .optional()
    }

    /// Tasks of one week, calls first, then by contact name
    pub fn list_tasks(&self, week: SphereWeek, status: Option<TaskStatus>) -> SqliteResult<Vec<SphereTask>> {
        let conn = self.conn();
        let status_str = status.map(|s| s.to_string());

        let mut stmt = conn.prepare(&format!(
            "{} WHERE t.year = ?1 AND t.week_number = ?2 AND (?3 IS NULL OR t.status = ?3)
             ORDER BY t.task_type, c.last_name COLLATE NOCASE, c.first_name COLLATE NOCASE, t.id",
            TASK_SELECT
        ))?;

        let tasks = stmt
            .query_map(params![week.year, week.week, status_str], row_to_task)?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(tasks)
    }

    /// Pending tasks of a week that have not been pushed to ClickUp yet
    pub fn list_unpushed_tasks(&self, week: SphereWeek) -> SqliteResult<Vec<SphereTask>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "{} WHERE t.year = ?1 AND t.week_number = ?2 AND t.status = 'pending' AND t.clickup_task_id IS NULL
             ORDER BY t.id",
            TASK_SELECT
        ))?;

        let tasks = stmt
            .query_map(params![week.year, week.week], row_to_task)?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(tasks)
    }

    /// Set a task's status. `completed_at` is stamped for completed tasks and cleared otherwise.
    pub fn set_task_status(&self, id: i64, status: TaskStatus) -> SqliteResult<bool> {
        let conn = self.conn();
        let completed_at = (status == TaskStatus::Completed).then(|| Utc::now().to_rfc3339());

        let rows_affected = conn.execute(
            "UPDATE spheresync_tasks SET status = ?1, completed_at = ?2 WHERE id = ?3",
            params![status.to_string(), completed_at, id],
        )?;
        Ok(rows_affected > 0)
    }

    pub fn set_task_clickup_id(&self, id: i64, clickup_task_id: &str) -> SqliteResult<bool> {
        let conn = self.conn();
        let rows_affected = conn.execute(
            "UPDATE spheresync_tasks SET clickup_task_id = ?1 WHERE id = ?2",
            params![clickup_task_id, id],
        )?;
        Ok(rows_affected > 0)
    }
}
