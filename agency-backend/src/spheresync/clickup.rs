//! Push a week's pending SphereSync tasks into the task tracker

use chrono::{DateTime, NaiveTime, Utc};
use serde::Serialize;

use crate::db::Database;
use crate::error::ServiceResult;
use crate::integrations::{TaskTracker, TrackerTask};
use crate::models::{SphereTask, TaskType};
use super::rotation::SphereWeek;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PushSummary {
    pub pushed: usize,
    pub failed: usize,
}

/// Sunday 23:59 UTC of the week
fn week_due_date(week: SphereWeek) -> Option<DateTime<Utc>> {
    let sunday = week.end_date()?;
    let time = NaiveTime::from_hms_opt(23, 59, 0)?;
    Some(sunday.and_time(time).and_utc())
}

fn tracker_task(task: &SphereTask, week: SphereWeek, due_date: Option<DateTime<Utc>>) -> TrackerTask {
    let verb = match task.task_type {
        TaskType::Call => "Call",
        TaskType::Text => "Text",
    };
    let phone = task.contact_phone.as_deref().unwrap_or("no phone on file");

    TrackerTask {
        name: format!("{} {}", verb, task.contact_name),
        description: format!(
            "SphereSync {}-W{:02}: {} {} at {}",
            week.year,
            week.week,
            verb.to_lowercase(),
            task.contact_name,
            phone
        ),
        due_date,
        tags: vec!["spheresync".to_string(), task.task_type.to_string()],
    }
}

/// Create tracker tasks for the week's pending tasks that have none yet.
/// A failed task is counted and the batch carries on.
pub async fn push_week_to_clickup(
    db: &Database,
    tracker: &dyn TaskTracker,
    week: SphereWeek,
) -> ServiceResult<PushSummary> {
    let tasks = db.list_unpushed_tasks(week)?;
    let due_date = week_due_date(week);
    let mut summary = PushSummary::default();

    for task in &tasks {
        match tracker.create_task(&tracker_task(task, week, due_date)).await {
            Ok(clickup_id) => {
                db.set_task_clickup_id(task.id, &clickup_id)?;
                summary.pushed += 1;
            }
            Err(e) => {
                log::warn!("[SPHERESYNC] Failed to push task {} to ClickUp: {}", task.id, e);
                summary.failed += 1;
            }
        }
    }

    log::info!(
        "[SPHERESYNC] {}-W{:02} ClickUp push: {} pushed, {} failed",
        week.year,
        week.week,
        summary.pushed,
        summary.failed
    );
    Ok(summary)
}
