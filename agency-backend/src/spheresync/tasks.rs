//! Weekly task planning: turns the rotation letters into call/text tasks

use serde::Serialize;

use crate::db::{ContactFilter, Database};
use crate::error::{ServiceError, ServiceResult};
use crate::models::{Contact, SphereTask, TaskStatus, TaskType};
use super::rotation::{bucket_letter, SphereWeek, WeekLetters};

/// A task the planner wants to exist for a contact
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannedTask {
    pub contact_id: i64,
    pub task_type: TaskType,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerateSummary {
    pub year: i32,
    pub week: u32,
    pub letters: WeekLetters,
    pub created: usize,
    pub skipped_existing: usize,
}

/// Decide which contacts get a task this week.
/// DNC contacts and contacts without a phone number are left out.
pub fn plan_week(contacts: &[Contact], letters: &WeekLetters) -> Vec<PlannedTask> {
    contacts
        .iter()
        .filter(|c| !c.dnc)
        .filter(|c| c.phone.as_deref().is_some_and(|p| !p.is_empty()))
        .filter_map(|c| {
            let letter = bucket_letter(&c.first_name, &c.last_name)?;
            let task_type = if letters.is_call_letter(letter) {
                TaskType::Call
            } else if letters.is_text_letter(letter) {
                TaskType::Text
            } else {
                return None;
            };
            Some(PlannedTask {
                contact_id: c.id,
                task_type,
            })
        })
        .collect()
}

/// Create the week's tasks. Safe to run repeatedly: existing tasks are kept as they are.
pub fn generate_week(db: &Database, week: SphereWeek) -> ServiceResult<GenerateSummary> {
    let letters = week.letters();
    let contacts = db.list_contacts(&ContactFilter::default())?;
    let planned = plan_week(&contacts, &letters);
    let (created, skipped_existing) = db.insert_planned_tasks(week, &planned)?;

    log::info!(
        "[SPHERESYNC] {}-W{:02}: calls {}{}, text {} -> {} new tasks ({} already present)",
        week.year,
        week.week,
        letters.call[0],
        letters.call[1],
        letters.text,
        created,
        skipped_existing
    );

    Ok(GenerateSummary {
        year: week.year,
        week: week.week,
        letters,
        created,
        skipped_existing,
    })
}

/// Move a task to completed or skipped
pub fn set_task_status(db: &Database, task_id: i64, status: TaskStatus) -> ServiceResult<SphereTask> {
    if status == TaskStatus::Pending {
        return Err(ServiceError::Validation("Tasks can only be completed or skipped".to_string()));
    }
    if !db.set_task_status(task_id, status)? {
        return Err(ServiceError::NotFound(format!("Task {}", task_id)));
    }
    db.get_task(task_id)?
        .ok_or_else(|| ServiceError::NotFound(format!("Task {}", task_id)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewContact;
    use chrono::Utc;

    fn contact(id: i64, first: &str, last: &str, phone: Option<&str>, dnc: bool) -> Contact {
        let now = Utc::now();
        Contact {
            id,
            first_name: first.to_string(),
            last_name: last.to_string(),
            email: None,
            phone: phone.map(str::to_string),
            address: None,
            notes: None,
            dnc,
            dnc_checked_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_plan_week_one() {
        // Week 1: call S and X, text A
        let letters = WeekLetters { call: ['S', 'X'], text: 'A' };
        let contacts = vec![
            contact(1, "Sara", "Smith", Some("5550000001"), false),
            contact(2, "Xi", "xu", Some("5550000002"), false),
            contact(3, "Al", "Adams", Some("5550000003"), false),
            contact(4, "Bo", "Brown", Some("5550000004"), false),
            contact(5, "Sid", "Stone", Some("5550000005"), true),
            contact(6, "Sue", "Sharp", None, false),
            contact(7, "Ann", "", Some("5550000007"), false),
        ];

        let planned = plan_week(&contacts, &letters);
        assert_eq!(
            planned,
            vec![
                PlannedTask { contact_id: 1, task_type: TaskType::Call },
                PlannedTask { contact_id: 2, task_type: TaskType::Call },
                PlannedTask { contact_id: 3, task_type: TaskType::Text },
                PlannedTask { contact_id: 7, task_type: TaskType::Text },
            ]
        );
    }

    #[test]
    fn test_generate_week_is_idempotent() {
        let db = Database::in_memory().unwrap();
        for (first, last) in [("Sara", "Smith"), ("Al", "Adams"), ("Bo", "Brown")] {
            db.insert_contact(&NewContact {
                first_name: Some(first.to_string()),
                last_name: Some(last.to_string()),
                phone: Some("5551234567".to_string()),
                ..Default::default()
            })
            .unwrap();
        }

        let week = SphereWeek::new(2026, 1).unwrap();
        let first = generate_week(&db, week).unwrap();
        assert_eq!(first.created, 2);
        assert_eq!(first.skipped_existing, 0);

        let second = generate_week(&db, week).unwrap();
        assert_eq!(second.created, 0);
        assert_eq!(second.skipped_existing, 2);
    }

    #[test]
    fn test_set_task_status() {
        let db = Database::in_memory().unwrap();
        db.insert_contact(&NewContact {
            first_name: Some("Sara".to_string()),
            last_name: Some("Smith".to_string()),
            phone: Some("5551234567".to_string()),
            ..Default::default()
        })
        .unwrap();
        let week = SphereWeek::new(2026, 1).unwrap();
        generate_week(&db, week).unwrap();
        let task_id = db.list_tasks(week, None).unwrap()[0].id;

        let task = set_task_status(&db, task_id, TaskStatus::Completed).unwrap();
        assert_eq!(task.status, TaskStatus::Completed);

        assert!(matches!(
            set_task_status(&db, task_id, TaskStatus::Pending),
            Err(ServiceError::Validation(_))
        ));
        assert!(matches!(
            set_task_status(&db, 999, TaskStatus::Skipped),
            Err(ServiceError::NotFound(_))
        ));
    }
}
