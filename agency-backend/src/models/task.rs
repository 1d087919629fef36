use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TaskType {
    Call,
    Text,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Completed,
    Skipped,
}

/// A SphereSync outreach task for one contact in one ISO week
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SphereTask {
    pub id: i64,
    pub contact_id: i64,
    pub contact_name: String,
    pub contact_phone: Option<String>,
    pub task_type: TaskType,
    pub year: i32,
    pub week_number: u32,
    pub status: TaskStatus,
    pub clickup_task_id: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}
