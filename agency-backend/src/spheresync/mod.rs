//! SphereSync: weekly contact outreach rotation

mod clickup;
mod rotation;
mod tasks;

pub use clickup::{push_week_to_clickup, PushSummary};
pub use rotation::{SphereWeek, WeekLetters};
pub use tasks::{generate_week, set_task_status, GenerateSummary, PlannedTask};
