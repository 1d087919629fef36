//! Database table modules - extends Database with domain-specific methods
//!
//! Each module adds `impl Database` blocks with methods for a specific table group.

mod api_keys;         // external_api_keys
mod auth;             // auth_sessions
mod contacts;         // contacts
mod dashboard;        // cross-table counts
mod email_logs;       // email_logs
mod social_posts;     // social_posts
mod spheresync_tasks; // spheresync_tasks
mod transactions;     // transactions

pub use contacts::ContactFilter;
pub use dashboard::DashboardCounts;
pub use transactions::TransactionUpsert;
