//! Contact import, duplicate cleanup and DNC checks

mod dedup;
mod dnc;
mod import;
pub mod normalize;

pub use dedup::{cleanup_duplicates, CleanupSummary};
pub use dnc::{run_dnc_check, DncCheckSummary};
pub use import::{import_contacts, ImportSummary};
