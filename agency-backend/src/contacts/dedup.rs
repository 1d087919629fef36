//! Duplicate contact detection and cleanup
//!
//! Contacts are grouped on a normalized (first name, last name, email, phone)
//! key. In every group with more than one row the most recently created row
//! is kept and the rest are deleted.

use serde::Serialize;
use std::collections::HashMap;

use crate::db::{ContactFilter, Database};
use crate::error::ServiceResult;
use crate::models::Contact;
use super::normalize::{normalize_email, normalize_name, normalize_phone};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DedupKey {
    first_name: String,
    last_name: String,
    email: String,
    phone: String,
}

impl DedupKey {
    pub fn new(first_name: &str, last_name: &str, email: Option<&str>, phone: Option<&str>) -> Self {
        Self {
            first_name: normalize_name(first_name),
            last_name: normalize_name(last_name),
            email: email.map(normalize_email).unwrap_or_default(),
            phone: phone.map(normalize_phone).unwrap_or_default(),
        }
    }

    pub fn for_contact(contact: &Contact) -> Self {
        Self::new(
            &contact.first_name,
            &contact.last_name,
            contact.email.as_deref(),
            contact.phone.as_deref(),
        )
    }

    /// A key with nothing in it says nothing about identity
    pub fn is_empty(&self) -> bool {
        self.first_name.is_empty() && self.last_name.is_empty() && self.email.is_empty() && self.phone.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateGroup {
    pub name: String,
    pub keep: i64,
    pub remove: Vec<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CleanupSummary {
    pub groups: Vec<DuplicateGroup>,
    pub removed: usize,
    pub dry_run: bool,
}

/// Group contacts by dedup key. Newest `created_at` wins; ties go to the higher id.
pub fn find_duplicate_groups(contacts: &[Contact]) -> Vec<DuplicateGroup> {
    let mut buckets: HashMap<DedupKey, Vec<&Contact>> = HashMap::new();
    for contact in contacts {
        let key = DedupKey::for_contact(contact);
        if key.is_empty() {
            continue;
        }
        buckets.entry(key).or_default().push(contact);
    }

    let mut groups: Vec<DuplicateGroup> = buckets
        .into_values()
        .filter(|members| members.len() > 1)
        .filter_map(|mut members| {
            members.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
            let (keep, rest) = members.split_first()?;
            let mut remove: Vec<i64> = rest.iter().map(|c| c.id).collect();
            remove.sort_unstable();
            Some(DuplicateGroup {
                name: keep.display_name(),
                keep: keep.id,
                remove,
            })
        })
        .collect();

    groups.sort_by_key(|g| g.keep);
    groups
}

/// Find duplicates across all contacts and, unless `dry_run`, delete the losers
pub fn cleanup_duplicates(db: &Database, dry_run: bool) -> ServiceResult<CleanupSummary> {
    let contacts = db.list_contacts(&ContactFilter::default())?;
    let groups = find_duplicate_groups(&contacts);
    let doomed: Vec<i64> = groups.iter().flat_map(|g| g.remove.iter().copied()).collect();

    let removed = if dry_run {
        doomed.len()
    } else {
        db.delete_contacts(&doomed)?
    };

    log::info!(
        "[CONTACTS] Duplicate cleanup{}: {} groups, {} contacts {}",
        if dry_run { " (dry run)" } else { "" },
        groups.len(),
        removed,
        if dry_run { "would be removed" } else { "removed" }
    );

    Ok(CleanupSummary {
        groups,
        removed,
        dry_run,
    })
}
