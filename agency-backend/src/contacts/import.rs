//! Bulk contact import with validation and duplicate skipping

use serde::Serialize;
use std::collections::HashSet;

use crate::db::{ContactFilter, Database};
use crate::error::ServiceResult;
use crate::models::NewContact;
use super::dedup::DedupKey;
use super::normalize::{is_valid_email, is_valid_phone, normalize_email, normalize_phone};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportRejection {
    /// Zero-based index into the submitted rows
    pub row: usize,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportSummary {
    pub imported: usize,
    pub duplicates: usize,
    pub rejected: Vec<ImportRejection>,
}

fn clean(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}

/// Trim and normalize one submitted row, or say why it can't be imported
pub fn validate_row(row: &NewContact) -> Result<NewContact, String> {
    let first_name = clean(row.first_name.as_deref());
    let last_name = clean(row.last_name.as_deref());
    if first_name.is_none() && last_name.is_none() {
        return Err("A first or last name is required".to_string());
    }

    let email = match clean(row.email.as_deref()) {
        Some(raw) => {
            let email = normalize_email(&raw);
            if !is_valid_email(&email) {
                return Err(format!("Invalid email address: {}", raw));
            }
            Some(email)
        }
        None => None,
    };

    let phone = match clean(row.phone.as_deref()) {
        Some(raw) => {
            let phone = normalize_phone(&raw);
            if !is_valid_phone(&phone) {
                return Err(format!("Invalid phone number: {}", raw));
            }
            Some(phone)
        }
        None => None,
    };

    Ok(NewContact {
        first_name,
        last_name,
        email,
        phone,
        address: clean(row.address.as_deref()),
        notes: clean(row.notes.as_deref()),
    })
}

fn key_of(contact: &NewContact) -> DedupKey {
    DedupKey::new(
        contact.first_name.as_deref().unwrap_or(""),
        contact.last_name.as_deref().unwrap_or(""),
        contact.email.as_deref(),
        contact.phone.as_deref(),
    )
}

/// Validate, drop duplicates (against the database and earlier rows), insert the rest
pub fn import_contacts(db: &Database, rows: &[NewContact]) -> ServiceResult<ImportSummary> {
    let mut seen: HashSet<DedupKey> = db
        .list_contacts(&ContactFilter::default())?
        .iter()
        .map(DedupKey::for_contact)
        .collect();

    let mut accepted = Vec::new();
    let mut rejected = Vec::new();
    let mut duplicates = 0;

    for (idx, row) in rows.iter().enumerate() {
        match validate_row(row) {
            Ok(contact) => {
                if seen.insert(key_of(&contact)) {
                    accepted.push(contact);
                } else {
                    duplicates += 1;
                }
            }
            Err(reason) => rejected.push(ImportRejection { row: idx, reason }),
        }
    }

    let imported = db.insert_contacts(&accepted)?;
    log::info!(
        "[CONTACTS] Import: {} imported, {} duplicates, {} rejected",
        imported,
        duplicates,
        rejected.len()
    );

    Ok(ImportSummary {
        imported,
        duplicates,
        rejected,
    })
}
