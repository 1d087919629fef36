//! Contact database operations

use chrono::{DateTime, Utc};
use rusqlite::{params, params_from_iter, OptionalExtension, Result as SqliteResult, Row};

use crate::db::{parse_datetime, parse_optional_datetime};
use crate::models::{Contact, NewContact};
use super::super::Database;

const CONTACT_COLUMNS: &str =
    "id, first_name, last_name, email, phone, address, notes, dnc, dnc_checked_at, created_at, updated_at";

/// Listing filter for the contacts endpoint
#[derive(Debug, Clone, Default)]
pub struct ContactFilter {
    /// Substring match on name, email or phone
    pub search: Option<String>,
    pub dnc: Option<bool>,
}

fn row_to_contact(row: &Row) -> SqliteResult<Contact> {
    let dnc: i64 = row.get(7)?;
    let created_at: String = row.get(9)?;
    let updated_at: String = row.get(10)?;

    Ok(Contact {
        id: row.get(0)?,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        email: row.get(3)?,
        phone: row.get(4)?,
        address: row.get(5)?,
        notes: row.get(6)?,
        dnc: dnc != 0,
        dnc_checked_at: parse_optional_datetime(8, row.get(8)?)?,
        created_at: parse_datetime(9, &created_at)?,
        updated_at: parse_datetime(10, &updated_at)?,
    })
}

/// Make `%`, `_` and `\` match literally in a `LIKE ... ESCAPE '\'` pattern
fn escape_like(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

impl Database {
    /// Insert one contact stamped with the current time
    pub fn insert_contact(&self, contact: &NewContact) -> SqliteResult<Contact> {
        self.insert_contact_at(contact, Utc::now())
    }

    /// Insert one contact with an explicit creation time
    pub fn insert_contact_at(&self, contact: &NewContact, created_at: DateTime<Utc>) -> SqliteResult<Contact> {
        let conn = self.conn();
        let ts = created_at.to_rfc3339();

        conn.execute(
            "INSERT INTO contacts (first_name, last_name, email, phone, address, notes, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
            params![
                contact.first_name.as_deref().unwrap_or(""),
                contact.last_name.as_deref().unwrap_or(""),
                contact.email,
                contact.phone,
                contact.address,
                contact.notes,
                &ts,
            ],
        )?;

        let id = conn.last_insert_rowid();
        conn.query_row(
            &format!("SELECT {} FROM contacts WHERE id = ?1", CONTACT_COLUMNS),
            [id],
            row_to_contact,
        )
    }

    /// Insert a batch of already-validated contacts in one transaction
    pub fn insert_contacts(&self, contacts: &[NewContact]) -> SqliteResult<usize> {
        let mut conn = self.conn();
        let now = Utc::now().to_rfc3339();
        let tx = conn.transaction()?;

        {
            let mut stmt = tx.prepare(
                "INSERT INTO contacts (first_name, last_name, email, phone, address, notes, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
            )?;
            for contact in contacts {
                stmt.execute(params![
                    contact.first_name.as_deref().unwrap_or(""),
                    contact.last_name.as_deref().unwrap_or(""),
                    contact.email,
                    contact.phone,
                    contact.address,
                    contact.notes,
                    &now,
                ])?;
            }
        }

        tx.commit()?;
        Ok(contacts.len())
    }

    pub fn get_contact(&self, id: i64) -> SqliteResult<Option<Contact>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {} FROM contacts WHERE id = ?1", CONTACT_COLUMNS),
            [id],
            row_to_contact,
        )
        .optional()
    }

    /// List contacts ordered by last name, first name
    pub fn list_contacts(&self, filter: &ContactFilter) -> SqliteResult<Vec<Contact>> {
        let conn = self.conn();

        let mut sql = format!("SELECT {} FROM contacts WHERE 1 = 1", CONTACT_COLUMNS);
        let mut args: Vec<String> = Vec::new();

        if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            let pattern = format!("%{}%", escape_like(&search.to_lowercase()));
            sql.push_str(
                " AND (LOWER(first_name || ' ' || last_name) LIKE ?1 ESCAPE '\\' \
                 OR LOWER(COALESCE(email, '')) LIKE ?1 ESCAPE '\\' \
                 OR COALESCE(phone, '') LIKE ?1 ESCAPE '\\')",
            );
            args.push(pattern);
        }
        if let Some(dnc) = filter.dnc {
            sql.push_str(if dnc { " AND dnc = 1" } else { " AND dnc = 0" });
        }
        sql.push_str(" ORDER BY last_name COLLATE NOCASE, first_name COLLATE NOCASE, id");

        let mut stmt = conn.prepare(&sql)?;
        let contacts = stmt
            .query_map(params_from_iter(args.iter()), row_to_contact)?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(contacts)
    }

    /// Delete contacts by id in one transaction. Their SphereSync tasks cascade.
    pub fn delete_contacts(&self, ids: &[i64]) -> SqliteResult<usize> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        let mut deleted = 0;

        {
            let mut stmt = tx.prepare("DELETE FROM contacts WHERE id = ?1")?;
            for id in ids {
                deleted += stmt.execute([id])?;
            }
        }

        tx.commit()?;
        Ok(deleted)
    }

    /// Contacts with a phone number whose DNC status is unknown or older than `checked_before`.
    /// `None` returns every contact with a phone.
    pub fn contacts_due_for_dnc_check(
        &self,
        checked_before: Option<DateTime<Utc>>,
    ) -> SqliteResult<Vec<Contact>> {
        let conn = self.conn();
        let base = format!(
            "SELECT {} FROM contacts WHERE phone IS NOT NULL AND phone != ''",
            CONTACT_COLUMNS
        );

        let contacts = match checked_before {
            Some(cutoff) => {
                let mut stmt = conn.prepare(&format!(
                    "{} AND (dnc_checked_at IS NULL OR dnc_checked_at < ?1) ORDER BY id",
                    base
                ))?;
                stmt.query_map([cutoff.to_rfc3339()], row_to_contact)?
                    .collect::<SqliteResult<Vec<_>>>()?
            }
            None => {
                let mut stmt = conn.prepare(&format!("{} ORDER BY id", base))?;
                stmt.query_map([], row_to_contact)?
                    .collect::<SqliteResult<Vec<_>>>()?
            }
        };

        Ok(contacts)
    }

    /// Record a DNC lookup result
    pub fn set_contact_dnc(&self, id: i64, dnc: bool, checked_at: DateTime<Utc>) -> SqliteResult<bool> {
        let conn = self.conn();
        let ts = checked_at.to_rfc3339();
        let rows_affected = conn.execute(
            "UPDATE contacts SET dnc = ?1, dnc_checked_at = ?2, updated_at = ?2 WHERE id = ?3",
            params![dnc as i64, &ts, id],
        )?;
        Ok(rows_affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn new_contact(first: &str, last: &str, phone: Option<&str>) -> NewContact {
        NewContact {
            first_name: Some(first.to_string()),
            last_name: Some(last.to_string()),
            phone: phone.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn test_insert_and_list_ordering() {
        let db = Database::in_memory().unwrap();
        db.insert_contacts(&[
            new_contact("Zoe", "smith", None),
            new_contact("Adam", "Baker", None),
            new_contact("Amy", "Smith", None),
        ])
        .unwrap();

        let names: Vec<String> = db
            .list_contacts(&ContactFilter::default())
            .unwrap()
            .iter()
            .map(|c| c.display_name())
            .collect();
        assert_eq!(names, vec!["Adam Baker", "Amy Smith", "Zoe smith"]);
    }

    #[test]
    fn test_search_and_dnc_filter() {
        let db = Database::in_memory().unwrap();
        let jane = db.insert_contact(&new_contact("Jane", "Doe", Some("5551234567"))).unwrap();
        db.insert_contact(&new_contact("John", "Roe", Some("5559999999"))).unwrap();
        db.set_contact_dnc(jane.id, true, Utc::now()).unwrap();

        let by_name = db
            .list_contacts(&ContactFilter { search: Some("jane d".to_string()), dnc: None })
            .unwrap();
        assert_eq!(by_name.len(), 1);

        let by_phone = db
            .list_contacts(&ContactFilter { search: Some("9999".to_string()), dnc: None })
            .unwrap();
        assert_eq!(by_phone[0].first_name, "John");

        let flagged = db
            .list_contacts(&ContactFilter { search: None, dnc: Some(true) })
            .unwrap();
        assert_eq!(flagged.len(), 1);
        assert!(flagged[0].dnc);
        assert!(flagged[0].dnc_checked_at.is_some());
    }

    #[test]
    fn test_search_wildcards_match_literally() {
        let db = Database::in_memory().unwrap();
        db.insert_contact(&NewContact {
            first_name: Some("Kim".to_string()),
            email: Some("kim_lee@example.com".to_string()),
            ..Default::default()
        })
        .unwrap();
        db.insert_contact(&NewContact {
            first_name: Some("Kai".to_string()),
            email: Some("kimxlee@example.com".to_string()),
            ..Default::default()
        })
        .unwrap();

        let search = |text: &str| {
            db.list_contacts(&ContactFilter { search: Some(text.to_string()), dnc: None })
                .unwrap()
                .len()
        };
        assert_eq!(search("kim_lee"), 1);
        assert_eq!(search("%"), 0);
        assert_eq!(escape_like("50%_a\\b"), "50\\%\\_a\\\\b");
    }

    #[test]
    fn test_due_for_dnc_check_respects_cutoff() {
        let db = Database::in_memory().unwrap();
        let fresh = db.insert_contact(&new_contact("A", "Fresh", Some("5550000001"))).unwrap();
        let stale = db.insert_contact(&new_contact("B", "Stale", Some("5550000002"))).unwrap();
        db.insert_contact(&new_contact("C", "Unchecked", Some("5550000003"))).unwrap();
        db.insert_contact(&new_contact("D", "NoPhone", None)).unwrap();

        let now = Utc::now();
        db.set_contact_dnc(fresh.id, false, now).unwrap();
        db.set_contact_dnc(stale.id, false, now - Duration::days(45)).unwrap();

        let due = db.contacts_due_for_dnc_check(Some(now - Duration::days(30))).unwrap();
        let names: Vec<&str> = due.iter().map(|c| c.last_name.as_str()).collect();
        assert_eq!(names, vec!["Stale", "Unchecked"]);

        assert_eq!(db.contacts_due_for_dnc_check(None).unwrap().len(), 3);
    }

    #[test]
    fn test_delete_contacts() {
        let db = Database::in_memory().unwrap();
        let a = db.insert_contact(&new_contact("A", "One", None)).unwrap();
        let b = db.insert_contact(&new_contact("B", "Two", None)).unwrap();

        assert_eq!(db.delete_contacts(&[a.id, 999]).unwrap(), 1);
        assert!(db.get_contact(a.id).unwrap().is_none());
        assert!(db.get_contact(b.id).unwrap().is_some());
    }
}
