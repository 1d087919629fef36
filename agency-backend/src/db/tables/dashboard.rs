//! Cross-table counts for the dashboard

use rusqlite::{params, Result as SqliteResult};
use serde::Serialize;

use crate::spheresync::SphereWeek;
use super::super::Database;

#[derive(Debug, Clone, Default, Serialize)]
pub struct DashboardCounts {
    pub contacts_total: i64,
    pub contacts_dnc: i64,
    pub tasks_pending: i64,
    pub tasks_completed: i64,
    pub tasks_skipped: i64,
    pub gci_ytd: f64,
    pub closed_ytd: i64,
    pub active_transactions: i64,
    pub scheduled_posts: i64,
    pub failed_emails: i64,
}

impl Database {
    /// Task counts for the given SphereSync week. GCI and closings cover the
    /// calendar year `year`, which differs from `week.year` around New Year.
    pub fn dashboard_counts(&self, week: SphereWeek, year: i32) -> SqliteResult<DashboardCounts> {
        let conn = self.conn();

        let (contacts_total, contacts_dnc): (i64, i64) = conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(dnc), 0) FROM contacts",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        let (tasks_pending, tasks_completed, tasks_skipped): (i64, i64, i64) = conn.query_row(
            "SELECT
                COALESCE(SUM(status = 'pending'), 0),
                COALESCE(SUM(status = 'completed'), 0),
                COALESCE(SUM(status = 'skipped'), 0)
             FROM spheresync_tasks WHERE year = ?1 AND week_number = ?2",
            params![week.year, week.week],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )?;

        let year = year.to_string();
        let (gci_ytd, closed_ytd): (f64, i64) = conn.query_row(
            "SELECT COALESCE(SUM(sale_price * commission_rate / 100.0), 0.0), COUNT(*)
             FROM transactions WHERE status = 'closed' AND substr(close_date, 1, 4) = ?1",
            [&year],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        let active_transactions: i64 = conn.query_row(
            "SELECT COUNT(*) FROM transactions WHERE status IN ('active', 'pending')",
            [],
            |row| row.get(0),
        )?;

        let scheduled_posts: i64 = conn.query_row(
            "SELECT COUNT(*) FROM social_posts WHERE status = 'scheduled'",
            [],
            |row| row.get(0),
        )?;

        let failed_emails: i64 = conn.query_row(
            "SELECT COUNT(*) FROM email_logs WHERE status = 'failed'",
            [],
            |row| row.get(0),
        )?;

        Ok(DashboardCounts {
            contacts_total,
            contacts_dnc,
            tasks_pending,
            tasks_completed,
            tasks_skipped,
            gci_ytd,
            closed_ytd,
            active_transactions,
            scheduled_posts,
            failed_emails,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::TransactionUpsert;
    use crate::models::{NewContact, TransactionStatus};
    use chrono::{Datelike, NaiveDate, Utc};

    #[test]
    fn test_empty_database() {
        let db = Database::in_memory().unwrap();
        let counts = db.dashboard_counts(SphereWeek { year: 2026, week: 10 }, 2026).unwrap();
        assert_eq!(counts.contacts_total, 0);
        assert_eq!(counts.gci_ytd, 0.0);
    }

    #[test]
    fn test_gci_only_counts_closed_deals_in_year() {
        let db = Database::in_memory().unwrap();
        let deal = |id: &str, status, date: &str| TransactionUpsert {
            external_id: id.to_string(),
            address: "1 Oak Ave".to_string(),
            client_name: None,
            status,
            sale_price: Some(400_000.0),
            commission_rate: Some(3.0),
            close_date: NaiveDate::parse_from_str(date, "%Y-%m-%d").ok(),
        };
        db.upsert_transaction(&deal("1", TransactionStatus::Closed, "2026-02-01")).unwrap();
        db.upsert_transaction(&deal("2", TransactionStatus::Closed, "2025-12-30")).unwrap();
        db.upsert_transaction(&deal("3", TransactionStatus::Pending, "2026-07-01")).unwrap();

        let contact = db
            .insert_contact(&NewContact {
                first_name: Some("Dee".to_string()),
                ..Default::default()
            })
            .unwrap();
        db.set_contact_dnc(contact.id, true, Utc::now()).unwrap();

        let counts = db.dashboard_counts(SphereWeek { year: 2026, week: 10 }, 2026).unwrap();
        assert_eq!(counts.closed_ytd, 1);
        assert_eq!(counts.gci_ytd, 12_000.0);
        assert_eq!(counts.active_transactions, 1);
        assert_eq!(counts.contacts_total, 1);
        assert_eq!(counts.contacts_dnc, 1);
    }

    #[test]
    fn test_ytd_uses_calendar_year_at_new_year() {
        let db = Database::in_memory().unwrap();
        db.upsert_transaction(&TransactionUpsert {
            external_id: "june".to_string(),
            address: "9 Elm St".to_string(),
            client_name: None,
            status: TransactionStatus::Closed,
            sale_price: Some(400_000.0),
            commission_rate: Some(3.0),
            close_date: NaiveDate::from_ymd_opt(2025, 6, 1),
        })
        .unwrap();

        // 2025-12-30 falls in ISO week 1 of 2026
        let date = NaiveDate::from_ymd_opt(2025, 12, 30).unwrap();
        let week = SphereWeek::of(date);
        assert_eq!(week, SphereWeek { year: 2026, week: 1 });

        let counts = db.dashboard_counts(week, date.year()).unwrap();
        assert_eq!(counts.gci_ytd, 12_000.0);
        assert_eq!(counts.closed_ytd, 1);
    }
}
