//! Transaction sync from the transaction-management system

use serde::Serialize;

use crate::db::Database;
use crate::error::ServiceResult;
use crate::integrations::TransactionSource;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncSummary {
    pub fetched: usize,
    pub inserted: usize,
    pub updated: usize,
}

/// Page through the source and upsert every record by external id.
/// Stops at the first short page or after `max_pages`.
pub async fn sync_transactions(
    db: &Database,
    source: &dyn TransactionSource,
    max_pages: usize,
) -> ServiceResult<SyncSummary> {
    let limit = source.page_size().max(1);
    let mut summary = SyncSummary::default();

    for page in 0..max_pages.max(1) {
        let records = source.fetch_page(page * limit, limit).await?;
        let count = records.len();
        summary.fetched += count;

        for record in &records {
            if db.upsert_transaction(record)? {
                summary.inserted += 1;
            } else {
                summary.updated += 1;
            }
        }

        log::debug!("[TRANSACTIONS] Page {}: {} records", page, count);
        if count < limit {
            break;
        }
        if page + 1 == max_pages {
            log::warn!("[TRANSACTIONS] Stopped after {} pages; more records may remain", max_pages);
        }
    }

    log::info!(
        "[TRANSACTIONS] Sync: {} fetched, {} new, {} updated",
        summary.fetched,
        summary.inserted,
        summary.updated
    );
    Ok(summary)
}
