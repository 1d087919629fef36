//! Bulk do-not-call checks against the registry

use chrono::{Duration, Utc};
use futures_util::stream::{self, StreamExt};
use serde::Serialize;

use crate::config::DncConfig;
use crate::db::Database;
use crate::error::ServiceResult;
use crate::integrations::http_retry::HttpRetryManager;
use crate::integrations::DncRegistry;
use super::normalize::{is_valid_phone, normalize_phone};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DncCheckSummary {
    pub checked: usize,
    pub flagged: usize,
    pub failed: usize,
    /// Lookups not sent because the registry was backing off
    pub deferred: usize,
}

/// Look up every contact due for a check and store the result.
/// Contacts checked within `recheck_after_days` are skipped unless `force`.
/// A failed lookup leaves the contact's previous status untouched. Once the
/// registry is backing off, the remaining contacts wait for the next run.
pub async fn run_dnc_check(
    db: &Database,
    registry: &dyn DncRegistry,
    force: bool,
    cfg: &DncConfig,
) -> ServiceResult<DncCheckSummary> {
    let cutoff = (!force).then(|| Utc::now() - Duration::days(cfg.recheck_after_days));
    let due = db.contacts_due_for_dnc_check(cutoff)?;
    let mut summary = DncCheckSummary::default();

    let lookups: Vec<(i64, String)> = due
        .into_iter()
        .filter_map(|c| {
            let phone = normalize_phone(c.phone.as_deref()?);
            if is_valid_phone(&phone) {
                Some((c.id, phone))
            } else {
                log::debug!("[DNC] Contact {} has an unusable phone number, skipping", c.id);
                None
            }
        })
        .collect();

    log::info!("[DNC] Checking {} contacts", lookups.len());

    let retry = HttpRetryManager::global();
    let key = registry.endpoint_key();
    let mut results = stream::iter(lookups)
        .map(|(id, phone)| async move {
            if retry.is_backing_off(key) {
                return (id, None);
            }
            (id, Some(registry.is_on_dnc(&phone).await))
        })
        .buffer_unordered(cfg.concurrency.max(1));

    while let Some((id, result)) = results.next().await {
        let Some(result) = result else {
            summary.deferred += 1;
            continue;
        };
        match result {
            Ok(on_list) => {
                retry.record_success(key);
                db.set_contact_dnc(id, on_list, Utc::now())?;
                summary.checked += 1;
                if on_list {
                    summary.flagged += 1;
                }
            }
            Err(e) => {
                if e.is_retryable() {
                    retry.record_error(key);
                }
                log::warn!("[DNC] Lookup failed for contact {}: {}", id, e);
                summary.failed += 1;
            }
        }
    }

    if summary.deferred > 0 {
        log::warn!(
            "[DNC] Registry '{}' is backing off ({}s), deferred {} lookups",
            key,
            retry.current_delay(key).unwrap_or_default(),
            summary.deferred
        );
    }
    log::info!(
        "[DNC] Done: {} checked, {} on DNC, {} failed",
        summary.checked,
        summary.flagged,
        summary.failed
    );
    Ok(summary)
}
