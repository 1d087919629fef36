//! Outbound email with a logged retry budget

use serde::Serialize;

use crate::contacts::normalize::{is_valid_email, normalize_email};
use crate::db::Database;
use crate::error::{ServiceError, ServiceResult};
use crate::integrations::http_retry::HttpRetryManager;
use crate::integrations::{EmailSender, IntegrationError, OutgoingEmail};
use crate::models::EmailLog;

const MAX_SUBJECT_CHARS: usize = 998;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RetrySummary {
    pub retried: usize,
    pub sent: usize,
    pub failed: usize,
    /// True when the run stopped early because the provider is backing off
    pub deferred: bool,
}

/// Send once and record the outcome on the log row
async fn attempt(
    db: &Database,
    sender: &dyn EmailSender,
    log_row: &EmailLog,
) -> ServiceResult<Result<String, IntegrationError>> {
    let email = OutgoingEmail {
        to: log_row.to_address.clone(),
        subject: log_row.subject.clone(),
        html: log_row.html_body.clone(),
    };
    let retry = HttpRetryManager::global();

    let result = sender.send(&email).await;
    match &result {
        Ok(provider_id) => {
            retry.record_success(sender.endpoint_key());
            db.mark_email_sent(log_row.id, provider_id)?;
            log::info!("[EMAIL] Sent email {} to {}", log_row.id, log_row.to_address);
        }
        Err(e) => {
            let retryable = e.is_retryable();
            if retryable {
                retry.record_error(sender.endpoint_key());
            }
            db.mark_email_failed(log_row.id, &e.to_string(), !retryable)?;
            log::warn!(
                "[EMAIL] Email {} failed ({}): {}",
                log_row.id,
                if retryable { "will retry" } else { "giving up" },
                e
            );
        }
    }
    Ok(result)
}

/// Validate, log as pending, send. The returned row reflects the outcome;
/// a provider failure is recorded on the row rather than returned as an error.
pub async fn send_email(
    db: &Database,
    sender: &dyn EmailSender,
    to: &str,
    subject: &str,
    html: &str,
) -> ServiceResult<EmailLog> {
    let to = normalize_email(to);
    if !is_valid_email(&to) {
        return Err(ServiceError::Validation(format!("Invalid recipient address: {}", to)));
    }
    let subject = subject.trim();
    if subject.is_empty() {
        return Err(ServiceError::Validation("Subject cannot be empty".to_string()));
    }
    if subject.chars().count() > MAX_SUBJECT_CHARS {
        return Err(ServiceError::Validation("Subject is too long".to_string()));
    }

    let log_row = db.insert_email(&to, subject, html)?;
    let _outcome = attempt(db, sender, &log_row).await?;

    db.get_email(log_row.id)?
        .ok_or_else(|| ServiceError::NotFound(format!("Email {}", log_row.id)))
}

/// Re-send failed emails that still have attempts left
pub async fn retry_failed(db: &Database, sender: &dyn EmailSender) -> ServiceResult<RetrySummary> {
    let pending = db.list_retryable_emails()?;
    let retry = HttpRetryManager::global();
    let mut summary = RetrySummary::default();

    for log_row in pending {
        if retry.is_backing_off(sender.endpoint_key()) {
            log::info!(
                "[EMAIL] Provider '{}' is backing off ({}s), deferring remaining retries",
                sender.endpoint_key(),
                retry.current_delay(sender.endpoint_key()).unwrap_or_default()
            );
            summary.deferred = true;
            break;
        }

        summary.retried += 1;
        match attempt(db, sender, &log_row).await? {
            Ok(_) => summary.sent += 1,
            Err(_) => summary.failed += 1,
        }
    }

    if summary.retried > 0 {
        log::info!(
            "[EMAIL] Retry run: {} retried, {} sent, {} failed",
            summary.retried,
            summary.sent,
            summary.failed
        );
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integrations::IntegrationResult;
    use crate::models::{EmailStatus, MAX_EMAIL_ATTEMPTS};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Replays scripted outcomes; status 0 means success
    struct ScriptedSender {
        key: String,
        outcomes: Mutex<Vec<u16>>,
    }

    impl ScriptedSender {
        fn new(key: &str, outcomes: &[u16]) -> Self {
            Self {
                key: key.to_string(),
                outcomes: Mutex::new(outcomes.iter().rev().copied().collect()),
            }
        }
    }

    #[async_trait]
    impl EmailSender for ScriptedSender {
        fn endpoint_key(&self) -> &str {
            &self.key
        }

        async fn send(&self, email: &OutgoingEmail) -> IntegrationResult<String> {
            let next = self.outcomes.lock().unwrap().pop().unwrap_or(0);
            if next == 0 {
                Ok(format!("msg-{}", email.to))
            } else {
                Err(IntegrationError::Status {
                    service: "resend",
                    status: next,
                    body: "nope".to_string(),
                })
            }
        }
    }

    #[tokio::test]
    async fn test_send_success() {
        let db = Database::in_memory().unwrap();
        let sender = ScriptedSender::new("test-send-ok", &[0]);

        let sent = send_email(&db, &sender, " Client@Example.com ", "Hello", "<p>hi</p>")
            .await
            .unwrap();
        assert_eq!(sent.status, EmailStatus::Sent);
        assert_eq!(sent.to_address, "client@example.com");
        assert_eq!(sent.provider_id.as_deref(), Some("msg-client@example.com"));
        assert_eq!(sent.attempts, 1);
        assert!(sent.sent_at.is_some());
    }

    #[tokio::test]
    async fn test_send_validation() {
        let db = Database::in_memory().unwrap();
        let sender = ScriptedSender::new("test-send-invalid", &[]);

        assert!(matches!(
            send_email(&db, &sender, "nobody", "Hi", "").await,
            Err(ServiceError::Validation(_))
        ));
        assert!(matches!(
            send_email(&db, &sender, "a@b.co", "   ", "").await,
            Err(ServiceError::Validation(_))
        ));
        assert!(db.list_emails(None, 10).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_permanent_failure_is_not_retried() {
        let db = Database::in_memory().unwrap();
        let sender = ScriptedSender::new("test-permanent", &[422]);

        let failed = send_email(&db, &sender, "a@b.co", "Hi", "").await.unwrap();
        assert_eq!(failed.status, EmailStatus::Failed);
        assert_eq!(failed.attempts, MAX_EMAIL_ATTEMPTS);
        assert!(failed.last_error.unwrap().contains("422"));
        assert!(db.list_retryable_emails().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_retry_sends_transient_failures() {
        let db = Database::in_memory().unwrap();
        let failing = ScriptedSender::new("test-retry-first", &[503]);
        let failed = send_email(&db, &failing, "a@b.co", "Hi", "").await.unwrap();
        assert_eq!(failed.status, EmailStatus::Failed);
        assert_eq!(failed.attempts, 1);

        // Separate key so the first sender's backoff doesn't defer the retry
        let healthy = ScriptedSender::new("test-retry-second", &[0]);
        let summary = retry_failed(&db, &healthy).await.unwrap();
        assert_eq!(
            summary,
            RetrySummary { retried: 1, sent: 1, failed: 0, deferred: false }
        );
        let row = db.get_email(failed.id).unwrap().unwrap();
        assert_eq!(row.status, EmailStatus::Sent);
        assert_eq!(row.attempts, 2);
    }

    #[tokio::test]
    async fn test_retry_defers_while_backing_off() {
        let db = Database::in_memory().unwrap();
        let sender = ScriptedSender::new("test-backoff", &[503, 0]);
        send_email(&db, &sender, "a@b.co", "Hi", "").await.unwrap();

        let summary = retry_failed(&db, &sender).await.unwrap();
        assert!(summary.deferred);
        assert_eq!(summary.retried, 0);
        assert_eq!(db.list_retryable_emails().unwrap().len(), 1);
    }
}
