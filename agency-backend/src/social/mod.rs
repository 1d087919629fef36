//! Social post scheduling

use chrono::Utc;

use crate::db::Database;
use crate::error::{ServiceError, ServiceResult};
use crate::integrations::SocialScheduler;
use crate::models::{NewSocialPost, PostStatus, SocialPost, SUPPORTED_PLATFORMS};

/// Longest caption any supported network accepts
pub const MAX_POST_CHARS: usize = 2200;

fn validate(post: &NewSocialPost) -> ServiceResult<NewSocialPost> {
    let platform = post.platform.trim().to_lowercase();
    if !SUPPORTED_PLATFORMS.contains(&platform.as_str()) {
        return Err(ServiceError::Validation(format!(
            "Unsupported platform '{}'. Valid options: {}",
            post.platform,
            SUPPORTED_PLATFORMS.join(", ")
        )));
    }

    let content = post.content.trim();
    if content.is_empty() {
        return Err(ServiceError::Validation("Post content cannot be empty".to_string()));
    }
    if content.chars().count() > MAX_POST_CHARS {
        return Err(ServiceError::Validation(format!(
            "Post content exceeds {} characters",
            MAX_POST_CHARS
        )));
    }

    if post.scheduled_for <= Utc::now() {
        return Err(ServiceError::Validation("scheduled_for must be in the future".to_string()));
    }

    Ok(NewSocialPost {
        platform,
        content: content.to_string(),
        media_url: post.media_url.as_deref().map(str::trim).filter(|u| !u.is_empty()).map(str::to_string),
        scheduled_for: post.scheduled_for,
    })
}

/// Store the post as a draft, hand it to the scheduler, record the outcome.
/// A scheduler failure leaves the post `failed` with the error text.
pub async fn schedule_post(
    db: &Database,
    scheduler: &dyn SocialScheduler,
    post: &NewSocialPost,
) -> ServiceResult<SocialPost> {
    let post = validate(post)?;
    let draft = db.insert_social_post(&post)?;

    match scheduler.schedule(&draft).await {
        Ok(external_id) => {
            db.update_social_post_status(draft.id, PostStatus::Scheduled, Some(&external_id), None)?;
            log::info!(
                "[SOCIAL] Post {} scheduled on {} for {}",
                draft.id,
                draft.platform,
                draft.scheduled_for
            );
        }
        Err(e) => {
            db.update_social_post_status(draft.id, PostStatus::Failed, None, Some(&e.to_string()))?;
            log::warn!("[SOCIAL] Post {} could not be scheduled: {}", draft.id, e);
        }
    }

    db.get_social_post(draft.id)?
        .ok_or_else(|| ServiceError::NotFound(format!("Social post {}", draft.id)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integrations::{IntegrationError, IntegrationResult};
    use async_trait::async_trait;
    use chrono::Duration;

    struct FakeScheduler {
        fail: bool,
    }

    #[async_trait]
    impl SocialScheduler for FakeScheduler {
        async fn schedule(&self, post: &SocialPost) -> IntegrationResult<String> {
            if self.fail {
                Err(IntegrationError::Status {
                    service: "metricool",
                    status: 401,
                    body: "invalid token".to_string(),
                })
            } else {
                Ok(format!("mc-{}", post.id))
            }
        }
    }

    fn new_post(platform: &str, content: &str, in_hours: i64) -> NewSocialPost {
        NewSocialPost {
            platform: platform.to_string(),
            content: content.to_string(),
            media_url: Some(" ".to_string()),
            scheduled_for: Utc::now() + Duration::hours(in_hours),
        }
    }

    #[tokio::test]
    async fn test_schedule_success() {
        let db = Database::in_memory().unwrap();
        let post = schedule_post(&db, &FakeScheduler { fail: false }, &new_post("Instagram", " Just listed! ", 24))
            .await
            .unwrap();

        assert_eq!(post.status, PostStatus::Scheduled);
        assert_eq!(post.platform, "instagram");
        assert_eq!(post.content, "Just listed!");
        assert_eq!(post.media_url, None);
        assert_eq!(post.external_id, Some(format!("mc-{}", post.id)));
    }

    #[tokio::test]
    async fn test_scheduler_failure_recorded() {
        let db = Database::in_memory().unwrap();
        let post = schedule_post(&db, &FakeScheduler { fail: true }, &new_post("gmb", "Open house", 2))
            .await
            .unwrap();

        assert_eq!(post.status, PostStatus::Failed);
        assert!(post.error.unwrap().contains("401"));
        assert_eq!(post.external_id, None);
    }

    #[tokio::test]
    async fn test_validation() {
        let db = Database::in_memory().unwrap();
        let scheduler = FakeScheduler { fail: false };

        for bad in [
            new_post("myspace", "hi", 2),
            new_post("facebook", "   ", 2),
            new_post("facebook", &"x".repeat(MAX_POST_CHARS + 1), 2),
            new_post("facebook", "hi", -1),
        ] {
            assert!(matches!(
                schedule_post(&db, &scheduler, &bad).await,
                Err(ServiceError::Validation(_))
            ));
        }
        assert!(db.list_social_posts(None).unwrap().is_empty());
    }
}
