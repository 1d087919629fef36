use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Networks the scheduler accepts
pub const SUPPORTED_PLATFORMS: &[&str] = &["facebook", "instagram", "linkedin", "twitter", "tiktok", "gmb"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PostStatus {
    Draft,
    Scheduled,
    Published,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SocialPost {
    pub id: i64,
    pub platform: String,
    pub content: String,
    pub media_url: Option<String>,
    pub scheduled_for: DateTime<Utc>,
    pub status: PostStatus,
    pub external_id: Option<String>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewSocialPost {
    pub platform: String,
    pub content: String,
    #[serde(default)]
    pub media_url: Option<String>,
    pub scheduled_for: DateTime<Utc>,
}
