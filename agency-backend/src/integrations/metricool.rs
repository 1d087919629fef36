//! Social post scheduling through Metricool

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;

use super::{check_status, IntegrationError, IntegrationResult, SocialScheduler};
use crate::models::SocialPost;

const SERVICE: &str = "metricool";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PublicationDate {
    date_time: String,
    timezone: &'static str,
}

#[derive(Debug, Serialize)]
struct Provider<'a> {
    network: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SchedulePostBody<'a> {
    text: &'a str,
    publication_date: PublicationDate,
    providers: Vec<Provider<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    media: Vec<&'a str>,
}

pub struct MetricoolClient {
    http: Client,
    base_url: String,
    blog_id: String,
    user_id: String,
    token: String,
}

impl MetricoolClient {
    pub fn new(http: Client, base_url: &str, blog_id: &str, user_id: &str, token: String) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            blog_id: blog_id.to_string(),
            user_id: user_id.to_string(),
            token,
        }
    }
}

fn request_body(post: &SocialPost) -> SchedulePostBody<'_> {
    SchedulePostBody {
        text: &post.content,
        publication_date: PublicationDate {
            // Local wall-clock form, zone given separately
            date_time: post.scheduled_for.format("%Y-%m-%dT%H:%M:%S").to_string(),
            timezone: "UTC",
        },
        providers: vec![Provider {
            network: &post.platform,
        }],
        media: post.media_url.as_deref().into_iter().collect(),
    }
}

/// The id sits under `data.id` and may be a number or a string
fn extract_post_id(body: &Value) -> Option<String> {
    let id = body.get("data").and_then(|d| d.get("id")).or_else(|| body.get("id"))?;
    match id {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[async_trait]
impl SocialScheduler for MetricoolClient {
    async fn schedule(&self, post: &SocialPost) -> IntegrationResult<String> {
        let resp = self
            .http
            .post(format!("{}/scheduler/posts", self.base_url))
            .query(&[("blogId", self.blog_id.as_str()), ("userId", self.user_id.as_str())])
            .header("X-Mc-Auth", &self.token)
            .json(&request_body(post))
            .send()
            .await?;
        let resp = check_status(SERVICE, resp).await?;

        let body: Value = resp.json().await?;
        extract_post_id(&body).ok_or_else(|| IntegrationError::Decode {
            service: SERVICE,
            message: "response has no post id".to_string(),
        })
    }
}
