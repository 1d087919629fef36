//! ClickUp task creation

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{check_status, IntegrationResult, TaskTracker, TrackerTask};

const SERVICE: &str = "clickup";

#[derive(Debug, Serialize)]
struct CreateTaskBody<'a> {
    name: &'a str,
    description: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    due_date: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    due_date_time: Option<bool>,
    tags: &'a [String],
}

#[derive(Debug, Deserialize)]
struct CreateTaskResponse {
    id: String,
}

pub struct ClickUpClient {
    http: Client,
    base_url: String,
    list_id: String,
    token: String,
}

impl ClickUpClient {
    pub fn new(http: Client, base_url: &str, list_id: &str, token: String) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            list_id: list_id.to_string(),
            token,
        }
    }
}

fn request_body(task: &TrackerTask) -> CreateTaskBody<'_> {
    let due_ms = task.due_date.map(|d| d.timestamp_millis());
    CreateTaskBody {
        name: &task.name,
        description: &task.description,
        due_date: due_ms,
        due_date_time: due_ms.map(|_| true),
        tags: &task.tags,
    }
}

#[async_trait]
impl TaskTracker for ClickUpClient {
    async fn create_task(&self, task: &TrackerTask) -> IntegrationResult<String> {
        let resp = self
            .http
            .post(format!("{}/list/{}/task", self.base_url, self.list_id))
            // ClickUp personal tokens go in as-is, no Bearer prefix
            .header("Authorization", &self.token)
            .json(&request_body(task))
            .send()
            .await?;
        let resp = check_status(SERVICE, resp).await?;

        let created: CreateTaskResponse = resp.json().await?;
        Ok(created.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_body_uses_millisecond_due_date() {
        let task = TrackerTask {
            name: "Call Jane Doe".to_string(),
            description: "SphereSync 2026-W10".to_string(),
            due_date: Some(Utc.with_ymd_and_hms(2026, 3, 8, 23, 59, 0).unwrap()),
            tags: vec!["spheresync".to_string()],
        };
        let json = serde_json::to_value(request_body(&task)).unwrap();
        assert_eq!(json["due_date"], 1_773_014_340_000i64);
        assert_eq!(json["due_date_time"], true);
        assert_eq!(json["tags"][0], "spheresync");
    }

    #[test]
    fn test_body_without_due_date() {
        let task = TrackerTask {
            name: "x".to_string(),
            description: String::new(),
            due_date: None,
            tags: vec![],
        };
        let json = serde_json::to_value(request_body(&task)).unwrap();
        assert!(json.get("due_date").is_none());
        assert!(json.get("due_date_time").is_none());
    }
}
