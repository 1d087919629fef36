//! Do-not-call registry lookup

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::{check_status, DncRegistry, IntegrationError, IntegrationResult};

const SERVICE: &str = "dnc";

#[derive(Debug, Deserialize)]
struct DncCheckResponse {
    #[serde(alias = "isDnc", alias = "dnc", alias = "on_dnc")]
    is_dnc: Option<bool>,
}

pub struct DncApiClient {
    http: Client,
    base_url: String,
    api_key: String,
}

impl DncApiClient {
    pub fn new(http: Client, base_url: &str, api_key: String) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }
}

#[async_trait]
impl DncRegistry for DncApiClient {
    async fn is_on_dnc(&self, phone: &str) -> IntegrationResult<bool> {
        let resp = self
            .http
            .get(format!("{}/check", self.base_url))
            .query(&[("phone", phone)])
            .header("X-Api-Key", &self.api_key)
            .send()
            .await?;
        let resp = check_status(SERVICE, resp).await?;

        let body: DncCheckResponse = resp.json().await?;
        body.is_dnc.ok_or_else(|| IntegrationError::Decode {
            service: SERVICE,
            message: "missing is_dnc field".to_string(),
        })
    }
}
