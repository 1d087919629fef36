use chrono::{DateTime, Utc};
use serde::Serialize;

/// Integration credential stored in `external_api_keys`
#[derive(Debug, Clone)]
pub struct ApiKey {
    pub id: i64,
    pub service_name: String,
    pub api_key: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// What the dashboard gets back: never the full key
#[derive(Debug, Clone, Serialize)]
pub struct ApiKeyResponse {
    pub key_name: String,
    pub masked_value: String,
    pub updated_at: DateTime<Utc>,
}

impl ApiKey {
    pub fn to_response(&self) -> ApiKeyResponse {
        ApiKeyResponse {
            key_name: self.service_name.clone(),
            masked_value: mask_secret(&self.api_key),
            updated_at: self.updated_at,
        }
    }
}

fn mask_secret(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}
