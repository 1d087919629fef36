//! Transactional email through Resend

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{check_status, EmailSender, IntegrationResult, OutgoingEmail};

const SERVICE: &str = "resend";

#[derive(Debug, Serialize)]
struct SendEmailBody<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
}

#[derive(Debug, Deserialize)]
struct SendEmailResponse {
    id: String,
}

pub struct ResendClient {
    http: Client,
    base_url: String,
    from_address: String,
    api_key: String,
}

impl ResendClient {
    pub fn new(http: Client, base_url: &str, from_address: &str, api_key: String) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            from_address: from_address.to_string(),
            api_key,
        }
    }
}

#[async_trait]
impl EmailSender for ResendClient {
    fn endpoint_key(&self) -> &str {
        SERVICE
    }

    async fn send(&self, email: &OutgoingEmail) -> IntegrationResult<String> {
        let body = SendEmailBody {
            from: &self.from_address,
            to: [&email.to],
            subject: &email.subject,
            html: &email.html,
        };

        let resp = self
            .http
            .post(format!("{}/emails", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;
        let resp = check_status(SERVICE, resp).await?;

        let sent: SendEmailResponse = resp.json().await?;
        Ok(sent.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_shape() {
        let body = SendEmailBody {
            from: "Agency <hello@agency.test>",
            to: ["buyer@example.com"],
            subject: "Your showing",
            html: "<p>See you at 3</p>",
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({
                "from": "Agency <hello@agency.test>",
                "to": ["buyer@example.com"],
                "subject": "Your showing",
                "html": "<p>See you at 3</p>"
            })
        );
    }

    #[test]
    fn test_decode_send_response() {
        let sent: SendEmailResponse =
            serde_json::from_str(r#"{"id":"49a3999c-0ce1-4ea6-ab68-afcd6dc2e794"}"#).unwrap();
        assert_eq!(sent.id, "49a3999c-0ce1-4ea6-ab68-afcd6dc2e794");

        assert!(serde_json::from_str::<SendEmailResponse>(r#"{"name":"validation_error"}"#).is_err());
    }
}
