//! HTTP client for the contact API.

use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;

use crate::client::ClientError;
use crate::contact::ContactForm;

/// Status and JSON body of a diagnostic call.
#[derive(Debug, Clone)]
pub struct ApiReply {
    pub status: u16,
    pub body: Value,
}

impl ApiReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Envelope {
    success: bool,
    error: Option<String>,
    details: Option<Value>,
    #[serde(rename = "messageId")]
    message_id: Option<String>,
}

/// `details` is a list of violations, or a single diagnostic string.
fn details_of(value: Option<Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .into_iter()
            .map(|item| match item {
                Value::String(s) => s,
                other => other.to_string(),
            })
            .collect(),
        Some(Value::String(s)) => vec![s],
        Some(Value::Null) | None => Vec::new(),
        Some(other) => vec![other.to_string()],
    }
}

/// Talks to a running contact API.
#[derive(Debug, Clone)]
pub struct ContactClient {
    http: reqwest::Client,
    base_url: String,
}

impl ContactClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ClientError::Build)?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn health(&self) -> Result<ApiReply, ClientError> {
        self.get("/api/health").await
    }

    /// Ask the server to verify its mail configuration.
    pub async fn check_mail(&self) -> Result<ApiReply, ClientError> {
        self.get("/api/test-email").await
    }

    async fn get(&self, path: &str) -> Result<ApiReply, ClientError> {
        let response = self.http.get(self.url(path)).send().await?;
        let status = response.status().as_u16();
        let body = response
            .json::<Value>()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))?;
        Ok(ApiReply { status, body })
    }

    /// Submit the form. Returns the message id on success.
    pub async fn submit(&self, form: &ContactForm) -> Result<String, ClientError> {
        let response = self.http.post(self.url("/api/send-email")).json(form).send().await?;
        let status = response.status();
        let text = response.text().await?;

        let envelope: Envelope = serde_json::from_str(&text).map_err(|_| {
            ClientError::Decode(format!("status {} with non-JSON body", status.as_u16()))
        })?;

        if status.is_success() && envelope.success {
            return Ok(envelope.message_id.unwrap_or_default());
        }

        Err(ClientError::Rejected {
            status: status.as_u16(),
            error: envelope
                .error
                .unwrap_or_else(|| format!("request failed with status {}", status.as_u16())),
            details: details_of(envelope.details),
        })
    }
}
