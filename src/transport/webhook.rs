//! JSON-over-HTTP transport.
//!
//! Each message becomes one `POST` to the configured URL. SMS addresses are
//! sent with their SMPP TON/NPI values so the receiving gateway does not have
//! to classify them again.

use async_trait::async_trait;
use regex::Regex;
use serde::Serialize;
use tracing::debug;
use url::Url;

use crate::message::{Email, Sms};
use crate::sender::{DeliveryError, SendError, Sender};

use super::{final_text, WireAddress};

/// SMS request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SmsPayload {
    /// Always `"sms"`.
    pub channel: &'static str,
    /// Originating address, if any.
    pub from: Option<WireAddress>,
    /// Destination addresses.
    pub to: Vec<WireAddress>,
    /// Message text.
    pub text: String,
}

impl SmsPayload {
    /// Build the payload for `sms`.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError`] when the content is still a template.
    pub fn from_sms(transport: &str, sms: &Sms) -> Result<Self, DeliveryError> {
        Ok(Self {
            channel: "sms",
            from: sms.from.as_ref().map(WireAddress::from),
            to: sms.to.iter().map(WireAddress::from).collect(),
            text: final_text(transport, &sms.content)?.to_owned(),
        })
    }
}

/// Email request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmailPayload {
    /// Always `"email"`.
    pub channel: &'static str,
    /// Sender address.
    pub from: Option<String>,
    /// Primary recipients.
    pub to: Vec<String>,
    /// Carbon-copy recipients.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub cc: Vec<String>,
    /// Blind carbon-copy recipients.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub bcc: Vec<String>,
    /// Subject line.
    pub subject: Option<String>,
    /// Message body.
    pub body: String,
}

impl EmailPayload {
    /// Build the payload for `email`.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError`] when the content is still a template.
    pub fn from_email(transport: &str, email: &Email) -> Result<Self, DeliveryError> {
        Ok(Self {
            channel: "email",
            from: email.from.clone(),
            to: email.to.clone(),
            cc: email.cc.clone(),
            bcc: email.bcc.clone(),
            subject: email.subject.clone(),
            body: final_text(transport, &email.content)?.to_owned(),
        })
    }
}

/// Posts messages as JSON to a fixed URL.
///
/// The underlying `reqwest::Client` is safe to share between concurrent sends.
#[derive(Clone)]
pub struct WebhookSender {
    name: String,
    url: Url,
    token: Option<String>,
    client: reqwest::Client,
}

impl std::fmt::Debug for WebhookSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookSender")
            .field("name", &self.name)
            .field("url", &self.url.as_str())
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl WebhookSender {
    /// Transport posting to `url`, optionally with a bearer `token`.
    pub fn new(name: impl Into<String>, url: Url, token: Option<String>) -> Self {
        Self {
            name: name.into(),
            url,
            token,
            client: reqwest::Client::new(),
        }
    }

    async fn post<T: Serialize + Sync>(&self, payload: &T) -> Result<(), DeliveryError> {
        let mut request = self.client.post(self.url.clone()).json(payload);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        let response = request
            .send()
            .await
            .map_err(|e| DeliveryError::new(&self.name, format!("request failed: {e}")))?;
        check_http_response(&self.name, response).await?;
        debug!(transport = %self.name, url = %self.url, "webhook accepted message");
        Ok(())
    }
}

#[async_trait]
impl Sender<Sms> for WebhookSender {
    async fn send(&self, message: Sms) -> Result<(), SendError> {
        let payload = SmsPayload::from_sms(&self.name, &message)?;
        self.post(&payload).await?;
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[async_trait]
impl Sender<Email> for WebhookSender {
    async fn send(&self, message: Email) -> Result<(), SendError> {
        let payload = EmailPayload::from_email(&self.name, &message)?;
        self.post(&payload).await?;
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Check HTTP response status and return body text or a delivery error.
///
/// # Errors
///
/// Returns [`DeliveryError`] on transport failure or a non-2xx status.
pub async fn check_http_response(
    transport: &str,
    response: reqwest::Response,
) -> Result<String, DeliveryError> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| DeliveryError::new(transport, format!("failed to read response: {e}")))?;
    if !status.is_success() {
        return Err(DeliveryError::new(
            transport,
            format!(
                "non-success status {}: {}",
                status.as_u16(),
                sanitize_http_error_body(&body)
            ),
        ));
    }
    Ok(body)
}

/// Collapse whitespace, redact credentials and truncate an error body.
pub fn sanitize_http_error_body(raw: &str) -> String {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");

    let mut sanitized = collapsed;
    for pattern in [
        r"(?i)bearer\s+[A-Za-z0-9._\-]{8,}",
        r#"(?i)"(api_?key|token|password)"\s*:\s*"[^"]*""#,
        r"(?i)(api_?key|token|password)=[^&\s]+",
    ] {
        if let Ok(regex) = Regex::new(pattern) {
            sanitized = regex.replace_all(&sanitized, "[REDACTED]").into_owned();
        }
    }

    const MAX_ERROR_BODY_CHARS: usize = 256;
    if sanitized.chars().count() > MAX_ERROR_BODY_CHARS {
        let shortened = sanitized
            .chars()
            .take(MAX_ERROR_BODY_CHARS)
            .collect::<String>();
        return format!("{shortened}...[truncated]");
    }

    sanitized
}
