// Messaging Proxy - forwards one text message to the WhatsApp provider

use crate::error::ProxyError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

/// Where and how patiently to reach the provider
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    pub base_url: String,
    pub timeout: Duration,
}

impl ProviderSettings {
    pub fn messages_url(&self, phone_number_id: &str) -> String {
        format!(
            "{}/v3/{}/messages",
            self.base_url.trim_end_matches('/'),
            phone_number_id
        )
    }
}

// ============================================================================
// WIRE TYPES
// ============================================================================

/// Body accepted by the proxy. Missing fields deserialize as empty.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendRequest {
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub phone_number_id: String,
    #[serde(default)]
    pub api_key: String,
}

impl std::fmt::Debug for SendRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SendRequest")
            .field("phone_number", &self.phone_number)
            .field("phone_number_id", &self.phone_number_id)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

/// Successful proxy response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SendReply {
    pub success: bool,
    pub message_id: Option<String>,
    pub phone_number: String,
    pub data: Value,
}

/// Payload in the provider's own format
#[derive(Debug, Serialize)]
struct ProviderMessage<'a> {
    messaging_product: &'static str,
    to: &'a str,
    #[serde(rename = "type")]
    kind: &'static str,
    text: ProviderText<'a>,
}

#[derive(Debug, Serialize)]
struct ProviderText<'a> {
    body: &'a str,
}

// ============================================================================
// FORWARDING
// ============================================================================

/// Forward `request` to the provider and translate its answer.
pub async fn forward_message(
    http: &reqwest::Client,
    provider: &ProviderSettings,
    request: SendRequest,
) -> Result<SendReply, ProxyError> {
    let missing = [
        &request.phone_number,
        &request.message,
        &request.phone_number_id,
        &request.api_key,
    ]
    .iter()
    .any(|field| field.trim().is_empty());

    if missing {
        return Err(ProxyError::MissingFields);
    }

    let payload = ProviderMessage {
        messaging_product: "whatsapp",
        to: request.phone_number.trim(),
        kind: "text",
        text: ProviderText {
            body: &request.message,
        },
    };

    let url = provider.messages_url(request.phone_number_id.trim());
    debug!(to = %payload.to, "forwarding message to provider");

    let response = http
        .post(&url)
        .header("apikey", request.api_key.trim())
        .timeout(provider.timeout)
        .json(&payload)
        .send()
        .await
        .map_err(|e| {
            warn!(error = %e, "provider unreachable");
            ProxyError::Transport(e.to_string())
        })?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| ProxyError::Transport(e.to_string()))?;

    let data: Value = serde_json::from_str(&body).map_err(|_| {
        warn!(status = status.as_u16(), "provider returned a non-JSON body");
        ProxyError::Transport(format!(
            "provider returned a non-JSON body (HTTP {})",
            status.as_u16()
        ))
    })?;

    if let Some(message) = provider_error(status.is_success(), &data) {
        warn!(status = status.as_u16(), %message, "provider rejected message");
        return Err(ProxyError::Provider {
            status: status.as_u16(),
            message,
        });
    }

    Ok(SendReply {
        success: true,
        message_id: data
            .pointer("/messages/0/id")
            .and_then(Value::as_str)
            .map(str::to_string),
        phone_number: request.phone_number,
        data,
    })
}

/// Failure text for a provider reply; `None` means delivered.
/// An `"error": null` member counts as no error.
fn provider_error(http_ok: bool, data: &Value) -> Option<String> {
    let error = data.get("error").filter(|e| !e.is_null());
    if http_ok && error.is_none() {
        return None;
    }

    let message = data
        .pointer("/error/message")
        .and_then(Value::as_str)
        .or_else(|| error.and_then(Value::as_str))
        .unwrap_or("WhatsApp API error");
    Some(message.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_url() {
        let provider = ProviderSettings {
            base_url: "https://waba.example.com/".to_string(),
            timeout: Duration::from_secs(1),
        };
        assert_eq!(
            provider.messages_url("12345"),
            "https://waba.example.com/v3/12345/messages"
        );
    }

    #[test]
    fn test_provider_payload_shape() {
        let payload = ProviderMessage {
            messaging_product: "whatsapp",
            to: "919090385555",
            kind: "text",
            text: ProviderText { body: "hello" },
        };

        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "messaging_product": "whatsapp",
                "to": "919090385555",
                "type": "text",
                "text": { "body": "hello" }
            })
        );
    }

    #[tokio::test]
    async fn test_missing_fields_never_reach_provider() {
        let provider = ProviderSettings {
            // Unroutable on purpose: the call must fail before any I/O
            base_url: "http://127.0.0.1:9".to_string(),
            timeout: Duration::from_millis(50),
        };
        let request = SendRequest {
            phone_number: "919090385555".into(),
            message: "hi".into(),
            phone_number_id: "".into(),
            api_key: "key".into(),
        };

        let err = forward_message(&reqwest::Client::new(), &provider, request)
            .await
            .unwrap_err();
        assert_eq!(err, ProxyError::MissingFields);
    }

    #[test]
    fn test_provider_error_detection() {
        let delivered = serde_json::json!({ "messages": [{ "id": "wamid.1" }], "error": null });
        assert_eq!(provider_error(true, &delivered), None);

        let nested = serde_json::json!({ "error": { "message": "Invalid recipient" } });
        assert_eq!(provider_error(true, &nested).as_deref(), Some("Invalid recipient"));

        let flat = serde_json::json!({ "error": "quota exceeded" });
        assert_eq!(provider_error(true, &flat).as_deref(), Some("quota exceeded"));

        let bare = serde_json::json!({});
        assert_eq!(provider_error(false, &bare).as_deref(), Some("WhatsApp API error"));
    }
}
