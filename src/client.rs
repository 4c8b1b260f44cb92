// 🌐 Remote client - record fetch, field updates, message dispatch
// The three traits are the seams the session and the notifier are written against.

use crate::config::{ClientConfig, Credentials};
use crate::edit::SaveRequest;
use crate::error::ApiError;
use crate::notifier::SendOutcome;
use crate::record::{normalize_payload, VoterRecord};
use crate::relay::{SendRequest, UpdateReply, UpdateRequest};
use anyhow::{Context, Result};
use reqwest::header::ACCEPT;
use serde_json::Value;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info, warn};

// ============================================================================
// SEAMS
// ============================================================================

/// Source of the full voter list
pub trait RecordSource {
    fn fetch_records(&self) -> impl Future<Output = Result<Vec<VoterRecord>, ApiError>> + Send;
}

/// Persists one mobile/address edit; yields the server's confirmation text
pub trait RecordUpdater {
    fn update_record(
        &self,
        request: &SaveRequest,
    ) -> impl Future<Output = Result<String, ApiError>> + Send;
}

/// Dispatches one text message to an already-normalized number
pub trait NotificationSender {
    fn send(
        &self,
        phone: &str,
        message: &str,
    ) -> impl Future<Output = Result<SendOutcome, ApiError>> + Send;
}

// ============================================================================
// HTTP CLIENT
// ============================================================================

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    records_url: String,
    update_url: String,
    notify_url: String,
    fetch_timeout: Duration,
    update_timeout: Duration,
    notify_timeout: Duration,
    credentials: Option<Credentials>,
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("voter-lookup/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        let credentials = config.credentials();
        if credentials.is_none() {
            warn!("messaging credentials not configured; notifications disabled");
        }

        Ok(ApiClient {
            http,
            records_url: config.records_url.clone(),
            update_url: config.update_url.clone(),
            notify_url: config.notify_url.clone(),
            fetch_timeout: config.fetch_timeout(),
            update_timeout: config.update_timeout(),
            notify_timeout: config.notify_timeout(),
            credentials,
        })
    }

    pub fn has_credentials(&self) -> bool {
        self.credentials.is_some()
    }
}

/// Read the body and parse it as JSON, treating HTML pages as malformed
async fn read_json(response: reqwest::Response) -> Result<Value, ApiError> {
    let body = response.text().await.map_err(ApiError::from_reqwest)?;
    parse_json_body(&body)
}

fn parse_json_body(body: &str) -> Result<Value, ApiError> {
    let trimmed = body.trim_start();
    if trimmed.starts_with('<') {
        return Err(ApiError::Malformed("received an HTML page instead of JSON".to_string()));
    }
    serde_json::from_str(trimmed).map_err(|e| ApiError::Malformed(e.to_string()))
}

impl RecordSource for ApiClient {
    async fn fetch_records(&self) -> Result<Vec<VoterRecord>, ApiError> {
        debug!(url = %self.records_url, "fetching voter records");

        let response = self
            .http
            .get(&self.records_url)
            .header(ACCEPT, "application/json")
            .timeout(self.fetch_timeout)
            .send()
            .await
            .map_err(ApiError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "record fetch failed");
            return Err(ApiError::Status(status.as_u16()));
        }

        let body = read_json(response).await?;
        let records = normalize_payload(&body)?;
        info!(count = records.len(), "voter records loaded");
        Ok(records)
    }
}

impl RecordUpdater for ApiClient {
    async fn update_record(&self, request: &SaveRequest) -> Result<String, ApiError> {
        let payload = UpdateRequest::from(request);
        debug!(kind = %request.kind, epic_id = %request.voter_card_id, "sending update");

        let response = self
            .http
            .post(&self.update_url)
            .header(ACCEPT, "application/json")
            .timeout(self.update_timeout)
            .json(&payload)
            .send()
            .await
            .map_err(ApiError::from_reqwest)?;

        let status = response.status();
        let body = read_json(response).await;

        // An error body explains itself better than a bare status code
        let reply = match body {
            Ok(value) => serde_json::from_value::<UpdateReply>(value).ok(),
            Err(err) if status.is_success() => return Err(err),
            Err(_) => None,
        };

        match reply {
            Some(reply) if reply.is_success() && status.is_success() => Ok(reply.message),
            Some(reply) if !reply.is_success() => Err(ApiError::Rejected(reply.message)),
            _ if !status.is_success() => Err(ApiError::Status(status.as_u16())),
            _ => Err(ApiError::Malformed("unexpected update response".to_string())),
        }
    }
}

impl NotificationSender for ApiClient {
    async fn send(&self, phone: &str, message: &str) -> Result<SendOutcome, ApiError> {
        let Some(credentials) = &self.credentials else {
            return Err(ApiError::MissingCredentials);
        };

        let payload = SendRequest {
            phone_number: phone.to_string(),
            message: message.to_string(),
            phone_number_id: credentials.phone_number_id.clone(),
            api_key: credentials.api_key.clone(),
        };

        let response = self
            .http
            .post(&self.notify_url)
            .header(ACCEPT, "application/json")
            .timeout(self.notify_timeout)
            .json(&payload)
            .send()
            .await
            .map_err(ApiError::from_reqwest)?;

        let status = response.status().as_u16();
        let body = read_json(response).await?;
        Ok(SendOutcome::from_response(status, &body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_body_is_malformed() {
        let err = parse_json_body("  <!DOCTYPE html><html>502</html>").unwrap_err();
        assert!(matches!(err, ApiError::Malformed(_)));

        assert!(matches!(parse_json_body("not json"), Err(ApiError::Malformed(_))));
        assert_eq!(parse_json_body(r#"{"a":1}"#).unwrap()["a"], 1);
    }

    #[tokio::test]
    async fn test_send_without_credentials() {
        let client = ApiClient::new(&ClientConfig::default()).unwrap();
        assert!(!client.has_credentials());

        let err = client.send("919090385555", "hi").await.unwrap_err();
        assert_eq!(err, ApiError::MissingCredentials);
    }

    #[cfg(feature = "server")]
    mod http {
        use super::*;
        use crate::edit::FieldKind;
        use axum::http::StatusCode;
        use axum::routing::{get, post};
        use axum::{Json, Router};
        use serde_json::json;

        /// Serve `app` on an ephemeral local port and return its base URL
        async fn spawn(app: Router) -> String {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();
            tokio::spawn(async move {
                axum::serve(listener, app).await.unwrap();
            });
            format!("http://{}", addr)
        }

        fn config(base: &str) -> ClientConfig {
            ClientConfig {
                records_url: format!("{}/records", base),
                update_url: format!("{}/update", base),
                notify_url: format!("{}/notify", base),
                phone_number_id: Some("1234".into()),
                api_key: Some("secret".into()),
                ..Default::default()
            }
        }

        fn save_request() -> SaveRequest {
            SaveRequest {
                kind: FieldKind::Mobile,
                record_id: "1".into(),
                voter_card_id: "ABC1234567".into(),
                serial_number: "1".into(),
                mobile: "9090385555".into(),
                address: "12A".into(),
            }
        }

        #[tokio::test]
        async fn test_fetch_records() {
            let app = Router::new().route(
                "/records",
                get(|| async {
                    Json(json!({
                        "status": "success",
                        "data": [
                            { "नाव (इंग्रजी)": "नाव (इंग्रजी)" },
                            { "नाव (इंग्रजी)": "Ravi Kumar", "मोबाईल नं.": "9090385555" },
                            { "नाव (इंग्रजी)": "  " }
                        ]
                    }))
                }),
            );
            let client = ApiClient::new(&config(&spawn(app).await)).unwrap();

            let records = client.fetch_records().await.unwrap();

            assert_eq!(records.len(), 1);
            assert_eq!(records[0].name_latin, "Ravi Kumar");
        }

        #[tokio::test]
        async fn test_fetch_failures() {
            let app = Router::new()
                .route("/records", get(|| async { StatusCode::BAD_GATEWAY }))
                .route("/html", get(|| async { "<html>oops</html>" }));
            let base = spawn(app).await;

            let client = ApiClient::new(&config(&base)).unwrap();
            assert_eq!(client.fetch_records().await.unwrap_err(), ApiError::Status(502));

            let html = ApiClient::new(&ClientConfig {
                records_url: format!("{}/html", base),
                ..config(&base)
            })
            .unwrap();
            assert!(matches!(html.fetch_records().await, Err(ApiError::Malformed(_))));
        }

        #[tokio::test]
        async fn test_fetch_timeout() {
            let app = Router::new().route(
                "/records",
                get(|| async {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    Json(json!({ "status": "success", "data": [] }))
                }),
            );
            let base = spawn(app).await;
            let client = ApiClient::new(&ClientConfig {
                fetch_timeout_secs: 1,
                ..config(&base)
            })
            .unwrap();

            assert_eq!(client.fetch_records().await.unwrap_err(), ApiError::Timeout);
        }

        #[tokio::test]
        async fn test_update_record() {
            let app = Router::new().route(
                "/update",
                post(|Json(body): Json<Value>| async move {
                    if body["epic_id"] == "ABC1234567" {
                        (StatusCode::OK, Json(json!({ "status": "success", "message": "saved" })))
                    } else {
                        (
                            StatusCode::BAD_REQUEST,
                            Json(json!({ "status": "error", "message": "EPIC ID is required" })),
                        )
                    }
                }),
            );
            let client = ApiClient::new(&config(&spawn(app).await)).unwrap();

            assert_eq!(client.update_record(&save_request()).await.unwrap(), "saved");

            let mut missing = save_request();
            missing.voter_card_id = "other".into();
            assert_eq!(
                client.update_record(&missing).await.unwrap_err(),
                ApiError::Rejected("EPIC ID is required".into())
            );
        }

        #[tokio::test]
        async fn test_send_posts_credentials() {
            let app = Router::new().route(
                "/notify",
                post(|Json(body): Json<Value>| async move {
                    assert_eq!(body["phone_number_id"], "1234");
                    assert_eq!(body["api_key"], "secret");
                    assert_eq!(body["phone_number"], "919090385555");
                    Json(json!({ "success": true, "message_id": "wamid.9" }))
                }),
            );
            let client = ApiClient::new(&config(&spawn(app).await)).unwrap();

            let outcome = client.send("919090385555", "hello").await.unwrap();
            assert_eq!(outcome, SendOutcome::Sent { message_id: Some("wamid.9".into()) });
        }
    }
}
