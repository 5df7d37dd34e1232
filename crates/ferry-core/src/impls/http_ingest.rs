//! HttpIngest - client for the pipeline's `POST /ingest` endpoint.
//!
//! Request: `{file_path, file_content_base64, filename}`.
//! Reply: `{success, file_path, description, category, has_events, error}`.
//!
//! Connection failures and timeouts are transport errors. A non-2xx status,
//! an unreadable body or `success: false` is a remote rejection.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::config::RemoteConfig;
use crate::domain::{IngestError, IngestMetadata, IngestReply};
use crate::ports::RemoteIngest;

#[derive(Debug, Serialize)]
struct IngestRequest<'a> {
    file_path: &'a str,
    file_content_base64: String,
    filename: &'a str,
}

#[derive(Debug, Deserialize)]
struct IngestResponse {
    success: bool,
    #[serde(default)]
    description: String,
    #[serde(default)]
    category: String,
    #[serde(default)]
    has_events: bool,
    #[serde(default)]
    error: String,
}

impl From<IngestResponse> for IngestReply {
    fn from(response: IngestResponse) -> Self {
        if !response.success {
            return IngestReply::rejected(response.error);
        }
        IngestReply::ok(
            Some(json!({
                "description": response.description,
                "category": response.category,
            })),
            response.has_events,
        )
    }
}

#[derive(Debug, Clone)]
pub struct HttpIngest {
    client: reqwest::Client,
    url: String,
}

impl HttpIngest {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: format!("{}/ingest", endpoint.trim_end_matches('/')),
        })
    }

    pub fn from_config(config: &RemoteConfig) -> Result<Self, reqwest::Error> {
        Self::new(&config.endpoint, config.request_timeout())
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl RemoteIngest for HttpIngest {
    async fn submit(
        &self,
        content: Vec<u8>,
        metadata: &IngestMetadata,
    ) -> Result<IngestReply, IngestError> {
        let request = IngestRequest {
            file_path: metadata.source_ref.as_str(),
            file_content_base64: STANDARD.encode(&content),
            filename: &metadata.display_name,
        };
        drop(content);

        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| IngestError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = body.trim();
            return Err(IngestError::Rejected(if detail.is_empty() {
                format!("HTTP {status}")
            } else {
                format!("HTTP {status}: {detail}")
            }));
        }

        let reply: IngestResponse = response
            .json()
            .await
            .map_err(|e| IngestError::Rejected(format!("malformed reply: {e}")))?;
        Ok(reply.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ErrorKind, ItemId, SourceRef};
    use ulid::Ulid;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn metadata() -> IngestMetadata {
        IngestMetadata {
            id: ItemId::from_ulid(Ulid::new()),
            source_ref: SourceRef::new("/docs/trip.ics"),
            display_name: "trip.ics".to_string(),
        }
    }

    fn client(server: &MockServer) -> HttpIngest {
        HttpIngest::new(&format!("{}/", server.uri()), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn posts_base64_content_and_maps_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/ingest"))
            .and(body_partial_json(json!({
                "file_path": "/docs/trip.ics",
                "file_content_base64": "aGVsbG8=",
                "filename": "trip.ics",
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "file_path": "/docs/trip.ics",
                "description": "Flight booking",
                "category": "travel",
                "has_events": true,
                "error": "",
            })))
            .expect(1)
            .mount(&server)
            .await;

        let reply = client(&server)
            .submit(b"hello".to_vec(), &metadata())
            .await
            .unwrap();

        assert!(reply.success);
        assert!(reply.has_notable_content);
        assert_eq!(
            reply.result_payload,
            Some(json!({"description": "Flight booking", "category": "travel"}))
        );
    }

    #[tokio::test]
    async fn unsuccessful_reply_is_a_rejection() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/ingest"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": false,
                "file_path": "/docs/trip.ics",
                "error": "unsupported file type",
            })))
            .mount(&server)
            .await;

        let err = client(&server)
            .submit(b"x".to_vec(), &metadata())
            .await
            .unwrap()
            .into_result()
            .unwrap_err();
        assert_eq!(err, IngestError::Rejected("unsupported file type".into()));
    }

    #[tokio::test]
    async fn server_error_status_is_a_rejection() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("model not loaded"))
            .mount(&server)
            .await;

        let err = client(&server)
            .submit(b"x".to_vec(), &metadata())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Rejected);
        assert!(err.to_string().contains("model not loaded"));
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_a_transport_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let ingest = HttpIngest::new(&format!("http://{addr}"), Duration::from_secs(2)).unwrap();
        let err = ingest.submit(b"x".to_vec(), &metadata()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transport);
    }

    #[test]
    fn url_is_joined_without_double_slash() {
        let ingest = HttpIngest::new("http://10.0.0.2:8000/", Duration::from_secs(1)).unwrap();
        assert_eq!(ingest.url(), "http://10.0.0.2:8000/ingest");
    }
}
