//! HTTP upload transport.
//!
//! Posts the asset as `multipart/form-data` to the media host's upload script. The
//! script answers with a JSON object that is often wrapped in stray interpreter
//! output, so replies go through [`clean_reply`] before decoding.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::time::Duration;
use tourdesk_core::{AppError, TransportKind};

use crate::keys::PublicUrlLayout;
use crate::traits::{DeliveredAsset, DeliveryRequest, DeliveryTransport, TransportError, TransportResult};

/// Closing tag the upload script leaves after its JSON body
pub const TRAILING_MARKER: &str = "?>";

const LOG_PREVIEW_CHARS: usize = 300;

/// Settings for the HTTP upload endpoint
#[derive(Clone)]
pub struct HttpDeliverySettings {
    pub endpoint: String,
    pub token: String,
    pub timeout: Duration,
}

/// Reply of the upload script once cleaned
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct UploadReply {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Reduce a raw reply to the JSON object it carries.
///
/// Trims whitespace, strips a trailing [`TRAILING_MARKER`], cuts everything after the
/// last `}` and skips anything before the first `{`. Returns `None` when no object
/// delimiters remain.
pub fn clean_reply(body: &str) -> Option<&str> {
    let mut text = body.trim();
    if let Some(stripped) = text.strip_suffix(TRAILING_MARKER) {
        text = stripped.trim_end();
    }

    let end = text.rfind('}')?;
    let text = &text[..=end];
    let start = text.find('{')?;
    Some(&text[start..])
}

/// Clean and decode a raw reply body.
pub fn parse_upload_reply(body: &str) -> TransportResult<UploadReply> {
    let cleaned = clean_reply(body).ok_or_else(|| {
        TransportError::UnparsableReply(format!("no JSON object in reply: {}", preview(body)))
    })?;

    serde_json::from_str::<UploadReply>(cleaned).map_err(|e| {
        TransportError::UnparsableReply(format!("{}: {}", e, preview(cleaned)))
    })
}

/// Content type sent for the file part, from the stored name's extension.
pub fn content_type_for(file_name: &str) -> &'static str {
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase());

    match extension.as_deref() {
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "image/jpeg",
    }
}

fn preview(body: &str) -> String {
    if body.chars().count() <= LOG_PREVIEW_CHARS {
        body.to_string()
    } else {
        let head: String = body.chars().take(LOG_PREVIEW_CHARS).collect();
        format!("{}...", head)
    }
}

/// Upload transport backed by the HTTP upload script
#[derive(Clone)]
pub struct HttpDelivery {
    client: reqwest::Client,
    endpoint: String,
    token: String,
    urls: PublicUrlLayout,
}

impl HttpDelivery {
    pub fn new(settings: HttpDeliverySettings, urls: PublicUrlLayout) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: settings.endpoint,
            token: settings.token,
            urls,
        })
    }

    fn build_form(request: &DeliveryRequest) -> TransportResult<Form> {
        let file = Part::bytes(request.payload.to_vec())
            .file_name(request.file_name.clone())
            .mime_str(content_type_for(&request.file_name))
            .map_err(|e| TransportError::Network(format!("Invalid file part: {}", e)))?;

        Ok(Form::new()
            .part("file", file)
            .text("customerId", request.entity_id.clone())
            .text("type", request.category.as_str()))
    }
}

#[async_trait]
impl DeliveryTransport for HttpDelivery {
    fn kind(&self) -> TransportKind {
        TransportKind::Http
    }

    async fn deliver(&self, request: &DeliveryRequest) -> TransportResult {
        let form = Self::build_form(request)?;
        let start = std::time::Instant::now();

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.token)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(
                    error = %e,
                    timeout = e.is_timeout(),
                    connect = e.is_connect(),
                    endpoint = %self.endpoint,
                    file_name = %request.file_name,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "HTTP upload request failed"
                );
                TransportError::Network(e.to_string())
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            tracing::warn!(error = %e, status = %status, "Failed to read HTTP upload reply");
            TransportError::Network(e.to_string())
        })?;

        if !status.is_success() {
            tracing::warn!(
                status = %status,
                body = %preview(&body),
                file_name = %request.file_name,
                "HTTP upload rejected"
            );
            return Err(TransportError::RemoteRejected(format!("HTTP status {}", status)));
        }

        let reply = parse_upload_reply(&body).map_err(|e| {
            tracing::warn!(error = %e, file_name = %request.file_name, "HTTP upload reply unparsable");
            e
        })?;

        if !reply.success {
            let message = reply
                .error
                .clone()
                .unwrap_or_else(|| "upload script reported failure".to_string());
            tracing::warn!(
                error = %message,
                file_name = %request.file_name,
                "HTTP upload script reported failure"
            );
            return Err(TransportError::RemoteRejected(message));
        }

        if let Some(remote_name) = reply.filename.as_deref() {
            if remote_name != request.file_name {
                tracing::warn!(
                    requested = %request.file_name,
                    reported = %remote_name,
                    "Upload script reported a different file name"
                );
            }
        }

        let url = self.urls.url_for(&request.entity_id, &request.file_name);
        if let Some(reported_url) = reply.url.as_deref() {
            if reported_url != url {
                tracing::debug!(
                    expected = %url,
                    reported = %reported_url,
                    "Upload script reported a different URL"
                );
            }
        }

        tracing::info!(
            entity_id = %request.entity_id,
            file_name = %request.file_name,
            size_bytes = request.payload.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "HTTP upload successful"
        );

        Ok(DeliveredAsset {
            file_name: request.file_name.clone(),
            url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::FailureReason;
    use bytes::Bytes;
    use mockito::Matcher;
    use tourdesk_core::AssetCategory;

    fn request() -> DeliveryRequest {
        DeliveryRequest {
            payload: Bytes::from_static(b"fake-jpeg-bytes"),
            file_name: "CUST-1_profile_1700000000000_7.jpg".to_string(),
            entity_id: "CUST-1".to_string(),
            category: AssetCategory::Profile,
        }
    }

    fn delivery(endpoint: String, timeout: Duration) -> HttpDelivery {
        HttpDelivery::new(
            HttpDeliverySettings {
                endpoint,
                token: "token-123".to_string(),
                timeout,
            },
            PublicUrlLayout::new("https://media.example.com/uploads"),
        )
        .unwrap()
    }

    #[test]
    fn parses_reply_with_trailing_marker() {
        let reply =
            parse_upload_reply("{\"success\":true,\"filename\":\"a.jpg\",\"url\":\"https://x/a.jpg\"}?>")
                .unwrap();
        assert!(reply.success);
        assert_eq!(reply.filename.as_deref(), Some("a.jpg"));
        assert_eq!(reply.url.as_deref(), Some("https://x/a.jpg"));
        assert_eq!(reply.error, None);
    }

    #[test]
    fn parses_reply_with_surrounding_noise() {
        let body = "\n  Notice: undefined index\n{\"success\":true,\"filename\":\"a.jpg\",\"url\":\"u\"}\n<!-- 0.01s -->\n?>\n";
        let reply = parse_upload_reply(body).unwrap();
        assert!(reply.success);
    }

    #[test]
    fn truncates_after_last_closing_brace() {
        assert_eq!(
            clean_reply("{\"a\":{\"b\":1}} trailing } junk"),
            Some("{\"a\":{\"b\":1}} trailing }")
        );
        assert_eq!(clean_reply("{\"a\":{\"b\":1}}garbage"), Some("{\"a\":{\"b\":1}}"));
    }

    #[test]
    fn reply_without_object_is_unparsable() {
        for body in ["", "   ", "?>", "Internal Server Error", "{\"success\":true"] {
            let err = parse_upload_reply(body).unwrap_err();
            assert_eq!(err.reason(), FailureReason::UnparsableReply, "for {:?}", body);
        }
    }

    #[test]
    fn missing_success_field_decodes_as_failure() {
        let reply = parse_upload_reply("{\"filename\":\"a.jpg\"}").unwrap();
        assert!(!reply.success);
    }

    #[test]
    fn infers_content_type_from_extension() {
        assert_eq!(content_type_for("a.png"), "image/png");
        assert_eq!(content_type_for("a.GIF"), "image/gif");
        assert_eq!(content_type_for("a.webp"), "image/webp");
        assert_eq!(content_type_for("a.jpeg"), "image/jpeg");
        assert_eq!(content_type_for("a.bin"), "image/jpeg");
        assert_eq!(content_type_for("noext"), "image/jpeg");
    }

    #[tokio::test]
    async fn delivers_multipart_with_bearer_token() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/upload.php")
            .match_header("authorization", "Bearer token-123")
            .match_header("content-type", Matcher::Regex("^multipart/form-data".to_string()))
            .match_body(Matcher::AllOf(vec![
                Matcher::Regex("name=\"customerId\"\r\n\r\nCUST-1".to_string()),
                Matcher::Regex("name=\"type\"\r\n\r\nprofile".to_string()),
                Matcher::Regex(
                    "name=\"file\"; filename=\"CUST-1_profile_1700000000000_7.jpg\"".to_string(),
                ),
                Matcher::Regex("fake-jpeg-bytes".to_string()),
            ]))
            .with_status(200)
            .with_body("{\"success\":true,\"filename\":\"CUST-1_profile_1700000000000_7.jpg\",\"url\":\"https://media.example.com/uploads/CUST-1/CUST-1_profile_1700000000000_7.jpg\"}?>")
            .create_async()
            .await;

        let transport = delivery(format!("{}/upload.php", server.url()), Duration::from_secs(5));
        let delivered = transport.deliver(&request()).await.unwrap();

        mock.assert_async().await;
        assert_eq!(delivered.file_name, "CUST-1_profile_1700000000000_7.jpg");
        assert_eq!(
            delivered.url,
            "https://media.example.com/uploads/CUST-1/CUST-1_profile_1700000000000_7.jpg"
        );
    }

    #[tokio::test]
    async fn explicit_failure_is_remote_rejected() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/upload.php")
            .with_status(200)
            .with_body("{\"success\":false,\"error\":\"disk quota exceeded\"}")
            .create_async()
            .await;

        let transport = delivery(format!("{}/upload.php", server.url()), Duration::from_secs(5));
        let err = transport.deliver(&request()).await.unwrap_err();
        assert_eq!(err.reason(), FailureReason::RemoteRejected);
        assert!(err.to_string().contains("disk quota exceeded"));
    }

    #[tokio::test]
    async fn error_status_is_remote_rejected_even_with_success_body() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/upload.php")
            .with_status(500)
            .with_body("{\"success\":true,\"filename\":\"a.jpg\",\"url\":\"u\"}")
            .create_async()
            .await;

        let transport = delivery(format!("{}/upload.php", server.url()), Duration::from_secs(5));
        let err = transport.deliver(&request()).await.unwrap_err();
        assert_eq!(err.reason(), FailureReason::RemoteRejected);
    }

    #[tokio::test]
    async fn garbled_reply_is_unparsable() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/upload.php")
            .with_status(200)
            .with_body("<b>Fatal error</b>: Allowed memory size exhausted")
            .create_async()
            .await;

        let transport = delivery(format!("{}/upload.php", server.url()), Duration::from_secs(5));
        let err = transport.deliver(&request()).await.unwrap_err();
        assert_eq!(err.reason(), FailureReason::UnparsableReply);
    }

    #[tokio::test]
    async fn refused_connection_is_network_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let transport = delivery(format!("http://{}/upload.php", addr), Duration::from_secs(5));
        let err = transport.deliver(&request()).await.unwrap_err();
        assert_eq!(err.reason(), FailureReason::Network);
    }

    #[tokio::test]
    async fn silent_server_times_out_as_network_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let _server = tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let transport = delivery(format!("http://{}/upload.php", addr), Duration::from_millis(200));
        let err = transport.deliver(&request()).await.unwrap_err();
        assert_eq!(err.reason(), FailureReason::Network);
    }
}
