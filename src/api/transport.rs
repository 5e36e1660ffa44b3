//! HTTP transport and status classification.

use reqwest::{Client, RequestBuilder, StatusCode};
use tracing::{debug, warn};

use super::error::{ApiError, Result};

/// The only status treated as success. Any other 2xx is a failure.
const SUCCESS_STATUS: StatusCode = StatusCode::OK;

/// Executes signed requests and classifies their outcome.
///
/// Performs no retries and imposes no timeout of its own; configure those on
/// the `reqwest::Client` handed to [`Transport::new`].
#[derive(Debug, Clone)]
pub struct Transport {
    http: Client,
}

impl Transport {
    /// Wrap an existing HTTP client.
    pub fn new(http: Client) -> Self {
        Self { http }
    }

    /// The underlying HTTP client, used to start new request builders.
    pub fn http(&self) -> &Client {
        &self.http
    }

    /// Send a request and return the full body of a `200 OK` response.
    ///
    /// # Errors
    ///
    /// - `ApiError::Network` if the request could not be sent or a `200` body
    ///   could not be read
    /// - `ApiError::Transport` for any status other than 200, carrying the raw
    ///   body (empty if it could not be read)
    pub async fn execute(&self, request: RequestBuilder) -> Result<Vec<u8>> {
        let response = request.send().await?;
        let status = response.status();
        let url = response.url().path().to_string();

        if status != SUCCESS_STATUS {
            // The status is the error; an unreadable body must not hide it.
            let body = match response.bytes().await {
                Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
                Err(e) => {
                    debug!("Could not read error response body: {}", e);
                    String::new()
                }
            };
            warn!(status = status.as_u16(), path = %url, "Unexpected response status");
            debug!("Error response body: {}", body);
            return Err(ApiError::Transport {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.bytes().await?;
        debug!(path = %url, bytes = body.len(), "Received response");
        Ok(body.to_vec())
    }
}

impl Default for Transport {
    fn default() -> Self {
        Self::new(Client::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_ok_returns_raw_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ok"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not even json"))
            .expect(1)
            .mount(&server)
            .await;

        let transport = Transport::default();
        let body = transport
            .execute(transport.http().get(format!("{}/ok", server.uri())))
            .await
            .unwrap();
        assert_eq!(body, b"not even json");
    }

    #[tokio::test]
    async fn test_server_error_keeps_literal_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500).set_body_string(r#"{"error":"boom"}"#))
            .expect(1)
            .mount(&server)
            .await;

        let transport = Transport::default();
        let err = transport
            .execute(transport.http().get(server.uri()))
            .await
            .unwrap_err();

        match err {
            ApiError::Transport { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body, r#"{"error":"boom"}"#);
            }
            other => panic!("Expected Transport error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_other_success_codes_are_failures() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(201).set_body_string("created"))
            .mount(&server)
            .await;

        let transport = Transport::default();
        let err = transport
            .execute(transport.http().post(server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Transport { status: 201, .. }));
    }

    #[tokio::test]
    async fn test_no_retry_on_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;

        let transport = Transport::default();
        let result = transport.execute(transport.http().get(server.uri())).await;
        assert!(result.is_err());
    }

    /// Serve one response whose body is cut short of its `Content-Length`.
    async fn serve_truncated(status_line: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1024];
            let _ = socket.read(&mut buf).await;
            let head = format!("{}\r\nContent-Length: 100\r\n\r\npartial", status_line);
            let _ = socket.write_all(head.as_bytes()).await;
            let _ = socket.shutdown().await;
        });
        format!("http://{}/", addr)
    }

    #[tokio::test]
    async fn test_unreadable_error_body_keeps_status() {
        let url = serve_truncated("HTTP/1.1 503 Service Unavailable").await;

        let transport = Transport::default();
        let err = transport
            .execute(transport.http().get(url))
            .await
            .unwrap_err();

        match err {
            ApiError::Transport { status, body } => {
                assert_eq!(status, 503);
                assert!(body.is_empty());
            }
            other => panic!("Expected Transport error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unreadable_success_body_is_network_error() {
        let url = serve_truncated("HTTP/1.1 200 OK").await;

        let transport = Transport::default();
        let err = transport
            .execute(transport.http().get(url))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Network(_)));
    }

    #[tokio::test]
    async fn test_connection_failure_is_network_error() {
        // Nothing listens on port 1
        let transport = Transport::default();
        let err = transport
            .execute(transport.http().get("http://127.0.0.1:1/"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Network(_)));
    }
}
