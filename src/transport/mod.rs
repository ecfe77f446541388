//! HTTP transport seam.
//!
//! The notification machinery only ever needs "send this request, give me the
//! status and body", so it talks to the operator's REST API through this
//! narrow trait. Tests script responses through it without touching a network.

use std::time::Duration;

use async_trait::async_trait;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors produced by the HTTP transport.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The underlying HTTP client could not be built.
    #[error("http client error: {0}")]
    Client(#[source] BoxError),

    /// The request could not be sent or the response body could not be read.
    #[error("network error: {0}")]
    Network(#[source] BoxError),
}

/// A plain HTTP response: status code plus raw body.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// True for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Minimal HTTP surface the notification machinery depends on.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn get(&self, url: &str) -> Result<HttpResponse, TransportError>;

    async fn post(&self, url: &str, body: Vec<u8>) -> Result<HttpResponse, TransportError>;

    async fn delete(&self, url: &str) -> Result<HttpResponse, TransportError>;
}

/// Production transport backed by `reqwest`.
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Build a transport applying `request_timeout` to every request.
    pub fn new(request_timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|error| TransportError::Client(Box::new(error)))?;
        Ok(Self { client })
    }

    async fn read(response: reqwest::Response) -> Result<HttpResponse, TransportError> {
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|error| TransportError::Network(Box::new(error)))?
            .to_vec();
        Ok(HttpResponse { status, body })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, url: &str) -> Result<HttpResponse, TransportError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|error| TransportError::Network(Box::new(error)))?;
        Self::read(response).await
    }

    async fn post(&self, url: &str, body: Vec<u8>) -> Result<HttpResponse, TransportError> {
        let response = self
            .client
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|error| TransportError::Network(Box::new(error)))?;
        Self::read(response).await
    }

    async fn delete(&self, url: &str) -> Result<HttpResponse, TransportError> {
        let response = self
            .client
            .delete(url)
            .send()
            .await
            .map_err(|error| TransportError::Network(Box::new(error)))?;
        Self::read(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Bytes;
    use axum::http::{header, HeaderMap, StatusCode};
    use axum::routing::{delete, get, post};
    use axum::Router;
    use std::net::SocketAddr;

    #[test]
    fn test_success_statuses() {
        let ok = HttpResponse { status: 200, body: Vec::new() };
        let created = HttpResponse { status: 201, body: Vec::new() };
        let redirect = HttpResponse { status: 301, body: Vec::new() };
        let not_found = HttpResponse { status: 404, body: Vec::new() };

        assert!(ok.is_success());
        assert!(created.is_success());
        assert!(!redirect.is_success());
        assert!(!not_found.is_success());
    }

    async fn spawn_echo_app() -> SocketAddr {
        async fn echo(headers: HeaderMap, body: Bytes) -> (StatusCode, Bytes) {
            let content_type = headers.get(header::CONTENT_TYPE).map(|value| value.as_bytes());
            if content_type != Some(b"application/json".as_slice()) {
                return (StatusCode::UNSUPPORTED_MEDIA_TYPE, Bytes::new());
            }
            (StatusCode::CREATED, body)
        }

        let app = Router::new()
            .route("/ping", get(|| async { "pong" }))
            .route("/echo", post(echo))
            .route("/gone", delete(|| async { StatusCode::NO_CONTENT }));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind failed");
        let addr = listener.local_addr().expect("no local addr");
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        addr
    }

    #[tokio::test]
    async fn test_reqwest_transport_round_trips_each_verb() {
        let addr = spawn_echo_app().await;
        let transport = ReqwestTransport::new(Duration::from_secs(5)).expect("client build failed");

        let pinged = transport.get(&format!("http://{addr}/ping")).await.unwrap();
        assert_eq!(pinged.status, 200);
        assert_eq!(pinged.body, b"pong");

        // 201 with the body echoed back proves the JSON content type was set.
        let echoed = transport
            .post(
                &format!("http://{addr}/echo"),
                br#"{"address":"tel:+15551230010"}"#.to_vec(),
            )
            .await
            .unwrap();
        assert_eq!(echoed.status, 201);
        assert_eq!(echoed.body, br#"{"address":"tel:+15551230010"}"#);

        let deleted = transport.delete(&format!("http://{addr}/gone")).await.unwrap();
        assert_eq!(deleted.status, 204);
        assert!(deleted.body.is_empty());
    }

    #[tokio::test]
    async fn test_connection_refused_surfaces_as_network_error() {
        // Bind then drop, so the port is known closed.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let transport = ReqwestTransport::new(Duration::from_secs(1)).unwrap();
        let result = transport.get(&format!("http://{addr}/")).await;
        assert!(matches!(result, Err(TransportError::Network(_))));
    }
}
