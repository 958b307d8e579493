//! Transport boundary for all provider HTTP I/O.
//!
//! Listing search APIs are query-parameter GET endpoints, so the boundary
//! is a single `get` with headers. Concrete clients decode JSON bodies
//! themselves; tests register canned responses on the mock transport.

use async_trait::async_trait;
use thiserror::Error;

/// Header key/value pairs sent with a request.
pub type Headers = Vec<(String, String)>;

/// A response from the provider boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub body: Vec<u8>,
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("no mock response registered for {url}")]
    NoMockResponse { url: String },
}

/// Transport seam between provider clients and the network.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str, headers: &Headers) -> Result<Response, TransportError>;
}

#[cfg(feature = "homescope")]
pub mod reqwest_transport {
    use super::*;

    use std::time::Duration;

    /// A real transport backed by reqwest.
    #[derive(Clone)]
    pub struct ReqwestTransport {
        client: reqwest::Client,
    }

    impl ReqwestTransport {
        pub fn new(client: reqwest::Client) -> Self {
            Self { client }
        }

        pub fn with_timeout(timeout: Duration) -> Result<Self, TransportError> {
            let client = reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .map_err(|e| TransportError::Transport(e.to_string()))?;
            Ok(Self { client })
        }
    }

    #[async_trait]
    impl Transport for ReqwestTransport {
        async fn get(&self, url: &str, headers: &Headers) -> Result<Response, TransportError> {
            let mut builder = self.client.get(url);
            for (k, v) in headers {
                builder = builder.header(k, v);
            }

            let resp = builder.send().await.map_err(|e| {
                if e.is_timeout() {
                    TransportError::Timeout
                } else {
                    TransportError::Transport(e.to_string())
                }
            })?;

            let status = resp.status().as_u16();
            let body = resp
                .bytes()
                .await
                .map_err(|e| TransportError::Transport(e.to_string()))?
                .to_vec();

            Ok(Response { status, body })
        }
    }
}

// ---------- Test-only mock transport ----------
