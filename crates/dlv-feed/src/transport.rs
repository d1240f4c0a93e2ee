//! Transport seam.
//!
//! The repositories only need "GET a URL as JSON" and "POST JSON, get JSON
//! back". [`HttpTransport`] is the production implementation; tests plug in
//! scripted transports.

use std::fmt;
use std::time::Duration;

use serde_json::Value;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Connection, DNS, TLS or timeout failure.
    Network(String),
    /// Upstream answered with a non-2xx status.
    Status { code: u16, url: String },
    /// Body was not valid JSON.
    Decode(String),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Network(msg) => write!(f, "transport error: {msg}"),
            TransportError::Status { code, url } => {
                write!(f, "http error status={code} url={url}")
            }
            TransportError::Decode(msg) => write!(f, "decode error: {msg}"),
        }
    }
}

impl std::error::Error for TransportError {}

// ---------------------------------------------------------------------------
// Transport trait
// ---------------------------------------------------------------------------

/// JSON-over-HTTP client contract.
///
/// Object safe so owners can hold an `Arc<dyn Transport>`.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str) -> Result<Value, TransportError>;

    async fn post(&self, url: &str, body: &Value) -> Result<Value, TransportError>;
}

// ---------------------------------------------------------------------------
// reqwest implementation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
}

impl HttpTransport {
    /// Client with a per-request timeout.
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Network(format!("client build failed: {e}")))?;
        Ok(Self { http })
    }

    async fn decode(resp: reqwest::Response, url: &str) -> Result<Value, TransportError> {
        let status = resp.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                code: status.as_u16(),
                url: url.to_string(),
            });
        }
        resp.json::<Value>()
            .await
            .map_err(|e| TransportError::Decode(e.to_string()))
    }
}

#[async_trait::async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str) -> Result<Value, TransportError> {
        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;
        Self::decode(resp, url).await
    }

    async fn post(&self, url: &str, body: &Value) -> Result<Value, TransportError> {
        let resp = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;
        Self::decode(resp, url).await
    }
}
