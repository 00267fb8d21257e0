//! Tile source: the only stage with network I/O.
//!
//! [`TileSource`] is the seam between the fetch loop and HTTP. The loop only
//! needs a status code and, on 200, the body; everything else (timeouts,
//! refused connections) collapses into a [`TransportError`].
//!
//! [`HttpTileSource`] owns its `reqwest::Client`. The identity header and the
//! per-request timeout are baked into that client when the source is built,
//! so there is no shared session anywhere else in the crate.

use crate::config::FetchConfig;
use crate::error::{Tile2PdfError, TransportError};
use reqwest::StatusCode;
use std::time::Duration;
use tracing::debug;

/// Raw answer to one tile request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body. Only read when `status == 200`; empty otherwise.
    pub body: Vec<u8>,
}

impl TileResponse {
    /// A 200 carrying `body`.
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    /// A body-less answer with `status`.
    pub fn status(status: u16) -> Self {
        Self {
            status,
            body: Vec::new(),
        }
    }
}

/// Something that can answer a GET for a tile URL.
#[allow(async_fn_in_trait)]
pub trait TileSource {
    /// Issue exactly one request for `url`. No retries.
    async fn get(&self, url: &str) -> Result<TileResponse, TransportError>;
}

/// [`TileSource`] backed by a `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpTileSource {
    client: reqwest::Client,
    timeout_secs: u64,
}

impl HttpTileSource {
    /// Build a client carrying the configured `User-Agent` and timeout.
    pub fn new(config: &FetchConfig) -> Result<Self, Tile2PdfError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Tile2PdfError::HttpClient(e.to_string()))?;

        Ok(Self {
            client,
            timeout_secs: config.timeout_secs,
        })
    }

    fn classify_error(&self, e: reqwest::Error) -> TransportError {
        if e.is_timeout() {
            TransportError::Timeout {
                secs: self.timeout_secs,
            }
        } else {
            TransportError::Other(e.to_string())
        }
    }
}

impl TileSource for HttpTileSource {
    async fn get(&self, url: &str) -> Result<TileResponse, TransportError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.classify_error(e))?;

        let status = response.status();
        if status != StatusCode::OK {
            debug!("GET {} → {}", url, status);
            return Ok(TileResponse::status(status.as_u16()));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| self.classify_error(e))?;
        debug!("GET {} → 200, {} bytes", url, bytes.len());

        Ok(TileResponse {
            status: status.as_u16(),
            body: bytes.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_constructors() {
        let ok = TileResponse::ok(vec![1, 2, 3]);
        assert_eq!(ok.status, 200);
        assert_eq!(ok.body.len(), 3);

        let missing = TileResponse::status(404);
        assert_eq!(missing.status, 404);
        assert!(missing.body.is_empty());
    }

    #[test]
    fn http_source_builds_from_default_config() {
        let source = HttpTileSource::new(&FetchConfig::default()).expect("client should build");
        assert_eq!(source.timeout_secs, 30);
    }

    #[tokio::test]
    async fn unreachable_host_is_a_transport_error() {
        let config = FetchConfig::builder().timeout_secs(2).build().unwrap();
        let source = HttpTileSource::new(&config).unwrap();
        // Port 9 on localhost: nothing listens there in a test sandbox.
        let result = source.get("http://127.0.0.1:9/tile.png").await;
        assert!(result.is_err(), "expected transport failure, got {result:?}");
    }
}
