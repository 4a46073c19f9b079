//! HTTP fetching of raw JSON documents

use crate::types::{NavajaError, Result};
use serde_json::Value;
use std::time::Duration;

const USER_AGENT: &str = concat!("navaja/", env!("CARGO_PKG_VERSION"));

/// Shared HTTP client; every request is bounded by the client timeout
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| NavajaError::Request(format!("HTTP client error: {}", e)))?;
        Ok(Self { client })
    }

    /// GET `url` and parse the body as JSON, whatever its declared content type
    pub async fn fetch_json(&self, url: &str) -> Result<Value> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| NavajaError::Request(format!("{}: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(NavajaError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| NavajaError::Request(format!("{}: {}", url, e)))?;
        parse_body(&body)
    }
}

/// Parse a response body into a JSON tree
pub fn parse_body(body: &[u8]) -> Result<Value> {
    // simd_json parses in place
    let mut buf = body.to_vec();
    simd_json::from_slice(&mut buf).map_err(|e| NavajaError::Parse(e.to_string()))
}
