// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use std::pin::Pin;

/// A streaming response body
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, reqwest::Error>> + Send>>;

/// Result of a metadata probe (HEAD-equivalent) against a download URL
#[derive(Debug, Clone, Copy)]
pub struct ProbeInfo {
    /// HTTP status code after redirects
    pub status: u16,
    /// Content-Length header value, if present
    pub content_length: Option<u64>,
}

/// Response to a ranged GET request
pub struct RangeResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body as a stream of bytes
    pub body: ByteStream,
}

/// HTTP client abstraction for testability
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Fetch the entire response body as bytes, along with the status code
    async fn get_bytes(&self, url: &str) -> Result<(u16, Bytes), reqwest::Error>;

    /// Probe a URL for status and expected size without fetching the body.
    /// Redirects are followed.
    async fn probe(&self, url: &str) -> Result<ProbeInfo, reqwest::Error>;

    /// Request at most `len` bytes starting at `offset` via a Range header
    async fn get_range(&self, url: &str, offset: u64, len: u64)
    -> Result<RangeResponse, reqwest::Error>;
}

/// Default HTTP client implementation using reqwest.
///
/// Every request carries an identifying User-Agent so feed hosts can tell
/// the tool apart from browser traffic.
#[derive(Clone)]
pub struct ReqwestClient {
    client: reqwest::Client,
}

fn default_user_agent() -> String {
    format!("podbulk/{}", env!("CARGO_PKG_VERSION"))
}

impl ReqwestClient {
    /// Create a new ReqwestClient with default settings
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .user_agent(default_user_agent())
            .build()
            .unwrap_or_default();
        Self { client }
    }

    /// Create a new ReqwestClient with a custom reqwest::Client
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Default for ReqwestClient {
    fn default() -> Self {
        Self::new()
    }
}

fn header_content_length(response: &reqwest::Response) -> Option<u64> {
    response
        .headers()
        .get(reqwest::header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse().ok())
}

#[async_trait]
impl HttpClient for ReqwestClient {
    async fn get_bytes(&self, url: &str) -> Result<(u16, Bytes), reqwest::Error> {
        let response = self.client.get(url).send().await?;
        let status = response.status().as_u16();
        let bytes = response.bytes().await?;
        Ok((status, bytes))
    }

    async fn probe(&self, url: &str) -> Result<ProbeInfo, reqwest::Error> {
        let response = self.client.head(url).send().await?;
        Ok(ProbeInfo {
            status: response.status().as_u16(),
            content_length: header_content_length(&response),
        })
    }

    async fn get_range(
        &self,
        url: &str,
        offset: u64,
        len: u64,
    ) -> Result<RangeResponse, reqwest::Error> {
        let range = format!("bytes={}-{}", offset, offset + len - 1);
        let response = self
            .client
            .get(url)
            .header(reqwest::header::RANGE, range)
            .send()
            .await?;
        let status = response.status().as_u16();

        let body: ByteStream = Box::pin(response.bytes_stream());

        Ok(RangeResponse { status, body })
    }
}
