// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::path::Path;

use bytes::Bytes;

use crate::error::FeedError;
use crate::http::HttpClient;

/// Outcome of classifying a fetched document
pub enum Classification {
    /// The document parsed as an RSS feed
    Feed(rss::Channel),
    /// Anything else: malformed XML, HTML pages, non-rss roots
    Unknown,
}

/// Determine if a source string is a URL or a file path
pub fn is_url(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

/// Fetch the raw feed document from a URL or a local file path.
///
/// A single GET carrying the identifying client header; any non-200 status
/// is an error because there is nothing useful to retry without user
/// intervention.
pub async fn fetch_document<C: HttpClient>(client: &C, source: &str) -> Result<Bytes, FeedError> {
    if !is_url(source) {
        return read_document_file(Path::new(source));
    }

    let (status, bytes) = client
        .get_bytes(source)
        .await
        .map_err(|e| FeedError::Connection {
            url: source.to_string(),
            source: e,
        })?;

    if status != 200 {
        return Err(FeedError::Status {
            url: source.to_string(),
            status,
        });
    }

    Ok(bytes)
}

/// Read raw document bytes from a local file
pub fn read_document_file(path: &Path) -> Result<Bytes, FeedError> {
    std::fs::read(path)
        .map(Bytes::from)
        .map_err(|e| FeedError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })
}

/// Classify a fetched document.
///
/// A document counts as a feed when it parses as RSS (root element `rss`);
/// malformed XML is `Unknown`, never a propagated parse error.
pub fn classify(bytes: &[u8]) -> Classification {
    match rss::Channel::read_from(bytes) {
        Ok(channel) => Classification::Feed(channel),
        Err(_) => Classification::Unknown,
    }
}
