use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur before any network activity, while validating the
/// download configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("No folder is defined for the download")]
    NoFolder,

    #[error("Destination folder path is too long ({len} characters, limit {limit}): {path}")]
    FolderTooLong {
        path: PathBuf,
        len: usize,
        limit: usize,
    },

    #[error("Failed to create destination folder {path}: {source}")]
    FolderCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Rejected textual prefix-mode value; parsing never falls back to a default
#[derive(Error, Debug)]
#[error("Unknown prefix mode '{0}' (expected NONE, DATE or DATE_TIME)")]
pub struct ParsePrefixError(pub String);

/// Errors that can occur when fetching or interpreting the feed document
#[derive(Error, Debug)]
pub enum FeedError {
    #[error("Failed to connect to URL {url}: {source}")]
    Connection {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to access URL {url} (code {status})")]
    Status { url: String, status: u16 },

    #[error("Failed to read feed file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Content of {url} is not a feed")]
    NotAFeed { url: String },
}

/// Filesystem failures inside a single transfer attempt.
///
/// Transport-level problems never surface here; they resolve to a boolean
/// at the transfer layer so the retry loop treats every outcome uniformly.
#[derive(Error, Debug)]
pub enum TransferError {
    #[error("Failed to remove stale file {path}: {source}")]
    RemoveFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to create file {path}: {source}")]
    CreateFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write to file {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Top-level errors for the bulk download entry points
#[derive(Error, Debug)]
pub enum DownloadError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Feed(#[from] FeedError),
}
