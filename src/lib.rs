pub mod bulk;
pub mod episode;
pub mod error;
pub mod feed;
pub mod http;
pub mod naming;
pub mod progress;
pub mod retry;

// Re-export main types for convenience
pub use bulk::{BulkDownloader, DownloadConfig, RunSummary};
pub use episode::{
    CHUNK_SIZE, MAX_PATH_LEN, PrefixMode, download_with_resume, fit_to_path_budget,
    generate_filename, safe_title,
};
pub use error::{ConfigError, DownloadError, FeedError, ParsePrefixError, TransferError};
pub use feed::{Classification, Episode, classify, extract_episodes, fetch_document, is_url};
pub use http::{HttpClient, ProbeInfo, RangeResponse, ReqwestClient};
pub use naming::{exclude_params, names_are_unique, path_at_level, unique_names};
pub use progress::{ProgressHandle, ProgressMapping, ProgressSink, SharedProgressSink};
pub use retry::RetryPolicy;
