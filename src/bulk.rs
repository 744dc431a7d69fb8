// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::path::PathBuf;

use tracing::{debug, info};

use crate::episode::{MAX_PATH_LEN, PrefixMode, fit_to_path_budget, generate_filename};
use crate::error::{ConfigError, DownloadError, FeedError};
use crate::feed::{Classification, Episode, classify, extract_episodes, fetch_document};
use crate::http::HttpClient;
use crate::progress::{ProgressMapping, SharedProgressSink};
use crate::retry::RetryPolicy;

/// Session configuration owned by the orchestrator.
///
/// Plain data: assigning a field has no side effects. Callers must not
/// mutate it while a run is in progress.
#[derive(Debug, Clone)]
pub struct DownloadConfig {
    /// Feed URL (or local file path) to inspect
    pub url: String,
    /// Destination folder for downloaded files
    pub folder: Option<PathBuf>,
    /// Keep only the N most recent episodes; 0 = unbounded
    pub last_n: usize,
    /// Re-download files that already exist instead of skipping them
    pub overwrite: bool,
    /// Filename decoration ahead of the episode title
    pub prefix: PrefixMode,
}

impl DownloadConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            folder: None,
            last_n: 0,
            overwrite: false,
            prefix: PrefixMode::None,
        }
    }
}

/// Aggregate counters for the end-of-run summary.
///
/// Failed items are the remainder: `total - successful - skipped`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub successful: usize,
    pub skipped: usize,
    pub total: usize,
}

impl RunSummary {
    pub fn failed(&self) -> usize {
        self.total - self.successful - self.skipped
    }
}

/// Drives a whole run: list the feed's episodes, then transfer them one at
/// a time with retry, skip bookkeeping and windowed progress
pub struct BulkDownloader<C> {
    client: C,
    retry: RetryPolicy,
    pub config: DownloadConfig,
}

impl<C: HttpClient> BulkDownloader<C> {
    pub fn new(client: C, config: DownloadConfig) -> Self {
        Self {
            client,
            retry: RetryPolicy::default(),
            config,
        }
    }

    /// Override the per-file retry policy (tests use short delays)
    pub fn with_retry(client: C, config: DownloadConfig, retry: RetryPolicy) -> Self {
        Self {
            client,
            retry,
            config,
        }
    }

    /// Fetch the configured feed and return its episodes in feed order,
    /// trimmed to `last_n` when set.
    ///
    /// Cancellation observed after the fetch or after the parse yields an
    /// empty list, not an error.
    pub async fn list_episodes(
        &self,
        sink: &SharedProgressSink,
    ) -> Result<Vec<Episode>, DownloadError> {
        let bytes = fetch_document(&self.client, &self.config.url)
            .await
            .map_err(DownloadError::Feed)?;
        if sink.is_cancelled() {
            return Ok(Vec::new());
        }

        let channel = match classify(&bytes) {
            Classification::Feed(channel) => channel,
            Classification::Unknown => {
                return Err(FeedError::NotAFeed {
                    url: self.config.url.clone(),
                }
                .into());
            }
        };
        info!("Processing RSS document");

        let mut episodes = extract_episodes(&channel);
        if sink.is_cancelled() {
            return Ok(Vec::new());
        }

        if self.config.last_n > 0 && self.config.last_n < episodes.len() {
            episodes.truncate(self.config.last_n);
        }

        info!("{} episodes found in the feed", episodes.len());
        for episode in &episodes {
            debug!("{} ({})", episode.title, episode.url);
        }

        Ok(episodes)
    }

    /// Download every listed episode into the configured folder.
    ///
    /// Preconditions (folder configured, folder path within the limit,
    /// folder present on disk) are checked before any network activity.
    /// With `dry_run` every step runs except the transfer itself.
    pub async fn download_all(
        &self,
        sink: &SharedProgressSink,
        dry_run: bool,
    ) -> Result<RunSummary, DownloadError> {
        let folder = self.config.folder.clone().ok_or(ConfigError::NoFolder)?;
        let folder_len = folder.to_string_lossy().chars().count();
        if folder_len >= MAX_PATH_LEN {
            return Err(ConfigError::FolderTooLong {
                path: folder,
                len: folder_len,
                limit: MAX_PATH_LEN,
            }
            .into());
        }
        if !folder.exists() {
            std::fs::create_dir_all(&folder).map_err(|e| ConfigError::FolderCreate {
                path: folder.clone(),
                source: e,
            })?;
        }

        let episodes = self.list_episodes(sink).await?;
        let total = episodes.len();
        info!("{} files will be downloaded", total);
        sink.report_progress(0.0);

        let mut summary = RunSummary {
            total,
            ..Default::default()
        };
        if total == 0 {
            info!("0/0 episodes were successfully downloaded (0 skipped)");
            return Ok(summary);
        }

        let step = 100.0 / total as f64;
        let mut cancelled = false;
        for (index, episode) in episodes.iter().enumerate() {
            if sink.is_cancelled() {
                cancelled = true;
                break;
            }
            sink.report_progress(index as f64 * step);

            let name = fit_to_path_budget(&folder, &generate_filename(episode, self.config.prefix));
            let path = folder.join(&name);

            if !self.config.overwrite && path.exists() {
                info!("{} already exists, skipping", path.display());
                summary.skipped += 1;
                continue;
            }

            info!("Saving {} to {} from {}", name, path.display(), episode.url);
            sink.install_mapping(ProgressMapping::window(index as f64 * step, step));
            if !dry_run
                && self
                    .retry
                    .try_download(&self.client, episode.url.as_str(), &path, sink)
                    .await
            {
                summary.successful += 1;
            }
            sink.clear_mapping();
        }

        if cancelled {
            info!(
                "Download cancelled after {} of {} episodes",
                summary.successful + summary.skipped,
                total
            );
        } else {
            sink.report_progress(100.0);
            info!(
                "{}/{} episodes were successfully downloaded ({} skipped)",
                summary.successful, total, summary.skipped
            );
        }

        Ok(summary)
    }
}
