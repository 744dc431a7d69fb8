use std::path::Path;
use std::time::Duration;

use tracing::{debug, error, warn};

use crate::episode::download_with_resume;
use crate::http::HttpClient;
use crate::progress::SharedProgressSink;

/// Bounded retry with a fixed pause between attempts.
///
/// Cancellation is polled before every attempt and again right after a
/// failed one, so a cancel requested during the pause is honored within one
/// `delay` at worst.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// Attempt a transfer up to `max_attempts` times.
    ///
    /// A filesystem error inside one attempt is logged and consumes that
    /// attempt instead of aborting the loop; cancellation is never retried.
    /// Returns `false` once every attempt is spent.
    pub async fn try_download<C: HttpClient>(
        &self,
        client: &C,
        url: &str,
        path: &Path,
        sink: &SharedProgressSink,
    ) -> bool {
        for attempt in 1..=self.max_attempts {
            if sink.is_cancelled() {
                return false;
            }

            match download_with_resume(client, url, path, sink).await {
                Ok(true) => return true,
                Ok(false) => {
                    if sink.is_cancelled() {
                        return false;
                    }
                    debug!("Attempt {}/{} for {} failed", attempt, self.max_attempts, url);
                }
                Err(e) => {
                    warn!(
                        "Attempt {}/{} for {} errored: {}",
                        attempt, self.max_attempts, url, e
                    );
                }
            }

            if attempt < self.max_attempts {
                tokio::time::sleep(self.delay).await;
            }
        }

        error!("Download of {} failed after {} tries", url, self.max_attempts);
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{ProbeInfo, RangeResponse};
    use crate::progress::{ProgressHandle, SharedProgressSink};
    use async_trait::async_trait;
    use bytes::Bytes;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::tempdir;

    /// Always unreachable: every probe reports a server error
    struct BrokenServer {
        probe_calls: AtomicUsize,
    }

    #[async_trait]
    impl HttpClient for BrokenServer {
        async fn get_bytes(&self, _url: &str) -> Result<(u16, Bytes), reqwest::Error> {
            Ok((500, Bytes::new()))
        }

        async fn probe(&self, _url: &str) -> Result<ProbeInfo, reqwest::Error> {
            self.probe_calls.fetch_add(1, Ordering::SeqCst);
            Ok(ProbeInfo {
                status: 500,
                content_length: None,
            })
        }

        async fn get_range(
            &self,
            _url: &str,
            _offset: u64,
            _len: u64,
        ) -> Result<RangeResponse, reqwest::Error> {
            Ok(RangeResponse {
                status: 500,
                body: Box::pin(futures::stream::empty()),
            })
        }
    }

    /// Healthy server delivering a fixed body
    struct WorkingServer {
        data: Vec<u8>,
    }

    #[async_trait]
    impl HttpClient for WorkingServer {
        async fn get_bytes(&self, _url: &str) -> Result<(u16, Bytes), reqwest::Error> {
            Ok((200, Bytes::from(self.data.clone())))
        }

        async fn probe(&self, _url: &str) -> Result<ProbeInfo, reqwest::Error> {
            Ok(ProbeInfo {
                status: 200,
                content_length: Some(self.data.len() as u64),
            })
        }

        async fn get_range(
            &self,
            _url: &str,
            offset: u64,
            len: u64,
        ) -> Result<RangeResponse, reqwest::Error> {
            let start = (offset as usize).min(self.data.len());
            let end = (start + len as usize).min(self.data.len());
            let slice = self.data[start..end].to_vec();
            Ok(RangeResponse {
                status: 206,
                body: Box::pin(futures::stream::once(async move { Ok(Bytes::from(slice)) })),
            })
        }
    }

    fn quick_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            delay: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn first_attempt_success_needs_no_retry() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("file.mp3");
        let client = WorkingServer {
            data: b"audio".to_vec(),
        };
        let sink: SharedProgressSink = ProgressHandle::shared();

        let ok = quick_policy(3)
            .try_download(&client, "https://example.com/file.mp3", &path, &sink)
            .await;

        assert!(ok);
        assert_eq!(std::fs::read(&path).unwrap(), b"audio");
    }

    #[tokio::test]
    async fn exhausts_exactly_max_attempts_then_gives_up() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("file.mp3");
        let client = BrokenServer {
            probe_calls: AtomicUsize::new(0),
        };
        let sink: SharedProgressSink = ProgressHandle::shared();

        let ok = quick_policy(3)
            .try_download(&client, "https://example.com/file.mp3", &path, &sink)
            .await;

        assert!(!ok);
        assert_eq!(client.probe_calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn single_attempt_policy_is_respected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("file.mp3");
        let client = BrokenServer {
            probe_calls: AtomicUsize::new(0),
        };
        let sink: SharedProgressSink = ProgressHandle::shared();

        let ok = quick_policy(1)
            .try_download(&client, "https://example.com/file.mp3", &path, &sink)
            .await;

        assert!(!ok);
        assert_eq!(client.probe_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn cancellation_is_not_retried() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("file.mp3");
        let client = BrokenServer {
            probe_calls: AtomicUsize::new(0),
        };
        let handle = ProgressHandle::shared();
        handle.cancel();
        let sink: SharedProgressSink = handle;

        let ok = quick_policy(3)
            .try_download(&client, "https://example.com/file.mp3", &path, &sink)
            .await;

        assert!(!ok);
        assert_eq!(client.probe_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn default_policy_matches_documented_constants() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.delay, Duration::from_secs(5));
    }
}
