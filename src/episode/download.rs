use std::path::Path;

use futures::StreamExt;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{debug, error};

use crate::error::TransferError;
use crate::http::HttpClient;
use crate::progress::SharedProgressSink;

/// Size of one ranged read
pub const CHUNK_SIZE: u64 = 1 << 20;

/// Probe and range statuses accepted as reachable
const ACCEPTABLE_STATUS: std::ops::RangeInclusive<u16> = 200..=302;

/// Download a single resource to `path`, resuming within the attempt.
///
/// The body is pulled in [`CHUNK_SIZE`] ranged reads anchored at the last
/// confirmed offset, so an early-closed connection only costs a re-request
/// instead of the whole attempt. Cancellation is polled before the probe
/// and around every chunk; a cancelled transfer returns `Ok(false)` and
/// leaves the partial file for the next attempt to clean up.
///
/// Transport problems are logged and resolve to `Ok(false)` so the retry
/// layer treats every outcome uniformly; only filesystem failures surface
/// as errors.
pub async fn download_with_resume<C: HttpClient>(
    client: &C,
    url: &str,
    path: &Path,
    sink: &SharedProgressSink,
) -> Result<bool, TransferError> {
    debug!("Downloading {} to {}", url, path.display());

    // Clean remains of any earlier attempt; resume never spans attempts
    match tokio::fs::remove_file(path).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => {
            return Err(TransferError::RemoveFailed {
                path: path.to_path_buf(),
                source: e,
            });
        }
    }

    if sink.is_cancelled() {
        return Ok(false);
    }

    let probe = match client.probe(url).await {
        Ok(probe) => probe,
        Err(e) => {
            error!("Probe of {} failed: {}", url, e);
            return Ok(false);
        }
    };
    if !ACCEPTABLE_STATUS.contains(&probe.status) {
        error!("Failed to reach {}, status is {}", url, probe.status);
        return Ok(false);
    }
    let expected = probe.content_length.filter(|len| *len > 0);

    if sink.is_cancelled() {
        return Ok(false);
    }

    let mut file = File::create(path)
        .await
        .map_err(|e| TransferError::CreateFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    let mut offset: u64 = 0;
    loop {
        if sink.is_cancelled() {
            return Ok(false);
        }

        let response = match client.get_range(url, offset, CHUNK_SIZE).await {
            Ok(response) => response,
            Err(e) => {
                error!("Request for {} at offset {} failed: {}", url, offset, e);
                return Ok(false);
            }
        };
        // Servers answer 416 once the offset has passed the end
        if response.status == 416 {
            break;
        }
        if !ACCEPTABLE_STATUS.contains(&response.status) {
            error!(
                "Failed to read {} at offset {}, status is {}",
                url, offset, response.status
            );
            return Ok(false);
        }

        let mut received: u64 = 0;
        let mut body = response.body;
        while let Some(chunk) = body.next().await {
            let bytes = match chunk {
                Ok(bytes) => bytes,
                Err(e) => {
                    error!("Stream from {} dropped at offset {}: {}", url, offset + received, e);
                    return Ok(false);
                }
            };
            file.write_all(&bytes)
                .await
                .map_err(|e| TransferError::WriteFailed {
                    path: path.to_path_buf(),
                    source: e,
                })?;
            received += bytes.len() as u64;
        }
        offset += received;

        if sink.is_cancelled() {
            return Ok(false);
        }

        if let Some(total) = expected {
            sink.report_progress(100.0 * offset as f64 / total as f64);
            if offset >= total {
                break;
            }
            if received == 0 {
                error!("No data received from {} at offset {}", url, offset);
                return Ok(false);
            }
        } else if received < CHUNK_SIZE {
            // Without a known size, a short chunk is the end-of-stream signal
            break;
        }
    }

    file.flush().await.map_err(|e| TransferError::WriteFailed {
        path: path.to_path_buf(),
        source: e,
    })?;

    sink.report_progress(100.0);
    Ok(true)
}
