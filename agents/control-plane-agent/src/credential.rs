//! Waiting for the control plane token.
//!
//! The token is mounted into the pod by a separate process and may not exist
//! yet when the agent starts. The file is polled until it exists and has
//! content; a missing or empty file is expected and simply retried.

use agent_proxy::Credential;
use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Interval between two reads of the token file
pub const CONTROL_PLANE_TOKEN_CHECK_PERIOD: Duration = Duration::from_secs(3);

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("cannot read control plane token file {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cancelled while waiting for control plane token")]
    Cancelled,
}

/// Blocks until the token file at `path` exists and is non-empty.
///
/// There is no retry limit. The wait ends early only when `cancel` fires.
pub async fn wait_for_control_plane_token(
    path: &Path,
    period: Duration,
    cancel: &CancellationToken,
) -> Result<Credential, CredentialError> {
    info!(
        path = %path.display(),
        check_period = ?period,
        "Waiting for control plane token to be mounted"
    );

    let token = poll_token(|| tokio::fs::read(path), period, cancel)
        .await
        .map_err(|e| match e {
            PollError::Io(source) => CredentialError::Read {
                path: path.to_path_buf(),
                source,
            },
            PollError::Cancelled => CredentialError::Cancelled,
        })?;

    info!("Control plane token has been read");
    Ok(token)
}

#[derive(Debug)]
enum PollError {
    Io(io::Error),
    Cancelled,
}

/// Calls `read` until it yields non-empty content, sleeping `period` between
/// attempts. `NotFound` and empty content are retried; any other error ends
/// the loop on the attempt that produced it.
async fn poll_token<F, Fut>(
    mut read: F,
    period: Duration,
    cancel: &CancellationToken,
) -> Result<Credential, PollError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = io::Result<Vec<u8>>>,
{
    loop {
        if cancel.is_cancelled() {
            return Err(PollError::Cancelled);
        }

        match read().await {
            Ok(contents) if !contents.is_empty() => {
                return Ok(Credential::new(String::from_utf8_lossy(&contents)));
            }
            Ok(_) => debug!("Control plane token file is empty"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("Control plane token file does not exist yet");
            }
            Err(e) => return Err(PollError::Io(e)),
        }

        tokio::select! {
            () = cancel.cancelled() => return Err(PollError::Cancelled),
            () = tokio::time::sleep(period) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const PERIOD: Duration = Duration::from_secs(3);

    /// A reader that reports NotFound for the first `missing` calls, then
    /// empty content for `empty` calls, then `contents`.
    fn scripted_reader(
        calls: Arc<AtomicUsize>,
        missing: usize,
        empty: usize,
        contents: &'static str,
    ) -> impl FnMut() -> std::future::Ready<io::Result<Vec<u8>>> {
        move || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            let result = if n < missing {
                Err(io::Error::from(io::ErrorKind::NotFound))
            } else if n < missing + empty {
                Ok(Vec::new())
            } else {
                Ok(contents.as_bytes().to_vec())
            };
            std::future::ready(result)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_returns_on_first_poll_with_content() {
        let calls = Arc::new(AtomicUsize::new(0));
        let token = poll_token(
            scripted_reader(calls.clone(), 0, 0, "token"),
            PERIOD,
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert_eq!(token.as_str(), "token");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_polls_until_file_appears() {
        let calls = Arc::new(AtomicUsize::new(0));
        let start = tokio::time::Instant::now();

        let token = poll_token(
            scripted_reader(calls.clone(), 4, 0, "token"),
            PERIOD,
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert_eq!(token.as_str(), "token");
        // Four misses plus the successful read, with one sleep after each miss
        assert_eq!(calls.load(Ordering::SeqCst), 5);
        let elapsed = start.elapsed();
        assert!(elapsed >= PERIOD * 4 && elapsed < PERIOD * 5, "elapsed {elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_file_is_retried() {
        let calls = Arc::new(AtomicUsize::new(0));

        let token = poll_token(
            scripted_reader(calls.clone(), 2, 3, "token"),
            PERIOD,
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert_eq!(token.as_str(), "token");
        assert_eq!(calls.load(Ordering::SeqCst), 6);
    }

    #[tokio::test(start_paused = true)]
    async fn test_other_io_errors_fail_without_retry() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        let result = poll_token(
            move || {
                counter.fetch_add(1, Ordering::SeqCst);
                std::future::ready(Err(io::Error::from(io::ErrorKind::PermissionDenied)))
            },
            PERIOD,
            &CancellationToken::new(),
        )
        .await;

        assert!(matches!(
            result,
            Err(PollError::Io(e)) if e.kind() == io::ErrorKind::PermissionDenied
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_stops_waiting() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cancel = CancellationToken::new();

        let canceller = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(PERIOD * 2 + Duration::from_millis(500)).await;
            canceller.cancel();
        });

        let reader = scripted_reader(calls.clone(), usize::MAX, 0, "");
        let result = poll_token(reader, PERIOD, &cancel).await;

        assert!(matches!(result, Err(PollError::Cancelled)));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_reads_token_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token");
        std::fs::write(&path, "header.payload.signature").unwrap();

        let token = wait_for_control_plane_token(&path, PERIOD, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(token.as_str(), "header.payload.signature");
    }

    #[tokio::test]
    async fn test_waits_for_token_file_to_be_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token");

        let writer_path = path.clone();
        let writer = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            // Mounted empty first, then filled in
            tokio::fs::write(&writer_path, "").await.unwrap();
            tokio::time::sleep(Duration::from_millis(50)).await;
            tokio::fs::write(&writer_path, "late-token").await.unwrap();
        });

        let period = Duration::from_millis(10);
        let token = wait_for_control_plane_token(&path, period, &CancellationToken::new())
            .await
            .unwrap();
        writer.await.unwrap();
        assert_eq!(token.as_str(), "late-token");
    }

    #[tokio::test]
    async fn test_directory_path_fails_immediately() {
        let dir = tempfile::tempdir().unwrap();

        let result =
            wait_for_control_plane_token(dir.path(), PERIOD, &CancellationToken::new()).await;
        assert!(matches!(result, Err(CredentialError::Read { .. })));
    }
}
