//! Readiness polling for a freshly launched server.

use crate::client::Client;
use crate::error::{Result, TikaError};
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Interval between two `/version` attempts.
pub const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Poll `/version` until the server answers with a 2xx status.
///
/// Returns as soon as one attempt succeeds. If `timeout` elapses or `cancel`
/// fires first, the returned `TikaError::Startup` carries the most recent
/// attempt failure as its source.
pub async fn wait_for_ready(client: &Client, timeout: Duration, cancel: &CancellationToken) -> Result<()> {
    wait_for_ready_with_interval(client, timeout, POLL_INTERVAL, cancel).await
}

pub(crate) async fn wait_for_ready_with_interval(
    client: &Client,
    timeout: Duration,
    interval: Duration,
    cancel: &CancellationToken,
) -> Result<()> {
    let started = Instant::now();
    let deadline = started + timeout;
    let mut attempts = 0u32;
    let mut last_error: Option<TikaError> = None;

    loop {
        attempts += 1;
        let attempt = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return Err(not_ready(client, "startup cancelled", attempts, started, last_error));
            }
            attempt = tokio::time::timeout_at(deadline, client.version()) => attempt,
        };

        match attempt {
            Ok(Ok(version)) => {
                tracing::info!(
                    url = client.base_url(),
                    version = version.trim(),
                    attempts,
                    "Tika server is ready"
                );
                return Ok(());
            }
            Ok(Err(err)) => {
                tracing::debug!(url = client.base_url(), attempt = attempts, "Readiness attempt failed: {}", err);
                last_error = Some(err);
            }
            Err(_) => {
                // The deadline passed while an attempt was in flight.
                let reason = format!("timed out after {:?}", timeout);
                return Err(not_ready(client, &reason, attempts, started, last_error));
            }
        }

        let now = Instant::now();
        if now >= deadline {
            let reason = format!("timed out after {:?}", timeout);
            return Err(not_ready(client, &reason, attempts, started, last_error));
        }

        let wake = (now + interval).min(deadline);
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return Err(not_ready(client, "startup cancelled", attempts, started, last_error));
            }
            _ = tokio::time::sleep_until(wake) => {}
        }
    }
}

fn not_ready(
    client: &Client,
    reason: &str,
    attempts: u32,
    started: Instant,
    last_error: Option<TikaError>,
) -> TikaError {
    let elapsed = started.elapsed();
    match last_error {
        Some(err) => TikaError::Startup {
            message: format!(
                "server at {} not ready ({}, {} attempt(s) in {:?}): {}",
                client.base_url(),
                reason,
                attempts,
                elapsed,
                err
            ),
            stderr: String::new(),
            source: Some(Box::new(err)),
        },
        None => TikaError::startup(
            format!(
                "server at {} not ready ({}, {} attempt(s) in {:?}): /version did not answer",
                client.base_url(),
                reason,
                attempts,
                elapsed
            ),
            "",
        ),
    }
}
