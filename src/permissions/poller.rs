//! Grant status poller
//!
//! Waits for a human decision on one grant by polling the authority at a
//! fixed interval until the grant reaches a terminal status or the deadline
//! passes.
//!
//! Transport errors during the wait are treated like "still pending": a
//! network blip must not abort a human-approval wait. Only the deadline is
//! reported.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;

use super::authority::fetch_grant;
use super::types::GrantStatus;
use crate::transport::RequestExecutor;

/// Default delay between status checks
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(800);
/// Default overall wait
pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(45);
/// Shortest wait the poller will honor
pub const MIN_WAIT_TIMEOUT: Duration = Duration::from_secs(1);

/// How a wait ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    Approved,
    Denied,
    Used,
    /// No terminal status before the deadline
    Timeout,
    /// Called with an empty grant id
    Invalid,
    /// The caller's cancellation token fired
    Cancelled,
}

impl WaitOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            WaitOutcome::Approved => "approved",
            WaitOutcome::Denied => "denied",
            WaitOutcome::Used => "used",
            WaitOutcome::Timeout => "timeout",
            WaitOutcome::Invalid => "invalid",
            WaitOutcome::Cancelled => "cancelled",
        }
    }

    pub fn is_approved(&self) -> bool {
        *self == WaitOutcome::Approved
    }

    fn from_terminal(status: GrantStatus) -> Option<Self> {
        if !status.is_remote_terminal() {
            return None;
        }
        match status {
            GrantStatus::Approved => Some(WaitOutcome::Approved),
            GrantStatus::Denied => Some(WaitOutcome::Denied),
            _ => Some(WaitOutcome::Used),
        }
    }
}

impl std::fmt::Display for WaitOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Polls the authority for a grant's status
pub struct PermissionPoller {
    executor: Arc<RequestExecutor>,
    interval: Duration,
}

impl PermissionPoller {
    /// Create a poller with the default interval
    pub fn new(executor: Arc<RequestExecutor>) -> Self {
        Self {
            executor,
            interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Set the delay between status checks
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Wait until the grant is approved, denied or used, or `timeout` passes.
    ///
    /// The timeout is floored at [`MIN_WAIT_TIMEOUT`]. The first check runs
    /// immediately. Dropping the future abandons the wait.
    pub async fn wait(&self, id: &str, timeout: Duration) -> WaitOutcome {
        self.wait_inner(id, timeout, None).await
    }

    /// Like [`wait`](Self::wait), but ends early with
    /// [`WaitOutcome::Cancelled`] when `cancel` fires.
    pub async fn wait_cancellable(
        &self,
        id: &str,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> WaitOutcome {
        self.wait_inner(id, timeout, Some(cancel)).await
    }

    async fn wait_inner(
        &self,
        id: &str,
        timeout: Duration,
        cancel: Option<&CancellationToken>,
    ) -> WaitOutcome {
        let id = id.trim();
        if id.is_empty() {
            return WaitOutcome::Invalid;
        }

        let deadline = Instant::now() + timeout.max(MIN_WAIT_TIMEOUT);
        tracing::info!("Waiting for decision on grant {}", id);

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }

            let check = fetch_grant(&self.executor, id, Some(remaining));
            let record = match cancel {
                Some(token) => tokio::select! {
                    _ = token.cancelled() => return self.cancelled(id),
                    record = check => record,
                },
                None => check.await,
            };

            match record.as_ref().and_then(|r| r.grant_status()) {
                Some(status) => {
                    if let Some(outcome) = WaitOutcome::from_terminal(status) {
                        tracing::info!("Grant {} resolved: {}", id, outcome);
                        return outcome;
                    }
                    tracing::debug!("Grant {} still {}", id, status);
                }
                None => tracing::debug!("Grant {} status unavailable, retrying", id),
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            let pause = self.interval.min(remaining);
            match cancel {
                Some(token) => tokio::select! {
                    _ = token.cancelled() => return self.cancelled(id),
                    _ = sleep(pause) => {}
                },
                None => sleep(pause).await,
            }
        }

        tracing::warn!("Timed out waiting for grant {}", id);
        WaitOutcome::Timeout
    }

    fn cancelled(&self, id: &str) -> WaitOutcome {
        tracing::info!("Wait for grant {} cancelled", id);
        WaitOutcome::Cancelled
    }
}
