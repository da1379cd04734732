//! Restart coordination for staged MinIO configuration.
//!
//! MinIO only loads notification targets at startup, so every staged
//! change needs a restart. The server may take up to
//! [`PROVIDER_SHUTDOWN_BOUND`] to drain and come back; the coordinator
//! waits a grace period longer than that before probing it.
//!
//! With the default policy this is a single probe after the grace period.
//! Raising `max_attempts` retries the probe with exponential backoff.

use std::future::Future;
use std::time::Duration;

use oscar_core::config::RestartConfig;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::admin::AdminApi;
use crate::error::{NotifyError, NotifyResult};

/// Longest a MinIO server takes to shut down when asked to restart.
pub const PROVIDER_SHUTDOWN_BOUND: Duration = Duration::from_secs(5);

/// How to wait for MinIO after a restart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestartPolicy {
    /// Wait before the first probe.
    pub grace: Duration,
    /// Probes before giving up. Values below 1 are treated as 1.
    pub max_attempts: u32,
    /// Wait before the second probe; doubles after each failure.
    pub backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RestartPolicy {
    fn default() -> Self {
        Self {
            grace: PROVIDER_SHUTDOWN_BOUND + Duration::from_secs(1),
            max_attempts: 1,
            backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(30),
        }
    }
}

impl RestartPolicy {
    pub fn from_config(config: &RestartConfig) -> Self {
        Self {
            grace: Duration::from_secs(config.grace_secs),
            max_attempts: config.max_attempts,
            backoff: Duration::from_secs(config.backoff_secs),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RestartCoordinator {
    policy: RestartPolicy,
}

impl RestartCoordinator {
    pub fn new(policy: RestartPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &RestartPolicy {
        &self.policy
    }

    /// Restart MinIO and wait until it answers again.
    ///
    /// Applies every staged change on the server, not only the caller's.
    /// If `deadline` passes first the wait is abandoned with
    /// [`NotifyError::Cancelled`]; the restart itself may already be in
    /// flight.
    pub async fn apply_changes<A>(&self, api: &A, deadline: Option<Instant>) -> NotifyResult<()>
    where
        A: AdminApi + ?Sized,
    {
        within(deadline, self.restart_and_probe(api)).await?
    }

    async fn restart_and_probe<A>(&self, api: &A) -> NotifyResult<()>
    where
        A: AdminApi + ?Sized,
    {
        api.service_restart()
            .await
            .map_err(NotifyError::AdminConfig)?;
        debug!(grace = ?self.policy.grace, "restart requested, waiting for minio");
        tokio::time::sleep(self.policy.grace).await;

        let attempts = self.policy.max_attempts.max(1);
        let mut backoff = self.policy.backoff;
        let mut attempt = 1;
        loop {
            match api.server_info().await {
                Ok(()) => {
                    info!(attempt, "minio back online, staged configuration applied");
                    return Ok(());
                }
                Err(e) if attempt >= attempts => {
                    warn!(error = %e, attempt, "minio did not come back after restart");
                    return Err(NotifyError::RestartTimeout(e));
                }
                Err(e) => {
                    warn!(error = %e, attempt, next = ?backoff, "minio not ready yet");
                    tokio::time::sleep(backoff).await;
                    backoff = (backoff * 2).min(self.policy.max_backoff);
                    attempt += 1;
                }
            }
        }
    }
}

/// Run `fut` to completion, or fail with [`NotifyError::Cancelled`] once
/// `deadline` passes.
pub(crate) async fn within<F: Future>(
    deadline: Option<Instant>,
    fut: F,
) -> NotifyResult<F::Output> {
    match deadline {
        Some(deadline) => tokio::time::timeout_at(deadline, fut)
            .await
            .map_err(|_| NotifyError::Cancelled),
        None => Ok(fut.await),
    }
}
