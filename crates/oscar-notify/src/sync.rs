//! Keeps MinIO webhooks in step with the services that use them.
//!
//! A MinIO restart applies everything staged on the server, so two
//! services staging and restarting against the same MinIO at once can
//! apply each other's half-finished edits. The synchronizer holds a lock
//! per MinIO endpoint across the whole stage + restart sequence.
//! Different endpoints proceed independently.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info};
use url::Url;

use crate::admin::AdminApi;
use crate::client::WebhookAdminClient;
use crate::error::NotifyResult;
use crate::restart::{within, RestartCoordinator, RestartPolicy};

/// A single webhook edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookChange {
    Register(String),
    Remove(String),
}

pub struct WebhookSynchronizer {
    restart: RestartCoordinator,
    /// Endpoint URL → lock serializing stage + restart on that endpoint.
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl WebhookSynchronizer {
    pub fn new(policy: RestartPolicy) -> Self {
        Self {
            restart: RestartCoordinator::new(policy),
            locks: Mutex::new(HashMap::new()),
        }
    }

    async fn endpoint_lock(&self, endpoint: &Url) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks.entry(endpoint.to_string()).or_default().clone()
    }

    /// Stage `changes` in order, then restart MinIO once to apply them.
    ///
    /// Stops at the first failed change; earlier changes stay staged and
    /// are not applied. The deadline covers waiting for the endpoint lock,
    /// staging and the restart.
    pub async fn apply<A: AdminApi>(
        &self,
        client: &WebhookAdminClient<A>,
        changes: &[WebhookChange],
        deadline: Option<Instant>,
    ) -> NotifyResult<()> {
        let endpoint = client.provider_endpoint();
        let lock = self.endpoint_lock(endpoint).await;
        let _guard = within(deadline, lock.lock_owned()).await?;
        debug!(%endpoint, changes = changes.len(), "acquired minio endpoint lock");

        within(deadline, stage(client, changes)).await??;

        self.restart.apply_changes(client.api(), deadline).await?;
        info!(%endpoint, changes = changes.len(), "webhook changes applied");
        Ok(())
    }

    pub async fn service_created<A: AdminApi>(
        &self,
        client: &WebhookAdminClient<A>,
        name: &str,
        deadline: Option<Instant>,
    ) -> NotifyResult<()> {
        self.apply(client, &[WebhookChange::Register(name.to_string())], deadline)
            .await
    }

    pub async fn service_deleted<A: AdminApi>(
        &self,
        client: &WebhookAdminClient<A>,
        name: &str,
        deadline: Option<Instant>,
    ) -> NotifyResult<()> {
        self.apply(client, &[WebhookChange::Remove(name.to_string())], deadline)
            .await
    }

    /// Move the webhook from `old` to `new` with a single restart.
    pub async fn service_renamed<A: AdminApi>(
        &self,
        client: &WebhookAdminClient<A>,
        old: &str,
        new: &str,
        deadline: Option<Instant>,
    ) -> NotifyResult<()> {
        let changes = [
            WebhookChange::Remove(old.to_string()),
            WebhookChange::Register(new.to_string()),
        ];
        self.apply(client, &changes, deadline).await
    }
}

async fn stage<A: AdminApi>(
    client: &WebhookAdminClient<A>,
    changes: &[WebhookChange],
) -> NotifyResult<()> {
    for change in changes {
        match change {
            WebhookChange::Register(name) => client.register_webhook(name).await?,
            WebhookChange::Remove(name) => client.remove_webhook(name).await?,
        }
    }
    Ok(())
}

impl Default for WebhookSynchronizer {
    fn default() -> Self {
        Self::new(RestartPolicy::default())
    }
}
