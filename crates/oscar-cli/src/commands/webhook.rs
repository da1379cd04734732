use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use oscar_core::{Config, MinioProvider, Service, StorageProviders};
use oscar_notify::{RestartPolicy, WebhookAdminClient, WebhookSynchronizer};
use tokio::time::Instant;
use tracing::debug;

use super::load_service;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    Register,
    Remove,
}

pub async fn webhook(
    change: Change,
    fdl: &Path,
    config_path: &Path,
    timeout_secs: Option<u64>,
) -> anyhow::Result<()> {
    let service = load_service(fdl)?;
    let config = load_config(config_path, |key| std::env::var(key).ok())?;
    let provider = minio_provider(&service, &config);
    debug!(service = %service.name, endpoint = %provider.endpoint, "using minio provider");

    let client = WebhookAdminClient::connect(&provider, &config)?;
    let sync = WebhookSynchronizer::new(RestartPolicy::from_config(&config.restart));
    let deadline = timeout_secs.map(|secs| Instant::now() + Duration::from_secs(secs));

    match change {
        Change::Register => {
            sync.service_created(&client, &service.name, deadline).await?;
            println!("✓ Registered webhook for {} on {}", service.name, provider.endpoint);
        }
        Change::Remove => {
            sync.service_deleted(&client, &service.name, deadline).await?;
            println!("✓ Removed webhook for {} from {}", service.name, provider.endpoint);
        }
    }
    Ok(())
}

fn load_config<F>(path: &Path, lookup: F) -> anyhow::Result<Config>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = Config::from_file(path)
        .with_context(|| format!("loading server config {}", path.display()))?;
    config.apply_env(lookup)?;
    Ok(config)
}

/// The service's default MinIO provider, or the server's own MinIO when
/// the service does not declare one.
fn minio_provider(service: &Service, config: &Config) -> MinioProvider {
    service
        .storage_providers
        .as_ref()
        .and_then(StorageProviders::default_minio)
        .cloned()
        .unwrap_or_else(|| config.minio.provider())
}
