//! Webhook admin client bound to the server's own MinIO.

use oscar_core::{Config, MinioProvider};
use tracing::info;
use url::Url;

use crate::admin::{AdminApi, HttpAdminApi};
use crate::error::{NotifyError, NotifyResult};
use crate::signing::Credentials;
use crate::webhook::{webhook_key, WebhookEntry};

/// Stages `notify_webhook` entries on a MinIO server.
///
/// Staged changes only take effect after a restart; see
/// [`RestartCoordinator`](crate::RestartCoordinator).
#[derive(Debug)]
pub struct WebhookAdminClient<A> {
    api: A,
    provider_endpoint: Url,
    callback_endpoint: String,
}

impl WebhookAdminClient<HttpAdminApi> {
    /// Connect to `provider`'s admin API.
    ///
    /// The provider must be the MinIO configured for this server, reached
    /// over `http` or `https`. Both checks run before any client is built.
    pub fn connect(provider: &MinioProvider, config: &Config) -> NotifyResult<Self> {
        let tls = check_provider(provider, config)?;

        let credentials = Credentials {
            access_key: provider.access_key.clone(),
            secret_key: provider.secret_key.clone(),
            region: provider.region.clone(),
        };
        let api = HttpAdminApi::new(provider.endpoint.clone(), credentials, tls, provider.verify)
            .map_err(NotifyError::AdminConnect)?;

        Ok(Self::from_parts(api, provider, config))
    }
}

impl<A: AdminApi> WebhookAdminClient<A> {
    /// Wrap an existing transport, applying the same provider checks as
    /// [`WebhookAdminClient::connect`].
    pub fn with_api(api: A, provider: &MinioProvider, config: &Config) -> NotifyResult<Self> {
        check_provider(provider, config)?;
        Ok(Self::from_parts(api, provider, config))
    }

    fn from_parts(api: A, provider: &MinioProvider, config: &Config) -> Self {
        Self {
            api,
            provider_endpoint: provider.endpoint.clone(),
            callback_endpoint: config.callback_endpoint(),
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn provider_endpoint(&self) -> &Url {
        &self.provider_endpoint
    }

    /// Base URL webhooks call back into.
    pub fn callback_endpoint(&self) -> &str {
        &self.callback_endpoint
    }

    /// Stage a webhook for service `name`.
    pub async fn register_webhook(&self, name: &str) -> NotifyResult<()> {
        let entry = WebhookEntry::new(name, &self.callback_endpoint);
        self.api
            .set_config_kv(&entry.config_kv())
            .await
            .map_err(NotifyError::AdminConfig)?;
        info!(service = %name, endpoint = %entry.endpoint(), "webhook staged");
        Ok(())
    }

    /// Stage removal of the webhook for service `name`.
    pub async fn remove_webhook(&self, name: &str) -> NotifyResult<()> {
        self.api
            .del_config_kv(&webhook_key(name))
            .await
            .map_err(NotifyError::AdminConfig)?;
        info!(service = %name, "webhook removal staged");
        Ok(())
    }
}

/// Validate a provider against the server config. Returns whether TLS is
/// required.
fn check_provider(provider: &MinioProvider, config: &Config) -> NotifyResult<bool> {
    if provider.endpoint != config.minio.endpoint {
        return Err(NotifyError::EndpointMismatch {
            provider: provider.endpoint.to_string(),
            configured: config.minio.endpoint.to_string(),
        });
    }

    match provider.endpoint.scheme() {
        "http" => Ok(false),
        "https" => Ok(true),
        _ => Err(NotifyError::UnsupportedScheme(provider.endpoint.to_string())),
    }
}
