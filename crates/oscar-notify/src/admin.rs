//! Transport to a MinIO server's admin API.
//!
//! [`AdminApi`] is the seam between webhook logic and the wire: the
//! production [`HttpAdminApi`] speaks the admin REST API, tests substitute
//! an in-memory double.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Method;
use tracing::debug;
use url::Url;

use crate::error::AdminApiError;
use crate::payload::encrypt_data;
use crate::signing::{sign, Credentials};

const ADMIN_PREFIX: &str = "/minio/admin/v3";

/// Upper bound on a single admin request, including reading the response.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Admin operations needed to manage notification webhooks.
#[async_trait]
pub trait AdminApi: Send + Sync {
    /// Stage a `<subsystem>:<target> <key>=<value>` configuration line.
    async fn set_config_kv(&self, kv: &str) -> Result<(), AdminApiError>;

    /// Stage deletion of a `<subsystem>:<target>` configuration entry.
    async fn del_config_kv(&self, key: &str) -> Result<(), AdminApiError>;

    /// Ask the server to restart. Returns once the request is accepted.
    async fn service_restart(&self) -> Result<(), AdminApiError>;

    /// Fetch server info; succeeds only if the server is online.
    async fn server_info(&self) -> Result<(), AdminApiError>;
}

/// [`AdminApi`] over HTTP(S) with signed requests.
#[derive(Debug, Clone)]
pub struct HttpAdminApi {
    http: reqwest::Client,
    endpoint: Url,
    credentials: Credentials,
}

impl HttpAdminApi {
    /// Build a client for `endpoint`.
    ///
    /// With `tls` the client only talks HTTPS. `verify = false` accepts
    /// any server certificate. Each request is bounded by
    /// [`REQUEST_TIMEOUT`].
    pub fn new(
        endpoint: Url,
        credentials: Credentials,
        tls: bool,
        verify: bool,
    ) -> Result<Self, AdminApiError> {
        let http = reqwest::Client::builder()
            .https_only(tls)
            .danger_accept_invalid_certs(!verify)
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            endpoint,
            credentials,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Seal a config body with the secret key. Key derivation is memory
    /// hard, so it runs on the blocking pool.
    async fn encrypt_body(&self, body: &str) -> Result<Vec<u8>, AdminApiError> {
        let secret = self.credentials.secret_key.clone();
        let body = body.as_bytes().to_vec();
        tokio::task::spawn_blocking(move || encrypt_data(&secret, &body))
            .await
            .map_err(|e| AdminApiError::Encryption(e.to_string()))?
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        query: Option<(&str, &str)>,
        body: Vec<u8>,
    ) -> Result<(), AdminApiError> {
        let mut url = self.endpoint.join(&format!("{ADMIN_PREFIX}/{path}"))?;
        if let Some((key, value)) = query {
            url.query_pairs_mut().append_pair(key, value);
        }

        let signature = sign(
            &self.credentials,
            method.as_str(),
            &url,
            &body,
            chrono::Utc::now(),
        );

        debug!(%method, %url, "minio admin request");
        let response = self
            .http
            .request(method, url)
            .header("x-amz-date", signature.amz_date)
            .header("x-amz-content-sha256", signature.content_sha256)
            .header(reqwest::header::AUTHORIZATION, signature.authorization)
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                debug!(error = %e, %status, "could not read admin error body");
                format!("<unreadable response body: {e}>")
            }
        };
        Err(AdminApiError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl AdminApi for HttpAdminApi {
    async fn set_config_kv(&self, kv: &str) -> Result<(), AdminApiError> {
        let body = self.encrypt_body(kv).await?;
        self.send(Method::PUT, "set-config-kv", None, body).await
    }

    async fn del_config_kv(&self, key: &str) -> Result<(), AdminApiError> {
        let body = self.encrypt_body(key).await?;
        self.send(Method::DELETE, "del-config-kv", None, body).await
    }

    async fn service_restart(&self) -> Result<(), AdminApiError> {
        self.send(Method::POST, "service", Some(("action", "restart")), Vec::new())
            .await
    }

    async fn server_info(&self) -> Result<(), AdminApiError> {
        self.send(Method::GET, "info", None, Vec::new()).await
    }
}

