//! OSCAR server configuration (`oscar.toml` plus environment overrides).

use std::fmt;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::storage::{default_region, default_verify, MinioProvider, REDACTED};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Name of the OSCAR cluster service.
    #[serde(default = "default_name")]
    pub name: String,
    /// Namespace the OSCAR service runs in.
    #[serde(default = "default_namespace")]
    pub namespace: String,
    #[serde(default = "default_service_port")]
    pub service_port: u16,
    pub minio: MinioConfig,
    #[serde(default)]
    pub restart: RestartConfig,
}

/// The MinIO server deployed alongside OSCAR.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct MinioConfig {
    pub endpoint: Url,
    pub access_key: String,
    pub secret_key: String,
    #[serde(default = "default_region")]
    pub region: String,
    #[serde(default = "default_verify")]
    pub verify: bool,
}

/// Timing of the MinIO restart that applies staged configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestartConfig {
    #[serde(default = "default_grace_secs")]
    pub grace_secs: u64,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_backoff_secs")]
    pub backoff_secs: u64,
}

impl Default for RestartConfig {
    fn default() -> Self {
        Self {
            grace_secs: default_grace_secs(),
            max_attempts: default_max_attempts(),
            backoff_secs: default_backoff_secs(),
        }
    }
}

fn default_name() -> String {
    "oscar".to_string()
}

fn default_namespace() -> String {
    "oscar".to_string()
}

fn default_service_port() -> u16 {
    8080
}

fn default_grace_secs() -> u64 {
    6
}

fn default_max_attempts() -> u32 {
    1
}

fn default_backoff_secs() -> u64 {
    1
}

impl Config {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Override fields from environment variables.
    ///
    /// `lookup` is usually `|key| std::env::var(key).ok()`.
    pub fn apply_env<F>(&mut self, lookup: F) -> anyhow::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(name) = lookup("OSCAR_NAME") {
            self.name = name;
        }
        if let Some(namespace) = lookup("OSCAR_NAMESPACE") {
            self.namespace = namespace;
        }
        if let Some(port) = lookup("OSCAR_SERVICE_PORT") {
            self.service_port = port
                .parse()
                .with_context(|| format!("OSCAR_SERVICE_PORT={port:?} is not a port"))?;
        }
        if let Some(endpoint) = lookup("MINIO_ENDPOINT") {
            self.minio.endpoint = Url::parse(&endpoint)
                .with_context(|| format!("MINIO_ENDPOINT={endpoint:?} is not a URL"))?;
        }
        if let Some(access_key) = lookup("MINIO_ACCESS_KEY") {
            self.minio.access_key = access_key;
        }
        if let Some(secret_key) = lookup("MINIO_SECRET_KEY") {
            self.minio.secret_key = secret_key;
        }
        if let Some(region) = lookup("MINIO_REGION") {
            self.minio.region = region;
        }
        if let Some(verify) = lookup("MINIO_TLS_VERIFY") {
            self.minio.verify = verify
                .parse()
                .with_context(|| format!("MINIO_TLS_VERIFY={verify:?} is not a boolean"))?;
        }
        Ok(())
    }

    /// Base URL MinIO calls back into: `http://<name>.<namespace>:<port>`.
    pub fn callback_endpoint(&self) -> String {
        format!(
            "http://{}.{}:{}",
            self.name, self.namespace, self.service_port
        )
    }
}

impl fmt::Debug for MinioConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MinioConfig")
            .field("endpoint", &self.endpoint.as_str())
            .field("access_key", &self.access_key)
            .field("secret_key", &REDACTED)
            .field("region", &self.region)
            .field("verify", &self.verify)
            .finish()
    }
}

impl MinioConfig {
    /// The server's own MinIO as a storage provider, used when a service
    /// does not declare one.
    pub fn provider(&self) -> MinioProvider {
        MinioProvider {
            endpoint: self.endpoint.clone(),
            region: self.region.clone(),
            access_key: self.access_key.clone(),
            secret_key: self.secret_key.clone(),
            verify: self.verify,
        }
    }
}
