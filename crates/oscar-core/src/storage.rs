//! Storage provider definitions referenced by services.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

/// Identifier of the provider used when a service does not name one.
pub const DEFAULT_PROVIDER: &str = "default";

/// Region assumed for MinIO and S3 when none is configured.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Storage providers available to a service, keyed by provider id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageProviders {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub minio: BTreeMap<String, MinioProvider>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub s3: BTreeMap<String, S3Provider>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub onedata: BTreeMap<String, OnedataProvider>,
}

impl StorageProviders {
    /// The MinIO provider registered under [`DEFAULT_PROVIDER`].
    pub fn default_minio(&self) -> Option<&MinioProvider> {
        self.minio.get(DEFAULT_PROVIDER)
    }
}

/// A MinIO server the service reads from or writes to.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct MinioProvider {
    pub endpoint: Url,
    #[serde(default = "default_region")]
    pub region: String,
    pub access_key: String,
    pub secret_key: String,
    /// Verify TLS certificates. Disabling it must be explicit.
    #[serde(default = "default_verify")]
    pub verify: bool,
}

#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct S3Provider {
    pub access_key: String,
    pub secret_key: String,
    #[serde(default = "default_region")]
    pub region: String,
}

#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct OnedataProvider {
    pub oneprovider_host: String,
    pub token: String,
    pub space: String,
}

/// An input or output binding between a service and a storage path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageIoConfig {
    /// Provider reference in `<kind>.<id>` form, e.g. `minio.default`.
    pub storage_provider: String,
    pub path: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suffix: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub prefix: Vec<String>,
}

/// Placeholder printed instead of secrets in `Debug` output.
pub(crate) const REDACTED: &str = "<redacted>";

impl fmt::Debug for MinioProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MinioProvider")
            .field("endpoint", &self.endpoint.as_str())
            .field("region", &self.region)
            .field("access_key", &self.access_key)
            .field("secret_key", &REDACTED)
            .field("verify", &self.verify)
            .finish()
    }
}

impl fmt::Debug for S3Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("S3Provider")
            .field("access_key", &self.access_key)
            .field("secret_key", &REDACTED)
            .field("region", &self.region)
            .finish()
    }
}

impl fmt::Debug for OnedataProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OnedataProvider")
            .field("oneprovider_host", &self.oneprovider_host)
            .field("token", &REDACTED)
            .field("space", &self.space)
            .finish()
    }
}

pub(crate) fn default_region() -> String {
    DEFAULT_REGION.to_string()
}

pub(crate) fn default_verify() -> bool {
    true
}
