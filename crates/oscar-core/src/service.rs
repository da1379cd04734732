//! OSCAR services as described by the Function Definition Language (FDL).

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ServiceError;
use crate::storage::{StorageIoConfig, StorageProviders};

/// Longest accepted service name.
pub const MAX_NAME_LEN: usize = 39;

static NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?$").expect("valid name regex"));

/// A deployable OSCAR service.
///
/// `name` keys the compiled workload's config volume, the persisted config
/// object and the storage webhook, so it must stay stable for the life of
/// the service.
///
/// Field order is the FDL document order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub name: String,
    /// Memory limit in quantity notation (`128Mi`). Empty means unset.
    #[serde(default)]
    pub memory: String,
    /// CPU limit in quantity notation (`250m`). Empty means unset.
    #[serde(default)]
    pub cpu: String,
    /// Log level handed to the supervisor.
    #[serde(default)]
    pub log_level: String,
    pub image: String,
    #[serde(default)]
    pub input: Vec<StorageIoConfig>,
    #[serde(default)]
    pub output: Vec<StorageIoConfig>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub script: String,
    #[serde(default)]
    pub environment: Environment,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_providers: Option<StorageProviders>,
}

/// User-defined environment variables, nested under `Variables` in FDL.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Environment {
    #[serde(rename = "Variables", default)]
    pub variables: BTreeMap<String, String>,
}

impl Service {
    /// Check the required fields and the name format.
    pub fn validate(&self) -> Result<(), ServiceError> {
        if self.name.is_empty() || self.name.len() > MAX_NAME_LEN {
            return Err(ServiceError::InvalidService(format!(
                "name must be between 1 and {MAX_NAME_LEN} characters, got {}",
                self.name.len()
            )));
        }
        if !NAME_RE.is_match(&self.name) {
            return Err(ServiceError::InvalidService(format!(
                "name {:?} must consist of lowercase alphanumerics and '-'",
                self.name
            )));
        }
        if self.image.is_empty() {
            return Err(ServiceError::InvalidService("image is required".to_string()));
        }
        if self.script.is_empty() {
            return Err(ServiceError::InvalidService("script is required".to_string()));
        }
        Ok(())
    }

    /// Render the service as its canonical FDL document.
    pub fn to_fdl(&self) -> Result<String, ServiceError> {
        serde_yaml::to_string(self).map_err(ServiceError::Serialize)
    }

    /// Parse a service from an FDL document.
    pub fn from_fdl(text: &str) -> Result<Self, ServiceError> {
        serde_yaml::from_str(text).map_err(ServiceError::Parse)
    }

    pub fn from_file(path: &Path) -> Result<Self, ServiceError> {
        let content = std::fs::read_to_string(path).map_err(|source| ServiceError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_fdl(&content)
    }

    /// ARN of the MinIO notification target registered for this service.
    pub fn minio_webhook_arn(&self) -> Result<String, ServiceError> {
        let provider = self
            .storage_providers
            .as_ref()
            .and_then(StorageProviders::default_minio)
            .ok_or_else(|| ServiceError::MissingStorageProvider(self.name.clone()))?;
        Ok(format!(
            "arn:minio:sqs:{}:{}:webhook",
            provider.region, self.name
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MinioProvider, DEFAULT_PROVIDER};

    fn sample() -> Service {
        let mut variables = BTreeMap::new();
        variables.insert("ZETA".to_string(), "last".to_string());
        variables.insert("ALPHA".to_string(), "first".to_string());
        Service {
            name: "cowsay".to_string(),
            memory: "128Mi".to_string(),
            cpu: "250m".to_string(),
            log_level: "INFO".to_string(),
            image: "ghcr.io/grycap/cowsay".to_string(),
            input: vec![StorageIoConfig {
                storage_provider: "minio.default".to_string(),
                path: "cowsay/input".to_string(),
                suffix: vec![".txt".to_string()],
                prefix: Vec::new(),
            }],
            output: Vec::new(),
            script: "#!/bin/sh\ncat $INPUT_FILE_PATH | /usr/games/cowsay\n".to_string(),
            environment: Environment { variables },
            storage_providers: None,
        }
    }

    #[test]
    fn fdl_has_top_level_fields_in_order() {
        let text = sample().to_fdl().unwrap();
        let keys: Vec<&str> = text
            .lines()
            .filter(|l| !l.starts_with(' ') && !l.starts_with('-') && l.contains(':'))
            .map(|l| l.split(':').next().unwrap())
            .collect();
        assert_eq!(
            keys,
            ["name", "memory", "cpu", "log_level", "image", "input", "output", "script", "environment"]
        );
        assert!(text.contains("  Variables:\n    ALPHA: first\n    ZETA: last\n"));
    }

    #[test]
    fn fdl_is_stable_and_lossless() {
        let service = sample();
        let first = service.to_fdl().unwrap();
        let second = service.clone().to_fdl().unwrap();
        assert_eq!(first, second);

        let parsed = Service::from_fdl(&first).unwrap();
        assert_eq!(parsed, service);
    }

    #[test]
    fn parses_minimal_document() {
        let service = Service::from_fdl(
            "name: plants\nimage: grycap/plants\nscript: echo hi\nenvironment:\n  Variables:\n    MODEL: v2\n",
        )
        .unwrap();
        assert_eq!(service.name, "plants");
        assert!(service.cpu.is_empty());
        assert!(service.input.is_empty());
        assert_eq!(service.environment.variables["MODEL"], "v2");
        assert!(service.storage_providers.is_none());
    }

    #[test]
    fn parse_error_is_reported() {
        let err = Service::from_fdl("name: [unterminated").unwrap_err();
        assert!(matches!(err, ServiceError::Parse(_)));
    }

    #[test]
    fn reads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cowsay.yaml");
        std::fs::write(&path, sample().to_fdl().unwrap()).unwrap();
        assert_eq!(Service::from_file(&path).unwrap(), sample());

        let missing = Service::from_file(&dir.path().join("nope.yaml")).unwrap_err();
        assert!(matches!(missing, ServiceError::Io { .. }));
    }

    #[test]
    fn validate_accepts_sample() {
        sample().validate().unwrap();
    }

    #[test]
    fn validate_rejects_bad_names() {
        let mut service = sample();
        service.name = String::new();
        assert!(service.validate().is_err());

        service.name = "a".repeat(MAX_NAME_LEN + 1);
        assert!(service.validate().is_err());

        service.name = "a".repeat(MAX_NAME_LEN);
        assert!(service.validate().is_ok());

        service.name = "Not_Valid".to_string();
        assert!(service.validate().is_err());

        service.name = "-leading".to_string();
        assert!(service.validate().is_err());
    }

    #[test]
    fn validate_requires_image_and_script() {
        let mut service = sample();
        service.image.clear();
        assert!(service.validate().is_err());

        let mut service = sample();
        service.script.clear();
        assert!(service.validate().is_err());
    }

    #[test]
    fn webhook_arn_uses_default_provider_region() {
        let mut service = sample();
        assert!(matches!(
            service.minio_webhook_arn(),
            Err(ServiceError::MissingStorageProvider(_))
        ));

        let mut providers = StorageProviders::default();
        providers.minio.insert(
            DEFAULT_PROVIDER.to_string(),
            MinioProvider {
                endpoint: url::Url::parse("http://minio.minio:9000").unwrap(),
                region: "us-east-1".to_string(),
                access_key: "minio".to_string(),
                secret_key: "minio123".to_string(),
                verify: true,
            },
        );
        service.storage_providers = Some(providers);
        assert_eq!(
            service.minio_webhook_arn().unwrap(),
            "arn:minio:sqs:us-east-1:cowsay:webhook"
        );
    }
}
