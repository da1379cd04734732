//! Error types for the OSCAR service model.

use thiserror::Error;

/// Errors produced while validating, loading or rendering a service.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("invalid service: {0}")]
    InvalidService(String),

    #[error("service {0} has no default MinIO storage provider")]
    MissingStorageProvider(String),

    #[error("failed to render FDL document: {0}")]
    Serialize(#[source] serde_yaml::Error),

    #[error("failed to parse FDL document: {0}")]
    Parse(#[source] serde_yaml::Error),

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Errors produced while parsing a resource quantity string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuantityError {
    #[error("quantity is empty")]
    Empty,

    #[error("malformed quantity magnitude: {0:?}")]
    Malformed(String),

    #[error("quantities must not be negative: {0:?}")]
    Negative(String),

    #[error("unknown quantity suffix {suffix:?} in {input:?}")]
    InvalidSuffix { input: String, suffix: String },

    #[error("quantity out of range: {0:?}")]
    OutOfRange(String),
}
