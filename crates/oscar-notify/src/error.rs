//! Error types for webhook synchronization.

use thiserror::Error;

/// Errors returned by an [`AdminApi`](crate::AdminApi) transport.
#[derive(Debug, Error)]
pub enum AdminApiError {
    #[error("admin request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("admin endpoint returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid admin URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("admin payload encryption failed: {0}")]
    Encryption(String),
}

/// Errors that can occur while staging or applying webhook changes.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("the provided MinIO server {provider} is not the same as the one configured ({configured})")]
    EndpointMismatch { provider: String, configured: String },

    #[error("invalid MinIO endpoint {0}: scheme must be http or https")]
    UnsupportedScheme(String),

    #[error("failed to connect to the MinIO admin API: {0}")]
    AdminConnect(#[source] AdminApiError),

    #[error("MinIO rejected the configuration change: {0}")]
    AdminConfig(#[source] AdminApiError),

    #[error("error restarting the MinIO server: {0}")]
    RestartTimeout(#[source] AdminApiError),

    #[error("deadline expired before the MinIO restart completed")]
    Cancelled,
}

pub type NotifyResult<T> = Result<T, NotifyError>;
