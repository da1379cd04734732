//! oscar-notify — MinIO webhook registration for OSCAR services.
//!
//! Each service with a MinIO input gets a `notify_webhook:<name>` target
//! on the server's MinIO, pointing back at `/job/<name>` on the OSCAR
//! server. MinIO only loads notification targets at startup, so every
//! change is staged through the admin API and then applied by restarting
//! the MinIO server.
//!
//! # Architecture
//!
//! ```text
//! WebhookSynchronizer
//!   ├── Per-endpoint lock (stage + restart never interleave)
//!   ├── WebhookAdminClient
//!   │   ├── Endpoint + scheme checks against Config
//!   │   └── AdminApi (HttpAdminApi: SigV4-signed, encrypted config bodies)
//!   └── RestartCoordinator
//!       ├── service_restart()
//!       ├── grace period (> provider shutdown bound)
//!       └── server_info() probe, optional backoff retries
//! ```

pub mod admin;
pub mod client;
pub mod error;
pub mod payload;
pub mod restart;
pub mod signing;
pub mod sync;
pub mod webhook;

#[cfg(test)]
mod testing;

pub use admin::{AdminApi, HttpAdminApi};
pub use client::WebhookAdminClient;
pub use error::{AdminApiError, NotifyError, NotifyResult};
pub use restart::{RestartCoordinator, RestartPolicy};
pub use sync::{WebhookChange, WebhookSynchronizer};
pub use webhook::WebhookEntry;
