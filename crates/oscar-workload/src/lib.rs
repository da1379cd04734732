//! oscar-workload — compiles OSCAR services into container workloads.
//!
//! [`compile`] turns a [`Service`](oscar_core::Service) into a
//! [`WorkloadSpec`] for the cluster scheduler: a single fixed-shape
//! container running the watchdog from the shared binary volume, with the
//! service's config object mounted alongside.
//!
//! ```text
//! Service ── compile() ──► WorkloadSpec
//!              ├── resource limits (Quantity)
//!              ├── user env, sorted by name
//!              └── env::with_runtime_env() → supervisor variables
//! ```
//!
//! Compilation is pure: the same service always yields an identical spec.

pub mod compiler;
pub mod config_object;
pub mod env;
pub mod error;
pub mod spec;

pub use compiler::compile;
pub use config_object::{config_object, ServiceConfigObject};
pub use error::CompileError;
pub use spec::*;

/// Name of the service container.
pub const CONTAINER_NAME: &str = "oscar-container";

/// Volume holding the shared OSCAR binaries.
pub const VOLUME_NAME: &str = "oscar-volume";

/// Mount path of [`VOLUME_NAME`].
pub const VOLUME_PATH: &str = "/oscar/bin";

/// Volume holding the service's config object.
pub const CONFIG_VOLUME_NAME: &str = "oscar-config";

/// Mount path of [`CONFIG_VOLUME_NAME`].
pub const CONFIG_PATH: &str = "/oscar/config";

/// Claim backing [`VOLUME_NAME`].
pub const PVC_NAME: &str = "oscar-pvc";

/// Watchdog binary the container runs.
pub const WATCHDOG_NAME: &str = "fwatchdog";

/// Supervisor binary the watchdog forks per request.
pub const SUPERVISOR_NAME: &str = "supervisor";

/// Config object key holding the FDL document.
pub const FDL_FILE_NAME: &str = "function_config.yaml";

/// Config object key holding the user script.
pub const SCRIPT_FILE_NAME: &str = "script.sh";

/// Label attached to every object owned by a service.
pub const SERVICE_LABEL: &str = "oscar_service";
