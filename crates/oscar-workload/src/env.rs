//! Container environment: user variables plus the supervisor runtime set.
//!
//! User variables are emitted sorted by name. The runtime variables are
//! appended after them, so when a user variable shares a name with one of
//! them both entries are present and the runtime entry is the effective one
//! (see [`Container::env_value`](crate::Container::env_value)).

use tracing::warn;

use crate::spec::{Container, EnvVar, WorkloadSpec};
use crate::{CONTAINER_NAME, SUPERVISOR_NAME, VOLUME_PATH};

/// Variable the watchdog reads to find the process to fork.
pub const WATCHDOG_PROCESS: &str = "fprocess";
pub const MAX_INFLIGHT: &str = "max_inflight";
pub const WRITE_DEBUG: &str = "write_debug";
pub const EXEC_TIMEOUT: &str = "exec_timeout";

/// The four variables every compiled container carries, in emission order.
pub fn runtime_env() -> Vec<EnvVar> {
    vec![
        EnvVar::new(WATCHDOG_PROCESS, format!("{VOLUME_PATH}/{SUPERVISOR_NAME}")),
        EnvVar::new(MAX_INFLIGHT, "1"),
        EnvVar::new(WRITE_DEBUG, "true"),
        // 0 disables the watchdog's execution timeout.
        EnvVar::new(EXEC_TIMEOUT, "0"),
    ]
}

/// Convert user variables into container env entries sorted by name.
pub fn user_env<'a, I>(vars: I) -> Vec<EnvVar>
where
    I: IntoIterator<Item = (&'a String, &'a String)>,
{
    let mut env: Vec<EnvVar> = vars
        .into_iter()
        .map(|(name, value)| EnvVar::new(name.clone(), value.clone()))
        .collect();
    env.sort_by(|a, b| a.name.cmp(&b.name));
    env
}

/// Return `container` with the runtime variables appended.
pub fn with_runtime_env(container: Container) -> Container {
    let runtime = runtime_env();
    for var in &runtime {
        if container.env.iter().any(|existing| existing.name == var.name) {
            warn!(
                container = %container.name,
                variable = %var.name,
                "user variable shadowed by runtime variable"
            );
        }
    }

    let mut env = container.env;
    env.extend(runtime);
    Container { env, ..container }
}

/// Return `spec` with the runtime variables appended to the service
/// container. Other containers are left untouched.
pub fn inject_runtime_env(spec: WorkloadSpec) -> WorkloadSpec {
    let containers = spec
        .containers
        .into_iter()
        .map(|container| {
            if container.name == CONTAINER_NAME {
                with_runtime_env(container)
            } else {
                container
            }
        })
        .collect();
    WorkloadSpec { containers, ..spec }
}
