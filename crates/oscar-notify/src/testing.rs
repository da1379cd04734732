//! In-memory MinIO admin double for unit tests.
//!
//! Models MinIO's split between the staged config store and the live
//! configuration, which is replaced by the staged one on restart.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use oscar_core::config::{MinioConfig, RestartConfig};
use oscar_core::{Config, MinioProvider};
use tokio::time::Instant;
use url::Url;

use crate::admin::AdminApi;
use crate::error::AdminApiError;

#[derive(Debug, Default)]
struct State {
    staged: BTreeMap<String, String>,
    live: BTreeMap<String, String>,
    calls: Vec<String>,
    reject_config: bool,
    fail_restart: bool,
    probe_failures: u32,
    config_delay: Duration,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryAdminApi {
    state: Arc<Mutex<State>>,
}

impl MemoryAdminApi {
    fn with_state<T>(&self, f: impl FnOnce(&mut State) -> T) -> T {
        f(&mut self.state.lock().unwrap())
    }

    pub fn staged(&self) -> BTreeMap<String, String> {
        self.with_state(|s| s.staged.clone())
    }

    pub fn live(&self) -> BTreeMap<String, String> {
        self.with_state(|s| s.live.clone())
    }

    /// Every admin call made, in order.
    pub fn calls(&self) -> Vec<String> {
        self.with_state(|s| s.calls.clone())
    }

    pub fn stage_existing(&self, key: &str, value: &str) {
        self.with_state(|s| s.staged.insert(key.to_string(), value.to_string()));
    }

    pub fn reject_config(&self, reject: bool) {
        self.with_state(|s| s.reject_config = reject);
    }

    /// Delay every config change by `delay` before it is recorded.
    pub fn stall_config(&self, delay: Duration) {
        self.with_state(|s| s.config_delay = delay);
    }

    async fn config_delay(&self) {
        let delay = self.with_state(|s| s.config_delay);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    pub fn fail_restart(&self, fail: bool) {
        self.with_state(|s| s.fail_restart = fail);
    }

    /// Make the next `count` info probes fail.
    pub fn fail_probes(&self, count: u32) {
        self.with_state(|s| s.probe_failures = count);
    }

    pub fn count(&self, call: &str) -> usize {
        self.with_state(|s| s.calls.iter().filter(|c| c.starts_with(call)).count())
    }
}

fn unavailable() -> AdminApiError {
    AdminApiError::Status {
        status: 503,
        body: "server not initialized".to_string(),
    }
}

#[async_trait]
impl AdminApi for MemoryAdminApi {
    async fn set_config_kv(&self, kv: &str) -> Result<(), AdminApiError> {
        self.config_delay().await;
        self.with_state(|s| {
            s.calls.push(format!("set {kv}"));
            if s.reject_config {
                return Err(AdminApiError::Status {
                    status: 400,
                    body: "invalid config".to_string(),
                });
            }
            let (key, value) = kv.split_once(' ').unwrap_or((kv, ""));
            s.staged.insert(key.to_string(), value.to_string());
            Ok(())
        })
    }

    async fn del_config_kv(&self, key: &str) -> Result<(), AdminApiError> {
        self.config_delay().await;
        self.with_state(|s| {
            s.calls.push(format!("del {key}"));
            if s.reject_config {
                return Err(AdminApiError::Status {
                    status: 400,
                    body: "invalid config".to_string(),
                });
            }
            s.staged.remove(key);
            Ok(())
        })
    }

    async fn service_restart(&self) -> Result<(), AdminApiError> {
        self.with_state(|s| {
            s.calls.push("restart".to_string());
            if s.fail_restart {
                return Err(unavailable());
            }
            s.live = s.staged.clone();
            Ok(())
        })
    }

    async fn server_info(&self) -> Result<(), AdminApiError> {
        self.with_state(|s| {
            s.calls.push("info".to_string());
            if s.probe_failures > 0 {
                s.probe_failures -= 1;
                return Err(unavailable());
            }
            Ok(())
        })
    }
}

pub fn config(minio_endpoint: &str) -> Config {
    Config {
        name: "oscar".to_string(),
        namespace: "oscar".to_string(),
        service_port: 8080,
        minio: MinioConfig {
            endpoint: Url::parse(minio_endpoint).unwrap(),
            access_key: "minio".to_string(),
            secret_key: "minio123".to_string(),
            region: "us-east-1".to_string(),
            verify: true,
        },
        restart: RestartConfig::default(),
    }
}

pub fn provider(endpoint: &str) -> MinioProvider {
    MinioProvider {
        endpoint: Url::parse(endpoint).unwrap(),
        region: "us-east-1".to_string(),
        access_key: "minio".to_string(),
        secret_key: "minio123".to_string(),
        verify: true,
    }
}

/// Paused-clock timers fire on millisecond ticks.
pub fn assert_elapsed(start: Instant, expected: Duration) {
    let elapsed = start.elapsed();
    assert!(
        elapsed >= expected && elapsed < expected + Duration::from_millis(10),
        "elapsed {elapsed:?}, expected {expected:?}"
    );
}
