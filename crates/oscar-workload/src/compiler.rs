//! Service → workload compilation.

use std::collections::BTreeMap;

use oscar_core::{Quantity, Service};
use tracing::debug;

use crate::env::{inject_runtime_env, user_env};
use crate::error::{CompileError, CompileResult};
use crate::spec::{
    ClaimSource, ConfigMapSource, Container, ResourceName, ResourceRequirements, Volume,
    VolumeMount, VolumeSource, WorkloadSpec,
};
use crate::{
    CONFIG_PATH, CONFIG_VOLUME_NAME, CONTAINER_NAME, PVC_NAME, VOLUME_NAME, VOLUME_PATH,
    WATCHDOG_NAME,
};

/// Compile a service into its workload spec.
///
/// Fails on the first CPU or memory limit that is not a valid quantity.
/// Empty limits are left out of the spec entirely.
pub fn compile(service: &Service) -> CompileResult<WorkloadSpec> {
    let resources = resource_limits(service)?;

    let container = Container {
        name: CONTAINER_NAME.to_string(),
        image: service.image.clone(),
        command: vec!["/bin/sh".to_string()],
        args: vec!["-c".to_string(), format!("{VOLUME_PATH}/{WATCHDOG_NAME}")],
        env: user_env(&service.environment.variables),
        volume_mounts: vec![
            VolumeMount {
                name: VOLUME_NAME.to_string(),
                read_only: true,
                mount_path: VOLUME_PATH.to_string(),
            },
            VolumeMount {
                name: CONFIG_VOLUME_NAME.to_string(),
                read_only: true,
                mount_path: CONFIG_PATH.to_string(),
            },
        ],
        resources,
    };

    let spec = WorkloadSpec {
        containers: vec![container],
        volumes: vec![
            Volume {
                name: VOLUME_NAME.to_string(),
                source: VolumeSource::PersistentVolumeClaim(ClaimSource {
                    claim_name: PVC_NAME.to_string(),
                }),
            },
            Volume {
                name: CONFIG_VOLUME_NAME.to_string(),
                source: VolumeSource::ConfigMap(ConfigMapSource {
                    name: service.name.clone(),
                }),
            },
        ],
    };

    debug!(service = %service.name, "compiled workload spec");
    Ok(inject_runtime_env(spec))
}

fn resource_limits(service: &Service) -> CompileResult<ResourceRequirements> {
    let mut limits = BTreeMap::new();
    if let Some(cpu) = parse_limit("cpu", &service.cpu)? {
        limits.insert(ResourceName::Cpu, cpu);
    }
    if let Some(memory) = parse_limit("memory", &service.memory)? {
        limits.insert(ResourceName::Memory, memory);
    }
    Ok(ResourceRequirements { limits })
}

fn parse_limit(field: &'static str, value: &str) -> CompileResult<Option<Quantity>> {
    if value.is_empty() {
        return Ok(None);
    }
    Quantity::parse(value)
        .map(Some)
        .map_err(|source| CompileError::InvalidResourceQuantity {
            field,
            value: value.to_string(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use oscar_core::{Environment, QuantityError, Service};

    use super::*;
    use crate::env::runtime_env;

    fn service(cpu: &str, memory: &str) -> Service {
        Service {
            name: "cowsay".to_string(),
            memory: memory.to_string(),
            cpu: cpu.to_string(),
            log_level: String::new(),
            image: "ghcr.io/grycap/cowsay".to_string(),
            input: Vec::new(),
            output: Vec::new(),
            script: "cowsay hi".to_string(),
            environment: Environment::default(),
            storage_providers: None,
        }
    }

    #[test]
    fn limits_from_cpu_and_memory() {
        let spec = compile(&service("250m", "128Mi")).unwrap();
        assert_eq!(spec.containers.len(), 1);

        let limits = &spec.containers[0].resources.limits;
        assert_eq!(limits.len(), 2);
        assert_eq!(limits[&ResourceName::Cpu], Quantity::parse("0.25").unwrap());
        assert_eq!(limits[&ResourceName::Memory].value(), 128 * 1024 * 1024);
    }

    #[test]
    fn empty_limits_are_omitted() {
        let spec = compile(&service("", "")).unwrap();
        assert!(spec.containers[0].resources.limits.is_empty());

        let spec = compile(&service("1", "")).unwrap();
        let limits = &spec.containers[0].resources.limits;
        assert_eq!(limits.keys().collect::<Vec<_>>(), [&ResourceName::Cpu]);
    }

    #[test]
    fn invalid_cpu_names_the_field() {
        let err = compile(&service("abc", "128Mi")).unwrap_err();
        let CompileError::InvalidResourceQuantity { field, value, .. } = err;
        assert_eq!(field, "cpu");
        assert_eq!(value, "abc");
    }

    #[test]
    fn invalid_memory_names_the_field() {
        let err = compile(&service("1", "12Qi")).unwrap_err();
        let CompileError::InvalidResourceQuantity { field, .. } = err;
        assert_eq!(field, "memory");
    }

    #[test]
    fn huge_exponent_is_an_invalid_quantity() {
        let err = compile(&service("1e2147483647", "")).unwrap_err();
        let CompileError::InvalidResourceQuantity { field, source, .. } = err;
        assert_eq!(field, "cpu");
        assert!(matches!(source, QuantityError::OutOfRange(_)));
    }

    #[test]
    fn fixed_container_shape() {
        let spec = compile(&service("", "")).unwrap();
        let container = &spec.containers[0];

        assert_eq!(container.name, "oscar-container");
        assert_eq!(container.image, "ghcr.io/grycap/cowsay");
        assert_eq!(container.command, ["/bin/sh"]);
        assert_eq!(container.args, ["-c", "/oscar/bin/fwatchdog"]);

        let mounts: Vec<(&str, &str, bool)> = container
            .volume_mounts
            .iter()
            .map(|m| (m.name.as_str(), m.mount_path.as_str(), m.read_only))
            .collect();
        assert_eq!(
            mounts,
            [
                ("oscar-volume", "/oscar/bin", true),
                ("oscar-config", "/oscar/config", true),
            ]
        );
    }

    #[test]
    fn volumes_bind_claim_and_service_config() {
        let spec = compile(&service("", "")).unwrap();
        assert_eq!(
            spec.volumes,
            [
                Volume {
                    name: "oscar-volume".to_string(),
                    source: VolumeSource::PersistentVolumeClaim(ClaimSource {
                        claim_name: "oscar-pvc".to_string(),
                    }),
                },
                Volume {
                    name: "oscar-config".to_string(),
                    source: VolumeSource::ConfigMap(ConfigMapSource {
                        name: "cowsay".to_string(),
                    }),
                },
            ]
        );
    }

    #[test]
    fn env_is_sorted_user_vars_then_runtime_vars() {
        let mut svc = service("", "");
        let mut variables = BTreeMap::new();
        for (k, v) in [("ZED", "z"), ("ALPHA", "a"), ("MIDDLE", "m")] {
            variables.insert(k.to_string(), v.to_string());
        }
        svc.environment.variables = variables;

        let spec = compile(&svc).unwrap();
        let env = &spec.containers[0].env;
        let names: Vec<&str> = env.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(
            names,
            ["ALPHA", "MIDDLE", "ZED", "fprocess", "max_inflight", "write_debug", "exec_timeout"]
        );
        assert_eq!(env[3..], runtime_env()[..]);
    }

    #[test]
    fn no_user_vars_yields_only_runtime_vars() {
        let spec = compile(&service("", "")).unwrap();
        assert_eq!(spec.containers[0].env, runtime_env());
    }

    #[test]
    fn compile_is_idempotent() {
        let mut svc = service("500m", "1Gi");
        svc.environment
            .variables
            .insert("B".to_string(), "2".to_string());
        svc.environment
            .variables
            .insert("A".to_string(), "1".to_string());

        let first = compile(&svc).unwrap();
        let second = compile(&svc).unwrap();
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn serialized_shape_matches_scheduler_format() {
        let spec = compile(&service("250m", "128Mi")).unwrap();
        let json = serde_json::to_value(&spec).unwrap();

        assert_eq!(json["containers"][0]["resources"]["limits"]["cpu"], "250m");
        assert_eq!(json["containers"][0]["resources"]["limits"]["memory"], "128Mi");
        assert_eq!(json["containers"][0]["volumeMounts"][0]["readOnly"], true);
        assert_eq!(
            json["volumes"][0]["persistentVolumeClaim"]["claimName"],
            "oscar-pvc"
        );
        assert_eq!(json["volumes"][1]["configMap"]["name"], "cowsay");

        let back: WorkloadSpec = serde_json::from_value(json).unwrap();
        assert_eq!(back, spec);
    }
}
