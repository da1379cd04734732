//! The per-service config object mounted at [`CONFIG_PATH`](crate::CONFIG_PATH).
//!
//! Storing it is left to the caller; this only builds its contents so that
//! the object name always matches the config volume of the compiled spec.

use std::collections::BTreeMap;

use oscar_core::{Service, ServiceError};
use serde::{Deserialize, Serialize};

use crate::{FDL_FILE_NAME, SCRIPT_FILE_NAME, SERVICE_LABEL};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceConfigObject {
    /// Always the service name.
    pub name: String,
    pub labels: BTreeMap<String, String>,
    pub data: BTreeMap<String, String>,
}

/// Build the config object holding the service's FDL document and script.
pub fn config_object(service: &Service) -> Result<ServiceConfigObject, ServiceError> {
    let fdl = service.to_fdl()?;

    let labels = BTreeMap::from([(SERVICE_LABEL.to_string(), service.name.clone())]);
    let data = BTreeMap::from([
        (FDL_FILE_NAME.to_string(), fdl),
        (SCRIPT_FILE_NAME.to_string(), service.script.clone()),
    ]);

    Ok(ServiceConfigObject {
        name: service.name.clone(),
        labels,
        data,
    })
}
