pub mod compile;
pub mod webhook;

use std::path::Path;

use anyhow::Context;
use oscar_core::Service;

/// Load and validate an FDL service definition.
pub fn load_service(path: &Path) -> anyhow::Result<Service> {
    let service = Service::from_file(path)?;
    service
        .validate()
        .with_context(|| format!("invalid service in {}", path.display()))?;
    Ok(service)
}
