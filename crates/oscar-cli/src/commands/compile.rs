use std::path::Path;

use oscar_workload::WorkloadSpec;

use super::load_service;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Json,
    Yaml,
}

pub fn compile(path: &Path, format: OutputFormat) -> anyhow::Result<()> {
    let service = load_service(path)?;
    let spec = oscar_workload::compile(&service)?;
    print!("{}", format_spec(&spec, format)?);
    Ok(())
}

pub fn render(path: &Path) -> anyhow::Result<()> {
    let service = load_service(path)?;
    print!("{}", service.to_fdl()?);
    Ok(())
}

pub fn config_object(path: &Path) -> anyhow::Result<()> {
    let service = load_service(path)?;
    let object = oscar_workload::config_object(&service)?;
    print!("{}", serde_yaml::to_string(&object)?);
    Ok(())
}

fn format_spec(spec: &WorkloadSpec, format: OutputFormat) -> anyhow::Result<String> {
    Ok(match format {
        OutputFormat::Json => format!("{}\n", serde_json::to_string_pretty(spec)?),
        OutputFormat::Yaml => serde_yaml::to_string(spec)?,
    })
}
