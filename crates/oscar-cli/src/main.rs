use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

use commands::compile::OutputFormat;

#[derive(Parser)]
#[command(
    name = "oscar",
    about = "OSCAR — serverless services on Kubernetes",
    version,
    propagate_version = true,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile an FDL service into its workload spec
    Compile {
        /// Path to the FDL service definition
        fdl: PathBuf,
        /// Output format: json or yaml
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
    },
    /// Print the canonical FDL document for a service
    Render {
        fdl: PathBuf,
    },
    /// Print the config object mounted into the service's container
    ConfigObject {
        fdl: PathBuf,
    },
    /// Register or remove a service's MinIO webhook.
    ///
    /// The change is staged through the MinIO admin API and applied by
    /// restarting the MinIO server.
    Webhook {
        #[command(subcommand)]
        action: WebhookAction,
    },
}

#[derive(Subcommand)]
enum WebhookAction {
    /// Register the webhook for a newly created service
    Register {
        #[command(flatten)]
        target: WebhookTarget,
    },
    /// Remove the webhook of a deleted service
    Remove {
        #[command(flatten)]
        target: WebhookTarget,
    },
}

#[derive(clap::Args)]
struct WebhookTarget {
    /// Path to the FDL service definition
    fdl: PathBuf,
    /// Server configuration (oscar.toml)
    #[arg(short, long, default_value = "oscar.toml")]
    config: PathBuf,
    /// Give up if the MinIO restart has not completed in this many seconds
    #[arg(long)]
    timeout_secs: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("oscar=info".parse()?)
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Compile { fdl, format } => commands::compile::compile(&fdl, format),
        Commands::Render { fdl } => commands::compile::render(&fdl),
        Commands::ConfigObject { fdl } => commands::compile::config_object(&fdl),
        Commands::Webhook { action } => {
            let (change, target) = match action {
                WebhookAction::Register { target } => (commands::webhook::Change::Register, target),
                WebhookAction::Remove { target } => (commands::webhook::Change::Remove, target),
            };
            commands::webhook::webhook(change, &target.fdl, &target.config, target.timeout_secs)
                .await
        }
    }
}
