mod configuration;
mod extensions;
mod gateway;
mod kubernetes;
mod resources;

use std::net::TcpListener;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::configuration::{Overrides, Settings};
use crate::kubernetes::kubers::KubeRsBased;
use crate::kubernetes::model::SharedK8sClient;
use crate::resources::ControlPlane;

/// HTTP control plane for creating, listing, scaling and deleting cluster workloads.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// YAML settings file; built-in defaults are used when absent.
    #[arg(short, long)]
    config: Option<PathBuf>,
    #[arg(long)]
    host: Option<String>,
    #[arg(short, long)]
    port: Option<u16>,
    /// Kubeconfig file, `~/.kube/config` by default.
    #[arg(long)]
    kubeconfig: Option<PathBuf>,
    /// Kubeconfig context to use instead of the current one.
    #[arg(long)]
    context: Option<String>,
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => configuration::load_from_yaml(path)?,
        None => Settings::default(),
    }
    .apply(Overrides {
        host: cli.host,
        port: cli.port,
        kubeconfig: cli.kubeconfig,
        context: cli.context,
    });

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.log_level))
        .context("invalid log level")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(anyhow::Error::msg)?;

    // Without cluster credentials nothing can be served.
    let cluster = KubeRsBased::connect(&settings.cluster)
        .await
        .context("cannot initialize the cluster client")?;
    let k8s_client: SharedK8sClient = Arc::new(cluster);
    let control_plane = ControlPlane::new(k8s_client);

    let listener = TcpListener::bind((settings.server.host.as_str(), settings.server.port))
        .with_context(|| {
            format!(
                "cannot bind {}:{}",
                settings.server.host, settings.server.port
            )
        })?;
    info!(address = %listener.local_addr()?, "control plane listening");

    gateway::run(listener, control_plane)?.await?;
    Ok(())
}
