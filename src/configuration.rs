use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 7000;
const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub cluster: ClusterConfig,
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            server: ServerSettings::default(),
            cluster: ClusterConfig::default(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        ServerSettings {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

/// Where the cluster credentials come from.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    /// Defaults to `~/.kube/config`.
    pub kubeconfig: Option<PathBuf>,
    /// Kubeconfig context, the current one when absent.
    pub context: Option<String>,
}

impl ClusterConfig {
    pub fn kubeconfig_path(&self) -> anyhow::Result<PathBuf> {
        match &self.kubeconfig {
            Some(path) => Ok(path.clone()),
            None => dirs::home_dir()
                .map(|home| home.join(".kube").join("config"))
                .context("cannot resolve the home directory to locate ~/.kube/config"),
        }
    }
}

/// Values given on the command line win over the file.
#[derive(Debug, Default)]
pub struct Overrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub kubeconfig: Option<PathBuf>,
    pub context: Option<String>,
}

impl Settings {
    pub fn apply(mut self, overrides: Overrides) -> Settings {
        if let Some(host) = overrides.host {
            self.server.host = host;
        }
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
        if overrides.kubeconfig.is_some() {
            self.cluster.kubeconfig = overrides.kubeconfig;
        }
        if overrides.context.is_some() {
            self.cluster.context = overrides.context;
        }
        self
    }
}

pub fn load_from_yaml<P: AsRef<Path>>(path: P) -> anyhow::Result<Settings> {
    let path = path.as_ref();
    let conf_file = std::fs::File::open(path)
        .with_context(|| format!("cannot open configuration file {}", path.display()))?;
    // Workaround for merge anchors.
    // https://github.com/dtolnay/serde-yaml/issues/317
    let mut yaml_value: serde_yaml::Value = serde_yaml::from_reader(conf_file)?;
    yaml_value.apply_merge()?;
    Ok(serde_yaml::from_value(yaml_value)?)
}
