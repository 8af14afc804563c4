use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::time::Duration;

use crate::upload::OrchestratorConfig;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub audio: AudioConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub upload: UploadConfig,
    pub identity: IdentityConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Deserialize)]
pub struct AudioConfig {
    /// Where finished artifacts are written
    pub recordings_path: String,
    /// File replayed by the file capture device
    pub source_file: String,
}

#[derive(Debug, Deserialize)]
pub struct StorageConfig {
    /// Root directory of the local object, index and drive stores
    pub root: String,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    pub app_root_folder: String,
    pub semester_term: String,
    pub collection: String,
    pub network_timeout_secs: u64,
}

impl Default for UploadConfig {
    fn default() -> Self {
        let defaults = OrchestratorConfig::default();
        Self {
            app_root_folder: defaults.app_root_folder,
            semester_term: defaults.semester_term,
            collection: defaults.collection,
            network_timeout_secs: defaults.network_timeout.as_secs(),
        }
    }
}

impl UploadConfig {
    pub fn to_orchestrator_config(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            app_root_folder: self.app_root_folder.clone(),
            semester_term: self.semester_term.clone(),
            collection: self.collection.clone(),
            network_timeout: Duration::from_secs(self.network_timeout_secs),
            ..OrchestratorConfig::default()
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct IdentityConfig {
    /// Signed-in user; absent means uploads fail with `NotAuthenticated`
    pub uid: Option<String>,
    pub display_name: Option<String>,
    /// Whether the hierarchical drive client is available
    #[serde(default = "default_true")]
    pub hierarchy_enabled: bool,
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load `path` (any format the `config` crate detects from the extension),
    /// overridden by `STUDY_BUDDY__SECTION__KEY` environment variables.
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(config::Environment::with_prefix("STUDY_BUDDY").separator("__"))
            .build()
            .with_context(|| format!("Failed to read config '{}'", path))?;

        let cfg: Config = settings.try_deserialize()?;
        if cfg.upload.network_timeout_secs == 0 {
            bail!(
                "Invalid config '{}': upload.network_timeout_secs must be at least 1",
                path
            );
        }

        Ok(cfg)
    }
}
