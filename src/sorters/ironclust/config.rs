// IronClust configuration
// Where the toolbox lives and how to launch MATLAB, resolved once and passed to each sorter

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use super::install;
use crate::shell::HostOs;

/// Environment variable holding the IronClust checkout path
pub const IRONCLUST_PATH_ENV: &str = "IRONCLUST_PATH";

#[derive(Debug, Clone, PartialEq)]
pub struct IronClustConfig {
    /// Installation path as given, possibly wrapped in quotes
    pub ironclust_path: Option<String>,

    /// MATLAB executable invoked by the launcher script
    pub matlab_command: String,

    /// Extra directory added to the MATLAB path ahead of the toolbox
    pub source_dir: PathBuf,

    pub host_os: HostOs,
}

impl IronClustConfig {
    /// Configuration with no installation path
    pub fn new() -> Self {
        IronClustConfig {
            ironclust_path: None,
            matlab_command: "matlab".to_string(),
            source_dir: PathBuf::from(env!("CARGO_MANIFEST_DIR")),
            host_os: HostOs::current(),
        }
    }

    /// Configuration with the installation path taken from `IRONCLUST_PATH`
    pub fn from_env() -> Self {
        IronClustConfig {
            ironclust_path: std::env::var(IRONCLUST_PATH_ENV).ok(),
            ..IronClustConfig::new()
        }
    }

    /// Process-wide default, read from the environment on first use and never changed
    pub fn global() -> &'static IronClustConfig {
        static GLOBAL: OnceLock<IronClustConfig> = OnceLock::new();
        GLOBAL.get_or_init(|| {
            let config = IronClustConfig::from_env();
            log::debug!(
                "Default IronClust path: {}",
                config.ironclust_path.as_deref().unwrap_or("<unset>")
            );
            config
        })
    }

    pub fn with_ironclust_path(mut self, path: impl AsRef<Path>) -> Self {
        self.ironclust_path = Some(path.as_ref().to_string_lossy().to_string());
        self
    }

    pub fn with_matlab_command(mut self, command: impl Into<String>) -> Self {
        self.matlab_command = command.into();
        self
    }

    pub fn with_source_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.source_dir = dir.into();
        self
    }

    pub fn with_host_os(mut self, host_os: HostOs) -> Self {
        self.host_os = host_os;
        self
    }

    /// Unquoted absolute installation path, if one is configured
    pub fn resolved_path(&self) -> Option<PathBuf> {
        self.ironclust_path
            .as_deref()
            .map(install::resolve_install_path)
    }
}

impl Default for IronClustConfig {
    fn default() -> Self {
        IronClustConfig::new()
    }
}
