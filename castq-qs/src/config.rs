//! castq-qs specific configuration

use castq_common::config::{database_path, resolve_root_folder, TomlConfig};
use castq_common::EffectiveEnqueueLocation;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Environment variable naming the root folder
pub const ROOT_FOLDER_ENV: &str = "CASTQ_ROOT_FOLDER";

/// Queue service configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub root_folder: PathBuf,
    pub db_path: PathBuf,
    pub bind_addr: SocketAddr,
    /// Written to the settings table only when the database has no value yet
    pub initial_enqueue_location: EffectiveEnqueueLocation,
    /// Default tracing level when `RUST_LOG` is unset
    pub log_level: Option<String>,
}

impl Config {
    /// Combine command-line values, environment and the TOML file
    pub fn resolve(cli_root_folder: Option<&Path>, port: u16, toml_config: &TomlConfig) -> Self {
        let root_folder = resolve_root_folder(cli_root_folder, ROOT_FOLDER_ENV, toml_config);
        Self {
            db_path: database_path(&root_folder),
            root_folder,
            bind_addr: SocketAddr::from(([0, 0, 0, 0], port)),
            initial_enqueue_location: toml_config.default_enqueue_location(),
            log_level: toml_config.log_level.clone(),
        }
    }
}
