//! ConfigLoader: assembles the layered sources into a [`StructsyncConfig`].

use super::merge::merge_policy;
use super::sources::{environment, global_file, workspace_file};
use super::StructsyncConfig;
use config::{Config, ConfigError, File};
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Default)]
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for a workspace: defaults, user file, workspace files, env.
    pub fn load(workspace_root: &Path) -> Result<StructsyncConfig, ConfigError> {
        let builder = merge_policy::builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder)?;
        let builder = workspace_file::add_to_builder(builder, workspace_root)?;
        let builder = environment::add_to_builder(builder);
        let config: StructsyncConfig = builder.build()?.try_deserialize()?;
        debug!(
            workspace = %workspace_root.display(),
            base_url = %config.backend.base_url,
            "configuration loaded"
        );
        Ok(config)
    }

    /// Load a single explicit file on top of the defaults; environment still applies.
    pub fn load_from_file(path: &Path) -> Result<StructsyncConfig, ConfigError> {
        let builder = merge_policy::builder_with_defaults()?
            .add_source(File::from(path.to_path_buf()).required(true));
        let builder = environment::add_to_builder(builder);
        builder.build()?.try_deserialize()
    }

    /// User-level config file location, if a home directory can be determined.
    pub fn global_config_path() -> Option<PathBuf> {
        global_file::global_config_path()
    }

    /// Defaults only.
    pub fn defaults() -> Result<StructsyncConfig, ConfigError> {
        Config::builder()
            .build()?
            .try_deserialize::<StructsyncConfig>()
    }
}
