//! Configuration sources: the project file and `GRAFT_*` environment variables

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::ConfigError;
use config::{Environment, File};
use std::path::Path;
use tracing::debug;

/// Name of the project configuration file
pub const CONFIG_FILE_NAME: &str = "graft.toml";

/// Add `<root>/graft.toml` to the builder when it exists.
pub fn add_project_file(
    builder: ConfigBuilder<DefaultState>,
    root: &Path,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let path = root.join(CONFIG_FILE_NAME);
    if !path.exists() {
        debug!(config_path = %path.display(), "No project configuration file");
        return Ok(builder);
    }
    add_file(builder, &path)
}

/// Add an explicit configuration file; it must exist.
pub fn add_file(
    builder: ConfigBuilder<DefaultState>,
    path: &Path,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Ok(builder.add_source(File::from(path).required(true)))
}

/// Add `GRAFT_*` environment overrides, e.g. `GRAFT_OUTPUT=dist` or
/// `GRAFT_WATCH__DEBOUNCE_MS=250`.
pub fn add_environment(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Ok(builder.add_source(
        Environment::with_prefix("GRAFT")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    ))
}
