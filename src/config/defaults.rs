//! Default values applied before any configuration source.

use config::builder::DefaultState;
use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with defaults applied.
pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("upstream", "upstream")?
        .set_default("appended", "appended")?
        .set_default("output", "dist")?
        .set_default("link", "auto")?
        .set_default("watch.debounce_ms", 100)
}
