//! Merge rules: defaults, override order, conflict handling.

use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with merge policy defaults applied.
///
/// Later sources override earlier ones key by key, so a workspace file only needs the
/// keys it changes.
pub fn builder_with_defaults() -> Result<ConfigBuilder<config::builder::DefaultState>, ConfigError>
{
    Config::builder()
        .set_default("backend.base_url", "http://localhost:8000")?
        .set_default("backend.connect_timeout_secs", 10)?
        .set_default("backend.request_timeout_secs", 120)?
        .set_default("logging.level", "info")
}
