//! Environment source: `STRUCTSYNC__BACKEND__BASE_URL=...` style variables.

use config::builder::DefaultState;
use config::{ConfigBuilder, Environment};

pub fn add_to_builder(builder: ConfigBuilder<DefaultState>) -> ConfigBuilder<DefaultState> {
    builder.add_source(
        Environment::with_prefix("STRUCTSYNC")
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true),
    )
}
