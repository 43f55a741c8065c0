//! Environment variable source: FLOW_SPLITTER_* prefix with __ separator

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::Environment;

/// Add environment variable overlay to builder.
/// Uses FLOW_SPLITTER_ prefix and __ as separator for nested keys,
/// e.g. `FLOW_SPLITTER__LOGGING__LEVEL=debug`.
pub fn add_to_builder(builder: ConfigBuilder<DefaultState>) -> ConfigBuilder<DefaultState> {
    builder.add_source(
        Environment::with_prefix("FLOW_SPLITTER")
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true),
    )
}
