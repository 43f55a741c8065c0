//! Project file source: `<root>/.config.flow-splitter.json`

use crate::config::CONFIG_FILE;
use config::builder::DefaultState;
use config::{ConfigBuilder, File, FileFormat};
use std::path::Path;

/// Add the project config file; absent files are skipped.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
    project_root: &Path,
) -> ConfigBuilder<DefaultState> {
    add_file_to_builder(builder, &project_root.join(CONFIG_FILE), false)
}

/// Add a JSON config file at an explicit path.
pub fn add_file_to_builder(
    builder: ConfigBuilder<DefaultState>,
    path: &Path,
    required: bool,
) -> ConfigBuilder<DefaultState> {
    builder.add_source(File::from(path).format(FileFormat::Json).required(required))
}
