// src/config/loader.rs
//! Layered configuration loading (file + environment overrides)

use crate::config::{validate_config, PipelineConfig};
use crate::error::Result;
use config::{Config, Environment, File};
use std::path::Path;

/// Load and validate a pipeline configuration from a TOML file.
///
/// Environment variables prefixed `EMG_STREAM` override file values, e.g.
/// `EMG_STREAM__BUFFER__HISTORY_CAPACITY=1000`.
pub fn load_from_path(path: &Path) -> Result<PipelineConfig> {
    let settings = Config::builder()
        .add_source(File::from(path))
        .add_source(Environment::with_prefix("EMG_STREAM").separator("__"))
        .build()?;

    let config: PipelineConfig = settings.try_deserialize()?;
    validate_config(&config)?;
    Ok(config)
}
