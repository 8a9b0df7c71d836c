use crate::error::AppError;
use config::{Config as Cfg, Environment, File};
use serde::de::DeserializeOwned;
use std::path::PathBuf;

/// Locate `<crate_dir>/config`, whether running from the workspace root or
/// from inside the crate directory.
pub fn configuration_directory(crate_dir: &str) -> Result<PathBuf, AppError> {
    let base_path = std::env::current_dir()
        .map_err(|e| AppError::ConfigError(format!("Failed to determine current directory: {}", e)))?;

    if base_path.ends_with(crate_dir) {
        Ok(base_path.join("config"))
    } else {
        Ok(base_path.join(crate_dir).join("config"))
    }
}

/// Load settings from `config/base.yaml` (optional) overlaid with `APP_`
/// prefixed environment variables, `__` separating nested keys
/// (e.g. `APP_API__BASE_URL`).
pub fn load_configuration<T: DeserializeOwned>(crate_dir: &str) -> Result<T, AppError> {
    dotenvy::dotenv().ok();

    let directory = configuration_directory(crate_dir)?;

    let settings = Cfg::builder()
        .add_source(File::from(directory.join("base.yaml")).required(false))
        .add_source(
            Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    Ok(settings.try_deserialize::<T>()?)
}
