pub mod ask;
pub mod doctor;
pub mod knowledge;
pub mod serve;
pub mod status;

use std::path::Path;

use llmgate_config::AppConfig;

/// Load the configuration from `path`, or from the default location.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, Box<dyn std::error::Error>> {
    let config = match path {
        Some(path) => AppConfig::load_with_env(path),
        None => AppConfig::load(),
    }
    .map_err(|e| format!("Failed to load config: {e}"))?;

    tracing::debug!(path = ?path, model = %config.backend.default_model, "Configuration loaded");
    Ok(config)
}
