//! Configuration loading and types for nbbake.
//!
//! This module handles all aspects of configuration:
//! - Type definitions for config structures (`types`)
//! - Loading configs from files and the environment (`load`)

mod load;
mod types;

// Re-export all types for convenient access
pub use load::DEFAULT_CONFIG_FILE;
pub use types::{
    BakeConfig, ExecuteConfig, NamingConfig, RenderConfig, RenderEngine, StyleTable,
};

// =============================================================================
// Errors
// =============================================================================

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("failed to encode config file path as a unicode string: {0}")]
    EncodePath(std::path::PathBuf),

    #[error("failed to deserialize config: {0}")]
    Deserialize(#[from] config::ConfigError),

    #[error("invalid config: {0}")]
    Validation(String),
}

impl BakeConfig {
    /// Reject configurations the pipeline can't work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for required in ["default", "exercise"] {
            if !self.styles.contains(required) {
                return Err(ConfigError::Validation(format!(
                    "'styles' must define the '{required}' class"
                )));
            }
        }
        if self.strip.marker.is_empty() {
            return Err(ConfigError::Validation(
                "'strip.marker' must not be empty".to_string(),
            ));
        }
        if self.resources.dir_name.is_empty() {
            return Err(ConfigError::Validation(
                "'resources.dir_name' must not be empty".to_string(),
            ));
        }
        if self.naming.solved_suffix.is_empty() {
            return Err(ConfigError::Validation(
                "'naming.solved_suffix' must not be empty".to_string(),
            ));
        }
        if self.execute.timeout_secs == 0 || self.render.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "timeouts must be at least one second".to_string(),
            ));
        }
        Ok(())
    }
}
