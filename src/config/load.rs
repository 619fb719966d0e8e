//! Configuration loading.
//!
//! Layers, lowest precedence first: built-in defaults, the YAML config file,
//! then `NBBAKE_*` environment variables (`__` separates nested keys, e.g.
//! `NBBAKE_EXECUTE__TIMEOUT_SECS=900`).

use std::path::{Path, PathBuf};

use super::{BakeConfig, ConfigError};

pub const DEFAULT_CONFIG_FILE: &str = "nbbake.yaml";

const ENV_PREFIX: &str = "NBBAKE";

impl BakeConfig {
    /// Load the config named on the command line, defaulting to `nbbake.yaml`.
    ///
    /// The default file is optional; an explicitly named one must exist.
    pub fn load_from_arg(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        let (path, required) = match config_file {
            Some(path) => (path.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };
        Self::load_from_file(&path, required)
    }

    /// Load the config from a file path plus the environment.
    pub(crate) fn load_from_file(path: &Path, required: bool) -> Result<Self, ConfigError> {
        let path_str = path
            .as_os_str()
            .to_str()
            .ok_or_else(|| ConfigError::EncodePath(path.to_path_buf()))?;

        let config = config::Config::builder()
            .add_source(config::File::new(path_str, config::FileFormat::Yaml).required(required))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize::<BakeConfig>()?;

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RenderEngine;

    #[test]
    fn test_missing_optional_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = BakeConfig::load_from_file(&dir.path().join("nbbake.yaml"), false).unwrap();
        assert_eq!(config.strip.marker, "###");
        assert_eq!(config.resources.dir_name, "support_files");
        assert!(config.styles.contains("exercise"));
    }

    #[test]
    fn test_missing_required_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = BakeConfig::load_from_file(&dir.path().join("custom.yaml"), true);
        assert!(matches!(result, Err(ConfigError::Deserialize(_))));
    }

    #[test]
    fn test_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nbbake.yaml");
        std::fs::write(
            &path,
            r#"
styles:
  default: "color: red;"
  exercise: "color: green;"
  note: "color: blue;"
execute:
  timeout_secs: 30
render:
  engine: builtin
"#,
        )
        .unwrap();

        let config = BakeConfig::load_from_file(&path, true).unwrap();
        assert_eq!(config.styles.get("note"), Some("color: blue;"));
        assert_eq!(config.execute.timeout_secs, 30);
        // untouched keys in a section keep their defaults
        assert_eq!(config.execute.retries, 2);
        assert_eq!(config.render.engine, RenderEngine::Builtin);
    }

    #[test]
    fn test_styles_must_keep_required_classes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nbbake.yaml");
        std::fs::write(&path, "styles:\n  note: \"color: blue;\"\n").unwrap();

        let err = BakeConfig::load_from_file(&path, true).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }
}
