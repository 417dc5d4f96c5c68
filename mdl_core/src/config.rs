//! # Engine Configuration
//!
//! TOML-backed settings for the engine and the CLI. Every section has
//! defaults, so an empty file (or no file at all) yields a usable config.
//!
//! ```toml
//! [logging]
//! level = "debug"
//!
//! [geometry]
//! tolerance = 1e-6
//! rounding_digits = 6
//!
//! [loads]
//! default_policy = "skip"
//!
//! [io]
//! lock_user = "engineer@example.com"
//! ```

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::errors::ModelError;
use crate::geometry::ConflictPolicy;

/// Environment variable that points at an explicit config file.
pub const CONFIG_ENV_VAR: &str = "MDL_CONFIG";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub geometry: GeometryConfig,
    #[serde(default)]
    pub loads: LoadConfig,
    #[serde(default)]
    pub io: IoConfig,
}

impl EngineConfig {
    /// Load configuration from an explicit path.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.geometry.check().map_err(|reason| ConfigError::Invalid {
            path: path.to_path_buf(),
            reason,
        })?;
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Discover the config: `MDL_CONFIG` first, then `./config/default.toml`,
    /// falling back to defaults when neither exists.
    pub fn discover() -> Result<Self, ConfigError> {
        if let Some(path) = env::var_os(CONFIG_ENV_VAR) {
            return Self::from_file(PathBuf::from(path));
        }

        let default_path = env::current_dir()
            .map(|dir| dir.join("config").join("default.toml"))
            .map_err(|source| ConfigError::Context {
                message: "failed to read current working directory".to_string(),
                source,
            })?;

        if default_path.exists() {
            Self::from_file(default_path)
        } else {
            Ok(Self::default())
        }
    }
}

/// Logging configuration; `level` is an `EnvFilter` directive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_string()
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
        }
    }
}

/// Spatial matching settings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GeometryConfig {
    /// Per-axis distance below which two points are the same location
    #[serde(default = "GeometryConfig::default_tolerance")]
    pub tolerance: f64,
    /// Decimal digits used to bucket coordinates in the spatial index
    #[serde(default = "GeometryConfig::default_rounding_digits")]
    pub rounding_digits: u32,
}

impl GeometryConfig {
    pub const DEFAULT_TOLERANCE: f64 = 1e-6;
    pub const DEFAULT_ROUNDING_DIGITS: u32 = 6;
    /// Beyond this, scaled coordinates overflow the `i64` bucket keys.
    pub const MAX_ROUNDING_DIGITS: u32 = 9;

    fn default_tolerance() -> f64 {
        Self::DEFAULT_TOLERANCE
    }

    fn default_rounding_digits() -> u32 {
        Self::DEFAULT_ROUNDING_DIGITS
    }

    pub fn check(&self) -> Result<(), String> {
        if self.rounding_digits > Self::MAX_ROUNDING_DIGITS {
            return Err(format!(
                "geometry.rounding_digits = {} exceeds {}",
                self.rounding_digits,
                Self::MAX_ROUNDING_DIGITS
            ));
        }
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(format!("geometry.tolerance = {} must be positive", self.tolerance));
        }
        Ok(())
    }
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            tolerance: Self::DEFAULT_TOLERANCE,
            rounding_digits: Self::DEFAULT_ROUNDING_DIGITS,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct LoadConfig {
    #[serde(default)]
    pub default_policy: ConflictPolicy,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IoConfig {
    /// Identifier written into `.lock` files; falls back to `$USER`
    #[serde(default)]
    pub lock_user: Option<String>,
}

impl IoConfig {
    pub fn lock_user(&self) -> String {
        self.lock_user
            .clone()
            .or_else(|| env::var("USER").ok())
            .or_else(|| env::var("USERNAME").ok())
            .unwrap_or_else(|| "unknown".to_string())
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid config file {path:?}: {reason}")]
    Invalid { path: PathBuf, reason: String },
    #[error("{message}")]
    Context {
        message: String,
        #[source]
        source: std::io::Error,
    },
}

impl From<ConfigError> for ModelError {
    fn from(err: ConfigError) -> Self {
        let path = match &err {
            ConfigError::Io { path, .. } | ConfigError::Parse { path, .. } | ConfigError::Invalid { path, .. } => {
                path.display().to_string()
            }
            ConfigError::Context { .. } => String::new(),
        };
        ModelError::Config {
            path,
            reason: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.logging.level, "info");
        assert_eq!(cfg.geometry.tolerance, 1e-6);
        assert_eq!(cfg.geometry.rounding_digits, 6);
        assert_eq!(cfg.loads.default_policy, ConflictPolicy::Skip);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let cfg = EngineConfig::from_toml_str("[loads]\ndefault_policy = \"replace\"\n").unwrap();
        assert_eq!(cfg.loads.default_policy, ConflictPolicy::Replace);
        assert_eq!(cfg.geometry.rounding_digits, 6);
        assert_eq!(cfg.logging.level, "info");
    }

    #[test]
    fn test_load_from_temp_file() {
        let mut file = tempfile::NamedTempFile::new().expect("create temp file");
        writeln!(
            file,
            r#"
            [logging]
            level = "debug"

            [geometry]
            tolerance = 1e-4
            rounding_digits = 4

            [io]
            lock_user = "tester"
            "#
        )
        .expect("write config");

        let cfg = EngineConfig::from_file(file.path()).expect("load config");
        assert_eq!(cfg.logging.level, "debug");
        assert_eq!(cfg.geometry.tolerance, 1e-4);
        assert_eq!(cfg.geometry.rounding_digits, 4);
        assert_eq!(cfg.io.lock_user(), "tester");
    }

    #[test]
    fn test_rounding_digits_are_bounded() {
        let mut file = tempfile::NamedTempFile::new().expect("create temp file");
        writeln!(file, "[geometry]\nrounding_digits = 12").expect("write config");

        let err = EngineConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
        let model_err: ModelError = err.into();
        assert_eq!(model_err.error_code(), "CONFIG_ERROR");

        let edge = GeometryConfig {
            rounding_digits: GeometryConfig::MAX_ROUNDING_DIGITS,
            ..GeometryConfig::default()
        };
        assert!(edge.check().is_ok());
    }

    #[test]
    fn test_bad_file_maps_to_model_error() {
        let mut file = tempfile::NamedTempFile::new().expect("create temp file");
        writeln!(file, "[geometry]\ntolerance = \"wide\"").expect("write config");

        let err = EngineConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        let model_err: ModelError = err.into();
        assert_eq!(model_err.error_code(), "CONFIG_ERROR");
    }
}
