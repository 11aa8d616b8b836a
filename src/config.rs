//! Dataset preparation settings loaded from TOML or built in code.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default filename used to store the preparation configuration.
pub const CONFIG_FILE_NAME: &str = "imageset.toml";

/// Settings that control class admission, split thresholds, and cache layout.
///
/// Split percentages are absolute cutoffs over the hash-derived percentage of
/// a filename: values below `validation_percentage` go to validation, values
/// in `[validation_percentage, testing_percentage)` go to testing, and the
/// rest go to training. With the defaults (both 10.0) the testing band is
/// empty; integrators that want a real testing split must raise
/// `testing_percentage` above `validation_percentage`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrepConfig {
    /// Smallest class size admitted by the catalog.
    #[serde(default = "default_min_images_per_class")]
    pub min_images_per_class: usize,
    /// Largest class size admitted; also the modulus base for split hashing.
    #[serde(default = "default_max_images_per_class")]
    pub max_images_per_class: u64,
    /// Upper bound (exclusive) of the validation band, in percent.
    #[serde(default = "default_split_percentage")]
    pub validation_percentage: f64,
    /// Upper bound (exclusive) of the testing band, in percent.
    #[serde(default = "default_split_percentage")]
    pub testing_percentage: f64,
    /// Bottleneck cache root; defaults to the app cache directory when unset.
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,
}

impl Default for PrepConfig {
    fn default() -> Self {
        Self {
            min_images_per_class: default_min_images_per_class(),
            max_images_per_class: default_max_images_per_class(),
            validation_percentage: default_split_percentage(),
            testing_percentage: default_split_percentage(),
            cache_dir: None,
        }
    }
}

fn default_min_images_per_class() -> usize {
    20
}

fn default_max_images_per_class() -> u64 {
    (1 << 27) - 1
}

fn default_split_percentage() -> f64 {
    10.0
}

/// Errors produced while loading or validating a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The configuration file did not parse as TOML.
    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    /// `min_images_per_class` exceeds `max_images_per_class`.
    #[error("min_images_per_class {min} exceeds max_images_per_class {max}")]
    InvalidClassBounds { min: usize, max: u64 },
    /// `max_images_per_class` must be non-zero to scale hash values.
    #[error("max_images_per_class must be at least 1")]
    ZeroMaxImages,
    /// A split percentage fell outside `0..=100`.
    #[error("invalid split percentage {value} (expected 0..=100)")]
    InvalidPercentage { value: f64 },
}

impl PrepConfig {
    /// Load a configuration from a TOML file, applying defaults for missing
    /// fields and validating the result.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check invariants that the rest of the pipeline relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_images_per_class == 0 {
            return Err(ConfigError::ZeroMaxImages);
        }
        if self.min_images_per_class as u64 > self.max_images_per_class {
            return Err(ConfigError::InvalidClassBounds {
                min: self.min_images_per_class,
                max: self.max_images_per_class,
            });
        }
        for value in [self.validation_percentage, self.testing_percentage] {
            if !(0.0..=100.0).contains(&value) {
                return Err(ConfigError::InvalidPercentage { value });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn defaults_match_documented_constants() {
        let config = PrepConfig::default();
        assert_eq!(config.min_images_per_class, 20);
        assert_eq!(config.max_images_per_class, (1 << 27) - 1);
        assert_eq!(config.validation_percentage, 10.0);
        assert_eq!(config.testing_percentage, 10.0);
        assert!(config.cache_dir.is_none());
        config.validate().unwrap();
    }

    #[test]
    fn loads_partial_toml_with_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(
            &path,
            "min_images_per_class = 5\ntesting_percentage = 20.0\n",
        )
        .unwrap();
        let config = PrepConfig::load(&path).unwrap();
        assert_eq!(config.min_images_per_class, 5);
        assert_eq!(config.testing_percentage, 20.0);
        assert_eq!(config.validation_percentage, 10.0);
    }

    #[test]
    fn rejects_out_of_range_percentage() {
        let config = PrepConfig {
            validation_percentage: 120.0,
            ..PrepConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidPercentage { .. })
        ));
    }

    #[test]
    fn rejects_min_above_max() {
        let config = PrepConfig {
            min_images_per_class: 50,
            max_images_per_class: 10,
            ..PrepConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidClassBounds { .. })
        ));
    }
}
