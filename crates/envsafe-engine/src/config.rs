//! Engine configuration.
//!
//! Tunables for the resolver and the legacy evaluation policy. Defaults
//! match the values the product has always used. Override via environment
//! variables or a YAML document.

use serde::{Deserialize, Serialize};

use envsafe_core::{JurisdictionCode, MAX_CHAIN_DEPTH};

/// Warning boundary as a fraction of the limit when a legacy threshold
/// does not set its own ratio.
pub const DEFAULT_WARNING_RATIO: f64 = 0.8;

/// Configuration for threshold resolution and status evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Legacy warning ratio applied when a threshold has none.
    pub default_warning_ratio: f64,
    /// Maximum number of jurisdictions examined in a parent chain walk.
    pub max_chain_depth: usize,
    /// Overrides the jurisdiction flagged default in the jurisdiction table.
    pub default_jurisdiction: Option<JurisdictionCode>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_warning_ratio: DEFAULT_WARNING_RATIO,
            max_chain_depth: MAX_CHAIN_DEPTH,
            default_jurisdiction: None,
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `ENVSAFE_WARNING_RATIO` (default: 0.8)
    /// - `ENVSAFE_MAX_CHAIN_DEPTH` (default: 4)
    /// - `ENVSAFE_DEFAULT_JURISDICTION` (default: the table's default)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup("ENVSAFE_WARNING_RATIO") {
            config.default_warning_ratio =
                raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                    var: "ENVSAFE_WARNING_RATIO".to_string(),
                    value: raw.clone(),
                })?;
        }
        if let Some(raw) = lookup("ENVSAFE_MAX_CHAIN_DEPTH") {
            config.max_chain_depth =
                raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                    var: "ENVSAFE_MAX_CHAIN_DEPTH".to_string(),
                    value: raw.clone(),
                })?;
        }
        if let Some(raw) = lookup("ENVSAFE_DEFAULT_JURISDICTION") {
            config.default_jurisdiction =
                Some(
                    JurisdictionCode::new(raw.clone()).map_err(|_| ConfigError::InvalidValue {
                        var: "ENVSAFE_DEFAULT_JURISDICTION".to_string(),
                        value: raw,
                    })?,
                );
        }

        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from YAML. Missing keys keep their defaults.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the engine cannot use.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let ratio = self.default_warning_ratio;
        if !(ratio.is_finite() && ratio > 0.0 && ratio <= 1.0) {
            return Err(ConfigError::InvalidWarningRatio(ratio));
        }
        if self.max_chain_depth == 0 {
            return Err(ConfigError::InvalidChainDepth);
        }
        Ok(())
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value:?}")]
    InvalidValue { var: String, value: String },
    #[error("default warning ratio must be in (0, 1], got {0}")]
    InvalidWarningRatio(f64),
    #[error("max chain depth must be at least 1")]
    InvalidChainDepth,
    #[error("failed to parse configuration YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
