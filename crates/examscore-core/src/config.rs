//! Engine configuration and loading.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Tunables for evaluation and aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Tolerance for numerical questions that don't carry their own.
    /// `None` means such questions cannot be scored and resolve to incorrect.
    #[serde(default = "default_tolerance")]
    pub default_numerical_tolerance: Option<f64>,
    /// Chapters at or above this accuracy are strengths.
    #[serde(default = "default_strength_threshold")]
    pub strength_threshold: f64,
    /// Chapters below this accuracy are weaknesses.
    #[serde(default = "default_weakness_threshold")]
    pub weakness_threshold: f64,
    /// Bucket key used when a question has no value for a dimension.
    #[serde(default = "default_unclassified_label")]
    pub unclassified_label: String,
}

fn default_tolerance() -> Option<f64> {
    Some(0.01)
}
fn default_strength_threshold() -> f64 {
    0.70
}
fn default_weakness_threshold() -> f64 {
    0.40
}
fn default_unclassified_label() -> String {
    "unclassified".to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_numerical_tolerance: default_tolerance(),
            strength_threshold: default_strength_threshold(),
            weakness_threshold: default_weakness_threshold(),
            unclassified_label: default_unclassified_label(),
        }
    }
}

impl EngineConfig {
    /// Check that thresholds and tolerance are usable.
    pub fn validate(&self) -> Result<(), EngineError> {
        let in_unit = |v: f64| v.is_finite() && (0.0..=1.0).contains(&v);
        if !in_unit(self.strength_threshold) || !in_unit(self.weakness_threshold) {
            return Err(EngineError::InvalidConfig(
                "chapter thresholds must be within [0, 1]".into(),
            ));
        }
        if self.weakness_threshold > self.strength_threshold {
            return Err(EngineError::InvalidConfig(format!(
                "weakness_threshold ({}) exceeds strength_threshold ({})",
                self.weakness_threshold, self.strength_threshold
            )));
        }
        if let Some(tolerance) = self.default_numerical_tolerance {
            if !tolerance.is_finite() || tolerance < 0.0 {
                return Err(EngineError::InvalidConfig(format!(
                    "default_numerical_tolerance must be a non-negative number, got {tolerance}"
                )));
            }
        }
        if self.unclassified_label.trim().is_empty() {
            return Err(EngineError::InvalidConfig(
                "unclassified_label must not be empty".into(),
            ));
        }
        Ok(())
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `examscore.toml` in the current directory
/// 2. `~/.config/examscore/config.toml`
///
/// Environment variable override: `EXAMSCORE_DEFAULT_TOLERANCE`.
pub fn load_config() -> Result<EngineConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<EngineConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("examscore.toml");
        if local.exists() {
            Some(local)
        } else if let Some(home) = dirs_path() {
            let global = home.join("config.toml");
            if global.exists() {
                Some(global)
            } else {
                None
            }
        } else {
            None
        }
    };

    let mut config = match config_path {
        Some(path) => {
            tracing::debug!("loading config from {}", path.display());
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            parse_config_str(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => EngineConfig::default(),
    };

    if let Ok(raw) = std::env::var("EXAMSCORE_DEFAULT_TOLERANCE") {
        let tolerance = raw
            .trim()
            .parse::<f64>()
            .with_context(|| format!("invalid EXAMSCORE_DEFAULT_TOLERANCE: '{raw}'"))?;
        config.default_numerical_tolerance = Some(tolerance);
    }

    config.validate()?;
    Ok(config)
}

/// Parse a TOML string into an `EngineConfig` without validating it.
pub fn parse_config_str(content: &str) -> Result<EngineConfig> {
    Ok(toml::from_str::<EngineConfig>(content)?)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("examscore"))
}
