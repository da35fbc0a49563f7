use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::warn;

use crate::error::EvalError;

pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.85;
pub const DEFAULT_PASS_THRESHOLD: f64 = 0.8;
pub const DEFAULT_MAX_ITEMS_PER_DOCUMENT: usize = 500;

/// How an extracted item is compared with a ground-truth item.
///
/// Deserialization is lenient: an unrecognised string becomes `Strict` and a
/// warning is logged. Use [`MatchMode::from_str`] to get the error instead.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum MatchMode {
    /// Normalized labels equal and types equal.
    #[default]
    Strict,
    /// Label similarity at or above the threshold, types equal.
    Partial,
    /// Types equal with a weak label-overlap floor.
    TypeOnly,
    /// Relationships only: endpoints may be matched in either orientation.
    DirectionAgnostic,
}

impl MatchMode {
    pub const ALL: [MatchMode; 4] = [
        MatchMode::Strict,
        MatchMode::Partial,
        MatchMode::TypeOnly,
        MatchMode::DirectionAgnostic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MatchMode::Strict => "strict",
            MatchMode::Partial => "partial",
            MatchMode::TypeOnly => "type_only",
            MatchMode::DirectionAgnostic => "direction_agnostic",
        }
    }

    /// Parse a mode name, falling back to `Strict` with a warning.
    pub fn parse_lenient(value: &str) -> Self {
        value.parse().unwrap_or_else(|e: EvalError| {
            warn!(mode = value, error = %e, "Unrecognised match mode, falling back to strict");
            MatchMode::Strict
        })
    }
}

impl FromStr for MatchMode {
    type Err = EvalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase().replace('-', "_");
        match key.as_str() {
            "strict" => Ok(MatchMode::Strict),
            "partial" => Ok(MatchMode::Partial),
            "type_only" | "typeonly" => Ok(MatchMode::TypeOnly),
            "direction_agnostic" | "directionagnostic" => Ok(MatchMode::DirectionAgnostic),
            _ => Err(EvalError::UnknownMode(s.to_string())),
        }
    }
}

impl From<String> for MatchMode {
    fn from(value: String) -> Self {
        MatchMode::parse_lenient(&value)
    }
}

impl fmt::Display for MatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options for a single evaluation call.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct EvalOptions {
    #[serde(default)]
    pub mode: MatchMode,
    #[serde(default = "default_similarity_threshold", alias = "similarityThreshold")]
    pub similarity_threshold: f64,
}

fn default_similarity_threshold() -> f64 {
    DEFAULT_SIMILARITY_THRESHOLD
}

impl Default for EvalOptions {
    fn default() -> Self {
        Self {
            mode: MatchMode::Strict,
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
        }
    }
}

impl EvalOptions {
    pub fn new(mode: MatchMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    pub fn strict() -> Self {
        Self::new(MatchMode::Strict)
    }

    /// Fuzzy label matching at a forgiving threshold.
    pub fn lenient() -> Self {
        Self {
            mode: MatchMode::Partial,
            similarity_threshold: 0.7,
        }
    }

    pub fn direction_agnostic() -> Self {
        Self::new(MatchMode::DirectionAgnostic)
    }

    pub fn with_threshold(mut self, similarity_threshold: f64) -> Self {
        self.similarity_threshold = similarity_threshold;
        self
    }

    pub fn validate(&self) -> crate::error::Result<()> {
        let t = self.similarity_threshold;
        if t.is_finite() && (0.0..=1.0).contains(&t) {
            Ok(())
        } else {
            Err(EvalError::InvalidThreshold(t))
        }
    }

    /// The threshold actually used for matching: clamped into `[0, 1]`,
    /// NaN replaced by the default.
    pub fn effective_threshold(&self) -> f64 {
        match self.validate() {
            Ok(()) => self.similarity_threshold,
            Err(e) => {
                let t = self.similarity_threshold;
                let fixed = if t.is_nan() {
                    DEFAULT_SIMILARITY_THRESHOLD
                } else {
                    t.clamp(0.0, 1.0)
                };
                warn!(error = %e, using = fixed, "Similarity threshold out of range");
                fixed
            }
        }
    }
}

/// Configuration of a benchmark-suite run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkConfig {
    #[serde(default)]
    pub options: EvalOptions,
    /// Minimum score a case needs to pass.
    #[serde(default = "default_pass_threshold")]
    pub pass_threshold: f64,
    #[serde(default)]
    pub concurrency: ConcurrencyConfig,
    /// Items beyond this count in a single document are dropped before scoring.
    #[serde(default = "default_max_items")]
    pub max_items_per_document: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConcurrencyConfig {
    #[serde(default)]
    pub parallel: bool,
    /// `None` lets rayon pick the thread count.
    #[serde(default)]
    pub num_threads: Option<usize>,
}

fn default_pass_threshold() -> f64 {
    DEFAULT_PASS_THRESHOLD
}

fn default_max_items() -> usize {
    DEFAULT_MAX_ITEMS_PER_DOCUMENT
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            options: EvalOptions::default(),
            pass_threshold: DEFAULT_PASS_THRESHOLD,
            concurrency: ConcurrencyConfig::default(),
            max_items_per_document: DEFAULT_MAX_ITEMS_PER_DOCUMENT,
        }
    }
}

impl BenchmarkConfig {
    /// Parallel documents, lenient matching, smaller per-document cap.
    pub fn fast() -> Self {
        Self {
            options: EvalOptions::lenient(),
            pass_threshold: 0.7,
            concurrency: ConcurrencyConfig {
                parallel: true,
                num_threads: None,
            },
            max_items_per_document: 200,
        }
    }

    /// Sequential, strict matching, generous cap.
    pub fn thorough() -> Self {
        Self {
            options: EvalOptions::strict(),
            pass_threshold: 0.9,
            concurrency: ConcurrencyConfig {
                parallel: false,
                num_threads: None,
            },
            max_items_per_document: 2000,
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse benchmark config")
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read config file: {:?}", path))?;
        Self::from_json_str(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_from_str_accepts_variants() {
        assert_eq!("STRICT".parse::<MatchMode>().unwrap(), MatchMode::Strict);
        assert_eq!("partial".parse::<MatchMode>().unwrap(), MatchMode::Partial);
        assert_eq!("TYPE_ONLY".parse::<MatchMode>().unwrap(), MatchMode::TypeOnly);
        assert_eq!(
            "direction-agnostic".parse::<MatchMode>().unwrap(),
            MatchMode::DirectionAgnostic
        );
        assert!(matches!(
            "fuzzy".parse::<MatchMode>(),
            Err(EvalError::UnknownMode(_))
        ));
    }

    #[test]
    fn test_unknown_mode_deserializes_as_strict() {
        let mode: MatchMode = serde_json::from_str(r#""fuzzy""#).unwrap();
        assert_eq!(mode, MatchMode::Strict);

        let mode: MatchMode = serde_json::from_str(r#""direction_agnostic""#).unwrap();
        assert_eq!(mode, MatchMode::DirectionAgnostic);
    }

    #[test]
    fn test_mode_serializes_snake_case() {
        assert_eq!(serde_json::to_string(&MatchMode::TypeOnly).unwrap(), r#""type_only""#);
    }

    #[test]
    fn test_options_defaults() {
        let options: EvalOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(options.mode, MatchMode::Strict);
        assert_eq!(options.similarity_threshold, DEFAULT_SIMILARITY_THRESHOLD);

        let options: EvalOptions =
            serde_json::from_str(r#"{"mode": "partial", "similarityThreshold": 0.7}"#).unwrap();
        assert_eq!(options, EvalOptions::lenient());
    }

    #[test]
    fn test_effective_threshold_clamps() {
        assert_eq!(EvalOptions::strict().with_threshold(1.5).effective_threshold(), 1.0);
        assert_eq!(EvalOptions::strict().with_threshold(-0.2).effective_threshold(), 0.0);
        assert_eq!(
            EvalOptions::strict().with_threshold(f64::NAN).effective_threshold(),
            DEFAULT_SIMILARITY_THRESHOLD
        );
        assert!(EvalOptions::strict().with_threshold(0.5).validate().is_ok());
    }

    #[test]
    fn test_benchmark_config_presets() {
        let fast = BenchmarkConfig::fast();
        assert!(fast.concurrency.parallel);
        assert_eq!(fast.options.mode, MatchMode::Partial);

        let config = BenchmarkConfig::from_json_str(r#"{"pass_threshold": 0.5}"#).unwrap();
        assert_eq!(config.pass_threshold, 0.5);
        assert_eq!(config.max_items_per_document, DEFAULT_MAX_ITEMS_PER_DOCUMENT);
        assert!(!config.concurrency.parallel);
    }
}
