//! Environment-backed configuration.
//!
//! Defaults reproduce the production weighting. Override with `POSTER_MATCH_*`
//! environment variables; command-line flags override both.

use std::env;
use std::path::PathBuf;

use thiserror::Error;

use crate::assign::Capacities;
use crate::embedding::EmbedderConfig;
use crate::scoring::lexical::DEFAULT_MAX_FEATURES;
use crate::scoring::ScoreWeights;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value:?} ({reason})")]
    InvalidValue {
        var: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatchConfig {
    pub weights: ScoreWeights,
    pub capacities: Capacities,
    /// TF-IDF vocabulary cap.
    pub max_features: usize,
    /// Sentence-transformer directory; required unless stub embeddings are used.
    pub model_dir: Option<PathBuf>,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            weights: ScoreWeights::default(),
            capacities: Capacities::default(),
            max_features: DEFAULT_MAX_FEATURES,
            model_dir: None,
        }
    }
}

impl MatchConfig {
    pub const ENV_MODEL_DIR: &'static str = "POSTER_MATCH_MODEL_DIR";
    pub const ENV_WEIGHTS: &'static str = "POSTER_MATCH_WEIGHTS";
    pub const ENV_POSTER_CAPACITY: &'static str = "POSTER_MATCH_POSTER_CAPACITY";
    pub const ENV_JUDGE_CAPACITY: &'static str = "POSTER_MATCH_JUDGE_CAPACITY";

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup (the environment in production).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let weights = match get(Self::ENV_WEIGHTS) {
            Some(raw) => parse_weights(&raw)?,
            None => defaults.weights,
        };
        let poster = match get(Self::ENV_POSTER_CAPACITY) {
            Some(raw) => parse_capacity(Self::ENV_POSTER_CAPACITY, &raw)?,
            None => defaults.capacities.poster,
        };
        let judge = match get(Self::ENV_JUDGE_CAPACITY) {
            Some(raw) => parse_capacity(Self::ENV_JUDGE_CAPACITY, &raw)?,
            None => defaults.capacities.judge,
        };

        Ok(Self {
            weights,
            capacities: Capacities { poster, judge },
            model_dir: get(Self::ENV_MODEL_DIR).map(PathBuf::from),
            ..defaults
        })
    }

    pub fn embedder_config(&self, stub: bool) -> EmbedderConfig {
        match (&self.model_dir, stub) {
            (_, true) => EmbedderConfig::stub(),
            (Some(dir), false) => EmbedderConfig::new(dir.clone()),
            (None, false) => EmbedderConfig::default(),
        }
    }
}

/// Parses `semantic,lexical,field,expertise`.
pub fn parse_weights(raw: &str) -> Result<ScoreWeights, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidValue {
        var: MatchConfig::ENV_WEIGHTS,
        value: raw.to_string(),
        reason,
    };

    let values = raw
        .split(',')
        .map(|part| part.trim().parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| invalid(e.to_string()))?;

    match values.as_slice() {
        [semantic, lexical, field, expertise] if values.iter().all(|w| w.is_finite()) => {
            Ok(ScoreWeights {
                semantic: *semantic,
                lexical: *lexical,
                field: *field,
                expertise: *expertise,
            })
        }
        [_, _, _, _] => Err(invalid("weights must be finite".to_string())),
        _ => Err(invalid(format!("expected 4 weights, got {}", values.len()))),
    }
}

fn parse_capacity(var: &'static str, raw: &str) -> Result<usize, ConfigError> {
    match raw.parse::<usize>() {
        Ok(0) => Err(ConfigError::InvalidValue {
            var,
            value: raw.to_string(),
            reason: "capacity must be at least 1".to_string(),
        }),
        Ok(value) => Ok(value),
        Err(e) => Err(ConfigError::InvalidValue {
            var,
            value: raw.to_string(),
            reason: e.to_string(),
        }),
    }
}
