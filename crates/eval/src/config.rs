//! Engine configuration, read from the environment with defaults.

use std::env;

use baseline_schema::{RuleSchema, SchemaError, DEFAULT_MAX_CONDITION_DEPTH};

pub const ENV_UNIT_CHECK: &str = "BASELINE_UNIT_CHECK";
pub const ENV_MAX_CONDITION_DEPTH: &str = "BASELINE_MAX_CONDITION_DEPTH";
pub const ENV_LOG_LEVEL: &str = "BASELINE_LOG_LEVEL";

/// Behavior switches for the evaluator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Compare a leaf's unit with the specification's `<field>_unit` entry.
    pub unit_check: bool,
    /// Upper bound on condition tree depth, checked by
    /// [`EngineConfig::load_schema`] and `BaselineEngine::load_rules`.
    pub max_condition_depth: usize,
    pub telemetry: TelemetryConfig,
}

/// Tracing controls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    pub log_level: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        TelemetryConfig {
            log_level: "info".to_string(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            unit_check: false,
            max_condition_depth: DEFAULT_MAX_CONDITION_DEPTH,
            telemetry: TelemetryConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Read `BASELINE_*` variables, falling back to defaults for unset ones.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`EngineConfig::from_env`] with an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = EngineConfig::default();

        let unit_check = match lookup(ENV_UNIT_CHECK) {
            Some(raw) => parse_flag(ENV_UNIT_CHECK, &raw)?,
            None => defaults.unit_check,
        };

        let max_condition_depth = match lookup(ENV_MAX_CONDITION_DEPTH) {
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(depth) if depth > 0 => depth,
                _ => return Err(ConfigError::InvalidDepth { value: raw }),
            },
            None => defaults.max_condition_depth,
        };

        let log_level = lookup(ENV_LOG_LEVEL).unwrap_or(defaults.telemetry.log_level);

        Ok(EngineConfig {
            unit_check,
            max_condition_depth,
            telemetry: TelemetryConfig { log_level },
        })
    }

    pub fn with_unit_check(mut self, enabled: bool) -> Self {
        self.unit_check = enabled;
        self
    }

    pub fn with_max_condition_depth(mut self, depth: usize) -> Self {
        self.max_condition_depth = depth;
        self
    }

    /// Load a rule schema using this configuration's depth limit.
    pub fn load_schema(&self, source: &serde_json::Value) -> Result<RuleSchema, SchemaError> {
        RuleSchema::from_source_with_depth(source, self.max_condition_depth)
    }
}

fn parse_flag(var: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::InvalidFlag {
            var,
            value: raw.to_string(),
        }),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} must be a boolean flag, got '{value}'")]
    InvalidFlag { var: &'static str, value: String },

    #[error("BASELINE_MAX_CONDITION_DEPTH must be a positive integer, got '{value}'")]
    InvalidDepth { value: String },
}
