//! baseline-eval: generates baseline building models from rule schemas.
//!
//! Evaluates every rule of a [`RuleSchema`] against a [`BuildingSpec`],
//! applies the matching rules' actions in priority order, and returns the
//! resulting properties together with a trace of fired rules, a per-rule
//! evaluation log and any non-fatal diagnostics.

pub mod action;
pub mod config;
pub mod diagnostics;
pub mod engine;
pub mod error;
pub mod numeric;
pub mod output;
pub mod predicate;
pub mod resolver;
pub mod telemetry;

pub use baseline_schema::{BuildingSpec, RuleSchema, SchemaError, SpecError, Value};
pub use config::{ConfigError, EngineConfig, TelemetryConfig};
pub use diagnostics::{Diagnostic, DiagnosticKind};
pub use engine::BaselineEngine;
pub use error::EvalError;
pub use output::{BaselineOutput, FiredRule, MatchStatus, RuleLogEntry, SpecValidation};
pub use predicate::{condition_holds, eval_condition, EvalContext};
pub use resolver::{LookupTable, ResolveInput, ResolverError, ResolverRegistry};

/// One-shot entry point: load a rule source and a specification from JSON
/// and generate the baseline with default configuration.
pub fn generate(
    rules: &serde_json::Value,
    spec: &serde_json::Value,
) -> Result<BaselineOutput, EvalError> {
    let schema = RuleSchema::from_source(rules)?;
    let spec = BuildingSpec::from_json(spec)?;
    Ok(BaselineEngine::new(schema).generate_baseline(&spec)?)
}
