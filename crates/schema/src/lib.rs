//! baseline-schema: rule schema types and deserialization.
//!
//! Provides the closed value type, condition trees, actions, rules, the
//! immutable [`RuleSchema`] and the read-only [`BuildingSpec`]. Rule
//! sources are accepted as `serde_json::Value` mappings shaped
//! `{version, rules: [...]}`; whatever loaded them (YAML, JSON, a text
//! parser) is the caller's concern.

pub mod action;
pub mod condition;
pub mod deserialize;
pub mod error;
pub mod rule;
pub mod spec;
pub mod value;

pub use action::{Action, ActionKind};
pub use condition::{Comparison, ComparisonOp, Condition, ConditionGroup, LogicalOp, Operand};
pub use error::{SchemaError, SpecError};
pub use rule::{Rule, RuleSchema, DEFAULT_MAX_CONDITION_DEPTH};
pub use spec::{BuildingSpec, SpecEntry};
pub use value::Value;
