use baseline_schema::{SchemaError, SpecError};

/// Failure of a one-shot [`crate::generate`] call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EvalError {
    #[error("invalid rule schema: {0}")]
    Schema(#[from] SchemaError),

    #[error("invalid building specification: {0}")]
    Spec(#[from] SpecError),
}
