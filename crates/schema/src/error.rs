//! Error types for rule schema construction and building specifications.

/// Structural defects in a rule schema.
///
/// These are rule-authoring errors: they abort schema construction or the
/// evaluation that hit them, and are never downgraded to warnings.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    /// A required field is absent or has the wrong JSON type.
    #[error("missing or invalid field '{field}': {message}")]
    MissingField { field: String, message: String },

    /// A condition uses an operator outside the closed operator set.
    #[error("unknown condition operator: '{op}'")]
    UnknownOperator { op: String },

    /// An action uses an action type outside the closed set.
    #[error("unknown action type: '{action_type}'")]
    UnknownActionType { action_type: String },

    /// A `not` group does not have exactly one child.
    #[error("'not' group expects exactly one condition, got {count}")]
    NotArity { count: usize },

    /// A comparison operand has the wrong shape for its operator.
    #[error("operator '{op}' {message}")]
    InvalidOperand { op: String, message: String },

    /// Two rules in one schema share an id.
    #[error("duplicate rule id: '{id}'")]
    DuplicateRuleId { id: String },

    /// A condition tree is nested deeper than the configured limit.
    #[error("condition tree depth {depth} exceeds limit {max}")]
    DepthExceeded { depth: usize, max: usize },

    /// A literal value is not a scalar the engine can represent.
    #[error("invalid value: {message}")]
    InvalidValue { message: String },

    /// Any of the above, attributed to the rule it was found in.
    #[error("rule '{rule_id}': {source}")]
    InRule {
        rule_id: String,
        #[source]
        source: Box<SchemaError>,
    },
}

impl SchemaError {
    /// Attribute this error to a rule. Already-attributed errors are kept as is.
    pub fn in_rule(self, rule_id: &str) -> SchemaError {
        match self {
            SchemaError::InRule { .. } => self,
            other => SchemaError::InRule {
                rule_id: rule_id.to_string(),
                source: Box::new(other),
            },
        }
    }

    /// The underlying defect with any rule attribution stripped.
    pub fn root(&self) -> &SchemaError {
        match self {
            SchemaError::InRule { source, .. } => source.root(),
            other => other,
        }
    }
}

/// A building specification that cannot be turned into a lookup record.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SpecError {
    #[error("building specification must be a JSON object, got {got}")]
    NotAnObject { got: String },

    #[error("field '{field}' holds a list; specification values must be scalars or mappings")]
    ListValue { field: String },
}
