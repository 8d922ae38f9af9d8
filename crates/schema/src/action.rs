//! Actions executed when a rule fires.

use serde::Serialize;

use crate::value::Value;

/// The closed set of action types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// Write `value` to the target directly.
    SetValue,
    /// Call a named method supplied by the caller.
    ApplyMethod,
    /// Look the target up in a named table supplied by the caller.
    ReferenceTable,
    /// Run a named custom evaluator supplied by the caller.
    Evaluate,
}

impl ActionKind {
    pub fn parse(action_type: &str) -> Option<ActionKind> {
        match action_type {
            "set_value" => Some(ActionKind::SetValue),
            "apply_method" => Some(ActionKind::ApplyMethod),
            "reference_table" => Some(ActionKind::ReferenceTable),
            "evaluate" => Some(ActionKind::Evaluate),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::SetValue => "set_value",
            ActionKind::ApplyMethod => "apply_method",
            ActionKind::ReferenceTable => "reference_table",
            ActionKind::Evaluate => "evaluate",
        }
    }
}

/// One output write. For the resolver-backed kinds, `value` holds the
/// name of the method, table or evaluator to use.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Action {
    #[serde(rename = "action_type")]
    pub kind: ActionKind,
    pub target: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    /// Auxiliary metadata (units, table keys). Carried to the output.
    #[serde(skip_serializing_if = "serde_json::Map::is_empty")]
    pub parameters: serde_json::Map<String, serde_json::Value>,
}

impl Action {
    pub fn set_value(target: &str, value: impl Into<Value>) -> Action {
        Action {
            kind: ActionKind::SetValue,
            target: target.to_string(),
            value: Some(value.into()),
            parameters: serde_json::Map::new(),
        }
    }

    /// An action whose value is computed by a named resolver.
    pub fn resolved(kind: ActionKind, target: &str, name: &str) -> Action {
        Action {
            kind,
            target: target.to_string(),
            value: Some(Value::Text(name.to_string())),
            parameters: serde_json::Map::new(),
        }
    }

    pub fn with_parameter(mut self, key: &str, value: serde_json::Value) -> Action {
        self.parameters.insert(key.to_string(), value);
        self
    }

    /// The resolver name for method/table/evaluate actions.
    pub fn reference_name(&self) -> Option<&str> {
        self.value.as_ref().and_then(Value::as_text)
    }
}
