//! Deserialization from rule source mappings into typed structs.
//!
//! The entry point is [`parse_schema`]; `RuleSchema::from_source` wraps it
//! and adds the cross-rule checks (duplicate ids, depth limits).

use crate::action::{Action, ActionKind};
use crate::condition::{Comparison, ComparisonOp, Condition, ConditionGroup, LogicalOp, Operand};
use crate::error::SchemaError;
use crate::rule::Rule;
use crate::value::Value;

/// Raw parse result before cross-rule validation.
pub(crate) struct ParsedSchema {
    pub version: String,
    pub rules: Vec<Rule>,
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

pub(crate) fn parse_schema(source: &serde_json::Value) -> Result<ParsedSchema, SchemaError> {
    let version = required_str(source, "version")?;

    let rules = match source.get("rules") {
        None | Some(serde_json::Value::Null) => Vec::new(),
        Some(serde_json::Value::Array(items)) => {
            let mut rules = Vec::with_capacity(items.len());
            for (pos, item) in items.iter().enumerate() {
                rules.push(parse_rule(item, pos)?);
            }
            rules
        }
        Some(_) => {
            return Err(SchemaError::MissingField {
                field: "rules".to_string(),
                message: "must be an array".to_string(),
            })
        }
    };

    Ok(ParsedSchema {
        version,
        rules,
        metadata: optional_map(source, "metadata")?,
    })
}

/// Parse a single rule. `pos` labels errors for rules without an id.
pub fn parse_rule(v: &serde_json::Value, pos: usize) -> Result<Rule, SchemaError> {
    let id = required_str(v, "id").map_err(|e| e.in_rule(&format!("#{}", pos)))?;
    parse_rule_body(v, &id).map_err(|e| e.in_rule(&id))
}

fn parse_rule_body(v: &serde_json::Value, id: &str) -> Result<Rule, SchemaError> {
    let category = required_str(v, "category")?;
    let name = optional_str(v, "name")?.unwrap_or_else(|| id.to_string());
    let description = optional_str(v, "description")?.unwrap_or_default();

    let priority = match v.get("priority") {
        None | Some(serde_json::Value::Null) => 0,
        Some(p) => p.as_i64().ok_or_else(|| SchemaError::MissingField {
            field: "priority".to_string(),
            message: "must be an integer".to_string(),
        })?,
    };

    let conditions = match v.get("conditions") {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::Object(obj)) if obj.is_empty() => None,
        Some(c) => Some(parse_condition(c)?),
    };

    let actions = match v.get("actions") {
        Some(serde_json::Value::Array(items)) => items
            .iter()
            .map(parse_action)
            .collect::<Result<Vec<_>, _>>()?,
        _ => {
            return Err(SchemaError::MissingField {
                field: "actions".to_string(),
                message: "must be an array".to_string(),
            })
        }
    };

    Ok(Rule {
        id: id.to_string(),
        name,
        description,
        category,
        priority,
        conditions,
        actions,
        metadata: optional_map(v, "metadata")?,
    })
}

/// Parse a condition node. An object with a `conditions` key is a group,
/// anything else is a leaf comparison.
pub fn parse_condition(v: &serde_json::Value) -> Result<Condition, SchemaError> {
    if !v.is_object() {
        return Err(SchemaError::MissingField {
            field: "conditions".to_string(),
            message: "condition must be an object".to_string(),
        });
    }

    let op = required_str(v, "operator")?;

    if let Some(children) = v.get("conditions") {
        let operator = LogicalOp::parse(&op).ok_or(SchemaError::UnknownOperator { op })?;
        let items = children.as_array().ok_or_else(|| SchemaError::MissingField {
            field: "conditions".to_string(),
            message: "group conditions must be an array".to_string(),
        })?;
        let conditions = items
            .iter()
            .map(parse_condition)
            .collect::<Result<Vec<_>, _>>()?;
        if operator == LogicalOp::Not && conditions.len() != 1 {
            return Err(SchemaError::NotArity {
                count: conditions.len(),
            });
        }
        return Ok(Condition::Group(ConditionGroup {
            operator,
            conditions,
        }));
    }

    let operator = ComparisonOp::parse(&op).ok_or(SchemaError::UnknownOperator { op })?;
    let field = required_str(v, "field")?;
    let raw = v.get("value").ok_or_else(|| SchemaError::MissingField {
        field: "value".to_string(),
        message: format!("condition on '{}' has no value", field),
    })?;

    let value = match raw {
        serde_json::Value::Array(items) => Operand::List(
            items
                .iter()
                .map(scalar)
                .collect::<Result<Vec<_>, _>>()?,
        ),
        other => Operand::Scalar(scalar(other)?),
    };

    let comparison = Comparison {
        field,
        operator,
        value,
        unit: optional_str(v, "unit")?,
    };
    comparison.check_operand()?;
    Ok(Condition::Leaf(comparison))
}

pub fn parse_action(v: &serde_json::Value) -> Result<Action, SchemaError> {
    let action_type = required_str(v, "action_type")?;
    let kind = ActionKind::parse(&action_type)
        .ok_or(SchemaError::UnknownActionType { action_type })?;
    let target = required_str(v, "target")?;
    let value = match v.get("value") {
        None => None,
        Some(raw) => Some(scalar(raw)?),
    };
    Ok(Action {
        kind,
        target,
        value,
        parameters: optional_map(v, "parameters")?,
    })
}

// ── Parsing helpers ─────────────────────────────────────────────────

fn required_str(obj: &serde_json::Value, field: &str) -> Result<String, SchemaError> {
    obj.get(field)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| SchemaError::MissingField {
            field: field.to_string(),
            message: "expected a string".to_string(),
        })
}

fn optional_str(obj: &serde_json::Value, field: &str) -> Result<Option<String>, SchemaError> {
    match obj.get(field) {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(SchemaError::MissingField {
            field: field.to_string(),
            message: "expected a string".to_string(),
        }),
    }
}

fn optional_map(
    obj: &serde_json::Value,
    field: &str,
) -> Result<serde_json::Map<String, serde_json::Value>, SchemaError> {
    match obj.get(field) {
        None | Some(serde_json::Value::Null) => Ok(serde_json::Map::new()),
        Some(serde_json::Value::Object(map)) => Ok(map.clone()),
        Some(_) => Err(SchemaError::MissingField {
            field: field.to_string(),
            message: "expected an object".to_string(),
        }),
    }
}

fn scalar(v: &serde_json::Value) -> Result<Value, SchemaError> {
    Value::from_json(v).map_err(|message| SchemaError::InvalidValue { message })
}
