//! Condition trees: leaf comparisons combined by `and`/`or`/`not` groups.

use serde::Serialize;

use crate::error::SchemaError;
use crate::value::Value;

/// Comparison operators allowed on a leaf condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonOp {
    Equals,
    NotEquals,
    GreaterThan,
    LessThan,
    GreaterThanOrEqual,
    LessThanOrEqual,
    In,
    NotIn,
}

impl ComparisonOp {
    pub fn parse(op: &str) -> Option<ComparisonOp> {
        match op {
            "equals" => Some(ComparisonOp::Equals),
            "not_equals" => Some(ComparisonOp::NotEquals),
            "greater_than" => Some(ComparisonOp::GreaterThan),
            "less_than" => Some(ComparisonOp::LessThan),
            "greater_than_or_equal" => Some(ComparisonOp::GreaterThanOrEqual),
            "less_than_or_equal" => Some(ComparisonOp::LessThanOrEqual),
            "in" => Some(ComparisonOp::In),
            "not_in" => Some(ComparisonOp::NotIn),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ComparisonOp::Equals => "equals",
            ComparisonOp::NotEquals => "not_equals",
            ComparisonOp::GreaterThan => "greater_than",
            ComparisonOp::LessThan => "less_than",
            ComparisonOp::GreaterThanOrEqual => "greater_than_or_equal",
            ComparisonOp::LessThanOrEqual => "less_than_or_equal",
            ComparisonOp::In => "in",
            ComparisonOp::NotIn => "not_in",
        }
    }

    /// `in` and `not_in` take a list operand; every other operator a scalar.
    pub fn takes_list(&self) -> bool {
        matches!(self, ComparisonOp::In | ComparisonOp::NotIn)
    }

    /// Operators that hold when the field is absent.
    pub fn is_negative(&self) -> bool {
        matches!(self, ComparisonOp::NotEquals | ComparisonOp::NotIn)
    }

    /// Operators that require numeric coercion of both sides.
    pub fn is_ordering(&self) -> bool {
        matches!(
            self,
            ComparisonOp::GreaterThan
                | ComparisonOp::LessThan
                | ComparisonOp::GreaterThanOrEqual
                | ComparisonOp::LessThanOrEqual
        )
    }
}

/// Logical operators combining child conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogicalOp {
    And,
    Or,
    Not,
}

impl LogicalOp {
    pub fn parse(op: &str) -> Option<LogicalOp> {
        match op {
            "and" => Some(LogicalOp::And),
            "or" => Some(LogicalOp::Or),
            "not" => Some(LogicalOp::Not),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LogicalOp::And => "and",
            LogicalOp::Or => "or",
            LogicalOp::Not => "not",
        }
    }
}

/// Right-hand side of a comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Operand {
    Scalar(Value),
    List(Vec<Value>),
}

/// A single `field <operator> value` test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Comparison {
    pub field: String,
    pub operator: ComparisonOp,
    pub value: Operand,
    /// Informational unit; only consulted when unit checking is enabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

impl Comparison {
    /// Check that the operand shape matches the operator.
    pub fn check_operand(&self) -> Result<(), SchemaError> {
        match (&self.value, self.operator.takes_list()) {
            (Operand::List(_), true) | (Operand::Scalar(_), false) => Ok(()),
            (Operand::Scalar(_), true) => Err(SchemaError::InvalidOperand {
                op: self.operator.as_str().to_string(),
                message: "expects a list value".to_string(),
            }),
            (Operand::List(_), false) => Err(SchemaError::InvalidOperand {
                op: self.operator.as_str().to_string(),
                message: "expects a scalar value, got a list".to_string(),
            }),
        }
    }
}

/// Child conditions joined by a logical operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConditionGroup {
    pub operator: LogicalOp,
    pub conditions: Vec<Condition>,
}

/// A condition tree node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Condition {
    Leaf(Comparison),
    Group(ConditionGroup),
}

impl Condition {
    pub fn leaf(field: &str, operator: ComparisonOp, value: impl Into<Value>) -> Condition {
        Condition::Leaf(Comparison {
            field: field.to_string(),
            operator,
            value: Operand::Scalar(value.into()),
            unit: None,
        })
    }

    pub fn leaf_list(field: &str, operator: ComparisonOp, values: Vec<Value>) -> Condition {
        Condition::Leaf(Comparison {
            field: field.to_string(),
            operator,
            value: Operand::List(values),
            unit: None,
        })
    }

    pub fn all(conditions: Vec<Condition>) -> Condition {
        Condition::Group(ConditionGroup {
            operator: LogicalOp::And,
            conditions,
        })
    }

    pub fn any(conditions: Vec<Condition>) -> Condition {
        Condition::Group(ConditionGroup {
            operator: LogicalOp::Or,
            conditions,
        })
    }

    pub fn negate(condition: Condition) -> Condition {
        Condition::Group(ConditionGroup {
            operator: LogicalOp::Not,
            conditions: vec![condition],
        })
    }

    /// Attach a unit to a leaf. Groups are returned unchanged.
    pub fn with_unit(self, unit: &str) -> Condition {
        match self {
            Condition::Leaf(mut cmp) => {
                cmp.unit = Some(unit.to_string());
                Condition::Leaf(cmp)
            }
            group => group,
        }
    }

    /// Number of nodes on the longest root-to-leaf path.
    pub fn depth(&self) -> usize {
        match self {
            Condition::Leaf(_) => 1,
            Condition::Group(group) => {
                1 + group
                    .conditions
                    .iter()
                    .map(Condition::depth)
                    .max()
                    .unwrap_or(0)
            }
        }
    }

    /// Structural validation: operand shapes, `not` arity and depth.
    pub fn validate(&self, max_depth: usize) -> Result<(), SchemaError> {
        let depth = self.depth();
        if depth > max_depth {
            return Err(SchemaError::DepthExceeded {
                depth,
                max: max_depth,
            });
        }
        self.validate_node()
    }

    fn validate_node(&self) -> Result<(), SchemaError> {
        match self {
            Condition::Leaf(cmp) => cmp.check_operand(),
            Condition::Group(group) => {
                if group.operator == LogicalOp::Not && group.conditions.len() != 1 {
                    return Err(SchemaError::NotArity {
                        count: group.conditions.len(),
                    });
                }
                group
                    .conditions
                    .iter()
                    .try_for_each(Condition::validate_node)
            }
        }
    }

    /// Every leaf field in the tree, first occurrence order, no duplicates.
    pub fn referenced_fields(&self) -> Vec<String> {
        let mut fields = Vec::new();
        self.collect_fields(&mut fields);
        fields
    }

    pub(crate) fn collect_fields(&self, out: &mut Vec<String>) {
        match self {
            Condition::Leaf(cmp) => {
                if !out.contains(&cmp.field) {
                    out.push(cmp.field.clone());
                }
            }
            Condition::Group(group) => {
                for child in &group.conditions {
                    child.collect_fields(out);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operator_names_round_trip() {
        for name in [
            "equals",
            "not_equals",
            "greater_than",
            "less_than",
            "greater_than_or_equal",
            "less_than_or_equal",
            "in",
            "not_in",
        ] {
            assert_eq!(ComparisonOp::parse(name).unwrap().as_str(), name);
        }
        assert!(ComparisonOp::parse("approximately").is_none());
        assert!(LogicalOp::parse("xor").is_none());
    }

    #[test]
    fn depth_counts_nested_groups() {
        let leaf = Condition::leaf("climate_zone", ComparisonOp::Equals, "5a");
        assert_eq!(leaf.depth(), 1);
        let tree = Condition::all(vec![Condition::any(vec![leaf.clone()]), leaf]);
        assert_eq!(tree.depth(), 3);
        assert_eq!(Condition::all(vec![]).depth(), 1);
    }

    #[test]
    fn validate_rejects_not_with_two_children() {
        let a = Condition::leaf("a", ComparisonOp::Equals, 1i64);
        let b = Condition::leaf("b", ComparisonOp::Equals, 2i64);
        let bad = Condition::all(vec![Condition::Group(ConditionGroup {
            operator: LogicalOp::Not,
            conditions: vec![a, b],
        })]);
        assert_eq!(bad.validate(64), Err(SchemaError::NotArity { count: 2 }));
    }

    #[test]
    fn validate_rejects_scalar_operand_for_in() {
        let bad = Condition::leaf("climate_zone", ComparisonOp::In, "5a");
        assert!(matches!(
            bad.validate(64),
            Err(SchemaError::InvalidOperand { .. })
        ));
    }

    #[test]
    fn validate_enforces_depth_limit() {
        let mut tree = Condition::leaf("a", ComparisonOp::Equals, 1i64);
        for _ in 0..5 {
            tree = Condition::all(vec![tree]);
        }
        assert_eq!(
            tree.validate(3),
            Err(SchemaError::DepthExceeded { depth: 6, max: 3 })
        );
        assert!(tree.validate(6).is_ok());
    }

    #[test]
    fn referenced_fields_are_deduplicated() {
        let tree = Condition::any(vec![
            Condition::leaf("climate_zone", ComparisonOp::Equals, "1a"),
            Condition::leaf("climate_zone", ComparisonOp::Equals, "2a"),
            Condition::negate(Condition::leaf("building_area", ComparisonOp::LessThan, 500i64)),
        ]);
        assert_eq!(
            tree.referenced_fields(),
            vec!["climate_zone".to_string(), "building_area".to_string()]
        );
    }

    #[test]
    fn serializes_in_source_shape() {
        let tree = Condition::all(vec![
            Condition::leaf("building_area", ComparisonOp::GreaterThan, 10000i64).with_unit("sqft"),
            Condition::leaf_list(
                "climate_zone",
                ComparisonOp::In,
                vec![Value::from("1a"), Value::from("2a")],
            ),
        ]);
        assert_eq!(
            serde_json::to_value(&tree).unwrap(),
            serde_json::json!({
                "operator": "and",
                "conditions": [
                    {"field": "building_area", "operator": "greater_than", "value": 10000, "unit": "sqft"},
                    {"field": "climate_zone", "operator": "in", "value": ["1a", "2a"]}
                ]
            })
        );
    }
}
