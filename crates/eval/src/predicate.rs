//! Condition tree evaluator.
//!
//! Evaluates a [`Condition`] against a [`BuildingSpec`] to a boolean.
//! Groups short-circuit left to right. A field that is missing from the
//! specification, or explicitly null, makes a leaf false, except for the
//! negative operators `not_equals` and `not_in`, which are true.
//!
//! Coercion failures and unit mismatches are not errors: the leaf is false
//! and a diagnostic is recorded on the collector.

use baseline_schema::{
    BuildingSpec, Comparison, ComparisonOp, Condition, ConditionGroup, LogicalOp, Operand,
    SchemaError, Value,
};

use crate::config::EngineConfig;
use crate::diagnostics::{DiagnosticCollector, DiagnosticKind};
use crate::numeric;

/// Evaluation switches taken from the engine configuration.
#[derive(Debug, Clone, Default)]
pub struct EvalContext {
    pub unit_check: bool,
}

impl EvalContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        EvalContext {
            unit_check: config.unit_check,
        }
    }
}

/// Evaluate a condition tree against a specification.
///
/// Only structural defects are errors; those are normally rejected when
/// the schema is built, so this fails only for hand-assembled trees.
pub fn eval_condition(
    condition: &Condition,
    spec: &BuildingSpec,
    ctx: &EvalContext,
    collector: &mut DiagnosticCollector,
) -> Result<bool, SchemaError> {
    match condition {
        Condition::Leaf(cmp) => eval_comparison(cmp, spec, ctx, collector),
        Condition::Group(group) => eval_group(group, spec, ctx, collector),
    }
}

/// Evaluate with default switches, discarding diagnostics.
pub fn condition_holds(condition: &Condition, spec: &BuildingSpec) -> Result<bool, SchemaError> {
    let mut collector = DiagnosticCollector::new("");
    eval_condition(condition, spec, &EvalContext::new(), &mut collector)
}

fn eval_group(
    group: &ConditionGroup,
    spec: &BuildingSpec,
    ctx: &EvalContext,
    collector: &mut DiagnosticCollector,
) -> Result<bool, SchemaError> {
    match group.operator {
        LogicalOp::And => {
            for child in &group.conditions {
                if !eval_condition(child, spec, ctx, collector)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        LogicalOp::Or => {
            for child in &group.conditions {
                if eval_condition(child, spec, ctx, collector)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
        LogicalOp::Not => match group.conditions.as_slice() {
            [only] => Ok(!eval_condition(only, spec, ctx, collector)?),
            children => Err(SchemaError::NotArity {
                count: children.len(),
            }),
        },
    }
}

fn eval_comparison(
    cmp: &Comparison,
    spec: &BuildingSpec,
    ctx: &EvalContext,
    collector: &mut DiagnosticCollector,
) -> Result<bool, SchemaError> {
    cmp.check_operand()?;

    let actual = match spec.lookup(&cmp.field) {
        None | Some(Value::Null) => return Ok(cmp.operator.is_negative()),
        Some(v) => v,
    };

    if ctx.unit_check && !units_agree(cmp, spec, collector) {
        return Ok(false);
    }

    match (cmp.operator, &cmp.value) {
        (ComparisonOp::Equals, Operand::Scalar(expected)) => {
            Ok(numeric::values_equal(actual, expected))
        }
        (ComparisonOp::NotEquals, Operand::Scalar(expected)) => {
            Ok(!numeric::values_equal(actual, expected))
        }
        (ComparisonOp::In, Operand::List(items)) => {
            Ok(items.iter().any(|item| numeric::values_equal(actual, item)))
        }
        (ComparisonOp::NotIn, Operand::List(items)) => {
            Ok(!items.iter().any(|item| numeric::values_equal(actual, item)))
        }
        (op, Operand::Scalar(expected)) if op.is_ordering() => {
            match (numeric::coerce_number(actual), numeric::coerce_number(expected)) {
                (Some(left), Some(right)) => {
                    Ok(numeric::compare_ordered(op, left, right).unwrap_or(false))
                }
                _ => {
                    collector.record(
                        DiagnosticKind::CoercionFailed,
                        &cmp.field,
                        format!(
                            "cannot compare {} {} {} {} {} numerically",
                            actual.type_name(),
                            actual,
                            op.as_str(),
                            expected.type_name(),
                            expected
                        ),
                    );
                    Ok(false)
                }
            }
        }
        (op, _) => Err(SchemaError::InvalidOperand {
            op: op.as_str().to_string(),
            message: "operand does not fit operator".to_string(),
        }),
    }
}

/// When both the leaf and the specification name a unit, they must agree
/// (case-insensitively). A side without a unit is not checked.
fn units_agree(cmp: &Comparison, spec: &BuildingSpec, collector: &mut DiagnosticCollector) -> bool {
    let Some(expected) = cmp.unit.as_deref() else {
        return true;
    };
    let unit_field = format!("{}_unit", cmp.field);
    let Some(actual) = spec.lookup(&unit_field).and_then(Value::as_text) else {
        return true;
    };
    if actual.trim().eq_ignore_ascii_case(expected.trim()) {
        return true;
    }
    collector.record(
        DiagnosticKind::UnitMismatch,
        &cmp.field,
        format!(
            "condition expects unit '{}' but {} is '{}'",
            expected, unit_field, actual
        ),
    );
    false
}
