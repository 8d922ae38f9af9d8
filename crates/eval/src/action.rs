//! Action application.
//!
//! Writes a matched rule's actions into the output in declaration order.
//! Resolver-backed actions that cannot be resolved write null and leave a
//! diagnostic; they never abort generation.

use baseline_schema::{Action, ActionKind, BuildingSpec, Rule, Value};

use crate::diagnostics::{DiagnosticCollector, DiagnosticKind};
use crate::output::BaselineOutput;
use crate::resolver::{ResolveInput, ResolverRegistry};

/// Apply every action of `rule` to `output`.
pub fn apply_actions(
    rule: &Rule,
    spec: &BuildingSpec,
    resolvers: &ResolverRegistry,
    output: &mut BaselineOutput,
    collector: &mut DiagnosticCollector,
) {
    for action in &rule.actions {
        let value = match action.kind {
            ActionKind::SetValue => action.value.clone().unwrap_or(Value::Null),
            kind => resolve_action(kind, rule, action, spec, resolvers, output, collector),
        };
        tracing::debug!(
            rule = %rule.id,
            action = action.kind.as_str(),
            target = %action.target,
            value = %value,
            "applied action"
        );
        output.properties.insert(action.target.clone(), value);

        // Metadata always describes the value currently held by the target.
        if action.parameters.is_empty() {
            output.metadata.remove(&action.target);
        } else {
            output
                .metadata
                .insert(action.target.clone(), action.parameters.clone());
        }
    }
}

fn resolve_action(
    kind: ActionKind,
    rule: &Rule,
    action: &Action,
    spec: &BuildingSpec,
    resolvers: &ResolverRegistry,
    output: &BaselineOutput,
    collector: &mut DiagnosticCollector,
) -> Value {
    let Some(name) = action.reference_name() else {
        collector.record(
            DiagnosticKind::UnresolvedReference,
            &action.target,
            format!("{} action names no resolver", kind.as_str()),
        );
        return Value::Null;
    };
    let input = ResolveInput {
        rule_id: &rule.id,
        target: &action.target,
        spec,
        parameters: &action.parameters,
        properties: &output.properties,
    };
    match resolvers.resolve(kind, name, &input) {
        Some(Ok(v)) => v,
        Some(Err(err)) => {
            collector.record(
                DiagnosticKind::ResolverFailed,
                &action.target,
                format!("{} '{}' failed: {}", kind.as_str(), name, err),
            );
            Value::Null
        }
        None => {
            collector.record(
                DiagnosticKind::UnresolvedReference,
                &action.target,
                format!("no {} resolver registered as '{}'", kind.as_str(), name),
            );
            Value::Null
        }
    }
}
