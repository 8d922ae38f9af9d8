//! Baseline generation.
//!
//! Every rule is evaluated against the specification in declaration order.
//! The matching rules are then stable-sorted by ascending priority and
//! their actions applied in that order, so a higher-priority rule
//! overwrites a lower-priority one on a shared target, and among equal
//! priorities the later-declared rule wins.

use std::sync::Arc;

use baseline_schema::{BuildingSpec, Condition, Rule, RuleSchema, SchemaError};

use crate::action::apply_actions;
use crate::config::EngineConfig;
use crate::diagnostics::DiagnosticCollector;
use crate::numeric;
use crate::output::{BaselineOutput, FiredRule, RuleLogEntry, SpecValidation};
use crate::predicate::{eval_condition, EvalContext};
use crate::resolver::ResolverRegistry;

/// Evaluates a rule schema against building specifications.
///
/// The schema and resolvers are shared immutably, so one engine can serve
/// any number of concurrent `generate_baseline` calls.
#[derive(Debug, Clone)]
pub struct BaselineEngine {
    schema: Arc<RuleSchema>,
    resolvers: Arc<ResolverRegistry>,
    config: EngineConfig,
}

impl BaselineEngine {
    pub fn new(schema: RuleSchema) -> Self {
        Self::with_shared_schema(Arc::new(schema))
    }

    pub fn with_shared_schema(schema: Arc<RuleSchema>) -> Self {
        BaselineEngine {
            schema,
            resolvers: Arc::new(ResolverRegistry::new()),
            config: EngineConfig::default(),
        }
    }

    pub fn with_resolvers(mut self, resolvers: ResolverRegistry) -> Self {
        self.resolvers = Arc::new(resolvers);
        self
    }

    /// Set evaluation switches. The condition depth limit is not applied to
    /// the schema already held; it bounds schemas passed to
    /// [`BaselineEngine::load_rules`] and [`EngineConfig::load_schema`].
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn schema(&self) -> &Arc<RuleSchema> {
        &self.schema
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Replace the rule set. Evaluations already holding the previous
    /// schema are unaffected. A schema whose condition trees exceed the
    /// configured depth is rejected and the current one kept.
    pub fn load_rules(&mut self, schema: RuleSchema) -> Result<(), SchemaError> {
        let max_depth = self.config.max_condition_depth;
        for rule in schema.rules() {
            rule.validate(max_depth)?;
        }
        tracing::info!(
            from = %self.schema.version(),
            to = %schema.version(),
            rules = schema.len(),
            "loaded rule schema"
        );
        self.schema = Arc::new(schema);
        Ok(())
    }

    /// Rules whose conditions hold for `spec`, in declaration order.
    pub fn get_applicable_rules(&self, spec: &BuildingSpec) -> Result<Vec<&Rule>, SchemaError> {
        let ctx = EvalContext::from_config(&self.config);
        let mut applicable = Vec::new();
        for rule in self.schema.rules() {
            let mut collector = DiagnosticCollector::new(&rule.id);
            if rule_matches(rule, spec, &ctx, &mut collector)? {
                applicable.push(rule);
            }
        }
        Ok(applicable)
    }

    /// Produce the baseline model for `spec`.
    pub fn generate_baseline(&self, spec: &BuildingSpec) -> Result<BaselineOutput, SchemaError> {
        let ctx = EvalContext::from_config(&self.config);
        let mut output = BaselineOutput::new();
        let mut applicable: Vec<&Rule> = Vec::new();

        for rule in self.schema.rules() {
            let mut collector = DiagnosticCollector::new(&rule.id);
            let matched = rule_matches(rule, spec, &ctx, &mut collector)?;
            tracing::debug!(rule = %rule.id, matched, "evaluated rule");
            output.diagnostics.extend(collector.into_diagnostics());
            output.evaluation_log.push(RuleLogEntry::new(rule, matched));
            if matched {
                applicable.push(rule);
            }
        }

        applicable.sort_by_key(|rule| rule.priority);

        for (step, rule) in applicable.into_iter().enumerate() {
            let mut collector = DiagnosticCollector::new(&rule.id);
            apply_actions(rule, spec, &self.resolvers, &mut output, &mut collector);
            output.diagnostics.extend(collector.into_diagnostics());
            output.fired.push(FiredRule::new(rule, step));
        }

        tracing::info!(
            version = %self.schema.version(),
            rules = self.schema.len(),
            fired = output.fired.len(),
            properties = output.properties.len(),
            diagnostics = output.diagnostics.len(),
            "generated baseline"
        );
        Ok(output)
    }

    /// Check `spec` against the fields the schema's conditions read.
    ///
    /// Referenced fields the specification lacks are warnings: those
    /// conditions will simply not hold. A field compared numerically
    /// that holds a non-numeric value is an error.
    pub fn validate_building_spec(&self, spec: &BuildingSpec) -> SpecValidation {
        let mut report = SpecValidation::default();

        for field in self.schema.referenced_fields() {
            if !spec.contains(&field) {
                report.warnings.push(format!("Missing field: {}", field));
            }
        }

        for rule in self.schema.rules() {
            let Some(condition) = &rule.conditions else {
                continue;
            };
            let mut ordered = Vec::new();
            collect_ordered_fields(condition, &mut ordered);
            for field in ordered {
                let Some(value) = spec.lookup(&field) else {
                    continue;
                };
                if !value.is_null() && numeric::coerce_number(value).is_none() {
                    let message = format!(
                        "Field '{}' is compared numerically by rule '{}' but holds {} {}",
                        field,
                        rule.id,
                        value.type_name(),
                        value
                    );
                    if !report.errors.contains(&message) {
                        report.errors.push(message);
                    }
                }
            }
        }

        report.valid = report.errors.is_empty();
        report
    }
}

fn rule_matches(
    rule: &Rule,
    spec: &BuildingSpec,
    ctx: &EvalContext,
    collector: &mut DiagnosticCollector,
) -> Result<bool, SchemaError> {
    match &rule.conditions {
        None => Ok(true),
        Some(condition) => {
            eval_condition(condition, spec, ctx, collector).map_err(|e| e.in_rule(&rule.id))
        }
    }
}

fn collect_ordered_fields(condition: &Condition, out: &mut Vec<String>) {
    match condition {
        Condition::Leaf(cmp) => {
            if cmp.operator.is_ordering() && !out.contains(&cmp.field) {
                out.push(cmp.field.clone());
            }
        }
        Condition::Group(group) => {
            for child in &group.conditions {
                collect_ordered_fields(child, out);
            }
        }
    }
}
