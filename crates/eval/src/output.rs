//! Baseline generation results.

use std::collections::BTreeMap;

use baseline_schema::{Rule, Value};
use serde::Serialize;

use crate::diagnostics::Diagnostic;

/// The populated baseline model for one specification.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BaselineOutput {
    /// Target field to final value.
    pub properties: BTreeMap<String, Value>,
    /// Action parameters carried to the output, per target.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, serde_json::Map<String, serde_json::Value>>,
    /// Rules whose actions ran, in application order.
    pub fired: Vec<FiredRule>,
    /// One entry per rule in declaration order.
    pub evaluation_log: Vec<RuleLogEntry>,
    pub diagnostics: Vec<Diagnostic>,
}

impl BaselineOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, target: &str) -> Option<&Value> {
        self.properties.get(target)
    }

    pub fn to_json(&self) -> serde_json::Value {
        // String keys and finite numbers only, so serialization cannot fail.
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }

    /// Ids of fired rules in application order.
    pub fn fired_ids(&self) -> Vec<&str> {
        self.fired.iter().map(|f| f.rule_id.as_str()).collect()
    }

    /// Ids of rules that matched, in declaration order.
    pub fn matched_ids(&self) -> Vec<&str> {
        self.evaluation_log
            .iter()
            .filter(|e| e.status == MatchStatus::Matched)
            .map(|e| e.rule_id.as_str())
            .collect()
    }
}

/// Trace record for one applied rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FiredRule {
    pub rule_id: String,
    pub name: String,
    pub category: String,
    pub priority: i64,
    /// Zero-based position in application order.
    pub step: usize,
}

impl FiredRule {
    pub(crate) fn new(rule: &Rule, step: usize) -> Self {
        FiredRule {
            rule_id: rule.id.clone(),
            name: rule.name.clone(),
            category: rule.category.clone(),
            priority: rule.priority,
            step,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Matched,
    NotMatched,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleLogEntry {
    pub rule_id: String,
    pub status: MatchStatus,
    pub message: String,
}

impl RuleLogEntry {
    pub(crate) fn new(rule: &Rule, matched: bool) -> Self {
        let (status, message) = if matched {
            (
                MatchStatus::Matched,
                format!("Rule '{}' matched and applied", rule.name),
            )
        } else {
            (
                MatchStatus::NotMatched,
                format!("Rule '{}' conditions not met", rule.name),
            )
        };
        RuleLogEntry {
            rule_id: rule.id.clone(),
            status,
            message,
        }
    }
}

/// Pre-flight check of a specification against a rule schema.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SpecValidation {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}
