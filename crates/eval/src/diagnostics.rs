//! Non-fatal evaluation diagnostics.
//!
//! Conditions that could not be decided cleanly (a value that would not
//! coerce, a unit that did not match) and actions whose reference could not
//! be resolved do not abort evaluation. They are recorded here, attributed
//! to the rule that produced them, and surfaced on the output.

use serde::Serialize;

/// What went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// An ordering comparison whose operands had no numeric reading.
    CoercionFailed,
    /// A leaf's unit disagreed with the specification's `<field>_unit`.
    UnitMismatch,
    /// A method, table or evaluator name with no registered resolver.
    UnresolvedReference,
    /// A registered resolver returned an error.
    ResolverFailed,
}

impl DiagnosticKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticKind::CoercionFailed => "coercion_failed",
            DiagnosticKind::UnitMismatch => "unit_mismatch",
            DiagnosticKind::UnresolvedReference => "unresolved_reference",
            DiagnosticKind::ResolverFailed => "resolver_failed",
        }
    }
}

/// A single diagnostic record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub rule_id: String,
    /// The condition field or action target concerned.
    pub subject: String,
    pub message: String,
}

/// Collects diagnostics for one rule while its conditions or actions run.
#[derive(Debug, Clone)]
pub struct DiagnosticCollector {
    rule_id: String,
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticCollector {
    pub fn new(rule_id: &str) -> Self {
        DiagnosticCollector {
            rule_id: rule_id.to_string(),
            diagnostics: Vec::new(),
        }
    }

    pub fn rule_id(&self) -> &str {
        &self.rule_id
    }

    /// Record a diagnostic and emit it as a warning event.
    pub fn record(&mut self, kind: DiagnosticKind, subject: &str, message: String) {
        tracing::warn!(
            rule = %self.rule_id,
            kind = kind.as_str(),
            subject,
            "{}",
            message
        );
        self.diagnostics.push(Diagnostic {
            kind,
            rule_id: self.rule_id.clone(),
            subject: subject.to_string(),
            message,
        });
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}
