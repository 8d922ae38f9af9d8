//! Named resolvers for `apply_method`, `reference_table` and `evaluate`
//! actions.
//!
//! Methods and evaluators are caller-supplied closures. Reference tables
//! are keyed lookups driven by a specification field. Every resolver must
//! be `Send + Sync` so one registry can serve concurrent evaluations.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use baseline_schema::{ActionKind, BuildingSpec, Value};

/// What a resolver sees when it is invoked.
#[derive(Debug, Clone, Copy)]
pub struct ResolveInput<'a> {
    pub rule_id: &'a str,
    pub target: &'a str,
    pub spec: &'a BuildingSpec,
    pub parameters: &'a serde_json::Map<String, serde_json::Value>,
    /// Properties written by earlier actions in this evaluation.
    pub properties: &'a BTreeMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolverError {
    #[error("table '{table}' has no row for key '{key}'")]
    MissingRow { table: String, key: String },

    #[error("table '{table}' is keyed on '{field}', which the specification does not provide")]
    MissingKey { table: String, field: String },

    #[error("{0}")]
    Failed(String),
}

/// A method or evaluator.
pub type ResolverFn =
    Arc<dyn Fn(&ResolveInput<'_>) -> Result<Value, ResolverError> + Send + Sync>;

/// A keyed lookup table.
///
/// The key is read from the specification field named by the action's
/// `key_field` parameter, or the table's own key field when the action does
/// not name one. An action may instead pass a literal `key` parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct LookupTable {
    key_field: String,
    rows: BTreeMap<String, Value>,
    default: Option<Value>,
}

impl LookupTable {
    pub fn new(key_field: &str) -> Self {
        LookupTable {
            key_field: key_field.to_string(),
            rows: BTreeMap::new(),
            default: None,
        }
    }

    pub fn with_row(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.rows.insert(key.to_string(), value.into());
        self
    }

    /// Value used when the key is absent or has no row.
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn lookup(&self, name: &str, input: &ResolveInput<'_>) -> Result<Value, ResolverError> {
        let key = match self.key_for(input) {
            Some(key) => key,
            None => {
                return self.default.clone().ok_or_else(|| ResolverError::MissingKey {
                    table: name.to_string(),
                    field: self.effective_key_field(input).to_string(),
                })
            }
        };
        match self.rows.get(&key) {
            Some(v) => Ok(v.clone()),
            None => self.default.clone().ok_or(ResolverError::MissingRow {
                table: name.to_string(),
                key,
            }),
        }
    }

    fn effective_key_field<'a>(&'a self, input: &ResolveInput<'a>) -> &'a str {
        input
            .parameters
            .get("key_field")
            .and_then(serde_json::Value::as_str)
            .unwrap_or(&self.key_field)
    }

    fn key_for(&self, input: &ResolveInput<'_>) -> Option<String> {
        if let Some(literal) = input.parameters.get("key") {
            return Value::from_json(literal).ok().and_then(|v| key_text(&v));
        }
        input
            .spec
            .lookup(self.effective_key_field(input))
            .and_then(key_text)
    }
}

/// Render a scalar as a table key. Numbers are normalized so `5.0` and `5`
/// select the same row.
fn key_text(v: &Value) -> Option<String> {
    match v {
        Value::Null => None,
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(d) => Some(d.normalize().to_string()),
        Value::Text(s) => Some(s.clone()),
    }
}

/// Registry of named methods, tables and evaluators.
#[derive(Clone, Default)]
pub struct ResolverRegistry {
    methods: BTreeMap<String, ResolverFn>,
    tables: BTreeMap<String, LookupTable>,
    evaluators: BTreeMap<String, ResolverFn>,
}

impl ResolverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_method<F>(mut self, name: &str, f: F) -> Self
    where
        F: Fn(&ResolveInput<'_>) -> Result<Value, ResolverError> + Send + Sync + 'static,
    {
        self.methods.insert(name.to_string(), Arc::new(f));
        self
    }

    pub fn with_table(mut self, name: &str, table: LookupTable) -> Self {
        self.tables.insert(name.to_string(), table);
        self
    }

    pub fn with_evaluator<F>(mut self, name: &str, f: F) -> Self
    where
        F: Fn(&ResolveInput<'_>) -> Result<Value, ResolverError> + Send + Sync + 'static,
    {
        self.evaluators.insert(name.to_string(), Arc::new(f));
        self
    }

    /// Run the resolver of `kind` named `name`. `None` when none is registered.
    pub fn resolve(
        &self,
        kind: ActionKind,
        name: &str,
        input: &ResolveInput<'_>,
    ) -> Option<Result<Value, ResolverError>> {
        match kind {
            ActionKind::ApplyMethod => self.methods.get(name).map(|f| f(input)),
            ActionKind::ReferenceTable => self.tables.get(name).map(|t| t.lookup(name, input)),
            ActionKind::Evaluate => self.evaluators.get(name).map(|f| f(input)),
            ActionKind::SetValue => None,
        }
    }
}

impl fmt::Debug for ResolverRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolverRegistry")
            .field("methods", &self.methods.keys().collect::<Vec<_>>())
            .field("tables", &self.tables.keys().collect::<Vec<_>>())
            .field("evaluators", &self.evaluators.keys().collect::<Vec<_>>())
            .finish()
    }
}
