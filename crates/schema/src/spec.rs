//! Building specifications: the read-only record rules are evaluated against.

use std::collections::BTreeMap;

use crate::error::SpecError;
use crate::value::Value;

/// A specification entry: a scalar or a nested mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecEntry {
    Scalar(Value),
    Nested(BTreeMap<String, SpecEntry>),
}

/// Flat or shallowly nested mapping from field name to value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildingSpec {
    fields: BTreeMap<String, SpecEntry>,
}

impl BuildingSpec {
    pub fn new() -> Self {
        BuildingSpec {
            fields: BTreeMap::new(),
        }
    }

    /// Build from a JSON object. Lists anywhere in the tree are rejected.
    pub fn from_json(v: &serde_json::Value) -> Result<BuildingSpec, SpecError> {
        let obj = v.as_object().ok_or_else(|| SpecError::NotAnObject {
            got: json_kind(v).to_string(),
        })?;
        Ok(BuildingSpec {
            fields: parse_entries(obj, "")?,
        })
    }

    /// Builder-style scalar insert.
    pub fn with(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.insert(field, value);
        self
    }

    pub fn insert(&mut self, field: &str, value: impl Into<Value>) {
        self.fields
            .insert(field.to_string(), SpecEntry::Scalar(value.into()));
    }

    /// Insert a nested mapping under `field`.
    pub fn insert_nested(&mut self, field: &str, nested: BuildingSpec) {
        self.fields
            .insert(field.to_string(), SpecEntry::Nested(nested.fields));
    }

    /// Resolve a dotted field path to a scalar.
    ///
    /// A literal top-level key wins over path splitting, so a field named
    /// `"envelope.roof"` is found before `envelope` → `roof`. Paths that end
    /// on a mapping resolve to `None`.
    pub fn lookup(&self, path: &str) -> Option<&Value> {
        if let Some(SpecEntry::Scalar(v)) = self.fields.get(path) {
            return Some(v);
        }
        let mut segments = path.split('.');
        let mut entry = self.fields.get(segments.next()?)?;
        for segment in segments {
            match entry {
                SpecEntry::Nested(children) => entry = children.get(segment)?,
                SpecEntry::Scalar(_) => return None,
            }
        }
        match entry {
            SpecEntry::Scalar(v) => Some(v),
            SpecEntry::Nested(_) => None,
        }
    }

    /// Whether `path` resolves to a scalar (an explicit `null` counts).
    pub fn contains(&self, path: &str) -> bool {
        self.lookup(path).is_some()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn to_json(&self) -> serde_json::Value {
        entries_to_json(&self.fields)
    }
}

fn parse_entries(
    obj: &serde_json::Map<String, serde_json::Value>,
    prefix: &str,
) -> Result<BTreeMap<String, SpecEntry>, SpecError> {
    let mut entries = BTreeMap::new();
    for (key, v) in obj {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };
        let entry = match v {
            serde_json::Value::Object(children) => {
                SpecEntry::Nested(parse_entries(children, &path)?)
            }
            serde_json::Value::Array(_) => return Err(SpecError::ListValue { field: path }),
            // Numbers beyond decimal range are kept as their JSON text.
            scalar => SpecEntry::Scalar(
                Value::from_json(scalar).unwrap_or_else(|_| Value::Text(scalar.to_string())),
            ),
        };
        entries.insert(key.clone(), entry);
    }
    Ok(entries)
}

fn entries_to_json(entries: &BTreeMap<String, SpecEntry>) -> serde_json::Value {
    let map = entries
        .iter()
        .map(|(k, entry)| {
            let v = match entry {
                SpecEntry::Scalar(v) => v.to_json(),
                SpecEntry::Nested(children) => entries_to_json(children),
            };
            (k.clone(), v)
        })
        .collect();
    serde_json::Value::Object(map)
}

fn json_kind(v: &serde_json::Value) -> &'static str {
    match v {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
