//! Rules and the immutable rule schema that owns them.

use std::collections::HashMap;

use serde::Serialize;

use crate::action::Action;
use crate::condition::Condition;
use crate::deserialize;
use crate::error::SchemaError;

/// Default bound on condition tree depth.
pub const DEFAULT_MAX_CONDITION_DEPTH: usize = 64;

/// A named, categorized pairing of a condition tree with ordered actions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rule {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: String,
    pub priority: i64,
    /// `None` means the rule always matches.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conditions: Option<Condition>,
    pub actions: Vec<Action>,
    #[serde(skip_serializing_if = "serde_json::Map::is_empty")]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl Rule {
    pub fn new(id: &str, category: &str, conditions: Option<Condition>, actions: Vec<Action>) -> Rule {
        Rule {
            id: id.to_string(),
            name: id.to_string(),
            description: String::new(),
            category: category.to_string(),
            priority: 0,
            conditions,
            actions,
            metadata: serde_json::Map::new(),
        }
    }

    pub fn with_priority(mut self, priority: i64) -> Rule {
        self.priority = priority;
        self
    }

    pub fn with_name(mut self, name: &str) -> Rule {
        self.name = name.to_string();
        self
    }

    pub fn is_unconditional(&self) -> bool {
        self.conditions.is_none()
    }

    /// Output fields this rule writes, in action order.
    pub fn targets(&self) -> impl Iterator<Item = &str> {
        self.actions.iter().map(|a| a.target.as_str())
    }

    /// Structural checks shared by parsed and hand-built rules.
    pub fn validate(&self, max_depth: usize) -> Result<(), SchemaError> {
        if let Some(condition) = &self.conditions {
            condition
                .validate(max_depth)
                .map_err(|e| e.in_rule(&self.id))?;
        }
        Ok(())
    }
}

/// Versioned, ordered collection of rules. Immutable after construction;
/// callers that need a different rule set build a new schema.
#[derive(Debug, Clone, Serialize)]
pub struct RuleSchema {
    version: String,
    rules: Vec<Rule>,
    #[serde(skip_serializing_if = "serde_json::Map::is_empty")]
    metadata: serde_json::Map<String, serde_json::Value>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl RuleSchema {
    /// Build from hand-constructed rules with the default depth limit.
    pub fn new(version: &str, rules: Vec<Rule>) -> Result<RuleSchema, SchemaError> {
        Self::build(
            version.to_string(),
            rules,
            serde_json::Map::new(),
            DEFAULT_MAX_CONDITION_DEPTH,
        )
    }

    /// Validate and build from a `{version, rules, metadata?}` mapping.
    pub fn from_source(source: &serde_json::Value) -> Result<RuleSchema, SchemaError> {
        Self::from_source_with_depth(source, DEFAULT_MAX_CONDITION_DEPTH)
    }

    pub fn from_source_with_depth(
        source: &serde_json::Value,
        max_depth: usize,
    ) -> Result<RuleSchema, SchemaError> {
        let parsed = deserialize::parse_schema(source)?;
        Self::build(parsed.version, parsed.rules, parsed.metadata, max_depth)
    }

    /// Attach schema-level metadata.
    pub fn with_metadata(mut self, metadata: serde_json::Map<String, serde_json::Value>) -> Self {
        self.metadata = metadata;
        self
    }

    fn build(
        version: String,
        rules: Vec<Rule>,
        metadata: serde_json::Map<String, serde_json::Value>,
        max_depth: usize,
    ) -> Result<RuleSchema, SchemaError> {
        let mut index = HashMap::with_capacity(rules.len());
        for (pos, rule) in rules.iter().enumerate() {
            if index.insert(rule.id.clone(), pos).is_some() {
                return Err(SchemaError::DuplicateRuleId {
                    id: rule.id.clone(),
                });
            }
            rule.validate(max_depth)?;
        }
        Ok(RuleSchema {
            version,
            rules,
            metadata,
            index,
        })
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// All rules in declaration order.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn metadata(&self) -> &serde_json::Map<String, serde_json::Value> {
        &self.metadata
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn get_rule(&self, id: &str) -> Option<&Rule> {
        self.index.get(id).map(|&pos| &self.rules[pos])
    }

    /// Rules in `category`, in declaration order.
    pub fn rules_by_category<'a>(&'a self, category: &'a str) -> impl Iterator<Item = &'a Rule> {
        self.rules.iter().filter(move |r| r.category == category)
    }

    /// Distinct categories in first-declaration order.
    pub fn categories(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for rule in &self.rules {
            if !seen.contains(&rule.category.as_str()) {
                seen.push(&rule.category);
            }
        }
        seen
    }

    /// JSON rendering in the same shape `from_source` accepts.
    pub fn to_json(&self) -> serde_json::Value {
        // String keys and finite numbers only, so serialization cannot fail.
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }

    /// Every specification field any rule condition reads.
    pub fn referenced_fields(&self) -> Vec<String> {
        let mut fields = Vec::new();
        for condition in self.rules.iter().filter_map(|r| r.conditions.as_ref()) {
            condition.collect_fields(&mut fields);
        }
        fields
    }
}

impl PartialEq for RuleSchema {
    fn eq(&self, other: &Self) -> bool {
        self.version == other.version && self.rules == other.rules && self.metadata == other.metadata
    }
}
