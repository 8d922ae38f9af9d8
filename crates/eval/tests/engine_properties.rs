//! Behavioral properties of baseline generation across whole schemas.

use std::sync::Arc;
use std::thread;

use baseline_eval::{
    BaselineEngine, BuildingSpec, DiagnosticKind, EngineConfig, LookupTable, MatchStatus,
    ResolverError, ResolverRegistry, RuleSchema, Value,
};
use baseline_schema::{ComparisonOp, Condition, ConditionGroup, LogicalOp, SchemaError};
use serde_json::json;

fn schema(source: serde_json::Value) -> RuleSchema {
    RuleSchema::from_source(&source).unwrap()
}

fn spec(source: serde_json::Value) -> BuildingSpec {
    BuildingSpec::from_json(&source).unwrap()
}

fn lighting_and_hvac() -> RuleSchema {
    schema(json!({
        "version": "2.1",
        "rules": [
            {
                "id": "lpd_small", "category": "lighting",
                "conditions": {"operator": "and", "conditions": [
                    {"field": "building_type", "operator": "equals", "value": "office"},
                    {"field": "building_area", "operator": "less_than", "value": 25000}
                ]},
                "actions": [{"action_type": "set_value", "target": "lighting_power_density", "value": 0.82}]
            },
            {
                "id": "lpd_large", "category": "lighting",
                "conditions": {"operator": "and", "conditions": [
                    {"field": "building_type", "operator": "equals", "value": "office"},
                    {"field": "building_area", "operator": "greater_than_or_equal", "value": 25000}
                ]},
                "actions": [{"action_type": "set_value", "target": "lighting_power_density", "value": 0.79}]
            },
            {
                "id": "heat_5a", "category": "hvac", "priority": 10,
                "conditions": {"field": "climate_zone", "operator": "equals", "value": "5a"},
                "actions": [
                    {"action_type": "set_value", "target": "heating_type", "value": "boiler"},
                    {"action_type": "reference_table", "target": "heating_efficiency", "value": "boiler_efficiency"}
                ]
            },
            {
                "id": "heat_default", "category": "hvac", "priority": 1,
                "actions": [{"action_type": "set_value", "target": "heating_type", "value": "furnace"}]
            }
        ]
    }))
}

fn registry() -> ResolverRegistry {
    ResolverRegistry::new().with_table(
        "boiler_efficiency",
        LookupTable::new("climate_zone")
            .with_row("5a", "0.80")
            .with_row("3b", "0.82"),
    )
}

fn office(area: i64, zone: &str) -> BuildingSpec {
    spec(json!({"building_type": "office", "building_area": area, "climate_zone": zone}))
}

#[test]
fn generation_is_deterministic() {
    let engine = BaselineEngine::new(lighting_and_hvac()).with_resolvers(registry());
    let s = office(15000, "5a");
    let first = engine.generate_baseline(&s).unwrap();
    for _ in 0..5 {
        assert_eq!(engine.generate_baseline(&s).unwrap(), first);
    }
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&engine.generate_baseline(&s).unwrap()).unwrap()
    );
}

#[test]
fn inputs_are_left_untouched() {
    let schema = Arc::new(lighting_and_hvac());
    let before = (*schema).clone();
    let s = office(30000, "3b");
    let spec_before = s.clone();
    let engine = BaselineEngine::with_shared_schema(Arc::clone(&schema));
    engine.generate_baseline(&s).unwrap();
    assert_eq!(*schema, before);
    assert_eq!(s, spec_before);
}

#[test]
fn every_property_was_written_by_a_fired_rule() {
    let engine = BaselineEngine::new(lighting_and_hvac()).with_resolvers(registry());
    let out = engine.generate_baseline(&office(15000, "5a")).unwrap();
    let written: Vec<&str> = out
        .fired
        .iter()
        .flat_map(|f| engine.schema().get_rule(&f.rule_id).unwrap().targets())
        .collect();
    for target in out.properties.keys() {
        assert!(written.contains(&target.as_str()), "{target} has no writer");
    }
}

#[test]
fn priority_orders_application() {
    let engine = BaselineEngine::new(lighting_and_hvac()).with_resolvers(registry());
    let out = engine.generate_baseline(&office(15000, "5a")).unwrap();
    assert_eq!(out.fired_ids(), vec!["lpd_small", "heat_default", "heat_5a"]);
    assert_eq!(out.get("heating_type"), Some(&Value::from("boiler")));
    assert_eq!(out.get("heating_efficiency"), Some(&Value::from("0.80")));
    let priorities: Vec<i64> = out.fired.iter().map(|f| f.priority).collect();
    assert!(priorities.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn evaluation_log_covers_every_rule_in_order() {
    let engine = BaselineEngine::new(lighting_and_hvac()).with_resolvers(registry());
    let out = engine.generate_baseline(&office(30000, "3b")).unwrap();
    let log: Vec<(&str, MatchStatus)> = out
        .evaluation_log
        .iter()
        .map(|e| (e.rule_id.as_str(), e.status))
        .collect();
    assert_eq!(
        log,
        vec![
            ("lpd_small", MatchStatus::NotMatched),
            ("lpd_large", MatchStatus::Matched),
            ("heat_5a", MatchStatus::NotMatched),
            ("heat_default", MatchStatus::Matched),
        ]
    );
    assert_eq!(out.matched_ids(), vec!["lpd_large", "heat_default"]);
}

#[test]
fn absent_fields_only_satisfy_negative_operators() {
    let engine = BaselineEngine::new(schema(json!({
        "version": "1.0",
        "rules": [
            {"id": "eq", "category": "x", "actions": [{"action_type": "set_value", "target": "eq", "value": true}],
             "conditions": {"field": "climate_zone", "operator": "equals", "value": "5a"}},
            {"id": "ne", "category": "x", "actions": [{"action_type": "set_value", "target": "ne", "value": true}],
             "conditions": {"field": "climate_zone", "operator": "not_equals", "value": "5a"}},
            {"id": "lt", "category": "x", "actions": [{"action_type": "set_value", "target": "lt", "value": true}],
             "conditions": {"field": "climate_zone", "operator": "less_than", "value": 5}},
            {"id": "in", "category": "x", "actions": [{"action_type": "set_value", "target": "in", "value": true}],
             "conditions": {"field": "climate_zone", "operator": "in", "value": ["5a"]}},
            {"id": "nin", "category": "x", "actions": [{"action_type": "set_value", "target": "nin", "value": true}],
             "conditions": {"field": "climate_zone", "operator": "not_in", "value": ["5a"]}}
        ]
    })));
    for s in [spec(json!({})), spec(json!({"climate_zone": null}))] {
        let out = engine.generate_baseline(&s).unwrap();
        assert_eq!(out.fired_ids(), vec!["ne", "nin"]);
        assert!(out.diagnostics.is_empty());
    }
}

#[test]
fn groups_stop_at_the_deciding_child() {
    let broken = Condition::Group(ConditionGroup {
        operator: LogicalOp::Not,
        conditions: vec![],
    });
    let s = office(15000, "5a");
    let and = Condition::all(vec![
        Condition::leaf("building_type", ComparisonOp::Equals, "retail"),
        broken.clone(),
    ]);
    let or = Condition::any(vec![
        Condition::leaf("building_type", ComparisonOp::Equals, "office"),
        broken.clone(),
    ]);
    assert_eq!(baseline_eval::condition_holds(&and, &s), Ok(false));
    assert_eq!(baseline_eval::condition_holds(&or, &s), Ok(true));
    assert_eq!(
        baseline_eval::condition_holds(&Condition::all(vec![broken]), &s),
        Err(SchemaError::NotArity { count: 0 })
    );
}

#[test]
fn empty_spec_fires_only_unconditional_rules() {
    let engine = BaselineEngine::new(lighting_and_hvac());
    let out = engine.generate_baseline(&BuildingSpec::new()).unwrap();
    assert_eq!(out.fired_ids(), vec!["heat_default"]);
    assert_eq!(out.properties.len(), 1);
    assert!(out.diagnostics.is_empty());
}

#[test]
fn empty_schema_produces_empty_output() {
    let engine = BaselineEngine::new(schema(json!({"version": "1.0", "rules": []})));
    let out = engine.generate_baseline(&office(100, "5a")).unwrap();
    assert!(out.properties.is_empty());
    assert!(out.fired.is_empty());
    assert!(out.evaluation_log.is_empty());
}

#[test]
fn failing_resolver_does_not_stop_later_rules() {
    let engine = BaselineEngine::new(schema(json!({
        "version": "1.0",
        "rules": [
            {"id": "a", "category": "x", "actions": [
                {"action_type": "evaluate", "target": "wwr", "value": "window_ratio"}
            ]},
            {"id": "b", "category": "x", "actions": [
                {"action_type": "set_value", "target": "economizer", "value": true}
            ]}
        ]
    })))
    .with_resolvers(ResolverRegistry::new().with_evaluator("window_ratio", |_| {
        Err(ResolverError::Failed("no wall area".into()))
    }));
    let out = engine.generate_baseline(&BuildingSpec::new()).unwrap();
    assert_eq!(out.get("wwr"), Some(&Value::Null));
    assert_eq!(out.get("economizer"), Some(&Value::Bool(true)));
    assert_eq!(out.diagnostics[0].kind, DiagnosticKind::ResolverFailed);
}

#[test]
fn unit_check_follows_configuration() {
    let rules = schema(json!({
        "version": "1.0",
        "rules": [{
            "id": "u1", "category": "lighting",
            "conditions": {"field": "building_area", "operator": "less_than", "value": 25000, "unit": "ft2"},
            "actions": [{"action_type": "set_value", "target": "small", "value": true}]
        }]
    }));
    let s = spec(json!({"building_area": 2000, "building_area_unit": "m2"}));

    let lenient = BaselineEngine::new(rules.clone());
    assert_eq!(lenient.generate_baseline(&s).unwrap().fired_ids(), vec!["u1"]);

    let strict = BaselineEngine::new(rules).with_config(EngineConfig::default().with_unit_check(true));
    let out = strict.generate_baseline(&s).unwrap();
    assert!(out.fired.is_empty());
    assert_eq!(out.diagnostics[0].kind, DiagnosticKind::UnitMismatch);
}

#[test]
fn later_write_without_parameters_clears_metadata() {
    let engine = BaselineEngine::new(schema(json!({
        "version": "1.0",
        "rules": [
            {"id": "lpd_override", "category": "lighting", "priority": 5, "actions": [
                {"action_type": "set_value", "target": "lighting_power_density", "value": 0.79}
            ]},
            {"id": "lpd_base", "category": "lighting", "priority": 1, "actions": [
                {"action_type": "set_value", "target": "lighting_power_density", "value": 0.82,
                 "parameters": {"units": "W/ft2"}}
            ]}
        ]
    })));
    let out = engine.generate_baseline(&BuildingSpec::new()).unwrap();
    assert_eq!(out.fired_ids(), vec!["lpd_base", "lpd_override"]);
    assert!(out.metadata.is_empty());
    assert!(out.to_json().get("metadata").is_none());
}

#[test]
fn out_of_range_number_only_fails_its_own_comparison() {
    let s = spec(json!({"building_type": "office", "building_area": 1e30, "climate_zone": "5a"}));
    let engine = BaselineEngine::new(lighting_and_hvac()).with_resolvers(registry());
    let out = engine.generate_baseline(&s).unwrap();
    assert_eq!(out.fired_ids(), vec!["heat_default", "heat_5a"]);
    assert_eq!(out.get("heating_type"), Some(&Value::from("boiler")));
    assert!(out.get("lighting_power_density").is_none());
    let coercions: Vec<(&str, &str)> = out
        .diagnostics
        .iter()
        .filter(|d| d.kind == DiagnosticKind::CoercionFailed)
        .map(|d| (d.rule_id.as_str(), d.subject.as_str()))
        .collect();
    assert_eq!(
        coercions,
        vec![("lpd_small", "building_area"), ("lpd_large", "building_area")]
    );
}

#[test]
fn concurrent_generation_shares_one_engine() {
    let engine = Arc::new(BaselineEngine::new(lighting_and_hvac()).with_resolvers(registry()));
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                let area = if i % 2 == 0 { 15000 } else { 30000 };
                let zone = if i % 3 == 0 { "5a" } else { "3b" };
                let s = office(area, zone);
                (engine.generate_baseline(&s).unwrap(), s)
            })
        })
        .collect();
    for handle in handles {
        let (out, s) = handle.join().unwrap();
        assert_eq!(out, engine.generate_baseline(&s).unwrap());
    }
}
