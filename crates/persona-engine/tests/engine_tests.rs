//! Rule engine integration tests
//!
//! Covers ordering, cycle resolution, normalization and full persona
//! computation through the public API.

use persona_engine::{
    create_rule, Anchors, AttributeLibrary, EngineConfig, Resolution, RuleCollection,
    RuleEngine, RuleFailurePolicy, Target, TargetType,
};
use proptest::prelude::*;
use rstest::rstest;

fn target(s: &str) -> Target {
    s.parse().unwrap()
}

fn rules(specs: &[(&str, &str)]) -> RuleCollection {
    specs
        .iter()
        .map(|(t, text)| create_rule(t, format!("{} <- {}", t, text), *text, 1.0).unwrap())
        .collect()
}

// === Ordering ===

#[test]
fn test_dependencies_precede_dependents() {
    let rules = rules(&[
        ("skill.leadership", "trait.confidence * 0.5 + skill.communication * 0.5"),
        ("skill.communication", "trait.empathy"),
        ("trait.empathy", "trait.patience + 10"),
        ("trait.confidence", "avg(trait.*)"),
        ("stack.rust", "skill.leadership"),
    ]);
    let analysis = RuleEngine::default().rule_evaluation_order(&rules);
    assert!(!analysis.has_cycles());
    assert_eq!(analysis.order.len(), 5);

    let index = |s: &str| analysis.order.iter().position(|t| *t == target(s)).unwrap();
    for rule in rules.iter() {
        for dep in rule.dependency().dependencies {
            if let Some(dep_index) = analysis.order.iter().position(|t| t.to_string() == dep) {
                assert!(dep_index < index(&rule.target.to_string()), "{} before {}", dep, rule.target);
            }
        }
    }
}

#[rstest]
#[case::self_reference(&[("trait.a", "trait.a")], 2)]
#[case::mutual(&[("trait.a", "trait.b"), ("trait.b", "trait.a")], 3)]
#[case::three_nodes(&[("trait.a", "trait.c"), ("trait.b", "trait.a"), ("trait.c", "trait.b")], 4)]
fn test_cycles_are_closed(#[case] specs: &[(&str, &str)], #[case] length: usize) {
    let engine = RuleEngine::default();
    let result = engine.compute_final_values(&rules(specs), &Anchors::new());

    assert_eq!(result.cycles.len(), 1);
    let cycle = &result.cycles[0];
    assert_eq!(cycle.len(), length);
    assert_eq!(cycle.first(), cycle.last());

    for (t, _) in specs {
        assert_eq!(result.value(&target(t)), Some(0.0));
    }
    assert!(result
        .trace
        .iter()
        .all(|entry| entry.resolution == Resolution::CycleDefault));
}

#[test]
fn test_target_downstream_of_cycle_is_computed() {
    let engine = RuleEngine::default();
    let result = engine.compute_final_values(
        &rules(&[
            ("skill.a", "skill.b"),
            ("skill.b", "skill.a"),
            ("skill.c", "skill.a + 15"),
        ]),
        &Anchors::new(),
    );
    assert_eq!(result.value(&target("skill.a")), Some(20.0));
    assert_eq!(result.value(&target("skill.c")), Some(35.0));
}

// === Combination and normalization ===

#[rstest]
#[case(1.0, 2.0, 73.333_333)]
#[case(0.0, 0.0, 70.0)]
#[case(1.0, 1.0, 70.0)]
#[case(3.0, 1.0, 65.0)]
fn test_weighted_average(#[case] w1: f64, #[case] w2: f64, #[case] expected: f64) {
    let rules: RuleCollection = [
        create_rule("trait.caution", "first", "60", w1).unwrap(),
        create_rule("trait.caution", "second", "80", w2).unwrap(),
    ]
    .into_iter()
    .collect();
    let result = RuleEngine::default().compute_final_values(&rules, &Anchors::new());
    let value = result.value(&target("trait.caution")).unwrap();
    assert!((value - expected).abs() < 1e-4, "got {}", value);
}

#[rstest]
#[case("trait.x", "500", 100.0)]
#[case("trait.x", "-500", -100.0)]
#[case("skill.x", "-1", 0.0)]
#[case("experience.x", "101", 100.0)]
#[case("stack.x", "250 / 2", 100.0)]
#[case("skill.x", "42", 42.0)]
fn test_values_are_normalized(#[case] t: &str, #[case] text: &str, #[case] expected: f64) {
    let result = RuleEngine::default().compute_final_values(&rules(&[(t, text)]), &Anchors::new());
    assert_eq!(result.value(&target(t)), Some(expected));
}

#[test]
fn test_configured_bases() {
    let config = EngineConfig::from_toml_str("[bases]\ntrait = 15\nskill = 50").unwrap();
    let engine = RuleEngine::new(config);
    let result = engine.compute_final_values(
        &rules(&[("trait.a", "trait.a"), ("skill.b", "$base"), ("stack.c", "$base")]),
        &Anchors::new(),
    );
    assert_eq!(result.value(&target("trait.a")), Some(15.0));
    assert_eq!(result.value(&target("skill.b")), Some(50.0));
    assert_eq!(result.value(&target("stack.c")), Some(20.0));
}

#[rstest]
#[case(RuleFailurePolicy::DropRule, 80.0, Resolution::Computed)]
#[case(RuleFailurePolicy::FailTarget, 20.0, Resolution::Fallback)]
fn test_failure_policy(
    #[case] policy: RuleFailurePolicy,
    #[case] expected: f64,
    #[case] resolution: Resolution,
) {
    let engine = RuleEngine::new(EngineConfig {
        rule_failure: policy,
        ..EngineConfig::default()
    });
    let result = engine.compute_final_values(
        &rules(&[("skill.a", "80"), ("skill.a", "skill.unknown * 2")]),
        &Anchors::new(),
    );
    assert_eq!(result.value(&target("skill.a")), Some(expected));
    assert_eq!(result.trace[0].resolution, resolution);
    assert_eq!(result.trace[0].dropped.len(), 1);
}

#[test]
fn test_trace_serializes() {
    let result = RuleEngine::default().compute_final_values(
        &rules(&[("trait.a", "100 / 0"), ("trait.a", "40")]),
        &Anchors::new(),
    );
    let json = serde_json::to_value(&result.trace).unwrap();
    assert_eq!(json[0]["target"], "trait.a");
    assert_eq!(json[0]["resolution"], "computed");
    assert_eq!(json[0]["value"], 40.0);
    assert_eq!(json[0]["dropped"][0]["error"], "Division by zero");
}

// === Persona computation ===

const LIBRARY: &str = r#"
[[trait]]
id = "detail-focus"

[[trait.rules]]
expression = "trait.patience * 0.5 + trait.caution * 0.5"

[[skill]]
id = "code-review"

[[skill.rules]]
expression = "trait.detail-focus * 0.8 + quirk.pedant * 10"
weight = 3

[[skill.rules]]
expression = "exp.years * 4"

[[quirk]]
id = "pedant"
auto_assign = { any_of = ["trait.detail-focus > 70"] }

[[quirk]]
id = "night-owl"

[[phrase]]
id = "well-actually"
text = "Well, actually..."
conditions = { all_of = ["quirk.pedant", "skill.code-review >= 50"] }

[[phrase]]
id = "lgtm"
text = "LGTM"
conditions = { any_of = ["skill.code-review < 50", "quirk.night-owl"] }

[[phrase]]
id = "greeting"
text = "Hello"
"#;

fn library() -> AttributeLibrary {
    toml::from_str(LIBRARY).unwrap()
}

fn anchors(detail: f64) -> Anchors {
    Anchors::new()
        .with_value(&target("trait.patience"), detail)
        .with_value(&target("trait.caution"), detail)
        .with_value(&target("exp.years"), 10.0)
}

#[rstest]
#[case(80.0, true)]
#[case(50.0, false)]
fn test_quirk_auto_assignment(#[case] detail: f64, #[case] assigned: bool) {
    let person = RuleEngine::default()
        .compute_person(&library(), &anchors(detail))
        .unwrap();
    assert_eq!(person.value(&target("trait.detail-focus")), Some(detail));
    assert_eq!(person.has_quirk("pedant"), assigned);
    assert!(!person.has_quirk("night-owl"));
}

#[test]
fn test_phrase_selection() {
    let engine = RuleEngine::default();

    // code-review = (80 * 0.8 * 3 + 40) / 4 = 58
    let person = engine.compute_person(&library(), &anchors(80.0)).unwrap();
    assert_eq!(person.value(&target("skill.code-review")), Some(58.0));
    assert_eq!(person.phrases, vec!["well-actually", "greeting"]);

    // code-review = (50 * 0.8 * 3 + 40) / 4 = 40
    let person = engine.compute_person(&library(), &anchors(50.0)).unwrap();
    assert_eq!(person.value(&target("skill.code-review")), Some(40.0));
    assert_eq!(person.phrases, vec!["lgtm", "greeting"]);
}

#[test]
fn test_explicit_quirks_feed_rules() {
    let person = RuleEngine::default()
        .compute_person(&library(), &anchors(50.0).with_quirk("pedant").with_quirk("night-owl"))
        .unwrap();
    // code-review = ((50 * 0.8 + 10) * 3 + 40) / 4 = 47.5
    assert_eq!(person.value(&target("skill.code-review")), Some(47.5));
    assert_eq!(person.phrases, vec!["lgtm", "greeting"]);
    assert_eq!(person.quirks.len(), 2);
}

#[test]
fn test_person_reports_anchors() {
    let person = RuleEngine::default()
        .compute_person(&library(), &anchors(80.0))
        .unwrap();
    assert_eq!(person.value(&target("trait.patience")), Some(80.0));
    assert_eq!(person.value(&target("experience.years")), Some(10.0));
    assert_eq!(
        person.order,
        vec![target("trait.detail-focus"), target("skill.code-review")]
    );
}

#[test]
fn test_empty_any_of_never_matches() {
    let library: AttributeLibrary = toml::from_str(
        r#"
[[quirk]]
id = "contrarian"
auto_assign = { any_of = [] }

[[phrase]]
id = "never"
text = "Never said"
conditions = { any_of = [] }

[[phrase]]
id = "always"
text = "Always said"
conditions = { all_of = [] }
"#,
    )
    .unwrap();
    let person = RuleEngine::default()
        .compute_person(&library, &Anchors::new())
        .unwrap();
    assert!(!person.has_quirk("contrarian"));
    assert_eq!(person.phrases, vec!["always"]);
}

// === Property-Based Tests ===

const KINDS: [&str; 4] = ["trait", "skill", "experience", "stack"];

/// Target `i` of a generated rule set
fn generated_target(i: usize) -> String {
    format!("{}.t{:02}", KINDS[i % KINDS.len()], i)
}

/// Rules where target `i` may read any target `j > i`, so dependencies run
/// against name order and the graph stays acyclic
fn acyclic_rules(edges: &[Vec<bool>]) -> RuleCollection {
    let n = edges.len();
    edges
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let deps: Vec<String> = (i + 1..n)
                .filter(|j| row[*j])
                .map(generated_target)
                .collect();
            let text = if deps.is_empty() {
                "1".to_string()
            } else {
                deps.join(" + ")
            };
            create_rule(&generated_target(i), "generated", text, 1.0).unwrap()
        })
        .collect()
}

proptest! {
    #[test]
    fn test_finals_within_range(a in -1000.0f64..1000.0, b in -1000.0f64..1000.0, w in 0.0f64..10.0) {
        let rules: RuleCollection = [
            create_rule("trait.t", "a", format!("{}", a), w).unwrap(),
            create_rule("skill.s", "b", format!("{} + trait.t", b), 1.0).unwrap(),
            create_rule("experience.e", "a", format!("({}) * 2", a), 1.0).unwrap(),
            create_rule("stack.k", "b", format!("({}) - skill.s", b), 1.0).unwrap(),
        ]
        .into_iter()
        .collect();

        let result = RuleEngine::default().compute_final_values(&rules, &Anchors::new());
        for (t, value) in &result.values {
            let (min, max) = t.kind.bounds();
            prop_assert!((min..=max).contains(value), "{} = {} outside range", t, value);
        }
        prop_assert_eq!(result.values.len(), 4);
    }

    #[test]
    fn test_generated_dependencies_come_first(
        edges in (2usize..12).prop_flat_map(|n| {
            prop::collection::vec(prop::collection::vec(any::<bool>(), n), n)
        })
    ) {
        let rules = acyclic_rules(&edges);
        let engine = RuleEngine::default();
        let analysis = engine.rule_evaluation_order(&rules);
        prop_assert!(!analysis.has_cycles());
        prop_assert_eq!(analysis.order.len(), edges.len());

        let index = |t: &Target| analysis.order.iter().position(|o| o == t);
        for rule in rules.iter() {
            let target_index = index(&rule.target).unwrap();
            for dep in rule.dependency().dependencies {
                let dep_index = index(&target(&dep)).unwrap();
                prop_assert!(dep_index < target_index, "{} must precede {}", dep, rule.target);
            }
        }

        let result = engine.compute_final_values(&rules, &Anchors::new());
        prop_assert!(result.cycles.is_empty());
        prop_assert_eq!(result.values.len(), edges.len());
        prop_assert!(result
            .trace
            .iter()
            .all(|entry| entry.resolution == Resolution::Computed));
    }

    #[test]
    fn test_anchor_values_are_normalized(value in -1000.0f64..1000.0) {
        let anchors = Anchors::new()
            .with_value(&target("trait.a"), value)
            .with_value(&target("skill.b"), value);
        let result = RuleEngine::default().compute_final_values(&RuleCollection::new(), &anchors);
        prop_assert_eq!(result.value(&target("trait.a")), Some(TargetType::Trait.normalize(value)));
        prop_assert_eq!(result.value(&target("skill.b")), Some(TargetType::Skill.normalize(value)));
    }
}
