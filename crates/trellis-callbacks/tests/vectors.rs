//! Fixture-driven registration vectors.
//!
//! Each fixture in tests/fixtures/ has:
//! - case.json: app config plus the serialized outputs/inputs/state lists
//! - expect.json: `{"ok": true}` or `{"error": "<kind>"}`
//!
//! Dependencies go through serde here, so these vectors also cover the wire
//! forms: wildcard tokens as one-element arrays, pattern ids as objects,
//! and the legacy `component_event` field.

use serde::Deserialize;
use std::path::PathBuf;

use trellis_callbacks::{AppConfig, CallbackRegistry, Dependency, validate_callback};
use trellis_tree::{Component, PropValue};

#[derive(Debug, Deserialize)]
struct Case {
    #[serde(default)]
    config: AppConfig,
    outputs: Vec<Dependency>,
    inputs: Vec<Dependency>,
    #[serde(default)]
    state: Vec<Dependency>,
}

#[derive(Debug, Deserialize)]
struct Expect {
    #[serde(default)]
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn fixture_layout() -> Component {
    Component::new("Div").with_id("page").with_children(PropValue::List(vec![
        Component::new("Button")
            .with_id("go")
            .with_available("n_clicks")
            .into(),
        Component::new("Input")
            .with_id("query")
            .with_available("value")
            .into(),
        Component::new("Graph")
            .with_id("result")
            .with_available("figure")
            .into(),
    ]))
}

fn run_fixture(name: &str) {
    let dir = fixtures_dir().join(name);

    let case_str = std::fs::read_to_string(dir.join("case.json"))
        .unwrap_or_else(|e| panic!("failed to read {name}/case.json: {e}"));
    let expect_str = std::fs::read_to_string(dir.join("expect.json"))
        .unwrap_or_else(|e| panic!("failed to read {name}/expect.json: {e}"));

    let case: Case = serde_json::from_str(&case_str)
        .unwrap_or_else(|e| panic!("failed to parse {name}/case.json: {e}"));
    let expect: Expect = serde_json::from_str(&expect_str)
        .unwrap_or_else(|e| panic!("failed to parse {name}/expect.json: {e}"));

    let registry = CallbackRegistry::new(case.config);
    let layout = fixture_layout();
    let result = validate_callback(
        &registry,
        Some(&layout),
        &case.outputs,
        &case.inputs,
        &case.state,
    );

    match (result, expect.ok, expect.error) {
        (Ok(()), true, _) => {}
        (Ok(()), false, expected) => {
            panic!("fixture {name}: expected error {expected:?}, validation passed")
        }
        (Err(err), true, _) => panic!("fixture {name}: expected ok, got {err}"),
        (Err(err), false, expected) => {
            assert_eq!(
                Some(err.kind().to_owned()),
                expected,
                "fixture {name}: wrong error kind ({err})"
            );
        }
    }
}

#[test]
fn golden_literal_bindings() {
    run_fixture("golden_literal_bindings");
}

#[test]
fn golden_pattern_any_pairing() {
    run_fixture("golden_pattern_any_pairing");
}

#[test]
fn adversarial_missing_inputs() {
    run_fixture("adversarial_missing_inputs");
}

#[test]
fn adversarial_legacy_event() {
    run_fixture("adversarial_legacy_event");
}

#[test]
fn adversarial_unknown_id() {
    run_fixture("adversarial_unknown_id");
}

#[test]
fn adversarial_unknown_id_suppressed() {
    run_fixture("adversarial_unknown_id_suppressed");
}

#[test]
fn adversarial_uncovered_allsmaller() {
    run_fixture("adversarial_uncovered_allsmaller");
}

#[test]
fn adversarial_duplicate_outputs() {
    run_fixture("adversarial_duplicate_outputs");
}
