//! Registration-time validation of callback dependencies.
//!
//! Every check raises on the first violation found. The validator never
//! mutates the registry; recording validated outputs is the dispatcher's
//! job, after this module returns `Ok`.

use std::collections::BTreeSet;

use trellis_tree::Component;

use crate::dependency::{Dependency, DependencyId, DependencyKind, Wildcard};
use crate::error::CallbackError;
use crate::registry::CallbackRegistry;

/// Validate one callback registration against the current layout and the
/// outputs claimed by earlier registrations.
///
/// Checks run in a fixed order: preconditions, per-dependency shape,
/// id/property existence (unless suppressed), duplicate outputs, input/
/// output overlap, wildcard consistency.
pub fn validate_callback(
    registry: &CallbackRegistry,
    layout: Option<&Component>,
    outputs: &[Dependency],
    inputs: &[Dependency],
    state: &[Dependency],
) -> Result<(), CallbackError> {
    let validate_ids = !registry.config().suppress_callback_exceptions;

    if layout.is_none() && validate_ids {
        // Without a layout there is nothing to resolve ids against.
        return Err(CallbackError::LayoutUndefined);
    }
    if inputs.is_empty() {
        return Err(CallbackError::MissingInputs);
    }

    for (args, kind) in [
        (outputs, DependencyKind::Output),
        (inputs, DependencyKind::Input),
        (state, DependencyKind::State),
    ] {
        validate_callback_args(args, kind, layout, validate_ids)?;
    }

    prevent_duplicate_outputs(registry, outputs)?;
    prevent_input_output_overlap(inputs, outputs)?;
    prevent_inconsistent_wildcards(outputs, inputs, state)?;
    Ok(())
}

/// Shape-check one argument list: every element must carry the expected
/// kind, must not reference the removed event system, and must have a
/// well-formed id for that kind's wildcard capabilities.
pub fn validate_callback_args(
    args: &[Dependency],
    kind: DependencyKind,
    layout: Option<&Component>,
    validate_ids: bool,
) -> Result<(), CallbackError> {
    for arg in args {
        if arg.kind != kind {
            return Err(CallbackError::IncorrectType {
                description: format!(
                    "the {} argument `{arg}` must be an `{}`, found `{}`",
                    kind.name().to_lowercase(),
                    kind.name(),
                    arg.kind.name(),
                ),
            });
        }

        if arg.component_event.is_some() {
            return Err(CallbackError::NonExistentEvent);
        }

        match &arg.component_id {
            DependencyId::Pattern(_) => {
                validate_id_pattern(arg, layout, validate_ids, kind.allowed_wildcards())?;
            }
            DependencyId::Literal(_) => {
                validate_id_literal(arg, layout, validate_ids)?;
            }
        }
    }
    Ok(())
}

fn validate_id_pattern(
    arg: &Dependency,
    layout: Option<&Component>,
    validate_ids: bool,
    wildcards: &[Wildcard],
) -> Result<(), CallbackError> {
    let DependencyId::Pattern(pattern) = &arg.component_id else {
        return Ok(());
    };

    if validate_ids && let Some(layout) = layout {
        let root_matches = layout
            .id
            .as_ref()
            .is_some_and(|id| arg.component_id.matches(id, wildcards));
        let component = if root_matches {
            Some(layout)
        } else {
            layout.traverse().find(|c| {
                c.id.as_ref()
                    .is_some_and(|id| arg.component_id.matches(id, wildcards))
            })
        };
        // Matching zero components is fine for patterns; instances often
        // appear only after other callbacks run. But when a match exists we
        // can check the property against it.
        if let Some(component) = component {
            validate_prop_for_component(arg, component)?;
        }
    }

    for (key, value) in pattern {
        if key.is_empty() {
            return Err(CallbackError::IncorrectType {
                description: format!(
                    "pattern id keys must be non-empty strings, \
                     found an empty key in id `{}`",
                    arg.component_id.stringify(),
                ),
            });
        }
        let wildcard_ok = value.as_wildcard().is_some_and(|w| wildcards.contains(&w));
        if !wildcard_ok && !value.is_scalar() {
            let allowed: Vec<&str> = wildcards.iter().map(Wildcard::token).collect();
            return Err(CallbackError::IncorrectType {
                description: format!(
                    "pattern {} id values must be strings, numbers, bools, \
                     or wildcards {allowed:?}; key `{key}` in id `{}` is neither",
                    arg.kind.name(),
                    arg.component_id.stringify(),
                ),
            });
        }
    }
    Ok(())
}

fn validate_id_literal(
    arg: &Dependency,
    layout: Option<&Component>,
    validate_ids: bool,
) -> Result<(), CallbackError> {
    let DependencyId::Literal(arg_id) = &arg.component_id else {
        return Ok(());
    };

    const INVALID_CHARS: [char; 2] = ['.', '{'];
    let found: String = INVALID_CHARS
        .iter()
        .filter(|c| arg_id.contains(**c))
        .collect();
    if !found.is_empty() {
        return Err(CallbackError::InvalidComponentId {
            id: arg_id.clone(),
            found,
        });
    }

    if !validate_ids {
        return Ok(());
    }
    let Some(layout) = layout else {
        return Ok(());
    };

    let top_id = layout.id.as_ref().and_then(|id| id.as_literal());
    let component = if top_id == Some(arg_id.as_str()) {
        Some(layout)
    } else {
        layout.find_by_id(arg_id)
    };
    let Some(component) = component else {
        let mut layout_ids: Vec<String> = layout
            .traverse()
            .filter_map(|c| c.id.as_ref().map(|id| id.stringify()))
            .collect();
        if let Some(top) = top_id {
            layout_ids.push(top.to_owned());
        }
        return Err(CallbackError::NonExistentId {
            id: arg_id.clone(),
            layout_ids,
        });
    };

    validate_prop_for_component(arg, component)
}

fn validate_prop_for_component(
    arg: &Dependency,
    component: &Component,
) -> Result<(), CallbackError> {
    let prop = arg.component_property.as_str();
    let declared = component.available_properties.contains(prop);
    let wildcard = component
        .available_wildcard_properties
        .iter()
        .any(|prefix| prop.starts_with(prefix.as_str()));
    if declared || wildcard {
        return Ok(());
    }
    Err(CallbackError::NonExistentProp {
        property: prop.to_owned(),
        component_id: arg.component_id.stringify(),
        available: component.available_properties.iter().cloned().collect(),
    })
}

/// Reject outputs that collide with each other or with outputs claimed by
/// previously registered callbacks.
pub fn prevent_duplicate_outputs(
    registry: &CallbackRegistry,
    outputs: &[Dependency],
) -> Result<(), CallbackError> {
    for (i, out) in outputs.iter().enumerate() {
        for out2 in &outputs[i + 1..] {
            if out == out2 {
                // Different but overlapping wildcards compare as equal; the
                // string form tells the two cases apart.
                if out.to_string() == out2.to_string() {
                    return Err(CallbackError::DuplicateCallbackOutput {
                        description: format!(
                            "same output `{out}` was used more than once in a callback"
                        ),
                    });
                }
                return Err(CallbackError::DuplicateCallbackOutput {
                    description: format!(
                        "two outputs in a callback can match the same id: \
                         `{out}` and `{out2}`"
                    ),
                });
            }
        }
    }

    let registered = registry.registered_outputs();
    let mut dups: BTreeSet<String> = BTreeSet::new();
    for out in outputs {
        for used in &registered {
            if out == used {
                dups.insert(used.to_string());
            }
        }
    }
    if dups.is_empty() {
        return Ok(());
    }

    let dups: Vec<String> = dups.into_iter().collect();
    if outputs.len() > 1 || dups.len() > 1 || outputs[0].to_string() != dups[0] {
        return Err(CallbackError::DuplicateCallbackOutput {
            description: format!(
                "one or more outputs are already set by a callback; \
                 two wildcard outputs can refer to the same component \
                 even if they don't match exactly\n\
                 the new callback lists output(s): {}\n\
                 already used: {}",
                outputs
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", "),
                dups.join(", "),
            ),
        });
    }
    Err(CallbackError::DuplicateCallbackOutput {
        description: format!(
            "`{}` was already assigned to a callback; \
             any given output can only have one callback that sets it",
            outputs[0],
        ),
    })
}

/// Reject callbacks where an input can resolve to the same component and
/// property as one of the outputs.
pub fn prevent_input_output_overlap(
    inputs: &[Dependency],
    outputs: &[Dependency],
) -> Result<(), CallbackError> {
    for input in inputs {
        for out in outputs {
            if out == input {
                if out.to_string() == input.to_string() {
                    return Err(CallbackError::SameInputOutput {
                        description: format!("same `Output` and `Input`: `{out}`"),
                    });
                }
                return Err(CallbackError::SameInputOutput {
                    description: format!(
                        "an `Input` and an `Output` in one callback \
                         can match the same id: `{input}` and `{out}`"
                    ),
                });
            }
        }
    }
    Ok(())
}

/// Enforce wildcard agreement across the callback's dependencies.
///
/// Every output must carry `ANY` on the same keys as the first output, so
/// each fired instance resolves to exactly one output instance. Inputs and
/// state may use `ANY`/`ALLSMALLER` only on keys covered by the outputs'
/// `ANY` set. `ALL` keys need not agree.
pub fn prevent_inconsistent_wildcards(
    outputs: &[Dependency],
    inputs: &[Dependency],
    state: &[Dependency],
) -> Result<(), CallbackError> {
    let Some(first) = outputs.first() else {
        return Ok(());
    };

    let any_keys = first.wildcard_keys(&[Wildcard::Any]);
    for out in &outputs[1..] {
        if out.wildcard_keys(&[Wildcard::Any]) != any_keys {
            return Err(CallbackError::InconsistentCallbackWildcards {
                description: format!(
                    "all `Output` items must have matching `ANY` wildcard keys \
                     (`ALL` need not match); \
                     output `{out}` does not match the first output `{first}`"
                ),
            });
        }
    }

    let matched = [Wildcard::Any, Wildcard::AllSmaller];
    for dep in inputs.iter().chain(state) {
        let keys = dep.wildcard_keys(&matched);
        if !keys.is_subset(&any_keys) {
            return Err(CallbackError::InconsistentCallbackWildcards {
                description: format!(
                    "`Input` and `State` items can only have `ANY`/`ALLSMALLER` \
                     wildcards on keys where the output(s) have `ANY`; \
                     this callback has `ANY` on keys {any_keys:?} \
                     and `{dep}` has matched wildcards on keys {keys:?}"
                ),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dependency::{PatternValue, pattern};
    use crate::registry::AppConfig;
    use trellis_tree::PropValue;

    fn layout() -> Component {
        Component::new("Div").with_id("root").with_children(
            PropValue::List(vec![
                Component::new("Input")
                    .with_id("text-in")
                    .with_available("value")
                    .into(),
                Component::new("Div")
                    .with_id("out-box")
                    .with_available("children")
                    .with_wildcard_prefix("data-")
                    .into(),
            ]),
        )
    }

    fn registry() -> CallbackRegistry {
        CallbackRegistry::default()
    }

    #[test]
    fn missing_layout_fails_unless_suppressed() {
        let err = validate_callback(
            &registry(),
            None,
            &[Dependency::output("out-box", "children")],
            &[Dependency::input("text-in", "value")],
            &[],
        )
        .unwrap_err();
        assert_eq!(err.kind(), "layout_undefined");

        let suppressed = CallbackRegistry::new(AppConfig {
            suppress_callback_exceptions: true,
        });
        validate_callback(
            &suppressed,
            None,
            &[Dependency::output("out-box", "children")],
            &[Dependency::input("text-in", "value")],
            &[],
        )
        .unwrap();
    }

    #[test]
    fn empty_inputs_fail() {
        let tree = layout();
        let err = validate_callback(
            &registry(),
            Some(&tree),
            &[Dependency::output("out-box", "children")],
            &[],
            &[],
        )
        .unwrap_err();
        assert_eq!(err.kind(), "missing_inputs");
    }

    #[test]
    fn mismatched_kind_in_argument_list_fails() {
        let tree = layout();
        let err = validate_callback_args(
            &[Dependency::input("out-box", "children")],
            DependencyKind::Output,
            Some(&tree),
            true,
        )
        .unwrap_err();
        assert_eq!(err.kind(), "incorrect_type");
    }

    #[test]
    fn legacy_event_field_fails() {
        let mut dep = Dependency::input("text-in", "value");
        dep.component_event = Some("click".to_owned());
        let tree = layout();
        let err =
            validate_callback_args(&[dep], DependencyKind::Input, Some(&tree), true).unwrap_err();
        assert_eq!(err.kind(), "non_existent_event");
    }

    #[test]
    fn invalid_characters_in_literal_id_fail_even_when_suppressed() {
        let err = validate_callback_args(
            &[Dependency::output("bad.id{x", "children")],
            DependencyKind::Output,
            None,
            false,
        )
        .unwrap_err();
        let CallbackError::InvalidComponentId { found, .. } = &err else {
            panic!("unexpected error {err:?}");
        };
        assert_eq!(found, ".{");
    }

    #[test]
    fn unknown_literal_id_fails_with_layout_listing() {
        let tree = layout();
        let err = validate_callback_args(
            &[Dependency::output("nope", "children")],
            DependencyKind::Output,
            Some(&tree),
            true,
        )
        .unwrap_err();
        let CallbackError::NonExistentId { id, layout_ids } = &err else {
            panic!("unexpected error {err:?}");
        };
        assert_eq!(id, "nope");
        assert!(layout_ids.contains(&"text-in".to_owned()));
        assert!(layout_ids.contains(&"root".to_owned()));
    }

    #[test]
    fn root_id_resolves_without_traversal() {
        let tree = layout().with_available("n_clicks");
        validate_callback_args(
            &[Dependency::input("root", "n_clicks")],
            DependencyKind::Input,
            Some(&tree),
            true,
        )
        .unwrap();
    }

    #[test]
    fn undeclared_property_fails() {
        let tree = layout();
        let err = validate_callback_args(
            &[Dependency::output("out-box", "value")],
            DependencyKind::Output,
            Some(&tree),
            true,
        )
        .unwrap_err();
        assert_eq!(err.kind(), "non_existent_prop");
    }

    #[test]
    fn wildcard_property_prefix_is_accepted() {
        let tree = layout();
        validate_callback_args(
            &[Dependency::output("out-box", "data-custom")],
            DependencyKind::Output,
            Some(&tree),
            true,
        )
        .unwrap();
    }

    #[test]
    fn pattern_matching_zero_components_is_not_an_error() {
        let tree = layout();
        validate_callback_args(
            &[Dependency::output(
                pattern([
                    ("type", PatternValue::from("generated")),
                    ("index", PatternValue::from(Wildcard::Any)),
                ]),
                "children",
            )],
            DependencyKind::Output,
            Some(&tree),
            true,
        )
        .unwrap();
    }

    #[test]
    fn pattern_match_checks_property_on_first_match() {
        use trellis_tree::ScalarId;
        let keyed: std::collections::BTreeMap<String, ScalarId> = [
            ("type".to_owned(), ScalarId::from("filter")),
            ("index".to_owned(), ScalarId::from(0)),
        ]
        .into_iter()
        .collect();
        let tree = Component::new("Div").with_children(PropValue::Component(
            Component::new("Dropdown")
                .with_id(keyed)
                .with_available("options"),
        ));

        let ok = Dependency::input(
            pattern([
                ("type", PatternValue::from("filter")),
                ("index", PatternValue::from(Wildcard::Any)),
            ]),
            "options",
        );
        validate_callback_args(std::slice::from_ref(&ok), DependencyKind::Input, Some(&tree), true)
            .unwrap();

        let bad = Dependency::input(ok.component_id.clone(), "missing-prop");
        let err = validate_callback_args(&[bad], DependencyKind::Input, Some(&tree), true)
            .unwrap_err();
        assert_eq!(err.kind(), "non_existent_prop");
    }

    #[test]
    fn empty_pattern_key_fails() {
        let err = validate_callback_args(
            &[Dependency::output(pattern([("", "x")]), "children")],
            DependencyKind::Output,
            None,
            false,
        )
        .unwrap_err();
        assert_eq!(err.kind(), "incorrect_type");
    }

    #[test]
    fn disallowed_wildcard_for_kind_fails() {
        // ALLSMALLER is not in the Output capability set.
        let err = validate_callback_args(
            &[Dependency::output(
                pattern([("index", PatternValue::from(Wildcard::AllSmaller))]),
                "children",
            )],
            DependencyKind::Output,
            None,
            false,
        )
        .unwrap_err();
        assert_eq!(err.kind(), "incorrect_type");

        validate_callback_args(
            &[Dependency::input(
                pattern([("index", PatternValue::from(Wildcard::AllSmaller))]),
                "value",
            )],
            DependencyKind::Input,
            None,
            false,
        )
        .unwrap();
    }

    #[test]
    fn non_scalar_pattern_value_fails() {
        let dep = Dependency::output(
            pattern([(
                "index",
                PatternValue::Scalar(serde_json::json!({"nested": true})),
            )]),
            "children",
        );
        let err =
            validate_callback_args(&[dep], DependencyKind::Output, None, false).unwrap_err();
        assert_eq!(err.kind(), "incorrect_type");
    }

    #[test]
    fn exact_duplicate_outputs_fail_with_same_output_message() {
        let err = prevent_duplicate_outputs(
            &registry(),
            &[
                Dependency::output("a", "children"),
                Dependency::output("a", "children"),
            ],
        )
        .unwrap_err();
        let CallbackError::DuplicateCallbackOutput { description } = &err else {
            panic!("unexpected error {err:?}");
        };
        assert!(description.contains("more than once"));
    }

    #[test]
    fn overlapping_wildcard_outputs_fail_with_match_message() {
        let err = prevent_duplicate_outputs(
            &registry(),
            &[
                Dependency::output(pattern([("index", 1)]), "children"),
                Dependency::output(
                    pattern([("index", PatternValue::from(Wildcard::All))]),
                    "children",
                ),
            ],
        )
        .unwrap_err();
        let CallbackError::DuplicateCallbackOutput { description } = &err else {
            panic!("unexpected error {err:?}");
        };
        assert!(description.contains("match the same id"));
    }

    #[test]
    fn registry_collision_single_exact_uses_short_message() {
        let reg = registry();
        reg.register_outputs([Dependency::output("a", "children")]);
        let err =
            prevent_duplicate_outputs(&reg, &[Dependency::output("a", "children")]).unwrap_err();
        let CallbackError::DuplicateCallbackOutput { description } = &err else {
            panic!("unexpected error {err:?}");
        };
        assert!(description.contains("already assigned to a callback"));
    }

    #[test]
    fn registry_collision_broader_uses_two_block_message() {
        let reg = registry();
        reg.register_outputs([Dependency::output(pattern([("index", 1)]), "children")]);
        let err = prevent_duplicate_outputs(
            &reg,
            &[Dependency::output(
                pattern([("index", PatternValue::from(Wildcard::All))]),
                "children",
            )],
        )
        .unwrap_err();
        let CallbackError::DuplicateCallbackOutput { description } = &err else {
            panic!("unexpected error {err:?}");
        };
        assert!(description.contains("already used"));
    }

    #[test]
    fn input_output_overlap_fails() {
        let err = prevent_input_output_overlap(
            &[Dependency::input("a", "children")],
            &[Dependency::output("a", "children")],
        )
        .unwrap_err();
        assert_eq!(err.kind(), "same_input_output");

        prevent_input_output_overlap(
            &[Dependency::input("a", "value")],
            &[Dependency::output("a", "children")],
        )
        .unwrap();
    }

    #[test]
    fn matching_any_keys_pass() {
        prevent_inconsistent_wildcards(
            &[Dependency::output(
                pattern([
                    ("type", PatternValue::from("x")),
                    ("index", PatternValue::from(Wildcard::Any)),
                ]),
                "children",
            )],
            &[Dependency::input(
                pattern([
                    ("type", PatternValue::from("x")),
                    ("index", PatternValue::from(Wildcard::Any)),
                ]),
                "value",
            )],
            &[],
        )
        .unwrap();
    }

    #[test]
    fn outputs_with_different_any_keys_fail() {
        let err = prevent_inconsistent_wildcards(
            &[
                Dependency::output(
                    pattern([("index", PatternValue::from(Wildcard::Any))]),
                    "children",
                ),
                Dependency::output(
                    pattern([("page", PatternValue::from(Wildcard::Any))]),
                    "children",
                ),
            ],
            &[Dependency::input("a", "value")],
            &[],
        )
        .unwrap_err();
        assert_eq!(err.kind(), "inconsistent_callback_wildcards");
    }

    #[test]
    fn all_keys_need_not_match_across_outputs() {
        prevent_inconsistent_wildcards(
            &[
                Dependency::output(
                    pattern([
                        ("index", PatternValue::from(Wildcard::Any)),
                        ("col", PatternValue::from(Wildcard::All)),
                    ]),
                    "children",
                ),
                Dependency::output(
                    pattern([("index", PatternValue::from(Wildcard::Any))]),
                    "style",
                ),
            ],
            &[Dependency::input("a", "value")],
            &[],
        )
        .unwrap();
    }

    #[test]
    fn uncovered_input_wildcard_key_fails() {
        let outputs = [Dependency::output(
            pattern([
                ("type", PatternValue::from("x")),
                ("index", PatternValue::from(Wildcard::Any)),
            ]),
            "children",
        )];
        let err = prevent_inconsistent_wildcards(
            &outputs,
            &[Dependency::input(
                pattern([
                    ("type", PatternValue::from("x")),
                    ("page", PatternValue::from(Wildcard::AllSmaller)),
                ]),
                "value",
            )],
            &[],
        )
        .unwrap_err();
        assert_eq!(err.kind(), "inconsistent_callback_wildcards");

        // state is held to the same rule
        let err = prevent_inconsistent_wildcards(
            &outputs,
            &[Dependency::input("a", "value")],
            &[Dependency::state(
                pattern([("page", PatternValue::from(Wildcard::Any))]),
                "value",
            )],
        )
        .unwrap_err();
        assert_eq!(err.kind(), "inconsistent_callback_wildcards");
    }

    #[test]
    fn all_wildcard_on_inputs_is_exempt() {
        prevent_inconsistent_wildcards(
            &[Dependency::output("plain", "children")],
            &[Dependency::input(
                pattern([("index", PatternValue::from(Wildcard::All))]),
                "value",
            )],
            &[],
        )
        .unwrap();
    }
}
