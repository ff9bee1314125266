//! Invocation-time validation of callback return values.
//!
//! Two surfaces: [`validate_multi_return`] checks the positional shape of a
//! multi-output return before serialization, and [`fail_callback_output`]
//! is called once serialization has already failed, to locate the offending
//! value and produce a directed diagnostic.

use std::fmt::Write as _;

use trellis_tree::{Component, OpaqueValue, PropValue};

use crate::dependency::Dependency;
use crate::error::CallbackError;

/// One declared output position: a single dependency, or a group of
/// concrete outputs produced by wildcard fan-out, which requires a
/// correspondingly shaped sub-list in the returned value.
#[derive(Debug, Clone, PartialEq)]
pub enum OutputSpec {
    Single(Dependency),
    Grouped(Vec<Dependency>),
}

/// Check that a multi-output callback returned a sequence aligned with the
/// declared outputs: same length, and a sub-list of exactly matching length
/// for every grouped position.
pub fn validate_multi_return(
    outputs: &[OutputSpec],
    value: &PropValue,
    callback_id: &str,
) -> Result<(), CallbackError> {
    let PropValue::List(items) = value else {
        return Err(CallbackError::InvalidCallbackReturnValue {
            description: format!(
                "the callback `{callback_id}` is a multi-output; \
                 expected the return value to be a list, got `{value}` \
                 of type `{}`",
                value.type_label(),
            ),
        });
    };

    if items.len() != outputs.len() {
        return Err(CallbackError::InvalidCallbackReturnValue {
            description: format!(
                "invalid number of output values for `{callback_id}`: \
                 expected {}, got {}",
                outputs.len(),
                items.len(),
            ),
        });
    }

    for (i, output) in outputs.iter().enumerate() {
        let OutputSpec::Grouped(group) = output else {
            continue;
        };
        let PropValue::List(sub) = &items[i] else {
            return Err(CallbackError::InvalidCallbackReturnValue {
                description: format!(
                    "the callback `{callback_id}` output {i} is a wildcard \
                     multi-output; expected a list, got `{}` of type `{}`",
                    items[i],
                    items[i].type_label(),
                ),
            });
        };
        if sub.len() != group.len() {
            return Err(CallbackError::InvalidCallbackReturnValue {
                description: format!(
                    "invalid number of output values for `{callback_id}` \
                     output {i}: expected {}, got {}",
                    group.len(),
                    sub.len(),
                ),
            });
        }
    }
    Ok(())
}

/// Build the error for a return value that failed serialization.
///
/// Walks the returned value (and, for components, their whole subtree with
/// paths) looking for the first value outside the serializable grammar. If
/// the directed search finds nothing, falls back to a generic diagnostic
/// naming the output; the earlier structural failure stands either way.
pub fn fail_callback_output(value: &PropValue, output: &Dependency) -> CallbackError {
    let found = match value {
        PropValue::List(items) => items
            .iter()
            .enumerate()
            .find_map(|(i, item)| invalid_in_value(item, output, Some(i))),
        other => invalid_in_value(other, output, None),
    };
    if let Some(err) = found {
        return err;
    }

    CallbackError::InvalidCallbackReturnValue {
        description: format!(
            "the callback for property `{}` of component `{}` \
             returned a value which is not JSON serializable; \
             in general, properties can only be components, strings, \
             dictionaries, numbers, booleans, null, or lists of those",
            output.component_property,
            output.component_id.stringify(),
        ),
    }
}

fn invalid_in_value(
    value: &PropValue,
    output: &Dependency,
    index: Option<usize>,
) -> Option<CallbackError> {
    if let PropValue::Component(component) = value {
        for (path, item) in component.traverse_with_paths() {
            if let Some(bad) = find_opaque(item) {
                return Some(raise_invalid(
                    bad,
                    Location::Nested {
                        outer: component,
                        path,
                        index,
                    },
                    output,
                ));
            }
        }
        return None;
    }

    find_opaque(value).map(|bad| raise_invalid(bad, Location::TopLevel, output))
}

/// First value outside the grammar, searching through lists. `Map` contents
/// are plain JSON and always serialize; component subtrees are covered by
/// the caller's path-aware traversal.
fn find_opaque(value: &PropValue) -> Option<&OpaqueValue> {
    match value {
        PropValue::Opaque(bad) => Some(bad),
        PropValue::List(items) => items.iter().find_map(find_opaque),
        _ => None,
    }
}

enum Location<'a> {
    TopLevel,
    Nested {
        outer: &'a Component,
        path: String,
        index: Option<usize>,
    },
}

fn raise_invalid(bad: &OpaqueValue, location: Location<'_>, output: &Dependency) -> CallbackError {
    let mut description = String::new();
    let object = match &location {
        Location::TopLevel => "value",
        Location::Nested { .. } => "tree with one value",
    };
    let _ = write!(
        description,
        "the callback for `{output}` returned a {object} having type \
         `{}` which is not JSON serializable\n",
        bad.type_name(),
    );
    match location {
        Location::TopLevel => {
            description.push_str(
                "the value in question is either the only value returned, \
                 or is in the top level of the returned list\n",
            );
        }
        Location::Nested { outer, path, index } => {
            let position = match index {
                Some(i) => format!("[{i}]"),
                None => "[*]".to_owned(),
            };
            let _ = write!(
                description,
                "the value in question is located at\n{position} {outer}\n{path}\n",
            );
        }
    }
    let _ = write!(
        description,
        "and has string representation `{}`; \
         in general, properties can only be components, strings, \
         dictionaries, numbers, booleans, null, or lists of those",
        bad.repr(),
    );
    CallbackError::InvalidCallbackReturnValue { description }
}
