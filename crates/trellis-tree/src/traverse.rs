//! Depth-first walks over a component tree.
//!
//! Both walks are iterative (an explicit stack instead of recursion), so
//! deeply nested layouts cannot overflow the call stack. Components are
//! reachable only through the `children` property; a component stored under
//! any other property is treated as a leaf value.

use std::collections::VecDeque;

use crate::component::{Component, PropValue};

fn child_components<'a>(component: &'a Component, out: &mut Vec<&'a Component>) {
    match component.children() {
        Some(PropValue::Component(c)) => out.push(c),
        Some(PropValue::List(items)) => {
            out.extend(items.iter().filter_map(PropValue::as_component));
        }
        _ => {}
    }
}

/// Iterator over every descendant of a component, depth-first, left to
/// right, each yielded exactly once. The starting component is excluded.
pub struct Traverse<'a> {
    stack: Vec<&'a Component>,
}

impl<'a> Traverse<'a> {
    pub(crate) fn new(root: &'a Component) -> Self {
        let mut stack = Vec::new();
        child_components(root, &mut stack);
        stack.reverse();
        Self { stack }
    }
}

impl<'a> Iterator for Traverse<'a> {
    type Item = &'a Component;

    fn next(&mut self) -> Option<Self::Item> {
        let next = self.stack.pop()?;
        let mut children = Vec::new();
        child_components(next, &mut children);
        children.reverse();
        self.stack.extend(children);
        Some(next)
    }
}

/// Iterator over `(path, value)` pairs: every property value of the starting
/// component and of each descendant, depth-first.
///
/// The path is a newline-joined chain of descriptor lines. Descending into
/// the i-th element of a `children` list contributes `[i] Type (id=...)`;
/// a sole `children` value contributes `[*] ...`; any other property
/// contributes `[name] ...`. The final line describes the yielded value
/// itself.
pub struct TraverseWithPaths<'a> {
    components: Vec<(String, &'a Component)>,
    pending: VecDeque<(String, &'a PropValue)>,
}

impl<'a> TraverseWithPaths<'a> {
    pub(crate) fn new(root: &'a Component) -> Self {
        Self {
            components: vec![(String::new(), root)],
            pending: VecDeque::new(),
        }
    }

    fn expand(&mut self, prefix: &str, component: &'a Component) {
        let mut nested = Vec::new();
        for (name, value) in &component.properties {
            if name == "children" {
                match value {
                    PropValue::List(items) => {
                        for (i, item) in items.iter().enumerate() {
                            let path = join_path(prefix, &format!("[{i}] {}", describe(item)));
                            if let PropValue::Component(c) = item {
                                nested.push((path.clone(), c));
                            }
                            self.pending.push_back((path, item));
                        }
                    }
                    other => {
                        let path = join_path(prefix, &format!("[*] {}", describe(other)));
                        if let PropValue::Component(c) = other {
                            nested.push((path.clone(), c));
                        }
                        self.pending.push_back((path, other));
                    }
                }
            } else {
                let path = join_path(prefix, &format!("[{name}] {}", describe(value)));
                self.pending.push_back((path, value));
            }
        }
        nested.reverse();
        self.components.extend(nested);
    }
}

impl<'a> Iterator for TraverseWithPaths<'a> {
    type Item = (String, &'a PropValue);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(item) = self.pending.pop_front() {
                return Some(item);
            }
            let (prefix, component) = self.components.pop()?;
            self.expand(&prefix, component);
        }
    }
}

fn describe(value: &PropValue) -> String {
    match value {
        PropValue::Component(c) => c.to_string(),
        other => other.type_label().to_owned(),
    }
}

fn join_path(prefix: &str, line: &str) -> String {
    if prefix.is_empty() {
        line.to_owned()
    } else {
        format!("{prefix}\n{line}")
    }
}
