//! Components, their identities, and the property value grammar.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::traverse::{Traverse, TraverseWithPaths};

/// A scalar usable as a value inside a keyed component identity.
///
/// Keyed ids carry only scalars; wildcard tokens exist on the dependency
/// side, never on a concrete component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScalarId {
    String(String),
    Number(serde_json::Number),
    Bool(bool),
}

impl From<&str> for ScalarId {
    fn from(s: &str) -> Self {
        Self::String(s.to_owned())
    }
}

impl From<i64> for ScalarId {
    fn from(n: i64) -> Self {
        Self::Number(n.into())
    }
}

impl From<i32> for ScalarId {
    fn from(n: i32) -> Self {
        Self::Number(n.into())
    }
}

impl From<bool> for ScalarId {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

/// The identity of a concrete component in a layout tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ComponentId {
    /// A plain string id, addressable directly.
    Literal(String),
    /// A keyed id: scalar attributes identifying one instance among many
    /// dynamically generated siblings.
    Keyed(BTreeMap<String, ScalarId>),
}

impl ComponentId {
    /// Canonical string form: literal ids verbatim, keyed ids as compact
    /// JSON with sorted keys. Two ids with the same canonical form are the
    /// same id for integrity checking.
    pub fn stringify(&self) -> String {
        match self {
            Self::Literal(s) => s.clone(),
            Self::Keyed(map) => {
                serde_json::to_string(map).expect("keyed id rendering should succeed")
            }
        }
    }

    /// The literal string, when this id is literal.
    pub fn as_literal(&self) -> Option<&str> {
        match self {
            Self::Literal(s) => Some(s.as_str()),
            Self::Keyed(_) => None,
        }
    }
}

impl From<&str> for ComponentId {
    fn from(s: &str) -> Self {
        Self::Literal(s.to_owned())
    }
}

impl From<String> for ComponentId {
    fn from(s: String) -> Self {
        Self::Literal(s)
    }
}

impl From<BTreeMap<String, ScalarId>> for ComponentId {
    fn from(map: BTreeMap<String, ScalarId>) -> Self {
        Self::Keyed(map)
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.stringify())
    }
}

/// A host value that does not belong to the serializable grammar.
///
/// Carries only what diagnostics need: the concrete type name and a debug
/// rendering. Constructed via [`PropValue::opaque`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpaqueValue {
    type_name: &'static str,
    repr: String,
}

impl OpaqueValue {
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn repr(&self) -> &str {
        &self.repr
    }
}

/// A component property value.
///
/// Everything except [`PropValue::Opaque`] serializes. `Map` contents are
/// plain JSON and therefore valid wholesale; `List` elements are checked
/// individually by the return-value validator.
#[derive(Debug, Clone, PartialEq)]
pub enum PropValue {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    String(String),
    List(Vec<PropValue>),
    Map(serde_json::Map<String, serde_json::Value>),
    Component(Component),
    Opaque(OpaqueValue),
}

impl PropValue {
    /// Wrap an arbitrary host value for diagnostics. The value itself is not
    /// retained, only its type name and debug form.
    pub fn opaque<T: fmt::Debug>(value: &T) -> Self {
        Self::Opaque(OpaqueValue {
            type_name: std::any::type_name::<T>(),
            repr: format!("{value:?}"),
        })
    }

    /// Short label for the kind of value, used in path descriptors and
    /// error messages. Opaque values report their host type name.
    pub fn type_label(&self) -> &str {
        match self {
            Self::Null => "Null",
            Self::Bool(_) => "Bool",
            Self::Number(_) => "Number",
            Self::String(_) => "String",
            Self::List(_) => "List",
            Self::Map(_) => "Map",
            Self::Component(_) => "Component",
            Self::Opaque(o) => o.type_name,
        }
    }

    pub fn as_component(&self) -> Option<&Component> {
        match self {
            Self::Component(c) => Some(c),
            _ => None,
        }
    }
}

impl fmt::Display for PropValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::String(s) => write!(f, "{s:?}"),
            Self::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Self::Map(map) => {
                let rendered =
                    serde_json::to_string(map).expect("json map rendering should succeed");
                write!(f, "{rendered}")
            }
            Self::Component(c) => write!(f, "{c}"),
            Self::Opaque(o) => write!(f, "{}", o.repr),
        }
    }
}

impl From<serde_json::Value> for PropValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => Self::Number(n),
            serde_json::Value::String(s) => Self::String(s),
            serde_json::Value::Array(items) => {
                Self::List(items.into_iter().map(Self::from).collect())
            }
            serde_json::Value::Object(map) => Self::Map(map),
        }
    }
}

impl From<&str> for PropValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_owned())
    }
}

impl From<i64> for PropValue {
    fn from(n: i64) -> Self {
        Self::Number(n.into())
    }
}

impl From<i32> for PropValue {
    fn from(n: i32) -> Self {
        Self::Number(n.into())
    }
}

impl From<Component> for PropValue {
    fn from(c: Component) -> Self {
        Self::Component(c)
    }
}

impl From<Vec<PropValue>> for PropValue {
    fn from(items: Vec<PropValue>) -> Self {
        Self::List(items)
    }
}

/// One node of a layout tree.
///
/// `available_properties` and `available_wildcard_properties` come from the
/// component library's declaration, not from what happens to be set; the
/// dependency validator checks callback properties against the declared set.
/// Nested components live in the `children` property.
#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    pub id: Option<ComponentId>,
    pub component_type: String,
    pub properties: BTreeMap<String, PropValue>,
    pub available_properties: BTreeSet<String>,
    pub available_wildcard_properties: Vec<String>,
}

impl Component {
    pub fn new(component_type: impl Into<String>) -> Self {
        Self {
            id: None,
            component_type: component_type.into(),
            properties: BTreeMap::new(),
            available_properties: BTreeSet::new(),
            available_wildcard_properties: Vec::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<ComponentId>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<PropValue>) -> Self {
        let name = name.into();
        self.available_properties.insert(name.clone());
        self.properties.insert(name, value.into());
        self
    }

    /// Declare a property as available without setting a value.
    pub fn with_available(mut self, name: impl Into<String>) -> Self {
        self.available_properties.insert(name.into());
        self
    }

    /// Declare a wildcard property prefix (for instance `data-`).
    pub fn with_wildcard_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.available_wildcard_properties.push(prefix.into());
        self
    }

    pub fn with_children(self, children: impl Into<PropValue>) -> Self {
        self.with_property("children", children)
    }

    /// The `children` property, if set.
    pub fn children(&self) -> Option<&PropValue> {
        self.properties.get("children")
    }

    /// Depth-first walk over every descendant, each exactly once. The
    /// receiver itself is not yielded. A fresh traversal is produced per
    /// call; nothing is cached across calls.
    pub fn traverse(&self) -> Traverse<'_> {
        Traverse::new(self)
    }

    /// Depth-first walk yielding `(path, value)` for every property value of
    /// this component and every descendant, descending through `children`.
    pub fn traverse_with_paths(&self) -> TraverseWithPaths<'_> {
        TraverseWithPaths::new(self)
    }

    /// First descendant carrying `id` as a literal id. The receiver itself
    /// is not considered; callers compare against the root id separately.
    pub fn find_by_id(&self, id: &str) -> Option<&Component> {
        self.traverse()
            .find(|c| c.id.as_ref().and_then(ComponentId::as_literal) == Some(id))
    }

    /// Whether any descendant carries `id` as a literal id.
    pub fn contains_id(&self, id: &str) -> bool {
        self.find_by_id(id).is_some()
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.id {
            Some(id) => write!(f, "{} (id={})", self.component_type, id.stringify()),
            None => write!(f, "{}", self.component_type),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_id_stringifies_verbatim() {
        let id = ComponentId::from("my-button");
        assert_eq!(id.stringify(), "my-button");
        assert_eq!(id.as_literal(), Some("my-button"));
    }

    #[test]
    fn keyed_id_stringifies_sorted_compact_json() {
        let mut map = BTreeMap::new();
        map.insert("type".to_owned(), ScalarId::from("filter"));
        map.insert("index".to_owned(), ScalarId::from(3));
        let id = ComponentId::Keyed(map);
        assert_eq!(id.stringify(), r#"{"index":3,"type":"filter"}"#);
    }

    #[test]
    fn keyed_id_deserializes_from_json_object() {
        let id: ComponentId = serde_json::from_str(r#"{"index":3,"type":"filter"}"#).unwrap();
        assert!(matches!(id, ComponentId::Keyed(_)));
        let literal: ComponentId = serde_json::from_str(r#""plain""#).unwrap();
        assert_eq!(literal, ComponentId::from("plain"));
    }

    #[test]
    fn opaque_records_type_name_and_repr() {
        #[derive(Debug)]
        struct Handle(u32);

        let value = PropValue::opaque(&Handle(7));
        let PropValue::Opaque(o) = &value else {
            panic!("expected opaque");
        };
        assert!(o.type_name().ends_with("Handle"));
        assert_eq!(o.repr(), "Handle(7)");
        assert_eq!(value.type_label(), o.type_name());
    }

    #[test]
    fn find_by_id_skips_root_and_finds_nested() {
        let tree = Component::new("Div").with_id("root").with_children(
            PropValue::List(vec![
                Component::new("Input").with_id("a").into(),
                Component::new("Div")
                    .with_children(PropValue::Component(
                        Component::new("Graph").with_id("b"),
                    ))
                    .into(),
            ]),
        );

        assert!(!tree.contains_id("root"));
        assert_eq!(tree.find_by_id("a").unwrap().component_type, "Input");
        assert_eq!(tree.find_by_id("b").unwrap().component_type, "Graph");
        assert!(tree.find_by_id("missing").is_none());
    }
}
