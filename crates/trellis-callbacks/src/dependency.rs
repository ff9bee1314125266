//! Callback dependency declarations and identity matching.
//!
//! A dependency names a component (literally or through a wildcard pattern)
//! plus one of its properties. Outputs, inputs, and state share one struct,
//! tagged by [`DependencyKind`]; the kind decides which wildcard tokens the
//! id pattern may carry.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use trellis_tree::{ComponentId, ScalarId};

/// Wildcard tokens usable in place of a scalar inside a pattern id.
///
/// `Any` pairs one fired instance with one output instance, `All` fans in
/// every matching instance, `AllSmaller` fans in the instances with smaller
/// key values. On the wire each token is a one-element array (`["ANY"]`) so
/// it cannot be confused with a string scalar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Wildcard {
    Any,
    All,
    AllSmaller,
}

impl Wildcard {
    pub fn token(&self) -> &'static str {
        match self {
            Self::Any => "ANY",
            Self::All => "ALL",
            Self::AllSmaller => "ALLSMALLER",
        }
    }
}

impl fmt::Display for Wildcard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.token())
    }
}

impl Serialize for Wildcard {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        [self.token()].serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Wildcard {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tokens = Vec::<String>::deserialize(deserializer)?;
        match tokens.as_slice() {
            [token] => match token.as_str() {
                "ANY" => Ok(Self::Any),
                "ALL" => Ok(Self::All),
                "ALLSMALLER" => Ok(Self::AllSmaller),
                other => Err(D::Error::custom(format!("unknown wildcard token `{other}`"))),
            },
            _ => Err(D::Error::custom("wildcard must be a one-element array")),
        }
    }
}

/// One value inside a pattern id: either a wildcard token or a scalar.
///
/// The scalar side is kept as raw JSON so the validator can reject
/// non-scalar payloads with a diagnostic instead of failing to parse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PatternValue {
    Wildcard(Wildcard),
    Scalar(serde_json::Value),
}

impl PatternValue {
    pub fn as_wildcard(&self) -> Option<Wildcard> {
        match self {
            Self::Wildcard(w) => Some(*w),
            Self::Scalar(_) => None,
        }
    }

    /// Whether the scalar side is one of the permitted scalar types
    /// (string, number, bool). Wildcards are judged separately against the
    /// kind's allowed set.
    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            Self::Scalar(
                serde_json::Value::String(_)
                    | serde_json::Value::Number(_)
                    | serde_json::Value::Bool(_)
            )
        )
    }
}

impl From<Wildcard> for PatternValue {
    fn from(w: Wildcard) -> Self {
        Self::Wildcard(w)
    }
}

impl From<&str> for PatternValue {
    fn from(s: &str) -> Self {
        Self::Scalar(serde_json::Value::String(s.to_owned()))
    }
}

impl From<i64> for PatternValue {
    fn from(n: i64) -> Self {
        Self::Scalar(serde_json::Value::Number(n.into()))
    }
}

impl From<i32> for PatternValue {
    fn from(n: i32) -> Self {
        Self::Scalar(serde_json::Value::Number(n.into()))
    }
}

impl From<bool> for PatternValue {
    fn from(b: bool) -> Self {
        Self::Scalar(serde_json::Value::Bool(b))
    }
}

/// The component side of a dependency: a literal id or a wildcard pattern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DependencyId {
    Literal(String),
    Pattern(BTreeMap<String, PatternValue>),
}

impl DependencyId {
    /// Canonical string form, mirroring [`ComponentId::stringify`]: literal
    /// ids verbatim, patterns as compact JSON with sorted keys and wildcard
    /// tokens rendered as one-element arrays.
    pub fn stringify(&self) -> String {
        match self {
            Self::Literal(s) => s.clone(),
            Self::Pattern(map) => {
                serde_json::to_string(map).expect("pattern id rendering should succeed")
            }
        }
    }

    /// Whether this id matches a concrete component identity.
    ///
    /// Literal against literal is exact equality. A pattern matches a keyed
    /// identity when every pattern key is satisfied: a wildcard value (drawn
    /// from `allowed`) requires only that the key exist on the candidate, a
    /// scalar value must equal the candidate's scalar. Candidate keys absent
    /// from the pattern are unconstrained.
    pub fn matches(&self, candidate: &ComponentId, allowed: &[Wildcard]) -> bool {
        match (self, candidate) {
            (Self::Literal(id), ComponentId::Literal(other)) => id == other,
            (Self::Pattern(pattern), ComponentId::Keyed(keyed)) => {
                pattern.iter().all(|(key, value)| match value {
                    PatternValue::Wildcard(w) => {
                        allowed.contains(w) && keyed.contains_key(key)
                    }
                    PatternValue::Scalar(scalar) => {
                        keyed.get(key).is_some_and(|c| scalar_eq(scalar, c))
                    }
                })
            }
            _ => false,
        }
    }
}

fn scalar_eq(value: &serde_json::Value, scalar: &ScalarId) -> bool {
    match (value, scalar) {
        (serde_json::Value::String(a), ScalarId::String(b)) => a == b,
        (serde_json::Value::Number(a), ScalarId::Number(b)) => a == b,
        (serde_json::Value::Bool(a), ScalarId::Bool(b)) => a == b,
        _ => false,
    }
}

impl From<&str> for DependencyId {
    fn from(s: &str) -> Self {
        Self::Literal(s.to_owned())
    }
}

impl From<String> for DependencyId {
    fn from(s: String) -> Self {
        Self::Literal(s)
    }
}

impl From<BTreeMap<String, PatternValue>> for DependencyId {
    fn from(map: BTreeMap<String, PatternValue>) -> Self {
        Self::Pattern(map)
    }
}

impl fmt::Display for DependencyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.stringify())
    }
}

/// Which role a dependency plays in a callback.
///
/// The kind carries its capability record: the wildcard tokens its patterns
/// may use. Outputs cannot use `ALLSMALLER`; an output must address the
/// instances it writes, not a shrinking window of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyKind {
    Output,
    Input,
    State,
}

impl DependencyKind {
    pub fn allowed_wildcards(&self) -> &'static [Wildcard] {
        match self {
            Self::Output => &[Wildcard::Any, Wildcard::All],
            Self::Input | Self::State => {
                &[Wildcard::Any, Wildcard::All, Wildcard::AllSmaller]
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Output => "Output",
            Self::Input => "Input",
            Self::State => "State",
        }
    }
}

impl fmt::Display for DependencyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A single callback dependency: kind + component id + property.
///
/// `component_event` is a relic of the removed event system. It is accepted
/// from serialized form so old definitions still parse, and its presence is
/// always a registration error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dependency {
    pub kind: DependencyKind,
    pub component_id: DependencyId,
    pub component_property: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component_event: Option<String>,
}

impl Dependency {
    pub fn new(
        kind: DependencyKind,
        component_id: impl Into<DependencyId>,
        component_property: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            component_id: component_id.into(),
            component_property: component_property.into(),
            component_event: None,
        }
    }

    pub fn output(id: impl Into<DependencyId>, property: impl Into<String>) -> Self {
        Self::new(DependencyKind::Output, id, property)
    }

    pub fn input(id: impl Into<DependencyId>, property: impl Into<String>) -> Self {
        Self::new(DependencyKind::Input, id, property)
    }

    pub fn state(id: impl Into<DependencyId>, property: impl Into<String>) -> Self {
        Self::new(DependencyKind::State, id, property)
    }

    /// Keys of the pattern id whose value is one of `tokens`. Empty for
    /// literal ids.
    pub fn wildcard_keys(&self, tokens: &[Wildcard]) -> BTreeSet<String> {
        match &self.component_id {
            DependencyId::Literal(_) => BTreeSet::new(),
            DependencyId::Pattern(map) => map
                .iter()
                .filter_map(|(key, value)| match value.as_wildcard() {
                    Some(w) if tokens.contains(&w) => Some(key.clone()),
                    _ => None,
                })
                .collect(),
        }
    }

    fn id_matches(&self, other: &Self) -> bool {
        match (&self.component_id, &other.component_id) {
            (DependencyId::Literal(a), DependencyId::Literal(b)) => a == b,
            (DependencyId::Pattern(a), DependencyId::Pattern(b)) => {
                if !a.keys().eq(b.keys()) {
                    return false;
                }
                a.iter().all(|(key, va)| {
                    let vb = &b[key];
                    va == vb
                        || matches!(va, PatternValue::Wildcard(_))
                        || matches!(vb, PatternValue::Wildcard(_))
                })
            }
            _ => false,
        }
    }
}

/// Wildcard-tolerant equality over dependencies, ignoring kind.
///
/// Two pattern ids compare equal when their key sets match and every shared
/// key either has equal values or a wildcard on at least one side. This is
/// deliberately non-transitive; the canonical string form ([`fmt::Display`])
/// is the authority for "truly identical".
impl PartialEq for Dependency {
    fn eq(&self, other: &Self) -> bool {
        self.component_property == other.component_property && self.id_matches(other)
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.component_id.stringify(), self.component_property)
    }
}

/// Shorthand for building a pattern id in code.
pub fn pattern<K, V, I>(entries: I) -> DependencyId
where
    K: Into<String>,
    V: Into<PatternValue>,
    I: IntoIterator<Item = (K, V)>,
{
    DependencyId::Pattern(
        entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect(),
    )
}
