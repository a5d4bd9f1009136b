// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Live values, wire snapshots and update sets.
//!
//! Two value planes meet here:
//! - The **live plane** ([`LiveValue`]) is what component fields hold: typed
//!   scalars, dates, enum cases, collections and domain objects.
//! - The **wire plane** ([`WireValue`]) is what crosses the client boundary:
//!   JSON-safe scalars, sequences and string-keyed mappings only.

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset};

/// JSON-safe wire value.
pub type WireValue = serde_json::Value;

/// String-keyed wire mapping (sorted keys).
pub type WireMap = serde_json::Map<String, WireValue>;

/// Extra component attributes carried under [`ATTRIBUTES_KEY`].
pub type Attributes = WireMap;

/// Reserved snapshot key holding the checksum.
pub const CHECKSUM_KEY: &str = "@checksum";

/// Reserved snapshot key holding non-empty [`Attributes`].
pub const ATTRIBUTES_KEY: &str = "@attributes";

/// Backing scalar of an enum case.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EnumScalar {
    /// Integer-backed case.
    Int(i64),
    /// String-backed case.
    Str(String),
}

impl EnumScalar {
    /// Wire form of the scalar.
    pub fn to_wire(&self) -> WireValue {
        match self {
            Self::Int(n) => WireValue::from(*n),
            Self::Str(s) => WireValue::from(s.as_str()),
        }
    }
}

/// A concrete enum case held by a live field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumValue {
    /// Name of the enum type.
    pub enum_name: String,
    /// Name of the case.
    pub case: String,
    /// Backing scalar of the case.
    pub value: EnumScalar,
}

/// A domain object: a named type plus its field values.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObjectValue {
    /// Declared type name (matches an `ObjectSchema` name).
    pub type_name: String,
    /// Field values keyed by field name.
    pub fields: BTreeMap<String, LiveValue>,
}

impl ObjectValue {
    /// Empty object of the given type.
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Builder-style field assignment.
    #[must_use]
    pub fn with(mut self, field: impl Into<String>, value: impl Into<LiveValue>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    /// Field value, if present.
    pub fn get(&self, field: &str) -> Option<&LiveValue> {
        self.fields.get(field)
    }
}

/// Value held by a live component field.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum LiveValue {
    /// Absent / null.
    #[default]
    Null,
    /// Boolean.
    Bool(bool),
    /// 64-bit integer.
    Int(i64),
    /// 64-bit float.
    Float(f64),
    /// UTF-8 string.
    Str(String),
    /// Timezone-qualified instant.
    DateTime(DateTime<FixedOffset>),
    /// Enum case.
    Enum(EnumValue),
    /// Ordered sequence.
    List(Vec<LiveValue>),
    /// String-keyed mapping.
    Map(BTreeMap<String, LiveValue>),
    /// Domain object.
    Object(ObjectValue),
}

impl LiveValue {
    /// `true` for [`LiveValue::Null`].
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Borrow as an object.
    pub const fn as_object(&self) -> Option<&ObjectValue> {
        match self {
            Self::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Borrow as a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Integer value, if any.
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Float value, if any.
    pub const fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Build a mapping from key/value pairs.
    pub fn map<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Self>,
    {
        Self::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Build a list from values.
    pub fn list<V: Into<Self>>(items: impl IntoIterator<Item = V>) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }

    /// Untyped conversion of a wire value into the live plane.
    ///
    /// Used for `Any`-typed subtrees: numbers stay integers when they fit
    /// `i64`, everything else maps one to one.
    pub fn from_wire(wire: &WireValue) -> Self {
        match wire {
            WireValue::Null => Self::Null,
            WireValue::Bool(b) => Self::Bool(*b),
            WireValue::Number(n) => n
                .as_i64()
                .map_or_else(|| Self::Float(n.as_f64().unwrap_or(0.0)), Self::Int),
            WireValue::String(s) => Self::Str(s.clone()),
            WireValue::Array(items) => Self::List(items.iter().map(Self::from_wire).collect()),
            WireValue::Object(entries) => Self::Map(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), Self::from_wire(v)))
                    .collect(),
            ),
        }
    }
}

impl From<bool> for LiveValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for LiveValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for LiveValue {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f64> for LiveValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for LiveValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_owned())
    }
}

impl From<String> for LiveValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<DateTime<FixedOffset>> for LiveValue {
    fn from(value: DateTime<FixedOffset>) -> Self {
        Self::DateTime(value)
    }
}

impl From<EnumValue> for LiveValue {
    fn from(value: EnumValue) -> Self {
        Self::Enum(value)
    }
}

impl From<ObjectValue> for LiveValue {
    fn from(value: ObjectValue) -> Self {
        Self::Object(value)
    }
}

impl<T: Into<Self>> From<Option<T>> for LiveValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// Output of a dehydration: the flat snapshot and the nested-writable snapshot.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DehydratedProps {
    props: WireMap,
    nested_props: WireMap,
}

impl DehydratedProps {
    pub(crate) const fn new(props: WireMap, nested_props: WireMap) -> Self {
        Self {
            props,
            nested_props,
        }
    }

    /// Flat snapshot: one entry per field plus `@checksum` (and `@attributes`).
    pub const fn props(&self) -> &WireMap {
        &self.props
    }

    /// Nested-writable snapshot: one entry per declared writable sub-path.
    pub const fn nested_props(&self) -> &WireMap {
        &self.nested_props
    }

    /// The stamped checksum.
    pub fn checksum(&self) -> Option<&str> {
        self.props.get(CHECKSUM_KEY).and_then(WireValue::as_str)
    }

    /// Split into `(props, nested_props)`.
    pub fn into_parts(self) -> (WireMap, WireMap) {
        (self.props, self.nested_props)
    }
}

/// Ordered set of client-requested changes, keyed by dot-path.
///
/// Iteration follows insertion order; re-inserting a path replaces its value
/// without moving it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UpdateSet {
    entries: Vec<(String, WireValue)>,
}

impl UpdateSet {
    /// Empty update set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the value for `path`.
    pub fn insert(&mut self, path: impl Into<String>, value: WireValue) {
        let path = path.into();
        if let Some(slot) = self.entries.iter_mut().find(|(p, _)| *p == path) {
            slot.1 = value;
        } else {
            self.entries.push((path, value));
        }
    }

    /// Builder-style [`insert`](Self::insert).
    #[must_use]
    pub fn with(mut self, path: impl Into<String>, value: WireValue) -> Self {
        self.insert(path, value);
        self
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` when nothing was updated.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in caller order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &WireValue)> {
        self.entries.iter().map(|(p, v)| (p.as_str(), v))
    }
}

impl<K: Into<String>> FromIterator<(K, WireValue)> for UpdateSet {
    fn from_iter<I: IntoIterator<Item = (K, WireValue)>>(iter: I) -> Self {
        let mut set = Self::new();
        for (path, value) in iter {
            set.insert(path, value);
        }
        set
    }
}

impl From<WireMap> for UpdateSet {
    fn from(map: WireMap) -> Self {
        map.into_iter().collect()
    }
}
