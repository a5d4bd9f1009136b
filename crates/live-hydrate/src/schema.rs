// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Declared types, field descriptors and write policies.
//!
//! Nothing here is discovered at runtime: every hydratable domain type spells
//! out its field list as an [`ObjectSchema`], and every component spells out
//! its fields as [`FieldDescriptor`]s collected into a [`ComponentMetadata`].
//! Metadata is immutable once built and is shared across instances.

use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::sync::Arc;

use crate::error::{DenormalizeError, HydrationError, NormalizeError};
use crate::value::{EnumScalar, EnumValue, LiveValue, ObjectValue, WireValue};

/// Writable-path marker that authorizes replacing an entity field's identifier.
pub const IDENTITY_PATH: &str = "@id";

/// Custom converter declared by a domain type (e.g. money as `"500|CAD"`).
pub trait ObjectCodec: Send + Sync {
    /// Reduce an object to a wire value.
    fn normalize(&self, value: &ObjectValue) -> Result<WireValue, NormalizeError>;
    /// Rebuild an object from a wire value.
    fn denormalize(&self, wire: &WireValue) -> Result<ObjectValue, DenormalizeError>;
}

/// One field of an [`ObjectSchema`].
#[derive(Debug, Clone)]
pub struct ObjectField {
    /// Field name (also its key in the generic mapping reduction).
    pub name: String,
    /// Declared type.
    pub ty: TypeRef,
    /// Serialization groups the field belongs to. Empty means "no group".
    pub groups: BTreeSet<String>,
}

impl ObjectField {
    /// Field without serialization groups.
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
            groups: BTreeSet::new(),
        }
    }

    /// Builder-style group membership.
    #[must_use]
    pub fn in_groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.groups.extend(groups.into_iter().map(Into::into));
        self
    }

    /// Whether the field takes part under the given group filter.
    ///
    /// `None` means "no filter"; a filter only admits fields sharing a group.
    pub fn visible_in(&self, filter: Option<&BTreeSet<String>>) -> bool {
        filter.is_none_or(|groups| !self.groups.is_disjoint(groups))
    }
}

/// Explicit field list of a domain type.
pub struct ObjectSchema {
    name: String,
    fields: Vec<ObjectField>,
    identifier: Option<String>,
    codec: Option<Arc<dyn ObjectCodec>>,
}

impl ObjectSchema {
    /// Plain object schema.
    pub fn new(name: impl Into<String>, fields: Vec<ObjectField>) -> Self {
        Self {
            name: name.into(),
            fields,
            identifier: None,
            codec: None,
        }
    }

    /// Mark the type as an entity identified by `field`.
    #[must_use]
    pub fn identified_by(mut self, field: impl Into<String>) -> Self {
        self.identifier = Some(field.into());
        self
    }

    /// Attach a custom codec.
    #[must_use]
    pub fn with_codec(mut self, codec: Arc<dyn ObjectCodec>) -> Self {
        self.codec = Some(codec);
        self
    }

    /// Type name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared fields in declaration order.
    pub fn fields(&self) -> &[ObjectField] {
        &self.fields
    }

    /// Field by name.
    pub fn field(&self, name: &str) -> Option<&ObjectField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Identifier field, for entities.
    pub fn identifier(&self) -> Option<&ObjectField> {
        self.identifier.as_deref().and_then(|id| self.field(id))
    }

    /// `true` when instances are looked up by identifier.
    pub const fn is_entity(&self) -> bool {
        self.identifier.is_some()
    }

    /// Custom codec, if declared.
    pub fn codec(&self) -> Option<&dyn ObjectCodec> {
        self.codec.as_deref()
    }
}

impl fmt::Debug for ObjectSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectSchema")
            .field("name", &self.name)
            .field("fields", &self.fields)
            .field("identifier", &self.identifier)
            .field("codec", &self.codec.is_some())
            .finish()
    }
}

/// Declared cases of an enum type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumSchema {
    name: String,
    cases: Vec<(String, EnumScalar)>,
}

impl EnumSchema {
    /// Enum with the given `(case name, backing scalar)` pairs.
    pub fn new<I, S>(name: impl Into<String>, cases: I) -> Self
    where
        I: IntoIterator<Item = (S, EnumScalar)>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            cases: cases.into_iter().map(|(n, v)| (n.into(), v)).collect(),
        }
    }

    /// Type name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// `true` when cases are integer-backed.
    pub fn is_int_backed(&self) -> bool {
        self.cases
            .first()
            .is_some_and(|(_, v)| matches!(v, EnumScalar::Int(_)))
    }

    /// Case whose backing scalar equals `scalar`.
    pub fn from_scalar(&self, scalar: &EnumScalar) -> Option<EnumValue> {
        self.cases
            .iter()
            .find(|(_, v)| v == scalar)
            .map(|(case, v)| self.value(case, v))
    }

    /// Case by name.
    pub fn case(&self, name: &str) -> Option<EnumValue> {
        self.cases
            .iter()
            .find(|(case, _)| case == name)
            .map(|(case, v)| self.value(case, v))
    }

    fn value(&self, case: &str, scalar: &EnumScalar) -> EnumValue {
        EnumValue {
            enum_name: self.name.clone(),
            case: case.to_owned(),
            value: scalar.clone(),
        }
    }
}

/// Kind of a declared type.
#[derive(Debug, Clone)]
pub enum ValueKind {
    /// Untyped native data (arbitrary JSON-safe tree).
    Any,
    /// Boolean.
    Bool,
    /// Integer.
    Int,
    /// Float.
    Float,
    /// String.
    Str,
    /// Timezone-qualified date/time.
    DateTime,
    /// Backed enum.
    Enum(Arc<EnumSchema>),
    /// Native ordered sequence.
    List(Box<TypeRef>),
    /// Native string-keyed mapping.
    Map(Box<TypeRef>),
    /// Domain object or entity.
    Object(Arc<ObjectSchema>),
}

/// A declared type plus nullability.
#[derive(Debug, Clone)]
pub struct TypeRef {
    kind: ValueKind,
    nullable: bool,
}

impl TypeRef {
    const fn of(kind: ValueKind) -> Self {
        Self {
            kind,
            nullable: false,
        }
    }

    /// Untyped native data.
    pub const fn any() -> Self {
        Self::of(ValueKind::Any)
    }

    /// Boolean.
    pub const fn bool() -> Self {
        Self::of(ValueKind::Bool)
    }

    /// Integer.
    pub const fn int() -> Self {
        Self::of(ValueKind::Int)
    }

    /// Float.
    pub const fn float() -> Self {
        Self::of(ValueKind::Float)
    }

    /// String.
    pub const fn string() -> Self {
        Self::of(ValueKind::Str)
    }

    /// Date/time.
    pub const fn date_time() -> Self {
        Self::of(ValueKind::DateTime)
    }

    /// Backed enum.
    pub const fn enumeration(schema: Arc<EnumSchema>) -> Self {
        Self::of(ValueKind::Enum(schema))
    }

    /// Sequence of `item`.
    pub fn list(item: Self) -> Self {
        Self::of(ValueKind::List(Box::new(item)))
    }

    /// Mapping to `value`.
    pub fn map(value: Self) -> Self {
        Self::of(ValueKind::Map(Box::new(value)))
    }

    /// Domain object or entity.
    pub const fn object(schema: Arc<ObjectSchema>) -> Self {
        Self::of(ValueKind::Object(schema))
    }

    /// Same type, nullable.
    #[must_use]
    pub const fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Declared kind.
    pub const fn kind(&self) -> &ValueKind {
        &self.kind
    }

    /// Whether `null` is a legal value.
    pub const fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// Native sequences and mappings, whose shape the client may rewrite.
    pub const fn is_structural(&self) -> bool {
        matches!(
            self.kind,
            ValueKind::Any | ValueKind::List(_) | ValueKind::Map(_)
        )
    }

    /// Types rebuilt through a constructor rather than read as a scalar.
    pub const fn is_object_like(&self) -> bool {
        matches!(self.kind, ValueKind::DateTime | ValueKind::Object(_))
    }

    /// Entity schema, if this is an entity type.
    pub fn entity(&self) -> Option<&ObjectSchema> {
        match &self.kind {
            ValueKind::Object(schema) if schema.is_entity() => Some(schema),
            _ => None,
        }
    }

    /// Declared type at a dot-path below this one.
    pub fn resolve(&self, path: &str) -> Option<Self> {
        let mut current = self.clone();
        for segment in path.split('.') {
            if segment.is_empty() {
                return None;
            }
            current = match current.kind {
                ValueKind::Any => Self::any(),
                ValueKind::List(item) => {
                    segment.parse::<usize>().ok()?;
                    *item
                }
                ValueKind::Map(value) => *value,
                ValueKind::Object(schema) => schema.field(segment)?.ty.clone(),
                _ => return None,
            };
        }
        Some(current)
    }

    /// Coercion default used when an untrusted value cannot be read.
    pub fn default_value(&self) -> LiveValue {
        if self.nullable {
            return LiveValue::Null;
        }
        match self.kind {
            ValueKind::Bool => LiveValue::Bool(false),
            ValueKind::Int => LiveValue::Int(0),
            ValueKind::Float => LiveValue::Float(0.0),
            ValueKind::Str => LiveValue::Str(String::new()),
            ValueKind::List(_) => LiveValue::List(Vec::new()),
            ValueKind::Map(_) => LiveValue::Map(Default::default()),
            _ => LiveValue::Null,
        }
    }

    /// Short human-readable name for error messages.
    pub fn describe(&self) -> String {
        let base = match &self.kind {
            ValueKind::Any => "mixed".to_owned(),
            ValueKind::Bool => "bool".to_owned(),
            ValueKind::Int => "int".to_owned(),
            ValueKind::Float => "float".to_owned(),
            ValueKind::Str => "string".to_owned(),
            ValueKind::DateTime => "DateTime".to_owned(),
            ValueKind::Enum(schema) => schema.name().to_owned(),
            ValueKind::List(item) => format!("list<{}>", item.describe()),
            ValueKind::Map(value) => format!("map<{}>", value.describe()),
            ValueKind::Object(schema) => schema.name().to_owned(),
        };
        if self.nullable {
            format!("?{base}")
        } else {
            base
        }
    }
}

/// Client write authorization for one field.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum WritePolicy {
    /// Read-only: any change is rejected.
    #[default]
    NotWritable,
    /// The whole value, and anything under it, may change.
    FullyWritable,
    /// Only the listed sub-paths may change.
    WritablePaths(BTreeSet<String>),
}

impl WritePolicy {
    /// Policy from an iterator of sub-paths.
    pub fn paths<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::WritablePaths(paths.into_iter().map(Into::into).collect())
    }
}

/// Field-level serialization context.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SerializationContext {
    /// Groups admitted when normalizing objects (`None`: all fields).
    pub normalization_groups: Option<BTreeSet<String>>,
    /// Groups admitted when denormalizing objects (`None`: all fields).
    pub denormalization_groups: Option<BTreeSet<String>>,
}

/// Converts a live value to wire form, replacing the normalizer for a field.
pub type NormalizeHook =
    Arc<dyn Fn(&LiveValue) -> Result<WireValue, NormalizeError> + Send + Sync>;

/// Rebuilds a live value from wire form, replacing the normalizer for a field.
pub type DenormalizeHook =
    Arc<dyn Fn(&WireValue) -> Result<LiveValue, DenormalizeError> + Send + Sync>;

/// Metadata of one component field.
#[derive(Clone)]
pub struct FieldDescriptor {
    source_name: String,
    wire_name: String,
    ty: TypeRef,
    write_policy: WritePolicy,
    hydrated: bool,
    normalize_hook: Option<NormalizeHook>,
    denormalize_hook: Option<DenormalizeHook>,
    context: SerializationContext,
    is_identity: bool,
}

impl FieldDescriptor {
    /// Read-only, hydrated field whose wire name equals its source name.
    pub fn new(source_name: impl Into<String>, ty: TypeRef) -> Self {
        let source_name = source_name.into();
        let is_identity = ty.entity().is_some();
        Self {
            wire_name: source_name.clone(),
            source_name,
            ty,
            write_policy: WritePolicy::NotWritable,
            hydrated: true,
            normalize_hook: None,
            denormalize_hook: None,
            context: SerializationContext::default(),
            is_identity,
        }
    }

    /// Builder-style wire name.
    #[must_use]
    pub fn wire_name(mut self, name: impl Into<String>) -> Self {
        self.wire_name = name.into();
        self
    }

    /// Builder-style write policy.
    #[must_use]
    pub fn writable(mut self, policy: WritePolicy) -> Self {
        self.write_policy = policy;
        self
    }

    /// Exclude the field from (de)hydration.
    #[must_use]
    pub const fn skip_hydration(mut self) -> Self {
        self.hydrated = false;
        self
    }

    /// Builder-style normalize hook.
    #[must_use]
    pub fn normalize_with(mut self, hook: NormalizeHook) -> Self {
        self.normalize_hook = Some(hook);
        self
    }

    /// Builder-style denormalize hook.
    #[must_use]
    pub fn denormalize_with(mut self, hook: DenormalizeHook) -> Self {
        self.denormalize_hook = Some(hook);
        self
    }

    /// Builder-style serialization context.
    #[must_use]
    pub fn context(mut self, context: SerializationContext) -> Self {
        self.context = context;
        self
    }

    /// Name of the field on the component.
    pub fn source(&self) -> &str {
        &self.source_name
    }

    /// Key of the field in wire snapshots.
    pub fn wire(&self) -> &str {
        &self.wire_name
    }

    /// Declared type.
    pub const fn ty(&self) -> &TypeRef {
        &self.ty
    }

    /// Write authorization.
    pub const fn write_policy(&self) -> &WritePolicy {
        &self.write_policy
    }

    /// Whether the field takes part in (de)hydration.
    pub const fn is_hydrated(&self) -> bool {
        self.hydrated
    }

    /// Field-level normalize hook.
    pub const fn normalize_hook(&self) -> Option<&NormalizeHook> {
        self.normalize_hook.as_ref()
    }

    /// Field-level denormalize hook.
    pub const fn denormalize_hook(&self) -> Option<&DenormalizeHook> {
        self.denormalize_hook.as_ref()
    }

    /// Serialization context.
    pub const fn serialization_context(&self) -> &SerializationContext {
        &self.context
    }

    /// `true` when the field holds an entity resolved by identifier.
    pub const fn is_identity(&self) -> bool {
        self.is_identity
    }
}

impl fmt::Debug for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("source_name", &self.source_name)
            .field("wire_name", &self.wire_name)
            .field("ty", &self.ty.describe())
            .field("write_policy", &self.write_policy)
            .field("hydrated", &self.hydrated)
            .field("normalize_hook", &self.normalize_hook.is_some())
            .field("denormalize_hook", &self.denormalize_hook.is_some())
            .field("context", &self.context)
            .field("is_identity", &self.is_identity)
            .finish()
    }
}

/// Validated field set of one component type.
#[derive(Debug, Clone)]
pub struct ComponentMetadata {
    name: String,
    fields: Vec<FieldDescriptor>,
}

impl ComponentMetadata {
    /// Validate and freeze a component's field set.
    ///
    /// Wire names must be unique, dot-free and must not start with `@`.
    pub fn new(
        name: impl Into<String>,
        fields: Vec<FieldDescriptor>,
    ) -> Result<Self, HydrationError> {
        let mut seen = HashSet::new();
        for field in &fields {
            let wire = field.wire();
            let reason = if wire.is_empty() {
                Some("wire name is empty")
            } else if wire.contains('.') {
                Some("wire name must not contain '.'")
            } else if wire.starts_with('@') {
                Some("wire names starting with '@' are reserved")
            } else if !seen.insert(wire) {
                Some("wire name is used by more than one field")
            } else {
                None
            };
            if let Some(reason) = reason {
                return Err(HydrationError::InvalidConfiguration {
                    path: wire.to_owned(),
                    reason: reason.to_owned(),
                });
            }
        }
        Ok(Self {
            name: name.into(),
            fields,
        })
    }

    /// Component type name (scopes the checksum key).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All field descriptors.
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Fields taking part in (de)hydration.
    pub fn hydrated_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter().filter(|f| f.is_hydrated())
    }

    /// Hydrated field by wire name.
    pub fn by_wire_name(&self, wire: &str) -> Option<&FieldDescriptor> {
        self.hydrated_fields().find(|f| f.wire() == wire)
    }
}
