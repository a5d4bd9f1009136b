// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Value normalization: live plane ⇄ wire plane.
//!
//! [`Normalizer`] is the seam the engine calls per field and per writable
//! sub-path. [`DefaultNormalizer`] covers primitives (with the untrusted-input
//! coercion table), dates, backed enums, native collections, codec-backed
//! objects, entities (by identifier) and the generic field-list reduction.
//!
//! Coercion table for untrusted scalars:
//!
//! | input                | int / float         | bool                | string     |
//! |----------------------|---------------------|---------------------|------------|
//! | `""` / whitespace    | `0` (`null` if `?`) | `false` (`null` if `?`) | as is  |
//! | non-numeric string   | `0`                 | invalid unless a known word | as is |
//! | sequence / mapping   | invalid             | invalid             | invalid    |

use chrono::{DateTime, NaiveDateTime};

use crate::entity::{id_text, EntityLoader};
use crate::error::{wire_kind, DenormalizeError, NormalizeError};
use crate::schema::{EnumSchema, ObjectSchema, SerializationContext, TypeRef, ValueKind};
use crate::value::{EnumScalar, LiveValue, ObjectValue, WireMap, WireValue};

/// Wire format of date/time values, e.g. `2023-03-05T09:23:00-05:00`.
pub const DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%:z";

const LOCAL_DATE_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"];

/// Converts live values to wire values and back, guided by a declared type.
pub trait Normalizer {
    /// Live value → wire value.
    fn normalize(
        &self,
        value: &LiveValue,
        ty: &TypeRef,
        ctx: &SerializationContext,
    ) -> Result<WireValue, NormalizeError>;

    /// Wire value → live value. Must tolerate transport drift (an integral
    /// float arriving as an integer and vice versa).
    fn denormalize(
        &self,
        wire: &WireValue,
        ty: &TypeRef,
        ctx: &SerializationContext,
    ) -> Result<LiveValue, DenormalizeError>;
}

impl<N: Normalizer + ?Sized> Normalizer for &N {
    fn normalize(
        &self,
        value: &LiveValue,
        ty: &TypeRef,
        ctx: &SerializationContext,
    ) -> Result<WireValue, NormalizeError> {
        (**self).normalize(value, ty, ctx)
    }

    fn denormalize(
        &self,
        wire: &WireValue,
        ty: &TypeRef,
        ctx: &SerializationContext,
    ) -> Result<LiveValue, DenormalizeError> {
        (**self).denormalize(wire, ty, ctx)
    }
}

/// Built-in normalizer; entities are resolved through `L`.
#[derive(Debug, Clone, Default)]
pub struct DefaultNormalizer<L> {
    loader: L,
}

impl<L: EntityLoader> DefaultNormalizer<L> {
    /// Normalizer resolving entities with `loader`.
    pub const fn new(loader: L) -> Self {
        Self { loader }
    }

    /// The entity loader.
    pub const fn loader(&self) -> &L {
        &self.loader
    }

    fn normalize_object(
        &self,
        schema: &ObjectSchema,
        obj: &ObjectValue,
        ctx: &SerializationContext,
    ) -> Result<WireValue, NormalizeError> {
        if let Some(codec) = schema.codec() {
            return codec.normalize(obj);
        }
        if let Some(id_field) = schema.identifier() {
            let id = obj.get(&id_field.name).unwrap_or(&LiveValue::Null);
            if !id.is_null() {
                return self.normalize(id, &id_field.ty, ctx);
            }
        }
        let mut out = WireMap::new();
        for field in schema.fields() {
            if !field.visible_in(ctx.normalization_groups.as_ref()) {
                continue;
            }
            let value = obj.get(&field.name).unwrap_or(&LiveValue::Null);
            out.insert(field.name.clone(), self.normalize(value, &field.ty, ctx)?);
        }
        Ok(WireValue::Object(out))
    }

    fn denormalize_object(
        &self,
        schema: &ObjectSchema,
        wire: &WireValue,
        ty: &TypeRef,
        ctx: &SerializationContext,
    ) -> Result<LiveValue, DenormalizeError> {
        if let Some(codec) = schema.codec() {
            return codec.denormalize(wire).map(LiveValue::Object);
        }
        match wire {
            WireValue::String(_) | WireValue::Number(_) if schema.is_entity() => self
                .loader
                .find_by_id(schema.name(), wire)
                .map(LiveValue::Object)
                .ok_or_else(|| DenormalizeError::EntityNotFound {
                    entity: schema.name().to_owned(),
                    id: id_text(wire),
                }),
            WireValue::Object(map) => {
                let mut obj = ObjectValue::new(schema.name());
                for field in schema.fields() {
                    let value = match map.get(&field.name) {
                        Some(v) if field.visible_in(ctx.denormalization_groups.as_ref()) => {
                            self.denormalize_lenient(v, &field.ty, ctx)?
                        }
                        _ => field.ty.default_value(),
                    };
                    obj.fields.insert(field.name.clone(), value);
                }
                Ok(LiveValue::Object(obj))
            }
            WireValue::Array(_) => Err(DenormalizeError::UnsupportedShape {
                expected: ty.describe(),
            }),
            other => Err(invalid(ty, other)),
        }
    }

    /// Denormalize, falling back to the type's default for unreadable values
    /// and to `null` for vanished entities in nullable slots.
    fn denormalize_lenient(
        &self,
        wire: &WireValue,
        ty: &TypeRef,
        ctx: &SerializationContext,
    ) -> Result<LiveValue, DenormalizeError> {
        match self.denormalize(wire, ty, ctx) {
            Err(DenormalizeError::InvalidValue { .. }) => Ok(ty.default_value()),
            Err(DenormalizeError::EntityNotFound { .. }) if ty.is_nullable() => {
                Ok(LiveValue::Null)
            }
            other => other,
        }
    }
}

impl<L: EntityLoader> Normalizer for DefaultNormalizer<L> {
    fn normalize(
        &self,
        value: &LiveValue,
        ty: &TypeRef,
        ctx: &SerializationContext,
    ) -> Result<WireValue, NormalizeError> {
        match (ty.kind(), value) {
            (_, LiveValue::Null) => Ok(WireValue::Null),
            (ValueKind::Any, v) => any_to_wire(v),
            (ValueKind::Bool, LiveValue::Bool(b)) => Ok(WireValue::Bool(*b)),
            (ValueKind::Int, LiveValue::Int(n)) => Ok(WireValue::from(*n)),
            (ValueKind::Float, LiveValue::Float(f)) => float_to_wire(*f),
            #[allow(clippy::cast_precision_loss)]
            (ValueKind::Float, LiveValue::Int(n)) => float_to_wire(*n as f64),
            (ValueKind::Str, LiveValue::Str(s)) => Ok(WireValue::String(s.clone())),
            (ValueKind::DateTime, LiveValue::DateTime(dt)) => {
                Ok(WireValue::String(dt.format(DATE_FORMAT).to_string()))
            }
            (ValueKind::Enum(_), LiveValue::Enum(e)) => Ok(e.value.to_wire()),
            (ValueKind::List(item), LiveValue::List(items)) => items
                .iter()
                .map(|v| self.normalize(v, item, ctx))
                .collect::<Result<Vec<_>, _>>()
                .map(WireValue::Array),
            (ValueKind::Map(inner), LiveValue::Map(entries)) => entries
                .iter()
                .map(|(k, v)| Ok((k.clone(), self.normalize(v, inner, ctx)?)))
                .collect::<Result<WireMap, _>>()
                .map(WireValue::Object),
            (ValueKind::Object(schema), LiveValue::Object(obj)) => {
                self.normalize_object(schema, obj, ctx)
            }
            (_, other) => Err(NormalizeError::TypeMismatch {
                expected: ty.describe(),
                found: live_kind(other),
            }),
        }
    }

    fn denormalize(
        &self,
        wire: &WireValue,
        ty: &TypeRef,
        ctx: &SerializationContext,
    ) -> Result<LiveValue, DenormalizeError> {
        if wire.is_null() {
            return if ty.is_nullable() || matches!(ty.kind(), ValueKind::Any) {
                Ok(LiveValue::Null)
            } else {
                Err(invalid(ty, wire))
            };
        }
        match ty.kind() {
            ValueKind::Any => Ok(LiveValue::from_wire(wire)),
            ValueKind::Bool => coerce_bool(wire, ty),
            ValueKind::Int => coerce_int(wire, ty),
            ValueKind::Float => coerce_float(wire, ty),
            ValueKind::Str => coerce_str(wire, ty),
            ValueKind::DateTime => parse_date(wire, ty),
            ValueKind::Enum(schema) => coerce_enum(schema, wire, ty),
            ValueKind::List(item) => match wire {
                WireValue::Array(items) => items
                    .iter()
                    .map(|v| self.denormalize_lenient(v, item, ctx))
                    .collect::<Result<Vec<_>, _>>()
                    .map(LiveValue::List),
                other => Err(invalid(ty, other)),
            },
            ValueKind::Map(inner) => match wire {
                WireValue::Object(entries) => entries
                    .iter()
                    .map(|(k, v)| Ok((k.clone(), self.denormalize_lenient(v, inner, ctx)?)))
                    .collect::<Result<_, _>>()
                    .map(LiveValue::Map),
                WireValue::Array(items) => items
                    .iter()
                    .enumerate()
                    .map(|(i, v)| Ok((i.to_string(), self.denormalize_lenient(v, inner, ctx)?)))
                    .collect::<Result<_, _>>()
                    .map(LiveValue::Map),
                other => Err(invalid(ty, other)),
            },
            ValueKind::Object(schema) => self.denormalize_object(schema, wire, ty, ctx),
        }
    }
}

fn invalid(ty: &TypeRef, wire: &WireValue) -> DenormalizeError {
    DenormalizeError::InvalidValue {
        expected: ty.describe(),
        found: wire_kind(wire),
    }
}

const fn live_kind(value: &LiveValue) -> &'static str {
    match value {
        LiveValue::Null => "null",
        LiveValue::Bool(_) => "bool",
        LiveValue::Int(_) => "int",
        LiveValue::Float(_) => "float",
        LiveValue::Str(_) => "string",
        LiveValue::DateTime(_) => "DateTime",
        LiveValue::Enum(_) => "enum",
        LiveValue::List(_) => "list",
        LiveValue::Map(_) => "map",
        LiveValue::Object(_) => "object",
    }
}

fn float_to_wire(f: f64) -> Result<WireValue, NormalizeError> {
    serde_json::Number::from_f64(f)
        .map(WireValue::Number)
        .ok_or(NormalizeError::NonFinite(f))
}

fn any_to_wire(value: &LiveValue) -> Result<WireValue, NormalizeError> {
    Ok(match value {
        LiveValue::Null => WireValue::Null,
        LiveValue::Bool(b) => WireValue::Bool(*b),
        LiveValue::Int(n) => WireValue::from(*n),
        LiveValue::Float(f) => float_to_wire(*f)?,
        LiveValue::Str(s) => WireValue::String(s.clone()),
        LiveValue::DateTime(dt) => WireValue::String(dt.format(DATE_FORMAT).to_string()),
        LiveValue::Enum(e) => e.value.to_wire(),
        LiveValue::List(items) => {
            WireValue::Array(items.iter().map(any_to_wire).collect::<Result<_, _>>()?)
        }
        LiveValue::Map(entries) => WireValue::Object(
            entries
                .iter()
                .map(|(k, v)| Ok((k.clone(), any_to_wire(v)?)))
                .collect::<Result<_, NormalizeError>>()?,
        ),
        LiveValue::Object(obj) => WireValue::Object(
            obj.fields
                .iter()
                .map(|(k, v)| Ok((k.clone(), any_to_wire(v)?)))
                .collect::<Result<_, NormalizeError>>()?,
        ),
    })
}

/// Integral value of a finite float inside the `i64` range.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::float_cmp
)]
fn integral(f: f64) -> Option<i64> {
    (f.is_finite() && f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64)
        .then_some(f as i64)
}

fn coerce_int(wire: &WireValue, ty: &TypeRef) -> Result<LiveValue, DenormalizeError> {
    match wire {
        WireValue::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().and_then(integral))
            .map(LiveValue::Int)
            .ok_or_else(|| invalid(ty, wire)),
        WireValue::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                return Ok(if ty.is_nullable() {
                    LiveValue::Null
                } else {
                    LiveValue::Int(0)
                });
            }
            let parsed = s
                .parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().map(f64::trunc).and_then(integral));
            Ok(LiveValue::Int(parsed.unwrap_or(0)))
        }
        WireValue::Bool(b) => Ok(LiveValue::Int(i64::from(*b))),
        other => Err(invalid(ty, other)),
    }
}

fn coerce_float(wire: &WireValue, ty: &TypeRef) -> Result<LiveValue, DenormalizeError> {
    match wire {
        WireValue::Number(n) => n
            .as_f64()
            .map(LiveValue::Float)
            .ok_or_else(|| invalid(ty, wire)),
        WireValue::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                return Ok(if ty.is_nullable() {
                    LiveValue::Null
                } else {
                    LiveValue::Float(0.0)
                });
            }
            let parsed = s.parse::<f64>().ok().filter(|f| f.is_finite());
            Ok(LiveValue::Float(parsed.unwrap_or(0.0)))
        }
        WireValue::Bool(b) => Ok(LiveValue::Float(if *b { 1.0 } else { 0.0 })),
        other => Err(invalid(ty, other)),
    }
}

fn coerce_bool(wire: &WireValue, ty: &TypeRef) -> Result<LiveValue, DenormalizeError> {
    match wire {
        WireValue::Bool(b) => Ok(LiveValue::Bool(*b)),
        WireValue::Number(n) => Ok(LiveValue::Bool(n.as_f64().is_some_and(|f| f.abs() > 0.0))),
        WireValue::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "" if ty.is_nullable() => Ok(LiveValue::Null),
            "" | "0" | "false" | "off" | "no" => Ok(LiveValue::Bool(false)),
            "1" | "true" | "on" | "yes" => Ok(LiveValue::Bool(true)),
            _ => Err(invalid(ty, wire)),
        },
        other => Err(invalid(ty, other)),
    }
}

fn coerce_str(wire: &WireValue, ty: &TypeRef) -> Result<LiveValue, DenormalizeError> {
    match wire {
        WireValue::String(s) => Ok(LiveValue::Str(s.clone())),
        WireValue::Number(n) => Ok(LiveValue::Str(n.to_string())),
        WireValue::Bool(b) => Ok(LiveValue::Str(b.to_string())),
        other => Err(invalid(ty, other)),
    }
}

fn parse_date(wire: &WireValue, ty: &TypeRef) -> Result<LiveValue, DenormalizeError> {
    match wire {
        WireValue::String(s) => {
            let s = s.trim();
            if s.is_empty() && ty.is_nullable() {
                return Ok(LiveValue::Null);
            }
            if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                return Ok(LiveValue::DateTime(dt));
            }
            LOCAL_DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                .map(|naive| LiveValue::DateTime(naive.and_utc().fixed_offset()))
                .ok_or_else(|| invalid(ty, wire))
        }
        WireValue::Array(_) | WireValue::Object(_) => Err(DenormalizeError::UnsupportedShape {
            expected: ty.describe(),
        }),
        other => Err(invalid(ty, other)),
    }
}

fn coerce_enum(
    schema: &EnumSchema,
    wire: &WireValue,
    ty: &TypeRef,
) -> Result<LiveValue, DenormalizeError> {
    let scalar = if schema.is_int_backed() {
        match wire {
            WireValue::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(integral)),
            WireValue::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        }
        .map(EnumScalar::Int)
    } else {
        match wire {
            WireValue::String(s) => Some(EnumScalar::Str(s.clone())),
            WireValue::Number(n) => Some(EnumScalar::Str(n.to_string())),
            _ => None,
        }
    };
    match scalar.and_then(|s| schema.from_scalar(&s)) {
        Some(case) => Ok(LiveValue::Enum(case)),
        None if ty.is_nullable() => Ok(LiveValue::Null),
        None => Err(invalid(ty, wire)),
    }
}
