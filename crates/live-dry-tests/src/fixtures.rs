// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Fixture domain types: schemas, codecs and value constructors.

use chrono::DateTime;
use live_hydrate::{
    DenormalizeError, EnumScalar, EnumSchema, LiveValue, NormalizeError, ObjectCodec, ObjectField,
    ObjectSchema, ObjectValue, SerializationContext, TypeRef, WireValue,
};
use std::sync::Arc;

/// Group admitting blog post fields when normalizing.
pub const NORMALIZATION_GROUP: &str = "the_normalization_group";
/// Group admitting blog post fields when denormalizing.
pub const DENORMALIZATION_GROUP: &str = "the_denormalization_group";

/// `Product { id: ?int, name: string, price: int }`, an entity identified by `id`.
pub fn product_schema() -> Arc<ObjectSchema> {
    Arc::new(
        ObjectSchema::new(
            "Product",
            vec![
                ObjectField::new("id", TypeRef::int().nullable()),
                ObjectField::new("name", TypeRef::string()),
                ObjectField::new("price", TypeRef::int()),
            ],
        )
        .identified_by("id"),
    )
}

/// Unpersisted product.
pub fn product(name: &str, price: i64) -> ObjectValue {
    ObjectValue::new("Product")
        .with("id", LiveValue::Null)
        .with("name", name)
        .with("price", price)
}

/// Money written on the wire as `"{amount}|{currency}"`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MoneyCodec;

impl ObjectCodec for MoneyCodec {
    fn normalize(&self, value: &ObjectValue) -> Result<WireValue, NormalizeError> {
        match (
            value.get("amount").and_then(LiveValue::as_int),
            value.get("currency").and_then(LiveValue::as_str),
        ) {
            (Some(amount), Some(currency)) => Ok(WireValue::String(format!("{amount}|{currency}"))),
            _ => Err(NormalizeError::Custom("money needs amount and currency".into())),
        }
    }

    fn denormalize(&self, wire: &WireValue) -> Result<ObjectValue, DenormalizeError> {
        let parsed = wire
            .as_str()
            .and_then(|s| s.split_once('|'))
            .and_then(|(amount, currency)| Some((amount.parse::<i64>().ok()?, currency)));
        match parsed {
            Some((amount, currency)) => Ok(money(amount, currency)),
            None => Err(DenormalizeError::Custom(format!("\"{wire}\" is not money"))),
        }
    }
}

/// `Money { amount: int, currency: string }` with [`MoneyCodec`].
pub fn money_schema() -> Arc<ObjectSchema> {
    Arc::new(
        ObjectSchema::new(
            "Money",
            vec![
                ObjectField::new("amount", TypeRef::int()),
                ObjectField::new("currency", TypeRef::string()),
            ],
        )
        .with_codec(Arc::new(MoneyCodec)),
    )
}

/// Money value.
pub fn money(amount: i64, currency: &str) -> ObjectValue {
    ObjectValue::new("Money")
        .with("amount", amount)
        .with("currency", currency)
}

/// `Temperature { degrees: int, uom: string }`, reduced generically.
pub fn temperature_schema() -> Arc<ObjectSchema> {
    Arc::new(ObjectSchema::new(
        "Temperature",
        vec![
            ObjectField::new("degrees", TypeRef::int()),
            ObjectField::new("uom", TypeRef::string()),
        ],
    ))
}

/// Temperature value.
pub fn temperature(degrees: i64, uom: &str) -> ObjectValue {
    ObjectValue::new("Temperature")
        .with("degrees", degrees)
        .with("uom", uom)
}

/// `Embeddable { name: string }`.
pub fn embeddable_schema() -> Arc<ObjectSchema> {
    Arc::new(ObjectSchema::new(
        "Embeddable",
        vec![ObjectField::new("name", TypeRef::string())],
    ))
}

/// `HoldsDateAndEntity { createdAt: DateTime, product: Product }`.
pub fn holds_date_and_entity_schema() -> Arc<ObjectSchema> {
    Arc::new(ObjectSchema::new(
        "HoldsDateAndEntity",
        vec![
            ObjectField::new("createdAt", TypeRef::date_time()),
            ObjectField::new("product", TypeRef::object(product_schema())),
        ],
    ))
}

/// `HoldsStringEnum { stringEnum: ?StringEnum }`.
pub fn holds_string_enum_schema() -> Arc<ObjectSchema> {
    Arc::new(ObjectSchema::new(
        "HoldsStringEnum",
        vec![ObjectField::new(
            "stringEnum",
            TypeRef::enumeration(string_enum()).nullable(),
        )],
    ))
}

/// Blog post whose fields sit in different serialization groups.
///
/// `title` and `body` are in both groups, `rating` only in the normalization
/// group, `price` in none.
pub fn blog_post_schema() -> Arc<ObjectSchema> {
    Arc::new(ObjectSchema::new(
        "BlogPost",
        vec![
            ObjectField::new("title", TypeRef::string())
                .in_groups([NORMALIZATION_GROUP, DENORMALIZATION_GROUP]),
            ObjectField::new("body", TypeRef::string())
                .in_groups([NORMALIZATION_GROUP, DENORMALIZATION_GROUP]),
            ObjectField::new("rating", TypeRef::int()).in_groups([NORMALIZATION_GROUP]),
            ObjectField::new("price", TypeRef::int()),
        ],
    ))
}

/// Blog post value.
pub fn blog_post(title: &str, body: &str, rating: i64, price: i64) -> ObjectValue {
    ObjectValue::new("BlogPost")
        .with("title", title)
        .with("body", body)
        .with("rating", rating)
        .with("price", price)
}

/// Context restricting objects to the blog post groups.
pub fn blog_post_context() -> SerializationContext {
    SerializationContext {
        normalization_groups: Some([NORMALIZATION_GROUP.to_owned()].into()),
        denormalization_groups: Some([DENORMALIZATION_GROUP.to_owned()].into()),
    }
}

/// `IntEnum { LOW = 1, HIGH = 10 }`.
pub fn int_enum() -> Arc<EnumSchema> {
    Arc::new(EnumSchema::new(
        "IntEnum",
        [("LOW", EnumScalar::Int(1)), ("HIGH", EnumScalar::Int(10))],
    ))
}

/// `StringEnum { ACTIVE = "active", INACTIVE = "inactive" }`.
pub fn string_enum() -> Arc<EnumSchema> {
    Arc::new(EnumSchema::new(
        "StringEnum",
        [
            ("ACTIVE", EnumScalar::Str("active".into())),
            ("INACTIVE", EnumScalar::Str("inactive".into())),
        ],
    ))
}

/// `ZeroIntEnum { ZERO = 0 }`.
pub fn zero_int_enum() -> Arc<EnumSchema> {
    Arc::new(EnumSchema::new("ZeroIntEnum", [("ZERO", EnumScalar::Int(0))]))
}

/// `EmptyStringEnum { EMPTY = "" }`.
pub fn empty_string_enum() -> Arc<EnumSchema> {
    Arc::new(EnumSchema::new(
        "EmptyStringEnum",
        [("EMPTY", EnumScalar::Str(String::new()))],
    ))
}

/// Case `name` of `schema` as a live value (`null` for unknown cases).
pub fn case(schema: &EnumSchema, name: &str) -> LiveValue {
    schema.case(name).map_or(LiveValue::Null, LiveValue::Enum)
}

/// RFC 3339 date/time as a live value (`null` when unparsable).
pub fn date(rfc3339: &str) -> LiveValue {
    DateTime::parse_from_rfc3339(rfc3339).map_or(LiveValue::Null, LiveValue::DateTime)
}
