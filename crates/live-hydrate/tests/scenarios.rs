// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Mount → dehydrate → JSON → hydrate scenarios.
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use live_dry_tests::fixtures::{
    blog_post, blog_post_context, blog_post_schema, case, date, embeddable_schema,
    empty_string_enum, holds_date_and_entity_schema, holds_string_enum_schema, int_enum, money,
    money_schema, product, product_schema, string_enum, temperature, temperature_schema,
    zero_int_enum,
};
use live_dry_tests::{HydrationCase, InMemoryEntityStore};
use live_hydrate::error::TamperReason;
use live_hydrate::{
    ComponentMetadata, FieldDescriptor, HydrationError, LiveValue, NoEntities, NormalizeError,
    ObjectValue, TypeRef, UpdateSet, WireValue, WritePolicy, IDENTITY_PATH,
};
use serde_json::json;
use std::sync::Arc;

fn meta(fields: Vec<FieldDescriptor>) -> ComponentMetadata {
    ComponentMetadata::new("__testing", fields).unwrap()
}

fn obj(value: &LiveValue) -> &ObjectValue {
    value.as_object().expect("object")
}

fn wire_tree(value: WireValue) -> LiveValue {
    LiveValue::from_wire(&value)
}

// ── scalars ────────────────────────────────────────────────────────

#[test]
fn string_round_trips() {
    let h = HydrationCase::new(
        NoEntities,
        meta(vec![FieldDescriptor::new("firstName", TypeRef::string())]),
    )
    .mount_with([("firstName", "Ryan".into())])
    .assert_dehydrates_to(json!({"firstName": "Ryan"}), json!({}))
    .run()
    .unwrap();

    assert_eq!(h.field("firstName"), &LiveValue::from("Ryan"));
    assert!(h.attributes.is_empty());
    assert_eq!(h.dehydrated.checksum().map(str::len), Some(64));
}

#[test]
fn changing_read_only_string_fails_checksum() {
    let err = HydrationCase::new(
        NoEntities,
        meta(vec![FieldDescriptor::new("firstName", TypeRef::string())]),
    )
    .mount_with([("firstName", "Ryan".into())])
    .user_changes_original_props_to(json!({"firstName": "Kevin"}))
    .run()
    .unwrap_err();

    assert!(matches!(
        err,
        HydrationError::TamperDetected {
            reason: TamperReason::Mismatch,
            ..
        }
    ));
    assert!(err.to_string().contains("checksum"));
}

#[test]
fn writable_string_accepts_update() {
    let h = HydrationCase::new(
        NoEntities,
        meta(vec![FieldDescriptor::new("firstName", TypeRef::string())
            .writable(WritePolicy::FullyWritable)]),
    )
    .mount_with([("firstName", "Ryan".into())])
    .assert_dehydrates_to(json!({"firstName": "Ryan"}), json!({}))
    .user_updates(json!({"firstName": "Kevin"}))
    .run()
    .unwrap();

    assert_eq!(h.field("firstName"), &LiveValue::from("Kevin"));
}

#[test]
fn float_survives_transport_precision_change() {
    let fields = || {
        meta(vec![
            FieldDescriptor::new("price", TypeRef::float()).writable(WritePolicy::FullyWritable)
        ])
    };
    let h = HydrationCase::new(NoEntities, fields())
        .mount_with([("price", 123.0.into())])
        .assert_dehydrates_to(json!({"price": 123.0}), json!({}))
        .run()
        .unwrap();
    assert_eq!(h.field("price"), &LiveValue::Float(123.0));

    // the client hands back 123 instead of 123.0
    let h = HydrationCase::new(NoEntities, fields())
        .mount_with([("price", 123.0.into())])
        .user_changes_original_props_to(json!({"price": 123}))
        .run()
        .unwrap();
    assert_eq!(h.field("price"), &LiveValue::Float(123.0));
}

#[test]
fn date_time_round_trips_with_offset() {
    let h = HydrationCase::new(
        NoEntities,
        meta(vec![FieldDescriptor::new("createdAt", TypeRef::date_time())]),
    )
    .mount_with([("createdAt", date("2023-03-05T09:23:00-05:00"))])
    .assert_dehydrates_to(json!({"createdAt": "2023-03-05T09:23:00-05:00"}), json!({}))
    .run()
    .unwrap();

    assert_eq!(h.field("createdAt"), &date("2023-03-05T09:23:00-05:00"));
}

#[test]
fn custom_wire_names_are_used_on_the_wire() {
    let h = HydrationCase::new(
        NoEntities,
        meta(vec![
            FieldDescriptor::new("prop1", TypeRef::string()).wire_name("myProp1"),
            FieldDescriptor::new("prop2", TypeRef::string()).wire_name("myProp2"),
        ]),
    )
    .mount_with([("prop1", "value1".into()), ("prop2", "value2".into())])
    .assert_dehydrates_to(json!({"myProp1": "value1", "myProp2": "value2"}), json!({}))
    .run()
    .unwrap();

    assert_eq!(h.field("prop1"), &LiveValue::from("value1"));
    assert_eq!(h.field("prop2"), &LiveValue::from("value2"));
}

#[test]
fn skipped_fields_never_reach_the_wire() {
    let h = HydrationCase::new(
        NoEntities,
        meta(vec![
            FieldDescriptor::new("shown", TypeRef::int()),
            FieldDescriptor::new("hidden", TypeRef::int()).skip_hydration(),
        ]),
    )
    .mount_with([("shown", 1.into()), ("hidden", 2.into())])
    .assert_dehydrates_to(json!({"shown": 1}), json!({}))
    .run()
    .unwrap();

    assert!(h.component.get("hidden").is_none());
}

// ── entities ───────────────────────────────────────────────────────

#[test]
fn persisted_entity_travels_as_its_id() {
    let store = InMemoryEntityStore::new();
    let p = store.persist(&product_schema(), product("Rubber Chicken", 100));

    let h = HydrationCase::new(
        store.clone(),
        meta(vec![FieldDescriptor::new(
            "entity1",
            TypeRef::object(product_schema()),
        )]),
    )
    .mount_with([("entity1", p.into())])
    .assert_dehydrates_to(json!({"entity1": 1}), json!({}))
    .run()
    .unwrap();

    assert_eq!(obj(h.field("entity1")).get("id"), Some(&LiveValue::Int(1)));
    assert_eq!(store.lookup_count(), 1);
}

#[test]
fn writable_entity_can_be_swapped_by_id() {
    let store = InMemoryEntityStore::new();
    let original = store.persist(&product_schema(), product("a", 1));
    store.persist(&product_schema(), product("b", 2));

    let h = HydrationCase::new(
        store,
        meta(vec![FieldDescriptor::new(
            "entity1",
            TypeRef::object(product_schema()),
        )
        .writable(WritePolicy::FullyWritable)]),
    )
    .mount_with([("entity1", original.into())])
    .user_updates(json!({"entity1": 2}))
    .run()
    .unwrap();

    assert_eq!(obj(h.field("entity1")).get("id"), Some(&LiveValue::Int(2)));
}

#[test]
fn identity_path_allows_swapping_by_id() {
    let store = InMemoryEntityStore::new();
    let original = store.persist(&product_schema(), product("a", 1));
    store.persist(&product_schema(), product("b", 2));

    let h = HydrationCase::new(
        store,
        meta(vec![FieldDescriptor::new(
            "entity1",
            TypeRef::object(product_schema()),
        )
        .writable(WritePolicy::paths([IDENTITY_PATH]))]),
    )
    .mount_with([("entity1", original.into())])
    .assert_dehydrates_to(json!({"entity1": 1}), json!({}))
    .user_updates(json!({"entity1": "2"}))
    .run()
    .unwrap();

    assert_eq!(obj(h.field("entity1")).get("name"), Some(&LiveValue::from("b")));
}

#[test]
fn identity_path_rejects_structural_values() {
    for forged in [
        json!({"id": 999, "name": "forged", "price": 1}),
        json!([999, "forged", 1]),
    ] {
        let store = InMemoryEntityStore::new();
        let original = store.persist(&product_schema(), product("a", 1));

        let err = HydrationCase::new(
            store,
            meta(vec![FieldDescriptor::new(
                "entity1",
                TypeRef::object(product_schema()),
            )
            .writable(WritePolicy::paths([IDENTITY_PATH]))]),
        )
        .mount_with([("entity1", original.into())])
        .user_updates(json!({ "entity1": forged }))
        .run()
        .unwrap_err();

        assert!(
            matches!(err, HydrationError::UnsupportedShape { ref path, .. } if path == "entity1"),
            "{err:?}"
        );
    }
}

#[test]
fn identity_path_requires_an_entity_field() {
    let embeddable = ObjectValue::new("Embeddable").with("name", "foo");
    for (ty, mounted) in [
        (TypeRef::any(), wire_tree(json!({"id": 1}))),
        (TypeRef::object(embeddable_schema()), embeddable.into()),
    ] {
        let err = HydrationCase::new(
            NoEntities,
            meta(vec![FieldDescriptor::new("thing", ty)
                .writable(WritePolicy::paths([IDENTITY_PATH]))]),
        )
        .mount_with([("thing", mounted)])
        .user_updates(json!({"thing": {"id": 2}}))
        .run()
        .unwrap_err();

        assert!(
            matches!(err, HydrationError::InvalidConfiguration { ref path, ref reason } if path == "thing" && reason.contains(IDENTITY_PATH)),
            "{err:?}"
        );
    }
}

#[test]
fn entity_below_declared_path_rejects_structural_values() {
    let store = InMemoryEntityStore::new();
    let first = store.persist(&product_schema(), product("foo", 100));
    let holds = ObjectValue::new("HoldsDateAndEntity")
        .with("createdAt", date("2023-03-05T09:23:00-05:00"))
        .with("product", first);
    let case = |updates| {
        HydrationCase::new(
            store.clone(),
            meta(vec![FieldDescriptor::new(
                "holdsDate",
                TypeRef::object(holds_date_and_entity_schema()),
            )
            .writable(WritePolicy::paths(["product"]))]),
        )
        .mount_with([("holdsDate", holds.clone().into())])
        .user_updates(updates)
        .run()
    };

    let err = case(json!({"holdsDate.product": {"id": 999, "name": "forged", "price": 1}}))
        .unwrap_err();
    assert!(
        matches!(err, HydrationError::UnsupportedShape { ref path, .. } if path == "holdsDate.product"),
        "{err:?}"
    );

    // A mapping aimed at a scalar below the declared path is dropped.
    let h = case(json!({"holdsDate.product.name": {"name": "forged"}})).unwrap();
    let product = obj(h.field("holdsDate")).get("product").map(obj).unwrap();
    assert_eq!(product.get("id"), Some(&LiveValue::Int(1)));
    assert_eq!(product.get("name"), Some(&LiveValue::from("foo")));
}

#[test]
fn entity_writable_paths_update_loaded_entity() {
    let store = InMemoryEntityStore::new();
    let p = store.persist(&product_schema(), product("Rubber Chicken", 100));

    let h = HydrationCase::new(
        store,
        meta(vec![FieldDescriptor::new(
            "product",
            TypeRef::object(product_schema()),
        )
        .writable(WritePolicy::paths(["name"]))]),
    )
    .mount_with([("product", p.into())])
    .assert_dehydrates_to(
        json!({"product": 1}),
        json!({"product.name": "Rubber Chicken"}),
    )
    .user_updates(json!({"product.name": "real chicken"}))
    .run()
    .unwrap();

    let product = obj(h.field("product"));
    assert_eq!(product.get("id"), Some(&LiveValue::Int(1)));
    assert_eq!(product.get("name"), Some(&LiveValue::from("real chicken")));
}

#[test]
fn deleted_entity_hydrates_to_null_when_nullable() {
    let store = InMemoryEntityStore::new();
    let p = store.persist(&product_schema(), product("gone soon", 1));
    let deleter = store.clone();

    let h = HydrationCase::new(
        store,
        meta(vec![FieldDescriptor::new(
            "product",
            TypeRef::object(product_schema()).nullable(),
        )
        .writable(WritePolicy::paths(["name"]))]),
    )
    .mount_with([("product", p.into())])
    .before_hydration(move || {
        deleter.remove("Product", &json!(1));
    })
    .run()
    .unwrap();

    assert!(h.field("product").is_null());
}

#[test]
fn deleted_entity_fails_when_not_nullable() {
    let store = InMemoryEntityStore::new();
    let p = store.persist(&product_schema(), product("gone soon", 1));
    let deleter = store.clone();

    let err = HydrationCase::new(
        store,
        meta(vec![FieldDescriptor::new(
            "product",
            TypeRef::object(product_schema()),
        )]),
    )
    .mount_with([("product", p.into())])
    .before_hydration(move || {
        deleter.remove("Product", &json!(1));
    })
    .run()
    .unwrap_err();

    match err {
        HydrationError::EntityNotFound { path, entity, id } => {
            assert_eq!((path.as_str(), entity.as_str(), id.as_str()), ("product", "Product", "1"));
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn unpersisted_entity_travels_as_mapping() {
    let h = HydrationCase::new(
        InMemoryEntityStore::new(),
        meta(vec![FieldDescriptor::new(
            "product",
            TypeRef::object(product_schema()),
        )
        .writable(WritePolicy::paths(["price"]))]),
    )
    .mount_with([("product", product("original name", 333).into())])
    .assert_dehydrates_to(
        json!({"product": {"id": null, "name": "original name", "price": 333}}),
        json!({"product.price": 333}),
    )
    .user_updates(json!({"product.price": 1000}))
    .run()
    .unwrap();

    let product = obj(h.field("product"));
    assert!(product.get("id").is_some_and(LiveValue::is_null));
    assert_eq!(product.get("name"), Some(&LiveValue::from("original name")));
    assert_eq!(product.get("price"), Some(&LiveValue::Int(1000)));
}

// ── native collections ─────────────────────────────────────────────

#[test]
fn index_array_round_trips() {
    let h = HydrationCase::new(
        NoEntities,
        meta(vec![FieldDescriptor::new("foods", TypeRef::any())]),
    )
    .mount_with([("foods", LiveValue::list(["banana", "popcorn"]))])
    .assert_dehydrates_to(json!({"foods": ["banana", "popcorn"]}), json!({}))
    .run()
    .unwrap();

    assert_eq!(h.field("foods"), &LiveValue::list(["banana", "popcorn"]));
}

#[test]
fn writable_index_array_can_be_replaced() {
    let h = HydrationCase::new(
        NoEntities,
        meta(vec![
            FieldDescriptor::new("foods", TypeRef::any()).writable(WritePolicy::FullyWritable)
        ]),
    )
    .mount_with([("foods", LiveValue::list(["banana", "popcorn"]))])
    .user_updates(json!({"foods": ["apple", "chips"]}))
    .run()
    .unwrap();

    assert_eq!(h.field("foods"), &LiveValue::list(["apple", "chips"]));
}

#[test]
fn empty_typed_list_round_trips() {
    let h = HydrationCase::new(
        NoEntities,
        meta(vec![FieldDescriptor::new(
            "foods",
            TypeRef::list(TypeRef::string()),
        )]),
    )
    .mount_with([("foods", LiveValue::List(Vec::new()))])
    .assert_dehydrates_to(json!({"foods": []}), json!({}))
    .run()
    .unwrap();

    assert_eq!(h.field("foods"), &LiveValue::List(Vec::new()));
}

fn show_options() -> LiveValue {
    LiveValue::map([
        ("show", "Arrested development"),
        ("character", "Michael Bluth"),
    ])
}

#[test]
fn associative_array_round_trips() {
    let h = HydrationCase::new(
        NoEntities,
        meta(vec![FieldDescriptor::new("options", TypeRef::any())]),
    )
    .mount_with([("options", show_options())])
    .assert_dehydrates_to(
        json!({"options": {"show": "Arrested development", "character": "Michael Bluth"}}),
        json!({}),
    )
    .run()
    .unwrap();

    assert_eq!(h.field("options"), &show_options());
}

#[test]
fn fully_writable_mapping_can_be_replaced() {
    let h = HydrationCase::new(
        NoEntities,
        meta(vec![
            FieldDescriptor::new("options", TypeRef::any()).writable(WritePolicy::FullyWritable)
        ]),
    )
    .mount_with([("options", show_options())])
    .user_updates(json!({"options": {"show": "Simpsons", "quote": "I didn't do it"}}))
    .run()
    .unwrap();

    assert_eq!(
        h.field("options"),
        &wire_tree(json!({"show": "Simpsons", "quote": "I didn't do it"}))
    );
}

#[test]
fn fully_writable_mapping_accepts_partial_changes() {
    let h = HydrationCase::new(
        NoEntities,
        meta(vec![
            FieldDescriptor::new("options", TypeRef::any()).writable(WritePolicy::FullyWritable)
        ]),
    )
    .mount_with([("options", show_options())])
    .user_updates(json!({"options.character": "Buster Bluth"}))
    .run()
    .unwrap();

    assert_eq!(
        h.field("options"),
        &wire_tree(json!({"show": "Arrested development", "character": "Buster Bluth"}))
    );
}

#[test]
fn fully_writable_mapping_accepts_deep_partial_changes() {
    let invoice = json!({
        "number": "123",
        "lineItems": [
            {"name": "item1", "quantity": 4, "price": 100},
            {"name": "item2", "quantity": 2, "price": 200},
            {"name": "item3", "quantity": 1, "price": 1000},
        ],
    });
    let updates = UpdateSet::new()
        .with("invoice.lineItems.0.quantity", json!(5))
        .with("invoice.lineItems.1.price", json!(300))
        .with("invoice.number", json!("456"))
        .with(
            "invoice.lineItems.2",
            json!({"name": "item3_updated", "quantity": 2, "price": 2000}),
        );

    let h = HydrationCase::new(
        NoEntities,
        meta(vec![FieldDescriptor::new("formData", TypeRef::any())
            .wire_name("invoice")
            .writable(WritePolicy::FullyWritable)]),
    )
    .mount_with([("formData", wire_tree(invoice.clone()))])
    .assert_dehydrates_to(json!({ "invoice": invoice }), json!({}))
    .user_updates_in_order(updates)
    .run()
    .unwrap();

    assert_eq!(
        h.field("formData"),
        &wire_tree(json!({
            "number": "456",
            "lineItems": [
                {"name": "item1", "quantity": 5, "price": 100},
                {"name": "item2", "quantity": 2, "price": 300},
                {"name": "item3_updated", "quantity": 2, "price": 2000},
            ],
        }))
    );
}

#[test]
fn writable_paths_allow_only_those_keys() {
    let fields = || {
        meta(vec![FieldDescriptor::new("options", TypeRef::any())
            .writable(WritePolicy::paths(["character"]))])
    };

    let h = HydrationCase::new(NoEntities, fields())
        .mount_with([("options", show_options())])
        .assert_dehydrates_to(
            json!({"options": {"show": "Arrested development", "character": "Michael Bluth"}}),
            json!({"options.character": "Michael Bluth"}),
        )
        .user_updates(json!({"options.character": "George Michael Bluth"}))
        .run()
        .unwrap();
    assert_eq!(
        h.field("options"),
        &wire_tree(json!({"show": "Arrested development", "character": "George Michael Bluth"}))
    );

    let err = HydrationCase::new(NoEntities, fields())
        .mount_with([("options", show_options())])
        .user_changes_original_props_to(
            json!({"options": {"show": "Simpsons", "character": "Michael Bluth"}}),
        )
        .run()
        .unwrap_err();
    assert!(matches!(err, HydrationError::TamperDetected { .. }));

    let err = HydrationCase::new(NoEntities, fields())
        .mount_with([("options", show_options())])
        .user_updates(json!({"options.show": "Simpsons"}))
        .run()
        .unwrap_err();
    assert!(matches!(err, HydrationError::WriteNotAuthorized { ref path, .. } if path == "options.show"));
}

#[test]
fn multi_level_writable_path() {
    let stuff = wire_tree(json!({"details": {"key1": "bar", "key2": "baz"}}));
    let h = HydrationCase::new(
        NoEntities,
        meta(vec![FieldDescriptor::new("stuff", TypeRef::any())
            .writable(WritePolicy::paths(["details.key1"]))]),
    )
    .mount_with([("stuff", stuff)])
    .assert_dehydrates_to(
        json!({"stuff": {"details": {"key1": "bar", "key2": "baz"}}}),
        json!({"stuff.details.key1": "bar"}),
    )
    .user_updates(json!({"stuff.details.key1": "changed key1"}))
    .run()
    .unwrap();

    assert_eq!(
        h.field("stuff"),
        &wire_tree(json!({"details": {"key1": "changed key1", "key2": "baz"}}))
    );
}

#[test]
fn writable_path_may_itself_be_a_mapping() {
    let stuff = wire_tree(json!({"details": {"key1": "bar", "key2": "baz"}}));
    let h = HydrationCase::new(
        NoEntities,
        meta(vec![FieldDescriptor::new("stuff", TypeRef::any())
            .writable(WritePolicy::paths(["details"]))]),
    )
    .mount_with([("stuff", stuff)])
    .assert_dehydrates_to(
        json!({"stuff": {"details": {"key1": "bar", "key2": "baz"}}}),
        json!({"stuff.details": {"key1": "bar", "key2": "baz"}}),
    )
    .user_updates(json!({"stuff.details": {"key1": "changed key1", "new_key": "new value"}}))
    .run()
    .unwrap();

    assert_eq!(
        h.field("stuff"),
        &wire_tree(json!({"details": {"key1": "changed key1", "new_key": "new value"}}))
    );
}

#[test]
fn nested_update_below_declared_path_is_allowed() {
    let h = HydrationCase::new(
        NoEntities,
        meta(vec![FieldDescriptor::new("stuff", TypeRef::any())
            .writable(WritePolicy::paths(["details"]))]),
    )
    .mount_with([("stuff", wire_tree(json!({"details": {"key1": "bar"}})))])
    .user_updates(json!({"stuff.details.key1": "deeper"}))
    .run()
    .unwrap();

    assert_eq!(
        h.field("stuff"),
        &wire_tree(json!({"details": {"key1": "deeper"}}))
    );
}

#[test]
fn parent_of_declared_path_is_rejected() {
    let err = HydrationCase::new(
        NoEntities,
        meta(vec![FieldDescriptor::new("stuff", TypeRef::any())
            .writable(WritePolicy::paths(["details.key1"]))]),
    )
    .mount_with([("stuff", wire_tree(json!({"details": {"key1": "bar"}})))])
    .user_updates(json!({"stuff.details": {"key1": "x", "key2": "sneaky"}}))
    .run()
    .unwrap_err();

    assert!(matches!(
        err,
        HydrationError::WriteNotAuthorized { ref path, ref field } if path == "stuff.details" && field == "stuff"
    ));
}

// ── enums ──────────────────────────────────────────────────────────

#[test]
fn null_enums_stay_null() {
    let h = HydrationCase::new(
        NoEntities,
        meta(vec![
            FieldDescriptor::new("int", TypeRef::enumeration(int_enum()).nullable()),
            FieldDescriptor::new("string", TypeRef::enumeration(string_enum()).nullable()),
        ]),
    )
    .assert_dehydrates_to(json!({"int": null, "string": null}), json!({}))
    .run()
    .unwrap();

    assert!(h.field("int").is_null());
    assert!(h.field("string").is_null());
}

#[test]
fn enums_travel_as_backing_scalars() {
    let h = HydrationCase::new(
        NoEntities,
        meta(vec![
            FieldDescriptor::new("int", TypeRef::enumeration(int_enum()).nullable()),
            FieldDescriptor::new("string", TypeRef::enumeration(string_enum()).nullable()),
        ]),
    )
    .mount_with([
        ("int", case(&int_enum(), "HIGH")),
        ("string", case(&string_enum(), "ACTIVE")),
    ])
    .assert_dehydrates_to(json!({"int": 10, "string": "active"}), json!({}))
    .run()
    .unwrap();

    assert_eq!(h.field("int"), &case(&int_enum(), "HIGH"));
    assert_eq!(h.field("string"), &case(&string_enum(), "ACTIVE"));
}

#[test]
fn writable_enum_can_change() {
    let h = HydrationCase::new(
        NoEntities,
        meta(vec![FieldDescriptor::new(
            "int",
            TypeRef::enumeration(int_enum()).nullable(),
        )
        .writable(WritePolicy::FullyWritable)]),
    )
    .mount_with([("int", case(&int_enum(), "HIGH"))])
    .user_updates(json!({"int": 1}))
    .run()
    .unwrap();

    assert_eq!(h.field("int"), &case(&int_enum(), "LOW"));
}

#[test]
fn null_like_enum_values_select_their_cases() {
    let zero = || TypeRef::enumeration(zero_int_enum()).nullable();
    let h = HydrationCase::new(
        NoEntities,
        meta(vec![
            FieldDescriptor::new("zeroInt", zero()).writable(WritePolicy::FullyWritable),
            FieldDescriptor::new("zeroInt2", zero()).writable(WritePolicy::FullyWritable),
            FieldDescriptor::new(
                "emptyString",
                TypeRef::enumeration(empty_string_enum()).nullable(),
            )
            .writable(WritePolicy::FullyWritable),
        ]),
    )
    .assert_dehydrates_to(
        json!({"zeroInt": null, "zeroInt2": null, "emptyString": null}),
        json!({}),
    )
    .user_updates(json!({"zeroInt": 0, "zeroInt2": "0", "emptyString": ""}))
    .run()
    .unwrap();

    assert_eq!(h.field("zeroInt"), &case(&zero_int_enum(), "ZERO"));
    assert_eq!(h.field("zeroInt2"), &case(&zero_int_enum(), "ZERO"));
    assert_eq!(h.field("emptyString"), &case(&empty_string_enum(), "EMPTY"));
}

#[test]
fn invalid_enum_values_follow_nullability() {
    let h = HydrationCase::new(
        NoEntities,
        meta(vec![
            FieldDescriptor::new("nullableInt", TypeRef::enumeration(int_enum()).nullable())
                .writable(WritePolicy::FullyWritable),
            FieldDescriptor::new("nonNullableInt", TypeRef::enumeration(int_enum()))
                .writable(WritePolicy::FullyWritable),
            FieldDescriptor::new(
                "holdsStringEnum",
                TypeRef::object(holds_string_enum_schema()),
            )
            .writable(WritePolicy::paths(["stringEnum"])),
        ]),
    )
    .mount_with([
        ("nullableInt", case(&int_enum(), "LOW")),
        ("nonNullableInt", case(&int_enum(), "LOW")),
        (
            "holdsStringEnum",
            ObjectValue::new("HoldsStringEnum")
                .with("stringEnum", case(&string_enum(), "ACTIVE"))
                .into(),
        ),
    ])
    .assert_dehydrates_to(
        json!({"nullableInt": 1, "nonNullableInt": 1, "holdsStringEnum": {"stringEnum": "active"}}),
        json!({"holdsStringEnum.stringEnum": "active"}),
    )
    .user_updates(json!({
        "nullableInt": 500,
        "nonNullableInt": 500,
        "holdsStringEnum.stringEnum": "not a real option",
    }))
    .run()
    .unwrap();

    assert!(h.field("nullableInt").is_null());
    assert_eq!(h.field("nonNullableInt"), &case(&int_enum(), "LOW"));
    assert!(obj(h.field("holdsStringEnum"))
        .get("stringEnum")
        .is_some_and(LiveValue::is_null));
}

// ── objects ────────────────────────────────────────────────────────

#[test]
fn codec_object_round_trips() {
    let h = HydrationCase::new(
        NoEntities,
        meta(vec![FieldDescriptor::new(
            "money",
            TypeRef::object(money_schema()),
        )]),
    )
    .mount_with([("money", money(500, "CAD").into())])
    .assert_dehydrates_to(json!({"money": "500|CAD"}), json!({}))
    .run()
    .unwrap();

    assert_eq!(h.field("money"), &LiveValue::Object(money(500, "CAD")));
}

#[test]
fn plain_objects_dehydrate_to_mappings() {
    let h = HydrationCase::new(
        NoEntities,
        meta(vec![
            FieldDescriptor::new("temperature", TypeRef::object(temperature_schema())),
            FieldDescriptor::new("embeddable1", TypeRef::object(embeddable_schema())),
        ]),
    )
    .mount_with([
        ("temperature", temperature(30, "C").into()),
        (
            "embeddable1",
            ObjectValue::new("Embeddable").with("name", "foo").into(),
        ),
    ])
    .assert_dehydrates_to(
        json!({"temperature": {"degrees": 30, "uom": "C"}, "embeddable1": {"name": "foo"}}),
        json!({}),
    )
    .run()
    .unwrap();

    assert_eq!(h.field("temperature"), &LiveValue::Object(temperature(30, "C")));
    assert_eq!(obj(h.field("embeddable1")).get("name"), Some(&LiveValue::from("foo")));
}

#[test]
fn writable_paths_denormalize_dates_and_entities() {
    let store = InMemoryEntityStore::new();
    let first = store.persist(&product_schema(), product("foo", 100));
    store.persist(&product_schema(), product("bar", 500));
    let holds = ObjectValue::new("HoldsDateAndEntity")
        .with("createdAt", date("2023-03-05T09:23:00-05:00"))
        .with("product", first);

    let h = HydrationCase::new(
        store,
        meta(vec![FieldDescriptor::new(
            "holdsDate",
            TypeRef::object(holds_date_and_entity_schema()),
        )
        .writable(WritePolicy::paths(["createdAt", "product"]))]),
    )
    .mount_with([("holdsDate", holds.into())])
    .assert_dehydrates_to(
        json!({"holdsDate": {"createdAt": "2023-03-05T09:23:00-05:00", "product": 1}}),
        json!({
            "holdsDate.createdAt": "2023-03-05T09:23:00-05:00",
            "holdsDate.product": 1,
        }),
    )
    .user_updates(json!({
        "holdsDate.createdAt": "2022-01-01T09:23:00-05:00",
        "holdsDate.product": 2,
    }))
    .run()
    .unwrap();

    let holds = obj(h.field("holdsDate"));
    assert_eq!(holds.get("createdAt"), Some(&date("2022-01-01T09:23:00-05:00")));
    assert_eq!(
        holds.get("product").map(obj).and_then(|p| p.get("name")),
        Some(&LiveValue::from("bar"))
    );
}

#[test]
fn serialization_groups_filter_object_fields() {
    let ctx = blog_post_context();
    let h = HydrationCase::new(
        NoEntities,
        meta(vec![
            FieldDescriptor::new("name", TypeRef::string()).context(ctx.clone()),
            FieldDescriptor::new("createdAt", TypeRef::date_time()).context(ctx.clone()),
            FieldDescriptor::new("blogPost", TypeRef::object(blog_post_schema())).context(ctx),
        ]),
    )
    .mount_with([
        ("name", "Ryan".into()),
        ("createdAt", date("2023-03-05T09:23:00-05:00")),
        ("blogPost", blog_post("the_title", "the_body", 5, 2500).into()),
    ])
    .assert_dehydrates_to(
        json!({
            "name": "Ryan",
            "createdAt": "2023-03-05T09:23:00-05:00",
            "blogPost": {"title": "the_title", "body": "the_body", "rating": 5},
        }),
        json!({}),
    )
    .run()
    .unwrap();

    assert_eq!(h.field("name"), &LiveValue::from("Ryan"));
    let post = obj(h.field("blogPost"));
    assert_eq!(post.get("title"), Some(&LiveValue::from("the_title")));
    assert_eq!(post.get("body"), Some(&LiveValue::from("the_body")));
    assert_eq!(post.get("rating"), Some(&LiveValue::Int(0)));
    assert_eq!(post.get("price"), Some(&LiveValue::Int(0)));
}

// ── authorization and shape errors ─────────────────────────────────

#[test]
fn updating_non_writable_path_is_rejected() {
    let err = HydrationCase::new(
        NoEntities,
        meta(vec![FieldDescriptor::new(
            "product",
            TypeRef::object(product_schema()),
        )
        .writable(WritePolicy::paths(["price"]))]),
    )
    .mount_with([("product", product("original name", 333).into())])
    .user_updates(json!({"product.name": "will cause an explosion"}))
    .run()
    .unwrap_err();

    assert!(err
        .to_string()
        .contains("the model \"product.name\" was sent for update, but it is not writable"));
}

#[test]
fn updating_non_writable_field_is_rejected() {
    let err = HydrationCase::new(
        NoEntities,
        meta(vec![FieldDescriptor::new("name", TypeRef::string())]),
    )
    .mount_with([("name", "Ryan".into())])
    .user_updates(json!({"name": "will cause an explosion"}))
    .run()
    .unwrap_err();

    assert!(matches!(err, HydrationError::WriteNotAuthorized { ref path, .. } if path == "name"));
}

#[test]
fn unknown_update_root_is_rejected() {
    let err = HydrationCase::new(
        NoEntities,
        meta(vec![
            FieldDescriptor::new("name", TypeRef::string()).writable(WritePolicy::FullyWritable)
        ]),
    )
    .mount_with([("name", "Ryan".into())])
    .user_updates(json!({"nickname": "R"}))
    .run()
    .unwrap_err();

    assert_eq!(err.path(), Some("nickname"));
}

#[test]
fn overlapping_updates_are_rejected() {
    let err = HydrationCase::new(
        NoEntities,
        meta(vec![
            FieldDescriptor::new("options", TypeRef::any()).writable(WritePolicy::FullyWritable)
        ]),
    )
    .mount_with([("options", show_options())])
    .user_updates_in_order(
        UpdateSet::new()
            .with("options.character", json!("Buster"))
            .with("options", json!({})),
    )
    .run()
    .unwrap_err();

    assert!(matches!(
        err,
        HydrationError::OverlappingUpdatePaths { ref first, ref second }
            if first == "options" && second == "options.character"
    ));
}

#[test]
fn array_sent_for_writable_date_is_unsupported() {
    let err = HydrationCase::new(
        NoEntities,
        meta(vec![FieldDescriptor::new("createdAt", TypeRef::date_time())
            .writable(WritePolicy::FullyWritable)]),
    )
    .mount_with([("createdAt", date("2023-03-05T09:23:00-05:00"))])
    .user_updates(json!({"createdAt": {"year": 2023, "month": 2}}))
    .run()
    .unwrap_err();

    assert!(err
        .to_string()
        .contains("the model path \"createdAt\" was sent as an array"));
}

#[test]
fn array_sent_for_writable_entity_path_is_unsupported() {
    let store = InMemoryEntityStore::new();
    let p = store.persist(&product_schema(), product("foo", 1));
    let holds = ObjectValue::new("HoldsDateAndEntity")
        .with("createdAt", date("2023-03-05T09:23:00-05:00"))
        .with("product", p);

    let err = HydrationCase::new(
        store,
        meta(vec![FieldDescriptor::new(
            "holdsDateAndEntity",
            TypeRef::object(holds_date_and_entity_schema()),
        )
        .writable(WritePolicy::paths(["product"]))]),
    )
    .mount_with([("holdsDateAndEntity", holds.into())])
    .user_updates(json!({"holdsDateAndEntity.product": {"name": "new name"}}))
    .run()
    .unwrap_err();

    assert!(matches!(
        err,
        HydrationError::UnsupportedShape { ref path, .. } if path == "holdsDateAndEntity.product"
    ));
}

fn date_as_parts(_: &LiveValue) -> Result<WireValue, NormalizeError> {
    Ok(json!({"year": 2023, "month": 2}))
}

#[test]
fn writable_object_dehydrated_to_array_is_a_configuration_error() {
    let err = HydrationCase::new(
        NoEntities,
        meta(vec![FieldDescriptor::new("createdAt", TypeRef::date_time())
            .writable(WritePolicy::FullyWritable)
            .normalize_with(Arc::new(date_as_parts))]),
    )
    .mount_with([("createdAt", date("2023-03-05T09:23:00-05:00"))])
    .run()
    .unwrap_err();

    let message = err.to_string();
    assert_eq!(err.path(), Some("createdAt"));
    assert!(message.contains("is an object that was dehydrated to an array"));
    assert!(message.contains("You probably want to set writable to only the properties"));
}

#[test]
fn writable_path_object_dehydrated_to_array_is_a_configuration_error() {
    let holds = ObjectValue::new("HoldsDateAndEntity")
        .with("createdAt", date("2023-03-05T09:23:00-05:00"))
        .with("product", product("unsaved", 1));

    let err = HydrationCase::new(
        InMemoryEntityStore::new(),
        meta(vec![FieldDescriptor::new(
            "holdsDateAndEntity",
            TypeRef::object(holds_date_and_entity_schema()),
        )
        .writable(WritePolicy::paths(["product"]))]),
    )
    .mount_with([("holdsDateAndEntity", holds.into())])
    .run()
    .unwrap_err();

    assert!(matches!(
        err,
        HydrationError::InvalidConfiguration { ref path, .. } if path == "holdsDateAndEntity.product"
    ));
}

#[test]
fn unknown_writable_path_is_a_configuration_error() {
    let err = HydrationCase::new(
        NoEntities,
        meta(vec![FieldDescriptor::new(
            "temperature",
            TypeRef::object(temperature_schema()),
        )
        .writable(WritePolicy::paths(["kelvin"]))]),
    )
    .mount_with([("temperature", temperature(30, "C").into())])
    .run()
    .unwrap_err();

    assert_eq!(err.path(), Some("temperature.kelvin"));
}

// ── attributes ─────────────────────────────────────────────────────

#[test]
fn attributes_round_trip() {
    let h = HydrationCase::new(
        NoEntities,
        meta(vec![FieldDescriptor::new("name", TypeRef::string())]),
    )
    .mount_with([("name", "Ryan".into())])
    .with_attributes(json!({"class": "foo", "value": null}))
    .assert_dehydrates_to(
        json!({"name": "Ryan", "@attributes": {"class": "foo", "value": null}}),
        json!({}),
    )
    .run()
    .unwrap();

    assert_eq!(
        WireValue::Object(h.attributes),
        json!({"class": "foo", "value": null})
    );
    assert_eq!(h.component.post_hydrate_calls(), 1);
}
