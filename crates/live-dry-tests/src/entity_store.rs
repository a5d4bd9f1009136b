// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! In-memory entity store fake.

use live_hydrate::entity::id_text;
use live_hydrate::{EntityLoader, LiveValue, ObjectSchema, ObjectValue, WireValue};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// In-memory implementation of [`EntityLoader`] for testing.
///
/// Entities are keyed by `(type name, identifier as text)`, so an id that
/// arrives as `5` or `"5"` finds the same record. Clones share state, which
/// lets a test delete a record between dehydration and hydration.
///
/// # Example
///
/// ```
/// use live_dry_tests::{fixtures, InMemoryEntityStore};
/// use live_hydrate::EntityLoader;
///
/// let store = InMemoryEntityStore::new();
/// let product = store.persist(&fixtures::product_schema(), fixtures::product("oranges", 199));
/// assert!(store.find_by_id("Product", &serde_json::json!(1)).is_some());
/// store.remove("Product", &serde_json::json!(1));
/// assert!(store.find_by_id("Product", &serde_json::json!("1")).is_none());
/// assert_eq!(store.lookup_count(), 2);
/// # let _ = product;
/// ```
#[derive(Clone, Default)]
pub struct InMemoryEntityStore {
    inner: Arc<Mutex<InMemoryEntityStoreInner>>,
}

#[derive(Default)]
struct InMemoryEntityStoreInner {
    entities: HashMap<(String, String), ObjectValue>,
    last_id: i64,
    lookup_count: usize,
}

impl InMemoryEntityStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Persist `entity`, assigning the next integer id when its identifier
    /// field is unset. Returns the stored entity.
    pub fn persist(&self, schema: &ObjectSchema, mut entity: ObjectValue) -> ObjectValue {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let Some(id_field) = schema.identifier().map(|f| f.name.clone()) else {
            return entity;
        };
        let id = match entity.get(&id_field) {
            Some(LiveValue::Int(n)) => WireValue::from(*n),
            Some(LiveValue::Str(s)) => WireValue::String(s.clone()),
            _ => {
                inner.last_id += 1;
                entity
                    .fields
                    .insert(id_field, LiveValue::Int(inner.last_id));
                WireValue::from(inner.last_id)
            }
        };
        inner
            .entities
            .insert((schema.name().to_owned(), id_text(&id)), entity.clone());
        entity
    }

    /// Delete the entity of type `entity` with identifier `id`.
    pub fn remove(&self, entity: &str, id: &WireValue) -> Option<ObjectValue> {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .entities
            .remove(&(entity.to_owned(), id_text(id)))
    }

    /// Number of stored entities.
    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .entities
            .len()
    }

    /// `true` when nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of `find_by_id` calls (hits and misses).
    pub fn lookup_count(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .lookup_count
    }
}

impl EntityLoader for InMemoryEntityStore {
    fn find_by_id(&self, entity: &str, id: &WireValue) -> Option<ObjectValue> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.lookup_count += 1;
        inner
            .entities
            .get(&(entity.to_owned(), id_text(id)))
            .cloned()
    }
}
