// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Entity lookup port.

use crate::value::{ObjectValue, WireValue};

/// Resolves persisted entities by identifier.
///
/// The only collaborator the engine calls that may block on I/O. Timeouts and
/// retries belong to the implementation, not the engine. Returning `None` means
/// "not found" (e.g. deleted since dehydration), which the hydrator turns into
/// `null` for nullable fields.
pub trait EntityLoader {
    /// Load the entity of type `entity` whose identifier is `id`.
    fn find_by_id(&self, entity: &str, id: &WireValue) -> Option<ObjectValue>;
}

impl<L: EntityLoader + ?Sized> EntityLoader for &L {
    fn find_by_id(&self, entity: &str, id: &WireValue) -> Option<ObjectValue> {
        (**self).find_by_id(entity, id)
    }
}

impl<L: EntityLoader + ?Sized> EntityLoader for std::sync::Arc<L> {
    fn find_by_id(&self, entity: &str, id: &WireValue) -> Option<ObjectValue> {
        (**self).find_by_id(entity, id)
    }
}

/// Loader for components without entity fields: nothing is ever found.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoEntities;

impl EntityLoader for NoEntities {
    fn find_by_id(&self, _entity: &str, _id: &WireValue) -> Option<ObjectValue> {
        None
    }
}

/// Identifier rendered as text (for error messages and store keys).
pub fn id_text(id: &WireValue) -> String {
    match id {
        WireValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}
