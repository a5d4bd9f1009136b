// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Signed wire snapshot + client updates → live component.
//!
//! Hydration runs in two phases. The plan phase authorizes every update path
//! against the declared write policies before anything is touched; any
//! rejection there aborts the call. The apply phase rebuilds each field and
//! stages the result, so a fatal error in a later field still leaves the
//! component untouched. Only then is every field written, once.

use std::collections::BTreeMap;

use tracing::{debug, instrument, warn};

use crate::component::Component;
use crate::dehydrate::is_tree;
use crate::error::{DenormalizeError, HydrationError};
use crate::normalizer::Normalizer;
use crate::path;
use crate::schema::{ComponentMetadata, FieldDescriptor, TypeRef, WritePolicy, IDENTITY_PATH};
use crate::value::{Attributes, LiveValue, UpdateSet, WireMap, WireValue, ATTRIBUTES_KEY};
use crate::LiveHydrator;

/// Authorized updates targeting one field.
#[derive(Debug, Default)]
struct FieldUpdates<'a> {
    /// Replacement of the whole field value.
    root: Option<&'a WireValue>,
    /// `(full path, path below the field, value)` in update order.
    nested: Vec<(&'a str, &'a str, &'a WireValue)>,
}

impl FieldUpdates<'_> {
    fn first_path<'p>(&'p self, wire: &'p str) -> &'p str {
        self.nested.first().map_or(wire, |(full, _, _)| full)
    }
}

impl<N: Normalizer> LiveHydrator<N> {
    /// Verify `props`, apply the authorized `updates`, and write every hydrated
    /// field of `component`. Returns the attributes carried in the snapshot.
    ///
    /// # Errors
    ///
    /// - [`HydrationError::TamperDetected`] when the checksum is missing or
    ///   does not match.
    /// - [`HydrationError::OverlappingUpdatePaths`] /
    ///   [`HydrationError::WriteNotAuthorized`] from the plan phase.
    /// - [`HydrationError::UnsupportedShape`] when a sequence or mapping
    ///   targets a date/time or object, or arrives as an `@id` root update.
    /// - [`HydrationError::EntityNotFound`] when a non-nullable entity has
    ///   vanished.
    ///
    /// Errors raised while verifying, planning or rebuilding fields leave the
    /// component untouched. If [`Component::write_field`] itself fails, the
    /// fields written before it keep their new values and `post_hydrate` is
    /// not called.
    #[instrument(skip_all, fields(component = %metadata.name(), updates = updates.len()))]
    pub fn hydrate<C: Component + ?Sized>(
        &self,
        component: &mut C,
        props: &WireMap,
        updates: &UpdateSet,
        metadata: &ComponentMetadata,
    ) -> Result<Attributes, HydrationError> {
        self.signer.verify(metadata.name(), props)?;
        let plan = plan(updates, metadata)?;

        let mut staged = Vec::new();
        for field in metadata.hydrated_fields() {
            let base = props.get(field.wire()).unwrap_or(&WireValue::Null);
            let value = match plan.get(field.wire()) {
                None => self.restore(field, base)?,
                Some(u) if matches!(field.write_policy(), WritePolicy::FullyWritable) => {
                    self.apply_whole(field, base, u)?
                }
                Some(u) => self.apply_paths(field, base, u)?,
            };
            staged.push((field.source(), value));
        }

        // A failing write_field leaves earlier fields written.
        for (name, value) in staged {
            component.write_field(name, value)?;
        }
        component.post_hydrate();

        Ok(match props.get(ATTRIBUTES_KEY) {
            Some(WireValue::Object(attributes)) => attributes.clone(),
            _ => Attributes::new(),
        })
    }

    fn denormalize_root(
        &self,
        field: &FieldDescriptor,
        wire: &WireValue,
    ) -> Result<LiveValue, DenormalizeError> {
        match field.denormalize_hook() {
            Some(hook) => hook(wire),
            None => self
                .normalizer
                .denormalize(wire, field.ty(), field.serialization_context()),
        }
    }

    /// Rebuild a field from its trusted base value.
    fn restore(
        &self,
        field: &FieldDescriptor,
        base: &WireValue,
    ) -> Result<LiveValue, HydrationError> {
        self.denormalize_root(field, base).or_else(|err| {
            recover(field.wire(), field.ty(), err, field.ty().default_value())
        })
    }

    /// Field writable as a whole: patch the wire value, then denormalize it.
    fn apply_whole(
        &self,
        field: &FieldDescriptor,
        base: &WireValue,
        updates: &FieldUpdates<'_>,
    ) -> Result<LiveValue, HydrationError> {
        let ty = field.ty();
        let mut merged = updates.root.unwrap_or(base).clone();
        for (full, rel, value) in &updates.nested {
            path::set(&mut merged, rel, (*value).clone()).map_err(|source| {
                HydrationError::Path {
                    path: (*full).to_owned(),
                    source,
                }
            })?;
        }

        if is_tree(&merged) && !ty.is_structural() {
            let shown = updates.first_path(field.wire());
            if ty.is_object_like() {
                warn!(path = shown, expected = %ty.describe(), "structural value rejected");
                return Err(HydrationError::UnsupportedShape {
                    path: shown.to_owned(),
                    expected: ty.describe(),
                });
            }
            debug!(path = shown, "structural value for scalar field ignored");
            return self.restore(field, base);
        }

        match self.denormalize_root(field, &merged) {
            Ok(value) => Ok(value),
            Err(DenormalizeError::InvalidValue { .. }) => {
                debug!(path = field.wire(), "unreadable update ignored");
                self.restore(field, base)
            }
            Err(err) => recover(field.wire(), ty, err, ty.default_value()),
        }
    }

    /// Field with writable sub-paths: rebuild the base, then set each path.
    fn apply_paths(
        &self,
        field: &FieldDescriptor,
        base: &WireValue,
        updates: &FieldUpdates<'_>,
    ) -> Result<LiveValue, HydrationError> {
        let ty = field.ty();
        if updates.root.is_some_and(is_tree) {
            warn!(path = field.wire(), expected = %ty.describe(), "structural identity rejected");
            return Err(HydrationError::UnsupportedShape {
                path: field.wire().to_owned(),
                expected: ty.describe(),
            });
        }
        let mut live = self.restore(field, updates.root.unwrap_or(base))?;
        if live.is_null() {
            if !updates.nested.is_empty() {
                debug!(path = field.wire(), "value is null; path updates skipped");
            }
            return Ok(live);
        }

        for (full, rel, value) in &updates.nested {
            let sub_ty = ty
                .resolve(rel)
                .ok_or_else(|| HydrationError::InvalidConfiguration {
                    path: (*full).to_owned(),
                    reason: format!("no declared type at \"{rel}\" on {}", ty.describe()),
                })?;

            if is_tree(value) && !sub_ty.is_structural() {
                if sub_ty.is_object_like() {
                    warn!(path = full, expected = %sub_ty.describe(), "structural value rejected");
                    return Err(HydrationError::UnsupportedShape {
                        path: (*full).to_owned(),
                        expected: sub_ty.describe(),
                    });
                }
                debug!(path = full, "structural value for scalar path ignored");
                continue;
            }

            let prior = path::get(&live, rel)
                .cloned()
                .unwrap_or_else(|| sub_ty.default_value());
            let next = match self
                .normalizer
                .denormalize(value, &sub_ty, field.serialization_context())
            {
                Ok(next) => next,
                Err(err) => recover(full, &sub_ty, err, prior)?,
            };
            path::set(&mut live, rel, next).map_err(|source| HydrationError::Path {
                path: (*full).to_owned(),
                source,
            })?;
        }
        Ok(live)
    }
}

/// Turn a denormalization failure into a fallback value or a fatal error.
fn recover(
    path: &str,
    ty: &TypeRef,
    err: DenormalizeError,
    fallback: LiveValue,
) -> Result<LiveValue, HydrationError> {
    match err {
        DenormalizeError::InvalidValue { .. } => {
            debug!(path, %err, "unreadable value replaced");
            Ok(fallback)
        }
        DenormalizeError::EntityNotFound { entity, id } if ty.is_nullable() => {
            debug!(path, %entity, %id, "entity not found; set to null");
            Ok(LiveValue::Null)
        }
        DenormalizeError::EntityNotFound { entity, id } => Err(HydrationError::EntityNotFound {
            path: path.to_owned(),
            entity,
            id,
        }),
        DenormalizeError::UnsupportedShape { expected } => Err(HydrationError::UnsupportedShape {
            path: path.to_owned(),
            expected,
        }),
        source @ DenormalizeError::Custom(_) => Err(HydrationError::Denormalize {
            path: path.to_owned(),
            source,
        }),
    }
}

/// Authorize every update path and group the accepted ones by field.
fn plan<'a>(
    updates: &'a UpdateSet,
    metadata: &ComponentMetadata,
) -> Result<BTreeMap<&'a str, FieldUpdates<'a>>, HydrationError> {
    let entries: Vec<(&str, &WireValue)> = updates.iter().collect();
    for (i, (a, _)) in entries.iter().enumerate() {
        if let Some((b, _)) = entries[i + 1..].iter().find(|(b, _)| path::overlapping(a, b)) {
            let (first, second) = if a.len() <= b.len() { (a, b) } else { (b, a) };
            warn!(first, second, "overlapping update paths");
            return Err(HydrationError::OverlappingUpdatePaths {
                first: (*first).to_owned(),
                second: (*second).to_owned(),
            });
        }
    }

    let mut plan: BTreeMap<&str, FieldUpdates<'_>> = BTreeMap::new();
    for (full, value) in entries {
        let (root, rel) = match full.split_once('.') {
            Some((root, rel)) => (root, Some(rel)),
            None => (full, None),
        };
        let denied = || {
            warn!(path = full, field = root, "update not writable");
            HydrationError::WriteNotAuthorized {
                path: full.to_owned(),
                field: root.to_owned(),
            }
        };
        let field = metadata.by_wire_name(root).ok_or_else(denied)?;
        let allowed = match (field.write_policy(), rel) {
            (WritePolicy::NotWritable, _) => false,
            (WritePolicy::FullyWritable, _) => true,
            (WritePolicy::WritablePaths(paths), None) => {
                field.is_identity() && paths.contains(IDENTITY_PATH)
            }
            (WritePolicy::WritablePaths(paths), Some(rel)) => paths
                .iter()
                .filter(|p| p.as_str() != IDENTITY_PATH)
                .any(|p| {
                    rel.strip_prefix(p.as_str())
                        .is_some_and(|rest| rest.is_empty() || rest.starts_with('.'))
                }),
        };
        if !allowed {
            return Err(denied());
        }

        let entry = plan.entry(root).or_default();
        match rel {
            None => entry.root = Some(value),
            Some(rel) => entry.nested.push((full, rel, value)),
        }
    }
    Ok(plan)
}
