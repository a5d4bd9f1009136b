// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Live component → signed wire snapshot.

use tracing::{debug, instrument};

use crate::component::Component;
use crate::error::HydrationError;
use crate::normalizer::Normalizer;
use crate::path;
use crate::schema::{ComponentMetadata, FieldDescriptor, TypeRef, WritePolicy, IDENTITY_PATH};
use crate::value::{Attributes, DehydratedProps, LiveValue, WireMap, WireValue, ATTRIBUTES_KEY};
use crate::LiveHydrator;

impl<N: Normalizer> LiveHydrator<N> {
    /// Run the component's `pre_dehydrate` hook, then snapshot every
    /// hydrated field and sign the result.
    ///
    /// Writable sub-paths are additionally snapshotted under
    /// `"{wire}.{path}"` in [`DehydratedProps::nested_props`] so a client can
    /// bind inputs to them. Apart from its own hook, the component is not
    /// mutated.
    ///
    /// # Errors
    ///
    /// - [`HydrationError::Normalize`] when a value does not fit its type.
    /// - [`HydrationError::InvalidConfiguration`] when a field declared
    ///   writable as a whole dehydrates to a sequence or mapping, or a
    ///   declared writable path does not exist on the field's type, or `@id`
    ///   is declared on a field that does not hold an entity.
    #[instrument(skip_all, fields(component = %metadata.name()))]
    pub fn dehydrate<C: Component + ?Sized>(
        &self,
        component: &mut C,
        attributes: &Attributes,
        metadata: &ComponentMetadata,
    ) -> Result<DehydratedProps, HydrationError> {
        component.pre_dehydrate();

        let mut props = WireMap::new();
        let mut nested = WireMap::new();

        for field in metadata.hydrated_fields() {
            let live = component.read_field(field.source()).unwrap_or_default();
            let wire = self.normalize_root(field, &live)?;

            match field.write_policy() {
                WritePolicy::NotWritable => {}
                WritePolicy::FullyWritable => {
                    ensure_scalar_shape(field.wire(), field.ty(), &wire)?;
                }
                WritePolicy::WritablePaths(paths) => {
                    if paths.contains(IDENTITY_PATH) && !field.is_identity() {
                        return Err(HydrationError::InvalidConfiguration {
                            path: field.wire().to_owned(),
                            reason: format!(
                                "\"{IDENTITY_PATH}\" is only writable on entity fields, not {}",
                                field.ty().describe()
                            ),
                        });
                    }
                    for rel in paths.iter().filter(|p| p.as_str() != IDENTITY_PATH) {
                        let full = format!("{}.{rel}", field.wire());
                        let sub_ty = field.ty().resolve(rel).ok_or_else(|| {
                            HydrationError::InvalidConfiguration {
                                path: full.clone(),
                                reason: format!(
                                    "writable path \"{rel}\" does not exist on {}",
                                    field.ty().describe()
                                ),
                            }
                        })?;
                        let sub_live = path::get(&live, rel).unwrap_or(&LiveValue::Null);
                        let sub_wire = self
                            .normalizer
                            .normalize(sub_live, &sub_ty, field.serialization_context())
                            .map_err(|source| HydrationError::Normalize {
                                path: full.clone(),
                                source,
                            })?;
                        ensure_scalar_shape(&full, &sub_ty, &sub_wire)?;
                        nested.insert(full, sub_wire);
                    }
                }
            }

            props.insert(field.wire().to_owned(), wire);
        }

        if !attributes.is_empty() {
            props.insert(
                ATTRIBUTES_KEY.to_owned(),
                WireValue::Object(attributes.clone()),
            );
        }
        self.signer.stamp(metadata.name(), &mut props)?;
        debug!(fields = props.len(), nested = nested.len(), "dehydrated");

        Ok(DehydratedProps::new(props, nested))
    }

    pub(crate) fn normalize_root(
        &self,
        field: &FieldDescriptor,
        live: &LiveValue,
    ) -> Result<WireValue, HydrationError> {
        let wire = match field.normalize_hook() {
            Some(hook) => hook(live),
            None => self
                .normalizer
                .normalize(live, field.ty(), field.serialization_context()),
        };
        wire.map_err(|source| HydrationError::Normalize {
            path: field.wire().to_owned(),
            source,
        })
    }
}

/// A value the client may replace wholesale must not dehydrate to a tree
/// unless its type is itself a native collection.
fn ensure_scalar_shape(path: &str, ty: &TypeRef, wire: &WireValue) -> Result<(), HydrationError> {
    if is_tree(wire) && !ty.is_structural() {
        return Err(HydrationError::InvalidConfiguration {
            path: path.to_owned(),
            reason: format!(
                "the value of type {} is an object that was dehydrated to an array; \
                 it cannot be made writable as a whole. You probably want to set \
                 writable to only the properties on your class that should be writable",
                ty.describe()
            ),
        });
    }
    Ok(())
}

pub(crate) const fn is_tree(wire: &WireValue) -> bool {
    matches!(wire, WireValue::Array(_) | WireValue::Object(_))
}
