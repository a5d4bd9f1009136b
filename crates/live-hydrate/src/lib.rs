// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Server-authoritative state for live UI components.
//!
//! A live component's fields leave the server as a flat, wire-safe snapshot
//! ("dehydration"), travel through an untrusted client, and come back together
//! with a set of paths the user wants to change ("hydration"). This crate
//! guarantees that only fields declared writable actually change, and that
//! any other modification is detected by a keyed checksum and rejected.
//!
//! # Pieces
//!
//! - [`schema`] - declared types, field descriptors and write policies.
//! - [`value`] - live values, wire snapshots and update sets.
//! - [`normalizer`] - the [`Normalizer`] seam plus [`DefaultNormalizer`].
//! - [`canonical`] / [`checksum`] - deterministic encoding and the keyed digest.
//! - [`path`] - dot-path addressing over wire and live trees.
//! - [`LiveHydrator`] - `dehydrate` / `hydrate`.
//!
//! # Determinism
//!
//! Wire maps are `serde_json::Map` (sorted keys) and live maps are
//! `BTreeMap`s. The checksum is computed over canonical CBOR in which an
//! integral float is indistinguishable from the matching integer, so a
//! transport that degrades `123.0` to `123` does not trip tamper detection.
//!
//! # Concurrency
//!
//! [`LiveHydrator`] holds no mutable state. Hydrating distinct components from
//! several threads needs no coordination; serializing access to one component
//! is the caller's job.
#![forbid(unsafe_code)]

pub mod canonical;
pub mod checksum;
pub mod component;
pub mod config;
mod dehydrate;
pub mod entity;
pub mod error;
mod hydrate;
pub mod normalizer;
pub mod path;
pub mod schema;
pub mod value;

pub use checksum::ChecksumSigner;
pub use component::{Component, DynamicComponent};
pub use config::{ConfigError, ConfigService, ConfigStore, HydrationConfig};
pub use entity::{EntityLoader, NoEntities};
pub use error::{DenormalizeError, HydrationError, NormalizeError};
pub use normalizer::{DefaultNormalizer, Normalizer};
pub use schema::{
    ComponentMetadata, EnumSchema, FieldDescriptor, ObjectCodec, ObjectField, ObjectSchema,
    SerializationContext, TypeRef, ValueKind, WritePolicy, IDENTITY_PATH,
};
pub use value::{
    Attributes, DehydratedProps, EnumScalar, EnumValue, LiveValue, ObjectValue, UpdateSet,
    WireMap, WireValue, ATTRIBUTES_KEY, CHECKSUM_KEY,
};

/// The hydration engine.
///
/// Pairs a [`Normalizer`] with a [`ChecksumSigner`]. Both operations are pure
/// functions of their inputs plus the normalizer's collaborators.
#[derive(Debug, Clone)]
pub struct LiveHydrator<N> {
    normalizer: N,
    signer: ChecksumSigner,
}

impl<N: Normalizer> LiveHydrator<N> {
    /// Build an engine from a normalizer and validated config.
    pub fn new(normalizer: N, config: &HydrationConfig) -> Result<Self, HydrationError> {
        config.validate()?;
        Ok(Self {
            normalizer,
            signer: ChecksumSigner::new(config.checksum_secret.as_bytes()),
        })
    }

    /// Build an engine from a config value persisted under `key`.
    ///
    /// A missing key is a configuration error: there is no safe default secret.
    pub fn from_config_store<S: ConfigStore>(
        normalizer: N,
        store: S,
        key: &str,
    ) -> Result<Self, HydrationError> {
        let service = ConfigService::new(store);
        let config: HydrationConfig = service
            .load(key)
            .map_err(|err| HydrationError::InvalidConfiguration {
                path: key.to_owned(),
                reason: err.to_string(),
            })?
            .ok_or_else(|| HydrationError::InvalidConfiguration {
                path: key.to_owned(),
                reason: "no hydration config stored under this key".to_owned(),
            })?;
        Self::new(normalizer, &config)
    }

    /// The normalizer this engine converts values with.
    pub fn normalizer(&self) -> &N {
        &self.normalizer
    }

    /// The checksum signer stamping and verifying snapshots.
    pub fn signer(&self) -> &ChecksumSigner {
        &self.signer
    }
}
