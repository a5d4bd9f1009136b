// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Error taxonomy.
//!
//! [`HydrationError`] is what callers see; every variant is fatal for the call
//! that produced it. [`NormalizeError`] and [`DenormalizeError`] are raised by
//! normalizers and are either promoted to a [`HydrationError`] or recovered
//! locally by the hydrator.

use thiserror::Error;

use crate::canonical::CanonError;
use crate::path::PathError;

/// Why a snapshot failed checksum verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TamperReason {
    /// `@checksum` was absent.
    Missing,
    /// `@checksum` was not a well-formed digest string.
    Malformed,
    /// The digest did not match the snapshot.
    Mismatch,
}

impl std::fmt::Display for TamperReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Missing => "is missing",
            Self::Malformed => "is malformed",
            Self::Mismatch => "does not match",
        })
    }
}

/// Fatal outcome of a dehydrate or hydrate call.
#[derive(Debug, Error)]
pub enum HydrationError {
    /// Checksum missing or mismatched: read-only data was modified.
    #[error("[HYD_TAMPERED] checksum of component \"{component}\" {reason}")]
    TamperDetected {
        /// Component type name.
        component: String,
        /// What went wrong.
        reason: TamperReason,
    },
    /// An update targets a field or sub-path the client may not write.
    #[error(
        "[HYD_NOT_WRITABLE] the model \"{path}\" was sent for update, but it is not writable \
         (field \"{field}\")"
    )]
    WriteNotAuthorized {
        /// Offending update path.
        path: String,
        /// Wire name of the targeted field (the path root when unknown).
        field: String,
    },
    /// Untrusted structural data was sent where an object must be constructed.
    #[error(
        "[HYD_UNSUPPORTED_SHAPE] the model path \"{path}\" was sent as an array, but this \
         could not be hydrated to {expected} as that is not allowed"
    )]
    UnsupportedShape {
        /// Offending path.
        path: String,
        /// Declared type at that path.
        expected: String,
    },
    /// A non-nullable entity field references a record that no longer exists.
    #[error("[HYD_ENTITY_NOT_FOUND] entity {entity} with id {id} at \"{path}\" was not found")]
    EntityNotFound {
        /// Field path.
        path: String,
        /// Entity type name.
        entity: String,
        /// Identifier that failed to resolve.
        id: String,
    },
    /// Declared writability or metadata is incoherent with the data's shape.
    #[error("[HYD_INVALID_CONFIG] \"{path}\": {reason}")]
    InvalidConfiguration {
        /// Path or key of the misconfigured item.
        path: String,
        /// Explanation.
        reason: String,
    },
    /// Two update paths on the same branch were sent in one call.
    #[error("[HYD_OVERLAPPING_UPDATE] update paths \"{first}\" and \"{second}\" overlap")]
    OverlappingUpdatePaths {
        /// The shorter path.
        first: String,
        /// The path nested under it.
        second: String,
    },
    /// A live value could not be normalized.
    #[error("[HYD_NORMALIZE] \"{path}\": {source}")]
    Normalize {
        /// Field path.
        path: String,
        /// Underlying failure.
        #[source]
        source: NormalizeError,
    },
    /// A codec or hook could not rebuild a value.
    #[error("[HYD_DENORMALIZE] \"{path}\": {source}")]
    Denormalize {
        /// Field path.
        path: String,
        /// Underlying failure.
        #[source]
        source: DenormalizeError,
    },
    /// An update path could not be applied to the value tree.
    #[error("[HYD_PATH] \"{path}\": {source}")]
    Path {
        /// Update path.
        path: String,
        /// Underlying failure.
        #[source]
        source: PathError,
    },
    /// The canonical encoder rejected the snapshot.
    #[error("[HYD_CANONICAL] {0}")]
    Canonical(#[from] CanonError),
}

impl HydrationError {
    /// Offending path, when the failure is tied to one.
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::WriteNotAuthorized { path, .. }
            | Self::UnsupportedShape { path, .. }
            | Self::EntityNotFound { path, .. }
            | Self::InvalidConfiguration { path, .. }
            | Self::Normalize { path, .. }
            | Self::Denormalize { path, .. }
            | Self::Path { path, .. } => Some(path),
            Self::OverlappingUpdatePaths { second, .. } => Some(second),
            Self::TamperDetected { .. } | Self::Canonical(_) => None,
        }
    }
}

/// Failure converting a live value to wire form.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NormalizeError {
    /// The live value does not fit the declared type.
    #[error("expected {expected}, found {found}")]
    TypeMismatch {
        /// Declared type.
        expected: String,
        /// Kind of value found.
        found: &'static str,
    },
    /// Float cannot be represented on the wire (NaN or infinite).
    #[error("non-finite float {0}")]
    NonFinite(f64),
    /// Failure reported by a codec or hook.
    #[error("{0}")]
    Custom(String),
}

/// Failure rebuilding a live value from wire form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DenormalizeError {
    /// The value cannot be read as the declared type. Recoverable.
    #[error("cannot read {found} as {expected}")]
    InvalidValue {
        /// Declared type.
        expected: String,
        /// Kind of wire value found.
        found: &'static str,
    },
    /// A sequence/mapping was supplied for a type built by a constructor.
    #[error("structural value cannot be hydrated to {expected}")]
    UnsupportedShape {
        /// Declared type.
        expected: String,
    },
    /// The entity loader could not resolve the identifier.
    #[error("entity {entity} with id {id} not found")]
    EntityNotFound {
        /// Entity type name.
        entity: String,
        /// Identifier as text.
        id: String,
    },
    /// Failure reported by a codec or hook.
    #[error("{0}")]
    Custom(String),
}

/// Short name of a wire value's kind, for error messages.
pub(crate) const fn wire_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "mapping",
    }
}
