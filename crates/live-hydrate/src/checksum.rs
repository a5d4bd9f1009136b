// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Keyed checksum over a snapshot's canonical bytes.
//!
//! `checksum = hex(BLAKE3-keyed(K, canonical(props \ {@checksum})))` where
//! `K = BLAKE3-derive_key(CONTEXT, secret ‖ 0x00 ‖ component)`. Scoping the key
//! by component type means a digest minted for one component never verifies
//! for another, even with identical props.

use std::fmt;

use tracing::warn;

use crate::canonical;
use crate::error::{HydrationError, TamperReason};
use crate::value::{WireMap, WireValue, CHECKSUM_KEY};

const KEY_CONTEXT: &str = "live-hydrate 2024-06 props checksum v1";

/// Computes and verifies snapshot checksums with a host-supplied secret.
#[derive(Clone)]
pub struct ChecksumSigner {
    secret: Vec<u8>,
}

impl ChecksumSigner {
    /// Signer over `secret`.
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    fn key_for(&self, component: &str) -> [u8; 32] {
        let mut material = Vec::with_capacity(self.secret.len() + 1 + component.len());
        material.extend_from_slice(&self.secret);
        material.push(0);
        material.extend_from_slice(component.as_bytes());
        blake3::derive_key(KEY_CONTEXT, &material)
    }

    fn digest(&self, component: &str, props: &WireMap) -> Result<blake3::Hash, HydrationError> {
        let mut body = props.clone();
        body.remove(CHECKSUM_KEY);
        let bytes = canonical::encode_wire(&WireValue::Object(body))?;
        Ok(blake3::keyed_hash(&self.key_for(component), &bytes))
    }

    /// Checksum of `props`, ignoring any `@checksum` entry already present.
    pub fn compute(&self, component: &str, props: &WireMap) -> Result<String, HydrationError> {
        Ok(self.digest(component, props)?.to_hex().to_string())
    }

    /// Write the checksum into `props` under `@checksum`.
    pub fn stamp(&self, component: &str, props: &mut WireMap) -> Result<(), HydrationError> {
        let checksum = self.compute(component, props)?;
        props.insert(CHECKSUM_KEY.to_owned(), WireValue::String(checksum));
        Ok(())
    }

    /// Verify the stored checksum against the rest of `props`. Fails closed.
    pub fn verify(&self, component: &str, props: &WireMap) -> Result<(), HydrationError> {
        let tampered = |reason| {
            warn!(component, %reason, "rejecting snapshot");
            HydrationError::TamperDetected {
                component: component.to_owned(),
                reason,
            }
        };
        let stored = match props.get(CHECKSUM_KEY) {
            None => return Err(tampered(TamperReason::Missing)),
            Some(WireValue::String(s)) => s,
            Some(_) => return Err(tampered(TamperReason::Malformed)),
        };
        let stored =
            blake3::Hash::from_hex(stored).map_err(|_| tampered(TamperReason::Malformed))?;
        // blake3::Hash equality is constant-time.
        if stored == self.digest(component, props)? {
            Ok(())
        } else {
            Err(tampered(TamperReason::Mismatch))
        }
    }
}

impl fmt::Debug for ChecksumSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChecksumSigner")
            .field("secret", &"<redacted>")
            .finish()
    }
}
