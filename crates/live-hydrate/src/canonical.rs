// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Deterministic CBOR encoding of wire snapshots (checksum input).
//!
//! Rules:
//! - map keys sorted by their encoded bytes, duplicates rejected;
//! - minimal-width integer and length heads, definite lengths only;
//! - a float holding an integral value is written as that integer, other
//!   floats use the shortest width (f16/f32/f64) that round-trips exactly.
//!
//! The float rule is what makes the checksum survive JSON transports that
//! print `123.0` as `123`.

use ciborium::value::Value;
use half::f16;

use crate::value::WireValue;

/// Canonical encoding failure.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CanonError {
    /// CBOR tags never appear in snapshots.
    #[error("tags not allowed")]
    Tag,
    /// Two map keys encoded to the same bytes.
    #[error("duplicate map key")]
    MapKeyDuplicate,
    /// Value not expressible in the canonical subset.
    #[error("unsupported value: {0}")]
    Unsupported(String),
}

type Result<T> = std::result::Result<T, CanonError>;

/// Canonical bytes of a wire value.
pub fn encode_wire(value: &WireValue) -> Result<Vec<u8>> {
    let cbor =
        Value::serialized(value).map_err(|err| CanonError::Unsupported(err.to_string()))?;
    encode_value(&cbor)
}

/// Canonical bytes of a CBOR value.
pub fn encode_value(val: &Value) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    enc_value(val, &mut out)?;
    Ok(out)
}

fn enc_value(v: &Value, out: &mut Vec<u8>) -> Result<()> {
    match v {
        Value::Bool(b) => out.push(if *b { 0xf5 } else { 0xf4 }),
        Value::Null => out.push(0xf6),
        Value::Integer(n) => enc_int(i128::from(*n), out),
        Value::Float(f) => enc_float(*f, out),
        Value::Text(s) => enc_text(s, out),
        Value::Bytes(b) => enc_bytes(b, out),
        Value::Array(items) => {
            enc_len(4, items.len(), out);
            for it in items {
                enc_value(it, out)?;
            }
        }
        Value::Map(entries) => {
            let mut buf: Vec<(Vec<u8>, &Value)> = Vec::with_capacity(entries.len());
            for (k, v) in entries {
                let mut kb = Vec::new();
                enc_value(k, &mut kb)?;
                buf.push((kb, v));
            }

            buf.sort_by(|a, b| a.0.cmp(&b.0));

            if buf.windows(2).any(|win| win[0].0 == win[1].0) {
                return Err(CanonError::MapKeyDuplicate);
            }

            enc_len(5, buf.len(), out);
            for (kb, v) in buf {
                out.extend_from_slice(&kb);
                enc_value(v, out)?;
            }
        }
        Value::Tag(_, _) => return Err(CanonError::Tag),
        _ => return Err(CanonError::Unsupported("simple value".into())),
    }
    Ok(())
}

fn enc_len(major: u8, len: usize, out: &mut Vec<u8>) {
    write_major(major, len as u128, out);
}

#[allow(clippy::cast_sign_loss)]
fn enc_int(n: i128, out: &mut Vec<u8>) {
    if n >= 0 {
        write_major(0, n as u128, out);
    } else {
        let m = (-1 - n) as u128;
        write_major(1, m, out);
    }
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::float_cmp
)]
fn enc_float(f: f64, out: &mut Vec<u8>) {
    if f.is_nan() {
        write_half(f16::NAN, out);
        return;
    }
    if f.is_infinite() {
        let h = if f.is_sign_positive() {
            f16::INFINITY
        } else {
            f16::NEG_INFINITY
        };
        write_half(h, out);
        return;
    }
    if f.fract() == 0.0 {
        let i = f as i128;
        if i as f64 == f {
            enc_int(i, out);
            return;
        }
    }
    let h = f16::from_f64(f);
    if h.to_f64() == f {
        write_half(h, out);
        return;
    }
    let f32v = f as f32;
    if f64::from(f32v) == f {
        out.push(0xfa);
        out.extend_from_slice(&f32v.to_be_bytes());
    } else {
        out.push(0xfb);
        out.extend_from_slice(&f.to_be_bytes());
    }
}

fn write_half(h: f16, out: &mut Vec<u8>) {
    out.push(0xf9);
    out.extend_from_slice(&h.to_bits().to_be_bytes());
}

fn enc_bytes(b: &[u8], out: &mut Vec<u8>) {
    enc_len(2, b.len(), out);
    out.extend_from_slice(b);
}

fn enc_text(s: &str, out: &mut Vec<u8>) {
    enc_len(3, s.len(), out);
    out.extend_from_slice(s.as_bytes());
}

#[allow(clippy::cast_possible_truncation)]
fn write_major(major: u8, n: u128, out: &mut Vec<u8>) {
    debug_assert!(major <= 7);
    match n {
        0..=23 => out.push((major << 5) | n as u8),
        24..=0xff => {
            out.push((major << 5) | 24);
            out.push(n as u8);
        }
        0x100..=0xffff => {
            out.push((major << 5) | 25);
            out.extend_from_slice(&(n as u16).to_be_bytes());
        }
        0x1_0000..=0xffff_ffff => {
            out.push((major << 5) | 26);
            out.extend_from_slice(&(n as u32).to_be_bytes());
        }
        _ => {
            out.push((major << 5) | 27);
            out.extend_from_slice(&(n as u64).to_be_bytes());
        }
    }
}
