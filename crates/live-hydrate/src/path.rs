// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Dot-path addressing into nested mappings and sequences.
//!
//! `"invoice.lineItems.2.price"` walks mapping keys and decimal sequence
//! indices with the same syntax. There is no wildcard or range syntax.
//! [`set`] creates missing or `null` intermediates as mappings, replaces a
//! leaf, or swaps a whole subtree when the path names an internal node.
//! Callers apply several writes in their own order; a later write at a more
//! specific path wins.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::value::{LiveValue, WireValue};

/// Path addressing failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    /// Path or one of its segments is empty.
    #[error("empty path segment in \"{0}\"")]
    EmptySegment(String),
    /// A segment tried to descend into a scalar.
    #[error("\"{0}\" is not a mapping or sequence")]
    NotAContainer(String),
    /// Sequence segment is not a decimal index.
    #[error("\"{0}\" is not a sequence index")]
    InvalidIndex(String),
    /// Sequence index beyond `len` (writing at `len` appends).
    #[error("index {index} out of range for length {len}")]
    IndexOutOfRange {
        /// Requested index.
        index: usize,
        /// Current length.
        len: usize,
    },
}

/// A tree node addressable by path segments.
pub trait PathNode: Sized {
    /// Child under `segment`, if present.
    fn child(&self, segment: &str) -> Option<&Self>;
    /// Mutable child under `segment`, if present.
    fn child_mut(&mut self, segment: &str) -> Option<&mut Self>;
    /// Insert or replace the child under `segment`.
    fn put_child(&mut self, segment: &str, value: Self) -> Result<(), PathError>;
    /// Fresh empty mapping.
    fn empty_mapping() -> Self;
    /// `true` for null nodes (replaced by mappings when written through).
    fn is_null_node(&self) -> bool;
}

fn parse_index(segment: &str) -> Result<usize, PathError> {
    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return Err(PathError::InvalidIndex(segment.to_owned()));
    }
    segment
        .parse()
        .map_err(|_| PathError::InvalidIndex(segment.to_owned()))
}

fn put_indexed<T>(items: &mut Vec<T>, segment: &str, value: T) -> Result<(), PathError> {
    let index = parse_index(segment)?;
    let len = items.len();
    match index {
        i if i < len => items[i] = value,
        i if i == len => items.push(value),
        _ => return Err(PathError::IndexOutOfRange { index, len }),
    }
    Ok(())
}

fn segments(path: &str) -> Result<Vec<&str>, PathError> {
    let parts: Vec<&str> = path.split('.').collect();
    if parts.iter().any(|p| p.is_empty()) {
        return Err(PathError::EmptySegment(path.to_owned()));
    }
    Ok(parts)
}

/// Node at `path` below `root`.
pub fn get<'a, T: PathNode>(root: &'a T, path: &str) -> Option<&'a T> {
    let mut current = root;
    for segment in segments(path).ok()? {
        current = current.child(segment)?;
    }
    Some(current)
}

/// Write `value` at `path` below `root`.
pub fn set<T: PathNode>(root: &mut T, path: &str, value: T) -> Result<(), PathError> {
    let parts = segments(path)?;
    let Some((last, parents)) = parts.split_last() else {
        return Err(PathError::EmptySegment(path.to_owned()));
    };
    let mut current = root;
    for segment in parents {
        if current.is_null_node() {
            *current = T::empty_mapping();
        }
        if current.child(segment).is_none() {
            current.put_child(segment, T::empty_mapping())?;
        }
        current = current
            .child_mut(segment)
            .ok_or_else(|| PathError::NotAContainer((*segment).to_owned()))?;
    }
    if current.is_null_node() {
        *current = T::empty_mapping();
    }
    current.put_child(last, value)
}

/// `true` when one path equals the other or is a dot-prefix of it.
pub fn overlapping(a: &str, b: &str) -> bool {
    fn nested(short: &str, long: &str) -> bool {
        long.strip_prefix(short)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('.'))
    }
    nested(a, b) || nested(b, a)
}

impl PathNode for WireValue {
    fn child(&self, segment: &str) -> Option<&Self> {
        match self {
            Self::Object(map) => map.get(segment),
            Self::Array(items) => items.get(parse_index(segment).ok()?),
            _ => None,
        }
    }

    fn child_mut(&mut self, segment: &str) -> Option<&mut Self> {
        match self {
            Self::Object(map) => map.get_mut(segment),
            Self::Array(items) => items.get_mut(parse_index(segment).ok()?),
            _ => None,
        }
    }

    fn put_child(&mut self, segment: &str, value: Self) -> Result<(), PathError> {
        match self {
            Self::Object(map) => {
                map.insert(segment.to_owned(), value);
                Ok(())
            }
            Self::Array(items) => put_indexed(items, segment, value),
            _ => Err(PathError::NotAContainer(segment.to_owned())),
        }
    }

    fn empty_mapping() -> Self {
        Self::Object(serde_json::Map::new())
    }

    fn is_null_node(&self) -> bool {
        self.is_null()
    }
}

impl PathNode for LiveValue {
    fn child(&self, segment: &str) -> Option<&Self> {
        match self {
            Self::Map(map) => map.get(segment),
            Self::Object(obj) => obj.fields.get(segment),
            Self::List(items) => items.get(parse_index(segment).ok()?),
            _ => None,
        }
    }

    fn child_mut(&mut self, segment: &str) -> Option<&mut Self> {
        match self {
            Self::Map(map) => map.get_mut(segment),
            Self::Object(obj) => obj.fields.get_mut(segment),
            Self::List(items) => items.get_mut(parse_index(segment).ok()?),
            _ => None,
        }
    }

    fn put_child(&mut self, segment: &str, value: Self) -> Result<(), PathError> {
        match self {
            Self::Map(map) => {
                map.insert(segment.to_owned(), value);
                Ok(())
            }
            Self::Object(obj) => {
                obj.fields.insert(segment.to_owned(), value);
                Ok(())
            }
            Self::List(items) => put_indexed(items, segment, value),
            _ => Err(PathError::NotAContainer(segment.to_owned())),
        }
    }

    fn empty_mapping() -> Self {
        Self::Map(BTreeMap::new())
    }

    fn is_null_node(&self) -> bool {
        self.is_null()
    }
}
