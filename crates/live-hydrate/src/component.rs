// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Component state access.

use std::collections::BTreeMap;

use crate::error::HydrationError;
use crate::value::LiveValue;

/// A live component instance as seen by the hydrator.
///
/// Fields are addressed by their *source* name. `dehydrate` calls
/// [`pre_dehydrate`](Self::pre_dehydrate) before reading any field. The
/// hydrator writes each hydrated field exactly once per successful `hydrate`
/// call, then calls [`post_hydrate`](Self::post_hydrate).
pub trait Component {
    /// Current value of a field; `None` when the field is unset.
    fn read_field(&self, name: &str) -> Option<LiveValue>;

    /// Replace a field's value.
    fn write_field(&mut self, name: &str, value: LiveValue) -> Result<(), HydrationError>;

    /// Hook run before the component is snapshotted.
    fn pre_dehydrate(&mut self) {}

    /// Hook run after every field has been written.
    fn post_hydrate(&mut self) {}
}

/// Map-backed component for metadata-driven hosts and tests.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DynamicComponent {
    fields: BTreeMap<String, LiveValue>,
    pre_dehydrate_calls: usize,
    post_hydrate_calls: usize,
}

impl DynamicComponent {
    /// Empty component.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style field assignment.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<LiveValue>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Assign a field.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<LiveValue>) {
        self.fields.insert(name.into(), value.into());
    }

    /// Borrow a field.
    pub fn get(&self, name: &str) -> Option<&LiveValue> {
        self.fields.get(name)
    }

    /// Number of `pre_dehydrate` calls.
    pub const fn pre_dehydrate_calls(&self) -> usize {
        self.pre_dehydrate_calls
    }

    /// Number of completed `post_hydrate` calls.
    pub const fn post_hydrate_calls(&self) -> usize {
        self.post_hydrate_calls
    }
}

impl Component for DynamicComponent {
    fn read_field(&self, name: &str) -> Option<LiveValue> {
        self.fields.get(name).cloned()
    }

    fn write_field(&mut self, name: &str, value: LiveValue) -> Result<(), HydrationError> {
        self.fields.insert(name.to_owned(), value);
        Ok(())
    }

    fn pre_dehydrate(&mut self) {
        self.pre_dehydrate_calls += 1;
    }

    fn post_hydrate(&mut self) {
        self.post_hydrate_calls += 1;
    }
}
