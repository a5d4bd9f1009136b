// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shared test doubles and fixtures for live-hydrate.
#![forbid(unsafe_code)]
//!
//! # Modules
//!
//! - [`case`] - `HydrationCase` scenario builder (mount, dehydrate, transport, hydrate)
//! - [`config`] - In-memory config store fake
//! - [`entity_store`] - In-memory entity store fake with lookup counting
//! - [`fixtures`] - Fixture schemas, codecs and enum types

pub mod case;
pub mod config;
pub mod entity_store;
pub mod fixtures;

pub use case::{over_the_wire, test_hydrator, Hydrated, HydrationCase, TEST_SECRET};
pub use config::InMemoryConfigStore;
pub use entity_store::InMemoryEntityStore;
