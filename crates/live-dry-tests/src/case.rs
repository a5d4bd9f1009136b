// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Mount → dehydrate → transport → hydrate scenario builder.

use live_hydrate::{
    Attributes, ComponentMetadata, DefaultNormalizer, DehydratedProps, DynamicComponent,
    EntityLoader, HydrationConfig, HydrationError, LiveHydrator, LiveValue, UpdateSet, WireMap,
    WireValue, CHECKSUM_KEY,
};

/// Secret every scenario signs with.
pub const TEST_SECRET: &str = "live-dry-tests checksum secret";

/// Hydrator over `loader` keyed with [`TEST_SECRET`].
pub fn test_hydrator<L: EntityLoader>(
    loader: L,
) -> Result<LiveHydrator<DefaultNormalizer<L>>, HydrationError> {
    LiveHydrator::new(
        DefaultNormalizer::new(loader),
        &HydrationConfig::new(TEST_SECRET),
    )
}

/// Outcome of a successful scenario.
#[derive(Debug)]
pub struct Hydrated {
    /// Snapshot produced from the mounted component.
    pub dehydrated: DehydratedProps,
    /// The fresh component after hydration.
    pub component: DynamicComponent,
    /// Attributes handed back by `hydrate`.
    pub attributes: Attributes,
}

impl Hydrated {
    /// Field of the hydrated component (`Null` when unset).
    pub fn field(&self, name: &str) -> &LiveValue {
        self.component.get(name).unwrap_or(&LiveValue::Null)
    }
}

type Hook = Box<dyn FnOnce()>;

/// One hydration scenario.
///
/// ```
/// use live_dry_tests::HydrationCase;
/// use live_hydrate::{ComponentMetadata, FieldDescriptor, NoEntities, TypeRef, WritePolicy};
/// use serde_json::json;
///
/// let metadata = ComponentMetadata::new(
///     "greeting",
///     vec![FieldDescriptor::new("firstName", TypeRef::string()).writable(WritePolicy::FullyWritable)],
/// )
/// .unwrap();
/// let hydrated = HydrationCase::new(NoEntities, metadata)
///     .mount_with([("firstName", "Ryan".into())])
///     .assert_dehydrates_to(json!({"firstName": "Ryan"}), json!({}))
///     .user_updates(json!({"firstName": "Kevin"}))
///     .run()
///     .unwrap();
/// assert_eq!(hydrated.field("firstName").as_str(), Some("Kevin"));
/// ```
pub struct HydrationCase<L> {
    loader: L,
    metadata: ComponentMetadata,
    mounted: DynamicComponent,
    attributes: Attributes,
    expected: Option<(WireValue, WireValue)>,
    updates: UpdateSet,
    changed_original: Option<WireMap>,
    before_hydration: Option<Hook>,
}

impl<L: EntityLoader> HydrationCase<L> {
    /// Scenario for a component described by `metadata`.
    pub fn new(loader: L, metadata: ComponentMetadata) -> Self {
        Self {
            loader,
            metadata,
            mounted: DynamicComponent::new(),
            attributes: Attributes::new(),
            expected: None,
            updates: UpdateSet::new(),
            changed_original: None,
            before_hydration: None,
        }
    }

    /// Initial field values, by source name.
    #[must_use]
    pub fn mount_with<'a>(mut self, props: impl IntoIterator<Item = (&'a str, LiveValue)>) -> Self {
        for (name, value) in props {
            self.mounted.set(name, value);
        }
        self
    }

    /// Attributes passed to `dehydrate`.
    #[must_use]
    pub fn with_attributes(mut self, attributes: WireValue) -> Self {
        if let WireValue::Object(map) = attributes {
            self.attributes = map;
        }
        self
    }

    /// Expected snapshot (without `@checksum`) and nested snapshot.
    #[must_use]
    pub fn assert_dehydrates_to(mut self, props: WireValue, nested: WireValue) -> Self {
        self.expected = Some((props, nested));
        self
    }

    /// Updates the client sends, as a mapping of path to value.
    #[must_use]
    pub fn user_updates(mut self, updates: WireValue) -> Self {
        if let WireValue::Object(map) = updates {
            self.updates = map.into();
        }
        self
    }

    /// Updates the client sends, in an explicit order.
    #[must_use]
    pub fn user_updates_in_order(mut self, updates: UpdateSet) -> Self {
        self.updates = updates;
        self
    }

    /// Replace the snapshot the client sends back. The original checksum is
    /// kept unless `props` carries its own.
    #[must_use]
    pub fn user_changes_original_props_to(mut self, props: WireValue) -> Self {
        if let WireValue::Object(map) = props {
            self.changed_original = Some(map);
        }
        self
    }

    /// Run `hook` after dehydration, before hydration.
    #[must_use]
    pub fn before_hydration(mut self, hook: impl FnOnce() + 'static) -> Self {
        self.before_hydration = Some(Box::new(hook));
        self
    }

    /// Execute the scenario.
    ///
    /// # Panics
    ///
    /// When the snapshot differs from the one given to
    /// [`assert_dehydrates_to`](Self::assert_dehydrates_to).
    pub fn run(mut self) -> Result<Hydrated, HydrationError> {
        let hydrator = test_hydrator(self.loader)?;
        let dehydrated = hydrator.dehydrate(&mut self.mounted, &self.attributes, &self.metadata)?;

        if let Some((props, nested)) = &self.expected {
            let mut actual = dehydrated.props().clone();
            actual.remove(CHECKSUM_KEY);
            assert_eq!(
                &WireValue::Object(actual),
                props,
                "dehydrated props do not match"
            );
            assert_eq!(
                &WireValue::Object(dehydrated.nested_props().clone()),
                nested,
                "dehydrated nested props do not match"
            );
        }

        if let Some(hook) = self.before_hydration {
            hook();
        }

        let mut sent = match self.changed_original {
            Some(mut changed) => {
                if let Some(checksum) = dehydrated.props().get(CHECKSUM_KEY) {
                    changed
                        .entry(CHECKSUM_KEY)
                        .or_insert_with(|| checksum.clone());
                }
                changed
            }
            None => dehydrated.props().clone(),
        };
        sent = over_the_wire(&sent)?;

        let mut component = DynamicComponent::new();
        let attributes = hydrator.hydrate(&mut component, &sent, &self.updates, &self.metadata)?;
        Ok(Hydrated {
            dehydrated,
            component,
            attributes,
        })
    }
}

/// JSON text round trip, as a browser would perform it.
pub fn over_the_wire(props: &WireMap) -> Result<WireMap, HydrationError> {
    let transport = |err: serde_json::Error| HydrationError::InvalidConfiguration {
        path: "transport".to_owned(),
        reason: err.to_string(),
    };
    let text = serde_json::to_string(props).map_err(transport)?;
    serde_json::from_str(&text).map_err(transport)
}
