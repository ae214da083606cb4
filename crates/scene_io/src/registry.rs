//! Component type registry: maps a persisted `type` tag to a factory that
//! builds a fresh, default behavior of that type.
//!
//! Loading a scene consults the registry for every component packet, so every
//! behavior type that can appear in a saved scene must be registered first.

use std::collections::HashMap;
use std::fmt;

use scene_core::Behavior;
use tracing::warn;

/// Builds a fresh behavior for one registered type.
pub type BehaviorFactory = Box<dyn Fn() -> Box<dyn Behavior>>;

/// Registry of every component type the loader can reconstruct.
#[derive(Default)]
pub struct ComponentRegistry {
    /// Factories keyed by type tag.
    factories: HashMap<String, BehaviorFactory>,
}

impl ComponentRegistry {
    /// Create a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Register `B` under the tag its default value reports from
    /// [`Behavior::type_name`].
    pub fn register<B: Behavior + Default>(&mut self) {
        let type_name = B::default().type_name();
        self.register_with(type_name, || Box::new(B::default()));
    }

    /// Register a factory under an explicit tag. A second registration under
    /// the same tag replaces the first.
    pub fn register_with<F>(&mut self, type_name: impl Into<String>, factory: F)
    where
        F: Fn() -> Box<dyn Behavior> + 'static,
    {
        let type_name = type_name.into();
        if self
            .factories
            .insert(type_name.clone(), Box::new(factory))
            .is_some()
        {
            warn!(%type_name, "component type registered twice, replacing factory");
        }
    }

    /// Build a fresh behavior for `type_name`, or `None` if unregistered.
    #[must_use]
    pub fn create(&self, type_name: &str) -> Option<Box<dyn Behavior>> {
        self.factories.get(type_name).map(|factory| factory())
    }

    /// Returns `true` if `type_name` is registered.
    #[must_use]
    pub fn contains(&self, type_name: &str) -> bool {
        self.factories.contains_key(type_name)
    }

    /// Returns the registered tags in sorted order.
    #[must_use]
    pub fn type_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Returns the number of registered types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl fmt::Debug for ComponentRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentRegistry")
            .field("types", &self.type_names())
            .finish()
    }
}
