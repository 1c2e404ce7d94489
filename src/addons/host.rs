//! Published addon registry generations.
//!
//! A reload builds and resolves a complete [`AddonRegistry`] off to the side,
//! then swaps it in. Readers take an `Arc` snapshot and never see a registry
//! that is still being built or resolved.

use parking_lot::RwLock;
use std::sync::Arc;

use super::record::AddonRecord;
use super::registry::AddonRegistry;
use super::resolver::{resolve, Resolution};

struct Published {
    registry: Arc<AddonRegistry>,
    generation: u64,
}

/// Owner of the registry generation visible to addon consumers.
///
/// Thread-safe for concurrent readers; publishing is a single pointer swap.
pub struct AddonHost {
    current: RwLock<Published>,
    /// UI addon requested by configuration
    preferred_ui: Option<String>,
}

impl AddonHost {
    /// Create a host publishing an empty registry as generation 0.
    pub fn new(preferred_ui: Option<String>) -> Self {
        Self {
            current: RwLock::new(Published {
                registry: Arc::new(AddonRegistry::new()),
                generation: 0,
            }),
            preferred_ui,
        }
    }

    pub fn preferred_ui(&self) -> Option<&str> {
        self.preferred_ui.as_deref()
    }

    /// Build a sorted and resolved registry without publishing it.
    ///
    /// Use this when a load stage must run before the generation becomes
    /// visible, then hand the result to [`AddonHost::publish`].
    pub fn build(
        &self,
        records: impl IntoIterator<Item = AddonRecord>,
    ) -> (AddonRegistry, Resolution) {
        let mut registry = AddonRegistry::from_records(records);
        let resolution = resolve(&mut registry, self.preferred_ui());
        (registry, resolution)
    }

    /// Make `registry` the visible generation. Returns its generation number.
    pub fn publish(&self, registry: AddonRegistry) -> u64 {
        let registry = Arc::new(registry);
        let enabled = registry.enabled().count();
        let total = registry.len();

        let mut current = self.current.write();
        current.generation += 1;
        current.registry = registry;

        tracing::info!(
            generation = current.generation,
            enabled,
            total,
            "Published addon registry"
        );
        current.generation
    }

    /// Build, resolve and publish a new generation from `records`.
    pub fn reload(&self, records: impl IntoIterator<Item = AddonRecord>) -> Resolution {
        let (registry, resolution) = self.build(records);
        self.publish(registry);
        resolution
    }

    /// The currently visible registry.
    pub fn snapshot(&self) -> Arc<AddonRegistry> {
        Arc::clone(&self.current.read().registry)
    }

    pub fn generation(&self) -> u64 {
        self.current.read().generation
    }
}

impl std::fmt::Debug for AddonHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let current = self.current.read();
        f.debug_struct("AddonHost")
            .field("generation", &current.generation)
            .field("addon_count", &current.registry.len())
            .field("preferred_ui", &self.preferred_ui)
            .finish()
    }
}
