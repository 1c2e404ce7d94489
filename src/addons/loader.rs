//! Addon load stage.
//!
//! Walks a resolved registry, opens each enabled native addon's module and
//! puts it through the ABI gate before anything else in the module is used.
//! A rejected addon is disabled on the spot, so a later addon depending on it
//! is skipped without its module being opened. Once the walk ends the
//! dependency fixpoint is re-run for dependents that came earlier in order.

use std::path::Path;

use super::abi::{check_abi_against, ModuleLoader, ADDON_ABI_VERSION};
use super::error::AddonError;
use super::record::AddonRecord;
use super::registry::AddonRegistry;
use super::resolver::{disable_unsatisfied, first_unavailable, DisableReason, DisabledAddon};

/// An addon that made it through the load stage.
#[derive(Debug)]
pub struct LoadedAddon<H> {
    pub name: String,
    /// Gated module handle; `None` for builtin addons
    pub module: Option<H>,
}

/// An addon whose module could not be opened or failed the ABI gate.
#[derive(Debug)]
pub struct RejectedAddon {
    pub name: String,
    pub error: AddonError,
}

/// Result of [`AddonLoader::load_all`].
#[derive(Debug)]
pub struct LoadReport<H> {
    /// Loaded addons in registry order
    pub loaded: Vec<LoadedAddon<H>>,
    /// Addons rejected at the module boundary
    pub rejected: Vec<RejectedAddon>,
    /// Addons disabled afterwards because they depended on a rejected one
    pub cascaded: Vec<DisabledAddon>,
}

impl<H> LoadReport<H> {
    pub fn loaded_names(&self) -> Vec<&str> {
        self.loaded.iter().map(|a| a.name.as_str()).collect()
    }
}

/// Loads the modules of enabled addons through a [`ModuleLoader`].
pub struct AddonLoader<L> {
    modules: L,
    abi_version: i32,
}

impl<L: ModuleLoader> AddonLoader<L> {
    /// Create a loader gating against [`ADDON_ABI_VERSION`].
    pub fn new(modules: L) -> Self {
        Self {
            modules,
            abi_version: ADDON_ABI_VERSION,
        }
    }

    /// Gate against a different runtime ABI version.
    pub fn with_abi_version(mut self, version: i32) -> Self {
        self.abi_version = version;
        self
    }

    pub fn abi_version(&self) -> i32 {
        self.abi_version
    }

    /// Load every enabled addon in `registry`.
    ///
    /// Rejections disable the addon in `registry` immediately. Addons whose
    /// dependencies became unavailable are disabled without opening their
    /// module; handles of earlier dependents are dropped unused.
    pub fn load_all(&self, registry: &mut AddonRegistry) -> LoadReport<L::Handle> {
        let mut opened = Vec::new();
        let mut rejected = Vec::new();
        let mut cascaded = Vec::new();

        for index in 0..registry.len() {
            let addon = &registry.records()[index];
            if !addon.enabled {
                continue;
            }
            let name = addon.name.clone();

            if let Some(missing) = first_unavailable(registry, addon) {
                let dependency = addon.dependency().to_string();
                tracing::warn!(
                    addon = %name,
                    dependency = %dependency,
                    missing = %missing,
                    "Skip addon module, dependency can not be satisfied"
                );
                registry.disable(&name);
                cascaded.push(DisabledAddon {
                    name,
                    reason: DisableReason::UnsatisfiedDependency {
                        dependency,
                        missing,
                    },
                });
                continue;
            }

            if !addon.addon_type.needs_module() {
                opened.push(LoadedAddon { name, module: None });
                continue;
            }

            match self.open_gated(addon) {
                Ok(module) => opened.push(LoadedAddon {
                    name,
                    module: Some(module),
                }),
                Err(error) => {
                    tracing::error!(
                        addon = %name,
                        library = %addon.library,
                        error = %error,
                        "Addon module rejected"
                    );
                    registry.disable(&name);
                    rejected.push(RejectedAddon { name, error });
                }
            }
        }

        if !rejected.is_empty() {
            cascaded.extend(disable_unsatisfied(registry).disabled);
        }

        let loaded: Vec<_> = opened
            .into_iter()
            .filter(|addon| registry.is_available(&addon.name))
            .collect();

        tracing::info!(
            loaded = loaded.len(),
            rejected = rejected.len(),
            cascaded = cascaded.len(),
            "Addon load stage finished"
        );

        LoadReport {
            loaded,
            rejected,
            cascaded,
        }
    }

    /// Open `addon`'s module and run the ABI gate on it.
    fn open_gated(&self, addon: &AddonRecord) -> Result<L::Handle, AddonError> {
        if addon.library.is_empty() {
            return Err(AddonError::MissingLibrary(addon.name.clone()));
        }

        let module = self.modules.load_module(Path::new(&addon.library))?;
        let version = check_abi_against(&module, self.abi_version)?;

        tracing::debug!(
            addon = %addon.name,
            abi_version = version,
            "Addon module passed ABI check"
        );
        Ok(module)
    }
}

impl<L> std::fmt::Debug for AddonLoader<L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AddonLoader")
            .field("abi_version", &self.abi_version)
            .finish_non_exhaustive()
    }
}
