//! Dependency resolution over an [`AddonRegistry`].
//!
//! Resolution runs in two phases, both mutating `enabled` flags in place:
//!
//! 1. **UI exclusivity**: at most one `Ui` addon stays enabled.
//! 2. **Dependency fixpoint**: full passes over the registry disable every
//!    enabled addon with a dependency that is not available, until a pass
//!    disables nothing.
//!
//! Flags only ever go from enabled to disabled in phase 2, so the loop ends
//! after at most `len + 1` passes. Mutually dependent addons that are
//! otherwise satisfied stay enabled; there is no cycle detection.

use super::record::AddonRecord;
use super::registry::AddonRegistry;

/// Why resolution turned an addon off.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisableReason {
    /// Another UI addon was selected
    UiNotSelected,
    /// A dependency was missing or disabled
    UnsatisfiedDependency {
        /// Full dependency list as configured
        dependency: String,
        /// First token found unavailable
        missing: String,
    },
}

impl std::fmt::Display for DisableReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UiNotSelected => f.write_str("another UI addon is active"),
            Self::UnsatisfiedDependency { dependency, missing } => {
                write!(f, "dependency {dependency} can not be satisfied ({missing})")
            }
        }
    }
}

/// An addon switched off during resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisabledAddon {
    pub name: String,
    pub reason: DisableReason,
}

/// Outcome of the dependency fixpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fixpoint {
    /// Addons disabled, in the order they were disabled
    pub disabled: Vec<DisabledAddon>,
    /// Passes run, including the final pass that changed nothing
    pub passes: usize,
}

/// Outcome of a full resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    /// The UI addon left enabled, if any
    pub active_ui: Option<String>,
    /// Every addon disabled by either phase
    pub disabled: Vec<DisabledAddon>,
    /// Passes run by the dependency fixpoint
    pub passes: usize,
}

impl Resolution {
    /// Whether `name` was disabled by this resolution.
    pub fn was_disabled(&self, name: &str) -> bool {
        self.disabled.iter().any(|d| d.name == name)
    }
}

/// Run both resolution phases on `registry`.
///
/// # Arguments
///
/// * `registry` - Registry to resolve, already sorted by priority
/// * `preferred_ui` - Externally configured UI addon name, if any
pub fn resolve(registry: &mut AddonRegistry, preferred_ui: Option<&str>) -> Resolution {
    let mut disabled = enforce_single_ui(registry, preferred_ui);
    let fixpoint = disable_unsatisfied(registry);
    disabled.extend(fixpoint.disabled);

    let active_ui = registry
        .enabled()
        .find(|addon| addon.is_ui())
        .map(|addon| addon.name.clone());

    if active_ui.is_none() {
        tracing::debug!("No UI addon enabled after resolution");
    }

    Resolution {
        active_ui,
        disabled,
        passes: fixpoint.passes,
    }
}

/// Phase 1: leave at most one UI addon enabled.
///
/// Without a preference the first enabled UI addon in registry order wins and
/// every later one is turned off. With a preference the named UI addon is
/// forced on and every other UI addon forced off, whatever their configured
/// flags. Non-UI addons are untouched.
pub fn enforce_single_ui(
    registry: &mut AddonRegistry,
    preferred_ui: Option<&str>,
) -> Vec<DisabledAddon> {
    let mut disabled = Vec::new();
    let mut found_ui = false;

    for addon in registry.records_mut().iter_mut().filter(|a| a.is_ui()) {
        let keep = match preferred_ui {
            Some(preferred) => addon.name == preferred,
            None if addon.enabled && !found_ui => {
                found_ui = true;
                true
            }
            None => false,
        };

        if keep && !addon.enabled {
            tracing::debug!(addon = %addon.name, "Enabling preferred UI addon");
        }
        if !keep && addon.enabled {
            tracing::debug!(addon = %addon.name, "Disabling UI addon, another UI is active");
            disabled.push(DisabledAddon {
                name: addon.name.clone(),
                reason: DisableReason::UiNotSelected,
            });
        }
        addon.enabled = keep;
    }

    disabled
}

/// Phase 2: disable addons with unavailable dependencies until nothing changes.
///
/// Addons already disabled are skipped and never re-enabled. A dependency on
/// the addon itself is satisfied while the addon is enabled.
pub fn disable_unsatisfied(registry: &mut AddonRegistry) -> Fixpoint {
    let mut fixpoint = Fixpoint::default();

    loop {
        fixpoint.passes += 1;
        let disabled = dependency_pass(registry);
        if disabled.is_empty() {
            return fixpoint;
        }
        fixpoint.disabled.extend(disabled);
    }
}

/// One pass of phase 2 over the registry in order.
///
/// Returns the addons this pass disabled; an empty result means the registry
/// has reached its fixpoint.
pub fn dependency_pass(registry: &mut AddonRegistry) -> Vec<DisabledAddon> {
    let mut disabled = Vec::new();

    for index in 0..registry.len() {
        let Some(missing) = first_unavailable(registry, &registry.records()[index]) else {
            continue;
        };

        let addon = &mut registry.records_mut()[index];
        addon.enabled = false;

        tracing::warn!(
            addon = %addon.name,
            dependency = %addon.dependency(),
            missing = %missing,
            "Disable addon, dependency can not be satisfied"
        );
        disabled.push(DisabledAddon {
            name: addon.name.clone(),
            reason: DisableReason::UnsatisfiedDependency {
                dependency: addon.dependency().to_string(),
                missing,
            },
        });
    }

    disabled
}

/// First dependency of an enabled `addon` that `registry` cannot provide.
pub(crate) fn first_unavailable(registry: &AddonRegistry, addon: &AddonRecord) -> Option<String> {
    if !addon.enabled {
        return None;
    }
    addon
        .dependencies()
        .iter()
        .find(|dependency| !registry.is_available(dependency))
        .cloned()
}
