//! Addon system.
//!
//! Discovers addon descriptors, decides which addons may be active and gates
//! native modules by ABI version before they are used.
//!
//! # Flow
//!
//! 1. **Discovery**: one [`AddonRecord`] per descriptor ([`load_descriptors`])
//! 2. **Registry**: records are loaded and sorted by priority ([`AddonRegistry`])
//! 3. **Resolution**: at most one UI addon stays enabled, then addons with
//!    unavailable dependencies are disabled until a fixpoint ([`resolve`])
//! 4. **Load**: each enabled native module passes the ABI gate before use
//!    ([`AddonLoader`], [`check_abi`])
//! 5. **Publication**: the finished generation is swapped in for readers
//!    ([`AddonHost`])
//!
//! Resolution never fails. Every outcome is an `enabled` flag plus a log line.
//!
//! # Example Descriptor
//!
//! ```toml
//! [addon]
//! name = "kimpanel"
//! category = "ui"
//! library = "addon-kimpanel.so"
//! dependency = "dbus"
//! priority = 100
//! ```

pub mod abi;
pub mod descriptor;
pub mod error;
pub mod host;
pub mod loader;
pub mod native;
pub mod record;
pub mod registry;
pub mod resolver;

pub use abi::{
    check_abi, is_abi_compatible, AbiError, ModuleHandle, ModuleLoader, ABI_VERSION_SYMBOL,
    ADDON_ABI_VERSION,
};
pub use descriptor::{load_descriptor, load_descriptors, AddonDescriptor};
pub use error::AddonError;
pub use host::AddonHost;
pub use loader::{AddonLoader, LoadReport, LoadedAddon, RejectedAddon};
pub use native::{NativeModule, NativeModuleLoader};
pub use record::{AddonCategory, AddonFunction, AddonRecord, AddonType, FunctionList};
pub use registry::AddonRegistry;
pub use resolver::{
    dependency_pass, disable_unsatisfied, enforce_single_ui, resolve, DisableReason,
    DisabledAddon, Fixpoint, Resolution,
};
