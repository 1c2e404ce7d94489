//! addonhost
//!
//! Addon registry for a modular runtime: discovers addon descriptors,
//! resolves which addons may be active under user configuration, dependency
//! constraints and the single-active-UI rule, and gates native modules by
//! ABI version before they are used.
//!
//! ```
//! use addonhost::addons::{resolve, AddonCategory, AddonRecord, AddonRegistry};
//!
//! let mut registry = AddonRegistry::from_records(vec![
//!     AddonRecord::new("dbus", AddonCategory::Module),
//!     AddonRecord::new("kimpanel", AddonCategory::Ui).with_dependency("dbus"),
//!     AddonRecord::new("remote", AddonCategory::Module).with_dependency("missing"),
//! ]);
//! let resolution = resolve(&mut registry, None);
//!
//! assert_eq!(resolution.active_ui.as_deref(), Some("kimpanel"));
//! assert!(!registry.is_available("remote"));
//! ```

pub mod addons;
pub mod config;

pub use addons::{AddonHost, AddonRecord, AddonRegistry};
pub use config::HostConfig;
