//! ABI gate for native addon modules.
//!
//! Every native module exports an integer data symbol, [`ABI_VERSION_SYMBOL`],
//! holding the ABI version it was compiled against. A module is accepted when
//! that version is at least [`ADDON_ABI_VERSION`]. Newer modules are accepted
//! too; there is no upper bound.
//!
//! The gate only needs a [`ModuleHandle`], so resolution code and tests never
//! touch a real dynamic loader.

use std::path::Path;

use super::error::AddonError;

/// ABI version of this runtime.
pub const ADDON_ABI_VERSION: i32 = 4;

/// Name of the exported `int` carrying a module's compiled ABI version.
pub const ABI_VERSION_SYMBOL: &str = "ABI_VERSION";

/// Reasons a module fails the ABI gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AbiError {
    #[error("Module does not export ABI_VERSION")]
    MissingSymbol,

    #[error("Module ABI version {found} is older than required {required}")]
    Incompatible { found: i32, required: i32 },
}

/// An opened native module.
pub trait ModuleHandle {
    /// Read the module's exported ABI version.
    fn read_version_symbol(&self) -> Result<i32, AbiError>;
}

/// Opens native modules by path.
pub trait ModuleLoader {
    type Handle: ModuleHandle;

    /// Open the module at `path` without invoking any of its symbols.
    fn load_module(&self, path: &Path) -> Result<Self::Handle, AddonError>;
}

/// Check `handle` against [`ADDON_ABI_VERSION`].
///
/// Returns the module's version on success.
pub fn check_abi<H: ModuleHandle + ?Sized>(handle: &H) -> Result<i32, AbiError> {
    check_abi_against(handle, ADDON_ABI_VERSION)
}

/// Check `handle` against an explicit runtime version.
pub fn check_abi_against<H: ModuleHandle + ?Sized>(
    handle: &H,
    required: i32,
) -> Result<i32, AbiError> {
    let found = handle.read_version_symbol()?;
    if found < required {
        return Err(AbiError::Incompatible { found, required });
    }
    Ok(found)
}

/// Whether `handle` passes the ABI gate.
pub fn is_abi_compatible<H: ModuleHandle + ?Sized>(handle: &H) -> bool {
    check_abi(handle).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeModule(Option<i32>);

    impl ModuleHandle for FakeModule {
        fn read_version_symbol(&self) -> Result<i32, AbiError> {
            self.0.ok_or(AbiError::MissingSymbol)
        }
    }

    #[test]
    fn rejects_module_without_symbol() {
        assert_eq!(check_abi(&FakeModule(None)), Err(AbiError::MissingSymbol));
    }

    #[test]
    fn rejects_older_module() {
        let result = check_abi(&FakeModule(Some(ADDON_ABI_VERSION - 1)));
        assert_eq!(
            result,
            Err(AbiError::Incompatible {
                found: ADDON_ABI_VERSION - 1,
                required: ADDON_ABI_VERSION,
            })
        );
    }

    #[test]
    fn accepts_matching_module() {
        assert_eq!(
            check_abi(&FakeModule(Some(ADDON_ABI_VERSION))),
            Ok(ADDON_ABI_VERSION)
        );
    }

    #[test]
    fn accepts_newer_module() {
        assert!(is_abi_compatible(&FakeModule(Some(ADDON_ABI_VERSION + 1))));
        assert!(is_abi_compatible(&FakeModule(Some(i32::MAX))));
    }

    #[test]
    fn explicit_version_is_respected() {
        assert!(check_abi_against(&FakeModule(Some(7)), 8).is_err());
        assert!(check_abi_against(&FakeModule(Some(8)), 8).is_ok());
    }

    #[test]
    fn error_messages_name_versions() {
        let err = AbiError::Incompatible {
            found: 2,
            required: 4,
        };
        assert_eq!(
            err.to_string(),
            "Module ABI version 2 is older than required 4"
        );
        assert!(AbiError::MissingSymbol.to_string().contains("ABI_VERSION"));
    }
}
