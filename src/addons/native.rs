//! Native module loading using libloading.
//!
//! Opening a shared library runs its initialisers, so only trusted addon
//! directories should be handed to [`NativeModuleLoader`].

use std::path::{Path, PathBuf};

use libloading::{Library, Symbol};

use super::abi::{AbiError, ModuleHandle, ModuleLoader, ABI_VERSION_SYMBOL};
use super::error::AddonError;

/// An opened shared library.
pub struct NativeModule {
    path: PathBuf,
    /// Kept alive for as long as any symbol from it may be used
    library: Library,
}

impl NativeModule {
    /// Open the shared library at `path`.
    ///
    /// # Safety
    /// Loading runs arbitrary native code. Only open trusted modules.
    pub unsafe fn open(path: &Path) -> Result<Self, AddonError> {
        // SAFETY: caller guarantees the library is trusted
        let library = unsafe {
            Library::new(path).map_err(|e| AddonError::ModuleLoad {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?
        };

        Ok(Self {
            path: path.to_path_buf(),
            library,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The underlying library, for looking up addon entry points once the
    /// module has passed the ABI gate.
    pub fn library(&self) -> &Library {
        &self.library
    }
}

impl ModuleHandle for NativeModule {
    fn read_version_symbol(&self) -> Result<i32, AbiError> {
        // SAFETY: ABI_VERSION is exported as a C `int` data symbol; the
        // symbol's value is the address of that int.
        let symbol: Symbol<'_, *const i32> = unsafe {
            self.library
                .get(ABI_VERSION_SYMBOL.as_bytes())
                .map_err(|_| AbiError::MissingSymbol)?
        };

        let address = *symbol;
        if address.is_null() {
            return Err(AbiError::MissingSymbol);
        }
        // SAFETY: non-null address of a live static in a library we hold open
        Ok(unsafe { *address })
    }
}

impl std::fmt::Debug for NativeModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeModule")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

/// [`ModuleLoader`] backed by the platform dynamic loader.
#[derive(Debug, Clone)]
pub struct NativeModuleLoader {
    /// Directory for resolving relative library paths
    module_dir: Option<PathBuf>,
}

impl NativeModuleLoader {
    /// Create a loader for trusted modules.
    ///
    /// # Safety
    /// Every library this loader is later asked to open runs native code in
    /// this process. The caller guarantees those libraries are trusted.
    pub unsafe fn trusted(module_dir: Option<PathBuf>) -> Self {
        Self { module_dir }
    }

    /// Resolve an addon's `library` field to a filesystem path.
    pub fn resolve_path(&self, library: &str) -> PathBuf {
        let path = PathBuf::from(library);
        match &self.module_dir {
            Some(dir) if path.is_relative() => dir.join(path),
            _ => path,
        }
    }

    /// Returns the shared library extension on this platform.
    pub fn platform_extension() -> &'static str {
        #[cfg(target_os = "windows")]
        {
            "dll"
        }
        #[cfg(target_os = "macos")]
        {
            "dylib"
        }
        #[cfg(not(any(target_os = "windows", target_os = "macos")))]
        {
            "so"
        }
    }
}

impl ModuleLoader for NativeModuleLoader {
    type Handle = NativeModule;

    fn load_module(&self, path: &Path) -> Result<NativeModule, AddonError> {
        let path = self.resolve_path(&path.to_string_lossy());
        // A bare file name is left to the platform search path.
        if has_directory(&path) && !path.exists() {
            return Err(AddonError::ModuleLoad {
                reason: "file not found".into(),
                path,
            });
        }

        tracing::debug!(module_path = %path.display(), "Opening native addon module");
        // SAFETY: the loader was constructed via `trusted`
        unsafe { NativeModule::open(&path) }
    }
}

fn has_directory(path: &Path) -> bool {
    path.parent().is_some_and(|parent| !parent.as_os_str().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loader(dir: Option<&str>) -> NativeModuleLoader {
        unsafe { NativeModuleLoader::trusted(dir.map(PathBuf::from)) }
    }

    #[test]
    fn relative_library_resolves_against_module_dir() {
        let loader = loader(Some("/usr/lib/addons"));
        assert_eq!(
            loader.resolve_path("xkb.so"),
            PathBuf::from("/usr/lib/addons/xkb.so")
        );
    }

    #[test]
    fn absolute_library_is_kept() {
        let loader = loader(Some("/usr/lib/addons"));
        assert_eq!(loader.resolve_path("/opt/xkb.so"), PathBuf::from("/opt/xkb.so"));
    }

    #[test]
    fn missing_module_is_a_load_error() {
        let loader = loader(None);
        let err = loader
            .load_module(Path::new("/nonexistent/addon.so"))
            .unwrap_err();
        assert!(matches!(err, AddonError::ModuleLoad { .. }));
    }

    #[test]
    fn bare_library_name_is_left_to_the_platform_loader() {
        let loader = loader(None);
        let err = loader
            .load_module(Path::new("libaddonhost-absent.so"))
            .unwrap_err();
        match err {
            AddonError::ModuleLoad { path, reason } => {
                assert_eq!(path, PathBuf::from("libaddonhost-absent.so"));
                assert_ne!(reason, "file not found");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn only_paths_with_a_directory_are_checked_up_front() {
        assert!(!has_directory(Path::new("libfoo.so")));
        assert!(has_directory(Path::new("./libfoo.so")));
        assert!(has_directory(Path::new("/usr/lib/libfoo.so")));
    }

    #[cfg(all(target_os = "linux", target_env = "gnu"))]
    #[test]
    fn system_library_without_version_symbol_is_rejected() {
        let module = loader(None).load_module(Path::new("libc.so.6")).unwrap();
        assert_eq!(module.read_version_symbol(), Err(AbiError::MissingSymbol));
        assert_eq!(
            crate::addons::abi::check_abi(&module),
            Err(AbiError::MissingSymbol)
        );
    }

    #[test]
    fn platform_extension_matches_target() {
        let ext = NativeModuleLoader::platform_extension();
        #[cfg(target_os = "linux")]
        assert_eq!(ext, "so");
        #[cfg(target_os = "macos")]
        assert_eq!(ext, "dylib");
        #[cfg(target_os = "windows")]
        assert_eq!(ext, "dll");
    }
}
