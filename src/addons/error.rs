//! Addon error types.

use std::path::PathBuf;

use super::abi::AbiError;

/// Errors raised while reading descriptors or loading addon modules.
///
/// None of these are fatal to the host: a failing descriptor is skipped and a
/// failing module leaves its addon disabled.
#[derive(Debug, thiserror::Error)]
pub enum AddonError {
    #[error("Failed to read addon descriptor {}: {source}", .path.display())]
    DescriptorIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse addon descriptor {}: {source}", .path.display())]
    DescriptorParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid addon descriptor {}: {reason}", .path.display())]
    InvalidDescriptor { path: PathBuf, reason: String },

    #[error("Addon '{0}' has no library configured")]
    MissingLibrary(String),

    #[error("Failed to load module {}: {reason}", .path.display())]
    ModuleLoad { path: PathBuf, reason: String },

    #[error(transparent)]
    Abi(#[from] AbiError),
}
