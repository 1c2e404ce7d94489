//! Addon record types.
//!
//! An [`AddonRecord`] is born fully populated from a descriptor and lives in
//! exactly one [`AddonRegistry`](super::AddonRegistry) generation. Only the
//! `enabled` flag changes after construction.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Separator used in dependency lists (`"dbus,xkb"`).
pub const DEPENDENCY_SEPARATOR: char = ',';

/// Role an addon plays in the runtime.
///
/// Only [`AddonCategory::Ui`] takes part in resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddonCategory {
    /// Input method engine
    InputMethod,
    /// Frontend bridging clients to the runtime
    Frontend,
    /// General-purpose module
    #[default]
    Module,
    /// User interface; at most one may be active
    Ui,
}

impl AddonCategory {
    pub fn is_ui(self) -> bool {
        matches!(self, Self::Ui)
    }
}

impl std::fmt::Display for AddonCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::InputMethod => "input_method",
            Self::Frontend => "frontend",
            Self::Module => "module",
            Self::Ui => "ui",
        };
        f.write_str(name)
    }
}

/// How an addon's code reaches the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddonType {
    /// Native shared library opened at load time and gated by the ABI check
    #[default]
    SharedLibrary,
    /// Compiled into the host; nothing to open
    Builtin,
}

impl AddonType {
    /// Whether loading this addon requires opening a native module.
    pub fn needs_module(self) -> bool {
        matches!(self, Self::SharedLibrary)
    }
}

impl std::fmt::Display for AddonType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SharedLibrary => f.write_str("shared_library"),
            Self::Builtin => f.write_str("builtin"),
        }
    }
}

/// Callback exported by an addon once it is running.
pub type AddonFunction = Arc<dyn Fn(&[&str]) -> Option<String> + Send + Sync>;

/// Functions an addon registers after it has been loaded.
///
/// Owned by the record; the registry never looks inside.
#[derive(Clone, Default)]
pub struct FunctionList(Vec<AddonFunction>);

impl FunctionList {
    pub fn push(&mut self, function: AddonFunction) {
        self.0.push(function);
    }

    pub fn get(&self, index: usize) -> Option<&AddonFunction> {
        self.0.get(index)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for FunctionList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionList")
            .field("len", &self.0.len())
            .finish()
    }
}

/// One discovered addon.
#[derive(Debug, Clone)]
pub struct AddonRecord {
    /// Unique identifier, also the key used in dependency lists
    pub name: String,
    /// Display name
    pub general_name: String,
    /// Display comment
    pub comment: String,
    pub category: AddonCategory,
    pub addon_type: AddonType,
    /// Whether the addon is currently active
    pub enabled: bool,
    /// Native module path or identifier
    pub library: String,
    /// Lower values resolve and load first
    pub priority: i32,
    pub sub_config: String,
    pub register_method: String,
    pub register_argument: String,
    /// Callbacks registered by the addon after loading
    pub functions: FunctionList,
    dependency: String,
    dependencies: Vec<String>,
}

impl AddonRecord {
    /// Create an enabled addon with no dependencies and priority 0.
    pub fn new(name: impl Into<String>, category: AddonCategory) -> Self {
        let name = name.into();
        Self {
            general_name: name.clone(),
            name,
            comment: String::new(),
            category,
            addon_type: AddonType::default(),
            enabled: true,
            library: String::new(),
            priority: 0,
            sub_config: String::new(),
            register_method: String::new(),
            register_argument: String::new(),
            functions: FunctionList::default(),
            dependency: String::new(),
            dependencies: Vec::new(),
        }
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_type(mut self, addon_type: AddonType) -> Self {
        self.addon_type = addon_type;
        self
    }

    pub fn with_library(mut self, library: impl Into<String>) -> Self {
        self.library = library.into();
        self
    }

    /// Set the dependency list from its comma-separated form.
    pub fn with_dependency(mut self, dependency: impl Into<String>) -> Self {
        self.set_dependency(dependency);
        self
    }

    /// Replace the dependency list, re-tokenising it once.
    pub fn set_dependency(&mut self, dependency: impl Into<String>) {
        self.dependency = dependency.into();
        self.dependencies = parse_dependencies(&self.dependency);
    }

    /// Dependency list exactly as configured.
    pub fn dependency(&self) -> &str {
        &self.dependency
    }

    /// Names of the addons this one requires, in configured order.
    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    pub fn is_ui(&self) -> bool {
        self.category.is_ui()
    }
}

/// Split a dependency list into addon names.
///
/// Tokens are trimmed and empty tokens dropped, so `""` and `" , "` both
/// yield no dependencies.
pub fn parse_dependencies(dependency: &str) -> Vec<String> {
    dependency
        .split(DEPENDENCY_SEPARATOR)
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}
