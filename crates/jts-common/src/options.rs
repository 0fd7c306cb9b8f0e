//! Lowering configuration.
//!
//! Options are read from a JSON object with camelCase keys; every key is
//! optional and falls back to the value in `LoweringOptions::default()`.
//!
//! ```json
//! {
//!     "captureSuffix": "_this",
//!     "externalTypes": ["java.util.List"],
//!     "parallel": true
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// Identifiers that are legal Java names but reserved in the target language.
pub const DEFAULT_RESERVED_IDENTIFIERS: &[&str] = &[
    "in",
    "function",
    "var",
    "let",
    "typeof",
    "delete",
    "with",
    "yield",
    "export",
    "debugger",
    "arguments",
    "eval",
    "await",
];

/// Simple names implicitly visible from `java.lang`.
pub const DEFAULT_AMBIENT_TYPES: &[&str] = &[
    "Object",
    "String",
    "StringBuilder",
    "Math",
    "System",
    "Integer",
    "Long",
    "Short",
    "Byte",
    "Float",
    "Double",
    "Boolean",
    "Character",
    "Number",
    "Runnable",
    "Iterable",
    "Comparable",
    "CharSequence",
    "Thread",
    "Exception",
    "RuntimeException",
    "Error",
    "Throwable",
    "IllegalArgumentException",
    "IllegalStateException",
    "NullPointerException",
    "UnsupportedOperationException",
    "Override",
    "Deprecated",
    "SuppressWarnings",
];

/// Fully qualified external types known to be interfaces.
pub const DEFAULT_EXTERNAL_INTERFACES: &[&str] = &[
    "java.lang.Runnable",
    "java.lang.Iterable",
    "java.lang.Comparable",
    "java.lang.CharSequence",
    "java.lang.AutoCloseable",
    "java.util.List",
    "java.util.Map",
    "java.util.Set",
    "java.util.Collection",
    "java.util.Comparator",
    "java.util.Iterator",
];

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LoweringOptions {
    /// Suffix of enclosing-instance capture slots (`Outer` + suffix).
    pub capture_suffix: String,
    /// Capture slot name used by anonymous units for their creating `this`.
    pub anonymous_capture_name: String,
    /// Prefix of captured-local slots.
    pub local_capture_prefix: String,
    /// Separator between a method name and its overload index.
    pub overload_separator: String,
    /// Base name of constructor implementations in an overloaded constructor group.
    pub constructor_impl_name: String,
    /// Local names that must be escaped with a leading underscore.
    pub reserved_identifiers: Vec<String>,
    /// Simple names resolved as `java.lang.<name>`.
    pub ambient_types: Vec<String>,
    /// Fully qualified types available on the classpath (used for asterisk imports).
    pub external_types: Vec<String>,
    /// Fully qualified external types that are interfaces.
    pub external_interfaces: Vec<String>,
    /// Bind otherwise-unresolved names to members inherited from external superclasses.
    pub assume_external_members: bool,
    /// Downgrade unsupported constructs to warnings instead of failing.
    pub ignore_unsupported: bool,
    /// Qualify type units on the rayon thread pool.
    pub parallel: bool,
}

impl Default for LoweringOptions {
    fn default() -> Self {
        Self {
            capture_suffix: "_this".to_string(),
            anonymous_capture_name: "__this".to_string(),
            local_capture_prefix: "val$".to_string(),
            overload_separator: "$".to_string(),
            constructor_impl_name: "constructor".to_string(),
            reserved_identifiers: DEFAULT_RESERVED_IDENTIFIERS
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
            ambient_types: DEFAULT_AMBIENT_TYPES
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
            external_types: Vec::new(),
            external_interfaces: DEFAULT_EXTERNAL_INTERFACES
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
            assume_external_members: true,
            ignore_unsupported: true,
            parallel: false,
        }
    }
}

impl LoweringOptions {
    /// Parse options from a JSON object.
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn is_reserved(&self, name: &str) -> bool {
        self.reserved_identifiers.iter().any(|r| r == name)
    }

    /// Escape a local name that collides with a reserved word (`in` -> `_in`).
    pub fn escape_identifier<'n>(&self, name: &'n str) -> Cow<'n, str> {
        if self.is_reserved(name) {
            Cow::Owned(format!("_{name}"))
        } else {
            Cow::Borrowed(name)
        }
    }

    /// `java.lang.<name>` when `name` is an ambient type.
    pub fn ambient_type_path(&self, name: &str) -> Option<String> {
        self.ambient_types
            .iter()
            .any(|t| t == name)
            .then(|| format!("java.lang.{name}"))
    }

    pub fn is_external_type(&self, path: &str) -> bool {
        self.external_types.iter().any(|t| t == path)
    }

    pub fn is_external_interface(&self, path: &str) -> bool {
        self.external_interfaces.iter().any(|t| t == path)
    }

    /// Emitted name of overload implementation `index` of `name`.
    pub fn overload_impl_name(&self, name: &str, index: usize) -> String {
        format!("{name}{}{index}", self.overload_separator)
    }
}
