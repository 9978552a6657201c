//! Runtime environment consulted by conditions and fillers.
//!
//! Two lookups make up the environment:
//! - [`PropertySource`]: configuration properties (`has` / `get`)
//! - [`CapabilityProbe`]: whether an optional runtime capability is available
//!
//! Both are read-only once assembly has finished, so an [`Environment`] can be
//! shared across tasks without locking.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use tracing::debug;

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

/// Key/value configuration lookup.
pub trait PropertySource: Send + Sync {
    /// Returns the value for `key`, if present.
    fn get(&self, key: &str) -> Option<&str>;

    /// Returns true when `key` is present.
    fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }
}

/// In-memory property set, typically built from the `[properties]` table of
/// the config file and an optional `.env` file.
#[derive(Clone, Default)]
pub struct Properties {
    vars: BTreeMap<String, String>,
}

impl std::fmt::Debug for Properties {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Properties")
            .field("keys", &self.vars.keys().collect::<Vec<_>>())
            .field("values", &"[REDACTED]")
            .finish()
    }
}

impl Properties {
    /// Build properties from a key-value map.
    pub fn from_map(vars: BTreeMap<String, String>) -> Self {
        Self { vars }
    }

    /// Merge `other` into `self`; keys already present are kept.
    pub fn merge_missing(&mut self, other: Properties) {
        for (key, value) in other.vars {
            self.vars.entry(key).or_insert(value);
        }
    }

    /// Number of properties.
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    /// Returns true when no property is set.
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

impl PropertySource for Properties {
    fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }
}

impl<const N: usize> From<[(&str, &str); N]> for Properties {
    fn from(pairs: [(&str, &str); N]) -> Self {
        Self {
            vars: pairs
                .into_iter()
                .map(|(k, v)| (k.to_owned(), v.to_owned()))
                .collect(),
        }
    }
}

/// Load properties from a `.env`-style file.
///
/// # Errors
///
/// Returns an error if the file does not exist or an entry cannot be parsed.
pub fn load_properties(path: &Path) -> anyhow::Result<Properties> {
    if !path.exists() {
        return Err(anyhow::anyhow!(
            "properties file does not exist: {}",
            path.display()
        ));
    }

    let mut vars = BTreeMap::new();
    let iter = dotenvy::from_path_iter(path)
        .with_context(|| format!("failed to read properties at {}", path.display()))?;

    for item in iter {
        let (key, value) = item.with_context(|| {
            format!(
                "failed to parse key-value entry in properties file {}",
                path.display()
            )
        })?;
        vars.insert(key, value);
    }

    debug!(path = %path.display(), count = vars.len(), "properties file loaded");
    Ok(Properties { vars })
}

// ---------------------------------------------------------------------------
// Capabilities
// ---------------------------------------------------------------------------

/// Capability name reported when the HTTP webhook transport is compiled in.
pub const CAPABILITY_HTTP: &str = "http";

/// Capability name reported when the template engine is compiled in.
pub const CAPABILITY_TEMPLATES: &str = "templates";

/// Tests whether an optional runtime capability is available.
///
/// A missing capability is a normal `false`, never an error.
pub trait CapabilityProbe: Send + Sync {
    /// Returns true when the named capability is available.
    fn is_available(&self, name: &str) -> bool;
}

/// Statically declared capability set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Capabilities {
    names: BTreeSet<String>,
}

impl Capabilities {
    /// Capabilities compiled into this build (one per enabled optional feature).
    pub fn detect() -> Self {
        let mut names = BTreeSet::new();
        if cfg!(feature = "webhook") {
            names.insert(CAPABILITY_HTTP.to_owned());
        }
        if cfg!(feature = "templates") {
            names.insert(CAPABILITY_TEMPLATES.to_owned());
        }
        Self { names }
    }

    /// An empty capability set.
    pub fn none() -> Self {
        Self::default()
    }

    /// Add a capability.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>) -> Self {
        self.names.insert(name.into());
        self
    }

    /// Remove a capability (used to disable a compiled-in transport from config).
    #[must_use]
    pub fn without(mut self, name: &str) -> Self {
        self.names.remove(name);
        self
    }

    /// Available capability names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

impl CapabilityProbe for Capabilities {
    fn is_available(&self, name: &str) -> bool {
        self.names.contains(name)
    }
}

// ---------------------------------------------------------------------------
// Environment
// ---------------------------------------------------------------------------

/// Properties and capabilities captured at assembly time.
#[derive(Clone)]
pub struct Environment {
    properties: Arc<dyn PropertySource>,
    capabilities: Arc<dyn CapabilityProbe>,
}

impl std::fmt::Debug for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Environment").finish_non_exhaustive()
    }
}

impl Environment {
    /// Create an environment from a property source and a capability probe.
    pub fn new(
        properties: Arc<dyn PropertySource>,
        capabilities: Arc<dyn CapabilityProbe>,
    ) -> Self {
        Self {
            properties,
            capabilities,
        }
    }

    /// Environment over `properties` with the compiled-in capabilities.
    pub fn from_properties(properties: Properties) -> Self {
        Self::new(Arc::new(properties), Arc::new(Capabilities::detect()))
    }

    /// Property lookup.
    pub fn properties(&self) -> &dyn PropertySource {
        &*self.properties
    }

    /// Shared handle to the property lookup.
    pub fn properties_handle(&self) -> Arc<dyn PropertySource> {
        Arc::clone(&self.properties)
    }

    /// Capability lookup.
    pub fn capabilities(&self) -> &dyn CapabilityProbe {
        &*self.capabilities
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::from_properties(Properties::default())
    }
}
