//! Per-session parse configuration

use indexmap::IndexMap;

/// Configuration for one parse session.
///
/// The extension map is merged into every node whose qualified name is
/// listed in `applies_to`, at node creation time. A key already present
/// among the node's own attributes or children is left alone.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Config {
    extensions: IndexMap<String, String>,
    applies_to: Vec<String>,
}

impl Config {
    /// Config with no extensions; item and entry nodes are the default
    /// merge targets once an extension is added.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one extension entry
    pub fn with_extension(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extensions.insert(key.into(), value.into());
        self
    }

    /// Replace the element names extensions apply to
    pub fn with_applies_to<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.applies_to = names.into_iter().map(Into::into).collect();
        self
    }

    /// True when extensions should be merged into an element named `name`
    pub fn applies_to(&self, name: &str) -> bool {
        if self.extensions.is_empty() {
            return false;
        }
        if self.applies_to.is_empty() {
            return name == "item" || name == "entry";
        }
        self.applies_to.iter().any(|n| n == name)
    }

    pub fn extensions(&self) -> &IndexMap<String, String> {
        &self.extensions
    }
}
