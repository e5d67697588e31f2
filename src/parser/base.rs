//! Nested `xml:base` scope tracking and reference resolution

use url::Url;

/// One `xml:base` scope: the declaring element and its resolved base
#[derive(Debug, Clone, PartialEq)]
struct BaseScope {
    element: String,
    base: Url,
}

/// Stack of nested `xml:base` scopes.
///
/// The top entry is always the innermost currently-open element that
/// declared a base. A declared base resolves against the nearest enclosing
/// resolved base; the outermost declaration must be absolute.
#[derive(Debug, Clone, Default)]
pub struct BaseStack {
    entries: Vec<BaseScope>,
}

impl BaseStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve `declared` and push a scope for `element`.
    ///
    /// Returns false (pushing nothing) when the value cannot be resolved:
    /// a relative base with no enclosing scope, or an unparseable URI.
    pub fn push(&mut self, element: &str, declared: &str) -> bool {
        let resolved = match self.current() {
            Some(enclosing) => enclosing.join(declared),
            None => Url::parse(declared),
        };
        match resolved {
            Ok(base) => {
                self.entries.push(BaseScope {
                    element: element.to_string(),
                    base,
                });
                true
            }
            Err(_) => false,
        }
    }

    /// The innermost active base, if any
    pub fn current(&self) -> Option<&Url> {
        self.entries.last().map(|scope| &scope.base)
    }

    /// Pop the top scope iff it was declared by `element`.
    ///
    /// An element that declared no base of its own must not pop someone
    /// else's scope.
    pub fn pop_if_matches(&mut self, element: &str) {
        if self
            .entries
            .last()
            .is_some_and(|scope| scope.element == element)
        {
            self.entries.pop();
        }
    }

    /// Rewrite an `href`/`src` attribute value against the active base.
    ///
    /// Without an active base, or when resolution fails, the value passes
    /// through unchanged. An absolute reference resolves to itself.
    pub fn resolve_reference(&self, value: &str) -> String {
        match self.current() {
            Some(base) => base
                .join(value)
                .map(String::from)
                .unwrap_or_else(|_| value.to_string()),
            None => value.to_string(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
