//! Tree types for normalized feed documents

use indexmap::map::{IntoIter, Iter, Keys};
use indexmap::IndexMap;
use std::ops::Index;

/// A finalized tree value: a bare text scalar, a structured element, or an
/// ordered sequence of same-named siblings.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Text-only leaf collapsed to its trimmed character content
    Text(String),
    /// Structured element (attributes and/or children present)
    Element(Element),
    /// Same-named siblings in document order
    List(Vec<Value>),
}

impl Value {
    /// Returns true if this value is a text scalar
    pub fn is_text(&self) -> bool {
        matches!(self, Self::Text(_))
    }

    /// Returns true if this value is a structured element
    pub fn is_element(&self) -> bool {
        matches!(self, Self::Element(_))
    }

    /// Returns true if this value is a sibling sequence
    pub fn is_list(&self) -> bool {
        matches!(self, Self::List(_))
    }

    /// Returns the text if this is a scalar, None otherwise
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the element if this is structured, None otherwise
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Self::Element(el) => Some(el),
            _ => None,
        }
    }

    /// Returns the sequence if this is one, None otherwise
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(seq) => Some(seq),
            _ => None,
        }
    }

    /// Character content of this value: the scalar itself, or a structured
    /// element's trimmed text. A sequence yields its first entry's content.
    pub fn content(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Element(el) => Some(el.text.as_str()),
            Self::List(seq) => seq.first().and_then(Value::content),
        }
    }

    /// Child lookup that sees through the element variant
    pub fn child(&self, name: &str) -> Option<&Value> {
        self.as_element().and_then(|el| el.children.get(name))
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<Element> for Value {
    fn from(value: Element) -> Self {
        Self::Element(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(values: Vec<Value>) -> Self {
        Self::List(values)
    }
}

impl Index<&str> for Value {
    type Output = Value;

    /// Panics when the value is not an element or the child is absent.
    #[allow(clippy::panic)]
    fn index(&self, name: &str) -> &Self::Output {
        match self.child(name) {
            Some(v) => v,
            None => panic!("no child named {name:?}"),
        }
    }
}

impl Index<usize> for Value {
    type Output = Value;

    /// Panics when the value is not a sequence or the index is out of range.
    #[allow(clippy::indexing_slicing)]
    fn index(&self, index: usize) -> &Self::Output {
        match self {
            Self::List(seq) => &seq[index],
            other => panic!("cannot index {other:?} by position"),
        }
    }
}

/// A namespace declared on the document root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Namespace {
    /// Prefix, or None for the default namespace
    pub prefix: Option<String>,
    pub uri: String,
}

/// One XML element during or after construction
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Element {
    /// Lowercased, prefix-qualified tag name (`"atom:link"`, `"item"`)
    pub name: String,
    /// Attribute name to trimmed value, in document order
    pub attributes: IndexMap<String, String>,
    /// Accumulated character content, trimmed at finalization
    pub text: String,
    /// Captured verbatim inner markup, present only for xhtml/html content
    pub raw: Option<String>,
    /// Finalized children keyed by qualified name
    pub children: Children,
    /// Namespace mappings declared on this element; recorded on the root only
    pub namespaces: Vec<Namespace>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Returns an attribute value by qualified name
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Finalize into a tree value, collapsing a text-only leaf to a scalar.
    ///
    /// An element with attributes, children, or captured markup never
    /// collapses; neither does one whose trimmed text is empty.
    pub fn into_value(self) -> Value {
        if self.attributes.is_empty()
            && self.children.is_empty()
            && self.raw.is_none()
            && !self.text.is_empty()
        {
            Value::Text(self.text)
        } else {
            Value::Element(self)
        }
    }
}

/// Ordered children of an element, keyed by qualified name.
///
/// The only mutation entry point is [`Children::append`], which turns the
/// slot for a repeated name into a sequence in encounter order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Children(IndexMap<String, Value>);

impl Children {
    pub fn new() -> Self {
        Self(IndexMap::new())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn keys(&self) -> Keys<'_, String, Value> {
        self.0.keys()
    }

    pub fn iter(&self) -> Iter<'_, String, Value> {
        self.0.iter()
    }

    /// Attach a finalized child under `name`.
    ///
    /// The first child for a name occupies the slot directly; a second
    /// same-named sibling converts it into a sequence before appending, and
    /// later siblings push in document order.
    pub fn append(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        match self.0.get_mut(&name) {
            None => {
                self.0.insert(name, value);
            }
            Some(Value::List(seq)) => seq.push(value),
            Some(existing) => {
                let first = std::mem::replace(existing, Value::List(Vec::with_capacity(2)));
                if let Value::List(seq) = existing {
                    seq.push(first);
                    seq.push(value);
                }
            }
        }
    }

    /// Every value stored under `name`, flattening a sequence slot
    pub fn occurrences<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a Value> {
        const EMPTY: &[Value] = &[];
        let (single, seq) = match self.0.get(name) {
            Some(Value::List(seq)) => (None, seq.as_slice()),
            Some(single) => (Some(single), EMPTY),
            None => (None, EMPTY),
        };
        single.into_iter().chain(seq.iter())
    }
}

impl Index<&str> for Children {
    type Output = Value;

    #[allow(clippy::indexing_slicing)]
    fn index(&self, name: &str) -> &Self::Output {
        &self.0[name]
    }
}

impl<'a> IntoIterator for &'a Children {
    type Item = (&'a String, &'a Value);
    type IntoIter = Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl IntoIterator for Children {
    type Item = (String, Value);
    type IntoIter = IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl FromIterator<(String, Value)> for Children {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(IndexMap::from_iter(iter))
    }
}

/// A finalized document: the root element's name mapped to its value
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    name: String,
    root: Value,
}

impl Document {
    pub fn new(name: impl Into<String>, root: Value) -> Self {
        Self {
            name: name.into(),
            root,
        }
    }

    /// Qualified name of the root element
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn root(&self) -> &Value {
        &self.root
    }

    /// The root as a structured element, when it did not collapse to text
    pub fn root_element(&self) -> Option<&Element> {
        self.root.as_element()
    }

    pub fn into_parts(self) -> (String, Value) {
        (self.name, self.root)
    }
}

#[cfg(feature = "serde")]
mod ser {
    use super::{Document, Element, Value};
    use serde::ser::{Serialize, SerializeMap, Serializer};

    impl Serialize for Value {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            match self {
                Self::Text(s) => serializer.serialize_str(s),
                Self::Element(el) => el.serialize(serializer),
                Self::List(seq) => seq.serialize(serializer),
            }
        }
    }

    impl Serialize for Element {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            let mut entries = 0;
            if !self.attributes.is_empty() {
                entries += 1;
            }
            if !self.text.is_empty() {
                entries += 1;
            }
            entries += self.children.len();

            let mut map = serializer.serialize_map(Some(entries))?;
            if !self.attributes.is_empty() {
                map.serialize_entry("@", &self.attributes)?;
            }
            if !self.text.is_empty() {
                map.serialize_entry("#", &self.text)?;
            }
            for (name, child) in &self.children {
                map.serialize_entry(name, child)?;
            }
            map.end()
        }
    }

    impl Serialize for Document {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            let mut map = serializer.serialize_map(Some(1))?;
            map.serialize_entry(&self.name, &self.root)?;
            map.end()
        }
    }
}
