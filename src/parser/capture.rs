//! Verbatim markup capture for xhtml/html typed content

use indexmap::IndexMap;

/// Accumulates the serialized inner markup of an element whose `type`
/// attribute flags it as xhtml/html content.
///
/// Only one capture is active at a time; typed elements nested inside an
/// active capture are serialized as plain markup rather than starting a
/// second capture.
#[derive(Debug, Clone)]
pub struct MarkupCapture {
    element: String,
    buf: String,
}

impl MarkupCapture {
    /// Start capturing on behalf of `element`
    pub fn begin(element: impl Into<String>) -> Self {
        Self {
            element: element.into(),
            buf: String::new(),
        }
    }

    /// True when `name` closes the element this capture belongs to
    pub fn is_for(&self, name: &str) -> bool {
        self.element == name
    }

    /// Append a re-serialized open tag
    pub fn open_tag(&mut self, name: &str, attributes: &IndexMap<String, String>) {
        self.buf.push('<');
        self.buf.push_str(name);
        for (attr, value) in attributes {
            self.buf.push(' ');
            self.buf.push_str(attr);
            self.buf.push_str("=\"");
            push_escaped(&mut self.buf, value);
            self.buf.push('"');
        }
        self.buf.push('>');
    }

    /// Append character data unmodified; whitespace inside markup is
    /// significant.
    pub fn text(&mut self, chunk: &str) {
        self.buf.push_str(chunk);
    }

    /// Append a closing tag for a nested element
    pub fn close_tag(&mut self, name: &str) {
        self.buf.push_str("</");
        self.buf.push_str(name);
        self.buf.push('>');
    }

    /// Yield the captured markup
    pub fn finish(self) -> String {
        self.buf
    }
}

fn push_escaped(buf: &mut String, value: &str) {
    for ch in value.chars() {
        match ch {
            '&' => buf.push_str("&amp;"),
            '<' => buf.push_str("&lt;"),
            '"' => buf.push_str("&quot;"),
            _ => buf.push(ch),
        }
    }
}
