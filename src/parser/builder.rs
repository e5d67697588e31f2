//! The tree-building state machine driven by SAX events

use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::error::{Advisory, Error, ErrorKind, Result};
use crate::parser::base::BaseStack;
use crate::parser::capture::MarkupCapture;
use crate::parser::config::Config;
use crate::parser::events::{SaxAttribute, SaxEvent};
use crate::value::{Document, Element, Namespace, Value};

/// Machine state across the document lifecycle
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    AwaitingDocument,
    Building,
    Done,
}

/// A completed parse: the document plus any non-fatal diagnostics
/// recorded along the way.
#[derive(Debug, Clone, PartialEq)]
pub struct Parsed {
    pub document: Document,
    pub advisories: Vec<Advisory>,
}

impl Parsed {
    /// True when the parse completed without a single advisory
    pub fn is_clean(&self) -> bool {
        self.advisories.is_empty()
    }
}

/// Single-pass tree builder.
///
/// Consumes [`SaxEvent`]s in document order and maintains a stack of
/// in-progress elements. Decisions that cannot be revisited (scalar vs.
/// object, single vs. sequence) are made at each end-element event.
/// All session state lives here; a builder is owned by one parse and can
/// simply be dropped to abandon it.
#[derive(Debug)]
pub struct TreeBuilder {
    state: State,
    stack: Vec<Element>,
    bases: BaseStack,
    capture: Option<MarkupCapture>,
    config: Config,
    document: Option<Document>,
    advisories: Vec<Advisory>,
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        Self {
            state: State::AwaitingDocument,
            stack: Vec::new(),
            bases: BaseStack::new(),
            capture: None,
            config,
            document: None,
            advisories: Vec::new(),
        }
    }

    /// Feed one event. Fatal structural conditions surface as `Err`;
    /// everything else either mutates the tree or records an advisory.
    pub fn handle(&mut self, event: SaxEvent) -> Result<()> {
        match event {
            SaxEvent::StartDocument => self.start_document(),
            SaxEvent::StartElement {
                name,
                attributes,
                namespaces,
            } => self.start_element(&name.qualified(), attributes, namespaces),
            SaxEvent::Characters(chunk) | SaxEvent::CData(chunk) => {
                self.characters(&chunk);
                Ok(())
            }
            SaxEvent::EndElement { name } => self.end_element(&name.qualified()),
            SaxEvent::EndDocument => self.end_document(),
            SaxEvent::Warning(message) => {
                self.advise(Advisory::warning(message));
                Ok(())
            }
            SaxEvent::Error(message) => {
                self.advise(Advisory::error(message));
                Ok(())
            }
        }
    }

    /// Consume the builder after `EndDocument`, yielding the result
    pub fn finish(self) -> Result<Parsed> {
        match (self.state, self.document) {
            (State::Done, Some(document)) => Ok(Parsed {
                document,
                advisories: self.advisories,
            }),
            _ => Err(Error::new(ErrorKind::EmptyDocument)),
        }
    }

    /// Advisories recorded so far
    pub fn advisories(&self) -> &[Advisory] {
        &self.advisories
    }

    fn start_document(&mut self) -> Result<()> {
        match self.state {
            State::AwaitingDocument => {
                self.state = State::Building;
                Ok(())
            }
            _ => Err(Error::with_message(
                ErrorKind::Malformed,
                "unexpected start of document",
            )),
        }
    }

    fn start_element(
        &mut self,
        name: &str,
        attributes: Vec<SaxAttribute>,
        namespaces: Vec<Namespace>,
    ) -> Result<()> {
        match self.state {
            State::Building => {}
            State::Done => return Err(Error::new(ErrorKind::MultipleRoots)),
            State::AwaitingDocument => {
                return Err(Error::with_message(
                    ErrorKind::Malformed,
                    "element before start of document",
                ))
            }
        }

        let attrs = self.process_attributes(attributes);

        if let Some(capture) = self.capture.as_mut() {
            capture.open_tag(name, &attrs);
            return Ok(());
        }

        if let Some(declared) = attrs.get("xml:base") {
            if !self.bases.push(name, declared) {
                self.advise(Advisory::warning(format!(
                    "unresolvable xml:base {declared:?} on <{name}>"
                )));
            }
        }

        if matches!(attrs.get("type").map(String::as_str), Some("xhtml" | "html")) {
            self.capture = Some(MarkupCapture::begin(name));
        }

        let mut node = Element::new(name);
        node.attributes = attrs;
        if self.stack.is_empty() {
            node.namespaces = namespaces;
        }
        if self.config.applies_to(&node.name) {
            for (key, value) in self.config.extensions() {
                if !node.attributes.contains_key(key) && !node.children.contains_key(key) {
                    node.children.append(key.clone(), Value::Text(value.clone()));
                }
            }
        }
        self.stack.push(node);
        Ok(())
    }

    fn characters(&mut self, chunk: &str) {
        if let Some(capture) = self.capture.as_mut() {
            capture.text(chunk);
        } else if let Some(top) = self.stack.last_mut() {
            top.text.push_str(chunk);
        } else if !chunk.trim().is_empty() {
            self.advise(Advisory::warning("character data outside document root"));
        }
    }

    fn end_element(&mut self, name: &str) -> Result<()> {
        if let Some(capture) = self.capture.as_mut() {
            if !capture.is_for(name) {
                capture.close_tag(name);
                return Ok(());
            }
        }
        if let Some(capture) = self.capture.take() {
            // capture ends with this element
            let markup = capture.finish();
            match self.stack.last_mut() {
                Some(node) => {
                    node.text.push_str(&markup);
                    node.raw = Some(markup);
                }
                None => {
                    return Err(Error::new(ErrorKind::StructuralUnderflow {
                        element: name.to_string(),
                    }))
                }
            }
        }

        let Some(mut node) = self.stack.pop() else {
            return Err(Error::new(ErrorKind::StructuralUnderflow {
                element: name.to_string(),
            }));
        };

        if node.name != name {
            self.advise(Advisory::warning(format!(
                "mismatched closing tag </{name}>, open element was <{}>",
                node.name
            )));
        }

        self.bases.pop_if_matches(&node.name);

        let trimmed = node.text.trim();
        if trimmed.len() != node.text.len() {
            node.text = trimmed.to_string();
        }

        let key = node.name.clone();
        let value = node.into_value();

        match self.stack.last_mut() {
            Some(parent) => parent.children.append(key, value),
            None => {
                debug!(root = %key, "document root closed");
                self.document = Some(Document::new(key, value));
                self.state = State::Done;
            }
        }
        Ok(())
    }

    fn end_document(&mut self) -> Result<()> {
        match self.state {
            State::Done => Ok(()),
            State::Building => match self.stack.last() {
                Some(open) => Err(Error::new(ErrorKind::UnexpectedEof {
                    expected: format!("closing tag </{}>", open.name),
                })),
                None => Err(Error::new(ErrorKind::EmptyDocument)),
            },
            State::AwaitingDocument => Err(Error::new(ErrorKind::EmptyDocument)),
        }
    }

    /// Qualify attribute names (prefix lowercased, local name preserved),
    /// trim values, and rewrite href/src against the active base.
    fn process_attributes(&mut self, attributes: Vec<SaxAttribute>) -> IndexMap<String, String> {
        let mut out = IndexMap::with_capacity(attributes.len());
        for attr in attributes {
            let key = match attr.prefix {
                Some(prefix) => format!("{}:{}", prefix.to_lowercase(), attr.local),
                None => attr.local,
            };
            let mut value = attr.value.trim().to_string();
            if key == "href" || key == "src" {
                value = self.bases.resolve_reference(&value);
            }
            out.insert(key, value);
        }
        out
    }

    fn advise(&mut self, advisory: Advisory) {
        warn!(%advisory, "parse advisory");
        self.advisories.push(advisory);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::events::{QualifiedName, SaxAttribute};

    fn start(name: &str) -> SaxEvent {
        SaxEvent::StartElement {
            name: QualifiedName::local(name),
            attributes: Vec::new(),
            namespaces: Vec::new(),
        }
    }

    fn start_with(name: &str, attrs: &[(&str, &str)]) -> SaxEvent {
        SaxEvent::StartElement {
            name: QualifiedName::local(name),
            attributes: attrs
                .iter()
                .map(|(k, v)| SaxAttribute {
                    local: (*k).to_string(),
                    prefix: None,
                    value: (*v).to_string(),
                })
                .collect(),
            namespaces: Vec::new(),
        }
    }

    fn end(name: &str) -> SaxEvent {
        SaxEvent::EndElement {
            name: QualifiedName::local(name),
        }
    }

    fn chars(text: &str) -> SaxEvent {
        SaxEvent::Characters(text.to_string())
    }

    fn run(events: Vec<SaxEvent>) -> Result<Parsed> {
        run_with_config(Config::default(), events)
    }

    fn run_with_config(config: Config, events: Vec<SaxEvent>) -> Result<Parsed> {
        let mut builder = TreeBuilder::with_config(config);
        builder.handle(SaxEvent::StartDocument)?;
        for event in events {
            builder.handle(event)?;
        }
        builder.handle(SaxEvent::EndDocument)?;
        builder.finish()
    }

    #[test]
    fn test_single_scalar_root() -> Result<()> {
        let parsed = run(vec![start("title"), chars("  Feed  "), end("title")])?;
        assert_eq!(parsed.document.name(), "title");
        assert_eq!(parsed.document.root().as_text(), Some("Feed"));
        Ok(())
    }

    #[test]
    fn test_chunked_characters_match_single_chunk() -> Result<()> {
        let whole = run(vec![start("title"), chars("Hello world"), end("title")])?;
        let split = run(vec![
            start("title"),
            chars("Hel"),
            chars("lo wo"),
            chars("rld"),
            end("title"),
        ])?;
        assert_eq!(whole.document, split.document);
        Ok(())
    }

    #[test]
    fn test_nested_structure_and_sibling_sequence() -> Result<()> {
        let parsed = run(vec![
            start("channel"),
            start("item"),
            chars("a"),
            end("item"),
            start("item"),
            chars("b"),
            end("item"),
            end("channel"),
        ])?;
        let items = parsed.document.root()["item"]
            .as_list()
            .map(|s| s.iter().filter_map(Value::as_text).collect::<Vec<_>>());
        assert_eq!(items, Some(vec!["a", "b"]));
        Ok(())
    }

    #[test]
    fn test_end_element_on_empty_stack_is_fatal() {
        let mut builder = TreeBuilder::new();
        builder.handle(SaxEvent::StartDocument).ok();
        let err = builder.handle(end("item"));
        assert!(matches!(
            err.map_err(|e| e.kind().clone()),
            Err(ErrorKind::StructuralUnderflow { element }) if element == "item"
        ));
    }

    #[test]
    fn test_empty_document_is_fatal() {
        let mut builder = TreeBuilder::new();
        builder.handle(SaxEvent::StartDocument).ok();
        let err = builder.handle(SaxEvent::EndDocument);
        assert_eq!(
            err.map_err(|e| e.kind().clone()),
            Err(ErrorKind::EmptyDocument)
        );
    }

    #[test]
    fn test_unclosed_element_at_end_of_input() {
        let mut builder = TreeBuilder::new();
        builder.handle(SaxEvent::StartDocument).ok();
        builder.handle(start("rss")).ok();
        let err = builder.handle(SaxEvent::EndDocument);
        assert!(matches!(
            err.map_err(|e| e.kind().clone()),
            Err(ErrorKind::UnexpectedEof { .. })
        ));
    }

    #[test]
    fn test_second_root_is_fatal() {
        let mut builder = TreeBuilder::new();
        builder.handle(SaxEvent::StartDocument).ok();
        builder.handle(start("rss")).ok();
        builder.handle(end("rss")).ok();
        let err = builder.handle(start("rss"));
        assert_eq!(
            err.map_err(|e| e.kind().clone()),
            Err(ErrorKind::MultipleRoots)
        );
    }

    #[test]
    fn test_mismatched_end_tag_pops_with_advisory() -> Result<()> {
        let parsed = run(vec![
            start("channel"),
            start("title"),
            chars("t"),
            end("wrong"),
            end("channel"),
        ])?;
        assert!(!parsed.is_clean());
        // attached under the recorded name, not the event name
        assert_eq!(parsed.document.root()["title"].as_text(), Some("t"));
        Ok(())
    }

    #[test]
    fn test_base_applies_to_href_attributes() -> Result<()> {
        let parsed = run(vec![
            start_with("entry", &[("xml:base", "http://a.com/b/")]),
            start_with("link", &[("href", "c.html")]),
            end("link"),
            end("entry"),
        ])?;
        let link = parsed.document.root()["link"].as_element().cloned();
        assert_eq!(
            link.as_ref().and_then(|el| el.attr("href")),
            Some("http://a.com/b/c.html")
        );
        Ok(())
    }

    #[test]
    fn test_xhtml_capture_via_events() -> Result<()> {
        let parsed = run(vec![
            start("entry"),
            start_with("summary", &[("type", "xhtml")]),
            start("div"),
            start("b"),
            chars("bold"),
            end("b"),
            end("div"),
            end("summary"),
            end("entry"),
        ])?;
        let summary = parsed.document.root()["summary"].as_element().cloned();
        assert_eq!(
            summary.as_ref().and_then(|el| el.raw.as_deref()),
            Some("<div><b>bold</b></div>")
        );
        assert_eq!(
            summary.as_ref().map(|el| el.text.clone()),
            Some("<div><b>bold</b></div>".to_string())
        );
        assert!(summary.is_some_and(|el| el.children.is_empty()));
        Ok(())
    }

    #[test]
    fn test_extension_merged_into_items_only() -> Result<()> {
        let config = Config::new().with_extension("source", "Scripting News");
        let parsed = run_with_config(
            config,
            vec![
                start("channel"),
                start("item"),
                start("title"),
                chars("A"),
                end("title"),
                end("item"),
                end("channel"),
            ],
        )?;
        let root = parsed.document.root();
        let item = &root["item"];
        assert_eq!(item["source"].as_text(), Some("Scripting News"));
        assert!(root.as_element().is_some_and(|el| !el
            .children
            .contains_key("source")));
        Ok(())
    }

    #[test]
    fn test_advisory_events_do_not_stop_the_machine() -> Result<()> {
        let mut builder = TreeBuilder::new();
        builder.handle(SaxEvent::StartDocument)?;
        builder.handle(start("rss"))?;
        builder.handle(SaxEvent::Warning("odd markup".to_string()))?;
        builder.handle(SaxEvent::Error("worse markup".to_string()))?;
        builder.handle(end("rss"))?;
        builder.handle(SaxEvent::EndDocument)?;
        let parsed = builder.finish()?;
        assert_eq!(parsed.advisories.len(), 2);
        Ok(())
    }

    #[test]
    fn test_element_before_document_start_is_rejected() {
        let mut builder = TreeBuilder::new();
        let err = builder.handle(start("rss"));
        assert!(err.is_err());
    }

    #[test]
    fn test_namespaces_recorded_on_root_only() -> Result<()> {
        let mut builder = TreeBuilder::new();
        builder.handle(SaxEvent::StartDocument)?;
        builder.handle(SaxEvent::StartElement {
            name: QualifiedName::local("feed"),
            attributes: Vec::new(),
            namespaces: vec![Namespace {
                prefix: None,
                uri: "http://www.w3.org/2005/Atom".to_string(),
            }],
        })?;
        builder.handle(end("feed"))?;
        builder.handle(SaxEvent::EndDocument)?;
        let parsed = builder.finish()?;
        let root = parsed.document.root_element().cloned();
        assert_eq!(
            root.map(|el| el.namespaces.len()),
            Some(1)
        );
        Ok(())
    }
}
