//! Feed vocabulary detection and canonical meta fields

use crate::value::{Document, Element, Value};

/// The syndication vocabulary a document was written in
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FeedKind {
    Rss,
    Rdf,
    Atom,
}

impl FeedKind {
    /// Detect the vocabulary from the document's root element name
    pub fn detect(document: &Document) -> Option<Self> {
        match document.name() {
            "rss" => Some(Self::Rss),
            "rdf:rdf" => Some(Self::Rdf),
            "feed" => Some(Self::Atom),
            _ => None,
        }
    }
}

/// Cross-vocabulary feed-level fields.
///
/// Field precedence is explicit: the most specific element wins and the
/// first occurrence wins on conflict. A `link` carrying `rel="self"` and
/// an `href` feeds `xml_url` only; otherwise `href` beats element text.
/// `description` beats `subtitle`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FeedMeta {
    pub kind: Option<FeedKind>,
    pub version: Option<String>,
    pub title: Option<String>,
    pub link: Option<String>,
    pub xml_url: Option<String>,
    pub description: Option<String>,
}

impl FeedMeta {
    /// Extract canonical fields from the meta container: `channel` for
    /// RSS/RDF, the root element itself for Atom. Returns a meta with
    /// `kind: None` and empty fields for an unrecognized vocabulary.
    pub fn from_document(document: &Document) -> Self {
        let kind = FeedKind::detect(document);
        let Some(root) = document.root_element() else {
            return Self {
                kind,
                ..Self::default()
            };
        };

        let version = match kind {
            Some(FeedKind::Rss) => root.attr("version").map(str::to_string),
            Some(FeedKind::Rdf) | Some(FeedKind::Atom) => Some(
                root.attr("version")
                    .map_or_else(|| "1.0".to_string(), str::to_string),
            ),
            None => None,
        };

        let container = match kind {
            Some(FeedKind::Atom) => Some(root),
            Some(FeedKind::Rss) | Some(FeedKind::Rdf) => root
                .children
                .occurrences("channel")
                .next()
                .and_then(Value::as_element),
            None => None,
        };

        let mut meta = Self {
            kind,
            version,
            ..Self::default()
        };
        if let Some(container) = container {
            meta.fill_from(container);
        }
        meta
    }

    fn fill_from(&mut self, container: &Element) {
        for value in container.children.occurrences("title") {
            if self.title.is_some() {
                break;
            }
            self.title = non_empty(value.content());
        }

        let links = container
            .children
            .occurrences("link")
            .chain(container.children.occurrences("atom:link"));
        for value in links {
            match value {
                Value::Element(el) => {
                    let href = non_empty(el.attr("href"));
                    if el.attr("rel") == Some("self") && href.is_some() {
                        if self.xml_url.is_none() {
                            self.xml_url = href;
                        }
                    } else if self.link.is_none() {
                        self.link = href.or_else(|| non_empty(Some(el.text.as_str())));
                    }
                }
                other => {
                    if self.link.is_none() {
                        self.link = non_empty(other.content());
                    }
                }
            }
        }

        for name in ["description", "subtitle"] {
            if self.description.is_some() {
                break;
            }
            self.description = container
                .children
                .occurrences(name)
                .find_map(|v| non_empty(v.content()));
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|s| !s.is_empty()).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_str;

    #[test]
    fn test_detect_rss_and_version() {
        let parsed = parse_str(
            r#"<rss version="2.0"><channel><title>T</title></channel></rss>"#,
        )
        .ok();
        let meta = parsed
            .map(|p| FeedMeta::from_document(&p.document))
            .unwrap_or_default();
        assert_eq!(meta.kind, Some(FeedKind::Rss));
        assert_eq!(meta.version.as_deref(), Some("2.0"));
        assert_eq!(meta.title.as_deref(), Some("T"));
    }

    #[test]
    fn test_detect_atom_defaults_version() {
        let parsed = parse_str(
            r#"<feed xmlns="http://www.w3.org/2005/Atom"><title>A</title></feed>"#,
        )
        .ok();
        let meta = parsed
            .map(|p| FeedMeta::from_document(&p.document))
            .unwrap_or_default();
        assert_eq!(meta.kind, Some(FeedKind::Atom));
        assert_eq!(meta.version.as_deref(), Some("1.0"));
        assert_eq!(meta.title.as_deref(), Some("A"));
    }

    #[test]
    fn test_detect_rdf_root() {
        let xml = r#"<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#">
            <channel><title>R</title><link>http://r/</link></channel>
        </rdf:RDF>"#;
        let meta = parse_str(xml)
            .map(|p| FeedMeta::from_document(&p.document))
            .unwrap_or_default();
        assert_eq!(meta.kind, Some(FeedKind::Rdf));
        assert_eq!(meta.version.as_deref(), Some("1.0"));
        assert_eq!(meta.link.as_deref(), Some("http://r/"));
    }

    #[test]
    fn test_self_link_becomes_xml_url() {
        let xml = r#"<rss version="2.0"><channel>
            <title>T</title>
            <link>http://example.com/</link>
            <atom:link rel="self" href="http://example.com/feed.xml"/>
        </channel></rss>"#;
        let meta = parse_str(xml)
            .map(|p| FeedMeta::from_document(&p.document))
            .unwrap_or_default();
        assert_eq!(meta.link.as_deref(), Some("http://example.com/"));
        assert_eq!(meta.xml_url.as_deref(), Some("http://example.com/feed.xml"));
    }

    #[test]
    fn test_first_link_wins() {
        let xml = r#"<feed><title>A</title>
            <link href="http://one/"/>
            <link href="http://two/"/>
        </feed>"#;
        let meta = parse_str(xml)
            .map(|p| FeedMeta::from_document(&p.document))
            .unwrap_or_default();
        assert_eq!(meta.link.as_deref(), Some("http://one/"));
    }

    #[test]
    fn test_description_beats_subtitle() {
        let xml = r#"<rss version="2.0"><channel>
            <subtitle>sub</subtitle>
            <description>desc</description>
        </channel></rss>"#;
        let meta = parse_str(xml)
            .map(|p| FeedMeta::from_document(&p.document))
            .unwrap_or_default();
        assert_eq!(meta.description.as_deref(), Some("desc"));
    }

    #[test]
    fn test_unknown_root_has_no_kind() {
        let meta = parse_str("<opml><body/></opml>")
            .map(|p| FeedMeta::from_document(&p.document))
            .unwrap_or_default();
        assert_eq!(meta.kind, None);
        assert_eq!(meta.version, None);
    }
}
