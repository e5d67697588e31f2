//! feedtree - streaming RSS/RDF/Atom normalizer
//!
//! Parses the three syndication vocabularies into one uniform ordered
//! tree in a single pass over the document, with no lookahead. Text-only
//! leaves collapse to scalars, repeated siblings collapse to ordered
//! sequences, relative `href`/`src` references resolve against nested
//! `xml:base` scopes, and xhtml/html content is captured verbatim.
//!
//! # Quick Start
//!
//! ```
//! # fn main() -> feedtree::Result<()> {
//! let parsed = feedtree::parse_str(
//!     r#"<rss version="2.0"><channel><title>Feed</title></channel></rss>"#,
//! )?;
//! let title = parsed.document.root()["channel"]["title"].as_text();
//! assert_eq!(title, Some("Feed"));
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

use std::io::BufRead;

use tracing::{debug, instrument};

pub mod error;
pub use error::{Advisory, Error, ErrorKind, Result, Severity};

pub mod value;
pub use value::{Children, Document, Element, Namespace, Value};

pub mod parser;
pub use parser::{Config, Parsed, QualifiedName, SaxAttribute, SaxEvent, TreeBuilder};

pub mod feed;
pub use feed::{FeedKind, FeedMeta};

pub mod fetch;
pub use fetch::{Fetcher, Response, Transport, DEFAULT_REDIRECT_LIMIT};

/// Parse a feed document from a string
pub fn parse_str(xml: &str) -> Result<Parsed> {
    parse_str_with_config(xml, Config::default())
}

/// Parse a feed document from a string with a session configuration
pub fn parse_str_with_config(xml: &str, config: Config) -> Result<Parsed> {
    let mut builder = TreeBuilder::with_config(config);
    parser::events::drive_str(xml, &mut builder)?;
    builder.finish()
}

/// Parse a feed document from a buffered byte stream
pub fn parse_reader<R: BufRead>(reader: R) -> Result<Parsed> {
    parse_reader_with_config(reader, Config::default())
}

/// Parse a feed document from a buffered byte stream with a session
/// configuration
pub fn parse_reader_with_config<R: BufRead>(reader: R, config: Config) -> Result<Parsed> {
    let mut builder = TreeBuilder::with_config(config);
    parser::events::drive_reader(reader, &mut builder)?;
    builder.finish()
}

/// Parse a feed document from a file
#[instrument]
pub fn parse_file(path: &str) -> Result<Parsed> {
    debug!("reading feed file");
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::with_message(ErrorKind::Io, e.to_string()))?;
    let result = parse_str(&content);
    debug!("parsing completed");
    result
}
