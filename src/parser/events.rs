//! Typed SAX events and the quick-xml pumps that produce them

use std::io::BufRead;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{Error, ErrorKind, Result};
use crate::parser::builder::TreeBuilder;
use crate::value::Namespace;

/// An element or attribute name split into local part and optional prefix
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QualifiedName {
    pub local: String,
    pub prefix: Option<String>,
}

impl QualifiedName {
    /// Name with no prefix
    pub fn local(name: impl Into<String>) -> Self {
        Self {
            local: name.into(),
            prefix: None,
        }
    }

    pub fn prefixed(prefix: impl Into<String>, local: impl Into<String>) -> Self {
        Self {
            local: local.into(),
            prefix: Some(prefix.into()),
        }
    }

    /// Lowercased, prefix-qualified form used as a tree key
    pub fn qualified(&self) -> String {
        match &self.prefix {
            Some(prefix) => format!("{}:{}", prefix.to_lowercase(), self.local.to_lowercase()),
            None => self.local.to_lowercase(),
        }
    }
}

/// One attribute as delivered by the event source: names split, value
/// entity-decoded, not yet trimmed or base-resolved.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SaxAttribute {
    pub local: String,
    pub prefix: Option<String>,
    pub value: String,
}

/// One structural fact about the document, delivered in document order.
///
/// `Warning` and `Error` are advisory; they never terminate the stream.
#[derive(Clone, Debug, PartialEq)]
pub enum SaxEvent {
    StartDocument,
    StartElement {
        name: QualifiedName,
        attributes: Vec<SaxAttribute>,
        namespaces: Vec<Namespace>,
    },
    Characters(String),
    CData(String),
    EndElement {
        name: QualifiedName,
    },
    EndDocument,
    Warning(String),
    Error(String),
}

/// Pump a borrowed string through the builder
pub(crate) fn drive_str(xml: &str, builder: &mut TreeBuilder) -> Result<()> {
    let mut reader = Reader::from_str(xml);
    let config = reader.config_mut();
    config.expand_empty_elements = true;
    config.trim_text_start = false;
    config.trim_text_end = false;
    config.check_end_names = false;

    builder.handle(SaxEvent::StartDocument)?;
    let mut last_error_pos = None;
    loop {
        match reader.read_event() {
            Ok(Event::Eof) => return builder.handle(SaxEvent::EndDocument),
            Ok(event) => {
                forward(builder, event)?;
                last_error_pos = None;
            }
            Err(err) => tolerate(builder, &mut last_error_pos, reader.error_position(), err)?,
        }
    }
}

/// Pump a buffered byte stream through the builder
pub(crate) fn drive_reader<R: BufRead>(source: R, builder: &mut TreeBuilder) -> Result<()> {
    let mut reader = Reader::from_reader(source);
    let config = reader.config_mut();
    config.expand_empty_elements = true;
    config.trim_text_start = false;
    config.trim_text_end = false;
    config.check_end_names = false;

    builder.handle(SaxEvent::StartDocument)?;
    let mut buf = Vec::new();
    let mut last_error_pos = None;
    loop {
        buf.clear();
        match reader.read_event_into(&mut buf) {
            Ok(Event::Eof) => return builder.handle(SaxEvent::EndDocument),
            Ok(event) => {
                forward(builder, event)?;
                last_error_pos = None;
            }
            Err(err) => tolerate(builder, &mut last_error_pos, reader.error_position(), err)?,
        }
    }
}

/// Map a tokenizer error to an advisory and keep going. I/O failures and
/// errors the reader cannot advance past abort the parse.
fn tolerate(
    builder: &mut TreeBuilder,
    last_error_pos: &mut Option<u64>,
    pos: u64,
    err: quick_xml::Error,
) -> Result<()> {
    if let quick_xml::Error::Io(io) = &err {
        return Err(Error::with_message(ErrorKind::Io, io.to_string()));
    }
    if *last_error_pos == Some(pos) {
        return Err(Error::at(ErrorKind::Malformed, pos));
    }
    *last_error_pos = Some(pos);
    builder.handle(SaxEvent::Error(format!("{err} at byte {pos}")))
}

fn forward(builder: &mut TreeBuilder, event: Event<'_>) -> Result<()> {
    match event {
        Event::Start(e) => {
            let (name, attributes, namespaces, trouble) = convert_start(&e);
            for message in trouble {
                builder.handle(SaxEvent::Warning(message))?;
            }
            builder.handle(SaxEvent::StartElement {
                name,
                attributes,
                namespaces,
            })
        }
        Event::Empty(e) => {
            // expand_empty_elements is set, but cover the raw event anyway
            let (name, attributes, namespaces, trouble) = convert_start(&e);
            for message in trouble {
                builder.handle(SaxEvent::Warning(message))?;
            }
            builder.handle(SaxEvent::StartElement {
                name: name.clone(),
                attributes,
                namespaces,
            })?;
            builder.handle(SaxEvent::EndElement { name })
        }
        Event::End(e) => builder.handle(SaxEvent::EndElement {
            name: split_name(e.name().as_ref()),
        }),
        Event::Text(e) => match e.unescape() {
            Ok(text) => builder.handle(SaxEvent::Characters(text.into_owned())),
            Err(err) => {
                builder.handle(SaxEvent::Warning(format!("invalid text content: {err}")))?;
                builder.handle(SaxEvent::Characters(
                    String::from_utf8_lossy(e.as_ref()).into_owned(),
                ))
            }
        },
        Event::CData(e) => builder.handle(SaxEvent::CData(
            String::from_utf8_lossy(e.as_ref()).into_owned(),
        )),
        Event::Comment(_) | Event::PI(_) | Event::Decl(_) | Event::DocType(_) => Ok(()),
        Event::Eof => Ok(()),
    }
}

fn convert_start(
    e: &BytesStart<'_>,
) -> (
    QualifiedName,
    Vec<SaxAttribute>,
    Vec<Namespace>,
    Vec<String>,
) {
    let name = split_name(e.name().as_ref());
    let mut attributes = Vec::new();
    let mut namespaces = Vec::new();
    let mut trouble = Vec::new();

    for attr in e.attributes() {
        let attr = match attr {
            Ok(attr) => attr,
            Err(err) => {
                trouble.push(format!("invalid attribute: {err}"));
                continue;
            }
        };
        let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
        let value = match attr.unescape_value() {
            Ok(value) => value.into_owned(),
            Err(err) => {
                trouble.push(format!("invalid value for attribute {key}: {err}"));
                String::from_utf8_lossy(&attr.value).into_owned()
            }
        };

        if key == "xmlns" {
            namespaces.push(Namespace {
                prefix: None,
                uri: value,
            });
        } else if let Some(local) = key.strip_prefix("xmlns:") {
            namespaces.push(Namespace {
                prefix: Some(local.to_string()),
                uri: value,
            });
        } else {
            let qname = split_name(key.as_bytes());
            attributes.push(SaxAttribute {
                local: qname.local,
                prefix: qname.prefix,
                value,
            });
        }
    }

    (name, attributes, namespaces, trouble)
}

fn split_name(raw: &[u8]) -> QualifiedName {
    let full = String::from_utf8_lossy(raw);
    match full.find(':') {
        Some(pos) => QualifiedName {
            local: full[pos + 1..].to_string(),
            prefix: Some(full[..pos].to_string()),
        },
        None => QualifiedName {
            local: full.into_owned(),
            prefix: None,
        },
    }
}
