//! Error types for feedtree

use std::fmt;
use thiserror::Error;

/// Error kind for detailed categorization
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// An end-element event arrived with no element open
    StructuralUnderflow { element: String },
    /// The document closed without ever producing a root element
    EmptyDocument,
    /// A second root element started after the first one closed
    MultipleRoots,
    /// Input ended while elements were still open
    UnexpectedEof { expected: String },
    /// The tokenizer could not make progress past malformed markup
    Malformed,
    /// A retrieval attempt returned a non-success, non-redirect status
    Fetch { status: u16 },
    /// A retrieval attempt was redirected more times than allowed
    RedirectLimitExceeded { limit: usize },
    /// Reading the input source failed
    Io,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StructuralUnderflow { element } => {
                write!(f, "closing tag </{element}> without matching open element")
            }
            Self::EmptyDocument => write!(f, "document contains no root element"),
            Self::MultipleRoots => write!(f, "document contains more than one root element"),
            Self::UnexpectedEof { expected } => {
                write!(f, "unexpected end of input, expected {expected}")
            }
            Self::Malformed => write!(f, "malformed markup"),
            Self::Fetch { status } => write!(f, "fetch failed with status {status}"),
            Self::RedirectLimitExceeded { limit } => {
                write!(f, "redirect limit of {limit} exceeded")
            }
            Self::Io => write!(f, "i/o failure"),
        }
    }
}

/// Main error type for feedtree
#[derive(Error, Clone, Debug, PartialEq)]
pub struct Error {
    kind: ErrorKind,
    message: String,
    offset: Option<u64>,
}

impl Error {
    pub fn new(kind: ErrorKind) -> Self {
        let message = kind.to_string();
        Self {
            kind,
            message,
            offset: None,
        }
    }

    pub fn with_message(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            offset: None,
        }
    }

    /// Create error at a specific byte offset in the input
    pub fn at(kind: ErrorKind, offset: u64) -> Self {
        let message = kind.to_string();
        Self {
            kind,
            message,
            offset: Some(offset),
        }
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn offset(&self) -> Option<u64> {
        self.offset
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.offset {
            Some(offset) => write!(f, "error at byte {}: {}", offset, self.message),
            None => write!(f, "error: {}", self.message),
        }
    }
}

/// Result type alias for feedtree
pub type Result<T> = std::result::Result<T, Error>;

/// How serious a non-fatal diagnostic is
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

/// A non-fatal diagnostic recorded while parsing continued
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Advisory {
    pub severity: Severity,
    pub message: String,
    pub offset: Option<u64>,
}

impl Advisory {
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
            offset: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
            offset: None,
        }
    }

    pub fn at_offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }
}

impl fmt::Display for Advisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        match self.offset {
            Some(offset) => write!(f, "{label} at byte {offset}: {}", self.message),
            None => write!(f, "{label}: {}", self.message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = Error::new(ErrorKind::EmptyDocument);
        assert_eq!(err.kind(), &ErrorKind::EmptyDocument);
        assert!(err.offset().is_none());
    }

    #[test]
    fn test_error_display() {
        let err = Error::at(
            ErrorKind::StructuralUnderflow {
                element: "item".to_string(),
            },
            42,
        );
        let display = err.to_string();
        assert!(display.contains("byte 42"));
        assert!(display.contains("</item>"));
    }

    #[test]
    fn test_advisory_display() {
        let adv = Advisory::warning("mismatched closing tag").at_offset(7);
        assert_eq!(adv.to_string(), "warning at byte 7: mismatched closing tag");
    }

    #[test]
    fn test_fetch_kind_display() {
        let err = Error::new(ErrorKind::RedirectLimitExceeded { limit: 10 });
        assert!(err.to_string().contains("redirect limit of 10"));
    }
}
