//! Error types for nzb-rs
//!
//! This module provides the error handling for the library:
//! - [`InvalidNzbError`] for documents that fail structural validation
//! - [`Error`] as the top-level type, which also covers the JSON bridge and
//!   the filesystem boundary (reading and writing NZB files)
//! - Machine-readable error codes for callers that need to branch on the kind

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for nzb-rs operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for nzb-rs
///
/// Document-validity failures ([`Error::InvalidNzb`]) are kept apart from
/// filesystem failures so that callers never confuse a missing file with a
/// broken one.
#[derive(Debug, Error)]
pub enum Error {
    /// The document is not a structurally valid NZB
    #[error("invalid NZB: {0}")]
    InvalidNzb(#[from] InvalidNzbError),

    /// The JSON given to [`Nzb::from_json`](crate::Nzb::from_json) does not have the expected shape
    #[error(
        "invalid NZB JSON: {message} (only JSON produced by Nzb::to_json is accepted)"
    )]
    InvalidJson {
        /// What was wrong with the JSON input
        message: String,
    },

    /// Refused to overwrite an existing file
    #[error("file already exists: {}", path.display())]
    FileExists {
        /// The path that already exists
        path: PathBuf,
    },

    /// The requested file does not exist
    #[error("file not found: {}", path.display())]
    FileNotFound {
        /// The path that could not be found
        path: PathBuf,
    },

    /// `save()` was called on an editor that was not created from a file
    #[error("no destination: the editor was not created from a file")]
    NoSourcePath,

    /// The file could not be decoded (corrupt gzip stream or invalid UTF-8)
    #[error("failed to decode {}: {reason}", path.display())]
    Decode {
        /// The file that failed to decode
        path: PathBuf,
        /// Why decoding failed
        reason: String,
    },

    /// The edited document could not be serialized back to XML
    #[error("failed to render NZB XML: {0}")]
    Render(#[from] quick_xml::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Machine-readable error code (e.g. `"missing_groups"`, `"file_exists"`)
    pub fn code(&self) -> &'static str {
        match self {
            Error::InvalidNzb(e) => e.code(),
            Error::InvalidJson { .. } => "invalid_json",
            Error::FileExists { .. } => "file_exists",
            Error::FileNotFound { .. } => "file_not_found",
            Error::NoSourcePath => "no_source_path",
            Error::Decode { .. } => "decode_error",
            Error::Render(_) => "render_error",
            Error::Io(_) => "io_error",
        }
    }

    /// Returns the inner validation error if this is a document-validity failure
    pub fn as_invalid_nzb(&self) -> Option<&InvalidNzbError> {
        match self {
            Error::InvalidNzb(e) => Some(e),
            _ => None,
        }
    }
}

/// Structural validation errors raised while reading an NZB document
///
/// A document that produces any of these never yields a partial
/// [`Nzb`](crate::Nzb).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidNzbError {
    /// The text is not well-formed XML
    #[error("{message}")]
    MalformedXml {
        /// Message from the underlying XML parser
        message: String,
        /// 1-based line of the failure, when known
        line: Option<u32>,
        /// 1-based column of the failure, when known
        column: Option<u32>,
    },

    /// The document has no `<file>` element
    #[error("missing file element")]
    MissingFiles,

    /// A `<file>` has no non-empty `<group>`
    #[error("missing groups element")]
    MissingGroups,

    /// A `<file>` has no valid `<segment>` left after dropping corrupt ones
    #[error("missing segments element")]
    MissingSegments,

    /// A `<file>` lacks one of `poster`, `date` or `subject`
    #[error("missing required attribute '{attribute}' in a file element")]
    MissingAttribute {
        /// Name of the missing attribute
        attribute: String,
    },

    /// The `date` attribute of a `<file>` is not a Unix timestamp
    #[error("invalid date attribute")]
    InvalidDate {
        /// The offending attribute value
        value: String,
    },
}

impl InvalidNzbError {
    /// Human-readable message, identical to the `Display` output
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// Machine-readable error code
    pub fn code(&self) -> &'static str {
        match self {
            InvalidNzbError::MalformedXml { .. } => "malformed_xml",
            InvalidNzbError::MissingFiles => "missing_files",
            InvalidNzbError::MissingGroups => "missing_groups",
            InvalidNzbError::MissingSegments => "missing_segments",
            InvalidNzbError::MissingAttribute { .. } => "missing_attribute",
            InvalidNzbError::InvalidDate { .. } => "invalid_date",
        }
    }

    pub(crate) fn missing_attribute(attribute: &str) -> Self {
        InvalidNzbError::MissingAttribute {
            attribute: attribute.to_string(),
        }
    }

    /// Build a [`InvalidNzbError::MalformedXml`] from a message and a byte
    /// offset into `text`, resolving the offset to a line and column.
    pub(crate) fn malformed_at(message: impl Into<String>, text: &str, offset: usize) -> Self {
        let offset = offset.min(text.len());
        let before = text.get(..offset).unwrap_or(text);
        let line = before.matches('\n').count() + 1;
        let column = before
            .rsplit('\n')
            .next()
            .map_or(0, |last| last.chars().count())
            + 1;
        InvalidNzbError::MalformedXml {
            message: message.into(),
            line: u32::try_from(line).ok(),
            column: u32::try_from(column).ok(),
        }
    }
}

impl From<roxmltree::Error> for InvalidNzbError {
    fn from(e: roxmltree::Error) -> Self {
        let pos = e.pos();
        InvalidNzbError::MalformedXml {
            message: e.to_string(),
            line: Some(pos.row),
            column: Some(pos.col),
        }
    }
}

impl From<roxmltree::Error> for Error {
    fn from(e: roxmltree::Error) -> Self {
        Error::InvalidNzb(e.into())
    }
}
