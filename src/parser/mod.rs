//! NZB parsing and validation
//!
//! Turns raw document text into the strict [`Nzb`] model. The XML is walked
//! as a DOM, so repeatable elements (`meta`, `file`, `group`, `segment`) are
//! always handled as sequences whatever their cardinality.
//!
//! Validation is all-or-nothing: any structural violation aborts the parse.
//! The only local recovery is for individual segments, which are dropped
//! when corrupt as long as their file keeps at least one valid segment.
//!
//! See <https://sabnzbd.org/wiki/extra/nzb-spec> for the format.

use std::path::Path;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use roxmltree::{Document, Node, ParsingOptions};
use tracing::{debug, warn};

use crate::config::ParseOptions;
use crate::error::{Error, InvalidNzbError, Result};
use crate::types::{File, Meta, Nzb, Segment};
use crate::utils::{natural_cmp, read_nzb_text};


/// Parser for NZB documents
///
/// A parser holds only its [`ParseOptions`] and can be reused for any
/// number of documents.
#[derive(Clone, Debug, Default)]
pub struct NzbParser {
    options: ParseOptions,
}

impl NzbParser {
    /// Create a parser with the given options
    pub fn new(options: ParseOptions) -> Self {
        Self { options }
    }

    /// The options this parser was built with
    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    /// Parse NZB text into an [`Nzb`]
    ///
    /// Leading and trailing whitespace around the document is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidNzb`] when the text is not well-formed XML
    /// or breaks a structural rule (no `<file>`, a file without groups or
    /// valid segments, a missing or invalid required attribute).
    pub fn parse(&self, text: &str) -> Result<Nzb> {
        let doc = Document::parse_with_options(
            text.trim(),
            ParsingOptions {
                allow_dtd: true,
                ..ParsingOptions::default()
            },
        )?;

        let root = doc.root_element();
        if root.tag_name().name() != "nzb" {
            return Err(InvalidNzbError::MissingFiles.into());
        }

        let meta = self.parse_meta(root);
        let files = parse_files(root)?;
        let nzb = Nzb::from_validated(meta, files);

        debug!(
            files = nzb.files().len(),
            size = nzb.size(),
            "Parsed NZB document"
        );

        Ok(nzb)
    }

    /// Read and parse an NZB file (`.gz` files are decompressed first)
    ///
    /// # Errors
    ///
    /// Besides the errors of [`NzbParser::parse`], returns
    /// [`Error::FileNotFound`] or [`Error::Decode`] for unreadable input.
    pub fn from_file(&self, path: impl AsRef<Path>) -> Result<Nzb> {
        let text = read_nzb_text(path.as_ref())?;
        self.parse(&text)
    }

    /// Collect metadata from `<head><meta type="...">` entries
    ///
    /// Types are matched case-insensitively and values trimmed. A missing
    /// `<head>` or unknown types are not errors.
    fn parse_meta(&self, root: Node<'_, '_>) -> Meta {
        let mut meta = Meta::default();
        let mut name_alias = None;

        let entries = children_named(root, "head").flat_map(|head| children_named(head, "meta"));

        for entry in entries {
            let kind = entry
                .attribute("type")
                .unwrap_or_default()
                .trim()
                .to_lowercase();
            let value = entry.text().unwrap_or_default().trim();

            match kind.as_str() {
                "title" if !value.is_empty() => meta.title = Some(value.to_string()),
                "password" if !value.is_empty() => meta.passwords.push(value.to_string()),
                "tag" if !value.is_empty() => meta.tags.push(value.to_string()),
                "category" => meta.category = non_empty(value),
                "name" if self.options.title_from_name && !value.is_empty() => {
                    name_alias = Some(value.to_string());
                }
                _ => {}
            }
        }

        if meta.title.is_none() {
            meta.title = name_alias;
        }

        meta
    }
}

impl Nzb {
    /// Parse NZB text with the default [`ParseOptions`]
    ///
    /// Shorthand for `NzbParser::default().parse(text)`.
    pub fn parse(text: &str) -> Result<Self> {
        NzbParser::default().parse(text)
    }

    /// Read and parse an NZB file with the default [`ParseOptions`]
    ///
    /// Files ending in `.gz` are decompressed transparently.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        NzbParser::default().from_file(path)
    }
}

impl FromStr for Nzb {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Nzb::parse(s)
    }
}

/// Parse every `<file>` child of the root, ordered by subject
fn parse_files(root: Node<'_, '_>) -> std::result::Result<Vec<File>, InvalidNzbError> {
    let mut files = children_named(root, "file")
        .map(parse_file)
        .collect::<std::result::Result<Vec<_>, _>>()?;

    if files.is_empty() {
        return Err(InvalidNzbError::MissingFiles);
    }

    files.sort_by(|a, b| a.subject().cmp(b.subject()));
    Ok(files)
}

fn parse_file(node: Node<'_, '_>) -> std::result::Result<File, InvalidNzbError> {
    let poster = required_attribute(node, "poster")?;
    let date = required_attribute(node, "date")?;
    let subject = required_attribute(node, "subject")?;

    let posted_at = parse_timestamp(date)?;
    let groups = parse_groups(node)?;
    let segments = parse_segments(node, subject)?;

    Ok(File::from_validated(
        poster.to_string(),
        posted_at,
        subject.to_string(),
        groups,
        segments,
    ))
}

fn required_attribute<'a>(
    node: Node<'a, '_>,
    name: &str,
) -> std::result::Result<&'a str, InvalidNzbError> {
    node.attribute(name)
        .ok_or_else(|| InvalidNzbError::missing_attribute(name))
}

/// Convert a Unix timestamp (seconds) into a UTC instant
fn parse_timestamp(value: &str) -> std::result::Result<DateTime<Utc>, InvalidNzbError> {
    value
        .trim()
        .parse::<i64>()
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .ok_or_else(|| InvalidNzbError::InvalidDate {
            value: value.to_string(),
        })
}

/// Non-empty `<groups><group>` values in natural order
fn parse_groups(file: Node<'_, '_>) -> std::result::Result<Vec<String>, InvalidNzbError> {
    let mut groups: Vec<String> = children_named(file, "groups")
        .flat_map(|groups| children_named(groups, "group"))
        .filter_map(|group| non_empty(group.text().unwrap_or_default().trim()))
        .collect();

    if groups.is_empty() {
        return Err(InvalidNzbError::MissingGroups);
    }

    groups.sort_by(|a, b| natural_cmp(a, b));
    Ok(groups)
}

/// Valid `<segments><segment>` entries ordered by number
///
/// Corrupt segments are dropped; the file fails only if none survive.
fn parse_segments(
    file: Node<'_, '_>,
    subject: &str,
) -> std::result::Result<Vec<Segment>, InvalidNzbError> {
    let mut total = 0usize;
    let mut segments = Vec::new();

    for node in children_named(file, "segments").flat_map(|s| children_named(s, "segment")) {
        total += 1;
        match parse_segment(node) {
            Ok(segment) => segments.push(segment),
            Err(reason) => debug!(subject, reason, "Dropping corrupt segment"),
        }
    }

    if segments.is_empty() {
        return Err(InvalidNzbError::MissingSegments);
    }

    if segments.len() < total {
        warn!(
            subject,
            kept = segments.len(),
            dropped = total - segments.len(),
            "File lost some of its segments"
        );
    }

    // Stable: duplicate numbers keep their document order
    segments.sort_by_key(|s| s.number);
    Ok(segments)
}

fn parse_segment(node: Node<'_, '_>) -> std::result::Result<Segment, &'static str> {
    let size = node
        .attribute("bytes")
        .ok_or("missing bytes attribute")?
        .trim()
        .parse::<u64>()
        .map_err(|_| "bytes is not a non-negative integer")?;

    let number = node
        .attribute("number")
        .ok_or("missing number attribute")?
        .trim()
        .parse::<u32>()
        .map_err(|_| "number is not a non-negative integer")?;
    if number == 0 {
        return Err("number must be positive");
    }

    let message_id = node.text().unwrap_or_default().trim();
    if message_id.is_empty() {
        return Err("empty message-id");
    }

    Ok(Segment {
        size,
        number,
        message_id: message_id.to_string(),
    })
}

/// Element children of `node` with the given local name (namespace ignored)
fn children_named<'a, 'input: 'a>(
    node: Node<'a, 'input>,
    name: &'static str,
) -> impl Iterator<Item = Node<'a, 'input>> + 'a {
    node.children()
        .filter(move |child| child.is_element() && child.tag_name().name() == name)
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}
