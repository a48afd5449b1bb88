//! Metadata editing for NZB documents
//!
//! [`NzbMetaEditor`] changes the `<head>` block of a document and leaves
//! everything else alone. It works on its own XML tree rather than on the
//! validated [`Nzb`](crate::Nzb) model, so documents that would fail full
//! validation can still be edited.
//!
//! After every change the `<meta>` entries are ordered by type: `title`,
//! `category`, `password`, `tag`, then any unknown types. Entries of the
//! same type keep their relative order.

mod tree;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

pub use tree::Declaration;

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::EditorOptions;
use crate::error::{Error, Result};
use crate::utils::{read_nzb_text, write_atomic};
use tree::{Element, XmlDocument, XmlNode};

const HEAD: &str = "head";
const META: &str = "meta";
const TYPE: &str = "type";

/// Known meta types, in output order
const META_ORDER: [&str; 4] = ["title", "category", "password", "tag"];

/// Fields to replace with [`NzbMetaEditor::set`]
///
/// Only fields that are given are touched. Giving an empty list of
/// passwords or tags removes all existing entries of that type.
///
/// ```
/// use nzb_rs::MetaUpdate;
///
/// let update = MetaUpdate::new()
///     .title("Big Buck Bunny")
///     .tags(["HD", "1080p"]);
/// assert!(!update.is_empty());
/// assert!(MetaUpdate::new().is_empty());
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MetaUpdate {
    title: Option<String>,
    passwords: Option<Vec<String>>,
    tags: Option<Vec<String>>,
    category: Option<String>,
}

impl MetaUpdate {
    /// An update that changes nothing
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the title
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Replace all passwords
    pub fn passwords<I, S>(mut self, passwords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.passwords = Some(passwords.into_iter().map(Into::into).collect());
        self
    }

    /// Replace all tags
    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    /// Replace the category
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// True if no field is given
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.passwords.is_none()
            && self.tags.is_none()
            && self.category.is_none()
    }

    /// Meta types this update replaces
    fn replaced_types(&self) -> Vec<&'static str> {
        let mut types = Vec::new();
        if self.title.is_some() {
            types.push("title");
        }
        if self.category.is_some() {
            types.push("category");
        }
        if self.passwords.is_some() {
            types.push("password");
        }
        if self.tags.is_some() {
            types.push("tag");
        }
        types
    }

    /// New `(type, value)` entries, skipping empty values
    fn entries(&self) -> Vec<(&'static str, &str)> {
        let mut entries = Vec::new();
        entries.extend(self.title.as_deref().map(|v| ("title", v)));
        entries.extend(self.category.as_deref().map(|v| ("category", v)));
        for password in self.passwords.iter().flatten() {
            entries.push(("password", password.as_str()));
        }
        for tag in self.tags.iter().flatten() {
            entries.push(("tag", tag.as_str()));
        }
        entries.retain(|(_, value)| !value.is_empty());
        entries
    }
}

/// Editor for the `<head>` metadata of an NZB document
///
/// Operations return `&mut Self` so they can be chained.
///
/// # Example
///
/// ```
/// use nzb_rs::{MetaUpdate, NzbMetaEditor};
///
/// let text = r#"<?xml version="1.0" encoding="UTF-8"?>
/// <!DOCTYPE nzb PUBLIC "-//newzBin//DTD NZB 1.1//EN" "http://www.newzbin.com/DTD/nzb/nzb-1.1.dtd">
/// <nzb xmlns="http://www.newzbin.com/DTD/2003/nzb">
///     <head>
///         <meta type="title">Big Buck Bunny - S01E01.mkv</meta>
///     </head>
///     <file poster="John" date="1706440708" subject="&quot;Big Buck Bunny - S01E01.mkv&quot;">
///         <groups>
///             <group>alt.binaries.boneless</group>
///         </groups>
///         <segments>
///             <segment bytes="739067" number="1">9cacde4c986547369becbf97003fb2c5-9483514693959@example</segment>
///         </segments>
///     </file>
/// </nzb>"#;
///
/// let edited = NzbMetaEditor::new(text)?
///     .set(MetaUpdate::new().title("Big Buck Bunny"))
///     .append(&[], &["1080p"])
///     .to_str()?;
///
/// assert!(edited.contains(r#"<meta type="title">Big Buck Bunny</meta>"#));
/// assert!(edited.contains(r#"<meta type="tag">1080p</meta>"#));
/// # Ok::<(), nzb_rs::Error>(())
/// ```
#[derive(Clone, Debug)]
pub struct NzbMetaEditor {
    document: XmlDocument,
    options: EditorOptions,
    source: Option<PathBuf>,
}

impl NzbMetaEditor {
    /// Create an editor with the default [`EditorOptions`]
    ///
    /// Only XML well-formedness is checked; NZB structure is not
    /// validated.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidNzb`] if the text is not well-formed XML.
    pub fn new(text: &str) -> Result<Self> {
        Self::with_options(text, EditorOptions::default())
    }

    /// Create an editor with explicit options
    pub fn with_options(text: &str, options: EditorOptions) -> Result<Self> {
        let document = XmlDocument::parse(text.trim())?;
        Ok(Self {
            document,
            options,
            source: None,
        })
    }

    /// Create an editor from a file, remembering the path for [`save`](Self::save)
    ///
    /// Files ending in `.gz` are decompressed first.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = read_nzb_text(path)?;
        let mut editor = Self::new(&text)?;
        editor.source = Some(path.to_path_buf());
        Ok(editor)
    }

    /// Path the editor was loaded from, if any
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// DOCTYPE of the source document, without `<!DOCTYPE` and `>`
    pub fn doctype(&self) -> Option<&str> {
        self.document.doctype.as_deref()
    }

    /// XML declaration of the source document
    pub fn declaration(&self) -> Option<&Declaration> {
        self.document.declaration.as_ref()
    }

    /// Current `(type, value)` pairs of all `<meta>` entries, in document order
    pub fn meta_entries(&self) -> Vec<(String, String)> {
        self.head()
            .map(|head| {
                meta_elements(head)
                    .map(|meta| {
                        (
                            meta.attribute(TYPE).unwrap_or_default().to_string(),
                            meta.text(),
                        )
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Replace the given fields
    ///
    /// Existing entries of every given type (matched case-insensitively)
    /// are removed before the new ones are added. Fields not given are left
    /// untouched, and an empty update is a no-op. A `<head>` is created when
    /// the document has none.
    pub fn set(&mut self, update: MetaUpdate) -> &mut Self {
        if update.is_empty() {
            return self;
        }

        let replaced = update.replaced_types();
        let entries = update.entries();
        debug!(
            replaced = ?replaced,
            added = entries.len(),
            "Setting NZB metadata"
        );

        let Some(head) = self.head_or_insert() else {
            return self;
        };
        head.children.retain(|node| match node {
            XmlNode::Element(e) if e.is_named(META) => !replaced
                .iter()
                .any(|kind| normalized_type(e).as_deref() == Some(*kind)),
            _ => true,
        });
        push_entries(head, &entries);
        sort_meta(head);
        self
    }

    /// Add passwords and tags without removing existing ones
    pub fn append(&mut self, passwords: &[&str], tags: &[&str]) -> &mut Self {
        let entries: Vec<(&'static str, &str)> = passwords
            .iter()
            .map(|p| ("password", *p))
            .chain(tags.iter().map(|t| ("tag", *t)))
            .filter(|(_, value)| !value.is_empty())
            .collect();

        if entries.is_empty() {
            return self;
        }

        debug!(added = entries.len(), "Appending NZB metadata");

        let Some(head) = self.head_or_insert() else {
            return self;
        };
        push_entries(head, &entries);
        sort_meta(head);
        self
    }

    /// Remove every `<meta>` entry whose type is exactly `key`
    ///
    /// The comparison is case-sensitive. `<head>` is kept even when this
    /// leaves it empty.
    pub fn remove(&mut self, key: &str) -> &mut Self {
        if let Some(head) = self.head_mut() {
            let before = head.children.len();
            head.children.retain(|node| match node {
                XmlNode::Element(e) if e.is_named(META) => e.attribute(TYPE) != Some(key),
                _ => true,
            });
            debug!(key, removed = before - head.children.len(), "Removed NZB metadata");
        }
        self
    }

    /// Remove the whole `<head>` block
    pub fn clear(&mut self) -> &mut Self {
        self.document
            .root
            .children
            .retain(|node| !matches!(node, XmlNode::Element(e) if e.is_named(HEAD)));
        debug!("Cleared NZB metadata");
        self
    }

    /// Render the edited document
    ///
    /// The output starts with a UTF-8 XML declaration, followed by the
    /// source DOCTYPE when there was one, and is indented with
    /// [`EditorOptions::indent`] spaces.
    pub fn to_str(&self) -> Result<String> {
        Ok(self.document.to_xml(self.options.indent)?)
    }

    /// Write the edited document to `path` and return its absolute path
    ///
    /// Missing parent directories are created; paths ending in `.gz` are
    /// gzip-compressed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FileExists`] without writing anything if `path`
    /// exists and `overwrite` is false.
    pub fn to_file(&self, path: impl AsRef<Path>, overwrite: bool) -> Result<PathBuf> {
        let text = self.to_str()?;
        write_atomic(path.as_ref(), &text, overwrite)
    }

    /// Write the edited document back to the file it was loaded from
    ///
    /// Since that file normally still exists, `overwrite` must be true for
    /// this to succeed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoSourcePath`] for an editor created from text.
    pub fn save(&self, overwrite: bool) -> Result<PathBuf> {
        let path = self.source.as_deref().ok_or(Error::NoSourcePath)?;
        self.to_file(path, overwrite)
    }

    fn head(&self) -> Option<&Element> {
        self.document
            .root
            .children
            .iter()
            .find_map(|node| match node {
                XmlNode::Element(e) if e.is_named(HEAD) => Some(e),
                _ => None,
            })
    }

    fn head_mut(&mut self) -> Option<&mut Element> {
        self.document
            .root
            .children
            .iter_mut()
            .find_map(|node| match node {
                XmlNode::Element(e) if e.is_named(HEAD) => Some(e),
                _ => None,
            })
    }

    /// The `<head>` element, inserted before the first child element if missing
    ///
    /// Only `None` if the freshly inserted head cannot be found again.
    fn head_or_insert(&mut self) -> Option<&mut Element> {
        let root = &mut self.document.root;
        let position = match root
            .children
            .iter()
            .position(|node| matches!(node, XmlNode::Element(e) if e.is_named(HEAD)))
        {
            Some(position) => position,
            None => {
                let insert_at = root
                    .children
                    .iter()
                    .position(|node| matches!(node, XmlNode::Element(_)))
                    .unwrap_or(root.children.len());
                root.children
                    .insert(insert_at, XmlNode::Element(Element::new(prefixed(&root.name, HEAD))));
                insert_at
            }
        };

        match root.children.get_mut(position) {
            Some(XmlNode::Element(head)) => Some(head),
            _ => None,
        }
    }
}

/// Child name carrying the same namespace prefix as `parent`
fn prefixed(parent: &str, local: &str) -> String {
    match parent.rsplit_once(':') {
        Some((prefix, _)) => format!("{prefix}:{local}"),
        None => local.to_string(),
    }
}

fn meta_elements(head: &Element) -> impl Iterator<Item = &Element> {
    head.children.iter().filter_map(|node| match node {
        XmlNode::Element(e) if e.is_named(META) => Some(e),
        _ => None,
    })
}

/// Lowercased, trimmed `type` attribute of a `<meta>` element
fn normalized_type(meta: &Element) -> Option<String> {
    meta.attribute(TYPE).map(|t| t.trim().to_lowercase())
}

fn push_entries(head: &mut Element, entries: &[(&'static str, &str)]) {
    let name = prefixed(&head.name, META);
    for (kind, value) in entries {
        head.children.push(XmlNode::Element(
            Element::new(name.as_str())
                .with_attribute(TYPE, *kind)
                .with_text(*value),
        ));
    }
}

/// Sort key of a `<meta>` entry; unknown types come after `tag`
fn meta_rank(meta: &Element) -> usize {
    normalized_type(meta)
        .and_then(|kind| META_ORDER.iter().position(|known| *known == kind))
        .unwrap_or(META_ORDER.len())
}

/// Stable-sort the `<meta>` entries of `head` in place
///
/// Only the slots already holding `<meta>` elements are reused, so other
/// children (comments, unknown elements) keep their positions.
fn sort_meta(head: &mut Element) {
    let slots: Vec<usize> = head
        .children
        .iter()
        .enumerate()
        .filter(|(_, node)| matches!(node, XmlNode::Element(e) if e.is_named(META)))
        .map(|(index, _)| index)
        .collect();

    let mut metas: Vec<Element> = slots
        .iter()
        .filter_map(|&index| {
            match std::mem::replace(&mut head.children[index], XmlNode::Text(String::new())) {
                XmlNode::Element(e) => Some(e),
                _ => None,
            }
        })
        .collect();
    metas.sort_by_key(meta_rank);

    for (index, meta) in slots.into_iter().zip(metas) {
        head.children[index] = XmlNode::Element(meta);
    }
}
