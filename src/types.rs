//! Core types: the NZB document model
//!
//! All types here are immutable values. [`File`] and [`Nzb`] can only be
//! obtained from the parser or the JSON bridge, both of which enforce the
//! structural invariants (at least one file; every file with at least one
//! group and one segment). Derived properties such as sizes, names and
//! classifications are computed on demand.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::deobfuscation;
use crate::filename::{is_par2, is_rar, split_extension};
use crate::json::{FileRecord, NzbRecord};
use crate::subject::extract_filename;
use crate::utils::natural_sorted_unique;

/// Optional creator-supplied metadata from the `<head>` block
///
/// A document without `<head>`, or without particular `<meta>` entries,
/// simply yields empty values here.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Meta {
    /// Title
    #[serde(default)]
    pub title: Option<String>,

    /// Passwords, in document order (may repeat)
    #[serde(default)]
    pub passwords: Vec<String>,

    /// Tags, in document order (may repeat)
    #[serde(default)]
    pub tags: Vec<String>,

    /// Category
    #[serde(default)]
    pub category: Option<String>,
}

impl Meta {
    /// The first password, if any
    pub fn password(&self) -> Option<&str> {
        self.passwords.first().map(String::as_str)
    }

    /// The first tag, if any
    pub fn tag(&self) -> Option<&str> {
        self.tags.first().map(String::as_str)
    }

    /// True if no metadata field is set
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.passwords.is_empty()
            && self.tags.is_empty()
            && self.category.is_none()
    }
}

/// One numbered chunk (article) of a file
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Segment {
    /// Size of the segment in bytes
    pub size: u64,

    /// Segment number, starting at 1
    pub number: u32,

    /// Message-ID of the article, without angle brackets
    pub message_id: String,
}

/// A complete file, made up of one or more segments
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "FileRecord")]
pub struct File {
    poster: String,
    posted_at: DateTime<Utc>,
    subject: String,
    groups: Vec<String>,
    segments: Vec<Segment>,
}

impl File {
    /// Build a file from already-validated parts
    ///
    /// Callers guarantee non-empty `groups` and `segments`, groups in
    /// natural order and segments ordered by number.
    pub(crate) fn from_validated(
        poster: String,
        posted_at: DateTime<Utc>,
        subject: String,
        groups: Vec<String>,
        segments: Vec<Segment>,
    ) -> Self {
        debug_assert!(!groups.is_empty() && !segments.is_empty());
        Self {
            poster,
            posted_at,
            subject,
            groups,
            segments,
        }
    }

    /// The poster of the file
    pub fn poster(&self) -> &str {
        &self.poster
    }

    /// When the file was posted, in UTC
    pub fn posted_at(&self) -> DateTime<Utc> {
        self.posted_at
    }

    /// The subject line of the file
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Newsgroups the file was posted to, in natural order (never empty)
    pub fn groups(&self) -> &[String] {
        &self.groups
    }

    /// Segments of the file, ordered by number (never empty)
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Size of the file: the sum of its segment sizes
    ///
    /// Saturates at `u64::MAX` instead of overflowing.
    pub fn size(&self) -> u64 {
        self.segments
            .iter()
            .fold(0u64, |total, s| total.saturating_add(s.size))
    }

    /// Filename extracted from the subject, if one can be found
    pub fn name(&self) -> Option<String> {
        extract_filename(&self.subject)
    }

    /// [`File::name`] without its extension
    pub fn stem(&self) -> Option<String> {
        self.name()
            .map(|name| split_extension(&name).0.to_string())
    }

    /// Extension of [`File::name`], without the leading dot
    pub fn extension(&self) -> Option<String> {
        self.name()
            .and_then(|name| split_extension(&name).1.map(str::to_string))
    }

    /// Check the extension case-insensitively; `ext` may include a leading dot
    ///
    /// ```
    /// # let nzb = nzb_rs::Nzb::parse(r#"<nzb><file poster="p" date="0" subject="&quot;movie.MKV&quot;"><groups><group>a.b</group></groups><segments><segment bytes="1" number="1">id@x</segment></segments></file></nzb>"#).unwrap();
    /// let file = nzb.file();
    /// assert!(file.has_extension(".mkv"));
    /// assert!(file.has_extension("MKV"));
    /// assert!(!file.has_extension("avi"));
    /// ```
    pub fn has_extension(&self, ext: &str) -> bool {
        let wanted = ext.strip_prefix('.').unwrap_or(ext);
        self.extension()
            .is_some_and(|actual| actual.to_lowercase() == wanted.to_lowercase())
    }

    /// True if the file is a `.par2` file
    pub fn is_par2(&self) -> bool {
        self.name().is_some_and(|name| is_par2(&name))
    }

    /// True if the file belongs to a rar archive set
    pub fn is_rar(&self) -> bool {
        self.name().is_some_and(|name| is_rar(&name))
    }

    /// True if the filename looks obfuscated
    ///
    /// A file whose name cannot be extracted at all counts as obfuscated.
    /// This is a heuristic, see [`deobfuscation::is_obfuscated`].
    pub fn is_obfuscated(&self) -> bool {
        match self.stem() {
            Some(stem) => deobfuscation::is_obfuscated(&stem),
            None => true,
        }
    }
}

/// A complete NZB document
///
/// # Example
///
/// ```
/// use nzb_rs::Nzb;
///
/// let text = r#"<?xml version="1.0" encoding="UTF-8"?>
/// <!DOCTYPE nzb PUBLIC "-//newzBin//DTD NZB 1.1//EN" "http://www.newzbin.com/DTD/nzb/nzb-1.1.dtd">
/// <nzb xmlns="http://www.newzbin.com/DTD/2003/nzb">
///     <head>
///         <meta type="title">Big Buck Bunny - S01E01.mkv</meta>
///         <meta type="category">TV</meta>
///     </head>
///     <file poster="John &lt;nzb@nowhere.example&gt;" date="1706440708" subject="[1/1] - &quot;Big Buck Bunny - S01E01.mkv&quot; yEnc (1/2) 1478616">
///         <groups>
///             <group>alt.binaries.boneless</group>
///         </groups>
///         <segments>
///             <segment bytes="739067" number="1">9cacde4c986547369becbf97003fb2c5-9483514693959@example</segment>
///             <segment bytes="739549" number="2">70a3a038ce324e618e2751e063d6a036-7285710986748@example</segment>
///         </segments>
///     </file>
/// </nzb>"#;
///
/// let nzb = Nzb::parse(text)?;
/// assert_eq!(nzb.meta().category.as_deref(), Some("TV"));
/// assert_eq!(nzb.file().name().as_deref(), Some("Big Buck Bunny - S01E01.mkv"));
/// assert_eq!(nzb.size(), 739067 + 739549);
/// # Ok::<(), nzb_rs::Error>(())
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "NzbRecord")]
pub struct Nzb {
    meta: Meta,
    files: Vec<File>,
}

impl Nzb {
    /// Build a document from already-validated parts (`files` is non-empty)
    pub(crate) fn from_validated(meta: Meta, files: Vec<File>) -> Self {
        debug_assert!(!files.is_empty());
        Self { meta, files }
    }

    /// Metadata from the `<head>` block
    pub fn meta(&self) -> &Meta {
        &self.meta
    }

    /// Files in the document, ordered by subject (never empty)
    pub fn files(&self) -> &[File] {
        &self.files
    }

    /// The main content file (episode, movie, ...)
    ///
    /// This is the largest file by size, which is a heuristic and may not
    /// always be right. On ties the first file wins.
    pub fn file(&self) -> &File {
        let mut largest = &self.files[0];
        for file in &self.files[1..] {
            if file.size() > largest.size() {
                largest = file;
            }
        }
        largest
    }

    /// Total size of all files, saturating at `u64::MAX`
    pub fn size(&self) -> u64 {
        self.files
            .iter()
            .fold(0u64, |total, f| total.saturating_add(f.size()))
    }

    /// Unique filenames in natural order (files without a name are skipped)
    pub fn filenames(&self) -> Vec<String> {
        natural_sorted_unique(self.files.iter().filter_map(File::name))
    }

    /// Unique file stems in natural order
    pub fn stems(&self) -> Vec<String> {
        natural_sorted_unique(self.files.iter().filter_map(File::stem))
    }

    /// Unique file extensions in natural order
    pub fn extensions(&self) -> Vec<String> {
        natural_sorted_unique(self.files.iter().filter_map(File::extension))
    }

    /// Unique posters in natural order
    pub fn posters(&self) -> Vec<String> {
        natural_sorted_unique(self.files.iter().map(|f| f.poster.clone()))
    }

    /// Unique newsgroups across all files, in natural order
    pub fn groups(&self) -> Vec<String> {
        natural_sorted_unique(self.files.iter().flat_map(|f| f.groups.iter().cloned()))
    }

    /// Total size of all `.par2` files
    pub fn par2_size(&self) -> u64 {
        self.files
            .iter()
            .filter(|f| f.is_par2())
            .fold(0u64, |total, f| total.saturating_add(f.size()))
    }

    /// Share of `.par2` data in the total size, as a percentage
    ///
    /// Returns 0.0 for a document whose total size is zero.
    pub fn par2_percentage(&self) -> f64 {
        let total = self.size();
        if total == 0 {
            return 0.0;
        }
        (self.par2_size() as f64 / total as f64) * 100.0
    }

    /// True if at least one file is a `.par2` file
    pub fn has_par2(&self) -> bool {
        self.files.iter().any(File::is_par2)
    }

    /// True if at least one file belongs to a rar archive set
    pub fn has_rar(&self) -> bool {
        self.files.iter().any(File::is_rar)
    }

    /// True if every file belongs to a rar archive set
    pub fn is_rar(&self) -> bool {
        self.files.iter().all(File::is_rar)
    }

    /// True if any file looks obfuscated
    pub fn is_obfuscated(&self) -> bool {
        self.files.iter().any(File::is_obfuscated)
    }
}
