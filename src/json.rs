//! JSON bridge for the document model
//!
//! [`Nzb::to_json`] writes the document in this shape:
//!
//! ```json
//! {
//!   "meta": {"title": null, "passwords": [], "tags": [], "category": null},
//!   "files": [{
//!     "poster": "...",
//!     "posted_at": "2024-01-28T11:18:28Z",
//!     "subject": "...",
//!     "groups": ["alt.binaries.boneless"],
//!     "segments": [{"size": 739067, "number": 1, "message_id": "..."}]
//!   }]
//! }
//! ```
//!
//! [`Nzb::from_json`] accepts the same shape and applies the invariants the
//! parser enforces, so a round-trip reproduces an equal [`Nzb`].

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::types::{File, Meta, Nzb, Segment};
use crate::utils::natural_cmp;

/// Wire form of [`Nzb`], validated on conversion
#[derive(Deserialize)]
pub(crate) struct NzbRecord {
    #[serde(default)]
    meta: Meta,
    files: Vec<File>,
}

impl TryFrom<NzbRecord> for Nzb {
    type Error = String;

    fn try_from(record: NzbRecord) -> std::result::Result<Self, Self::Error> {
        if record.files.is_empty() {
            return Err("'files' must contain at least one file".to_string());
        }
        let mut files = record.files;
        files.sort_by(|a, b| a.subject().cmp(b.subject()));
        Ok(Nzb::from_validated(record.meta, files))
    }
}

/// Wire form of [`File`], validated on conversion
#[derive(Deserialize)]
pub(crate) struct FileRecord {
    poster: String,
    posted_at: DateTime<Utc>,
    subject: String,
    groups: Vec<String>,
    segments: Vec<Segment>,
}

impl TryFrom<FileRecord> for File {
    type Error = String;

    fn try_from(record: FileRecord) -> std::result::Result<Self, Self::Error> {
        let mut groups = record.groups;
        if groups.is_empty() || groups.iter().any(String::is_empty) {
            return Err(format!(
                "file '{}' must have at least one group and no empty group names",
                record.subject
            ));
        }
        groups.sort_by(|a, b| natural_cmp(a, b));

        let mut segments = record.segments;
        if segments.is_empty() {
            return Err(format!(
                "file '{}' must have at least one segment",
                record.subject
            ));
        }
        if let Some(bad) = segments
            .iter()
            .find(|s| s.number == 0 || s.message_id.is_empty())
        {
            return Err(format!(
                "file '{}' has an invalid segment (number {}, message_id '{}')",
                record.subject, bad.number, bad.message_id
            ));
        }
        segments.sort_by_key(|s| s.number);

        Ok(File::from_validated(
            record.poster,
            record.posted_at,
            record.subject,
            groups,
            segments,
        ))
    }
}

impl Nzb {
    /// Serialize the document to JSON
    ///
    /// With `pretty` the output is indented by two spaces.
    pub fn to_json(&self, pretty: bool) -> Result<String> {
        let json = if pretty {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        };
        json.map_err(|e| Error::InvalidJson {
            message: e.to_string(),
        })
    }

    /// Deserialize a document produced by [`Nzb::to_json`]
    ///
    /// Any other shape, or data that breaks the document invariants (no
    /// files, a file without groups or segments), is rejected with
    /// [`Error::InvalidJson`].
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::InvalidJson {
            message: e.to_string(),
        })
    }
}
