//! Configuration types for nzb-rs

use serde::{Deserialize, Serialize};

/// Options that control how a document is turned into an [`Nzb`](crate::Nzb)
///
/// Everything here defaults to the behavior of the NZB 1.1 format; the
/// switches only enable compatibility with non-standard documents.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseOptions {
    /// Use `<meta type="name">` as the title when the document has no
    /// `<meta type="title">` entry (default: false)
    ///
    /// Some indexers emit `name` instead of `title`. This is not part of
    /// the format, so it is off unless asked for.
    #[serde(default)]
    pub title_from_name: bool,
}

/// Options for [`NzbMetaEditor`](crate::NzbMetaEditor) serialization
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditorOptions {
    /// Number of spaces per nesting level in the written document (default: 4)
    #[serde(default = "default_indent")]
    pub indent: usize,
}

impl Default for EditorOptions {
    fn default() -> Self {
        Self {
            indent: default_indent(),
        }
    }
}

fn default_indent() -> usize {
    4
}
