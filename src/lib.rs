//! # nzb-rs
//!
//! Parsing, validation and metadata editing for NZB documents.
//!
//! An NZB is an XML document that lists the Usenet articles (segments)
//! making up one or more files. This crate turns such a document into a
//! strict, immutable model ([`Nzb`]) and derives useful information from
//! it: filenames recovered from subject lines, par2 and rar detection, and
//! a heuristic for obfuscated names.
//!
//! ## Design
//!
//! - **Strict model** - an [`Nzb`] always has at least one file, and every
//!   file has at least one group and one segment
//! - **All-or-nothing parsing** - a broken document yields an error, never a
//!   partial model; only individually corrupt segments are dropped
//! - **Separate editor** - [`NzbMetaEditor`] edits the `<head>` block on a
//!   raw XML tree, so it also works on documents the parser would reject
//! - **No hidden I/O** - the only disk access is through the explicit
//!   `from_file`, `to_file` and `save` entry points
//!
//! ## Quick Start
//!
//! ```
//! use nzb_rs::Nzb;
//!
//! let text = r#"<?xml version="1.0" encoding="UTF-8"?>
//! <nzb xmlns="http://www.newzbin.com/DTD/2003/nzb">
//!     <head>
//!         <meta type="password">secret</meta>
//!     </head>
//!     <file poster="John &lt;nzb@nowhere.example&gt;" date="1706440708" subject="[1/1] - &quot;Big Buck Bunny - S01E01.mkv&quot; yEnc (1/2) 1478616">
//!         <groups>
//!             <group>alt.binaries.boneless</group>
//!         </groups>
//!         <segments>
//!             <segment bytes="739067" number="1">9cacde4c986547369becbf97003fb2c5-9483514693959@example</segment>
//!             <segment bytes="739549" number="2">70a3a038ce324e618e2751e063d6a036-7285710986748@example</segment>
//!         </segments>
//!     </file>
//! </nzb>"#;
//!
//! let nzb: Nzb = text.parse()?;
//! assert_eq!(nzb.meta().password(), Some("secret"));
//! assert_eq!(nzb.file().extension().as_deref(), Some("mkv"));
//! assert!(!nzb.is_obfuscated());
//! # Ok::<(), nzb_rs::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Configuration types
pub mod config;
/// Obfuscated filename detection
pub mod deobfuscation;
/// Metadata editing
pub mod editor;
/// Error types
pub mod error;
/// Filename classification
pub mod filename;
/// JSON bridge
pub mod json;
/// NZB parsing and validation
pub mod parser;
/// Filename extraction from subject lines
pub mod subject;
/// Core types
pub mod types;
/// Utility functions
pub mod utils;

// Re-export commonly used types
pub use config::{EditorOptions, ParseOptions};
pub use editor::{Declaration, MetaUpdate, NzbMetaEditor};
pub use error::{Error, InvalidNzbError, Result};
pub use parser::NzbParser;
pub use types::{File, Meta, Nzb, Segment};
