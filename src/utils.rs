//! Utility functions: natural ordering and the filesystem boundary
//!
//! Reading resolves `.gz` files transparently; writing goes through a
//! temporary file in the destination directory that is persisted in one step.

use crate::error::{Error, Result};
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use std::cmp::Ordering;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Compare two strings in natural order
///
/// Runs of ASCII digits are compared by numeric value, everything else
/// character by character, so `file2` sorts before `file10`. When two
/// strings are equal under that rule (`a01` vs `a1`), plain string order
/// breaks the tie so the ordering stays total.
///
/// # Examples
///
/// ```
/// use std::cmp::Ordering;
/// use nzb_rs::utils::natural_cmp;
///
/// assert_eq!(natural_cmp("file2", "file10"), Ordering::Less);
/// assert_eq!(natural_cmp("alt.binaries.b", "alt.binaries.a"), Ordering::Greater);
/// ```
#[must_use]
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut left = a.chars().peekable();
    let mut right = b.chars().peekable();

    loop {
        match (left.peek().copied(), right.peek().copied()) {
            (None, None) => return a.cmp(b),
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) if l.is_ascii_digit() && r.is_ascii_digit() => {
                let l_run = take_digits(&mut left);
                let r_run = take_digits(&mut right);
                let ordering = compare_digit_runs(&l_run, &r_run);
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            (Some(l), Some(r)) => {
                if l != r {
                    return l.cmp(&r);
                }
                left.next();
                right.next();
            }
        }
    }
}

fn take_digits(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut run = String::new();
    while let Some(c) = chars.peek().copied() {
        if !c.is_ascii_digit() {
            break;
        }
        run.push(c);
        chars.next();
    }
    run
}

/// Compare digit runs by value without parsing (runs may exceed `u64`)
fn compare_digit_runs(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

/// Sort and deduplicate strings in natural order
#[must_use]
pub fn natural_sorted_unique<I>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut items: Vec<String> = items.into_iter().collect();
    items.sort_by(|a, b| natural_cmp(a, b));
    items.dedup();
    items
}

/// Check whether a path carries a `.gz` suffix (case-insensitive)
fn is_gzip_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("gz"))
}

/// Read an NZB document from disk as UTF-8 text
///
/// Files ending in `.gz` are decompressed first. A missing file is reported
/// as [`Error::FileNotFound`]; a corrupt gzip stream or invalid UTF-8 as
/// [`Error::Decode`]. Nothing is retried.
pub fn read_nzb_text(path: &Path) -> Result<String> {
    if !path.is_file() {
        return Err(Error::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let raw = std::fs::read(path)?;
    let gzip = is_gzip_path(path);

    let bytes = if gzip {
        let mut decoded = Vec::new();
        GzDecoder::new(raw.as_slice())
            .read_to_end(&mut decoded)
            .map_err(|e| Error::Decode {
                path: path.to_path_buf(),
                reason: format!("invalid gzip stream: {}", e),
            })?;
        decoded
    } else {
        raw
    };

    tracing::debug!(path = %path.display(), bytes = bytes.len(), gzip, "Read NZB file");

    String::from_utf8(bytes).map_err(|e| Error::Decode {
        path: path.to_path_buf(),
        reason: format!("content is not valid UTF-8: {}", e),
    })
}

/// Write text to `path` atomically
///
/// Missing parent directories are created. If the file exists and
/// `overwrite` is false, [`Error::FileExists`] is returned before anything
/// is written. The text is written to a temporary file next to the
/// destination and then renamed into place, so readers never see a partial
/// document.
///
/// Paths ending in `.gz` are gzip-compressed, mirroring [`read_nzb_text`].
///
/// Returns the absolute path of the written file.
pub fn write_atomic(path: &Path, text: &str, overwrite: bool) -> Result<PathBuf> {
    if path.exists() && !overwrite {
        return Err(Error::FileExists {
            path: path.to_path_buf(),
        });
    }

    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&parent)?;

    let gzip = is_gzip_path(path);
    let mut temp = NamedTempFile::new_in(&parent)?;
    if gzip {
        let mut encoder = GzEncoder::new(temp.as_file_mut(), Compression::default());
        encoder.write_all(text.as_bytes())?;
        encoder.finish()?;
    } else {
        temp.write_all(text.as_bytes())?;
    }
    temp.as_file().sync_all()?;

    if overwrite {
        temp.persist(path).map_err(|e| Error::Io(e.error))?;
    } else {
        // Another writer may have created the file since the check above
        temp.persist_noclobber(path).map_err(|e| {
            if e.error.kind() == std::io::ErrorKind::AlreadyExists {
                Error::FileExists {
                    path: path.to_path_buf(),
                }
            } else {
                Error::Io(e.error)
            }
        })?;
    }

    tracing::debug!(path = %path.display(), bytes = text.len(), gzip, overwrite, "Wrote NZB file");

    Ok(std::fs::canonicalize(path)?)
}
