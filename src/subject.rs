//! Filename extraction from free-text subject lines
//!
//! NZB files do not carry filenames; the name has to be recovered from the
//! `subject` attribute of each `<file>`. Posters format subjects in many ways,
//! so several patterns are tried from most to least specific.

use regex::Regex;
use std::sync::LazyLock;

// -- Subject patterns, most specific first --

/// `... "filename.ext" ...` (greedy, first quote to last quote)
#[allow(clippy::expect_used)]
static RE_QUOTED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""(.*)""#).expect("valid quoted subject regex"));

/// `[01/42] - filename.ext yEnc (1/100) 12345678`
#[allow(clippy::expect_used)]
static RE_YENC_POSTING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[\[(]\d+/\d+[\])]\s-\s(.*)\syEnc\s[\[(]\d+/\d+[\])]\s\d+$")
        .expect("valid yEnc posting regex")
});

/// Anything that looks like a filename with a 2-4 character extension
#[allow(clippy::expect_used)]
static RE_LOOSE_FILENAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b([\w\-+()' .,]+(?:\[[\w\-/+()' .,]*\][\w\-+()' .,]*)*\.[A-Za-z0-9]{2,4})\b",
    )
    .expect("valid loose filename regex")
});

/// Extract the filename (with extension) from a subject line
///
/// Tried in order until one yields a non-empty name:
///
/// 1. The text between the first and the last double quote. Most posting
///    tools quote the filename.
/// 2. The strict yEnc posting layout `[n/m] - <name> yEnc (n/m) <bytes>`.
/// 3. The first token that looks like a filename ending in a dot and a
///    2-4 character extension.
///
/// Returns `None` when nothing matches.
///
/// # Examples
///
/// ```
/// use nzb_rs::subject::extract_filename;
///
/// assert_eq!(
///     extract_filename(r#"[1/1] - "My File.mkv" yEnc (1/2) 1478616"#).as_deref(),
///     Some("My File.mkv")
/// );
/// assert_eq!(
///     extract_filename("Here's your file!  abc-mr2a.r01 (1/2)").as_deref(),
///     Some("abc-mr2a.r01")
/// );
/// assert_eq!(extract_filename("no filename here"), None);
/// ```
#[must_use]
pub fn extract_filename(subject: &str) -> Option<String> {
    let patterns: [&Regex; 3] = [&*RE_QUOTED, &*RE_YENC_POSTING, &*RE_LOOSE_FILENAME];

    patterns.iter().find_map(|re| {
        re.captures(subject)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim())
            .filter(|name| !name.is_empty())
            .map(str::to_string)
    })
}
