//! Obfuscated filename detection
//!
//! Usenet releases often use obfuscated (random or hashed) filenames to evade
//! automated takedowns. This module decides, from the stem alone, whether a
//! name looks like a human-readable release name or like noise.
//!
//! The heuristic is best-effort. It mirrors the thresholds used by SABnzbd so
//! that results agree with what download clients report, but it is not a
//! guarantee in either direction.

/// Exact length of an MD5-style hex stem (`b082fa0beaa644d3aa01045d5b8d0b36`).
const HEX_HASH_LENGTH: usize = 32;

/// Minimum length of a stem made only of lowercase hex digits and dots.
const MIN_DOTTED_HEX_LENGTH: usize = 40;

/// Minimum run of hex digits that, together with bracketed tokens, marks a stem as obfuscated.
const MIN_BRACKETED_HEX_RUN: usize = 30;

/// Number of `[word]` tokens required alongside a long hex run.
const MIN_BRACKETED_TOKENS: usize = 2;

/// Prefix used by a known obfuscating poster (`abc.xyz.a4c567edbcbf27.BLA`).
const KNOWN_OBFUSCATED_PREFIX: &str = "abc.xyz";

/// Highest uppercase/lowercase ratio for a capitalised word to count as readable ("Catullus").
const MAX_CAPITALISED_RATIO: f64 = 0.25;

/// Check if a file stem (the name without its extension) appears to be obfuscated
///
/// The checks run in a fixed order and the first decisive one wins:
///
/// 1. Patterns that are certainly obfuscated: exactly 32 lowercase hex
///    digits; 40+ characters of lowercase hex and dots; a 30+ hex-digit run
///    together with at least two `[word]` tokens; the `abc.xyz` prefix.
/// 2. Signals of a readable name, computed from character-class counts:
///    mixed case with a separator ("Great Distro"), three or more
///    separators ("this is a download"), letters plus a year-like number
///    ("Beast 2020"), or a capitalised mostly-lowercase word ("Catullus").
/// 3. Everything else is considered obfuscated, including the empty stem.
///
/// # Examples
///
/// ```
/// use nzb_rs::deobfuscation::is_obfuscated;
///
/// assert!(is_obfuscated("b082fa0beaa644d3aa01045d5b8d0b36"));
/// assert!(is_obfuscated("abc-mr2a"));
/// assert!(!is_obfuscated("Big Buck Bunny - S01E01"));
/// assert!(!is_obfuscated("Catullus"));
/// ```
#[must_use]
pub fn is_obfuscated(stem: &str) -> bool {
    if stem.is_empty() {
        return true;
    }

    if is_certainly_obfuscated(stem) {
        return true;
    }

    !is_clearly_readable(stem)
}

/// Patterns that are certainly obfuscated
fn is_certainly_obfuscated(stem: &str) -> bool {
    // ...blabla.H.264/b082fa0beaa644d3aa01045d5b8d0b36.mkv
    if stem.chars().count() == HEX_HASH_LENGTH && stem.chars().all(is_lower_hex) {
        return true;
    }

    // 0675e29e9abfd2.f7d069dab0b853283cc1b069a25f82.6547
    if stem.chars().count() >= MIN_DOTTED_HEX_LENGTH
        && stem.chars().all(|c| is_lower_hex(c) || c == '.')
    {
        return true;
    }

    // [BlaBla] something [More] something 5937bc5e32146e.bef89a622e4a23f07b0d3757ad5e8a.a02b264e [Brrr]
    if longest_hex_run(stem) >= MIN_BRACKETED_HEX_RUN
        && count_bracketed_words(stem) >= MIN_BRACKETED_TOKENS
    {
        return true;
    }

    stem.starts_with(KNOWN_OBFUSCATED_PREFIX)
}

/// Signals of a typical, human-readable name
fn is_clearly_readable(stem: &str) -> bool {
    let mut digits = 0usize;
    let mut upper = 0usize;
    let mut lower = 0usize;
    let mut separators = 0usize;

    for c in stem.chars() {
        if c.is_numeric() {
            digits += 1;
        }
        if c.is_uppercase() {
            upper += 1;
        }
        if c.is_lowercase() {
            lower += 1;
        }
        if matches!(c, ' ' | '.' | '_') {
            separators += 1;
        }
    }

    // "Great Distro"
    if upper >= 2 && lower >= 2 && separators >= 1 {
        return true;
    }

    // "this is a download"
    if separators >= 3 {
        return true;
    }

    // "Beast 2020"
    if upper + lower >= 4 && digits >= 4 && separators >= 1 {
        return true;
    }

    // "Catullus"
    let starts_upper = stem.chars().next().is_some_and(char::is_uppercase);
    starts_upper && lower > 2 && (upper as f64 / lower as f64) <= MAX_CAPITALISED_RATIO
}

fn is_lower_hex(c: char) -> bool {
    matches!(c, '0'..='9' | 'a'..='f')
}

/// Length of the longest run of lowercase hex digits
fn longest_hex_run(stem: &str) -> usize {
    let mut longest = 0;
    let mut current = 0;
    for c in stem.chars() {
        if is_lower_hex(c) {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    longest
}

/// Number of non-overlapping `[word]` tokens (one or more word characters in brackets)
fn count_bracketed_words(stem: &str) -> usize {
    let chars: Vec<char> = stem.chars().collect();
    let mut count = 0;
    let mut i = 0;

    while i < chars.len() {
        if chars[i] == '[' {
            let word_len = chars[i + 1..]
                .iter()
                .take_while(|c| c.is_alphanumeric() || **c == '_')
                .count();
            let close = i + 1 + word_len;
            if word_len > 0 && chars.get(close) == Some(&']') {
                count += 1;
                i = close + 1;
                continue;
            }
        }
        i += 1;
    }

    count
}
