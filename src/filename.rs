//! Filename classification: par2 and rar-family detection, stem/extension split

/// Volume suffix letters of the old rar naming scheme (`.r00`, `.s00` ... `.v99`).
const RAR_VOLUME_LETTERS: [char; 5] = ['r', 's', 't', 'u', 'v'];

/// Check if a filename denotes a `.par2` file
///
/// The comparison is case-insensitive. An empty name is never a par2 file.
///
/// # Examples
///
/// ```
/// use nzb_rs::filename::is_par2;
///
/// assert!(is_par2("Movie.2024.vol03+04.PAR2"));
/// assert!(!is_par2("Movie.2024.par"));
/// assert!(!is_par2(""));
/// ```
#[must_use]
pub fn is_par2(filename: &str) -> bool {
    if filename.is_empty() {
        return false;
    }
    filename.to_lowercase().ends_with(".par2")
}

/// Check if a filename belongs to a rar archive set
///
/// Matches `.rar` as well as the old-style volume names `.r##`, `.s##`,
/// `.t##`, `.u##` and `.v##` (exactly two digits), case-insensitively.
///
/// # Examples
///
/// ```
/// use nzb_rs::filename::is_rar;
///
/// assert!(is_rar("abc-mr2a.r01"));
/// assert!(is_rar("release.part01.RAR"));
/// assert!(!is_rar("release.r1"));
/// assert!(!is_rar("release.par"));
/// ```
#[must_use]
pub fn is_rar(filename: &str) -> bool {
    if filename.is_empty() {
        return false;
    }

    let lower = filename.to_lowercase();
    if lower.ends_with(".rar") {
        return true;
    }

    let tail: Vec<char> = lower.chars().rev().take(4).collect();
    match tail.as_slice() {
        [d2, d1, letter, '.'] => {
            RAR_VOLUME_LETTERS.contains(letter) && d1.is_ascii_digit() && d2.is_ascii_digit()
        }
        _ => false,
    }
}

/// Split a filename into `(stem, extension)`
///
/// Only a trailing extension of 3 to 6 characters that starts with an ASCII
/// letter counts; everything else is part of the stem. Generic path
/// splitting is not used because release names are full of dots
/// (`Show.S01E01.720p` has no extension). The extension is returned without
/// the leading dot.
///
/// # Examples
///
/// ```
/// use nzb_rs::filename::split_extension;
///
/// assert_eq!(split_extension("Big Buck Bunny - S01E01.mkv"), ("Big Buck Bunny - S01E01", Some("mkv")));
/// assert_eq!(split_extension("abc-mr2a.r01"), ("abc-mr2a", Some("r01")));
/// assert_eq!(split_extension("Show.S01E01.720p"), ("Show.S01E01.720p", None));
/// ```
#[must_use]
pub fn split_extension(filename: &str) -> (&str, Option<&str>) {
    let Some(dot) = filename.rfind('.') else {
        return (filename, None);
    };

    let extension = &filename[dot + 1..];
    let mut chars = extension.chars();
    let starts_with_letter = chars.next().is_some_and(|c| c.is_ascii_alphabetic());
    let rest: Vec<char> = chars.collect();
    let rest_is_word = rest.iter().all(|c| c.is_alphanumeric() || *c == '_');

    if starts_with_letter && (2..=5).contains(&rest.len()) && rest_is_word {
        (&filename[..dot], Some(extension))
    } else {
        (filename, None)
    }
}
