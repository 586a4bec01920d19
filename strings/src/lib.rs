#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(rust_2018_idioms, unsafe_code)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![deny(clippy::unwrap_used)]

use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

/// Iterate over all the words of a string, whatever whitespace separates them
pub fn get_words(cadena: &str) -> impl Iterator<Item = &str> {
    cadena.split_whitespace()
}

/// Iterator that yields a space between each item from the original iterator
pub fn space_join<'a>(mut iter: impl Iterator<Item = &'a str>) -> impl Iterator<Item = &'a str> {
    SpaceJoiner {
        next_is_space: true,
        next_str: iter.next(),
        inner: iter,
    }
}

/// Collapse every run of whitespace into a single space and trim the ends
///
/// # Examples
///
/// ```
/// use strings::sanitize_spaces;
///
/// let text = "\t\t\n E-Act \n\n\t \r\n Term 1\n\t\n";
///
/// assert_eq!(sanitize_spaces(text), "E-Act Term 1".to_string());
/// ```
#[must_use]
pub fn sanitize_spaces(string: &str) -> String {
    space_join(get_words(string)).collect::<String>()
}

/// Canonical form used to compare labels typed by people: uppercase, without
/// diacritics and with single spaces
///
/// # Examples
///
/// ```
/// use strings::normalize_label;
///
/// assert_eq!(normalize_label("  Sr.No.\n"), "SR.NO.");
/// assert_eq!(normalize_label("fyjc  (xi)"), "FYJC (XI)");
/// assert_eq!(normalize_label("Dé-cembre"), "DE-CEMBRE");
/// ```
#[must_use]
pub fn normalize_label(label: &str) -> String {
    let stripped = label
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>();

    sanitize_spaces(&stripped).to_uppercase()
}

/// Alphanumeric tokens of a label, normalized
///
/// # Examples
///
/// ```
/// use strings::tokens;
///
/// assert_eq!(tokens("FYJC (xi)"), vec!["FYJC", "XI"]);
/// assert_eq!(tokens("E-Add"), vec!["E", "ADD"]);
/// ```
#[must_use]
pub fn tokens(label: &str) -> Vec<String> {
    normalize_label(label)
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Candidate closest to `needle` by edit distance, if it is not farther than `max_distance`.
/// Ties keep the first candidate.
pub fn closest<'a>(
    needle: &str,
    candidates: impl IntoIterator<Item = &'a str>,
    max_distance: usize,
) -> Option<&'a str> {
    let needle = normalize_label(needle);

    candidates
        .into_iter()
        .map(|c| (edit_distance::edit_distance(&needle, &normalize_label(c)), c))
        .filter(|(d, _)| *d <= max_distance)
        .min_by_key(|(d, _)| *d)
        .map(|(_, c)| c)
}

impl<'a, T: Iterator<Item = &'a str>> Iterator for SpaceJoiner<'a, T> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_is_space = !self.next_is_space;
        if self.next_is_space && self.next_str.is_some() {
            Some(" ")
        } else if self.next_is_space {
            None
        } else {
            let a = self.next_str;
            self.next_str = self.inner.next();
            a
        }
    }
}

pub struct SpaceJoiner<'a, I>
where
    I: Iterator<Item = &'a str>,
{
    next_is_space: bool,
    next_str: Option<&'a str>,
    inner: I,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spaces_into_string() {
        let inp = "\n\n\t\n   ALOTTED\t\t\n \n\t\n E-Act\n\n\t\t\n\n\t \n \tE-Add\n\n\t";

        let got = space_join(get_words(inp)).collect::<String>();

        assert_eq!(got, "ALOTTED E-Act E-Add");
    }

    #[test]
    fn empty_label() {
        assert_eq!(normalize_label(" \t\n"), "");
        assert!(tokens("  ").is_empty());
    }

    #[test]
    fn closest_month() {
        let months = ["JANUARY", "JUNE", "JULY", "SEPTEMBER"];

        assert_eq!(closest("juily", months, 2), Some("JULY"));
        assert_eq!(closest("septmber", months, 2), Some("SEPTEMBER"));
        assert_eq!(closest("march", months, 2), None);
    }

    #[test]
    fn marker_tokens() {
        assert_eq!(tokens("Std. XII"), vec!["STD", "XII"]);
        assert_eq!(tokens("SYJC/XII"), vec!["SYJC", "XII"]);
    }
}
