//! Text normalization
//! Turns raw problem descriptions and user queries into stopword-free token strings

use crate::stopwords::is_stopword;

/// Normalizes free text for indexing and lookup.
///
/// Lowercases the input, removes every character that is not an ASCII
/// letter, digit or whitespace, drops English stopwords and joins the
/// remaining tokens with single spaces.
///
/// # Examples
///
/// ```
/// use fixbot::text::normalize;
///
/// assert_eq!(normalize("My Printer is NOT printing!!"), "printer printing");
/// assert_eq!(normalize(""), "");
/// ```
pub fn normalize(text: &str) -> String {
    let lowered = text.to_lowercase();

    let cleaned: String = lowered
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c.is_whitespace())
        .collect();

    cleaned
        .split_whitespace()
        .filter(|word| !is_stopword(word))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Splits an already normalized text into tokens.
pub fn tokens(normalized: &str) -> impl Iterator<Item = &str> {
    normalized.split_whitespace()
}
