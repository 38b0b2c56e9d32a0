//! Word-count helpers used by length contracts.

/// Count whitespace-separated words.
///
/// # Examples
///
/// ```
/// use fabulist_core::word_count;
///
/// assert_eq!(word_count("The key turned."), 3);
/// assert_eq!(word_count("   "), 0);
/// ```
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Scale a word count by a factor, rounding down.
///
/// # Examples
///
/// ```
/// use fabulist_core::scaled_words;
///
/// assert_eq!(scaled_words(1000, 0.8), 800);
/// assert_eq!(scaled_words(0, 0.95), 0);
/// ```
pub fn scaled_words(words: usize, factor: f64) -> usize {
    (words as f64 * factor).floor() as usize
}

/// The first `max_words` words of `text`, joined by single spaces.
pub fn excerpt(text: &str, max_words: usize) -> String {
    text.split_whitespace()
        .take(max_words)
        .collect::<Vec<_>>()
        .join(" ")
}
