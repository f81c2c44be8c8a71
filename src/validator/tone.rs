/*!
 * Tone checks: forbidden vocabulary and promotional language.
 *
 * Forbidden words are a hard reject; the promotional screen only raises
 * soft findings. Matching is case-insensitive and whole-word, so
 * "revolution" does not trip "revolutionary" and vice versa.
 */

use once_cell::sync::Lazy;
use regex::Regex;

/// Superlative/marketing vocabulary that reads as promotional.
///
/// These are not configurable rejections like forbidden words; they feed
/// the soft promotional screen.
static PROMOTIONAL_WORDS: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        "amazing",
        "incredible",
        "unmatched",
        "unparalleled",
        "best-in-class",
        "state-of-the-art",
        "ultimate",
        "premier",
        "flawless",
        "perfect",
        "effortlessly",
        "seamlessly",
    ]
});

/// A whole-word, case-insensitive occurrence check
fn contains_word(text: &str, word: &str) -> bool {
    let pattern = format!(r"(?i)\b{}\b", regex::escape(word));
    match Regex::new(&pattern) {
        Ok(re) => re.is_match(text),
        Err(_) => false,
    }
}

/// Find forbidden words present in the text, in policy order
pub fn find_forbidden_words(text: &str, forbidden: &[String]) -> Vec<String> {
    forbidden
        .iter()
        .filter(|word| contains_word(text, word))
        .cloned()
        .collect()
}

/// Find promotional vocabulary present in the text
pub fn find_promotional_words(text: &str) -> Vec<String> {
    PROMOTIONAL_WORDS
        .iter()
        .filter(|word| contains_word(text, word))
        .map(|w| w.to_string())
        .collect()
}
