//! Theme keywords, stopwords and era detection used by the offline
//! thematic extractor and the deterministic title.

use super::contains_term;
use lazy_static::lazy_static;
use regex::Regex;

/// Padding for a thematic context with fewer than three themes.
pub static DEFAULT_THEMES: [&str; 3] = ["emotion", "atmosphere", "story"];

/// Padding for a thematic context with fewer than two moods.
pub static DEFAULT_MOODS: [&str; 2] = ["reflective", "evocative"];

/// (theme, keywords) pairs.
static THEME_KEYWORDS: &[(&str, &[&str])] = &[
    ("love", &["love", "heart", "romance", "kiss", "lover", "valentine"]),
    ("loss", &["loss", "lost", "goodbye", "grief", "missing", "farewell"]),
    ("night", &["night", "midnight", "moon", "moonlight", "stars", "nocturnal"]),
    ("summer", &["summer", "sun", "beach", "sunshine", "heatwave"]),
    ("rain", &["rain", "rainy", "storm", "thunder", "drizzle"]),
    ("city", &["city", "streets", "downtown", "neon", "skyline", "subway"]),
    ("journey", &["road", "journey", "travel", "highway", "train", "trains", "driving"]),
    ("nature", &["forest", "ocean", "sea", "mountain", "river", "garden"]),
    ("memory", &["memories", "childhood", "remember", "yesterday", "hometown"]),
    ("hope", &["hope", "sunrise", "dawn", "tomorrow", "new beginning"]),
    ("freedom", &["freedom", "free", "escape", "wild", "open road"]),
    ("solitude", &["alone", "lonely", "solitude", "empty room", "isolation"]),
    ("celebration", &["party", "dance", "celebrate", "celebration", "festival"]),
    ("rebellion", &["rebel", "rebellion", "riot", "revolution", "defiance"]),
    ("winter", &["winter", "snow", "frost", "cold", "december"]),
    ("space", &["space", "galaxy", "cosmos", "planet", "orbit"]),
];

/// Words ignored when picking significant words from a description.
pub static STOPWORDS: &[&str] = &[
    "a", "an", "the", "and", "or", "but", "of", "to", "in", "on", "at", "for", "with", "about",
    "from", "by", "into", "over", "under", "is", "are", "was", "be", "it", "its", "this", "that",
    "my", "your", "our", "their", "some", "song", "track", "piece", "tune", "music", "like",
    "very", "really", "just", "make", "write", "want", "please", "me", "i", "we", "you",
];

lazy_static! {
    static ref ERA_REGEX: Regex =
        Regex::new(r"(?i)\b((?:19|20)[0-9]0s|[0-9]0s|fifties|sixties|seventies|eighties|nineties)\b")
            .expect("Failed to compile era regex");
}

/// All (theme, keywords) entries.
pub fn all() -> &'static [(&'static str, &'static [&'static str])] {
    THEME_KEYWORDS
}

/// Themes whose keywords appear in `text`, in registry order.
pub fn detect_in_text(text: &str) -> Vec<&'static str> {
    THEME_KEYWORDS
        .iter()
        .filter(|(_, keywords)| keywords.iter().any(|k| contains_term(text, k)))
        .map(|(theme, _)| *theme)
        .collect()
}

/// An era reference such as "80s", "1990s" or "seventies".
pub fn detect_era(text: &str) -> Option<String> {
    ERA_REGEX
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim_start_matches('\'').to_lowercase())
}

pub fn is_stopword(word: &str) -> bool {
    STOPWORDS.iter().any(|s| s.eq_ignore_ascii_case(word))
}

/// Words of `text` that are not stopwords, punctuation stripped, in order.
pub fn significant_words(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(|w| {
            w.trim_matches(|c: char| !c.is_alphanumeric() && c != '\'' && c != '-')
                .trim_matches('\'')
                .to_string()
        })
        .filter(|w| !w.is_empty() && !is_stopword(w))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_themes() {
        assert_eq!(
            detect_in_text("driving through the city at midnight"),
            vec!["night", "city", "journey"]
        );
        assert!(detect_in_text("a melancholic piano piece").is_empty());
    }

    #[test]
    fn test_detect_era() {
        assert_eq!(detect_era("an 80s synth anthem").as_deref(), Some("80s"));
        assert_eq!(detect_era("1970s soul").as_deref(), Some("1970s"));
        assert_eq!(detect_era("late Nineties pop").as_deref(), Some("nineties"));
        assert_eq!(detect_era("a '90s throwback").as_deref(), Some("90s"));
        assert!(detect_era("a song about 1000 trains").is_none());
    }

    #[test]
    fn test_significant_words() {
        assert_eq!(
            significant_words("a melancholic piano piece"),
            vec!["melancholic", "piano"]
        );
        assert_eq!(
            significant_words("Rain, on the (old) window!"),
            vec!["Rain", "old", "window"]
        );
        assert!(significant_words("a song about it").is_empty());
    }

    #[test]
    fn test_defaults_are_distinct() {
        assert_ne!(DEFAULT_THEMES[0], DEFAULT_THEMES[1]);
        assert_ne!(DEFAULT_THEMES[1], DEFAULT_THEMES[2]);
        assert_ne!(DEFAULT_MOODS[0], DEFAULT_MOODS[1]);
    }
}
