//! Static content registries.
//!
//! Read-only word pools the template builder draws from: genres, moods,
//! instruments, chord progressions, production descriptors and theme keywords.
//! Nothing here holds state; lookups are plain functions over `static` tables.

pub mod chords;
pub mod genres;
pub mod instruments;
pub mod moods;
pub mod production;
pub mod themes;

pub use chords::ChordProgression;
pub use genres::Genre;
pub use instruments::Instrument;
pub use moods::Mood;

/// Whether `term` occurs in `haystack` as a whole word or phrase.
///
/// Both arguments are compared case-insensitively. A match must not be
/// glued to surrounding letters or digits, so "rap" does not match "wrap".
pub fn contains_term(haystack: &str, term: &str) -> bool {
    let haystack = haystack.to_lowercase();
    let term = term.to_lowercase();
    if term.is_empty() {
        return false;
    }

    let mut start = 0;
    while let Some(pos) = haystack[start..].find(&term) {
        let begin = start + pos;
        let end = begin + term.len();

        let before_ok = haystack[..begin]
            .chars()
            .next_back()
            .map_or(true, |c| !c.is_alphanumeric());
        let after_ok = haystack[end..]
            .chars()
            .next()
            .map_or(true, |c| !c.is_alphanumeric());

        if before_ok && after_ok {
            return true;
        }

        // Step past the first char of this occurrence.
        start = begin
            + haystack[begin..]
                .chars()
                .next()
                .map_or(1, |c| c.len_utf8());
    }
    false
}
