//! Instrument x tag coherence rules.
//!
//! Pure functions: no state, no errors. Matching is case-insensitive
//! substring matching, so "Distorted Guitar" trips the `distorted` keyword.

use serde::{Deserialize, Serialize};

/// Creativity at or below this level enforces the rules; above it bypasses them.
pub const STRICT_THRESHOLD: u8 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoherenceRule {
    pub id: &'static str,
    pub instrument_keywords: &'static [&'static str],
    pub tag_keywords: &'static [&'static str],
    pub suggestion: &'static str,
}

static RULES: [CoherenceRule; 5] = [
    CoherenceRule {
        id: "distorted-intimate",
        instrument_keywords: &["distorted", "overdriven", "fuzz", "heavy"],
        tag_keywords: &["intimate", "whisper", "hushed", "lullaby"],
        suggestion: "Pair distorted instruments with raw or driving tags, or switch to clean tones for an intimate feel",
    },
    CoherenceRule {
        id: "acoustic-digital",
        instrument_keywords: &["acoustic", "unplugged", "nylon"],
        tag_keywords: &["digital", "glitch", "bitcrush", "autotune", "vocoder"],
        suggestion: "Keep acoustic instruments with organic tags, or use synths for a digital sound",
    },
    CoherenceRule {
        id: "orchestral-lofi",
        instrument_keywords: &["orchestra", "orchestral", "symphonic", "choir", "strings section"],
        tag_keywords: &["lofi", "lo-fi", "bedroom", "tape hiss", "cassette"],
        suggestion: "Orchestral arrangements clash with lo-fi production; try cinematic or lush tags",
    },
    CoherenceRule {
        id: "delicate-aggressive",
        instrument_keywords: &["harp", "celesta", "music box", "glockenspiel", "flute"],
        tag_keywords: &["aggressive", "brutal", "hard-hitting", "abrasive", "heavy"],
        suggestion: "Delicate instruments get buried under aggressive tags; soften the tags or swap the lead",
    },
    CoherenceRule {
        id: "vintage-futuristic",
        instrument_keywords: &["vintage", "gramophone", "harpsichord", "vinyl"],
        tag_keywords: &["futuristic", "cyberpunk", "sci-fi", "space-age", "hyperpop"],
        suggestion: "Choose one era: vintage instruments with retro tags, or modern synths with futuristic tags",
    },
];

pub fn rules() -> &'static [CoherenceRule] {
    &RULES
}

/// Whether rules apply at this creativity level.
pub fn is_strict(creativity_level: u8) -> bool {
    creativity_level <= STRICT_THRESHOLD
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoherenceCheckResult {
    pub valid: bool,
    /// Ids of the rules that fired, in rule order.
    pub conflicts: Vec<String>,
    pub suggestions: Vec<String>,
}

/// Result of filtering a tag set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoherenceFix {
    /// Instruments, unchanged.
    pub instruments: Vec<String>,
    /// Tags that survived, in their original order.
    pub tags: Vec<String>,
    pub removed_tags: Vec<String>,
    pub conflicts: Vec<String>,
}

fn mentions_any(value: &str, keywords: &[&str]) -> bool {
    let value = value.to_lowercase();
    keywords.iter().any(|k| value.contains(k))
}

fn fired_rules<I: AsRef<str>, T: AsRef<str>>(
    instruments: &[I],
    tags: &[T],
    creativity_level: u8,
) -> Vec<&'static CoherenceRule> {
    if !is_strict(creativity_level) {
        return Vec::new();
    }
    RULES
        .iter()
        .filter(|rule| {
            instruments
                .iter()
                .any(|i| mentions_any(i.as_ref(), rule.instrument_keywords))
                && tags
                    .iter()
                    .any(|t| mentions_any(t.as_ref(), rule.tag_keywords))
        })
        .collect()
}

/// Report which rules the combination violates.
pub fn check_coherence<I: AsRef<str>, T: AsRef<str>>(
    instruments: &[I],
    tags: &[T],
    creativity_level: u8,
) -> CoherenceCheckResult {
    let fired = fired_rules(instruments, tags, creativity_level);
    CoherenceCheckResult {
        valid: fired.is_empty(),
        conflicts: fired.iter().map(|r| r.id.to_string()).collect(),
        suggestions: fired.iter().map(|r| r.suggestion.to_string()).collect(),
    }
}

/// Drop every tag that matches a fired rule's tag keywords.
///
/// Instruments and unrelated tags are kept. The output passes
/// [`check_coherence`] at the same creativity level.
pub fn validate_and_fix_coherence<I: AsRef<str>, T: AsRef<str>>(
    instruments: &[I],
    tags: &[T],
    creativity_level: u8,
) -> CoherenceFix {
    let fired = fired_rules(instruments, tags, creativity_level);

    let (kept, removed): (Vec<String>, Vec<String>) = tags
        .iter()
        .map(|t| t.as_ref().to_string())
        .partition(|t| !fired.iter().any(|r| mentions_any(t, r.tag_keywords)));

    CoherenceFix {
        instruments: instruments.iter().map(|i| i.as_ref().to_string()).collect(),
        tags: kept,
        removed_tags: removed,
        conflicts: fired.iter().map(|r| r.id.to_string()).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NONE: [&str; 0] = [];

    #[test]
    fn test_distorted_intimate_conflict() {
        let result = check_coherence(&["distorted guitar"], &["intimate bedroom"], 30);
        assert!(!result.valid);
        assert_eq!(result.conflicts, vec!["distorted-intimate"]);
        assert_eq!(result.suggestions.len(), 1);

        let result = check_coherence(&["distorted guitar"], &["intimate bedroom"], 80);
        assert!(result.valid);
        assert!(result.conflicts.is_empty());
    }

    #[test]
    fn test_threshold_boundary() {
        let instruments = ["Acoustic Guitar"];
        let tags = ["Glitch"];
        assert!(!check_coherence(&instruments, &tags, 60).valid);
        assert!(check_coherence(&instruments, &tags, 61).valid);
        assert!(!check_coherence(&instruments, &tags, 0).valid);
        assert!(check_coherence(&instruments, &tags, 100).valid);
    }

    #[test]
    fn test_every_rule_fires() {
        let cases = [
            ("overdriven bass", "hushed vocals", "distorted-intimate"),
            ("nylon guitar", "autotune", "acoustic-digital"),
            ("choir", "tape hiss", "orchestral-lofi"),
            ("music box", "abrasive", "delicate-aggressive"),
            ("gramophone", "cyberpunk", "vintage-futuristic"),
        ];
        for (instrument, tag, rule) in cases {
            let result = check_coherence(&[instrument], &[tag], 50);
            assert_eq!(result.conflicts, vec![rule], "{} x {}", instrument, tag);
        }
    }

    #[test]
    fn test_multiple_conflicts_in_rule_order() {
        let result = check_coherence(
            &["harpsichord", "heavy bass"],
            &["whisper", "futuristic"],
            10,
        );
        assert_eq!(
            result.conflicts,
            vec!["distorted-intimate", "vintage-futuristic"]
        );
    }

    #[test]
    fn test_empty_inputs_are_valid() {
        assert!(check_coherence(&NONE, &["intimate"], 0).valid);
        assert!(check_coherence(&["distorted guitar"], &NONE, 0).valid);
        assert!(check_coherence(&NONE, &NONE, 0).valid);
    }

    #[test]
    fn test_fix_removes_only_conflicting_tags() {
        let fix = validate_and_fix_coherence(
            &["distorted guitar", "piano"],
            &["intimate", "driving", "hushed vocals"],
            40,
        );
        assert_eq!(fix.instruments, vec!["distorted guitar", "piano"]);
        assert_eq!(fix.tags, vec!["driving"]);
        assert_eq!(fix.removed_tags, vec!["intimate", "hushed vocals"]);
        assert_eq!(fix.conflicts, vec!["distorted-intimate"]);
    }

    #[test]
    fn test_fix_can_empty_the_tags() {
        let fix = validate_and_fix_coherence(&["fuzz guitar"], &["lullaby"], 40);
        assert!(fix.tags.is_empty());
        assert!(check_coherence(&fix.instruments, &fix.tags, 40).valid);
    }

    #[test]
    fn test_fix_is_idempotent() {
        let instruments = ["choir", "flute", "acoustic guitar"];
        let tags = ["lofi", "brutal", "warm", "vocoder", "cinematic"];
        let first = validate_and_fix_coherence(&instruments, &tags, 60);
        assert_eq!(first.tags, vec!["warm", "cinematic"]);

        let second = validate_and_fix_coherence(&first.instruments, &first.tags, 60);
        assert!(second.removed_tags.is_empty());
        assert!(second.conflicts.is_empty());
        assert_eq!(second.tags, first.tags);
    }

    #[test]
    fn test_fix_is_noop_when_permissive() {
        let fix = validate_and_fix_coherence(&["distorted guitar"], &["intimate"], 90);
        assert_eq!(fix.tags, vec!["intimate"]);
        assert!(fix.removed_tags.is_empty());
    }
}
