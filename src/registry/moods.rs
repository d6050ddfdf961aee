//! Mood registry.

use super::contains_term;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mood {
    pub key: &'static str,
    /// Synonyms that identify this mood in free text.
    pub keywords: &'static [&'static str],
    /// Style tags that express the mood.
    pub tags: &'static [&'static str],
}

static MOODS: &[Mood] = &[
    Mood {
        key: "melancholic",
        keywords: &["melancholic", "melancholy", "sad", "sorrowful", "bittersweet", "wistful", "heartbroken"],
        tags: &["bittersweet", "aching", "introspective"],
    },
    Mood {
        key: "happy",
        keywords: &["happy", "joyful", "cheerful", "upbeat", "sunny", "feel-good"],
        tags: &["bright", "uplifting", "feel-good"],
    },
    Mood {
        key: "energetic",
        keywords: &["energetic", "hype", "pumped", "driving", "intense", "powerful"],
        tags: &["high-energy", "explosive", "propulsive"],
    },
    Mood {
        key: "calm",
        keywords: &["calm", "peaceful", "relaxing", "chill", "serene", "soothing", "tranquil"],
        tags: &["gentle", "soothing", "unhurried"],
    },
    Mood {
        key: "romantic",
        keywords: &["romantic", "love", "tender", "sensual", "passionate"],
        tags: &["intimate", "tender", "warm"],
    },
    Mood {
        key: "dark",
        keywords: &["dark", "ominous", "sinister", "brooding", "haunting", "gloomy"],
        tags: &["brooding", "shadowy", "tense"],
    },
    Mood {
        key: "nostalgic",
        keywords: &["nostalgic", "nostalgia", "reminiscent", "retro", "memories"],
        tags: &["wistful", "vintage-tinged", "reflective"],
    },
    Mood {
        key: "hopeful",
        keywords: &["hopeful", "optimistic", "inspiring", "uplifting"],
        tags: &["soaring", "uplifting", "luminous"],
    },
    Mood {
        key: "aggressive",
        keywords: &["aggressive", "angry", "furious", "rage", "fierce"],
        tags: &["aggressive", "abrasive", "hard-hitting"],
    },
    Mood {
        key: "dreamy",
        keywords: &["dreamy", "ethereal", "hazy", "floating", "surreal"],
        tags: &["ethereal", "floating", "hazy"],
    },
    Mood {
        key: "epic",
        keywords: &["epic", "heroic", "triumphant", "grand", "cinematic"],
        tags: &["soaring", "triumphant", "massive"],
    },
    Mood {
        key: "playful",
        keywords: &["playful", "fun", "quirky", "whimsical", "silly"],
        tags: &["bouncy", "whimsical", "cheeky"],
    },
    Mood {
        key: "mysterious",
        keywords: &["mysterious", "mystery", "enigmatic", "eerie", "mystical"],
        tags: &["enigmatic", "shadowed", "suspenseful"],
    },
    Mood {
        key: "euphoric",
        keywords: &["euphoric", "ecstatic", "blissful", "elated"],
        tags: &["euphoric", "hands-up", "blissful"],
    },
];

/// Mood reported when a prompt names no recognizable mood.
pub const NEUTRAL_MOOD: &str = "neutral";

/// All moods in registry order.
pub fn all() -> &'static [Mood] {
    MOODS
}

/// Mood used when neither the description nor the genre yields one.
pub fn default_mood() -> &'static Mood {
    find("calm").unwrap_or(&MOODS[0])
}

/// Look up a mood by key (case-insensitive).
pub fn find(key: &str) -> Option<&'static Mood> {
    let key = key.trim();
    MOODS.iter().find(|m| m.key.eq_ignore_ascii_case(key))
}

/// Map a free-form mood word to a registry mood, via key or synonym.
pub fn resolve(word: &str) -> Option<&'static Mood> {
    let word = word.trim();
    find(word).or_else(|| {
        MOODS
            .iter()
            .find(|m| m.keywords.iter().any(|k| k.eq_ignore_ascii_case(word)))
    })
}

/// Every mood whose key or synonym appears in `text`, in order of first appearance.
pub fn detect_all(text: &str) -> Vec<&'static Mood> {
    let lower = text.to_lowercase();
    let mut found: Vec<(usize, &'static Mood)> = MOODS
        .iter()
        .filter_map(|m| {
            m.keywords
                .iter()
                .filter(|k| contains_term(&lower, k))
                .filter_map(|k| lower.find(&k.to_lowercase()))
                .min()
                .map(|pos| (pos, m))
        })
        .collect();
    found.sort_by_key(|(pos, _)| *pos);
    found.into_iter().map(|(_, m)| m).collect()
}

/// The first mood mentioned in `text`.
pub fn detect_in_text(text: &str) -> Option<&'static Mood> {
    detect_all(text).into_iter().next()
}
