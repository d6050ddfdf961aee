//! Chord progression registry.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChordProgression {
    pub id: &'static str,
    pub name: &'static str,
    /// Roman-numeral pattern rendered into the prompt.
    pub pattern: &'static str,
    /// Genre keys this progression suits.
    pub genres: &'static [&'static str],
    /// Mood keys this progression suits.
    pub moods: &'static [&'static str],
}

static PROGRESSIONS: &[ChordProgression] = &[
    ChordProgression {
        id: "axis",
        name: "Axis of Awesome",
        pattern: "I-V-vi-IV",
        genres: &["pop", "rock", "country", "indie"],
        moods: &["happy", "hopeful", "energetic"],
    },
    ChordProgression {
        id: "sensitive",
        name: "Sensitive female",
        pattern: "vi-IV-I-V",
        genres: &["pop", "indie", "folk", "rock"],
        moods: &["melancholic", "hopeful", "nostalgic"],
    },
    ChordProgression {
        id: "doo-wop",
        name: "Doo-wop",
        pattern: "I-vi-IV-V",
        genres: &["pop", "rnb", "country"],
        moods: &["romantic", "nostalgic", "happy"],
    },
    ChordProgression {
        id: "jazz-251",
        name: "Jazz ii-V-I",
        pattern: "ii7-V7-Imaj7",
        genres: &["jazz", "lofi", "rnb"],
        moods: &["calm", "romantic", "playful"],
    },
    ChordProgression {
        id: "lofi-drift",
        name: "Lo-fi drift",
        pattern: "Imaj7-vi7-ii7-V7",
        genres: &["lofi", "jazz", "ambient"],
        moods: &["calm", "dreamy", "nostalgic", "melancholic"],
    },
    ChordProgression {
        id: "andalusian",
        name: "Andalusian cadence",
        pattern: "i-VII-VI-V",
        genres: &["metal", "rock", "classical", "folk"],
        moods: &["dark", "mysterious", "epic", "aggressive"],
    },
    ChordProgression {
        id: "minor-epic",
        name: "Minor epic",
        pattern: "i-VI-III-VII",
        genres: &["electronic", "metal", "classical", "synthwave", "hip-hop"],
        moods: &["epic", "dark", "euphoric", "energetic"],
    },
    ChordProgression {
        id: "twelve-bar",
        name: "Twelve-bar blues",
        pattern: "I7-IV7-I7-V7",
        genres: &["rock", "country", "jazz"],
        moods: &["playful", "energetic"],
    },
    ChordProgression {
        id: "dorian-vamp",
        name: "Dorian vamp",
        pattern: "i7-IV7",
        genres: &["hip-hop", "rnb", "electronic", "synthwave"],
        moods: &["mysterious", "calm", "dark"],
    },
    ChordProgression {
        id: "pachelbel",
        name: "Canon",
        pattern: "I-V-vi-iii-IV-I-IV-V",
        genres: &["classical", "pop", "folk"],
        moods: &["romantic", "hopeful", "epic"],
    },
    ChordProgression {
        id: "drone-two",
        name: "Two-chord drift",
        pattern: "Imaj9-IVmaj9",
        genres: &["ambient", "electronic", "indie"],
        moods: &["dreamy", "calm", "mysterious"],
    },
];

/// All progressions in registry order.
pub fn all() -> &'static [ChordProgression] {
    PROGRESSIONS
}

pub fn default_progression() -> &'static ChordProgression {
    &PROGRESSIONS[0]
}

pub fn find(id: &str) -> Option<&'static ChordProgression> {
    PROGRESSIONS.iter().find(|p| p.id == id)
}

/// Selection weight of `progression` for a genre/mood pair.
///
/// Genre affinity counts more than mood affinity; every progression keeps a
/// small base weight so no option is ever impossible.
pub fn affinity(progression: &ChordProgression, genre: &str, mood: &str) -> u32 {
    let mut weight = 1;
    if progression.genres.contains(&genre) {
        weight += 4;
    }
    if progression.moods.contains(&mood) {
        weight += 2;
    }
    weight
}
