//! Genre registry.

use super::contains_term;

/// Genre used when nothing else picks one and no RNG draw is wanted.
pub const DEFAULT_GENRE: &str = "pop";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Genre {
    /// Registry key, also accepted as a genre override.
    pub key: &'static str,
    /// Display name used in prompts.
    pub name: &'static str,
    /// Words that, found in free text, select this genre.
    pub keywords: &'static [&'static str],
    /// Relative weight for random selection.
    pub weight: u32,
    /// Inclusive tempo range.
    pub bpm: (u32, u32),
    /// Mood keys that suit the genre.
    pub moods: &'static [&'static str],
    pub instruments: &'static [&'static str],
    pub style_tags: &'static [&'static str],
}

static GENRES: &[Genre] = &[
    Genre {
        key: "pop",
        name: "Pop",
        keywords: &["pop", "radio pop", "mainstream"],
        weight: 10,
        bpm: (96, 124),
        moods: &["happy", "romantic", "hopeful", "energetic", "nostalgic"],
        instruments: &["bright synth", "electric piano", "punchy drums", "bass guitar", "acoustic guitar"],
        style_tags: &["catchy hooks", "polished", "radio-ready", "anthemic chorus", "glossy"],
    },
    Genre {
        key: "rock",
        name: "Rock",
        keywords: &["rock", "rock and roll", "alt rock", "grunge"],
        weight: 8,
        bpm: (100, 150),
        moods: &["energetic", "aggressive", "hopeful", "dark"],
        instruments: &["distorted guitar", "electric guitar", "bass guitar", "live drums", "hammond organ"],
        style_tags: &["driving", "raw", "guitar-driven", "stadium", "gritty"],
    },
    Genre {
        key: "hip-hop",
        name: "Hip Hop",
        keywords: &["hip hop", "hip-hop", "rap", "trap", "boom bap"],
        weight: 8,
        bpm: (80, 100),
        moods: &["energetic", "dark", "aggressive", "nostalgic"],
        instruments: &["808 bass", "sampled piano", "hi-hats", "turntable scratches", "synth pad"],
        style_tags: &["hard-hitting", "head-nodding", "sample-based", "swagger", "punchy"],
    },
    Genre {
        key: "lofi",
        name: "Lo-fi Hip Hop",
        keywords: &["lofi", "lo-fi", "lo fi", "chillhop"],
        weight: 6,
        bpm: (70, 90),
        moods: &["calm", "nostalgic", "melancholic", "dreamy"],
        instruments: &["dusty piano", "vinyl crackle", "soft drums", "mellow bass", "muted guitar"],
        style_tags: &["lofi", "tape hiss", "laid-back", "warm", "bedroom"],
    },
    Genre {
        key: "jazz",
        name: "Jazz",
        keywords: &["jazz", "bebop", "swing", "big band"],
        weight: 5,
        bpm: (80, 140),
        moods: &["romantic", "calm", "playful", "melancholic"],
        instruments: &["upright bass", "brushed drums", "saxophone", "grand piano", "muted trumpet"],
        style_tags: &["smoky", "improvised", "swinging", "late-night", "sophisticated"],
    },
    Genre {
        key: "electronic",
        name: "Electronic",
        keywords: &["electronic", "edm", "techno", "house", "electro"],
        weight: 7,
        bpm: (118, 132),
        moods: &["energetic", "dreamy", "dark", "euphoric"],
        instruments: &["analog synth", "drum machine", "arpeggiator", "sub bass", "vocal chops"],
        style_tags: &["pulsing", "four-on-the-floor", "digital", "club-ready", "hypnotic"],
    },
    Genre {
        key: "ambient",
        name: "Ambient",
        keywords: &["ambient", "drone", "soundscape"],
        weight: 4,
        bpm: (60, 80),
        moods: &["calm", "dreamy", "mysterious", "melancholic"],
        instruments: &["synth pad", "field recordings", "granular textures", "soft piano", "bowed guitar"],
        style_tags: &["atmospheric", "evolving", "spacious", "meditative", "slow-blooming"],
    },
    Genre {
        key: "classical",
        name: "Classical",
        keywords: &["classical", "symphony", "symphonic", "concerto", "orchestral"],
        weight: 3,
        bpm: (60, 120),
        moods: &["epic", "melancholic", "romantic", "calm"],
        instruments: &["orchestral strings", "grand piano", "french horn", "harp", "timpani"],
        style_tags: &["cinematic", "majestic", "dynamic", "lush", "timeless"],
    },
    Genre {
        key: "folk",
        name: "Folk",
        keywords: &["folk", "americana", "singer-songwriter"],
        weight: 5,
        bpm: (80, 110),
        moods: &["nostalgic", "melancholic", "hopeful", "calm"],
        instruments: &["acoustic guitar", "banjo", "harmonica", "fiddle", "upright bass"],
        style_tags: &["earthy", "storytelling", "organic", "intimate", "rustic"],
    },
    Genre {
        key: "rnb",
        name: "R&B",
        keywords: &["r&b", "rnb", "neo soul", "soul"],
        weight: 6,
        bpm: (65, 95),
        moods: &["romantic", "calm", "melancholic", "playful"],
        instruments: &["rhodes piano", "smooth bass", "finger snaps", "lush synth pad", "clean guitar"],
        style_tags: &["silky", "sensual", "groovy", "smooth", "velvet"],
    },
    Genre {
        key: "metal",
        name: "Metal",
        keywords: &["metal", "heavy metal", "metalcore", "thrash"],
        weight: 4,
        bpm: (120, 180),
        moods: &["aggressive", "dark", "epic", "energetic"],
        instruments: &["distorted guitar", "double kick drums", "heavy bass", "guitar solos", "choir"],
        style_tags: &["brutal", "heavy", "relentless", "aggressive", "thunderous"],
    },
    Genre {
        key: "country",
        name: "Country",
        keywords: &["country", "honky tonk", "bluegrass"],
        weight: 4,
        bpm: (85, 120),
        moods: &["nostalgic", "happy", "melancholic", "hopeful"],
        instruments: &["acoustic guitar", "pedal steel", "fiddle", "banjo", "brushed drums"],
        style_tags: &["twangy", "heartfelt", "down-home", "storytelling", "warm"],
    },
    Genre {
        key: "synthwave",
        name: "Synthwave",
        keywords: &["synthwave", "retrowave", "outrun", "vaporwave"],
        weight: 4,
        bpm: (90, 118),
        moods: &["nostalgic", "dreamy", "energetic", "mysterious"],
        instruments: &["analog synth", "gated reverb drums", "arpeggiator", "vintage drum machine", "saxophone"],
        style_tags: &["retro-futuristic", "neon", "80s", "cinematic", "shimmering"],
    },
    Genre {
        key: "indie",
        name: "Indie",
        keywords: &["indie", "indie rock", "indie pop", "shoegaze", "dream pop"],
        weight: 6,
        bpm: (90, 130),
        moods: &["dreamy", "melancholic", "hopeful", "playful"],
        instruments: &["jangly guitar", "bass guitar", "live drums", "glockenspiel", "synth pad"],
        style_tags: &["jangly", "hazy", "lo-fi charm", "earnest", "quirky"],
    },
];

/// All genres in registry order.
pub fn all() -> &'static [Genre] {
    GENRES
}

/// Look up a genre by key or display name (case-insensitive).
pub fn find(key: &str) -> Option<&'static Genre> {
    let key = key.trim();
    GENRES
        .iter()
        .find(|g| g.key.eq_ignore_ascii_case(key) || g.name.eq_ignore_ascii_case(key))
}

/// The registry default genre.
pub fn default_genre() -> &'static Genre {
    find(DEFAULT_GENRE).unwrap_or(&GENRES[0])
}

/// Find the genre whose keyword literally appears in `text`.
///
/// Longer keywords are tried first so "indie rock" beats "rock", and
/// "heavy metal" beats "metal". Ties fall back to registry order.
pub fn detect_in_text(text: &str) -> Option<(&'static Genre, &'static str)> {
    let mut candidates: Vec<(&'static Genre, &'static str)> = GENRES
        .iter()
        .flat_map(|g| g.keywords.iter().map(move |k| (g, *k)))
        .collect();
    // Stable sort keeps registry order among equal lengths.
    candidates.sort_by(|a, b| b.1.len().cmp(&a.1.len()));

    candidates
        .into_iter()
        .find(|(_, keyword)| contains_term(text, keyword))
}

/// Find the registry genre named anywhere in `text` by key, display name or keyword.
///
/// Used on free-form model replies; the longest matching term wins so
/// "Lo-fi Hip Hop" resolves to lofi rather than hip-hop.
pub fn find_mentioned(text: &str) -> Option<&'static Genre> {
    let mut candidates: Vec<(&'static Genre, &'static str)> = GENRES
        .iter()
        .flat_map(|g| {
            [g.key, g.name]
                .into_iter()
                .chain(g.keywords.iter().copied())
                .map(move |term| (g, term))
        })
        .collect();
    candidates.sort_by(|a, b| b.1.len().cmp(&a.1.len()));

    candidates
        .into_iter()
        .find(|(_, term)| contains_term(text, term))
        .map(|(g, _)| g)
}
