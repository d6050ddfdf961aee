//! Instrument registry.

use super::contains_term;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instrument {
    /// Canonical name used in prompts.
    pub name: &'static str,
    /// Words that identify the instrument in free text.
    pub keywords: &'static [&'static str],
}

static INSTRUMENTS: &[Instrument] = &[
    Instrument { name: "piano", keywords: &["piano", "keys", "pianist"] },
    Instrument { name: "grand piano", keywords: &["grand piano"] },
    Instrument { name: "rhodes piano", keywords: &["rhodes", "electric piano"] },
    Instrument { name: "acoustic guitar", keywords: &["acoustic guitar", "acoustic"] },
    Instrument { name: "electric guitar", keywords: &["electric guitar", "guitar"] },
    Instrument { name: "distorted guitar", keywords: &["distorted guitar", "distortion", "overdriven guitar"] },
    Instrument { name: "nylon guitar", keywords: &["nylon guitar", "classical guitar", "spanish guitar"] },
    Instrument { name: "bass guitar", keywords: &["bass guitar", "bassline", "bass"] },
    Instrument { name: "upright bass", keywords: &["upright bass", "double bass", "contrabass"] },
    Instrument { name: "808 bass", keywords: &["808", "808s"] },
    Instrument { name: "live drums", keywords: &["drums", "drummer", "drum kit"] },
    Instrument { name: "drum machine", keywords: &["drum machine", "beat machine"] },
    Instrument { name: "analog synth", keywords: &["synth", "synthesizer", "analog synth", "moog"] },
    Instrument { name: "synth pad", keywords: &["pad", "pads", "synth pad"] },
    Instrument { name: "violin", keywords: &["violin", "fiddle"] },
    Instrument { name: "cello", keywords: &["cello"] },
    Instrument { name: "orchestral strings", keywords: &["strings", "string section", "orchestra", "orchestral"] },
    Instrument { name: "choir", keywords: &["choir", "choral"] },
    Instrument { name: "saxophone", keywords: &["saxophone", "sax"] },
    Instrument { name: "trumpet", keywords: &["trumpet", "horns", "brass"] },
    Instrument { name: "flute", keywords: &["flute"] },
    Instrument { name: "harp", keywords: &["harp"] },
    Instrument { name: "music box", keywords: &["music box"] },
    Instrument { name: "glockenspiel", keywords: &["glockenspiel"] },
    Instrument { name: "celesta", keywords: &["celesta"] },
    Instrument { name: "harpsichord", keywords: &["harpsichord"] },
    Instrument { name: "organ", keywords: &["organ", "hammond"] },
    Instrument { name: "ukulele", keywords: &["ukulele", "uke"] },
    Instrument { name: "banjo", keywords: &["banjo"] },
    Instrument { name: "harmonica", keywords: &["harmonica"] },
    Instrument { name: "vocoder", keywords: &["vocoder", "talkbox"] },
];

/// All instruments in registry order.
pub fn all() -> &'static [Instrument] {
    INSTRUMENTS
}

/// Look up an instrument by canonical name.
pub fn find(name: &str) -> Option<&'static Instrument> {
    let name = name.trim();
    INSTRUMENTS.iter().find(|i| i.name.eq_ignore_ascii_case(name))
}

/// Canonical instruments mentioned in `text`, in order of first appearance.
///
/// A mention claimed by a longer keyword is not counted again for a shorter
/// one, so "grand piano" yields only "grand piano", not also "piano".
pub fn detect_in_text(text: &str) -> Vec<&'static str> {
    let lower = text.to_lowercase();

    let mut candidates: Vec<(&'static Instrument, &'static str)> = INSTRUMENTS
        .iter()
        .flat_map(|i| i.keywords.iter().map(move |k| (i, *k)))
        .collect();
    candidates.sort_by(|a, b| b.1.len().cmp(&a.1.len()));

    let mut claimed: Vec<(usize, usize)> = Vec::new();
    let mut found: Vec<(usize, &'static str)> = Vec::new();

    for (instrument, keyword) in candidates {
        if !contains_term(&lower, keyword) {
            continue;
        }
        let Some(pos) = lower.find(keyword) else {
            continue;
        };
        let end = pos + keyword.len();
        if claimed.iter().any(|(s, e)| pos < *e && end > *s) {
            continue;
        }
        claimed.push((pos, end));
        if !found.iter().any(|(_, name)| *name == instrument.name) {
            found.push((pos, instrument.name));
        }
    }

    found.sort_by_key(|(pos, _)| *pos);
    found.into_iter().map(|(_, name)| name).collect()
}
