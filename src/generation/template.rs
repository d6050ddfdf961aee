//! Deterministic prompt builder.
//!
//! A build happens in two steps. [`TemplateSelector::build_skeleton`] makes
//! every structural choice (genre, mood, instruments, tags, tempo, chords,
//! production) and is the only step that draws from the RNG. Rendering turns a
//! skeleton into text, optionally merging a [`ThematicContext`]. Because the
//! skeleton is shared, the merged text always contains the pure text's lines.

use super::coherence::{is_strict, validate_and_fix_coherence, CoherenceFix};
use super::request::char_count;
use super::rng::{pick, pick_weighted, range, sample_distinct, unit, PromptRng};
use super::thematic::ThematicContext;
use crate::registry::{
    chords, genres, instruments, moods, production, ChordProgression, Genre, Mood,
};
use crate::trace::{domain, DecisionTracer};
use serde::{Deserialize, Serialize};
use serde_json::json;

pub const MAX_PROMPT_CHARS: usize = 1000;
/// Chance of rendering the chord line in Standard mode.
pub const CHORD_TAG_PROBABILITY: f64 = 0.6;
pub const INSTRUMENT_COUNT: usize = 3;
const GENRE_TAG_COUNT: usize = 2;

pub const MAX_MODE_HEADER: [&str; 4] = [
    "[Is_MAX_MODE: MAX](MAX)",
    "[QUALITY: MAX](MAX)",
    "[REALISM: MAX](MAX)",
    "[REAL_INSTRUMENTS: MAX](MAX)",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptMode {
    #[default]
    Standard,
    Max,
}

impl PromptMode {
    pub fn from_max_flag(max_mode: bool) -> Self {
        if max_mode {
            PromptMode::Max
        } else {
            PromptMode::Standard
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductionDescriptor {
    pub recording: String,
    pub texture: String,
    pub space: String,
    pub mix: String,
}

impl ProductionDescriptor {
    fn render(&self) -> String {
        format!(
            "{}, {}, {}, {}",
            self.recording, self.texture, self.space, self.mix
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptMetadata {
    /// Registry genre key, or the first style tag in Direct Mode.
    pub genre: String,
    pub mood: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chord_progression: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub production: Option<ProductionDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeterministicPromptResult {
    pub text: String,
    pub metadata: PromptMetadata,
}

#[derive(Debug, Clone, Copy)]
pub struct TemplateInput<'a> {
    pub description: &'a str,
    /// Genre picked by the resolver; `None` lets the builder pick by weight.
    pub genre: Option<&'static Genre>,
    pub locked_phrase: Option<&'a str>,
    pub mode: PromptMode,
    pub creativity_level: u8,
}

#[derive(Debug, Clone, Copy)]
pub struct DirectInput<'a> {
    pub description: &'a str,
    pub styles: &'a [&'a str],
    pub locked_phrase: Option<&'a str>,
    pub mode: PromptMode,
    pub creativity_level: u8,
}

/// Structural choices for one build.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptSkeleton {
    pub genre: &'static Genre,
    pub mood: &'static Mood,
    pub instruments: Vec<String>,
    pub tempo_bpm: u32,
    /// Style tags after coherence filtering. May be empty.
    pub tags: Vec<String>,
    pub chords: &'static ChordProgression,
    pub show_chords: bool,
    pub production: ProductionDescriptor,
    pub locked_phrase: Option<String>,
    pub mode: PromptMode,
}

#[derive(Debug, Default)]
struct MergeReport {
    added: Vec<&'static str>,
    skipped: Vec<&'static str>,
}

pub struct TemplateSelector {
    max_chars: usize,
}

impl Default for TemplateSelector {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateSelector {
    pub fn new() -> Self {
        Self {
            max_chars: MAX_PROMPT_CHARS,
        }
    }

    pub fn with_max_chars(max_chars: usize) -> Self {
        Self { max_chars }
    }

    /// Make every structural choice for a prompt.
    ///
    /// Draw order is fixed, so the same input and RNG sequence always yield
    /// the same skeleton.
    pub fn build_skeleton(
        &self,
        input: &TemplateInput<'_>,
        rng: &mut dyn PromptRng,
        tracer: &DecisionTracer,
    ) -> PromptSkeleton {
        let genre = match input.genre {
            Some(genre) => {
                tracer.record(
                    domain::TEMPLATE,
                    "genre",
                    "resolved",
                    format!("using resolved genre '{}'", genre.key),
                );
                genre
            }
            None => {
                let genre = pick_weighted(rng, genres::all(), |g| g.weight)
                    .unwrap_or_else(genres::default_genre);
                tracer.record_with_metadata(
                    domain::TEMPLATE,
                    "genre",
                    "weighted-pick",
                    "no genre resolved, picked by registry weight",
                    json!({ "genre": genre.key }),
                );
                genre
            }
        };

        let genre_mood = pick(rng, genre.moods).and_then(|key| moods::find(key));
        let mood = match moods::detect_in_text(input.description) {
            Some(mood) => {
                tracer.record(
                    domain::TEMPLATE,
                    "mood",
                    "description",
                    format!("description names mood '{}'", mood.key),
                );
                mood
            }
            None => {
                let mood = genre_mood.unwrap_or_else(moods::default_mood);
                tracer.record(
                    domain::TEMPLATE,
                    "mood",
                    "genre-pick",
                    format!("picked '{}' from {} moods", mood.key, genre.key),
                );
                mood
            }
        };

        let mut chosen: Vec<String> = instruments::detect_in_text(input.description)
            .into_iter()
            .take(INSTRUMENT_COUNT)
            .map(String::from)
            .collect();
        for candidate in sample_distinct(rng, genre.instruments, INSTRUMENT_COUNT) {
            if chosen.len() >= INSTRUMENT_COUNT {
                break;
            }
            if !chosen.iter().any(|c| c.eq_ignore_ascii_case(candidate)) {
                chosen.push(candidate.to_string());
            }
        }

        let mut tags: Vec<String> = sample_distinct(rng, genre.style_tags, GENRE_TAG_COUNT)
            .into_iter()
            .map(|t| t.to_string())
            .collect();
        if let Some(tag) = pick(rng, mood.tags) {
            if !tags.iter().any(|t| t == tag) {
                tags.push(tag.to_string());
            }
        }

        let fix = validate_and_fix_coherence(&chosen, &tags, input.creativity_level);
        trace_coherence(tracer, &fix, input.creativity_level);

        let tempo_bpm = range(rng, genre.bpm.0, genre.bpm.1);

        let progression = pick_weighted(rng, chords::all(), |p| {
            chords::affinity(p, genre.key, mood.key)
        })
        .unwrap_or_else(chords::default_progression);
        let show_chords = unit(rng) < CHORD_TAG_PROBABILITY || input.mode == PromptMode::Max;
        tracer.record_with_metadata(
            domain::TEMPLATE,
            "chord_progression",
            if show_chords { "rendered" } else { "metadata-only" },
            format!("weighted by affinity to {}/{}", genre.key, mood.key),
            json!({ "id": progression.id, "pattern": progression.pattern }),
        );

        let [recording, texture, space, mix] = production::pools()
            .map(|pool| pick(rng, pool).copied().unwrap_or_default().to_string());

        PromptSkeleton {
            genre,
            mood,
            instruments: fix.instruments,
            tempo_bpm,
            tags: fix.tags,
            chords: progression,
            show_chords,
            production: ProductionDescriptor {
                recording,
                texture,
                space,
                mix,
            },
            locked_phrase: input.locked_phrase.map(str::to_string),
            mode: input.mode,
        }
    }

    /// Render a skeleton without thematic material.
    pub fn render(&self, skeleton: &PromptSkeleton) -> DeterministicPromptResult {
        self.compose(skeleton, None).0
    }

    /// Render a skeleton, merging `context` when present.
    pub fn render_merged(
        &self,
        skeleton: &PromptSkeleton,
        context: Option<&ThematicContext>,
        tracer: &DecisionTracer,
    ) -> DeterministicPromptResult {
        let Some(context) = context else {
            tracer.record(
                domain::TEMPLATE,
                "thematic_merge",
                "skipped",
                "no thematic context",
            );
            return self.render(skeleton);
        };

        let (result, report) = self.compose(skeleton, Some(context));
        tracer.record_with_metadata(
            domain::TEMPLATE,
            "thematic_merge",
            if report.skipped.is_empty() {
                "merged"
            } else {
                "merged-partial"
            },
            format!(
                "added {} thematic fields within {} chars",
                report.added.len(),
                self.max_chars
            ),
            json!({ "added": report.added, "skipped": report.skipped }),
        );
        result
    }

    /// Skeleton plus render in one go.
    pub fn build(
        &self,
        input: &TemplateInput<'_>,
        rng: &mut dyn PromptRng,
        context: Option<&ThematicContext>,
        tracer: &DecisionTracer,
    ) -> DeterministicPromptResult {
        let skeleton = self.build_skeleton(input, rng, tracer);
        self.render_merged(&skeleton, context, tracer)
    }

    /// Direct Mode prompt: the given styles, filtered for coherence against
    /// instruments named in the description. No genre inference.
    pub fn build_direct(
        &self,
        input: &DirectInput<'_>,
        tracer: &DecisionTracer,
    ) -> DeterministicPromptResult {
        tracer.record(
            domain::TEMPLATE,
            "genre",
            "direct-styles",
            format!("{} style tags used as given", input.styles.len()),
        );

        let detected = instruments::detect_in_text(input.description);
        let fix = validate_and_fix_coherence(&detected, input.styles, input.creativity_level);
        trace_coherence(tracer, &fix, input.creativity_level);

        let mut style = fix.tags.join(", ");
        if style.is_empty() {
            style = direct_style_fallback(&detected, input.description);
            tracer.record(
                domain::TEMPLATE,
                "style",
                "fallback",
                format!("every style tag was filtered; using '{}'", style),
            );
        }
        let mut lines: Vec<String> = Vec::new();
        match input.mode {
            PromptMode::Standard => {
                if !style.is_empty() {
                    lines.push(style.clone());
                }
                if let Some(phrase) = input.locked_phrase {
                    lines.push(phrase.to_string());
                }
            }
            PromptMode::Max => {
                lines.extend(MAX_MODE_HEADER.iter().map(|h| h.to_string()));
                if let Some(phrase) = input.locked_phrase {
                    lines.push(format!("locked: \"{}\"", phrase));
                }
                if !style.is_empty() {
                    lines.push(format!("style: \"{}\"", style.replace('"', "'")));
                }
            }
        }

        DeterministicPromptResult {
            text: lines.join("\n"),
            metadata: PromptMetadata {
                genre: input
                    .styles
                    .first()
                    .map(|s| s.to_lowercase())
                    .unwrap_or_default(),
                mood: moods::detect_in_text(&style)
                    .map(|m| m.key)
                    .unwrap_or(moods::NEUTRAL_MOOD)
                    .to_string(),
                chord_progression: None,
                production: None,
            },
        }
    }

    /// Base lines plus the index of the mood line.
    fn base_lines(&self, s: &PromptSkeleton) -> (Vec<String>, usize) {
        let mut lines: Vec<String> = Vec::new();
        let mood_index;
        match s.mode {
            PromptMode::Standard => {
                lines.push(format!("Genre: {}", s.genre.name));
                if let Some(phrase) = &s.locked_phrase {
                    lines.push(phrase.clone());
                }
                mood_index = lines.len();
                lines.push(format!("Mood: {}", s.mood.key));
                lines.push(format!("Instruments: {}", s.instruments.join(", ")));
                lines.push(format!("Tempo: {} BPM", s.tempo_bpm));
                if !s.tags.is_empty() {
                    lines.push(format!("Style: {}", s.tags.join(", ")));
                }
                if s.show_chords {
                    lines.push(format!("Chords: {}", s.chords.pattern));
                }
                lines.push(format!("Production: {}", s.production.render()));
            }
            PromptMode::Max => {
                lines.extend(MAX_MODE_HEADER.iter().map(|h| h.to_string()));
                if let Some(phrase) = &s.locked_phrase {
                    lines.push(format!("locked: \"{}\"", phrase));
                }
                lines.push(quoted("genre", s.genre.name));
                mood_index = lines.len();
                lines.push(quoted("mood", s.mood.key));
                lines.push(quoted("instruments", &s.instruments.join(", ")));
                lines.push(quoted("tempo", &format!("{} bpm", s.tempo_bpm)));
                if !s.tags.is_empty() {
                    lines.push(quoted("style", &s.tags.join(", ")));
                }
                lines.push(quoted("chords", s.chords.pattern));
                lines.push(quoted("production", &s.production.render()));
            }
        }
        (lines, mood_index)
    }

    fn compose(
        &self,
        s: &PromptSkeleton,
        context: Option<&ThematicContext>,
    ) -> (DeterministicPromptResult, MergeReport) {
        let (mut lines, mood_index) = self.base_lines(s);
        let mut report = MergeReport::default();

        if let Some(context) = context {
            let mut length = char_count(&lines.join("\n"));
            let mut additions: Vec<(&'static str, String)> = Vec::new();

            let extra_moods: Vec<&str> = context
                .moods
                .iter()
                .map(String::as_str)
                .filter(|m| !m.eq_ignore_ascii_case(s.mood.key))
                .collect();
            if !extra_moods.is_empty() {
                let joined = extra_moods.join(", ");
                match s.mode {
                    PromptMode::Standard => {
                        let suffix = format!(", {}", joined);
                        let cost = char_count(&suffix);
                        if length + cost <= self.max_chars {
                            lines[mood_index].push_str(&suffix);
                            length += cost;
                            report.added.push("moods");
                        } else {
                            report.skipped.push("moods");
                        }
                    }
                    PromptMode::Max => additions.push(("moods", quoted("moods", &joined))),
                }
            }

            additions.extend(thematic_lines(context, s.mode));
            for (field, line) in additions {
                let cost = char_count(&line) + 1;
                if length + cost <= self.max_chars {
                    lines.push(line);
                    length += cost;
                    report.added.push(field);
                } else {
                    report.skipped.push(field);
                }
            }
        }

        let result = DeterministicPromptResult {
            text: lines.join("\n"),
            metadata: PromptMetadata {
                genre: s.genre.key.to_string(),
                mood: s.mood.key.to_string(),
                chord_progression: Some(s.chords.id.to_string()),
                production: Some(s.production.clone()),
            },
        };
        (result, report)
    }
}

/// Style line for Direct Mode when coherence filtered every tag: the
/// instruments named in the description, else the description itself.
fn direct_style_fallback(detected: &[&str], description: &str) -> String {
    if !detected.is_empty() {
        return detected.join(", ");
    }
    description.trim().to_string()
}

fn quoted(label: &str, value: &str) -> String {
    format!("{}: \"{}\"", label, value.replace('"', "'").to_lowercase())
}

/// Optional thematic lines in render order, as (field, line).
fn thematic_lines(context: &ThematicContext, mode: PromptMode) -> Vec<(&'static str, String)> {
    let tempo = context
        .tempo
        .map(|t| format!("{:+} BPM", t.adjustment));
    let slots: [(&'static str, &'static str, Option<String>); 10] = [
        ("themes", "Themes", Some(context.themes.join(", "))),
        ("scene", "Scene", Some(context.scene.clone())),
        ("era", "Era", context.era.clone()),
        ("tempo", "Tempo shift", tempo),
        ("energy", "Energy", context.energy_level.clone()),
        ("vocals", "Vocals", context.vocal_character.clone()),
        ("space", "Space", context.spatial_hint.clone()),
        ("arc", "Arc", context.narrative_arc.clone()),
        ("reference", "Reference", context.musical_reference.clone()),
        ("culture", "Culture", context.cultural_context.clone()),
    ];

    slots
        .into_iter()
        .filter_map(|(field, label, value)| {
            let value = value?;
            let line = match mode {
                PromptMode::Standard => format!("{}: {}", label, value),
                PromptMode::Max => quoted(&label.to_lowercase(), &value),
            };
            Some((field, line))
        })
        .collect()
}

fn trace_coherence(tracer: &DecisionTracer, fix: &CoherenceFix, creativity_level: u8) {
    if !is_strict(creativity_level) {
        tracer.record(
            domain::COHERENCE,
            "check",
            "bypassed",
            format!("creativity {} is above the strict threshold", creativity_level),
        );
    } else if fix.conflicts.is_empty() {
        tracer.record(domain::COHERENCE, "check", "valid", "no conflicting tags");
    } else {
        tracer.record_with_metadata(
            domain::COHERENCE,
            "check",
            "filtered",
            format!(
                "removed {} tags for {}",
                fix.removed_tags.len(),
                fix.conflicts.join(", ")
            ),
            json!({ "conflicts": fix.conflicts, "removedTags": fix.removed_tags }),
        );
    }
}
