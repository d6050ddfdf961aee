//! Thematic context extraction.
//!
//! One bounded LLM call turns the description into themes, moods, a scene and
//! a handful of optional descriptive slots. When the model is unavailable,
//! slow, or talks nonsense, a local keyword pass takes over. Nothing in here
//! returns an error.

use super::request::char_count;
use super::step::LlmStep;
use crate::llm::LlmError;
use crate::registry::{genres, instruments, moods, themes, Genre};
use crate::trace::{domain, DecisionTracer};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use unicode_segmentation::UnicodeSegmentation;

pub const THEME_COUNT: usize = 3;
pub const MOOD_COUNT: usize = 2;
pub const SCENE_MIN_CHARS: usize = 10;
pub const SCENE_MAX_CHARS: usize = 50;
/// Largest tempo shift, in BPM, accepted from the model.
pub const MAX_TEMPO_ADJUSTMENT: i32 = 40;

const THEMATIC_SYSTEM_PROMPT: &str = r#"You analyze song descriptions for a music prompt builder.
Reply with a single JSON object and nothing else, using these keys:
  "themes": up to 3 short lyrical themes,
  "moods": up to 2 mood words,
  "scene": a short visual scene (under 50 characters),
  "era": a musical era if one is implied, or null,
  "tempoAdjustment": an integer BPM shift between -40 and 40, or null,
  "intent": what the listener should feel, or null,
  "spatialHint", "energyLevel", "vocalCharacter", "narrativeArc",
  "musicalReference", "culturalContext": short phrases, or null.
Never invent artist names."#;

const GENRE_SYSTEM_PROMPT: &str = "You classify song topics into one music genre. \
Reply with exactly one genre key from the list you are given and nothing else.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TempoHint {
    /// Signed BPM shift relative to the genre tempo.
    pub adjustment: i32,
}

/// Enrichment merged into the deterministic prompt.
///
/// Always holds exactly three themes, two moods and a 10-50 character scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThematicContext {
    pub themes: Vec<String>,
    pub moods: Vec<String>,
    pub scene: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub era: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tempo: Option<TempoHint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spatial_hint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub energy_level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vocal_character: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub narrative_arc: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub musical_reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cultural_context: Option<String>,
}

impl ThematicContext {
    /// Build a context, padding themes and moods with defaults and fitting the
    /// scene into 10-50 characters (derived from `description` when too short).
    pub fn new<T, M>(themes: T, moods: M, scene: &str, description: &str) -> Self
    where
        T: IntoIterator,
        T::Item: AsRef<str>,
        M: IntoIterator,
        M::Item: AsRef<str>,
    {
        Self {
            themes: normalize_list(themes, THEME_COUNT, &themes::DEFAULT_THEMES),
            moods: normalize_list(moods, MOOD_COUNT, &themes::DEFAULT_MOODS),
            scene: normalize_scene(scene, description),
            era: None,
            tempo: None,
            intent: None,
            spatial_hint: None,
            energy_level: None,
            vocal_character: None,
            narrative_arc: None,
            musical_reference: None,
            cultural_context: None,
        }
    }

    pub fn with_era(mut self, era: impl AsRef<str>) -> Self {
        self.era = clean_slot(Some(era.as_ref()));
        self
    }

    pub fn with_tempo_adjustment(mut self, adjustment: i32) -> Self {
        self.tempo = Some(TempoHint {
            adjustment: adjustment.clamp(-MAX_TEMPO_ADJUSTMENT, MAX_TEMPO_ADJUSTMENT),
        });
        self
    }
}

/// Collapse whitespace; `None` for blank input.
fn clean_slot(value: Option<&str>) -> Option<String> {
    let value = value?.split_whitespace().collect::<Vec<_>>().join(" ");
    (!value.is_empty()).then_some(value)
}

fn normalize_list<I>(items: I, count: usize, defaults: &[&str]) -> Vec<String>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut out: Vec<String> = Vec::with_capacity(count);
    let candidates = items
        .into_iter()
        .filter_map(|i| clean_slot(Some(i.as_ref())).map(|s| s.to_lowercase()))
        .chain(defaults.iter().map(|d| d.to_string()));

    for item in candidates {
        if out.len() == count {
            break;
        }
        if !out.contains(&item) {
            out.push(item);
        }
    }
    out
}

/// Cut to at most `max` characters, preferring a word boundary.
fn truncate_words(text: &str, max: usize) -> String {
    if char_count(text) <= max {
        return text.to_string();
    }
    let cut: String = text.graphemes(true).take(max).collect();
    match cut.rfind(' ') {
        Some(pos) if char_count(&cut[..pos]) >= SCENE_MIN_CHARS => cut[..pos].to_string(),
        _ => cut.trim_end().to_string(),
    }
}

/// A scene line built from the significant words of the description.
pub fn derive_scene(description: &str) -> String {
    let words = themes::significant_words(description).join(" ").to_lowercase();
    let scene = truncate_words(&words, SCENE_MAX_CHARS);
    if char_count(&scene) >= SCENE_MIN_CHARS {
        scene
    } else if scene.is_empty() {
        "a quiet moment".to_string()
    } else {
        truncate_words(&format!("a scene of {}", scene), SCENE_MAX_CHARS)
    }
}

fn normalize_scene(scene: &str, description: &str) -> String {
    let scene = clean_slot(Some(scene)).unwrap_or_default();
    let scene = truncate_words(&scene, SCENE_MAX_CHARS);
    if char_count(&scene) >= SCENE_MIN_CHARS {
        scene
    } else {
        derive_scene(description)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawContext {
    themes: Vec<String>,
    moods: Vec<String>,
    scene: Option<String>,
    era: Option<String>,
    tempo_adjustment: Option<f64>,
    tempo: Option<RawTempo>,
    intent: Option<String>,
    spatial_hint: Option<String>,
    energy_level: Option<String>,
    vocal_character: Option<String>,
    narrative_arc: Option<String>,
    musical_reference: Option<String>,
    cultural_context: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawTempo {
    adjustment: Option<f64>,
}

/// The outermost `{ ... }` span, ignoring code fences and chatter around it.
fn json_object(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    (end > start).then(|| &raw[start..=end])
}

/// Parse a model reply into a context.
///
/// Returns `None` for anything that is not a JSON object or that carries
/// neither themes nor moods.
pub fn parse_llm_context(raw: &str, description: &str) -> Option<ThematicContext> {
    let parsed: RawContext = serde_json::from_str(json_object(raw)?).ok()?;

    let has_content = parsed
        .themes
        .iter()
        .chain(parsed.moods.iter())
        .any(|s| !s.trim().is_empty());
    if !has_content {
        return None;
    }

    let mut context = ThematicContext::new(
        &parsed.themes,
        &parsed.moods,
        parsed.scene.as_deref().unwrap_or(""),
        description,
    );
    context.era = clean_slot(parsed.era.as_deref());
    context.tempo = parsed
        .tempo_adjustment
        .or(parsed.tempo.and_then(|t| t.adjustment))
        .filter(|a| a.is_finite())
        .map(|a| TempoHint {
            adjustment: (a.round() as i32).clamp(-MAX_TEMPO_ADJUSTMENT, MAX_TEMPO_ADJUSTMENT),
        })
        .filter(|t| t.adjustment != 0);
    context.intent = clean_slot(parsed.intent.as_deref());
    context.spatial_hint = clean_slot(parsed.spatial_hint.as_deref());
    context.energy_level = clean_slot(parsed.energy_level.as_deref());
    context.vocal_character = clean_slot(parsed.vocal_character.as_deref());
    context.narrative_arc = clean_slot(parsed.narrative_arc.as_deref());
    context.musical_reference = clean_slot(parsed.musical_reference.as_deref());
    context.cultural_context = clean_slot(parsed.cultural_context.as_deref());
    Some(context)
}

/// Offline context from local keyword tables. No I/O.
///
/// Returns `None` when the description has nothing recognizable: no theme,
/// mood, era, genre or instrument keyword.
pub fn keyword_context(description: &str) -> Option<ThematicContext> {
    let found_themes = themes::detect_in_text(description);
    let found_moods: Vec<&str> = moods::detect_all(description)
        .iter()
        .map(|m| m.key)
        .collect();
    let era = themes::detect_era(description);

    let recognizable = !found_themes.is_empty()
        || !found_moods.is_empty()
        || era.is_some()
        || genres::detect_in_text(description).is_some()
        || !instruments::detect_in_text(description).is_empty();
    if !recognizable {
        return None;
    }

    let mut context = ThematicContext::new(found_themes, found_moods, "", description);
    context.era = era;
    Some(context)
}

fn fallback(description: &str, tracer: &DecisionTracer, after: &str) -> Option<ThematicContext> {
    match keyword_context(description) {
        Some(context) => {
            tracer.record_with_metadata(
                domain::THEMATIC,
                "source",
                "keyword-fallback",
                format!("{}; derived from local keywords", after),
                serde_json::json!({ "themes": context.themes, "moods": context.moods }),
            );
            Some(context)
        }
        None => {
            tracer.record(
                domain::THEMATIC,
                "source",
                "none",
                format!("{}; no recognizable keywords", after),
            );
            None
        }
    }
}

/// Enrich `description` with a thematic context.
///
/// Tries the LLM step when one is given, then the keyword fallback. A call
/// that overruns its budget is cancelled inside [`LlmStep::invoke`].
pub async fn extract_thematic_context(
    description: &str,
    llm: Option<&LlmStep<'_>>,
    tracer: &DecisionTracer,
) -> Option<ThematicContext> {
    if description.trim().is_empty() {
        tracer.record(domain::THEMATIC, "source", "no-description", "nothing to analyze");
        return None;
    }

    let Some(step) = llm else {
        return fallback(description, tracer, "llm-unavailable");
    };

    match step.invoke(THEMATIC_SYSTEM_PROMPT, description).await {
        Ok(reply) => match parse_llm_context(&reply, description) {
            Some(context) => {
                debug!(provider = step.provider_name(), "Thematic context from LLM");
                tracer.record_with_metadata(
                    domain::THEMATIC,
                    "source",
                    "llm",
                    "model returned a usable context",
                    serde_json::json!({ "themes": context.themes, "moods": context.moods }),
                );
                Some(context)
            }
            None => {
                warn!(provider = step.provider_name(), "Unusable thematic reply");
                fallback(description, tracer, "llm returned no usable context")
            }
        },
        Err(LlmError::Timeout) => {
            warn!(
                provider = step.provider_name(),
                budget_ms = step.budget().as_millis() as u64,
                "Thematic extraction timed out"
            );
            fallback(description, tracer, "llm timed out")
        }
        Err(e) => {
            warn!(provider = step.provider_name(), error = %e, "Thematic extraction failed");
            fallback(description, tracer, &format!("llm error: {}", e))
        }
    }
}

/// Ask the model which registry genre fits a lyrics topic.
pub async fn detect_genre_from_topic(
    step: &LlmStep<'_>,
    topic: &str,
    tracer: &DecisionTracer,
) -> Option<&'static Genre> {
    let keys: Vec<&str> = genres::all().iter().map(|g| g.key).collect();
    let user_prompt = format!("Genres: {}\nTopic: {}", keys.join(", "), topic);

    match step.invoke(GENRE_SYSTEM_PROMPT, &user_prompt).await {
        Ok(reply) => {
            let genre = genres::find_mentioned(&reply);
            if genre.is_none() {
                tracer.record(
                    domain::GENRE,
                    "llm.detect",
                    "unrecognized",
                    format!("reply '{}' names no registry genre", reply.trim()),
                );
            }
            genre
        }
        Err(e) => {
            warn!(provider = step.provider_name(), error = %e, "Genre detection failed");
            tracer.record(domain::GENRE, "llm.detect", "failed", e.to_string());
            None
        }
    }
}
