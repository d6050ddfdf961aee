//! Genre priority chain and mood extraction.

use super::request::GenerationRequest;
use super::step::LlmStep;
use super::thematic::detect_genre_from_topic;
use crate::registry::{genres, moods, Genre};
use crate::trace::{domain, DecisionTracer};
use serde::Serialize;

/// Which link of the chain picked the genre.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GenreSource {
    #[serde(rename = "override")]
    Override,
    #[serde(rename = "description.keywords")]
    DescriptionKeywords,
    #[serde(rename = "llm.detect")]
    LlmDetect,
    #[serde(rename = "deterministic")]
    Deterministic,
}

impl GenreSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            GenreSource::Override => "override",
            GenreSource::DescriptionKeywords => "description.keywords",
            GenreSource::LlmDetect => "llm.detect",
            GenreSource::Deterministic => "deterministic",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenreResolution {
    /// `None` for [`GenreSource::Deterministic`]: the template builder picks.
    pub genre: Option<&'static Genre>,
    pub source: GenreSource,
}

impl GenreResolution {
    fn traced(self, tracer: &DecisionTracer, rationale: String) -> Self {
        tracer.record_with_metadata(
            domain::GENRE,
            "source",
            self.source.as_str(),
            rationale,
            serde_json::json!({ "genre": self.genre.map(|g| g.key) }),
        );
        self
    }
}

/// The links of the chain that need no network: override, then keywords.
pub fn resolve_local(request: &GenerationRequest) -> Option<(GenreResolution, String)> {
    if let Some(genre) = request.genre_override().and_then(genres::find) {
        return Some((
            GenreResolution {
                genre: Some(genre),
                source: GenreSource::Override,
            },
            format!("explicit override '{}'", genre.key),
        ));
    }

    genres::detect_in_text(&request.description).map(|(genre, keyword)| {
        (
            GenreResolution {
                genre: Some(genre),
                source: GenreSource::DescriptionKeywords,
            },
            format!("description mentions '{}'", keyword),
        )
    })
}

/// Resolve the genre: override, description keyword, LLM topic detection,
/// deterministic. First match wins and every outcome is traced.
pub async fn resolve_genre(
    request: &GenerationRequest,
    detector: Option<&LlmStep<'_>>,
    tracer: &DecisionTracer,
) -> GenreResolution {
    if let Some((resolution, rationale)) = resolve_local(request) {
        return resolution.traced(tracer, rationale);
    }

    if let Some(topic) = request.lyrics_topic() {
        match detector {
            Some(step) => {
                if let Some(genre) = detect_genre_from_topic(step, topic, tracer).await {
                    return GenreResolution {
                        genre: Some(genre),
                        source: GenreSource::LlmDetect,
                    }
                    .traced(tracer, format!("model matched topic to '{}'", genre.key));
                }
            }
            None => tracer.record(
                domain::GENRE,
                "llm.detect",
                "skipped",
                "lyrics topic present but no model available",
            ),
        }
    }

    GenreResolution {
        genre: None,
        source: GenreSource::Deterministic,
    }
    .traced(
        tracer,
        "no override, keyword or detected genre; builder picks by registry weight".to_string(),
    )
}

/// The mood a built prompt actually expresses.
///
/// Reads the `Mood:` / `mood: "..."` line when there is one, then falls back
/// to any mood word in the text, then to neutral.
pub fn extract_mood(text: &str) -> String {
    let from_line = text.lines().find_map(|line| {
        let line = line.trim();
        let lower = line.to_lowercase();
        if !lower.starts_with("mood:") {
            return None;
        }
        let value = line.get("mood:".len()..)?.trim().trim_matches('"');
        value
            .split(',')
            .next()
            .and_then(|first| moods::resolve(first.trim().trim_matches('"')))
    });

    from_line
        .or_else(|| moods::detect_in_text(text))
        .map(|m| m.key.to_string())
        .unwrap_or_else(|| moods::NEUTRAL_MOOD.to_string())
}

/// [`extract_mood`], traced.
pub fn resolve_mood(text: &str, tracer: &DecisionTracer) -> String {
    let mood = extract_mood(text);
    tracer.record(
        domain::MOOD,
        "extract",
        if mood == moods::NEUTRAL_MOOD {
            "neutral"
        } else {
            "prompt"
        },
        format!("mood '{}' read from built prompt", mood),
    );
    mood
}
