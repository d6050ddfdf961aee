//! Title and lyrics generation.
//!
//! Each operation makes one bounded LLM call and degrades to a fixed fallback
//! on any failure. Failures are logged and traced, never returned.

use super::request::char_count;
use super::rng::{pick, PromptRng};
use super::step::LlmStep;
use super::thematic::ThematicContext;
use crate::registry::{moods, themes};
use crate::trace::{domain, DecisionTracer};
use tracing::{debug, warn};
use unicode_segmentation::UnicodeSegmentation;

pub const FALLBACK_TITLE: &str = "Untitled";
pub const MAX_TITLE_CHARS: usize = 80;
const TITLE_WORDS: usize = 3;
const TITLE_MAX_TOKENS: u32 = 32;
const LYRICS_MAX_TOKENS: u32 = 1200;

const FALLBACK_STANZA: [&str; 4] = [
    "We keep the light on in the window",
    "Humming the tune we haven't written yet",
    "Every word is waiting on the other side",
    "So we sing it anyway",
];

/// Nouns for titles built without a model or a usable description.
static TITLE_NOUNS: &[&str] = &[
    "Afterglow",
    "Static",
    "Horizons",
    "Paper Lanterns",
    "Night Drive",
    "Open Windows",
    "Glass Hours",
    "Slow Motion",
];

/// Inputs shared by the title and lyrics prompts.
#[derive(Debug, Clone, Copy)]
pub struct ContentBrief<'a> {
    /// Lyrics topic, or the description when there is none.
    pub topic: &'a str,
    pub genre: &'a str,
    pub mood: &'a str,
    pub max_mode: bool,
    pub use_suno_tags: bool,
    pub locked_phrase: Option<&'a str>,
    pub context: Option<&'a ThematicContext>,
}

pub fn title_prompts(brief: &ContentBrief<'_>) -> (String, String) {
    let system = "You write song titles. Reply with the title only: no quotes, \
no explanation, at most six words."
        .to_string();

    let mut user = format!(
        "Topic: {}\nGenre: {}\nMood: {}",
        brief.topic, brief.genre, brief.mood
    );
    if let Some(context) = brief.context {
        user.push_str(&format!("\nThemes: {}", context.themes.join(", ")));
        if let Some(intent) = &context.intent {
            user.push_str(&format!("\nIntent: {}", intent));
        }
    }
    (system, user)
}

pub fn lyrics_prompts(brief: &ContentBrief<'_>) -> (String, String) {
    let mut system = String::from(
        "You write original song lyrics. Reply with the lyrics only, no commentary.",
    );
    if brief.use_suno_tags {
        system.push_str(
            " Mark every section with a bracketed tag on its own line, such as [Verse 1], \
[Pre-Chorus], [Chorus], [Bridge] and [Outro].",
        );
    } else {
        system.push_str(" Separate stanzas with a blank line and do not label sections.");
    }
    if brief.max_mode {
        system.push_str(" Favor vivid, concrete imagery and natural, singable phrasing.");
    }

    let mut user = format!(
        "Topic: {}\nGenre: {}\nMood: {}",
        brief.topic, brief.genre, brief.mood
    );
    if let Some(phrase) = brief.locked_phrase {
        user.push_str(&format!("\nInclude this line verbatim: {}", phrase));
    }
    if let Some(context) = brief.context {
        user.push_str(&format!(
            "\nThemes: {}\nScene: {}",
            context.themes.join(", "),
            context.scene
        ));
        if let Some(arc) = &context.narrative_arc {
            user.push_str(&format!("\nArc: {}", arc));
        }
        if let Some(vocals) = &context.vocal_character {
            user.push_str(&format!("\nVocals: {}", vocals));
        }
    }
    (system, user)
}

/// First non-empty line of a model reply, stripped of labels and quotes.
pub fn clean_title(raw: &str) -> Option<String> {
    let line = raw.lines().map(str::trim).find(|l| !l.is_empty())?;
    let line = line
        .strip_prefix("Title:")
        .or_else(|| line.strip_prefix("title:"))
        .unwrap_or(line)
        .trim()
        .trim_matches(|c| c == '"' || c == '\'' || c == '*' || c == '`')
        .trim();
    if line.is_empty() {
        return None;
    }
    if char_count(line) > MAX_TITLE_CHARS {
        Some(line.graphemes(true).take(MAX_TITLE_CHARS).collect::<String>().trim_end().to_string())
    } else {
        Some(line.to_string())
    }
}

/// Placeholder stanza used when lyrics generation fails.
pub fn fallback_lyrics(use_suno_tags: bool) -> String {
    let stanza = FALLBACK_STANZA.join("\n");
    if use_suno_tags {
        format!("[Verse 1]\n{}", stanza)
    } else {
        stanza
    }
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Title without a model: up to three significant description words in
/// Title Case, else a pool pick prefixed with the mood.
pub fn deterministic_title(description: &str, mood: &str, rng: &mut dyn PromptRng) -> String {
    let words: Vec<String> = themes::significant_words(description)
        .iter()
        .take(TITLE_WORDS)
        .map(|w| title_case(w))
        .collect();
    if !words.is_empty() {
        return words.join(" ");
    }

    let noun = pick(rng, TITLE_NOUNS).copied().unwrap_or(FALLBACK_TITLE);
    if mood == moods::NEUTRAL_MOOD || mood.trim().is_empty() {
        noun.to_string()
    } else {
        format!("{} {}", title_case(mood), noun)
    }
}

/// Generate a title, falling back to [`FALLBACK_TITLE`].
pub async fn generate_title(
    step: Option<&LlmStep<'_>>,
    brief: &ContentBrief<'_>,
    tracer: &DecisionTracer,
) -> String {
    let Some(step) = step else {
        tracer.record(domain::CONTENT, "title", "fallback", "no model available");
        return FALLBACK_TITLE.to_string();
    };

    let (system, user) = title_prompts(brief);
    let step = step.clone().with_max_tokens(TITLE_MAX_TOKENS);
    match step.invoke(&system, &user).await {
        Ok(reply) => match clean_title(&reply) {
            Some(title) => {
                debug!(provider = step.provider_name(), title = %title, "Generated title");
                tracer.record(domain::CONTENT, "title", "llm", "model returned a title");
                title
            }
            None => {
                warn!(provider = step.provider_name(), "Model returned an empty title");
                tracer.record(domain::CONTENT, "title", "fallback", "empty title reply");
                FALLBACK_TITLE.to_string()
            }
        },
        Err(e) => {
            warn!(provider = step.provider_name(), error = %e, "Title generation failed");
            tracer.record(domain::CONTENT, "title", "fallback", e.to_string());
            FALLBACK_TITLE.to_string()
        }
    }
}

/// Generate lyrics, falling back to [`fallback_lyrics`].
pub async fn generate_lyrics(
    step: Option<&LlmStep<'_>>,
    brief: &ContentBrief<'_>,
    tracer: &DecisionTracer,
) -> String {
    let Some(step) = step else {
        tracer.record(domain::CONTENT, "lyrics", "fallback", "no model available");
        return fallback_lyrics(brief.use_suno_tags);
    };

    let (system, user) = lyrics_prompts(brief);
    let step = step.clone().with_max_tokens(LYRICS_MAX_TOKENS);
    match step.invoke(&system, &user).await {
        Ok(reply) => {
            let lyrics = reply
                .trim()
                .trim_start_matches("```")
                .trim_end_matches("```")
                .trim()
                .to_string();
            if lyrics.is_empty() {
                tracer.record(domain::CONTENT, "lyrics", "fallback", "empty lyrics reply");
                return fallback_lyrics(brief.use_suno_tags);
            }
            tracer.record(domain::CONTENT, "lyrics", "llm", "model returned lyrics");
            lyrics
        }
        Err(e) => {
            warn!(provider = step.provider_name(), error = %e, "Lyrics generation failed");
            tracer.record(domain::CONTENT, "lyrics", "fallback", e.to_string());
            fallback_lyrics(brief.use_suno_tags)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::rng::SeededRng;

    fn brief<'a>() -> ContentBrief<'a> {
        ContentBrief {
            topic: "leaving home",
            genre: "folk",
            mood: "nostalgic",
            max_mode: false,
            use_suno_tags: false,
            locked_phrase: Some("the porch light stays on"),
            context: None,
        }
    }

    #[test]
    fn test_clean_title() {
        assert_eq!(clean_title("\"Porch Light\"").as_deref(), Some("Porch Light"));
        assert_eq!(clean_title("\n  Title: Northbound\nextra").as_deref(), Some("Northbound"));
        assert_eq!(clean_title("**Bold Move**").as_deref(), Some("Bold Move"));
        assert!(clean_title("  \n \"\" ").is_none());
        let long = clean_title(&"x".repeat(200)).unwrap();
        assert_eq!(char_count(&long), MAX_TITLE_CHARS);
    }

    #[test]
    fn test_lyrics_prompt_respects_tag_flag() {
        let mut b = brief();
        let (plain, user) = lyrics_prompts(&b);
        assert!(plain.contains("do not label sections"));
        assert!(user.contains("Include this line verbatim: the porch light stays on"));

        b.use_suno_tags = true;
        let (tagged, _) = lyrics_prompts(&b);
        assert!(tagged.contains("[Chorus]"));
    }

    #[test]
    fn test_fallback_lyrics() {
        assert!(fallback_lyrics(true).starts_with("[Verse 1]\n"));
        assert!(!fallback_lyrics(false).contains('['));
        assert_eq!(fallback_lyrics(false).lines().count(), 4);
    }

    #[test]
    fn test_deterministic_title_from_description() {
        let mut rng = SeededRng::new(1);
        assert_eq!(
            deterministic_title("a melancholic piano piece", "melancholic", &mut rng),
            "Melancholic Piano"
        );
        assert_eq!(
            deterministic_title("neon RAIN over tokyo streets", "calm", &mut rng),
            "Neon Rain Tokyo"
        );
    }

    #[test]
    fn test_deterministic_title_from_pool() {
        let mut first = || 0.0_f64;
        assert_eq!(deterministic_title("a song", "dreamy", &mut first), "Dreamy Afterglow");
        assert_eq!(
            deterministic_title("", moods::NEUTRAL_MOOD, &mut first),
            "Afterglow"
        );
    }

    #[tokio::test]
    async fn test_no_model_means_fallbacks() {
        let tracer = DecisionTracer::new();
        assert_eq!(generate_title(None, &brief(), &tracer).await, FALLBACK_TITLE);
        assert_eq!(
            generate_lyrics(None, &brief(), &tracer).await,
            fallback_lyrics(false)
        );
        assert_eq!(tracer.events_for(domain::CONTENT).len(), 2);
    }
}
