//! Generation request and its validation.

use super::error::GenerationError;
use crate::registry::genres;
use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

pub const MAX_LOCKED_PHRASE_CHARS: usize = 300;
pub const MAX_LYRICS_TOPIC_CHARS: usize = 500;
pub const MAX_STYLES: usize = 4;

/// One song request. Immutable for the duration of a call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GenerationRequest {
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locked_phrase: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lyrics_topic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genre_override: Option<String>,
    /// Style tags supplied directly. Any entry routes the call to Direct Mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suno_styles: Option<Vec<String>>,
}

impl GenerationRequest {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            ..Default::default()
        }
    }

    pub fn with_locked_phrase(mut self, phrase: impl Into<String>) -> Self {
        self.locked_phrase = Some(phrase.into());
        self
    }

    pub fn with_lyrics_topic(mut self, topic: impl Into<String>) -> Self {
        self.lyrics_topic = Some(topic.into());
        self
    }

    pub fn with_genre(mut self, genre: impl Into<String>) -> Self {
        self.genre_override = Some(genre.into());
        self
    }

    pub fn with_styles<I, S>(mut self, styles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.suno_styles = Some(styles.into_iter().map(Into::into).collect());
        self
    }

    /// Direct Mode is requested by a non-empty style list, even one whose
    /// entries are all blank (that case fails validation).
    pub fn is_direct_mode(&self) -> bool {
        self.suno_styles.as_ref().is_some_and(|s| !s.is_empty())
    }

    /// Trimmed, non-blank style tags in the order given.
    pub fn styles(&self) -> Vec<&str> {
        self.suno_styles
            .iter()
            .flatten()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// The locked phrase, verbatim, unless it is blank.
    pub fn locked_phrase(&self) -> Option<&str> {
        self.locked_phrase
            .as_deref()
            .filter(|p| !p.trim().is_empty())
    }

    pub fn lyrics_topic(&self) -> Option<&str> {
        self.lyrics_topic
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }

    pub fn genre_override(&self) -> Option<&str> {
        self.genre_override
            .as_deref()
            .map(str::trim)
            .filter(|g| !g.is_empty())
    }

    pub fn validate(&self) -> Result<(), GenerationError> {
        let direct = self.is_direct_mode();

        if !direct && self.description.trim().is_empty() {
            return Err(GenerationError::Validation(
                "description is required".to_string(),
            ));
        }

        if direct {
            let count = self.suno_styles.as_ref().map_or(0, Vec::len);
            if count > MAX_STYLES {
                return Err(GenerationError::Validation(format!(
                    "at most {} style tags are allowed, got {}",
                    MAX_STYLES, count
                )));
            }
            if self.styles().is_empty() {
                return Err(GenerationError::Validation(
                    "style list is empty".to_string(),
                ));
            }
        }

        if let Some(phrase) = self.locked_phrase() {
            if char_count(phrase) > MAX_LOCKED_PHRASE_CHARS {
                return Err(GenerationError::Validation(format!(
                    "locked phrase exceeds {} characters",
                    MAX_LOCKED_PHRASE_CHARS
                )));
            }
            if phrase.contains("{{") || phrase.contains("}}") {
                return Err(GenerationError::Validation(
                    "locked phrase must not contain '{{' or '}}'".to_string(),
                ));
            }
        }

        if let Some(topic) = self.lyrics_topic() {
            if char_count(topic) > MAX_LYRICS_TOPIC_CHARS {
                return Err(GenerationError::Validation(format!(
                    "lyrics topic exceeds {} characters",
                    MAX_LYRICS_TOPIC_CHARS
                )));
            }
        }

        if let Some(genre) = self.genre_override() {
            if genres::find(genre).is_none() {
                return Err(GenerationError::Validation(format!(
                    "unknown genre '{}'",
                    genre
                )));
            }
        }

        Ok(())
    }
}

/// User-perceived character count.
pub(crate) fn char_count(text: &str) -> usize {
    text.graphemes(true).count()
}
