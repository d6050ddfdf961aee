//! Path selection and the `generate()` entry point.

use super::config::GenerationConfig;
use super::content::{deterministic_title, generate_lyrics, generate_title, ContentBrief};
use super::error::GenerationError;
use super::request::GenerationRequest;
use super::resolver::{resolve_genre, resolve_mood};
use super::rng::{PromptRng, SeededRng};
use super::step::LlmStep;
use super::template::{
    DeterministicPromptResult, DirectInput, PromptMode, TemplateInput, TemplateSelector,
    MAX_PROMPT_CHARS,
};
use super::thematic::{extract_thematic_context, ThematicContext};
use crate::llm::{CompletionOptions, LlmProvider, ProviderSource, RetryPolicy};
use crate::probe::ModelProbe;
use crate::trace::{domain, DecisionEvent, DecisionTracer};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// The four ways a call can run. Exactly one executes per call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GenerationPath {
    DirectMode,
    NoLyrics,
    LyricsCloud,
    LyricsOffline,
}

impl GenerationPath {
    pub fn as_str(&self) -> &'static str {
        match self {
            GenerationPath::DirectMode => "direct-mode",
            GenerationPath::NoLyrics => "no-lyrics",
            GenerationPath::LyricsCloud => "lyrics-cloud",
            GenerationPath::LyricsOffline => "lyrics-offline",
        }
    }

    pub fn wants_lyrics(&self) -> bool {
        !matches!(self, GenerationPath::NoLyrics)
    }
}

/// Pick the path for a request. First match wins: style tags, lyrics off,
/// local model, cloud.
pub fn select_path(request: &GenerationRequest, config: &GenerationConfig) -> GenerationPath {
    if request.is_direct_mode() {
        GenerationPath::DirectMode
    } else if !config.flags.lyrics_mode {
        GenerationPath::NoLyrics
    } else if config.flags.use_local_llm {
        GenerationPath::LyricsOffline
    } else {
        GenerationPath::LyricsCloud
    }
}

/// Budgets and tuning shared by every call of an engine.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineSettings {
    pub thematic_budget: Duration,
    pub genre_budget: Duration,
    pub title_budget: Duration,
    pub lyrics_budget: Duration,
    pub retry: RetryPolicy,
    pub temperature: f32,
    /// Cap on a single HTTP attempt, inside the step budget.
    pub request_timeout: Duration,
    pub max_prompt_chars: usize,
    /// How long a local probe result stays cached.
    pub probe_ttl: Duration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            thematic_budget: Duration::from_secs(8),
            genre_budget: Duration::from_secs(6),
            title_budget: Duration::from_secs(15),
            lyrics_budget: Duration::from_secs(60),
            retry: RetryPolicy::default(),
            temperature: 0.8,
            request_timeout: Duration::from_secs(60),
            max_prompt_chars: MAX_PROMPT_CHARS,
            probe_ttl: Duration::from_secs(30),
        }
    }
}

/// Per-call collaborators. Both are optional: a tracer is created when none
/// is given, and the RNG defaults to an OS-seeded generator.
#[derive(Default)]
pub struct GenerationRuntime {
    pub tracer: Option<Arc<DecisionTracer>>,
    pub rng: Option<Box<dyn PromptRng>>,
}

impl GenerationRuntime {
    pub fn with_tracer(mut self, tracer: Arc<DecisionTracer>) -> Self {
        self.tracer = Some(tracer);
        self
    }

    pub fn with_rng(mut self, rng: impl PromptRng + 'static) -> Self {
        self.rng = Some(Box::new(rng));
        self
    }

    pub fn seeded(seed: u64) -> Self {
        Self::default().with_rng(SeededRng::new(seed))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResult {
    pub text: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lyrics: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug_trace: Option<Vec<DecisionEvent>>,
}

/// A built prompt plus what went into it.
struct ComposedPrompt {
    prompt: DeterministicPromptResult,
    context: Option<ThematicContext>,
    mood: String,
}

/// Everything one `generate()` call needs besides its inputs.
struct CallContext<'a> {
    tracer: &'a DecisionTracer,
    options: CompletionOptions,
    selector: TemplateSelector,
}

pub struct GenerationEngine {
    providers: Arc<dyn ProviderSource>,
    probe: Arc<dyn ModelProbe>,
    settings: EngineSettings,
}

impl GenerationEngine {
    pub fn new(providers: Arc<dyn ProviderSource>, probe: Arc<dyn ModelProbe>) -> Self {
        Self {
            providers,
            probe,
            settings: EngineSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: EngineSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Run one generation.
    ///
    /// Either returns a complete result or an error; nothing partial escapes.
    /// Dropping the returned future cancels every in-flight model call.
    pub async fn generate(
        &self,
        request: &GenerationRequest,
        config: &GenerationConfig,
        runtime: GenerationRuntime,
    ) -> Result<GenerationResult, GenerationError> {
        let tracer = runtime
            .tracer
            .unwrap_or_else(|| Arc::new(DecisionTracer::new()));
        let mut rng = runtime
            .rng
            .unwrap_or_else(|| Box::new(SeededRng::from_os()));
        let started = Instant::now();

        if let Err(e) = request.validate() {
            tracer.record(domain::VALIDATION, "request", "rejected", e.to_string());
            warn!(error = %e, "Rejected generation request");
            return Err(e);
        }
        tracer.record(domain::VALIDATION, "request", "accepted", "request is well-formed");

        let path = select_path(request, config);
        tracer.record_with_metadata(
            domain::PATH,
            "select",
            path.as_str(),
            path_rationale(path),
            serde_json::json!({
                "maxMode": config.flags.max_mode,
                "lyricsMode": config.flags.lyrics_mode,
                "useLocalLlm": config.flags.use_local_llm,
            }),
        );
        info!(path = path.as_str(), model = config.model(), "Starting generation");

        let root = CancellationToken::new();
        let _guard = root.clone().drop_guard();
        let call = CallContext {
            tracer: &tracer,
            options: CompletionOptions::default()
                .with_temperature(self.settings.temperature)
                .with_timeout(self.settings.request_timeout)
                .with_cancellation(root),
            selector: TemplateSelector::with_max_chars(self.settings.max_prompt_chars),
        };

        let provider = match path {
            GenerationPath::LyricsOffline => Some(self.preflight(config, &call).await?),
            _ => self.optional_provider(config, &call).await,
        };

        let (text, title, lyrics) = match path {
            GenerationPath::DirectMode => {
                self.run_direct(request, config, provider.as_deref(), &mut *rng, &call)
                    .await?
            }
            _ => {
                self.run_hybrid(request, config, path, provider.as_deref(), &mut *rng, &call)
                    .await?
            }
        };

        info!(
            path = path.as_str(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            chars = text.len(),
            lyrics = lyrics.is_some(),
            "Generation finished"
        );

        Ok(GenerationResult {
            text,
            title,
            lyrics,
            debug_trace: config.flags.debug_mode.then(|| tracer.events()),
        })
    }

    /// Mandatory local check for the offline path. Fails fast.
    async fn preflight(
        &self,
        config: &GenerationConfig,
        call: &CallContext<'_>,
    ) -> Result<Arc<dyn LlmProvider>, GenerationError> {
        let endpoint = config.local_endpoint();
        let model = config.model();
        let status = self.probe.check_available(endpoint, model).await;

        if !status.available {
            call.tracer.record(
                domain::PREFLIGHT,
                "local-model",
                "unavailable",
                format!("{} did not answer", endpoint),
            );
            return Err(GenerationError::LocalProviderUnavailable {
                endpoint: endpoint.to_string(),
                reason: "no response from the model server".to_string(),
            });
        }
        if !status.has_required_model {
            call.tracer.record(
                domain::PREFLIGHT,
                "local-model",
                "model-missing",
                format!("{} is not installed on {}", model, endpoint),
            );
            return Err(GenerationError::LocalModelMissing {
                model: model.to_string(),
                endpoint: endpoint.to_string(),
            });
        }

        call.tracer.record(
            domain::PREFLIGHT,
            "local-model",
            "ready",
            format!("{} serves {}", endpoint, model),
        );
        Ok(self.providers.local(endpoint, model))
    }

    /// Provider for paths that can run without one.
    async fn optional_provider(
        &self,
        config: &GenerationConfig,
        call: &CallContext<'_>,
    ) -> Option<Arc<dyn LlmProvider>> {
        if config.flags.use_local_llm {
            let endpoint = config.local_endpoint();
            let status = self.probe.check_available(endpoint, config.model()).await;
            if status.is_ready() {
                call.tracer.record(
                    domain::PREFLIGHT,
                    "provider",
                    "local",
                    format!("{} is ready", endpoint),
                );
                return Some(self.providers.local(endpoint, config.model()));
            }
            warn!(endpoint = %endpoint, "Local model not ready, continuing without a model");
            call.tracer.record(
                domain::PREFLIGHT,
                "provider",
                "none",
                "local model not ready; deterministic steps only",
            );
            return None;
        }

        match self.providers.cloud(config.model()) {
            Some(provider) => {
                call.tracer.record(
                    domain::PREFLIGHT,
                    "provider",
                    "cloud",
                    format!("{} / {}", provider.name(), provider.model()),
                );
                Some(provider)
            }
            None => {
                call.tracer.record(
                    domain::PREFLIGHT,
                    "provider",
                    "none",
                    "no cloud provider configured; deterministic steps only",
                );
                None
            }
        }
    }

    fn step<'a>(
        &'a self,
        provider: &'a dyn LlmProvider,
        budget: Duration,
        call: &CallContext<'_>,
    ) -> LlmStep<'a> {
        LlmStep::new(provider, budget, &self.settings.retry, call.options.clone())
    }

    /// Direct Mode: style tags as given, no genre inference or thematic merge.
    async fn run_direct(
        &self,
        request: &GenerationRequest,
        config: &GenerationConfig,
        provider: Option<&dyn LlmProvider>,
        rng: &mut dyn PromptRng,
        call: &CallContext<'_>,
    ) -> Result<(String, String, Option<String>), GenerationError> {
        let styles = request.styles();
        call.tracer.record(
            domain::GENRE,
            "source",
            "bypassed",
            "style tags supplied directly",
        );

        let prompt = call.selector.build_direct(
            &DirectInput {
                description: &request.description,
                styles: &styles,
                locked_phrase: request.locked_phrase(),
                mode: PromptMode::from_max_flag(config.flags.max_mode),
                creativity_level: config.creativity_level,
            },
            call.tracer,
        );
        ensure_renderable(&prompt)?;

        let genre = styles.join(", ");
        let topic = request
            .lyrics_topic()
            .or_else(|| Some(request.description.trim()).filter(|d| !d.is_empty()))
            .unwrap_or(genre.as_str());
        let brief = ContentBrief {
            topic,
            genre: &genre,
            mood: &prompt.metadata.mood,
            max_mode: config.flags.max_mode,
            use_suno_tags: config.flags.use_suno_tags,
            locked_phrase: request.locked_phrase(),
            context: None,
        };

        let (title, lyrics) = self
            .write_content(
                &brief,
                provider,
                config.flags.lyrics_mode,
                &request.description,
                rng,
                call,
            )
            .await;
        Ok((prompt.text, title, lyrics))
    }

    /// NoLyrics, LyricsCloud and LyricsOffline: resolve, build, merge, write.
    async fn run_hybrid(
        &self,
        request: &GenerationRequest,
        config: &GenerationConfig,
        path: GenerationPath,
        provider: Option<&dyn LlmProvider>,
        rng: &mut dyn PromptRng,
        call: &CallContext<'_>,
    ) -> Result<(String, String, Option<String>), GenerationError> {
        let composed = self.compose(request, config, provider, rng, call).await;
        ensure_renderable(&composed.prompt)?;

        let topic = request
            .lyrics_topic()
            .unwrap_or(request.description.as_str());
        let brief = ContentBrief {
            topic,
            genre: &composed.prompt.metadata.genre,
            mood: &composed.mood,
            max_mode: config.flags.max_mode,
            use_suno_tags: config.flags.use_suno_tags,
            locked_phrase: request.locked_phrase(),
            context: composed.context.as_ref(),
        };

        let (title, lyrics) = self
            .write_content(
                &brief,
                provider,
                path.wants_lyrics(),
                &request.description,
                rng,
                call,
            )
            .await;
        Ok((composed.prompt.text, title, lyrics))
    }

    /// Genre resolution and thematic extraction run together, then the
    /// deterministic build, then mood extraction from the built text.
    async fn compose(
        &self,
        request: &GenerationRequest,
        config: &GenerationConfig,
        provider: Option<&dyn LlmProvider>,
        rng: &mut dyn PromptRng,
        call: &CallContext<'_>,
    ) -> ComposedPrompt {
        let genre_step = provider.map(|p| self.step(p, self.settings.genre_budget, call));
        let thematic_step = provider.map(|p| self.step(p, self.settings.thematic_budget, call));

        let (resolution, context) = tokio::join!(
            resolve_genre(request, genre_step.as_ref(), call.tracer),
            extract_thematic_context(&request.description, thematic_step.as_ref(), call.tracer),
        );

        let input = TemplateInput {
            description: &request.description,
            genre: resolution.genre,
            locked_phrase: request.locked_phrase(),
            mode: PromptMode::from_max_flag(config.flags.max_mode),
            creativity_level: config.creativity_level,
        };
        let skeleton = call.selector.build_skeleton(&input, rng, call.tracer);
        let prompt = call
            .selector
            .render_merged(&skeleton, context.as_ref(), call.tracer);
        let mood = resolve_mood(&prompt.text, call.tracer);

        ComposedPrompt {
            prompt,
            context,
            mood,
        }
    }

    /// Title, and lyrics when wanted, issued together. Without a model the
    /// title is derived from the description and lyrics use the placeholder.
    async fn write_content(
        &self,
        brief: &ContentBrief<'_>,
        provider: Option<&dyn LlmProvider>,
        want_lyrics: bool,
        description: &str,
        rng: &mut dyn PromptRng,
        call: &CallContext<'_>,
    ) -> (String, Option<String>) {
        let title_step = provider.map(|p| self.step(p, self.settings.title_budget, call));
        let lyrics_step = provider.map(|p| self.step(p, self.settings.lyrics_budget, call));

        let title = async {
            match &title_step {
                Some(step) => generate_title(Some(step), brief, call.tracer).await,
                None => {
                    let title = deterministic_title(description, brief.mood, &mut *rng);
                    call.tracer.record(
                        domain::CONTENT,
                        "title",
                        "deterministic",
                        "no model available; built from the description",
                    );
                    title
                }
            }
        };
        let lyrics = async {
            if want_lyrics {
                Some(generate_lyrics(lyrics_step.as_ref(), brief, call.tracer).await)
            } else {
                None
            }
        };

        tokio::join!(title, lyrics)
    }
}

fn path_rationale(path: GenerationPath) -> &'static str {
    match path {
        GenerationPath::DirectMode => "style tags supplied",
        GenerationPath::NoLyrics => "lyrics mode off",
        GenerationPath::LyricsCloud => "lyrics with the cloud model",
        GenerationPath::LyricsOffline => "lyrics with the local model",
    }
}

fn ensure_renderable(prompt: &DeterministicPromptResult) -> Result<(), GenerationError> {
    if prompt.text.trim().is_empty() {
        return Err(GenerationError::Internal(
            "prompt is empty after coherence filtering".to_string(),
        ));
    }
    Ok(())
}

/// The engine's sole entry point.
pub async fn generate(
    engine: &GenerationEngine,
    request: &GenerationRequest,
    config: &GenerationConfig,
    runtime: GenerationRuntime,
) -> Result<GenerationResult, GenerationError> {
    engine.generate(request, config, runtime).await
}
