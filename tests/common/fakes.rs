use async_trait::async_trait;
use songsmith::llm::{
    CompletionOptions, CompletionResponse, LlmError, LlmProvider, Message, MessageRole,
    ProviderSource,
};
use songsmith::probe::{ModelProbe, ProbeStatus};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::constants::{SCRIPTED_LYRICS, SCRIPTED_TITLE, THEMATIC_JSON};

/// What a scripted call does.
#[derive(Debug, Clone)]
pub enum Reply {
    Text { text: String, delay: Duration },
    Fail { delay: Duration },
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self::slow(text, 0)
    }

    pub fn slow(text: impl Into<String>, delay_ms: u64) -> Self {
        Reply::Text {
            text: text.into(),
            delay: Duration::from_millis(delay_ms),
        }
    }

    pub fn fail() -> Self {
        Reply::Fail {
            delay: Duration::ZERO,
        }
    }

    fn delay(&self) -> Duration {
        match self {
            Reply::Text { delay, .. } | Reply::Fail { delay } => *delay,
        }
    }
}

/// Replies per kind of call, recognized from the system prompt.
#[derive(Debug, Clone)]
pub struct Script {
    pub thematic: Reply,
    pub genre: Reply,
    pub title: Reply,
    pub lyrics: Reply,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            thematic: Reply::text(THEMATIC_JSON),
            genre: Reply::text("pop"),
            title: Reply::text(SCRIPTED_TITLE),
            lyrics: Reply::text(SCRIPTED_LYRICS),
        }
    }
}

impl Script {
    pub fn thematic(mut self, reply: Reply) -> Self {
        self.thematic = reply;
        self
    }

    pub fn genre(mut self, reply: Reply) -> Self {
        self.genre = reply;
        self
    }

    pub fn title(mut self, reply: Reply) -> Self {
        self.title = reply;
        self
    }

    pub fn lyrics(mut self, reply: Reply) -> Self {
        self.lyrics = reply;
        self
    }
}

/// Decrements the in-flight counter however the call ends, including when
/// its future is dropped mid-flight.
struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Provider that answers from a [`Script`] and records what it was asked.
pub struct ScriptedProvider {
    script: Script,
    calls: Mutex<Vec<&'static str>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedProvider {
    pub fn new(script: Script) -> Arc<Self> {
        Arc::new(Self {
            script,
            calls: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        })
    }

    /// Kinds of calls received, in arrival order.
    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self, kind: &str) -> usize {
        self.calls().iter().filter(|c| **c == kind).count()
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Most calls that were running at the same moment.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn classify(system_prompt: &str) -> &'static str {
        if system_prompt.contains("analyze song descriptions") {
            "thematic"
        } else if system_prompt.contains("classify song topics") {
            "genre"
        } else if system_prompt.contains("song titles") {
            "title"
        } else if system_prompt.contains("song lyrics") {
            "lyrics"
        } else {
            "unknown"
        }
    }

    fn reply_for(&self, kind: &str) -> Reply {
        match kind {
            "thematic" => self.script.thematic.clone(),
            "genre" => self.script.genre.clone(),
            "title" => self.script.title.clone(),
            "lyrics" => self.script.lyrics.clone(),
            _ => Reply::fail(),
        }
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn model(&self) -> &str {
        "scripted-1"
    }

    async fn complete(
        &self,
        messages: &[Message],
        options: &CompletionOptions,
    ) -> Result<CompletionResponse, LlmError> {
        let system = messages
            .iter()
            .find(|m| m.role == MessageRole::System)
            .map(|m| m.content.as_str())
            .unwrap_or_default();
        let kind = Self::classify(system);
        self.calls.lock().unwrap().push(kind);

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let _in_flight = InFlight(&self.in_flight);

        let reply = self.reply_for(kind);
        tokio::select! {
            biased;
            _ = options.cancellation.cancelled() => return Err(LlmError::Cancelled),
            _ = tokio::time::sleep(reply.delay()) => {}
        }

        match reply {
            Reply::Text { text, .. } => Ok(CompletionResponse::text(text)),
            Reply::Fail { .. } => Err(LlmError::Api {
                status: 400,
                message: format!("scripted failure for {}", kind),
            }),
        }
    }
}

/// Provider source handing out one scripted provider for both backends.
pub struct FakeProviderSource {
    provider: Option<Arc<ScriptedProvider>>,
    local_requests: AtomicUsize,
    cloud_requests: AtomicUsize,
}

impl FakeProviderSource {
    pub fn new(provider: Option<Arc<ScriptedProvider>>) -> Self {
        Self {
            provider,
            local_requests: AtomicUsize::new(0),
            cloud_requests: AtomicUsize::new(0),
        }
    }

    pub fn local_requests(&self) -> usize {
        self.local_requests.load(Ordering::SeqCst)
    }

    pub fn cloud_requests(&self) -> usize {
        self.cloud_requests.load(Ordering::SeqCst)
    }
}

impl ProviderSource for FakeProviderSource {
    fn cloud(&self, _model: &str) -> Option<Arc<dyn LlmProvider>> {
        self.cloud_requests.fetch_add(1, Ordering::SeqCst);
        self.provider
            .clone()
            .map(|p| p as Arc<dyn LlmProvider>)
    }

    fn local(&self, _endpoint: &str, _model: &str) -> Arc<dyn LlmProvider> {
        self.local_requests.fetch_add(1, Ordering::SeqCst);
        let provider = self
            .provider
            .clone()
            .unwrap_or_else(|| ScriptedProvider::new(Script::default()));
        provider
    }
}

/// Probe with a fixed answer.
pub struct StaticProbe {
    status: ProbeStatus,
    checks: AtomicUsize,
}

impl StaticProbe {
    pub fn new(status: ProbeStatus) -> Self {
        Self {
            status,
            checks: AtomicUsize::new(0),
        }
    }

    pub fn ready() -> Self {
        Self::new(ProbeStatus::ready())
    }

    pub fn unreachable() -> Self {
        Self::new(ProbeStatus::unreachable())
    }

    pub fn missing_model() -> Self {
        Self::new(ProbeStatus::missing_model())
    }

    pub fn checks(&self) -> usize {
        self.checks.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ModelProbe for StaticProbe {
    async fn check_available(&self, _endpoint: &str, _model: &str) -> ProbeStatus {
        self.checks.fetch_add(1, Ordering::SeqCst);
        self.status
    }
}
