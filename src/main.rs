use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use songsmith::config::{AppConfig, CliConfig, FileConfig};
use songsmith::generation::{
    GenerationEngine, GenerationRequest, GenerationResult, GenerationRuntime, SeededRng,
    DEFAULT_CREATIVITY_LEVEL,
};
use songsmith::llm::HttpProviderSource;
use songsmith::probe::{CachedProbe, OllamaProbe};

#[derive(Parser, Debug)]
#[clap(version, about = "Generate a music prompt, title and lyrics from a description")]
struct CliArgs {
    /// Free-text description of the song.
    pub description: Option<String>,

    /// Genre registry key that overrides inference (e.g. "jazz").
    #[clap(long)]
    pub genre: Option<String>,

    /// Text injected verbatim into the prompt.
    #[clap(long)]
    pub locked_phrase: Option<String>,

    /// What the lyrics should be about.
    #[clap(long)]
    pub lyrics_topic: Option<String>,

    /// Style tag used as given; repeat up to four times. Enables Direct Mode.
    #[clap(long = "style")]
    pub styles: Vec<String>,

    /// Render the prompt in Max Mode format.
    #[clap(long)]
    pub max_mode: bool,

    /// Also generate lyrics.
    #[clap(long)]
    pub lyrics: bool,

    /// Use the local model server instead of the cloud provider.
    #[clap(long)]
    pub local: bool,

    /// Ask for bracketed section tags in lyrics.
    #[clap(long)]
    pub suno_tags: bool,

    /// Attach the decision trace to the output.
    #[clap(long)]
    pub debug: bool,

    /// 0-100. Coherence rules are enforced up to 60.
    #[clap(long, default_value_t = DEFAULT_CREATIVITY_LEVEL)]
    pub creativity: u8,

    /// Seed for reproducible prompt building.
    #[clap(long)]
    pub seed: Option<u64>,

    /// Cloud provider kind: "openai" or "ollama".
    #[clap(long)]
    pub provider: Option<String>,

    /// Base URL of the cloud provider.
    #[clap(long)]
    pub base_url: Option<String>,

    /// Cloud model name.
    #[clap(long)]
    pub model: Option<String>,

    /// Local model server endpoint.
    #[clap(long)]
    pub local_endpoint: Option<String>,

    /// Local model name.
    #[clap(long)]
    pub local_model: Option<String>,

    /// Path to a TOML config file. Values in the file override CLI flags.
    #[clap(long)]
    pub config: Option<PathBuf>,

    /// Print the result as JSON.
    #[clap(long)]
    pub json: bool,
}

impl CliArgs {
    fn to_cli_config(&self) -> CliConfig {
        CliConfig {
            max_mode: self.max_mode,
            lyrics_mode: self.lyrics,
            use_local_llm: self.local,
            use_suno_tags: self.suno_tags,
            debug_mode: self.debug,
            creativity_level: self.creativity,
            provider: self.provider.clone(),
            base_url: self.base_url.clone(),
            model: self.model.clone(),
            api_key: std::env::var("OPENAI_API_KEY").ok().filter(|k| !k.is_empty()),
            local_endpoint: self.local_endpoint.clone(),
            local_model: self.local_model.clone(),
        }
    }

    fn to_request(&self) -> GenerationRequest {
        GenerationRequest {
            description: self.description.clone().unwrap_or_default(),
            locked_phrase: self.locked_phrase.clone(),
            lyrics_topic: self.lyrics_topic.clone(),
            genre_override: self.genre.clone(),
            suno_styles: (!self.styles.is_empty()).then(|| self.styles.clone()),
        }
    }
}

fn print_result(result: &GenerationResult, as_json: bool) -> Result<()> {
    if as_json {
        let json = serde_json::to_string_pretty(result).context("Failed to serialize result")?;
        println!("{}", json);
        return Ok(());
    }

    println!("Title: {}\n", result.title);
    println!("{}", result.text);
    if let Some(lyrics) = &result.lyrics {
        println!("\n{}", lyrics);
    }
    if let Some(trace) = &result.debug_trace {
        println!("\n--- decisions ---");
        for event in trace {
            println!(
                "[{}] {}.{} -> {} ({})",
                event.timestamp_ms, event.domain, event.key, event.branch_taken, event.rationale
            );
        }
    }
    Ok(())
}

async fn run(cli_args: CliArgs) -> Result<ExitCode> {
    let file_config = match &cli_args.config {
        Some(path) => {
            info!("Loading config from {:?}", path);
            Some(FileConfig::load(path)?)
        }
        None => None,
    };
    let app_config = AppConfig::resolve(&cli_args.to_cli_config(), file_config)?;

    let providers = HttpProviderSource::new(app_config.llm.backend());
    let probe = CachedProbe::new(
        OllamaProbe::new(providers.client().clone()),
        app_config.engine.probe_ttl,
    );
    let engine = GenerationEngine::new(Arc::new(providers), Arc::new(probe))
        .with_settings(app_config.engine.clone());

    let runtime = match cli_args.seed {
        Some(seed) => GenerationRuntime::default().with_rng(SeededRng::new(seed)),
        None => GenerationRuntime::default(),
    };

    let request = cli_args.to_request();
    match engine
        .generate(&request, &app_config.generation, runtime)
        .await
    {
        Ok(result) => {
            print_result(&result, cli_args.json)?;
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            error!(actionable = e.is_user_actionable(), "Generation failed: {}", e);
            eprintln!("error: {}", e);
            Ok(ExitCode::from(if e.is_user_actionable() { 2 } else { 1 }))
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .context("Failed to install tracing subscriber")?;

    run(cli_args).await
}
