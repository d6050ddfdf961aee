//! End-to-end tests for `generate()`.
//!
//! Every test drives the public entry point with scripted providers and a
//! fixed probe; nothing touches the network.

mod common;

use common::{
    engine_with, Reply, Script, ScriptedProvider, StaticProbe, SCRIPTED_LYRICS, SCRIPTED_TITLE,
    TEST_SEED, THEMATIC_JSON,
};
use songsmith::generation::{
    fallback_lyrics, generate, EngineSettings, GenerationConfig, GenerationError,
    GenerationRequest, GenerationRuntime, ModeFlags, FALLBACK_TITLE, MAX_MODE_HEADER,
};
use songsmith::llm::RetryPolicy;
use songsmith::trace::{domain, DecisionTracer};
use std::sync::Arc;
use std::time::{Duration, Instant};

fn config_with(flags: ModeFlags) -> GenerationConfig {
    GenerationConfig::default().with_flags(flags)
}

fn lyrics_flags() -> ModeFlags {
    ModeFlags {
        lyrics_mode: true,
        ..Default::default()
    }
}

fn traced(seed: u64) -> (GenerationRuntime, Arc<DecisionTracer>) {
    let tracer = Arc::new(DecisionTracer::new());
    (
        GenerationRuntime::seeded(seed).with_tracer(tracer.clone()),
        tracer,
    )
}

// =============================================================================
// Documented scenarios
// =============================================================================

#[tokio::test]
async fn test_deterministic_only_without_a_model() {
    let (engine, _source, _probe) = engine_with(None, StaticProbe::ready());
    let (runtime, tracer) = traced(TEST_SEED);
    let request = GenerationRequest::new("a melancholic piano piece");

    let result = generate(&engine, &request, &GenerationConfig::default(), runtime)
        .await
        .unwrap();

    assert!(result.lyrics.is_none());
    assert!(result.debug_trace.is_none());
    assert_eq!(result.title, "Melancholic Piano");
    assert!(result.text.contains("Mood: melancholic"));
    assert!(result.text.to_lowercase().contains("piano"));

    assert_eq!(
        tracer.find(domain::PATH, "select").unwrap().branch_taken,
        "no-lyrics"
    );
    assert_eq!(
        tracer.find(domain::THEMATIC, "source").unwrap().branch_taken,
        "keyword-fallback"
    );
    assert_eq!(
        tracer.find(domain::CONTENT, "title").unwrap().branch_taken,
        "deterministic"
    );
}

#[tokio::test]
async fn test_direct_mode_skips_inference_and_writes_concurrently() {
    let provider = ScriptedProvider::new(
        Script::default()
            .title(Reply::slow(SCRIPTED_TITLE, 100))
            .lyrics(Reply::slow(SCRIPTED_LYRICS, 100)),
    );
    let (engine, _source, _probe) = engine_with(Some(provider.clone()), StaticProbe::ready());
    let (runtime, tracer) = traced(TEST_SEED);
    let request = GenerationRequest::new("late night study session").with_styles(["lofi", "jazz"]);

    let result = generate(&engine, &request, &config_with(lyrics_flags()), runtime)
        .await
        .unwrap();

    assert_eq!(result.text, "lofi, jazz");
    assert_eq!(result.title, SCRIPTED_TITLE);
    assert_eq!(result.lyrics.as_deref(), Some(SCRIPTED_LYRICS));

    assert_eq!(provider.call_count("genre"), 0);
    assert_eq!(provider.call_count("thematic"), 0);
    assert_eq!(provider.max_in_flight(), 2);
    assert_eq!(
        tracer.find(domain::GENRE, "source").unwrap().branch_taken,
        "bypassed"
    );
}

#[tokio::test]
async fn test_offline_fails_fast_when_server_is_down() {
    let provider = ScriptedProvider::new(Script::default());
    let (engine, source, probe) = engine_with(Some(provider.clone()), StaticProbe::unreachable());
    let (runtime, tracer) = traced(TEST_SEED);
    let config = config_with(ModeFlags {
        lyrics_mode: true,
        use_local_llm: true,
        ..Default::default()
    });

    let err = generate(
        &engine,
        &GenerationRequest::new("a song about trains"),
        &config,
        runtime,
    )
    .await
    .unwrap_err();

    assert!(matches!(
        err,
        GenerationError::LocalProviderUnavailable { .. }
    ));
    assert!(err.is_user_actionable());
    assert_eq!(probe.checks(), 1);
    assert_eq!(source.local_requests(), 0);
    assert!(provider.calls().is_empty());
    assert!(tracer.events_for(domain::TEMPLATE).is_empty());
    assert!(tracer.events_for(domain::THEMATIC).is_empty());
    assert_eq!(
        tracer.find(domain::PREFLIGHT, "local-model").unwrap().branch_taken,
        "unavailable"
    );
}

#[tokio::test]
async fn test_offline_fails_fast_when_model_is_missing() {
    let (engine, source, _probe) = engine_with(None, StaticProbe::missing_model());
    let config = config_with(ModeFlags {
        lyrics_mode: true,
        use_local_llm: true,
        ..Default::default()
    });

    let err = generate(
        &engine,
        &GenerationRequest::new("a song about trains"),
        &config,
        GenerationRuntime::seeded(TEST_SEED),
    )
    .await
    .unwrap_err();

    match err {
        GenerationError::LocalModelMissing { model, .. } => assert_eq!(model, config.local_model),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(source.local_requests(), 0);
}

#[tokio::test]
async fn test_offline_runs_on_the_local_model_when_ready() {
    let provider = ScriptedProvider::new(Script::default());
    let (engine, source, _probe) = engine_with(Some(provider.clone()), StaticProbe::ready());
    let config = config_with(ModeFlags {
        max_mode: true,
        lyrics_mode: true,
        use_local_llm: true,
        ..Default::default()
    });
    let request = GenerationRequest::new("driving through the city at midnight")
        .with_locked_phrase("we never slept in this town");

    let result = generate(&engine, &request, &config, GenerationRuntime::seeded(TEST_SEED))
        .await
        .unwrap();

    assert_eq!(source.local_requests(), 1);
    assert_eq!(source.cloud_requests(), 0);
    assert!(result.text.starts_with(MAX_MODE_HEADER[0]));
    assert!(result
        .text
        .contains("locked: \"we never slept in this town\""));
    assert_eq!(result.title, SCRIPTED_TITLE);
    assert_eq!(result.lyrics.as_deref(), Some(SCRIPTED_LYRICS));
}

// =============================================================================
// Properties
// =============================================================================

#[tokio::test]
async fn test_same_seed_same_output() {
    let (engine, _source, _probe) = engine_with(None, StaticProbe::ready());
    let request = GenerationRequest::new("a song for tuesday");
    let config = GenerationConfig::default();

    let (first_runtime, tracer) = traced(TEST_SEED);
    let first = generate(&engine, &request, &config, first_runtime)
        .await
        .unwrap();
    let second = generate(&engine, &request, &config, GenerationRuntime::seeded(TEST_SEED))
        .await
        .unwrap();

    assert_eq!(
        tracer.find(domain::THEMATIC, "source").unwrap().branch_taken,
        "none"
    );
    assert_eq!(first.text, second.text);
    assert_eq!(first.title, second.title);
}

#[tokio::test]
async fn test_thematic_merge_only_adds() {
    let request = GenerationRequest::new("a song for tuesday");
    let config = GenerationConfig::default();

    let (pure_engine, _source, _probe) = engine_with(None, StaticProbe::ready());
    let pure = generate(&pure_engine, &request, &config, GenerationRuntime::seeded(TEST_SEED))
        .await
        .unwrap();

    let provider = ScriptedProvider::new(Script::default());
    let (merged_engine, _source, _probe) = engine_with(Some(provider), StaticProbe::ready());
    let merged = generate(&merged_engine, &request, &config, GenerationRuntime::seeded(TEST_SEED))
        .await
        .unwrap();

    let merged_lines: Vec<&str> = merged.text.lines().collect();
    for line in pure.text.lines() {
        assert!(
            merged_lines.iter().any(|m| m.starts_with(line)),
            "merged prompt lost line {:?}",
            line
        );
    }
    assert!(merged.text.len() > pure.text.len());
    assert!(merged
        .text
        .contains("Themes: longing, city lights, second chances"));
    assert!(merged.text.contains("Era: 80s"));
}

#[tokio::test]
async fn test_genre_priority_chain() {
    let provider = ScriptedProvider::new(Script::default().genre(Reply::text("country")));
    let (engine, _source, _probe) = engine_with(Some(provider.clone()), StaticProbe::ready());
    let config = GenerationConfig::default();

    // Override beats description keywords.
    let request = GenerationRequest::new("a heavy metal anthem")
        .with_genre("jazz")
        .with_lyrics_topic("cowboys");
    let result = generate(&engine, &request, &config, GenerationRuntime::seeded(TEST_SEED))
        .await
        .unwrap();
    assert!(result.text.starts_with("Genre: Jazz\n"));

    // Description keywords beat topic detection.
    let request = GenerationRequest::new("a heavy metal anthem").with_lyrics_topic("cowboys");
    let result = generate(&engine, &request, &config, GenerationRuntime::seeded(TEST_SEED))
        .await
        .unwrap();
    assert!(result.text.starts_with("Genre: Metal\n"));
    assert_eq!(provider.call_count("genre"), 0);

    // Topic detection beats the deterministic pick.
    let (runtime, tracer) = traced(TEST_SEED);
    let request = GenerationRequest::new("a song for tuesday").with_lyrics_topic("cowboys");
    let result = generate(&engine, &request, &config, runtime).await.unwrap();
    assert!(result.text.starts_with("Genre: Country\n"));
    assert_eq!(provider.call_count("genre"), 1);
    assert_eq!(
        tracer.find(domain::GENRE, "source").unwrap().branch_taken,
        "llm.detect"
    );
}

#[tokio::test]
async fn test_genre_detection_and_thematic_run_together() {
    let provider = ScriptedProvider::new(
        Script::default()
            .thematic(Reply::slow(THEMATIC_JSON, 150))
            .genre(Reply::slow("country", 150)),
    );
    let (engine, _source, _probe) = engine_with(Some(provider.clone()), StaticProbe::ready());
    let request = GenerationRequest::new("a song for tuesday").with_lyrics_topic("cowboys");

    generate(
        &engine,
        &request,
        &GenerationConfig::default(),
        GenerationRuntime::seeded(TEST_SEED),
    )
    .await
    .unwrap();

    assert!(provider.max_in_flight() >= 2);
}

// =============================================================================
// Fallbacks
// =============================================================================

#[tokio::test]
async fn test_slow_thematic_call_is_cancelled_and_falls_back() {
    let provider =
        ScriptedProvider::new(Script::default().thematic(Reply::slow(THEMATIC_JSON, 2000)));
    let (engine, _source, _probe) = engine_with(Some(provider.clone()), StaticProbe::ready());
    let engine = engine.with_settings(EngineSettings {
        thematic_budget: Duration::from_millis(50),
        title_budget: Duration::from_millis(400),
        retry: RetryPolicy::no_retry(),
        ..Default::default()
    });
    let (runtime, tracer) = traced(TEST_SEED);
    let request = GenerationRequest::new("driving through the city at midnight");

    let started = Instant::now();
    let result = generate(&engine, &request, &GenerationConfig::default(), runtime)
        .await
        .unwrap();

    assert!(started.elapsed() < Duration::from_millis(1500));
    assert_eq!(provider.in_flight(), 0);
    let event = tracer.find(domain::THEMATIC, "source").unwrap();
    assert_eq!(event.branch_taken, "keyword-fallback");
    assert!(event.rationale.contains("timed out"));
    assert!(result.text.contains("Themes: night, city, journey"));
    assert_eq!(result.title, SCRIPTED_TITLE);
}

#[tokio::test]
async fn test_failed_title_and_lyrics_use_fallbacks() {
    let provider = ScriptedProvider::new(
        Script::default()
            .title(Reply::fail())
            .lyrics(Reply::fail()),
    );
    let (engine, _source, _probe) = engine_with(Some(provider), StaticProbe::ready());
    let config = config_with(ModeFlags {
        lyrics_mode: true,
        use_suno_tags: true,
        ..Default::default()
    });

    let result = generate(
        &engine,
        &GenerationRequest::new("a hopeful folk song about leaving home"),
        &config,
        GenerationRuntime::seeded(TEST_SEED),
    )
    .await
    .unwrap();

    assert_eq!(result.title, FALLBACK_TITLE);
    assert_eq!(result.lyrics, Some(fallback_lyrics(true)));
    assert!(result.text.starts_with("Genre: Folk\n"));
}

#[tokio::test]
async fn test_unready_local_model_is_not_fatal_without_lyrics() {
    let (engine, source, probe) = engine_with(None, StaticProbe::unreachable());
    let config = config_with(ModeFlags {
        use_local_llm: true,
        ..Default::default()
    });

    let result = generate(
        &engine,
        &GenerationRequest::new("a melancholic piano piece"),
        &config,
        GenerationRuntime::seeded(TEST_SEED),
    )
    .await
    .unwrap();

    assert_eq!(probe.checks(), 1);
    assert_eq!(source.local_requests(), 0);
    assert_eq!(result.title, "Melancholic Piano");
}

// =============================================================================
// Validation and debug output
// =============================================================================

#[tokio::test]
async fn test_blank_style_list_is_rejected() {
    let (engine, _source, probe) = engine_with(None, StaticProbe::ready());
    let (runtime, tracer) = traced(TEST_SEED);
    let request = GenerationRequest::new("").with_styles(["  ", ""]);

    let err = generate(&engine, &request, &GenerationConfig::default(), runtime)
        .await
        .unwrap_err();

    assert!(matches!(err, GenerationError::Validation(_)));
    assert_eq!(probe.checks(), 0);
    assert_eq!(
        tracer.find(domain::VALIDATION, "request").unwrap().branch_taken,
        "rejected"
    );
    assert!(tracer.find(domain::PATH, "select").is_none());
}

#[tokio::test]
async fn test_direct_mode_with_every_style_filtered_still_renders() {
    let (engine, _source, _probe) = engine_with(None, StaticProbe::ready());
    let (runtime, tracer) = traced(1);
    let request = GenerationRequest::new("distorted guitar").with_styles(["intimate"]);

    let result = generate(&engine, &request, &GenerationConfig::default(), runtime)
        .await
        .unwrap();

    assert_eq!(result.text, "distorted guitar");
    assert!(!result.title.is_empty());
    assert_eq!(
        tracer.find(domain::COHERENCE, "check").unwrap().branch_taken,
        "filtered"
    );
    assert_eq!(
        tracer.find(domain::TEMPLATE, "style").unwrap().branch_taken,
        "fallback"
    );
}

#[tokio::test]
async fn test_debug_mode_attaches_trace() {
    let (engine, _source, _probe) = engine_with(None, StaticProbe::ready());
    let config = config_with(ModeFlags {
        debug_mode: true,
        ..Default::default()
    });

    let result = generate(
        &engine,
        &GenerationRequest::new("a melancholic piano piece"),
        &config,
        GenerationRuntime::seeded(TEST_SEED),
    )
    .await
    .unwrap();

    let trace = result.debug_trace.as_ref().expect("debug trace");
    assert!(trace.iter().any(|e| e.domain == domain::PATH));
    assert!(trace.iter().any(|e| e.domain == domain::COHERENCE));
    assert!(trace
        .windows(2)
        .all(|w| (w[0].timestamp_ms, w[0].sequence) <= (w[1].timestamp_ms, w[1].sequence)));

    let json = serde_json::to_value(&result).unwrap();
    assert!(json["debugTrace"].is_array());
    assert!(json.get("lyrics").is_none());
}
