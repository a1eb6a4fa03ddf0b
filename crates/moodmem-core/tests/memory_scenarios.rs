use async_trait::async_trait;
use moodmem_core::storage::Storage;
use moodmem_core::{EmotionMemory, Language, MemoryBlockParams, MemoryStores};
use moodmem_models::{
    EmotionEvent, EmotionReading, MessageRecord, SemanticFact, Trend, UserEmotionProfile, kinds,
};
use moodmem_storage::MemoryConfig;
use moodmem_traits::{AnchorDetector, NoReason};
use std::sync::Arc;
use tempfile::{TempDir, tempdir};

const FOOTER_EN: &str = "keep any mention brief.)";

fn open_storage() -> (Storage, TempDir) {
    let temp_dir = tempdir().unwrap();
    let path = temp_dir.path().join("memory.db");
    let storage = Storage::new(path.to_str().unwrap()).unwrap();
    (storage, temp_dir)
}

fn event(message_id: &str, label: &str, raw: f64) -> EmotionEvent {
    EmotionEvent::new("u1", "c1", message_id, EmotionReading::new(label, raw))
}

/// Picks every phrase that starts with "my " as an anchor.
struct PossessiveAnchors;

#[async_trait]
impl AnchorDetector for PossessiveAnchors {
    async fn detect(
        &self,
        text: &str,
        _label: &str,
        _intensity: f64,
    ) -> moodmem_traits::Result<Vec<String>> {
        Ok(text
            .split(['.', ','])
            .map(str::trim)
            .filter(|phrase| phrase.starts_with("my "))
            .map(str::to_string)
            .collect())
    }
}

#[tokio::test]
async fn first_message_seeds_both_horizons() {
    let (storage, _temp_dir) = open_storage();
    let memory = EmotionMemory::from_storage(&storage).unwrap();

    let outcome = memory.record_event_at(&event("m1", "ANXIOUS", 4.0), 1_000).await;
    let report = outcome.report().unwrap();
    assert!(report.is_complete());

    let signal = report.short_term.value().unwrap();
    assert_eq!(signal.intensity_delta, None);
    assert_eq!(signal.trend, None);

    let state = storage.conversation_states.get("c1").unwrap().unwrap();
    assert_eq!(state.dominant_emotion.as_deref(), Some("ANXIOUS"));
    assert!((state.avg_intensity.unwrap() - 0.8).abs() < 1e-9);
    assert_eq!(state.session_baseline_emotion.as_deref(), Some("ANXIOUS"));
    assert_eq!(state.rolling.total_count, 1);
    assert_eq!(state.stability_score, Some(1.0));
    assert_eq!(state.version, 1);

    let profile = storage.user_profiles.get("u1").unwrap().unwrap();
    let stat = profile.emotion_stats["ANXIOUS"];
    assert_eq!(stat.count, 1);
    assert!((stat.avg_intensity - 0.8).abs() < 1e-9);
    assert!(profile.volatility_index.is_none());
}

#[tokio::test]
async fn second_message_reports_downward_trend_and_persona_improvement() {
    let (storage, _temp_dir) = open_storage();
    let memory = EmotionMemory::from_storage(&storage).unwrap();

    memory.record_event_at(&event("m1", "ANXIOUS", 4.0), 1_000).await;
    let outcome = memory
        .record_event_at(&event("m2", "ANXIOUS", 2.0).with_persona("coach"), 2_000)
        .await;

    let signal = *outcome.report().unwrap().short_term.value().unwrap();
    assert_eq!(signal.intensity_delta, Some(-2.0));
    assert_eq!(signal.trend, Some(Trend::Down));

    let record = storage.messages.get("m2").unwrap().unwrap();
    assert_eq!(record.trend, Some(Trend::Down));
    assert_eq!(record.intensity_delta, Some(-2.0));

    let profile = storage.user_profiles.get("u1").unwrap().unwrap();
    let affinity = profile.persona_affinity["coach"];
    assert_eq!(affinity.uses, 1);
    assert_eq!(affinity.avg_outcome, 1.0);
    assert_eq!(affinity.last_trend, Some(Trend::Down));
    assert_eq!(profile.volatility_index, Some(0.4));

    let state = storage.conversation_states.get("c1").unwrap().unwrap();
    assert_eq!(state.rolling.total_count, 2);
    assert!((state.rolling.trend_delta - (0.4 - 0.8)).abs() < 1e-9);
}

#[tokio::test]
async fn volatility_follows_ema_over_pipeline() {
    let (storage, _temp_dir) = open_storage();
    let memory = EmotionMemory::from_storage(&storage).unwrap();

    for (index, raw) in [1.0, 3.0, 2.0, 5.0].into_iter().enumerate() {
        let id = format!("m{index}");
        memory
            .record_event_at(&event(&id, "SAD", raw), 1_000 * (index as i64 + 1))
            .await;
    }

    // Samples 0.4, 0.2, 0.6: seeded, then blended with alpha 0.1.
    let expected = 0.9 * (0.9 * 0.4 + 0.1 * 0.2) + 0.1 * 0.6;
    let profile = storage.user_profiles.get("u1").unwrap().unwrap();
    assert!((profile.volatility_index.unwrap() - expected).abs() < 1e-9);
}

#[tokio::test]
async fn window_never_exceeds_configured_size() {
    let (storage, _temp_dir) = open_storage();
    let config = MemoryConfig {
        window_size: 5,
        ..MemoryConfig::default()
    };
    storage.config.update_config(config).unwrap();
    let memory = EmotionMemory::from_storage(&storage).unwrap();

    for index in 0..12 {
        let id = format!("m{index:02}");
        let label = if index < 7 { "CALM" } else { "ANGRY" };
        memory
            .record_event_at(&event(&id, label, 3.0).with_topics([format!("t{index}")]), 100 + index)
            .await;
    }

    let state = storage.conversation_states.get("c1").unwrap().unwrap();
    assert_eq!(state.window_size, 5);
    assert_eq!(state.rolling.total_count, 5);
    assert_eq!(state.rolling.emotions["ANGRY"].count, 5);
    assert!(!state.rolling.emotions.contains_key("CALM"));
    assert_eq!(state.current_baseline_emotion.as_deref(), Some("ANGRY"));
    assert_eq!(state.session_baseline_emotion.as_deref(), Some("CALM"));
    assert_eq!(state.active_threads.len(), 5);
    assert_eq!(state.active_threads[0].topic, "t11");
    assert_eq!(state.stability_score, Some(1.0));

    let profile = storage.user_profiles.get("u1").unwrap().unwrap();
    assert_eq!(profile.emotion_stats["CALM"].count, 7);
}

#[tokio::test]
async fn anchors_come_from_stored_message_text() {
    let (storage, _temp_dir) = open_storage();
    storage
        .messages
        .put(&MessageRecord::new("m1", "u1", "c1", 1).with_text("I failed again. my thesis, my advisor"))
        .unwrap();
    let memory = EmotionMemory::with_detectors(
        MemoryStores::from_storage(&storage),
        MemoryConfig::default(),
        Arc::new(PossessiveAnchors),
        Arc::new(NoReason),
    );

    let outcome = memory.record_event_at(&event("m1", "SAD", 4.0), 10).await;
    assert!(outcome.report().unwrap().is_complete());

    let profile = storage.user_profiles.get("u1").unwrap().unwrap();
    assert_eq!(profile.emotional_anchors, vec!["my thesis", "my advisor"]);
    // Enrichment keeps the text the host stored.
    let record = storage.messages.get("m1").unwrap().unwrap();
    assert_eq!(record.text.as_deref(), Some("I failed again. my thesis, my advisor"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_events_are_not_lost() {
    let (storage, _temp_dir) = open_storage();
    let config = MemoryConfig {
        max_write_attempts: 50,
        ..MemoryConfig::default()
    };
    let memory = Arc::new(EmotionMemory::new(MemoryStores::from_storage(&storage), config));

    let handles: Vec<_> = (0..8)
        .map(|index| memory.spawn_record(event(&format!("m{index}"), "TIRED", 3.0)))
        .collect();
    for handle in handles {
        assert!(handle.await.unwrap().report().unwrap().is_complete());
    }

    let profile = storage.user_profiles.get("u1").unwrap().unwrap();
    assert_eq!(profile.emotion_stats["TIRED"].count, 8);
    assert_eq!(profile.version, 8);
}

#[tokio::test]
async fn block_is_empty_without_any_memory() {
    let (storage, _temp_dir) = open_storage();
    let memory = EmotionMemory::from_storage(&storage).unwrap();

    let params = MemoryBlockParams::new("nobody")
        .with_conversation("nowhere")
        .with_identity_name("Ada");
    assert_eq!(memory.build_memory_block(&params).await, "");
}

#[tokio::test]
async fn volatile_profile_yields_long_term_only_block() {
    let (storage, _temp_dir) = open_storage();
    let mut profile = UserEmotionProfile::empty("u1", 0);
    profile.volatility_index = Some(0.85);
    storage.user_profiles.save(&profile).unwrap();
    let memory = EmotionMemory::from_storage(&storage).unwrap();

    let block = memory
        .build_memory_block(&MemoryBlockParams::new("u1").with_conversation("c-missing"))
        .await;

    assert!(block.starts_with("[Emotional memory]"));
    assert!(block.contains("frequently changing"));
    assert!(block.contains("Over time:"));
    assert!(!block.contains("In this conversation:"));
    assert!(block.ends_with(FOOTER_EN));
}

#[tokio::test]
async fn full_block_in_both_languages() {
    let (storage, _temp_dir) = open_storage();
    for fact in [
        SemanticFact::new("u1", kinds::AGE, "29", 1),
        SemanticFact::new("u1", kinds::ROLE, "nurse", 1),
        SemanticFact::new("u1", kinds::WEATHER_LIKE, "rain", 1),
    ] {
        storage.semantic_facts.put(&fact).unwrap();
    }
    let memory = EmotionMemory::from_storage(&storage).unwrap();
    memory
        .record_event_at(&event("m1", "STRESSED", 4.0).with_topics(["night shift"]), 10)
        .await;

    let params = MemoryBlockParams::new("u1")
        .with_conversation("c1")
        .with_identity_name("Mina");
    let block = memory.build_memory_block(&params).await;
    let expected_order = [
        "[Emotional memory]",
        "In this conversation:",
        "- The user has mostly felt stressed recently (average intensity 0.8).",
        "- Topics on their mind: night shift.",
        "Over time:",
        "- Across conversations, the user most often feels stressed.",
        "- The user's name is Mina.",
        "Background about the user",
        "- Age: 29.",
        "- Works as nurse.",
        "Preferences:",
        "- Enjoys this weather: rain.",
    ];
    let mut cursor = 0;
    for needle in expected_order {
        let found = block[cursor..].find(needle);
        assert!(found.is_some(), "missing {needle:?} in\n{block}");
        cursor += found.unwrap() + needle.len();
    }
    assert!(block.ends_with(FOOTER_EN));

    let zh = memory
        .build_memory_block(&params.clone().with_language(Language::Zh))
        .await;
    assert!(zh.starts_with("【情绪记忆】"));
    assert!(zh.contains("用户最近主要感到压力大"));
    assert!(zh.contains("- 职业：nurse。"));
    assert!(zh.contains("用户的名字是Mina。"));
}

#[tokio::test]
async fn block_never_exceeds_budget() {
    let (storage, _temp_dir) = open_storage();
    storage
        .config
        .set_value("block_char_budget", "250")
        .unwrap();
    for index in 0..30 {
        storage
            .semantic_facts
            .put(&SemanticFact::new(
                "u1",
                kinds::PERSONALITY_KEYWORD,
                format!("keyword-{index}-with-a-long-description"),
                index,
            ))
            .unwrap();
    }
    let memory = EmotionMemory::from_storage(&storage).unwrap();
    for index in 0..6 {
        memory
            .record_event_at(
                &event(&format!("m{index}"), "LONELY", 1.0 + index as f64)
                    .with_topics(["a very long topic name that keeps going", "another"]),
                index,
            )
            .await;
    }

    for language in Language::ALL {
        let params = MemoryBlockParams::new("u1")
            .with_conversation("c1")
            .with_language(language)
            .with_identity_name("A".repeat(500));
        let block = memory.build_memory_block(&params).await;
        assert!(!block.is_empty());
        assert!(block.chars().count() <= 250, "{language}: {}", block.chars().count());
    }
}
