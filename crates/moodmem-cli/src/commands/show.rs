use anyhow::{Result, anyhow};
use comfy_table::{Cell, Table};
use moodmem_core::{EmotionMemory, Storage};
use moodmem_models::{ConversationEmotionState, UserEmotionProfile};

use crate::cli::ShowCommands;
use crate::commands::utils::{format_score, format_timestamp, or_dash};
use crate::config::CliConfig;
use crate::output::OutputFormat;
use crate::output::json::print_json;
use crate::output::table::{key_value_table, print_table};

pub async fn run(
    storage: &Storage,
    config: &CliConfig,
    command: ShowCommands,
    format: OutputFormat,
) -> Result<()> {
    match command {
        ShowCommands::State { conversation_id } => {
            let state = storage
                .conversation_states
                .get(&conversation_id)?
                .ok_or_else(|| anyhow!("No short-term state for conversation {conversation_id}"))?;
            show_state(&state, format)
        }
        ShowCommands::Profile { user_id } => {
            let profile = storage
                .user_profiles
                .get(&user_id)?
                .ok_or_else(|| anyhow!("No profile for user {user_id}"))?;
            show_profile(&profile, format)
        }
        ShowCommands::Snapshot { user_id, language } => {
            let memory = EmotionMemory::from_storage(storage)?;
            let snapshot = memory.persona_snapshot(&user_id).await;

            if format.is_json() {
                return print_json(&snapshot);
            }

            if snapshot.is_empty() {
                println!("No persona facts for {user_id}");
                return Ok(());
            }

            let language = config.language(language.as_deref());
            for hint in snapshot.hints(language) {
                println!("- {hint}");
            }
            if !snapshot.likes.is_empty() {
                println!("Likes: {}", snapshot.likes.join(", "));
            }
            if !snapshot.dislikes.is_empty() {
                println!("Dislikes: {}", snapshot.dislikes.join(", "));
            }
            Ok(())
        }
    }
}

fn show_state(state: &ConversationEmotionState, format: OutputFormat) -> Result<()> {
    if format.is_json() {
        return print_json(state);
    }

    let summary = key_value_table([
        ("Conversation", state.conversation_id.clone()),
        ("User", state.user_id.clone()),
        ("Window", format!("{} of {}", state.rolling.total_count, state.window_size)),
        ("Recent intensity", format!("{:.2}", state.rolling.recent_avg_intensity)),
        ("Trend delta", format!("{:+.2}", state.rolling.trend_delta)),
        ("Dominant", or_dash(state.dominant_emotion.as_deref())),
        ("Session baseline", or_dash(state.session_baseline_emotion.as_deref())),
        ("Current baseline", or_dash(state.current_baseline_emotion.as_deref())),
        ("Stability", format_score(state.stability_score)),
        ("Version", state.version.to_string()),
        ("Updated", format_timestamp(Some(state.updated_at))),
    ]);
    print_table(summary)?;

    if !state.rolling.emotions.is_empty() {
        let mut emotions = Table::new();
        emotions.set_header(vec!["Emotion", "Count", "Avg intensity", "Last seen"]);
        for (label, stat) in &state.rolling.emotions {
            emotions.add_row(vec![
                Cell::new(label),
                Cell::new(stat.count),
                Cell::new(format!("{:.2}", stat.avg_intensity)),
                Cell::new(format_timestamp(Some(stat.last_seen_at))),
            ]);
        }
        print_table(emotions)?;
    }

    if !state.active_threads.is_empty() {
        let mut threads = Table::new();
        threads.set_header(vec!["Topic", "Count", "Peak", "First seen", "Last seen"]);
        for thread in &state.active_threads {
            threads.add_row(vec![
                Cell::new(&thread.topic),
                Cell::new(thread.count),
                Cell::new(format!("{:.2}", thread.peak_intensity)),
                Cell::new(format_timestamp(Some(thread.first_seen_at))),
                Cell::new(format_timestamp(Some(thread.last_seen_at))),
            ]);
        }
        print_table(threads)?;
    }

    Ok(())
}

fn show_profile(profile: &UserEmotionProfile, format: OutputFormat) -> Result<()> {
    if format.is_json() {
        return print_json(profile);
    }

    let kernel = profile.recent_kernel_snapshot.as_ref();
    let summary = key_value_table([
        ("User", profile.user_id.clone()),
        ("Volatility", format_score(profile.volatility_index)),
        (
            "Last emotion",
            or_dash(kernel.map(|snapshot| snapshot.last_emotion.as_str())),
        ),
        (
            "Last reason",
            or_dash(kernel.and_then(|snapshot| snapshot.reason_label.as_deref())),
        ),
        (
            "Anchors",
            if profile.emotional_anchors.is_empty() {
                "-".to_string()
            } else {
                profile.emotional_anchors.join(", ")
            },
        ),
        ("Version", profile.version.to_string()),
        ("Updated", format_timestamp(Some(profile.updated_at))),
    ]);
    print_table(summary)?;

    if !profile.emotion_stats.is_empty() {
        let mut emotions = Table::new();
        emotions.set_header(vec!["Emotion", "Count", "Avg intensity", "Last seen"]);
        for (label, stat) in &profile.emotion_stats {
            emotions.add_row(vec![
                Cell::new(label),
                Cell::new(stat.count),
                Cell::new(format!("{:.2}", stat.avg_intensity)),
                Cell::new(format_timestamp(Some(stat.last_seen_at))),
            ]);
        }
        print_table(emotions)?;
    }

    if !profile.topic_profile.is_empty() {
        let mut topics = Table::new();
        topics.set_header(vec!["Topic", "Count", "Score", "Last seen"]);
        for (topic, stat) in &profile.topic_profile {
            topics.add_row(vec![
                Cell::new(topic),
                Cell::new(stat.count),
                Cell::new(format!("{:.2}", stat.score)),
                Cell::new(format_timestamp(Some(stat.last_seen_at))),
            ]);
        }
        print_table(topics)?;
    }

    if !profile.persona_affinity.is_empty() {
        let mut personas = Table::new();
        personas.set_header(vec!["Persona", "Uses", "Avg outcome", "Last trend", "Last used"]);
        for (persona, affinity) in &profile.persona_affinity {
            personas.add_row(vec![
                Cell::new(persona),
                Cell::new(affinity.uses),
                Cell::new(format!("{:+.2}", affinity.avg_outcome)),
                Cell::new(
                    affinity
                        .last_trend
                        .map_or_else(|| "-".to_string(), |trend| trend.to_string()),
                ),
                Cell::new(format_timestamp(Some(affinity.last_used_at))),
            ]);
        }
        print_table(personas)?;
    }

    Ok(())
}
