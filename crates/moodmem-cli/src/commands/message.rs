use anyhow::Result;
use moodmem_core::Storage;
use moodmem_models::{MessageRecord, time_utils};
use serde_json::json;

use crate::cli::MessageCommands;
use crate::output::{OutputFormat, json::print_json};

pub fn run(storage: &Storage, command: MessageCommands, format: OutputFormat) -> Result<()> {
    match command {
        MessageCommands::Put {
            id,
            user,
            conversation,
            text,
            created_at,
        } => put_message(storage, id, user, conversation, text, created_at, format),
    }
}

fn put_message(
    storage: &Storage,
    id: String,
    user: String,
    conversation: String,
    text: String,
    created_at: Option<i64>,
    format: OutputFormat,
) -> Result<()> {
    // Emotion fields written by the pipeline survive a text update.
    let record = match storage.messages.get(&id)? {
        Some(mut existing) => {
            existing.text = Some(text);
            existing
        }
        None => MessageRecord::new(
            id.clone(),
            user,
            conversation,
            created_at.unwrap_or_else(time_utils::now_ms),
        )
        .with_text(text),
    };
    storage.messages.put(&record)?;

    if format.is_json() {
        return print_json(&json!({ "message_id": id, "stored": true }));
    }

    println!("Stored message {id}");
    Ok(())
}
