use anyhow::Result;
use moodmem_core::{EmotionMemory, MemoryBlockParams, Storage};
use serde_json::json;

use crate::cli::BlockArgs;
use crate::config::CliConfig;
use crate::output::{OutputFormat, json::print_json};

pub async fn run(
    storage: &Storage,
    config: &CliConfig,
    args: BlockArgs,
    format: OutputFormat,
) -> Result<()> {
    let memory = EmotionMemory::from_storage(storage)?;
    let language = config.language(args.language.as_deref());

    let mut params = MemoryBlockParams::new(args.user).with_language(language);
    if let Some(conversation_id) = args.conversation {
        params = params.with_conversation(conversation_id);
    }
    if let Some(persona_id) = args.persona {
        params = params.with_persona(persona_id);
    }
    if let Some(name) = args.name {
        params = params.with_identity_name(name);
    }

    let block = memory.build_memory_block(&params).await;

    if format.is_json() {
        return print_json(&json!({
            "language": language.as_str(),
            "chars": block.chars().count(),
            "budget": memory.config().block_char_budget,
            "block": block,
        }));
    }

    if block.is_empty() {
        eprintln!("No memory available for {}", params.user_id);
        return Ok(());
    }
    println!("{block}");
    Ok(())
}
