use anyhow::Result;
use moodmem_core::Storage;
use moodmem_core::storage::MemoryConfig;

use crate::cli::ConfigCommands;
use crate::output::OutputFormat;
use crate::output::json::print_json;
use crate::output::table::{key_value_table, print_table};

pub fn run(storage: &Storage, command: ConfigCommands, format: OutputFormat) -> Result<()> {
    match command {
        ConfigCommands::Show => {
            let config = storage.memory_config()?;
            show_config(&config, format)
        }
        ConfigCommands::Set { key, value } => {
            let config = storage.config.set_value(&key, &value)?;
            if !format.is_json() {
                println!("Set {key} = {value}");
            }
            show_config(&config, format)
        }
    }
}

fn show_config(config: &MemoryConfig, format: OutputFormat) -> Result<()> {
    if format.is_json() {
        return print_json(config);
    }

    let table = key_value_table([
        ("window_size", config.window_size.to_string()),
        ("max_active_threads", config.max_active_threads.to_string()),
        ("topic_decay", config.topic_decay.to_string()),
        ("topic_score_cap", config.topic_score_cap.to_string()),
        ("volatility_alpha", config.volatility_alpha.to_string()),
        ("max_write_attempts", config.max_write_attempts.to_string()),
        ("block_char_budget", config.block_char_budget.to_string()),
        ("snapshot_fact_limit", config.snapshot_fact_limit.to_string()),
        ("preference_fact_limit", config.preference_fact_limit.to_string()),
        ("snapshot_max_hints", config.snapshot_max_hints.to_string()),
    ]);
    print_table(table)
}
