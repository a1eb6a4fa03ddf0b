use anyhow::{Result, bail};
use comfy_table::{Cell, Table};
use moodmem_core::Storage;
use moodmem_models::{SemanticFact, kinds, time_utils};
use serde_json::json;

use crate::cli::FactCommands;
use crate::commands::utils::format_timestamp;
use crate::output::{OutputFormat, json::print_json, table::print_table};

const LIST_LIMIT: usize = 200;

pub fn run(storage: &Storage, command: FactCommands, format: OutputFormat) -> Result<()> {
    match command {
        FactCommands::Put {
            user,
            kind,
            value,
            confidence,
            updated_at,
        } => {
            if !(0.0..=1.0).contains(&confidence) {
                bail!("confidence must be between 0 and 1, got {confidence}");
            }
            let fact = SemanticFact::new(
                user,
                kind,
                value,
                updated_at.unwrap_or_else(time_utils::now_ms),
            )
            .with_confidence(confidence);
            put_fact(storage, &fact, format)
        }
        FactCommands::List { user } => list_facts(storage, &user, format),
        FactCommands::Clear { user, kind } => {
            let removed = storage.semantic_facts.delete_kind(&user, &kind)?;
            if format.is_json() {
                return print_json(&json!({ "kind": kind, "removed": removed }));
            }
            println!("Removed {removed} {kind} value(s) for {user}");
            Ok(())
        }
    }
}

fn put_fact(storage: &Storage, fact: &SemanticFact, format: OutputFormat) -> Result<()> {
    let stored = storage.semantic_facts.put(fact)?;

    if format.is_json() {
        return print_json(&json!({ "kind": fact.kind, "stored": stored }));
    }

    if stored {
        println!("Stored {} for {}", fact.kind, fact.user_id);
    } else {
        println!("Skipped blank value for {}", fact.kind);
    }
    Ok(())
}

fn list_facts(storage: &Storage, user_id: &str, format: OutputFormat) -> Result<()> {
    let all_kinds: Vec<&str> = kinds::SNAPSHOT_KINDS
        .iter()
        .chain(kinds::PREFERENCE_KINDS)
        .copied()
        .collect();
    let facts = storage.semantic_facts.list(user_id, &all_kinds, LIST_LIMIT)?;

    if format.is_json() {
        return print_json(&facts);
    }

    let mut table = Table::new();
    table.set_header(vec!["Kind", "Value", "Confidence", "Updated"]);
    for fact in facts {
        table.add_row(vec![
            Cell::new(fact.kind),
            Cell::new(fact.value),
            Cell::new(format!("{:.2}", fact.confidence)),
            Cell::new(format_timestamp(Some(fact.updated_at))),
        ]);
    }
    print_table(table)
}
