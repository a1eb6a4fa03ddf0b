use anyhow::{Context, Result};
use comfy_table::{Cell, Table};
use moodmem_core::{EmotionMemory, EventOutcome, Storage};
use moodmem_models::EmotionEvent;
use serde::Deserialize;
use std::io::Read;
use tracing::debug;

use crate::output::{OutputFormat, json::print_json, table::print_table};

/// A record file holds one event or a list of them.
#[derive(Deserialize)]
#[serde(untagged)]
enum EventInput {
    Many(Vec<EmotionEvent>),
    One(Box<EmotionEvent>),
}

impl EventInput {
    fn into_events(self) -> Vec<EmotionEvent> {
        match self {
            EventInput::Many(events) => events,
            EventInput::One(event) => vec![*event],
        }
    }
}

pub async fn run(storage: &Storage, input: &str, format: OutputFormat) -> Result<()> {
    let content = read_input(input)?;
    let events = parse_events(&content)?;
    let memory = EmotionMemory::from_storage(storage)?;
    debug!(count = events.len(), "Recording emotion events");

    let mut outcomes = Vec::with_capacity(events.len());
    for event in &events {
        outcomes.push(memory.record_event(event).await);
    }

    if format.is_json() {
        return print_json(&outcomes);
    }

    let mut table = Table::new();
    table.set_header(vec![
        "Message", "Result", "Enrichment", "Short-term", "Trend", "Long-term",
    ]);
    for (event, outcome) in events.iter().zip(&outcomes) {
        table.add_row(outcome_row(event, outcome));
    }
    print_table(table)
}

fn read_input(input: &str) -> Result<String> {
    if input == "-" {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read events from stdin")?;
        return Ok(buffer);
    }
    std::fs::read_to_string(input).with_context(|| format!("Failed to read events from {input}"))
}

fn parse_events(content: &str) -> Result<Vec<EmotionEvent>> {
    let input: EventInput =
        serde_json::from_str(content).context("Input is not an event object or array")?;
    Ok(input.into_events())
}

fn outcome_row(event: &EmotionEvent, outcome: &EventOutcome) -> Vec<Cell> {
    let message = if event.message_id.is_empty() {
        "-".to_string()
    } else {
        event.message_id.clone()
    };

    match outcome {
        EventOutcome::Rejected { reason } => vec![
            Cell::new(message),
            Cell::new(format!("rejected: {reason}")),
            Cell::new("-"),
            Cell::new("-"),
            Cell::new("-"),
            Cell::new("-"),
        ],
        EventOutcome::Processed(report) => {
            let trend = report
                .short_term
                .value()
                .and_then(|signal| signal.trend)
                .map_or_else(|| "-".to_string(), |trend| trend.to_string());
            vec![
                Cell::new(message),
                Cell::new("processed"),
                Cell::new(report.enrichment.status()),
                Cell::new(report.short_term.status()),
                Cell::new(trend),
                Cell::new(report.long_term.status()),
            ]
        }
    }
}
