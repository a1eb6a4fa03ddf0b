//! Memory configuration storage.

use anyhow::Result;
use redb::{Database, ReadableDatabase, TableDefinition};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

const CONFIG_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("system_config");
const CONFIG_KEY: &str = "memory";

// Default configuration constants
const DEFAULT_WINDOW_SIZE: usize = 20;
const DEFAULT_MAX_ACTIVE_THREADS: usize = 5;
const DEFAULT_TOPIC_DECAY: f64 = 0.9;
const DEFAULT_TOPIC_SCORE_CAP: f64 = 10.0;
const DEFAULT_VOLATILITY_ALPHA: f64 = 0.1;
const DEFAULT_MAX_WRITE_ATTEMPTS: u32 = 3;
const DEFAULT_BLOCK_CHAR_BUDGET: usize = 1200;
const DEFAULT_SNAPSHOT_FACT_LIMIT: usize = 50;
const DEFAULT_PREFERENCE_FACT_LIMIT: usize = 20;
const DEFAULT_SNAPSHOT_MAX_HINTS: usize = 6;
const MAX_WINDOW_SIZE: usize = 200;
/// Smallest budget that still fits the block header, footer and some body.
pub const MIN_BLOCK_CHAR_BUDGET: usize = 200;

/// Tuning knobs for the memory layers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    pub window_size: usize,
    pub max_active_threads: usize,
    pub topic_decay: f64,
    pub topic_score_cap: f64,
    pub volatility_alpha: f64,
    pub max_write_attempts: u32,
    pub block_char_budget: usize,
    pub snapshot_fact_limit: usize,
    pub preference_fact_limit: usize,
    pub snapshot_max_hints: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
            max_active_threads: DEFAULT_MAX_ACTIVE_THREADS,
            topic_decay: DEFAULT_TOPIC_DECAY,
            topic_score_cap: DEFAULT_TOPIC_SCORE_CAP,
            volatility_alpha: DEFAULT_VOLATILITY_ALPHA,
            max_write_attempts: DEFAULT_MAX_WRITE_ATTEMPTS,
            block_char_budget: DEFAULT_BLOCK_CHAR_BUDGET,
            snapshot_fact_limit: DEFAULT_SNAPSHOT_FACT_LIMIT,
            preference_fact_limit: DEFAULT_PREFERENCE_FACT_LIMIT,
            snapshot_max_hints: DEFAULT_SNAPSHOT_MAX_HINTS,
        }
    }
}

impl MemoryConfig {
    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.window_size == 0 || self.window_size > MAX_WINDOW_SIZE {
            return Err(anyhow::anyhow!(
                "Window size must be between 1 and {}",
                MAX_WINDOW_SIZE
            ));
        }

        if self.max_active_threads == 0 {
            return Err(anyhow::anyhow!("Max active threads must be at least 1"));
        }

        if !(self.topic_decay > 0.0 && self.topic_decay <= 1.0) {
            return Err(anyhow::anyhow!("Topic decay must be in (0, 1]"));
        }

        if !(self.topic_score_cap > 0.0 && self.topic_score_cap.is_finite()) {
            return Err(anyhow::anyhow!("Topic score cap must be a positive number"));
        }

        if !(self.volatility_alpha > 0.0 && self.volatility_alpha <= 1.0) {
            return Err(anyhow::anyhow!("Volatility alpha must be in (0, 1]"));
        }

        if self.max_write_attempts == 0 {
            return Err(anyhow::anyhow!("Max write attempts must be at least 1"));
        }

        if self.block_char_budget < MIN_BLOCK_CHAR_BUDGET {
            return Err(anyhow::anyhow!(
                "Block character budget must be at least {}",
                MIN_BLOCK_CHAR_BUDGET
            ));
        }

        if self.snapshot_fact_limit == 0 || self.preference_fact_limit == 0 {
            return Err(anyhow::anyhow!("Fact query limits must be at least 1"));
        }

        if self.snapshot_max_hints == 0 {
            return Err(anyhow::anyhow!("Snapshot hint cap must be at least 1"));
        }

        Ok(())
    }

    /// Set one field from its textual form, as used by `config set`.
    pub fn set_field(&mut self, key: &str, value: &str) -> Result<()> {
        fn parse<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
            value
                .trim()
                .parse()
                .map_err(|_| anyhow::anyhow!("Invalid value '{}' for {}", value, key))
        }

        match key {
            "window_size" => self.window_size = parse(key, value)?,
            "max_active_threads" => self.max_active_threads = parse(key, value)?,
            "topic_decay" => self.topic_decay = parse(key, value)?,
            "topic_score_cap" => self.topic_score_cap = parse(key, value)?,
            "volatility_alpha" => self.volatility_alpha = parse(key, value)?,
            "max_write_attempts" => self.max_write_attempts = parse(key, value)?,
            "block_char_budget" => self.block_char_budget = parse(key, value)?,
            "snapshot_fact_limit" => self.snapshot_fact_limit = parse(key, value)?,
            "preference_fact_limit" => self.preference_fact_limit = parse(key, value)?,
            "snapshot_max_hints" => self.snapshot_max_hints = parse(key, value)?,
            other => return Err(anyhow::anyhow!("Unknown config key: {}", other)),
        }
        Ok(())
    }
}

/// Configuration storage
#[derive(Clone)]
pub struct ConfigStorage {
    db: Arc<Database>,
}

impl ConfigStorage {
    pub fn new(db: Arc<Database>) -> Result<Self> {
        // Create table
        let write_txn = db.begin_write()?;
        write_txn.open_table(CONFIG_TABLE)?;
        write_txn.commit()?;

        let storage = Self { db };

        // Set default config if not exists
        if storage.get_config()?.is_none() {
            storage.update_config(MemoryConfig::default())?;
        }

        Ok(storage)
    }

    /// Get memory configuration
    pub fn get_config(&self) -> Result<Option<MemoryConfig>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(CONFIG_TABLE)?;

        if let Some(data) = table.get(CONFIG_KEY)? {
            let config: MemoryConfig = serde_json::from_slice(data.value())?;
            Ok(Some(config))
        } else {
            Ok(None)
        }
    }

    /// Update memory configuration
    pub fn update_config(&self, config: MemoryConfig) -> Result<()> {
        // Validate before saving
        config.validate()?;

        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(CONFIG_TABLE)?;
            let serialized = serde_json::to_vec(&config)?;
            table.insert(CONFIG_KEY, serialized.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Update a single field by name.
    pub fn set_value(&self, key: &str, value: &str) -> Result<MemoryConfig> {
        let mut config = self.get_config()?.unwrap_or_default();
        config.set_field(key, value)?;
        self.update_config(config.clone())?;
        debug!(key, value, "Memory configuration updated");
        Ok(config)
    }
}
