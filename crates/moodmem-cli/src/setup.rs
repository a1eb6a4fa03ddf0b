//! CLI setup module
//!
//! Resolves the database location and opens the memory store.

use anyhow::{Context, Result};
use moodmem_core::Storage;
use moodmem_storage::paths;

use crate::config::CliConfig;

/// Open the store at the flag/env path, the config file path, or the default.
pub fn prepare_storage(db_path: Option<String>, config: &CliConfig) -> Result<Storage> {
    let db_path = match db_path.or_else(|| config.default.db_path.clone()) {
        Some(path) => path,
        None => paths::ensure_database_path_string()?,
    };
    Storage::new(&db_path).with_context(|| format!("failed to open database at {db_path}"))
}
