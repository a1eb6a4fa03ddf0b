//! Path utilities for MoodMem directory resolution.

use anyhow::Result;
use std::path::PathBuf;

const MOODMEM_DIR: &str = ".moodmem";
const DATABASE_FILE: &str = "moodmem.db";

/// Environment variable to override the MoodMem directory.
const MOODMEM_DIR_ENV: &str = "MOODMEM_DIR";

/// Resolve the MoodMem data directory.
/// Priority: MOODMEM_DIR env var > ~/.moodmem/
pub fn resolve_moodmem_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(MOODMEM_DIR_ENV)
        && !dir.trim().is_empty()
    {
        return Ok(PathBuf::from(dir));
    }
    dirs::home_dir()
        .map(|h| h.join(MOODMEM_DIR))
        .ok_or_else(|| anyhow::anyhow!("Failed to determine home directory"))
}

/// Ensure the MoodMem directory exists and return its path.
pub fn ensure_moodmem_dir() -> Result<PathBuf> {
    let dir = resolve_moodmem_dir()?;
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Default database path: ~/.moodmem/moodmem.db
pub fn ensure_database_path_string() -> Result<String> {
    Ok(ensure_moodmem_dir()?
        .join(DATABASE_FILE)
        .to_string_lossy()
        .into_owned())
}
