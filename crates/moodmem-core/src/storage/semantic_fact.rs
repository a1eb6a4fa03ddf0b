//! Typed semantic fact storage wrapper.

use anyhow::Result;
use async_trait::async_trait;
use moodmem_models::SemanticFact;
use moodmem_traits::FactStore;
use redb::Database;
use std::sync::Arc;

/// Typed wrapper around moodmem-storage::SemanticFactStorage.
#[derive(Debug, Clone)]
pub struct SemanticFactStorage {
    inner: moodmem_storage::SemanticFactStorage,
}

impl SemanticFactStorage {
    pub fn new(db: Arc<Database>) -> Result<Self> {
        Ok(Self {
            inner: moodmem_storage::SemanticFactStorage::new(db)?,
        })
    }

    /// Insert or refresh a fact. Values are trimmed; blank values are ignored.
    pub fn put(&self, fact: &SemanticFact) -> Result<bool> {
        let value = fact.value.trim();
        if value.is_empty() {
            return Ok(false);
        }
        let mut row = fact.clone();
        row.value = value.to_string();
        let bytes = serde_json::to_vec(&row)?;
        self.inner.put_raw(&row.user_id, &row.kind, &row.value, &bytes)?;
        Ok(true)
    }

    /// Facts of the given kinds, most recently updated first, capped at `limit`.
    pub fn list(&self, user_id: &str, kinds: &[&str], limit: usize) -> Result<Vec<SemanticFact>> {
        let mut facts: Vec<SemanticFact> = Vec::new();
        for kind in kinds {
            for bytes in self.inner.list_kind_raw(user_id, kind)? {
                facts.push(serde_json::from_slice(&bytes)?);
            }
        }
        facts.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        facts.truncate(limit);
        Ok(facts)
    }

    pub fn delete_kind(&self, user_id: &str, kind: &str) -> Result<usize> {
        self.inner.delete_kind(user_id, kind)
    }
}

#[async_trait]
impl FactStore for SemanticFactStorage {
    async fn facts(
        &self,
        user_id: &str,
        kinds: &[&str],
        limit: usize,
    ) -> moodmem_traits::Result<Vec<SemanticFact>> {
        Ok(self.list(user_id, kinds, limit)?)
    }
}
