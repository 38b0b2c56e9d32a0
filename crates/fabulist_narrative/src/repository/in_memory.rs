//! In-memory implementation of NarrativeRepository.
//!
//! Narratives are stored as records, so a save/load pair goes through the
//! same lossless conversion as the file repository.

use async_trait::async_trait;
use fabulist_error::{FabulistResult, StateError, StateErrorKind};
use fabulist_interface::NarrativeRepository;
use fabulist_state::{NarrativeContext, Record};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory repository for narratives in progress.
///
/// All data is lost when the last clone is dropped.
#[derive(Debug, Clone, Default)]
pub struct InMemoryNarrativeRepository {
    records: Arc<RwLock<HashMap<String, serde_json::Value>>>,
}

impl InMemoryNarrativeRepository {
    /// Create a new empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored narratives.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Whether nothing is stored.
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl NarrativeRepository for InMemoryNarrativeRepository {
    async fn save(&self, id: &str, narrative: &NarrativeContext) -> FabulistResult<()> {
        let record = narrative.to_record()?;
        self.records.write().await.insert(id.to_string(), record);
        tracing::debug!(id, chapters = narrative.chapters().len(), "Saved narrative in memory");
        Ok(())
    }

    async fn load(&self, id: &str) -> FabulistResult<NarrativeContext> {
        let record = self
            .records
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| StateError::new(StateErrorKind::NotFound(id.to_string())))?;
        NarrativeContext::from_record(record)
    }

    async fn list(&self) -> FabulistResult<Vec<String>> {
        let mut ids: Vec<String> = self.records.read().await.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }
}
