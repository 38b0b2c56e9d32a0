//! Persistence contract for narrative state.

use async_trait::async_trait;
use fabulist_error::FabulistResult;
use fabulist_state::NarrativeContext;

/// Save/load contract for narratives in progress.
///
/// Implementations must round-trip a [`NarrativeContext`] losslessly so a run
/// can resume after the last stored chapter.
#[async_trait]
pub trait NarrativeRepository: Send + Sync {
    /// Store a narrative under `id`, replacing any previous version.
    async fn save(&self, id: &str, narrative: &NarrativeContext) -> FabulistResult<()>;

    /// Load the narrative stored under `id`.
    async fn load(&self, id: &str) -> FabulistResult<NarrativeContext>;

    /// Ids of all stored narratives, sorted.
    async fn list(&self) -> FabulistResult<Vec<String>>;
}
