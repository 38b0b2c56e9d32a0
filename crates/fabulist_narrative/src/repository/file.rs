//! JSON-file implementation of NarrativeRepository.

use async_trait::async_trait;
use derive_getters::Getters;
use fabulist_error::{FabulistResult, JsonError, StateError, StateErrorKind};
use fabulist_interface::NarrativeRepository;
use fabulist_state::{NarrativeContext, Record};
use std::path::{Path, PathBuf};
use tracing::debug;

const EXTENSION: &str = "json";

/// Stores each narrative as `<id>.json` in a directory.
///
/// # Examples
///
/// ```
/// use fabulist_interface::NarrativeRepository;
/// use fabulist_narrative::FileNarrativeRepository;
/// use fabulist_state::NarrativeContext;
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let dir = std::env::temp_dir().join("fabulist-doc-repository");
/// let repository = FileNarrativeRepository::new(&dir).unwrap();
/// let narrative = NarrativeContext::new("A locksmith's keys open more than doors.", None);
///
/// repository.save("locksmith", &narrative).await.unwrap();
/// assert_eq!(repository.load("locksmith").await.unwrap(), narrative);
/// # });
/// ```
#[derive(Debug, Clone, Getters)]
pub struct FileNarrativeRepository {
    /// Directory holding the narrative files
    directory: PathBuf,
}

impl FileNarrativeRepository {
    /// Open a repository, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn new(directory: impl AsRef<Path>) -> FabulistResult<Self> {
        let directory = directory.as_ref().to_path_buf();
        if !directory.exists() {
            std::fs::create_dir_all(&directory).map_err(|e| {
                StateError::new(StateErrorKind::FileWrite(format!(
                    "Failed to create {}: {}",
                    directory.display(),
                    e
                )))
            })?;
        }
        debug!(path = %directory.display(), "Initialized narrative repository");
        Ok(Self { directory })
    }

    fn path_for(&self, id: &str) -> FabulistResult<PathBuf> {
        let valid = !id.is_empty()
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
            && !id.starts_with('.');
        if !valid {
            return Err(StateError::new(StateErrorKind::InvalidRecord(format!(
                "Invalid narrative id: {:?}",
                id
            )))
            .into());
        }
        Ok(self.directory.join(format!("{}.{}", id, EXTENSION)))
    }
}

#[async_trait]
impl NarrativeRepository for FileNarrativeRepository {
    async fn save(&self, id: &str, narrative: &NarrativeContext) -> FabulistResult<()> {
        let path = self.path_for(id)?;
        let record = narrative.to_record()?;
        let contents = serde_json::to_string_pretty(&record)
            .map_err(|e| JsonError::new(format!("Failed to serialize narrative: {}", e)))?;

        // Write to a sibling file, then rename over the record
        let staging = path.with_extension("json.tmp");
        tokio::fs::write(&staging, contents).await.map_err(|e| {
            StateError::new(StateErrorKind::FileWrite(format!("{}: {}", staging.display(), e)))
        })?;
        tokio::fs::rename(&staging, &path).await.map_err(|e| {
            StateError::new(StateErrorKind::FileWrite(format!("{}: {}", path.display(), e)))
        })?;

        debug!(id, path = %path.display(), chapters = narrative.chapters().len(), "Saved narrative");
        Ok(())
    }

    async fn load(&self, id: &str) -> FabulistResult<NarrativeContext> {
        let path = self.path_for(id)?;
        let contents = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StateError::new(StateErrorKind::NotFound(id.to_string())).into());
            }
            Err(e) => {
                return Err(StateError::new(StateErrorKind::FileRead(format!(
                    "{}: {}",
                    path.display(),
                    e
                )))
                .into());
            }
        };

        let record: serde_json::Value = serde_json::from_str(&contents)
            .map_err(|e| JsonError::new(format!("Failed to parse {}: {}", path.display(), e)))?;
        let narrative = NarrativeContext::from_record(record)?;
        debug!(id, chapters = narrative.chapters().len(), "Loaded narrative");
        Ok(narrative)
    }

    async fn list(&self) -> FabulistResult<Vec<String>> {
        let mut entries = tokio::fs::read_dir(&self.directory).await.map_err(|e| {
            StateError::new(StateErrorKind::FileRead(format!(
                "{}: {}",
                self.directory.display(),
                e
            )))
        })?;

        let mut ids = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(|e| {
            StateError::new(StateErrorKind::FileRead(format!(
                "{}: {}",
                self.directory.display(),
                e
            )))
        })? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) == Some(EXTENSION)
                && let Some(stem) = path.file_stem().and_then(|stem| stem.to_str())
            {
                ids.push(stem.to_string());
            }
        }
        ids.sort();
        Ok(ids)
    }
}
