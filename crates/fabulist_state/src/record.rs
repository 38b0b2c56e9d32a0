//! Lossless conversion of state entities to plain records.

use fabulist_error::{FabulistResult, JsonError, StateError, StateErrorKind};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Conversion to and from nested maps/lists of primitives.
///
/// Missing optional fields in older records fall back to their defaults;
/// structural invariants are re-checked by [`Record::validate`] on load.
pub trait Record: Serialize + DeserializeOwned {
    /// Serialize into a JSON record.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    fn to_record(&self) -> FabulistResult<serde_json::Value> {
        serde_json::to_value(self)
            .map_err(|e| JsonError::new(format!("Failed to serialize record: {}", e)).into())
    }

    /// Rebuild an entity from a JSON record.
    ///
    /// # Errors
    ///
    /// Returns an error if the record is malformed or breaks an invariant.
    fn from_record(record: serde_json::Value) -> FabulistResult<Self> {
        let entity: Self = serde_json::from_value(record)
            .map_err(|e| StateError::new(StateErrorKind::InvalidRecord(e.to_string())))?;
        entity.validate()?;
        Ok(entity)
    }

    /// Check structural invariants after loading.
    ///
    /// # Errors
    ///
    /// Returns an error describing the first violated invariant.
    fn validate(&self) -> FabulistResult<()> {
        Ok(())
    }
}
