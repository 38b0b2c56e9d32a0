//! Narrative state error types.

/// Specific error conditions for narrative state operations.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum StateErrorKind {
    /// Chapter numbers must start at 1 and strictly increase
    #[display("Chapter {} cannot follow chapter {}", attempted, last)]
    ChapterOrder {
        /// Number of the last stored chapter (0 when empty)
        last: u32,
        /// Number that was rejected
        attempted: u32,
    },
    /// Scene numbers must start at 1 and strictly increase within a chapter
    #[display("Scene {} cannot follow scene {}", attempted, last)]
    SceneOrder {
        /// Number of the last stored scene (0 when empty)
        last: u32,
        /// Number that was rejected
        attempted: u32,
    },
    /// A persisted record could not be decoded
    #[display("Invalid record: {}", _0)]
    InvalidRecord(String),
    /// Failed to read a persisted narrative
    #[display("Failed to read narrative state: {}", _0)]
    FileRead(String),
    /// Failed to write a persisted narrative
    #[display("Failed to write narrative state: {}", _0)]
    FileWrite(String),
    /// No narrative stored under the requested id
    #[display("No narrative stored under id '{}'", _0)]
    NotFound(String),
}

/// Error type for narrative state operations.
///
/// # Examples
///
/// ```
/// use fabulist_error::{StateError, StateErrorKind};
///
/// let err = StateError::new(StateErrorKind::ChapterOrder { last: 3, attempted: 2 });
/// assert!(format!("{}", err).contains("cannot follow chapter 3"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("State Error: {} at line {} in {}", kind, line, file)]
pub struct StateError {
    /// The specific error condition
    pub kind: StateErrorKind,
    /// Line number where the error occurred
    pub line: u32,
    /// Source file where the error occurred
    pub file: &'static str,
}

impl StateError {
    /// Create a new StateError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: StateErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
