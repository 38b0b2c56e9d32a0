//! Prompt template error types.

/// Specific error conditions for prompt templates.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum TemplateErrorKind {
    /// A purpose has no template after all sources were layered
    #[display("No template supplied for purpose '{}'", _0)]
    MissingPurpose(String),
    /// A template key does not name any known purpose
    #[display("Unknown template purpose '{}'", _0)]
    UnknownPurpose(String),
    /// A template file could not be read or parsed
    #[display("Failed to load templates: {}", _0)]
    Load(String),
}

/// Error type for prompt template operations.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Template Error: {} at line {} in {}", kind, line, file)]
pub struct TemplateError {
    /// The specific error condition
    pub kind: TemplateErrorKind,
    /// Line number where the error occurred
    pub line: u32,
    /// Source file where the error occurred
    pub file: &'static str,
}

impl TemplateError {
    /// Create a new TemplateError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: TemplateErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
