//! Top-level error wrapper types.

use crate::{
    BuilderError, ConfigError, GeneratorError, JsonError, StateError, TemplateError,
};

/// The foundation error enum aggregating every error family in the workspace.
///
/// # Examples
///
/// ```
/// use fabulist_error::{FabulistError, ConfigError};
///
/// let err: FabulistError = ConfigError::new("bad strategy").into();
/// assert!(format!("{}", err).contains("Configuration Error"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum FabulistErrorKind {
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
    /// JSON serialization/deserialization error
    #[from(JsonError)]
    Json(JsonError),
    /// Builder error
    #[from(BuilderError)]
    Builder(BuilderError),
    /// Generator driver error
    #[from(GeneratorError)]
    Generator(GeneratorError),
    /// Narrative state error
    #[from(StateError)]
    State(StateError),
    /// Prompt template error
    #[from(TemplateError)]
    Template(TemplateError),
}

/// Fabulist error with kind discrimination.
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Fabulist Error: {}", _0)]
pub struct FabulistError(Box<FabulistErrorKind>);

impl FabulistError {
    /// Create a new error from a kind.
    pub fn new(kind: FabulistErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &FabulistErrorKind {
        &self.0
    }
}

// Generic From implementation for any type that converts to FabulistErrorKind
impl<T> From<T> for FabulistError
where
    T: Into<FabulistErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for Fabulist operations.
pub type FabulistResult<T> = std::result::Result<T, FabulistError>;
