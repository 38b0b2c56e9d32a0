//! Generator (driver) error types.
//!
//! Drivers report these; the gateway folds every one of them into an
//! in-band failure reply.

/// Specific failure conditions reported by a generator driver.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum GeneratorErrorKind {
    /// The transport to the generator failed
    #[display("Transport failure: {}", _0)]
    Transport(String),
    /// The generator did not answer within the allotted time
    #[display("Generation timed out after {}s", _0)]
    Timeout(u64),
    /// The generator answered without any text output
    #[display("Generator returned no text output")]
    EmptyResponse,
    /// The generator rejected the request
    #[display("Request rejected: {}", _0)]
    Rejected(String),
}

/// Generator error with location tracking.
///
/// # Examples
///
/// ```
/// use fabulist_error::{GeneratorError, GeneratorErrorKind};
///
/// let err = GeneratorError::new(GeneratorErrorKind::Timeout(30));
/// assert!(format!("{}", err).contains("timed out"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Generator Error: {} at line {} in {}", kind, line, file)]
pub struct GeneratorError {
    /// The specific error condition
    pub kind: GeneratorErrorKind,
    /// Line number where the error occurred
    pub line: u32,
    /// Source file where the error occurred
    pub file: &'static str,
}

impl GeneratorError {
    /// Create a new GeneratorError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: GeneratorErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
