//! Error types for the Fabulist workspace.
//!
//! # Error Hierarchy
//!
//! All errors follow the `ErrorKind` + wrapper struct pattern:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - All constructors use `#[track_caller]` for automatic location capture
//!
//! Errors in this crate describe setup problems (configuration, templates,
//! persistence, state ordering). Generation failures never surface as errors
//! past the gateway; they travel in-band as `Reply::Failed`.
//!
//! # Examples
//!
//! ```
//! use fabulist_error::{FabulistResult, ConfigError};
//!
//! fn load() -> FabulistResult<String> {
//!     Err(ConfigError::new("missing [gateway] table"))?
//! }
//!
//! assert!(load().is_err());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod builder;
mod config;
mod error;
mod generator;
mod json;
mod state;
mod template;

pub use builder::{BuilderError, BuilderErrorKind};
pub use config::ConfigError;
pub use error::{FabulistError, FabulistErrorKind, FabulistResult};
pub use generator::{GeneratorError, GeneratorErrorKind};
pub use json::JsonError;
pub use state::{StateError, StateErrorKind};
pub use template::{TemplateError, TemplateErrorKind};
