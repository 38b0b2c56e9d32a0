//! Fabulist - long-form fiction generation over any text generator.
//!
//! Fabulist turns a one-paragraph story prompt into a multi-chapter
//! manuscript. It never talks to a model directly: callers supply a
//! [`FabulistDriver`], and every call goes through a [`Gateway`] that
//! enforces length and JSON contracts, timeouts and retries.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use fabulist::{FileNarrativeRepository, NovelPipeline, PipelineConfig, init_tracing};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> fabulist::FabulistResult<()> {
//!     init_tracing()?;
//!
//!     let driver = Arc::new(MyDriver::connect()?);
//!     let repository = Arc::new(FileNarrativeRepository::new("runs")?);
//!     let pipeline = NovelPipeline::new(driver, PipelineConfig::load()?)?
//!         .with_repository(repository, "locksmith");
//!
//!     let narrative = pipeline
//!         .run("A locksmith discovers her keys open more than doors.")
//!         .await?;
//!     println!("{}", narrative.manuscript());
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - `fabulist_error` - Error types
//! - `fabulist_core` - Messages, requests, prompt templates
//! - `fabulist_interface` - Driver, interaction and repository traits
//! - `fabulist_state` - Narrative state model and records
//! - `fabulist_gateway` - Text and structured generation contracts
//! - `fabulist_narrative` - Outline, chapter, scene and critique engines
//!
//! This crate re-exports everything for convenience.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod observability;

pub use fabulist_core::*;
pub use fabulist_error::*;
pub use fabulist_gateway::*;
pub use fabulist_interface::*;
pub use fabulist_narrative::*;
pub use fabulist_state::*;

pub use observability::{TracingConfig, init_tracing, init_tracing_with_config};
