//! Narrative engines for Fabulist.
//!
//! This crate turns a story prompt into a finished manuscript by driving a
//! generator through a fixed sequence of stages:
//!
//! 1. **Outline**: extract non-plot instructions, build story elements,
//!    write a chapter-delimited outline and make it reach the configured
//!    chapter count ([`OutlineEngine`]).
//! 2. **Chapters**: write each chapter with either the multi-stage
//!    plot/character/dialogue strategy or scene decomposition
//!    ([`ChapterPipeline`], [`SceneAssembler`]).
//! 3. **Quality**: every artifact passes through critique/revise cycles
//!    ([`CritiqueEngine`]) and completion verification
//!    ([`CompletionVerifier`]).
//! 4. **Checkpointing**: the narrative is saved after every stage through a
//!    [`NarrativeRepository`](fabulist_interface::NarrativeRepository).
//!
//! Failures never abort a run. A stage that cannot get usable output keeps
//! the best text it has, and a chapter that cannot be written becomes a
//! failed placeholder in the manuscript.
//!
//! # Example
//!
//! ```rust,ignore
//! use fabulist_narrative::{FileNarrativeRepository, NovelPipeline, PipelineConfig};
//! use std::sync::Arc;
//!
//! # async fn example(driver: Arc<dyn fabulist_interface::FabulistDriver>) -> fabulist_error::FabulistResult<()> {
//! let config = PipelineConfig::load()?;
//! let repository = Arc::new(FileNarrativeRepository::new("runs")?);
//! let pipeline = NovelPipeline::new(driver, config)?.with_repository(repository, "locksmith");
//!
//! let narrative = pipeline.run("A locksmith's keys open more than doors.").await?;
//! println!("{}", narrative.manuscript());
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod chapter;
mod config;
mod critique;
mod outline;
mod pipeline;
mod replies;
mod repository;
mod scene;
mod summary;
mod verifier;
mod workshop;

pub use chapter::{ChapterOutcome, ChapterPipeline, SCENE_SEPARATOR};
pub use config::{
    ChapterStrategy, CritiqueConfig, ModelRole, ModelRoles, PipelineConfig, RevisionBounds,
    SceneConfig, VerifierConfig, WordFloors,
};
pub use critique::{Axis, Brief, CritiqueEngine, RevisionCycle};
pub use outline::{
    OutlineEngine, OutlineStage, chapter_headers, chapter_number, header_count, outline_headers,
    split_chapters,
};
pub use pipeline::NovelPipeline;
pub use replies::{
    ChapterCountResult, ChapterNotesResult, ChapterOutlineResult, CompletenessResult,
    KeyPointsResult, MotifsResult, SceneListResult, ScoreResult, StoryInfoResult,
};
pub use repository::{FileNarrativeRepository, InMemoryNarrativeRepository};
pub use scene::{SCENE_OPENING, SceneAssembler, SceneBrief};
pub use summary::Summarizer;
pub use verifier::{CompletionStatus, CompletionVerifier, VerifiedArtifact};
pub use workshop::Workshop;
