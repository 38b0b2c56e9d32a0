//! Trait definitions for the Fabulist narrative generation engine.
//!
//! The engine talks to the outside world through three seams:
//! - [`FabulistDriver`] - the opaque text generator
//! - [`Interaction`] - an optional human who may force extra retries
//! - [`NarrativeRepository`] - save/load of narrative state for resume

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod interaction;
mod repository;
mod traits;

pub use interaction::{Interaction, NonInteractive, RetryDecision, RetryOffer};
pub use repository::NarrativeRepository;
pub use traits::FabulistDriver;
