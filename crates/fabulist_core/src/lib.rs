//! Core data types for the Fabulist narrative generation engine.
//!
//! This crate provides the foundation types shared by every other crate:
//! role-tagged messages, the generation request/response pair exchanged with
//! a generator, prompt templates keyed by purpose, and word-count helpers.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod message;
mod output;
mod request;
mod role;
mod templates;
mod words;

pub use message::Message;
pub use output::Output;
pub use request::{GenerateRequest, GenerateRequestBuilder, GenerateRequestBuilderError, GenerateResponse};
pub use role::Role;
pub use templates::{PromptTemplates, TemplatePurpose};
pub use words::{excerpt, scaled_words, word_count};
