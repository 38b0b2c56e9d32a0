//! Human-in-the-loop retry fallback.

use serde::{Deserialize, Serialize};

/// Details of a text generation that stayed short after its automatic retry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_getters::Getters)]
pub struct RetryOffer {
    /// Purpose label of the prompt
    purpose: String,
    /// Words in the last attempt
    words: usize,
    /// Words the contract asked for
    min_words: usize,
    /// Attempts made so far
    attempts: u32,
}

impl RetryOffer {
    /// Create a new retry offer.
    pub fn new(purpose: impl Into<String>, words: usize, min_words: usize, attempts: u32) -> Self {
        Self {
            purpose: purpose.into(),
            words,
            min_words,
            attempts,
        }
    }
}

/// What the human decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display)]
pub enum RetryDecision {
    /// Keep the last attempt as it is
    Accept,
    /// Generate once more
    Retry,
}

/// Source of human decisions about persistent length failures.
pub trait Interaction: Send + Sync {
    /// Decide whether to accept a short result or force another attempt.
    fn offer_retry(&self, offer: &RetryOffer) -> RetryDecision;
}

/// Batch-mode interaction: always accepts, so the fallback is a no-op.
#[derive(Debug, Clone, Copy, Default)]
pub struct NonInteractive;

impl Interaction for NonInteractive {
    fn offer_retry(&self, _offer: &RetryOffer) -> RetryDecision {
        RetryDecision::Accept
    }
}
