//! Carry-over digests.
//!
//! Later prompts see summaries of earlier work, never its full text, so
//! prompt size stays bounded by the number of chapters and pieces.

use crate::{Brief, CritiqueEngine, KeyPointsResult, ModelRole, Workshop};
use fabulist_core::{TemplatePurpose, excerpt, word_count};
use tracing::{debug, warn};

/// Words kept when a digest falls back to the leading excerpt.
const FALLBACK_EXCERPT_WORDS: usize = 80;

/// Produces short digests of generated text.
#[derive(Debug, Clone, Copy)]
pub struct Summarizer<'a> {
    workshop: &'a Workshop,
}

impl<'a> Summarizer<'a> {
    /// Create a summarizer over a workshop.
    pub fn new(workshop: &'a Workshop) -> Self {
        Self { workshop }
    }

    /// Short plain-text digest of `text`, described to the generator as `purpose`.
    ///
    /// Falls back to the leading words of `text` when generation fails.
    pub async fn digest(&self, text: &str, purpose: &str) -> String {
        if text.trim().is_empty() {
            return String::new();
        }
        let min_words = (*self.workshop.config().words().summary()).min(word_count(text));
        let digest = self
            .workshop
            .write(
                TemplatePurpose::Summarize,
                ModelRole::Summary,
                &[("purpose", purpose), ("content", text)],
                min_words,
            )
            .await;

        match digest {
            Some(digest) => {
                debug!(purpose, words = word_count(&digest), "Digested");
                digest.trim().to_string()
            }
            None => {
                warn!(purpose, "Summary failed, using leading excerpt");
                excerpt(text, FALLBACK_EXCERPT_WORDS)
            }
        }
    }

    /// Digest of a finished chapter, given one critique-revise pass.
    pub async fn chapter_summary(&self, content: &str, brief: &Brief<'_>) -> String {
        let digest = self.digest(content, "chapter of a novel").await;
        if digest.is_empty() {
            return digest;
        }
        CritiqueEngine::new(self.workshop)
            .single_pass(digest, brief)
            .await
    }

    /// Facts from a scene the next scene must remember; empty on failure.
    pub async fn key_points(&self, scene_outline: &str, content: &str) -> Vec<String> {
        self.workshop
            .ask::<KeyPointsResult>(
                TemplatePurpose::KeyPoints,
                &[("scene_outline", scene_outline), ("content", content)],
            )
            .await
            .map(|result| result.key_points().clone())
            .unwrap_or_default()
    }
}
