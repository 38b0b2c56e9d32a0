//! Completion verifier.
//!
//! Detects truncated artifacts and drives bounded continuation. A
//! continuation is always appended to the artifact, never substituted for
//! it, and incompleteness after the last round is logged, not raised.

use crate::{CompletenessResult, ModelRole, Summarizer, Workshop};
use derive_getters::Getters;
use fabulist_core::{Message, TemplatePurpose, word_count};
use fabulist_state::SceneContext;
use tracing::{debug, info, instrument, warn};

/// Verdict on an artifact after verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum CompletionStatus {
    /// The generator judged the artifact complete
    Complete,
    /// Still incomplete after the last continuation round
    Incomplete,
    /// Too short to verify, or no verdict could be obtained
    Unverifiable,
}

/// An artifact with everything appended to it during verification.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct VerifiedArtifact {
    /// The artifact with continuations appended
    text: String,
    /// Final verdict
    status: CompletionStatus,
    /// Continuation rounds run
    continuations: u32,
}

impl VerifiedArtifact {
    /// Consume into the text.
    pub fn into_text(self) -> String {
        self.text
    }
}

/// Asks whether artifacts are finished and continues them when they are not.
#[derive(Debug, Clone, Copy)]
pub struct CompletionVerifier<'a> {
    workshop: &'a Workshop,
}

impl<'a> CompletionVerifier<'a> {
    /// Create a verifier over a workshop.
    pub fn new(workshop: &'a Workshop) -> Self {
        Self { workshop }
    }

    /// Verify a standalone artifact described as `purpose`.
    #[instrument(skip(self, artifact), fields(words = word_count(&artifact)))]
    pub async fn verify(&self, purpose: &str, artifact: String) -> VerifiedArtifact {
        if self.too_short(&artifact) {
            return VerifiedArtifact {
                text: artifact,
                status: CompletionStatus::Unverifiable,
                continuations: 0,
            };
        }

        let max_continuations = *self.workshop.config().verifier().max_continuations();
        let mut text = artifact;
        let mut continuations = 0;

        let status = loop {
            match self.check(purpose, &text).await {
                None => break CompletionStatus::Unverifiable,
                Some(true) => break CompletionStatus::Complete,
                Some(false) if continuations >= max_continuations => {
                    break CompletionStatus::Incomplete;
                }
                Some(false) => {}
            }

            continuations += 1;
            info!(purpose, round = continuations, "Artifact incomplete, continuing");
            let Some(continuation) = self.continuation(purpose, &text).await else {
                warn!(purpose, "Continuation failed");
                break CompletionStatus::Incomplete;
            };
            text = format!("{}\n\n{}", text.trim_end(), continuation.trim());
        };

        if status == CompletionStatus::Incomplete {
            warn!(purpose, continuations, "Proceeding with incomplete artifact");
        }
        VerifiedArtifact {
            text,
            status,
            continuations,
        }
    }

    /// Verify a scene, appending each continuation as a new piece.
    #[instrument(skip(self, scene), fields(scene = scene.scene_number()))]
    pub async fn verify_pieces(&self, purpose: &str, scene: &mut SceneContext) -> CompletionStatus {
        if self.too_short(&scene.generated_content()) {
            return CompletionStatus::Unverifiable;
        }

        let max_continuations = *self.workshop.config().verifier().max_continuations();
        let summarizer = Summarizer::new(self.workshop);
        let mut continuations = 0;

        let status = loop {
            let text = scene.generated_content();
            match self.check(purpose, &text).await {
                None => break CompletionStatus::Unverifiable,
                Some(true) => break CompletionStatus::Complete,
                Some(false) if continuations >= max_continuations => {
                    break CompletionStatus::Incomplete;
                }
                Some(false) => {}
            }

            continuations += 1;
            info!(purpose, round = continuations, "Scene incomplete, continuing");
            let Some(continuation) = self.continuation(purpose, &text).await else {
                warn!(purpose, "Continuation failed");
                break CompletionStatus::Incomplete;
            };
            let summary = summarizer.digest(&continuation, "scene piece").await;
            scene.add_piece(continuation.trim(), summary);
        };

        if status == CompletionStatus::Incomplete {
            warn!(purpose, continuations, "Proceeding with incomplete scene");
        }
        status
    }

    fn too_short(&self, text: &str) -> bool {
        let min_words = *self.workshop.config().verifier().min_words();
        let words = word_count(text);
        if words < min_words {
            debug!(words, min_words, "Artifact too short to verify");
            return true;
        }
        false
    }

    async fn check(&self, purpose: &str, text: &str) -> Option<bool> {
        let verdict = self
            .workshop
            .ask::<CompletenessResult>(
                TemplatePurpose::CompletenessCheck,
                &[("purpose", purpose), ("content", text)],
            )
            .await;
        match verdict {
            Some(verdict) => {
                debug!(
                    purpose,
                    is_complete = verdict.is_complete(),
                    reason = %verdict.reason(),
                    "Completeness verdict"
                );
                Some(*verdict.is_complete())
            }
            None => {
                warn!(purpose, "No completeness verdict");
                None
            }
        }
    }

    async fn continuation(&self, purpose: &str, text: &str) -> Option<String> {
        let workshop = self.workshop;
        let history = vec![
            Message::assistant(text),
            Message::user(workshop.render(TemplatePurpose::ContinueArtifact, &[("purpose", purpose)])),
        ];
        let target = workshop.target(TemplatePurpose::ContinueArtifact, ModelRole::Chapter);
        let min_words = *workshop.config().verifier().continuation_min_words();
        workshop
            .gateway()
            .generate_text(history, &target, min_words)
            .await
            .reply
            .into_text()
    }
}
