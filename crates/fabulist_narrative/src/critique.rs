//! Critique-revise engine.
//!
//! An artifact is improved along three ordered axes, style, structure and
//! consistency. Each axis is a bounded [`RevisionCycle`]:
//!
//! 1. Iteration 1 critiques and revises unconditionally.
//! 2. Later iterations score first; a score at or above the threshold ends
//!    the axis.
//! 3. An empty or "no issues" critique skips revision for that round.
//! 4. A revision that fails or falls below its length floor is discarded.
//!
//! A cleanup pass strips meta-commentary afterwards. No step ever returns
//! less than it was given: every failure falls back to the previous version.

use crate::{ModelRole, ScoreResult, Workshop};
use derive_getters::Getters;
use fabulist_core::{TemplatePurpose, scaled_words, word_count};
use tracing::{debug, info, instrument, warn};

/// Quality axis of a revision cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum Axis {
    /// Voice, word choice, rhythm
    Style,
    /// Pacing, order, purpose
    Structure,
    /// Continuity with the story so far
    Consistency,
}

/// One critique/revise/score loop, with its templates as data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Getters)]
pub struct RevisionCycle {
    /// Label used in telemetry
    label: &'static str,
    /// Template producing the critique
    critique: TemplatePurpose,
    /// Template producing the revision
    revise: TemplatePurpose,
    /// Template producing the 0-100 score; `None` disables the score gate
    score: Option<TemplatePurpose>,
}

impl RevisionCycle {
    /// Build a cycle from explicit templates.
    pub fn new(
        label: &'static str,
        critique: TemplatePurpose,
        revise: TemplatePurpose,
        score: Option<TemplatePurpose>,
    ) -> Self {
        Self {
            label,
            critique,
            revise,
            score,
        }
    }

    /// The cycle for one axis.
    pub fn for_axis(axis: Axis) -> Self {
        match axis {
            Axis::Style => Self::new(
                "style",
                TemplatePurpose::CritiqueStyle,
                TemplatePurpose::ReviseStyle,
                Some(TemplatePurpose::ScoreStyle),
            ),
            Axis::Structure => Self::new(
                "structure",
                TemplatePurpose::CritiqueStructure,
                TemplatePurpose::ReviseStructure,
                Some(TemplatePurpose::ScoreStructure),
            ),
            Axis::Consistency => Self::new(
                "consistency",
                TemplatePurpose::CritiqueConsistency,
                TemplatePurpose::ReviseConsistency,
                Some(TemplatePurpose::ScoreConsistency),
            ),
        }
    }

    /// The unsplit cycle used by [`CritiqueEngine::single_pass`].
    pub fn single() -> Self {
        Self::new(
            "single",
            TemplatePurpose::CritiqueSingle,
            TemplatePurpose::ReviseSingle,
            None,
        )
    }
}

/// What the critic is told about the artifact.
#[derive(Debug, Clone, Copy, Default)]
pub struct Brief<'a> {
    /// What the artifact is, e.g. "chapter 3 of the novel"
    pub task: &'a str,
    /// Summary of the story so far
    pub context: &'a str,
    /// The original prompt
    pub prompt: &'a str,
    /// The style guide
    pub style_guide: &'a str,
}

/// Runs revision cycles over an artifact.
#[derive(Debug, Clone, Copy)]
pub struct CritiqueEngine<'a> {
    workshop: &'a Workshop,
}

impl<'a> CritiqueEngine<'a> {
    /// Create an engine over a workshop.
    pub fn new(workshop: &'a Workshop) -> Self {
        Self { workshop }
    }

    /// All three axes in order, then cleanup.
    #[instrument(skip_all, fields(task = brief.task, words = word_count(&content)))]
    pub async fn improve(&self, content: String, brief: &Brief<'_>) -> String {
        let mut current = content;
        for axis in [Axis::Style, Axis::Structure, Axis::Consistency] {
            current = self
                .revise_axis(current, brief, &RevisionCycle::for_axis(axis))
                .await;
        }
        if *self.workshop.config().critique().cleanup() {
            current = self.cleanup(current).await;
        }
        current
    }

    /// One bounded cycle.
    #[instrument(skip_all, fields(cycle = cycle.label, task = brief.task))]
    pub async fn revise_axis(
        &self,
        content: String,
        brief: &Brief<'_>,
        cycle: &RevisionCycle,
    ) -> String {
        let settings = self.workshop.config().critique();
        let max_iterations = *settings.max_iterations_per_axis();
        let threshold = *settings.score_threshold();
        let mut current = content;

        for iteration in 1..=max_iterations {
            if iteration >= 2
                && let Some(score_purpose) = cycle.score()
                && let Some(score) = self.score(*score_purpose, &current, brief).await
            {
                debug!(cycle = cycle.label, iteration, score, "Scored");
                if score >= threshold {
                    info!(cycle = cycle.label, iteration, score, "Score threshold reached");
                    break;
                }
            }

            let Some(critique) = self.critique(cycle, &current, brief).await else {
                debug!(cycle = cycle.label, iteration, "No actionable critique");
                continue;
            };

            if let Some(revised) = self.revise(cycle, &current, &critique, brief).await {
                current = revised;
            }
        }

        current
    }

    /// One critique and one revision, with no score gate.
    #[instrument(skip_all, fields(task = brief.task))]
    pub async fn single_pass(&self, content: String, brief: &Brief<'_>) -> String {
        let cycle = RevisionCycle::single();
        match self.critique(&cycle, &content, brief).await {
            Some(critique) => self
                .revise(&cycle, &content, &critique, brief)
                .await
                .unwrap_or(content),
            None => content,
        }
    }

    /// Strip meta-commentary; falls back to the input when the result is short or missing.
    pub async fn cleanup(&self, content: String) -> String {
        let floor = scaled_words(word_count(&content), *self.workshop.config().critique().cleanup_factor());
        let cleaned = self
            .workshop
            .write(
                TemplatePurpose::Cleanup,
                ModelRole::Critique,
                &[("content", &content), ("min_words", &floor.to_string())],
                floor,
            )
            .await;

        match cleaned {
            Some(text) if word_count(&text) >= floor => text,
            Some(text) => {
                warn!(words = word_count(&text), floor, "Cleanup too short, keeping revised text");
                content
            }
            None => {
                warn!("Cleanup failed, keeping revised text");
                content
            }
        }
    }

    async fn score(&self, purpose: TemplatePurpose, content: &str, brief: &Brief<'_>) -> Option<u32> {
        self.workshop
            .ask::<ScoreResult>(purpose, &[("task", brief.task), ("content", content)])
            .await
            .map(|result| result.score())
    }

    async fn critique(&self, cycle: &RevisionCycle, content: &str, brief: &Brief<'_>) -> Option<String> {
        let critique = self
            .workshop
            .write(
                *cycle.critique(),
                ModelRole::Critique,
                &[
                    ("task", brief.task),
                    ("context", brief.context),
                    ("prompt", brief.prompt),
                    ("style_guide", brief.style_guide),
                    ("content", content),
                ],
                0,
            )
            .await?;
        (!is_no_issues(&critique)).then_some(critique)
    }

    async fn revise(
        &self,
        cycle: &RevisionCycle,
        content: &str,
        critique: &str,
        brief: &Brief<'_>,
    ) -> Option<String> {
        let floor = scaled_words(word_count(content), *self.workshop.config().critique().revision_factor());
        let revised = self
            .workshop
            .write(
                *cycle.revise(),
                ModelRole::Critique,
                &[
                    ("task", brief.task),
                    ("context", brief.context),
                    ("prompt", brief.prompt),
                    ("style_guide", brief.style_guide),
                    ("critique", critique),
                    ("content", content),
                    ("min_words", &floor.to_string()),
                ],
                floor,
            )
            .await;

        match revised {
            Some(text) if word_count(&text) >= floor => Some(text),
            Some(text) => {
                warn!(
                    cycle = cycle.label,
                    words = word_count(&text),
                    floor,
                    "Revision too short, keeping previous version"
                );
                None
            }
            None => {
                warn!(cycle = cycle.label, "Revision failed, keeping previous version");
                None
            }
        }
    }
}

/// Whether a critique says there is nothing to fix.
fn is_no_issues(critique: &str) -> bool {
    let normalized = critique
        .trim()
        .trim_matches(|c: char| !c.is_alphanumeric())
        .to_lowercase();
    normalized.is_empty()
        || normalized == "none"
        || normalized.starts_with("no issues")
        || normalized.starts_with("no problems")
}
