//! Scene piece assembler.
//!
//! A scene is built one bounded piece at a time:
//!
//! ```text
//! BuildContext -> GeneratePiece -> CritiqueRevisePiece -> SummarizePiece
//!   -> AppendPiece -> CheckComplete
//! ```
//!
//! Each new piece sees only the summaries of the pieces before it, so the
//! prompt size does not grow with the scene.

use crate::{Brief, CompletenessResult, CritiqueEngine, ModelRole, Summarizer, Workshop};
use fabulist_core::TemplatePurpose;
use fabulist_state::SceneContext;
use tracing::{debug, info, instrument, warn};

/// Context given to the first piece of a scene.
pub const SCENE_OPENING: &str = "Nothing yet. This is the beginning of the scene.";

/// What a scene is assembled from.
#[derive(Debug, Clone, Copy)]
pub struct SceneBrief<'a> {
    /// Position of the scene in its chapter
    pub scene_number: u32,
    /// The scene's outline
    pub scene_outline: &'a str,
    /// The chapter's outline
    pub chapter_outline: &'a str,
    /// Key points carried from the previous scene
    pub carry_over: &'a [String],
    /// Critique context for each piece
    pub critique: Brief<'a>,
}

/// Builds one scene from pieces.
#[derive(Debug, Clone, Copy)]
pub struct SceneAssembler<'a> {
    workshop: &'a Workshop,
}

impl<'a> SceneAssembler<'a> {
    /// Create an assembler over a workshop.
    pub fn new(workshop: &'a Workshop) -> Self {
        Self { workshop }
    }

    /// Assemble a scene until it is judged complete or the piece bound is hit.
    ///
    /// A piece that cannot be generated ends the scene early with whatever
    /// pieces exist.
    #[instrument(skip_all, fields(scene = brief.scene_number))]
    pub async fn assemble(&self, brief: &SceneBrief<'_>) -> SceneContext {
        let config = self.workshop.config();
        let max_pieces = *config.scene().max_pieces() as usize;
        let summarizer = Summarizer::new(self.workshop);
        let critic = CritiqueEngine::new(self.workshop);
        let piece_task = format!("one piece of scene {}", brief.scene_number);
        let piece_brief = Brief {
            task: &piece_task,
            ..brief.critique
        };

        let mut scene = SceneContext::new(brief.scene_number, brief.scene_outline);
        let mut complete = false;

        while scene.pieces().len() < max_pieces {
            let so_far = build_context(&scene);
            let Some(piece) = self.generate_piece(brief, &scene, &so_far).await else {
                warn!(
                    scene = brief.scene_number,
                    pieces = scene.pieces().len(),
                    "Piece generation failed, ending scene early"
                );
                break;
            };

            let piece = critic.improve(piece, &piece_brief).await;
            let summary = summarizer.digest(&piece, "scene piece").await;
            let appended = scene.add_piece(piece, summary);
            debug!(scene = brief.scene_number, piece = appended.piece_number(), "Piece appended");

            if self.check_complete(brief.scene_outline, &scene).await {
                complete = true;
                break;
            }
        }

        if !complete && scene.pieces().len() >= max_pieces {
            info!(
                scene = brief.scene_number,
                max_pieces, "Scene stopped at the piece limit"
            );
        }
        scene
    }

    async fn generate_piece(
        &self,
        brief: &SceneBrief<'_>,
        scene: &SceneContext,
        so_far: &str,
    ) -> Option<String> {
        let scene_config = self.workshop.config().scene();
        let min_words = *scene_config.piece_min_words();
        let min_label = min_words.to_string();
        let style_guide = brief.critique.style_guide;

        if scene.pieces().is_empty() {
            let key_points = if brief.carry_over.is_empty() {
                "None.".to_string()
            } else {
                brief
                    .carry_over
                    .iter()
                    .map(|point| format!("- {}", point))
                    .collect::<Vec<_>>()
                    .join("\n")
            };
            self.workshop
                .write(
                    TemplatePurpose::ScenePieceFirst,
                    ModelRole::Chapter,
                    &[
                        ("scene_outline", brief.scene_outline),
                        ("chapter_outline", brief.chapter_outline),
                        ("key_points", &key_points),
                        ("so_far", so_far),
                        ("style_guide", style_guide),
                        ("min_words", &min_label),
                    ],
                    min_words,
                )
                .await
        } else {
            self.workshop
                .write(
                    TemplatePurpose::ScenePieceNext,
                    ModelRole::Chapter,
                    &[
                        ("scene_outline", brief.scene_outline),
                        ("so_far", so_far),
                        ("style_guide", style_guide),
                        ("min_words", &min_label),
                    ],
                    min_words,
                )
                .await
        }
    }

    async fn check_complete(&self, scene_outline: &str, scene: &SceneContext) -> bool {
        let content = scene.generated_content();
        let verdict = self
            .workshop
            .ask::<CompletenessResult>(
                TemplatePurpose::SceneComplete,
                &[("scene_outline", scene_outline), ("content", &content)],
            )
            .await;
        match verdict {
            Some(verdict) => {
                debug!(
                    is_complete = verdict.is_complete(),
                    reason = %verdict.reason(),
                    "Scene completeness"
                );
                *verdict.is_complete()
            }
            None => false,
        }
    }
}

/// Rolling context for the next piece: prior piece summaries only.
fn build_context(scene: &SceneContext) -> String {
    if scene.pieces().is_empty() {
        return SCENE_OPENING.to_string();
    }
    scene
        .piece_summaries()
        .iter()
        .enumerate()
        .map(|(index, summary)| format!("{}. {}", index + 1, summary))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_uses_summaries_not_content() {
        let mut scene = SceneContext::new(1, "outline");
        assert_eq!(build_context(&scene), SCENE_OPENING);

        scene.add_piece("A very long piece of prose about the key.", "Mara holds the key.");
        scene.add_piece("More prose about the door.", "The door opens.");
        let context = build_context(&scene);
        assert_eq!(context, "1. Mara holds the key.\n2. The door opens.");
        assert!(!context.contains("prose"));
    }
}
