//! Chapter pipeline.
//!
//! Materializes one chapter with one of two strategies, then runs the
//! chapter-level accept/revise loop and finalizes summary and notes.

use crate::{
    Brief, ChapterNotesResult, ChapterStrategy, CompletenessResult, CompletionVerifier,
    CritiqueEngine, ModelRole, OutlineEngine, SceneAssembler, SceneBrief, SceneListResult,
    Summarizer, Workshop,
};
use fabulist_core::{TemplatePurpose, scaled_words, word_count};
use fabulist_state::{ChapterContext, NarrativeContext, SceneContext};
use tracing::{debug, error, info, instrument, warn};

/// Separator placed between scenes in a chapter's text.
pub const SCENE_SEPARATOR: &str = "\n\n";

/// Result of running the pipeline for one chapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChapterOutcome {
    /// The chapter was written
    Written(ChapterContext),
    /// A required upstream artifact was missing; the run continues without the chapter
    Failed {
        /// Chapter that could not be written
        chapter_number: u32,
        /// What was missing
        reason: String,
    },
}

impl ChapterOutcome {
    /// Whether the chapter was written.
    pub fn is_written(&self) -> bool {
        matches!(self, ChapterOutcome::Written(_))
    }

    /// The chapter to store: the written chapter, or an in-band failure placeholder.
    pub fn into_chapter(self) -> ChapterContext {
        match self {
            ChapterOutcome::Written(chapter) => chapter,
            ChapterOutcome::Failed {
                chapter_number,
                reason,
            } => ChapterContext::failed(chapter_number, "", reason),
        }
    }
}

/// Writes chapters.
#[derive(Debug, Clone, Copy)]
pub struct ChapterPipeline<'a> {
    workshop: &'a Workshop,
}

impl<'a> ChapterPipeline<'a> {
    /// Create a pipeline over a workshop.
    pub fn new(workshop: &'a Workshop) -> Self {
        Self { workshop }
    }

    /// Write chapter `chapter_number` of `narrative`.
    ///
    /// Never errors: a missing outline or an empty draft becomes
    /// [`ChapterOutcome::Failed`].
    #[instrument(skip(self, narrative))]
    pub async fn write(&self, narrative: &NarrativeContext, chapter_number: u32) -> ChapterOutcome {
        let Some(chapter_outline) = OutlineEngine::new(self.workshop)
            .chapter_outline(narrative, chapter_number)
            .await
        else {
            error!(chapter_number, "Chapter outline missing, skipping chapter");
            return ChapterOutcome::Failed {
                chapter_number,
                reason: format!("no outline for chapter {}", chapter_number),
            };
        };

        let previous = match narrative.previous_summaries() {
            summaries if summaries.is_empty() => "None yet.".to_string(),
            summaries => summaries,
        };
        let task = format!("chapter {} of the novel", chapter_number);
        let brief = Brief {
            task: &task,
            context: &previous,
            prompt: narrative.initial_prompt(),
            style_guide: narrative.style_guide(),
        };
        let draft = ChapterDraft {
            narrative,
            chapter_number,
            chapter_outline: &chapter_outline,
            previous: &previous,
            brief,
        };

        let strategy = *self.workshop.config().strategy();
        info!(chapter_number, strategy = %strategy, "Writing chapter");
        let (content, scenes) = match strategy {
            ChapterStrategy::MultiStage => (self.multi_stage(&draft).await, Vec::new()),
            ChapterStrategy::SceneDecomposition => self.scene_decomposition(&draft).await,
        };

        let Some(content) = content.filter(|text| !text.trim().is_empty()) else {
            error!(chapter_number, "No chapter text could be generated");
            return ChapterOutcome::Failed {
                chapter_number,
                reason: format!("no text generated for chapter {}", chapter_number),
            };
        };

        let content = if *self.workshop.config().chapter_revision().enabled() {
            self.accept_loop(&chapter_outline, content).await
        } else {
            content
        };

        let mut chapter = ChapterContext::new(chapter_number, chapter_outline.as_str());
        for scene in scenes {
            if let Err(e) = chapter.add_scene(scene) {
                warn!(chapter_number, error = %e, "Dropping out-of-order scene");
            }
        }
        self.finalize(&mut chapter, content, &brief).await;
        info!(chapter_number, words = chapter.word_count(), "Chapter written");
        ChapterOutcome::Written(chapter)
    }

    /// Plot, then character development, then dialogue.
    ///
    /// Each stage is critique-revised before the next consumes it. A failed
    /// later stage keeps the previous stage's text.
    async fn multi_stage(&self, draft: &ChapterDraft<'_>) -> Option<String> {
        let words = self.workshop.config().words();
        let critic = CritiqueEngine::new(self.workshop);
        let chapter = draft.chapter_number.to_string();
        let instructions = match draft.narrative.writing_instructions().as_str() {
            "" => "None.",
            other => other,
        };

        let plot_floor = *words.stage();
        let plot = self
            .workshop
            .write(
                TemplatePurpose::StagePlot,
                ModelRole::Chapter,
                &[
                    ("chapter", &chapter),
                    ("chapter_outline", draft.chapter_outline),
                    ("previous", draft.previous),
                    ("elements", draft.narrative.story_elements()),
                    ("style_guide", draft.narrative.style_guide()),
                    ("instructions", instructions),
                    ("min_words", &plot_floor.to_string()),
                ],
                plot_floor,
            )
            .await?;
        debug!(chapter = draft.chapter_number, words = word_count(&plot), "Plot stage drafted");
        let mut current = critic.improve(plot, &draft.brief).await;

        for stage in [TemplatePurpose::StageCharacter, TemplatePurpose::StageDialogue] {
            let floor = scaled_words(word_count(&current), *words.stage_factor());
            let staged = self
                .workshop
                .write(
                    stage,
                    ModelRole::Chapter,
                    &[
                        ("chapter", &chapter),
                        ("chapter_outline", draft.chapter_outline),
                        ("draft", &current),
                        ("min_words", &floor.to_string()),
                    ],
                    floor,
                )
                .await;
            match staged {
                Some(text) => {
                    debug!(chapter = draft.chapter_number, stage = %stage, words = word_count(&text), "Stage drafted");
                    current = critic.improve(text, &draft.brief).await;
                }
                None => warn!(chapter = draft.chapter_number, stage = %stage, "Stage failed, keeping previous stage"),
            }
        }

        Some(current)
    }

    /// Scene breakdown, scene list, then one assembled scene per entry.
    async fn scene_decomposition(&self, draft: &ChapterDraft<'_>) -> (Option<String>, Vec<SceneContext>) {
        let words = self.workshop.config().words();
        let critic = CritiqueEngine::new(self.workshop);
        let chapter = draft.chapter_number.to_string();

        let breakdown = self
            .workshop
            .write(
                TemplatePurpose::SceneBreakdown,
                ModelRole::Chapter,
                &[
                    ("chapter", &chapter),
                    ("chapter_outline", draft.chapter_outline),
                    ("previous", draft.previous),
                ],
                *words.breakdown(),
            )
            .await;

        let scene_outlines = match breakdown {
            Some(breakdown) => {
                let breakdown_task = format!("the scene breakdown of chapter {}", draft.chapter_number);
                let breakdown_brief = Brief {
                    task: &breakdown_task,
                    ..draft.brief
                };
                let breakdown = critic.improve(breakdown, &breakdown_brief).await;
                self.workshop
                    .ask::<SceneListResult>(TemplatePurpose::SceneList, &[("breakdown", &breakdown)])
                    .await
                    .map(|result| {
                        result
                            .scenes()
                            .iter()
                            .map(|scene| scene.trim().to_string())
                            .filter(|scene| !scene.is_empty())
                            .collect::<Vec<_>>()
                    })
                    .unwrap_or_default()
            }
            None => {
                warn!(chapter = draft.chapter_number, "Scene breakdown failed");
                Vec::new()
            }
        };
        let scene_outlines = if scene_outlines.is_empty() {
            warn!(chapter = draft.chapter_number, "No scene list, writing the chapter as one scene");
            vec![draft.chapter_outline.to_string()]
        } else {
            scene_outlines
        };

        let assembler = SceneAssembler::new(self.workshop);
        let verifier = CompletionVerifier::new(self.workshop);
        let summarizer = Summarizer::new(self.workshop);
        let mut scenes: Vec<SceneContext> = Vec::new();
        let mut carry_over: Vec<String> = Vec::new();

        for (index, scene_outline) in scene_outlines.iter().enumerate() {
            let scene_number = index as u32 + 1;
            let mut scene = assembler
                .assemble(&SceneBrief {
                    scene_number,
                    scene_outline,
                    chapter_outline: draft.chapter_outline,
                    carry_over: &carry_over,
                    critique: draft.brief,
                })
                .await;
            if scene.pieces().is_empty() {
                warn!(chapter = draft.chapter_number, scene_number, "Scene produced no pieces");
                continue;
            }

            let purpose = format!("scene {} of chapter {}", scene_number, draft.chapter_number);
            verifier.verify_pieces(&purpose, &mut scene).await;

            let content = scene.generated_content();
            let summary = summarizer.digest(&content, "scene").await;
            scene.set_final_summary(summary);
            carry_over = summarizer.key_points(scene_outline, &content).await;
            scene.add_key_points(carry_over.iter().cloned());
            scenes.push(scene);
        }

        let text = scenes
            .iter()
            .map(SceneContext::generated_content)
            .collect::<Vec<_>>()
            .join(SCENE_SEPARATOR);
        ((!text.trim().is_empty()).then_some(text), scenes)
    }

    /// Rate, and while the draft is not accepted, revise from feedback.
    ///
    /// Stops once more than `min_iterations` have run and the draft is rated
    /// complete, or once `max_iterations` is exceeded. A short or failed
    /// regeneration keeps the current draft.
    #[instrument(skip_all)]
    async fn accept_loop(&self, chapter_outline: &str, content: String) -> String {
        let bounds = self.workshop.config().chapter_revision();
        let min_iterations = *bounds.min_iterations();
        let max_iterations = *bounds.max_iterations();
        let mut current = content;
        let mut iterations = 0;

        loop {
            iterations += 1;
            if iterations > max_iterations {
                info!(iterations, "Revision limit reached");
                break;
            }

            let complete = self
                .workshop
                .ask::<CompletenessResult>(
                    TemplatePurpose::ChapterRating,
                    &[("chapter_outline", chapter_outline), ("content", &current)],
                )
                .await
                .is_some_and(|verdict| *verdict.is_complete());
            info!(iterations, complete, "Chapter rated");
            if iterations > min_iterations && complete {
                break;
            }

            let Some(feedback) = self
                .workshop
                .write(
                    TemplatePurpose::ChapterFeedback,
                    ModelRole::Critique,
                    &[("chapter_outline", chapter_outline), ("content", &current)],
                    *self.workshop.config().words().feedback(),
                )
                .await
            else {
                warn!(iterations, "No chapter feedback, accepting current draft");
                break;
            };

            let floor = scaled_words(word_count(&current), *bounds.revision_factor());
            let revised = self
                .workshop
                .write(
                    TemplatePurpose::ChapterRevise,
                    ModelRole::Chapter,
                    &[
                        ("content", &current),
                        ("feedback", &feedback),
                        ("min_words", &floor.to_string()),
                    ],
                    floor,
                )
                .await;
            match revised {
                Some(text) if word_count(&text) >= floor => current = text,
                _ => warn!(iterations, floor, "Chapter revision unusable, keeping current draft"),
            }
        }

        current
    }

    /// Store content, summary, themes and arc notes.
    async fn finalize(&self, chapter: &mut ChapterContext, content: String, brief: &Brief<'_>) {
        let summary_brief = Brief {
            task: "the summary of a chapter",
            ..*brief
        };
        let summary = Summarizer::new(self.workshop)
            .chapter_summary(&content, &summary_brief)
            .await;

        if let Some(notes) = self
            .workshop
            .ask::<ChapterNotesResult>(TemplatePurpose::ChapterNotes, &[("content", &content)])
            .await
        {
            chapter.set_theme_elements(notes.theme_elements().clone());
            chapter.add_character_arc_notes(notes.character_arc_notes().clone());
        }

        chapter.set_generated_content(content);
        chapter.set_summary(summary);
    }
}

/// Inputs shared by the stages of one chapter.
struct ChapterDraft<'a> {
    narrative: &'a NarrativeContext,
    chapter_number: u32,
    chapter_outline: &'a str,
    previous: &'a str,
    brief: Brief<'a>,
}
