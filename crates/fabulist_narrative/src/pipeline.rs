//! The novel pipeline: outline, chapters, story info.

use crate::{ChapterPipeline, OutlineEngine, PipelineConfig, StoryInfoResult, Workshop};
use fabulist_core::{PromptTemplates, TemplatePurpose};
use fabulist_error::FabulistResult;
use fabulist_interface::{FabulistDriver, Interaction, NarrativeRepository};
use fabulist_state::NarrativeContext;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

/// Drives a whole run from prompt to finished narrative.
///
/// Chapters are written strictly in order; with a repository attached the
/// narrative is checkpointed after the outline and after every chapter, so
/// [`NovelPipeline::resume`] can pick up after the last stored chapter.
///
/// # Examples
///
/// ```no_run
/// use fabulist_narrative::{NovelPipeline, PipelineConfig};
/// # use fabulist_interface::FabulistDriver;
/// # use std::sync::Arc;
/// # async fn example(driver: Arc<dyn FabulistDriver>) -> fabulist_error::FabulistResult<()> {
/// let pipeline = NovelPipeline::new(driver, PipelineConfig::load()?)?;
/// let narrative = pipeline
///     .run("A locksmith discovers her keys open more than doors.")
///     .await?;
/// println!("{}", narrative.manuscript());
/// # Ok(())
/// # }
/// ```
pub struct NovelPipeline {
    workshop: Workshop,
    repository: Option<(Arc<dyn NarrativeRepository>, String)>,
}

impl std::fmt::Debug for NovelPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NovelPipeline")
            .field("workshop", &self.workshop)
            .field("run_id", &self.repository.as_ref().map(|(_, id)| id))
            .finish()
    }
}

impl NovelPipeline {
    /// Create a pipeline, loading templates as the configuration directs.
    ///
    /// # Errors
    ///
    /// Returns an error if the template override file is unusable.
    pub fn new(driver: Arc<dyn FabulistDriver>, config: PipelineConfig) -> FabulistResult<Self> {
        Ok(Self {
            workshop: Workshop::new(driver, config)?,
            repository: None,
        })
    }

    /// Create a pipeline around an explicit template set.
    pub fn with_templates(
        driver: Arc<dyn FabulistDriver>,
        config: PipelineConfig,
        templates: PromptTemplates,
    ) -> Self {
        Self {
            workshop: Workshop::with_templates(driver, config, templates),
            repository: None,
        }
    }

    /// Checkpoint the narrative under `run_id` as the run progresses.
    pub fn with_repository(
        mut self,
        repository: Arc<dyn NarrativeRepository>,
        run_id: impl Into<String>,
    ) -> Self {
        self.repository = Some((repository, run_id.into()));
        self
    }

    /// Let a human force extra retries of short text replies.
    pub fn with_interaction(self, interaction: Box<dyn Interaction>) -> Self {
        Self {
            workshop: self.workshop.with_interaction(interaction),
            ..self
        }
    }

    /// The shared workshop.
    pub fn workshop(&self) -> &Workshop {
        &self.workshop
    }

    /// Generate a narrative from a prompt.
    ///
    /// # Errors
    ///
    /// Returns an error only if the narrative state rejects a chapter.
    #[instrument(skip(self))]
    pub async fn run(&self, prompt: &str) -> FabulistResult<NarrativeContext> {
        let narrative = NarrativeContext::new(prompt, self.workshop.config().style_guide().clone());
        self.resume(narrative).await
    }

    /// Resume the narrative stored under the attached run id.
    ///
    /// # Errors
    ///
    /// Returns an error if no repository is attached or the narrative cannot be loaded.
    pub async fn resume_stored(&self) -> FabulistResult<NarrativeContext> {
        let Some((repository, run_id)) = &self.repository else {
            return Err(fabulist_error::ConfigError::new(
                "No narrative repository attached to resume from",
            )
            .into());
        };
        let narrative = repository.load(run_id).await?;
        self.resume(narrative).await
    }

    /// Continue a narrative: outline if missing, then every unwritten chapter, then story info.
    ///
    /// # Errors
    ///
    /// Returns an error only if the narrative state rejects a chapter.
    #[instrument(skip_all, fields(written = narrative.chapters().len()))]
    pub async fn resume(&self, mut narrative: NarrativeContext) -> FabulistResult<NarrativeContext> {
        let outline = OutlineEngine::new(&self.workshop);

        let detected = if narrative.has_outline() {
            info!("Outline present, skipping outline stages");
            outline.count_chapters(narrative.outline()).await
        } else {
            let detected = outline.run(&mut narrative).await;
            self.checkpoint(&narrative).await;
            detected
        };

        let target = match *self.workshop.config().chapter_count() {
            0 => detected,
            configured => configured,
        };
        info!(target, detected, "Writing chapters");

        let chapters = ChapterPipeline::new(&self.workshop);
        for chapter_number in narrative.last_chapter_number() + 1..=target {
            let outcome = chapters.write(&narrative, chapter_number).await;
            if !outcome.is_written() {
                error!(chapter_number, "Chapter stored as a failure placeholder");
            }
            narrative.add_chapter(outcome.into_chapter())?;
            narrative.log("chapter", format!("chapter {} stored", chapter_number));
            self.checkpoint(&narrative).await;
        }

        if narrative.story_info().is_none() {
            self.story_info(&mut narrative).await;
            self.checkpoint(&narrative).await;
        }

        info!(
            chapters = narrative.chapters().len(),
            words = narrative.word_count(),
            "Narrative complete"
        );
        Ok(narrative)
    }

    async fn story_info(&self, narrative: &mut NarrativeContext) {
        let summaries = narrative.previous_summaries();
        let info = self
            .workshop
            .ask::<StoryInfoResult>(
                TemplatePurpose::StoryInfo,
                &[("outline", narrative.outline()), ("summaries", &summaries)],
            )
            .await;
        match info {
            Some(info) => {
                narrative.set_story_info(info.into());
                narrative.log("story_info", "title and summary generated");
            }
            None => warn!("Story info generation failed"),
        }
    }

    /// Save the narrative if a repository is attached; failures are logged, not raised.
    async fn checkpoint(&self, narrative: &NarrativeContext) {
        if let Some((repository, run_id)) = &self.repository
            && let Err(e) = repository.save(run_id, narrative).await
        {
            warn!(run_id = %run_id, error = %e, "Checkpoint failed");
        }
    }
}
