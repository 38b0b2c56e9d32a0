//! Root aggregate of a narrative in progress.

use crate::{ChapterContext, Record};
use chrono::{DateTime, Utc};
use fabulist_error::{FabulistResult, StateError, StateErrorKind};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// One entry of the narrative's generation log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_getters::Getters)]
pub struct GenerationLogEntry {
    /// When the entry was recorded
    at: DateTime<Utc>,
    /// Pipeline stage that recorded it
    stage: String,
    /// What happened
    message: String,
}

/// Title, blurb and tags of the finished story.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, derive_getters::Getters)]
pub struct StoryInfo {
    /// Story title
    #[serde(default)]
    title: String,
    /// One-paragraph summary
    #[serde(default)]
    summary: String,
    /// Descriptive tags
    #[serde(default)]
    tags: Vec<String>,
}

impl StoryInfo {
    /// Create story info.
    pub fn new(title: impl Into<String>, summary: impl Into<String>, tags: Vec<String>) -> Self {
        Self {
            title: title.into(),
            summary: summary.into(),
            tags,
        }
    }
}

/// Everything generated so far, plus the immutable inputs of the run.
///
/// # Examples
///
/// ```
/// use fabulist_state::{ChapterContext, NarrativeContext};
///
/// let mut narrative = NarrativeContext::new("A locksmith's keys open more than doors.", None);
/// narrative.add_chapter(ChapterContext::new(1, "Mara finds the key.")).unwrap();
/// narrative.add_chapter(ChapterContext::new(2, "The door opens.")).unwrap();
///
/// // Numbers must strictly increase.
/// assert!(narrative.add_chapter(ChapterContext::new(2, "Again")).is_err());
/// assert_eq!(narrative.last_chapter_number(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_getters::Getters)]
pub struct NarrativeContext {
    /// The prompt the run started from
    initial_prompt: String,
    /// Style guide applied to every prose call
    #[serde(default)]
    style_guide: String,
    /// Non-plot instructions extracted from the prompt
    #[serde(default)]
    writing_instructions: String,
    /// Genre, theme, cast, setting and conflict
    #[serde(default)]
    story_elements: String,
    /// Chapter-delimited outline
    #[serde(default)]
    base_outline: String,
    /// Per-chapter expanded outline, when expansion ran
    #[serde(default)]
    expanded_outline: String,
    /// Recurring motifs
    #[serde(default)]
    motifs: Vec<String>,
    /// Stage-by-stage record of the run
    #[serde(default)]
    generation_log: Vec<GenerationLogEntry>,
    /// Title, summary and tags, once generated
    #[serde(default)]
    story_info: Option<StoryInfo>,
    /// Chapters in order
    #[serde(default)]
    chapters: Vec<ChapterContext>,
}

impl NarrativeContext {
    /// Start a new narrative from a prompt and optional style guide.
    pub fn new(initial_prompt: impl Into<String>, style_guide: Option<String>) -> Self {
        Self {
            initial_prompt: initial_prompt.into(),
            style_guide: style_guide.unwrap_or_default(),
            writing_instructions: String::new(),
            story_elements: String::new(),
            base_outline: String::new(),
            expanded_outline: String::new(),
            motifs: Vec::new(),
            generation_log: Vec::new(),
            story_info: None,
            chapters: Vec::new(),
        }
    }

    /// Store the non-plot instructions.
    pub fn set_writing_instructions(&mut self, instructions: impl Into<String>) {
        self.writing_instructions = instructions.into();
    }

    /// Store the story elements.
    pub fn set_story_elements(&mut self, elements: impl Into<String>) {
        self.story_elements = elements.into();
    }

    /// Store the base outline.
    pub fn set_base_outline(&mut self, outline: impl Into<String>) {
        self.base_outline = outline.into();
    }

    /// Store the expanded outline.
    pub fn set_expanded_outline(&mut self, outline: impl Into<String>) {
        self.expanded_outline = outline.into();
    }

    /// Replace the motifs.
    pub fn set_motifs(&mut self, motifs: Vec<String>) {
        self.motifs = motifs;
    }

    /// Store the story info.
    pub fn set_story_info(&mut self, info: StoryInfo) {
        self.story_info = Some(info);
    }

    /// The most detailed outline available: expanded if present, else base.
    pub fn outline(&self) -> &str {
        if self.expanded_outline.trim().is_empty() {
            &self.base_outline
        } else {
            &self.expanded_outline
        }
    }

    /// Whether the outline stage has produced anything yet.
    pub fn has_outline(&self) -> bool {
        !self.base_outline.trim().is_empty()
    }

    /// Append an entry to the generation log.
    pub fn log(&mut self, stage: impl Into<String>, message: impl Into<String>) {
        let entry = GenerationLogEntry {
            at: Utc::now(),
            stage: stage.into(),
            message: message.into(),
        };
        debug!(stage = %entry.stage, message = %entry.message, "Generation log");
        self.generation_log.push(entry);
    }

    /// Append a chapter; chapter numbers must be at least 1 and strictly increase.
    ///
    /// # Errors
    ///
    /// Returns an error if the chapter number does not follow the last one.
    pub fn add_chapter(&mut self, chapter: ChapterContext) -> FabulistResult<()> {
        let last = self.last_chapter_number();
        let attempted = *chapter.chapter_number();
        if attempted <= last {
            return Err(StateError::new(StateErrorKind::ChapterOrder { last, attempted }).into());
        }
        self.chapters.push(chapter);
        Ok(())
    }

    /// Look up a chapter by number.
    pub fn get_chapter(&self, chapter_number: u32) -> Option<&ChapterContext> {
        self.chapters
            .iter()
            .find(|c| *c.chapter_number() == chapter_number)
    }

    /// Number of the last stored chapter, or 0 when there are none.
    pub fn last_chapter_number(&self) -> u32 {
        self.chapters.last().map_or(0, |c| *c.chapter_number())
    }

    /// Summaries of stored chapters, in order, formatted for prompt context.
    pub fn previous_summaries(&self) -> String {
        self.chapters
            .iter()
            .filter_map(|c| {
                c.summary()
                    .as_deref()
                    .map(|s| format!("Chapter {}: {}", c.chapter_number(), s))
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Words of finalized prose across all chapters.
    pub fn word_count(&self) -> usize {
        self.chapters.iter().map(ChapterContext::word_count).sum()
    }

    /// Render the finished story as markdown.
    ///
    /// Failed chapters appear as a placeholder naming the failure.
    pub fn manuscript(&self) -> String {
        let mut out = String::new();
        if let Some(info) = &self.story_info
            && !info.title.trim().is_empty()
        {
            out.push_str(&format!("# {}\n\n", info.title.trim()));
            if !info.summary.trim().is_empty() {
                out.push_str(&format!("_{}_\n\n", info.summary.trim()));
            }
        }
        for chapter in &self.chapters {
            out.push_str(&format!("## Chapter {}\n\n", chapter.chapter_number()));
            match (chapter.generated_content(), chapter.failure()) {
                (Some(content), _) => out.push_str(content.trim()),
                (None, Some(reason)) => {
                    out.push_str(&format!("[Chapter unavailable: {}]", reason))
                }
                (None, None) => out.push_str("[Chapter not yet written]"),
            }
            out.push_str("\n\n");
        }
        out.trim_end().to_string()
    }
}

impl Record for NarrativeContext {
    fn validate(&self) -> FabulistResult<()> {
        let mut last = 0;
        for chapter in &self.chapters {
            let attempted = *chapter.chapter_number();
            if attempted <= last {
                return Err(
                    StateError::new(StateErrorKind::ChapterOrder { last, attempted }).into(),
                );
            }
            chapter.validate()?;
            last = attempted;
        }
        Ok(())
    }
}
