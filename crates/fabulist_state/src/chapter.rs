//! Chapters of a narrative.

use crate::{Record, SceneContext};
use fabulist_core::word_count;
use fabulist_error::{FabulistResult, StateError, StateErrorKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One chapter of the narrative.
///
/// A chapter whose outline could not be resolved is still stored, with
/// [`ChapterContext::failure`] set and no content, so later chapters keep
/// their numbering and the manuscript shows where the gap is.
///
/// # Examples
///
/// ```
/// use fabulist_state::{ChapterContext, SceneContext};
///
/// let mut chapter = ChapterContext::new(1, "Mara finds the key.");
/// chapter.add_scene(SceneContext::new(1, "The pawnshop")).unwrap();
/// assert!(chapter.add_scene(SceneContext::new(1, "Duplicate")).is_err());
/// assert!(chapter.get_scene(1).is_some());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_getters::Getters)]
pub struct ChapterContext {
    /// Position in the narrative, starting at 1
    chapter_number: u32,
    /// Outline the chapter was written from
    initial_outline: String,
    /// Finalized prose
    #[serde(default)]
    generated_content: Option<String>,
    /// Scenes in order (scene-decomposition strategy only)
    #[serde(default)]
    scenes: Vec<SceneContext>,
    /// Carry-over digest of the chapter
    #[serde(default)]
    summary: Option<String>,
    /// Themes the chapter develops
    #[serde(default)]
    theme_elements: Vec<String>,
    /// Character name to arc note
    #[serde(default)]
    character_arc_notes: BTreeMap<String, String>,
    /// In-band placeholder for a chapter that could not be written
    #[serde(default)]
    failure: Option<String>,
}

impl ChapterContext {
    /// Create an empty chapter.
    pub fn new(chapter_number: u32, initial_outline: impl Into<String>) -> Self {
        Self {
            chapter_number,
            initial_outline: initial_outline.into(),
            generated_content: None,
            scenes: Vec::new(),
            summary: None,
            theme_elements: Vec::new(),
            character_arc_notes: BTreeMap::new(),
            failure: None,
        }
    }

    /// Create a chapter that records a structural failure.
    pub fn failed(
        chapter_number: u32,
        initial_outline: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        let mut chapter = Self::new(chapter_number, initial_outline);
        chapter.failure = Some(reason.into());
        chapter
    }

    /// Whether the chapter is an in-band error placeholder.
    pub fn is_failed(&self) -> bool {
        self.failure.is_some()
    }

    /// Append a scene; scene numbers must start at 1 and strictly increase.
    ///
    /// # Errors
    ///
    /// Returns an error if the scene number does not follow the last one.
    pub fn add_scene(&mut self, scene: SceneContext) -> FabulistResult<()> {
        let last = self.scenes.last().map_or(0, |s| *s.scene_number());
        let attempted = *scene.scene_number();
        if attempted <= last {
            return Err(StateError::new(StateErrorKind::SceneOrder { last, attempted }).into());
        }
        self.scenes.push(scene);
        Ok(())
    }

    /// Look up a scene by number.
    pub fn get_scene(&self, scene_number: u32) -> Option<&SceneContext> {
        self.scenes.iter().find(|s| *s.scene_number() == scene_number)
    }

    /// Store the finalized prose.
    pub fn set_generated_content(&mut self, content: impl Into<String>) {
        self.generated_content = Some(content.into());
    }

    /// Store the chapter digest.
    pub fn set_summary(&mut self, summary: impl Into<String>) {
        self.summary = Some(summary.into());
    }

    /// Replace the theme elements.
    pub fn set_theme_elements(&mut self, themes: Vec<String>) {
        self.theme_elements = themes;
    }

    /// Merge character arc notes, later notes replacing earlier ones.
    pub fn add_character_arc_notes<I>(&mut self, notes: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        self.character_arc_notes.extend(notes);
    }

    /// Words of finalized prose.
    pub fn word_count(&self) -> usize {
        self.generated_content.as_deref().map_or(0, word_count)
    }
}

impl Record for ChapterContext {
    fn validate(&self) -> FabulistResult<()> {
        if self.chapter_number == 0 {
            return Err(StateError::new(StateErrorKind::ChapterOrder {
                last: 0,
                attempted: 0,
            })
            .into());
        }
        let mut last = 0;
        for scene in &self.scenes {
            let attempted = *scene.scene_number();
            if attempted <= last {
                return Err(StateError::new(StateErrorKind::SceneOrder { last, attempted }).into());
            }
            scene.validate()?;
            last = attempted;
        }
        Ok(())
    }
}
