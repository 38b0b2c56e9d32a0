//! Structured reply shapes, one per call site.

use derive_getters::Getters;
use fabulist_gateway::StructuredReply;
use fabulist_state::StoryInfo;
use serde::Deserialize;
use std::collections::BTreeMap;

/// Binary completeness verdict with its reason.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Getters)]
pub struct CompletenessResult {
    /// Whether the artifact is finished
    is_complete: bool,
    /// Why the generator thinks so
    #[serde(default)]
    reason: String,
}

impl StructuredReply for CompletenessResult {
    const REQUIRED_FIELDS: &'static [&'static str] = &["is_complete"];
}

/// Quality score on a 0-100 scale.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ScoreResult {
    score: f64,
}

impl ScoreResult {
    /// Score clamped to 0-100 and rounded down.
    pub fn score(&self) -> u32 {
        self.score.clamp(0.0, 100.0) as u32
    }
}

impl StructuredReply for ScoreResult {
    const REQUIRED_FIELDS: &'static [&'static str] = &["score"];
}

/// Number of chapters in an outline.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Getters)]
pub struct ChapterCountResult {
    /// Chapters counted from the outline's headers
    total_chapters: u32,
}

impl StructuredReply for ChapterCountResult {
    const REQUIRED_FIELDS: &'static [&'static str] = &["total_chapters"];
}

/// One chapter's outline, extracted from the full outline.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Getters)]
pub struct ChapterOutlineResult {
    /// The chapter's planned content
    chapter_outline: String,
}

impl StructuredReply for ChapterOutlineResult {
    const REQUIRED_FIELDS: &'static [&'static str] = &["chapter_outline"];
}

/// Scene outlines of a chapter, in order.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Getters)]
pub struct SceneListResult {
    /// One outline per scene
    scenes: Vec<String>,
}

impl StructuredReply for SceneListResult {
    const REQUIRED_FIELDS: &'static [&'static str] = &["scenes"];
}

/// Facts the next scene must carry forward.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Getters)]
pub struct KeyPointsResult {
    /// Key points in order of importance
    key_points: Vec<String>,
}

impl StructuredReply for KeyPointsResult {
    const REQUIRED_FIELDS: &'static [&'static str] = &["key_points"];
}

/// Themes and character arcs developed by a chapter.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Getters)]
pub struct ChapterNotesResult {
    /// Themes the chapter develops
    theme_elements: Vec<String>,
    /// Character name to arc note
    #[serde(default)]
    character_arc_notes: BTreeMap<String, String>,
}

impl StructuredReply for ChapterNotesResult {
    const REQUIRED_FIELDS: &'static [&'static str] = &["theme_elements"];
}

/// Recurring motifs drawn from the story elements.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Getters)]
pub struct MotifsResult {
    /// Motifs and symbols
    motifs: Vec<String>,
}

impl StructuredReply for MotifsResult {
    const REQUIRED_FIELDS: &'static [&'static str] = &["motifs"];
}

/// Title, summary and tags of the finished story.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Getters)]
pub struct StoryInfoResult {
    /// Story title
    title: String,
    /// One-paragraph summary
    summary: String,
    /// Descriptive tags
    #[serde(default)]
    tags: Vec<String>,
}

impl StructuredReply for StoryInfoResult {
    const REQUIRED_FIELDS: &'static [&'static str] = &["title", "summary"];
}

impl From<StoryInfoResult> for StoryInfo {
    fn from(result: StoryInfoResult) -> Self {
        StoryInfo::new(result.title, result.summary, result.tags)
    }
}
