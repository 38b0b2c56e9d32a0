//! Prompt templates keyed by purpose.
//!
//! Every instruction the engine sends to a generator comes from a template in
//! this registry. The engine only fills `{{placeholder}}` slots; the wording
//! itself is data. A bundled default set ships with the crate and can be
//! overridden purpose by purpose from a TOML file:
//!
//! ```toml
//! [templates]
//! critique-style = "Critique the prose style of {{content}}"
//! ```

use fabulist_error::{FabulistResult, TemplateError, TemplateErrorKind};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use strum::IntoEnumIterator;
use tracing::{debug, instrument};

const BUNDLED_TEMPLATES: &str = include_str!("../prompts.toml");

/// Purpose of a generator-facing prompt.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::AsRefStr,
)]
#[strum(serialize_all = "kebab-case")]
pub enum TemplatePurpose {
    /// Forceful follow-up after a too-short answer
    RetryLength,
    /// Correction after a malformed structured answer
    RetrySchema,
    /// Pull non-plot instructions out of the raw prompt
    ExtractContext,
    /// Story elements (genre, theme, cast, setting, conflict)
    StoryElements,
    /// Recurring motifs drawn from the story elements
    StoryMotifs,
    /// Chapter-delimited rough outline
    RoughOutline,
    /// Additional chapters appended to a short outline
    AppendChapters,
    /// Structured chapter count over outline headers
    ChapterCount,
    /// Structured extraction of one chapter's outline
    ChapterOutline,
    /// Per-chapter outline expansion
    ExpandChapter,
    /// Structured completeness verdict for an artifact
    CompletenessCheck,
    /// Continue a truncated artifact
    ContinueArtifact,
    /// Style critique
    CritiqueStyle,
    /// Style revision
    ReviseStyle,
    /// Style score
    ScoreStyle,
    /// Structure critique
    CritiqueStructure,
    /// Structure revision
    ReviseStructure,
    /// Structure score
    ScoreStructure,
    /// Consistency critique
    CritiqueConsistency,
    /// Consistency revision
    ReviseConsistency,
    /// Consistency score
    ScoreConsistency,
    /// Single-pass critique
    CritiqueSingle,
    /// Single-pass revision
    ReviseSingle,
    /// Non-creative cleanup of meta-commentary
    Cleanup,
    /// Multi-stage chapter: plot
    StagePlot,
    /// Multi-stage chapter: character development
    StageCharacter,
    /// Multi-stage chapter: dialogue
    StageDialogue,
    /// Scene-by-scene breakdown of a chapter outline
    SceneBreakdown,
    /// Structured scene list from a breakdown
    SceneList,
    /// First piece of a scene
    ScenePieceFirst,
    /// Following piece of a scene
    ScenePieceNext,
    /// Structured scene completeness verdict
    SceneComplete,
    /// Structured key points to carry into the next scene
    KeyPoints,
    /// Structured chapter completeness rating
    ChapterRating,
    /// Free-text chapter feedback
    ChapterFeedback,
    /// Chapter regeneration from feedback
    ChapterRevise,
    /// Structured theme elements and character arc notes
    ChapterNotes,
    /// Short carry-over digest
    Summarize,
    /// Structured title, summary and tags
    StoryInfo,
}

#[derive(Debug, Deserialize)]
struct TemplateFile {
    #[serde(default)]
    templates: HashMap<String, String>,
}

/// Registry of prompt templates, one per [`TemplatePurpose`].
///
/// Construction validates that every purpose has a template, so rendering
/// never fails.
///
/// # Examples
///
/// ```
/// use fabulist_core::{PromptTemplates, TemplatePurpose};
///
/// let templates = PromptTemplates::bundled().unwrap();
/// let prompt = templates.render(TemplatePurpose::RetryLength, &[("min_words", "300")]);
/// assert!(prompt.contains("300"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, derive_getters::Getters)]
pub struct PromptTemplates {
    templates: HashMap<TemplatePurpose, String>,
}

impl PromptTemplates {
    /// Load the bundled default templates.
    ///
    /// # Errors
    ///
    /// Returns an error if the bundled file is incomplete.
    pub fn bundled() -> FabulistResult<Self> {
        Self::layered(&[BUNDLED_TEMPLATES])
    }

    /// Load templates from a TOML string containing every purpose.
    ///
    /// # Errors
    ///
    /// Returns an error on malformed TOML, unknown keys, or missing purposes.
    pub fn from_toml_str(content: &str) -> FabulistResult<Self> {
        Self::layered(&[content])
    }

    /// Load the bundled defaults overridden by a TOML file on disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn with_overrides(path: impl AsRef<Path>) -> FabulistResult<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            TemplateError::new(TemplateErrorKind::Load(format!(
                "{}: {}",
                path.as_ref().display(),
                e
            )))
        })?;
        Self::layered(&[BUNDLED_TEMPLATES, &content])
    }

    /// Layer template sources; later sources override earlier ones.
    ///
    /// # Errors
    ///
    /// Returns an error on malformed TOML, unknown keys, or missing purposes.
    pub fn layered(sources: &[&str]) -> FabulistResult<Self> {
        let mut templates = HashMap::new();
        for source in sources {
            let file: TemplateFile = toml::from_str(source)
                .map_err(|e| TemplateError::new(TemplateErrorKind::Load(e.to_string())))?;
            for (key, template) in file.templates {
                let purpose = TemplatePurpose::from_str(&key)
                    .map_err(|_| TemplateError::new(TemplateErrorKind::UnknownPurpose(key)))?;
                templates.insert(purpose, template);
            }
        }

        if let Some(missing) = TemplatePurpose::iter().find(|p| !templates.contains_key(p)) {
            return Err(
                TemplateError::new(TemplateErrorKind::MissingPurpose(missing.to_string())).into(),
            );
        }

        debug!(count = templates.len(), "Loaded prompt templates");
        Ok(Self { templates })
    }

    /// Raw template text for a purpose.
    pub fn get(&self, purpose: TemplatePurpose) -> &str {
        self.templates
            .get(&purpose)
            .map(String::as_str)
            .unwrap_or_default()
    }

    /// Fill a template's `{{name}}` placeholders.
    ///
    /// Placeholders without a matching variable are left untouched.
    pub fn render(&self, purpose: TemplatePurpose, vars: &[(&str, &str)]) -> String {
        vars.iter()
            .fold(self.get(purpose).to_string(), |text, (name, value)| {
                text.replace(&format!("{{{{{}}}}}", name), value)
            })
    }
}
