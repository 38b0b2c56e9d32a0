//! Pipeline configuration.
//!
//! Configuration is layered, later sources overriding earlier ones:
//! 1. Bundled defaults (`include_str!` of `fabulist.toml`)
//! 2. `~/.config/fabulist/fabulist.toml`
//! 3. `./fabulist.toml`
//! 4. `FABULIST_*` environment variables (`__` separates nested keys)
//!
//! The resulting [`PipelineConfig`] is a plain value threaded through the
//! pipeline; nothing reads configuration from global state.

use config::{Config, Environment, File, FileFormat};
use derive_getters::Getters;
use fabulist_core::PromptTemplates;
use fabulist_error::{ConfigError, FabulistError, FabulistResult};
use fabulist_gateway::GatewayConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};

const DEFAULT_CONFIG: &str = include_str!("../fabulist.toml");

/// How a chapter's prose is produced.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ChapterStrategy {
    /// Plot, then character development, then dialogue
    #[default]
    MultiStage,
    /// Scene breakdown, then piece-by-piece scene assembly
    SceneDecomposition,
}

/// Role a generator call plays, for per-role model selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum ModelRole {
    /// Elements, outline and expansion
    Outline,
    /// Chapter and scene prose
    Chapter,
    /// Critiques, revisions and cleanup
    Critique,
    /// Structured checks and extractions
    Check,
    /// Summaries and digests
    Summary,
}

/// Generator identifiers per role.
///
/// ```toml
/// [models]
/// outline = "planner-70b"
/// chapter = "writer-70b"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, Getters, derive_setters::Setters)]
#[setters(prefix = "with_")]
pub struct ModelRoles {
    /// Model for outline work
    #[serde(default)]
    outline: Option<String>,
    /// Model for chapter and scene prose
    #[serde(default)]
    chapter: Option<String>,
    /// Model for critique and revision
    #[serde(default)]
    critique: Option<String>,
    /// Model for structured checks
    #[serde(default)]
    check: Option<String>,
    /// Model for summaries
    #[serde(default)]
    summary: Option<String>,
}

impl ModelRoles {
    /// Model configured for a role, if any.
    pub fn model_for(&self, role: ModelRole) -> Option<String> {
        match role {
            ModelRole::Outline => self.outline.clone(),
            ModelRole::Chapter => self.chapter.clone(),
            ModelRole::Critique => self.critique.clone(),
            ModelRole::Check => self.check.clone(),
            ModelRole::Summary => self.summary.clone(),
        }
    }
}

/// Bounds of the critique-revise engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters, derive_setters::Setters)]
#[setters(prefix = "with_")]
pub struct CritiqueConfig {
    /// Iterations per axis, including the first unconditional one
    #[serde(default = "default_max_iterations_per_axis")]
    max_iterations_per_axis: u32,
    /// Score (0-100) at which an axis stops early
    #[serde(default = "default_score_threshold")]
    score_threshold: u32,
    /// Minimum revision length as a fraction of the pre-revision length
    #[serde(default = "default_revision_factor")]
    revision_factor: f64,
    /// Run the cleanup pass after all axes
    #[serde(default = "default_true")]
    cleanup: bool,
    /// Minimum cleanup length as a fraction of the revised length
    #[serde(default = "default_cleanup_factor")]
    cleanup_factor: f64,
}

fn default_max_iterations_per_axis() -> u32 {
    5
}

fn default_score_threshold() -> u32 {
    95
}

fn default_revision_factor() -> f64 {
    0.8
}

fn default_cleanup_factor() -> f64 {
    0.7
}

fn default_true() -> bool {
    true
}

impl Default for CritiqueConfig {
    fn default() -> Self {
        Self {
            max_iterations_per_axis: default_max_iterations_per_axis(),
            score_threshold: default_score_threshold(),
            revision_factor: default_revision_factor(),
            cleanup: true,
            cleanup_factor: default_cleanup_factor(),
        }
    }
}

/// Bounds of the completion verifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters, derive_setters::Setters)]
#[setters(prefix = "with_")]
pub struct VerifierConfig {
    /// Continuation rounds before giving up
    #[serde(default = "default_max_continuations")]
    max_continuations: u32,
    /// Artifacts shorter than this are not verified
    #[serde(default = "default_verifier_min_words")]
    min_words: usize,
    /// Length asked of each continuation
    #[serde(default = "default_verifier_min_words")]
    continuation_min_words: usize,
}

fn default_max_continuations() -> u32 {
    3
}

fn default_verifier_min_words() -> usize {
    100
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            max_continuations: default_max_continuations(),
            min_words: default_verifier_min_words(),
            continuation_min_words: default_verifier_min_words(),
        }
    }
}

/// Bounds of the chapter-level accept/revise loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters, derive_setters::Setters)]
#[setters(prefix = "with_")]
pub struct RevisionBounds {
    /// Run the loop at all
    #[serde(default = "default_true")]
    enabled: bool,
    /// Iterations that always revise, even when rated complete
    #[serde(default = "default_min_iterations")]
    min_iterations: u32,
    /// Hard upper bound on iterations
    #[serde(default = "default_max_iterations")]
    max_iterations: u32,
    /// Minimum regeneration length as a fraction of the current draft
    #[serde(default = "default_revision_factor")]
    revision_factor: f64,
}

fn default_min_iterations() -> u32 {
    1
}

fn default_max_iterations() -> u32 {
    3
}

impl Default for RevisionBounds {
    fn default() -> Self {
        Self {
            enabled: true,
            min_iterations: default_min_iterations(),
            max_iterations: default_max_iterations(),
            revision_factor: default_revision_factor(),
        }
    }
}

/// Bounds of the scene piece assembler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters, derive_setters::Setters)]
#[setters(prefix = "with_")]
pub struct SceneConfig {
    /// Pieces per scene before a forced stop
    #[serde(default = "default_max_pieces")]
    max_pieces: u32,
    /// Length asked of each piece
    #[serde(default = "default_piece_min_words")]
    piece_min_words: usize,
}

fn default_max_pieces() -> u32 {
    7
}

fn default_piece_min_words() -> usize {
    300
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            max_pieces: default_max_pieces(),
            piece_min_words: default_piece_min_words(),
        }
    }
}

/// Minimum lengths for text-contract calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters, derive_setters::Setters)]
#[setters(prefix = "with_")]
pub struct WordFloors {
    /// Story elements
    #[serde(default = "default_elements_words")]
    elements: usize,
    /// Rough outline
    #[serde(default = "default_outline_words")]
    outline: usize,
    /// Each chapter appended during count enforcement
    #[serde(default = "default_chapter_outline_words")]
    chapter_outline: usize,
    /// Each expanded chapter outline
    #[serde(default = "default_expanded_chapter_words")]
    expanded_chapter: usize,
    /// First multi-stage stage
    #[serde(default = "default_stage_words")]
    stage: usize,
    /// Later stages as a fraction of the previous stage
    #[serde(default = "default_stage_factor")]
    stage_factor: f64,
    /// Scene breakdown
    #[serde(default = "default_breakdown_words")]
    breakdown: usize,
    /// Chapter feedback
    #[serde(default = "default_feedback_words")]
    feedback: usize,
    /// Carry-over digests
    #[serde(default = "default_summary_words")]
    summary: usize,
}

fn default_elements_words() -> usize {
    200
}

fn default_outline_words() -> usize {
    300
}

fn default_chapter_outline_words() -> usize {
    80
}

fn default_expanded_chapter_words() -> usize {
    200
}

fn default_stage_words() -> usize {
    1500
}

fn default_stage_factor() -> f64 {
    0.95
}

fn default_breakdown_words() -> usize {
    200
}

fn default_feedback_words() -> usize {
    50
}

fn default_summary_words() -> usize {
    30
}

impl Default for WordFloors {
    fn default() -> Self {
        Self {
            elements: default_elements_words(),
            outline: default_outline_words(),
            chapter_outline: default_chapter_outline_words(),
            expanded_chapter: default_expanded_chapter_words(),
            stage: default_stage_words(),
            stage_factor: default_stage_factor(),
            breakdown: default_breakdown_words(),
            feedback: default_feedback_words(),
            summary: default_summary_words(),
        }
    }
}

/// Everything a pipeline run needs besides the prompt and the generator.
///
/// # Examples
///
/// ```
/// use fabulist_narrative::{ChapterStrategy, PipelineConfig};
///
/// let config = PipelineConfig::default()
///     .with_chapter_count(3)
///     .with_strategy(ChapterStrategy::SceneDecomposition);
/// assert_eq!(*config.chapter_count(), 3);
/// assert_eq!(*config.scene().max_pieces(), 7);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters, derive_setters::Setters)]
#[setters(prefix = "with_")]
pub struct PipelineConfig {
    /// Chapters to write; 0 lets the outline decide
    #[serde(default = "default_chapter_count")]
    chapter_count: u32,
    /// Chapter strategy
    #[serde(default)]
    strategy: ChapterStrategy,
    /// Expand each chapter outline before writing
    #[serde(default)]
    expand_outline: bool,
    /// Style guide applied to every prose call
    #[serde(default)]
    style_guide: Option<String>,
    /// Per-role generator identifiers
    #[serde(default)]
    models: ModelRoles,
    /// Gateway bounds
    #[serde(default)]
    gateway: GatewayConfig,
    /// Critique-revise bounds
    #[serde(default)]
    critique: CritiqueConfig,
    /// Completion verifier bounds
    #[serde(default)]
    verifier: VerifierConfig,
    /// Chapter accept/revise loop bounds
    #[serde(default)]
    chapter_revision: RevisionBounds,
    /// Scene assembler bounds
    #[serde(default)]
    scene: SceneConfig,
    /// Minimum lengths
    #[serde(default)]
    words: WordFloors,
    /// TOML file overriding bundled prompt templates
    #[serde(default)]
    templates_path: Option<PathBuf>,
}

fn default_chapter_count() -> u32 {
    5
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            chapter_count: default_chapter_count(),
            strategy: ChapterStrategy::default(),
            expand_outline: false,
            style_guide: None,
            models: ModelRoles::default(),
            gateway: GatewayConfig::default(),
            critique: CritiqueConfig::default(),
            verifier: VerifierConfig::default(),
            chapter_revision: RevisionBounds::default(),
            scene: SceneConfig::default(),
            words: WordFloors::default(),
            templates_path: None,
        }
    }
}

impl PipelineConfig {
    /// Load configuration with precedence: environment > current dir > home dir > bundled.
    ///
    /// # Errors
    ///
    /// Returns an error if a configuration file is malformed.
    #[instrument]
    pub fn load() -> FabulistResult<Self> {
        debug!("Loading configuration with precedence: env > current dir > home dir > bundled");

        let mut builder =
            Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("fabulist").join("fabulist.toml");
            builder = builder.add_source(File::from(user_config).required(false));
        }

        builder = builder
            .add_source(File::with_name("fabulist").required(false))
            .add_source(
                Environment::with_prefix("FABULIST")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        Self::deserialize_from(builder)
    }

    /// Load bundled defaults overridden by one explicit file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing or malformed.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> FabulistResult<Self> {
        debug!("Loading configuration from file");
        let builder = Config::builder()
            .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
            .add_source(File::from(path.as_ref()));
        Self::deserialize_from(builder)
    }

    /// Load bundled defaults overridden by TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is malformed.
    pub fn from_toml_str(content: &str) -> FabulistResult<Self> {
        let builder = Config::builder()
            .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
            .add_source(File::from_str(content, FileFormat::Toml));
        Self::deserialize_from(builder)
    }

    fn deserialize_from(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> FabulistResult<Self> {
        builder
            .build()
            .map_err(|e| {
                FabulistError::from(ConfigError::new(format!(
                    "Failed to build configuration: {}",
                    e
                )))
            })?
            .try_deserialize()
            .map_err(|e| {
                FabulistError::from(ConfigError::new(format!(
                    "Failed to parse configuration: {}",
                    e
                )))
            })
    }

    /// Prompt templates: bundled, overridden by `templates_path` when set.
    ///
    /// # Errors
    ///
    /// Returns an error if the override file is unreadable or incomplete.
    pub fn templates(&self) -> FabulistResult<PromptTemplates> {
        match &self.templates_path {
            Some(path) => PromptTemplates::with_overrides(path),
            None => PromptTemplates::bundled(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_defaults_match_default_impl() {
        let loaded = PipelineConfig::from_toml_str("").unwrap();
        assert_eq!(loaded, PipelineConfig::default());
    }

    #[test]
    fn test_file_overrides_bundled_values() {
        let loaded = PipelineConfig::from_toml_str(
            r#"
            chapter_count = 12
            strategy = "scene_decomposition"

            [scene]
            max_pieces = 4

            [models]
            chapter = "writer-70b"
            "#,
        )
        .unwrap();

        assert_eq!(*loaded.chapter_count(), 12);
        assert_eq!(*loaded.strategy(), ChapterStrategy::SceneDecomposition);
        assert_eq!(*loaded.scene().max_pieces(), 4);
        assert_eq!(*loaded.scene().piece_min_words(), 300);
        assert_eq!(
            loaded.models().model_for(ModelRole::Chapter).as_deref(),
            Some("writer-70b")
        );
        assert!(loaded.models().model_for(ModelRole::Outline).is_none());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fabulist.toml");
        std::fs::write(&path, "expand_outline = true\n[critique]\nscore_threshold = 80\n").unwrap();

        let loaded = PipelineConfig::from_file(&path).unwrap();
        assert!(*loaded.expand_outline());
        assert_eq!(*loaded.critique().score_threshold(), 80);
        assert_eq!(*loaded.critique().max_iterations_per_axis(), 5);
    }

    #[test]
    fn test_missing_file_is_error() {
        assert!(PipelineConfig::from_file("/nonexistent/fabulist.toml").is_err());
    }

    #[test]
    fn test_unknown_strategy_is_error() {
        assert!(PipelineConfig::from_toml_str("strategy = \"freeform\"").is_err());
    }
}
