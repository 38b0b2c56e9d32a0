//! Test utilities for the narrative engines.
//!
//! [`StoryDriver`] answers every prompt purpose with a plausible reply and
//! records which purposes were asked, so tests can count calls per stage.

#![allow(dead_code)]

use async_trait::async_trait;
use fabulist_core::{GenerateRequest, GenerateResponse, Output, Role};
use fabulist_error::{FabulistResult, GeneratorError, GeneratorErrorKind};
use fabulist_interface::FabulistDriver;
use fabulist_narrative::{PipelineConfig, Workshop};
use std::sync::{Arc, Mutex};

/// Small word floors so scripted replies pass the length contract.
pub const TEST_CONFIG: &str = r#"
chapter_count = 5

[gateway]
timeout_secs = 5

[verifier]
min_words = 100
continuation_min_words = 10

[scene]
piece_min_words = 20

[words]
elements = 20
outline = 20
chapter_outline = 5
expanded_chapter = 10
stage = 40
breakdown = 10
feedback = 3
summary = 5
"#;

/// Reply for one call: `Some` overrides the default, `None` falls through.
type Override = Box<dyn Fn(&str, usize, &GenerateRequest) -> Option<FabulistResult<String>> + Send + Sync>;

/// Driver that routes on the request's purpose label.
pub struct StoryDriver {
    chapters: u32,
    overrides: Override,
    requests: Mutex<Vec<GenerateRequest>>,
}

impl StoryDriver {
    /// Driver whose rough outline has five chapters.
    pub fn new() -> Arc<Self> {
        Self::with_chapters(5)
    }

    /// Driver whose rough outline has `chapters` chapters.
    pub fn with_chapters(chapters: u32) -> Arc<Self> {
        Arc::new(Self {
            chapters,
            overrides: Box::new(|_, _, _| None),
            requests: Mutex::new(Vec::new()),
        })
    }

    /// Driver with per-purpose overrides; the index counts earlier calls for that purpose.
    pub fn scripted(
        chapters: u32,
        overrides: impl Fn(&str, usize, &GenerateRequest) -> Option<FabulistResult<String>>
        + Send
        + Sync
        + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            chapters,
            overrides: Box::new(overrides),
            requests: Mutex::new(Vec::new()),
        })
    }

    /// Number of calls made for a purpose, retries included.
    pub fn calls(&self, purpose: &str) -> usize {
        self.requests_for(purpose).len()
    }

    /// Total number of calls.
    pub fn total_calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Every request made for a purpose, in order.
    pub fn requests_for(&self, purpose: &str) -> Vec<GenerateRequest> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|req| req.purpose.as_deref() == Some(purpose))
            .cloned()
            .collect()
    }

    fn default_reply(&self, purpose: &str, prompt: &str) -> String {
        match purpose {
            "extract-context" => "None".to_string(),
            "story-elements" => prose(40),
            "story-motifs" => r#"{"motifs": ["keys", "winter"]}"#.to_string(),
            "rough-outline" => outline(1, self.chapters),
            "append-chapters" => {
                let (first, last) = requested_range(prompt);
                outline(first, last)
            }
            "chapter-count" => {
                let headers = prompt.lines().filter(|l| l.trim_start().starts_with('#')).count();
                format!(r#"{{"total_chapters": {}}}"#, headers)
            }
            "chapter-outline" => {
                r#"{"chapter_outline": "Mara follows the key to a door that should not exist."}"#
                    .to_string()
            }
            "expand-chapter" => prose(30),
            "completeness-check" | "scene-complete" | "chapter-rating" => {
                r#"{"is_complete": true, "reason": "done"}"#.to_string()
            }
            "continue-artifact" => prose(20),
            p if p.starts_with("critique-") => "No issues.".to_string(),
            p if p.starts_with("score-") => r#"{"score": 100}"#.to_string(),
            p if p.starts_with("revise-") || p == "cleanup" => tagged(prompt, "TEXT"),
            "stage-plot" | "stage-character" | "stage-dialogue" | "chapter-revise" => prose(60),
            "scene-breakdown" => "## Scene 1\nMara in the shop.\n\n## Scene 2\nMara at the door.".to_string(),
            "scene-list" => r#"{"scenes": ["Mara in the shop", "Mara at the door"]}"#.to_string(),
            "scene-piece-first" | "scene-piece-next" => prose(40),
            "key-points" => r#"{"key_points": ["Mara holds the key"]}"#.to_string(),
            "chapter-feedback" => "Tighten the middle section.".to_string(),
            "chapter-notes" => {
                r#"{"theme_elements": ["trust"], "character_arc_notes": {"Mara": "learns to let go"}}"#
                    .to_string()
            }
            "summarize" => "Mara finds a key that opens a winter door.".to_string(),
            "story-info" => {
                r#"{"title": "The Winter Key", "summary": "A locksmith opens the wrong door.", "tags": ["fantasy"]}"#
                    .to_string()
            }
            other => format!("Unscripted purpose {}", other),
        }
    }
}

#[async_trait]
impl FabulistDriver for StoryDriver {
    async fn generate(&self, req: &GenerateRequest) -> FabulistResult<GenerateResponse> {
        let purpose = req.purpose.clone().unwrap_or_default();
        let index = {
            let mut requests = self.requests.lock().unwrap();
            let index = requests
                .iter()
                .filter(|r| r.purpose.as_deref() == Some(purpose.as_str()))
                .count();
            requests.push(req.clone());
            index
        };

        let text = match (self.overrides)(&purpose, index, req) {
            Some(reply) => reply?,
            None => self.default_reply(&purpose, &last_user_turn(req)),
        };
        Ok(GenerateResponse {
            outputs: vec![Output::Text(text)],
        })
    }

    fn provider_name(&self) -> &'static str {
        "story"
    }

    fn model_name(&self) -> &str {
        "story-v1"
    }
}

/// A workshop over the test configuration.
pub fn workshop(driver: Arc<StoryDriver>) -> Workshop {
    workshop_with(driver, test_config())
}

/// A workshop over an explicit configuration.
pub fn workshop_with(driver: Arc<StoryDriver>, config: PipelineConfig) -> Workshop {
    Workshop::new(driver, config).expect("Bundled templates load")
}

/// The test configuration.
pub fn test_config() -> PipelineConfig {
    PipelineConfig::from_toml_str(TEST_CONFIG).expect("Valid test configuration")
}

/// `words` words of prose.
pub fn prose(words: usize) -> String {
    const WORDS: [&str; 8] = ["the", "locksmith", "turned", "a", "brass", "key", "in", "silence"];
    WORDS.iter().cycle().take(words).copied().collect::<Vec<_>>().join(" ")
}

/// An outline with chapters `first..=last`.
pub fn outline(first: u32, last: u32) -> String {
    (first..=last)
        .map(|n| format!("# Chapter {}: Door {}\nMara opens door number {} and finds winter.", n, n, n))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// A transport failure.
pub fn transport_error() -> FabulistResult<String> {
    Err(GeneratorError::new(GeneratorErrorKind::Transport("connection reset".to_string())).into())
}

/// Text of the last user turn of a request.
pub fn last_user_turn(req: &GenerateRequest) -> String {
    req.messages
        .iter()
        .rev()
        .find(|m| m.role == Role::User)
        .map(|m| m.content.clone())
        .unwrap_or_default()
}

/// Content between `<TAG>` and `</TAG>`.
pub fn tagged(text: &str, tag: &str) -> String {
    let open = format!("<{}>", tag);
    let close = format!("</{}>", tag);
    text.split_once(&open)
        .and_then(|(_, rest)| rest.split_once(&close))
        .map(|(inner, _)| inner.trim().to_string())
        .unwrap_or_default()
}

/// Chapter range from an append-chapters prompt ("chapters X through Y").
fn requested_range(prompt: &str) -> (u32, u32) {
    let numbers: Vec<u32> = prompt
        .split("writing chapters")
        .nth(1)
        .unwrap_or_default()
        .split_whitespace()
        .take(3)
        .filter_map(|word| word.trim_matches(|c: char| !c.is_ascii_digit()).parse().ok())
        .collect();
    match numbers.as_slice() {
        [first, last, ..] => (*first, *last),
        _ => (1, 1),
    }
}
