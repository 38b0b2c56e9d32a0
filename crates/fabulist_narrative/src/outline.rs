//! Outline engine.
//!
//! Runs the outline state machine:
//!
//! ```text
//! ExtractingContext -> GeneratingElements -> GeneratingRoughOutline
//!   -> StructureRevision -> EnforcingChapterCount -> [ExpandingPerChapter]* -> Done
//! ```
//!
//! Every transition is traced and recorded in the narrative's generation
//! log. No stage aborts the run: failures leave their field empty and the
//! next stage works with what there is.

use crate::{
    Axis, Brief, ChapterCountResult, ChapterOutlineResult, CompletionVerifier, CritiqueEngine,
    ModelRole, MotifsResult, RevisionCycle, Summarizer, Workshop,
};
use fabulist_core::TemplatePurpose;
use fabulist_state::NarrativeContext;
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;
use tracing::{error, info, instrument, warn};

static MARKDOWN_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*(?:#{1,6}[ \t]*\S[^\n]*|\*\*[^\n]*\S[^\n]*\*\*[^\n]*)$")
        .expect("Valid markdown header regex")
});

static CHAPTER_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?mi)^[ \t]*(?:#{1,6}[ \t]*|\*\*[ \t]*)chapter[ \t]+([0-9]+|[a-z]+(?:-[a-z]+)?)\b[^\n]*$",
    )
    .expect("Valid chapter header regex")
});

const UNITS: [&str; 20] = [
    "zero", "one", "two", "three", "four", "five", "six", "seven", "eight", "nine", "ten",
    "eleven", "twelve", "thirteen", "fourteen", "fifteen", "sixteen", "seventeen", "eighteen",
    "nineteen",
];

const TENS: [&str; 10] = [
    "", "", "twenty", "thirty", "forty", "fifty", "sixty", "seventy", "eighty", "ninety",
];

const ROMAN: [(u32, &str); 13] = [
    (1000, "m"),
    (900, "cm"),
    (500, "d"),
    (400, "cd"),
    (100, "c"),
    (90, "xc"),
    (50, "l"),
    (40, "xl"),
    (10, "x"),
    (9, "ix"),
    (5, "v"),
    (4, "iv"),
    (1, "i"),
];

/// Chapter number written as digits, English words or roman numerals.
///
/// # Examples
///
/// ```
/// use fabulist_narrative::chapter_number;
///
/// assert_eq!(chapter_number("12"), Some(12));
/// assert_eq!(chapter_number("Twenty-One"), Some(21));
/// assert_eq!(chapter_number("XIV"), Some(14));
/// assert_eq!(chapter_number("Door"), None);
/// ```
pub fn chapter_number(token: &str) -> Option<u32> {
    let token = token.trim().to_ascii_lowercase();
    token
        .parse()
        .ok()
        .or_else(|| word_number(&token))
        .or_else(|| roman_number(&token))
        .filter(|number| *number > 0)
}

fn word_number(word: &str) -> Option<u32> {
    if let Some(units) = UNITS.iter().position(|unit| *unit == word) {
        return Some(units as u32);
    }
    let (tens, units) = match word.split_once('-') {
        Some((tens, units)) => (tens, Some(units)),
        None => (word, None),
    };
    let tens = TENS.iter().position(|t| !t.is_empty() && *t == tens)? as u32 * 10;
    match units {
        None => Some(tens),
        Some(units) => {
            let units = UNITS[1..10].iter().position(|unit| *unit == units)? as u32 + 1;
            Some(tens + units)
        }
    }
}

fn roman_number(numeral: &str) -> Option<u32> {
    let mut total = 0u32;
    let mut previous = 0u32;
    for ch in numeral.chars().rev() {
        let value = match ch {
            'i' => 1,
            'v' => 5,
            'x' => 10,
            'l' => 50,
            'c' => 100,
            'd' => 500,
            'm' => 1000,
            _ => return None,
        };
        if value < previous {
            total = total.checked_sub(value)?;
        } else {
            total = total.checked_add(value)?;
            previous = value;
        }
    }
    // Non-canonical forms such as "iiii" are rejected
    (to_roman(total) == numeral).then_some(total)
}

fn to_roman(mut number: u32) -> String {
    let mut numeral = String::new();
    for (value, symbol) in ROMAN {
        while number >= value {
            numeral.push_str(symbol);
            number -= value;
        }
    }
    numeral
}

/// Stages of the outline state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum OutlineStage {
    /// Pulling non-plot instructions out of the prompt
    #[display("extracting context")]
    ExtractingContext,
    /// Story elements and motifs
    #[display("generating elements")]
    GeneratingElements,
    /// Chapter-delimited outline
    #[display("generating rough outline")]
    GeneratingRoughOutline,
    /// Structure-only critique pass over the outline
    #[display("structure revision")]
    StructureRevision,
    /// Appending chapters until the target count is reached
    #[display("enforcing chapter count")]
    EnforcingChapterCount,
    /// Expanding one chapter's outline
    #[display("expanding chapter {}", _0)]
    ExpandingPerChapter(u32),
    /// Finished
    #[display("done")]
    Done,
}

/// Every markdown header line of an outline, in order.
///
/// Covers `#` headers of any level and lines that open in bold.
pub fn outline_headers(outline: &str) -> Vec<&str> {
    MARKDOWN_HEADER
        .find_iter(outline)
        .map(|m| m.as_str().trim())
        .collect()
}

/// Chapter header lines of an outline, in order.
///
/// # Examples
///
/// ```
/// use fabulist_narrative::chapter_headers;
///
/// let outline = "# Chapter 1: The Key\nMara finds it.\n\n## Chapter Two - The Door\nIt opens.";
/// assert_eq!(
///     chapter_headers(outline),
///     vec!["# Chapter 1: The Key", "## Chapter Two - The Door"]
/// );
/// ```
pub fn chapter_headers(outline: &str) -> Vec<&str> {
    numbered_headers(outline)
        .into_iter()
        .map(|(_, start, end)| outline[start..end].trim())
        .collect()
}

/// Split an outline into chapter sections keyed by chapter number.
///
/// Each section runs from its header to the next header. When a number
/// appears twice, the first section wins.
pub fn split_chapters(outline: &str) -> BTreeMap<u32, String> {
    let headers = numbered_headers(outline);

    let mut sections = BTreeMap::new();
    for (index, (number, start, _)) in headers.iter().enumerate() {
        let end = headers
            .get(index + 1)
            .map_or(outline.len(), |(_, next, _)| *next);
        sections
            .entry(*number)
            .or_insert_with(|| outline[*start..end].trim().to_string());
    }
    sections
}

/// Chapter headers with their number and byte span.
fn numbered_headers(outline: &str) -> Vec<(u32, usize, usize)> {
    CHAPTER_HEADER
        .captures_iter(outline)
        .filter_map(|caps| {
            let number = chapter_number(caps.get(1)?.as_str())?;
            let header = caps.get(0)?;
            Some((number, header.start(), header.end()))
        })
        .collect()
}

/// Distinct chapter numbers among an outline's headers.
pub fn header_count(outline: &str) -> u32 {
    split_chapters(outline).len() as u32
}

/// Builds and maintains the narrative outline.
#[derive(Debug, Clone, Copy)]
pub struct OutlineEngine<'a> {
    workshop: &'a Workshop,
}

impl<'a> OutlineEngine<'a> {
    /// Create an engine over a workshop.
    pub fn new(workshop: &'a Workshop) -> Self {
        Self { workshop }
    }

    /// Run every stage, returning the detected chapter count.
    #[instrument(skip_all)]
    pub async fn run(&self, narrative: &mut NarrativeContext) -> u32 {
        let config = self.workshop.config();

        self.enter(narrative, OutlineStage::ExtractingContext);
        let instructions = self.extract_context(narrative.initial_prompt()).await;
        narrative.set_writing_instructions(instructions);

        self.enter(narrative, OutlineStage::GeneratingElements);
        self.generate_elements(narrative).await;

        self.enter(narrative, OutlineStage::GeneratingRoughOutline);
        let outline = self.rough_outline(narrative).await;
        narrative.set_base_outline(outline);

        self.enter(narrative, OutlineStage::StructureRevision);
        if narrative.has_outline() {
            let revised = CritiqueEngine::new(self.workshop)
                .revise_axis(
                    narrative.base_outline().clone(),
                    &outline_brief(narrative),
                    &RevisionCycle::for_axis(Axis::Structure),
                )
                .await;
            narrative.set_base_outline(revised);
        }

        self.enter(narrative, OutlineStage::EnforcingChapterCount);
        let count = self
            .enforce_chapter_count(narrative, *config.chapter_count())
            .await;

        if *config.expand_outline() {
            self.expand(narrative, count).await;
        }

        self.enter(narrative, OutlineStage::Done);
        count
    }

    /// Chapter count of an outline.
    ///
    /// Every markdown header goes to a structured extraction, so chapters
    /// headed in words or under other titles are counted too. Counting
    /// numbered chapter headers is the fallback when extraction fails.
    pub async fn count_chapters(&self, outline: &str) -> u32 {
        let headers = outline_headers(outline);
        if headers.is_empty() {
            return 0;
        }
        let listing = headers.join("\n");
        match self
            .workshop
            .ask::<ChapterCountResult>(TemplatePurpose::ChapterCount, &[("headers", &listing)])
            .await
        {
            Some(result) => *result.total_chapters(),
            None => {
                let counted = header_count(outline);
                warn!(counted, "Chapter count extraction failed, counting headers");
                counted
            }
        }
    }

    /// Append chapters until the outline has `target` of them.
    ///
    /// Missing chapters are appended, seeded with the last one or two existing
    /// chapters; earlier chapters are never regenerated. One further round
    /// runs if the first leaves the outline short.
    #[instrument(skip(self, narrative))]
    pub async fn enforce_chapter_count(&self, narrative: &mut NarrativeContext, target: u32) -> u32 {
        let mut count = self.count_chapters(narrative.base_outline()).await;
        if target == 0 {
            return count;
        }

        for round in 1..=2 {
            if count >= target {
                break;
            }
            info!(count, target, round, "Outline short, appending chapters");
            self.append_chapters(narrative, count, target).await;
            count = self.count_chapters(narrative.base_outline()).await;
        }

        if count < target {
            warn!(count, target, "Outline still short after appending");
        }
        narrative.log("outline", format!("{} chapters (target {})", count, target));
        count
    }

    /// Expand chapters 1..=count strictly in order.
    ///
    /// Each expansion sees digests of the chapters expanded before it, never
    /// their full text.
    #[instrument(skip(self, narrative))]
    pub async fn expand(&self, narrative: &mut NarrativeContext, count: u32) {
        let summarizer = Summarizer::new(self.workshop);
        let base_sections = split_chapters(narrative.base_outline());
        let mut digests: Vec<String> = Vec::new();
        let mut expanded: Vec<String> = Vec::new();

        for chapter in 1..=count {
            self.enter(narrative, OutlineStage::ExpandingPerChapter(chapter));
            let chapter_outline = match base_sections.get(&chapter) {
                Some(section) => section.clone(),
                None => match self.extract_chapter_outline(narrative.base_outline(), chapter).await {
                    Some(section) => section,
                    None => {
                        warn!(chapter, "No outline to expand");
                        continue;
                    }
                },
            };

            let previous = if digests.is_empty() {
                "None yet.".to_string()
            } else {
                digests.join("\n")
            };
            let chapter_label = chapter.to_string();
            let text = self
                .workshop
                .write(
                    TemplatePurpose::ExpandChapter,
                    ModelRole::Outline,
                    &[
                        ("chapter", &chapter_label),
                        ("chapter_outline", &chapter_outline),
                        ("previous", &previous),
                        ("elements", narrative.story_elements()),
                    ],
                    *self.workshop.config().words().expanded_chapter(),
                )
                .await
                .unwrap_or_else(|| {
                    warn!(chapter, "Expansion failed, keeping base chapter outline");
                    chapter_outline.clone()
                });

            let body = CHAPTER_HEADER.replace_all(&text, "").trim().to_string();
            let digest = summarizer.digest(&body, "chapter plan").await;
            digests.push(format!("Chapter {}: {}", chapter, digest));
            expanded.push(format!("# Chapter {}\n\n{}", chapter, body));
        }

        narrative.set_expanded_outline(expanded.join("\n\n"));
    }

    /// Outline of one chapter, from the expanded outline if present, else the base.
    ///
    /// Header split first, structured extraction second; `None` is a
    /// structural failure for the caller.
    pub async fn chapter_outline(&self, narrative: &NarrativeContext, chapter: u32) -> Option<String> {
        let outline = narrative.outline();
        if let Some(section) = split_chapters(outline).remove(&chapter)
            && !section.is_empty()
        {
            return Some(section);
        }
        let extracted = self.extract_chapter_outline(outline, chapter).await;
        if extracted.is_none() {
            error!(chapter, "No outline found for chapter");
        }
        extracted
    }

    async fn extract_chapter_outline(&self, outline: &str, chapter: u32) -> Option<String> {
        if outline.trim().is_empty() {
            return None;
        }
        let chapter_label = chapter.to_string();
        self.workshop
            .ask::<ChapterOutlineResult>(
                TemplatePurpose::ChapterOutline,
                &[("outline", outline), ("chapter", &chapter_label)],
            )
            .await
            .map(|result| result.chapter_outline().trim().to_string())
            .filter(|section| !section.is_empty())
    }

    fn enter(&self, narrative: &mut NarrativeContext, stage: OutlineStage) {
        info!(stage = %stage, "Outline stage");
        narrative.log("outline", stage.to_string());
    }

    async fn extract_context(&self, prompt: &str) -> String {
        let extracted = self
            .workshop
            .write(
                TemplatePurpose::ExtractContext,
                ModelRole::Outline,
                &[("prompt", prompt)],
                0,
            )
            .await;
        match extracted {
            Some(text) if !text.trim().eq_ignore_ascii_case("none") => text.trim().to_string(),
            Some(_) => String::new(),
            None => {
                warn!("Context extraction failed, continuing without instructions");
                String::new()
            }
        }
    }

    async fn generate_elements(&self, narrative: &mut NarrativeContext) {
        let instructions = instructions_or_none(narrative.writing_instructions());
        let Some(elements) = self
            .workshop
            .write(
                TemplatePurpose::StoryElements,
                ModelRole::Outline,
                &[("prompt", narrative.initial_prompt()), ("instructions", &instructions)],
                *self.workshop.config().words().elements(),
            )
            .await
        else {
            warn!("Story elements generation failed");
            return;
        };

        let brief = Brief {
            task: "the foundational story elements",
            ..outline_brief(narrative)
        };
        let elements = CritiqueEngine::new(self.workshop)
            .improve(elements, &brief)
            .await;

        let motifs = self
            .workshop
            .ask::<MotifsResult>(TemplatePurpose::StoryMotifs, &[("elements", &elements)])
            .await
            .map(|result| result.motifs().clone())
            .unwrap_or_default();

        narrative.set_story_elements(elements);
        narrative.set_motifs(motifs);
    }

    async fn rough_outline(&self, narrative: &NarrativeContext) -> String {
        let instructions = instructions_or_none(narrative.writing_instructions());
        let Some(outline) = self
            .workshop
            .write(
                TemplatePurpose::RoughOutline,
                ModelRole::Outline,
                &[
                    ("prompt", narrative.initial_prompt()),
                    ("elements", narrative.story_elements()),
                    ("instructions", &instructions),
                ],
                *self.workshop.config().words().outline(),
            )
            .await
        else {
            error!("Rough outline generation failed");
            return String::new();
        };

        CompletionVerifier::new(self.workshop)
            .verify("a chapter-by-chapter story outline", outline)
            .await
            .into_text()
    }

    async fn append_chapters(&self, narrative: &mut NarrativeContext, count: u32, target: u32) {
        let sections = split_chapters(narrative.base_outline());
        let tail: Vec<&str> = sections.values().rev().take(2).rev().map(String::as_str).collect();
        let outline_tail = if tail.is_empty() {
            "None yet.".to_string()
        } else {
            tail.join("\n\n")
        };
        let first = (count + 1).to_string();
        let last = target.to_string();
        let min_words =
            *self.workshop.config().words().chapter_outline() * (target - count) as usize;

        let addition = self
            .workshop
            .write(
                TemplatePurpose::AppendChapters,
                ModelRole::Outline,
                &[
                    ("outline_tail", &outline_tail),
                    ("elements", narrative.story_elements()),
                    ("first", &first),
                    ("last", &last),
                ],
                min_words,
            )
            .await;

        match addition {
            Some(addition) => {
                let base = narrative.base_outline().trim_end();
                let combined = if base.is_empty() {
                    addition.trim().to_string()
                } else {
                    format!("{}\n\n{}", base, addition.trim())
                };
                narrative.set_base_outline(combined);
                narrative.log("outline", format!("appended chapters {}-{}", first, last));
            }
            None => warn!(first = %first, last = %last, "Appending chapters failed"),
        }
    }
}

/// Brief for critiques of outline-stage artifacts.
fn outline_brief(narrative: &NarrativeContext) -> Brief<'_> {
    Brief {
        task: "the chapter-by-chapter story outline",
        context: narrative.story_elements(),
        prompt: narrative.initial_prompt(),
        style_guide: narrative.style_guide(),
    }
}

fn instructions_or_none(instructions: &str) -> String {
    if instructions.trim().is_empty() {
        "None.".to_string()
    } else {
        instructions.to_string()
    }
}
