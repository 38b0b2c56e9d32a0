mod test_utils;

use fabulist_narrative::{OutlineEngine, header_count};
use fabulist_state::NarrativeContext;
use test_utils::{StoryDriver, last_user_turn, outline, transport_error, workshop};

const PROMPT: &str = "A locksmith discovers her keys open more than doors. Keep it under 5000 words.";

#[tokio::test]
async fn test_short_outline_is_extended_to_the_target() {
    let driver = StoryDriver::new();
    let workshop = workshop(driver.clone());
    let mut narrative = NarrativeContext::new(PROMPT, None);
    narrative.set_base_outline(outline(1, 3));

    let count = OutlineEngine::new(&workshop)
        .enforce_chapter_count(&mut narrative, 5)
        .await;

    assert_eq!(count, 5);
    assert_eq!(header_count(narrative.base_outline()), 5);
    assert_eq!(driver.calls("append-chapters"), 1);
    let request = last_user_turn(&driver.requests_for("append-chapters")[0]);
    assert!(request.contains("chapters 4 through 5"));
}

#[tokio::test]
async fn test_appending_is_attempted_twice_at_most() {
    let driver = StoryDriver::scripted(5, |purpose, _, _| {
        (purpose == "append-chapters").then(transport_error)
    });
    let workshop = workshop(driver.clone());
    let mut narrative = NarrativeContext::new(PROMPT, None);
    narrative.set_base_outline(outline(1, 3));

    let count = OutlineEngine::new(&workshop)
        .enforce_chapter_count(&mut narrative, 5)
        .await;

    assert_eq!(count, 3);
    // Two rounds, each a failed call plus its retry.
    assert_eq!(driver.calls("append-chapters"), 4);
    assert_eq!(header_count(narrative.base_outline()), 3);
}

#[tokio::test]
async fn test_chapter_count_falls_back_to_headers() {
    let driver = StoryDriver::scripted(5, |purpose, _, _| {
        (purpose == "chapter-count").then(|| Ok("There are several chapters.".to_string()))
    });
    let workshop = workshop(driver.clone());

    let count = OutlineEngine::new(&workshop).count_chapters(&outline(1, 4)).await;

    assert_eq!(count, 4);
    assert_eq!(driver.calls("chapter-count"), 3);
}

#[tokio::test]
async fn test_outline_without_headers_counts_zero() {
    let driver = StoryDriver::new();
    let workshop = workshop(driver.clone());

    let count = OutlineEngine::new(&workshop)
        .count_chapters("Mara finds a key. Then many things happen.")
        .await;

    assert_eq!(count, 0);
    assert_eq!(driver.total_calls(), 0);
}

fn word_numbered_outline() -> String {
    ["One", "Two", "Three", "Four", "Five"]
        .iter()
        .map(|word| format!("## Chapter {}\nMara opens another door and finds winter.", word))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[tokio::test]
async fn test_word_numbered_outline_is_not_extended() {
    let driver = StoryDriver::new();
    let workshop = workshop(driver.clone());
    let mut narrative = NarrativeContext::new(PROMPT, None);
    narrative.set_base_outline(word_numbered_outline());

    let count = OutlineEngine::new(&workshop)
        .enforce_chapter_count(&mut narrative, 5)
        .await;

    assert_eq!(count, 5);
    assert_eq!(driver.calls("chapter-count"), 1);
    assert_eq!(driver.calls("append-chapters"), 0);
    assert_eq!(narrative.base_outline(), &word_numbered_outline());

    let listing = last_user_turn(&driver.requests_for("chapter-count")[0]);
    assert!(listing.contains("## Chapter One"));
    assert!(listing.contains("## Chapter Five"));
}

#[tokio::test]
async fn test_word_numbered_chapter_outline_is_found_by_header() {
    let driver = StoryDriver::new();
    let workshop = workshop(driver.clone());
    let mut narrative = NarrativeContext::new(PROMPT, None);
    narrative.set_base_outline(word_numbered_outline());

    let section = OutlineEngine::new(&workshop)
        .chapter_outline(&narrative, 3)
        .await
        .expect("Chapter 3 outline");

    assert!(section.starts_with("## Chapter Three"));
    assert_eq!(driver.calls("chapter-outline"), 0);
}

#[tokio::test]
async fn test_untitled_headers_still_go_to_extraction() {
    let driver = StoryDriver::new();
    let workshop = workshop(driver.clone());
    let outline = "# The Shop\nMara buys a key.\n\n# The Door\nIt opens.\n\n# The Winter\nSnow.";

    let count = OutlineEngine::new(&workshop).count_chapters(outline).await;

    assert_eq!(count, 3);
    assert_eq!(driver.calls("chapter-count"), 1);
}

#[tokio::test]
async fn test_chapter_outline_prefers_the_header_section() {
    let driver = StoryDriver::new();
    let workshop = workshop(driver.clone());
    let mut narrative = NarrativeContext::new(PROMPT, None);
    narrative.set_base_outline(outline(1, 3));

    let section = OutlineEngine::new(&workshop)
        .chapter_outline(&narrative, 2)
        .await
        .expect("Chapter 2 outline");

    assert!(section.contains("door number 2"));
    assert_eq!(driver.calls("chapter-outline"), 0);
}

#[tokio::test]
async fn test_chapter_outline_falls_back_to_extraction() {
    let driver = StoryDriver::new();
    let workshop = workshop(driver.clone());
    let mut narrative = NarrativeContext::new(PROMPT, None);
    narrative.set_base_outline(outline(1, 3));

    let section = OutlineEngine::new(&workshop)
        .chapter_outline(&narrative, 7)
        .await
        .expect("Extracted outline");

    assert_eq!(section, "Mara follows the key to a door that should not exist.");
    assert_eq!(driver.calls("chapter-outline"), 1);
}

#[tokio::test]
async fn test_full_outline_run() {
    let driver = StoryDriver::with_chapters(4);
    let workshop = workshop(driver.clone());
    let mut narrative = NarrativeContext::new(PROMPT, None);

    let count = OutlineEngine::new(&workshop).run(&mut narrative).await;

    assert_eq!(count, 5);
    assert_eq!(header_count(narrative.base_outline()), 5);
    assert!(narrative.writing_instructions().is_empty());
    assert!(!narrative.story_elements().is_empty());
    assert_eq!(narrative.motifs(), &vec!["keys".to_string(), "winter".to_string()]);
    assert!(narrative.expanded_outline().is_empty());

    let stages: Vec<&str> = narrative
        .generation_log()
        .iter()
        .map(|entry| entry.message().as_str())
        .collect();
    for stage in [
        "extracting context",
        "generating elements",
        "generating rough outline",
        "structure revision",
        "enforcing chapter count",
        "done",
    ] {
        assert!(stages.contains(&stage), "missing stage {}", stage);
    }
}

#[tokio::test]
async fn test_expansion_writes_one_section_per_chapter() {
    let driver = StoryDriver::new();
    let workshop = workshop(driver.clone());
    let mut narrative = NarrativeContext::new(PROMPT, None);
    narrative.set_base_outline(outline(1, 3));

    OutlineEngine::new(&workshop).expand(&mut narrative, 3).await;

    assert_eq!(header_count(narrative.expanded_outline()), 3);
    assert_eq!(narrative.outline(), narrative.expanded_outline());
    assert_eq!(driver.calls("expand-chapter"), 3);

    let third = last_user_turn(&driver.requests_for("expand-chapter")[2]);
    assert!(third.contains("Chapter 2: Mara finds a key that opens a winter door."));
}
