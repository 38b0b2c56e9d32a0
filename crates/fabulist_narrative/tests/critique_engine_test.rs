mod test_utils;

use fabulist_core::word_count;
use fabulist_narrative::{Axis, Brief, CritiqueEngine, RevisionCycle};
use test_utils::{StoryDriver, prose, test_config, transport_error, workshop, workshop_with};

fn brief() -> Brief<'static> {
    Brief {
        task: "chapter 1 of the novel",
        context: "None yet.",
        prompt: "A locksmith discovers her keys open more than doors.",
        style_guide: "Spare, present tense.",
    }
}

#[tokio::test]
async fn test_failed_revision_keeps_the_input() {
    let driver = StoryDriver::scripted(5, |purpose, _, _| match purpose {
        "critique-style" => Some(Ok("The rhythm is flat.".to_string())),
        "revise-style" => Some(transport_error()),
        _ => None,
    });
    let workshop = workshop(driver.clone());

    let content = prose(100);
    let revised = CritiqueEngine::new(&workshop)
        .revise_axis(content.clone(), &brief(), &RevisionCycle::for_axis(Axis::Style))
        .await;

    assert_eq!(revised, content);
    // One failed revision plus its single retry, then the score ends the cycle.
    assert_eq!(driver.calls("revise-style"), 2);
    assert_eq!(driver.calls("score-style"), 1);
}

#[tokio::test]
async fn test_short_revision_is_discarded() {
    let driver = StoryDriver::scripted(5, |purpose, _, _| match purpose {
        "critique-style" => Some(Ok("Cut the adverbs.".to_string())),
        "revise-style" => Some(Ok(prose(10))),
        _ => None,
    });
    let workshop = workshop(driver.clone());

    let content = prose(100);
    let revised = CritiqueEngine::new(&workshop)
        .revise_axis(content.clone(), &brief(), &RevisionCycle::for_axis(Axis::Style))
        .await;

    assert_eq!(revised, content);
}

#[tokio::test]
async fn test_revision_replaces_content_until_the_score_passes() {
    let driver = StoryDriver::scripted(5, |purpose, _, _| match purpose {
        "critique-structure" => Some(Ok("The middle drags.".to_string())),
        "revise-structure" => Some(Ok(format!("{} revised", prose(99)))),
        _ => None,
    });
    let workshop = workshop(driver.clone());

    let revised = CritiqueEngine::new(&workshop)
        .revise_axis(prose(100), &brief(), &RevisionCycle::for_axis(Axis::Structure))
        .await;

    assert!(revised.ends_with("revised"));
    assert_eq!(driver.calls("critique-structure"), 1);
    assert_eq!(driver.calls("score-structure"), 1);
}

#[tokio::test]
async fn test_cycle_is_bounded_by_max_iterations() {
    let driver = StoryDriver::scripted(5, |purpose, index, _| match purpose {
        "critique-consistency" => Some(Ok("Mara's age changes.".to_string())),
        "score-consistency" => Some(Ok(r#"{"score": 10}"#.to_string())),
        "revise-consistency" => Some(Ok(format!("{} draft{}", prose(100), index))),
        _ => None,
    });
    let workshop = workshop(driver.clone());

    let revised = CritiqueEngine::new(&workshop)
        .revise_axis(prose(100), &brief(), &RevisionCycle::for_axis(Axis::Consistency))
        .await;

    assert_eq!(driver.calls("critique-consistency"), 5);
    assert_eq!(driver.calls("revise-consistency"), 5);
    assert_eq!(driver.calls("score-consistency"), 4);
    assert!(revised.ends_with("draft4"));
}

#[tokio::test]
async fn test_no_issues_skips_revision() {
    let driver = StoryDriver::new();
    let workshop = workshop(driver.clone());

    let content = prose(100);
    let improved = CritiqueEngine::new(&workshop)
        .improve(content.clone(), &brief())
        .await;

    assert_eq!(improved, content);
    for purpose in ["revise-style", "revise-structure", "revise-consistency"] {
        assert_eq!(driver.calls(purpose), 0, "{} should not run", purpose);
    }
    for purpose in ["critique-style", "critique-structure", "critique-consistency"] {
        assert_eq!(driver.calls(purpose), 1, "{} should run once", purpose);
    }
    assert_eq!(driver.calls("cleanup"), 1);
}

#[tokio::test]
async fn test_single_pass_has_no_score_gate() {
    let driver = StoryDriver::scripted(5, |purpose, _, _| match purpose {
        "critique-single" => Some(Ok("Name the villain.".to_string())),
        "revise-single" => Some(Ok("Mara finds a key that Osric forged.".to_string())),
        _ => None,
    });
    let workshop = workshop(driver.clone());

    let revised = CritiqueEngine::new(&workshop)
        .single_pass("Mara finds a key that opens a door.".to_string(), &brief())
        .await;

    assert_eq!(revised, "Mara finds a key that Osric forged.");
    assert_eq!(driver.calls("critique-single"), 1);
    assert_eq!(driver.calls("revise-single"), 1);
}

#[tokio::test]
async fn test_short_cleanup_keeps_the_revised_text() {
    let driver = StoryDriver::scripted(5, |purpose, _, _| {
        (purpose == "cleanup").then(|| Ok(prose(5)))
    });
    let workshop = workshop(driver.clone());

    let content = prose(100);
    let cleaned = CritiqueEngine::new(&workshop).cleanup(content.clone()).await;

    assert_eq!(cleaned, content);
    assert_eq!(word_count(&cleaned), 100);
}

#[tokio::test]
async fn test_cleanup_can_be_disabled() {
    let driver = StoryDriver::new();
    let config = test_config();
    let critique = config.critique().clone().with_cleanup(false);
    let workshop = workshop_with(driver.clone(), config.with_critique(critique));

    CritiqueEngine::new(&workshop).improve(prose(100), &brief()).await;

    assert_eq!(driver.calls("cleanup"), 0);
}
