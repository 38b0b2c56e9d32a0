mod test_utils;

use fabulist_narrative::{Brief, SCENE_OPENING, SceneAssembler, SceneBrief};
use test_utils::{StoryDriver, last_user_turn, transport_error, workshop};

const NOT_DONE: &str = r#"{"is_complete": false, "reason": "the door is still closed"}"#;

fn scene_brief<'a>(carry_over: &'a [String]) -> SceneBrief<'a> {
    SceneBrief {
        scene_number: 1,
        scene_outline: "Mara tries the key on the cellar door.",
        chapter_outline: "Mara finds a key that opens a winter door.",
        carry_over,
        critique: Brief {
            task: "chapter 1 of the novel",
            ..Brief::default()
        },
    }
}

#[tokio::test]
async fn test_scene_stops_at_the_piece_limit() {
    let driver = StoryDriver::scripted(5, |purpose, _, _| {
        (purpose == "scene-complete").then(|| Ok(NOT_DONE.to_string()))
    });
    let workshop = workshop(driver.clone());

    let scene = SceneAssembler::new(&workshop).assemble(&scene_brief(&[])).await;

    assert_eq!(scene.pieces().len(), 7);
    assert_eq!(driver.calls("scene-piece-first"), 1);
    assert_eq!(driver.calls("scene-piece-next"), 6);
    assert_eq!(driver.calls("scene-complete"), 7);
}

#[tokio::test]
async fn test_scene_ends_when_judged_complete() {
    let driver = StoryDriver::new();
    let workshop = workshop(driver.clone());

    let scene = SceneAssembler::new(&workshop).assemble(&scene_brief(&[])).await;

    assert_eq!(scene.pieces().len(), 1);
    assert_eq!(driver.calls("scene-piece-next"), 0);
    assert_eq!(scene.piece_summaries(), vec!["Mara finds a key that opens a winter door."]);
}

#[tokio::test]
async fn test_piece_failure_ends_the_scene_early() {
    let driver = StoryDriver::scripted(5, |purpose, index, _| match purpose {
        "scene-complete" => Some(Ok(NOT_DONE.to_string())),
        "scene-piece-next" if index >= 2 => Some(transport_error()),
        _ => None,
    });
    let workshop = workshop(driver.clone());

    let scene = SceneAssembler::new(&workshop).assemble(&scene_brief(&[])).await;

    assert_eq!(scene.pieces().len(), 3);
    // The third continuation failed once and once more on its retry.
    assert_eq!(driver.calls("scene-piece-next"), 4);
}

#[tokio::test]
async fn test_later_pieces_see_summaries_not_prose() {
    let driver = StoryDriver::scripted(5, |purpose, index, _| match purpose {
        "scene-complete" if index == 0 => Some(Ok(NOT_DONE.to_string())),
        _ => None,
    });
    let workshop = workshop(driver.clone());

    let scene = SceneAssembler::new(&workshop).assemble(&scene_brief(&[])).await;
    assert_eq!(scene.pieces().len(), 2);

    let first_prompt = last_user_turn(&driver.requests_for("scene-piece-first")[0]);
    assert!(first_prompt.contains(SCENE_OPENING));

    let next_prompt = last_user_turn(&driver.requests_for("scene-piece-next")[0]);
    assert!(next_prompt.contains("1. Mara finds a key that opens a winter door."));
    assert!(!next_prompt.contains("brass key in silence"));
}

#[tokio::test]
async fn test_first_piece_carries_previous_key_points() {
    let driver = StoryDriver::new();
    let workshop = workshop(driver.clone());
    let carry_over = vec!["Mara hid the key in her boot".to_string()];

    SceneAssembler::new(&workshop)
        .assemble(&scene_brief(&carry_over))
        .await;

    let prompt = last_user_turn(&driver.requests_for("scene-piece-first")[0]);
    assert!(prompt.contains("- Mara hid the key in her boot"));
}
