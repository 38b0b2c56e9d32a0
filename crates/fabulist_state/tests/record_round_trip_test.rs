use fabulist_state::{ChapterContext, NarrativeContext, Record, SceneContext, StoryInfo};

fn populated() -> NarrativeContext {
    let mut narrative = NarrativeContext::new(
        "A locksmith discovers her keys open more than doors.",
        Some("Close third person, present tense.".to_string()),
    );
    narrative.set_writing_instructions("Keep it under ten chapters.");
    narrative.set_story_elements("# Genre\nFabulism");
    narrative.set_base_outline("# Chapter 1\nThe key.\n# Chapter 2\nThe door.");
    narrative.set_expanded_outline("# Chapter 1\nThe key, in detail.");
    narrative.set_motifs(vec!["keys".into(), "thresholds".into()]);
    narrative.log("outline", "done");

    let mut chapter = ChapterContext::new(1, "The key.");
    let mut scene = SceneContext::new(1, "Pawnshop");
    scene.add_piece("Mara bought the key for a song.", "Mara buys a key.");
    scene.add_piece("It hummed in her pocket.", "The key hums.");
    scene.set_final_summary("Mara buys a humming key.");
    scene.add_key_points(["The key hums"]);
    chapter.add_scene(scene).unwrap();
    chapter.set_generated_content("Mara bought the key for a song.\n\nIt hummed in her pocket.");
    chapter.set_summary("Mara buys a key.");
    chapter.set_theme_elements(vec!["curiosity".into()]);
    chapter.add_character_arc_notes([("Mara".to_string(), "restless".to_string())]);
    narrative.add_chapter(chapter).unwrap();
    narrative
        .add_chapter(ChapterContext::failed(2, "The door.", "timeout"))
        .unwrap();
    narrative.set_story_info(StoryInfo::new("Keys", "A locksmith.", vec!["fabulism".into()]));
    narrative
}

#[test]
fn test_narrative_round_trip_is_lossless() {
    let narrative = populated();
    let record = narrative.to_record().unwrap();
    let restored = NarrativeContext::from_record(record).unwrap();

    assert_eq!(restored, narrative);
    assert_eq!(
        restored.get_chapter(1).unwrap().get_scene(1).unwrap().generated_content(),
        narrative.get_chapter(1).unwrap().get_scene(1).unwrap().generated_content()
    );
}

#[test]
fn test_scene_content_is_not_stored() {
    let narrative = populated();
    let record = narrative.to_record().unwrap();
    let scene = &record["chapters"][0]["scenes"][0];
    assert!(scene.get("generated_content").is_none());
    assert_eq!(scene["pieces"].as_array().unwrap().len(), 2);
}

#[test]
fn test_older_records_default_missing_fields() {
    let record = serde_json::json!({
        "initial_prompt": "A locksmith discovers her keys open more than doors.",
        "chapters": [
            {"chapter_number": 1, "initial_outline": "The key."}
        ]
    });
    let narrative = NarrativeContext::from_record(record).unwrap();

    assert_eq!(narrative.style_guide(), "");
    assert!(narrative.motifs().is_empty());
    assert!(narrative.story_info().is_none());
    let chapter = narrative.get_chapter(1).unwrap();
    assert!(chapter.generated_content().is_none());
    assert!(chapter.character_arc_notes().is_empty());
    assert!(!chapter.is_failed());
}

#[test]
fn test_out_of_order_record_is_rejected() {
    let record = serde_json::json!({
        "initial_prompt": "p",
        "chapters": [
            {"chapter_number": 2, "initial_outline": "b"},
            {"chapter_number": 1, "initial_outline": "a"}
        ]
    });
    assert!(NarrativeContext::from_record(record).is_err());
}

#[test]
fn test_chapter_record_round_trip() {
    let narrative = populated();
    let chapter = narrative.get_chapter(1).unwrap();
    let restored = ChapterContext::from_record(chapter.to_record().unwrap()).unwrap();
    assert_eq!(&restored, chapter);
}
