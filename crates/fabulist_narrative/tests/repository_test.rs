use fabulist_interface::NarrativeRepository;
use fabulist_narrative::{FileNarrativeRepository, InMemoryNarrativeRepository};
use fabulist_state::{ChapterContext, NarrativeContext, SceneContext, StoryInfo};

fn sample_narrative() -> NarrativeContext {
    let mut narrative = NarrativeContext::new(
        "A locksmith discovers her keys open more than doors.",
        Some("Spare, present tense.".to_string()),
    );
    narrative.set_base_outline("# Chapter 1: The Key\nMara finds the key.");
    narrative.set_motifs(vec!["keys".to_string()]);
    narrative.log("outline", "done");

    let mut scene = SceneContext::new(1, "Mara in the shop.");
    scene.add_piece("Mara turns the key.", "Mara turns the key.");
    let mut chapter = ChapterContext::new(1, "Mara finds the key.");
    chapter.add_scene(scene).expect("First scene");
    chapter.set_generated_content("Mara turns the key.");
    chapter.set_summary("Mara finds the key.");
    narrative.add_chapter(chapter).expect("First chapter");
    narrative
        .add_chapter(ChapterContext::failed(2, "", "no outline for chapter 2"))
        .expect("Second chapter");
    narrative.set_story_info(StoryInfo::new(
        "The Winter Key",
        "A locksmith opens the wrong door.",
        vec![],
    ));
    narrative
}

#[tokio::test]
async fn test_file_repository_round_trip() {
    let dir = tempfile::tempdir().expect("Temp dir");
    let repository = FileNarrativeRepository::new(dir.path().join("runs")).expect("Repository");
    let narrative = sample_narrative();

    repository.save("locksmith", &narrative).await.expect("Save");
    let loaded = repository.load("locksmith").await.expect("Load");

    assert_eq!(loaded, narrative);
    assert!(dir.path().join("runs").join("locksmith.json").exists());
}

#[tokio::test]
async fn test_file_repository_overwrites_checkpoints() {
    let dir = tempfile::tempdir().expect("Temp dir");
    let repository = FileNarrativeRepository::new(dir.path()).expect("Repository");

    let early = NarrativeContext::new("A locksmith's story.", None);
    repository.save("run", &early).await.expect("Save early");
    let late = sample_narrative();
    repository.save("run", &late).await.expect("Save late");

    assert_eq!(repository.load("run").await.expect("Load"), late);
    assert_eq!(repository.list().await.expect("List"), vec!["run".to_string()]);
}

#[tokio::test]
async fn test_file_repository_lists_sorted_ids() {
    let dir = tempfile::tempdir().expect("Temp dir");
    let repository = FileNarrativeRepository::new(dir.path()).expect("Repository");
    let narrative = NarrativeContext::new("prompt", None);

    for id in ["zeta", "alpha", "mid"] {
        repository.save(id, &narrative).await.expect("Save");
    }
    std::fs::write(dir.path().join("notes.txt"), "not a narrative").expect("Write stray file");

    assert_eq!(
        repository.list().await.expect("List"),
        vec!["alpha".to_string(), "mid".to_string(), "zeta".to_string()]
    );
}

#[tokio::test]
async fn test_file_repository_rejects_unknown_and_unsafe_ids() {
    let dir = tempfile::tempdir().expect("Temp dir");
    let repository = FileNarrativeRepository::new(dir.path()).expect("Repository");
    let narrative = NarrativeContext::new("prompt", None);

    assert!(repository.load("missing").await.is_err());
    assert!(repository.save("../escape", &narrative).await.is_err());
    assert!(repository.save("", &narrative).await.is_err());
}

#[tokio::test]
async fn test_file_repository_rejects_corrupt_records() {
    let dir = tempfile::tempdir().expect("Temp dir");
    let repository = FileNarrativeRepository::new(dir.path()).expect("Repository");
    std::fs::write(dir.path().join("broken.json"), "{ not json").expect("Write");

    assert!(repository.load("broken").await.is_err());
}

#[tokio::test]
async fn test_in_memory_repository() {
    let repository = InMemoryNarrativeRepository::new();
    assert!(repository.is_empty().await);

    let narrative = sample_narrative();
    repository.save("b", &narrative).await.expect("Save");
    repository.save("a", &narrative).await.expect("Save");

    assert_eq!(repository.len().await, 2);
    assert_eq!(repository.load("b").await.expect("Load"), narrative);
    assert_eq!(
        repository.list().await.expect("List"),
        vec!["a".to_string(), "b".to_string()]
    );
    assert!(repository.load("c").await.is_err());
}

#[tokio::test]
async fn test_in_memory_clones_share_storage() {
    let repository = InMemoryNarrativeRepository::new();
    let clone = repository.clone();

    clone.save("shared", &sample_narrative()).await.expect("Save");

    assert_eq!(repository.len().await, 1);
}
