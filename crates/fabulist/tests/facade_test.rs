use async_trait::async_trait;
use fabulist::{
    FabulistDriver, FabulistResult, GenerateRequest, GenerateResponse, InMemoryNarrativeRepository,
    NarrativeRepository, NovelPipeline, Output, PipelineConfig,
};
use std::sync::Arc;

/// Driver that answers every prompt with the same paragraph.
struct EchoDriver;

#[async_trait]
impl FabulistDriver for EchoDriver {
    async fn generate(&self, _req: &GenerateRequest) -> FabulistResult<GenerateResponse> {
        Ok(GenerateResponse {
            outputs: vec![Output::Text("Mara turns the key and the door opens.".to_string())],
        })
    }

    fn provider_name(&self) -> &'static str {
        "echo"
    }

    fn model_name(&self) -> &str {
        "echo-v1"
    }
}

#[tokio::test]
async fn test_pipeline_degrades_without_structure() {
    // No JSON and no chapter headers: every chapter becomes a placeholder.
    let config = PipelineConfig::from_toml_str(
        r#"
        chapter_count = 2

        [critique]
        max_iterations_per_axis = 1
        cleanup = false

        [chapter_revision]
        enabled = false
        "#,
    )
    .expect("Valid configuration");
    let repository = Arc::new(InMemoryNarrativeRepository::new());
    let pipeline = NovelPipeline::new(Arc::new(EchoDriver), config)
        .expect("Bundled templates")
        .with_repository(repository.clone(), "echo");

    let narrative = pipeline.run("A locksmith's story.").await.expect("Run completes");

    assert_eq!(narrative.chapters().len(), 2);
    assert!(narrative.chapters().iter().all(|c| c.is_failed()));
    assert!(narrative.story_info().is_none());
    assert_eq!(repository.list().await.expect("List"), vec!["echo".to_string()]);
}
