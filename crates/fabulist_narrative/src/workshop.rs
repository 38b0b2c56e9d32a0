//! Shared context for the narrative engines.

use crate::{ModelRole, PipelineConfig};
use fabulist_core::{Message, PromptTemplates, TemplatePurpose};
use fabulist_error::FabulistResult;
use fabulist_gateway::{Gateway, StructuredReply, Target};
use fabulist_interface::{FabulistDriver, Interaction};
use std::sync::Arc;

/// Gateway, templates and configuration, shared by every engine of a run.
///
/// Engines borrow the workshop; none of them own state across calls.
#[derive(Debug)]
pub struct Workshop {
    gateway: Gateway,
    templates: Arc<PromptTemplates>,
    config: PipelineConfig,
}

impl Workshop {
    /// Build a workshop, loading templates as the configuration directs.
    ///
    /// # Errors
    ///
    /// Returns an error if the template override file is unusable.
    pub fn new(driver: Arc<dyn FabulistDriver>, config: PipelineConfig) -> FabulistResult<Self> {
        let templates = config.templates()?;
        Ok(Self::with_templates(driver, config, templates))
    }

    /// Build a workshop around an explicit template set.
    pub fn with_templates(
        driver: Arc<dyn FabulistDriver>,
        config: PipelineConfig,
        templates: PromptTemplates,
    ) -> Self {
        let templates = Arc::new(templates);
        let gateway = Gateway::new(driver, config.gateway().clone(), Arc::clone(&templates));
        Self {
            gateway,
            templates,
            config,
        }
    }

    /// Route persistent length failures to a human.
    pub fn with_interaction(self, interaction: Box<dyn Interaction>) -> Self {
        Self {
            gateway: self.gateway.with_interaction(interaction),
            ..self
        }
    }

    /// Pipeline configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Prompt templates.
    pub fn templates(&self) -> &PromptTemplates {
        &self.templates
    }

    /// The generation gateway.
    pub fn gateway(&self) -> &Gateway {
        &self.gateway
    }

    /// Fill a template.
    pub fn render(&self, purpose: TemplatePurpose, vars: &[(&str, &str)]) -> String {
        self.templates.render(purpose, vars)
    }

    /// Target for a purpose, using the model configured for `role`.
    pub fn target(&self, purpose: TemplatePurpose, role: ModelRole) -> Target {
        Target::for_purpose(purpose).with_model(self.config.models().model_for(role))
    }

    /// One-turn text request; `None` when every attempt failed.
    ///
    /// Text that stayed short after its retry is still returned; callers that
    /// must not lose content compare it against their own floor.
    pub async fn write(
        &self,
        purpose: TemplatePurpose,
        role: ModelRole,
        vars: &[(&str, &str)],
        min_words: usize,
    ) -> Option<String> {
        let history = vec![Message::user(self.render(purpose, vars))];
        self.gateway
            .generate_text(history, &self.target(purpose, role), min_words)
            .await
            .reply
            .into_text()
    }

    /// One-turn structured request; `None` once the attempts are exhausted.
    pub async fn ask<T: StructuredReply>(
        &self,
        purpose: TemplatePurpose,
        vars: &[(&str, &str)],
    ) -> Option<T> {
        let history = vec![Message::user(self.render(purpose, vars))];
        self.gateway
            .generate_structured::<T>(history, &self.target(purpose, ModelRole::Check))
            .await
            .value
    }
}
