//! The generation gateway.

use crate::{
    ContractViolation, FailureKind, GatewayConfig, GenerationFailure, Reply, SeedPolicy,
    StructuredExchange, StructuredReply, TextExchange, parse_reply,
};
use derive_getters::Getters;
use fabulist_core::{GenerateRequest, Message, PromptTemplates, TemplatePurpose, word_count};
use fabulist_interface::{FabulistDriver, Interaction, NonInteractive, RetryDecision, RetryOffer};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Where a call goes and what it is for.
///
/// # Examples
///
/// ```
/// use fabulist_gateway::Target;
///
/// let target = Target::new("critique-style").with_model(Some("writer-70b".to_string()));
/// assert_eq!(target.purpose(), "critique-style");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Getters, derive_setters::Setters)]
#[setters(prefix = "with_")]
pub struct Target {
    /// Purpose label, used for tracing and by drivers that route on it
    purpose: String,
    /// Generator identifier; the driver's default when `None`
    model: Option<String>,
    /// Token budget overriding the gateway default
    max_tokens: Option<u32>,
}

impl Target {
    /// Target the driver's default model for a purpose.
    pub fn new(purpose: impl Into<String>) -> Self {
        Self {
            purpose: purpose.into(),
            model: None,
            max_tokens: None,
        }
    }

    /// Target a purpose from the template registry.
    pub fn for_purpose(purpose: TemplatePurpose) -> Self {
        Self::new(purpose.as_ref())
    }
}

/// Validated-retry wrapper around a generator driver.
///
/// Calls are issued one at a time and awaited before the next; the only
/// state kept across calls is the [`SeedPolicy`].
pub struct Gateway {
    driver: Arc<dyn FabulistDriver>,
    config: GatewayConfig,
    templates: Arc<PromptTemplates>,
    seeds: SeedPolicy,
    interaction: Box<dyn Interaction>,
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway")
            .field("provider", &self.driver.provider_name())
            .field("model", &self.driver.model_name())
            .field("config", &self.config)
            .field("seeds", &self.seeds)
            .finish()
    }
}

impl Gateway {
    /// Create a gateway in batch mode.
    pub fn new(
        driver: Arc<dyn FabulistDriver>,
        config: GatewayConfig,
        templates: Arc<PromptTemplates>,
    ) -> Self {
        let seeds = SeedPolicy::new(*config.base_seed());
        debug!(
            provider = driver.provider_name(),
            model = driver.model_name(),
            timeout_secs = config.timeout_secs(),
            "Creating gateway"
        );
        Self {
            driver,
            config,
            templates,
            seeds,
            interaction: Box::new(NonInteractive),
        }
    }

    /// Let a human force extra retries of short text replies.
    pub fn with_interaction(mut self, interaction: Box<dyn Interaction>) -> Self {
        self.interaction = interaction;
        self
    }

    /// Gateway configuration.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Prompt templates shared with the gateway.
    pub fn templates(&self) -> &PromptTemplates {
        &self.templates
    }

    /// Generate text of at least `min_words` words.
    ///
    /// An empty, short or failed reply is discarded and retried exactly once
    /// with a follow-up demanding the length, a fresh seed and a larger token
    /// budget: double the first one, or `retry_max_tokens` when the first
    /// call ran without a budget. If that is still short, the attached [`Interaction`]
    /// may force more attempts; otherwise the last attempt is returned as-is.
    #[instrument(skip(self, history, target), fields(purpose = %target.purpose()))]
    pub async fn generate_text(
        &self,
        history: Vec<Message>,
        target: &Target,
        min_words: usize,
    ) -> TextExchange {
        let budget = target.max_tokens().or(*self.config.max_tokens());
        let reply = self.invoke(&history, target, budget, false).await;
        if meets_length(&reply, min_words) {
            return finish_text(history, reply);
        }

        warn!(
            purpose = %target.purpose(),
            words = reply_words(&reply),
            min_words,
            failed = reply.is_failed(),
            "Text contract unmet, retrying once"
        );

        let mut retry_history = history;
        retry_history.push(Message::user(self.templates.render(
            TemplatePurpose::RetryLength,
            &[("min_words", &min_words.to_string())],
        )));
        let retry_tokens = Some(retry_budget(budget, *self.config.retry_max_tokens()));

        let mut attempts = 2;
        let mut reply = self.invoke(&retry_history, target, retry_tokens, false).await;
        while !meets_length(&reply, min_words) {
            let offer = RetryOffer::new(
                target.purpose().clone(),
                reply_words(&reply),
                min_words,
                attempts,
            );
            if self.interaction.offer_retry(&offer) == RetryDecision::Accept {
                warn!(
                    purpose = %target.purpose(),
                    words = reply_words(&reply),
                    min_words,
                    "Accepting short text after retry"
                );
                break;
            }
            info!(purpose = %target.purpose(), attempts, "Retry forced by interaction");
            attempts += 1;
            reply = self.invoke(&retry_history, target, retry_tokens, false).await;
        }

        finish_text(retry_history, reply)
    }

    /// Generate a JSON object of shape `T`.
    ///
    /// Each failed attempt is discarded and replaced by a correction turn
    /// naming the exact problem, then retried with a fresh seed, up to the
    /// configured number of attempts. Exhaustion yields `value: None`.
    #[instrument(skip(self, history, target), fields(purpose = %target.purpose()))]
    pub async fn generate_structured<T: StructuredReply>(
        &self,
        history: Vec<Message>,
        target: &Target,
    ) -> StructuredExchange<T> {
        let max_attempts = (*self.config.max_structured_attempts()).max(1);
        let budget = target.max_tokens().or(*self.config.max_tokens());
        let mut working = history.clone();

        for attempt in 1..=max_attempts {
            let reply = self.invoke(&working, target, budget, true).await;
            let violation = match reply {
                Reply::Text(text) => match parse_reply::<T>(&text) {
                    Ok(value) => {
                        working.push(Message::assistant(text));
                        debug!(purpose = %target.purpose(), attempt, "Structured reply accepted");
                        return StructuredExchange {
                            history: working,
                            value: Some(value),
                        };
                    }
                    Err(violation) => violation,
                },
                Reply::Failed(failure) => ContractViolation::Generation(failure.to_string()),
            };

            warn!(
                purpose = %target.purpose(),
                attempt,
                max_attempts,
                error = %violation,
                "Structured contract unmet"
            );

            working = history.clone();
            working.push(Message::user(self.templates.render(
                TemplatePurpose::RetrySchema,
                &[
                    ("error", &violation.to_string()),
                    ("fields", &T::REQUIRED_FIELDS.join(", ")),
                ],
            )));
        }

        warn!(purpose = %target.purpose(), max_attempts, "Structured attempts exhausted");
        StructuredExchange {
            history,
            value: None,
        }
    }

    /// One driver call with a fresh seed; every failure becomes [`Reply::Failed`].
    async fn invoke(
        &self,
        history: &[Message],
        target: &Target,
        max_tokens: Option<u32>,
        structured: bool,
    ) -> Reply {
        let seed = self.seeds.next_seed();
        let request = GenerateRequest {
            messages: history.to_vec(),
            model: target.model().clone(),
            max_tokens,
            temperature: *self.config.temperature(),
            seed: Some(seed),
            structured,
            purpose: Some(target.purpose().clone()),
        };

        let timeout_secs = *self.config.timeout_secs();
        let call = self.driver.generate(&request);
        match tokio::time::timeout(Duration::from_secs(timeout_secs), call).await {
            Err(_) => {
                warn!(purpose = %target.purpose(), timeout_secs, "Generation timed out");
                Reply::Failed(GenerationFailure::new(
                    FailureKind::Timeout,
                    format!("no reply within {}s", timeout_secs),
                ))
            }
            Ok(Err(e)) => {
                warn!(purpose = %target.purpose(), error = %e, "Generation failed");
                Reply::Failed(GenerationFailure::new(FailureKind::Transport, e.to_string()))
            }
            Ok(Ok(response)) => {
                let text = response.text();
                if text.trim().is_empty() {
                    Reply::Failed(GenerationFailure::new(
                        FailureKind::Empty,
                        "generator returned no text",
                    ))
                } else {
                    debug!(purpose = %target.purpose(), seed, words = word_count(&text), "Generated");
                    Reply::Text(text)
                }
            }
        }
    }
}

/// Token budget of the length retry, always larger than the first call's.
fn retry_budget(budget: Option<u32>, fallback: u32) -> u32 {
    match budget {
        Some(tokens) => tokens.saturating_mul(2).max(tokens.saturating_add(1)),
        None => fallback,
    }
}

fn meets_length(reply: &Reply, min_words: usize) -> bool {
    reply.text().is_some_and(|text| word_count(text) >= min_words)
}

fn reply_words(reply: &Reply) -> usize {
    reply.text().map_or(0, word_count)
}

fn finish_text(mut history: Vec<Message>, reply: Reply) -> TextExchange {
    if let Reply::Text(text) = &reply {
        history.push(Message::assistant(text.clone()));
    }
    TextExchange { history, reply }
}
