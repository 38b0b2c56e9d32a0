//! Generator capability trait.

use async_trait::async_trait;
use fabulist_core::{GenerateRequest, GenerateResponse};
use fabulist_error::FabulistResult;

/// Core trait every generator backend implements.
///
/// Backends report transport problems as errors; the gateway turns every
/// error into an in-band failure reply, so implementations never need their
/// own retry logic.
#[async_trait]
pub trait FabulistDriver: Send + Sync {
    /// Generate output for the given history and options.
    async fn generate(&self, req: &GenerateRequest) -> FabulistResult<GenerateResponse>;

    /// Provider name (e.g., "ollama", "openai").
    fn provider_name(&self) -> &'static str;

    /// Default model identifier used when a request names none.
    fn model_name(&self) -> &str;
}
