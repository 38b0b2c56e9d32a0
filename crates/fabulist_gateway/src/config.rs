//! Gateway configuration.

use derive_getters::Getters;
use serde::{Deserialize, Serialize};

/// Bounds and defaults applied to every generator call.
///
/// # Examples
///
/// ```
/// use fabulist_gateway::GatewayConfig;
///
/// let config = GatewayConfig::default().with_timeout_secs(5);
/// assert_eq!(*config.timeout_secs(), 5);
/// assert_eq!(*config.max_structured_attempts(), 3);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters, derive_setters::Setters)]
#[setters(prefix = "with_")]
pub struct GatewayConfig {
    /// Per-call timeout in seconds
    #[serde(default = "default_timeout_secs")]
    timeout_secs: u64,

    /// Attempts allowed for a structured reply, including the first
    #[serde(default = "default_max_structured_attempts")]
    max_structured_attempts: u32,

    /// Seed of the first call; later calls advance from it
    #[serde(default = "default_base_seed")]
    base_seed: u64,

    /// Default token budget per call
    #[serde(default)]
    max_tokens: Option<u32>,

    /// Budget of the length retry when no per-call budget is set
    #[serde(default = "default_retry_max_tokens")]
    retry_max_tokens: u32,

    /// Sampling temperature passed to the generator
    #[serde(default)]
    temperature: Option<f32>,
}

fn default_timeout_secs() -> u64 {
    300
}

fn default_max_structured_attempts() -> u32 {
    3
}

fn default_base_seed() -> u64 {
    42
}

fn default_retry_max_tokens() -> u32 {
    8192
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            max_structured_attempts: default_max_structured_attempts(),
            base_seed: default_base_seed(),
            max_tokens: None,
            retry_max_tokens: default_retry_max_tokens(),
            temperature: None,
        }
    }
}
