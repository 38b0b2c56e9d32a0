//! Output types from generator responses.

use serde::{Deserialize, Serialize};

/// Supported output types from a generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Output {
    /// Plain text output.
    Text(String),

    /// Structured JSON output, for generators with a native JSON mode.
    Json(serde_json::Value),
}
