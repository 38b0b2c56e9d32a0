//! Reply types returned by the gateway contracts.

use fabulist_core::Message;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Why a generator call produced no usable text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display)]
pub enum FailureKind {
    /// The call exceeded its timeout
    #[display("timeout")]
    Timeout,
    /// The driver reported an error
    #[display("transport")]
    Transport,
    /// The generator answered with nothing
    #[display("empty")]
    Empty,
}

/// In-band description of a failed generator call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_more::Display)]
#[display("{} failure: {}", kind, message)]
pub struct GenerationFailure {
    /// Failure category
    pub kind: FailureKind,
    /// Human-readable detail
    pub message: String,
}

impl GenerationFailure {
    /// Create a failure of the given kind.
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Outcome of one text generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Reply {
    /// Generated text
    Text(String),
    /// The call failed; nothing was generated
    Failed(GenerationFailure),
}

impl Reply {
    /// The generated text, if any.
    pub fn text(&self) -> Option<&str> {
        match self {
            Reply::Text(text) => Some(text),
            Reply::Failed(_) => None,
        }
    }

    /// Whether the call failed.
    pub fn is_failed(&self) -> bool {
        matches!(self, Reply::Failed(_))
    }

    /// Consume the reply, keeping only usable text.
    pub fn into_text(self) -> Option<String> {
        match self {
            Reply::Text(text) => Some(text),
            Reply::Failed(_) => None,
        }
    }
}

/// Result of the text contract.
#[derive(Debug, Clone, PartialEq)]
pub struct TextExchange {
    /// The history that produced the reply, with the reply appended when it is text
    pub history: Vec<Message>,
    /// Last attempt, possibly short
    pub reply: Reply,
}

impl TextExchange {
    /// The reply text, if the last attempt produced any.
    pub fn text(&self) -> Option<&str> {
        self.reply.text()
    }
}

/// Result of the structured contract.
#[derive(Debug, Clone, PartialEq)]
pub struct StructuredExchange<T> {
    /// The history that produced the value
    pub history: Vec<Message>,
    /// Parsed value, or `None` once every attempt failed
    pub value: Option<T>,
}

/// A JSON object shape a call site expects back from the generator.
///
/// `REQUIRED_FIELDS` are checked on the raw object before deserialization so
/// the correction turn can name the exact field that is missing.
///
/// # Examples
///
/// ```
/// use fabulist_gateway::StructuredReply;
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct Verdict {
///     is_complete: bool,
/// }
///
/// impl StructuredReply for Verdict {
///     const REQUIRED_FIELDS: &'static [&'static str] = &["is_complete"];
/// }
/// ```
pub trait StructuredReply: DeserializeOwned + Send {
    /// Fields that must be present and non-null
    const REQUIRED_FIELDS: &'static [&'static str];
}
