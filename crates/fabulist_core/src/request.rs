//! Request and response types for generation.

use crate::{Message, Output};
use fabulist_error::{BuilderError, BuilderErrorKind};
use serde::{Deserialize, Serialize};

/// Generation request sent to a driver.
///
/// # Examples
///
/// ```
/// use fabulist_core::{GenerateRequest, Message};
///
/// let request = GenerateRequest::builder()
///     .messages(vec![Message::user("Hello!")])
///     .model("local-13b")
///     .seed(7u64)
///     .build()
///     .unwrap();
///
/// assert_eq!(request.messages.len(), 1);
/// assert_eq!(request.seed, Some(7));
/// assert!(!request.structured);
/// ```
#[derive(
    Debug, Clone, PartialEq, Serialize, Deserialize, Default, derive_builder::Builder,
)]
#[builder(setter(into), default, build_fn(validate = "Self::validate"))]
pub struct GenerateRequest {
    /// The conversation messages to send
    pub messages: Vec<Message>,
    /// Generator identifier to use
    #[builder(setter(into, strip_option))]
    pub model: Option<String>,
    /// Maximum number of tokens to generate
    #[builder(setter(into, strip_option))]
    pub max_tokens: Option<u32>,
    /// Sampling temperature
    #[builder(setter(into, strip_option))]
    pub temperature: Option<f32>,
    /// Sampling seed
    #[builder(setter(into, strip_option))]
    pub seed: Option<u64>,
    /// Ask the generator for a JSON object
    pub structured: bool,
    /// Purpose label of the prompt, for tracing and routing
    #[builder(setter(into, strip_option))]
    pub purpose: Option<String>,
}

impl GenerateRequest {
    /// Creates a new request builder.
    pub fn builder() -> GenerateRequestBuilder {
        GenerateRequestBuilder::default()
    }
}

impl GenerateRequestBuilder {
    fn validate(&self) -> Result<(), String> {
        if self.messages.as_ref().is_none_or(Vec::is_empty) {
            return Err("a request needs at least one message".to_string());
        }
        if let Some(Some(temperature)) = self.temperature
            && !(0.0..=2.0).contains(&temperature)
        {
            return Err(format!("temperature {} is outside 0.0..=2.0", temperature));
        }
        Ok(())
    }
}

impl From<GenerateRequestBuilderError> for BuilderError {
    #[track_caller]
    fn from(err: GenerateRequestBuilderError) -> Self {
        match err {
            GenerateRequestBuilderError::UninitializedField(field) => {
                BuilderError::new(BuilderErrorKind::MissingField(field.to_string()))
            }
            GenerateRequestBuilderError::ValidationError(message) => {
                BuilderError::new(BuilderErrorKind::ValidationFailed(message))
            }
        }
    }
}

/// The unified response object.
///
/// # Examples
///
/// ```
/// use fabulist_core::{GenerateResponse, Output};
///
/// let response = GenerateResponse {
///     outputs: vec![Output::Text("Once upon a time".to_string())],
/// };
/// assert_eq!(response.text(), "Once upon a time");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateResponse {
    /// The generated outputs from the model
    pub outputs: Vec<Output>,
}

impl GenerateResponse {
    /// Concatenate every output into a single text.
    ///
    /// JSON outputs are serialized so structured callers can parse them back.
    pub fn text(&self) -> String {
        self.outputs
            .iter()
            .map(|output| match output {
                Output::Text(text) => text.clone(),
                Output::Json(value) => value.to_string(),
            })
            .collect::<Vec<_>>()
            .join("")
    }
}
