//! Extraction of JSON objects from free-form generator output.
//!
//! Generators wrap JSON in markdown fences or surround it with prose. The
//! extractor prefers a fenced block, then falls back to the text itself,
//! taking the first balanced `{ ... }` that parses as JSON.

use crate::StructuredReply;
use serde_json::Value;

/// Why a reply failed the structured contract.
///
/// The `Display` text is sent back to the generator in the correction turn.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum ContractViolation {
    /// The generator call itself failed
    #[display("the previous request failed ({})", _0)]
    Generation(String),
    /// No `{ ... }` anywhere in the reply
    #[display("no JSON object was found in the response")]
    NoObject,
    /// The candidate text is not valid JSON
    #[display("the JSON could not be parsed: {}", _0)]
    Malformed(String),
    /// A required field is absent or null
    #[display("the required field \"{}\" is missing", _0)]
    MissingField(String),
    /// Fields present but of the wrong shape
    #[display("the JSON object has the wrong shape: {}", _0)]
    Mismatch(String),
}

/// Extract and parse the first JSON object in a response.
///
/// Stray braces in prose before the object are skipped.
///
/// # Errors
///
/// Returns a [`ContractViolation`] when no object can be found or parsed.
///
/// # Examples
///
/// ```
/// use fabulist_gateway::extract_object;
///
/// let response = "Sure! Here it is:\n```json\n{\"total_chapters\": 5}\n```\nAnything else?";
/// let value = extract_object(response).unwrap();
/// assert_eq!(value["total_chapters"], 5);
///
/// let inline = "The verdict is {\"is_complete\": true, \"reason\": \"ends {cleanly}\"} overall.";
/// assert_eq!(extract_object(inline).unwrap()["is_complete"], true);
/// ```
pub fn extract_object(response: &str) -> Result<Value, ContractViolation> {
    let fenced = extract_from_code_block(response);
    let mut first_error = None;

    for source in fenced.as_deref().into_iter().chain(std::iter::once(response)) {
        for (start, _) in source.match_indices('{') {
            let Some(candidate) = extract_balanced(&source[start..]) else {
                continue;
            };
            match serde_json::from_str(candidate) {
                Ok(value) => return Ok(value),
                Err(e) => {
                    first_error.get_or_insert(ContractViolation::Malformed(e.to_string()));
                }
            }
        }
    }

    Err(first_error.unwrap_or(ContractViolation::NoObject))
}

/// Extract a response into a typed reply, checking required fields first.
///
/// # Errors
///
/// Returns the first [`ContractViolation`] found.
pub fn parse_reply<T: StructuredReply>(response: &str) -> Result<T, ContractViolation> {
    let value = extract_object(response)?;
    if let Some(missing) = T::REQUIRED_FIELDS
        .iter()
        .find(|field| value.get(**field).is_none_or(Value::is_null))
    {
        return Err(ContractViolation::MissingField((*missing).to_string()));
    }
    serde_json::from_value(value).map_err(|e| ContractViolation::Mismatch(e.to_string()))
}

/// Content of the first markdown code block, with or without a language tag.
fn extract_from_code_block(response: &str) -> Option<String> {
    let start = response.find("```")?;
    let content_start = start + 3;
    let skip_to = response[content_start..]
        .find('\n')
        .map(|n| content_start + n + 1)
        .unwrap_or(content_start);

    match response[skip_to..].find("```") {
        Some(end) => Some(response[skip_to..skip_to + end].trim().to_string()),
        // Unclosed fence: the reply was likely truncated
        None => Some(response[skip_to..].trim().to_string()),
    }
}

/// The first balanced `{ ... }`, ignoring braces inside JSON strings.
fn extract_balanced(response: &str) -> Option<&str> {
    let start = response.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, ch) in response[start..].char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }

        match ch {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&response[start..start + i + 1]);
                }
            }
            _ => {}
        }
    }

    None
}
