//! Message types for generation history.

use crate::Role;
use serde::{Deserialize, Serialize};

/// One role-tagged turn in a generation history.
///
/// # Examples
///
/// ```
/// use fabulist_core::{Message, Role};
///
/// let message = Message::user("Write the opening scene.");
/// assert_eq!(message.role, Role::User);
/// assert!(message.content.contains("opening"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// The role of the message sender
    pub role: Role,
    /// The text of the turn
    pub content: String,
}

impl Message {
    /// Create a message with an explicit role.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Create an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}
