//! Role types for conversation participants.

use serde::{Deserialize, Serialize};

/// Speaker of a turn in a generation history.
///
/// # Examples
///
/// ```
/// use fabulist_core::Role;
///
/// assert_ne!(Role::User, Role::Assistant);
/// assert_eq!(format!("{}", Role::System), "System");
/// ```
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
)]
pub enum Role {
    /// System messages provide standing instructions
    System,
    /// User messages carry the task for the generator
    User,
    /// Assistant messages are the generator's output
    Assistant,
}
