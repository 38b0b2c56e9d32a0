//! Generation gateway for Fabulist.
//!
//! The [`Gateway`] is the only boundary through which the engine asks a
//! generator for output. It wraps every call in one of two contracts:
//!
//! - **Text contract** ([`Gateway::generate_text`]): the reply must reach a
//!   minimum word count. A short or failed reply is discarded and retried
//!   exactly once with a forceful follow-up, a fresh seed and a doubled
//!   token budget.
//! - **Structured contract** ([`Gateway::generate_structured`]): the reply
//!   must contain a JSON object with the fields a [`StructuredReply`] type
//!   requires. Malformed replies are corrected and retried a bounded number
//!   of times; exhaustion yields `None`.
//!
//! Neither contract returns an error. Timeouts and transport failures travel
//! in-band as [`Reply::Failed`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod extraction;
mod gateway;
mod reply;
mod seed;

pub use config::GatewayConfig;
pub use extraction::{ContractViolation, extract_object, parse_reply};
pub use gateway::{Gateway, Target};
pub use reply::{
    FailureKind, GenerationFailure, Reply, StructuredExchange, StructuredReply, TextExchange,
};
pub use seed::SeedPolicy;
