//! Chat-completion backends for Catalogist.
//!
//! All backends implement the `catalogist_core::Provider` trait. The router
//! builds the configured backend wrapped in the retry policy.

pub mod openai_compat;
pub mod retry;
pub mod router;

pub use openai_compat::OpenAiCompatProvider;
pub use retry::{RetryPolicy, RetryingProvider};
pub use router::build_from_config;
