//! Small async helpers shared across the crate.

/// Retry with linear backoff
pub mod retry;

pub use retry::with_retry_if;
