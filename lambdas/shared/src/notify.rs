//! Best-effort side effects
//!
//! Email and analytics failures must never turn a completed registration
//! into an error response. Every non-essential outbound call goes
//! through `best_effort`, which logs the outcome and swallows failures.

use std::future::Future;
use tracing::{debug, warn};

use crate::errors::Result;

/// Await a side-effect future; log and discard its error, if any.
pub async fn best_effort<T, F>(label: &str, fut: F)
where
    F: Future<Output = Result<T>>,
{
    match fut.await {
        Ok(_) => debug!(side_effect = label, "side effect completed"),
        Err(e) => warn!(side_effect = label, error = %e, "side effect failed, continuing"),
    }
}
