use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::foundation::error::{ReelError, ReelResult};

/// Shared abort flag checked between suspension points.
///
/// Clones observe the same flag.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Fresh, uncancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// `true` once [`CancelToken::cancel`] was called on any clone.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    /// Fail with [`ReelError::Cancelled`] when cancellation was requested.
    pub fn check(&self, at: &str) -> ReelResult<()> {
        if self.is_cancelled() {
            return Err(ReelError::cancelled(format!("job cancelled before {at}")));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/job/cancel.rs"]
mod tests;
