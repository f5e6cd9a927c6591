//! Cooperative cancellation shared by every fetch task in a job.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Write-once abort flag polled by fetch tasks at each event boundary.
///
/// The flag only ever transitions `false -> true` and is never reset. It is
/// advisory: once set, a task stops buffering, emitting and resolving at its
/// next event boundary, but the underlying connection is not forcibly closed.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation. Idempotent.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_clear() {
        assert!(!CancelToken::new().is_cancelled());
    }

    #[test]
    fn test_cancel_is_sticky_and_idempotent() {
        let token = CancelToken::new();
        token.cancel();
        token.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_clones_share_the_flag() {
        let token = CancelToken::new();
        let seen_by_task = token.clone();
        token.cancel();
        assert!(seen_by_task.is_cancelled());
    }
}
