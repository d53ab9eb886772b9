//! Cooperative cancellation for background workers.
//!
//! A worker polls its token between units of work (a purge cycle, a sleep
//! slice) and exits once it is set.  Tokens are one-shot: a new worker
//! always gets a fresh token, so cancelling an old worker never affects a
//! newer one.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Clone, Debug)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Signal cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_token_lifecycle() {
        let token = CancelToken::new();
        assert!(!token.is_cancelled());
        token.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn clones_share_state() {
        let token = CancelToken::default();
        let worker_side = token.clone();
        token.cancel();
        assert!(worker_side.is_cancelled());
    }

    #[test]
    fn fresh_tokens_are_independent() {
        let old = CancelToken::new();
        old.cancel();
        let new = CancelToken::new();
        assert!(!new.is_cancelled());
    }
}
