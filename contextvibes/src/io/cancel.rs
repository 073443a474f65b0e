//! Cooperative cancellation shared from command entry down to child processes.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Cloneable cancellation handle.
///
/// `main` trips it from the Ctrl-C handler; the executor observes it while
/// waiting on a child and kills the child when set. The token also counts
/// children currently being waited on, so the handler can tell a child wait
/// (cancel cooperatively) from a prompt or other blocking read (exit).
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
    children: Arc<AtomicUsize>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_canceled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Mark a child process as running until the guard drops.
    pub fn child_guard(&self) -> ChildGuard {
        self.children.fetch_add(1, Ordering::SeqCst);
        ChildGuard {
            children: Arc::clone(&self.children),
        }
    }

    pub fn has_running_child(&self) -> bool {
        self.children.load(Ordering::SeqCst) > 0
    }
}

/// Returned by [`CancelToken::child_guard`].
#[derive(Debug)]
pub struct ChildGuard {
    children: Arc<AtomicUsize>,
}

impl Drop for ChildGuard {
    fn drop(&mut self) {
        self.children.fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_state() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(!clone.is_canceled());
        token.cancel();
        assert!(clone.is_canceled());
    }

    #[test]
    fn child_guard_tracks_running_children() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(!clone.has_running_child());
        let first = token.child_guard();
        let second = token.child_guard();
        assert!(clone.has_running_child());
        drop(first);
        assert!(clone.has_running_child());
        drop(second);
        assert!(!clone.has_running_child());
    }
}
