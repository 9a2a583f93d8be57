//! Cooperative cancellation shared between callers and worker threads

use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

struct Inner {
    canceled: Mutex<bool>,
    cond: Condvar,
    children: Mutex<Vec<Weak<Inner>>>,
}

impl Inner {
    fn new(canceled: bool) -> Arc<Self> {
        Arc::new(Self {
            canceled: Mutex::new(canceled),
            cond: Condvar::new(),
            children: Mutex::new(Vec::new()),
        })
    }

    fn cancel(&self) {
        {
            let mut canceled = self.canceled.lock();
            if *canceled {
                return;
            }
            *canceled = true;
        }
        self.cond.notify_all();

        let children = std::mem::take(&mut *self.children.lock());
        for child in children.iter().filter_map(Weak::upgrade) {
            child.cancel();
        }
    }
}

/// Cancellation signal
///
/// Clones share the same state. A token created with [`CancelToken::child`]
/// is canceled together with its parent but can also be canceled on its own
/// without affecting the parent.
#[derive(Clone)]
pub struct CancelToken {
    inner: Arc<Inner>,
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancelToken")
            .field("canceled", &self.is_canceled())
            .finish()
    }
}

impl CancelToken {
    pub fn new() -> Self {
        Self {
            inner: Inner::new(false),
        }
    }

    /// A token that is never canceled by anyone else
    pub fn none() -> Self {
        Self::new()
    }

    /// Request cancellation; wakes every waiter, idempotent
    pub fn cancel(&self) {
        self.inner.cancel();
    }

    pub fn is_canceled(&self) -> bool {
        *self.inner.canceled.lock()
    }

    /// Create a token canceled whenever `self` is
    pub fn child(&self) -> CancelToken {
        let parent_canceled = self.is_canceled();
        let child = Inner::new(parent_canceled);
        if !parent_canceled {
            let mut children = self.inner.children.lock();
            children.retain(|c| c.strong_count() > 0);
            children.push(Arc::downgrade(&child));
        }
        // Parent may have been canceled between the check and the registration
        if self.is_canceled() {
            child.cancel();
        }
        CancelToken { inner: child }
    }

    /// Sleep for `timeout` unless canceled first
    ///
    /// Returns `true` if the token is canceled.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut canceled = self.inner.canceled.lock();
        while !*canceled {
            if self.inner.cond.wait_until(&mut canceled, deadline).timed_out() {
                break;
            }
        }
        *canceled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_cancel_is_shared_by_clones() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(!clone.is_canceled());
        token.cancel();
        assert!(clone.is_canceled());
    }

    #[test]
    fn test_child_follows_parent() {
        let parent = CancelToken::new();
        let child = parent.child();
        parent.cancel();
        assert!(child.is_canceled());
    }

    #[test]
    fn test_child_cancel_does_not_reach_parent() {
        let parent = CancelToken::new();
        let child = parent.child();
        child.cancel();
        assert!(child.is_canceled());
        assert!(!parent.is_canceled());
    }

    #[test]
    fn test_child_of_canceled_parent() {
        let parent = CancelToken::new();
        parent.cancel();
        assert!(parent.child().is_canceled());
    }

    #[test]
    fn test_wait_timeout_elapses() {
        let token = CancelToken::new();
        let start = Instant::now();
        assert!(!token.wait_timeout(Duration::from_millis(20)));
        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn test_wait_timeout_wakes_on_cancel() {
        let token = CancelToken::new();
        let waiter = token.clone();
        let start = Instant::now();
        let handle = thread::spawn(move || waiter.wait_timeout(Duration::from_secs(10)));
        thread::sleep(Duration::from_millis(20));
        token.cancel();
        assert!(handle.join().unwrap());
        assert!(start.elapsed() < Duration::from_secs(5));
    }
}
