#![forbid(unsafe_code)]

//! Liveness flags for in-flight resolutions.
//!
//! Every resolution the [`SequentialResolver`](crate::resolver::SequentialResolver)
//! starts captures a [`CancellationToken`]. Cancelling its
//! [`CancellationSource`] sends nothing to the work itself; the flag is only
//! advisory. A task may poll it to skip work nobody will read, and the
//! resolver checks it again when the result comes back and discards the
//! result if the flag is set.
//!
//! # Example
//!
//! ```
//! use overlay_runtime::cancellation::{CancelReason, CancellationSource};
//!
//! let source = CancellationSource::new();
//! let token = source.token();
//! assert!(!token.is_cancelled());
//!
//! source.cancel(CancelReason::Superseded);
//! assert!(token.is_cancelled());
//! assert_eq!(token.reason(), Some(CancelReason::Superseded));
//! ```

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use web_time::Duration;

/// Why a resolution stopped mattering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CancelReason {
    /// A different event became the resolution target.
    Superseded,
    /// The owning session was torn down.
    TornDown,
    /// The event list emptied and the cache was reset.
    Reset,
}

impl CancelReason {
    /// Short label for logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Superseded => "superseded",
            Self::TornDown => "torn-down",
            Self::Reset => "reset",
        }
    }
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A cloneable view of a liveness flag.
#[derive(Clone)]
pub struct CancellationToken {
    inner: Arc<CancellationInner>,
}

/// The control side of a liveness flag.
///
/// Dropping the source does **not** cancel its tokens.
pub struct CancellationSource {
    inner: Arc<CancellationInner>,
}

struct CancellationInner {
    cancelled: AtomicBool,
    reason: Mutex<Option<CancelReason>>,
    notify: (Mutex<()>, Condvar),
}

impl CancellationSource {
    /// Create a source whose tokens start live.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(CancellationInner {
                cancelled: AtomicBool::new(false),
                reason: Mutex::new(None),
                notify: (Mutex::new(()), Condvar::new()),
            }),
        }
    }

    /// Obtain a token that observes this source.
    pub fn token(&self) -> CancellationToken {
        CancellationToken {
            inner: Arc::clone(&self.inner),
        }
    }

    /// Flip the flag. The first reason wins; later calls are no-ops.
    pub fn cancel(&self, reason: CancelReason) {
        {
            let mut slot = self
                .inner
                .reason
                .lock()
                .unwrap_or_else(|e| e.into_inner());
            if slot.is_some() {
                return;
            }
            *slot = Some(reason);
        }
        self.inner.cancelled.store(true, Ordering::Release);
        let (lock, cvar) = &self.inner.notify;
        let _guard = lock.lock().unwrap_or_else(|e| e.into_inner());
        cvar.notify_all();
    }

    /// Whether the flag has been flipped.
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::Acquire)
    }

    /// Reason given to the first [`cancel`](Self::cancel) call.
    pub fn reason(&self) -> Option<CancelReason> {
        self.inner.reason()
    }
}

impl Default for CancellationSource {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CancellationSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancellationSource")
            .field("reason", &self.reason())
            .finish()
    }
}

impl CancellationInner {
    fn reason(&self) -> Option<CancelReason> {
        *self.reason.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl CancellationToken {
    /// Returns `true` once the source has been cancelled.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::Acquire)
    }

    /// Why the source was cancelled, if it was.
    pub fn reason(&self) -> Option<CancelReason> {
        self.inner.reason()
    }

    /// Block until cancellation or until `duration` elapses.
    ///
    /// Returns `true` if cancelled, `false` if timed out. Retry backoff
    /// sleeps through this so a superseded resolution stops waiting early.
    pub fn wait_timeout(&self, duration: Duration) -> bool {
        if self.is_cancelled() {
            return true;
        }
        let (lock, cvar) = &self.inner.notify;
        let mut guard = lock.lock().unwrap_or_else(|e| e.into_inner());
        let start = web_time::Instant::now();
        let mut remaining = duration;
        loop {
            if self.is_cancelled() {
                return true;
            }
            let (new_guard, result) = cvar
                .wait_timeout(guard, remaining)
                .unwrap_or_else(|e| e.into_inner());
            guard = new_guard;
            if self.is_cancelled() {
                return true;
            }
            if result.timed_out() {
                return false;
            }
            let elapsed = start.elapsed();
            if elapsed >= duration {
                return false;
            }
            remaining = duration - elapsed;
        }
    }
}

impl fmt::Debug for CancellationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancellationToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn token_starts_live() {
        let source = CancellationSource::new();
        let token = source.token();
        assert!(!token.is_cancelled());
        assert!(!source.is_cancelled());
        assert_eq!(token.reason(), None);
    }

    #[test]
    fn cancel_reaches_every_clone() {
        let source = CancellationSource::new();
        let t1 = source.token();
        let t2 = t1.clone();
        source.cancel(CancelReason::TornDown);
        assert!(t1.is_cancelled());
        assert!(t2.is_cancelled());
        assert_eq!(t2.reason(), Some(CancelReason::TornDown));
    }

    #[test]
    fn first_reason_wins() {
        let source = CancellationSource::new();
        source.cancel(CancelReason::Superseded);
        source.cancel(CancelReason::TornDown);
        assert_eq!(source.reason(), Some(CancelReason::Superseded));
    }

    #[test]
    fn drop_source_does_not_cancel() {
        let source = CancellationSource::new();
        let token = source.token();
        drop(source);
        assert!(!token.is_cancelled());
    }

    #[test]
    fn wait_timeout_short_circuits_when_cancelled() {
        let source = CancellationSource::new();
        let token = source.token();
        source.cancel(CancelReason::Reset);
        assert!(token.wait_timeout(Duration::from_secs(10)));
    }

    #[test]
    fn wait_timeout_times_out() {
        let source = CancellationSource::new();
        assert!(!source.token().wait_timeout(Duration::from_millis(10)));
    }

    #[test]
    fn wait_timeout_wakes_on_cancel() {
        let source = CancellationSource::new();
        let token = source.token();
        let waiter = thread::spawn(move || token.wait_timeout(Duration::from_secs(10)));
        thread::sleep(std::time::Duration::from_millis(20));
        source.cancel(CancelReason::Superseded);
        assert!(waiter.join().unwrap());
    }

    #[test]
    fn reason_labels() {
        assert_eq!(CancelReason::Superseded.to_string(), "superseded");
        assert_eq!(CancelReason::TornDown.as_str(), "torn-down");
        assert_eq!(CancelReason::Reset.as_str(), "reset");
    }
}
