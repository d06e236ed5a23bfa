//! Cooperative cancellation
//!
//! Every store, cache and service call takes a [`CancelToken`]. A token
//! trips when any clone of it is cancelled or when its deadline passes.
//! Implementations check it before touching their backend, and a tripped
//! token ends the call with [`LedgerError::Cancelled`] before anything is
//! committed.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::{LedgerError, LedgerResult};

static NEVER: CancelToken = CancelToken {
    flag: None,
    deadline: None,
};

/// Cancellation flag shared by clones, with an optional deadline
#[derive(Debug, Clone)]
pub struct CancelToken {
    flag: Option<Arc<AtomicBool>>,
    deadline: Option<Instant>,
}

impl CancelToken {
    /// Create a token that trips once [`cancel`](Self::cancel) is called
    pub fn new() -> Self {
        Self {
            flag: Some(Arc::new(AtomicBool::new(false))),
            deadline: None,
        }
    }

    /// A token that never trips, for callers with nothing to cancel
    pub fn none() -> &'static CancelToken {
        &NEVER
    }

    /// Create a token that also trips `timeout` from now
    pub fn with_timeout(timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => Self::new().with_deadline(deadline),
            None => Self::new(),
        }
    }

    /// Trip at `deadline` as well; the earlier of two deadlines wins
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(self.deadline.map_or(deadline, |d| d.min(deadline)));
        self
    }

    /// Deadline, if one was set
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Cancel this token and every clone of it
    ///
    /// Has no effect on [`CancelToken::none`].
    pub fn cancel(&self) {
        if let Some(flag) = &self.flag {
            flag.store(true, Ordering::SeqCst);
        }
    }

    /// True once cancelled or past the deadline
    pub fn is_cancelled(&self) -> bool {
        let flagged = self
            .flag
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::SeqCst));
        flagged || self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// `Err(Cancelled)` once the token has tripped
    pub fn check(&self) -> LedgerResult<()> {
        if self.is_cancelled() {
            Err(LedgerError::Cancelled)
        } else {
            Ok(())
        }
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}
