//! Cooperative halting: cancellation cells, cancellation tokens and deadlines.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

/// Operations between two samples of the halt conditions.
const CHECK_INTERVAL: usize = 100;

/// A shared cell that cancels the parse once it holds a non-zero value.
///
/// Clones share the same cell, so a handle can be moved to another thread
/// and set while [`Parser::parse`](crate::Parser::parse) runs.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicUsize>);

impl CancellationFlag {
    pub fn new(value: usize) -> Self {
        Self(Arc::new(AtomicUsize::new(value)))
    }

    pub fn get(&self) -> usize {
        self.0.load(Ordering::Relaxed)
    }

    pub fn set(&self, value: usize) {
        self.0.store(value, Ordering::Relaxed);
    }

    pub fn cancel(&self) {
        self.set(1);
    }

    pub fn is_cancelled(&self) -> bool {
        self.get() != 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum HaltReason {
    Cancelled,
    TimedOut,
}

impl HaltReason {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Cancelled => "cancelled",
            Self::TimedOut => "timed out",
        }
    }
}

/// Work abandoned because the parse halted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Halted;

/// Per-parse halt state. Once halted it stays halted.
#[derive(Debug)]
pub(crate) struct Halt<'a> {
    flag: Option<&'a CancellationFlag>,
    token: Option<&'a CancellationToken>,
    deadline: Option<Instant>,
    operations: usize,
    reason: Option<HaltReason>,
}

impl<'a> Halt<'a> {
    pub(crate) fn new(
        flag: Option<&'a CancellationFlag>,
        token: Option<&'a CancellationToken>,
        timeout_micros: u64,
    ) -> Self {
        let deadline = (timeout_micros > 0)
            .then(|| Instant::now().checked_add(Duration::from_micros(timeout_micros)))
            .flatten();
        Self {
            flag,
            token,
            deadline,
            operations: 0,
            reason: None,
        }
    }

    /// Sample every halt condition now.
    pub(crate) fn check(&mut self) -> bool {
        if self.reason.is_some() {
            return true;
        }
        let cancelled = self.flag.is_some_and(CancellationFlag::is_cancelled)
            || self.token.is_some_and(CancellationToken::is_cancelled);
        if cancelled {
            self.reason = Some(HaltReason::Cancelled);
        } else if self.deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            self.reason = Some(HaltReason::TimedOut);
        }
        self.reason.is_some()
    }

    /// Count one operation, sampling the conditions every [`CHECK_INTERVAL`].
    pub(crate) fn tick(&mut self) -> bool {
        if self.reason.is_some() {
            return true;
        }
        self.operations += 1;
        if self.operations % CHECK_INTERVAL == 0 {
            return self.check();
        }
        false
    }

    pub(crate) fn is_halted(&self) -> bool {
        self.reason.is_some()
    }

    pub(crate) fn reason(&self) -> Option<HaltReason> {
        self.reason
    }
}
