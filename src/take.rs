//! Bounded consumption of lazy sequences.

use crate::Result;
use std::iter::FusedIterator;

/// An iterator that may hold a session and can be closed before it is drained.
///
/// `close` must be idempotent. Dropping a sequence has the same effect as
/// closing it; `close` exists so callers can release early and observe release
/// failures.
pub trait LazySequence: Iterator {
    fn close(&mut self) -> Result<()>;
}

impl<L: LazySequence + ?Sized> LazySequence for &mut L {
    fn close(&mut self) -> Result<()> {
        (**self).close()
    }
}

/// Yields at most `n` items of `sequence`.
///
/// The wrapped sequence is closed as soon as the `n`-th item has been handed
/// out, so a session it holds is released without draining the remaining rows.
/// Dropping the `Take` earlier closes it too, even when it only borrows the
/// sequence. With `n == 0` nothing is pulled.
pub fn take<S: LazySequence>(sequence: S, n: usize) -> Take<S> {
    Take {
        inner: sequence,
        remaining: n,
        closed: false,
    }
}

/// Iterator returned by [`take`].
#[derive(Debug)]
pub struct Take<S: LazySequence> {
    inner: S,
    remaining: usize,
    closed: bool,
}

impl<S: LazySequence> Take<S> {
    /// Items still allowed through.
    pub fn remaining(&self) -> usize {
        self.remaining
    }

    fn close_inner(&mut self) {
        if !self.closed {
            self.closed = true;
            if let Err(e) = self.inner.close() {
                tracing::warn!(error = %e, "failed to close truncated sequence");
            }
        }
    }
}

impl<S: LazySequence> Iterator for Take<S> {
    type Item = S::Item;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            self.close_inner();
            return None;
        }

        match self.inner.next() {
            Some(item) => {
                self.remaining -= 1;
                if self.remaining == 0 {
                    self.close_inner();
                }
                Some(item)
            }
            None => {
                self.remaining = 0;
                self.closed = true;
                None
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.remaining == 0 {
            return (0, Some(0));
        }
        let (lower, upper) = self.inner.size_hint();
        (
            lower.min(self.remaining),
            Some(upper.map_or(self.remaining, |u| u.min(self.remaining))),
        )
    }
}

impl<S: LazySequence> FusedIterator for Take<S> {}

impl<S: LazySequence> Drop for Take<S> {
    fn drop(&mut self) {
        self.close_inner();
    }
}

impl<S: LazySequence> LazySequence for Take<S> {
    fn close(&mut self) -> Result<()> {
        self.remaining = 0;
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.inner.close()
    }
}

/// Method form of [`take`].
pub trait LazySequenceExt: LazySequence + Sized {
    fn bounded(self, n: usize) -> Take<Self> {
        take(self, n)
    }
}

impl<S: LazySequence> LazySequenceExt for S {}
