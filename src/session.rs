//! Session provider seam
//!
//! The streaming core never talks to storage directly. It acquires a
//! [`Session`] from a [`SessionProvider`], executes a [`Query`] to get a
//! [`ResultCursor`], pulls rows from the cursor and finally releases the
//! session. [`ScopedSession`] ties those steps to a single owner so that the
//! release happens exactly once on every exit path.

use crate::{query::Query, record::Row, Result};
use tracing::{debug, warn};

/// Upper bound for the capacity reserved by the default `fetch_many`.
const FETCH_CAPACITY_HINT: usize = 1024;

/// Hands out live read sessions.
pub trait SessionProvider {
    type Session: Session;

    /// Open a new session. Fails with [`crate::Error::Acquisition`] when the
    /// data source is unreachable.
    fn acquire(&self) -> Result<Self::Session>;
}

impl<P: SessionProvider + ?Sized> SessionProvider for &P {
    type Session = P::Session;

    fn acquire(&self) -> Result<Self::Session> {
        (**self).acquire()
    }
}

/// A live handle able to execute queries.
pub trait Session {
    type Cursor: ResultCursor;

    fn execute(&mut self, query: &Query) -> Result<Self::Cursor>;

    /// Release the session. Must be idempotent.
    fn release(&mut self) -> Result<()>;
}

/// Forward-only iterator over the rows of one executed query.
pub trait ResultCursor {
    /// Next row, or `None` at end of data.
    fn fetch_one(&mut self) -> Result<Option<Row>>;

    /// Up to `n` rows; shorter (possibly empty) near the end of data.
    fn fetch_many(&mut self, n: usize) -> Result<Vec<Row>> {
        let mut rows = Vec::with_capacity(n.min(FETCH_CAPACITY_HINT));
        while rows.len() < n {
            match self.fetch_one()? {
                Some(row) => rows.push(row),
                None => break,
            }
        }
        Ok(rows)
    }

    /// Discard whatever is left, returning the number of rows skipped.
    fn drain(&mut self) -> Result<u64> {
        let mut drained = 0;
        while self.fetch_one()?.is_some() {
            drained += 1;
        }
        Ok(drained)
    }

    /// Close the cursor. Must be idempotent.
    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// A session and the cursor of the one query it executed, released together.
///
/// Dropping the scope closes it; `close` may also be called explicitly and any
/// number of times. Release failures on the drop path are logged.
pub(crate) struct ScopedSession<S: Session> {
    session: Option<S>,
    cursor: Option<S::Cursor>,
}

impl<S: Session> ScopedSession<S> {
    /// Acquire a session from `provider` and execute `query` on it.
    ///
    /// If execution fails the session is released before the error is returned.
    pub(crate) fn open<P>(provider: &P, query: &Query) -> Result<Self>
    where
        P: SessionProvider<Session = S> + ?Sized,
    {
        let session = provider.acquire()?;
        let mut scope = Self {
            session: Some(session),
            cursor: None,
        };
        debug!(%query, "executing");

        if let Some(session) = scope.session.as_mut() {
            match session.execute(query) {
                Ok(cursor) => scope.cursor = Some(cursor),
                Err(e) => {
                    scope.abort();
                    return Err(e);
                }
            }
        }
        Ok(scope)
    }

    pub(crate) fn is_open(&self) -> bool {
        self.session.is_some()
    }

    /// Next row, `None` once the scope is closed.
    pub(crate) fn fetch_one(&mut self) -> Result<Option<Row>> {
        match self.cursor.as_mut() {
            Some(cursor) => cursor.fetch_one(),
            None => Ok(None),
        }
    }

    /// Up to `n` rows, empty once the scope is closed.
    pub(crate) fn fetch_many(&mut self, n: usize) -> Result<Vec<Row>> {
        match self.cursor.as_mut() {
            Some(cursor) => cursor.fetch_many(n),
            None => Ok(Vec::new()),
        }
    }

    /// Close the cursor, then release the session.
    ///
    /// Both steps run even if the first fails; the first failure is returned.
    pub(crate) fn close(&mut self) -> Result<()> {
        let cursor_result = match self.cursor.take() {
            Some(mut cursor) => cursor.close(),
            None => Ok(()),
        };
        let session_result = match self.session.take() {
            Some(mut session) => {
                let result = session.release();
                debug!(ok = result.is_ok(), "session released");
                result
            }
            None => Ok(()),
        };
        cursor_result.and(session_result)
    }

    /// Normal exhaustion: drain any cursor remnants, then release.
    pub(crate) fn finish(&mut self) {
        if let Some(cursor) = self.cursor.as_mut() {
            match cursor.drain() {
                Ok(0) => {}
                Ok(drained) => debug!(drained, "drained unread rows before release"),
                Err(e) => warn!(error = %e, "failed to drain cursor before release"),
            }
        }
        self.abort();
    }

    /// Release after an early stop or a primary error; release failures are
    /// logged so they never replace the error the caller sees.
    pub(crate) fn abort(&mut self) {
        if let Err(e) = self.close() {
            warn!(error = %e, "failed to release session");
        }
    }
}

impl<S: Session> Drop for ScopedSession<S> {
    fn drop(&mut self) {
        self.abort();
    }
}
