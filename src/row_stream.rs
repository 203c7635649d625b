//! Single-row streaming over one full-table scan.

use crate::{
    query::{parse_query, Query},
    record::{FromRow, Record, Row},
    session::{ScopedSession, Session, SessionProvider},
    take::LazySequence,
    Result,
};
use std::{fmt, iter::FusedIterator, marker::PhantomData};

/// Lazy, forward-only sequence of rows from one executed query.
///
/// The stream owns its session for the whole traversal. Each call to `next`
/// pulls exactly one row from the cursor. On exhaustion the cursor is drained
/// and the session released; on a fetch or decode error the session is released
/// and the error is yielded once, after which the stream is finished. Dropping
/// or closing the stream early releases the session as well.
pub struct RowStream<S: Session, T = Record> {
    scope: ScopedSession<S>,
    yielded: u64,
    _item: PhantomData<fn() -> T>,
}

impl<S: Session, T: FromRow> RowStream<S, T> {
    /// Acquire a session from `provider` and execute `query` on it.
    ///
    /// Acquisition and execution failures are returned here, never from `next`.
    pub fn open<P>(provider: &P, query: &Query) -> Result<Self>
    where
        P: SessionProvider<Session = S> + ?Sized,
    {
        Ok(Self {
            scope: ScopedSession::open(provider, query)?,
            yielded: 0,
            _item: PhantomData,
        })
    }

    /// Number of items yielded so far.
    pub fn yielded(&self) -> u64 {
        self.yielded
    }

    /// True once the session has been released.
    pub fn is_closed(&self) -> bool {
        !self.scope.is_open()
    }
}

impl<S: Session, T: FromRow> Iterator for RowStream<S, T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if !self.scope.is_open() {
            return None;
        }

        match self.scope.fetch_one().and_then(|row| row.map(T::from_row).transpose()) {
            Ok(Some(item)) => {
                self.yielded += 1;
                Some(Ok(item))
            }
            Ok(None) => {
                self.scope.finish();
                None
            }
            Err(e) => {
                self.scope.abort();
                Some(Err(e))
            }
        }
    }
}

impl<S: Session, T: FromRow> FusedIterator for RowStream<S, T> {}

impl<S: Session, T: FromRow> LazySequence for RowStream<S, T> {
    fn close(&mut self) -> Result<()> {
        self.scope.close()
    }
}

impl<S: Session, T> fmt::Debug for RowStream<S, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RowStream")
            .field("open", &self.scope.is_open())
            .field("yielded", &self.yielded)
            .finish()
    }
}

/// Stream every record of `table` (`SELECT * FROM <table>`).
pub fn stream_rows<P>(provider: &P, table: &str) -> Result<RowStream<P::Session>>
where
    P: SessionProvider + ?Sized,
{
    RowStream::open(provider, &Query::full_scan(table))
}

/// Stream the `age` column of `table` (`SELECT age FROM <table>`).
pub fn stream_ages<P>(provider: &P, table: &str) -> Result<RowStream<P::Session, u32>>
where
    P: SessionProvider + ?Sized,
{
    RowStream::open(provider, &Query::column(table, "age"))
}

/// Parse `sql` and stream its raw rows.
pub fn stream_query<P>(provider: &P, sql: &str) -> Result<RowStream<P::Session, Row>>
where
    P: SessionProvider + ?Sized,
{
    let query = parse_query(sql)?;
    RowStream::open(provider, &query)
}
