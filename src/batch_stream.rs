//! Fixed-size batch streaming over one full-table scan.

use crate::{
    query::Query,
    record::{FromRow, Record},
    session::{ScopedSession, Session, SessionProvider},
    take::LazySequence,
    Error, Result,
};
use std::{fmt, iter::FusedIterator};
use tracing::trace;

/// Up to `batch_size` records in scan order; never empty when yielded.
pub type Batch = Vec<Record>;

/// Lazy sequence of batches pulled from one open scan.
///
/// Every batch comes from a bounded fetch on the same cursor, so batches never
/// overlap and concatenate to the full scan. The first empty fetch ends the
/// stream and releases the session.
pub struct BatchStream<S: Session> {
    scope: ScopedSession<S>,
    batch_size: usize,
    batches: u64,
}

impl<S: Session> BatchStream<S> {
    /// Open a full scan of `table`. A zero `batch_size` is rejected before any
    /// session is acquired.
    pub fn open<P>(provider: &P, table: &str, batch_size: usize) -> Result<Self>
    where
        P: SessionProvider<Session = S> + ?Sized,
    {
        if batch_size == 0 {
            return Err(Error::InvalidArgument(
                "batch size must be a positive integer".to_string(),
            ));
        }

        Ok(Self {
            scope: ScopedSession::open(provider, &Query::full_scan(table))?,
            batch_size,
            batches: 0,
        })
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Number of batches yielded so far.
    pub fn batches(&self) -> u64 {
        self.batches
    }

    pub fn is_closed(&self) -> bool {
        !self.scope.is_open()
    }
}

impl<S: Session> Iterator for BatchStream<S> {
    type Item = Result<Batch>;

    fn next(&mut self) -> Option<Self::Item> {
        if !self.scope.is_open() {
            return None;
        }

        let fetched = self.scope.fetch_many(self.batch_size).and_then(|rows| {
            rows.into_iter()
                .map(Record::from_row)
                .collect::<Result<Batch>>()
        });

        match fetched {
            Ok(batch) if batch.is_empty() => {
                self.scope.finish();
                None
            }
            Ok(batch) => {
                self.batches += 1;
                trace!(batch = self.batches, len = batch.len(), "batch fetched");
                Some(Ok(batch))
            }
            Err(e) => {
                self.scope.abort();
                Some(Err(e))
            }
        }
    }
}

impl<S: Session> FusedIterator for BatchStream<S> {}

impl<S: Session> LazySequence for BatchStream<S> {
    fn close(&mut self) -> Result<()> {
        self.scope.close()
    }
}

impl<S: Session> fmt::Debug for BatchStream<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchStream")
            .field("open", &self.scope.is_open())
            .field("batch_size", &self.batch_size)
            .field("batches", &self.batches)
            .finish()
    }
}

/// Stream `table` in batches of `batch_size` records.
pub fn stream_batches<P>(
    provider: &P,
    table: &str,
    batch_size: usize,
) -> Result<BatchStream<P::Session>>
where
    P: SessionProvider + ?Sized,
{
    BatchStream::open(provider, table, batch_size)
}

/// Records with `age > min_age`, filtered one batch at a time.
pub struct OlderThan<S: Session> {
    batches: BatchStream<S>,
    current: std::vec::IntoIter<Record>,
    min_age: u32,
}

impl<S: Session> OlderThan<S> {
    pub fn min_age(&self) -> u32 {
        self.min_age
    }
}

impl<S: Session> Iterator for OlderThan<S> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let min_age = self.min_age;
            if let Some(record) = self.current.find(|r| r.age > min_age) {
                return Some(Ok(record));
            }
            match self.batches.next()? {
                Ok(batch) => self.current = batch.into_iter(),
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

impl<S: Session> FusedIterator for OlderThan<S> {}

impl<S: Session> LazySequence for OlderThan<S> {
    fn close(&mut self) -> Result<()> {
        self.current = Vec::new().into_iter();
        self.batches.close()
    }
}

/// Stream `table` in batches of `batch_size` and keep the records older than
/// `min_age`.
pub fn batch_processing<P>(
    provider: &P,
    table: &str,
    batch_size: usize,
    min_age: u32,
) -> Result<OlderThan<P::Session>>
where
    P: SessionProvider + ?Sized,
{
    Ok(OlderThan {
        batches: BatchStream::open(provider, table, batch_size)?,
        current: Vec::new().into_iter(),
        min_age,
    })
}
