//! Offset pagination
//!
//! Unlike the row and batch streams, the paginator holds no session between
//! pages. Each page is an independent `LIMIT .. OFFSET ..` query on a freshly
//! acquired session that is released as soon as the page is read. Pages are
//! therefore only consistent with each other if the table is not written to
//! during the traversal; concurrent inserts or deletes can shift rows across
//! page boundaries.

use crate::{
    query::Query,
    record::{FromRow, Record},
    session::{ScopedSession, SessionProvider},
    take::LazySequence,
    Error, Result,
};
use std::{fmt, iter::FusedIterator};
use tracing::trace;

/// Records read at one offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub offset: u64,
    pub records: Vec<Record>,
}

impl Page {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    pub fn into_records(self) -> Vec<Record> {
        self.records
    }
}

impl IntoIterator for Page {
    type Item = Record;
    type IntoIter = std::vec::IntoIter<Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

/// Offset of the next page to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageCursor {
    offset: u64,
    page_size: u64,
}

impl PageCursor {
    pub fn new(page_size: usize) -> Self {
        Self {
            offset: 0,
            page_size: page_size as u64,
        }
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn page_size(&self) -> u64 {
        self.page_size
    }

    fn advance(&mut self) {
        self.offset = self.offset.saturating_add(self.page_size);
    }
}

/// Fetch the page of `page_size` records starting at `offset`.
///
/// The session used for the query is released before this returns.
pub fn fetch_page<P>(provider: &P, table: &str, page_size: usize, offset: u64) -> Result<Page>
where
    P: SessionProvider + ?Sized,
{
    if page_size == 0 {
        return Err(Error::InvalidArgument(
            "page size must be a positive integer".to_string(),
        ));
    }

    let query = Query::range(table, page_size as u64, offset);
    let mut scope = ScopedSession::open(provider, &query)?;
    let fetched = scope.fetch_many(page_size).and_then(|rows| {
        rows.into_iter()
            .map(Record::from_row)
            .collect::<Result<Vec<_>>>()
    });

    match fetched {
        Ok(records) => {
            scope.finish();
            trace!(offset, len = records.len(), "page fetched");
            Ok(Page { offset, records })
        }
        Err(e) => {
            scope.abort();
            Err(e)
        }
    }
}

/// Lazy sequence of non-empty pages, ending at the first empty page.
pub struct Paginator<'p, P: ?Sized> {
    provider: &'p P,
    table: String,
    cursor: PageCursor,
    page_size: usize,
    done: bool,
}

impl<'p, P: SessionProvider + ?Sized> Paginator<'p, P> {
    pub fn new(provider: &'p P, table: &str, page_size: usize) -> Result<Self> {
        if page_size == 0 {
            return Err(Error::InvalidArgument(
                "page size must be a positive integer".to_string(),
            ));
        }

        Ok(Self {
            provider,
            table: table.to_string(),
            cursor: PageCursor::new(page_size),
            page_size,
            done: false,
        })
    }

    /// Offset the next page will be fetched at.
    pub fn offset(&self) -> u64 {
        self.cursor.offset()
    }

    pub fn is_done(&self) -> bool {
        self.done
    }
}

impl<P: SessionProvider + ?Sized> Iterator for Paginator<'_, P> {
    type Item = Result<Page>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match fetch_page(self.provider, &self.table, self.page_size, self.cursor.offset()) {
            Ok(page) if page.is_empty() => {
                self.done = true;
                None
            }
            Ok(page) => {
                self.cursor.advance();
                Some(Ok(page))
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

impl<P: SessionProvider + ?Sized> FusedIterator for Paginator<'_, P> {}

impl<P: SessionProvider + ?Sized> LazySequence for Paginator<'_, P> {
    /// No session is held between pages, so closing only stops the sequence.
    fn close(&mut self) -> Result<()> {
        self.done = true;
        Ok(())
    }
}

impl<P: ?Sized> fmt::Debug for Paginator<'_, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Paginator")
            .field("table", &self.table)
            .field("cursor", &self.cursor)
            .field("done", &self.done)
            .finish()
    }
}

/// Paginate `table` with pages of `page_size` records.
pub fn paginate<'p, P>(
    provider: &'p P,
    table: &str,
    page_size: usize,
) -> Result<Paginator<'p, P>>
where
    P: SessionProvider + ?Sized,
{
    Paginator::new(provider, table, page_size)
}
