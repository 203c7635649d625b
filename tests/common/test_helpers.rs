/// Test helpers for the streaming integration tests
///
/// This file is included directly in test files using `include!` macro
/// to avoid duplicate module issues when multiple test files need the helpers.
use std::cell::Cell;
use std::fs;
use std::io::Write;
use std::rc::Rc;
use tegrows::file_store::{FileCursor, FileSession};
use tegrows::{Error, FileStore, Query, Record, Result, Session, SessionProvider};
use tempfile::TempDir;

pub const TABLE: &str = "user_data";

/// `n` users with ids `u1..=un`, ages `20 + i % 50`.
pub fn sample_records(n: usize) -> Vec<Record> {
    (1..=n)
        .map(|i| Record {
            id: format!("u{i}"),
            name: format!("User {i}"),
            email: format!("user{i}@example.com"),
            age: 20 + (i % 50) as u32,
        })
        .collect()
}

/// Records with the given ages, in order.
pub fn records_with_ages(ages: &[u32]) -> Vec<Record> {
    ages.iter()
        .enumerate()
        .map(|(i, &age)| Record {
            id: format!("u{}", i + 1),
            name: format!("User {}", i + 1),
            email: format!("user{}@example.com", i + 1),
            age,
        })
        .collect()
}

/// Write `records` as `<dir>/<table>.jsonl`.
pub fn write_table(dir: &TempDir, table: &str, records: &[Record]) {
    let path = dir.path().join(format!("{table}.jsonl"));
    let mut file = fs::File::create(path).expect("Failed to create table file");
    for record in records {
        let line = serde_json::to_string(record).expect("Failed to encode record");
        writeln!(file, "{line}").expect("Failed to write record");
    }
}

/// A temporary data directory holding `records` in the default table.
pub fn table_with(records: &[Record]) -> TempDir {
    let dir = TempDir::new().expect("Failed to create temp dir");
    write_table(&dir, TABLE, records);
    dir
}

#[derive(Debug, Default)]
pub struct SessionCounts {
    pub acquired: Cell<usize>,
    pub released: Cell<usize>,
}

impl SessionCounts {
    /// Sessions acquired and not yet released.
    pub fn live(&self) -> usize {
        self.acquired.get() - self.released.get()
    }
}

/// A [`FileStore`] that records every acquire and release, optionally failing
/// the release.
pub struct CountingStore {
    pub store: FileStore,
    pub counts: Rc<SessionCounts>,
    pub fail_release: bool,
}

impl CountingStore {
    pub fn new(dir: &TempDir) -> Self {
        Self {
            store: FileStore::open(dir.path()),
            counts: Rc::new(SessionCounts::default()),
            fail_release: false,
        }
    }

    pub fn failing_release(dir: &TempDir) -> Self {
        Self {
            fail_release: true,
            ..Self::new(dir)
        }
    }
}

pub struct CountingSession {
    inner: FileSession,
    counts: Rc<SessionCounts>,
    fail_release: bool,
    released: bool,
}

impl SessionProvider for CountingStore {
    type Session = CountingSession;

    fn acquire(&self) -> Result<CountingSession> {
        let inner = self.store.acquire()?;
        self.counts.acquired.set(self.counts.acquired.get() + 1);
        Ok(CountingSession {
            inner,
            counts: Rc::clone(&self.counts),
            fail_release: self.fail_release,
            released: false,
        })
    }
}

impl Session for CountingSession {
    type Cursor = FileCursor;

    fn execute(&mut self, query: &Query) -> Result<FileCursor> {
        self.inner.execute(query)
    }

    fn release(&mut self) -> Result<()> {
        if !self.released {
            self.released = true;
            self.counts.released.set(self.counts.released.get() + 1);
        }
        self.inner.release()?;
        if self.fail_release {
            return Err(Error::Release("connection reset".to_string()));
        }
        Ok(())
    }
}
