//! Table handle
//!
//! `TableReader` binds a session provider to one table and exposes every
//! streaming operation as a method, similar to a database connection handle:
//!
//! ```no_run
//! use tegrows::{FileStore, LazySequenceExt, TableReader};
//!
//! let reader = TableReader::new(FileStore::open("data"), "user_data");
//! for record in reader.stream_rows()?.bounded(6) {
//!     println!("{:?}", record?);
//! }
//! # Ok::<(), tegrows::Error>(())
//! ```

use crate::{
    aggregate::{self, RunningAggregate},
    batch_stream::{self, BatchStream, OlderThan},
    config::StreamConfig,
    file_store::FileStore,
    paginator::{self, Page, Paginator},
    record::Row,
    row_stream::{self, RowStream},
    session::SessionProvider,
    Result,
};

/// A session provider bound to one table.
#[derive(Debug)]
pub struct TableReader<P> {
    provider: P,
    table: String,
}

impl TableReader<FileStore> {
    /// File store reader for the configured directory and table.
    pub fn from_config(config: &StreamConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(FileStore::open(&config.data_dir), config.table.clone()))
    }
}

impl<P: SessionProvider> TableReader<P> {
    pub fn new(provider: P, table: impl Into<String>) -> Self {
        Self {
            provider,
            table: table.into(),
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// One record at a time from a single full scan.
    pub fn stream_rows(&self) -> Result<RowStream<P::Session>> {
        row_stream::stream_rows(&self.provider, &self.table)
    }

    /// The `age` column, one value at a time.
    pub fn stream_ages(&self) -> Result<RowStream<P::Session, u32>> {
        row_stream::stream_ages(&self.provider, &self.table)
    }

    /// Raw rows of an arbitrary supported SELECT.
    pub fn query(&self, sql: &str) -> Result<RowStream<P::Session, Row>> {
        row_stream::stream_query(&self.provider, sql)
    }

    pub fn stream_batches(&self, batch_size: usize) -> Result<BatchStream<P::Session>> {
        batch_stream::stream_batches(&self.provider, &self.table, batch_size)
    }

    /// Records older than `min_age`, read in batches of `batch_size`.
    pub fn batch_processing(
        &self,
        batch_size: usize,
        min_age: u32,
    ) -> Result<OlderThan<P::Session>> {
        batch_stream::batch_processing(&self.provider, &self.table, batch_size, min_age)
    }

    pub fn paginate(&self, page_size: usize) -> Result<Paginator<'_, P>> {
        paginator::paginate(&self.provider, &self.table, page_size)
    }

    pub fn fetch_page(&self, page_size: usize, offset: u64) -> Result<Page> {
        paginator::fetch_page(&self.provider, &self.table, page_size, offset)
    }

    pub fn age_summary(&self) -> Result<RunningAggregate> {
        aggregate::age_summary(&self.provider, &self.table)
    }

    /// Mean age, or `None` if the table is empty.
    pub fn streaming_mean(&self) -> Result<Option<f64>> {
        aggregate::streaming_mean(&self.provider, &self.table)
    }
}
