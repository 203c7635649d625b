//! Lazy streaming reads over a session-backed record table.
//!
//! Rows, batches and pages are pulled on demand from a [`SessionProvider`].
//! Streams that hold a session release it exactly once, whether they are
//! exhausted, fail, are cut short by [`take`], or are dropped.

pub mod aggregate;
pub mod batch_stream;
pub mod config;
mod error;
pub mod file_store;
pub mod paginator;
pub mod query;
pub mod reader;
pub mod record;
pub mod row_stream;
pub mod session;
pub mod take;

pub use aggregate::{age_summary, streaming_mean, RunningAggregate};
pub use batch_stream::{batch_processing, stream_batches, Batch, BatchStream, OlderThan};
pub use config::StreamConfig;
pub use error::{Error, Result};
pub use file_store::FileStore;
pub use paginator::{fetch_page, paginate, Page, PageCursor, Paginator};
pub use query::{parse_query, Query};
pub use reader::TableReader;
pub use record::{FromRow, Record, Row, Value};
pub use row_stream::{stream_ages, stream_query, stream_rows, RowStream};
pub use session::{ResultCursor, Session, SessionProvider};
pub use take::{take, LazySequence, LazySequenceExt, Take};
