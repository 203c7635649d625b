//! Stream configuration and defaults.

use crate::{query::is_identifier, Error, Result};
use std::path::PathBuf;

/// Table read when none is configured.
pub const DEFAULT_TABLE: &str = "user_data";
/// Records per batch for batch streaming.
pub const DEFAULT_BATCH_SIZE: usize = 50;
/// Records per page for pagination.
pub const DEFAULT_PAGE_SIZE: usize = 10;
/// Directory holding table files.
pub const DEFAULT_DATA_DIR: &str = "data";
/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "TEGROWS_DATA_DIR";

/// Where to read from and how to group what is read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamConfig {
    pub data_dir: PathBuf,
    pub table: String,
    pub batch_size: usize,
    pub page_size: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            table: DEFAULT_TABLE.to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl StreamConfig {
    pub fn validate(&self) -> Result<()> {
        if !is_identifier(&self.table) {
            return Err(Error::InvalidArgument(format!(
                "invalid table name '{}'",
                self.table
            )));
        }
        if self.batch_size == 0 {
            return Err(Error::InvalidArgument(
                "batch size must be a positive integer".to_string(),
            ));
        }
        if self.page_size == 0 {
            return Err(Error::InvalidArgument(
                "page size must be a positive integer".to_string(),
            ));
        }
        Ok(())
    }
}
