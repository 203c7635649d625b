//! File-backed table store
//!
//! A store is a directory; table `t` lives in `t.jsonl`, one JSON object per
//! line. Cursors read the file lazily through a `BufReader`, so a scan holds at
//! most one line in memory no matter how large the table is. Each cursor keeps
//! a shared lock on its table file until it is closed.

use crate::{
    query::{is_identifier, Projection, Query},
    record::{Row, Value, COLUMNS},
    session::{ResultCursor, Session, SessionProvider},
    Error, Result,
};
use fs2::FileExt;
use std::{
    cell::Cell,
    fs::{self, File},
    io::{self, BufRead, BufReader},
    path::{Path, PathBuf},
};
use tracing::debug;

/// File extension of table files.
pub const TABLE_FILE_EXTENSION: &str = "jsonl";

/// Session provider over a directory of JSON Lines table files.
#[derive(Debug)]
pub struct FileStore {
    dir: PathBuf,
    sessions_opened: Cell<u64>,
}

impl FileStore {
    /// Name the store directory. Nothing is touched until a session is acquired.
    pub fn open<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            sessions_opened: Cell::new(0),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file holding `table`.
    pub fn table_path(&self, table: &str) -> PathBuf {
        table_path(&self.dir, table)
    }

    /// Number of sessions handed out so far.
    pub fn sessions_opened(&self) -> u64 {
        self.sessions_opened.get()
    }
}

impl SessionProvider for FileStore {
    type Session = FileSession;

    fn acquire(&self) -> Result<FileSession> {
        let metadata = fs::metadata(&self.dir)
            .map_err(|e| Error::Acquisition(format!("{}: {e}", self.dir.display())))?;
        if !metadata.is_dir() {
            return Err(Error::Acquisition(format!(
                "{} is not a directory",
                self.dir.display()
            )));
        }

        let id = self.sessions_opened.get() + 1;
        self.sessions_opened.set(id);
        debug!(session = id, dir = %self.dir.display(), "session acquired");

        Ok(FileSession {
            id,
            dir: self.dir.clone(),
            released: false,
        })
    }
}

/// A read session on a [`FileStore`].
#[derive(Debug)]
pub struct FileSession {
    id: u64,
    dir: PathBuf,
    released: bool,
}

impl FileSession {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn is_released(&self) -> bool {
        self.released
    }
}

impl Session for FileSession {
    type Cursor = FileCursor;

    fn execute(&mut self, query: &Query) -> Result<FileCursor> {
        if self.released {
            return Err(Error::Query(format!("session {} is released", self.id)));
        }
        if !is_identifier(&query.table) {
            return Err(Error::Query(format!(
                "invalid table name '{}'",
                query.table
            )));
        }

        let columns = match &query.projection {
            Projection::All => COLUMNS.iter().map(|c| c.to_string()).collect(),
            Projection::Columns(columns) => {
                if let Some(duplicate) = query.projection.duplicate() {
                    return Err(Error::Query(format!("duplicate column '{duplicate}'")));
                }
                if let Some(unknown) = columns.iter().find(|c| !COLUMNS.contains(&c.as_str())) {
                    return Err(Error::Query(format!(
                        "unknown column '{unknown}' in table '{}'",
                        query.table
                    )));
                }
                columns.clone()
            }
        };

        let path = table_path(&self.dir, &query.table);
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(Error::TableNotFound(query.table.clone()))
            }
            Err(e) => return Err(Error::Io(e)),
        };
        FileExt::lock_shared(&file)?;

        Ok(FileCursor {
            reader: Some(BufReader::new(file)),
            path,
            columns,
            skip: query.offset.unwrap_or(0),
            remaining: query.limit,
            line_no: 0,
            line: Vec::new(),
        })
    }

    fn release(&mut self) -> Result<()> {
        if !self.released {
            self.released = true;
            debug!(session = self.id, "session closed");
        }
        Ok(())
    }
}

/// Lazy reader over one table file.
#[derive(Debug)]
pub struct FileCursor {
    reader: Option<BufReader<File>>,
    path: PathBuf,
    columns: Vec<String>,
    skip: u64,
    remaining: Option<u64>,
    line_no: u64,
    line: Vec<u8>,
}

impl FileCursor {
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn is_closed(&self) -> bool {
        self.reader.is_none()
    }
}

impl ResultCursor for FileCursor {
    fn fetch_one(&mut self) -> Result<Option<Row>> {
        loop {
            if self.remaining == Some(0) {
                return Ok(None);
            }
            let Some(reader) = self.reader.as_mut() else {
                return Ok(None);
            };

            self.line.clear();
            if reader.read_until(b'\n', &mut self.line)? == 0 {
                return Ok(None);
            }
            self.line_no += 1;

            let line = std::str::from_utf8(&self.line)
                .map_err(|e| {
                    Error::Query(format!(
                        "{}:{}: invalid UTF-8: {e}",
                        self.path.display(),
                        self.line_no
                    ))
                })?
                .trim();
            if line.is_empty() {
                continue;
            }
            if self.skip > 0 {
                self.skip -= 1;
                continue;
            }

            let row = decode_line(line, &self.columns).map_err(|msg| {
                Error::Query(format!("{}:{}: {msg}", self.path.display(), self.line_no))
            })?;
            if let Some(remaining) = self.remaining.as_mut() {
                *remaining -= 1;
            }
            return Ok(Some(row));
        }
    }

    fn close(&mut self) -> Result<()> {
        if let Some(reader) = self.reader.take() {
            FileExt::unlock(reader.get_ref())
                .map_err(|e| Error::Release(format!("{}: {e}", self.path.display())))?;
        }
        Ok(())
    }
}

impl Drop for FileCursor {
    fn drop(&mut self) {
        // Ignore errors during drop, but try to unlock
        if let Some(reader) = self.reader.take() {
            let _ = FileExt::unlock(reader.get_ref());
        }
    }
}

fn table_path(dir: &Path, table: &str) -> PathBuf {
    dir.join(format!("{table}.{TABLE_FILE_EXTENSION}"))
}

fn decode_line(line: &str, columns: &[String]) -> std::result::Result<Row, String> {
    let object: serde_json::Map<String, serde_json::Value> =
        serde_json::from_str(line).map_err(|e| format!("malformed row: {e}"))?;

    columns
        .iter()
        .map(|column| match object.get(column) {
            Some(value) => to_value(value).ok_or_else(|| {
                format!("unsupported value for column '{column}': {value}")
            }),
            None => Err(format!("missing column '{column}'")),
        })
        .collect()
}

fn to_value(value: &serde_json::Value) -> Option<Value> {
    match value {
        serde_json::Value::Null => Some(Value::Null),
        serde_json::Value::String(s) => Some(Value::Text(s.clone())),
        serde_json::Value::Number(n) => n
            .as_i64()
            .or_else(|| {
                // DECIMAL(3,0) style ages may be written as 30.0
                n.as_f64()
                    .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                    .map(|f| f as i64)
            })
            .map(Value::Integer),
        _ => None,
    }
}
