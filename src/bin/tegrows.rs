use clap::{Parser, Subcommand, ValueEnum};
use std::io::{self, Write};
use std::path::PathBuf;
use std::process;
use tegrows::config::{
    StreamConfig, DATA_DIR_ENV, DEFAULT_BATCH_SIZE, DEFAULT_DATA_DIR, DEFAULT_PAGE_SIZE,
    DEFAULT_TABLE,
};
use tegrows::query::Projection;
use tegrows::record::COLUMNS;
use tegrows::{parse_query, take, LazySequence, Record, RowStream, TableReader, Take, Value};
use tracing_subscriber::EnvFilter;

/// Table cells wider than this are truncated.
const MAX_COLUMN_WIDTH: usize = 20;

#[derive(Parser)]
#[command(name = "tegrows")]
#[command(about = "tegrows - Lazy row, batch and page streaming over JSONL tables")]
#[command(version)]
struct Cli {
    /// Directory containing one <table>.jsonl file per table
    #[arg(long, env = DATA_DIR_ENV, default_value = DEFAULT_DATA_DIR)]
    data_dir: PathBuf,

    /// Table to read
    #[arg(long, default_value = DEFAULT_TABLE)]
    table: String,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    mode: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Stream records one at a time
    Rows {
        /// Stop after this many records
        #[arg(long)]
        take: Option<usize>,
    },
    /// Stream records in fixed-size batches
    Batches {
        #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
        size: usize,

        /// Only print records older than this age
        #[arg(long, value_name = "AGE")]
        older_than: Option<u32>,

        /// Stop after this many batches (or records with --older-than)
        #[arg(long)]
        take: Option<usize>,
    },
    /// Read the table page by page
    Pages {
        #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
        size: usize,

        /// Stop after this many pages
        #[arg(long)]
        take: Option<usize>,
    },
    /// Print the average age
    Mean,
    /// Stream the rows of a SELECT statement
    Query {
        sql: String,

        /// Stop after this many rows
        #[arg(long)]
        take: Option<usize>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, ValueEnum)]
enum OutputFormat {
    Table,
    Csv,
    Json,
}

/// Writes rows as they arrive, emitting the header before the first one.
struct RowWriter<W: Write> {
    out: W,
    format: OutputFormat,
    columns: Vec<String>,
    header_written: bool,
}

impl<W: Write> RowWriter<W> {
    fn new(out: W, format: OutputFormat, columns: Vec<String>) -> Self {
        Self {
            out,
            format,
            columns,
            header_written: false,
        }
    }

    fn write_record(&mut self, record: Record) -> tegrows::Result<()> {
        self.write_row(&record.into_row())
    }

    fn write_row(&mut self, row: &[Value]) -> tegrows::Result<()> {
        if !self.header_written {
            self.write_header()?;
            self.header_written = true;
        }

        match self.format {
            OutputFormat::Table => {
                let cells: Vec<String> = row.iter().map(Value::to_string).collect();
                let line = table_line(&cells);
                writeln!(self.out, "{line}")?;
            }
            OutputFormat::Csv => {
                let cells: Vec<String> = row
                    .iter()
                    .map(|v| escape_csv_field(&v.to_string()))
                    .collect();
                writeln!(self.out, "{}", cells.join(","))?;
            }
            OutputFormat::Json => {
                let object: serde_json::Map<String, serde_json::Value> = self
                    .columns
                    .iter()
                    .cloned()
                    .zip(row.iter().map(json_value))
                    .collect();
                let line = serde_json::to_string(&object)
                    .map_err(|e| tegrows::Error::Query(e.to_string()))?;
                writeln!(self.out, "{line}")?;
            }
        }
        Ok(())
    }

    fn write_header(&mut self) -> tegrows::Result<()> {
        match self.format {
            OutputFormat::Table => {
                let line = table_line(&self.columns);
                let separator = vec!["-".repeat(MAX_COLUMN_WIDTH + 2); self.columns.len()];
                writeln!(self.out, "{line}")?;
                writeln!(self.out, "{}", separator.join("+"))?;
            }
            OutputFormat::Csv => {
                let cells: Vec<String> =
                    self.columns.iter().map(|c| escape_csv_field(c)).collect();
                writeln!(self.out, "{}", cells.join(","))?;
            }
            OutputFormat::Json => {}
        }
        Ok(())
    }

    /// A divider line between batches or pages; table output only.
    fn write_divider(&mut self, label: &str) -> tegrows::Result<()> {
        if self.format == OutputFormat::Table {
            writeln!(self.out, "-- {label}")?;
        }
        Ok(())
    }

    fn finish(mut self, empty_message: &str) -> tegrows::Result<()> {
        if !self.header_written && self.format == OutputFormat::Table {
            writeln!(self.out, "{empty_message}")?;
        }
        self.out.flush()?;
        Ok(())
    }
}

fn table_line(cells: &[String]) -> String {
    cells
        .iter()
        .map(|cell| {
            let shown = if cell.chars().count() > MAX_COLUMN_WIDTH {
                let kept: String = cell.chars().take(MAX_COLUMN_WIDTH - 3).collect();
                format!("{kept}...")
            } else {
                cell.clone()
            };
            format!(" {shown:width$} ", width = MAX_COLUMN_WIDTH)
        })
        .collect::<Vec<_>>()
        .join("|")
}

fn escape_csv_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn json_value(value: &Value) -> serde_json::Value {
    match value {
        Value::Integer(i) => serde_json::Value::from(*i),
        Value::Text(s) => serde_json::Value::from(s.as_str()),
        Value::Null => serde_json::Value::Null,
    }
}

fn record_columns() -> Vec<String> {
    COLUMNS.iter().map(|c| c.to_string()).collect()
}

/// Writes every record of `records`, stopping at the first error.
fn write_records<I, W>(writer: &mut RowWriter<W>, records: I) -> tegrows::Result<()>
where
    I: Iterator<Item = tegrows::Result<Record>>,
    W: Write,
{
    for record in records {
        writer.write_record(record?)?;
    }
    Ok(())
}

/// Applies an optional `--take` bound.
fn bounded<S: LazySequence>(sequence: S, limit: Option<usize>) -> Take<S> {
    take(sequence, limit.unwrap_or(usize::MAX))
}

fn run(cli: Cli) -> tegrows::Result<()> {
    let config = StreamConfig {
        data_dir: cli.data_dir,
        table: cli.table,
        ..StreamConfig::default()
    };
    let reader = TableReader::from_config(&config)?;
    let stdout = io::stdout().lock();

    match cli.command {
        Command::Rows { take } => {
            let mut writer = RowWriter::new(stdout, cli.mode, record_columns());
            let mut rows = bounded(reader.stream_rows()?, take);
            write_records(&mut writer, &mut rows)?;
            rows.close()?;
            writer.finish("No rows returned")
        }
        Command::Batches {
            size,
            older_than: Some(min_age),
            take,
        } => {
            let mut writer = RowWriter::new(stdout, cli.mode, record_columns());
            let mut records = bounded(reader.batch_processing(size, min_age)?, take);
            write_records(&mut writer, &mut records)?;
            records.close()?;
            writer.finish(&format!("No users older than {min_age}"))
        }
        Command::Batches {
            size,
            older_than: None,
            take,
        } => {
            let mut writer = RowWriter::new(stdout, cli.mode, record_columns());
            let mut batches = bounded(reader.stream_batches(size)?, take);
            for (index, batch) in (&mut batches).enumerate() {
                let batch = batch?;
                let label = format!("batch {} ({} records)", index + 1, batch.len());
                writer.write_divider(&label)?;
                write_records(&mut writer, batch.into_iter().map(Ok))?;
            }
            batches.close()?;
            writer.finish("No rows returned")
        }
        Command::Pages { size, take } => {
            let mut writer = RowWriter::new(stdout, cli.mode, record_columns());
            let mut pages = bounded(reader.paginate(size)?, take);
            for page in &mut pages {
                let page = page?;
                let label = format!("page at offset {} ({} records)", page.offset, page.len());
                writer.write_divider(&label)?;
                write_records(&mut writer, page.into_iter().map(Ok))?;
            }
            pages.close()?;
            writer.finish("No rows returned")
        }
        Command::Mean => {
            let summary = reader.age_summary()?;
            let mut out = stdout;
            match (cli.mode, summary.mean()) {
                (OutputFormat::Json, mean) => {
                    let object = serde_json::json!({
                        "count": summary.count(),
                        "sum": summary.sum(),
                        "mean": mean,
                    });
                    writeln!(out, "{object}")?;
                }
                (_, Some(mean)) => writeln!(out, "Average age of users: {mean}")?,
                (_, None) => writeln!(out, "No users found to calculate average age.")?,
            }
            Ok(())
        }
        Command::Query { sql, take } => {
            let query = parse_query(&sql)?;
            let columns = match &query.projection {
                Projection::All => record_columns(),
                Projection::Columns(columns) => columns.clone(),
            };
            let mut writer = RowWriter::new(stdout, cli.mode, columns);
            let mut rows = bounded(
                RowStream::<_, Vec<Value>>::open(reader.provider(), &query)?,
                take,
            );
            for row in &mut rows {
                writer.write_row(&row?)?;
            }
            rows.close()?;
            writer.finish("No rows returned")
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
