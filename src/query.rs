//! Read queries issued against a table
//!
//! The core issues three query shapes: a full scan, a bounded range scan
//! (`LIMIT .. OFFSET ..`) and a single-column scan. [`Query`] renders each of
//! them as SQL, and [`parse_query`] reads the same SELECT subset back using nom.

use crate::{Error, Result};
use nom::{
    branch::alt,
    bytes::complete::{tag, tag_no_case},
    character::complete::{alpha1, alphanumeric1, char, digit1, multispace0, multispace1},
    combinator::{map, map_res, opt, recognize},
    multi::{many0, separated_list1},
    sequence::{delimited, pair, preceded},
    IResult, Parser,
};
use std::fmt;

/// Columns selected by a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Projection {
    /// `*`: every column of the table, in schema order
    All,
    Columns(Vec<String>),
}

impl Projection {
    /// First column named more than once, if any.
    pub fn duplicate(&self) -> Option<&str> {
        match self {
            Projection::All => None,
            Projection::Columns(columns) => columns
                .iter()
                .enumerate()
                .find(|(i, column)| columns[..*i].contains(column))
                .map(|(_, column)| column.as_str()),
        }
    }
}

/// A single-table SELECT.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub projection: Projection,
    pub table: String,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl Query {
    /// `SELECT * FROM <table>`
    pub fn full_scan(table: impl Into<String>) -> Self {
        Self {
            projection: Projection::All,
            table: table.into(),
            limit: None,
            offset: None,
        }
    }

    /// `SELECT * FROM <table> LIMIT <limit> OFFSET <offset>`
    pub fn range(table: impl Into<String>, limit: u64, offset: u64) -> Self {
        Self {
            limit: Some(limit),
            offset: Some(offset),
            ..Self::full_scan(table)
        }
    }

    /// `SELECT <column> FROM <table>`
    pub fn column(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            projection: Projection::Columns(vec![column.into()]),
            ..Self::full_scan(table)
        }
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SELECT ")?;
        match &self.projection {
            Projection::All => f.write_str("*")?,
            Projection::Columns(columns) => f.write_str(&columns.join(", "))?,
        }
        write!(f, " FROM {}", self.table)?;
        if let Some(limit) = self.limit {
            write!(f, " LIMIT {limit}")?;
        }
        if let Some(offset) = self.offset {
            write!(f, " OFFSET {offset}")?;
        }
        Ok(())
    }
}

/// Returns true if `name` is usable as a table or column name.
pub fn is_identifier(name: &str) -> bool {
    matches!(parse_identifier(name), Ok(("", _)))
}

/// Parse a single SELECT statement.
///
/// Accepts `SELECT (* | col[, col]*) FROM table [LIMIT n [OFFSET m]]` with
/// case-insensitive keywords and an optional trailing semicolon.
pub fn parse_query(input: &str) -> Result<Query> {
    let (remaining, query) = parse_select
        .parse(input)
        .map_err(|e| convert_nom_error(input, e))?;

    // Allow trailing whitespace and an optional semicolon
    let remaining = remaining.trim_start();
    let remaining = remaining.strip_prefix(';').unwrap_or(remaining);
    if !remaining.trim().is_empty() {
        let position = input.len() - remaining.len();
        return Err(parse_error(input, position, "Unexpected input after statement"));
    }

    // Rows are keyed by column name downstream, so each column may appear once
    if let Some(column) = query.projection.duplicate() {
        let position = input
            .match_indices(column)
            .nth(1)
            .map_or(0, |(position, _)| position);
        return Err(parse_error(
            input,
            position,
            &format!("Duplicate column '{column}'"),
        ));
    }

    Ok(query)
}

fn parse_select(input: &str) -> IResult<&str, Query> {
    let (input, _) = delimited(multispace0, tag_no_case("SELECT"), multispace1).parse(input)?;
    let (input, projection) = parse_projection.parse(input)?;
    let (input, _) = delimited(multispace0, tag_no_case("FROM"), multispace1).parse(input)?;
    let (input, table) = parse_identifier.parse(input)?;
    let (input, limit) = opt(parse_limit).parse(input)?;
    let (input, offset) = match limit {
        Some(_) => opt(parse_offset).parse(input)?,
        None => (input, None),
    };

    Ok((
        input,
        Query {
            projection,
            table: table.to_string(),
            limit,
            offset,
        },
    ))
}

fn parse_identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(alpha1, many0(alt((alphanumeric1, tag("_")))))).parse(input)
}

fn parse_projection(input: &str) -> IResult<&str, Projection> {
    alt((
        map(char('*'), |_| Projection::All),
        map(
            separated_list1(
                delimited(multispace0, char(','), multispace0),
                parse_identifier,
            ),
            |columns: Vec<&str>| {
                Projection::Columns(columns.into_iter().map(str::to_string).collect())
            },
        ),
    ))
    .parse(input)
}

fn parse_limit(input: &str) -> IResult<&str, u64> {
    preceded(
        (multispace1, tag_no_case("LIMIT"), multispace1),
        parse_u64,
    )
    .parse(input)
}

fn parse_offset(input: &str) -> IResult<&str, u64> {
    preceded(
        (multispace1, tag_no_case("OFFSET"), multispace1),
        parse_u64,
    )
    .parse(input)
}

fn parse_u64(input: &str) -> IResult<&str, u64> {
    map_res(digit1, |digits: &str| digits.parse::<u64>()).parse(input)
}

/// Calculate line and column from input position
fn calculate_position(input: &str, position: usize) -> (usize, usize) {
    let before_error = &input[..position];
    let line = before_error.matches('\n').count() + 1;
    let column = before_error
        .rfind('\n')
        .map_or(position + 1, |last_newline| position - last_newline);
    (line, column)
}

fn extract_context(input: &str, position: usize, context_size: usize) -> String {
    let mut start = position.saturating_sub(context_size);
    while !input.is_char_boundary(start) {
        start -= 1;
    }
    let mut end = (position + context_size).min(input.len());
    while !input.is_char_boundary(end) {
        end += 1;
    }

    // Replace newlines with spaces for single-line display
    input[start..end].replace(['\n', '\r'], " ")
}

fn parse_error(input: &str, position: usize, message: &str) -> Error {
    let (line, column) = calculate_position(input, position);
    let context = extract_context(input, position, 20);
    Error::Parse(format!(
        "{message} at line {line}, column {column} near '{}'",
        context.trim()
    ))
}

fn convert_nom_error(input: &str, error: nom::Err<nom::error::Error<&str>>) -> Error {
    match error {
        nom::Err::Error(e) | nom::Err::Failure(e) => {
            let message = match e.code {
                nom::error::ErrorKind::Tag => "Unexpected token",
                nom::error::ErrorKind::Alpha => "Expected identifier",
                nom::error::ErrorKind::Digit | nom::error::ErrorKind::MapRes => "Expected number",
                nom::error::ErrorKind::MultiSpace => "Expected whitespace",
                nom::error::ErrorKind::Char => "Expected '*' or column list",
                nom::error::ErrorKind::Eof => "Unexpected end of input",
                _ => "Invalid syntax",
            };
            parse_error(input, input.len() - e.input.len(), message)
        }
        nom::Err::Incomplete(_) => parse_error(input, input.len(), "Incomplete input"),
    }
}
