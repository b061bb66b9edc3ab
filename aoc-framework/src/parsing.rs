//! Utility functions and errors for parsing input.

use std::iter::{Enumerate, Peekable};
use std::str::{FromStr, Lines};

use thiserror::Error;

use crate::DynamicError;

/// A string parsing error with context of the string that was being parsed.
#[derive(Error, Debug)]
#[error("failed to parse string: {string:?}")]
pub struct ParseContextError<E>
where
    E: std::error::Error,
{
    /// The string that was being parsed.
    string: String,
    source: E,
}

impl<E> ParseContextError<E>
where
    E: std::error::Error,
{
    /// Wrap a parse error with the string that caused it.
    pub fn new(source: E, string: &str) -> Self {
        Self {
            string: string.to_owned(),
            source,
        }
    }

    /// The string that failed to parse.
    #[must_use]
    pub fn string(&self) -> &str {
        &self.string
    }
}

/// Parse a string slice into another type, keeping the string as error context.
///
/// # Errors
///
/// Returns a [`ParseContextError`] sourcing [`F::Err`][FromStr::Err] if the string does not parse.
pub fn parse_with_context<F>(string: &str) -> Result<F, ParseContextError<F::Err>>
where
    F: FromStr,
    F::Err: std::error::Error,
{
    string
        .parse::<F>()
        .map_err(|source| ParseContextError::new(source, string))
}

/// A line in an input string caused a parsing error.
#[derive(Error, Debug)]
#[error("failure parsing line {}", .line_index.saturating_add(1))]
pub struct InvalidLine {
    /// The line index, zero based.
    /// This will be formatted to a one-based number for display.
    line_index: usize,
    source: DynamicError,
}

impl InvalidLine {
    /// The zero-based index of the line that failed.
    #[must_use]
    pub fn line_index(&self) -> usize {
        self.line_index
    }
}

/// Parse every line of the input with a closure taking the zero-based line index and the line.
///
/// Errors from the closure are wrapped in an [`InvalidLine`] carrying the line position.
pub fn parse_input_lines<T, E, F>(
    input: &str,
    mut parser: F,
) -> impl Iterator<Item = Result<T, InvalidLine>>
where
    E: Into<DynamicError>,
    F: FnMut(usize, &str) -> Result<T, E>,
{
    input.lines().enumerate().map(move |(line_index, line)| {
        parser(line_index, line).map_err(|source| InvalidLine {
            line_index,
            source: source.into(),
        })
    })
}

/// Scans input in blocks of consecutive non-empty lines separated by empty lines.
#[derive(Debug)]
pub struct InputScanner<'a> {
    lines: Peekable<Enumerate<Lines<'a>>>,
}

impl<'a> InputScanner<'a> {
    #[must_use]
    pub fn new(input: &'a str) -> Self {
        Self {
            lines: input.lines().enumerate().peekable(),
        }
    }

    /// Parse lines until an empty line or the end of input, leaving any empty line unconsumed.
    ///
    /// # Errors
    ///
    /// The first line the closure fails on is returned as an [`InvalidLine`].
    pub fn collect_sequence<T, E, F>(&mut self, mut parser: F) -> Result<Vec<T>, InvalidLine>
    where
        E: Into<DynamicError>,
        F: FnMut(usize, &str) -> Result<T, E>,
    {
        let mut items = Vec::new();
        while let Some((line_index, line)) = self.lines.next_if(|(_, line)| !line.is_empty()) {
            let item = parser(line_index, line).map_err(|source| InvalidLine {
                line_index,
                source: source.into(),
            })?;
            items.push(item);
        }
        Ok(items)
    }

    /// Consume empty lines. Returns `None` if no lines remain afterwards.
    pub fn skip_empty(&mut self) -> Option<()> {
        while self.lines.next_if(|(_, line)| line.is_empty()).is_some() {}
        self.lines.peek().map(|_| ())
    }
}
