use crate::cache::{RequestKey, ResponseRecord};
use std::collections::HashMap;

/// Token separating records inside one fixture file
pub const DEFAULT_DELIMITER: &str = "##";

/// Headers start this many lines after the status line; the line in between
/// is reserved and ignored.
const HEADER_OFFSET: usize = 2;
const STATUS_PREFIX: &str = "HTTP";
const HEADER_SEPARATOR: &str = ": ";

/// Errors produced while parsing a single fixture block
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("malformed request line {0:?}: expected `<METHOD> <PATH> <VERSION>`")]
    MalformedRequestLine(String),
    #[error("no response status line starting with `HTTP`")]
    NoResponseMarker,
    #[error("malformed header line {0:?}: expected `<Name>: <Value>`")]
    MalformedHeader(String),
}

/// One fixture block broken into its positional parts
///
/// This is the only place that knows the line offsets of the fixture grammar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordTokens<'a> {
    pub method: &'a str,
    pub path: &'a str,
    pub version: &'a str,
    /// Index of the `HTTP...` status line within the trimmed block
    pub status_line_index: usize,
    /// Trimmed header lines, not yet validated
    pub header_lines: Vec<&'a str>,
    pub body: String,
}

/// Splits a block into request line, status line position, header lines and body
///
/// The request line must be exactly three tokens separated by single spaces,
/// so a path containing a space cannot be expressed.
pub fn tokenize_record(block: &str) -> Result<RecordTokens<'_>, ParseError> {
    let lines: Vec<&str> = block.trim().split('\n').collect();
    let request_line = lines[0];

    let tokens: Vec<&str> = request_line.split(' ').collect();
    let [method, path, version] = tokens[..] else {
        return Err(ParseError::MalformedRequestLine(request_line.to_string()));
    };

    let status_line_index = lines
        .iter()
        .enumerate()
        .skip(1)
        .find(|(_, line)| line.trim().starts_with(STATUS_PREFIX))
        .map(|(i, _)| i)
        .ok_or(ParseError::NoResponseMarker)?;

    let mut header_lines = Vec::new();
    let mut body_start = None;
    for (i, line) in lines
        .iter()
        .enumerate()
        .skip(status_line_index + HEADER_OFFSET)
    {
        let line = line.trim();
        if line.is_empty() {
            body_start = Some(i + 1);
            break;
        }
        header_lines.push(line);
    }

    // Without a blank terminator the headers run to the end and there is no body
    let body = match body_start {
        Some(start) => lines[start..].join("\n"),
        None => String::new(),
    };

    Ok(RecordTokens {
        method,
        path,
        version,
        status_line_index,
        header_lines,
        body,
    })
}

/// Parses one fixture block into a cache entry
pub fn parse_record(block: &str) -> Result<(RequestKey, ResponseRecord), ParseError> {
    let tokens = tokenize_record(block)?;

    let mut headers = HashMap::with_capacity(tokens.header_lines.len());
    for line in &tokens.header_lines {
        let parts: Vec<&str> = line.split(HEADER_SEPARATOR).collect();
        let [name, value] = parts[..] else {
            return Err(ParseError::MalformedHeader(line.to_string()));
        };
        headers.insert(name.to_string(), value.to_string());
    }

    Ok((
        RequestKey::new(tokens.method, tokens.path),
        ResponseRecord::new(headers, tokens.body),
    ))
}

/// Parser for fixture documents
///
/// # Examples
///
/// ```
/// use nucklee::fixture::FixtureParser;
///
/// let text = "GET /a HTTP/1.1\nHTTP/1.1 200 OK\n\nX-A: 1\n\na\n##\nGET /b";
/// let results: Vec<_> = FixtureParser::default().parse(text).collect();
///
/// assert_eq!(results.len(), 2);
/// assert!(results[0].is_ok());
/// assert!(results[1].is_err());
/// ```
#[derive(Debug, Clone)]
pub struct FixtureParser {
    delimiter: String,
}

impl FixtureParser {
    pub fn new(delimiter: impl Into<String>) -> Self {
        Self {
            delimiter: delimiter.into(),
        }
    }

    pub fn delimiter(&self) -> &str {
        &self.delimiter
    }

    /// Returns a lazy sequence with one parse result per delimited block
    pub fn parse<'a>(&self, text: &'a str) -> Records<'a> {
        Records {
            remaining: Some(text),
            delimiter: self.delimiter.clone(),
        }
    }
}

impl Default for FixtureParser {
    fn default() -> Self {
        Self::new(DEFAULT_DELIMITER)
    }
}

/// Iterator over the parse results of one fixture document
#[derive(Debug, Clone)]
pub struct Records<'a> {
    remaining: Option<&'a str>,
    delimiter: String,
}

impl<'a> Records<'a> {
    fn next_block(&mut self) -> Option<&'a str> {
        let rest = self.remaining.take()?;
        if self.delimiter.is_empty() {
            return Some(rest);
        }
        match rest.split_once(self.delimiter.as_str()) {
            Some((block, tail)) => {
                self.remaining = Some(tail);
                Some(block)
            }
            None => Some(rest),
        }
    }
}

impl Iterator for Records<'_> {
    type Item = Result<(RequestKey, ResponseRecord), ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_block().map(parse_record)
    }
}

impl std::iter::FusedIterator for Records<'_> {}
