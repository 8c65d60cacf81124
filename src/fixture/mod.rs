//! Fixture files: parsing and directory loading
//!
//! A fixture file holds one or more recorded request/response pairs separated
//! by a delimiter token (`##` by default):
//!
//! ```text
//! GET /hello HTTP/1.1
//! HTTP/1.1 200 OK
//!
//! Content-Type: text/plain
//!
//! Hello World
//! ##
//! POST /items HTTP/1.1
//! ...
//! ```
//!
//! The line right after the status line is reserved and skipped; headers
//! follow until a blank line, and everything after that is the body.

pub mod loader;
pub mod parser;


pub use loader::{ErrorPolicy, FixtureLoader, LoadError, LoadReport, LoaderConfig};
pub use parser::{FixtureParser, ParseError, RecordTokens, Records, parse_record, tokenize_record};
