//! Error types
//!
//!     Scanning and tree building are fatal: a `ScanError` or `SyntaxError` aborts the parse
//!     and carries the source location and position. `NodeError` is the recoverable class
//!     raised by the throwing lookups (`get`, `first_child`, ...) and by scalar coercion.

use crate::thingy::token::Position;
use thiserror::Error;

/// A failure while turning characters into tokens
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{location}:{position}: {kind}")]
pub struct ScanError {
    pub location: String,
    pub position: Position,
    pub kind: ScanErrorKind,
}

impl ScanError {
    pub fn new(location: impl Into<String>, position: Position, kind: ScanErrorKind) -> Self {
        ScanError {
            location: location.into(),
            position,
            kind,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScanErrorKind {
    #[error("unterminated string literal")]
    UnterminatedQuote,
    #[error("bracket ')' without matching bracket '('")]
    UnbalancedClose,
    #[error("{0} closing bracket(s) missing")]
    UnclosedBracket(usize),
    #[error("URL string (enclosed in quotes) expected after %include")]
    MissingIncludePath,
    #[error("%include \"{path}\" failed: {reason}")]
    UnresolvedInclude { path: String, reason: String },
    #[error("%include cycle: {0} is already being read")]
    IncludeCycle(String),
    #[error("includes nested deeper than {0} levels")]
    IncludeTooDeep(usize),
    #[error("brackets nested deeper than {0} levels")]
    NestingTooDeep(usize),
    #[error("invalid escape: {0}")]
    InvalidEscape(String),
    #[error("read failed: {0}")]
    Io(String),
}

/// A token stream that violates the grammar
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{location}:{position}: {kind}")]
pub struct SyntaxError {
    pub location: String,
    pub position: Position,
    pub kind: SyntaxErrorKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyntaxErrorKind {
    #[error("bracket ')' without matching bracket '('")]
    UnmatchedClose,
    #[error("closing bracket ')' missing before end of file")]
    MissingClose,
    #[error("token stream ended inside a file")]
    UnexpectedEnd,
    #[error("END_FILE without matching NEW_FILE")]
    UnexpectedEndFile,
    #[error("{0} outside of any NEW_FILE span")]
    OutsideFile(&'static str),
    #[error("'{0}' cannot be used as a key name")]
    InvalidKeyName(String),
}

/// Lookup and coercion failures on a built tree
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NodeError {
    #[error("node {parent} has no descendant '{name}'")]
    NotFound { parent: String, name: String },
    #[error("node {0} has no children")]
    NoChildren(String),
    #[error("node {name} has {count} children and cannot be read as a single value")]
    AmbiguousScalar { name: String, count: usize },
    #[error("query result is empty")]
    EmptyResult,
    #[error("'{0}' is not a valid identifier")]
    InvalidIdentifier(String),
}

/// Either stage of a parse failed
#[derive(Debug, Error)]
pub enum ParseError {
    #[error(transparent)]
    Scan(#[from] ScanError),
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
    #[error("cannot open {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
