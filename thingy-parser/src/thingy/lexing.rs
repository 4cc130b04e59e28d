//! Lexer
//!
//!     Scanning is a single pass over the characters of a source, done line by line. Quoted
//!     literals and comments never span lines, so a line is the natural unit of work.
//!
//! Include Expansion
//!
//!     `%include "path"` is handled inside the scanner rather than as a later transformation.
//!     Each open source is a frame on a stack; the directive pushes a frame for the included
//!     source, which is read to the end before the including frame resumes. The token stream
//!     therefore stays flat, with NewFile / EndFile marking where each source starts and ends.
//!     The stack depth is bounded and a source that is already open cannot be included again.
//!     Bracket nesting is bounded as well, counted over all open sources, so every later
//!     recursive walk of the tree has a known depth.
//!
//! Pull Based
//!
//!     The [Scanner] is an iterator: nothing is read until tokens are requested, and only the
//!     current line of each open frame is held in memory. The first error closes all frames.

pub mod scanner;

pub use scanner::{Scanner, DEFAULT_MAX_INCLUDE_DEPTH, DEFAULT_MAX_NESTING};

use crate::thingy::error::ScanError;
use crate::thingy::token::{Position, Token};

/// Drain a scanner into a vector, stopping at the first error.
pub fn tokenize(scanner: Scanner) -> Result<Vec<(Token, Position)>, ScanError> {
    scanner.collect()
}
