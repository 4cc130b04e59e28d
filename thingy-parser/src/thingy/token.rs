//! Token definitions
//!
//!     The scanner emits a flat stream of `(Token, Position)` pairs. Besides the lexical
//!     tokens, the stream carries file boundaries: every source (the root and each
//!     included file) is bracketed by `NewFile` / `EndFile`, nested at the point where the
//!     `%include` directive appeared.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single token of the conf format
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Token {
    /// Start of a source. `location` is the resolved location, `directive` the path as it
    /// was written in the `%include` directive (`None` for the root source).
    NewFile {
        location: String,
        directive: Option<String>,
    },
    /// End of the most recently opened source
    EndFile,
    /// A `#` comment, verbatim up to the end of the line (without the line terminator)
    Comment(String),
    /// A bare word. Whether it names a key or is a bare value depends on what follows it.
    Key(String),
    /// A quoted literal, already dequoted and unescaped
    Value(Literal),
    OpenBracket,
    CloseBracket,
}

impl Token {
    /// Short kind name, as used in diagnostics
    pub fn kind_name(&self) -> &'static str {
        match self {
            Token::NewFile { .. } => "NEW_FILE",
            Token::EndFile => "END_FILE",
            Token::Comment(_) => "COMMENT",
            Token::Key(_) => "KEY",
            Token::Value(_) => "VALUE",
            Token::OpenBracket => "OPENING_BRACKET",
            Token::CloseBracket => "CLOSING_BRACKET",
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::NewFile { location, .. } => write!(f, "NEW_FILE({})", location),
            Token::Comment(text) => write!(f, "COMMENT({})", text),
            Token::Key(name) => write!(f, "KEY({})", name),
            Token::Value(literal) => write!(f, "VALUE({})", literal),
            other => f.write_str(other.kind_name()),
        }
    }
}

/// Whether `name` may stand before a value or group as a key: a non-empty run of letters,
/// digits and `.` `-` `_` `:` `\u{B7}`. These are the XML NMTOKENs a `<key id>` accepts.
pub fn is_key_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '.' | '-' | '_' | ':' | '\u{B7}'))
}

/// Content of a quoted value together with the delimiter it was written with
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Literal {
    pub text: String,
    pub quote: Quote,
}

impl Literal {
    pub fn new(text: impl Into<String>, quote: Quote) -> Self {
        Literal {
            text: text.into(),
            quote,
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&crate::thingy::formats::escape::quote(&self.text, self.quote))
    }
}

/// String delimiter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Quote {
    Single,
    #[default]
    Double,
}

impl Quote {
    pub fn as_char(self) -> char {
        match self {
            Quote::Single => '\'',
            Quote::Double => '"',
        }
    }

    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '\'' => Some(Quote::Single),
            '"' => Some(Quote::Double),
            _ => None,
        }
    }

    /// Attribute spelling used by the XML bridge
    pub fn as_str(self) -> &'static str {
        match self {
            Quote::Single => "single",
            Quote::Double => "double",
        }
    }
}

/// 1-based line and column (in characters) within a source
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Position { line, column }
    }

    pub fn start() -> Self {
        Position::new(1, 1)
    }
}

impl Default for Position {
    fn default() -> Self {
        Position::start()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}
