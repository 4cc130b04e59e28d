//! The include-expanding scanner

use crate::thingy::error::{ScanError, ScanErrorKind};
use crate::thingy::formats::escape;
use crate::thingy::source::{resolve_include, Source, SourceProvider};
use crate::thingy::token::{Literal, Position, Quote, Token};
use std::collections::VecDeque;
use std::io::{BufRead, Cursor};
use std::sync::Arc;
use tracing::debug;
use url::Url;

pub const DEFAULT_MAX_INCLUDE_DEPTH: usize = 32;
pub const DEFAULT_MAX_NESTING: usize = 256;

const INCLUDE_DIRECTIVE: &str = "%include";

fn is_separator(c: char) -> bool {
    c.is_whitespace() || matches!(c, '\u{00A0}' | '\u{FEFF}' | ',' | ';')
}

fn ends_word(c: char) -> bool {
    is_separator(c) || matches!(c, '(' | ')' | '\'' | '"' | '#')
}

/// One open source
struct Frame {
    location: String,
    /// Identity for cycle detection. `None` for inline text.
    url: Option<Url>,
    /// Anchor for relative includes
    base: Option<Url>,
    reader: Box<dyn BufRead>,
    line: Vec<char>,
    line_no: usize,
    column: usize,
    /// Positions of the `(` not yet closed in this source
    open_brackets: Vec<Position>,
}

impl Frame {
    fn position(&self) -> Position {
        Position::new(self.line_no, self.column + 1)
    }

    fn error(&self, kind: ScanErrorKind) -> ScanError {
        ScanError::new(self.location.clone(), self.position(), kind)
    }

    /// Advance past separators, reading further lines as needed. `false` at end of input.
    fn skip_separators(&mut self) -> Result<bool, ScanError> {
        loop {
            while self.column < self.line.len() && is_separator(self.line[self.column]) {
                self.column += 1;
            }
            if self.column < self.line.len() {
                return Ok(true);
            }
            if !self.read_line()? {
                return Ok(false);
            }
        }
    }

    fn read_line(&mut self) -> Result<bool, ScanError> {
        let mut buf = String::new();
        let read = self
            .reader
            .read_line(&mut buf)
            .map_err(|e| self.error(ScanErrorKind::Io(e.to_string())))?;
        if read == 0 {
            // park the position one past the last line
            self.line.clear();
            self.line_no += 1;
            self.column = 0;
            return Ok(false);
        }
        if buf.ends_with('\n') {
            buf.pop();
            if buf.ends_with('\r') {
                buf.pop();
            }
        }
        self.line = buf.chars().collect();
        self.line_no += 1;
        self.column = 0;
        Ok(true)
    }

    fn read_word(&mut self) -> String {
        let start = self.column;
        while self.column < self.line.len() && !ends_word(self.line[self.column]) {
            self.column += 1;
        }
        self.line[start..self.column].iter().collect()
    }

    /// Read the quoted literal starting at the current column.
    fn read_literal(&mut self, quote: Quote) -> Result<Literal, ScanError> {
        let start = self.position();
        let delimiter = quote.as_char();
        let mut i = self.column + 1;
        loop {
            match self.line.get(i) {
                None => {
                    return Err(ScanError::new(
                        self.location.clone(),
                        start,
                        ScanErrorKind::UnterminatedQuote,
                    ))
                }
                Some(&c) if c == delimiter => {
                    if self.line.get(i + 1) == Some(&delimiter) {
                        i += 2;
                    } else {
                        break;
                    }
                }
                Some(_) => i += 1,
            }
        }
        let body: String = self.line[self.column + 1..i].iter().collect();
        self.column = i + 1;
        let text = escape::decode(&body, quote).map_err(|e| {
            ScanError::new(
                self.location.clone(),
                start,
                ScanErrorKind::InvalidEscape(e.to_string()),
            )
        })?;
        Ok(Literal::new(text, quote))
    }
}

/// Pull-based tokenizer with `%include` expansion.
///
/// Yields `(Token, Position)` pairs; positions are relative to the source named by the
/// innermost open NEW_FILE.
pub struct Scanner {
    provider: Arc<dyn SourceProvider>,
    root: Option<Source>,
    frames: Vec<Frame>,
    pending: VecDeque<(Token, Position)>,
    max_include_depth: usize,
    max_nesting: usize,
    done: bool,
}

impl Scanner {
    pub fn new(source: Source, provider: Arc<dyn SourceProvider>) -> Self {
        Scanner {
            provider,
            root: Some(source),
            frames: Vec::new(),
            pending: VecDeque::new(),
            max_include_depth: DEFAULT_MAX_INCLUDE_DEPTH,
            max_nesting: DEFAULT_MAX_NESTING,
            done: false,
        }
    }

    /// Limit how many `%include` levels may be open at once
    pub fn with_max_include_depth(mut self, depth: usize) -> Self {
        self.max_include_depth = depth;
        self
    }

    /// Limit how many `(` may be open at once, counted across all open sources
    pub fn with_max_nesting(mut self, depth: usize) -> Self {
        self.max_nesting = depth;
        self
    }

    /// Release every open source. The scanner yields nothing afterwards.
    pub fn close(&mut self) {
        if !self.frames.is_empty() {
            debug!(open = self.frames.len(), "closing scanner");
        }
        self.frames.clear();
        self.pending.clear();
        self.root = None;
        self.done = true;
    }

    /// Location of the innermost open source
    pub fn current_location(&self) -> Option<&str> {
        self.frames.last().map(|f| f.location.as_str())
    }

    fn fail(&mut self, error: ScanError) -> ScanError {
        self.close();
        error
    }

    fn open_root(&mut self, source: Source) -> Result<(), ScanError> {
        let location = source.location();
        let (url, base, reader): (Option<Url>, Option<Url>, Box<dyn BufRead>) = match source {
            Source::Url(url) => {
                let reader = self.provider.open(&url).map_err(|e| {
                    ScanError::new(
                        location.clone(),
                        Position::start(),
                        ScanErrorKind::Io(e.to_string()),
                    )
                })?;
                (Some(url.clone()), Some(url), reader)
            }
            Source::Text { base, text, .. } => {
                (None, base, Box::new(Cursor::new(text.into_bytes())))
            }
        };
        debug!(location = %location, "opening source");
        self.pending.push_back((
            Token::NewFile {
                location: location.clone(),
                directive: None,
            },
            Position::start(),
        ));
        self.frames.push(Frame {
            location,
            url,
            base,
            reader,
            line: Vec::new(),
            line_no: 0,
            column: 0,
            open_brackets: Vec::new(),
        });
        Ok(())
    }

    fn open_include(&mut self, path: String, at: Position) -> Result<(), ScanError> {
        let Some(frame) = self.frames.last() else {
            return Ok(());
        };
        let error = |kind| ScanError::new(frame.location.clone(), at, kind);
        if self.frames.len() > self.max_include_depth {
            return Err(error(ScanErrorKind::IncludeTooDeep(self.max_include_depth)));
        }
        let url = resolve_include(frame.base.as_ref(), &path).map_err(|reason| {
            error(ScanErrorKind::UnresolvedInclude {
                path: path.clone(),
                reason,
            })
        })?;
        if self.frames.iter().any(|f| f.url.as_ref() == Some(&url)) {
            return Err(error(ScanErrorKind::IncludeCycle(url.to_string())));
        }
        let reader = self.provider.open(&url).map_err(|e| {
            error(ScanErrorKind::UnresolvedInclude {
                path: path.clone(),
                reason: e.to_string(),
            })
        })?;
        let location = url.to_string();
        debug!(location = %location, depth = self.frames.len(), "opening include");
        self.pending.push_back((
            Token::NewFile {
                location: location.clone(),
                directive: Some(path),
            },
            at,
        ));
        self.frames.push(Frame {
            location,
            url: Some(url.clone()),
            base: Some(url),
            reader,
            line: Vec::new(),
            line_no: 0,
            column: 0,
            open_brackets: Vec::new(),
        });
        Ok(())
    }

    /// Scan up to the next token of the innermost frame, or finish that frame.
    fn step(&mut self) -> Result<(), ScanError> {
        let max_nesting = self.max_nesting;
        let outer_nesting: usize = self
            .frames
            .iter()
            .rev()
            .skip(1)
            .map(|f| f.open_brackets.len())
            .sum();
        let Some(frame) = self.frames.last_mut() else {
            return Ok(());
        };
        if !frame.skip_separators()? {
            if let Some(&open) = frame.open_brackets.last() {
                let count = frame.open_brackets.len();
                return Err(ScanError::new(
                    frame.location.clone(),
                    open,
                    ScanErrorKind::UnclosedBracket(count),
                ));
            }
            let position = Position::new(frame.line_no, 1);
            debug!(location = %frame.location, "closing source");
            self.frames.pop();
            self.pending.push_back((Token::EndFile, position));
            return Ok(());
        }

        let position = frame.position();
        let c = frame.line[frame.column];
        let token = match c {
            '#' => {
                let text: String = frame.line[frame.column..].iter().collect();
                frame.column = frame.line.len();
                Token::Comment(text)
            }
            '(' => {
                if outer_nesting + frame.open_brackets.len() >= max_nesting {
                    return Err(frame.error(ScanErrorKind::NestingTooDeep(max_nesting)));
                }
                frame.column += 1;
                frame.open_brackets.push(position);
                Token::OpenBracket
            }
            ')' => {
                if frame.open_brackets.pop().is_none() {
                    return Err(frame.error(ScanErrorKind::UnbalancedClose));
                }
                frame.column += 1;
                Token::CloseBracket
            }
            '\'' | '"' => {
                let quote = Quote::from_char(c).unwrap_or_default();
                Token::Value(frame.read_literal(quote)?)
            }
            _ => {
                let word = frame.read_word();
                if word == INCLUDE_DIRECTIVE {
                    let path = read_include_path(frame, position)?;
                    return self.open_include(path, position);
                }
                Token::Key(word)
            }
        };
        self.pending.push_back((token, position));
        Ok(())
    }
}

/// The quoted path after `%include`, possibly on a following line
fn read_include_path(frame: &mut Frame, directive: Position) -> Result<String, ScanError> {
    let missing = ScanError::new(
        frame.location.clone(),
        directive,
        ScanErrorKind::MissingIncludePath,
    );
    if !frame.skip_separators()? {
        return Err(missing);
    }
    let Some(quote) = Quote::from_char(frame.line[frame.column]) else {
        return Err(missing);
    };
    let literal = frame.read_literal(quote)?;
    if literal.text.is_empty() {
        return Err(missing);
    }
    Ok(literal.text)
}

impl Iterator for Scanner {
    type Item = Result<(Token, Position), ScanError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(token) = self.pending.pop_front() {
                return Some(Ok(token));
            }
            if self.done {
                return None;
            }
            if let Some(root) = self.root.take() {
                if let Err(e) = self.open_root(root) {
                    return Some(Err(self.fail(e)));
                }
                continue;
            }
            if self.frames.is_empty() {
                self.done = true;
                return None;
            }
            if let Err(e) = self.step() {
                return Some(Err(self.fail(e)));
            }
        }
    }
}

impl Drop for Scanner {
    fn drop(&mut self) {
        self.close();
    }
}
