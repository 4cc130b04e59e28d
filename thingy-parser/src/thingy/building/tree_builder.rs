//! Recursive descent over the token stream

use crate::thingy::ast::Node;
use crate::thingy::error::{ParseError, ScanError, SyntaxError, SyntaxErrorKind};
use crate::thingy::token::{is_key_name, Position, Token};
use tracing::trace;

/// Location reported for tokens that arrive outside any file span
const NO_FILE: &str = "<token stream>";

enum Terminator {
    EndFile,
    Bracket,
}

/// What a KEY turns into, decided by the token after it
enum Follow {
    Value,
    Group,
    Nothing,
}

/// Builds one root [Node] per top-level file from a token stream.
pub struct TreeBuilder<I> {
    tokens: I,
    peeked: Option<(Token, Position)>,
    files: Vec<String>,
    last_position: Position,
}

impl<I> TreeBuilder<I>
where
    I: Iterator<Item = Result<(Token, Position), ScanError>>,
{
    pub fn new(tokens: I) -> Self {
        TreeBuilder {
            tokens,
            peeked: None,
            files: Vec::new(),
            last_position: Position::start(),
        }
    }

    pub fn build(mut self) -> Result<Vec<Node>, ParseError> {
        let mut roots = Vec::new();
        while let Some((token, position)) = self.next_token()? {
            match token {
                Token::NewFile { location, .. } => {
                    let mut root = Node::container(location.clone());
                    self.files.push(location);
                    self.parse_body(&mut root, Terminator::EndFile)?;
                    self.files.pop();
                    trace!(
                        location = root.label(),
                        nodes = root.subtree_size(),
                        "built file tree"
                    );
                    roots.push(root);
                }
                Token::EndFile => {
                    return Err(self.error(position, SyntaxErrorKind::UnexpectedEndFile))
                }
                other => {
                    return Err(self.error(position, SyntaxErrorKind::OutsideFile(other.kind_name())))
                }
            }
        }
        Ok(roots)
    }

    fn error(&self, position: Position, kind: SyntaxErrorKind) -> ParseError {
        let location = self.files.last().map(String::as_str).unwrap_or(NO_FILE);
        ParseError::Syntax(SyntaxError {
            location: location.to_string(),
            position,
            kind,
        })
    }

    /// Next non-comment token
    fn next_token(&mut self) -> Result<Option<(Token, Position)>, ParseError> {
        if let Some(token) = self.peeked.take() {
            return Ok(Some(token));
        }
        for item in self.tokens.by_ref() {
            let (token, position) = item?;
            self.last_position = position;
            if !matches!(token, Token::Comment(_)) {
                return Ok(Some((token, position)));
            }
        }
        Ok(None)
    }

    fn peek(&mut self) -> Result<Option<&Token>, ParseError> {
        if self.peeked.is_none() {
            self.peeked = self.next_token()?;
        }
        Ok(self.peeked.as_ref().map(|(token, _)| token))
    }

    fn parse_body(&mut self, parent: &mut Node, terminator: Terminator) -> Result<(), ParseError> {
        loop {
            let Some((token, position)) = self.next_token()? else {
                let kind = match terminator {
                    Terminator::EndFile => SyntaxErrorKind::UnexpectedEnd,
                    Terminator::Bracket => SyntaxErrorKind::MissingClose,
                };
                return Err(self.error(self.last_position, kind));
            };
            match token {
                Token::EndFile => {
                    return match terminator {
                        Terminator::EndFile => Ok(()),
                        Terminator::Bracket => Err(self.error(position, SyntaxErrorKind::MissingClose)),
                    }
                }
                Token::CloseBracket => {
                    return match terminator {
                        Terminator::Bracket => Ok(()),
                        Terminator::EndFile => {
                            Err(self.error(position, SyntaxErrorKind::UnmatchedClose))
                        }
                    }
                }
                Token::NewFile { location, .. } => {
                    self.files.push(location);
                    self.parse_body(parent, Terminator::EndFile)?;
                    self.files.pop();
                }
                Token::Value(literal) => {
                    parent.add(literal.text);
                }
                Token::OpenBracket => {
                    let mut group = Node::container("");
                    self.parse_body(&mut group, Terminator::Bracket)?;
                    parent.add_child(group);
                }
                Token::Key(name) => self.parse_key(parent, name, position)?,
                Token::Comment(_) => {}
            }
        }
    }

    fn parse_key(
        &mut self,
        parent: &mut Node,
        name: String,
        position: Position,
    ) -> Result<(), ParseError> {
        let follow = match self.peek()? {
            Some(Token::Value(_)) | Some(Token::Key(_)) => Follow::Value,
            Some(Token::OpenBracket) => Follow::Group,
            _ => Follow::Nothing,
        };
        if !matches!(follow, Follow::Nothing) && !is_key_name(&name) {
            return Err(self.error(position, SyntaxErrorKind::InvalidKeyName(name)));
        }
        match follow {
            Follow::Value => {
                let value = match self.next_token()? {
                    Some((Token::Value(literal), _)) => literal.text,
                    Some((Token::Key(bare), _)) => bare,
                    _ => String::new(),
                };
                parent.add(name).add(value);
            }
            Follow::Group => {
                self.next_token()?;
                let mut node = Node::container(name);
                self.parse_body(&mut node, Terminator::Bracket)?;
                parent.add_child(node);
            }
            Follow::Nothing => {
                parent.add(name);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::thingy::building::build_from_tokens;
    use crate::thingy::token::{Literal, Quote};

    fn at(token: Token) -> (Token, Position) {
        (token, Position::start())
    }

    fn new_file(location: &str) -> (Token, Position) {
        at(Token::NewFile {
            location: location.into(),
            directive: None,
        })
    }

    fn key(name: &str) -> (Token, Position) {
        at(Token::Key(name.into()))
    }

    fn value(text: &str) -> (Token, Position) {
        at(Token::Value(Literal::new(text, Quote::Double)))
    }

    fn pair(name: &str, text: &str) -> Node {
        let mut node = Node::container(name);
        node.add(text);
        node
    }

    fn syntax_kind(tokens: Vec<(Token, Position)>) -> SyntaxErrorKind {
        match build_from_tokens(tokens) {
            Err(ParseError::Syntax(e)) => e.kind,
            other => panic!("expected a syntax error, got {other:?}"),
        }
    }

    #[test]
    fn test_pairs_groups_and_bare_items() {
        let roots = build_from_tokens(vec![
            new_file("main"),
            key("A"),
            value("x"),
            key("L"),
            at(Token::OpenBracket),
            value("a"),
            key("b"),
            at(Token::CloseBracket),
            at(Token::Comment("# ignored".into())),
            key("BARE"),
            at(Token::EndFile),
        ])
        .unwrap();
        let mut expected = Node::container("main");
        expected.add_child(pair("A", "x"));
        let list = expected.add("L");
        list.add("a");
        list.add("b");
        expected.add("BARE");
        assert_eq!(roots, vec![expected]);
    }

    #[test]
    fn test_key_followed_by_key_takes_bare_value() {
        let roots =
            build_from_tokens(vec![new_file("m"), key("A"), key("on"), at(Token::EndFile)])
                .unwrap();
        assert_eq!(roots[0].get("A").unwrap(), &pair("A", "on"));
    }

    #[test]
    fn test_comment_between_key_and_value_is_skipped() {
        let roots = build_from_tokens(vec![
            new_file("m"),
            key("A"),
            at(Token::Comment("# c".into())),
            value("x"),
            at(Token::EndFile),
        ])
        .unwrap();
        assert_eq!(roots[0].children(), &[pair("A", "x")]);
    }

    #[test]
    fn test_nested_file_is_spliced_into_open_node() {
        let roots = build_from_tokens(vec![
            new_file("main"),
            key("G"),
            at(Token::OpenBracket),
            new_file("inc"),
            key("B"),
            value("b"),
            at(Token::EndFile),
            at(Token::CloseBracket),
            at(Token::EndFile),
            new_file("second"),
            at(Token::EndFile),
        ])
        .unwrap();
        assert_eq!(roots.len(), 2);
        assert_eq!(roots[0].get("G").unwrap().children(), &[pair("B", "b")]);
        assert_eq!(roots[1], Node::container("second"));
    }

    #[test]
    fn test_syntax_errors() {
        assert_eq!(
            syntax_kind(vec![new_file("m"), at(Token::CloseBracket)]),
            SyntaxErrorKind::UnmatchedClose
        );
        assert_eq!(
            syntax_kind(vec![new_file("m"), at(Token::OpenBracket), at(Token::EndFile)]),
            SyntaxErrorKind::MissingClose
        );
        assert_eq!(
            syntax_kind(vec![new_file("m"), key("A")]),
            SyntaxErrorKind::UnexpectedEnd
        );
        assert_eq!(
            syntax_kind(vec![at(Token::EndFile)]),
            SyntaxErrorKind::UnexpectedEndFile
        );
        assert_eq!(
            syntax_kind(vec![key("A")]),
            SyntaxErrorKind::OutsideFile("KEY")
        );
    }

    #[test]
    fn test_words_outside_the_key_alphabet_are_only_values() {
        for name in ["A%B", "$X", "a/b"] {
            assert_eq!(
                syntax_kind(vec![new_file("m"), key(name), value("x"), at(Token::EndFile)]),
                SyntaxErrorKind::InvalidKeyName(name.into())
            );
            assert_eq!(
                syntax_kind(vec![
                    new_file("m"),
                    key(name),
                    at(Token::OpenBracket),
                    at(Token::CloseBracket),
                    at(Token::EndFile),
                ]),
                SyntaxErrorKind::InvalidKeyName(name.into())
            );
        }
        let roots = build_from_tokens(vec![
            new_file("m"),
            key("A"),
            key("50%n"),
            key("a/b"),
            at(Token::EndFile),
        ])
        .unwrap();
        let mut expected = Node::container("m");
        expected.add_child(pair("A", "50%n"));
        expected.add("a/b");
        assert_eq!(roots, vec![expected]);
    }

    #[test]
    fn test_scan_errors_pass_through() {
        let scan_error = ScanError::new(
            "m",
            Position::new(2, 3),
            crate::thingy::error::ScanErrorKind::UnterminatedQuote,
        );
        let tokens = vec![Ok(new_file("m")), Err(scan_error.clone())];
        match TreeBuilder::new(tokens.into_iter()).build() {
            Err(ParseError::Scan(e)) => assert_eq!(e, scan_error),
            other => panic!("expected the scan error, got {other:?}"),
        }
    }
}
