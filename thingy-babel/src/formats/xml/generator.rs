//! Token stream -> `<config>` document

use crate::dom::Element;
use crate::error::XmlError;
use crate::schema::{self, COMMENT, CONFIG, FILE, GROUP, INCLUDE, KEY, VALUE};
use std::iter::Peekable;
use std::sync::Arc;
use thingy_parser::thingy::lexing::Scanner;
use thingy_parser::thingy::source::{Source, SourceProvider};
use thingy_parser::thingy::error::{SyntaxError, SyntaxErrorKind};
use thingy_parser::thingy::{is_key_name, Literal, Position, Token};
use tracing::debug;

/// A `<file>` under construction
struct OpenFile {
    /// Index among all `<file>` elements, in NEW_FILE order
    slot: usize,
    file: Element,
    /// Open `<key>` and `<group>` elements, innermost last
    open: Vec<Element>,
    /// Line of the last non-comment token of this file
    last_line: Option<usize>,
}

impl OpenFile {
    fn parent(&mut self) -> &mut Element {
        match self.open.last_mut() {
            Some(element) => element,
            None => &mut self.file,
        }
    }

    fn push(&mut self, element: Element) {
        self.parent().push_element(element);
    }

    fn comment(&self, text: String, position: Position) -> Element {
        let element = Element::new(COMMENT);
        let element = if self.last_line == Some(position.line) {
            element.with_attribute("trailing", "true")
        } else {
            element
        };
        element.with_text(text)
    }

    /// Close the innermost open element into its parent
    fn close(&mut self) -> Result<(), XmlError> {
        let element = self
            .open
            .pop()
            .ok_or_else(|| XmlError::Malformed(format!("unbalanced ')' in {}", self.src())))?;
        self.push(element);
        Ok(())
    }

    fn src(&self) -> &str {
        self.file.attribute("src").unwrap_or_default()
    }
}

/// Converts the raw token stream of a configuration into a schema-valid `<config>`
/// document, one `<file>` per source.
pub struct XmlGenerator {
    scanner: Scanner,
}

impl XmlGenerator {
    pub fn new(scanner: Scanner) -> Self {
        XmlGenerator { scanner }
    }

    pub fn from_source(source: Source, provider: Arc<dyn SourceProvider>) -> Self {
        XmlGenerator::new(Scanner::new(source, provider))
    }

    pub fn generate(self) -> Result<Element, XmlError> {
        let mut tokens = self.scanner.peekable();
        let mut files: Vec<Option<Element>> = Vec::new();
        let mut open: Vec<OpenFile> = Vec::new();

        while let Some(next) = tokens.next() {
            let (token, position) = next?;
            match token {
                Token::NewFile {
                    location,
                    directive,
                } => {
                    if let Some(path) = directive {
                        let including = current(&mut open, &location)?;
                        including.last_line = Some(position.line);
                        including.push(
                            Element::new(INCLUDE)
                                .with_attribute("src", location.as_str())
                                .with_text(path),
                        );
                    }
                    debug!(src = %location, "xml file element");
                    open.push(OpenFile {
                        slot: files.len(),
                        file: Element::new(FILE).with_attribute("src", location),
                        open: Vec::new(),
                        last_line: None,
                    });
                    files.push(None);
                }
                Token::EndFile => {
                    let done = open
                        .pop()
                        .ok_or_else(|| XmlError::Malformed("END_FILE without NEW_FILE".into()))?;
                    if !done.open.is_empty() {
                        return Err(XmlError::Malformed(format!(
                            "unclosed group in {}",
                            done.src()
                        )));
                    }
                    files[done.slot] = Some(done.file);
                }
                Token::Comment(text) => {
                    let file = current(&mut open, &text)?;
                    let comment = file.comment(text, position);
                    file.push(comment);
                }
                Token::Value(literal) => {
                    let file = current(&mut open, &literal.text)?;
                    file.last_line = Some(position.line);
                    file.push(quoted_value(literal));
                }
                Token::OpenBracket => {
                    let file = current(&mut open, "(")?;
                    file.last_line = Some(position.line);
                    file.open.push(Element::new(GROUP));
                }
                Token::CloseBracket => {
                    let file = current(&mut open, ")")?;
                    file.last_line = Some(position.line);
                    file.close()?;
                    if file.open.last().is_some_and(|e| e.name == KEY) {
                        file.close()?;
                    }
                }
                Token::Key(name) => {
                    let file = current(&mut open, &name)?;
                    file.last_line = Some(position.line);
                    let comments = held_comments(&mut tokens, file);
                    let next = tokens.next_if(|next| {
                        matches!(
                            next,
                            Ok((Token::Value(_) | Token::Key(_) | Token::OpenBracket, _))
                        )
                    });
                    if next.is_some() && !is_key_name(&name) {
                        return Err(XmlError::Syntax(SyntaxError {
                            location: file.src().to_string(),
                            position,
                            kind: SyntaxErrorKind::InvalidKeyName(name),
                        }));
                    }
                    let value = match next {
                        Some(Ok((Token::Value(literal), at))) => Some((quoted_value(literal), at)),
                        Some(Ok((Token::Key(word), at))) => Some((bare_value(word), at)),
                        Some(Ok((_, at))) => {
                            file.last_line = Some(at.line);
                            file.open.push(Element::new(KEY).with_attribute("id", name));
                            let mut group = Element::new(GROUP);
                            for comment in comments {
                                group.push_element(comment);
                            }
                            file.open.push(group);
                            continue;
                        }
                        _ => None,
                    };
                    match value {
                        Some((value, at)) => {
                            file.last_line = Some(at.line);
                            let mut key = Element::new(KEY).with_attribute("id", name);
                            key.push_element(value);
                            file.push(key);
                        }
                        None => file.push(bare_value(name)),
                    }
                    for comment in comments {
                        file.push(comment);
                    }
                }
            }
        }

        if let Some(unfinished) = open.last() {
            return Err(XmlError::Malformed(format!(
                "token stream ended inside {}",
                unfinished.src()
            )));
        }
        let mut config = Element::new(CONFIG);
        for file in files.into_iter().flatten() {
            config.push_element(file);
        }
        schema::validate(&config)?;
        Ok(config)
    }
}

fn current<'a>(open: &'a mut [OpenFile], token: &str) -> Result<&'a mut OpenFile, XmlError> {
    open.last_mut()
        .ok_or_else(|| XmlError::Malformed(format!("'{token}' outside of any file")))
}

fn quoted_value(literal: Literal) -> Element {
    Element::new(VALUE)
        .with_attribute("quote", literal.quote.as_str())
        .with_text(literal.text)
}

fn bare_value(word: String) -> Element {
    Element::new(VALUE)
        .with_attribute("quote", "none")
        .with_text(word)
}

type Tokens = Peekable<Scanner>;

/// Take the comments directly after a KEY so the lookahead can see past them.
fn held_comments(tokens: &mut Tokens, file: &OpenFile) -> Vec<Element> {
    let mut comments = Vec::new();
    while let Some(Ok((Token::Comment(text), position))) =
        tokens.next_if(|next| matches!(next, Ok((Token::Comment(_), _))))
    {
        comments.push(file.comment(text, position));
    }
    comments
}

#[cfg(test)]
mod tests {
    use super::*;
    use thingy_parser::thingy::source::MemoryProvider;
    use url::Url;

    fn generate(text: &str) -> Result<Element, XmlError> {
        XmlGenerator::from_source(Source::text("main", text), Arc::new(MemoryProvider::new()))
            .generate()
    }

    fn xml(text: &str) -> String {
        generate(text).unwrap().to_xml_string(2).unwrap()
    }

    #[test]
    fn test_keys_values_and_groups() {
        insta::assert_snapshot!(xml("A 'x' B bare L(\"a\" 'b') ('v') W"), @r###"
        <?xml version="1.0" encoding="UTF-8"?>
        <config>
          <file src="main">
            <key id="A">
              <value quote="single">x</value>
            </key>
            <key id="B">
              <value quote="none">bare</value>
            </key>
            <key id="L">
              <group>
                <value quote="double">a</value>
                <value quote="single">b</value>
              </group>
            </key>
            <group>
              <value quote="double">v</value>
            </group>
            <value quote="none">W</value>
          </file>
        </config>
        "###);
    }

    #[test]
    fn test_nested_keys_close_with_their_group() {
        let root = generate("G(A(B 'x') C 'y') D 'z'").unwrap();
        let file = root.elements().next().unwrap();
        let ids: Vec<_> = file.elements().map(|e| e.attribute("id").unwrap()).collect();
        assert_eq!(ids, vec!["G", "D"]);
        let group = file.elements().next().unwrap().elements().next().unwrap();
        let inner: Vec<_> = group.elements().map(|e| e.attribute("id").unwrap()).collect();
        assert_eq!(inner, vec!["A", "C"]);
    }

    #[test]
    fn test_comments_are_kept_and_marked_trailing() {
        let root = generate("# head\nA 'x' # same line\n# own line\nB # between\n 'y'").unwrap();
        let file = root.elements().next().unwrap();
        let items: Vec<(&str, Option<&str>, String)> = file
            .elements()
            .map(|e| (e.name.as_str(), e.attribute("trailing"), e.text()))
            .collect();
        assert_eq!(
            items,
            vec![
                ("comment", None, "# head".to_string()),
                ("key", None, String::new()),
                ("comment", Some("true"), "# same line".to_string()),
                ("comment", None, "# own line".to_string()),
                ("key", None, String::new()),
                ("comment", Some("true"), "# between".to_string()),
            ]
        );
    }

    #[test]
    fn test_values_are_decoded() {
        let root = generate("NAME \"WollMux%%%n\"").unwrap();
        let value = root.elements().next().unwrap().elements().next().unwrap();
        assert_eq!(value.elements().next().unwrap().text(), "WollMux%\n");
    }

    #[test]
    fn test_includes_become_flat_files() {
        let sources = MemoryProvider::new()
            .with("mem:/conf/inc.conf", "I 'i' %include 'deep.conf'")
            .with("mem:/conf/deep.conf", "D 'd'");
        let source = Source::text("main", "A 'a'\n%include 'inc.conf' # here\nB 'b'")
            .with_base(Url::parse("mem:/conf/main.conf").unwrap());
        let root = XmlGenerator::from_source(source, Arc::new(sources))
            .generate()
            .unwrap();
        let srcs: Vec<_> = root.elements().map(|f| f.attribute("src").unwrap()).collect();
        assert_eq!(srcs, vec!["main", "mem:/conf/inc.conf", "mem:/conf/deep.conf"]);

        let main = root.elements().next().unwrap();
        let names: Vec<_> = main.elements().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["key", "include", "comment", "key"]);
        let include = main.elements().nth(1).unwrap();
        assert_eq!(include.attribute("src"), Some("mem:/conf/inc.conf"));
        assert_eq!(include.text(), "inc.conf");
        assert_eq!(main.elements().nth(2).unwrap().attribute("trailing"), Some("true"));
    }

    #[test]
    fn test_scan_errors_pass_through() {
        assert!(matches!(generate("A ("), Err(XmlError::Scan(_))));
    }

    #[test]
    fn test_keys_outside_the_key_alphabet_are_syntax_errors() {
        match generate("A 'a'\n  A%B 'x'") {
            Err(XmlError::Syntax(e)) => {
                assert_eq!(e.kind, SyntaxErrorKind::InvalidKeyName("A%B".into()));
                assert_eq!(e.location, "main");
                assert_eq!(e.position, Position::new(2, 3));
            }
            other => panic!("expected a syntax error, got {other:?}"),
        }
        assert!(matches!(generate("$X ('y')"), Err(XmlError::Syntax(_))));
    }

    #[test]
    fn test_odd_bare_words_are_values() {
        let root = generate("A $X\na/b").unwrap();
        let file = root.elements().next().unwrap();
        let items: Vec<(&str, String)> = file
            .elements()
            .map(|e| (e.name.as_str(), e.text()))
            .collect();
        assert_eq!(items, vec![("key", String::new()), ("value", "a/b".to_string())]);
        let a = file.elements().next().unwrap();
        assert_eq!(a.elements().next().unwrap().text(), "$X");
    }
}
