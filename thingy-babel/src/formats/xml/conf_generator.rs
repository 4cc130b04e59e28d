//! `<config>` document -> conf text
//!
//!     Every `<file>` becomes one text. The layout is canonical:
//!
//!         - one item per line at file level and inside multi-line groups
//!         - a group is multi-line when it holds a comment or an include at any depth, when
//!           it is the value of a key and holds keys at any depth, or when one of its groups
//!           is multi-line
//!         - other groups stay on one line, values separated by `, ` when the group has no
//!           keys and by a space otherwise
//!         - a trailing comment goes at the end of the previous line
//!
//!     Values keep the quote they were written with. Bare values stay bare when that reads
//!     back as the same value: as the value of a key, or as the last item before `)` or the
//!     end of the file. Everything else gets double quotes, or single quotes if the
//!     text contains a double quote.

use crate::dom::Element;
use crate::error::XmlError;
use crate::schema::{self, COMMENT, GROUP, INCLUDE, KEY, VALUE};
use indexmap::IndexMap;
use std::fs;
use std::path::PathBuf;
use thingy_parser::thingy::formats::escape;
use thingy_parser::thingy::Quote;
use tracing::{debug, info};
use url::Url;

const INDENT: &str = "  ";
const INCLUDE_DIRECTIVE: &str = "%include";

/// Writes conf text back out of a validated `<config>` document.
#[derive(Debug)]
pub struct ConfGenerator {
    files: Vec<Element>,
}

impl ConfGenerator {
    pub fn new(config: &Element) -> Result<Self, XmlError> {
        schema::validate(config)?;
        Ok(ConfGenerator {
            files: config.elements().cloned().collect(),
        })
    }

    /// The first file with every include replaced by the content of its file
    pub fn generate_conf(&self) -> Result<String, XmlError> {
        let Some(first) = self.files.first() else {
            return Ok(String::new());
        };
        let mut cursor = 1;
        let mut lines = Vec::new();
        Printer {
            files: &self.files,
            cursor: Some(&mut cursor),
        }
        .block(first, 0, true, &mut lines)?;
        Ok(finish(lines))
    }

    /// One text per file, keyed by the file's `src`, in document order
    pub fn generate_conf_map(&self) -> Result<IndexMap<String, String>, XmlError> {
        let mut map = IndexMap::with_capacity(self.files.len());
        for file in &self.files {
            let mut lines = Vec::new();
            Printer {
                files: &self.files,
                cursor: None,
            }
            .block(file, 0, true, &mut lines)?;
            map.insert(src(file).to_string(), finish(lines));
        }
        Ok(map)
    }

    /// Write every file back to its location. Only `file:` URLs can be written.
    pub fn write_files(&self) -> Result<Vec<PathBuf>, XmlError> {
        let map = self.generate_conf_map()?;
        let mut written = Vec::with_capacity(map.len());
        for (src, text) in &map {
            let path = Url::parse(src)
                .ok()
                .filter(|url| url.scheme() == "file")
                .and_then(|url| url.to_file_path().ok())
                .ok_or_else(|| XmlError::NotAFile { src: src.clone() })?;
            debug!(path = %path.display(), bytes = text.len(), "writing conf file");
            fs::write(&path, text)?;
            written.push(path);
        }
        info!(files = written.len(), "configuration written back");
        Ok(written)
    }
}

fn src(file: &Element) -> &str {
    file.attribute("src").unwrap_or_default()
}

fn finish(lines: Vec<String>) -> String {
    let mut out = String::new();
    for line in lines {
        out.push_str(&line);
        out.push('\n');
    }
    out
}

struct Printer<'a, 'c> {
    files: &'a [Element],
    /// Next file to inline. `None` writes includes as directives.
    cursor: Option<&'c mut usize>,
}

impl Printer<'_, '_> {
    /// Items of `container`, one per line. `open_end` says nothing follows the container's
    /// last item in the same body, so a bare value there cannot be read as a key.
    fn block(
        &mut self,
        container: &Element,
        depth: usize,
        open_end: bool,
        lines: &mut Vec<String>,
    ) -> Result<(), XmlError> {
        let indent = INDENT.repeat(depth);
        let items: Vec<&Element> = container.elements().collect();
        let last_item = items.iter().rposition(|e| e.name != COMMENT);
        for (i, item) in items.iter().enumerate() {
            let at_end = open_end && Some(i) >= last_item;
            match item.name.as_str() {
                COMMENT => {
                    let trailing = matches!(item.attribute("trailing"), Some("true" | "1"));
                    let text = comment_text(&item.text());
                    match lines.last_mut() {
                        Some(line) if trailing && !text.contains('\n') => {
                            line.push(' ');
                            line.push_str(&text);
                        }
                        _ => lines.extend(text.lines().map(|l| format!("{indent}{l}"))),
                    }
                }
                INCLUDE => self.include(item, depth, at_end, lines)?,
                KEY => {
                    let id = item.attribute("id").unwrap_or_default();
                    match item.elements().next() {
                        Some(group) if group.name == GROUP && is_multiline(group, true) => {
                            lines.push(format!("{indent}{id} ("));
                            self.block(group, depth + 1, true, lines)?;
                            lines.push(format!("{indent})"));
                        }
                        Some(child) => lines.push(format!("{indent}{id} {}", inline(child, true))),
                        None => {}
                    }
                }
                GROUP if is_multiline(item, false) => {
                    lines.push(format!("{indent}("));
                    self.block(item, depth + 1, true, lines)?;
                    lines.push(format!("{indent})"));
                }
                GROUP => lines.push(format!("{indent}{}", inline(item, false))),
                VALUE => lines.push(format!("{indent}{}", value(item, at_end))),
                _ => {}
            }
        }
        Ok(())
    }

    fn include(
        &mut self,
        include: &Element,
        depth: usize,
        at_end: bool,
        lines: &mut Vec<String>,
    ) -> Result<(), XmlError> {
        let Some(cursor) = self.cursor.as_deref_mut() else {
            lines.push(format!(
                "{}{INCLUDE_DIRECTIVE} {}",
                INDENT.repeat(depth),
                escape::quote(&include.text(), Quote::Double)
            ));
            return Ok(());
        };
        let files = self.files;
        let wanted = include.attribute("src").unwrap_or_default();
        let file = match files.get(*cursor) {
            Some(file) if src(file) == wanted => file,
            other => {
                return Err(XmlError::UnknownInclude {
                    src: wanted.to_string(),
                    found: other.map_or("none", src).to_string(),
                })
            }
        };
        *cursor += 1;
        self.block(file, depth, at_end, lines)
    }
}

fn comment_text(text: &str) -> String {
    text.lines()
        .map(|line| {
            if line.trim_start().starts_with('#') {
                line.to_string()
            } else {
                format!("# {line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// `(...)` on one line, or a single value. Inline groups hold no comments, so their last
/// child is followed by `)` and may stay bare.
fn inline(element: &Element, at_end: bool) -> String {
    match element.name.as_str() {
        VALUE => value(element, at_end),
        GROUP => {
            let children: Vec<&Element> = element.elements().collect();
            let separator = if children.iter().any(|c| c.name == KEY) {
                " "
            } else {
                ", "
            };
            let last = children.len().saturating_sub(1);
            let items: Vec<String> = children
                .iter()
                .enumerate()
                .map(|(i, child)| match child.name.as_str() {
                    KEY => {
                        let id = child.attribute("id").unwrap_or_default();
                        let inner = child.elements().next().map(|e| inline(e, true));
                        format!("{id} {}", inner.unwrap_or_default())
                    }
                    _ => inline(child, i == last),
                })
                .collect();
            format!("({})", items.join(separator))
        }
        _ => String::new(),
    }
}

fn is_multiline(group: &Element, named: bool) -> bool {
    group.elements().any(|child| match child.name.as_str() {
        COMMENT | INCLUDE => true,
        KEY => {
            named
                || child
                    .elements()
                    .any(|inner| inner.name == GROUP && is_multiline(inner, true))
        }
        GROUP => (named && contains_key(child)) || is_multiline(child, false),
        _ => false,
    })
}

fn contains_key(element: &Element) -> bool {
    element
        .elements()
        .any(|child| child.name == KEY || contains_key(child))
}

fn value(element: &Element, bare_ok: bool) -> String {
    let text = element.text();
    let quote = match element.attribute("quote") {
        Some("single") => Quote::Single,
        Some("double") => Quote::Double,
        Some("none") if bare_ok && is_bareword(&text) => return text,
        _ if text.contains('"') => Quote::Single,
        _ => Quote::Double,
    };
    escape::quote(&text, quote)
}

/// Whether `text` scans back as a single KEY token with the same content
fn is_bareword(text: &str) -> bool {
    !text.is_empty()
        && text != INCLUDE_DIRECTIVE
        && !text.chars().any(|c| {
            c.is_whitespace()
                || matches!(
                    c,
                    '\u{00A0}' | '\u{FEFF}' | ',' | ';' | '(' | ')' | '\'' | '"' | '#'
                )
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn single_file(body: &str) -> String {
        let xml = format!("<config><file src=\"main\">{body}</file></config>");
        let generator = ConfGenerator::new(&Element::parse(&xml).unwrap()).unwrap();
        generator.generate_conf().unwrap()
    }

    #[test]
    fn test_keys_lists_and_nested_groups() {
        insta::assert_snapshot!(single_file(
            r#"<key id="A"><value quote="single">X""Y</value></key>
               <key id="GUI"><group><key id="Dialoge"><group><key id="Dialog1"><group>
                 <group><key id="TYPE"><value>textbox</value></key><key id="LABEL"><value>Name</value></key></group>
               </group></key></group></key></group></key>
               <key id="L"><group><value>Herr</value><value>Frau</value></group></key>
               <group><value>Dies</value><value>ist</value></group>"#
        ), @r###"
        A 'X""Y'
        GUI (
          Dialoge (
            Dialog1 (
              (TYPE "textbox" LABEL "Name")
            )
          )
        )
        L ("Herr", "Frau")
        ("Dies", "ist")
        "###);
    }

    #[test]
    fn test_comments() {
        insta::assert_snapshot!(single_file(
            r#"<comment trailing="true"># nothing before</comment>
               <key id="A"><value>x</value></key><comment trailing="true"># after A</comment>
               <comment>no hash</comment>
               <key id="G"><group><comment># inside</comment><value>v</value></group></key>
               <comment trailing="true"># after the group</comment>"#
        ), @r###"
        # nothing before
        A "x" # after A
        # no hash
        G (
          # inside
          "v"
        ) # after the group
        "###);
    }

    #[rstest]
    #[case(r#"<value quote="none">BARE</value>"#, "BARE\n")]
    #[case(r#"<value quote="none">BARE</value><comment># c</comment>"#, "BARE\n# c\n")]
    #[case(r#"<value quote="none">A</value><value>x</value>"#, "\"A\"\n\"x\"\n")]
    #[case(r#"<value quote="none">two words</value>"#, "\"two words\"\n")]
    #[case(r#"<key id="K"><value quote="none">w</value></key><key id="L"><value/></key>"#, "K w\nL \"\"\n")]
    #[case(r#"<value>say "hi"</value>"#, "'say \"hi\"'\n")]
    #[case(r#"<value quote="double">100%
</value>"#, "\"100%%%n\"\n")]
    #[case(r#"<group><key id="K"><value quote="none">w</value></key></group>"#, "(K w)\n")]
    #[case(r#"<key id="L"><group><value quote="none">a</value></group></key>"#, "L (a)\n")]
    #[case(r#"<group><value>x</value><value quote="none">a</value></group>"#, "(\"x\", a)\n")]
    #[case(r#"<group><value quote="none">a</value><value>x</value></group>"#, "(\"a\", \"x\")\n")]
    fn test_value_rendering(#[case] body: &str, #[case] expected: &str) {
        assert_eq!(single_file(body), expected);
    }

    #[test]
    fn test_includes_inline_or_as_directives() {
        let xml = r#"<config>
            <file src="mem:/main.conf"><key id="A"><value>a</value></key><include src="mem:/inc.conf">inc.conf</include><key id="C"><value>c</value></key></file>
            <file src="mem:/inc.conf"><key id="B"><value>b</value></key></file>
        </config>"#;
        let generator = ConfGenerator::new(&Element::parse(xml).unwrap()).unwrap();
        assert_eq!(generator.generate_conf().unwrap(), "A \"a\"\nB \"b\"\nC \"c\"\n");
        let map = generator.generate_conf_map().unwrap();
        let entries: Vec<(&str, &str)> = map.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
        assert_eq!(
            entries,
            vec![
                ("mem:/main.conf", "A \"a\"\n%include \"inc.conf\"\nC \"c\"\n"),
                ("mem:/inc.conf", "B \"b\"\n"),
            ]
        );
    }

    #[test]
    fn test_include_without_its_file() {
        let xml = r#"<config><file src="a"><include src="b">b</include></file><file src="c"/></config>"#;
        let generator = ConfGenerator::new(&Element::parse(xml).unwrap()).unwrap();
        match generator.generate_conf() {
            Err(XmlError::UnknownInclude { src, found }) => {
                assert_eq!(src, "b");
                assert_eq!(found, "c");
            }
            other => panic!("expected UnknownInclude, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_documents_are_rejected() {
        let xml = "<config><file src='a'><key id='A'/></file></config>";
        assert!(matches!(
            ConfGenerator::new(&Element::parse(xml).unwrap()),
            Err(XmlError::Validation { .. })
        ));
    }

    #[test]
    fn test_empty_config() {
        let generator = ConfGenerator::new(&Element::new("config")).unwrap();
        assert_eq!(generator.generate_conf().unwrap(), "");
        assert!(generator.generate_conf_map().unwrap().is_empty());
    }

    #[test]
    fn test_write_files_needs_file_urls() {
        let xml = "<config><file src='mem:/a.conf'/></config>";
        let generator = ConfGenerator::new(&Element::parse(xml).unwrap()).unwrap();
        assert!(matches!(
            generator.write_files(),
            Err(XmlError::NotAFile { .. })
        ));
    }
}
