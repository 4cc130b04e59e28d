//! Node -> conf text
//!
//!     The output parses back to the same tree. Small structures stay on one line:
//!
//!         Leaf                     "value"
//!         key with one leaf        NAME "value"
//!         only leaf children       NAME("a", "b")
//!         only key/leaf pairs      NAME(A "x" B "y")
//!         no children              NAME()
//!
//!     Everything else opens a block with one child per line, indented by two spaces, unless
//!     the compact layout is requested. Anonymous containers are written without a name.

use super::escape;
use crate::thingy::ast::Node;
use crate::thingy::token::Quote;
use serde::{Deserialize, Serialize};

const INDENT: &str = "  ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Layout {
    /// Blocks spread over several lines
    #[default]
    Pretty,
    /// Everything on a single line
    Compact,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SerializeOptions {
    /// Delimiter for string literals
    pub quote: Quote,
    pub layout: Layout,
    /// Render only the children, one per line. This is how file roots are written.
    pub children_only: bool,
    /// Escape every character that is not a letter or digit as `%uXXXX`
    pub escape_all: bool,
}

impl SerializeOptions {
    pub fn children_only() -> Self {
        SerializeOptions {
            children_only: true,
            ..Default::default()
        }
    }

    pub fn with_quote(mut self, quote: Quote) -> Self {
        self.quote = quote;
        self
    }

    pub fn with_layout(mut self, layout: Layout) -> Self {
        self.layout = layout;
        self
    }
}

/// Render `node` as conf text. The result ends with a newline unless it is empty.
pub fn to_conf_string(node: &Node, options: &SerializeOptions) -> String {
    let writer = ConfWriter { options };
    let mut out = String::new();
    if options.children_only || node.is_result_set() {
        let items: Vec<String> = node.iter().map(|child| writer.render(child, 0)).collect();
        if items.is_empty() {
            return out;
        }
        match options.layout {
            Layout::Pretty => {
                for item in items {
                    out.push_str(&item);
                    out.push('\n');
                }
            }
            Layout::Compact => {
                out.push_str(&items.join(" "));
                out.push('\n');
            }
        }
    } else {
        out.push_str(&writer.render(node, 0));
        out.push('\n');
    }
    out
}

fn is_pair(node: &Node) -> bool {
    match node {
        Node::Container { name, children } => {
            !name.is_empty() && children.len() == 1 && children[0].is_leaf()
        }
        _ => false,
    }
}

struct ConfWriter<'a> {
    options: &'a SerializeOptions,
}

impl ConfWriter<'_> {
    fn literal(&self, text: &str) -> String {
        if self.options.escape_all {
            let delimiter = self.options.quote.as_char();
            format!("{delimiter}{}{delimiter}", escape::encode_all(text))
        } else {
            escape::quote(text, self.options.quote)
        }
    }

    /// The one-line forms, if `node` has one
    fn inline(&self, node: &Node) -> Option<String> {
        let (name, children) = match node {
            Node::Leaf { name } => return Some(self.literal(name)),
            Node::Container { name, children } => (name.as_str(), children),
            Node::ResultSet { children } => ("", children),
        };
        if is_pair(node) {
            return Some(format!("{} {}", name, self.literal(children[0].label())));
        }
        if children.iter().all(Node::is_leaf) {
            let items: Vec<String> = children.iter().map(|c| self.literal(c.label())).collect();
            return Some(format!("{}({})", name, items.join(", ")));
        }
        if children.iter().all(is_pair) {
            let items: Vec<String> = children.iter().filter_map(|c| self.inline(c)).collect();
            return Some(format!("{}({})", name, items.join(" ")));
        }
        None
    }

    fn render(&self, node: &Node, depth: usize) -> String {
        if let Some(line) = self.inline(node) {
            return line;
        }
        let name = node.name().unwrap_or_default();
        match self.options.layout {
            Layout::Compact => {
                let items: Vec<String> = node.iter().map(|c| self.render(c, depth)).collect();
                format!("{}({})", name, items.join(" "))
            }
            Layout::Pretty => {
                let inner = INDENT.repeat(depth + 1);
                let mut out = format!("{name}(\n");
                for child in node {
                    out.push_str(&inner);
                    out.push_str(&self.render(child, depth + 1));
                    out.push('\n');
                }
                out.push_str(&INDENT.repeat(depth));
                out.push(')');
                out
            }
        }
    }
}
