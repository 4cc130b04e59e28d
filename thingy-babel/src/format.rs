//! Format trait definition
//!
//!     Every representation a configuration tree can be converted to or from implements
//!     [Format]. A format may support parsing, serialization or both.

use crate::error::FormatError;
use thingy_parser::thingy::ast::Node;

/// Trait for configuration formats
///
/// # Examples
///
/// ```ignore
/// struct Lines;
///
/// impl Format for Lines {
///     fn name(&self) -> &str {
///         "lines"
///     }
///
///     fn supports_serialization(&self) -> bool {
///         true
///     }
///
///     fn serialize(&self, node: &Node) -> Result<String, FormatError> {
///         Ok(node.iter().map(|c| c.label().to_string() + "\n").collect())
///     }
/// }
/// ```
pub trait Format: Send + Sync {
    /// The name of this format (e.g. "conf", "xml")
    fn name(&self) -> &str;

    fn description(&self) -> &str {
        ""
    }

    /// Whether this format supports parsing (text -> Node)
    fn supports_parsing(&self) -> bool {
        false
    }

    /// Whether this format supports serialization (Node -> text)
    fn supports_serialization(&self) -> bool {
        false
    }

    /// Parse text into a root node
    fn parse(&self, _source: &str) -> Result<Node, FormatError> {
        Err(FormatError::NotSupported(format!(
            "Format '{}' does not support parsing",
            self.name()
        )))
    }

    /// Serialize a root node
    fn serialize(&self, _node: &Node) -> Result<String, FormatError> {
        Err(FormatError::NotSupported(format!(
            "Format '{}' does not support serialization",
            self.name()
        )))
    }
}
