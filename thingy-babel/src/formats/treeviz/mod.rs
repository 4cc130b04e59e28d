//! Tree dump format
//!
//!     Serialization only: an indented picture of the tree for debugging.

use crate::error::FormatError;
use crate::format::Format;
use thingy_parser::thingy::ast::Node;
use thingy_parser::thingy::formats::to_treeviz_str;

pub struct TreevizFormat;

impl Format for TreevizFormat {
    fn name(&self) -> &str {
        "treeviz"
    }

    fn description(&self) -> &str {
        "Visual tree dump of a configuration"
    }

    fn supports_serialization(&self) -> bool {
        true
    }

    fn serialize(&self, node: &Node) -> Result<String, FormatError> {
        Ok(to_treeviz_str(node))
    }
}
