//! The native conf format
//!
//!     Parsing goes through the thingy-parser loader. A string has no location, so relative
//!     `%include` directives cannot be resolved here; absolute URLs work.

use crate::error::FormatError;
use crate::format::Format;
use thingy_parser::thingy::ast::Node;
use thingy_parser::thingy::formats::{to_conf_string, SerializeOptions};
use thingy_parser::thingy::loader::ConfLoader;

pub struct ConfFormat {
    options: SerializeOptions,
}

impl ConfFormat {
    /// Serialize with `options`. Roots are always written as their children.
    pub fn with_options(options: SerializeOptions) -> Self {
        ConfFormat {
            options: SerializeOptions {
                children_only: true,
                ..options
            },
        }
    }
}

impl Default for ConfFormat {
    fn default() -> Self {
        ConfFormat::with_options(SerializeOptions::default())
    }
}

impl Format for ConfFormat {
    fn name(&self) -> &str {
        "conf"
    }

    fn description(&self) -> &str {
        "ConfigThingy text format"
    }

    fn supports_parsing(&self) -> bool {
        true
    }

    fn supports_serialization(&self) -> bool {
        true
    }

    fn parse(&self, source: &str) -> Result<Node, FormatError> {
        Ok(ConfLoader::from_string(source).parse()?)
    }

    fn serialize(&self, node: &Node) -> Result<String, FormatError> {
        Ok(to_conf_string(node, &self.options))
    }
}
