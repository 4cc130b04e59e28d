//! XML format
//!
//!     Serializing writes the tree as conf text and runs it through [XmlGenerator], so the
//!     document is the same one an editor would get for that text. Parsing regenerates conf
//!     text with [ConfGenerator], includes inlined, and parses that.

mod conf_generator;
mod generator;

pub use conf_generator::ConfGenerator;
pub use generator::XmlGenerator;

use crate::dom::Element;
use crate::error::FormatError;
use crate::format::Format;
use std::sync::Arc;
use thingy_parser::thingy::ast::Node;
use thingy_parser::thingy::formats::{to_conf_string, SerializeOptions};
use thingy_parser::thingy::loader::{parse_str, STRING_SOURCE_NAME};
use thingy_parser::thingy::source::{MemoryProvider, Source};

pub const DEFAULT_INDENT: usize = 2;

pub struct XmlFormat {
    indent: usize,
}

impl XmlFormat {
    pub fn with_indent(indent: usize) -> Self {
        XmlFormat { indent }
    }
}

impl Default for XmlFormat {
    fn default() -> Self {
        XmlFormat::with_indent(DEFAULT_INDENT)
    }
}

impl Format for XmlFormat {
    fn name(&self) -> &str {
        "xml"
    }

    fn description(&self) -> &str {
        "Schema-validated XML view of a configuration"
    }

    fn supports_parsing(&self) -> bool {
        true
    }

    fn supports_serialization(&self) -> bool {
        true
    }

    fn parse(&self, source: &str) -> Result<Node, FormatError> {
        let config = Element::parse(source)?;
        let generator = ConfGenerator::new(&config)?;
        let name = config
            .elements()
            .next()
            .and_then(|file| file.attribute("src"))
            .unwrap_or(STRING_SOURCE_NAME);
        Ok(parse_str(name, &generator.generate_conf()?)?)
    }

    fn serialize(&self, node: &Node) -> Result<String, FormatError> {
        let text = to_conf_string(node, &SerializeOptions::children_only());
        let name = node.name().unwrap_or(STRING_SOURCE_NAME);
        let config = XmlGenerator::from_source(
            Source::text(name, text),
            Arc::new(MemoryProvider::new()),
        )
        .generate()?;
        Ok(config.to_xml_string(self.indent)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::XmlError;

    #[test]
    fn test_xml_format_round_trip() {
        let format = XmlFormat::default();
        let root = parse_str("main", "A 'x' G(B 'y' L('1' '2')) ('v')").unwrap();
        let xml = format.serialize(&root).unwrap();
        assert!(xml.contains("<file src=\"main\">"));
        assert_eq!(format.parse(&xml).unwrap(), root);
    }

    #[test]
    fn test_xml_format_rejects_invalid_documents() {
        let format = XmlFormat::default();
        assert!(matches!(
            format.parse("<config><file/></config>"),
            Err(FormatError::Xml(XmlError::Validation { .. }))
        ));
        assert!(matches!(
            format.parse("<config>"),
            Err(FormatError::Xml(_))
        ));
    }
}
