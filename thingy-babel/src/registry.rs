//! Format registry
//!
//!     Formats are registered and looked up by name. [FormatRegistry::with_defaults] knows
//!     the built-in `conf`, `xml` and `treeviz` formats.

use crate::error::FormatError;
use crate::format::Format;
use std::collections::HashMap;
use thingy_parser::thingy::ast::Node;

/// Registry of configuration formats
///
/// # Examples
///
/// ```ignore
/// let registry = FormatRegistry::default();
/// let root = registry.parse("A 'x'", "conf")?;
/// let xml = registry.serialize(&root, "xml")?;
/// ```
pub struct FormatRegistry {
    formats: HashMap<String, Box<dyn Format>>,
}

impl FormatRegistry {
    pub fn new() -> Self {
        FormatRegistry {
            formats: HashMap::new(),
        }
    }

    /// Register a format, replacing one with the same name
    pub fn register<F: Format + 'static>(&mut self, format: F) {
        self.formats
            .insert(format.name().to_string(), Box::new(format));
    }

    pub fn get(&self, name: &str) -> Result<&dyn Format, FormatError> {
        self.formats
            .get(name)
            .map(|f| f.as_ref())
            .ok_or_else(|| FormatError::FormatNotFound(name.to_string()))
    }

    pub fn has(&self, name: &str) -> bool {
        self.formats.contains_key(name)
    }

    /// Format names, sorted
    pub fn list_formats(&self) -> Vec<String> {
        let mut names: Vec<_> = self.formats.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn parse(&self, source: &str, format: &str) -> Result<Node, FormatError> {
        let fmt = self.get(format)?;
        if !fmt.supports_parsing() {
            return Err(FormatError::NotSupported(format!(
                "Format '{}' does not support parsing",
                format
            )));
        }
        fmt.parse(source)
    }

    pub fn serialize(&self, node: &Node, format: &str) -> Result<String, FormatError> {
        let fmt = self.get(format)?;
        if !fmt.supports_serialization() {
            return Err(FormatError::NotSupported(format!(
                "Format '{}' does not support serialization",
                format
            )));
        }
        fmt.serialize(node)
    }

    /// Convert text between two registered formats
    pub fn convert(&self, source: &str, from: &str, to: &str) -> Result<String, FormatError> {
        let node = self.parse(source, from)?;
        self.serialize(&node, to)
    }

    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(crate::formats::conf::ConfFormat::default());
        registry.register(crate::formats::xml::XmlFormat::default());
        registry.register(crate::formats::treeviz::TreevizFormat);
        registry
    }
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
