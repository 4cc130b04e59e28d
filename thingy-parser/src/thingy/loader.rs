//! Loading utilities
//!
//! This module provides `ConfLoader`, which wires a source, a source provider, the scanner
//! and the tree builder together. It is used by the CLI, the format registry and tests.
//!
//! # Example
//!
//! ```rust,no_run
//! use thingy_parser::thingy::loader::ConfLoader;
//!
//! // From file, includes resolved relative to it
//! let root = ConfLoader::from_path("main.conf").unwrap().parse().unwrap();
//! ```
//!
//! ```rust
//! use thingy_parser::thingy::loader::ConfLoader;
//!
//! // From a string
//! let root = ConfLoader::from_string("A 'x'").parse().unwrap();
//! assert_eq!(root.get("A").unwrap().as_scalar().unwrap(), "x");
//!
//! // Raw tokens, file boundaries and comments included
//! let tokens = ConfLoader::from_string("A 'x' # note").tokenize().unwrap();
//! ```

use crate::thingy::ast::Node;
use crate::thingy::building::TreeBuilder;
use crate::thingy::error::{ParseError, ScanError};
use crate::thingy::lexing::{Scanner, DEFAULT_MAX_INCLUDE_DEPTH, DEFAULT_MAX_NESTING};
use crate::thingy::source::{FileProvider, MemoryProvider, Source, SourceProvider};
use crate::thingy::token::{Position, Token};
use std::path::Path;
use std::sync::Arc;
use url::Url;

/// Name given to string sources that were not named explicitly
pub const STRING_SOURCE_NAME: &str = "<string>";

/// Conf loader with parse shortcuts
pub struct ConfLoader {
    source: Source,
    provider: Arc<dyn SourceProvider>,
    max_include_depth: usize,
    max_nesting: usize,
}

impl ConfLoader {
    /// Load from a file path
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ParseError> {
        let path = path.as_ref();
        let source = Source::file(path).map_err(|source| ParseError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(ConfLoader::new(source))
    }

    /// Load from a URL, read through the file provider unless another one is set
    pub fn from_url(url: Url) -> Self {
        ConfLoader::new(Source::url(url))
    }

    /// Load from a string. Relative includes need [with_base](Self::with_base).
    pub fn from_string<S: Into<String>>(text: S) -> Self {
        ConfLoader::new(Source::text(STRING_SOURCE_NAME, text))
    }

    pub fn new(source: Source) -> Self {
        ConfLoader {
            source,
            provider: Arc::new(FileProvider),
            max_include_depth: DEFAULT_MAX_INCLUDE_DEPTH,
            max_nesting: DEFAULT_MAX_NESTING,
        }
    }

    /// Rename a string source. The name becomes the root node's name.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        if let Source::Text { name: current, .. } = &mut self.source {
            *current = name.into();
        }
        self
    }

    /// Anchor relative includes of a string source
    pub fn with_base(mut self, base: Url) -> Self {
        self.source = self.source.with_base(base);
        self
    }

    pub fn with_provider(mut self, provider: impl SourceProvider + 'static) -> Self {
        self.provider = Arc::new(provider);
        self
    }

    /// Serve includes (and URL roots) from memory
    pub fn with_sources(self, sources: MemoryProvider) -> Self {
        self.with_provider(sources)
    }

    pub fn with_max_include_depth(mut self, depth: usize) -> Self {
        self.max_include_depth = depth;
        self
    }

    pub fn with_max_nesting(mut self, depth: usize) -> Self {
        self.max_nesting = depth;
        self
    }

    pub fn source(&self) -> &Source {
        &self.source
    }

    /// A fresh scanner over the source
    pub fn scanner(&self) -> Scanner {
        Scanner::new(self.source.clone(), Arc::clone(&self.provider))
            .with_max_include_depth(self.max_include_depth)
            .with_max_nesting(self.max_nesting)
    }

    /// All tokens, stopping at the first scan error
    pub fn tokenize(&self) -> Result<Vec<(Token, Position)>, ScanError> {
        self.scanner().collect()
    }

    /// Parse into the root node, named after the source location
    pub fn parse(&self) -> Result<Node, ParseError> {
        let roots = self.parse_all()?;
        Ok(roots
            .into_iter()
            .next()
            .unwrap_or_else(|| Node::container(self.source.location())))
    }

    /// One root per top-level file of the token stream
    pub fn parse_all(&self) -> Result<Vec<Node>, ParseError> {
        TreeBuilder::new(self.scanner()).build()
    }
}

/// Parse `text` into a root node called `name`.
pub fn parse_str(name: &str, text: &str) -> Result<Node, ParseError> {
    ConfLoader::from_string(text).named(name).parse()
}
