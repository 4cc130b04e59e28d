//! Sources and include resolution
//!
//!     A [Source] names the root of a scan. Included files are located by URL: an include
//!     path is tried as an absolute URL first and, failing that, joined onto the URL of the
//!     including source. Opening a URL is delegated to a [SourceProvider], so the scanner
//!     never touches the filesystem directly.

use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Cursor};
use std::path::Path;
use url::Url;

/// Opens resolved locations for reading
pub trait SourceProvider {
    fn open(&self, url: &Url) -> io::Result<Box<dyn BufRead>>;
}

/// Serves `file:` URLs from the local filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct FileProvider;

impl SourceProvider for FileProvider {
    fn open(&self, url: &Url) -> io::Result<Box<dyn BufRead>> {
        if url.scheme() != "file" {
            return Err(io::Error::new(
                io::ErrorKind::Unsupported,
                format!("unsupported URL scheme '{}'", url.scheme()),
            ));
        }
        let path = url.to_file_path().map_err(|_| {
            io::Error::new(io::ErrorKind::InvalidInput, format!("not a local path: {url}"))
        })?;
        let file = File::open(path)?;
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Serves sources from an in-memory map keyed by URL
#[derive(Debug, Clone, Default)]
pub struct MemoryProvider {
    sources: HashMap<String, String>,
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `text` under `url`. An unparsable URL is stored verbatim and never matches.
    pub fn insert(&mut self, url: &str, text: impl Into<String>) -> &mut Self {
        let key = Url::parse(url)
            .map(|u| u.to_string())
            .unwrap_or_else(|_| url.to_string());
        self.sources.insert(key, text.into());
        self
    }

    pub fn with(mut self, url: &str, text: impl Into<String>) -> Self {
        self.insert(url, text);
        self
    }
}

impl SourceProvider for MemoryProvider {
    fn open(&self, url: &Url) -> io::Result<Box<dyn BufRead>> {
        match self.sources.get(url.as_str()) {
            Some(text) => Ok(Box::new(Cursor::new(text.clone().into_bytes()))),
            None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no such source: {url}"),
            )),
        }
    }
}

/// The root of a scan
#[derive(Debug, Clone)]
pub enum Source {
    /// Read through the scanner's provider
    Url(Url),
    /// Inline text. `base` (if any) anchors relative includes.
    Text {
        name: String,
        base: Option<Url>,
        text: String,
    },
}

impl Source {
    /// A local file. Relative paths are taken relative to the working directory.
    pub fn file(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()?.join(path)
        };
        let url = Url::from_file_path(&absolute).map_err(|_| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("cannot build a file URL for {}", absolute.display()),
            )
        })?;
        Ok(Source::Url(url))
    }

    pub fn url(url: Url) -> Self {
        Source::Url(url)
    }

    pub fn text(name: impl Into<String>, text: impl Into<String>) -> Self {
        Source::Text {
            name: name.into(),
            base: None,
            text: text.into(),
        }
    }

    /// Anchor relative includes of a text source at `base`
    pub fn with_base(self, base: Url) -> Self {
        match self {
            Source::Text { name, text, .. } => Source::Text {
                name,
                base: Some(base),
                text,
            },
            other => other,
        }
    }

    /// The location reported in NEW_FILE tokens and errors
    pub fn location(&self) -> String {
        match self {
            Source::Url(url) => url.to_string(),
            Source::Text { name, .. } => name.clone(),
        }
    }

    /// Base URL for relative includes
    pub fn base(&self) -> Option<&Url> {
        match self {
            Source::Url(url) => Some(url),
            Source::Text { base, .. } => base.as_ref(),
        }
    }
}

/// Resolve an include path: absolute URL first, then relative to `base`.
pub fn resolve_include(base: Option<&Url>, path: &str) -> Result<Url, String> {
    let path = path.replace('\\', "/");
    match Url::parse(&path) {
        // single-letter schemes are Windows drive letters, not URLs
        Ok(url) if url.scheme().len() > 1 => return Ok(url),
        Ok(_) | Err(url::ParseError::RelativeUrlWithoutBase) => {}
        Err(e) => return Err(e.to_string()),
    }
    match base {
        Some(base) => base.join(&path).map_err(|e| e.to_string()),
        None => Err("relative path and the including source has no URL".to_string()),
    }
}
