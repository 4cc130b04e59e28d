//! Shared configuration loader for the thingy toolchain.
//!
//! `defaults/thingy.default.toml` is embedded into every binary so that docs and
//! runtime behavior stay in sync. Applications layer user-specific files on top
//! of those defaults via [`Loader`] before deserializing into [`ThingyConfig`].

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, File, FileFormat, ValueKind};
use serde::Deserialize;
use std::path::Path;
use thingy_parser::thingy::formats::{Layout, SerializeOptions};
use thingy_parser::thingy::Quote;

const DEFAULT_TOML: &str = include_str!("../defaults/thingy.default.toml");

/// Top-level configuration consumed by thingy applications.
#[derive(Debug, Clone, Deserialize)]
pub struct ThingyConfig {
    pub scanner: ScannerConfig,
    pub serializer: SerializerConfig,
    pub xml: XmlConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScannerConfig {
    pub max_include_depth: usize,
    pub max_nesting: usize,
}

/// Mirrors the knobs of the conf serializer.
#[derive(Debug, Clone, Deserialize)]
pub struct SerializerConfig {
    pub quote: Quote,
    pub layout: Layout,
    pub escape_all: bool,
}

impl SerializerConfig {
    /// Options for writing whole files
    pub fn options(&self) -> SerializeOptions {
        SerializeOptions {
            quote: self.quote,
            layout: self.layout,
            children_only: true,
            escape_all: self.escape_all,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct XmlConfig {
    pub indent: usize,
}

/// Helper for layering user overrides over the built-in defaults.
#[derive(Debug, Clone)]
pub struct Loader {
    builder: ConfigBuilder<DefaultState>,
}

impl Loader {
    /// Start a loader seeded with the embedded defaults.
    pub fn new() -> Self {
        let builder = Config::builder().add_source(File::from_str(DEFAULT_TOML, FileFormat::Toml));
        Self { builder }
    }

    /// Layer a configuration file. Missing files trigger an error.
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(true);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Layer an optional configuration file, ignored if absent.
    pub fn with_optional_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(false);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Apply a single key/value override (command line settings).
    pub fn set_override<I>(mut self, key: &str, value: I) -> Result<Self, ConfigError>
    where
        I: Into<ValueKind>,
    {
        self.builder = self.builder.set_override(key, value)?;
        Ok(self)
    }

    pub fn build(self) -> Result<ThingyConfig, ConfigError> {
        self.builder.build()?.try_deserialize()
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience helper for callers that only need the defaults.
pub fn load_defaults() -> Result<ThingyConfig, ConfigError> {
    Loader::new().build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn loads_default_config() {
        let config = load_defaults().expect("defaults to deserialize");
        assert_eq!(config.scanner.max_include_depth, 32);
        assert_eq!(config.scanner.max_nesting, 256);
        assert_eq!(config.serializer.quote, Quote::Double);
        assert_eq!(config.serializer.layout, Layout::Pretty);
        assert!(!config.serializer.escape_all);
        assert_eq!(config.xml.indent, 2);
    }

    #[test]
    fn defaults_match_serializer_defaults() {
        let config = load_defaults().expect("defaults to deserialize");
        assert_eq!(config.serializer.options(), SerializeOptions::children_only());
    }

    #[test]
    fn defaults_match_scanner_defaults() {
        use thingy_parser::thingy::lexing::{DEFAULT_MAX_INCLUDE_DEPTH, DEFAULT_MAX_NESTING};
        let config = load_defaults().expect("defaults to deserialize");
        assert_eq!(config.scanner.max_include_depth, DEFAULT_MAX_INCLUDE_DEPTH);
        assert_eq!(config.scanner.max_nesting, DEFAULT_MAX_NESTING);
    }

    #[test]
    fn supports_overrides() {
        let config = Loader::new()
            .set_override("serializer.quote", "single")
            .expect("override to apply")
            .set_override("scanner.max_include_depth", 4_i64)
            .expect("override to apply")
            .build()
            .expect("config to build");
        assert_eq!(config.serializer.quote, Quote::Single);
        assert_eq!(config.scanner.max_include_depth, 4);
    }

    #[test]
    fn layers_user_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("thingy.toml");
        fs::write(&path, "[serializer]\nlayout = \"compact\"\n").unwrap();
        let config = Loader::new()
            .with_file(&path)
            .with_optional_file(dir.path().join("absent.toml"))
            .build()
            .expect("config to build");
        assert_eq!(config.serializer.layout, Layout::Compact);
        assert_eq!(config.xml.indent, 2);
    }

    #[test]
    fn missing_required_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Loader::new()
            .with_file(dir.path().join("absent.toml"))
            .build()
            .is_err());
    }

    #[test]
    fn rejects_unknown_quote() {
        let result = Loader::new()
            .set_override("serializer.quote", "backtick")
            .expect("override to apply")
            .build();
        assert!(result.is_err());
    }
}
