//! Error types

use thingy_parser::thingy::error::{ParseError, ScanError, SyntaxError};
use thiserror::Error;

/// Failures of the XML bridge
#[derive(Debug, Error)]
pub enum XmlError {
    #[error(transparent)]
    Scan(#[from] ScanError),
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
    #[error("schema violation at {path}: {message}")]
    Validation { path: String, message: String },
    #[error("malformed XML: {0}")]
    Malformed(String),
    #[error(transparent)]
    Xml(#[from] quick_xml::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("<include src=\"{src}\"> has no matching <file> (next file is {found})")]
    UnknownInclude { src: String, found: String },
    #[error("cannot write {src}: not a local file")]
    NotAFile { src: String },
}

impl XmlError {
    pub(crate) fn validation(path: &str, message: impl Into<String>) -> Self {
        XmlError::Validation {
            path: path.to_string(),
            message: message.into(),
        }
    }
}

impl From<quick_xml::events::attributes::AttrError> for XmlError {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        XmlError::Xml(quick_xml::Error::from(err))
    }
}

/// Errors from the format registry and format implementations
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("format '{0}' not found")]
    FormatNotFound(String),
    #[error("{0}")]
    NotSupported(String),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Xml(#[from] XmlError),
}
