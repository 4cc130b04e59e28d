//! Format implementations
//!
//!     Each format converts between a configuration tree and one text representation.

pub mod conf;
pub mod treeviz;
pub mod xml;

pub use conf::ConfFormat;
pub use treeviz::TreevizFormat;
pub use xml::XmlFormat;
