//! Format interoperability for ConfigThingy configurations
//!
//!     This crate provides a uniform interface for converting configuration trees to and from
//!     other representations, and the XML bridge that lets external tools edit configurations
//!     through a schema-validated document.
//!
//! Architecture
//!
//!     - Format trait: Uniform interface for all formats (parsing and/or serialization)
//!     - FormatRegistry: Discovery and selection of formats by name
//!     - Format implementations: conf (the native text), xml and treeviz
//!
//!     This is a pure lib: it powers thingy-cli but assumes no shell environment. No printing,
//!     no env vars. Writing files back is only done on explicit request.
//!
//!     The file structure :
//!     .
//!     ├── error.rs
//!     ├── format.rs               # Format trait definition
//!     ├── registry.rs             # FormatRegistry for discovery and selection
//!     ├── dom.rs                  # Minimal owned XML element tree (quick-xml backed)
//!     ├── schema.rs               # The configuration schema and its validator
//!     ├── formats
//!     │   ├── conf
//!     │   ├── treeviz
//!     │   └── xml
//!     │       ├── generator.rs        # tokens -> XML
//!     │       ├── conf_generator.rs   # XML -> conf text, one text per file
//!     │       └── mod.rs
//!     └── lib.rs
//!
//! The XML Bridge
//!
//!     The bridge works on the token stream rather than on the tree, because the tree has
//!     already dropped the comments and the file each setting came from. The XML keeps one `<file>` per
//!     source, so edits can be written back to the files they belong to.
//!
//!     conf files --XmlGenerator--> <config> --(external edit)--> ConfGenerator --> conf files
//!
//!     Layout is not preserved: the conf text is regenerated with a canonical layout, so a
//!     round trip changes whitespace only.

pub mod dom;
pub mod error;
pub mod format;
pub mod formats;
pub mod registry;
pub mod schema;

pub use error::{FormatError, XmlError};
pub use format::Format;
pub use formats::xml::{ConfGenerator, XmlGenerator};
pub use registry::FormatRegistry;
