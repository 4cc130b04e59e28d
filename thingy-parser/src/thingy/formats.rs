//! Output formats for built trees
//!
//!     conf     Node -> conf text (the inverse of the parser, modulo comments and includes)
//!     escape   The `%` escape and quote-doubling rules for string literals
//!     treeviz  Node -> indented tree dump, for debugging and snapshots

pub mod conf;
pub mod escape;
pub mod treeviz;

pub use conf::{to_conf_string, Layout, SerializeOptions};
pub use treeviz::to_treeviz_str;
