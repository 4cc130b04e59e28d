//! Main module for thingy library functionality

pub mod ast;
pub mod building;
pub mod error;
pub mod formats;
pub mod lexing;
pub mod loader;
pub mod source;
pub mod token;

pub use ast::Node;
pub use error::{NodeError, ParseError, ScanError, SyntaxError};
pub use loader::{parse_str, ConfLoader};
pub use token::{is_key_name, Literal, Position, Quote, Token};
