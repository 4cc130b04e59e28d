//! Tree building
//!
//!     The builder turns the flat token stream into [Node] trees by recursive descent with one
//!     token of lookahead. Comments are dropped here. File boundaries are dropped too, but not
//!     before they have done their job: each top-level NEW_FILE ... END_FILE span becomes one
//!     root named after its location, and nested spans (includes) are spliced into whatever
//!     node was open when the directive appeared.
//!
//!     The grammar, in terms of tokens:
//!
//!         body  := item*
//!         item  := KEY VALUE | KEY KEY | KEY '(' body ')' | KEY | VALUE | '(' body ')'
//!
//!     A KEY followed by anything else is a bare leaf. A KEY followed by a KEY takes the
//!     second as a bare (unquoted, unescaped) value.
//!
//! [Node]: crate::thingy::ast::Node

pub mod tree_builder;

pub use tree_builder::TreeBuilder;

use crate::thingy::ast::Node;
use crate::thingy::error::ParseError;
use crate::thingy::token::{Position, Token};

/// Build trees from already collected tokens.
pub fn build_from_tokens(tokens: Vec<(Token, Position)>) -> Result<Vec<Node>, ParseError> {
    TreeBuilder::new(tokens.into_iter().map(Ok)).build()
}
