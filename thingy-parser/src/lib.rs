//! # thingy
//!
//! A parser for the ConfigThingy configuration format.
//!
//! File Layout
//!
//!     The pipeline runs in three stages, each in its own module tree:
//!
//!     src/thingy
//!       ├── lexing      Scanner: characters + %include directives -> flat token stream
//!       ├── building    TreeBuilder: token stream -> Node tree
//!       ├── ast         Node, the scalar/structure tree type, and its query API
//!       └── formats     Serializers: Node -> conf text, Node -> tree dump
//!
//!     The token stream is the contract between the stages. It keeps file boundaries
//!     (NewFile / EndFile) and comments, which the tree drops. Tools that need the
//!     original file layout (the XML bridge in thingy-babel) consume tokens directly.
//!
//!     For the common cases, see [loader](thingy::loader), which wires the stages together.

pub mod thingy;
