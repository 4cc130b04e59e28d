//! The configuration tree
//!
//!     A parsed configuration is a tree of [Node]s. The same type serves as a scalar value and
//!     as a structure, so `A "x"` and `A (B "x" C "y")` are navigated with the same calls:
//!
//!         A "x"          Container A [Leaf x]          A reads as the scalar "x"
//!         A (B "x")      Container A [Container B [Leaf x]]
//!         ("a" "b")      Container "" [Leaf a, Leaf b]
//!
//!     Scalar coercion follows single-child chains down to a leaf, so `root.get("A")` can be
//!     read directly as text without first stepping into its value. See [node] for the type
//!     and [query] for lookups by name.
//!
//! Ownership
//!
//!     Nodes own their children outright. There are no parent pointers and no sharing: query
//!     results are deep copies, and `clone` copies the whole subtree. Operations that need
//!     ancestry (`visible_at`) search from a root down to a target instead.

pub mod node;
pub mod query;

pub use node::Node;
pub use query::check_identifier;
