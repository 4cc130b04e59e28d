//! Lookups by name
//!
//!     Two families, differing in how they fail:
//!
//!         get, get_within, get_by_child, ...   return one node, or NodeError::NotFound
//!         query, query_within, query_by_child  return a result set, possibly empty
//!
//!     Levels count from the node the search starts at: its children are level 1. Searches are
//!     depth-first in document order, so "first" always means first in the source text.

use super::node::Node;
use crate::thingy::error::NodeError;
use once_cell::sync::Lazy;
use regex::Regex;

static IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z_][a-zA-Z_0-9]*$").expect("identifier pattern is valid"));

/// Check that `id` is usable as a plain key name.
pub fn check_identifier(id: &str) -> Result<(), NodeError> {
    if IDENTIFIER.is_match(id) {
        Ok(())
    } else {
        Err(NodeError::InvalidIdentifier(id.to_string()))
    }
}

impl Node {
    fn not_found(&self, name: &str) -> NodeError {
        NodeError::NotFound {
            parent: self.label().to_string(),
            name: name.to_string(),
        }
    }

    /// First direct child named `name`
    pub fn get(&self, name: &str) -> Result<&Node, NodeError> {
        self.iter()
            .find(|child| child.name() == Some(name))
            .ok_or_else(|| self.not_found(name))
    }

    pub fn get_mut(&mut self, name: &str) -> Result<&mut Node, NodeError> {
        let error = self.not_found(name);
        if self.is_leaf() {
            return Err(error);
        }
        self.children_mut()
            .iter_mut()
            .find(|child| child.name() == Some(name))
            .ok_or(error)
    }

    /// First descendant named `name` no deeper than `max_level`
    pub fn get_within(&self, name: &str, max_level: usize) -> Result<&Node, NodeError> {
        find_first(self, name, 1, max_level).ok_or_else(|| self.not_found(name))
    }

    /// Scalar of the first descendant named `name`, if there is one and it is unambiguous
    pub fn get_string(&self, name: &str) -> Option<String> {
        find_first(self, name, 1, usize::MAX)
            .and_then(|node| node.as_scalar().ok())
            .map(str::to_string)
    }

    /// Copies of every descendant named `name`
    pub fn query(&self, name: &str) -> Node {
        self.query_levels(name, 1, usize::MAX)
    }

    pub fn query_within(&self, name: &str, max_level: usize) -> Node {
        self.query_levels(name, 1, max_level)
    }

    /// Copies of the descendants named `name` between `min_level` and `max_level` inclusive
    pub fn query_levels(&self, name: &str, min_level: usize, max_level: usize) -> Node {
        let mut found = Vec::new();
        collect(self, 1, &mut |node, level| {
            if level >= min_level && node.name() == Some(name) {
                found.push(node.clone());
            }
            level < max_level
        });
        Node::result_set(found)
    }

    /// Copies of the nodes that have a child named `name`, this node included
    pub fn query_by_child(&self, name: &str) -> Node {
        let mut found = Vec::new();
        if has_child(self, name) {
            found.push(self.clone());
        }
        collect(self, 1, &mut |node, _| {
            if has_child(node, name) {
                found.push(node.clone());
            }
            true
        });
        Node::result_set(found)
    }

    /// First node (this one or a descendant) that has a child named `name`
    pub fn get_by_child(&self, name: &str) -> Result<&Node, NodeError> {
        if has_child(self, name) {
            return Ok(self);
        }
        find_parent(self, name).ok_or_else(|| self.not_found(name))
    }

    /// Nodes named `name` visible from `target`: `target` and its siblings, its ancestors
    /// and their siblings, outermost level first. `target` is matched by identity and must
    /// be a descendant of this node; otherwise the result is empty.
    pub fn visible_at(&self, target: &Node, name: &str) -> Node {
        let mut path = Vec::new();
        if !path_to(self, target, &mut path) {
            return Node::result_set(Vec::new());
        }
        let found = path
            .iter()
            .flat_map(|ancestor| ancestor.iter())
            .filter(|child| child.name() == Some(name))
            .cloned()
            .collect();
        Node::result_set(found)
    }
}

fn has_child(node: &Node, name: &str) -> bool {
    node.iter().any(|child| child.name() == Some(name))
}

fn find_first<'a>(node: &'a Node, name: &str, level: usize, max_level: usize) -> Option<&'a Node> {
    if level > max_level {
        return None;
    }
    for child in node {
        if child.name() == Some(name) {
            return Some(child);
        }
        if let Some(found) = find_first(child, name, level + 1, max_level) {
            return Some(found);
        }
    }
    None
}

fn find_parent<'a>(node: &'a Node, name: &str) -> Option<&'a Node> {
    for child in node {
        if has_child(child, name) {
            return Some(child);
        }
        if let Some(found) = find_parent(child, name) {
            return Some(found);
        }
    }
    None
}

/// Pre-order walk over descendants. `visit` returns whether to descend further.
fn collect<'a>(node: &'a Node, level: usize, visit: &mut dyn FnMut(&'a Node, usize) -> bool) {
    for child in node {
        if visit(child, level) {
            collect(child, level + 1, visit);
        }
    }
}

/// Ancestors of `target` from `node` downwards, excluding `target` itself
fn path_to<'a>(node: &'a Node, target: &Node, path: &mut Vec<&'a Node>) -> bool {
    path.push(node);
    for child in node {
        if std::ptr::eq(child, target) || path_to(child, target, path) {
            return true;
        }
    }
    path.pop();
    false
}
