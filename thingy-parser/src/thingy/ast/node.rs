//! Node, the tree type

use crate::thingy::error::NodeError;
use serde::Serialize;
use std::slice;

/// Name given to result sets in diagnostics
pub const RESULT_SET_LABEL: &str = "<query results>";

/// A configuration node.
///
/// `Leaf` holds a scalar, already unquoted and unescaped. `Container` holds an ordered list
/// of children under a name, which is empty for the anonymous `( ... )` form. `ResultSet`
/// is the unnamed collection returned by queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Node {
    Leaf { name: String },
    Container { name: String, children: Vec<Node> },
    ResultSet { children: Vec<Node> },
}

impl Node {
    /// A childless node
    pub fn new(name: impl Into<String>) -> Self {
        Node::Leaf { name: name.into() }
    }

    /// An empty container
    pub fn container(name: impl Into<String>) -> Self {
        Node::Container {
            name: name.into(),
            children: Vec::new(),
        }
    }

    pub fn result_set(children: Vec<Node>) -> Self {
        Node::ResultSet { children }
    }

    /// `None` for result sets
    pub fn name(&self) -> Option<&str> {
        match self {
            Node::Leaf { name } | Node::Container { name, .. } => Some(name),
            Node::ResultSet { .. } => None,
        }
    }

    /// Name used in error messages
    pub fn label(&self) -> &str {
        self.name().unwrap_or(RESULT_SET_LABEL)
    }

    /// Rename the node. A result set becomes a container of that name.
    pub fn rename(&mut self, new_name: impl Into<String>) {
        let new_name = new_name.into();
        match self {
            Node::Leaf { name } | Node::Container { name, .. } => *name = new_name,
            Node::ResultSet { children } => {
                let children = std::mem::take(children);
                *self = Node::Container {
                    name: new_name,
                    children,
                };
            }
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf { .. })
    }

    pub fn is_result_set(&self) -> bool {
        matches!(self, Node::ResultSet { .. })
    }

    pub fn children(&self) -> &[Node] {
        match self {
            Node::Leaf { .. } => &[],
            Node::Container { children, .. } | Node::ResultSet { children } => children,
        }
    }

    /// Mutable children. A leaf is promoted to an empty container first.
    pub fn children_mut(&mut self) -> &mut Vec<Node> {
        if let Node::Leaf { name } = self {
            let name = std::mem::take(name);
            *self = Node::container(name);
        }
        match self {
            Node::Container { children, .. } | Node::ResultSet { children } => children,
            Node::Leaf { .. } => unreachable!("leaf was promoted to a container"),
        }
    }

    pub fn into_children(self) -> Vec<Node> {
        match self {
            Node::Leaf { .. } => Vec::new(),
            Node::Container { children, .. } | Node::ResultSet { children } => children,
        }
    }

    pub fn count(&self) -> usize {
        self.children().len()
    }

    pub fn iter(&self) -> slice::Iter<'_, Node> {
        self.children().iter()
    }

    /// Append a new childless node and return it for further building.
    pub fn add(&mut self, name: impl Into<String>) -> &mut Node {
        self.add_child(Node::new(name))
    }

    /// Append `child` and return it.
    pub fn add_child(&mut self, child: Node) -> &mut Node {
        let children = self.children_mut();
        children.push(child);
        let last = children.len() - 1;
        &mut children[last]
    }

    /// Append deep copies of all of `other`'s children.
    pub fn add_child_copies_from(&mut self, other: &Node) {
        if other.count() == 0 {
            return;
        }
        self.children_mut().extend(other.iter().cloned());
    }

    pub fn first_child(&self) -> Result<&Node, NodeError> {
        self.children()
            .first()
            .ok_or_else(|| NodeError::NoChildren(self.label().to_string()))
    }

    pub fn last_child(&self) -> Result<&Node, NodeError> {
        self.children()
            .last()
            .ok_or_else(|| NodeError::NoChildren(self.label().to_string()))
    }

    /// Read the node as a single value.
    ///
    /// A leaf or childless container reads as its name; a node with one child reads as that
    /// child. Anything with several children is ambiguous.
    pub fn as_scalar(&self) -> Result<&str, NodeError> {
        match self {
            Node::Leaf { name } => Ok(name),
            Node::Container { name, children } if children.is_empty() => Ok(name),
            Node::ResultSet { children } if children.is_empty() => Err(NodeError::EmptyResult),
            _ => match self.children() {
                [only] => only.as_scalar(),
                many => Err(NodeError::AmbiguousScalar {
                    name: self.label().to_string(),
                    count: many.len(),
                }),
            },
        }
    }

    /// Total number of nodes in this subtree, including this one
    pub fn subtree_size(&self) -> usize {
        1 + self.iter().map(Node::subtree_size).sum::<usize>()
    }
}

impl<'a> IntoIterator for &'a Node {
    type Item = &'a Node;
    type IntoIter = slice::Iter<'a, Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(key: &str, value: &str) -> Node {
        let mut node = Node::container(key);
        node.add(value);
        node
    }

    #[test]
    fn test_scalar_follows_single_child_chain() {
        let mut root = Node::container("root");
        root.add("A").add("B").add("value");
        assert_eq!(root.as_scalar().unwrap(), "value");
        assert_eq!(Node::new("x").as_scalar().unwrap(), "x");
        assert_eq!(Node::container("empty").as_scalar().unwrap(), "empty");
    }

    #[test]
    fn test_scalar_fails_loudly_on_several_children() {
        let mut list = Node::container("L");
        list.add("a");
        list.add("b");
        assert_eq!(
            list.as_scalar(),
            Err(NodeError::AmbiguousScalar {
                name: "L".into(),
                count: 2
            })
        );
        assert_eq!(
            Node::result_set(Vec::new()).as_scalar(),
            Err(NodeError::EmptyResult)
        );
    }

    #[test]
    fn test_add_promotes_leaf() {
        let mut node = Node::new("A");
        assert!(node.is_leaf());
        node.add("x");
        assert_eq!(node, pair("A", "x"));
    }

    #[test]
    fn test_rename_result_set_makes_container() {
        let mut results = Node::result_set(vec![Node::new("x")]);
        assert_eq!(results.name(), None);
        results.rename("R");
        assert_eq!(results, pair("R", "x"));
    }

    #[test]
    fn test_first_and_last_child() {
        let mut node = Node::container("L");
        assert_eq!(
            node.first_child(),
            Err(NodeError::NoChildren("L".into()))
        );
        node.add("a");
        node.add("b");
        assert_eq!(node.first_child().unwrap().name(), Some("a"));
        assert_eq!(node.last_child().unwrap().name(), Some("b"));
        let names: Vec<_> = (&node).into_iter().filter_map(Node::name).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_add_child_copies_is_deep() {
        let source = pair("A", "x");
        let mut target = Node::container("T");
        target.add_child_copies_from(&source);
        target.children_mut()[0].rename("y");
        assert_eq!(source, pair("A", "x"));
        assert_eq!(target.count(), 1);
        assert_eq!(target.subtree_size(), 2);
    }

    #[test]
    fn test_nodes_are_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Node>();
    }
}
