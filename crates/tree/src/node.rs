//! Tree node, the graph primitive of a context tree.
//!
//! A node knows only the id of the layer it stands for and its children.
//! Layer metadata stays in the registry; nodes never own layers, so the same
//! layer can sit at many positions without any shared ownership.

use strata_core::LayerId;

/// One position in a context tree.
///
/// Children are keyed by layer id: a parent holds at most one child per
/// layer. Insertion order is kept so serialized trees are stable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode {
    id: LayerId,
    children: Vec<TreeNode>,
}

impl TreeNode {
    pub fn new(id: LayerId) -> Self {
        Self {
            id,
            children: Vec::new(),
        }
    }

    /// Id of the layer this node references.
    pub fn id(&self) -> &LayerId {
        &self.id
    }

    pub fn children(&self) -> &[TreeNode] {
        &self.children
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.children.iter().position(|c| c.id.as_str() == id)
    }

    /// Add a child, replacing any existing child for the same layer in place.
    /// Returns the replaced child.
    pub fn add_child(&mut self, node: TreeNode) -> Option<TreeNode> {
        match self.position(node.id.as_str()) {
            Some(pos) => Some(std::mem::replace(&mut self.children[pos], node)),
            None => {
                self.children.push(node);
                None
            }
        }
    }

    /// Add a child, folding it into an existing child for the same layer
    /// instead of replacing it. Neither subtree loses descendants.
    pub fn merge_child(&mut self, node: TreeNode) {
        match self.position(node.id.as_str()) {
            Some(pos) => {
                let existing = &mut self.children[pos];
                for grandchild in node.children {
                    existing.merge_child(grandchild);
                }
            }
            None => self.children.push(node),
        }
    }

    pub fn get_child(&self, id: &str) -> Option<&TreeNode> {
        self.children.iter().find(|c| c.id.as_str() == id)
    }

    pub fn get_child_mut(&mut self, id: &str) -> Option<&mut TreeNode> {
        self.children.iter_mut().find(|c| c.id.as_str() == id)
    }

    pub fn has_child(&self, id: &str) -> bool {
        self.position(id).is_some()
    }

    pub fn remove_child(&mut self, id: &str) -> Option<TreeNode> {
        self.position(id).map(|pos| self.children.remove(pos))
    }

    /// Detach and return all children.
    pub fn take_children(&mut self) -> Vec<TreeNode> {
        std::mem::take(&mut self.children)
    }

    /// Follow a chain of layer ids down from this node.
    pub fn descendant(&self, ids: &[LayerId]) -> Option<&TreeNode> {
        match ids.split_first() {
            None => Some(self),
            Some((first, rest)) => self.get_child(first.as_str())?.descendant(rest),
        }
    }

    pub fn descendant_mut(&mut self, ids: &[LayerId]) -> Option<&mut TreeNode> {
        match ids.split_first() {
            None => Some(self),
            Some((first, rest)) => self.get_child_mut(first.as_str())?.descendant_mut(rest),
        }
    }

    /// Follow a chain of layer ids, creating missing nodes on the way.
    pub fn ensure_descendant(&mut self, ids: &[LayerId]) -> &mut TreeNode {
        match ids.split_first() {
            None => self,
            Some((first, rest)) => {
                let pos = match self.position(first.as_str()) {
                    Some(pos) => pos,
                    None => {
                        self.children.push(TreeNode::new(first.clone()));
                        self.children.len() - 1
                    }
                };
                self.children[pos].ensure_descendant(rest)
            }
        }
    }

    /// Number of nodes in this subtree, this node included.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(TreeNode::node_count).sum::<usize>()
    }

    /// Remove every node below this one that references `id`, moving each
    /// removed node's children up one level. Returns how many nodes went.
    pub fn prune_layer(&mut self, id: &str) -> usize {
        let mut removed = 0;
        for child in &mut self.children {
            removed += child.prune_layer(id);
        }
        while let Some(pos) = self.position(id) {
            let mut node = self.children.remove(pos);
            removed += 1;
            for grandchild in node.take_children() {
                self.merge_child(grandchild);
            }
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> LayerId {
        LayerId::from(s)
    }

    fn node(s: &str, children: Vec<TreeNode>) -> TreeNode {
        let mut n = TreeNode::new(id(s));
        for c in children {
            n.add_child(c);
        }
        n
    }

    #[test]
    fn add_child_replaces_same_layer() {
        let mut root = TreeNode::new(id("root"));
        assert!(root.add_child(node("a", vec![node("x", vec![])])).is_none());
        let replaced = root.add_child(TreeNode::new(id("a")));
        assert!(replaced.unwrap().has_children());
        assert_eq!(root.children().len(), 1);
        assert!(!root.get_child("a").unwrap().has_children());
    }

    #[test]
    fn merge_child_keeps_both_subtrees() {
        let mut root = node("root", vec![node("a", vec![node("x", vec![])])]);
        root.merge_child(node("a", vec![node("y", vec![])]));
        let a = root.get_child("a").unwrap();
        assert!(a.has_child("x"));
        assert!(a.has_child("y"));
        assert_eq!(root.children().len(), 1);
    }

    #[test]
    fn children_keep_insertion_order() {
        let root = node("root", vec![node("c", vec![]), node("a", vec![]), node("b", vec![])]);
        let order: Vec<&str> = root.children().iter().map(|c| c.id().as_str()).collect();
        assert_eq!(order, vec!["c", "a", "b"]);
    }

    #[test]
    fn descendant_walks_chain() {
        let mut root = node("root", vec![node("a", vec![node("b", vec![])])]);
        assert_eq!(root.descendant(&[id("a"), id("b")]).unwrap().id(), &id("b"));
        assert!(root.descendant(&[id("b")]).is_none());
        assert_eq!(root.descendant(&[]).unwrap().id(), &id("root"));

        root.descendant_mut(&[id("a")]).unwrap().add_child(TreeNode::new(id("c")));
        assert!(root.descendant(&[id("a"), id("c")]).is_some());
    }

    #[test]
    fn ensure_descendant_creates_missing_nodes() {
        let mut root = TreeNode::new(id("root"));
        root.ensure_descendant(&[id("a"), id("b")]);
        root.ensure_descendant(&[id("a"), id("c")]);
        assert_eq!(root.node_count(), 4);
        assert_eq!(root.get_child("a").unwrap().children().len(), 2);
    }

    #[test]
    fn remove_child_detaches_subtree() {
        let mut root = node("root", vec![node("a", vec![node("b", vec![])])]);
        let removed = root.remove_child("a").unwrap();
        assert!(removed.has_child("b"));
        assert!(!root.has_children());
        assert!(root.remove_child("a").is_none());
    }

    #[test]
    fn prune_layer_lifts_children() {
        // root/a/b/c and root/b/d
        let mut root = node(
            "root",
            vec![
                node("a", vec![node("b", vec![node("c", vec![])])]),
                node("b", vec![node("d", vec![])]),
            ],
        );
        assert_eq!(root.prune_layer("b"), 2);
        assert!(root.descendant(&[id("a"), id("b")]).is_none());
        assert!(!root.has_child("b"));
        assert!(root.descendant(&[id("a"), id("c")]).is_some());
        assert!(root.descendant(&[id("d")]).is_some());
        assert_eq!(root.node_count(), 4);
    }
}
