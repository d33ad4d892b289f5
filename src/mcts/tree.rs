//! Arena-backed search tree.

use crate::mcts::min_max::MinMaxStats;
use crate::mcts::node::{Node, NodeId};

/// Nodes of one search, addressed by [`NodeId`], plus the tree-wide value bounds.
#[derive(Debug, Clone, Default)]
pub struct SearchTree {
    nodes: Vec<Node>,
    root: Option<NodeId>,
    pub min_max: MinMaxStats,
    /// Legal mask the root was expanded with
    pub(crate) root_legal: Vec<bool>,
}

impl SearchTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn root_node(&self) -> Option<&Node> {
        self.root.map(|id| self.node(id))
    }

    /// Drop every node and start a new tree rooted at `node`
    pub fn reset_root(&mut self, node: Node) -> NodeId {
        self.clear();
        let id = self.allocate(node);
        self.root = Some(id);
        id
    }

    pub fn allocate(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    /// Allocate `child` and hang it below edge `edge` of `parent`
    pub fn attach_child(&mut self, parent: NodeId, edge: usize, child: Node) -> NodeId {
        let id = self.allocate(child);
        self.nodes[parent.index()].edges[edge].child = Some(id);
        id
    }

    /// Remove every node and forget the value bounds
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.root = None;
        self.min_max.reset();
        self.root_legal.clear();
    }

    /// Deepest node currently in the tree
    pub fn max_depth(&self) -> usize {
        self.nodes.iter().map(|n| n.depth).max().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attach_child_links_edge() {
        let mut tree = SearchTree::new();
        let root = tree.reset_root(Node::new(vec![0.0], 0.0, 0));
        tree.node_mut(root).set_priors(&[0.5, 0.5], None);

        let child = tree.attach_child(root, 1, Node::new(vec![0.0], 1.0, 1));
        assert_eq!(tree.node(root).edges[1].child, Some(child));
        assert_eq!(tree.node(root).edges[0].child, None);
        assert_eq!(tree.len(), 2);
        assert_eq!(tree.max_depth(), 1);
    }

    #[test]
    fn test_identical_latents_get_distinct_nodes() {
        let mut tree = SearchTree::new();
        let root = tree.reset_root(Node::new(vec![0.0; 2], 0.0, 0));
        tree.node_mut(root).set_priors(&[1.0], None);
        let child = tree.attach_child(root, 0, Node::new(vec![0.0; 2], 0.0, 1));
        assert_ne!(root, child);
        assert_eq!(tree.node(root).latent, tree.node(child).latent);
    }

    #[test]
    fn test_clear_resets_everything() {
        let mut tree = SearchTree::new();
        tree.reset_root(Node::new(Vec::new(), 0.0, 0));
        tree.min_max.update(1.0);
        tree.min_max.update(2.0);

        tree.clear();
        assert!(tree.is_empty());
        assert_eq!(tree.root(), None);
        assert_eq!(tree.min_max.bounds(), None);
    }
}
