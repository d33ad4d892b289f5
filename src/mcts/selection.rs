//! Selection and backup over the search tree
//!
//! Edges are scored with the MuZero pUCT rule:
//!
//! `Q̂(s,a) + P(s,a) · sqrt(N(s)) / (1 + N(s,a)) · (c1 + ln((N(s) + c2 + 1) / c2))`
//!
//! where `Q̂` is the child's mean value scaled by the tree-wide min/max bounds. Ties go to the
//! lowest action index.

use crate::mcts::node::NodeId;
use crate::mcts::tree::SearchTree;

/// Exploration constants and virtual loss used while scoring edges
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PuctParams {
    pub c1: f64,
    pub c2: f64,
    /// Pessimistic value charged per in-flight visit (0 disables virtual loss)
    pub virtual_loss: f64,
}

/// pUCT score of one edge
///
/// # Arguments
/// * `q_normalized` - Normalised mean value of the child (0 when unvisited)
/// * `prior` - Prior probability of the edge
/// * `parent_visits` - Visit count of the parent node
/// * `child_visits` - Visit count of the child node
pub fn puct_score(
    q_normalized: f64,
    prior: f64,
    parent_visits: f64,
    child_visits: f64,
    c1: f64,
    c2: f64,
) -> f64 {
    let exploration = c1 + ((parent_visits + c2 + 1.0) / c2).ln();
    q_normalized + prior * parent_visits.sqrt() / (1.0 + child_visits) * exploration
}

/// Pick the edge of `node_id` with the highest pUCT score.
///
/// In-flight visits count towards the visit counts and lower the child's value by
/// `virtual_loss` each.
///
/// # Returns
/// Index into the node's edges, or `None` if the node has no edges
pub fn select_edge(tree: &SearchTree, node_id: NodeId, params: &PuctParams) -> Option<usize> {
    let node = tree.node(node_id);
    let parent_visits = (node.visit_count + node.pending_visits()) as f64;

    let mut best_score = f64::NEG_INFINITY;
    let mut best_index = None;

    for (i, edge) in node.edges.iter().enumerate() {
        let pending = edge.virtual_visits as f64;
        let (visits, total) = match edge.child {
            Some(child) => {
                let child = tree.node(child);
                (child.visit_count as f64, child.total_value)
            }
            None => (0.0, 0.0),
        };

        let effective_visits = visits + pending;
        let q = if effective_visits > 0.0 {
            let q = (total - pending * params.virtual_loss) / effective_visits;
            tree.min_max.normalize(q)
        } else {
            0.0
        };

        let score = puct_score(
            q,
            edge.prior as f64,
            parent_visits,
            effective_visits,
            params.c1,
            params.c2,
        );
        let score = if score.is_nan() { f64::NEG_INFINITY } else { score };

        // Strictly greater keeps the lowest index on ties
        if best_index.is_none() || score > best_score {
            best_score = score;
            best_index = Some(i);
        }
    }

    best_index
}

/// Nodes and edge choices of one root-to-leaf descent.
///
/// `edges[i]` is the edge taken out of `nodes[i]`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SelectedPath {
    pub nodes: Vec<NodeId>,
    pub edges: Vec<usize>,
}

impl SelectedPath {
    /// Node at the end of the path (the parent of the edge to expand, if any)
    pub fn last_node(&self) -> Option<NodeId> {
        self.nodes.last().copied()
    }

    /// Number of edges followed
    pub fn depth(&self) -> usize {
        self.edges.len()
    }
}

/// Outcome of one descent
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeafSelection {
    /// The last edge is unexpanded; `nodes.len() == edges.len()`
    Expand(SelectedPath),
    /// The descent stopped at an existing node at the depth limit (or without edges);
    /// `nodes.len() == edges.len() + 1`
    DepthLimit(SelectedPath),
    /// The last edge is unexpanded and already awaiting evaluation in this batch
    Collision(SelectedPath),
}

/// Descend from the root until an unexpanded edge or `max_depth` is reached.
///
/// Returns `None` when the tree has no root.
pub fn select_leaf_path(
    tree: &SearchTree,
    params: &PuctParams,
    max_depth: usize,
) -> Option<LeafSelection> {
    let mut node_id = tree.root()?;
    let mut path = SelectedPath::default();

    loop {
        path.nodes.push(node_id);
        if tree.node(node_id).depth >= max_depth {
            return Some(LeafSelection::DepthLimit(path));
        }

        let Some(edge_index) = select_edge(tree, node_id, params) else {
            return Some(LeafSelection::DepthLimit(path));
        };
        path.edges.push(edge_index);

        let edge = &tree.node(node_id).edges[edge_index];
        match edge.child {
            Some(child) => node_id = child,
            None if edge.virtual_visits > 0 => return Some(LeafSelection::Collision(path)),
            None => return Some(LeafSelection::Expand(path)),
        }
    }
}

/// Add (`delta > 0`) or remove (`delta < 0`) one in-flight visit on every edge of `path`
pub fn apply_virtual_visits(tree: &mut SearchTree, path: &SelectedPath, delta: i32) {
    for (&node_id, &edge_index) in path.nodes.iter().zip(&path.edges) {
        let edge = &mut tree.node_mut(node_id).edges[edge_index];
        edge.virtual_visits = edge.virtual_visits.saturating_add_signed(delta);
    }
}

/// Back `leaf_value` up from `leaf` to the root along `path`.
///
/// Every non-root node discounts the incoming value and adds its own reward before
/// accumulating it; the root accumulates the value it receives as is. Non-finite values are
/// treated as 0.
pub fn backpropagate(tree: &mut SearchTree, path: &[NodeId], leaf_value: f64, gamma: f64) {
    let mut value = if leaf_value.is_finite() { leaf_value } else { 0.0 };

    for (i, &node_id) in path.iter().enumerate().rev() {
        let node = tree.node_mut(node_id);
        if i > 0 {
            value = node.reward + gamma * value;
            if !value.is_finite() {
                value = 0.0;
            }
        }
        node.visit_count += 1;
        node.total_value += value;
        let mean = node.mean_value();
        if i > 0 {
            tree.min_max.update(mean);
        }
    }
}
