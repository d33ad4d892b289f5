//! Search tree nodes and edges
//!
//! A node holds the statistics of the edge that leads into it (`visit_count`, `total_value`,
//! the reward received on entering it) together with its latent state. Nodes are created
//! fresh on every expansion and are reachable only through their unique parent edge, so two
//! nodes with identical latents are still distinct tree positions.

/// Index of a node in the search arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Outgoing edge of a node for one selectable action
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub action: usize,
    pub prior: f32,
    /// `None` until the edge is expanded
    pub child: Option<NodeId>,
    /// Simulations currently in flight through this edge (batched search only)
    pub virtual_visits: u32,
}

impl Edge {
    pub fn new(action: usize, prior: f32) -> Self {
        Self {
            action,
            prior,
            child: None,
            virtual_visits: 0,
        }
    }

    pub fn is_expanded(&self) -> bool {
        self.child.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct Node {
    /// Number of backups through this node
    pub visit_count: u32,

    /// Sum of all values backed up through this node
    pub total_value: f64,

    /// Reward predicted by the dynamics function on entering this node (0 at the root)
    pub reward: f64,

    pub latent: Vec<f32>,

    /// Value predicted for `latent`, reused when a simulation stops here at the depth limit
    pub predicted_value: f64,

    /// Distance from the root
    pub depth: usize,

    /// Selectable actions; empty until the node has been evaluated
    pub edges: Vec<Edge>,
}

impl Node {
    pub fn new(latent: Vec<f32>, reward: f64, depth: usize) -> Self {
        Self {
            visit_count: 0,
            total_value: 0.0,
            reward,
            latent,
            predicted_value: 0.0,
            depth,
            edges: Vec::new(),
        }
    }

    /// Mean backed-up value, 0 for an unvisited node
    pub fn mean_value(&self) -> f64 {
        if self.visit_count == 0 {
            0.0
        } else {
            self.total_value / self.visit_count as f64
        }
    }

    pub fn is_evaluated(&self) -> bool {
        !self.edges.is_empty()
    }

    /// Replace the edges with one edge per selectable action.
    ///
    /// `legal` restricts the selectable actions; `None` makes every action selectable.
    pub fn set_priors(&mut self, priors: &[f32], legal: Option<&[bool]>) {
        self.edges = priors
            .iter()
            .enumerate()
            .filter(|(a, _)| legal.map_or(true, |mask| mask.get(*a).copied().unwrap_or(false)))
            .map(|(a, &p)| Edge::new(a, p))
            .collect();
    }

    pub fn edge_for_action(&self, action: usize) -> Option<&Edge> {
        self.edges.iter().find(|e| e.action == action)
    }

    /// Virtual visits pending on all outgoing edges
    pub fn pending_visits(&self) -> u32 {
        self.edges.iter().map(|e| e.virtual_visits).sum()
    }
}
