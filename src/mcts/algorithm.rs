//! Monte Carlo Tree Search over a learned model.
//!
//! The tree is rooted at the latent state of the current real observation and grows only
//! through the model: the dynamics function provides `(reward, next latent)` for an edge and
//! the prediction function provides `(prior, value)` for the new node. Every model output is
//! sanitised before it enters the tree, so constant, zero, NaN or infinite outputs never stop
//! the search. The resulting [`SearchResult`] carries the visit-count policy captured into the
//! trajectory buffer.

use crate::config::{ConfigError, MuZeroConfig};
use crate::data::observation::Observation;
use crate::mcts::mcts_result::{apply_temperature, SearchResult, SearchStats};
use crate::mcts::node::{Node, NodeId};
use crate::mcts::noise::add_exploration_noise;
use crate::mcts::sanitize::{sanitize_latent, sanitize_policy, sanitize_scalar};
use crate::mcts::selection::{
    apply_virtual_visits, backpropagate, select_leaf_path, LeafSelection, PuctParams,
    SelectedPath,
};
use crate::mcts::tree::SearchTree;
use crate::neural::model::{MuZeroModel, Prediction, Transition};
use rand::prelude::*;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("no legal action at the root")]
    NoLegalActions,

    #[error("legal mask has {actual} entries, action space has {expected}")]
    MaskSize { expected: usize, actual: usize },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Search engine owning the model, the tree and the root-noise RNG.
///
/// One instance serves one self-play episode: the tree is kept between calls for the same
/// real state and must be cleared with [`MuZeroMcts::clear_tree`] once the environment moves on.
pub struct MuZeroMcts<M: MuZeroModel> {
    model: M,
    config: MuZeroConfig,
    tree: SearchTree,
    rng: StdRng,
    root_priors_raw: Vec<f32>,
    root_priors_noisy: Vec<f32>,
}

impl<M: MuZeroModel> MuZeroMcts<M> {
    pub fn new(model: M, config: MuZeroConfig) -> Result<Self, SearchError> {
        config.validate()?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_rng(&mut rand::rng()),
        };
        log::info!("🌳 MuZero search ready: {}", config.to_config_string());

        Ok(Self {
            model,
            config,
            tree: SearchTree::new(),
            rng,
            root_priors_raw: Vec::new(),
            root_priors_noisy: Vec::new(),
        })
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn config(&self) -> &MuZeroConfig {
        &self.config
    }

    pub fn tree(&self) -> &SearchTree {
        &self.tree
    }

    /// Drop the whole tree and its value bounds
    pub fn clear_tree(&mut self) {
        self.tree.clear();
        self.root_priors_raw.clear();
        self.root_priors_noisy.clear();
    }

    // ========== Entry points ==========

    /// Run `num_simulations` sequential simulations from the (stacked) observation.
    ///
    /// # Arguments
    /// * `observation` - Stacked observation of the current real state
    /// * `legal` - Legal-action mask over the full action space
    /// * `temperature` - Temperature of the returned move distribution
    pub fn run_mcts(
        &mut self,
        observation: &Observation,
        legal: &[bool],
        temperature: f64,
    ) -> Result<SearchResult, SearchError> {
        self.check_mask(legal)?;
        let mut stats = SearchStats::default();
        self.ensure_root(legal, |model| model.encode(observation), &mut stats);

        for _ in 0..self.config.num_simulations {
            self.simulate(&mut stats);
        }
        Ok(self.finish(legal, temperature, stats))
    }

    /// Same as [`MuZeroMcts::run_mcts`], starting from an already encoded latent state
    pub fn run_mcts_from_latent(
        &mut self,
        latent: &[f32],
        legal: &[bool],
        temperature: f64,
    ) -> Result<SearchResult, SearchError> {
        self.check_mask(legal)?;
        let mut stats = SearchStats::default();
        self.ensure_root(legal, |_| latent.to_vec(), &mut stats);

        for _ in 0..self.config.num_simulations {
            self.simulate(&mut stats);
        }
        Ok(self.finish(legal, temperature, stats))
    }

    /// Run `num_simulations` simulations, evaluating up to `batch_size` leaves per model call.
    ///
    /// Edges on the path to a pending leaf carry a virtual loss so that later selections in
    /// the same batch spread out. A selection reaching an edge that is already pending ends the
    /// batch early.
    pub fn run_batched(
        &mut self,
        observation: &Observation,
        legal: &[bool],
        temperature: f64,
        batch_size: usize,
    ) -> Result<SearchResult, SearchError> {
        self.check_mask(legal)?;
        let batch_size = batch_size.max(1);
        let mut stats = SearchStats::default();
        self.ensure_root(legal, |model| model.encode(observation), &mut stats);

        let params = self.puct_params();
        let mut remaining = self.config.num_simulations;

        while remaining > 0 {
            let mut pending: Vec<SelectedPath> = Vec::with_capacity(batch_size);
            let mut progressed = false;

            while pending.len() < batch_size && pending.len() < remaining {
                match select_leaf_path(&self.tree, &params, self.config.max_search_depth) {
                    Some(LeafSelection::Expand(path)) => {
                        apply_virtual_visits(&mut self.tree, &path, 1);
                        pending.push(path);
                    }
                    Some(LeafSelection::DepthLimit(path)) => {
                        self.backup_existing(&path.nodes);
                        remaining -= 1;
                        progressed = true;
                    }
                    Some(LeafSelection::Collision(_)) => {
                        stats.collisions += 1;
                        break;
                    }
                    None => break,
                }
            }

            if pending.is_empty() {
                if progressed {
                    continue;
                }
                break;
            }

            remaining -= pending.len();
            self.evaluate_batch(&pending, &mut stats);
        }

        Ok(self.finish(legal, temperature, stats))
    }

    /// Search with the configured temperature and batch size
    pub fn search(
        &mut self,
        observation: &Observation,
        legal: &[bool],
    ) -> Result<SearchResult, SearchError> {
        let temperature = self.config.temperature;
        match self.config.batch_size {
            1 => self.run_mcts(observation, legal, temperature),
            batch_size => self.run_batched(observation, legal, temperature, batch_size),
        }
    }

    // ========== Root ==========

    fn check_mask(&self, legal: &[bool]) -> Result<(), SearchError> {
        let expected = self.model.action_size();
        if legal.len() != expected {
            return Err(SearchError::MaskSize {
                expected,
                actual: legal.len(),
            });
        }
        if !legal.iter().any(|&ok| ok) {
            return Err(SearchError::NoLegalActions);
        }
        Ok(())
    }

    /// Keep the current tree if its root holds the same latent state and legal set, else
    /// build a new root from the fresh encoding
    fn ensure_root(
        &mut self,
        legal: &[bool],
        encode: impl FnOnce(&M) -> Vec<f32>,
        stats: &mut SearchStats,
    ) {
        let mut latent = encode(&self.model);
        if sanitize_latent(&mut latent) {
            stats.sanitized += 1;
        }

        let same_root = self.tree.root_node().is_some_and(|root| {
            self.tree.root_legal == legal && same_latent(&root.latent, &latent)
        });
        if same_root {
            log::debug!("♻️ Reusing search tree of {} nodes", self.tree.len());
            return;
        }
        self.prepare_root(latent, legal, stats);
    }

    /// Evaluate the (sanitized) root latent, mask its prior, add exploration noise and start a
    /// new tree.
    ///
    /// The root starts with one visit worth its predicted value so the exploration term is
    /// non-zero from the first simulation.
    fn prepare_root(&mut self, latent: Vec<f32>, legal: &[bool], stats: &mut SearchStats) {
        let Prediction { mut policy, value } = self.model.predict(&latent);
        let (value, repaired) = sanitize_scalar(value);
        stats.sanitized += repaired as usize;
        if sanitize_policy(&mut policy, legal.len(), Some(legal)) {
            stats.sanitized += 1;
        }

        let mut root = Node::new(latent, 0.0, 0);
        root.visit_count = 1;
        root.total_value = value;
        root.predicted_value = value;
        root.set_priors(&policy, Some(legal));

        let mut priors: Vec<f32> = root.edges.iter().map(|e| e.prior).collect();
        if add_exploration_noise(
            &mut priors,
            self.config.dirichlet_alpha,
            self.config.exploration_fraction,
            &mut self.rng,
        ) {
            for (edge, p) in root.edges.iter_mut().zip(&priors) {
                edge.prior = *p;
            }
        }

        self.root_priors_noisy = vec![0.0; legal.len()];
        for edge in &root.edges {
            self.root_priors_noisy[edge.action] = edge.prior;
        }
        self.root_priors_raw = policy;

        self.tree.reset_root(root);
        self.tree.root_legal = legal.to_vec();

        if log::log_enabled!(log::Level::Trace) {
            log::trace!(
                "[Root] value={:.4} legal={} priors={:?}",
                value,
                legal.iter().filter(|&&ok| ok).count(),
                self.root_priors_noisy
            );
        }
    }

    // ========== Simulation ==========

    fn puct_params(&self) -> PuctParams {
        PuctParams {
            c1: self.config.c1,
            c2: self.config.c2,
            virtual_loss: self.config.virtual_loss,
        }
    }

    /// One selection → expansion → backup pass
    fn simulate(&mut self, stats: &mut SearchStats) {
        let params = self.puct_params();
        match select_leaf_path(&self.tree, &params, self.config.max_search_depth) {
            Some(LeafSelection::Expand(path)) => {
                let (parent, edge_index) = match (path.nodes.last(), path.edges.last()) {
                    (Some(&parent), Some(&edge_index)) => (parent, edge_index),
                    _ => return,
                };
                let action = self.tree.node(parent).edges[edge_index].action;
                let transition = self.model.forward(&self.tree.node(parent).latent, action);
                let transition = self.clean_transition(transition, stats);
                let prediction = self.model.predict(&transition.latent);

                let (leaf, value) = self.expand(parent, edge_index, transition, prediction, stats);
                let mut nodes = path.nodes;
                nodes.push(leaf);
                backpropagate(&mut self.tree, &nodes, value, self.config.gamma);
            }
            Some(LeafSelection::DepthLimit(path)) => self.backup_existing(&path.nodes),
            // No pending edges outside batched search
            Some(LeafSelection::Collision(_)) | None => {}
        }
    }

    /// Back up a path that ends on an existing node with that node's predicted value
    fn backup_existing(&mut self, nodes: &[NodeId]) {
        if let Some(&leaf) = nodes.last() {
            let value = self.tree.node(leaf).predicted_value;
            backpropagate(&mut self.tree, nodes, value, self.config.gamma);
        }
    }

    /// Expand every pending path with one batched dynamics and one batched prediction call
    fn evaluate_batch(&mut self, pending: &[SelectedPath], stats: &mut SearchStats) {
        let requests: Vec<(Vec<f32>, usize)> = pending
            .iter()
            .filter_map(|path| {
                let parent = *path.nodes.last()?;
                let edge_index = *path.edges.last()?;
                let node = self.tree.node(parent);
                Some((node.latent.clone(), node.edges[edge_index].action))
            })
            .collect();

        let mut outputs = self.model.forward_batch(&requests).into_iter();
        let transitions: Vec<Transition> = requests
            .iter()
            .map(|(latent, _)| {
                // Missing outputs are treated like any other degenerate output
                let transition = outputs.next().unwrap_or_else(|| Transition {
                    reward: f64::NAN,
                    latent: vec![f32::NAN; latent.len()],
                });
                self.clean_transition(transition, stats)
            })
            .collect();

        let latents: Vec<Vec<f32>> = transitions.iter().map(|t| t.latent.clone()).collect();
        let mut predictions = self.model.predict_batch(&latents).into_iter();

        for (path, transition) in pending.iter().zip(transitions) {
            apply_virtual_visits(&mut self.tree, path, -1);
            let prediction = predictions.next().unwrap_or_else(|| Prediction {
                policy: Vec::new(),
                value: f64::NAN,
            });
            let (Some(&parent), Some(&edge_index)) = (path.nodes.last(), path.edges.last()) else {
                continue;
            };

            let (leaf, value) = self.expand(parent, edge_index, transition, prediction, stats);
            let mut nodes = path.nodes.clone();
            nodes.push(leaf);
            backpropagate(&mut self.tree, &nodes, value, self.config.gamma);
        }
    }

    /// Replace non-finite reward and latent components by 0
    fn clean_transition(&self, mut transition: Transition, stats: &mut SearchStats) -> Transition {
        let (reward, reward_repaired) = sanitize_scalar(transition.reward);
        transition.reward = reward;
        let latent_repaired = sanitize_latent(&mut transition.latent);

        if reward_repaired || latent_repaired {
            stats.sanitized += reward_repaired as usize + latent_repaired as usize;
            log::trace!(
                "[Sanitize] dynamics output repaired (reward={} latent={})",
                reward_repaired,
                latent_repaired
            );
        }
        transition
    }

    /// Create the node below `edge_index` of `parent` from a cleaned transition.
    ///
    /// Non-root nodes treat every action as selectable.
    ///
    /// # Returns
    /// The new node and the value to back up from it
    fn expand(
        &mut self,
        parent: NodeId,
        edge_index: usize,
        transition: Transition,
        prediction: Prediction,
        stats: &mut SearchStats,
    ) -> (NodeId, f64) {
        let Prediction { mut policy, value } = prediction;
        let (value, value_repaired) = sanitize_scalar(value);
        let policy_repaired = sanitize_policy(&mut policy, self.model.action_size(), None);

        if value_repaired || policy_repaired {
            stats.sanitized += value_repaired as usize + policy_repaired as usize;
            log::trace!(
                "[Sanitize] prediction output repaired (value={} policy={})",
                value_repaired,
                policy_repaired
            );
        }

        let depth = self.tree.node(parent).depth + 1;
        let mut node = Node::new(transition.latent, transition.reward, depth);
        node.predicted_value = value;
        node.set_priors(&policy, None);

        let id = self.tree.attach_child(parent, edge_index, node);
        stats.expansions += 1;
        (id, value)
    }

    // ========== Result ==========

    fn finish(&self, legal: &[bool], temperature: f64, mut stats: SearchStats) -> SearchResult {
        let mut visit_counts = vec![0u32; legal.len()];
        let mut root_value = 0.0;

        if let Some(root) = self.tree.root_node() {
            for edge in &root.edges {
                if let Some(child) = edge.child {
                    visit_counts[edge.action] = self.tree.node(child).visit_count;
                }
            }
            root_value = root.mean_value();
        }

        stats.max_depth = self.tree.max_depth();
        stats.node_count = self.tree.len();

        let policy = apply_temperature(&visit_counts, legal, 1.0);
        let move_distribution = apply_temperature(&visit_counts, legal, temperature);

        log::debug!(
            "🔍 Search done: value={:.4} nodes={} depth={} expansions={} sanitized={} collisions={}",
            root_value,
            stats.node_count,
            stats.max_depth,
            stats.expansions,
            stats.sanitized,
            stats.collisions
        );

        SearchResult {
            visit_counts,
            policy,
            move_distribution,
            root_value,
            root_priors_raw: self.root_priors_raw.clone(),
            root_priors_noisy: self.root_priors_noisy.clone(),
            stats,
        }
    }
}

/// Bitwise equality of two latent states
fn same_latent(a: &[f32], b: &[f32]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.to_bits() == y.to_bits())
}
