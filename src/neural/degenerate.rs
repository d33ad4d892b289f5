//! Ill-conditioned stand-in models.
//!
//! These replace the real network when checking that the search terminates and stays finite
//! whatever the learned functions return.

use crate::data::observation::Observation;
use crate::neural::model::{MuZeroModel, Prediction, Transition};
use rand::prelude::*;
use std::cell::RefCell;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DegenerateMode {
    /// Zero latents, rewards, values and policy logits
    Zero,
    /// Every output component equals the constant
    Constant(f32),
    /// Every output component is NaN
    NotANumber,
    /// Every output component is +inf
    Infinite,
    /// Dynamics map every latent to zeros with zero reward; prediction returns an
    /// unnormalised uniform-random policy and a zero value
    RandomPolicy,
}

pub struct DegenerateModel {
    mode: DegenerateMode,
    action_size: usize,
    latent_dim: usize,
    rng: RefCell<StdRng>,
}

impl DegenerateModel {
    pub fn new(mode: DegenerateMode, action_size: usize, latent_dim: usize) -> Self {
        Self::with_seed(mode, action_size, latent_dim, 0)
    }

    pub fn with_seed(mode: DegenerateMode, action_size: usize, latent_dim: usize, seed: u64) -> Self {
        Self {
            mode,
            action_size,
            latent_dim,
            rng: RefCell::new(StdRng::seed_from_u64(seed)),
        }
    }

    pub fn mode(&self) -> DegenerateMode {
        self.mode
    }

    fn constant(&self) -> Option<f32> {
        match self.mode {
            DegenerateMode::Zero => Some(0.0),
            DegenerateMode::Constant(c) => Some(c),
            DegenerateMode::NotANumber => Some(f32::NAN),
            DegenerateMode::Infinite => Some(f32::INFINITY),
            DegenerateMode::RandomPolicy => None,
        }
    }

    /// Fold the finite observation values into `latent_dim` buckets and squash them.
    fn fold(&self, observation: &Observation) -> Vec<f32> {
        let mut latent = vec![0.0f32; self.latent_dim];
        if self.latent_dim == 0 {
            return latent;
        }
        for (i, v) in observation.data().iter().enumerate() {
            if v.is_finite() {
                latent[i % self.latent_dim] += v;
            }
        }
        latent.iter_mut().for_each(|v| *v = v.tanh());
        latent
    }
}

impl MuZeroModel for DegenerateModel {
    fn action_size(&self) -> usize {
        self.action_size
    }

    fn encode(&self, observation: &Observation) -> Vec<f32> {
        match self.constant() {
            Some(c) => vec![c; self.latent_dim],
            None => self.fold(observation),
        }
    }

    fn predict(&self, _latent: &[f32]) -> Prediction {
        match self.constant() {
            Some(c) => Prediction {
                policy: vec![c; self.action_size],
                value: c as f64,
            },
            None => {
                let mut rng = self.rng.borrow_mut();
                Prediction {
                    policy: (0..self.action_size).map(|_| rng.random::<f32>()).collect(),
                    value: 0.0,
                }
            }
        }
    }

    fn forward(&self, latent: &[f32], _action: usize) -> Transition {
        match self.constant() {
            Some(c) => Transition {
                reward: c as f64,
                latent: vec![c; latent.len()],
            },
            None => Transition {
                reward: 0.0,
                latent: vec![0.0; latent.len()],
            },
        }
    }
}
