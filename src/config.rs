//! MuZero Configuration
//!
//! Every tunable option recognised by the search engine, the trajectory buffer and the
//! bundled network. Configurations are plain JSON documents; missing keys fall back to the
//! defaults below.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid config: {msg}")]
    InvalidConfig { msg: &'static str },

    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Json(#[from] serde_json::Error),
}

/// MuZero search, target and network configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MuZeroConfig {
    // ========== Search ==========
    /// Simulations per decision
    /// Default: 50
    pub num_simulations: usize,

    /// PUCT base exploration constant
    /// Default: 1.25
    pub c1: f64,

    /// PUCT visit-count scaling constant
    /// Default: 19652
    pub c2: f64,

    /// Discount applied to learned rewards and bootstrap values
    /// Default: 0.997
    pub gamma: f64,

    /// Dirichlet concentration for root noise (0 disables noise)
    /// Default: 0.25
    pub dirichlet_alpha: f64,

    /// Fraction of the root prior replaced by Dirichlet noise
    /// Default: 0.25
    pub exploration_fraction: f64,

    /// Deepest node a simulation may descend to
    /// Default: 64
    pub max_search_depth: usize,

    /// Temperature applied to root visit counts when choosing a move
    /// Default: 1.0
    pub temperature: f64,

    /// Pessimistic value applied to in-flight edges during batched search
    /// Default: 1.0
    pub virtual_loss: f64,

    /// Leaves evaluated together by `run_batched`
    /// Default: 8
    pub batch_size: usize,

    /// Seed for the search RNG (root noise); entropy-seeded when absent
    pub seed: Option<u64>,

    // ========== Trajectory / targets ==========
    /// Frames stacked into one network input (K)
    /// Default: 8
    pub observation_length: usize,

    /// Bootstrap horizon of the n-step return
    /// Default: 10
    pub n_steps: usize,

    /// Dynamics unroll length of a training sample
    /// Default: 5
    pub unroll_steps: usize,

    /// Half-width of the categorical value/reward support (0 = scalar targets)
    /// Default: 0
    pub support_size: usize,

    /// Linear term of the reward compression transform
    /// Default: 0.001
    pub reward_epsilon: f64,

    // ========== Network ==========
    /// Latent state width of the bundled network
    /// Default: 32
    pub latent_dim: usize,

    /// Hidden layer width of the bundled network
    /// Default: 64
    pub hidden_dim: usize,
}

impl Default for MuZeroConfig {
    fn default() -> Self {
        Self {
            // Search
            num_simulations: 50,
            c1: 1.25,
            c2: 19652.0,
            gamma: 0.997,
            dirichlet_alpha: 0.25,
            exploration_fraction: 0.25,
            max_search_depth: 64,
            temperature: 1.0,
            virtual_loss: 1.0,
            batch_size: 8,
            seed: None,

            // Targets
            observation_length: 8,
            n_steps: 10,
            unroll_steps: 5,
            support_size: 0,
            reward_epsilon: 0.001,

            // Network
            latent_dim: 32,
            hidden_dim: 64,
        }
    }
}

impl MuZeroConfig {
    /// Parse a JSON configuration and validate it
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON configuration file and validate it
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        log::debug!("Loading MuZero config from {}", path.display());
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Write this configuration as pretty JSON
    pub fn save_json_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_simulations == 0 {
            return Err(ConfigError::InvalidConfig {
                msg: "num_simulations must be > 0",
            });
        }
        if !(self.c1.is_finite() && self.c1 >= 0.0) {
            return Err(ConfigError::InvalidConfig {
                msg: "c1 must be finite and >= 0",
            });
        }
        if !(self.c2.is_finite() && self.c2 > 0.0) {
            return Err(ConfigError::InvalidConfig {
                msg: "c2 must be finite and > 0",
            });
        }
        if !(self.gamma > 0.0 && self.gamma <= 1.0) {
            return Err(ConfigError::InvalidConfig {
                msg: "gamma must lie in (0, 1]",
            });
        }
        if !(self.dirichlet_alpha.is_finite() && self.dirichlet_alpha >= 0.0) {
            return Err(ConfigError::InvalidConfig {
                msg: "dirichlet_alpha must be finite and >= 0",
            });
        }
        if !(0.0..=1.0).contains(&self.exploration_fraction) {
            return Err(ConfigError::InvalidConfig {
                msg: "exploration_fraction must lie in [0, 1]",
            });
        }
        if self.max_search_depth == 0 {
            return Err(ConfigError::InvalidConfig {
                msg: "max_search_depth must be > 0",
            });
        }
        if !(self.temperature.is_finite() && self.temperature >= 0.0) {
            return Err(ConfigError::InvalidConfig {
                msg: "temperature must be finite and >= 0",
            });
        }
        if !(self.virtual_loss.is_finite() && self.virtual_loss >= 0.0) {
            return Err(ConfigError::InvalidConfig {
                msg: "virtual_loss must be finite and >= 0",
            });
        }
        if self.batch_size == 0 {
            return Err(ConfigError::InvalidConfig {
                msg: "batch_size must be > 0",
            });
        }
        if !(self.reward_epsilon.is_finite() && self.reward_epsilon >= 0.0) {
            return Err(ConfigError::InvalidConfig {
                msg: "reward_epsilon must be finite and >= 0",
            });
        }
        if self.latent_dim == 0 || self.hidden_dim == 0 {
            return Err(ConfigError::InvalidConfig {
                msg: "latent_dim and hidden_dim must be > 0",
            });
        }
        Ok(())
    }

    /// Create a configuration string for logging
    pub fn to_config_string(&self) -> String {
        format!(
            "sims[{}]_puct[{:.2},{:.0}]_gamma[{:.3}]_noise[{:.2},{:.2}]_depth[{}]_obs[{}]_nstep[{}]_support[{}]",
            self.num_simulations,
            self.c1,
            self.c2,
            self.gamma,
            self.dirichlet_alpha,
            self.exploration_fraction,
            self.max_search_depth,
            self.observation_length,
            self.n_steps,
            self.support_size
        )
    }
}
