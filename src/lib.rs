//! # MuZero Core
//!
//! Planning with a learned model: a Monte Carlo Tree Search that expands its tree through
//! learned dynamics and prediction functions instead of a game simulator, plus the per-episode
//! trajectory buffer that turns self-play into training targets.
//!
//! ## Features
//!
//! - **Search Engine**: PUCT selection with min/max value normalisation, learned-model expansion,
//!   discounted backup, root masking and Dirichlet noise, virtual-loss batched simulations
//! - **Search Tree**: arena storage keyed by search path, never by latent value
//! - **Trajectory Buffer**: episode capture, temporal observation stacking, n-step returns
//! - **Support Codec**: scalar ↔ categorical support and the signed square-root reward transform
//! - **Models**: a libtorch network (`tch-net` feature) and a degenerate test double
//!
//! ## Usage
//!
//! ```rust
//! use muzero_core::{
//!     data::{Observation, TrajectoryBuffer},
//!     mcts::MuZeroMcts,
//!     neural::{DegenerateMode, DegenerateModel},
//!     MuZeroConfig,
//! };
//!
//! let model = DegenerateModel::new(DegenerateMode::Zero, 4, 8);
//! let mut mcts = MuZeroMcts::new(model, MuZeroConfig::default()).unwrap();
//! let observation = Observation::zeros(vec![3, 3, 2]);
//! let result = mcts.run_mcts(&observation, &[true; 4], 1.0).unwrap();
//!
//! let mut history = TrajectoryBuffer::new();
//! history
//!     .capture(observation, result.best_action(), 1, result.policy.clone(), 0.0, result.root_value)
//!     .unwrap();
//! ```

// ============================================================================
// PUBLIC API MODULES
// ============================================================================

/// Search configuration and hyperparameters
pub mod config;

/// Trajectory buffer, observation stacking and training targets
pub mod data;

/// Game collaborator interface
pub mod game;

/// Logging setup
pub mod logging;

/// Monte Carlo Tree Search over a learned model
pub mod mcts;

/// Learned model interface and implementations
pub mod neural;

// ============================================================================
// PUBLIC API RE-EXPORTS
// ============================================================================

pub use config::{ConfigError, MuZeroConfig};

pub use data::{
    Observation, ObservationError, SupportError, TrajectoryBuffer, TrajectoryError,
    UnrollTargets,
};

pub use mcts::{MuZeroMcts, SearchError, SearchResult, SearchStats};

pub use neural::{DegenerateMode, DegenerateModel, MuZeroModel, Prediction, Transition};

#[cfg(feature = "tch-net")]
pub use neural::MuZeroNet;

// ============================================================================
// ERROR TYPES
// ============================================================================

/// Main error type for the MuZero core library
#[derive(Debug, thiserror::Error)]
pub enum MuZeroError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Search error: {0}")]
    Search(#[from] SearchError),

    #[error("Trajectory error: {0}")]
    Trajectory(#[from] TrajectoryError),

    #[error("Support error: {0}")]
    Support(#[from] SupportError),

    #[error("Observation error: {0}")]
    Observation(#[from] ObservationError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, MuZeroError>;

// ============================================================================
// LIBRARY VERSION INFO
// ============================================================================

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Library description
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
