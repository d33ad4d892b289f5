//! Per-episode trajectory buffer.
//!
//! Records one self-play episode step by step, rebuilds temporally stacked network inputs on
//! demand and converts the recorded rewards and search values into n-step bootstrapped
//! returns once the episode is terminated.
//!
//! Lifecycle: `capture`* → `terminate` → `compute_returns` → read-only → `refresh`.

use crate::data::observation::{Observation, ObservationError};
use crate::data::support::SupportError;
use thiserror::Error;

/// Player identifier as recorded by the self-play driver (e.g. `1` / `-1`)
pub type Player = i8;

#[derive(Debug, Error, PartialEq)]
pub enum TrajectoryError {
    #[error("trajectory already terminated")]
    AlreadyTerminated,

    #[error("trajectory not terminated yet")]
    NotTerminated,

    #[error("returns were already computed for this trajectory")]
    ReturnsAlreadyComputed,

    #[error("returns have not been computed yet")]
    ReturnsNotComputed,

    #[error("trajectory holds no observations")]
    Empty,

    #[error("time step {t} out of range for trajectory of length {len}")]
    StepOutOfRange { t: usize, len: usize },

    #[error(transparent)]
    Observation(#[from] ObservationError),

    #[error(transparent)]
    Support(#[from] SupportError),
}

/// Buffer of one episode of `(o_t, a_t, player_t, pi_t, u_t, v_t)` tuples.
///
/// Every captured step stores the environment reward observed after acting (`u_{t+1}` in the
/// usual notation) and the root value of the search that chose the action. The terminal
/// record contributes the final observation with a zero reward and the game outcome in place
/// of a search value.
#[derive(Debug, Clone, Default)]
pub struct TrajectoryBuffer {
    pub(crate) observations: Vec<Observation>,
    pub(crate) actions: Vec<usize>,
    pub(crate) players: Vec<Player>,
    pub(crate) search_policies: Vec<Vec<f32>>,
    pub(crate) rewards: Vec<f64>,
    pub(crate) search_values: Vec<f64>,
    pub(crate) observed_returns: Vec<f64>,
    pub(crate) terminated: bool,
}

impl TrajectoryBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one environment step.
    pub fn capture(
        &mut self,
        observation: Observation,
        action: usize,
        player: Player,
        search_policy: Vec<f32>,
        reward: f64,
        search_value: f64,
    ) -> Result<(), TrajectoryError> {
        if self.terminated {
            return Err(TrajectoryError::AlreadyTerminated);
        }
        self.observations.push(observation);
        self.actions.push(action);
        self.players.push(player);
        self.search_policies.push(search_policy);
        self.rewards.push(reward);
        self.search_values.push(search_value);
        Ok(())
    }

    /// Close the episode with the final observation and outcome `z` (from `player`'s view).
    pub fn terminate(
        &mut self,
        observation: Observation,
        player: Player,
        outcome: f64,
    ) -> Result<(), TrajectoryError> {
        if self.terminated {
            return Err(TrajectoryError::AlreadyTerminated);
        }
        self.observations.push(observation);
        self.players.push(player);
        self.rewards.push(0.0);
        self.search_values.push(outcome);
        self.terminated = true;
        log::debug!(
            "Trajectory terminated after {} steps with outcome {:.3}",
            self.num_steps(),
            outcome
        );
        Ok(())
    }

    /// Discard everything and return to the empty state.
    pub fn refresh(&mut self) {
        self.observations.clear();
        self.actions.clear();
        self.players.clear();
        self.search_policies.clear();
        self.rewards.clear();
        self.search_values.clear();
        self.observed_returns.clear();
        self.terminated = false;
    }

    /// Number of recorded observations, terminal record included
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Number of captured (non-terminal) steps
    pub fn num_steps(&self) -> usize {
        self.actions.len()
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn actions(&self) -> &[usize] {
        &self.actions
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn search_policies(&self) -> &[Vec<f32>] {
        &self.search_policies
    }

    pub fn rewards(&self) -> &[f64] {
        &self.rewards
    }

    pub fn search_values(&self) -> &[f64] {
        &self.search_values
    }

    /// n-step returns, empty until [`compute_returns`](Self::compute_returns) ran
    pub fn observed_returns(&self) -> &[f64] {
        &self.observed_returns
    }

    /// Outcome of the episode, if terminated
    pub fn outcome(&self) -> Option<f64> {
        self.terminated.then(|| self.search_values.last().copied()).flatten()
    }

    /// Stack `length` frames along the channel axis, oldest first.
    ///
    /// * `t` selects the window ending at step `t` (inclusive) instead of the latest frames;
    ///   nothing after `t` is read.
    /// * `current` is always the newest frame. Without `t` it is appended after the latest
    ///   stored frame (the oldest one makes room); with `t` it stands in for frame `t`.
    ///
    /// Missing history is left-padded with zero frames. `length <= 1` returns that newest frame
    /// unchanged.
    pub fn stack_observations(
        &self,
        length: usize,
        current: Option<&Observation>,
        t: Option<usize>,
    ) -> Result<Observation, TrajectoryError> {
        if let Some(t) = t {
            if t >= self.observations.len() {
                return Err(TrajectoryError::StepOutOfRange {
                    t,
                    len: self.observations.len(),
                });
            }
        }

        if length <= 1 {
            let frame = match (current, t) {
                (Some(current), _) => current,
                (None, Some(t)) => &self.observations[t],
                (None, None) => self.observations.last().ok_or(TrajectoryError::Empty)?,
            };
            return Ok(frame.clone());
        }

        // Stored frames that end up in the window, newest last
        let end = match (t, current) {
            (Some(t), Some(_)) => t,
            (Some(t), None) => t + 1,
            (None, _) => self.observations.len(),
        };
        let keep = if current.is_some() { length - 1 } else { length };
        let start = end.saturating_sub(keep);

        let mut frames: Vec<&Observation> = self.observations[start..end].iter().collect();
        frames.extend(current);

        let first = *frames.first().ok_or(TrajectoryError::Empty)?;
        let padding = first.zeros_like();
        let missing = length - frames.len();
        frames.splice(0..0, std::iter::repeat_n(&padding, missing));

        Ok(Observation::concat_channels(&frames)?)
    }

    /// Compute the `horizon`-step bootstrapped return of every step.
    ///
    /// `z_t = Σ_{k<h} γ^k u_{t+k} + γ^h v_{t+h}` with `t + h` capped at the terminal record,
    /// whose value is the outcome seen from the player acting at `t`. The terminal entry
    /// itself therefore gets the outcome.
    pub fn compute_returns(&mut self, gamma: f64, horizon: usize) -> Result<&[f64], TrajectoryError> {
        if !self.terminated {
            return Err(TrajectoryError::NotTerminated);
        }
        if !self.observed_returns.is_empty() {
            return Err(TrajectoryError::ReturnsAlreadyComputed);
        }

        let terminal = self.rewards.len() - 1;
        let outcome = self.search_values[terminal];
        let terminal_player = self.players[terminal];

        let returns: Vec<f64> = (0..=terminal)
            .map(|t| {
                let bootstrap_index = (t + horizon).min(terminal);
                let mut discount = 1.0;
                let mut value = 0.0;
                for reward in &self.rewards[t..bootstrap_index] {
                    value += discount * reward;
                    discount *= gamma;
                }

                let bootstrap = if bootstrap_index == terminal {
                    if self.players[t] == terminal_player {
                        outcome
                    } else {
                        -outcome
                    }
                } else {
                    self.search_values[bootstrap_index]
                };
                value + discount * bootstrap
            })
            .collect();

        if log::log_enabled!(log::Level::Trace) {
            log::trace!(
                "n-step returns (gamma={gamma}, horizon={horizon}): {:?}",
                returns
            );
        }

        self.observed_returns = returns;
        Ok(&self.observed_returns)
    }
}
