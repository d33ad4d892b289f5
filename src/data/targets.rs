//! Unrolled training targets sampled from a finished trajectory.

use crate::config::MuZeroConfig;
use crate::data::support::encode_target;
use crate::data::trajectory::{TrajectoryBuffer, TrajectoryError};

/// Targets for one sample: the observation at `t` plus `unroll_steps` dynamics steps.
///
/// `actions` has `unroll_steps` entries; the other vectors have `unroll_steps + 1`, one per
/// unrolled position starting at `t`. Values and rewards are already encoded for the
/// configured support (a single scalar when `support_size == 0`).
#[derive(Debug, Clone, PartialEq)]
pub struct UnrollTargets {
    pub actions: Vec<usize>,
    pub values: Vec<Vec<f64>>,
    pub rewards: Vec<Vec<f64>>,
    pub policies: Vec<Vec<f32>>,
}

impl TrajectoryBuffer {
    /// Build the unrolled targets starting at captured step `t`.
    ///
    /// Positions past the last captured step are absorbing: value and reward targets are
    /// zero, the policy target is uniform and the action is `0`. The reward target of the
    /// position right after the last step is still the final environment reward.
    pub fn make_targets(
        &self,
        t: usize,
        action_size: usize,
        config: &MuZeroConfig,
    ) -> Result<UnrollTargets, TrajectoryError> {
        if self.observed_returns.is_empty() {
            return Err(TrajectoryError::ReturnsNotComputed);
        }
        let steps = self.num_steps();
        if t >= steps {
            return Err(TrajectoryError::StepOutOfRange { t, len: steps });
        }

        let k = config.unroll_steps;
        let uniform = vec![1.0 / action_size.max(1) as f32; action_size];
        let encode = |x: f64| encode_target(x, config.support_size, config.reward_epsilon);

        let mut targets = UnrollTargets {
            actions: Vec::with_capacity(k),
            values: Vec::with_capacity(k + 1),
            rewards: Vec::with_capacity(k + 1),
            policies: Vec::with_capacity(k + 1),
        };

        for index in t..=t + k {
            let value = if index < steps {
                self.observed_returns[index]
            } else {
                0.0
            };
            let reward = if index > t && index <= steps {
                self.rewards[index - 1]
            } else {
                0.0
            };
            let policy = if index < steps {
                self.search_policies[index].clone()
            } else {
                uniform.clone()
            };

            targets.values.push(encode(value)?);
            targets.rewards.push(encode(reward)?);
            targets.policies.push(policy);
            if index < t + k {
                targets
                    .actions
                    .push(self.actions.get(index).copied().unwrap_or(0));
            }
        }

        Ok(targets)
    }
}
