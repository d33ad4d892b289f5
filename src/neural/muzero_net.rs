//! Fully connected MuZero network on libtorch.
//!
//! Three small MLPs share one `VarStore`:
//! - representation `h`: stacked observation → latent
//! - dynamics `g`: (latent, one-hot action) → (reward, next latent)
//! - prediction `f`: latent → (policy, value)
//!
//! Latents are min-max scaled to `[0, 1]` per sample. With `support_size == 0` the value head
//! is squashed with `tanh` and the reward head is a plain regression; otherwise both heads are
//! categorical over `2 * support_size + 1` points and decoded through the support codec.

use crate::config::MuZeroConfig;
use crate::data::observation::Observation;
use crate::data::support::{decode_prediction, support_width};
use crate::neural::model::{MuZeroModel, Prediction, Transition};
use crate::neural::tensor_conversion::{
    actions_to_tensor, observation_to_tensor, rows_to_tensor, tensor_to_rows,
};
use tch::{nn, Kind, Tensor};

/// Smallest latent range used by the min-max scaling
const MIN_LATENT_RANGE: f64 = 1e-5;

pub struct MuZeroNet {
    observation_dim: usize,
    action_size: usize,
    latent_dim: usize,
    support_size: usize,
    reward_epsilon: f64,

    // ========== Representation ==========
    repr_fc1: nn::Linear,
    repr_fc2: nn::Linear,

    // ========== Dynamics ==========
    dyn_fc1: nn::Linear,
    dyn_state_head: nn::Linear,
    dyn_reward_head: nn::Linear,

    // ========== Prediction ==========
    pred_fc1: nn::Linear,
    pred_policy_head: nn::Linear,
    pred_value_head: nn::Linear,
}

impl MuZeroNet {
    /// Build the network under `vs.root()`.
    ///
    /// `observation_dim` is the flattened length of a stacked observation.
    pub fn new(
        vs: &nn::VarStore,
        observation_dim: usize,
        action_size: usize,
        config: &MuZeroConfig,
    ) -> Self {
        let p = vs.root();
        let obs = observation_dim as i64;
        let actions = action_size as i64;
        let latent = config.latent_dim as i64;
        let hidden = config.hidden_dim as i64;
        let heads = if config.support_size == 0 {
            1
        } else {
            support_width(config.support_size) as i64
        };

        let net = Self {
            observation_dim,
            action_size,
            latent_dim: config.latent_dim,
            support_size: config.support_size,
            reward_epsilon: config.reward_epsilon,

            repr_fc1: nn::linear(&p / "repr_fc1", obs, hidden, Default::default()),
            repr_fc2: nn::linear(&p / "repr_fc2", hidden, latent, Default::default()),

            dyn_fc1: nn::linear(&p / "dyn_fc1", latent + actions, hidden, Default::default()),
            dyn_state_head: nn::linear(&p / "dyn_state_head", hidden, latent, Default::default()),
            dyn_reward_head: nn::linear(&p / "dyn_reward_head", hidden, heads, Default::default()),

            pred_fc1: nn::linear(&p / "pred_fc1", latent, hidden, Default::default()),
            pred_policy_head: nn::linear(&p / "pred_policy_head", hidden, actions, Default::default()),
            pred_value_head: nn::linear(&p / "pred_value_head", hidden, heads, Default::default()),
        };

        log::info!(
            "🧠 MuZeroNet: obs={} actions={} latent={} hidden={} support={}",
            observation_dim,
            action_size,
            config.latent_dim,
            config.hidden_dim,
            config.support_size
        );
        net
    }

    pub fn observation_dim(&self) -> usize {
        self.observation_dim
    }

    pub fn latent_dim(&self) -> usize {
        self.latent_dim
    }

    pub fn save_model(&self, vs: &nn::VarStore, path: &str) -> tch::Result<()> {
        vs.save(path)
    }

    pub fn load_model(&self, vs: &mut nn::VarStore, path: &str) -> tch::Result<()> {
        vs.load(path)
    }

    /// Representation forward pass: `[batch, observation_dim]` → `[batch, latent_dim]`
    pub fn representation(&self, observations: &Tensor) -> Tensor {
        let h = observations
            .nan_to_num(0.0, 0.0, 0.0)
            .apply(&self.repr_fc1)
            .relu()
            .apply(&self.repr_fc2);
        scale_latent(&h)
    }

    /// Dynamics forward pass: returns `(reward head, next latent)`
    pub fn dynamics(&self, latents: &Tensor, actions: &Tensor) -> (Tensor, Tensor) {
        let x = Tensor::cat(&[latents.nan_to_num(0.0, 0.0, 0.0), actions.shallow_clone()], 1);
        let h = x.apply(&self.dyn_fc1).relu();
        let next = scale_latent(&h.apply(&self.dyn_state_head));
        (h.apply(&self.dyn_reward_head), next)
    }

    /// Prediction forward pass: returns `(policy logits, value head)`
    pub fn prediction(&self, latents: &Tensor) -> (Tensor, Tensor) {
        let h = latents.nan_to_num(0.0, 0.0, 0.0).apply(&self.pred_fc1).relu();
        (h.apply(&self.pred_policy_head), h.apply(&self.pred_value_head))
    }

    /// Turn a head output into one scalar per row
    fn decode_head(&self, head: &Tensor, squash: bool) -> Vec<f64> {
        let head = if self.support_size == 0 {
            if squash {
                head.tanh()
            } else {
                head.shallow_clone()
            }
        } else {
            head.softmax(-1, Kind::Float)
        };

        tensor_to_rows(&head)
            .into_iter()
            .map(|row| {
                let row: Vec<f64> = row.into_iter().map(f64::from).collect();
                // Undecodable rows count as a degenerate output
                decode_prediction(&row, self.support_size, self.reward_epsilon).unwrap_or(f64::NAN)
            })
            .collect()
    }
}

/// Min-max scale each row to `[0, 1]`
fn scale_latent(latent: &Tensor) -> Tensor {
    let min = latent.amin(-1, true);
    let max = latent.amax(-1, true);
    let range = (&max - &min).clamp_min(MIN_LATENT_RANGE);
    (latent - &min) / range
}

impl MuZeroModel for MuZeroNet {
    fn action_size(&self) -> usize {
        self.action_size
    }

    fn encode(&self, observation: &Observation) -> Vec<f32> {
        if observation.len() != self.observation_dim {
            log::warn!(
                "⚠️ Observation of {} values fed to a network expecting {}",
                observation.len(),
                self.observation_dim
            );
        }
        tch::no_grad(|| {
            let latent = self.representation(&observation_to_tensor(observation, self.observation_dim));
            tensor_to_rows(&latent).into_iter().next().unwrap_or_default()
        })
    }

    fn predict(&self, latent: &[f32]) -> Prediction {
        self.predict_batch(&[latent.to_vec()])
            .pop()
            .unwrap_or_else(|| Prediction {
                policy: Vec::new(),
                value: f64::NAN,
            })
    }

    fn forward(&self, latent: &[f32], action: usize) -> Transition {
        self.forward_batch(&[(latent.to_vec(), action)])
            .pop()
            .unwrap_or_else(|| Transition {
                reward: f64::NAN,
                latent: Vec::new(),
            })
    }

    fn predict_batch(&self, latents: &[Vec<f32>]) -> Vec<Prediction> {
        if latents.is_empty() {
            return Vec::new();
        }
        tch::no_grad(|| {
            let (logits, value_head) = self.prediction(&rows_to_tensor(latents, self.latent_dim));
            let policies = tensor_to_rows(&logits.softmax(-1, Kind::Float));
            let values = self.decode_head(&value_head, true);
            policies
                .into_iter()
                .zip(values)
                .map(|(policy, value)| Prediction { policy, value })
                .collect()
        })
    }

    fn forward_batch(&self, requests: &[(Vec<f32>, usize)]) -> Vec<Transition> {
        if requests.is_empty() {
            return Vec::new();
        }
        tch::no_grad(|| {
            let latents: Vec<&[f32]> = requests.iter().map(|(l, _)| l.as_slice()).collect();
            let actions: Vec<usize> = requests.iter().map(|(_, a)| *a).collect();
            let (reward_head, next) = self.dynamics(
                &rows_to_tensor(&latents, self.latent_dim),
                &actions_to_tensor(&actions, self.action_size),
            );
            let rewards = self.decode_head(&reward_head, false);
            tensor_to_rows(&next)
                .into_iter()
                .zip(rewards)
                .map(|(latent, reward)| Transition { reward, latent })
                .collect()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tch::Device;

    fn small_config(support_size: usize) -> MuZeroConfig {
        MuZeroConfig {
            latent_dim: 6,
            hidden_dim: 16,
            support_size,
            ..MuZeroConfig::default()
        }
    }

    #[test]
    fn test_forward_shapes() {
        let vs = nn::VarStore::new(Device::Cpu);
        let net = MuZeroNet::new(&vs, 12, 4, &small_config(0));

        let latent = net.encode(&Observation::filled(vec![2, 2, 3], 0.5));
        assert_eq!(latent.len(), 6);
        assert!(latent.iter().all(|v| (0.0..=1.0).contains(v)));

        let transition = net.forward(&latent, 3);
        assert_eq!(transition.latent.len(), 6);
        assert!(transition.reward.is_finite());

        let prediction = net.predict(&transition.latent);
        assert_eq!(prediction.policy.len(), 4);
        assert!((prediction.policy.iter().sum::<f32>() - 1.0).abs() < 1e-5);
        assert!(prediction.value.abs() <= 1.0);
    }

    #[test]
    fn test_non_finite_observation_gives_finite_latent() {
        let vs = nn::VarStore::new(Device::Cpu);
        let net = MuZeroNet::new(&vs, 4, 2, &small_config(0));

        let obs = Observation::new(vec![4], vec![f32::NAN, f32::INFINITY, f32::NEG_INFINITY, 1.0])
            .unwrap();
        assert!(net.encode(&obs).iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_categorical_heads_decode_to_scalars() {
        let vs = nn::VarStore::new(Device::Cpu);
        let net = MuZeroNet::new(&vs, 4, 3, &small_config(5));

        let latents = vec![vec![0.1; 6], vec![0.9; 6]];
        let predictions = net.predict_batch(&latents);
        assert_eq!(predictions.len(), 2);
        assert!(predictions.iter().all(|p| p.value.is_finite()));

        let transitions = net.forward_batch(&[(latents[0].clone(), 0), (latents[1].clone(), 2)]);
        assert_eq!(transitions.len(), 2);
        assert!(transitions.iter().all(|t| t.reward.is_finite()));
    }
}
