use crate::data::observation::Observation;

/// Output of the prediction function for one latent state
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    /// Prior over the full action space (not necessarily normalised)
    pub policy: Vec<f32>,
    pub value: f64,
}

/// Output of the dynamics function for one `(latent, action)` pair
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub reward: f64,
    pub latent: Vec<f32>,
}

/// Learned model consumed by the search: representation, dynamics and prediction.
///
/// This trait is the seam between the search engine and whatever produces the numbers:
/// - the libtorch network used in production (`MuZeroNet`)
/// - degenerate doubles used to check that the search survives constant, zero,
///   NaN or infinite outputs (`DegenerateModel`)
///
/// Implementations are free to return non-finite values; the search sanitises every output
/// before it enters the tree.
pub trait MuZeroModel: Send {
    /// Size of the action space
    fn action_size(&self) -> usize;

    /// Representation function: stacked observation → latent state
    fn encode(&self, observation: &Observation) -> Vec<f32>;

    /// Prediction function: latent state → (policy prior, value)
    fn predict(&self, latent: &[f32]) -> Prediction;

    /// Dynamics function: (latent state, action) → (reward, next latent state)
    fn forward(&self, latent: &[f32], action: usize) -> Transition;

    /// Batched prediction; one result per latent, in order
    fn predict_batch(&self, latents: &[Vec<f32>]) -> Vec<Prediction> {
        latents.iter().map(|latent| self.predict(latent)).collect()
    }

    /// Batched dynamics; one result per request, in order
    fn forward_batch(&self, requests: &[(Vec<f32>, usize)]) -> Vec<Transition> {
        requests
            .iter()
            .map(|(latent, action)| self.forward(latent, *action))
            .collect()
    }
}

impl<M: MuZeroModel + ?Sized> MuZeroModel for Box<M> {
    fn action_size(&self) -> usize {
        (**self).action_size()
    }

    fn encode(&self, observation: &Observation) -> Vec<f32> {
        (**self).encode(observation)
    }

    fn predict(&self, latent: &[f32]) -> Prediction {
        (**self).predict(latent)
    }

    fn forward(&self, latent: &[f32], action: usize) -> Transition {
        (**self).forward(latent, action)
    }

    fn predict_batch(&self, latents: &[Vec<f32>]) -> Vec<Prediction> {
        (**self).predict_batch(latents)
    }

    fn forward_batch(&self, requests: &[(Vec<f32>, usize)]) -> Vec<Transition> {
        (**self).forward_batch(requests)
    }
}
