pub mod observation;
pub mod support;
pub mod targets;
pub mod trajectory;

pub use observation::{Observation, ObservationError};
pub use support::{
    decode_prediction, encode_target, forward_reward_transform, inverse_reward_transform,
    scalar_to_support, support_to_scalar, SupportError,
};
pub use targets::UnrollTargets;
pub use trajectory::{Player, TrajectoryBuffer, TrajectoryError};
