pub mod degenerate;
pub mod model;
#[cfg(feature = "tch-net")]
pub mod muzero_net;
#[cfg(feature = "tch-net")]
pub mod tensor_conversion;

// Re-export key components for convenience
pub use degenerate::{DegenerateMode, DegenerateModel};
pub use model::{MuZeroModel, Prediction, Transition};
#[cfg(feature = "tch-net")]
pub use muzero_net::MuZeroNet;
