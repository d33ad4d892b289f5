//! Environment seam.
//!
//! The search never calls into a game: it only needs the size of the action space. Games are
//! used by callers and tests to build observations for the trajectory buffer and the model.

use crate::data::observation::Observation;
use crate::data::trajectory::Player;

/// How a game renders a state into an observation frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RepresentationMode {
    /// Raw board encoding
    #[default]
    Canonical,
    /// Board encoding enriched with hand-crafted feature planes
    Heuristic,
}

pub trait Game {
    type State;

    /// Shape of one observation frame, channel axis last
    fn dimensions(&self) -> Vec<usize>;

    /// Size of the action space
    fn action_size(&self) -> usize;

    fn initial_state(&self) -> Self::State;

    /// Render `state` from the perspective of `player`
    fn build_observation(
        &self,
        state: &Self::State,
        player: Player,
        mode: RepresentationMode,
    ) -> Observation;
}
