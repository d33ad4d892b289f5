//! Shared fixtures for the integration tests

#![allow(dead_code)]

use muzero_core::data::Player;
use muzero_core::game::{Game, RepresentationMode};
use muzero_core::Observation;
use rand::prelude::*;

/// Square board game without rules: every empty cell is a legal move.
pub struct BlankBoardGame {
    pub size: usize,
}

impl BlankBoardGame {
    pub fn new(size: usize) -> Self {
        Self { size }
    }

    pub fn legal_mask(&self, board: &[Player]) -> Vec<bool> {
        board.iter().map(|&cell| cell == 0).collect()
    }
}

impl Game for BlankBoardGame {
    type State = Vec<Player>;

    fn dimensions(&self) -> Vec<usize> {
        vec![self.size, self.size, 2]
    }

    fn action_size(&self) -> usize {
        self.size * self.size
    }

    fn initial_state(&self) -> Self::State {
        vec![0; self.size * self.size]
    }

    /// Channel 0 holds the stones of `player`. Channel 1 holds the opponent's stones in
    /// canonical mode and the empty cells in heuristic mode.
    fn build_observation(
        &self,
        state: &Self::State,
        player: Player,
        mode: RepresentationMode,
    ) -> Observation {
        let mut data = Vec::with_capacity(state.len() * 2);
        for &cell in state {
            data.push(if cell == player { 1.0 } else { 0.0 });
            data.push(match mode {
                RepresentationMode::Canonical => (cell == -player) as u8 as f32,
                RepresentationMode::Heuristic => (cell == 0) as u8 as f32,
            });
        }
        Observation::new(self.dimensions(), data).expect("board matches dimensions")
    }
}

/// Observation of `shape` with entries uniform in `[-1, 1)`
pub fn random_observation(shape: &[usize], rng: &mut StdRng) -> Observation {
    let len = shape.iter().product();
    let data = (0..len).map(|_| rng.random::<f32>() * 2.0 - 1.0).collect();
    Observation::new(shape.to_vec(), data).expect("data matches shape")
}
