//! Trajectory buffer behaviour end to end: stacking, n-step returns and training targets.

mod common;

use common::{random_observation, BlankBoardGame};
use muzero_core::game::{Game, RepresentationMode};
use muzero_core::{
    DegenerateMode, DegenerateModel, MuZeroConfig, MuZeroMcts, Observation, TrajectoryBuffer,
    TrajectoryError,
};
use rand::prelude::*;

fn assert_close(actual: &[f64], expected: &[f64]) {
    assert_eq!(actual.len(), expected.len());
    for (a, e) in actual.iter().zip(expected) {
        assert!((a - e).abs() < 1e-9, "{:?} != {:?}", actual, expected);
    }
}

#[test]
fn test_n_step_return_estimation() {
    let horizon = 3;
    let gamma = 0.5;
    let search_values = [5.0; 5];
    let rewards = [0.0, 1.0, 2.0, 3.0, 4.0];
    let z = 0.0;

    let mut history = TrajectoryBuffer::new();
    for (r, v) in rewards.iter().zip(search_values) {
        history
            .capture(Observation::empty(), 0, 1, Vec::new(), *r, v)
            .unwrap();
    }
    history.terminate(Observation::empty(), 1, z).unwrap();

    let returns = history.compute_returns(gamma, horizon).unwrap().to_vec();
    let expected = [1.0 + 5.0 / 8.0, 3.0 + 3.0 / 8.0, 4.5, 5.0, 4.0, 0.0];
    assert_close(&returns[..returns.len() - 1], &expected[..expected.len() - 1]);
    assert_eq!(returns.len(), 6);
    assert_eq!(returns[5], 0.0);
}

#[test]
fn test_observation_stacking() {
    let shape = [3, 3, 8];
    let mut rng = StdRng::seed_from_u64(21);
    let frames: Vec<Observation> = (0..10).map(|_| random_observation(&shape, &mut rng)).collect();

    let mut history = TrajectoryBuffer::new();
    history
        .capture(frames[0].clone(), 0, 1, Vec::new(), 0.0, 0.0)
        .unwrap();

    let stacked_0 = history.stack_observations(0, None, None).unwrap();
    let stacked_1 = history.stack_observations(1, None, None).unwrap();
    let stacked_5 = history.stack_observations(5, None, None).unwrap();

    assert_eq!(stacked_0, frames[0]);
    assert_eq!(stacked_1, frames[0]);
    assert_eq!(stacked_5.shape(), &[3, 3, 40]);
    assert!(stacked_5.channel_slice(0, 32).data().iter().all(|&v| v == 0.0));
    assert_eq!(stacked_5.channel_slice(32, 40), frames[0]);

    // The current frame is appended as the newest one
    let stacked = history.stack_observations(2, Some(&frames[1]), None).unwrap();
    let expected = Observation::concat_channels(&[&frames[0], &frames[1]]).unwrap();
    assert_eq!(stacked, expected);

    for frame in &frames[1..] {
        history.capture(frame.clone(), 0, 1, Vec::new(), 0.0, 0.0).unwrap();
    }

    // t is inclusive
    let stacked_1to4 = history.stack_observations(4, None, Some(4)).unwrap();
    let stacked_last4 = history.stack_observations(4, None, Some(9)).unwrap();
    let expected_1to4: Vec<&Observation> = frames[1..5].iter().collect();
    let expected_last4: Vec<&Observation> = frames[6..].iter().collect();
    assert_eq!(stacked_1to4, Observation::concat_channels(&expected_1to4).unwrap());
    assert_eq!(stacked_last4, Observation::concat_channels(&expected_last4).unwrap());

    history.refresh();
    assert_eq!(history.len(), 0);
    assert!(history.is_empty());
}

#[test]
fn test_terminate_twice_is_rejected() {
    let mut history = TrajectoryBuffer::new();
    history.terminate(Observation::empty(), 1, 1.0).unwrap();
    assert_eq!(
        history.terminate(Observation::empty(), 1, 1.0),
        Err(TrajectoryError::AlreadyTerminated)
    );
}

/// Play a short episode on a blank board, searching every move, then derive targets
#[test]
fn test_self_play_episode_produces_targets() {
    let game = BlankBoardGame::new(2);
    let config = MuZeroConfig {
        num_simulations: 10,
        observation_length: 2,
        n_steps: 2,
        unroll_steps: 3,
        support_size: 4,
        seed: Some(3),
        ..MuZeroConfig::default()
    };
    let model = DegenerateModel::new(DegenerateMode::RandomPolicy, game.action_size(), 8);
    let mut mcts = MuZeroMcts::new(model, config.clone()).unwrap();

    let mut history = TrajectoryBuffer::new();
    let mut board = game.initial_state();
    let mut player = 1;
    let mut rng = StdRng::seed_from_u64(9);

    while board.iter().any(|&cell| cell == 0) {
        let o_t = game.build_observation(&board, player, RepresentationMode::Canonical);
        let stacked = history
            .stack_observations(config.observation_length, Some(&o_t), None)
            .unwrap();

        mcts.clear_tree();
        let result = mcts
            .run_mcts(&stacked, &game.legal_mask(&board), 1.0)
            .unwrap();
        let action = result.sample_action(&mut rng);
        assert_eq!(board[action], 0);

        board[action] = player;
        history
            .capture(o_t, action, player, result.policy.clone(), 1.0, result.root_value)
            .unwrap();
        player = -player;
    }

    let final_obs = game.build_observation(&board, player, RepresentationMode::Canonical);
    history.terminate(final_obs, player, 1.0).unwrap();
    assert_eq!(history.num_steps(), 4);

    let returns = history
        .compute_returns(config.gamma, config.n_steps)
        .unwrap()
        .to_vec();
    assert_eq!(returns.len(), 5);
    assert_eq!(returns[4], 1.0);

    let targets = history.make_targets(2, game.action_size(), &config).unwrap();
    assert_eq!(targets.actions.len(), 3);
    assert_eq!(targets.actions[2], 0);
    assert_eq!(targets.values.len(), 4);
    assert!(targets.values.iter().all(|v| v.len() == 9));
    assert!(targets.rewards.iter().all(|r| r.len() == 9));
    assert_eq!(targets.policies[3], vec![0.25; 4]);
}
