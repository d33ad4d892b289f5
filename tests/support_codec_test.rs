use muzero_core::data::{
    forward_reward_transform, inverse_reward_transform, scalar_to_support, support_to_scalar,
};
use rand::prelude::*;

#[test]
fn test_reward_scale_transformation() {
    let eps = 0.01;
    let positive: Vec<f64> = (0..=100).map(f64::from).collect();

    for &x in &positive {
        let f = forward_reward_transform(x, eps);
        // Antisymmetric
        assert!((f + forward_reward_transform(-x, eps)).abs() < 1e-12);
        // Invertible
        assert!((inverse_reward_transform(f, eps) - x).abs() < 1e-7);
        assert!((inverse_reward_transform(-f, eps) + x).abs() < 1e-7);
    }

    // With eps = 0.01: f(100) = sqrt(101) - 1 + 1 = sqrt(101)
    assert!((forward_reward_transform(100.0, eps) - 101f64.sqrt()).abs() < 1e-12);
    assert_eq!(forward_reward_transform(0.0, eps), 0.0);
}

#[test]
fn test_reward_distribution_transformation() {
    let bins = 300;
    let n = 10;
    let mut rng = StdRng::seed_from_u64(1000);
    let scalars: Vec<f64> = (0..n).map(|_| rng.random_range(-300.0..300.0)).collect();

    let support = scalar_to_support(&scalars, bins).unwrap();
    assert_eq!(support.len(), n);
    assert!(support.iter().all(|d| d.len() == 2 * bins + 1));

    let inverted = support_to_scalar(&support, bins).unwrap();
    assert_eq!(inverted.len(), n);
    for (x, y) in scalars.iter().zip(&inverted) {
        assert!((x - y).abs() < 1e-9);
    }
}
