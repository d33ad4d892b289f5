use rand::Rng;
use rand_distr::multi::Dirichlet;
use rand_distr::Distribution;

/// Mix Dirichlet noise into the root priors: `(1 - fraction) * p + fraction * eta`.
///
/// `priors` holds one entry per legal root action. Nothing happens with fewer than two legal
/// actions or when `alpha` or `fraction` is not positive.
///
/// # Returns
/// `true` if noise was applied
pub fn add_exploration_noise<R: Rng + ?Sized>(
    priors: &mut [f32],
    alpha: f64,
    fraction: f64,
    rng: &mut R,
) -> bool {
    if priors.len() < 2 || !(alpha > 0.0) || !(fraction > 0.0) {
        return false;
    }

    let dirichlet = match Dirichlet::<f64>::new(&vec![alpha; priors.len()]) {
        Ok(dirichlet) => dirichlet,
        Err(e) => {
            log::warn!("⚠️ Dirichlet({}) unavailable: {}", alpha, e);
            return false;
        }
    };
    let noise: Vec<f64> = dirichlet.sample(rng);
    if noise.iter().any(|n| !n.is_finite()) {
        return false;
    }

    for (p, n) in priors.iter_mut().zip(noise) {
        *p = ((1.0 - fraction) * *p as f64 + fraction * n) as f32;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::prelude::*;

    #[test]
    fn test_noise_keeps_distribution() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut priors = vec![0.25f32; 4];
        assert!(add_exploration_noise(&mut priors, 0.3, 0.25, &mut rng));

        let sum: f32 = priors.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
        assert!(priors.iter().all(|&p| p >= 0.75 * 0.25 - 1e-6));
    }

    #[test]
    fn test_single_action_is_untouched() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut priors = vec![1.0f32];
        assert!(!add_exploration_noise(&mut priors, 0.3, 0.25, &mut rng));
        assert_eq!(priors, vec![1.0]);
    }

    #[test]
    fn test_disabled_noise() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut priors = vec![0.5f32, 0.5];
        assert!(!add_exploration_noise(&mut priors, 0.0, 0.25, &mut rng));
        assert!(!add_exploration_noise(&mut priors, 0.3, 0.0, &mut rng));
        assert_eq!(priors, vec![0.5, 0.5]);
    }
}
