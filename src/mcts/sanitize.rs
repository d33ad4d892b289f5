//! Clean-up of model outputs before they enter the tree.
//!
//! Every function returns whether it had to repair something so the search can count
//! degenerate outputs.

/// Replace a non-finite scalar by 0
pub fn sanitize_scalar(value: f64) -> (f64, bool) {
    if value.is_finite() {
        (value, false)
    } else {
        (0.0, true)
    }
}

/// Replace non-finite latent components by 0
pub fn sanitize_latent(latent: &mut [f32]) -> bool {
    let mut repaired = false;
    for v in latent.iter_mut().filter(|v| !v.is_finite()) {
        *v = 0.0;
        repaired = true;
    }
    repaired
}

/// Turn a raw policy into a distribution over the selectable actions.
///
/// The policy is resized to `action_size`; non-finite and negative entries are zeroed and
/// entries outside `legal` are masked out. When nothing usable is left the result is uniform
/// over the selectable actions.
pub fn sanitize_policy(policy: &mut Vec<f32>, action_size: usize, legal: Option<&[bool]>) -> bool {
    let mut repaired = false;
    if policy.len() != action_size {
        policy.resize(action_size, 0.0);
        repaired = true;
    }

    let is_legal = |a: usize| legal.map_or(true, |mask| mask.get(a).copied().unwrap_or(false));

    for (a, p) in policy.iter_mut().enumerate() {
        if !p.is_finite() || *p < 0.0 {
            *p = 0.0;
            repaired = true;
        }
        if !is_legal(a) {
            *p = 0.0;
        }
    }

    let sum: f32 = policy.iter().sum();
    if sum.is_finite() && sum > 0.0 {
        policy.iter_mut().for_each(|p| *p /= sum);
        return repaired;
    }

    let count = (0..action_size).filter(|&a| is_legal(a)).count();
    if count > 0 {
        let uniform = 1.0 / count as f32;
        for (a, p) in policy.iter_mut().enumerate() {
            *p = if is_legal(a) { uniform } else { 0.0 };
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar() {
        assert_eq!(sanitize_scalar(1.5), (1.5, false));
        assert_eq!(sanitize_scalar(f64::NAN), (0.0, true));
        assert_eq!(sanitize_scalar(f64::NEG_INFINITY), (0.0, true));
    }

    #[test]
    fn test_latent() {
        let mut latent = vec![1.0, f32::NAN, f32::INFINITY];
        assert!(sanitize_latent(&mut latent));
        assert_eq!(latent, vec![1.0, 0.0, 0.0]);
        assert!(!sanitize_latent(&mut latent));
    }

    #[test]
    fn test_policy_is_renormalized_over_legal() {
        let mut policy = vec![1.0, 1.0, 2.0];
        let repaired = sanitize_policy(&mut policy, 3, Some(&[true, false, true][..]));
        assert!(!repaired);
        assert!((policy[0] - 1.0 / 3.0).abs() < 1e-6);
        assert_eq!(policy[1], 0.0);
        assert!((policy[2] - 2.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_unusable_policy_falls_back_to_uniform() {
        let mut policy = vec![f32::NAN; 4];
        assert!(sanitize_policy(&mut policy, 4, Some(&[false, true, true, false][..])));
        assert_eq!(policy, vec![0.0, 0.5, 0.5, 0.0]);

        let mut zeros = vec![0.0; 2];
        assert!(sanitize_policy(&mut zeros, 2, None));
        assert_eq!(zeros, vec![0.5, 0.5]);
    }

    #[test]
    fn test_wrong_length_is_resized() {
        let mut policy = vec![1.0];
        assert!(sanitize_policy(&mut policy, 3, None));
        assert_eq!(policy, vec![1.0, 0.0, 0.0]);
    }
}
