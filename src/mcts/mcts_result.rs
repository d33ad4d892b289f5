use rand::{Rng, RngExt};

/// Counters collected during one call into the search
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    /// Nodes created by the dynamics function
    pub expansions: usize,
    /// Model outputs that had to be repaired (non-finite or unusable)
    pub sanitized: usize,
    /// Deepest node in the tree
    pub max_depth: usize,
    /// Batched selections that ran into an edge already awaiting evaluation
    pub collisions: usize,
    /// Nodes in the tree after the search
    pub node_count: usize,
}

/// Outcome of a search from one real state
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    /// Root visit count per action (0 for illegal actions)
    pub visit_counts: Vec<u32>,
    /// Improved policy: normalised root visit counts
    pub policy: Vec<f32>,
    /// Distribution to draw the executed move from (`policy` at the requested temperature)
    pub move_distribution: Vec<f32>,
    /// Mean value of the root, the search value of the state
    pub root_value: f64,
    /// Root prior after masking and renormalisation
    pub root_priors_raw: Vec<f32>,
    /// Root prior the search actually used (with exploration noise, if any)
    pub root_priors_noisy: Vec<f32>,
    pub stats: SearchStats,
}

impl SearchResult {
    /// Most visited action, lowest index on ties
    pub fn best_action(&self) -> usize {
        let mut best_index = 0;
        let mut best_count = 0;
        for (i, &count) in self.visit_counts.iter().enumerate() {
            if count > best_count {
                best_count = count;
                best_index = i;
            }
        }
        best_index
    }

    /// Draw the move to execute from `move_distribution`
    pub fn sample_action<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        sample_from_distribution(&self.move_distribution, rng)
    }
}

/// Turn root visit counts into a move distribution at temperature `temperature`.
///
/// `temperature == 0` gives a one-hot on the most visited legal action (lowest index on ties);
/// otherwise legal counts are raised to `1 / temperature` and renormalised. Without any legal
/// visit the result is uniform over the legal actions.
pub fn apply_temperature(counts: &[u32], legal: &[bool], temperature: f64) -> Vec<f32> {
    let is_legal = |a: usize| legal.get(a).copied().unwrap_or(false);
    let mut out = vec![0.0f32; counts.len()];

    let max_count = counts
        .iter()
        .enumerate()
        .filter(|(a, _)| is_legal(*a))
        .map(|(_, &c)| c)
        .max()
        .unwrap_or(0);

    if max_count == 0 {
        let legal_count = (0..counts.len()).filter(|&a| is_legal(a)).count();
        for (a, p) in out.iter_mut().enumerate() {
            if is_legal(a) {
                *p = 1.0 / legal_count as f32;
            }
        }
        return out;
    }

    if temperature <= 0.0 || !temperature.is_finite() {
        if let Some(a) = (0..counts.len()).find(|&a| is_legal(a) && counts[a] == max_count) {
            out[a] = 1.0;
        }
        return out;
    }

    // Scale by the maximum first so large counts and small temperatures stay finite
    let inv_t = 1.0 / temperature;
    let mut sum = 0.0f64;
    let weights: Vec<f64> = counts
        .iter()
        .enumerate()
        .map(|(a, &c)| {
            let w = if is_legal(a) {
                (c as f64 / max_count as f64).powf(inv_t)
            } else {
                0.0
            };
            sum += w;
            w
        })
        .collect();

    for (p, w) in out.iter_mut().zip(weights) {
        *p = (w / sum) as f32;
    }
    out
}

/// Categorical draw from a (not necessarily normalised) distribution.
///
/// Falls back to the most likely entry when the weights cannot be sampled from.
pub fn sample_from_distribution<R: Rng + ?Sized>(distribution: &[f32], rng: &mut R) -> usize {
    let total: f64 = distribution
        .iter()
        .filter(|p| p.is_finite() && **p > 0.0)
        .map(|&p| p as f64)
        .sum();

    if total > 0.0 && total.is_finite() {
        let mut threshold = rng.random::<f64>() * total;
        let mut last_positive = 0;
        for (i, &p) in distribution.iter().enumerate() {
            if !(p.is_finite() && p > 0.0) {
                continue;
            }
            last_positive = i;
            threshold -= p as f64;
            if threshold < 0.0 {
                return i;
            }
        }
        return last_positive;
    }

    let mut best_index = 0;
    let mut best = f32::NEG_INFINITY;
    for (i, &p) in distribution.iter().enumerate() {
        if p > best {
            best = p;
            best_index = i;
        }
    }
    best_index
}
