/// Running bounds of the mean values seen in one search tree
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MinMaxStats {
    min: f64,
    max: f64,
}

impl MinMaxStats {
    pub fn new() -> Self {
        Self {
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }

    pub fn update(&mut self, value: f64) {
        if value.is_finite() {
            self.min = self.min.min(value);
            self.max = self.max.max(value);
        }
    }

    /// Scale `value` into `[0, 1]` using the observed bounds.
    ///
    /// Until two distinct values have been seen the value is returned unchanged.
    pub fn normalize(&self, value: f64) -> f64 {
        if self.max > self.min {
            (value - self.min) / (self.max - self.min)
        } else {
            value
        }
    }

    pub fn bounds(&self) -> Option<(f64, f64)> {
        (self.max >= self.min).then_some((self.min, self.max))
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

impl Default for MinMaxStats {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_stats_leave_values_unchanged() {
        let stats = MinMaxStats::new();
        assert_eq!(stats.normalize(3.5), 3.5);
        assert_eq!(stats.bounds(), None);
    }

    #[test]
    fn test_single_value_is_not_normalized() {
        let mut stats = MinMaxStats::new();
        stats.update(2.0);
        assert_eq!(stats.normalize(2.0), 2.0);
        assert_eq!(stats.bounds(), Some((2.0, 2.0)));
    }

    #[test]
    fn test_normalize_between_bounds() {
        let mut stats = MinMaxStats::new();
        stats.update(-1.0);
        stats.update(3.0);
        stats.update(f64::NAN);
        assert_eq!(stats.normalize(1.0), 0.5);
        assert_eq!(stats.normalize(3.0), 1.0);

        stats.reset();
        assert_eq!(stats.bounds(), None);
    }
}
