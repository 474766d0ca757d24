//! Sampling helpers layered on the xorshift stream.
//!
//! Every helper documents how many raw draws it consumes, since the model's
//! reproducibility depends on a fixed consumption order.

use super::RngManager;

impl RngManager {
    /// Standard normal draw via Box-Muller (consumes two draws).
    pub fn standard_normal(&mut self) -> f64 {
        let u1 = self.next_open_f64();
        let u2 = self.next_f64();
        (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
    }

    /// Log-normal draw with log-space mean `mu` and deviation `sigma`
    /// (consumes two draws).
    pub fn log_normal(&mut self, mu: f64, sigma: f64) -> f64 {
        (mu + sigma * self.standard_normal()).exp()
    }

    /// Lomax (Pareto type II) draw with the given shape (consumes one draw).
    ///
    /// `scale * (1 + lomax(shape))` is a classical Pareto variate with
    /// minimum `scale`.
    pub fn lomax(&mut self, shape: f64) -> f64 {
        self.next_open_f64().powf(-1.0 / shape) - 1.0
    }

    /// Bernoulli trial with success probability `p` (consumes one draw).
    pub fn bernoulli(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    /// Draw an index with probability proportional to `weights`.
    ///
    /// Consumes exactly one draw when the total weight is positive and finite;
    /// returns `None` without drawing otherwise. Zero-weight entries are never
    /// selected.
    ///
    /// # Example
    /// ```
    /// use commute_simulator_core_rs::RngManager;
    ///
    /// let mut rng = RngManager::new(7);
    /// let idx = rng.categorical(&[0.0, 1.0, 0.0]).unwrap();
    /// assert_eq!(idx, 1);
    /// ```
    pub fn categorical(&mut self, weights: &[f64]) -> Option<usize> {
        let total: f64 = weights.iter().sum();
        if !total.is_finite() || total <= 0.0 {
            return None;
        }

        let target = self.next_f64() * total;
        let mut cumulative = 0.0;
        let mut last_viable = None;
        for (idx, &weight) in weights.iter().enumerate() {
            if weight <= 0.0 {
                continue;
            }
            cumulative += weight;
            last_viable = Some(idx);
            if target < cumulative {
                return Some(idx);
            }
        }

        // Rounding can leave target a hair above the final cumulative sum
        last_viable
    }

    /// Fisher-Yates shuffle in place (consumes `len - 1` draws).
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let j = self.range(0, i as i64 + 1) as usize;
            items.swap(i, j);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categorical_skips_zero_weights() {
        let mut rng = RngManager::new(12345);
        for _ in 0..1000 {
            let idx = rng.categorical(&[0.0, 0.3, 0.0, 0.7]).unwrap();
            assert!(idx == 1 || idx == 3, "zero-weight index {} selected", idx);
        }
    }

    #[test]
    fn test_categorical_rejects_empty_mass() {
        let mut rng = RngManager::new(12345);
        let before = rng.get_state();
        assert_eq!(rng.categorical(&[0.0, 0.0]), None);
        assert_eq!(rng.get_state(), before, "no draw should be consumed");
    }

    #[test]
    fn test_categorical_frequencies() {
        let mut rng = RngManager::new(2024);
        let mut hits = [0usize; 3];
        for _ in 0..30_000 {
            hits[rng.categorical(&[1.0, 2.0, 1.0]).unwrap()] += 1;
        }
        let middle_share = hits[1] as f64 / 30_000.0;
        assert!((middle_share - 0.5).abs() < 0.02, "share {}", middle_share);
    }

    #[test]
    fn test_shuffle_is_permutation() {
        let mut rng = RngManager::new(5);
        let mut items: Vec<usize> = (0..50).collect();
        rng.shuffle(&mut items);

        let mut sorted = items.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..50).collect::<Vec<_>>());
        assert_ne!(items, (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn test_log_normal_positive() {
        let mut rng = RngManager::new(31);
        for _ in 0..1000 {
            assert!(rng.log_normal(2.3, 0.5) > 0.0);
        }
    }

    #[test]
    fn test_lomax_non_negative() {
        let mut rng = RngManager::new(31);
        for _ in 0..1000 {
            let v = rng.lomax(1.9);
            assert!(v >= 0.0 && v.is_finite());
        }
    }
}
