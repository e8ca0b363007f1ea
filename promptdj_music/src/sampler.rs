// Cumulative-distribution sampling over small discrete tables.
//
// Shared by the melody walk (scale-degree steps) and the continuation pass
// (pitch offsets). Weights are relative; they need not sum to 1. A draw scales
// one uniform value by the total weight and returns the first entry whose
// running sum exceeds it, so ties resolve in declaration order.

use promptdj_prng::SeqRng;
use thiserror::Error;

/// Why a table could not be built.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TableError {
    #[error("table has no entries")]
    Empty,
    #[error("{values} values but {weights} weights")]
    LengthMismatch { values: usize, weights: usize },
    #[error("weight {index} is {weight}; weights must be finite and non-negative")]
    BadWeight { index: usize, weight: f64 },
    #[error("weights sum to zero")]
    ZeroTotal,
}

/// A validated discrete distribution.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightedTable<T> {
    values: Vec<T>,
    /// Running sums of the weights; last entry is the total.
    cumulative: Vec<f64>,
}

impl<T: Copy> WeightedTable<T> {
    pub fn new(values: &[T], weights: &[f64]) -> Result<Self, TableError> {
        if values.is_empty() {
            return Err(TableError::Empty);
        }
        if values.len() != weights.len() {
            return Err(TableError::LengthMismatch {
                values: values.len(),
                weights: weights.len(),
            });
        }
        let mut cumulative = Vec::with_capacity(weights.len());
        let mut total = 0.0;
        for (index, &weight) in weights.iter().enumerate() {
            if !weight.is_finite() || weight < 0.0 {
                return Err(TableError::BadWeight { index, weight });
            }
            total += weight;
            cumulative.push(total);
        }
        if total <= 0.0 {
            return Err(TableError::ZeroTotal);
        }
        Ok(Self {
            values: values.to_vec(),
            cumulative,
        })
    }

    /// Draw one value. Consumes exactly one `f64` from `rng`.
    pub fn sample(&self, rng: &mut SeqRng) -> T {
        self.pick(rng.next_f64())
    }

    /// Map a unit value in [0, 1) to an entry.
    fn pick(&self, unit: f64) -> T {
        let total = self.cumulative[self.cumulative.len() - 1];
        let target = unit * total;
        let idx = self
            .cumulative
            .partition_point(|&c| c <= target)
            .min(self.values.len() - 1);
        self.values[idx]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_malformed_tables() {
        assert_eq!(WeightedTable::<i32>::new(&[], &[]), Err(TableError::Empty));
        assert_eq!(
            WeightedTable::new(&[1, 2], &[1.0]),
            Err(TableError::LengthMismatch { values: 2, weights: 1 })
        );
        assert!(matches!(
            WeightedTable::new(&[1, 2], &[1.0, -0.5]),
            Err(TableError::BadWeight { index: 1, .. })
        ));
        assert!(matches!(
            WeightedTable::new(&[1], &[f64::NAN]),
            Err(TableError::BadWeight { index: 0, .. })
        ));
        assert_eq!(WeightedTable::new(&[1, 2], &[0.0, 0.0]), Err(TableError::ZeroTotal));
    }

    #[test]
    fn pick_follows_cumulative_boundaries() {
        let table = WeightedTable::new(&['a', 'b', 'c'], &[1.0, 2.0, 1.0]).unwrap();
        assert_eq!(table.pick(0.0), 'a');
        assert_eq!(table.pick(0.2499), 'a');
        // Exactly on a boundary goes to the next entry.
        assert_eq!(table.pick(0.25), 'b');
        assert_eq!(table.pick(0.7499), 'b');
        assert_eq!(table.pick(0.75), 'c');
        assert_eq!(table.pick(0.9999), 'c');
    }

    #[test]
    fn zero_weight_entries_are_never_drawn() {
        let table = WeightedTable::new(&[1, 2, 3], &[0.0, 1.0, 0.0]).unwrap();
        let mut rng = SeqRng::new(5);
        for _ in 0..1000 {
            assert_eq!(table.sample(&mut rng), 2);
        }
    }

    #[test]
    fn frequencies_track_weights() {
        let table = WeightedTable::new(&[-1, 0, 1], &[0.25, 0.5, 0.25]).unwrap();
        let mut rng = SeqRng::new(77);
        let mut counts = [0usize; 3];
        let n = 20_000;
        for _ in 0..n {
            counts[(table.sample(&mut rng) + 1) as usize] += 1;
        }
        let middle = counts[1] as f64 / n as f64;
        assert!((0.47..0.53).contains(&middle), "middle share {middle}");
    }
}
