//! Heuristic learning-rate adaptation driven by the cost history.

/// Factor applied when the latest cost got worse.
pub const BACKOFF: f64 = 0.5;
/// Factor applied when the latest cost held steady or improved.
pub const GROWTH: f64 = 1.05;

/// What [`AdaptiveLearningRate::adapt`] did to the rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateChange {
    Unchanged,
    Decreased,
    Increased,
}

/// Step size that halves after a worse epoch and grows 5% after a better one.
///
/// Never reverts weights; only future steps are affected.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdaptiveLearningRate {
    rate: f64,
}

impl AdaptiveLearningRate {
    pub fn new(rate: f64) -> Self {
        Self { rate }
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// `history` is most-recent-first. No-op with fewer than two entries.
    pub fn adapt(&mut self, history: &[f64]) -> RateChange {
        match history {
            [latest, previous, ..] if latest > previous => {
                self.rate *= BACKOFF;
                RateChange::Decreased
            }
            [_, _, ..] => {
                self.rate *= GROWTH;
                RateChange::Increased
            }
            _ => RateChange::Unchanged,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn worse_cost_halves_the_rate() {
        let mut lr = AdaptiveLearningRate::new(0.4);
        assert_eq!(lr.adapt(&[0.8, 0.5]), RateChange::Decreased);
        assert_eq!(lr.rate(), 0.2);
    }

    #[test]
    fn history_is_read_most_recent_first() {
        // 0.5 is the newest cost, so this epoch improved on 0.8.
        let mut lr = AdaptiveLearningRate::new(0.4);
        assert_eq!(lr.adapt(&[0.5, 0.8]), RateChange::Increased);
        assert!((lr.rate() - 0.42).abs() < 1e-12);
    }

    #[test]
    fn improved_cost_grows_the_rate() {
        let mut lr = AdaptiveLearningRate::new(1.0);
        lr.adapt(&[0.3, 0.8, 0.9]);
        assert_eq!(lr.rate(), 1.05);
    }

    #[test]
    fn equal_costs_count_as_improvement() {
        let mut lr = AdaptiveLearningRate::new(1.0);
        assert_eq!(lr.adapt(&[0.3, 0.3]), RateChange::Increased);
    }

    #[test]
    fn short_history_is_a_no_op() {
        let mut lr = AdaptiveLearningRate::new(0.1);
        assert_eq!(lr.adapt(&[]), RateChange::Unchanged);
        assert_eq!(lr.adapt(&[0.7]), RateChange::Unchanged);
        assert_eq!(lr.rate(), 0.1);
    }
}
