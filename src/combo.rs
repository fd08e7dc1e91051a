//! Combo streaks: the running streak plus every streak that ended before it.

/// Streak bookkeeping. `prior` only ever grows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Combo {
    current: u32,
    prior: Vec<u32>,
}

impl Combo {
    pub fn new() -> Self {
        Self::default()
    }

    /// A successful match extends the running streak. Returns the new length.
    pub fn record_hit(&mut self) -> u32 {
        self.current = self.current.saturating_add(1);
        self.current
    }

    /// A miss archives the running streak (even a zero-length one) and restarts it.
    pub fn record_miss(&mut self) {
        self.prior.push(self.current);
        self.current = 0;
    }

    pub fn current(&self) -> u32 {
        self.current
    }

    pub fn prior(&self) -> &[u32] {
        &self.prior
    }

    /// Recomputed on every call.
    pub fn longest(&self) -> u32 {
        self.prior
            .iter()
            .copied()
            .max()
            .unwrap_or(0)
            .max(self.current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_combo_is_zero() {
        let combo = Combo::new();
        assert_eq!(combo.current(), 0);
        assert_eq!(combo.longest(), 0);
        assert!(combo.prior().is_empty());
    }

    #[test]
    fn test_longest_tracks_history() {
        let mut combo = Combo::new();
        combo.record_hit();
        combo.record_hit();
        combo.record_hit();
        combo.record_miss();
        assert_eq!(combo.current(), 0);
        assert_eq!(combo.longest(), 3);
        combo.record_hit();
        assert_eq!(combo.longest(), 3);
        for _ in 0..3 {
            combo.record_hit();
        }
        assert_eq!(combo.current(), 4);
        assert_eq!(combo.longest(), 4);
    }

    #[test]
    fn test_miss_pushes_zero_streaks_too() {
        let mut combo = Combo::new();
        combo.record_miss();
        combo.record_miss();
        assert_eq!(combo.prior(), &[0, 0]);
    }
}
