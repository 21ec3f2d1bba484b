use std::collections::HashMap;

/// Last fragmentation time per molecule
#[derive(Debug, Clone, Default)]
pub struct DynamicExclusion {
    duration: f64,
    last_selected: HashMap<usize, f64>,
}

impl DynamicExclusion {
    pub fn new(duration: f64) -> Self {
        Self {
            duration,
            last_selected: HashMap::new(),
        }
    }

    /// Whether `key` was selected less than `duration` before `t`
    pub fn is_excluded(&self, key: usize, t: f64) -> bool {
        self.last_selected
            .get(&key)
            .is_some_and(|last| t - last < self.duration)
    }

    /// Remember that `key` was selected at `t`
    pub fn record(&mut self, key: usize, t: f64) {
        self.last_selected.insert(key, t);
    }

    pub fn last_selected(&self, key: usize) -> Option<f64> {
        self.last_selected.get(&key).copied()
    }

    /// Number of molecules ever selected
    pub fn len(&self) -> usize {
        self.last_selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last_selected.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exclusion_window() {
        let mut exclusion = DynamicExclusion::new(1.0);
        assert!(!exclusion.is_excluded(3, 0.0));
        exclusion.record(3, 0.5);
        assert!(exclusion.is_excluded(3, 0.5));
        assert!(exclusion.is_excluded(3, 1.49));
        assert!(!exclusion.is_excluded(3, 1.5));
        assert!(!exclusion.is_excluded(4, 0.6));
        assert_eq!(exclusion.last_selected(3), Some(0.5));
    }

    #[test]
    fn test_zero_duration_never_excludes() {
        let mut exclusion = DynamicExclusion::new(0.0);
        exclusion.record(1, 2.0);
        assert!(!exclusion.is_excluded(1, 2.0));
    }
}
