//! Bounded FIFO of past per-frame rail models for one side.

use crate::{
    error::{ConfigError, Result},
    line_model::mean_model,
    types::LineModel,
};
use std::collections::VecDeque;

/// Default smoothing window, in frames.
pub const DEFAULT_HISTORY_LEN: usize = 10;

/// Insertion-ordered window of raw (unsmoothed) rail models.
#[derive(Clone, Debug)]
pub struct ModelHistory {
    entries: VecDeque<LineModel>,
    capacity: usize,
}

impl ModelHistory {
    /// Empty window holding at most `capacity` models. Rejects zero.
    pub fn new(capacity: usize) -> Result<Self> {
        validate_history_len(capacity)?;
        Ok(Self::with_capacity(capacity))
    }

    fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a model, evicting the oldest once the window is full.
    pub fn push(&mut self, model: LineModel) {
        if self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(model);
    }

    /// Mean intercept and slope of everything in the window.
    pub fn mean(&self) -> Option<LineModel> {
        mean_model(&self.entries)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &LineModel> {
        self.entries.iter()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Default for ModelHistory {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_LEN)
    }
}

pub(crate) fn validate_history_len(history_len: usize) -> Result<()> {
    if history_len == 0 {
        return Err(ConfigError::HistoryLength(history_len));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evicts_oldest_on_overflow() {
        let mut h = ModelHistory::new(3).unwrap();
        for i in 0..5 {
            h.push(LineModel::new(i as f64, 0.0));
        }
        assert_eq!(h.len(), 3);
        let kept: Vec<f64> = h.iter().map(|m| m.intercept).collect();
        assert_eq!(kept, vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn mean_tracks_window_contents() {
        let mut h = ModelHistory::new(2).unwrap();
        assert!(h.mean().is_none());
        h.push(LineModel::new(10.0, -1.0));
        h.push(LineModel::new(20.0, -3.0));
        assert_eq!(h.mean(), Some(LineModel::new(15.0, -2.0)));
        h.push(LineModel::new(30.0, -5.0));
        assert_eq!(h.mean(), Some(LineModel::new(25.0, -4.0)));
    }

    #[test]
    fn zero_capacity_is_rejected() {
        assert_eq!(
            ModelHistory::new(0).unwrap_err(),
            ConfigError::HistoryLength(0)
        );
        let h = ModelHistory::new(1).unwrap();
        assert_eq!(h.capacity(), 1);
        assert_eq!(ModelHistory::default().capacity(), DEFAULT_HISTORY_LEN);
    }
}
