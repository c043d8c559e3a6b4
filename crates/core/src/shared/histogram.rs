use serde::{Deserialize, Serialize};

use crate::shared::constants::HISTOGRAM_BINS;

/// Intensity distribution of a single-channel frame.
///
/// Bucket `i` counts the pixels whose value is `i`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Histogram {
    counts: Vec<u32>,
}

impl Histogram {
    pub fn new() -> Self {
        Self {
            counts: vec![0; HISTOGRAM_BINS],
        }
    }

    /// Tallies every sample of `samples`.
    pub fn from_samples(samples: &[u8]) -> Self {
        let mut histogram = Self::new();
        for &sample in samples {
            histogram.counts[sample as usize] += 1;
        }
        histogram
    }

    pub fn counts(&self) -> &[u32] {
        &self.counts
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().map(|&c| c as u64).sum()
    }

    /// Mean intensity, or 0 for an empty histogram.
    pub fn mean(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        let weighted: u64 = self
            .counts
            .iter()
            .enumerate()
            .map(|(value, &count)| value as u64 * count as u64)
            .sum();
        weighted as f64 / total as f64
    }

    /// Most populated intensity; the lowest one wins ties.
    pub fn peak(&self) -> Option<u8> {
        if self.is_empty() {
            return None;
        }
        let mut best = 0usize;
        for (value, &count) in self.counts.iter().enumerate() {
            if count > self.counts[best] {
                best = value;
            }
        }
        Some(best as u8)
    }
}

impl Default for Histogram {
    fn default() -> Self {
        Self::new()
    }
}

impl std::ops::Index<usize> for Histogram {
    type Output = u32;

    fn index(&self, value: usize) -> &u32 {
        &self.counts[value]
    }
}
