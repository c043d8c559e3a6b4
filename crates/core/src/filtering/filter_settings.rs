use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

/// Live filter parameters, read by each filter at invocation time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSettings {
    pub blur_size: u32,
    pub erode_iterations: u32,
    pub dilate_iterations: u32,
    pub threshold_level: u8,
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            blur_size: 1,
            erode_iterations: 1,
            dilate_iterations: 1,
            threshold_level: 0,
        }
    }
}

/// Cloneable handle to one [`FilterSettings`] shared between the host and
/// the pipeline.
///
/// The pipeline takes a [`snapshot`](Self::snapshot) at the start of every
/// tick, so an update made between ticks applies to the very next one and
/// never changes parameters halfway through a frame.
#[derive(Clone, Debug, Default)]
pub struct SharedFilterSettings {
    inner: Arc<RwLock<FilterSettings>>,
}

impl SharedFilterSettings {
    pub fn new(settings: FilterSettings) -> Self {
        Self {
            inner: Arc::new(RwLock::new(settings)),
        }
    }

    pub fn snapshot(&self) -> FilterSettings {
        *self.inner.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn update(&self, f: impl FnOnce(&mut FilterSettings)) {
        let mut guard = self
            .inner
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut *guard);
    }

    pub fn set_blur_size(&self, size: u32) {
        self.update(|s| s.blur_size = size);
    }

    pub fn set_erode_iterations(&self, iterations: u32) {
        self.update(|s| s.erode_iterations = iterations);
    }

    pub fn set_dilate_iterations(&self, iterations: u32) {
        self.update(|s| s.dilate_iterations = iterations);
    }

    pub fn set_threshold_level(&self, level: u8) {
        self.update(|s| s.threshold_level = level);
    }
}
