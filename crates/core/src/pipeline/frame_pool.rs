use crate::shared::constants::FRAME_POOL_CAPACITY;
use crate::shared::frame::Frame;

/// Recycles frame buffers between ticks.
///
/// Each tick copies at most two frames (the working frame and the colour
/// branch) and hands every frame it does not keep back through
/// [`release`](Self::release). Beyond `capacity` released frames are simply
/// dropped.
#[derive(Debug)]
pub struct FramePool {
    free: Vec<Frame>,
    capacity: usize,
    allocations: usize,
}

impl FramePool {
    pub fn new(capacity: usize) -> Self {
        Self {
            free: Vec::with_capacity(capacity),
            capacity,
            allocations: 0,
        }
    }

    /// Deep copy of `source`, backed by a recycled buffer when one is free.
    pub fn copy_of(&mut self, source: &Frame) -> Frame {
        match self.free.pop() {
            Some(mut frame) => {
                frame.copy_from(source);
                frame
            }
            None => {
                self.allocations += 1;
                source.clone()
            }
        }
    }

    pub fn release(&mut self, frame: Frame) {
        if self.free.len() < self.capacity {
            self.free.push(frame);
        }
    }

    /// Frames ready for reuse.
    pub fn available(&self) -> usize {
        self.free.len()
    }

    /// Copies that needed a fresh allocation since the pool was created.
    pub fn allocations(&self) -> usize {
        self.allocations
    }

    pub fn clear(&mut self) {
        self.free.clear();
    }
}

impl Default for FramePool {
    fn default() -> Self {
        Self::new(FRAME_POOL_CAPACITY)
    }
}
