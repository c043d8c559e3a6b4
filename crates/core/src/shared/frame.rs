/// A single captured or derived image: contiguous 8-bit samples in row-major
/// order, interleaved per pixel.
///
/// Three-channel frames are BGR, the order camera devices hand them over in.
/// Single-channel frames hold intensity only. Filters may change the channel
/// count in place (gray conversion, edge maps) via [`Frame::replace_data`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
    index: usize,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: u8, index: usize) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * (channels as usize),
            "data length must equal width * height * channels"
        );
        Self {
            data,
            width,
            height,
            channels,
            index,
        }
    }

    /// Builds a frame where every pixel has the same sample values.
    ///
    /// `pixel.len()` is the channel count.
    pub fn filled(width: u32, height: u32, pixel: &[u8]) -> Self {
        let count = (width as usize) * (height as usize);
        let mut data = Vec::with_capacity(count * pixel.len());
        for _ in 0..count {
            data.extend_from_slice(pixel);
        }
        Self::new(data, width, height, pixel.len() as u8, 0)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn set_index(&mut self, index: usize) {
        self.index = index;
    }

    pub fn pixel_count(&self) -> usize {
        (self.width as usize) * (self.height as usize)
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Swaps in a new sample buffer with a different channel count, keeping
    /// the dimensions. Returns the previous buffer so callers can recycle it.
    pub fn replace_data(&mut self, data: Vec<u8>, channels: u8) -> Vec<u8> {
        debug_assert_eq!(
            data.len(),
            self.pixel_count() * channels as usize,
            "data length must equal width * height * channels"
        );
        self.channels = channels;
        std::mem::replace(&mut self.data, data)
    }

    /// Overwrites this frame with a copy of `other`, reusing the allocation.
    pub fn copy_from(&mut self, other: &Frame) {
        self.data.clear();
        self.data.extend_from_slice(&other.data);
        self.width = other.width;
        self.height = other.height;
        self.channels = other.channels;
        self.index = other.index;
    }
}
