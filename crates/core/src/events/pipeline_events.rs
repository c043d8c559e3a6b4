use crate::events::event_bus::EventBus;
use crate::shared::frame::Frame;
use crate::shared::histogram::Histogram;

/// Which of the two candidate frames a tick published.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Branch {
    /// The working frame after gray conversion and post-gray filters.
    Filtered,
    /// The copy taken after pre-gray filters, still in colour.
    Unfiltered,
}

/// A frame fresh from the source, before any filter ran.
#[derive(Debug)]
pub struct RawCapture {
    pub tick: u64,
    pub frame: Frame,
}

/// The final frame of a tick.
#[derive(Debug)]
pub struct FrameReady {
    pub tick: u64,
    pub branch: Branch,
    pub frame: Frame,
}

/// Intensity distribution sampled after pre-gray filters.
#[derive(Debug)]
pub struct HistogramUpdated {
    pub tick: u64,
    pub histogram: Histogram,
}

/// The three channels the pipeline driver publishes on.
#[derive(Debug, Default)]
pub struct PipelineEvents {
    pub raw_capture: EventBus<RawCapture>,
    pub frame_ready: EventBus<FrameReady>,
    pub histogram_updated: EventBus<HistogramUpdated>,
}

impl PipelineEvents {
    pub fn new() -> Self {
        Self::default()
    }
}
