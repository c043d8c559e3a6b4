use std::fmt;
use std::time::Instant;

use thiserror::Error;

use crate::capture::domain::frame_source::{FrameSource, SourceStatus};
use crate::events::pipeline_events::{
    Branch, FrameReady, HistogramUpdated, PipelineEvents, RawCapture,
};
use crate::filtering::filter_chain::FilterChain;
use crate::filtering::filter_operation::{FilterOperation, FilterStage};
use crate::filtering::filter_settings::SharedFilterSettings;
use crate::histogram::histogram_engine::compute_histogram;
use crate::pipeline::frame_pool::FramePool;
use crate::pipeline::pipeline_logger::{NullPipelineLogger, PipelineLogger};
use crate::shared::frame::Frame;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Running,
    Stopped,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineState::Idle => "idle",
            PipelineState::Running => "running",
            PipelineState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    #[error("cannot {action} a pipeline that is {state}")]
    InvalidTransition {
        action: &'static str,
        state: PipelineState,
    },
}

/// What a single tick did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// The driver is not running; nothing happened.
    NotRunning,
    /// The source had no frame ready. Nothing was published.
    EmptyRead,
    /// No fresh frame could be captured and none was cached yet.
    NoCachedFrame,
    /// A histogram and a final frame were published.
    Published {
        branch: Branch,
        /// True when the tick worked on a fresh capture rather than the
        /// cached frame.
        captured: bool,
    },
}

/// Drives one capture → filter → histogram → publish pass per tick.
///
/// The driver owns the frame source, the filter chain and the most recent
/// captured frame. While the camera is disabled, or the source never
/// opened, each tick replays the cached frame through the filters so
/// parameter changes stay visible on a still picture.
///
/// Lifecycle is single-shot: `Idle → Running → Stopped`.
pub struct PipelineDriver {
    source: Box<dyn FrameSource>,
    chain: FilterChain,
    settings: SharedFilterSettings,
    events: PipelineEvents,
    pool: FramePool,
    logger: Box<dyn PipelineLogger>,
    state: PipelineState,
    camera_enabled: bool,
    last_frame: Option<Frame>,
    tick_count: u64,
}

impl PipelineDriver {
    pub fn new(source: Box<dyn FrameSource>) -> Self {
        Self {
            source,
            chain: FilterChain::new(),
            settings: SharedFilterSettings::default(),
            events: PipelineEvents::new(),
            pool: FramePool::default(),
            logger: Box::new(NullPipelineLogger),
            state: PipelineState::Idle,
            camera_enabled: true,
            last_frame: None,
            tick_count: 0,
        }
    }

    pub fn with_logger(mut self, logger: Box<dyn PipelineLogger>) -> Self {
        self.logger = logger;
        self
    }

    /// Opens the source and starts accepting ticks.
    ///
    /// A source that fails to open is not an error: the driver runs in
    /// camera-less mode and replays whatever frame it has cached.
    pub fn start(&mut self) -> Result<(), PipelineError> {
        if self.state != PipelineState::Idle {
            return Err(PipelineError::InvalidTransition {
                action: "start",
                state: self.state,
            });
        }

        if !self.source.is_open() {
            if let Err(err) = self.source.open() {
                log::warn!("Frame source unavailable, running without camera: {err}");
            }
        }

        self.state = PipelineState::Running;
        self.logger.info("Pipeline started");
        Ok(())
    }

    /// Closes the source and drops cached frames. Calling it again is a
    /// no-op.
    pub fn stop(&mut self) {
        if self.state == PipelineState::Stopped {
            return;
        }

        let was_running = self.state == PipelineState::Running;
        self.source.close();
        self.last_frame = None;
        self.pool.clear();
        self.state = PipelineState::Stopped;

        if was_running {
            self.logger.info("Pipeline stopped");
            self.logger.summary();
        }
    }

    /// Runs one tick. Failures inside the tick are reported through the
    /// returned outcome, never as errors.
    pub fn tick(&mut self) -> TickOutcome {
        if self.state != PipelineState::Running {
            return TickOutcome::NotRunning;
        }

        self.tick_count += 1;
        let tick = self.tick_count;
        let outcome = self.run_tick(tick);
        self.logger.tick(tick, &outcome);
        outcome
    }

    fn run_tick(&mut self, tick: u64) -> TickOutcome {
        let settings = self.settings.snapshot();

        let stage = Instant::now();
        let (mut working, captured) = if self.camera_enabled && self.source.is_open() {
            match self.source.read_frame() {
                Ok(Some(frame)) => {
                    let cached = self.pool.copy_of(&frame);
                    if let Some(old) = self.last_frame.replace(cached) {
                        self.pool.release(old);
                    }
                    let event = RawCapture { tick, frame };
                    self.events.raw_capture.publish(&event);
                    (event.frame, true)
                }
                Ok(None) => return TickOutcome::EmptyRead,
                Err(err) => {
                    log::warn!("Frame read failed on tick {tick}: {err}");
                    return TickOutcome::EmptyRead;
                }
            }
        } else {
            match &self.last_frame {
                Some(cached) => (self.pool.copy_of(cached), false),
                None => return TickOutcome::NoCachedFrame,
            }
        };
        self.logger.timing("capture", elapsed_ms(stage));

        let stage = Instant::now();
        self.chain.run_pre(&mut working, &settings);
        let unfiltered = self.pool.copy_of(&working);
        self.logger.timing("pre_filter", elapsed_ms(stage));

        let stage = Instant::now();
        let histogram = compute_histogram(&mut working);
        self.logger.metric("mean_intensity", histogram.mean());
        self.events
            .histogram_updated
            .publish(&HistogramUpdated { tick, histogram });
        self.logger.timing("histogram", elapsed_ms(stage));

        let stage = Instant::now();
        self.chain.run_post(&mut working, &settings);
        self.logger.timing("post_filter", elapsed_ms(stage));

        let stage = Instant::now();
        let (branch, frame, spare) = if self.chain.post_filter_count() > 0 {
            (Branch::Filtered, working, unfiltered)
        } else {
            (Branch::Unfiltered, unfiltered, working)
        };
        self.pool.release(spare);
        let event = FrameReady {
            tick,
            branch,
            frame,
        };
        self.events.frame_ready.publish(&event);
        self.pool.release(event.frame);
        self.logger.timing("publish", elapsed_ms(stage));

        TickOutcome::Published { branch, captured }
    }

    pub fn set_camera_enabled(&mut self, enabled: bool) {
        if self.camera_enabled != enabled {
            log::info!("Camera {}", if enabled { "enabled" } else { "disabled" });
        }
        self.camera_enabled = enabled;
    }

    pub fn camera_enabled(&self) -> bool {
        self.camera_enabled
    }

    /// Toggles one filter. Enabling an already enabled filter (or disabling
    /// a disabled one) changes nothing. Returns whether the chain changed.
    pub fn set_filter_enabled(&mut self, op: FilterOperation, enabled: bool) -> bool {
        match (enabled, self.is_filter_enabled(op)) {
            (true, false) => {
                self.chain.add(op);
                true
            }
            (false, true) => self.chain.remove(op),
            _ => false,
        }
    }

    pub fn is_filter_enabled(&self, op: FilterOperation) -> bool {
        match op.stage() {
            FilterStage::PreGray => self.chain.pre_filters().contains(&op),
            FilterStage::PostGray => self.chain.post_filters().contains(&op),
        }
    }

    pub fn filter_chain(&self) -> &FilterChain {
        &self.chain
    }

    /// Handle to the live filter parameters. Clones share the same values.
    pub fn filter_settings(&self) -> &SharedFilterSettings {
        &self.settings
    }

    pub fn events_mut(&mut self) -> &mut PipelineEvents {
        &mut self.events
    }

    pub fn has_cached_frame(&self) -> bool {
        self.last_frame.is_some()
    }

    pub fn source_status(&self) -> SourceStatus {
        self.source.status()
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }
}

impl Drop for PipelineDriver {
    fn drop(&mut self) {
        self.stop();
    }
}

fn elapsed_ms(since: Instant) -> f64 {
    since.elapsed().as_secs_f64() * 1000.0
}
