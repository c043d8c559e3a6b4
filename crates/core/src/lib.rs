//! Live camera filtering pipeline.
//!
//! A [`PipelineDriver`](pipeline::pipeline_driver::PipelineDriver) pulls BGR
//! frames from a [`FrameSource`](capture::domain::frame_source::FrameSource),
//! runs them through a two-stage filter chain around an intensity histogram
//! and publishes the results on an event bus, once per scheduler tick.

pub mod capture;
pub mod events;
pub mod filtering;
pub mod histogram;
pub mod imaging;
pub mod pipeline;
pub mod shared;
