//! CPU image operations used by the filter chain and the histogram engine.
//!
//! All operations work in place on a [`Frame`](crate::shared::frame::Frame)
//! and follow the usual 8-bit OpenCV conventions (BGR order, H in 0..180).

pub mod color;
pub mod edges;
pub mod gaussian;
pub mod morphology;
pub mod threshold;
