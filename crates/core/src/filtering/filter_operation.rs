use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::filtering::filter_settings::FilterSettings;
use crate::imaging::{color, edges, gaussian, morphology, threshold};
use crate::shared::constants::{CANNY_HIGH_THRESHOLD, CANNY_LOW_THRESHOLD};
use crate::shared::frame::Frame;

/// Which side of the gray conversion a filter belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FilterStage {
    /// Runs on colour data before the histogram converts the frame to gray.
    PreGray,
    /// Runs on the gray frame after the histogram.
    PostGray,
}

/// One in-place image transform the filter chain can run.
///
/// Operations carry no parameters of their own; they read the current
/// [`FilterSettings`] every time they run. Two operations are the same
/// filter when their variants are equal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOperation {
    InvertHsv,
    InvertRgb,
    GaussianBlur,
    Erode,
    Dilate,
    CannyEdge,
    Threshold,
}

impl FilterOperation {
    pub const ALL: &[FilterOperation] = &[
        FilterOperation::InvertHsv,
        FilterOperation::InvertRgb,
        FilterOperation::GaussianBlur,
        FilterOperation::Erode,
        FilterOperation::Dilate,
        FilterOperation::CannyEdge,
        FilterOperation::Threshold,
    ];

    pub fn stage(self) -> FilterStage {
        match self {
            FilterOperation::InvertHsv
            | FilterOperation::InvertRgb
            | FilterOperation::GaussianBlur
            | FilterOperation::Erode
            | FilterOperation::Dilate => FilterStage::PreGray,
            FilterOperation::CannyEdge | FilterOperation::Threshold => FilterStage::PostGray,
        }
    }

    /// Short name used on the command line and in control commands.
    pub fn name(self) -> &'static str {
        match self {
            FilterOperation::InvertHsv => "invert1",
            FilterOperation::InvertRgb => "invert2",
            FilterOperation::GaussianBlur => "blur",
            FilterOperation::Erode => "erode",
            FilterOperation::Dilate => "dilate",
            FilterOperation::CannyEdge => "canny",
            FilterOperation::Threshold => "threshold",
        }
    }

    pub fn apply(self, frame: &mut Frame, settings: &FilterSettings) {
        match self {
            FilterOperation::InvertHsv => color::bgr_to_hsv(frame),
            FilterOperation::InvertRgb => color::swap_red_blue(frame),
            FilterOperation::GaussianBlur => gaussian::gaussian_blur(frame, settings.blur_size),
            FilterOperation::Erode => morphology::erode(frame, settings.erode_iterations),
            FilterOperation::Dilate => morphology::dilate(frame, settings.dilate_iterations),
            FilterOperation::CannyEdge => {
                edges::canny(frame, CANNY_LOW_THRESHOLD, CANNY_HIGH_THRESHOLD)
            }
            FilterOperation::Threshold => {
                threshold::binary_threshold(frame, settings.threshold_level)
            }
        }
    }
}

impl fmt::Display for FilterOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown filter '{0}' (expected one of: invert1, invert2, blur, erode, dilate, canny, threshold)")]
pub struct UnknownFilterError(pub String);

impl FromStr for FilterOperation {
    type Err = UnknownFilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "invert1" | "hsv" | "invert_hsv" => Ok(FilterOperation::InvertHsv),
            "invert2" | "rgb" | "invert_rgb" => Ok(FilterOperation::InvertRgb),
            "blur" | "gaussian" | "gaussian_blur" => Ok(FilterOperation::GaussianBlur),
            "erode" => Ok(FilterOperation::Erode),
            "dilate" => Ok(FilterOperation::Dilate),
            "canny" | "edge" | "canny_edge" => Ok(FilterOperation::CannyEdge),
            "threshold" => Ok(FilterOperation::Threshold),
            _ => Err(UnknownFilterError(s.to_string())),
        }
    }
}
