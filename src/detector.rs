//! The object detection seam.
//!
//! Detection proper is an external concern (a cascade classifier in a typical deployment); the
//! control loops only rely on the [`RegionDetector`] trait and treat whatever implements it as a
//! black box.

use std::time::Duration;

use crate::image::{Image, Rect};

/// The outcome of a single detector invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Detection {
    /// The detected object's bounding rectangle in frame coordinates, or [`None`] when nothing
    /// was found.
    pub region: Option<Rect>,
    /// Wall time the detector spent on this invocation.
    pub elapsed: Duration,
}

/// A black-box object detector.
pub trait RegionDetector {
    /// Searches for the object of interest within `search`, a sub-rectangle of `frame`.
    ///
    /// Implementations measure their own wall time and report it via [`Detection::elapsed`].
    fn detect(&mut self, frame: &Image, search: Rect) -> Detection;
}

/// Any `FnMut(&Image, Rect) -> Detection` closure is a detector.
impl<F: FnMut(&Image, Rect) -> Detection> RegionDetector for F {
    fn detect(&mut self, frame: &Image, search: Rect) -> Detection {
        self(frame, search)
    }
}

/// Derives a detector search area from the last known object position.
///
/// Returns `last` grown by `margin` on every side and clipped to `frame`; without a usable last
/// position the whole frame is searched.
pub fn search_region(last: Option<Rect>, frame: Rect, margin: u32) -> Rect {
    match last {
        Some(region) if region.area() > 0 => region
            .grow(margin as i32)
            .intersection(&frame)
            .unwrap_or(frame),
        _ => frame,
    }
}
