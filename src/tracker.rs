//! Color-model object tracking.
//!
//! [`ColorTracker`] owns a hue histogram calibrated from a seed region (typically a detector hit)
//! and pursues the matching pixel mass from frame to frame with the mode search from
//! [`crate::camshift`]. It performs no detection itself; see [`crate::runner`] for the loop that
//! marries the two.

use image::GrayImage;

use crate::{
    camshift::{camshift, TermCriteria},
    histogram::HueHistogram,
    image::{hsv, Image, Rect, RotatedRect},
    timer::Timer,
};

/// Tunable parameters of a [`ColorTracker`].
///
/// The gates compare against 8-bit channel values, so anything above 256 behaves like 256.
/// Adjustments take effect on the next [`ColorTracker::calibrate`] or [`ColorTracker::track`]
/// call, which makes the fields safe to wire up to interactive sliders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackerConfig {
    /// One end of the accepted brightness range, `0..=256`.
    pub val_min: u32,
    /// The other end of the accepted brightness range, `0..=256`.
    ///
    /// The gate accepts brightness between `min(val_min, val_max)` and `max(val_min, val_max)`,
    /// so the two bounds may be swapped freely.
    pub val_max: u32,
    /// Minimum saturation accepted by the gate, `0..=256`.
    pub sat_min: u32,
    /// Back-projection cutoff, `0..=256`: hue weights above it become 255, all others 0.
    pub threshold: u32,
    /// Number of hue histogram buckets, `1..=256`.
    pub buckets: usize,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            val_min: 10,
            val_max: 256,
            sat_min: 32,
            threshold: 160,
            buckets: 16,
        }
    }
}

/// Tracks an object by the color distribution calibrated from a seed region.
pub struct ColorTracker {
    config: TrackerConfig,
    histogram: HueHistogram,
    track_window: Rect,
    hue: GrayImage,
    mask: GrayImage,
    backproj: GrayImage,
    t_colors: Timer,
    t_backproject: Timer,
    t_search: Timer,
}

impl ColorTracker {
    /// Creates an uncalibrated tracker.
    ///
    /// Until [`ColorTracker::calibrate`] is called, [`ColorTracker::track`] reports a lost
    /// target.
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            histogram: HueHistogram::new(config.buckets),
            config,
            track_window: Rect::EMPTY,
            hue: GrayImage::new(0, 0),
            mask: GrayImage::new(0, 0),
            backproj: GrayImage::new(0, 0),
            t_colors: Timer::new("colors"),
            t_backproject: Timer::new("backproject"),
            t_search: Timer::new("search"),
        }
    }

    /// Creates a tracker and calibrates it from `seed` right away.
    pub fn with_calibration(config: TrackerConfig, frame: &Image, seed: Rect) -> Self {
        let mut this = Self::new(config);
        this.calibrate(frame, seed);
        this
    }

    #[inline]
    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Returns a mutable reference to the tunable parameters.
    #[inline]
    pub fn config_mut(&mut self) -> &mut TrackerConfig {
        &mut self.config
    }

    /// Returns the current search window.
    ///
    /// Right after [`ColorTracker::calibrate`] this is the seed region; afterwards it follows the
    /// tracked object. A window with an area of 1 or less means the target is lost.
    #[inline]
    pub fn track_window(&self) -> Rect {
        self.track_window
    }

    /// Returns the back-projection computed by the most recent [`ColorTracker::track`] call.
    ///
    /// The buffer is overwritten by every subsequent call. Secondary consumers (like
    /// [`crate::hand::HandTracker`]) borrow it between two track calls.
    #[inline]
    pub fn back_projection(&self) -> &GrayImage {
        &self.backproj
    }

    /// Returns the stage timers of this tracker, for FPS log lines.
    pub fn timers(&self) -> impl Iterator<Item = &Timer> + '_ {
        [&self.t_colors, &self.t_backproject, &self.t_search].into_iter()
    }

    /// Rebuilds the color histogram from the pixels of `seed` and resets the search window to it.
    ///
    /// Only pixels accepted by the brightness/saturation gate are counted. `seed` is clipped to
    /// the frame for the pixel pass but stored as passed; a degenerate `seed` leaves an all-zero
    /// histogram behind, so the next [`ColorTracker::track`] reports the target as lost.
    pub fn calibrate(&mut self, frame: &Image, seed: Rect) {
        self.compute_colors(frame);
        self.histogram = HueHistogram::compute(self.config.buckets, &self.hue, &self.mask, seed);
        self.track_window = seed;
        log::debug!("calibrated color model from {seed:?}");
    }

    /// Advances the track by one frame.
    ///
    /// Recomputes the hue plane, the gate mask and the back-projection for `frame`, then chases
    /// the target from the current search window. Returns [`RotatedRect::EMPTY`] when the target
    /// is lost; the caller is expected to eventually recalibrate, the tracker itself never will.
    pub fn track(&mut self, frame: &Image) -> RotatedRect {
        self.compute_colors(frame);
        self.backproject();

        if self.track_window.area() <= 1 {
            log::error!(
                "target lost, tracking suspended until recalibration (window {:?})",
                self.track_window
            );
            return RotatedRect::EMPTY;
        }

        let (tracked, next_window) = self
            .t_search
            .time(|| camshift(&self.backproj, self.track_window, &TermCriteria::default()));
        self.track_window = next_window;
        tracked
    }

    /// Recomputes the hue plane and the brightness/saturation gate mask for `frame`.
    fn compute_colors(&mut self, frame: &Image) {
        let _guard = self.t_colors.start();
        if self.hue.dimensions() != (frame.width(), frame.height()) {
            self.hue = GrayImage::new(frame.width(), frame.height());
            self.mask = GrayImage::new(frame.width(), frame.height());
            self.backproj = GrayImage::new(frame.width(), frame.height());
        }

        let val_lo = self.config.val_min.min(self.config.val_max);
        let val_hi = self.config.val_min.max(self.config.val_max);
        let sat_min = self.config.sat_min;
        for y in 0..frame.height() {
            for x in 0..frame.width() {
                let hsv = hsv(frame.get(x, y));
                let pass = (val_lo..=val_hi).contains(&u32::from(hsv.v))
                    && u32::from(hsv.s) >= sat_min;
                self.hue[(x, y)] = image::Luma([hsv.h]);
                self.mask[(x, y)] = image::Luma([if pass { 255 } else { 0 }]);
            }
        }
    }

    /// Rewrites the back-projection: 255 where the gate passes and the hue weight clears the
    /// threshold, 0 everywhere else.
    fn backproject(&mut self) {
        let _guard = self.t_backproject.start();
        let threshold = self.config.threshold.min(256) as f32;
        let pixels = self.hue.pixels().zip(self.mask.pixels());
        for (out, (hue, mask)) in self.backproj.pixels_mut().zip(pixels) {
            let weight = if mask.0[0] == 0 {
                0.0
            } else {
                self.histogram.weight(hue.0[0])
            };
            out.0[0] = if weight > threshold { 255 } else { 0 };
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    const RED: [u8; 3] = [230, 30, 30];

    fn blob_frame(width: u32, height: u32, blob: Rect) -> Image {
        Image::from_fn(width, height, |x, y| {
            if blob.contains(x.into(), y.into()) {
                RED
            } else {
                [0, 0, 0]
            }
        })
    }

    #[test]
    fn test_track_follows_blob() {
        let seed = Rect::from_top_left(50, 50, 40, 40);
        let frame = blob_frame(200, 200, seed);
        let mut tracker = ColorTracker::with_calibration(TrackerConfig::default(), &frame, seed);

        let tracked = tracker.track(&frame);
        assert!(tracked.bounding_rect().area() > 1);
        let (cx, cy) = tracked.center();
        assert_abs_diff_eq!(cx, 69.5, epsilon = 1.0);
        assert_abs_diff_eq!(cy, 69.5, epsilon = 1.0);

        // The blob moves; the next track follows it from the updated window.
        let moved = blob_frame(200, 200, Rect::from_top_left(65, 60, 40, 40));
        let tracked = tracker.track(&moved);
        assert!(tracked.bounding_rect().area() > 1);
        let (cx, cy) = tracked.center();
        assert_abs_diff_eq!(cx, 84.5, epsilon = 1.0);
        assert_abs_diff_eq!(cy, 79.5, epsilon = 1.0);
    }

    #[test]
    fn test_recalibration_is_idempotent() {
        let seed = Rect::from_top_left(50, 50, 40, 40);
        let frame = blob_frame(200, 200, seed);
        let mut tracker = ColorTracker::new(TrackerConfig::default());

        tracker.calibrate(&frame, seed);
        let first = tracker.track(&frame);

        tracker.calibrate(&frame, seed);
        let second = tracker.track(&frame);

        assert_eq!(first.bounding_rect(), second.bounding_rect());
        assert_abs_diff_eq!(first.center().0, second.center().0);
        assert_abs_diff_eq!(first.center().1, second.center().1);
        assert_eq!(tracker.track_window(), second.bounding_rect());
    }

    #[test]
    fn test_degenerate_seed_reports_loss() {
        let frame = blob_frame(200, 200, Rect::from_top_left(50, 50, 40, 40));
        let mut tracker = ColorTracker::new(TrackerConfig::default());
        tracker.calibrate(&frame, Rect::from_top_left(10, 10, 0, 0));

        assert_eq!(tracker.track(&frame), RotatedRect::EMPTY);
        // An uncalibrated tracker behaves the same way.
        let mut fresh = ColorTracker::new(TrackerConfig::default());
        assert_eq!(fresh.track(&frame), RotatedRect::EMPTY);
    }

    #[test]
    fn test_back_projection_matches_blob() {
        let seed = Rect::from_top_left(50, 50, 40, 40);
        let frame = blob_frame(200, 200, seed);
        let mut tracker = ColorTracker::with_calibration(TrackerConfig::default(), &frame, seed);
        tracker.track(&frame);

        let backproj = tracker.back_projection();
        assert_eq!(backproj.dimensions(), (200, 200));
        assert_eq!(backproj[(70, 70)].0[0], 255);
        assert_eq!(backproj[(49, 50)].0[0], 0);
        assert_eq!(backproj[(10, 10)].0[0], 0);
    }

    #[test]
    fn test_threshold_can_blank_the_backprojection() {
        let seed = Rect::from_top_left(50, 50, 40, 40);
        let frame = blob_frame(200, 200, seed);
        let mut tracker = ColorTracker::with_calibration(TrackerConfig::default(), &frame, seed);
        assert!(tracker.track(&frame).bounding_rect().area() > 1);

        // Nothing clears a threshold of 256, so the target disappears without collapsing the
        // window; restoring the threshold lets the same calibration pick the target back up.
        tracker.config_mut().threshold = 256;
        assert_eq!(tracker.track(&frame), RotatedRect::EMPTY);

        tracker.config_mut().threshold = 160;
        let recovered = tracker.track(&frame);
        assert!(recovered.bounding_rect().area() > 1);
    }

    #[test]
    fn test_gate_bounds_may_be_swapped() {
        let seed = Rect::from_top_left(50, 50, 40, 40);
        let frame = blob_frame(200, 200, seed);
        let mut config = TrackerConfig::default();
        (config.val_min, config.val_max) = (config.val_max, config.val_min);

        let mut tracker = ColorTracker::with_calibration(config, &frame, seed);
        assert!(tracker.track(&frame).bounding_rect().area() > 1);
    }
}
