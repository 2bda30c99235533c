//! Secondary tracking in the shadow of a primary target.
//!
//! [`HandTracker`] finds a second object with the primary tracker's color model (a hand next to
//! a face, say) by searching the primary's back-projection with the primary's own neighborhood
//! blanked out. It owns no color model and no history: every call starts from the whole frame.

use image::GrayImage;

use crate::{
    camshift::{camshift, TermCriteria},
    image::{Rect, RotatedRect},
};

/// Tunable parameters of a [`HandTracker`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandTrackerConfig {
    /// Horizontal margin added on both sides of the primary region when blanking it, in pixels.
    pub hide_margin: u32,
}

impl Default for HandTrackerConfig {
    fn default() -> Self {
        Self { hide_margin: 32 }
    }
}

/// Searches a borrowed back-projection for a secondary object near the primary one.
pub struct HandTracker {
    config: HandTrackerConfig,
    frame_rect: Rect,
    mask: GrayImage,
    masked: GrayImage,
}

impl HandTracker {
    pub fn new(config: HandTrackerConfig) -> Self {
        Self {
            config,
            frame_rect: Rect::EMPTY,
            mask: GrayImage::new(0, 0),
            masked: GrayImage::new(0, 0),
        }
    }

    #[inline]
    pub fn config(&self) -> &HandTrackerConfig {
        &self.config
    }

    /// Returns a mutable reference to the tunable parameters.
    #[inline]
    pub fn config_mut(&mut self) -> &mut HandTrackerConfig {
        &mut self.config
    }

    /// Searches `backproj` for the secondary object.
    ///
    /// `primary` is the primary tracker's current bounding rectangle; the full-height column it
    /// spans (plus the hide margin on both sides) is excluded from the search, so the primary
    /// never shadows the secondary. When the primary is lost, the search is skipped and
    /// [`RotatedRect::EMPTY`] is returned: without the exclusion column the search would just
    /// find the primary again.
    pub fn track(&mut self, backproj: &GrayImage, primary: Rect) -> RotatedRect {
        if primary.area() <= 1 {
            log::info!("primary target is lost, skipping secondary search");
            return RotatedRect::EMPTY;
        }

        if (self.frame_rect.width(), self.frame_rect.height()) != backproj.dimensions() {
            self.frame_rect = Rect::from_top_left(0, 0, backproj.width(), backproj.height());
            self.mask = GrayImage::new(backproj.width(), backproj.height());
            self.masked = GrayImage::new(backproj.width(), backproj.height());
        }

        self.write_hide_mask(primary);
        let pixels = backproj.pixels().zip(self.mask.pixels());
        for (out, (src, mask)) in self.masked.pixels_mut().zip(pixels) {
            out.0[0] = src.0[0] & mask.0[0];
        }

        let (tracked, _) = camshift(&self.masked, self.frame_rect, &TermCriteria::default());
        tracked
    }

    /// Fills the mask with 255, then zeroes the full-height column spanned by `primary` plus the
    /// hide margin on both sides.
    fn write_hide_mask(&mut self, primary: Rect) {
        for pixel in self.mask.pixels_mut() {
            pixel.0[0] = 255;
        }

        let hide = Rect::from_top_left(
            primary.x() - self.config.hide_margin as i32,
            0,
            primary.width() + 2 * self.config.hide_margin,
            self.frame_rect.height(),
        );
        if let Some(hide) = hide.intersection(&self.frame_rect) {
            for (x, y) in hide.iter_coords() {
                self.mask[(x as u32, y as u32)] = image::Luma([0]);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    fn backproj_with(width: u32, height: u32, blobs: &[Rect]) -> GrayImage {
        GrayImage::from_fn(width, height, |x, y| {
            let hot = blobs.iter().any(|blob| blob.contains(x.into(), y.into()));
            image::Luma([if hot { 255 } else { 0 }])
        })
    }

    #[test]
    fn test_hide_column_spans_full_height() {
        let primary = Rect::from_top_left(100, 100, 60, 60);
        let backproj = backproj_with(300, 300, &[primary]);
        let mut tracker = HandTracker::new(HandTrackerConfig::default());
        tracker.track(&backproj, primary);

        for y in [0, 150, 299] {
            assert_eq!(tracker.mask[(67, y)].0[0], 255);
            assert_eq!(tracker.mask[(68, y)].0[0], 0);
            assert_eq!(tracker.mask[(191, y)].0[0], 0);
            assert_eq!(tracker.mask[(192, y)].0[0], 255);
        }
    }

    #[test]
    fn test_hide_column_is_clipped() {
        let primary = Rect::from_top_left(10, 100, 60, 60);
        let backproj = backproj_with(300, 300, &[primary]);
        let mut tracker = HandTracker::new(HandTrackerConfig::default());
        tracker.track(&backproj, primary);

        assert_eq!(tracker.mask[(0, 0)].0[0], 0);
        assert_eq!(tracker.mask[(101, 0)].0[0], 0);
        assert_eq!(tracker.mask[(102, 0)].0[0], 255);
    }

    #[test]
    fn test_finds_secondary_next_to_primary() {
        let primary = Rect::from_top_left(100, 100, 60, 60);
        let secondary = Rect::from_top_left(10, 40, 30, 30);
        let backproj = backproj_with(300, 300, &[primary, secondary]);
        let mut tracker = HandTracker::new(HandTrackerConfig::default());

        let tracked = tracker.track(&backproj, primary);
        assert!(tracked.bounding_rect().area() > 1);
        let (cx, cy) = tracked.center();
        assert_abs_diff_eq!(cx, 24.5, epsilon = 1.0);
        assert_abs_diff_eq!(cy, 54.5, epsilon = 1.0);
    }

    #[test]
    fn test_primary_alone_yields_nothing() {
        let primary = Rect::from_top_left(100, 100, 60, 60);
        let backproj = backproj_with(300, 300, &[primary]);
        let mut tracker = HandTracker::new(HandTrackerConfig::default());

        let tracked = tracker.track(&backproj, primary);
        assert_eq!(tracked, RotatedRect::EMPTY);
    }

    #[test]
    fn test_lost_primary_skips_search() {
        let backproj = backproj_with(300, 300, &[Rect::from_top_left(10, 40, 30, 30)]);
        let mut tracker = HandTracker::new(HandTrackerConfig::default());

        assert_eq!(tracker.track(&backproj, Rect::EMPTY), RotatedRect::EMPTY);
        assert_eq!(
            tracker.track(&backproj, Rect::from_top_left(5, 5, 1, 1)),
            RotatedRect::EMPTY
        );
    }

    #[test]
    fn test_buffers_follow_frame_size() {
        let primary = Rect::from_top_left(100, 100, 60, 60);
        let mut tracker = HandTracker::new(HandTrackerConfig::default());
        tracker.track(&backproj_with(300, 300, &[primary]), primary);
        assert_eq!(tracker.mask.dimensions(), (300, 300));

        let primary = Rect::from_top_left(60, 60, 30, 30);
        tracker.track(&backproj_with(200, 150, &[primary]), primary);
        assert_eq!(tracker.mask.dimensions(), (200, 150));
        assert_eq!(tracker.masked.dimensions(), (200, 150));
    }
}
