//! Hue histograms for color-model calibration and back-projection.

use image::GrayImage;

use crate::image::Rect;

/// A 1-D histogram over the quantized hue channel.
///
/// Bucket weights are normalized to `0..=255`, so they can be compared directly against the
/// binarization threshold when writing 8-bit likelihood maps.
#[derive(Debug, Clone)]
pub struct HueHistogram {
    buckets: Vec<f32>,
}

impl HueHistogram {
    /// Creates an all-zero histogram with `buckets` buckets.
    ///
    /// # Panics
    ///
    /// Panics if `buckets` is 0 or greater than 256.
    pub fn new(buckets: usize) -> Self {
        assert!(
            (1..=256).contains(&buckets),
            "invalid hue bucket count {buckets}"
        );
        Self {
            buckets: vec![0.0; buckets],
        }
    }

    /// Builds a normalized histogram from the hue values inside `region`, counting only pixels
    /// whose gate mask entry is non-zero.
    ///
    /// `region` is clipped to the image bounds; a region outside the image yields an all-zero
    /// histogram.
    pub fn compute(buckets: usize, hue: &GrayImage, mask: &GrayImage, region: Rect) -> Self {
        debug_assert_eq!(hue.dimensions(), mask.dimensions());

        let mut hist = Self::new(buckets);
        let bounds = Rect::from_top_left(0, 0, hue.width(), hue.height());
        if let Some(region) = region.intersection(&bounds) {
            for (x, y) in region.iter_coords() {
                let (x, y) = (x as u32, y as u32);
                if mask[(x, y)].0[0] != 0 {
                    let bucket = hist.bucket_of(hue[(x, y)].0[0]);
                    hist.buckets[bucket] += 1.0;
                }
            }
        }
        hist.normalize();
        hist
    }

    /// Rescales the bucket weights so the smallest maps to 0 and the largest to 255.
    ///
    /// A histogram whose buckets are all equal (including the all-zero one left behind by an
    /// unusable calibration region) is zeroed out.
    fn normalize(&mut self) {
        let min = self.buckets.iter().copied().fold(f32::INFINITY, f32::min);
        let max = self.buckets.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        let scale = if max - min > f32::EPSILON {
            255.0 / (max - min)
        } else {
            0.0
        };
        for bucket in &mut self.buckets {
            *bucket = (*bucket - min) * scale;
        }
    }

    /// Returns the index of the bucket a hue value falls into.
    #[inline]
    pub fn bucket_of(&self, hue: u8) -> usize {
        usize::from(hue) * self.buckets.len() / 256
    }

    /// Returns the normalized weight for a hue value.
    #[inline]
    pub fn weight(&self, hue: u8) -> f32 {
        self.buckets[self.bucket_of(hue)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn splat(width: u32, height: u32, value: u8) -> GrayImage {
        GrayImage::from_pixel(width, height, image::Luma([value]))
    }

    #[test]
    fn test_single_color_peaks() {
        let hue = splat(8, 8, 200);
        let mask = splat(8, 8, 255);
        let hist = HueHistogram::compute(16, &hue, &mask, Rect::from_top_left(0, 0, 8, 8));
        assert_eq!(hist.weight(200), 255.0);
        assert_eq!(hist.weight(0), 0.0);
    }

    #[test]
    fn test_mask_gates_pixels() {
        let hue = splat(8, 8, 200);
        let mask = splat(8, 8, 0);
        let hist = HueHistogram::compute(16, &hue, &mask, Rect::from_top_left(0, 0, 8, 8));
        assert!(hist.buckets.iter().all(|&w| w == 0.0));
    }

    #[test]
    fn test_minority_color_still_normalizes_to_peak() {
        let mut hue = splat(8, 1, 0);
        hue[(0, 0)] = image::Luma([200]);
        let mask = splat(8, 1, 255);
        let hist = HueHistogram::compute(16, &hue, &mask, Rect::from_top_left(0, 0, 8, 1));
        assert_eq!(hist.weight(0), 255.0);
        assert!(hist.weight(200) > 0.0 && hist.weight(200) < 255.0);
    }

    #[test]
    fn test_degenerate_region() {
        let hue = splat(8, 8, 200);
        let mask = splat(8, 8, 255);
        for region in [Rect::EMPTY, Rect::from_top_left(100, 100, 4, 4)] {
            let hist = HueHistogram::compute(16, &hue, &mask, region);
            assert!(hist.buckets.iter().all(|&w| w == 0.0), "{region:?}");
        }
    }

    #[test]
    fn test_region_clipped_to_image() {
        let hue = splat(4, 4, 100);
        let mask = splat(4, 4, 255);
        let hist = HueHistogram::compute(16, &hue, &mask, Rect::from_top_left(-10, -10, 100, 100));
        assert_eq!(hist.weight(100), 255.0);
    }

    #[test]
    #[should_panic]
    fn test_zero_buckets() {
        HueHistogram::new(0);
    }
}
