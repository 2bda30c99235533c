//! The sign prediction seam and its feature extraction.
//!
//! Classifying hand shapes into letters is an external concern (a small neural network in a
//! typical deployment). This module provides [`hand_input`], the extraction of the classifier's
//! input vector from a tracked hand region, and the [`SignPredictor`] trait consumers implement.

use image::{imageops, GrayImage};

use crate::image::Rect;

/// Side length of the square input image fed to a [`SignPredictor`], in pixels.
pub const INPUT_SIDE: u32 = 16;

/// A letter guess with its confidence, as returned by [`SignPredictor::predict`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    pub letter: char,
    /// Confidence in `0.0..=1.0`. Callers usually ignore predictions below 0.5.
    pub confidence: f32,
}

/// A black-box letter classifier over hand-shape feature vectors.
pub trait SignPredictor {
    /// Classifies a feature vector produced by [`hand_input`].
    fn predict(&mut self, input: &[f32]) -> Prediction;
}

/// Extracts the classifier input vector for a hand region of a back-projection.
///
/// The region is squared up to its larger side (keeping its top left corner), clipped to the
/// image, and squared again by shrinking should the clipping have broken the aspect. The crop is
/// then resized to [`INPUT_SIDE`]×[`INPUT_SIDE`] with bilinear filtering and flattened row by
/// row, every value scaled to `0.0..=1.0`.
///
/// Returns [`None`] when `region` does not usefully intersect the image.
pub fn hand_input(backproj: &GrayImage, region: Rect) -> Option<Vec<f32>> {
    let bounds = Rect::from_top_left(0, 0, backproj.width(), backproj.height());
    let side = region.width().max(region.height());
    let square = Rect::from_top_left(region.x(), region.y(), side, side);
    let clipped = square.intersection(&bounds)?;
    let side = clipped.width().min(clipped.height());

    let crop = imageops::crop_imm(backproj, clipped.x() as u32, clipped.y() as u32, side, side);
    let scaled = imageops::resize(
        &crop.to_image(),
        INPUT_SIDE,
        INPUT_SIDE,
        imageops::FilterType::Triangle,
    );
    Some(scaled.pixels().map(|p| f32::from(p.0[0]) / 255.0).collect())
}
