//! Iterative mode search over 8-bit likelihood maps.
//!
//! [`mean_shift`] pursues the local center of mass of a map region without changing the search
//! window's size. [`camshift`] runs the same search and then summarizes the matched mass as an
//! oriented ellipse derived from its second-order moments, letting the window adapt to the
//! object's size and rotation between frames.

use image::GrayImage;
use nalgebra::Matrix2;

use crate::image::{Rect, RotatedRect};

/// Slack added around the converged window before the moment pass, letting the window grow with
/// the tracked object.
const WINDOW_SLACK: i32 = 10;

/// Termination criteria for the iterative search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TermCriteria {
    /// Maximum number of window shifts per search.
    pub max_iterations: u32,
    /// Convergence bound: the search stops once a shift moves the window less than this distance,
    /// in pixels.
    pub epsilon: f32,
}

impl Default for TermCriteria {
    fn default() -> Self {
        Self {
            max_iterations: 10,
            epsilon: 1.0,
        }
    }
}

/// Pixel mass over a window, accumulated up to second order.
#[derive(Debug, Default, Clone, Copy)]
struct Moments {
    m00: f64,
    m10: f64,
    m01: f64,
    m20: f64,
    m02: f64,
    m11: f64,
}

impl Moments {
    /// Accumulates moments over `window`, with coordinates taken relative to the window's top
    /// left corner. `window` must lie inside `map`.
    fn of(map: &GrayImage, window: Rect) -> Self {
        let mut m = Self::default();
        for (x, y) in window.iter_coords() {
            let weight = f64::from(map[(x as u32, y as u32)].0[0]);
            let rx = (x - i64::from(window.x())) as f64;
            let ry = (y - i64::from(window.y())) as f64;
            m.m00 += weight;
            m.m10 += weight * rx;
            m.m01 += weight * ry;
            m.m20 += weight * rx * rx;
            m.m02 += weight * ry * ry;
            m.m11 += weight * rx * ry;
        }
        m
    }
}

/// Iteratively moves `window` towards the center of mass of the map region it covers.
///
/// The window keeps its size; only its position changes, and it never leaves the map. Returns the
/// converged window along with the number of shifts performed. A window that does not intersect
/// the map restarts from a single pixel at the map center.
pub fn mean_shift(map: &GrayImage, window: Rect, criteria: &TermCriteria) -> (Rect, u32) {
    let bounds = Rect::from_top_left(0, 0, map.width(), map.height());
    if bounds.area() == 0 {
        return (Rect::EMPTY, 0);
    }

    let mut cur = window.intersection(&bounds).unwrap_or_else(|| {
        Rect::from_top_left(map.width() as i32 / 2, map.height() as i32 / 2, 1, 1)
    });
    let (width, height) = (cur.width(), cur.height());
    let eps2 = f64::from(criteria.epsilon) * f64::from(criteria.epsilon);

    let mut iterations = 0;
    for _ in 0..criteria.max_iterations {
        let m = Moments::of(map, cur);
        if m.m00 <= f64::EPSILON {
            break;
        }
        iterations += 1;

        // Shift so the window centers on the centroid, clamped to the map. Ties round to even,
        // which keeps a window centered on symmetric mass from oscillating around it.
        let dx = (m.m10 / m.m00 - f64::from(width) * 0.5).round_ties_even() as i32;
        let dy = (m.m01 / m.m00 - f64::from(height) * 0.5).round_ties_even() as i32;
        let nx = (cur.x() + dx).clamp(0, (map.width() - width) as i32);
        let ny = (cur.y() + dy).clamp(0, (map.height() - height) as i32);
        let (sx, sy) = (i64::from(nx - cur.x()), i64::from(ny - cur.y()));
        cur = Rect::from_top_left(nx, ny, width, height);
        if ((sx * sx + sy * sy) as f64) < eps2 {
            break;
        }
    }

    (cur, iterations)
}

/// Runs [`mean_shift`] and summarizes the matched mass as an oriented ellipse.
///
/// Returns the oriented result together with the follow-up search window (the result's bounding
/// rectangle clipped to the map). When the converged window covers no mass at all, the result is
/// [`RotatedRect::EMPTY`] and the follow-up window is the converged window itself, so a later
/// search can resume from where this one gave up.
pub fn camshift(map: &GrayImage, window: Rect, criteria: &TermCriteria) -> (RotatedRect, Rect) {
    let bounds = Rect::from_top_left(0, 0, map.width(), map.height());
    let (converged, iterations) = mean_shift(map, window, criteria);
    log::trace!("mean shift converged on {converged:?} after {iterations} iterations");

    let Some(slackened) = converged.grow(WINDOW_SLACK).intersection(&bounds) else {
        return (RotatedRect::EMPTY, converged);
    };
    let m = Moments::of(map, slackened);
    if m.m00 <= f64::EPSILON {
        return (RotatedRect::EMPTY, converged);
    }

    let inv = 1.0 / m.m00;
    let centroid_x = m.m10 * inv;
    let centroid_y = m.m01 * inv;

    // The central second moments form the covariance of the matched mass; its major eigenaxis is
    // the ellipse orientation and 4 standard deviations per axis cover it generously.
    let a = m.m20 * inv - centroid_x * centroid_x;
    let b = m.m11 * inv - centroid_x * centroid_y;
    let c = m.m02 * inv - centroid_y * centroid_y;
    let eigen = Matrix2::new(a, b, b, c).symmetric_eigen();
    let (major, minor) = if eigen.eigenvalues[0] >= eigen.eigenvalues[1] {
        (0, 1)
    } else {
        (1, 0)
    };
    let axis = eigen.eigenvectors.column(major);
    let mut radians = axis[1].atan2(axis[0]) as f32;
    if radians < 0.0 {
        // The eigenaxis direction is sign-ambiguous; normalize into [0, π).
        radians += std::f32::consts::PI;
    }
    let length = (4.0 * eigen.eigenvalues[major].max(0.0).sqrt()) as f32;
    let width = (4.0 * eigen.eigenvalues[minor].max(0.0).sqrt()) as f32;

    let result = RotatedRect::from_center(
        (f64::from(slackened.x()) + centroid_x) as f32,
        (f64::from(slackened.y()) + centroid_y) as f32,
        length,
        width,
        radians,
    );
    let next = result
        .bounding_rect()
        .intersection(&bounds)
        .unwrap_or(Rect::EMPTY);
    (result, next)
}
