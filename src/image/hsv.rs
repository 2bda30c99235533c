//! RGB to HSV conversion.

/// A color in HSV space, with every component scaled to the full `u8` range.
///
/// `h` maps the hue circle 0°..360° onto `0..=255`, so it can index [`crate::histogram`] buckets
/// directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hsv {
    pub h: u8,
    pub s: u8,
    pub v: u8,
}

/// Converts an 8-bit sRGB pixel to [`Hsv`].
pub fn hsv([r, g, b]: [u8; 3]) -> Hsv {
    let r = f32::from(r) / 255.0;
    let g = f32::from(g) / 255.0;
    let b = f32::from(b) / 255.0;
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let mut degrees = if delta == 0.0 {
        0.0
    } else if max == r {
        60.0 * (((g - b) / delta) % 6.0)
    } else if max == g {
        60.0 * ((b - r) / delta + 2.0)
    } else {
        60.0 * ((r - g) / delta + 4.0)
    };
    if degrees < 0.0 {
        degrees += 360.0;
    }

    let saturation = if max == 0.0 { 0.0 } else { delta / max };

    Hsv {
        h: (degrees / 360.0 * 256.0) as u8,
        s: (saturation * 255.0).round() as u8,
        v: (max * 255.0).round() as u8,
    }
}
