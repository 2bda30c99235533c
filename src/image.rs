//! Image buffers and the geometry types used throughout the crate.

mod hsv;
mod rect;

use std::{fmt, path::Path};

use anyhow::Context;
use image::RgbImage;

pub use self::hsv::{hsv, Hsv};
pub use self::rect::{Rect, RotatedRect};

/// An 8-bit sRGB image.
#[derive(Clone)]
pub struct Image {
    buf: RgbImage,
}

impl Image {
    /// Loads an image from the filesystem.
    ///
    /// The path must have a supported extension (`jpg`, `jpeg` or `png`).
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let buf = image::open(path)
            .with_context(|| format!("failed to load image from '{}'", path.display()))?
            .to_rgb8();
        Ok(Self { buf })
    }

    /// Saves this image to the filesystem.
    ///
    /// The path must have a supported extension (`jpg`, `jpeg` or `png`).
    pub fn save<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let path = path.as_ref();
        self.buf
            .save(path)
            .with_context(|| format!("failed to save image to '{}'", path.display()))
    }

    /// Creates a black image of the given size.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            buf: RgbImage::new(width, height),
        }
    }

    /// Creates an image by evaluating a closure for every pixel coordinate.
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> [u8; 3]) -> Self {
        Self {
            buf: RgbImage::from_fn(width, height, |x, y| image::Rgb(f(x, y))),
        }
    }

    /// Returns the width of this image, in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.buf.width()
    }

    /// Returns the height of this image, in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.buf.height()
    }

    /// Returns a [`Rect`] covering this image.
    ///
    /// The rectangle is positioned at `(0, 0)` and has the width and height of the image.
    #[inline]
    pub fn rect(&self) -> Rect {
        Rect::from_top_left(0, 0, self.width(), self.height())
    }

    /// Returns the RGB value of the pixel at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics when `(x, y)` is outside of this image.
    #[inline]
    pub fn get(&self, x: u32, y: u32) -> [u8; 3] {
        self.buf[(x, y)].0
    }
}

impl fmt::Debug for Image {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{} Image", self.width(), self.height())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_fn() {
        let image = Image::from_fn(2, 2, |x, y| [x as u8, y as u8, 7]);
        assert_eq!(image.get(0, 0), [0, 0, 7]);
        assert_eq!(image.get(1, 0), [1, 0, 7]);
        assert_eq!(image.get(0, 1), [0, 1, 7]);
        assert_eq!(image.rect(), Rect::from_top_left(0, 0, 2, 2));
    }

    #[test]
    fn test_save_load_round_trip() {
        let image = Image::from_fn(4, 3, |x, y| [x as u8 * 50, y as u8 * 80, 200]);
        let path = std::env::temp_dir().join("hueshift_round_trip.png");
        image.save(&path).unwrap();
        let loaded = Image::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(loaded.rect(), image.rect());
        for (x, y) in image.rect().iter_coords() {
            assert_eq!(loaded.get(x as u32, y as u32), image.get(x as u32, y as u32));
        }
    }

    #[test]
    fn test_load_missing_file_fails() {
        let err = Image::load("/nonexistent/frame.png").unwrap_err();
        assert!(err.to_string().contains("failed to load image"), "{err}");
    }

    #[test]
    fn test_debug() {
        assert_eq!(format!("{:?}", Image::new(64, 48)), "64x48 Image");
    }
}
