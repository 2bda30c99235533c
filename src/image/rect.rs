use std::{cmp, fmt};

use itertools::Itertools;

/// An axis-aligned rectangle with integer coordinates.
///
/// Rectangles may have zero width and/or height. A rectangle whose [`area`][Self::area] is 1 or
/// less doubles as the "nothing there" value in tracking and detection results.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    x: i32,
    y: i32,
    width: u32,
    height: u32,
}

impl Rect {
    /// The degenerate rectangle at the origin, used to report a missing target.
    pub const EMPTY: Self = Self {
        x: 0,
        y: 0,
        width: 0,
        height: 0,
    };

    /// Creates a rectangle extending downwards and to the right from a point.
    #[inline]
    pub fn from_top_left(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Creates a rectangle extending outwards from a center point.
    pub fn from_center(x_center: i32, y_center: i32, width: u32, height: u32) -> Self {
        Self {
            x: x_center - (width / 2) as i32,
            y: y_center - (height / 2) as i32,
            width,
            height,
        }
    }

    #[inline]
    pub fn x(&self) -> i32 {
        self.x
    }

    #[inline]
    pub fn y(&self) -> i32 {
        self.y
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    /// Returns the center of this rectangle, rounded towards the top left.
    pub fn center(&self) -> (i32, i32) {
        (
            self.x + (self.width / 2) as i32,
            self.y + (self.height / 2) as i32,
        )
    }

    fn right(&self) -> i64 {
        i64::from(self.x) + i64::from(self.width)
    }

    fn bottom(&self) -> i64 {
        i64::from(self.y) + i64::from(self.height)
    }

    /// Grows each side of this rectangle by the given amounts of pixels.
    ///
    /// Negative amounts shrink the rectangle; width and height saturate at zero.
    #[must_use]
    pub fn grow_sides(&self, left: i32, right: i32, top: i32, bottom: i32) -> Self {
        let width = (i64::from(self.width) + i64::from(left) + i64::from(right))
            .clamp(0, i64::from(u32::MAX));
        let height = (i64::from(self.height) + i64::from(top) + i64::from(bottom))
            .clamp(0, i64::from(u32::MAX));
        Self {
            x: self.x - left,
            y: self.y - top,
            width: width as u32,
            height: height as u32,
        }
    }

    /// Grows every side of this rectangle by the same margin.
    #[must_use]
    pub fn grow(&self, margin: i32) -> Self {
        self.grow_sides(margin, margin, margin, margin)
    }

    /// Computes the intersection of `self` and `other`.
    ///
    /// Returns [`None`] when the rectangles do not overlap in at least one pixel.
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let x = cmp::max(self.x, other.x);
        let y = cmp::max(self.y, other.y);
        let right = cmp::min(self.right(), other.right());
        let bottom = cmp::min(self.bottom(), other.bottom());
        if i64::from(x) >= right || i64::from(y) >= bottom {
            return None;
        }

        Some(Self {
            x,
            y,
            width: (right - i64::from(x)) as u32,
            height: (bottom - i64::from(y)) as u32,
        })
    }

    /// Returns whether the pixel at `(x, y)` lies inside this rectangle.
    pub fn contains(&self, x: i64, y: i64) -> bool {
        x >= i64::from(self.x) && x < self.right() && y >= i64::from(self.y) && y < self.bottom()
    }

    /// Returns an iterator over all pixel coordinates contained in this rectangle.
    pub fn iter_coords(&self) -> impl Iterator<Item = (i64, i64)> {
        (i64::from(self.x)..self.right()).cartesian_product(i64::from(self.y)..self.bottom())
    }
}

impl fmt::Debug for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (x, y) = (self.x, self.y);
        let (w, h) = (self.width, self.height);
        write!(f, "Rect @ ({x},{y})/{w}x{h}")
    }
}

/// A rectangle with a floating-point center and size, rotated around its center.
///
/// This is the shape of a mode search result: the matched pixel mass is summarized as an oriented
/// ellipse, and the ellipse's axis-aligned [`bounding_rect`][Self::bounding_rect] seeds the next
/// search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotatedRect {
    x_center: f32,
    y_center: f32,
    width: f32,
    height: f32,
    radians: f32,
}

impl RotatedRect {
    /// The degenerate result reported when the searched area holds no pixel mass.
    pub const EMPTY: Self = Self {
        x_center: 0.0,
        y_center: 0.0,
        width: 0.0,
        height: 0.0,
        radians: 0.0,
    };

    /// Creates a rotated rectangle extending outwards from a center point.
    ///
    /// `radians` is the clockwise rotation around the center.
    #[inline]
    pub fn from_center(x_center: f32, y_center: f32, width: f32, height: f32, radians: f32) -> Self {
        Self {
            x_center,
            y_center,
            width,
            height,
            radians,
        }
    }

    #[inline]
    pub fn center(&self) -> (f32, f32) {
        (self.x_center, self.y_center)
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.height
    }

    /// Returns the clockwise rotation around the center, in radians.
    #[inline]
    pub fn rotation_radians(&self) -> f32 {
        self.radians
    }

    /// Computes the axis-aligned bounding rectangle, rounded outwards to whole pixels.
    pub fn bounding_rect(&self) -> Rect {
        let (sin, cos) = self.radians.sin_cos();
        let half_w = (self.width * cos.abs() + self.height * sin.abs()) / 2.0;
        let half_h = (self.width * sin.abs() + self.height * cos.abs()) / 2.0;
        let x = (self.x_center - half_w).floor();
        let y = (self.y_center - half_h).floor();
        let right = (self.x_center + half_w).ceil();
        let bottom = (self.y_center + half_h).ceil();
        Rect::from_top_left(x as i32, y as i32, (right - x) as u32, (bottom - y) as u32)
    }
}

#[cfg(test)]
mod tests {
    use std::f32::consts::FRAC_PI_2;

    use super::*;

    #[test]
    fn test_intersection() {
        let a = Rect::from_top_left(0, 0, 10, 10);
        let b = Rect::from_top_left(5, 5, 10, 10);
        assert_eq!(a.intersection(&b), Some(Rect::from_top_left(5, 5, 5, 5)));
        assert_eq!(b.intersection(&a), Some(Rect::from_top_left(5, 5, 5, 5)));
        assert_eq!(a.intersection(&a), Some(a));

        let outside = Rect::from_top_left(10, 0, 10, 10);
        assert_eq!(a.intersection(&outside), None);
        assert_eq!(a.intersection(&Rect::EMPTY), None);
    }

    #[test]
    fn test_grow() {
        let rect = Rect::from_top_left(10, 10, 20, 20);
        assert_eq!(rect.grow(5), Rect::from_top_left(5, 5, 30, 30));
        assert_eq!(rect.grow(-5), Rect::from_top_left(15, 15, 10, 10));
        // Shrinking past zero saturates instead of wrapping.
        assert_eq!(rect.grow(-30).area(), 0);
        assert_eq!(
            rect.grow_sides(1, 2, 3, 4),
            Rect::from_top_left(9, 7, 23, 27)
        );
    }

    #[test]
    fn test_center() {
        assert_eq!(Rect::from_top_left(50, 50, 40, 40).center(), (70, 70));
        assert_eq!(Rect::from_center(70, 70, 40, 40).center(), (70, 70));
    }

    #[test]
    fn test_contains() {
        let rect = Rect::from_top_left(1, 2, 2, 2);
        assert!(rect.contains(1, 2));
        assert!(rect.contains(2, 3));
        assert!(!rect.contains(3, 3));
        assert!(!rect.contains(0, 2));
        assert!(!Rect::EMPTY.contains(0, 0));
    }

    #[test]
    fn test_iter_coords() {
        let rect = Rect::from_top_left(1, 2, 2, 2);
        let coords = rect.iter_coords().collect::<Vec<_>>();
        assert_eq!(coords, [(1, 2), (1, 3), (2, 2), (2, 3)]);
        assert_eq!(Rect::EMPTY.iter_coords().count(), 0);
    }

    #[test]
    fn test_bounding_rect() {
        let aligned = RotatedRect::from_center(10.0, 10.0, 4.0, 2.0, 0.0);
        assert_eq!(aligned.bounding_rect(), Rect::from_top_left(8, 9, 4, 2));

        // A quarter turn swaps the sides (up to float rounding).
        let turned = RotatedRect::from_center(10.0, 10.0, 4.0, 2.0, FRAC_PI_2);
        let bounding = turned.bounding_rect();
        assert_eq!(bounding.center(), (10, 10));
        assert!(bounding.width() <= 3 && bounding.height() >= 4);

        assert_eq!(RotatedRect::EMPTY.bounding_rect().area(), 0);
    }
}
