// src/cv/geometry.rs

use crate::{Point2f, Point2i};

/// Axis-aligned rectangle used for bounding boxes and regions of interest.
///
/// `right()` and `bottom()` are exclusive and saturate at `i32::MAX`.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Rect {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle spanning the inclusive corners `min` and `max`.
    pub fn from_corners(min: Point2i, max: Point2i) -> Self {
        Rect {
            x: min.x,
            y: min.y,
            width: (max.x as i64 - min.x as i64 + 1).clamp(0, u32::MAX as i64) as u32,
            height: (max.y as i64 - min.y as i64 + 1).clamp(0, u32::MAX as i64) as u32,
        }
    }

    #[inline]
    pub fn right(&self) -> i32 {
        saturating_end(self.x, self.width)
    }

    #[inline]
    pub fn bottom(&self) -> i32 {
        saturating_end(self.y, self.height)
    }

    #[inline]
    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn contains(&self, p: Point2i) -> bool {
        p.x >= self.x && p.x < self.right() && p.y >= self.y && p.y < self.bottom()
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    /// Overlapping part of two rectangles, `None` when they are disjoint.
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        if !self.intersects(other) {
            return None;
        }
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        Some(Rect::new(x, y, (right - x) as u32, (bottom - y) as u32))
    }

    /// Clips the rectangle to a `width` x `height` image.
    pub fn clamp_to(&self, width: u32, height: u32) -> Option<Rect> {
        self.intersection(&Rect::new(0, 0, width, height))
    }
}

#[inline]
fn saturating_end(start: i32, len: u32) -> i32 {
    (start as i64 + len as i64).min(i32::MAX as i64) as i32
}

/// Length of the closed polygon through `poly`.
pub fn perimeter(poly: &[Point2f]) -> f32 {
    let n = poly.len();
    if n < 2 {
        return 0.0;
    }
    (0..n).map(|i| (poly[(i + 1) % n] - poly[i]).norm()).sum()
}

/// Shortest edge of the closed polygon through `poly`.
pub fn min_edge_length(poly: &[Point2f]) -> f32 {
    let n = poly.len();
    if n < 2 {
        return 0.0;
    }
    (0..n)
        .map(|i| (poly[(i + 1) % n] - poly[i]).norm())
        .fold(f32::INFINITY, f32::min)
}

/// Strict convexity: every turn has the same, non-zero orientation.
pub fn is_convex(poly: &[Point2f]) -> bool {
    let n = poly.len();
    if n < 3 {
        return false;
    }

    let mut orientation = 0.0f32;
    for i in 0..n {
        let a = poly[i];
        let b = poly[(i + 1) % n];
        let c = poly[(i + 2) % n];
        let cross = (b.x - a.x) * (c.y - b.y) - (b.y - a.y) * (c.x - b.x);
        if cross == 0.0 {
            return false;
        }
        if orientation == 0.0 {
            orientation = cross.signum();
        } else if cross.signum() != orientation {
            return false;
        }
    }
    true
}
