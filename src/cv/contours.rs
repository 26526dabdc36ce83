// src/cv/contours.rs

use log::trace;

use crate::cv::geometry::Rect;
use crate::cv::labeling::{Blob, Label, BACKGROUND};
use crate::cv::{is_boundary_foreground, is_foreground};
use crate::image::{ensure_same_dimensions, ensure_valid, PixelAccess, PixelAccessMut};
use crate::{Point2i, Result, VisionError};

/// Moore neighborhood offsets (x, y), clockwise on screen starting East.
pub const NEIGHBORHOOD: [[i32; 2]; 8] = [
    [1, 0],
    [1, 1],
    [0, 1],
    [-1, 1],
    [-1, 0],
    [-1, -1],
    [0, -1],
    [1, -1],
];

/// Index of West in [`NEIGHBORHOOD`]: the raster-scan predecessor of a
/// boundary start pixel, used as the initial backtrack direction.
const WEST: usize = 4;

/// Value written into the visited buffer.
pub const VISITED: u8 = 255;

/// Result of a single boundary trace.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Contour {
    /// First boundary pixel; set by the caller before tracing.
    pub start: Point2i,
    /// Pixels visited for the first time during the trace.
    pub length: u32,
    pub bbox: Rect,
    /// True when the trace came back to `start`, false when it ran into a
    /// dead end.
    pub closed: bool,
}

impl Contour {
    pub fn new(start: Point2i) -> Self {
        Contour {
            start,
            length: 0,
            bbox: Rect::new(start.x, start.y, 1, 1),
            closed: false,
        }
    }
}

impl Default for Contour {
    fn default() -> Self {
        Contour::new(Point2i::zeros())
    }
}

/// Marks `p` as visited, returning whether it was new.
#[inline]
fn mark_visited<V>(visited: &mut V, p: Point2i) -> bool
where
    V: PixelAccessMut<Pixel = u8> + ?Sized,
{
    if visited.get(p.x, p.y) != 0 {
        return false;
    }
    visited.set(p.x, p.y, VISITED);
    true
}

/// Moore-neighborhood boundary following from `contour.start`.
///
/// From each pixel the 8 neighbors are scanned clockwise, beginning one step
/// past the backtrack direction, and the trace moves to the first one above
/// the binary threshold. After a move in direction `d` the backtrack
/// direction becomes `(d + 6) % 8`.
///
/// The trace stops *closed* on the second return to the start pixel and
/// *open* when a pixel has no foreground neighbor (or after `8 * w * h`
/// steps, which only a start pixel off the boundary can reach).
///
/// `visited` is shared across calls: pixels already marked there do not
/// count toward `contour.length`, so repeated traces of one boundary report
/// zero new pixels.
///
/// # Arguments
/// * `image` - Source intensities.
/// * `visited` - Visit marks, same dimensions as `image`.
/// * `contour` - In: `start`. Out: `length`, `bbox`, `closed`.
pub fn trace_contour<S, V>(image: &S, visited: &mut V, contour: &mut Contour) -> Result<()>
where
    S: PixelAccess<Pixel = u8> + ?Sized,
    V: PixelAccessMut<Pixel = u8> + ?Sized,
{
    ensure_valid(image, "contour source buffer is invalid")?;
    ensure_valid(&*visited, "visited buffer is invalid")?;
    ensure_same_dimensions(image, &*visited, "visited buffer must match the image dimensions")?;
    let start = contour.start;
    if !image.in_bounds(start.x, start.y) {
        return Err(VisionError::InvalidArgument(
            "contour start lies outside the image",
        ));
    }

    let max_steps = 8 * image.pixel_count();
    let mut min = start;
    let mut max = start;
    let mut length = u32::from(mark_visited(visited, start));
    let mut current = start;
    let mut backtrack = WEST;
    let mut returns = 0;
    let mut closed = false;
    let mut steps = 0usize;

    loop {
        let mut step = None;
        for i in 1..=8 {
            let d = (backtrack + i) % 8;
            let next = Point2i::new(current.x + NEIGHBORHOOD[d][0], current.y + NEIGHBORHOOD[d][1]);
            if is_boundary_foreground(image.get(next.x, next.y)) {
                step = Some((d, next));
                break;
            }
        }
        let Some((d, next)) = step else {
            break;
        };

        current = next;
        backtrack = (d + 6) % 8;
        steps += 1;

        min.x = min.x.min(current.x);
        min.y = min.y.min(current.y);
        max.x = max.x.max(current.x);
        max.y = max.y.max(current.y);

        if mark_visited(visited, current) {
            length += 1;
        }
        if current == start {
            returns += 1;
            if returns == 2 {
                closed = true;
                break;
            }
        }
        if steps >= max_steps {
            break;
        }
    }

    contour.length = length;
    contour.bbox = Rect::from_corners(min, max);
    contour.closed = closed;

    trace!(
        "trace_contour: start ({}, {}), {} steps, length {}, closed {}",
        start.x,
        start.y,
        steps,
        length,
        closed
    );
    Ok(())
}

/// First pixel above the binary threshold, in raster order, inside `roi`.
///
/// Falls back to the origin of `roi` when there is none, so the caller must
/// check the returned pixel before tracing from it.
pub fn find_contour_start<S>(image: &S, roi: Rect) -> Result<Point2i>
where
    S: PixelAccess<Pixel = u8> + ?Sized,
{
    ensure_valid(image, "contour source buffer is invalid")?;
    let origin = Point2i::new(roi.x, roi.y);
    let Some(region) = roi.clamp_to(image.width(), image.height()) else {
        return Ok(origin);
    };

    let width = image.width() as usize;
    let data = image.data();
    for y in region.y..region.bottom() {
        let row = y as usize * width;
        for x in region.x..region.right() {
            if is_boundary_foreground(data[row + x as usize]) {
                return Ok(Point2i::new(x, y));
            }
        }
    }
    Ok(origin)
}

/// Extremal corners of a labeled blob.
///
/// Only pixels inside `blob.bbox` that are foreground and carry
/// `blob.label` take part. Corners are picked by coordinate sum and
/// difference: min `x+y` is top-left, max `x-y` top-right, max `x+y`
/// bottom-right and min `x-y` bottom-left. Comparisons are strict, so on a
/// tie the first pixel in raster order keeps the corner.
///
/// # Arguments
/// * `image` - Source intensities.
/// * `labels` - Label buffer produced by [`crate::cv::labeling::find_blobs`].
/// * `blob` - The blob to inspect.
/// * `corners` - Out: `[top-left, top-right, bottom-right, bottom-left]`,
///   ready for [`crate::cv::perspective::perspective_correct`].
///
/// # Returns
/// `false` when no pixel of the blob was found; `corners` is then untouched.
pub fn find_blob_corners<S, L>(
    image: &S,
    labels: &L,
    blob: &Blob,
    corners: &mut [Point2i; 4],
) -> Result<bool>
where
    S: PixelAccess<Pixel = u8> + ?Sized,
    L: PixelAccess<Pixel = Label> + ?Sized,
{
    ensure_valid(image, "corner source buffer is invalid")?;
    ensure_valid(labels, "label buffer is invalid")?;
    ensure_same_dimensions(image, labels, "label buffer must match the image dimensions")?;
    if blob.label == BACKGROUND {
        return Ok(false);
    }
    let Some(region) = blob.bbox.clamp_to(image.width(), image.height()) else {
        return Ok(false);
    };

    let width = image.width() as usize;
    let pixels = image.data();
    let label_data = labels.data();

    let mut min_sum = (i32::MAX, Point2i::zeros());
    let mut max_sum = (i32::MIN, Point2i::zeros());
    let mut min_diff = (i32::MAX, Point2i::zeros());
    let mut max_diff = (i32::MIN, Point2i::zeros());
    let mut found = false;

    for y in region.y..region.bottom() {
        let row = y as usize * width;
        for x in region.x..region.right() {
            let idx = row + x as usize;
            if label_data[idx] != blob.label || !is_foreground(pixels[idx]) {
                continue;
            }
            found = true;
            let p = Point2i::new(x, y);
            let sum = x + y;
            let diff = x - y;
            if sum < min_sum.0 {
                min_sum = (sum, p);
            }
            if sum > max_sum.0 {
                max_sum = (sum, p);
            }
            if diff < min_diff.0 {
                min_diff = (diff, p);
            }
            if diff > max_diff.0 {
                max_diff = (diff, p);
            }
        }
    }

    if found {
        *corners = [min_sum.1, max_diff.1, max_sum.1, min_diff.1];
    }
    Ok(found)
}
