// src/features/fast.rs

//! Segment-test (FAST-9) corner detection with 3x3 non-maximum suppression.
//!
//! Each interior pixel is compared against 16 pixels on a Bresenham circle
//! of radius 3. It is a corner when at least [`ARC_LENGTH`] contiguous
//! circle pixels are all brighter than `center + threshold` or all darker
//! than `center - threshold`. The run is scanned circularly, so an arc that
//! wraps past index 15 back to 0 still counts.

use log::debug;

use crate::features::Keypoint;
use crate::image::{ensure_same_dimensions, ensure_valid, PixelAccess, PixelAccessMut};
use crate::{Result, VisionError};

/// Radius of the sampling circle, and the untouched border width.
pub const RADIUS: usize = 3;

/// Minimum number of contiguous circle pixels forming a corner.
pub const ARC_LENGTH: usize = 9;

/// Bresenham circle of radius 3: 16 (dx, dy) offsets, clockwise from
/// 12 o'clock.
pub const CIRCLE_OFFSETS: [(isize, isize); 16] = [
    (0, -3),
    (1, -3),
    (2, -2),
    (3, -1),
    (3, 0),
    (3, 1),
    (2, 2),
    (1, 3),
    (0, 3),
    (-1, 3),
    (-2, 2),
    (-3, 1),
    (-3, 0),
    (-3, -1),
    (-2, -2),
    (-1, -3),
];

/// Segment-test score of one pixel.
///
/// Returns 0 when no qualifying arc exists. Otherwise the score is the
/// smallest absolute difference between the center and any of the 16
/// circle samples.
#[inline]
fn corner_score(center: i16, circle: &[i16; 16], threshold: i16) -> u8 {
    let mut bright_run = 0;
    let mut dark_run = 0;
    let mut is_corner = false;

    // 16 + 9 steps so a run crossing index 15 -> 0 is seen in full.
    for i in 0..16 + ARC_LENGTH {
        let v = circle[i % 16];
        if v > center + threshold {
            bright_run += 1;
            dark_run = 0;
        } else if v < center - threshold {
            dark_run += 1;
            bright_run = 0;
        } else {
            bright_run = 0;
            dark_run = 0;
        }
        if bright_run >= ARC_LENGTH || dark_run >= ARC_LENGTH {
            is_corner = true;
            break;
        }
    }

    if !is_corner {
        return 0;
    }
    circle
        .iter()
        .map(|&v| (v - center).unsigned_abs())
        .min()
        .unwrap_or(0)
        .min(u8::MAX as u16) as u8
}

/// Detects segment-test corners and writes the local maxima to `keypoints`.
///
/// Pass 1 scores every pixel at least [`RADIUS`] away from each edge into
/// `score_map` (everything else is 0). Pass 2 keeps a pixel only if its
/// score is strictly greater than all 8 neighbors, so plateaus of equal
/// scores are suppressed entirely. Survivors are written in raster order;
/// once `max_keypoints` are stored the rest are dropped without error.
///
/// # Arguments
/// * `image` - Grayscale input.
/// * `score_map` - Scratch output, same dimensions as `image`.
/// * `keypoints` - Output array, at least `max_keypoints` long.
/// * `max_keypoints` - Capacity to fill; must be at least 1.
/// * `threshold` - Minimum intensity difference for a brighter/darker sample.
///
/// # Returns
/// The number of keypoints written.
pub fn fast_corner<S, M>(
    image: &S,
    score_map: &mut M,
    keypoints: &mut [Keypoint],
    max_keypoints: usize,
    threshold: u8,
) -> Result<usize>
where
    S: PixelAccess<Pixel = u8> + ?Sized,
    M: PixelAccessMut<Pixel = u8> + ?Sized,
{
    ensure_valid(image, "keypoint source buffer is invalid")?;
    ensure_valid(&*score_map, "score map buffer is invalid")?;
    ensure_same_dimensions(image, &*score_map, "score map must match the image dimensions")?;
    if max_keypoints == 0 {
        return Err(VisionError::InvalidArgument("max_keypoints must be at least 1"));
    }
    if keypoints.len() < max_keypoints {
        return Err(VisionError::InvalidArgument(
            "keypoint array is smaller than max_keypoints",
        ));
    }

    score_map.fill(0);

    let width = image.width() as usize;
    let height = image.height() as usize;
    if width <= 2 * RADIUS || height <= 2 * RADIUS {
        debug!("fast_corner: {}x{} image has no interior", width, height);
        return Ok(0);
    }

    let thresh = threshold as i16;
    let mut candidates = 0usize;
    {
        let scores = score_map.data_mut();
        for y in RADIUS..height - RADIUS {
            for x in RADIUS..width - RADIUS {
                // SAFETY: x and y are at least RADIUS away from every edge
                // and no circle offset exceeds RADIUS, so every tap is inside
                // the validated buffer.
                let (center, circle) = unsafe {
                    let center = image.get_unchecked(x, y) as i16;
                    let mut circle = [0i16; 16];
                    for (sample, &(dx, dy)) in circle.iter_mut().zip(CIRCLE_OFFSETS.iter()) {
                        *sample = image.get_unchecked(
                            (x as isize + dx) as usize,
                            (y as isize + dy) as usize,
                        ) as i16;
                    }
                    (center, circle)
                };

                let score = corner_score(center, &circle, thresh);
                if score > 0 {
                    candidates += 1;
                }
                scores[y * width + x] = score;
            }
        }
    }

    let scores = score_map.data();
    let mut count = 0usize;
    let mut dropped = 0usize;
    for y in RADIUS..height - RADIUS {
        for x in RADIUS..width - RADIUS {
            let score = scores[y * width + x];
            if score == 0 {
                continue;
            }
            let is_max = (y - 1..=y + 1).all(|ny| {
                (x - 1..=x + 1).all(|nx| (nx == x && ny == y) || score > scores[ny * width + nx])
            });
            if !is_max {
                continue;
            }
            if count < max_keypoints {
                keypoints[count] = Keypoint::new(x as f32, y as f32, score as f32);
                count += 1;
            } else {
                dropped += 1;
            }
        }
    }

    debug!(
        "fast_corner: {} candidates, {} keypoints, {} dropped at capacity {}",
        candidates, count, dropped, max_keypoints
    );
    Ok(count)
}

/// Detector settings.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FastOptions {
    /// Intensity difference a circle sample needs to count as brighter or
    /// darker. Typical: 10 to 40.
    pub threshold: u8,
    /// Upper bound on reported keypoints.
    pub max_keypoints: usize,
}

impl Default for FastOptions {
    fn default() -> Self {
        FastOptions {
            threshold: 20,
            max_keypoints: 500,
        }
    }
}

/// [`fast_corner`] bound to a set of [`FastOptions`].
#[derive(Debug, Clone, Default)]
pub struct FastDetector {
    pub options: FastOptions,
}

impl FastDetector {
    pub fn new(options: FastOptions) -> Self {
        FastDetector { options }
    }

    /// Detects into caller-owned buffers. The capacity is the smaller of
    /// `options.max_keypoints` and `keypoints.len()`.
    pub fn detect<S, M>(&self, image: &S, score_map: &mut M, keypoints: &mut [Keypoint]) -> Result<usize>
    where
        S: PixelAccess<Pixel = u8> + ?Sized,
        M: PixelAccessMut<Pixel = u8> + ?Sized,
    {
        let capacity = self.options.max_keypoints.min(keypoints.len());
        fast_corner(image, score_map, keypoints, capacity, self.options.threshold)
    }

    /// Allocating variant of [`FastDetector::detect`].
    pub fn detect_to_vec<S>(&self, image: &S) -> Result<Vec<Keypoint>>
    where
        S: PixelAccess<Pixel = u8> + ?Sized,
    {
        let mut score_map = crate::image::Image::new(image.width(), image.height());
        let mut keypoints = vec![Keypoint::default(); self.options.max_keypoints];
        let count = self.detect(image, &mut score_map, &mut keypoints)?;
        keypoints.truncate(count);
        Ok(keypoints)
    }
}
