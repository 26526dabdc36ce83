// src/core/scanner.rs

//! Quadrilateral scanning pipeline.
//!
//! Adaptive threshold -> blobs -> corner quads -> boundary check ->
//! rectified patch -> contrast check -> Otsu binarized patch. Unlike the
//! rest of the crate this layer owns its scratch buffers and returns a `Vec`.

use log::debug;

use crate::cv::contours::{find_blob_corners, trace_contour, Contour};
use crate::cv::filters::{otsu, threshold};
use crate::cv::geometry::{is_convex, min_edge_length};
use crate::cv::integral::{
    adaptive_threshold, compute_integral, compute_squared_integral, region_mean, region_variance,
};
use crate::cv::is_boundary_foreground;
use crate::cv::labeling::{find_blobs, Blob, Label};
use crate::cv::perspective::perspective_correct;
use crate::image::{ensure_valid, Image, PixelAccess, PixelAccessMut};
use crate::{Point2f, Point2i, QuadCorners, Result, VisionError};

/// Scanner configuration.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScannerOptions {
    /// Half-size of the adaptive threshold window.
    pub adaptive_radius: u32,
    /// Bias subtracted from the local mean.
    pub adaptive_c: i32,
    /// Invert the binary image so dark shapes on a light background
    /// become foreground.
    pub invert: bool,
    /// Blob capacity handed to the labeler.
    pub max_blobs: usize,
    /// Blobs with fewer pixels are skipped.
    pub min_area: u32,
    /// Shortest acceptable quad edge, in pixels.
    pub min_edge_length: f32,
    /// Side of the rectified square patch.
    pub patch_size: u32,
    /// Patches with a lower intensity standard deviation are rejected as
    /// featureless.
    pub min_stddev: f64,
}

impl Default for ScannerOptions {
    fn default() -> Self {
        ScannerOptions {
            adaptive_radius: 3,
            adaptive_c: 7,
            invert: true,
            max_blobs: 256,
            min_area: 64,
            min_edge_length: 10.0,
            patch_size: 49,
            min_stddev: 10.0,
        }
    }
}

/// A blob whose corners form a convex, closed quadrilateral with a
/// textured interior.
#[derive(Debug, Clone, PartialEq)]
pub struct Quad {
    pub blob: Blob,
    /// `[top-left, top-right, bottom-right, bottom-left]`.
    pub corners: QuadCorners,
    pub contour: Contour,
    /// Rectified `patch_size` x `patch_size` view of the quad.
    pub patch: Image<u8>,
    /// `patch` binarized at its Otsu level: 255 above `level`, 0 elsewhere.
    pub binary: Image<u8>,
    pub level: u8,
    pub mean: f64,
    pub stddev: f64,
}

/// Finds textured quadrilaterals in a grayscale frame.
#[derive(Debug, Clone, Default)]
pub struct QuadScanner {
    pub options: ScannerOptions,
}

impl QuadScanner {
    pub fn new(options: ScannerOptions) -> Self {
        QuadScanner { options }
    }

    pub fn scan<S>(&self, image: &S) -> Result<Vec<Quad>>
    where
        S: PixelAccess<Pixel = u8> + ?Sized,
    {
        ensure_valid(image, "scanner input buffer is invalid")?;
        let opts = &self.options;
        if opts.patch_size == 0 {
            return Err(VisionError::InvalidArgument("patch_size must be at least 1"));
        }

        let width = image.width();
        let height = image.height();

        // 1. Binarize
        let mut integral: Image<u32> = Image::new(width, height);
        let mut binary: Image<u8> = Image::new(width, height);
        adaptive_threshold(image, &mut integral, &mut binary, opts.adaptive_radius, opts.adaptive_c)?;
        if opts.invert {
            for v in binary.data_mut().iter_mut() {
                *v = 255 - *v;
            }
        }

        // 2. Label
        let mut labels: Image<Label> = Image::new(width, height);
        let mut blobs = vec![Blob::default(); opts.max_blobs];
        let blob_count = find_blobs(&binary, &mut labels, &mut blobs, opts.max_blobs)?;

        // 3. Filter candidates
        let mut visited: Image<u8> = Image::new(width, height);
        let mut quads = Vec::new();
        let mut sized = 0usize;
        let mut shaped = 0usize;
        let mut traced = 0usize;

        for blob in blobs.iter().take(blob_count) {
            if blob.area < opts.min_area {
                continue;
            }
            sized += 1;

            let mut raw = [Point2i::zeros(); 4];
            if !find_blob_corners(&binary, &labels, blob, &mut raw)? {
                continue;
            }
            let corners = raw.map(|p| Point2f::new(p.x as f32, p.y as f32));
            if !is_convex(&corners) || min_edge_length(&corners) < opts.min_edge_length {
                continue;
            }
            shaped += 1;

            let start = match blob_start(&binary, &labels, blob) {
                Some(start) => start,
                None => continue,
            };
            let mut contour = Contour::new(start);
            trace_contour(&binary, &mut visited, &mut contour)?;
            if !contour.closed {
                continue;
            }
            traced += 1;

            if let Some(quad) = self.rectify(image, blob, corners, contour)? {
                quads.push(quad);
            }
        }

        debug!(
            "scan: {} blobs, {} large enough, {} quad shaped, {} closed, {} textured",
            blob_count,
            sized,
            shaped,
            traced,
            quads.len()
        );
        Ok(quads)
    }

    /// Warps the quad into a square patch and measures its contrast.
    fn rectify<S>(
        &self,
        image: &S,
        blob: &Blob,
        corners: QuadCorners,
        contour: Contour,
    ) -> Result<Option<Quad>>
    where
        S: PixelAccess<Pixel = u8> + ?Sized,
    {
        let size = self.options.patch_size;
        let mut patch: Image<u8> = Image::new(size, size);
        perspective_correct(&mut patch, image, &corners)?;

        let mut sum: Image<u32> = Image::new(size, size);
        let mut squared: Image<u64> = Image::new(size, size);
        compute_integral(&patch, &mut sum)?;
        compute_squared_integral(&patch, &mut squared)?;

        let mean = region_mean(&sum, 0, 0, size, size);
        let stddev = region_variance(&sum, &squared, 0, 0, size, size).sqrt();
        if stddev < self.options.min_stddev {
            return Ok(None);
        }

        let level = otsu(&patch)?;
        let mut binary: Image<u8> = Image::new(size, size);
        threshold(&patch, &mut binary, level)?;

        Ok(Some(Quad {
            blob: *blob,
            corners,
            contour,
            patch,
            binary,
            level,
            mean,
            stddev,
        }))
    }
}

/// First pixel of `blob` in raster order that the tracer sees as
/// foreground. Other blobs may reach into the same bounding box.
fn blob_start<B, L>(binary: &B, labels: &L, blob: &Blob) -> Option<Point2i>
where
    B: PixelAccess<Pixel = u8> + ?Sized,
    L: PixelAccess<Pixel = Label> + ?Sized,
{
    let bbox = blob.bbox;
    (bbox.y..bbox.bottom())
        .flat_map(|y| (bbox.x..bbox.right()).map(move |x| Point2i::new(x, y)))
        .find(|p| {
            labels.get(p.x, p.y) == blob.label && is_boundary_foreground(binary.get(p.x, p.y))
        })
}
