// Copyright (c) 2026 graycv contributors
//
// This software is released under the MIT License.
// https://opensource.org/licenses/MIT
// See the LICENSE file at the repository root.
//! Structural analysis of 8-bit grayscale images on caller-owned buffers.
//!
//! The core (`cv`, `features`) never allocates: every output array is
//! supplied by the caller together with its capacity, and every operation
//! returns how much of it was written. `core::scanner` is an optional
//! convenience pipeline on top that does allocate its scratch buffers.
use nalgebra::Vector2;

/// 2D point with floating point precision (f32 for embedded/WASM friendliness)
pub type Point2f = Vector2<f32>;

/// 2D point in pixel coordinates
pub type Point2i = Vector2<i32>;

/// Four quadrilateral corners ordered top-left, top-right, bottom-right, bottom-left.
pub type QuadCorners = [Point2f; 4];

/// Precondition violations reported by the analysis core.
///
/// Capacity exhaustion is deliberately absent: running out of room in an
/// output array truncates the result and is reported through the returned
/// count, not through an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum VisionError {
    /// Invalid or mismatched buffer, or an unusable capacity.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
}

pub type Result<T> = std::result::Result<T, VisionError>;

pub mod core;
pub mod cv;
pub mod features;
pub mod image;

pub use crate::cv::geometry::Rect;
pub use crate::image::{Image, ImageBuffer, ImageBufferMut, PixelAccess, PixelAccessMut};
