// src/cv/mod.rs

//! Structural analysis core: integral images, connected-component labeling,
//! boundary tracing, corner extraction and perspective rectification.
//!
//! Nothing in this module allocates. Outputs go to caller-supplied buffers.

/// Intensity at which a pixel becomes foreground.
///
/// The labeler treats `>= BINARY_THRESHOLD` as foreground while the contour
/// tracer requires strictly `> BINARY_THRESHOLD`.
pub const BINARY_THRESHOLD: u8 = 128;

/// Foreground test used by the labeler and corner extraction.
#[inline]
pub fn is_foreground(value: u8) -> bool {
    value >= BINARY_THRESHOLD
}

/// Foreground test used by the boundary tracer.
#[inline]
pub fn is_boundary_foreground(value: u8) -> bool {
    value > BINARY_THRESHOLD
}

// Submodules for specific CV algorithms
pub mod contours;
pub mod filters;
pub mod geometry;
pub mod integral;
pub mod labeling;
pub mod perspective;
