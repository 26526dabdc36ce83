// Copyright (c) 2026 graycv contributors
//
// This software is released under the MIT License.
// https://opensource.org/licenses/MIT
// See the LICENSE file at the repository root.
// src/features/mod.rs

//! Keypoint detection and descriptor matching.

pub mod fast;
pub mod matching;

/// Length of a binary descriptor in bytes (256 bits).
pub const DESCRIPTOR_BYTES: usize = 32;

/// Opaque binary descriptor. Detection leaves it zeroed.
pub type Descriptor = [u8; DESCRIPTOR_BYTES];

/// A detected interest point.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Keypoint {
    pub x: f32,
    pub y: f32,
    /// Corner strength; higher is stronger.
    pub response: f32,
    /// Orientation in radians. Not computed by the detector.
    pub angle: f32,
    pub descriptor: Descriptor,
}

impl Keypoint {
    pub fn new(x: f32, y: f32, response: f32) -> Self {
        Keypoint {
            x,
            y,
            response,
            ..Keypoint::default()
        }
    }
}

/// Correspondence between a query and a train keypoint.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Match {
    /// Index into the query keypoints.
    pub query: usize,
    /// Index into the train keypoints.
    pub train: usize,
    /// Hamming distance between the two descriptors.
    pub distance: u32,
}
