// src/features/matching.rs

use log::debug;

use crate::features::{Descriptor, Keypoint, Match};
use crate::{Result, VisionError};

/// Pairs query keypoints with train keypoints by descriptor distance.
pub trait DescriptorMatcher {
    /// Writes at most `matches.len()` correspondences and returns how many
    /// were written. Running out of room is not an error.
    fn match_keypoints(
        &self,
        query: &[Keypoint],
        train: &[Keypoint],
        matches: &mut [Match],
    ) -> Result<usize>;
}

/// Number of differing bits between two descriptors.
#[inline]
pub fn hamming_distance(a: &Descriptor, b: &Descriptor) -> u32 {
    a.iter().zip(b.iter()).map(|(x, y)| (x ^ y).count_ones()).sum()
}

/// Exhaustive nearest-neighbour matcher.
///
/// For every query keypoint, in order, the closest train keypoint is
/// reported if its distance is at most `max_distance`. Among equally close
/// train keypoints the lowest index wins.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BruteForceMatcher {
    pub max_distance: u32,
}

impl Default for BruteForceMatcher {
    fn default() -> Self {
        BruteForceMatcher { max_distance: 64 }
    }
}

impl BruteForceMatcher {
    pub fn new(max_distance: u32) -> Self {
        BruteForceMatcher { max_distance }
    }

    fn nearest(&self, descriptor: &Descriptor, train: &[Keypoint]) -> Option<(usize, u32)> {
        let mut best: Option<(usize, u32)> = None;
        for (i, candidate) in train.iter().enumerate() {
            let d = hamming_distance(descriptor, &candidate.descriptor);
            if d > self.max_distance {
                continue;
            }
            if best.map_or(true, |(_, best_d)| d < best_d) {
                best = Some((i, d));
            }
        }
        best
    }
}

impl DescriptorMatcher for BruteForceMatcher {
    fn match_keypoints(
        &self,
        query: &[Keypoint],
        train: &[Keypoint],
        matches: &mut [Match],
    ) -> Result<usize> {
        if matches.is_empty() {
            return Err(VisionError::InvalidArgument("match array has no capacity"));
        }

        let mut count = 0;
        for (q, keypoint) in query.iter().enumerate() {
            if count == matches.len() {
                break;
            }
            if let Some((t, distance)) = self.nearest(&keypoint.descriptor, train) {
                matches[count] = Match {
                    query: q,
                    train: t,
                    distance,
                };
                count += 1;
            }
        }

        debug!(
            "brute force matching: {} query, {} train, {} matches",
            query.len(),
            train.len(),
            count
        );
        Ok(count)
    }
}
