// src/cv/labeling.rs

//! Two-pass, 4-connected component labeling with union-find merging.
//!
//! Neither the label buffer, the blob records nor the union-find forest are
//! allocated here: the forest lives inside the caller's blob array, one
//! parent link per provisional label, and is compacted away at the end.

use log::debug;

use crate::cv::geometry::Rect;
use crate::cv::is_foreground;
use crate::image::{ensure_same_dimensions, ensure_valid, PixelAccess, PixelAccessMut};
use crate::{Point2i, Result, VisionError};

/// Region identifier. `BACKGROUND` (0) means "no region".
pub type Label = u32;

pub const BACKGROUND: Label = 0;

/// A labeled connected region.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Blob {
    /// Canonical label, as written into the label buffer.
    pub label: Label,
    /// Pixel count.
    pub area: u32,
    pub bbox: Rect,
    /// Mean pixel coordinate, truncated.
    pub centroid: Point2i,
    // Union-find link and centroid accumulators of the labeling pass.
    #[cfg_attr(feature = "serde", serde(skip))]
    parent: Label,
    #[cfg_attr(feature = "serde", serde(skip))]
    sum_x: u64,
    #[cfg_attr(feature = "serde", serde(skip))]
    sum_y: u64,
}

impl Default for Blob {
    fn default() -> Self {
        Blob {
            label: BACKGROUND,
            area: 0,
            bbox: Rect::default(),
            centroid: Point2i::zeros(),
            parent: BACKGROUND,
            sum_x: 0,
            sum_y: 0,
        }
    }
}

impl Blob {
    /// Empty provisional record. While labeling, the bounding box keeps the
    /// max corner in `width`/`height`.
    fn seed(label: Label, x: usize, y: usize) -> Self {
        Blob {
            label,
            parent: label,
            bbox: Rect::new(x as i32, y as i32, x as u32, y as u32),
            ..Blob::default()
        }
    }

    #[inline]
    fn accumulate(&mut self, x: usize, y: usize) {
        self.area += 1;
        self.sum_x += x as u64;
        self.sum_y += y as u64;
        self.bbox.x = self.bbox.x.min(x as i32);
        self.bbox.y = self.bbox.y.min(y as i32);
        self.bbox.width = self.bbox.width.max(x as u32);
        self.bbox.height = self.bbox.height.max(y as u32);
    }

    fn absorb(&mut self, other: &Blob) {
        self.area += other.area;
        self.sum_x += other.sum_x;
        self.sum_y += other.sum_y;
        self.bbox.x = self.bbox.x.min(other.bbox.x);
        self.bbox.y = self.bbox.y.min(other.bbox.y);
        self.bbox.width = self.bbox.width.max(other.bbox.width);
        self.bbox.height = self.bbox.height.max(other.bbox.height);
    }

    /// Converts the max-corner encoding into a real box and computes the
    /// centroid.
    fn finalize(mut self, label: Label) -> Self {
        let area = self.area as u64;
        self.label = label;
        self.parent = label;
        self.bbox.width = (self.bbox.width as i32 - self.bbox.x + 1) as u32;
        self.bbox.height = (self.bbox.height as i32 - self.bbox.y + 1) as u32;
        self.centroid = Point2i::new((self.sum_x / area) as i32, (self.sum_y / area) as i32);
        self
    }
}

/// A node that stores its union-find parent.
pub trait ParentLink {
    fn parent(&self) -> Label;
    fn set_parent(&mut self, parent: Label);
}

impl ParentLink for Label {
    #[inline]
    fn parent(&self) -> Label {
        *self
    }

    #[inline]
    fn set_parent(&mut self, parent: Label) {
        *self = parent;
    }
}

impl ParentLink for Blob {
    #[inline]
    fn parent(&self) -> Label {
        self.parent
    }

    #[inline]
    fn set_parent(&mut self, parent: Label) {
        self.parent = parent;
    }
}

/// Disjoint-set forest over a caller-owned node array.
///
/// Label `l` lives at index `l - 1`, so a slice of `n` nodes covers labels
/// `1..=n`. The larger root is always attached under the smaller one, which
/// makes the root of every class its minimum label.
pub struct UnionFind<'a, T: ParentLink> {
    nodes: &'a mut [T],
}

impl<'a, T: ParentLink> UnionFind<'a, T> {
    pub fn new(nodes: &'a mut [T]) -> Self {
        UnionFind { nodes }
    }

    /// Number of labels the forest can hold.
    pub fn capacity(&self) -> usize {
        self.nodes.len()
    }

    /// Makes `label` a singleton class.
    ///
    /// # Panics
    /// Panics if `label` is 0 or exceeds the capacity.
    pub fn make_set(&mut self, label: Label) {
        self.nodes[label as usize - 1].set_parent(label);
    }

    pub fn node(&self, label: Label) -> &T {
        &self.nodes[label as usize - 1]
    }

    pub fn node_mut(&mut self, label: Label) -> &mut T {
        &mut self.nodes[label as usize - 1]
    }

    /// Root of `label`'s class, with path halving: every visited node is
    /// re-linked to its grandparent. `BACKGROUND` resolves to itself.
    pub fn find(&mut self, label: Label) -> Label {
        if label == BACKGROUND {
            return BACKGROUND;
        }
        let mut node = label;
        loop {
            let parent = self.nodes[node as usize - 1].parent();
            if parent == node {
                return node;
            }
            let grandparent = self.nodes[parent as usize - 1].parent();
            self.nodes[node as usize - 1].set_parent(grandparent);
            node = grandparent;
        }
    }

    /// Merges the classes of `a` and `b`, returning the surviving root.
    pub fn union(&mut self, a: Label, b: Label) -> Label {
        let root_a = self.find(a);
        let root_b = self.find(b);
        if root_a == root_b {
            return root_a;
        }
        let (root, child) = if root_a < root_b {
            (root_a, root_b)
        } else {
            (root_b, root_a)
        };
        self.nodes[child as usize - 1].set_parent(root);
        root
    }
}

/// Labels the 4-connected foreground regions of `image`.
///
/// Foreground is `>= BINARY_THRESHOLD`. After the call every pixel of
/// `labels` holds either `BACKGROUND` or the canonical (minimum) label of
/// its region, and `blobs[..count]` describes those regions in increasing
/// label order.
///
/// At most `max_blobs` provisional labels are handed out. Components that
/// start once they are exhausted are dropped: their pixels stay
/// `BACKGROUND` and no error is reported.
///
/// # Arguments
/// * `image` - Source intensities.
/// * `labels` - Label buffer with the same dimensions as `image`.
/// * `blobs` - Output records; at least `max_blobs` long.
/// * `max_blobs` - Label budget, at least 1.
///
/// # Returns
/// The number of blobs written to the front of `blobs`.
pub fn find_blobs<S, L>(
    image: &S,
    labels: &mut L,
    blobs: &mut [Blob],
    max_blobs: usize,
) -> Result<usize>
where
    S: PixelAccess<Pixel = u8> + ?Sized,
    L: PixelAccessMut<Pixel = Label> + ?Sized,
{
    ensure_valid(image, "labeling source buffer is invalid")?;
    ensure_valid(&*labels, "label buffer is invalid")?;
    ensure_same_dimensions(image, &*labels, "label buffer must match the image dimensions")?;
    if max_blobs == 0 {
        return Err(VisionError::InvalidArgument("max_blobs must be at least 1"));
    }
    if blobs.len() < max_blobs {
        return Err(VisionError::InvalidArgument(
            "blob array is smaller than max_blobs",
        ));
    }
    if max_blobs >= Label::MAX as usize {
        return Err(VisionError::InvalidArgument("max_blobs exceeds the label range"));
    }

    let width = image.width() as usize;
    let height = image.height() as usize;
    let n = width * height;
    let pixels = &image.data()[..n];
    let label_data = &mut labels.data_mut()[..n];

    let mut next: Label = 1;
    let mut merges = 0usize;
    let mut dropped_pixels = 0usize;

    {
        let mut forest = UnionFind::new(&mut blobs[..max_blobs]);

        // Pass 1: provisional labels, equivalences and per-label statistics.
        for y in 0..height {
            for x in 0..width {
                let idx = y * width + x;
                if !is_foreground(pixels[idx]) {
                    label_data[idx] = BACKGROUND;
                    continue;
                }

                let left = if x > 0 { label_data[idx - 1] } else { BACKGROUND };
                let top = if y > 0 {
                    label_data[idx - width]
                } else {
                    BACKGROUND
                };

                let label = match (left, top) {
                    (BACKGROUND, BACKGROUND) => {
                        if next as usize > max_blobs {
                            dropped_pixels += 1;
                            label_data[idx] = BACKGROUND;
                            continue;
                        }
                        let fresh = next;
                        next += 1;
                        *forest.node_mut(fresh) = Blob::seed(fresh, x, y);
                        fresh
                    }
                    (l, BACKGROUND) | (BACKGROUND, l) => l,
                    (l, t) if l == t => l,
                    (l, t) => {
                        if forest.find(l) != forest.find(t) {
                            merges += 1;
                            forest.union(l, t);
                        }
                        l.min(t)
                    }
                };

                label_data[idx] = label;
                forest.node_mut(label).accumulate(x, y);
            }
        }

        // Fold every non-root record into its root.
        for label in 1..next {
            let root = forest.find(label);
            if root != label {
                let record = *forest.node(label);
                forest.node_mut(root).absorb(&record);
                forest.node_mut(label).area = 0;
            }
        }

        // Pass 2: canonical labels only.
        for label in label_data.iter_mut() {
            if *label != BACKGROUND {
                *label = forest.find(*label);
            }
        }
    }

    // Compaction into a dense prefix. The write index never overtakes the
    // read index, so this is safe in place.
    let mut count = 0;
    for label in 1..next {
        let record = blobs[label as usize - 1];
        if record.area == 0 {
            continue;
        }
        blobs[count] = record.finalize(label);
        count += 1;
    }

    debug!(
        "find_blobs: {}x{} image, {} provisional labels, {} merges, {} blobs, {} pixels dropped (max_blobs = {})",
        width,
        height,
        next - 1,
        merges,
        count,
        dropped_pixels,
        max_blobs
    );

    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::{Image, ImageBuffer};

    include!("../../tests/data/sample_8x8.rs");

    fn binary(rows: &[&str]) -> Image<u8> {
        let height = rows.len() as u32;
        let width = rows[0].len() as u32;
        let data = rows
            .iter()
            .flat_map(|r| r.bytes().map(|b| if b == b'#' { 255 } else { 0 }))
            .collect();
        Image::from_vec(width, height, data).unwrap()
    }

    fn label_image(image: &Image<u8>, max_blobs: usize) -> (Image<Label>, Vec<Blob>, usize) {
        let mut labels = Image::new(image.width(), image.height());
        let mut blobs = vec![Blob::default(); max_blobs];
        let count = find_blobs(image, &mut labels, &mut blobs, max_blobs).unwrap();
        (labels, blobs, count)
    }

    #[test]
    fn test_single_square() {
        let src = ImageBuffer::new(&SAMPLE_8X8_SQUARE, 8, 8);
        let mut label_storage = [0 as Label; 64];
        let mut labels = crate::image::ImageBufferMut::new(&mut label_storage, 8, 8);
        let mut blobs = [Blob::default(); 4];

        let count = find_blobs(&src, &mut labels, &mut blobs, 4).unwrap();
        assert_eq!(count, 1);
        let blob = blobs[0];
        assert_eq!(blob.label, 1);
        assert_eq!(blob.area, 9);
        assert_eq!(blob.bbox, Rect::new(2, 2, 3, 3));
        assert_eq!(blob.centroid, Point2i::new(3, 3));
        assert_eq!(labels.get(3, 3), 1);
        assert_eq!(labels.get(1, 3), BACKGROUND);
    }

    #[test]
    fn test_u_shape_merges_to_smallest_label() {
        let img = binary(&["#.#", "#.#", "###"]);
        let (labels, blobs, count) = label_image(&img, 8);
        assert_eq!(count, 1);
        assert_eq!(blobs[0].label, 1);
        assert_eq!(blobs[0].area, 7);
        assert_eq!(blobs[0].bbox, Rect::new(0, 0, 3, 3));
        // sum_x = 7, sum_y = 8 over 7 pixels.
        assert_eq!(blobs[0].centroid, Point2i::new(1, 1));
        assert!(labels.data().iter().all(|&l| l == BACKGROUND || l == 1));
        assert_eq!(labels.get(2, 0), 1);
    }

    #[test]
    fn test_comb_chain_merges() {
        let img = binary(&["#.#.#", "#####"]);
        let (labels, blobs, count) = label_image(&img, 8);
        assert_eq!(count, 1);
        assert_eq!(blobs[0].area, 8);
        assert_eq!(labels.get(4, 0), 1);
    }

    #[test]
    fn test_diagonal_pixels_are_separate() {
        let img = binary(&["#..", ".#.", "..#"]);
        let (labels, blobs, count) = label_image(&img, 8);
        assert_eq!(count, 3);
        assert_eq!(blobs[..3].iter().map(|b| b.label).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(labels.get(1, 1), 2);
        assert!(blobs[..3].iter().all(|b| b.area == 1));
    }

    #[test]
    fn test_labels_are_dense_prefix_after_merge() {
        // Labels 1 and 2 merge; label 3 stays separate.
        let img = binary(&["#.#..#", "###..#"]);
        let (labels, blobs, count) = label_image(&img, 8);
        assert_eq!(count, 2);
        assert_eq!(blobs[0].label, 1);
        assert_eq!(blobs[0].area, 5);
        assert_eq!(blobs[1].label, 3);
        assert_eq!(blobs[1].area, 2);
        assert_eq!(blobs[1].bbox, Rect::new(5, 0, 1, 2));
        assert_eq!(labels.get(5, 1), 3);
    }

    #[test]
    fn test_capacity_truncation() {
        let img = binary(&["#.#.#", ".....", "#.#.#"]);
        let (labels, blobs, count) = label_image(&img, 2);
        assert_eq!(count, 2);
        assert_eq!(blobs[0].label, 1);
        assert_eq!(blobs[1].label, 2);
        // Components after the budget is spent are dropped silently.
        assert_eq!(labels.get(4, 0), BACKGROUND);
        assert_eq!(labels.get(0, 2), BACKGROUND);
        let area: u32 = blobs[..count].iter().map(|b| b.area).sum();
        assert_eq!(area, 2);
    }

    #[test]
    fn test_threshold_boundary() {
        let data = [127u8, 0, 128];
        let src = ImageBuffer::new(&data, 3, 1);
        let mut labels: Image<Label> = Image::new(3, 1);
        let mut blobs = [Blob::default(); 2];
        let count = find_blobs(&src, &mut labels, &mut blobs, 2).unwrap();
        assert_eq!(count, 1);
        assert_eq!(blobs[0].bbox, Rect::new(2, 0, 1, 1));
    }

    #[test]
    fn test_preconditions() {
        let src = ImageBuffer::new(&SAMPLE_8X8_SQUARE, 8, 8);
        let mut labels: Image<Label> = Image::new(8, 8);
        let mut blobs = [Blob::default(); 2];

        assert!(find_blobs(&src, &mut labels, &mut blobs, 0).is_err());
        assert!(find_blobs(&src, &mut labels, &mut blobs, 3).is_err());

        let mut small: Image<Label> = Image::new(8, 7);
        assert_eq!(
            find_blobs(&src, &mut small, &mut blobs, 2),
            Err(VisionError::InvalidArgument(
                "label buffer must match the image dimensions"
            ))
        );
    }

    #[test]
    fn test_union_find_canonical_roots() {
        let mut parents = [0 as Label; 6];
        let mut forest = UnionFind::new(&mut parents);
        for l in 1..=6 {
            forest.make_set(l);
        }
        assert_eq!(forest.union(5, 3), 3);
        assert_eq!(forest.union(6, 5), 3);
        assert_eq!(forest.union(2, 6), 2);
        assert_eq!(forest.find(6), 2);
        assert_eq!(forest.find(4), 4);
        assert_eq!(forest.find(BACKGROUND), BACKGROUND);
        for l in 1..=6 {
            let root = forest.find(l);
            assert_eq!(forest.find(root), root);
            assert!(root <= l);
        }
    }
}
