// tests/test_fast.rs — Integration tests for segment-test keypoints and
// descriptor matching.
//
// With the score defined as the smallest difference over all 16 circle
// samples, the corner of a solid rectangle scores 0 (some samples equal the
// center). Isolated peaks are what this detector reports, so the patterns
// below are dot grids.

use graycv::features::fast::{fast_corner, FastDetector, FastOptions, RADIUS};
use graycv::features::matching::{BruteForceMatcher, DescriptorMatcher};
use graycv::features::{Keypoint, Match};
use graycv::{Image, PixelAccess, PixelAccessMut};

/// Dots of `fg` on `bg`, spaced `step` pixels apart starting at `first`.
fn dot_grid(size: u32, first: i32, step: i32, bg: u8, fg: u8) -> (Image<u8>, Vec<(i32, i32)>) {
    let mut img = Image::from_vec(size, size, vec![bg; (size * size) as usize]).unwrap();
    let mut dots = Vec::new();
    let mut y = first;
    while y < size as i32 - RADIUS as i32 {
        let mut x = first;
        while x < size as i32 - RADIUS as i32 {
            img.set(x, y, fg);
            dots.push((x, y));
            x += step;
        }
        y += step;
    }
    (img, dots)
}

fn run(img: &Image<u8>, capacity: usize, threshold: u8) -> Vec<Keypoint> {
    let mut scores: Image<u8> = Image::new(img.width(), img.height());
    let mut keypoints = vec![Keypoint::default(); capacity];
    let n = fast_corner(img, &mut scores, &mut keypoints, capacity, threshold).unwrap();
    keypoints.truncate(n);
    keypoints
}

#[test]
fn test_flat_images_yield_nothing() {
    for value in [0u8, 1, 77, 128, 254, 255] {
        let img = Image::from_vec(40, 30, vec![value; 1200]).unwrap();
        for threshold in [0u8, 5, 40, 255] {
            assert!(run(&img, 64, threshold).is_empty());
        }
    }
}

#[test]
fn test_dot_grid_detected_in_raster_order() {
    let (img, dots) = dot_grid(64, 6, 8, 40, 220);
    let keypoints = run(&img, 256, 30);
    assert_eq!(keypoints.len(), dots.len());
    for (kp, &(x, y)) in keypoints.iter().zip(dots.iter()) {
        assert_eq!((kp.x, kp.y), (x as f32, y as f32));
        assert_eq!(kp.response, 180.0);
    }
}

#[test]
fn test_truncation_keeps_prefix() {
    let (img, dots) = dot_grid(64, 6, 8, 40, 220);
    let all = run(&img, 256, 30);
    let few = run(&img, 5, 30);
    assert_eq!(few.len(), 5);
    assert!(dots.len() > 5);
    assert_eq!(&all[..5], &few[..]);
}

#[test]
fn test_dark_dots_and_threshold() {
    let (img, dots) = dot_grid(48, 5, 9, 200, 150);
    // A difference of 50 must exceed the threshold.
    assert_eq!(run(&img, 128, 49).len(), dots.len());
    assert!(run(&img, 128, 50).is_empty());
}

#[test]
fn test_detector_wrapper() {
    let (img, _) = dot_grid(64, 6, 8, 40, 220);
    let detector = FastDetector::new(FastOptions {
        threshold: 30,
        max_keypoints: 3,
    });
    let keypoints = detector.detect_to_vec(&img).unwrap();
    assert_eq!(keypoints.len(), 3);
    assert_eq!(keypoints, run(&img, 3, 30));
}

#[test]
fn test_match_detected_keypoints() {
    let (img, _) = dot_grid(32, 6, 8, 40, 220);
    let mut query = run(&img, 16, 30);
    let mut train = query.clone();
    train.reverse();

    // Stand-in descriptors derived from the position.
    for kp in query.iter_mut().chain(train.iter_mut()) {
        kp.descriptor[0] = kp.x as u8;
        kp.descriptor[1] = kp.y as u8;
    }

    let mut matches = vec![Match::default(); query.len()];
    let n = BruteForceMatcher::new(0)
        .match_keypoints(&query, &train, &mut matches)
        .unwrap();
    assert_eq!(n, query.len());
    for m in &matches[..n] {
        assert_eq!(m.distance, 0);
        assert_eq!(m.train, train.len() - 1 - m.query);
    }
}
