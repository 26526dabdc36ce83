// tests/test_integral.rs — Integration tests for integral-image statistics.

use graycv::cv::integral::{
    adaptive_threshold, box_blur, compute_integral, compute_squared_integral, region_mean,
    region_sum, region_variance,
};
use graycv::{Image, ImageBuffer, PixelAccess};

include!("data/sample_8x8.rs");

const SAMPLE_4X4: [u8; 16] = [
    3, 250, 17, 0, //
    99, 1, 128, 64, //
    255, 255, 7, 42, //
    8, 200, 33, 90,
];

fn tables(data: &[u8], w: u32, h: u32) -> (Image<u32>, Image<u64>) {
    let src = ImageBuffer::new(data, w, h);
    let mut sum = Image::new(w, h);
    let mut squared = Image::new(w, h);
    compute_integral(&src, &mut sum).unwrap();
    compute_squared_integral(&src, &mut squared).unwrap();
    (sum, squared)
}

fn brute_sum(data: &[u8], stride: usize, x: usize, y: usize, w: usize, h: usize) -> u64 {
    (y..y + h)
        .flat_map(|yy| (x..x + w).map(move |xx| data[yy * stride + xx] as u64))
        .sum()
}

#[test]
fn test_whole_image_sum_matches_brute_force() {
    let (sum, _) = tables(&SAMPLE_4X4, 4, 4);
    let expected: u64 = SAMPLE_4X4.iter().map(|&v| v as u64).sum();
    assert_eq!(region_sum(&sum, 0, 0, 4, 4), expected);

    let (sum, _) = tables(&SAMPLE_8X8_GRAY, 8, 8);
    let expected: u64 = SAMPLE_8X8_GRAY.iter().map(|&v| v as u64).sum();
    assert_eq!(region_sum(&sum, 0, 0, 8, 8), expected);
}

#[test]
fn test_every_rectangle_matches_brute_force() {
    let (sum, _) = tables(&SAMPLE_8X8_GRAY, 8, 8);
    for y in 0..8usize {
        for x in 0..8usize {
            for h in 1..=8 - y {
                for w in 1..=8 - x {
                    assert_eq!(
                        region_sum(&sum, x as i32, y as i32, w as u32, h as u32),
                        brute_sum(&SAMPLE_8X8_GRAY, 8, x, y, w, h),
                        "rect ({}, {}, {}, {})",
                        x,
                        y,
                        w,
                        h
                    );
                }
            }
        }
    }
}

#[test]
fn test_adjacent_rectangles_tile_consistently() {
    let (sum, _) = tables(&SAMPLE_8X8_GRAY, 8, 8);

    // Horizontal split of (1, 2, 6, 5) at x = 4.
    let whole = region_sum(&sum, 1, 2, 6, 5);
    let left = region_sum(&sum, 1, 2, 3, 5);
    let right = region_sum(&sum, 4, 2, 3, 5);
    assert_eq!(left + right, whole);

    // Vertical split of the same rectangle at y = 3.
    let top = region_sum(&sum, 1, 2, 6, 1);
    let bottom = region_sum(&sum, 1, 3, 6, 4);
    assert_eq!(top + bottom, whole);

    // Means combine weighted by area.
    let whole_mean = region_mean(&sum, 1, 2, 6, 5);
    let left_mean = region_mean(&sum, 1, 2, 3, 5);
    let right_mean = region_mean(&sum, 4, 2, 3, 5);
    assert!((whole_mean - (left_mean * 15.0 + right_mean * 15.0) / 30.0).abs() < 1e-9);
    let top_mean = region_mean(&sum, 1, 2, 6, 1);
    let bottom_mean = region_mean(&sum, 1, 3, 6, 4);
    assert!((whole_mean - (top_mean * 6.0 + bottom_mean * 24.0) / 30.0).abs() < 1e-9);
}

#[test]
fn test_variance_matches_brute_force() {
    let (sum, squared) = tables(&SAMPLE_4X4, 4, 4);
    let n = SAMPLE_4X4.len() as f64;
    let mean = SAMPLE_4X4.iter().map(|&v| v as f64).sum::<f64>() / n;
    let var = SAMPLE_4X4
        .iter()
        .map(|&v| (v as f64 - mean).powi(2))
        .sum::<f64>()
        / n;
    assert!((region_variance(&sum, &squared, 0, 0, 4, 4) - var).abs() < 1e-6);
    assert_eq!(region_variance(&sum, &squared, 0, 0, 0, 4), 0.0);
}

#[test]
fn test_degenerate_queries() {
    let (sum, _) = tables(&SAMPLE_4X4, 4, 4);
    assert_eq!(region_sum(&sum, 1, 1, 0, 2), 0);
    assert_eq!(region_mean(&sum, 1, 1, 2, 0), 0.0);
}

#[test]
fn test_blur_and_adaptive_threshold_on_sample() {
    let src = ImageBuffer::new(&SAMPLE_8X8_GRAY, 8, 8);
    let mut integral: Image<u32> = Image::new(8, 8);

    let mut blurred: Image<u8> = Image::new(8, 8);
    box_blur(&src, &mut integral, &mut blurred, 0).unwrap();
    assert_eq!(blurred.data(), &SAMPLE_8X8_GRAY[..]);

    box_blur(&src, &mut integral, &mut blurred, 1).unwrap();
    // Centre of the bright square: its full 3x3 window.
    let expected = brute_sum(&SAMPLE_8X8_GRAY, 8, 2, 2, 3, 3) / 9;
    assert_eq!(blurred.get(3, 3) as u64, expected);

    let mut binary: Image<u8> = Image::new(8, 8);
    adaptive_threshold(&src, &mut integral, &mut binary, 2, 5).unwrap();
    assert!(binary.data().iter().all(|&v| v == 0 || v == 255));
    // The dim pixel beside the bright square falls below its local mean.
    assert_eq!(binary.get(1, 3), 0);
    assert_eq!(binary.get(4, 4), 255);
}

#[test]
fn test_dimension_mismatch_is_rejected() {
    let src = ImageBuffer::new(&SAMPLE_8X8_GRAY, 8, 8);
    let mut small: Image<u32> = Image::new(8, 4);
    assert!(compute_integral(&src, &mut small).is_err());
    let mut small_sq: Image<u64> = Image::new(4, 8);
    assert!(compute_squared_integral(&src, &mut small_sq).is_err());
}
