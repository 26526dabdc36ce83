// src/cv/filters.rs

use crate::image::{ensure_same_dimensions, ensure_valid, PixelAccess, PixelAccessMut};
use crate::Result;

/// Binarizes `src` into `dst`: values above `level` become 255, the rest 0.
///
/// # Arguments
/// * `src` - Grayscale input.
/// * `dst` - Output of the same dimensions. May not alias `src`.
/// * `level` - Highest intensity still mapped to 0.
pub fn threshold<S, D>(src: &S, dst: &mut D, level: u8) -> Result<()>
where
    S: PixelAccess<Pixel = u8> + ?Sized,
    D: PixelAccessMut<Pixel = u8> + ?Sized,
{
    ensure_valid(src, "threshold source buffer is invalid")?;
    ensure_valid(&*dst, "threshold destination buffer is invalid")?;
    ensure_same_dimensions(src, &*dst, "threshold buffers must have equal dimensions")?;

    let mut tab = [0u8; 256];
    for (i, cell) in tab.iter_mut().enumerate() {
        *cell = if i > level as usize { 255 } else { 0 };
    }

    let n = src.pixel_count();
    let src_data = &src.data()[..n];
    for (out, &v) in dst.data_mut()[..n].iter_mut().zip(src_data) {
        *out = tab[v as usize];
    }
    Ok(())
}

/// Otsu's level: the intensity maximizing between-class variance.
///
/// Pass the result to [`threshold`]. On a tie the lowest level wins.
pub fn otsu<S>(src: &S) -> Result<u8>
where
    S: PixelAccess<Pixel = u8> + ?Sized,
{
    ensure_valid(src, "otsu source buffer is invalid")?;

    let pixels = &src.data()[..src.pixel_count()];
    let mut hist = [0u32; 256];
    for &v in pixels {
        hist[v as usize] += 1;
    }

    let total = pixels.len() as f64;
    let sum: f64 = hist
        .iter()
        .enumerate()
        .map(|(i, &h)| h as f64 * i as f64)
        .sum();

    let mut level = 0u8;
    let mut sum_b = 0.0;
    let mut w_b = 0.0;
    let mut max = 0.0;

    for (i, &h) in hist.iter().enumerate() {
        w_b += h as f64;
        if w_b == 0.0 {
            continue;
        }
        let w_f = total - w_b;
        if w_f == 0.0 {
            break;
        }

        sum_b += h as f64 * i as f64;
        let mu = sum_b / w_b - (sum - sum_b) / w_f;
        let between = w_b * w_f * mu * mu;
        if between > max {
            max = between;
            level = i as u8;
        }
    }

    Ok(level)
}
