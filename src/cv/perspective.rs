// src/cv/perspective.rs

use crate::image::{ensure_valid, PixelAccess, PixelAccessMut};
use crate::{Point2f, Result};

/// Bilinear sample of `src` at a position already clamped into the image.
#[inline]
fn sample_bilinear<S>(src: &S, x: f64, y: f64) -> f64
where
    S: PixelAccess<Pixel = u8> + ?Sized,
{
    let width = src.width() as usize;
    let height = src.height() as usize;

    let sx1 = x as usize;
    let sx2 = if sx1 >= width - 1 { width - 1 } else { sx1 + 1 };
    let dx1 = x - sx1 as f64;
    let dx2 = 1.0 - dx1;

    let sy1 = y as usize;
    let sy2 = if sy1 >= height - 1 { height - 1 } else { sy1 + 1 };
    let dy1 = y - sy1 as f64;
    let dy2 = 1.0 - dy1;

    // SAFETY: x and y were clamped into [0, width-1] x [0, height-1] by the
    // caller and the buffer was validated, so all four taps are in range.
    let (p11, p21, p12, p22) = unsafe {
        (
            src.get_unchecked(sx1, sy1) as f64,
            src.get_unchecked(sx2, sy1) as f64,
            src.get_unchecked(sx1, sy2) as f64,
            src.get_unchecked(sx2, sy2) as f64,
        )
    };

    dy2 * (dx2 * p11 + dx1 * p21) + dy1 * (dx2 * p12 + dx1 * p22)
}

/// Normalized coordinate of `i` across an extent of `n` pixels.
#[inline]
fn normalized(i: usize, n: usize) -> f64 {
    if n > 1 {
        i as f64 / (n - 1) as f64
    } else {
        0.0
    }
}

/// Resamples the quadrilateral `corners` of `src` onto the full extent of
/// `dst`.
///
/// Each destination pixel `(x, y)` maps to `u = x / (w-1)`, `v = y / (h-1)`.
/// The sample position is found by interpolating along the top and bottom
/// edges at `u` and then between those two points at `v`. It is clamped into
/// the source, and the intensity is a bilinear blend of the four surrounding
/// source pixels, rounded to the nearest integer.
///
/// # Arguments
/// * `dst` - Output patch; any non-zero size.
/// * `src` - Source image.
/// * `corners` - `[top-left, top-right, bottom-right, bottom-left]` in
///   source pixel coordinates.
pub fn perspective_correct<D, S>(dst: &mut D, src: &S, corners: &[Point2f; 4]) -> Result<()>
where
    D: PixelAccessMut<Pixel = u8> + ?Sized,
    S: PixelAccess<Pixel = u8> + ?Sized,
{
    ensure_valid(src, "rectification source buffer is invalid")?;
    ensure_valid(&*dst, "rectification destination buffer is invalid")?;

    let [tl, tr, br, bl] = corners.map(|p| (p.x as f64, p.y as f64));
    let max_x = (src.width() - 1) as f64;
    let max_y = (src.height() - 1) as f64;

    let dst_w = dst.width() as usize;
    let dst_h = dst.height() as usize;
    let out = dst.data_mut();

    for y in 0..dst_h {
        let v = normalized(y, dst_h);
        let row = y * dst_w;
        for x in 0..dst_w {
            let u = normalized(x, dst_w);

            let top = (tl.0 + (tr.0 - tl.0) * u, tl.1 + (tr.1 - tl.1) * u);
            let bottom = (bl.0 + (br.0 - bl.0) * u, bl.1 + (br.1 - bl.1) * u);
            let sx = (top.0 + (bottom.0 - top.0) * v).clamp(0.0, max_x);
            let sy = (top.1 + (bottom.1 - top.1) * v).clamp(0.0, max_y);

            let value = sample_bilinear(src, sx, sy);
            out[row + x] = (value + 0.5).floor().clamp(0.0, 255.0) as u8;
        }
    }
    Ok(())
}
