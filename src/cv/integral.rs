// src/cv/integral.rs

//! Summed-area tables.
//!
//! Cell `(x, y)` of an integral image holds the sum of every source pixel in
//! the inclusive rectangle `(0, 0)..=(x, y)`. Once built in a single raster
//! pass, any rectangular sum costs four lookups. A second table over squared
//! intensities gives O(1) variance.
//!
//! Tables accumulate with wrapping arithmetic. A frame's grand total may
//! exceed the cell type, but inclusion-exclusion carried out in the same
//! width is exact for every region whose own sum fits.

use crate::image::{ensure_same_dimensions, ensure_valid, PixelAccess, PixelAccessMut};
use crate::Result;

/// Cell type of a summed-area table.
pub trait IntegralValue: Copy + Default + Into<u64> {
    fn wrapping_add(self, rhs: Self) -> Self;
    fn wrapping_sub(self, rhs: Self) -> Self;
}

macro_rules! impl_integral_value {
    ($($t:ty),*) => {$(
        impl IntegralValue for $t {
            #[inline]
            fn wrapping_add(self, rhs: Self) -> Self {
                <$t>::wrapping_add(self, rhs)
            }

            #[inline]
            fn wrapping_sub(self, rhs: Self) -> Self {
                <$t>::wrapping_sub(self, rhs)
            }
        }
    )*};
}

impl_integral_value!(u32, u64);

/// Builds the inclusive prefix-sum table of `src` into `out`.
///
/// # Arguments
/// * `src` - Source intensities.
/// * `out` - Destination table; must have the same dimensions as `src`.
pub fn compute_integral<S, D>(src: &S, out: &mut D) -> Result<()>
where
    S: PixelAccess<Pixel = u8> + ?Sized,
    D: PixelAccessMut<Pixel = u32> + ?Sized,
{
    accumulate(src, out, |p| p as u32)
}

/// Builds the inclusive prefix-sum table of squared intensities.
pub fn compute_squared_integral<S, D>(src: &S, out: &mut D) -> Result<()>
where
    S: PixelAccess<Pixel = u8> + ?Sized,
    D: PixelAccessMut<Pixel = u64> + ?Sized,
{
    accumulate(src, out, |p| (p as u64) * (p as u64))
}

/// `I[x, y] = I[x, y - 1] + rowSum(0..=x)`, one row-major pass.
fn accumulate<S, D, T, F>(src: &S, out: &mut D, map: F) -> Result<()>
where
    S: PixelAccess<Pixel = u8> + ?Sized,
    D: PixelAccessMut<Pixel = T> + ?Sized,
    T: IntegralValue,
    F: Fn(u8) -> T,
{
    ensure_valid(src, "integral source buffer is invalid")?;
    ensure_valid(&*out, "integral output buffer is invalid")?;
    ensure_same_dimensions(src, &*out, "integral image dimensions must equal the source's")?;

    let width = src.width() as usize;
    let height = src.height() as usize;
    let src_data = &src.data()[..width * height];
    let dst = &mut out.data_mut()[..width * height];

    for y in 0..height {
        let row = y * width;
        let mut row_sum = T::default();
        for x in 0..width {
            row_sum = row_sum.wrapping_add(map(src_data[row + x]));
            dst[row + x] = if y == 0 {
                row_sum
            } else {
                dst[row - width + x].wrapping_add(row_sum)
            };
        }
    }
    Ok(())
}

/// Raw table lookup. Coordinates outside the table read as 0, which is
/// exactly the value of the implicit padding row/column above and left of
/// the image; the corner formula relies on it.
#[inline]
pub fn integral_at<I>(integral: &I, x: i32, y: i32) -> u64
where
    I: PixelAccess + ?Sized,
    I::Pixel: Into<u64>,
{
    integral.get(x, y).into()
}

/// Sum of the source pixels inside the `w` x `h` rectangle at `(x, y)`.
///
/// Inclusion–exclusion over the four corners: `D + A - B - C`, where `A`,
/// `B` and `C` sit just outside the region (diagonally above-left, above,
/// left). An empty rectangle sums to 0. The rectangle is expected to lie
/// inside the image; clip it first with [`crate::Rect::clamp_to`]. The
/// result is exact whenever the region's sum fits the table's cell type.
pub fn region_sum<I>(integral: &I, x: i32, y: i32, w: u32, h: u32) -> u64
where
    I: PixelAccess + ?Sized,
    I::Pixel: IntegralValue,
{
    if w == 0 || h == 0 {
        return 0;
    }
    let x1 = last_index(x, w);
    let y1 = last_index(y, h);
    let x0 = x.saturating_sub(1);
    let y0 = y.saturating_sub(1);

    let d = integral.get(x1, y1);
    let a = integral.get(x0, y0);
    let b = integral.get(x1, y0);
    let c = integral.get(x0, y1);

    d.wrapping_add(a).wrapping_sub(b).wrapping_sub(c).into()
}

/// `start + len - 1`, saturated to the `i32` range.
#[inline]
fn last_index(start: i32, len: u32) -> i32 {
    (start as i64 + len as i64 - 1).clamp(i32::MIN as i64, i32::MAX as i64) as i32
}

/// Mean intensity of a rectangle; 0 for an empty one.
pub fn region_mean<I>(integral: &I, x: i32, y: i32, w: u32, h: u32) -> f64
where
    I: PixelAccess + ?Sized,
    I::Pixel: IntegralValue,
{
    let area = w as u64 * h as u64;
    if area == 0 {
        return 0.0;
    }
    region_sum(integral, x, y, w, h) as f64 / area as f64
}

/// Population variance `E[X²] - E[X]²` of a rectangle; 0 for an empty one.
pub fn region_variance<I, Q>(integral: &I, squared: &Q, x: i32, y: i32, w: u32, h: u32) -> f64
where
    I: PixelAccess + ?Sized,
    I::Pixel: IntegralValue,
    Q: PixelAccess + ?Sized,
    Q::Pixel: IntegralValue,
{
    let area = w as u64 * h as u64;
    if area == 0 {
        return 0.0;
    }
    let n = area as f64;
    let mean = region_sum(integral, x, y, w, h) as f64 / n;
    let mean_sq = region_sum(squared, x, y, w, h) as f64 / n;
    (mean_sq - mean * mean).max(0.0)
}

/// Window `[c - radius, c + radius]` clamped to `[0, len)`. Returns the
/// first index and the window length.
#[inline]
fn clamped_window(center: usize, radius: u32, len: usize) -> (i32, u32) {
    let start = center.saturating_sub(radius as usize);
    let end = (center + radius as usize).min(len - 1);
    (start as i32, (end - start + 1) as u32)
}

/// Replaces every pixel with the truncated mean of its `(2r+1)²` window,
/// the window being clipped at the image edges.
///
/// # Arguments
/// * `src` - Source intensities.
/// * `integral` - Scratch table, filled by this call. Same dimensions as `src`.
/// * `dst` - Output, same dimensions as `src`.
/// * `radius` - Window half-size.
pub fn box_blur<S, I, D>(src: &S, integral: &mut I, dst: &mut D, radius: u32) -> Result<()>
where
    S: PixelAccess<Pixel = u8> + ?Sized,
    I: PixelAccessMut<Pixel = u32> + ?Sized,
    D: PixelAccessMut<Pixel = u8> + ?Sized,
{
    ensure_valid(&*dst, "box blur output buffer is invalid")?;
    ensure_same_dimensions(src, &*dst, "box blur output must match the source dimensions")?;
    compute_integral(src, &mut *integral)?;

    let width = src.width() as usize;
    let height = src.height() as usize;
    for y in 0..height {
        let (wy, wh) = clamped_window(y, radius, height);
        for x in 0..width {
            let (wx, ww) = clamped_window(x, radius, width);
            let area = ww as u64 * wh as u64;
            let mean = region_sum(&*integral, wx, wy, ww, wh) / area;
            dst.data_mut()[y * width + x] = mean as u8;
        }
    }
    Ok(())
}

/// Binarizes against the local window mean: a pixel becomes 255 when it is
/// brighter than `mean - c`, 0 otherwise.
///
/// # Arguments
/// * `src` - Source intensities.
/// * `integral` - Scratch table, filled by this call. Same dimensions as `src`.
/// * `dst` - Output, same dimensions as `src`.
/// * `radius` - Window half-size; the window is clipped at the edges.
/// * `c` - Bias subtracted from the local mean.
pub fn adaptive_threshold<S, I, D>(
    src: &S,
    integral: &mut I,
    dst: &mut D,
    radius: u32,
    c: i32,
) -> Result<()>
where
    S: PixelAccess<Pixel = u8> + ?Sized,
    I: PixelAccessMut<Pixel = u32> + ?Sized,
    D: PixelAccessMut<Pixel = u8> + ?Sized,
{
    ensure_valid(&*dst, "adaptive threshold output buffer is invalid")?;
    ensure_same_dimensions(src, &*dst, "adaptive threshold output must match the source dimensions")?;
    compute_integral(src, &mut *integral)?;

    let width = src.width() as usize;
    let height = src.height() as usize;
    for y in 0..height {
        let (wy, wh) = clamped_window(y, radius, height);
        for x in 0..width {
            let (wx, ww) = clamped_window(x, radius, width);
            let area = ww as u64 * wh as u64;
            let mean = (region_sum(&*integral, wx, wy, ww, wh) / area) as i32;
            let idx = y * width + x;
            let pixel = src.data()[idx] as i32;
            dst.data_mut()[idx] = if pixel > mean - c { 255 } else { 0 };
        }
    }
    Ok(())
}
