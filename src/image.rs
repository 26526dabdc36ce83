// src/image.rs

//! Pixel-buffer access contract.
//!
//! Algorithms in this crate never own image storage. They read through
//! [`PixelAccess`] and write through [`PixelAccessMut`], which are
//! implemented by a borrowed read view ([`ImageBuffer`]), a borrowed write
//! view ([`ImageBufferMut`]) and an owned, `Vec`-backed [`Image`]. A fixed
//! array on the stack works just as well as a heap buffer:
//!
//! ```
//! use graycv::{ImageBufferMut, PixelAccess, PixelAccessMut};
//!
//! let mut storage = [0u8; 16];
//! let mut view = ImageBufferMut::new(&mut storage, 4, 4);
//! view.set(1, 2, 200);
//! assert_eq!(view.get(1, 2), 200);
//! assert_eq!(view.get(-1, 2), 0);
//! ```

use crate::{Result, VisionError};

/// Read access to a row-major grid of pixels.
pub trait PixelAccess {
    /// Stored cell type (`u8` intensities, `u32` labels, integral sums...).
    type Pixel: Copy + Default;

    /// Logical width in pixels.
    fn width(&self) -> u32;

    /// Logical height in pixels.
    fn height(&self) -> u32;

    /// Raw row-major backing storage, for bulk passes.
    fn data(&self) -> &[Self::Pixel];

    /// Number of addressable pixels (`width * height`).
    #[inline]
    fn pixel_count(&self) -> usize {
        self.width() as usize * self.height() as usize
    }

    /// A buffer is valid iff both dimensions are non-zero and the backing
    /// storage holds at least `width * height` cells.
    fn is_valid(&self) -> bool {
        self.width() != 0 && self.height() != 0 && self.data().len() >= self.pixel_count()
    }

    #[inline]
    fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as u32) < self.width() && (y as u32) < self.height()
    }

    /// Bounds-checked read. Out-of-bounds coordinates yield the default
    /// value (0 for every numeric pixel type).
    #[inline]
    fn get(&self, x: i32, y: i32) -> Self::Pixel {
        if self.in_bounds(x, y) {
            self.data()
                .get(y as usize * self.width() as usize + x as usize)
                .copied()
                .unwrap_or_default()
        } else {
            Self::Pixel::default()
        }
    }

    /// Unchecked read for inner loops whose bounds are established by the
    /// surrounding iteration.
    ///
    /// # Safety
    /// `x < width`, `y < height` and the buffer must be valid.
    #[inline]
    unsafe fn get_unchecked(&self, x: usize, y: usize) -> Self::Pixel {
        *self.data().get_unchecked(y * self.width() as usize + x)
    }

    fn same_dimensions<O: PixelAccess + ?Sized>(&self, other: &O) -> bool {
        self.width() == other.width() && self.height() == other.height()
    }
}

/// Write access on top of [`PixelAccess`].
pub trait PixelAccessMut: PixelAccess {
    fn data_mut(&mut self) -> &mut [Self::Pixel];

    /// Bounds-checked write. Out-of-bounds coordinates are a no-op.
    #[inline]
    fn set(&mut self, x: i32, y: i32, value: Self::Pixel) {
        if self.in_bounds(x, y) {
            let idx = y as usize * self.width() as usize + x as usize;
            if let Some(cell) = self.data_mut().get_mut(idx) {
                *cell = value;
            }
        }
    }

    /// Fills the addressable `width * height` prefix with `value`.
    fn fill(&mut self, value: Self::Pixel) {
        let n = self.pixel_count();
        let data = self.data_mut();
        let n = n.min(data.len());
        data[..n].fill(value);
    }
}

/// Borrowed, read-only view over caller memory.
///
/// # Fields
/// * `data` - A slice representing a 1D contiguous row-major array.
/// * `width` - The logical width of the frame in pixels.
/// * `height` - The logical height of the frame in pixels.
#[derive(Debug, Clone, Copy)]
pub struct ImageBuffer<'a, T = u8> {
    pub data: &'a [T],
    pub width: u32,
    pub height: u32,
}

impl<'a, T> ImageBuffer<'a, T> {
    pub fn new(data: &'a [T], width: u32, height: u32) -> Self {
        ImageBuffer {
            data,
            width,
            height,
        }
    }
}

impl<T: Copy + Default> PixelAccess for ImageBuffer<'_, T> {
    type Pixel = T;

    #[inline]
    fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    fn data(&self) -> &[T] {
        self.data
    }
}

/// Borrowed, writable view over caller memory.
#[derive(Debug)]
pub struct ImageBufferMut<'a, T = u8> {
    pub data: &'a mut [T],
    pub width: u32,
    pub height: u32,
}

impl<'a, T> ImageBufferMut<'a, T> {
    pub fn new(data: &'a mut [T], width: u32, height: u32) -> Self {
        ImageBufferMut {
            data,
            width,
            height,
        }
    }

    /// Reborrows as a read-only view.
    pub fn as_view(&self) -> ImageBuffer<'_, T> {
        ImageBuffer {
            data: &*self.data,
            width: self.width,
            height: self.height,
        }
    }
}

impl<T: Copy + Default> PixelAccess for ImageBufferMut<'_, T> {
    type Pixel = T;

    #[inline]
    fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    fn data(&self) -> &[T] {
        &*self.data
    }
}

impl<T: Copy + Default> PixelAccessMut for ImageBufferMut<'_, T> {
    #[inline]
    fn data_mut(&mut self) -> &mut [T] {
        &mut *self.data
    }
}

/// Owned image backed by a `Vec`. The only storage in the crate that
/// allocates; everything else borrows.
#[derive(Debug, Clone, PartialEq)]
pub struct Image<T = u8> {
    data: Vec<T>,
    width: u32,
    height: u32,
}

impl<T: Copy + Default> Image<T> {
    /// Zero-initialized (default-initialized) image.
    pub fn new(width: u32, height: u32) -> Self {
        Image {
            data: vec![T::default(); width as usize * height as usize],
            width,
            height,
        }
    }

    /// Wraps an existing row-major vector.
    ///
    /// Fails when `data` is shorter than `width * height` or a dimension is 0.
    pub fn from_vec(width: u32, height: u32, data: Vec<T>) -> Result<Self> {
        let image = Image {
            data,
            width,
            height,
        };
        ensure_valid(&image, "image storage does not cover width * height")?;
        Ok(image)
    }

    pub fn view(&self) -> ImageBuffer<'_, T> {
        ImageBuffer::new(&self.data, self.width, self.height)
    }

    pub fn view_mut(&mut self) -> ImageBufferMut<'_, T> {
        ImageBufferMut::new(&mut self.data, self.width, self.height)
    }

    pub fn into_vec(self) -> Vec<T> {
        self.data
    }
}

impl<T: Copy + Default> PixelAccess for Image<T> {
    type Pixel = T;

    #[inline]
    fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    fn data(&self) -> &[T] {
        &self.data
    }
}

impl<T: Copy + Default> PixelAccessMut for Image<T> {
    #[inline]
    fn data_mut(&mut self) -> &mut [T] {
        &mut self.data
    }
}

pub(crate) fn ensure_valid<P: PixelAccess + ?Sized>(image: &P, reason: &'static str) -> Result<()> {
    if image.is_valid() {
        Ok(())
    } else {
        Err(VisionError::InvalidArgument(reason))
    }
}

pub(crate) fn ensure_same_dimensions<A, B>(a: &A, b: &B, reason: &'static str) -> Result<()>
where
    A: PixelAccess + ?Sized,
    B: PixelAccess + ?Sized,
{
    if a.same_dimensions(b) {
        Ok(())
    } else {
        Err(VisionError::InvalidArgument(reason))
    }
}
