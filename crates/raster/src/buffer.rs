//! Row-major pixel buffers.
//!
//! A buffer belongs to exactly one worker and is reused from tile to tile,
//! so [`PixelBuffer::reshape`] keeps the allocation.

use crate::{Pixel, RasterError, Result};

/// A `width x height` block of pixels stored row by row.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelBuffer<T> {
    width: usize,
    height: usize,
    data: Vec<T>,
}

impl<T: Pixel> PixelBuffer<T> {
    /// Allocate a buffer filled with `value`.
    pub fn new(width: usize, height: usize, value: T) -> Self {
        Self {
            width,
            height,
            data: vec![value; width * height],
        }
    }

    /// Wrap existing row-major data.
    pub fn from_vec(width: usize, height: usize, data: Vec<T>) -> Result<Self> {
        if data.len() != width * height {
            return Err(RasterError::BufferSize {
                width,
                height,
                len: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    /// Pixel at column `col`, row `row`.
    pub fn get(&self, col: usize, row: usize) -> Option<T> {
        if col >= self.width || row >= self.height {
            return None;
        }
        Some(self.data[row * self.width + col])
    }

    /// One row of pixels.
    pub fn row(&self, row: usize) -> &[T] {
        let start = row * self.width;
        &self.data[start..start + self.width]
    }

    /// Change the dimensions and fill with `value`, reusing the allocation.
    pub fn reshape(&mut self, width: usize, height: usize, value: T) {
        self.width = width;
        self.height = height;
        self.data.clear();
        self.data.resize(width * height, value);
    }

    pub fn fill(&mut self, value: T) {
        self.data.fill(value);
    }

    /// True when every pixel equals `value`. Empty buffers count as equal.
    pub fn all_equal(&self, value: T) -> bool {
        self.data.iter().all(|&v| v == value)
    }

    /// Same dimensions and same pixels.
    pub fn equals(&self, other: &PixelBuffer<T>) -> bool {
        self == other
    }

    /// Copy `src` into this buffer with its upper-left corner at (`row`, `col`).
    ///
    /// Fails without touching the buffer when the offset is negative or
    /// `src` would not fit.
    pub fn paste(&mut self, src: &PixelBuffer<T>, row: i64, col: i64) -> Result<()> {
        let fits = row >= 0
            && col >= 0
            && (row as usize) + src.height <= self.height
            && (col as usize) + src.width <= self.width;
        if !fits {
            return Err(RasterError::PasteOutOfBounds {
                row,
                col,
                src_width: src.width,
                src_height: src.height,
                dst_width: self.width,
                dst_height: self.height,
            });
        }

        let (row, col) = (row as usize, col as usize);
        for r in 0..src.height {
            let start = (row + r) * self.width + col;
            self.data[start..start + src.width].copy_from_slice(src.row(r));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_and_all_equal() {
        let mut buf = PixelBuffer::new(3, 2, 7u8);
        assert!(buf.all_equal(7));
        buf.as_mut_slice()[4] = 1;
        assert!(!buf.all_equal(7));
        buf.fill(0);
        assert!(buf.all_equal(0));
    }

    #[test]
    fn test_paste_changes_only_region() {
        let mut dst = PixelBuffer::new(5, 4, 0u16);
        let src = PixelBuffer::from_vec(2, 2, vec![1, 2, 3, 4]).unwrap();
        dst.paste(&src, 1, 2).unwrap();

        for row in 0..4 {
            for col in 0..5 {
                let inside = (1..3).contains(&row) && (2..4).contains(&col);
                let v = dst.get(col, row).unwrap();
                if inside {
                    assert_eq!(v, src.get(col - 2, row - 1).unwrap());
                } else {
                    assert_eq!(v, 0, "({}, {}) changed", col, row);
                }
            }
        }
    }

    #[test]
    fn test_paste_rejects_overflow_without_mutating() {
        let mut dst = PixelBuffer::new(4, 4, 9u8);
        let before = dst.clone();
        let src = PixelBuffer::new(2, 2, 1u8);

        assert!(dst.paste(&src, 3, 0).is_err());
        assert!(dst.paste(&src, 0, 3).is_err());
        assert!(dst.paste(&src, -1, 0).is_err());
        assert!(dst.paste(&src, 0, -1).is_err());
        assert!(dst.equals(&before));

        // Exactly flush with the corner is fine.
        dst.paste(&src, 2, 2).unwrap();
        assert_eq!(dst.get(3, 3), Some(1));
    }

    #[test]
    fn test_reshape_reuses() {
        let mut buf = PixelBuffer::new(8, 8, 1u32);
        buf.reshape(2, 3, 5);
        assert_eq!((buf.width(), buf.height()), (2, 3));
        assert_eq!(buf.as_slice(), &[5; 6]);
    }

    #[test]
    fn test_from_vec_length_check() {
        assert!(PixelBuffer::from_vec(2, 2, vec![0u8; 3]).is_err());
    }
}
