//! Synthetic raster generators.
//!
//! Every generator returns a row-major `Vec` so it can back an in-memory
//! raster of the same width and height.

/// Pixel value `(col + row) % 256`.
///
/// # Example
///
/// ```
/// use test_utils::gradient_u8;
///
/// let grid = gradient_u8(4, 3);
/// assert_eq!(grid.len(), 12);
/// assert_eq!(grid[5], 2); // col=1, row=1
/// ```
pub fn gradient_u8(width: usize, height: usize) -> Vec<u8> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            data.push(((col + row) % 256) as u8);
        }
    }
    data
}

/// Alternating `a`/`b` squares of `cell` pixels.
pub fn checkerboard_u8(width: usize, height: usize, cell: usize, a: u8, b: u8) -> Vec<u8> {
    let cell = cell.max(1);
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            let even = (row / cell + col / cell) % 2 == 0;
            data.push(if even { a } else { b });
        }
    }
    data
}

/// Pixel value `col * 1000 + row`, handy for checking reads land where expected.
pub fn coded_u32(width: usize, height: usize) -> Vec<u32> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            data.push((col * 1000 + row) as u32);
        }
    }
    data
}

/// Elevation-like 16-bit values rising from west to east.
pub fn ramp_u16(width: usize, height: usize) -> Vec<u16> {
    let mut data = Vec::with_capacity(width * height);
    for _row in 0..height {
        for col in 0..width {
            data.push((1 + col * 65000 / width.max(1)) as u16);
        }
    }
    data
}
