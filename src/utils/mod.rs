//! Internal utility functions for imageops-cutout.
//!
//! This module contains common functionality used across different image operations.

#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Maps a possibly out-of-range coordinate to the nearest valid index.
///
/// This is clamp-to-edge addressing: samples left of the image read column 0,
/// samples right of it read column `len - 1`. `len` must be non-zero.
#[inline]
pub fn clamp_to_edge(coord: i64, len: u32) -> usize {
    coord.clamp(0, i64::from(len) - 1) as usize
}

/// Converts a `[0, 1]` value to the nearest `u8` level, saturating outside the range.
#[inline]
pub fn unit_to_u8(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Converts a `[0, 255]` float to the nearest `u8`, saturating outside the range.
#[inline]
pub fn round_to_u8(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

/// Validates that an image has non-zero dimensions.
///
/// # Arguments
///
/// * `width` - The width of the image
/// * `height` - The height of the image
/// * `context` - A description of the context for error messages
///
/// # Returns
///
/// `Ok(())` if the dimensions are valid, otherwise an error
pub fn validate_non_empty_image(width: u32, height: u32, context: &str) -> Result<(), String> {
    if width == 0 || height == 0 {
        Err(format!("{context}: Image dimensions must be non-zero"))
    } else {
        Ok(())
    }
}

/// Validates that two images have matching dimensions.
///
/// # Returns
///
/// `Ok(())` if the dimensions match, otherwise an error
pub fn validate_matching_dimensions(
    first: (u32, u32),
    second: (u32, u32),
    context: &str,
) -> Result<(), String> {
    if first != second {
        Err(format!(
            "{}: Image dimensions must match. Got {}x{} and {}x{}",
            context, first.0, first.1, second.0, second.1
        ))
    } else {
        Ok(())
    }
}

/// Runs `row_fn(y, row)` for every row of a row-major buffer.
///
/// With the `rayon` feature the rows are processed in parallel. Each row is
/// written by exactly one call, so the result does not depend on scheduling.
pub fn for_each_row<T, F>(buffer: &mut [T], row_len: usize, row_fn: F)
where
    T: Send,
    F: Fn(usize, &mut [T]) + Sync + Send,
{
    if row_len == 0 {
        return;
    }

    #[cfg(feature = "rayon")]
    buffer
        .par_chunks_mut(row_len)
        .enumerate()
        .for_each(|(y, row)| row_fn(y, row));

    #[cfg(not(feature = "rayon"))]
    buffer
        .chunks_mut(row_len)
        .enumerate()
        .for_each(|(y, row)| row_fn(y, row));
}
