//! Grayscale morphology on coverage masks.
//!
//! Dilation takes the maximum and erosion the minimum coverage over a square
//! `(2 * radius + 1)²` window. Out-of-range samples repeat the nearest edge
//! pixel, which is the same as restricting the window to the image. The
//! square window is separable, so each operation is a row pass followed by a
//! column pass; the result is identical to scanning the full window.
//!
//! Every operation writes into a fresh buffer and never mutates its input.

use crate::utils::{clamp_to_edge, for_each_row};
use image::Luma;
use imageproc::definitions::Image;

/// Extremum selected over the window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Extremum {
    Max,
    Min,
}

impl Extremum {
    #[inline]
    fn pick(self, a: u8, b: u8) -> u8 {
        match self {
            Self::Max => a.max(b),
            Self::Min => a.min(b),
        }
    }

    #[inline]
    const fn identity(self) -> u8 {
        match self {
            Self::Max => u8::MIN,
            Self::Min => u8::MAX,
        }
    }
}

/// Trait providing grayscale morphology on single-channel masks
pub trait Morphology {
    /// Maximum coverage over the square window around each pixel
    #[must_use]
    fn dilate(&self, radius: u32) -> Self;

    /// Minimum coverage over the square window around each pixel
    #[must_use]
    fn erode(&self, radius: u32) -> Self;

    /// Dilation followed by erosion; fills holes smaller than the window
    #[must_use]
    fn closing(&self, radius: u32) -> Self
    where
        Self: Sized,
    {
        self.dilate(radius).erode(radius)
    }

    /// Erosion followed by dilation; removes specks smaller than the window
    #[must_use]
    fn opening(&self, radius: u32) -> Self
    where
        Self: Sized,
    {
        self.erode(radius).dilate(radius)
    }

    /// Closing, then opening, in that fixed order
    #[must_use]
    fn closing_then_opening(&self, radius: u32) -> Self
    where
        Self: Sized,
    {
        self.closing(radius).opening(radius)
    }
}

impl Morphology for Image<Luma<u8>> {
    fn dilate(&self, radius: u32) -> Self {
        rank_filter(self, radius, Extremum::Max)
    }

    fn erode(&self, radius: u32) -> Self {
        rank_filter(self, radius, Extremum::Min)
    }
}

/// Dilates `mask` by a square window of the given radius.
#[must_use]
pub fn dilate(mask: &Image<Luma<u8>>, radius: u32) -> Image<Luma<u8>> {
    mask.dilate(radius)
}

/// Erodes `mask` by a square window of the given radius.
#[must_use]
pub fn erode(mask: &Image<Luma<u8>>, radius: u32) -> Image<Luma<u8>> {
    mask.erode(radius)
}

#[must_use]
pub fn closing(mask: &Image<Luma<u8>>, radius: u32) -> Image<Luma<u8>> {
    mask.closing(radius)
}

#[must_use]
pub fn opening(mask: &Image<Luma<u8>>, radius: u32) -> Image<Luma<u8>> {
    mask.opening(radius)
}

/// Closing (dilate → erode) followed by opening (erode → dilate).
///
/// A radius of `0` returns an unchanged copy.
#[must_use]
pub fn apply_closing_then_opening(mask: &Image<Luma<u8>>, radius: u32) -> Image<Luma<u8>> {
    mask.closing_then_opening(radius)
}

fn rank_filter(mask: &Image<Luma<u8>>, radius: u32, extremum: Extremum) -> Image<Luma<u8>> {
    let (width, height) = mask.dimensions();
    if radius == 0 || width == 0 || height == 0 {
        return mask.clone();
    }

    // Once the window reaches both edges from every position it covers the
    // whole line, so larger radii give the same result.
    let rx = i64::from(radius.min(width - 1));
    let ry = i64::from(radius.min(height - 1));
    let row_len = width as usize;
    let source = mask.as_raw();

    // Row pass
    let mut horizontal = vec![0u8; source.len()];
    for_each_row(&mut horizontal, row_len, |y, out_row| {
        let row = &source[y * row_len..(y + 1) * row_len];
        for (x, out) in out_row.iter_mut().enumerate() {
            let x = x as i64;
            *out = (x - rx..=x + rx)
                .map(|sx| row[clamp_to_edge(sx, width)])
                .fold(extremum.identity(), |acc, v| extremum.pick(acc, v));
        }
    });

    // Column pass
    let mut output = mask.clone();
    for_each_row(&mut *output, row_len, |y, out_row| {
        let y = y as i64;
        for (x, out) in out_row.iter_mut().enumerate() {
            *out = (y - ry..=y + ry)
                .map(|sy| horizontal[clamp_to_edge(sy, height) * row_len + x])
                .fold(extremum.identity(), |acc, v| extremum.pick(acc, v));
        }
    });

    output
}
