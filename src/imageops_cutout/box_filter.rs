use crate::error::FilterError;
use crate::utils::{clamp_to_edge, for_each_row, validate_non_empty_image};
use image::{Luma, Rgba};
use imageproc::definitions::Image;

/// Trait providing an unweighted mean filter over a square window
///
/// Every window holds exactly `(2 * radius + 1)²` samples: out-of-range
/// samples are replaced with the nearest edge pixel, so the divisor never
/// shrinks near the border. The filter is separable and runs a horizontal
/// pass followed by a vertical pass, each with a running sum, so the cost
/// does not depend on the radius.
pub trait BoxFilter {
    /// Output type of the filter
    type Output;

    /// Applies the box filter with the given radius
    ///
    /// # Arguments
    ///
    /// * `radius` - Window radius in pixels; `0` returns a copy
    ///
    /// # Errors
    ///
    /// * `FilterError::EmptyImage` - When the image has a zero dimension
    fn box_filter(&self, radius: u32) -> Result<Self::Output, FilterError>;
}

/// Mean of a floating-point plane (used for guided filter statistics)
impl BoxFilter for Image<Luma<f32>> {
    type Output = Self;

    fn box_filter(&self, radius: u32) -> Result<Self::Output, FilterError> {
        let (width, height) = self.dimensions();
        validate_non_empty_image(width, height, "BoxFilter")
            .map_err(|_| FilterError::EmptyImage)?;

        if radius == 0 {
            return Ok(self.clone());
        }

        let plane: Vec<f64> = self.as_raw().iter().map(|&v| f64::from(v)).collect();
        let horizontal = horizontal_sums(&plane, width, 1, radius);
        let vertical = vertical_sums(&horizontal, width, height, 1, radius);

        let area = window_area(radius);
        let mut output = self.clone();
        output
            .iter_mut()
            .zip(vertical)
            .for_each(|(value, sum)| *value = (sum / area) as f32);

        Ok(output)
    }
}

/// Mean of the RGB channels of an RGBA image; alpha is copied through
impl BoxFilter for Image<Rgba<u8>> {
    type Output = Self;

    fn box_filter(&self, radius: u32) -> Result<Self::Output, FilterError> {
        let (width, height) = self.dimensions();
        validate_non_empty_image(width, height, "BoxFilter")
            .map_err(|_| FilterError::EmptyImage)?;

        if radius == 0 {
            return Ok(self.clone());
        }

        let plane: Vec<f64> = self.as_raw().iter().map(|&v| f64::from(v)).collect();
        let horizontal = horizontal_sums(&plane, width, 4, radius);
        let vertical = vertical_sums(&horizontal, width, height, 4, radius);

        let area = window_area(radius);

        let mut output = self.clone();
        output
            .chunks_exact_mut(4)
            .zip(vertical.chunks_exact(4))
            .for_each(|(pixel, sums)| {
                for channel in 0..3 {
                    pixel[channel] = (sums[channel] / area).round().clamp(0.0, 255.0) as u8;
                }
            });

        Ok(output)
    }
}

/// Number of samples in a `(2 * radius + 1)²` window
fn window_area(radius: u32) -> f64 {
    let side = 2.0 * f64::from(radius) + 1.0;
    side * side
}

/// Sum of the clamp-to-edge window of `radius` centred on index 0.
///
/// Offsets past either edge repeat the edge sample, so they are counted
/// instead of visited and the cost is bounded by `len`, not `radius`.
fn seed_window_sum(sample: impl Fn(i64) -> f64, len: u32, radius: u32) -> f64 {
    let last = i64::from(len) - 1;
    let r = i64::from(radius);
    let inner = r.min(last);

    let head = (r + 1) as f64 * sample(0);
    let body: f64 = (1..=inner).map(&sample).sum();
    let tail = (r - inner) as f64 * sample(last);
    head + body + tail
}

/// Horizontal running window sums with clamp-to-edge addressing
fn horizontal_sums(plane: &[f64], width: u32, channels: usize, radius: u32) -> Vec<f64> {
    let row_len = width as usize * channels;
    let r = i64::from(radius);
    let mut output = vec![0.0f64; plane.len()];

    for_each_row(&mut output, row_len, |y, out_row| {
        let row = &plane[y * row_len..(y + 1) * row_len];
        for c in 0..channels {
            let sample = |x: i64| row[clamp_to_edge(x, width) * channels + c];

            let mut sum = seed_window_sum(&sample, width, radius);
            out_row[c] = sum;

            for x in 1..i64::from(width) {
                sum += sample(x + r) - sample(x - r - 1);
                out_row[x as usize * channels + c] = sum;
            }
        }
    });

    output
}

/// Vertical running window sums with clamp-to-edge addressing
fn vertical_sums(
    plane: &[f64],
    width: u32,
    height: u32,
    channels: usize,
    radius: u32,
) -> Vec<f64> {
    let row_len = width as usize * channels;
    let r = i64::from(radius);
    let sample = |x: usize, y: i64| plane[clamp_to_edge(y, height) * row_len + x];

    let mut output = vec![0.0f64; plane.len()];

    // Initialize row 0, then slide the window down one row at a time.
    for x in 0..row_len {
        let mut sum = seed_window_sum(|y| sample(x, y), height, radius);
        output[x] = sum;
        for y in 1..i64::from(height) {
            sum += sample(x, y + r) - sample(x, y - r - 1);
            output[y as usize * row_len + x] = sum;
        }
    }

    output
}
