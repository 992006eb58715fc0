//! Adaptive feathering of mask edges.
//!
//! Pass one measures the central-difference gradient magnitude of the
//! coverage at every interior pixel; border pixels get zero. Pass two blurs
//! each pixel with a normalized Gaussian whose radius depends on that
//! strength: strong edges (above [`EDGE_STRENGTH_THRESHOLD`]) use half the
//! radius so they stay crisp, everything else uses the full radius.

use crate::error::FilterError;
use crate::utils::{clamp_to_edge, for_each_row, round_to_u8};
use image::Luma;
use imageproc::definitions::Image;

/// Gradient magnitude (in coverage levels) above which a pixel counts as a strong edge
pub const EDGE_STRENGTH_THRESHOLD: f32 = 50.0;

/// Largest accepted feather radius
pub const MAX_FEATHER_RADIUS: u32 = 256;

/// Trait for edge-adaptive feathering of coverage masks
pub trait FeatherExt {
    /// Softens mask edges with an edge-adaptive Gaussian blur
    ///
    /// # Arguments
    ///
    /// * `radius` - Blur radius for flat and weak-edge regions; strong edges
    ///   use `radius / 2`. A radius of `0` returns a copy.
    ///
    /// # Errors
    ///
    /// * `FilterError::EmptyImage` - When the mask has a zero dimension
    /// * `FilterError::RadiusTooLarge` - When `radius` exceeds [`MAX_FEATHER_RADIUS`]
    fn feather_edges(&self, radius: u32) -> Result<Image<Luma<u8>>, FilterError>;

    /// Central-difference gradient magnitude of the coverage
    ///
    /// `gradX = (right - left) / 2`, `gradY = (bottom - top) / 2`. Pixels on
    /// the image border are reported as zero.
    fn edge_strength(&self) -> Image<Luma<f32>>;
}

impl FeatherExt for Image<Luma<u8>> {
    fn feather_edges(&self, radius: u32) -> Result<Image<Luma<u8>>, FilterError> {
        let (width, height) = self.dimensions();
        if width == 0 || height == 0 {
            return Err(FilterError::EmptyImage);
        }
        if radius == 0 {
            return Ok(self.clone());
        }
        if radius > MAX_FEATHER_RADIUS {
            return Err(FilterError::RadiusTooLarge {
                radius,
                max: MAX_FEATHER_RADIUS,
            });
        }

        let strength = self.edge_strength();
        let full = GaussianKernel::new(radius);
        let tight = GaussianKernel::new(radius / 2);
        let full_rows = full.horizontal_pass(self);
        let tight_rows = tight.horizontal_pass(self);

        let row_len = width as usize;
        let mut output = self.clone();
        for_each_row(&mut *output, row_len, |y, out_row| {
            for (x, out) in out_row.iter_mut().enumerate() {
                let Luma([edge]) = *strength.get_pixel(x as u32, y as u32);
                let (kernel, rows) = if edge > EDGE_STRENGTH_THRESHOLD {
                    (&tight, &tight_rows)
                } else {
                    (&full, &full_rows)
                };
                let column = |sy: i64| rows[clamp_to_edge(sy, height) * row_len + x];
                *out = round_to_u8(kernel.convolve(column, y as i64));
            }
        });

        Ok(output)
    }

    fn edge_strength(&self) -> Image<Luma<f32>> {
        let (width, height) = self.dimensions();
        Image::from_fn(width, height, |x, y| {
            if x == 0 || y == 0 || x + 1 >= width || y + 1 >= height {
                return Luma([0.0]);
            }
            let at = |px: u32, py: u32| f32::from(self.get_pixel(px, py)[0]);
            let grad_x = (at(x + 1, y) - at(x - 1, y)) / 2.0;
            let grad_y = (at(x, y + 1) - at(x, y - 1)) / 2.0;
            Luma([grad_x.hypot(grad_y)])
        })
    }
}

/// Feathers `mask` edges; see [`FeatherExt::feather_edges`].
///
/// # Errors
///
/// * `FilterError::EmptyImage` - When the mask has a zero dimension
/// * `FilterError::RadiusTooLarge` - When `radius` exceeds [`MAX_FEATHER_RADIUS`]
pub fn feather_edges(mask: &Image<Luma<u8>>, radius: u32) -> Result<Image<Luma<u8>>, FilterError> {
    mask.feather_edges(radius)
}

/// Normalized 1-D Gaussian taps `exp(-d² / (2r²))` for `d` in `-r..=r`.
///
/// The 2-D weight `exp(-(dx² + dy²) / (2r²))` is the product of two taps and
/// clamp-to-edge addressing acts on each axis separately, so a row pass
/// followed by a column pass gives the same normalized window average.
struct GaussianKernel {
    radius: i64,
    taps: Vec<f32>,
}

impl GaussianKernel {
    fn new(radius: u32) -> Self {
        let r = i64::from(radius);
        if radius == 0 {
            return Self {
                radius: 0,
                taps: vec![1.0],
            };
        }

        let two_sigma_sq = 2.0 * (radius as f32) * (radius as f32);
        let mut taps: Vec<f32> = (-r..=r)
            .map(|d| (-((d * d) as f32) / two_sigma_sq).exp())
            .collect();
        let total: f32 = taps.iter().sum();
        taps.iter_mut().for_each(|tap| *tap /= total);

        Self { radius: r, taps }
    }

    /// Weighted sum of `sample` around `center`
    fn convolve(&self, sample: impl Fn(i64) -> f32, center: i64) -> f32 {
        (center - self.radius..=center + self.radius)
            .zip(&self.taps)
            .map(|(position, tap)| tap * sample(position))
            .sum()
    }

    /// Row-filtered copy of `mask` as a row-major `f32` plane
    fn horizontal_pass(&self, mask: &Image<Luma<u8>>) -> Vec<f32> {
        let (width, _) = mask.dimensions();
        let row_len = width as usize;
        let source = mask.as_raw();

        let mut plane = vec![0.0f32; source.len()];
        for_each_row(&mut plane, row_len, |y, out_row| {
            let row = &source[y * row_len..(y + 1) * row_len];
            let sample = |sx: i64| f32::from(row[clamp_to_edge(sx, width)]);
            for (x, out) in out_row.iter_mut().enumerate() {
                *out = self.convolve(&sample, x as i64);
            }
        });
        plane
    }
}
