//! Edge-aware mask smoothing with a guided filter.
//!
//! The guide's red channel stands in for luminance. For each pixel the
//! filter fits a local linear model `q = a * I + b` of the mask `p` against
//! the guide `I` over a `(2 * radius + 1)²` window:
//!
//! ```text
//! var(I)  = mean(I²) - mean(I)²
//! a       = (mean(I·p) - mean(I)·mean(p)) / (var(I) + eps)
//! b       = mean(p) - a·mean(I)
//! q       = clamp(a·I + b, 0, 1)
//! ```
//!
//! All values are normalized to `[0, 1]`. Window statistics use
//! clamp-to-edge addressing. `eps` controls how strongly guide edges are
//! followed: as it grows, `a` tends to zero and the output tends to the
//! local mean of the mask.

use crate::error::GuidedFilterError;
use crate::imageops_cutout::box_filter::BoxFilter;
use crate::utils::{unit_to_u8, validate_matching_dimensions, validate_non_empty_image};
use image::{Luma, Rgba};
use imageproc::definitions::Image;
use imageproc::map::{map_colors, map_colors2};

/// Trait for guided filtering of a coverage mask against an RGBA guide
pub trait GuidedFilterExt {
    /// Smooths the mask while following edges present in `guidance`
    ///
    /// # Arguments
    ///
    /// * `guidance` - Guide image; only the red channel is used
    /// * `radius` - Window radius in pixels
    /// * `epsilon` - Regularization; must be finite and strictly positive
    ///
    /// # Errors
    ///
    /// * `GuidedFilterError::DimensionMismatch` - When guide and mask sizes differ
    /// * `GuidedFilterError::InvalidEpsilon` - When `epsilon` is not finite or `<= 0`
    /// * `GuidedFilterError::EmptyImage` - When the mask has a zero dimension
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use imageops_cutout::{GuidedFilterExt, Image};
    /// use image::{Luma, Rgba};
    ///
    /// # fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let mask: Image<Luma<u8>> = Image::new(64, 64);
    /// let photo: Image<Rgba<u8>> = Image::new(64, 64);
    ///
    /// let smoothed = mask.guided_filter(&photo, 8, 0.01)?;
    /// # Ok(())
    /// # }
    /// ```
    fn guided_filter(
        &self,
        guidance: &Image<Rgba<u8>>,
        radius: u32,
        epsilon: f32,
    ) -> Result<Image<Luma<u8>>, GuidedFilterError>;
}

impl GuidedFilterExt for Image<Luma<u8>> {
    fn guided_filter(
        &self,
        guidance: &Image<Rgba<u8>>,
        radius: u32,
        epsilon: f32,
    ) -> Result<Image<Luma<u8>>, GuidedFilterError> {
        validate_filter_input(self, guidance, epsilon)?;

        let filter = GuidedFilter::new(guidance, radius, epsilon)?;
        filter.filter(self)
    }
}

/// Guided filter with the guide statistics precomputed
///
/// Building the filter once lets several masks share the guide's mean and
/// variance planes.
pub struct GuidedFilter {
    guidance: Image<Luma<f32>>,
    radius: u32,
    epsilon: f32,
    guidance_mean: Image<Luma<f32>>,
    guidance_var: Image<Luma<f32>>,
}

impl GuidedFilter {
    /// Precomputes the guide statistics.
    ///
    /// # Errors
    ///
    /// * `GuidedFilterError::InvalidEpsilon` - When `epsilon` is not finite or `<= 0`
    /// * `GuidedFilterError::EmptyImage` - When the guide has a zero dimension
    pub fn new(
        guidance: &Image<Rgba<u8>>,
        radius: u32,
        epsilon: f32,
    ) -> Result<Self, GuidedFilterError> {
        validate_epsilon(epsilon)?;
        let (width, height) = guidance.dimensions();
        validate_non_empty_image(width, height, "GuidedFilter")
            .map_err(|_| GuidedFilterError::EmptyImage)?;

        let guidance = guidance_plane(guidance);
        let guidance_mean = box_mean(&guidance, radius)?;

        let guidance_sq = map_colors(&guidance, |Luma([i])| Luma([i * i]));
        let guidance_sq_mean = box_mean(&guidance_sq, radius)?;

        let guidance_var = map_colors2(
            &guidance_mean,
            &guidance_sq_mean,
            |Luma([mean]), Luma([sq_mean])| Luma([mean.mul_add(-mean, sq_mean)]),
        );

        Ok(Self {
            guidance,
            radius,
            epsilon,
            guidance_mean,
            guidance_var,
        })
    }

    /// Window radius the statistics were computed with
    pub const fn radius(&self) -> u32 {
        self.radius
    }

    /// Regularization term
    pub const fn epsilon(&self) -> f32 {
        self.epsilon
    }

    /// Filters a mask of the same size as the guide.
    ///
    /// # Errors
    ///
    /// * `GuidedFilterError::DimensionMismatch` - When the mask size differs from the guide
    pub fn filter(&self, mask: &Image<Luma<u8>>) -> Result<Image<Luma<u8>>, GuidedFilterError> {
        let guidance_dims = self.guidance.dimensions();
        let input_dims = mask.dimensions();
        validate_matching_dimensions(guidance_dims, input_dims, "GuidedFilter").map_err(|_| {
            GuidedFilterError::DimensionMismatch {
                guidance_dims,
                input_dims,
            }
        })?;

        let input = map_colors(mask, |Luma([p])| Luma([f32::from(p) / 255.0]));
        let input_mean = box_mean(&input, self.radius)?;

        // E[I * p]
        let product = map_colors2(&input, &self.guidance, |Luma([p]), Luma([i])| Luma([p * i]));
        let product_mean = box_mean(&product, self.radius)?;

        let (width, height) = input_dims;
        let output = Image::from_fn(width, height, |x, y| {
            let Luma([mean_p]) = *input_mean.get_pixel(x, y);
            let Luma([mean_ip]) = *product_mean.get_pixel(x, y);
            let Luma([mean_i]) = *self.guidance_mean.get_pixel(x, y);
            let Luma([var_i]) = *self.guidance_var.get_pixel(x, y);
            let Luma([guide]) = *self.guidance.get_pixel(x, y);

            // cov(I, p) = E[I * p] - E[I] * E[p]
            let cov = mean_i.mul_add(-mean_p, mean_ip);
            let a = cov / (var_i + self.epsilon);
            let b = a.mul_add(-mean_i, mean_p);

            Luma([unit_to_u8(a.mul_add(guide, b))])
        });

        Ok(output)
    }
}

/// Smooths `mask` against `guide` with the given window radius and regularization.
///
/// # Errors
///
/// See [`GuidedFilterExt::guided_filter`].
pub fn guided_smooth(
    mask: &Image<Luma<u8>>,
    guide: &Image<Rgba<u8>>,
    radius: u32,
    epsilon: f32,
) -> Result<Image<Luma<u8>>, GuidedFilterError> {
    mask.guided_filter(guide, radius, epsilon)
}

/// Red channel of the guide, normalized to `[0, 1]`
fn guidance_plane(guidance: &Image<Rgba<u8>>) -> Image<Luma<f32>> {
    map_colors(guidance, |Rgba([red, _, _, _])| Luma([f32::from(red) / 255.0]))
}

fn box_mean(plane: &Image<Luma<f32>>, radius: u32) -> Result<Image<Luma<f32>>, GuidedFilterError> {
    plane
        .box_filter(radius)
        .map_err(|_| GuidedFilterError::EmptyImage)
}

fn validate_epsilon(epsilon: f32) -> Result<(), GuidedFilterError> {
    if !epsilon.is_finite() || epsilon <= 0.0 {
        return Err(GuidedFilterError::InvalidEpsilon { epsilon });
    }
    Ok(())
}

fn validate_filter_input(
    input: &Image<Luma<u8>>,
    guidance: &Image<Rgba<u8>>,
    epsilon: f32,
) -> Result<(), GuidedFilterError> {
    validate_epsilon(epsilon)?;

    let guidance_dims = guidance.dimensions();
    let input_dims = input.dimensions();
    if guidance_dims != input_dims {
        return Err(GuidedFilterError::DimensionMismatch {
            guidance_dims,
            input_dims,
        });
    }
    Ok(())
}
