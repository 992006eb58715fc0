use image::imageops::{self, FilterType};
use image::{GenericImageView, Luma, Rgba};
use imageproc::{definitions::Image, map::map_colors, map::map_colors2};

use crate::{error::AlphaMaskError, utils::validate_matching_dimensions};

/// Colour stored in the RGB channels of a mask in its RGBA form
pub const MASK_SENTINEL_COLOR: [u8; 3] = [255, 255, 255];

/// Trait for replacing the alpha channel of RGBA images
///
/// This is pure channel substitution: colour channels are copied through
/// unchanged and the alpha channel is overwritten with mask coverage. No
/// blending with the previous alpha takes place.
pub trait ModifyAlpha {
    /// Replaces the alpha channel with the provided mask
    ///
    /// # Arguments
    ///
    /// * `mask` - The new alpha mask (grayscale image)
    ///
    /// # Returns
    ///
    /// RGBA image with replaced alpha channel
    ///
    /// # Errors
    ///
    /// * `AlphaMaskError::DimensionMismatch` - When image and mask dimensions don't match
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use imageops_cutout::{Image, ModifyAlpha};
    /// use image::{Rgba, Luma};
    ///
    /// # fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let rgba_image: Image<Rgba<u8>> = Image::new(10, 10);
    /// let new_mask: Image<Luma<u8>> = Image::new(10, 10);
    ///
    /// let updated = rgba_image.replace_alpha(&new_mask)?;
    /// # Ok(())
    /// # }
    /// ```
    fn replace_alpha(&self, mask: &Image<Luma<u8>>) -> Result<Self, AlphaMaskError>
    where
        Self: Sized;

    /// Replaces the alpha channel with the provided mask in-place
    ///
    /// # Errors
    ///
    /// * `AlphaMaskError::DimensionMismatch` - When image and mask dimensions don't match
    fn replace_alpha_mut(&mut self, mask: &Image<Luma<u8>>) -> Result<&mut Self, AlphaMaskError>;
}

impl ModifyAlpha for Image<Rgba<u8>> {
    fn replace_alpha(&self, mask: &Image<Luma<u8>>) -> Result<Self, AlphaMaskError> {
        validate_dimensions(self, mask)?;

        let result = map_colors2(self, mask, |Rgba([red, green, blue, _]), Luma([alpha])| {
            Rgba([red, green, blue, alpha])
        });

        Ok(result)
    }

    fn replace_alpha_mut(&mut self, mask: &Image<Luma<u8>>) -> Result<&mut Self, AlphaMaskError> {
        validate_dimensions(self, mask)?;

        self.pixels_mut()
            .zip(mask.pixels())
            .for_each(|(pixel, Luma([alpha]))| pixel[3] = *alpha);

        Ok(self)
    }
}

/// Conversions between a coverage mask and its RGBA "white + alpha" form
pub trait MaskExt {
    /// Renders the mask as white pixels whose alpha is the coverage
    fn to_rgba_mask(&self) -> Image<Rgba<u8>>;
}

impl MaskExt for Image<Luma<u8>> {
    fn to_rgba_mask(&self) -> Image<Rgba<u8>> {
        let [red, green, blue] = MASK_SENTINEL_COLOR;
        map_colors(self, |Luma([coverage])| Rgba([red, green, blue, coverage]))
    }
}

/// Extracts the alpha channel of a segmented foreground as a standalone mask.
///
/// This seeds manual editing from the segmenter or refinement output.
#[must_use]
pub fn create_mask_from_foreground(foreground: &Image<Rgba<u8>>) -> Image<Luma<u8>> {
    map_colors(foreground, |Rgba([_, _, _, alpha])| Luma([alpha]))
}

/// Substitutes `mask` coverage into the alpha channel of `original`.
///
/// Output colour is the original RGB; output alpha is the mask coverage. A
/// mask of a different size is first resampled to the original's size with
/// a Lanczos filter.
#[must_use]
pub fn apply_mask_to_image(original: &Image<Rgba<u8>>, mask: &Image<Luma<u8>>) -> Image<Rgba<u8>> {
    let (width, height) = original.dimensions();

    let resized;
    let mask = if mask.dimensions() == (width, height) {
        mask
    } else {
        log::debug!(
            "resampling {}x{} mask to {}x{}",
            mask.width(),
            mask.height(),
            width,
            height
        );
        resized = imageops::resize(mask, width, height, FilterType::Lanczos3);
        &resized
    };

    map_colors2(original, mask, |Rgba([red, green, blue, _]), Luma([alpha])| {
        Rgba([red, green, blue, alpha])
    })
}

/// Function to validate dimensions
#[inline]
fn validate_dimensions<I1, I2>(image: &I1, mask: &I2) -> Result<(), AlphaMaskError>
where
    I1: GenericImageView,
    I2: GenericImageView,
{
    let expected = image.dimensions();
    let actual = mask.dimensions();

    validate_matching_dimensions(expected, actual, "ModifyAlpha")
        .map_err(|_| AlphaMaskError::DimensionMismatch { expected, actual })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{create_test_alpha_mask, create_test_rgba_image};

    #[test]
    fn test_validate_dimensions() {
        let image: Image<Rgba<u8>> = Image::new(10, 10);
        let mask: Image<Luma<u8>> = Image::new(10, 10);

        assert!(validate_dimensions(&image, &mask).is_ok());

        let mask_wrong_size: Image<Luma<u8>> = Image::new(5, 5);
        assert_eq!(
            validate_dimensions(&image, &mask_wrong_size),
            Err(AlphaMaskError::DimensionMismatch {
                expected: (10, 10),
                actual: (5, 5)
            })
        );
    }

    #[test]
    fn test_replace_alpha() {
        let image = create_test_rgba_image();
        let mask = create_test_alpha_mask();

        let result = image.replace_alpha(&mask).unwrap();

        // Color channels should remain unchanged, only alpha is replaced
        assert_eq!(result.get_pixel(0, 0), &Rgba([200, 150, 100, 255]));
        assert_eq!(result.get_pixel(1, 0), &Rgba([100, 200, 150, 192]));
        assert_eq!(result.get_pixel(0, 1), &Rgba([150, 100, 200, 128]));
        assert_eq!(result.get_pixel(1, 1), &Rgba([50, 75, 25, 64]));
    }

    #[test]
    fn test_replace_alpha_mut() {
        let mut image = create_test_rgba_image();
        let mask = create_test_alpha_mask();

        image.replace_alpha_mut(&mask).unwrap();

        assert_eq!(image.get_pixel(1, 1), &Rgba([50, 75, 25, 64]));
    }

    #[test]
    fn test_create_mask_from_foreground() {
        let image = create_test_rgba_image();
        let mask = create_mask_from_foreground(&image);

        assert_eq!(mask.get_pixel(0, 0), &Luma([255]));
        assert_eq!(mask.get_pixel(1, 0), &Luma([128]));
        assert_eq!(mask.get_pixel(0, 1), &Luma([64]));
        assert_eq!(mask.get_pixel(1, 1), &Luma([0]));
    }

    #[test]
    fn test_to_rgba_mask_uses_white() {
        let mask = create_test_alpha_mask();
        let rgba = mask.to_rgba_mask();

        assert_eq!(rgba.get_pixel(1, 1), &Rgba([255, 255, 255, 64]));
        assert_eq!(create_mask_from_foreground(&rgba), mask);
    }

    #[test]
    fn test_apply_mask_to_image_is_channel_substitution() {
        let image = create_test_rgba_image();
        let mask = create_test_alpha_mask();

        let result = apply_mask_to_image(&image, &mask);
        assert_eq!(result, image.replace_alpha(&mask).unwrap());
    }

    #[test]
    fn test_apply_mask_to_image_resamples_mask() {
        let image: Image<Rgba<u8>> = Image::from_pixel(8, 8, Rgba([10, 20, 30, 0]));
        let mask: Image<Luma<u8>> = Image::from_pixel(4, 4, Luma([255]));

        let result = apply_mask_to_image(&image, &mask);
        assert_eq!(result.dimensions(), (8, 8));
        assert!(result.pixels().all(|p| *p == Rgba([10, 20, 30, 255])));
    }
}
