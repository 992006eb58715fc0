//! Mask refinement pipeline.
//!
//! Stages run in a fixed order and each one can be switched off:
//! morphology (closing then opening) → guided filter → feathering →
//! colour decontamination. Every stage reads one buffer and returns a new
//! one; the caller's mask is never modified.

use image::imageops::{self, FilterType};
use image::{Luma, Rgba};
use imageproc::definitions::Image;
use log::debug;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{FilterError, GuidedFilterError, RefineError};
use crate::imageops_cutout::feather::{FeatherExt, MAX_FEATHER_RADIUS};
use crate::imageops_cutout::guided_filter::GuidedFilterExt;
use crate::imageops_cutout::morphology::Morphology;

/// Parameters for [`refine`]
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RefinementConfig {
    pub enable_morphology: bool,
    pub morphology_radius: u32,
    pub enable_guided_filter: bool,
    pub guided_filter_radius: u32,
    pub guided_filter_eps: f32,
    pub enable_feathering: bool,
    pub feather_radius: u32,
    pub enable_decontamination: bool,
}

impl RefinementConfig {
    /// Light cleanup for interactive previews
    pub const fn fast() -> Self {
        Self {
            enable_morphology: true,
            morphology_radius: 1,
            enable_guided_filter: false,
            guided_filter_radius: 4,
            guided_filter_eps: 0.01,
            enable_feathering: true,
            feather_radius: 2,
            enable_decontamination: false,
        }
    }

    pub const fn balanced() -> Self {
        Self {
            enable_morphology: true,
            morphology_radius: 2,
            enable_guided_filter: true,
            guided_filter_radius: 8,
            guided_filter_eps: 0.01,
            enable_feathering: true,
            feather_radius: 3,
            enable_decontamination: false,
        }
    }

    /// Wider windows and a tighter regularizer for final exports
    pub const fn quality() -> Self {
        Self {
            enable_morphology: true,
            morphology_radius: 3,
            enable_guided_filter: true,
            guided_filter_radius: 16,
            guided_filter_eps: 0.001,
            enable_feathering: true,
            feather_radius: 5,
            enable_decontamination: true,
        }
    }

    /// Configuration with every stage switched off
    pub const fn disabled() -> Self {
        Self {
            enable_morphology: false,
            enable_guided_filter: false,
            enable_feathering: false,
            enable_decontamination: false,
            ..Self::balanced()
        }
    }

    /// Checks the parameters of the enabled stages.
    ///
    /// # Errors
    ///
    /// * `RefineError::GuidedFilter` - When `guided_filter_eps` is not finite or `<= 0`
    /// * `RefineError::Filter` - When `feather_radius` exceeds [`MAX_FEATHER_RADIUS`]
    pub fn validate(&self) -> Result<(), RefineError> {
        let epsilon = self.guided_filter_eps;
        if self.enable_guided_filter && (!epsilon.is_finite() || epsilon <= 0.0) {
            return Err(GuidedFilterError::InvalidEpsilon { epsilon }.into());
        }
        if self.enable_feathering && self.feather_radius > MAX_FEATHER_RADIUS {
            return Err(FilterError::RadiusTooLarge {
                radius: self.feather_radius,
                max: MAX_FEATHER_RADIUS,
            }
            .into());
        }
        Ok(())
    }
}

impl Default for RefinementConfig {
    fn default() -> Self {
        Self::balanced()
    }
}

/// Named configuration presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum RefinementPreset {
    Fast,
    #[default]
    Balanced,
    Quality,
}

impl RefinementPreset {
    pub const fn config(self) -> RefinementConfig {
        match self {
            Self::Fast => RefinementConfig::fast(),
            Self::Balanced => RefinementConfig::balanced(),
            Self::Quality => RefinementConfig::quality(),
        }
    }
}

impl From<RefinementPreset> for RefinementConfig {
    fn from(preset: RefinementPreset) -> Self {
        preset.config()
    }
}

/// Refines a raw segmentation mask.
///
/// `original` is the photo the mask was segmented from; it guides the
/// guided filter stage. A guide of a different size is resampled to the
/// mask's size first.
///
/// # Errors
///
/// * `RefineError::GuidedFilter` - When the config's regularizer is invalid, or
///   the guided stage is enabled and `original` has a zero dimension
/// * `RefineError::Filter` - When the mask has a zero dimension or the feather
///   radius is too large
///
/// # Examples
///
/// ```no_run
/// use imageops_cutout::{refine, Image, RefinementConfig};
/// use image::{Luma, Rgba};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let raw_mask: Image<Luma<u8>> = Image::new(640, 480);
/// let photo: Image<Rgba<u8>> = Image::new(640, 480);
///
/// let refined = refine(&raw_mask, &photo, &RefinementConfig::quality())?;
/// # Ok(())
/// # }
/// ```
pub fn refine(
    mask: &Image<Luma<u8>>,
    original: &Image<Rgba<u8>>,
    config: &RefinementConfig,
) -> Result<Image<Luma<u8>>, RefineError> {
    config.validate()?;
    debug!(
        "refining {}x{} mask with {:?}",
        mask.width(),
        mask.height(),
        config
    );

    let mut refined = mask.clone();

    if config.enable_morphology {
        debug!("morphology: radius {}", config.morphology_radius);
        refined = refined.closing_then_opening(config.morphology_radius);
    }

    if config.enable_guided_filter {
        debug!(
            "guided filter: radius {}, eps {}",
            config.guided_filter_radius, config.guided_filter_eps
        );
        if original.width() == 0 || original.height() == 0 {
            return Err(GuidedFilterError::EmptyImage.into());
        }
        let resized;
        let guide = if original.dimensions() == refined.dimensions() {
            original
        } else {
            debug!(
                "resampling {}x{} guide to mask size",
                original.width(),
                original.height()
            );
            resized = imageops::resize(
                original,
                refined.width(),
                refined.height(),
                FilterType::Triangle,
            );
            &resized
        };
        refined = refined.guided_filter(
            guide,
            config.guided_filter_radius,
            config.guided_filter_eps,
        )?;
    }

    if config.enable_feathering {
        debug!("feathering: radius {}", config.feather_radius);
        refined = refined.feather_edges(config.feather_radius)?;
    }

    if config.enable_decontamination {
        refined = decontaminate(refined, original);
    }

    Ok(refined)
}

/// Colour decontamination stage.
///
/// Removing background bleed from semi-transparent edge pixels would adjust
/// the foreground colour, not the mask; the mask passes through unchanged.
fn decontaminate(mask: Image<Luma<u8>>, _original: &Image<Rgba<u8>>) -> Image<Luma<u8>> {
    debug!("decontamination: mask unchanged");
    mask
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{create_disc_guide, create_disc_mask};

    fn photo(width: u32, height: u32) -> Image<Rgba<u8>> {
        Image::from_fn(width, height, |x, y| Rgba([(x * 7 + y) as u8, 90, 30, 255]))
    }

    fn blob_mask(width: u32, height: u32) -> Image<Luma<u8>> {
        Image::from_fn(width, height, |x, y| {
            let inside = (width / 4..3 * width / 4).contains(&x)
                && (height / 4..3 * height / 4).contains(&y);
            Luma([if inside { 255 } else { 0 }])
        })
    }

    #[test]
    fn test_presets() {
        assert_eq!(RefinementConfig::default(), RefinementConfig::balanced());
        assert_eq!(RefinementPreset::Fast.config(), RefinementConfig::fast());
        assert_eq!(
            RefinementConfig::from(RefinementPreset::Quality),
            RefinementConfig::quality()
        );
        assert!(!RefinementConfig::fast().enable_guided_filter);
        assert!(RefinementConfig::quality().enable_decontamination);
        for preset in [
            RefinementPreset::Fast,
            RefinementPreset::Balanced,
            RefinementPreset::Quality,
        ] {
            assert!(preset.config().validate().is_ok());
        }
    }

    #[test]
    fn test_disabled_config_returns_copy() {
        let mask = blob_mask(20, 20);
        let refined = refine(&mask, &photo(20, 20), &RefinementConfig::disabled()).unwrap();
        assert_eq!(refined, mask);
    }

    #[test]
    fn test_decontamination_is_identity() {
        let mask = blob_mask(16, 16);
        let config = RefinementConfig {
            enable_decontamination: true,
            ..RefinementConfig::disabled()
        };
        assert_eq!(refine(&mask, &photo(16, 16), &config).unwrap(), mask);
    }

    #[test]
    fn test_morphology_only_removes_speck() {
        let mut mask = blob_mask(30, 30);
        mask.put_pixel(2, 2, Luma([255]));
        let config = RefinementConfig {
            enable_morphology: true,
            morphology_radius: 1,
            ..RefinementConfig::disabled()
        };
        let refined = refine(&mask, &photo(30, 30), &config).unwrap();
        assert_eq!(refined.get_pixel(2, 2)[0], 0);
        assert_eq!(refined.get_pixel(15, 15)[0], 255);
    }

    #[test]
    fn test_invalid_eps_rejected() {
        let config = RefinementConfig {
            guided_filter_eps: 0.0,
            ..RefinementConfig::balanced()
        };
        let result = refine(&blob_mask(8, 8), &photo(8, 8), &config);
        assert!(matches!(
            result,
            Err(RefineError::GuidedFilter(GuidedFilterError::InvalidEpsilon { .. }))
        ));
    }

    #[test]
    fn test_empty_guide_rejected() {
        let empty: Image<Rgba<u8>> = Image::new(0, 0);
        assert_eq!(
            refine(&blob_mask(8, 8), &empty, &RefinementConfig::balanced()),
            Err(RefineError::GuidedFilter(GuidedFilterError::EmptyImage))
        );

        // Without the guided stage the photo is never read.
        let mask = blob_mask(8, 8);
        assert!(refine(&mask, &empty, &RefinementConfig::fast()).is_ok());
    }

    #[test]
    fn test_oversized_feather_radius_rejected() {
        let config = RefinementConfig {
            feather_radius: u32::MAX,
            ..RefinementConfig::balanced()
        };
        assert_eq!(
            config.validate(),
            Err(RefineError::Filter(FilterError::RadiusTooLarge {
                radius: u32::MAX,
                max: MAX_FEATHER_RADIUS,
            }))
        );
    }

    #[test]
    fn test_guide_is_resampled_to_mask_size() {
        let mask = blob_mask(24, 24);
        let refined = refine(&mask, &photo(48, 48), &RefinementConfig::balanced()).unwrap();
        assert_eq!(refined.dimensions(), (24, 24));
    }

    #[test]
    fn test_quality_keeps_subject_aligned_with_guide() {
        let mask = create_disc_mask(40, 40, 20.0, 20.0, 12.0);
        let guide = create_disc_guide(40, 40, 20.0, 20.0, 12.0);
        let refined = refine(&mask, &guide, &RefinementConfig::quality()).unwrap();

        assert!(refined.get_pixel(20, 20)[0] >= 250);
        assert!(refined.get_pixel(0, 0)[0] <= 5);
        assert!(refined.get_pixel(39, 39)[0] <= 5);
    }

    #[test]
    fn test_input_mask_not_mutated() {
        let mask = blob_mask(20, 20);
        let before = mask.clone();
        let _ = refine(&mask, &photo(20, 20), &RefinementConfig::quality()).unwrap();
        assert_eq!(mask, before);
    }
}
