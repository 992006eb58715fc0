//! # imageops-cutout
//!
//! Mask refinement, brush editing and compositing for subject cutouts.
//!
//! The crate takes the coverage mask produced by an external segmentation
//! model and turns it into a finished cutout:
//!
//! - **Refinement**: closing/opening morphology, a guided filter steered by
//!   the original photo, and edge-adaptive feathering, run as one pipeline
//! - **Brush Editing**: erase/restore strokes with pressure, hardness and
//!   opacity, replayed in order onto a copy of the mask, plus undo/redo
//! - **Compositing**: transparent, solid, gradient, blurred, original or
//!   custom-image backgrounds with a scaled/rotated/translated subject
//!
//! Masks are `Image<Luma<u8>>` coverage planes; photos and composites are
//! `Image<Rgba<u8>>`.
//!
//! ## Example Usage
//!
//! ```no_run
//! use imageops_cutout::{
//!     apply_mask_to_image, compose, create_mask_from_foreground, refine, BackgroundSpec,
//!     BrushMode, BrushTool, DrawingPoint, EditSession, Image, RefinementPreset,
//!     SubjectTransform,
//! };
//! use image::Rgba;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let photo: Image<Rgba<u8>> = Image::new(640, 480);
//! let segmented: Image<Rgba<u8>> = Image::new(640, 480);
//!
//! // Seed from the segmenter's alpha channel and refine it
//! let raw_mask = create_mask_from_foreground(&segmented);
//! let refined = refine(&raw_mask, &photo, &RefinementPreset::Quality.config())?;
//!
//! // Touch up by hand
//! let mut session = EditSession::new(refined);
//! session.set_tool(BrushTool::new(BrushMode::Erase, 40.0, 0.8, 1.0)?)?;
//! session.add_stroke([DrawingPoint::new(0.1, 0.1), DrawingPoint::new(0.2, 0.15)]);
//! session.apply_pending()?;
//!
//! // Composite over a white background
//! let cutout = apply_mask_to_image(&photo, session.mask());
//! let result = compose(
//!     &cutout,
//!     &BackgroundSpec::SolidColor(Rgba([255, 255, 255, 255])),
//!     640,
//!     480,
//!     Some(&photo),
//!     &SubjectTransform::identity(),
//!     None,
//! )?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Features
//!
//! - `rayon`: Processes filter rows in parallel
//! - `serde`: Enables serialization of tools, strokes, configs and transforms

mod error;
mod imageops_cutout;
mod utils;

#[cfg(test)]
mod test_utils;

pub use error::{
    AlphaMaskError, BrushError, CompositeError, FilterError, GuidedFilterError, HistoryError,
    RefineError, SessionError,
};
pub use imageops_cutout::apply_alpha_mask::{
    apply_mask_to_image, create_mask_from_foreground, MaskExt, ModifyAlpha, MASK_SENTINEL_COLOR,
};
pub use imageops_cutout::box_filter::BoxFilter;
pub use imageops_cutout::brush::{
    apply_strokes, brush_coverage, smooth_mask, BrushMode, BrushTool, DrawingPath, DrawingPoint,
    MAX_BRUSH_SIZE, MIN_BRUSH_SIZE, MIN_HARDNESS, MIN_OPACITY,
};
pub use imageops_cutout::compositor::{
    blur_radius, box_blur, center_crop_to_fill, compose, fit_dimensions, render_background,
    resize_to_fit, transform_foreground, BackgroundSpec, Color, SubjectTransform,
    MAX_BLUR_RADIUS, MAX_WORKING_DIMENSION, MIN_BLUR_RADIUS,
};
pub use imageops_cutout::feather::{
    feather_edges, FeatherExt, EDGE_STRENGTH_THRESHOLD, MAX_FEATHER_RADIUS,
};
pub use imageops_cutout::guided_filter::{guided_smooth, GuidedFilter, GuidedFilterExt};
pub use imageops_cutout::history::{MaskHistory, DEFAULT_HISTORY_CAPACITY};
pub use imageops_cutout::morphology::{
    apply_closing_then_opening, closing, dilate, erode, opening, Morphology,
};
pub use imageops_cutout::refine::{refine, RefinementConfig, RefinementPreset};
pub use imageops_cutout::session::EditSession;

// Re-export imageproc::definitions::Image for convenience
pub use imageproc::definitions::Image;

/// Single-channel coverage mask
pub type Mask = Image<image::Luma<u8>>;

/// 8-bit RGBA raster
pub type RasterImage = Image<image::Rgba<u8>>;
