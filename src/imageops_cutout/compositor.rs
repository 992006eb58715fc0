//! Background rendering and subject compositing.
//!
//! [`compose`] renders a [`BackgroundSpec`] into a fresh canvas, places the
//! foreground cutout in the middle of it, applies the [`SubjectTransform`]
//! and draws the result over the background with source-over blending.

use image::imageops::{self, FilterType};
use image::Rgba;
use imageproc::definitions::Image;
use log::{debug, warn};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::CompositeError;
use crate::imageops_cutout::box_filter::BoxFilter;
use crate::utils::{for_each_row, round_to_u8};

/// An RGBA colour
pub type Color = Rgba<u8>;

/// Largest side length of a working buffer.
///
/// Canvases with more than `MAX_WORKING_DIMENSION²` pixels are rejected;
/// oversized inputs should go through [`resize_to_fit`] first.
pub const MAX_WORKING_DIMENSION: u32 = 4096;

/// Range the blur intensity is clamped into, in pixels of box radius
pub const MIN_BLUR_RADIUS: u32 = 1;
pub const MAX_BLUR_RADIUS: u32 = 25;

/// Background drawn behind the subject
#[derive(Debug, Clone, PartialEq, Default)]
pub enum BackgroundSpec {
    /// Fully transparent canvas
    #[default]
    Transparent,
    SolidColor(Color),
    /// Linear gradient through the canvas centre.
    ///
    /// `angle` is in degrees; 0° runs left to right and positive angles turn
    /// clockwise in image coordinates (y pointing down).
    Gradient { start: Color, end: Color, angle: f32 },
    /// Box blur of the original photo; the value is the blur radius before clamping
    Blur(f32),
    /// The original photo as is
    Original,
    /// A user image, scaled and centre-cropped to cover the canvas
    CustomImage(Image<Rgba<u8>>),
}

impl BackgroundSpec {
    /// Short lowercase name used in logs and errors
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Transparent => "transparent",
            Self::SolidColor(_) => "solid color",
            Self::Gradient { .. } => "gradient",
            Self::Blur(_) => "blur",
            Self::Original => "original",
            Self::CustomImage(_) => "custom image",
        }
    }
}

/// Placement of the foreground on the canvas.
///
/// Scale, then rotation, then translation, all about the foreground's own
/// centre. The untransformed foreground sits in the middle of the canvas;
/// translation is in canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SubjectTransform {
    pub translate_x: f32,
    pub translate_y: f32,
    pub scale: f32,
    pub rotation_degrees: f32,
}

impl SubjectTransform {
    pub const fn identity() -> Self {
        Self {
            translate_x: 0.0,
            translate_y: 0.0,
            scale: 1.0,
            rotation_degrees: 0.0,
        }
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::identity()
    }

    fn validate(&self) -> Result<(), CompositeError> {
        let Self {
            translate_x,
            translate_y,
            scale,
            rotation_degrees,
        } = *self;
        if ![translate_x, translate_y, rotation_degrees].iter().all(|v| v.is_finite()) {
            return Err(CompositeError::InvalidParameter(format!(
                "transform must be finite, got {self:?}"
            )));
        }
        if !scale.is_finite() || scale <= 0.0 {
            return Err(CompositeError::InvalidParameter(format!(
                "scale must be finite and > 0, got {scale}"
            )));
        }
        Ok(())
    }
}

impl Default for SubjectTransform {
    fn default() -> Self {
        Self::identity()
    }
}

/// Composites `foreground` over a rendered background.
///
/// `original` feeds the `Blur` and `Original` variants; `precomputed_background`
/// is an already blurred photo that `Blur` uses instead of blurring again.
/// When a variant's input is missing the background is left transparent and
/// compositing carries on.
///
/// # Errors
///
/// * `CompositeError::InvalidCanvas` - When `width` or `height` is zero
/// * `CompositeError::AllocationFailure` - When the canvas exceeds the working-set limit
/// * `CompositeError::InvalidParameter` - When the transform or blur intensity is not usable
///
/// # Examples
///
/// ```no_run
/// use imageops_cutout::{compose, BackgroundSpec, Image, SubjectTransform};
/// use image::Rgba;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let cutout: Image<Rgba<u8>> = Image::new(640, 480);
/// let background = BackgroundSpec::SolidColor(Rgba([255, 255, 255, 255]));
///
/// let result = compose(
///     &cutout,
///     &background,
///     640,
///     480,
///     None,
///     &SubjectTransform::identity(),
///     None,
/// )?;
/// # Ok(())
/// # }
/// ```
pub fn compose(
    foreground: &Image<Rgba<u8>>,
    background: &BackgroundSpec,
    width: u32,
    height: u32,
    original: Option<&Image<Rgba<u8>>>,
    transform: &SubjectTransform,
    precomputed_background: Option<&Image<Rgba<u8>>>,
) -> Result<Image<Rgba<u8>>, CompositeError> {
    validate_canvas(width, height)?;
    transform.validate()?;
    debug!(
        "compositing {}x{} foreground on {} background, canvas {}x{}",
        foreground.width(),
        foreground.height(),
        background.name(),
        width,
        height
    );

    let mut canvas =
        match render_background(background, width, height, original, precomputed_background) {
            Ok(canvas) => canvas,
            Err(CompositeError::MissingAuxiliaryInput(variant)) => {
                warn!("{variant} background needs an input that was not supplied; leaving it transparent");
                Image::new(width, height)
            }
            Err(err) => return Err(err),
        };

    let placed = transform_foreground(foreground, width, height, transform)?;
    imageops::overlay(&mut canvas, &placed, 0, 0);

    Ok(canvas)
}

/// Renders only the background of a composite.
///
/// # Errors
///
/// * `CompositeError::MissingAuxiliaryInput` - When `Blur` has neither a
///   precomputed buffer nor an original, or `Original` has no original
/// * `CompositeError::InvalidCanvas` / `AllocationFailure` - For unusable canvas sizes
/// * `CompositeError::InvalidParameter` - For a non-finite blur intensity or gradient angle,
///   or an empty custom image, original or precomputed blur
pub fn render_background(
    background: &BackgroundSpec,
    width: u32,
    height: u32,
    original: Option<&Image<Rgba<u8>>>,
    precomputed_background: Option<&Image<Rgba<u8>>>,
) -> Result<Image<Rgba<u8>>, CompositeError> {
    validate_canvas(width, height)?;

    match background {
        BackgroundSpec::Transparent => Ok(Image::new(width, height)),
        BackgroundSpec::SolidColor(color) => Ok(Image::from_pixel(width, height, *color)),
        BackgroundSpec::Gradient { start, end, angle } => {
            if !angle.is_finite() {
                return Err(CompositeError::InvalidParameter(format!(
                    "gradient angle must be finite, got {angle}"
                )));
            }
            Ok(linear_gradient(width, height, *start, *end, *angle))
        }
        BackgroundSpec::Blur(intensity) => {
            let radius = blur_radius(*intensity)?;
            if let Some(blurred) = precomputed_background {
                debug!("reusing precomputed blur background");
                return fit_to_canvas(blurred, width, height);
            }
            let original = original.ok_or(CompositeError::MissingAuxiliaryInput("blur"))?;
            debug!("blurring original with radius {radius}");
            Ok(box_blur(&fit_to_canvas(original, width, height)?, radius))
        }
        BackgroundSpec::Original => {
            let original = original.ok_or(CompositeError::MissingAuxiliaryInput("original"))?;
            fit_to_canvas(original, width, height)
        }
        BackgroundSpec::CustomImage(image) => center_crop_to_fill(image, width, height),
    }
}

/// Box radius used for a blur intensity: rounded, then clamped to `[1, 25]`.
///
/// # Errors
///
/// * `CompositeError::InvalidParameter` - When `intensity` is not finite
pub fn blur_radius(intensity: f32) -> Result<u32, CompositeError> {
    if !intensity.is_finite() {
        return Err(CompositeError::InvalidParameter(format!(
            "blur intensity must be finite, got {intensity}"
        )));
    }
    let radius = intensity
        .round()
        .clamp(MIN_BLUR_RADIUS as f32, MAX_BLUR_RADIUS as f32);
    Ok(radius as u32)
}

/// Separable mean filter over the RGB channels; alpha is left untouched.
///
/// Border samples are clamped to the nearest edge pixel.
#[must_use]
pub fn box_blur(image: &Image<Rgba<u8>>, radius: u32) -> Image<Rgba<u8>> {
    // An empty image is the only failure and blurs to itself.
    image.box_filter(radius).unwrap_or_else(|_| image.clone())
}

/// Output size of [`resize_to_fit`] for a `width`×`height` input.
pub fn fit_dimensions(width: u32, height: u32, max_dimension: u32) -> (u32, u32) {
    let larger = width.max(height);
    if larger <= max_dimension {
        return (width, height);
    }

    let scale_side = |side: u32| {
        let scaled = u64::from(side) * u64::from(max_dimension) / u64::from(larger);
        (scaled as u32).max(1)
    };
    (scale_side(width), scale_side(height))
}

/// Downscales `image` so neither side exceeds `max_dimension`, keeping the aspect ratio.
///
/// Images that already fit are returned unchanged. The shorter side is
/// truncated, so 5000×3000 at 4096 becomes 4096×2457.
#[must_use]
pub fn resize_to_fit(image: &Image<Rgba<u8>>, max_dimension: u32) -> Image<Rgba<u8>> {
    let (width, height) = image.dimensions();
    let (new_width, new_height) = fit_dimensions(width, height, max_dimension.max(1));
    if (new_width, new_height) == (width, height) {
        return image.clone();
    }

    debug!("resizing {width}x{height} to {new_width}x{new_height}");
    imageops::resize(image, new_width, new_height, FilterType::Triangle)
}

/// Scales `image` uniformly until it covers `width`×`height`, then crops the overflow around the centre.
///
/// # Errors
///
/// * `CompositeError::InvalidParameter` - When `image` has a zero dimension
/// * `CompositeError::InvalidCanvas` / `AllocationFailure` - For unusable target sizes
pub fn center_crop_to_fill(
    image: &Image<Rgba<u8>>,
    width: u32,
    height: u32,
) -> Result<Image<Rgba<u8>>, CompositeError> {
    validate_canvas(width, height)?;
    let (source_width, source_height) = image.dimensions();
    if source_width == 0 || source_height == 0 {
        return Err(CompositeError::InvalidParameter(
            "custom background image is empty".to_string(),
        ));
    }

    let scale = f64::max(
        f64::from(width) / f64::from(source_width),
        f64::from(height) / f64::from(source_height),
    );
    let scaled_width = ((f64::from(source_width) * scale).round() as u32).max(width);
    let scaled_height = ((f64::from(source_height) * scale).round() as u32).max(height);

    let scaled;
    let covering = if (scaled_width, scaled_height) == (source_width, source_height) {
        image
    } else {
        scaled = imageops::resize(image, scaled_width, scaled_height, FilterType::Triangle);
        &scaled
    };

    let left = (scaled_width - width) / 2;
    let top = (scaled_height - height) / 2;
    Ok(imageops::crop_imm(covering, left, top, width, height).to_image())
}

/// Draws `foreground` on a transparent `width`×`height` canvas with `transform` applied.
///
/// Pixels are pulled through the inverse transform and sampled bilinearly on
/// premultiplied values.
///
/// # Errors
///
/// * `CompositeError::InvalidParameter` - When the transform is not finite or `scale <= 0`
/// * `CompositeError::InvalidCanvas` / `AllocationFailure` - For unusable canvas sizes
pub fn transform_foreground(
    foreground: &Image<Rgba<u8>>,
    width: u32,
    height: u32,
    transform: &SubjectTransform,
) -> Result<Image<Rgba<u8>>, CompositeError> {
    validate_canvas(width, height)?;
    transform.validate()?;

    let mut output: Image<Rgba<u8>> = Image::new(width, height);
    let (fg_width, fg_height) = foreground.dimensions();
    if fg_width == 0 || fg_height == 0 {
        return Ok(output);
    }

    // The untransformed subject sits on whole pixels, so both paths agree
    // when the transform is close to the identity.
    let left = centered_offset(width, fg_width);
    let top = centered_offset(height, fg_height);
    if transform.is_identity() {
        imageops::replace(&mut output, foreground, left, top);
        return Ok(output);
    }

    let (sin, cos) = transform.rotation_degrees.to_radians().sin_cos();
    let fg_center_x = fg_width as f32 / 2.0;
    let fg_center_y = fg_height as f32 / 2.0;
    let pivot_x = left as f32 + fg_center_x + transform.translate_x;
    let pivot_y = top as f32 + fg_center_y + transform.translate_y;

    let row_len = width as usize * 4;
    for_each_row(&mut *output, row_len, |y, row| {
        let dy = y as f32 + 0.5 - pivot_y;
        for (x, pixel) in row.chunks_exact_mut(4).enumerate() {
            let dx = x as f32 + 0.5 - pivot_x;
            // Undo translation, then rotation, then scale.
            let local_x = dx.mul_add(cos, dy * sin) / transform.scale;
            let local_y = dy.mul_add(cos, -dx * sin) / transform.scale;
            let source_x = local_x + fg_center_x - 0.5;
            let source_y = local_y + fg_center_y - 0.5;
            if let Some(Rgba(sampled)) = sample_bilinear(foreground, source_x, source_y) {
                pixel.copy_from_slice(&sampled);
            }
        }
    });

    Ok(output)
}

/// Bilinear sample at pixel-index coordinates, or `None` outside the image footprint
fn sample_bilinear(image: &Image<Rgba<u8>>, x: f32, y: f32) -> Option<Rgba<u8>> {
    let (width, height) = image.dimensions();
    let (max_x, max_y) = ((width - 1) as f32, (height - 1) as f32);
    if !(-0.5..=max_x + 0.5).contains(&x) || !(-0.5..=max_y + 0.5).contains(&y) {
        return None;
    }

    let x = x.clamp(0.0, max_x);
    let y = y.clamp(0.0, max_y);
    let (x0, y0) = (x.floor() as u32, y.floor() as u32);
    let (x1, y1) = ((x0 + 1).min(width - 1), (y0 + 1).min(height - 1));
    let (fx, fy) = (x - x0 as f32, y - y0 as f32);

    let mut premultiplied = [0.0f32; 4];
    for (px, py, weight) in [
        (x0, y0, (1.0 - fx) * (1.0 - fy)),
        (x1, y0, fx * (1.0 - fy)),
        (x0, y1, (1.0 - fx) * fy),
        (x1, y1, fx * fy),
    ] {
        let Rgba([red, green, blue, alpha]) = *image.get_pixel(px, py);
        let alpha = f32::from(alpha);
        let scaled_alpha = weight * alpha / 255.0;
        premultiplied[0] += f32::from(red) * scaled_alpha;
        premultiplied[1] += f32::from(green) * scaled_alpha;
        premultiplied[2] += f32::from(blue) * scaled_alpha;
        premultiplied[3] += weight * alpha;
    }

    let alpha = premultiplied[3];
    if alpha <= 0.0 {
        return Some(Rgba([0, 0, 0, 0]));
    }
    let unpremultiply = |value: f32| round_to_u8(value * 255.0 / alpha);
    Some(Rgba([
        unpremultiply(premultiplied[0]),
        unpremultiply(premultiplied[1]),
        unpremultiply(premultiplied[2]),
        round_to_u8(alpha),
    ]))
}

fn linear_gradient(width: u32, height: u32, start: Color, end: Color, angle: f32) -> Image<Rgba<u8>> {
    let (sin, cos) = angle.to_radians().sin_cos();
    let center_x = width as f32 / 2.0;
    let center_y = height as f32 / 2.0;
    let half_diagonal = (width as f32).hypot(height as f32) / 2.0;

    Image::from_fn(width, height, |x, y| {
        let projection = (x as f32 + 0.5 - center_x).mul_add(cos, (y as f32 + 0.5 - center_y) * sin);
        let t = ((projection + half_diagonal) / (2.0 * half_diagonal)).clamp(0.0, 1.0);

        let mut channels = [0u8; 4];
        for ((out, from), to) in channels.iter_mut().zip(start.0).zip(end.0) {
            let (from, to) = (f32::from(from), f32::from(to));
            *out = round_to_u8((to - from).mul_add(t, from));
        }
        Rgba(channels)
    })
}

/// Resamples `image` to the canvas size when they differ
fn fit_to_canvas(
    image: &Image<Rgba<u8>>,
    width: u32,
    height: u32,
) -> Result<Image<Rgba<u8>>, CompositeError> {
    let (source_width, source_height) = image.dimensions();
    if source_width == 0 || source_height == 0 {
        return Err(CompositeError::InvalidParameter(format!(
            "background source is empty ({source_width}x{source_height})"
        )));
    }
    if (source_width, source_height) == (width, height) {
        Ok(image.clone())
    } else {
        Ok(imageops::resize(image, width, height, FilterType::Triangle))
    }
}

/// Offset that centres a `content`-wide span on a `canvas`-wide one, rounded towards zero
fn centered_offset(canvas: u32, content: u32) -> i64 {
    (i64::from(canvas) - i64::from(content)) / 2
}

fn validate_canvas(width: u32, height: u32) -> Result<(), CompositeError> {
    if width == 0 || height == 0 {
        return Err(CompositeError::InvalidCanvas { width, height });
    }
    let limit = u64::from(MAX_WORKING_DIMENSION) * u64::from(MAX_WORKING_DIMENSION);
    if u64::from(width) * u64::from(height) > limit {
        return Err(CompositeError::AllocationFailure {
            width,
            height,
            limit,
        });
    }
    Ok(())
}
