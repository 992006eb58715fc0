//! Manual mask editing with erase/restore brush strokes.
//!
//! A [`DrawingPath`] is an ordered list of normalized points bound to the
//! [`BrushTool`] it was drawn with. [`apply_strokes`] replays paths in order
//! on one copy of the base mask. Each path is first rasterized into a
//! coverage footprint (round-capped thick segments between consecutive
//! points, with a radial hardness falloff) and then blended once:
//!
//! ```text
//! Erase:   out = m * (1 - c * opacity)
//! Restore: out = m + (255 - m) * c * opacity
//! ```
//!
//! where `m` is the existing coverage and `c` the brush footprint at that pixel.

use std::time::{SystemTime, UNIX_EPOCH};

use image::Luma;
use imageproc::definitions::Image;
use itertools::iproduct;
use log::{debug, trace};

use crate::error::{BrushError, FilterError};
use crate::utils::round_to_u8;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Smallest accepted brush diameter in pixels
pub const MIN_BRUSH_SIZE: f32 = 10.0;
/// Largest accepted brush diameter in pixels
pub const MAX_BRUSH_SIZE: f32 = 200.0;
/// Smallest accepted hardness; `1.0` is a hard edge
pub const MIN_HARDNESS: f32 = 0.1;
/// Smallest accepted opacity
pub const MIN_OPACITY: f32 = 0.1;

/// How a stroke changes the mask
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum BrushMode {
    /// Removes coverage where the brush passes
    #[default]
    Erase,
    /// Adds coverage only where the mask is not already opaque
    Restore,
}

/// Immutable brush parameters
///
/// Every setter returns a new validated tool; a parameter change replaces
/// the old value instead of mutating it.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BrushTool {
    mode: BrushMode,
    size: f32,
    hardness: f32,
    opacity: f32,
    spacing: f32,
}

impl Default for BrushTool {
    fn default() -> Self {
        Self {
            mode: BrushMode::Erase,
            size: 50.0,
            hardness: 0.8,
            opacity: 1.0,
            spacing: 0.1,
        }
    }
}

impl BrushTool {
    /// Creates a tool, validating every range.
    ///
    /// # Arguments
    ///
    /// * `size` - Stroke diameter in pixels, `[10, 200]`
    /// * `hardness` - Fraction of the radius painted at full strength, `[0.1, 1.0]`
    /// * `opacity` - Global strength, `[0.1, 1.0]`
    ///
    /// # Errors
    ///
    /// * `BrushError::InvalidParameter` - When a value is out of range or not finite
    pub fn new(mode: BrushMode, size: f32, hardness: f32, opacity: f32) -> Result<Self, BrushError> {
        let tool = Self {
            mode,
            size,
            hardness,
            opacity,
            ..Self::default()
        };
        tool.validate()?;
        Ok(tool)
    }

    pub const fn mode(&self) -> BrushMode {
        self.mode
    }

    pub const fn size(&self) -> f32 {
        self.size
    }

    pub const fn hardness(&self) -> f32 {
        self.hardness
    }

    pub const fn opacity(&self) -> f32 {
        self.opacity
    }

    /// Dab spacing as a fraction of the diameter. Only a UI hint; rasterization
    /// draws continuous segments regardless.
    pub const fn spacing(&self) -> f32 {
        self.spacing
    }

    #[must_use]
    pub const fn with_mode(self, mode: BrushMode) -> Self {
        Self { mode, ..self }
    }

    /// # Errors
    ///
    /// * `BrushError::InvalidParameter` - When `size` is outside `[10, 200]`
    pub fn with_size(self, size: f32) -> Result<Self, BrushError> {
        check_range("size", size, MIN_BRUSH_SIZE, MAX_BRUSH_SIZE)?;
        Ok(Self { size, ..self })
    }

    /// # Errors
    ///
    /// * `BrushError::InvalidParameter` - When `hardness` is outside `[0.1, 1.0]`
    pub fn with_hardness(self, hardness: f32) -> Result<Self, BrushError> {
        check_range("hardness", hardness, MIN_HARDNESS, 1.0)?;
        Ok(Self { hardness, ..self })
    }

    /// # Errors
    ///
    /// * `BrushError::InvalidParameter` - When `opacity` is outside `[0.1, 1.0]`
    pub fn with_opacity(self, opacity: f32) -> Result<Self, BrushError> {
        check_range("opacity", opacity, MIN_OPACITY, 1.0)?;
        Ok(Self { opacity, ..self })
    }

    /// # Errors
    ///
    /// * `BrushError::InvalidParameter` - When `spacing` is outside `[0, 1]`
    pub fn with_spacing(self, spacing: f32) -> Result<Self, BrushError> {
        check_range("spacing", spacing, 0.0, 1.0)?;
        Ok(Self { spacing, ..self })
    }

    /// Re-checks every range; used on tools that did not come through a constructor.
    ///
    /// # Errors
    ///
    /// * `BrushError::InvalidParameter` - For the first out-of-range value
    pub fn validate(&self) -> Result<(), BrushError> {
        check_range("size", self.size, MIN_BRUSH_SIZE, MAX_BRUSH_SIZE)?;
        check_range("hardness", self.hardness, MIN_HARDNESS, 1.0)?;
        check_range("opacity", self.opacity, MIN_OPACITY, 1.0)?;
        check_range("spacing", self.spacing, 0.0, 1.0)
    }
}

fn check_range(name: &'static str, value: f32, min: f32, max: f32) -> Result<(), BrushError> {
    if value.is_finite() && (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(BrushError::InvalidParameter {
            name,
            value,
            min,
            max,
        })
    }
}

/// A sampled stroke position in normalized image space
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DrawingPoint {
    /// Horizontal position, `0.0` = left edge, `1.0` = right edge
    pub x: f32,
    /// Vertical position, `0.0` = top edge, `1.0` = bottom edge
    pub y: f32,
    /// Stylus pressure in `[0, 1]`; scales the stroke radius
    pub pressure: f32,
}

impl DrawingPoint {
    /// Point at full pressure
    pub const fn new(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            pressure: 1.0,
        }
    }

    #[must_use]
    pub const fn with_pressure(self, pressure: f32) -> Self {
        Self { pressure, ..self }
    }

    fn validate(&self) -> Result<(), BrushError> {
        if self.x.is_finite() && self.y.is_finite() && self.pressure.is_finite() {
            Ok(())
        } else {
            Err(BrushError::InvalidPoint {
                x: self.x,
                y: self.y,
                pressure: self.pressure,
            })
        }
    }
}

/// One completed stroke gesture and the tool it was drawn with
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DrawingPath {
    tool: BrushTool,
    points: Vec<DrawingPoint>,
    timestamp_ms: u128,
}

impl DrawingPath {
    /// Starts an empty path bound to a snapshot of `tool`
    pub fn new(tool: BrushTool) -> Self {
        let timestamp_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_millis())
            .unwrap_or_default();

        Self {
            tool,
            points: Vec::new(),
            timestamp_ms,
        }
    }

    /// Builds a path from a complete point list
    pub fn from_points(tool: BrushTool, points: impl IntoIterator<Item = DrawingPoint>) -> Self {
        let mut path = Self::new(tool);
        path.points.extend(points);
        path
    }

    pub fn push(&mut self, point: DrawingPoint) {
        self.points.push(point);
    }

    pub const fn tool(&self) -> &BrushTool {
        &self.tool
    }

    pub fn points(&self) -> &[DrawingPoint] {
        &self.points
    }

    /// Milliseconds since the Unix epoch at which the path was started
    pub const fn timestamp_ms(&self) -> u128 {
        self.timestamp_ms
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Brush footprint at `distance` from the dab centre.
///
/// Full strength out to `hardness * radius`, then a linear fade to zero at
/// `radius`. A hardness of `1.0` gives a hard-edged disc.
pub fn brush_coverage(distance: f32, radius: f32, hardness: f32) -> f32 {
    if radius <= 0.0 || distance > radius {
        return 0.0;
    }
    if hardness >= 1.0 {
        return 1.0;
    }

    let inner = radius * hardness;
    if distance <= inner {
        1.0
    } else {
        ((radius - distance) / (radius - inner)).clamp(0.0, 1.0)
    }
}

/// Replays `paths` in order on a copy of `base_mask`.
///
/// Later paths layer over earlier ones. Points are mapped to pixels by
/// `x * width`, `y * height`; the effective stroke radius at a point is
/// `size * pressure / 2`. Paths without points leave the mask unchanged.
///
/// # Errors
///
/// * `BrushError::DimensionMismatch` - When `base_mask` is not `width x height`
/// * `BrushError::InvalidParameter` - When a path's tool has an out-of-range value
/// * `BrushError::InvalidPoint` - When a point is not finite
pub fn apply_strokes(
    base_mask: &Image<Luma<u8>>,
    paths: &[DrawingPath],
    width: u32,
    height: u32,
) -> Result<Image<Luma<u8>>, BrushError> {
    if base_mask.dimensions() != (width, height) {
        return Err(BrushError::DimensionMismatch {
            expected: (width, height),
            actual: base_mask.dimensions(),
        });
    }
    for path in paths {
        path.tool.validate()?;
        path.points.iter().try_for_each(DrawingPoint::validate)?;
    }

    debug!("replaying {} stroke(s) on {}x{} mask", paths.len(), width, height);

    let mut mask = base_mask.clone();
    for path in paths.iter().filter(|path| !path.is_empty()) {
        trace!(
            "{:?} stroke: {} point(s), size {}, hardness {}, opacity {}",
            path.tool.mode,
            path.len(),
            path.tool.size,
            path.tool.hardness,
            path.tool.opacity
        );
        if let Some(footprint) = Footprint::rasterize(path, width, height) {
            footprint.blend_into(&mut mask, &path.tool);
        }
    }

    Ok(mask)
}

/// Unweighted box blur of the mask interior.
///
/// Pixels closer than `radius` to any border keep their original value;
/// only pixels whose full `(2 * radius + 1)²` window lies inside the image
/// are smoothed. A radius of `0` returns a copy.
///
/// # Errors
///
/// * `FilterError::EmptyImage` - When the mask has a zero dimension
pub fn smooth_mask(mask: &Image<Luma<u8>>, radius: u32) -> Result<Image<Luma<u8>>, FilterError> {
    let (width, height) = mask.dimensions();
    if width == 0 || height == 0 {
        return Err(FilterError::EmptyImage);
    }

    let mut output = mask.clone();
    let span = 2 * u64::from(radius);
    if radius == 0 || span >= u64::from(width) || span >= u64::from(height) {
        return Ok(output);
    }

    // Summed-area table with a zero row and column in front.
    let stride = width as usize + 1;
    let mut table = vec![0u64; stride * (height as usize + 1)];
    for (y, row) in mask.as_raw().chunks_exact(width as usize).enumerate() {
        let mut row_sum = 0u64;
        for (x, &value) in row.iter().enumerate() {
            row_sum += u64::from(value);
            table[(y + 1) * stride + x + 1] = table[y * stride + x + 1] + row_sum;
        }
    }

    let r = radius as usize;
    let side = 2 * r + 1;
    let area = (side * side) as u64;
    for (y, x) in iproduct!(r..height as usize - r, r..width as usize - r) {
        let (x1, y1, x2, y2) = (x - r, y - r, x + r + 1, y + r + 1);
        let sum = table[y2 * stride + x2] + table[y1 * stride + x1]
            - table[y1 * stride + x2]
            - table[y2 * stride + x1];
        output.put_pixel(x as u32, y as u32, Luma([((sum + area / 2) / area) as u8]));
    }

    Ok(output)
}

/// Dab centre and radius in pixel space
#[derive(Debug, Clone, Copy)]
struct Dab {
    x: f32,
    y: f32,
    radius: f32,
}

/// Stroke coverage over the bounding box of one path
struct Footprint {
    left: u32,
    top: u32,
    width: u32,
    height: u32,
    coverage: Vec<f32>,
}

impl Footprint {
    fn rasterize(path: &DrawingPath, canvas_width: u32, canvas_height: u32) -> Option<Self> {
        let dabs: Vec<Dab> = path
            .points
            .iter()
            .map(|point| Dab {
                x: point.x * canvas_width as f32,
                y: point.y * canvas_height as f32,
                radius: path.tool.size * point.pressure.clamp(0.0, 1.0) / 2.0,
            })
            .collect();

        let (min_x, min_y, max_x, max_y) = dabs.iter().fold(
            (f32::INFINITY, f32::INFINITY, f32::NEG_INFINITY, f32::NEG_INFINITY),
            |(min_x, min_y, max_x, max_y), dab| {
                (
                    min_x.min(dab.x - dab.radius),
                    min_y.min(dab.y - dab.radius),
                    max_x.max(dab.x + dab.radius),
                    max_y.max(dab.y + dab.radius),
                )
            },
        );

        let left = min_x.floor().max(0.0) as u32;
        let top = min_y.floor().max(0.0) as u32;
        let right = (max_x.ceil().max(0.0) as u32).min(canvas_width);
        let bottom = (max_y.ceil().max(0.0) as u32).min(canvas_height);
        if left >= right || top >= bottom {
            return None;
        }

        let mut footprint = Self {
            left,
            top,
            width: right - left,
            height: bottom - top,
            coverage: vec![0.0; ((right - left) * (bottom - top)) as usize],
        };

        let hardness = path.tool.hardness;
        match dabs.as_slice() {
            [single] => footprint.stamp_segment(*single, *single, hardness),
            _ => dabs
                .windows(2)
                .for_each(|pair| footprint.stamp_segment(pair[0], pair[1], hardness)),
        }

        Some(footprint)
    }

    /// Max-accumulates a round-capped segment whose radius varies linearly
    /// from `start.radius` to `end.radius`.
    fn stamp_segment(&mut self, start: Dab, end: Dab, hardness: f32) {
        let max_radius = start.radius.max(end.radius);
        if max_radius <= 0.0 {
            return;
        }

        let x0 = ((start.x.min(end.x) - max_radius).floor() - self.left as f32).max(0.0) as u32;
        let y0 = ((start.y.min(end.y) - max_radius).floor() - self.top as f32).max(0.0) as u32;
        let x1 = (((start.x.max(end.x) + max_radius).ceil() - self.left as f32).max(0.0) as u32)
            .min(self.width);
        let y1 = (((start.y.max(end.y) + max_radius).ceil() - self.top as f32).max(0.0) as u32)
            .min(self.height);

        let (dx, dy) = (end.x - start.x, end.y - start.y);
        let length_sq = dx.mul_add(dx, dy * dy);

        for ly in y0..y1 {
            let py = (self.top + ly) as f32 + 0.5;
            for lx in x0..x1 {
                let px = (self.left + lx) as f32 + 0.5;

                let t = if length_sq > 0.0 {
                    ((px - start.x).mul_add(dx, (py - start.y) * dy) / length_sq).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                let (cx, cy) = (t.mul_add(dx, start.x), t.mul_add(dy, start.y));
                let radius = t.mul_add(end.radius - start.radius, start.radius);
                let distance = (px - cx).hypot(py - cy);

                let value = brush_coverage(distance, radius, hardness);
                let slot = &mut self.coverage[(ly * self.width + lx) as usize];
                *slot = slot.max(value);
            }
        }
    }

    fn blend_into(&self, mask: &mut Image<Luma<u8>>, tool: &BrushTool) {
        for ly in 0..self.height {
            for lx in 0..self.width {
                let coverage = self.coverage[(ly * self.width + lx) as usize];
                if coverage <= 0.0 {
                    continue;
                }

                let strength = coverage * tool.opacity;
                let pixel = mask.get_pixel_mut(self.left + lx, self.top + ly);
                let existing = f32::from(pixel[0]);
                let blended = match tool.mode {
                    BrushMode::Erase => existing * (1.0 - strength),
                    BrushMode::Restore => (255.0 - existing).mul_add(strength, existing),
                };
                pixel[0] = round_to_u8(blended);
            }
        }
    }
}
