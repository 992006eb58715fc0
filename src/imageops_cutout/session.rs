//! Manual editing session over a single working mask.
//!
//! The session owns the working mask, the active [`BrushTool`], the strokes
//! drawn since the last apply, and a [`MaskHistory`] of committed states.
//! Strokes are only rasterized when [`EditSession::apply_pending`] runs, so a
//! batch of gestures produces a single undo step.

use image::{Luma, Rgba};
use imageproc::definitions::Image;
use log::debug;

use crate::error::{BrushError, SessionError};
use crate::imageops_cutout::apply_alpha_mask::{apply_mask_to_image, create_mask_from_foreground};
use crate::imageops_cutout::brush::{apply_strokes, smooth_mask, BrushTool, DrawingPath, DrawingPoint};
use crate::imageops_cutout::history::{MaskHistory, DEFAULT_HISTORY_CAPACITY};

#[derive(Debug, Clone)]
pub struct EditSession {
    mask: Image<Luma<u8>>,
    tool: BrushTool,
    pending: Vec<DrawingPath>,
    history: MaskHistory,
}

impl EditSession {
    /// Starts a session on `mask`, which becomes the oldest undo state
    pub fn new(mask: Image<Luma<u8>>) -> Self {
        Self::with_history_capacity(mask, DEFAULT_HISTORY_CAPACITY)
    }

    pub fn with_history_capacity(mask: Image<Luma<u8>>, capacity: usize) -> Self {
        let mut history = MaskHistory::new(capacity);
        history.push(mask.clone());
        Self {
            mask,
            tool: BrushTool::default(),
            pending: Vec::new(),
            history,
        }
    }

    /// Seeds a session from the alpha channel of a segmented foreground
    pub fn from_foreground(foreground: &Image<Rgba<u8>>) -> Self {
        Self::new(create_mask_from_foreground(foreground))
    }

    pub const fn tool(&self) -> &BrushTool {
        &self.tool
    }

    /// Replaces the active tool for strokes started afterwards.
    ///
    /// # Errors
    ///
    /// * `BrushError::InvalidParameter` - When a tool parameter is out of range
    pub fn set_tool(&mut self, tool: BrushTool) -> Result<(), BrushError> {
        tool.validate()?;
        self.tool = tool;
        Ok(())
    }

    /// Queues a finished stroke.
    pub fn add_path(&mut self, path: DrawingPath) {
        self.pending.push(path);
    }

    /// Queues a stroke drawn with the active tool.
    pub fn add_stroke(&mut self, points: impl IntoIterator<Item = DrawingPoint>) {
        self.add_path(DrawingPath::from_points(self.tool, points));
    }

    pub fn pending_paths(&self) -> &[DrawingPath] {
        &self.pending
    }

    /// Drops queued strokes without applying them
    pub fn discard_pending(&mut self) {
        self.pending.clear();
    }

    /// Rasterizes all queued strokes in order and commits the result.
    ///
    /// With nothing queued the mask is left as is and no undo step is
    /// recorded. On error the queue is kept so the caller can inspect it.
    ///
    /// # Errors
    ///
    /// * `SessionError::Brush` - When a queued path has an invalid tool or point
    pub fn apply_pending(&mut self) -> Result<&Image<Luma<u8>>, SessionError> {
        if self.pending.is_empty() {
            return Ok(&self.mask);
        }

        let (width, height) = self.mask.dimensions();
        let edited = apply_strokes(&self.mask, &self.pending, width, height)?;
        debug!("committed {} stroke(s)", self.pending.len());
        self.pending.clear();
        self.commit(edited);
        Ok(&self.mask)
    }

    /// Box-blurs the interior of the working mask and commits the result.
    ///
    /// # Errors
    ///
    /// * `SessionError::Brush` - When the mask cannot be filtered
    pub fn smooth(&mut self, radius: u32) -> Result<&Image<Luma<u8>>, SessionError> {
        let smoothed = smooth_mask(&self.mask, radius).map_err(BrushError::from)?;
        self.commit(smoothed);
        Ok(&self.mask)
    }

    /// Restores the previous committed mask. Queued strokes are discarded.
    ///
    /// # Errors
    ///
    /// * `SessionError::History` - When there is no earlier state
    pub fn undo(&mut self) -> Result<&Image<Luma<u8>>, SessionError> {
        let previous = self.history.undo()?;
        self.mask = previous.clone();
        self.pending.clear();
        Ok(&self.mask)
    }

    /// Re-applies the next committed mask. Queued strokes are discarded.
    ///
    /// # Errors
    ///
    /// * `SessionError::History` - When there is no later state
    pub fn redo(&mut self) -> Result<&Image<Luma<u8>>, SessionError> {
        let next = self.history.redo()?;
        self.mask = next.clone();
        self.pending.clear();
        Ok(&self.mask)
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// The working mask as of the last commit
    pub const fn mask(&self) -> &Image<Luma<u8>> {
        &self.mask
    }

    pub fn into_mask(self) -> Image<Luma<u8>> {
        self.mask
    }

    /// Applies the working mask to `original` as its alpha channel.
    ///
    /// Queued strokes are not included; call [`apply_pending`](Self::apply_pending) first.
    pub fn export_cutout(&self, original: &Image<Rgba<u8>>) -> Image<Rgba<u8>> {
        apply_mask_to_image(original, &self.mask)
    }

    fn commit(&mut self, mask: Image<Luma<u8>>) {
        self.history.push(mask.clone());
        self.mask = mask;
    }
}
