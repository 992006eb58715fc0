use thiserror::Error;

/// Error type for neighbourhood filters operating on a single mask
///
/// Covers feathering, box filtering and mask smoothing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    /// The input image has a zero dimension
    #[error("Image dimensions must be non-zero")]
    EmptyImage,

    /// The radius exceeds what the filter accepts
    #[error("Radius {radius} exceeds the maximum of {max}")]
    RadiusTooLarge { radius: u32, max: u32 },
}

/// Error type for guided filter operations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GuidedFilterError {
    /// Guidance and input images differ in size
    ///
    /// The filter never resamples on its own; callers resize the guide first.
    #[error("Dimension mismatch: guidance {guidance_dims:?} vs input {input_dims:?}")]
    DimensionMismatch {
        guidance_dims: (u32, u32),
        input_dims: (u32, u32),
    },

    /// Regularization must be finite and strictly positive
    #[error("Invalid epsilon: {epsilon} (must be finite and > 0)")]
    InvalidEpsilon { epsilon: f32 },

    /// The input image has a zero dimension
    #[error("Image dimensions must be non-zero")]
    EmptyImage,
}

/// Error type for alpha mask operations
///
/// This error type covers failures that can occur when applying
/// alpha masks to images or performing alpha-related operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AlphaMaskError {
    /// Image and mask dimensions do not match
    #[error("Image and mask dimensions do not match: expected {expected:?}, actual {actual:?}")]
    DimensionMismatch {
        /// Expected dimensions (width, height)
        expected: (u32, u32),
        /// Actual dimensions (width, height)
        actual: (u32, u32),
    },
}

/// Error type for brush editing
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BrushError {
    /// A brush parameter is outside its accepted range
    #[error("Brush parameter `{name}` = {value} is outside [{min}, {max}]")]
    InvalidParameter {
        name: &'static str,
        value: f32,
        min: f32,
        max: f32,
    },

    /// Base mask size disagrees with the editing canvas
    #[error("Mask dimensions do not match canvas: expected {expected:?}, actual {actual:?}")]
    DimensionMismatch {
        expected: (u32, u32),
        actual: (u32, u32),
    },

    /// A drawing point has a non-finite coordinate or pressure
    #[error("Drawing point ({x}, {y}) with pressure {pressure} is not finite")]
    InvalidPoint { x: f32, y: f32, pressure: f32 },

    /// Smoothing or other mask filtering failed
    #[error(transparent)]
    Filter(#[from] FilterError),
}

/// Error type for background rendering and compositing
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompositeError {
    /// Output canvas has a zero dimension
    #[error("Canvas dimensions must be non-zero, got {width}x{height}")]
    InvalidCanvas { width: u32, height: u32 },

    /// The requested buffer exceeds the working-set limit
    #[error("Buffer of {width}x{height} exceeds the {limit} pixel working-set limit")]
    AllocationFailure { width: u32, height: u32, limit: u64 },

    /// A background variant needs an image that was not supplied
    #[error("Missing auxiliary input for {0} background")]
    MissingAuxiliaryInput(&'static str),

    /// A parameter is outside the accepted range
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Error type for the refinement pipeline
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RefineError {
    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error(transparent)]
    GuidedFilter(#[from] GuidedFilterError),
}

/// Error type for undo/redo history navigation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum HistoryError {
    #[error("Nothing to undo")]
    NothingToUndo,

    #[error("Nothing to redo")]
    NothingToRedo,
}

/// Error type for an editing session
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SessionError {
    #[error(transparent)]
    Brush(#[from] BrushError),

    #[error(transparent)]
    History(#[from] HistoryError),
}
