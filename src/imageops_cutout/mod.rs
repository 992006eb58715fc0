pub mod apply_alpha_mask;
pub mod box_filter;
pub mod brush;
pub mod compositor;
pub mod feather;
pub mod guided_filter;
pub mod history;
pub mod morphology;
pub mod refine;
pub mod session;
