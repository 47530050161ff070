//! # wsi-view
//!
//! The host-facing surface of the render-enhancement core: the
//! [`EnhancementController`] owns the parameter store, the engines, and the
//! per-frame schedule; the [`compositor`] decides which output path carries
//! each effect so no transform is ever applied twice.
//!
//! Per frame, data flows one way:
//!
//! ```text
//! parameter store ──► stain matrix ──► stain deconvolution ─► overlay/base
//!                └──► ICC + tone   ──► GPU overlay or CSS filter string
//!                └──► focus params ──► heatmap overlay
//! ```
//!
//! The host pushes redraw/update/open events into the controller, provides
//! the frame's surfaces, and composites whatever comes back. Enhancement
//! failures degrade or log; they never block the underlying slide view.

pub mod compositor;
pub mod controller;

pub use compositor::{FrameOutput, compose, css_filter_chain};
pub use controller::EnhancementController;
