//! # wsi-focus
//!
//! Focus-quality heatmap for whole-slide imagery.
//!
//! Scan artifacts leave regions of a slide out of focus. This crate scores
//! local sharpness with a Tenengrad-style measure — Sobel gradient magnitude
//! over a Gaussian pre-blurred luminance plane — and renders the score as a
//! translucent thermal overlay the host composites above the base image.
//!
//! Per output pixel:
//!
//! 1. luminance via BT.601 weights (0.299/0.587/0.114)
//! 2. 8-neighbor Gaussian pre-blur (center 4, edge 2, diagonal 1), sampled
//!    at an offset scaled by the smoothing parameter
//! 3. Sobel gradients over the blurred samples, magnitude `sqrt(Gx²+Gy²)`
//! 4. sharpness = `smoothstep(threshold, threshold + 0.3, magnitude)` — a
//!    smooth ramp rather than a hard cutoff, so the overlay never bands
//! 5. thermal colormap, alpha = sharpness × opacity
//!
//! The analyzer is independent of the color and stain engines: it renders
//! to its own overlay surface and can be active simultaneously with either.

pub mod analyzer;
pub mod colormap;

pub use analyzer::{
    LUMA_BT601, SMOOTHSTEP_BAND, luminance_plane, render_heatmap, render_overlay, sharpness_at,
    smoothstep,
};
pub use colormap::thermal;
