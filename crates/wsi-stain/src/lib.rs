//! # wsi-stain
//!
//! Ruifrok–Johnston optical-density stain deconvolution.
//!
//! Brightfield histology stains combine additively in optical-density space
//! (Beer–Lambert law). This crate separates a rendered RGB pixel into
//! per-stain concentrations, lets the user rescale or isolate individual
//! stains, and reconstructs RGB:
//!
//! ```text
//! rgb ── -log10 ──► od ── unmix ──► concentrations
//!                                        │ intensity scaling / view mode
//! rgb' ◄── 10^-od ── remix ◄─────────────┘
//! ```
//!
//! Layering:
//!
//! - [`catalog`] — the static stain characterization catalog (H&E, H-DAB).
//! - [`matrix`] — builds, validates, and inverts the 3x3 stain basis,
//!   including residual-vector synthesis and degeneracy handling.
//! - [`deconvolve`] — the per-pixel scalar math.
//! - [`cpu`] — the pixel-buffer fallback path used when GPU processing is
//!   unavailable, parallelized with rayon.
//!
//! # Example
//!
//! ```rust
//! use wsi_core::{StainAdjustment, StainKind};
//! use wsi_math::Vec3;
//! use wsi_stain::{StainMatrix, catalog, deconvolve};
//!
//! let matrix = StainMatrix::build(catalog::definition(StainKind::He));
//! let adj = StainAdjustment::default();
//!
//! let out = deconvolve::transform_pixel(Vec3::new(0.8, 0.6, 0.75), &matrix, &adj);
//! assert!((out.x - 0.8).abs() < 1e-4);
//! ```

pub mod catalog;
pub mod cpu;
pub mod deconvolve;
pub mod matrix;

pub use catalog::StainDefinition;
pub use matrix::{StainMatrix, StainMatrixCache};
