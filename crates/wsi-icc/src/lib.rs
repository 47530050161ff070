//! # wsi-icc
//!
//! ICC-profile color correction for whole-slide rendering.
//!
//! Scanners characterize their optics with an ICC profile; the slide server
//! reduces that profile to a per-channel gamma triple plus an optional 3x3
//! color matrix and ships it as JSON metadata. This crate parses that
//! payload, models the reduced transform, and composes it with the user's
//! manual tone adjustments.
//!
//! Two render paths exist:
//!
//! - **Full pipeline** ([`transform::apply_pixel`]): linearize through the
//!   per-channel gammas, apply the matrix in linear light, re-encode, then
//!   manual tone. Executed per pixel on the GPU (see `wsi-compute`); the
//!   CPU implementation here is the reference and fallback.
//! - **CSS approximation** ([`IccTransform::mean_gamma`]): the three channel
//!   gammas collapse to their arithmetic mean and become a single gamma term
//!   in the host's filter chain. Deliberately approximate; used whenever the
//!   GPU path is unavailable.
//!
//! Fetching the metadata is the host's (asynchronous) concern, abstracted
//! behind [`ProfileSource`]; a failed or empty fetch leaves ICC disabled
//! with no automatic retry.

pub mod error;
pub mod metadata;
pub mod transform;

pub use error::{IccError, IccResult};
pub use metadata::{ProfileSource, SlideColorMetadata, parse_color_metadata};
pub use transform::{IccSourceMode, IccTransform, LUMA_BT709, apply_pixel};
