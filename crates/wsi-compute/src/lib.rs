//! # wsi-compute
//!
//! GPU execution paths for the render-enhancement pipeline.
//!
//! Three compute pipelines mirror the CPU reference implementations in
//! `wsi-icc`, `wsi-stain`, and `wsi-focus`: the ICC + tone transform, stain
//! deconvolution, and the focus heatmap. Each frame's work fully replaces
//! prior state — buffer re-upload, single dispatch, synchronous readback —
//! so there is no cross-frame pipelining and nothing to cancel.
//!
//! GPU availability is established exactly once at startup via
//! [`GpuCapability::probe`] and the result injected into engine
//! construction; it is never re-queried as ambient global state. When the
//! probe reports no adapter, callers construct nothing and stay on the CPU
//! paths.

pub mod convert;
pub mod probe;

#[cfg(feature = "wgpu")]
mod engine;
#[cfg(feature = "wgpu")]
mod shaders;

#[cfg(feature = "wgpu")]
pub use engine::GpuEngine;
pub use convert::{rgba8_to_f32, rgba_f32_to_u8};
pub use probe::{GpuCapability, RenderPath};

use thiserror::Error;

/// GPU operation errors.
#[derive(Debug, Error)]
pub enum ComputeError {
    /// No suitable GPU adapter was found.
    #[error("no suitable GPU adapter found")]
    NoAdapter,

    /// The capability probe reported no GPU; engine construction refused.
    #[error("GPU backend not available: {0}")]
    BackendNotAvailable(String),

    /// Device request failed after a successful adapter probe.
    #[error("failed to create device: {0}")]
    DeviceCreation(String),

    /// Input buffer length does not match the described image.
    #[error("buffer size mismatch: expected {expected}, got {actual}")]
    BufferSizeMismatch {
        /// Expected element count.
        expected: usize,
        /// Actual element count.
        actual: usize,
    },

    /// A dispatch or readback failed.
    #[error("GPU operation failed: {0}")]
    OperationFailed(String),
}

/// Result alias for GPU operations.
pub type ComputeResult<T> = Result<T, ComputeError>;
