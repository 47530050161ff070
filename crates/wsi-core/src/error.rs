//! Error taxonomy for the render-enhancement core.
//!
//! Four failure classes exist, and all of them are handled locally by the
//! engines rather than propagated to the host:
//!
//! - **resource unavailable** — no GPU adapter, or the profile metadata
//!   fetch failed: degrade to the next-best path or a disabled state.
//! - **security restricted** — the source surface refuses pixel reads:
//!   abort the current computation and retain prior output.
//! - **numeric degenerate** — a singular stain matrix: substitute identity
//!   and keep rendering (flagged on the built matrix, not an `Err`).
//! - **invalid parameter** — out-of-domain setter input: clamped at the
//!   store, so it never becomes an error value at all.
//!
//! The only caller-visible signal is the boolean result of the enable
//! operations on the controller.

use thiserror::Error;

/// Result type alias using [`CoreError`].
pub type CoreResult<T> = std::result::Result<T, CoreError>;

/// Errors produced by surface access and engine plumbing.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The surface refused a pixel read.
    ///
    /// Raised by cross-origin-restricted source surfaces. The computation
    /// that hit this must abort and retain its prior output; busy-retrying
    /// an unreadable surface is never correct.
    #[error("surface is not pixel-readable: {0}")]
    SecurityRestricted(String),

    /// A required resource is missing or failed to initialize.
    #[error("resource unavailable: {0}")]
    ResourceUnavailable(String),

    /// Requested region extends beyond surface bounds.
    #[error("region ({x}, {y}, {w}x{h}) exceeds surface bounds {width}x{height}")]
    InvalidRegion {
        /// Region X origin.
        x: u32,
        /// Region Y origin.
        y: u32,
        /// Region width.
        w: u32,
        /// Region height.
        h: u32,
        /// Surface width.
        width: u32,
        /// Surface height.
        height: u32,
    },

    /// Pixel buffer length does not match the region it describes.
    #[error("buffer size mismatch: expected {expected} bytes, got {actual}")]
    BufferSizeMismatch {
        /// Expected byte length.
        expected: usize,
        /// Actual byte length.
        actual: usize,
    },
}

impl CoreError {
    /// Creates a [`CoreError::SecurityRestricted`] error.
    #[inline]
    pub fn security_restricted(reason: impl Into<String>) -> Self {
        Self::SecurityRestricted(reason.into())
    }

    /// Creates a [`CoreError::ResourceUnavailable`] error.
    #[inline]
    pub fn resource_unavailable(reason: impl Into<String>) -> Self {
        Self::ResourceUnavailable(reason.into())
    }

    /// Creates a [`CoreError::InvalidRegion`] error.
    #[inline]
    pub fn invalid_region(x: u32, y: u32, w: u32, h: u32, width: u32, height: u32) -> Self {
        Self::InvalidRegion { x, y, w, h, width, height }
    }

    /// True for the security-restricted class.
    #[inline]
    pub fn is_security_restricted(&self) -> bool {
        matches!(self, Self::SecurityRestricted(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_security_restricted_display() {
        let err = CoreError::security_restricted("cross-origin source");
        assert!(err.to_string().contains("cross-origin"));
        assert!(err.is_security_restricted());
    }

    #[test]
    fn test_invalid_region_display() {
        let err = CoreError::invalid_region(10, 20, 64, 64, 32, 32);
        let msg = err.to_string();
        assert!(msg.contains("64x64"));
        assert!(msg.contains("32x32"));
        assert!(!err.is_security_restricted());
    }
}
