//! CPU fallback path over raw pixel buffers.
//!
//! Selected when GPU processing is unavailable or the GPU upload failed.
//! Operates on tightly packed RGBA8 data; alpha passes through untouched.
//! Rows are processed in parallel with rayon — data parallelism inside one
//! synchronous frame, not cross-frame concurrency.

use rayon::prelude::*;
use tracing::warn;
use wsi_core::{CoreResult, RenderSurface, StainAdjustment, is_readable};
use wsi_core::error::CoreError;
use wsi_math::Vec3;

use crate::deconvolve;
use crate::matrix::StainMatrix;

#[inline]
fn pixel_from_rgba8(px: &[u8]) -> Vec3 {
    Vec3::new(
        px[0] as f32 / 255.0,
        px[1] as f32 / 255.0,
        px[2] as f32 / 255.0,
    )
}

#[inline]
fn write_rgb8(px: &mut [u8], rgb: Vec3) {
    px[0] = (rgb.x * 255.0 + 0.5) as u8;
    px[1] = (rgb.y * 255.0 + 0.5) as u8;
    px[2] = (rgb.z * 255.0 + 0.5) as u8;
}

/// Deconvolves an RGBA8 buffer in place.
pub fn process_rgba8(pixels: &mut [u8], matrix: &StainMatrix, adj: &StainAdjustment) {
    pixels.par_chunks_exact_mut(4).for_each(|px| {
        let rgb = deconvolve::transform_pixel(pixel_from_rgba8(px), matrix, adj);
        write_rgb8(px, rgb);
    });
}

/// Runs the CPU fallback against a host surface, rewriting its pixels.
///
/// Probes readability with a 1x1 read first; an unreadable surface aborts
/// the computation so the prior output stays on screen. The caller must not
/// retry until the surface changes.
pub fn apply_to_surface(
    surface: &mut dyn RenderSurface,
    matrix: &StainMatrix,
    adj: &StainAdjustment,
) -> CoreResult<()> {
    if !is_readable(surface) {
        warn!("stain deconvolution aborted: surface is not pixel-readable");
        return Err(CoreError::security_restricted("stain source surface"));
    }

    let mut pixels = surface.read_all()?;
    process_rgba8(&mut pixels, matrix, adj);
    surface.write_all(&pixels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;
    use wsi_core::{MemorySurface, StainKind, StainViewMode};

    fn he_matrix() -> StainMatrix {
        StainMatrix::build(catalog::definition(StainKind::He))
    }

    #[test]
    fn test_neutral_settings_preserve_buffer() {
        let matrix = he_matrix();
        let adj = StainAdjustment::default();

        let mut pixels = vec![204u8, 153, 191, 255, 150, 100, 140, 128];
        let original = pixels.clone();
        process_rgba8(&mut pixels, &matrix, &adj);

        for (out, orig) in pixels.iter().zip(&original) {
            assert!((*out as i16 - *orig as i16).abs() <= 1, "{out} vs {orig}");
        }
        // Alpha untouched exactly.
        assert_eq!(pixels[3], 255);
        assert_eq!(pixels[7], 128);
    }

    #[test]
    fn test_surface_roundtrip() {
        let matrix = he_matrix();
        let adj = StainAdjustment {
            view_mode: StainViewMode::Stain1Only,
            ..StainAdjustment::default()
        };

        let mut surface = MemorySurface::new(4, 4);
        surface.fill([204, 153, 191, 255]);
        apply_to_surface(&mut surface, &matrix, &adj).unwrap();

        // Every pixel was rewritten to the same deconvolved value.
        let px = surface.read_pixels(0, 0, 1, 1).unwrap();
        let other = surface.read_pixels(3, 3, 1, 1).unwrap();
        assert_eq!(px, other);
        assert_eq!(px[3], 255);
    }

    #[test]
    fn test_unreadable_surface_aborts() {
        let matrix = he_matrix();
        let adj = StainAdjustment::default();

        let mut surface = MemorySurface::restricted(4, 4);
        let err = apply_to_surface(&mut surface, &matrix, &adj).unwrap_err();
        assert!(err.is_security_restricted());
    }
}
