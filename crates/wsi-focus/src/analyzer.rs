//! Sharpness analysis and heatmap rendering.

use rayon::prelude::*;
use tracing::warn;
use wsi_core::error::CoreError;
use wsi_core::{CoreResult, FocusParameters, RenderSurface, is_readable};

use crate::colormap::thermal;

/// BT.601 luminance weights.
///
/// Deliberately different from the BT.709 weights the tone pipeline's
/// saturation blend uses; each transform follows its own convention.
pub const LUMA_BT601: [f32; 3] = [0.299, 0.587, 0.114];

/// Width of the smoothstep ramp above the threshold.
pub const SMOOTHSTEP_BAND: f32 = 0.3;

/// Hermite smoothstep between two edges.
#[inline]
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Extracts a BT.601 luminance plane from RGBA8 pixels.
pub fn luminance_plane(rgba: &[u8], width: u32, height: u32) -> Vec<f32> {
    debug_assert_eq!(rgba.len(), (width as usize) * (height as usize) * 4);
    rgba.chunks_exact(4)
        .map(|px| {
            (px[0] as f32 * LUMA_BT601[0]
                + px[1] as f32 * LUMA_BT601[1]
                + px[2] as f32 * LUMA_BT601[2])
                / 255.0
        })
        .collect()
}

/// Clamp-to-edge sample of the luminance plane.
#[inline]
fn sample(plane: &[f32], width: u32, height: u32, x: i64, y: i64) -> f32 {
    let x = x.clamp(0, width as i64 - 1) as usize;
    let y = y.clamp(0, height as i64 - 1) as usize;
    plane[y * width as usize + x]
}

/// Gaussian pre-blur at one position: 3x3 taps weighted 4/2/1 (normalized),
/// spaced `step` pixels apart.
#[inline]
fn blurred(plane: &[f32], width: u32, height: u32, x: i64, y: i64, step: i64) -> f32 {
    let mut acc = 0.0;
    for dy in -1..=1i64 {
        for dx in -1..=1i64 {
            let weight = match (dx == 0, dy == 0) {
                (true, true) => 4.0,
                (true, false) | (false, true) => 2.0,
                (false, false) => 1.0,
            };
            acc += weight * sample(plane, width, height, x + dx * step, y + dy * step);
        }
    }
    acc / 16.0
}

/// Computes the sharpness score at one pixel.
///
/// Sobel gradients are taken over pre-blurred samples spaced by the
/// smoothing scale (rounded to whole pixels), then mapped through the
/// smoothstep ramp above the configured threshold.
pub fn sharpness_at(
    plane: &[f32],
    width: u32,
    height: u32,
    x: u32,
    y: u32,
    params: &FocusParameters,
) -> f32 {
    let step = params.smoothing_scale.round().max(1.0) as i64;
    let (x, y) = (x as i64, y as i64);

    let mut b = [[0.0f32; 3]; 3];
    for (j, row) in b.iter_mut().enumerate() {
        for (i, v) in row.iter_mut().enumerate() {
            let dx = i as i64 - 1;
            let dy = j as i64 - 1;
            *v = blurred(plane, width, height, x + dx * step, y + dy * step, step);
        }
    }

    let gx = (b[0][2] + 2.0 * b[1][2] + b[2][2]) - (b[0][0] + 2.0 * b[1][0] + b[2][0]);
    let gy = (b[2][0] + 2.0 * b[2][1] + b[2][2]) - (b[0][0] + 2.0 * b[0][1] + b[0][2]);
    let magnitude = (gx * gx + gy * gy).sqrt();

    smoothstep(params.threshold, params.threshold + SMOOTHSTEP_BAND, magnitude)
}

/// Renders the heatmap overlay for an RGBA8 source buffer.
///
/// Returns a premultiplied-free RGBA8 overlay: color from the thermal map,
/// alpha = sharpness × opacity. A region with no local gradient gets alpha
/// zero regardless of the configured opacity.
pub fn render_heatmap(rgba: &[u8], width: u32, height: u32, params: &FocusParameters) -> Vec<u8> {
    let plane = luminance_plane(rgba, width, height);
    let mut out = vec![0u8; (width as usize) * (height as usize) * 4];

    out.par_chunks_exact_mut(width as usize * 4)
        .enumerate()
        .for_each(|(y, row)| {
            for (x, px) in row.chunks_exact_mut(4).enumerate() {
                let sharpness = sharpness_at(&plane, width, height, x as u32, y as u32, params);
                let rgb = thermal(sharpness);
                let alpha = sharpness * params.opacity;
                px[0] = (rgb[0] * 255.0 + 0.5) as u8;
                px[1] = (rgb[1] * 255.0 + 0.5) as u8;
                px[2] = (rgb[2] * 255.0 + 0.5) as u8;
                px[3] = (alpha * 255.0 + 0.5) as u8;
            }
        });

    out
}

/// Reads the base surface and writes the heatmap to the overlay surface.
///
/// Probes base readability first and aborts on a restricted surface,
/// retaining whatever the overlay showed before.
pub fn render_overlay(
    base: &dyn RenderSurface,
    overlay: &mut dyn RenderSurface,
    params: &FocusParameters,
) -> CoreResult<()> {
    if !is_readable(base) {
        warn!("focus analysis aborted: surface is not pixel-readable");
        return Err(CoreError::security_restricted("focus source surface"));
    }

    let pixels = base.read_all()?;
    let heatmap = render_heatmap(&pixels, base.width(), base.height(), params);
    overlay.write_pixels(0, 0, base.width(), base.height(), &heatmap)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use wsi_core::MemorySurface;

    /// Left half black, right half white: a hard edge that survives the
    /// pre-blur.
    fn split_edge(width: u32, height: u32) -> Vec<u8> {
        let mut rgba = vec![0u8; (width as usize) * (height as usize) * 4];
        for y in 0..height {
            for x in 0..width {
                let v = if x < width / 2 { 0 } else { 255 };
                let i = ((y * width + x) * 4) as usize;
                rgba[i] = v;
                rgba[i + 1] = v;
                rgba[i + 2] = v;
                rgba[i + 3] = 255;
            }
        }
        rgba
    }

    #[test]
    fn test_smoothstep_edges() {
        assert_eq!(smoothstep(0.1, 0.4, 0.05), 0.0);
        assert_eq!(smoothstep(0.1, 0.4, 0.5), 1.0);
        assert_relative_eq!(smoothstep(0.0, 1.0, 0.5), 0.5);
    }

    #[test]
    fn test_luminance_uses_bt601() {
        let red = [255u8, 0, 0, 255];
        let plane = luminance_plane(&red, 1, 1);
        assert_relative_eq!(plane[0], 0.299, epsilon = 1e-4);
    }

    #[test]
    fn test_uniform_tile_has_zero_alpha() {
        let width = 16;
        let height = 16;
        let mut rgba = vec![0u8; (width * height * 4) as usize];
        for px in rgba.chunks_exact_mut(4) {
            px.copy_from_slice(&[180, 120, 160, 255]);
        }

        let params = FocusParameters { opacity: 1.0, ..FocusParameters::default() };
        let overlay = render_heatmap(&rgba, width, height, &params);
        for px in overlay.chunks_exact(4) {
            assert_eq!(px[3], 0, "uniform tile must produce a fully transparent overlay");
        }
    }

    #[test]
    fn test_edge_registers_sharp() {
        let width = 16;
        let height = 16;
        let rgba = split_edge(width, height);
        let params = FocusParameters {
            opacity: 1.0,
            threshold: 0.0,
            smoothing_scale: 1.0,
            ..FocusParameters::default()
        };
        let overlay = render_heatmap(&rgba, width, height, &params);

        let max_alpha = overlay.chunks_exact(4).map(|px| px[3]).max().unwrap();
        assert!(max_alpha > 0, "a hard edge must register as sharp");
    }

    #[test]
    fn test_opacity_scales_alpha() {
        let width = 16;
        let height = 16;
        let rgba = split_edge(width, height);
        let full = FocusParameters {
            opacity: 1.0,
            threshold: 0.0,
            smoothing_scale: 1.0,
            ..FocusParameters::default()
        };
        let half = FocusParameters { opacity: 0.5, ..full };

        let a_full = render_heatmap(&rgba, width, height, &full);
        let a_half = render_heatmap(&rgba, width, height, &half);
        let max_full = a_full.chunks_exact(4).map(|px| px[3]).max().unwrap();
        let max_half = a_half.chunks_exact(4).map(|px| px[3]).max().unwrap();
        assert!(max_half < max_full);
        assert!((max_half as i32 * 2 - max_full as i32).abs() <= 2);
    }

    #[test]
    fn test_overlay_surface_rendering() {
        let mut base = MemorySurface::new(8, 8);
        base.fill([90, 90, 90, 255]);
        let mut overlay = MemorySurface::new(8, 8);

        let params = FocusParameters::default();
        render_overlay(&base, &mut overlay, &params).unwrap();

        // Uniform base: overlay fully transparent.
        assert!(overlay.pixels().chunks_exact(4).all(|px| px[3] == 0));
    }

    #[test]
    fn test_restricted_base_aborts() {
        let base = MemorySurface::restricted(8, 8);
        let mut overlay = MemorySurface::new(8, 8);
        let err = render_overlay(&base, &mut overlay, &FocusParameters::default()).unwrap_err();
        assert!(err.is_security_restricted());
    }
}
