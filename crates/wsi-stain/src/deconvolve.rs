//! Per-pixel stain deconvolution math.
//!
//! Forward model: `od = -log10(rgb)` per channel with transmittance
//! pre-clamped away from zero, then `c = unmix * od` with concentrations
//! clamped to zero (negative concentration is physically invalid).
//!
//! Reconstruction scales the two stain concentrations by their user
//! intensities — the residual concentration is never user-scaled — and
//! composes optical density per the active view mode before mapping back
//! through `10^-od`.

use wsi_core::{StainAdjustment, StainViewMode};
use wsi_math::Vec3;

use crate::matrix::StainMatrix;

/// Transmittance floor keeping `log10` away from its singularity.
pub const TRANSMITTANCE_FLOOR: f32 = 0.004;

/// Converts RGB transmittance to optical density.
#[inline]
pub fn rgb_to_od(rgb: Vec3) -> Vec3 {
    let t = rgb.max(TRANSMITTANCE_FLOOR);
    Vec3::new(-t.x.log10(), -t.y.log10(), -t.z.log10())
}

/// Converts optical density back to RGB transmittance, clamped to [0, 1].
#[inline]
pub fn od_to_rgb(od: Vec3) -> Vec3 {
    Vec3::new(
        10f32.powf(-od.x),
        10f32.powf(-od.y),
        10f32.powf(-od.z),
    )
    .clamp01()
}

/// Separates an RGB pixel into stain concentrations.
///
/// Component order matches the basis rows: stain1, stain2, residual.
#[inline]
pub fn separate(rgb: Vec3, matrix: &StainMatrix) -> Vec3 {
    (matrix.unmix * rgb_to_od(rgb)).max(0.0)
}

/// Reconstructs RGB from concentrations under the given adjustment.
#[inline]
pub fn reconstruct(c: Vec3, matrix: &StainMatrix, adj: &StainAdjustment) -> Vec3 {
    let od = match adj.view_mode {
        StainViewMode::Combined => {
            matrix.stain1() * (c.x * adj.hematoxylin)
                + matrix.stain2() * (c.y * adj.counterstain)
                + matrix.residual * c.z
        }
        StainViewMode::Stain1Only => matrix.stain1() * (c.x * adj.hematoxylin),
        StainViewMode::Stain2Only => matrix.stain2() * (c.y * adj.counterstain),
    };
    od_to_rgb(od)
}

/// Full unmix-adjust-remix transform for one pixel.
#[inline]
pub fn transform_pixel(rgb: Vec3, matrix: &StainMatrix, adj: &StainAdjustment) -> Vec3 {
    reconstruct(separate(rgb, matrix), matrix, adj)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;
    use approx::assert_relative_eq;
    use wsi_core::StainKind;
    use wsi_math::Mat3;

    fn he_matrix() -> StainMatrix {
        StainMatrix::build(catalog::definition(StainKind::He))
    }

    #[test]
    fn test_od_floor_blocks_log_singularity() {
        let od = rgb_to_od(Vec3::ZERO);
        assert!(od.is_finite());
        assert_relative_eq!(od.x, -(TRANSMITTANCE_FLOOR.log10()), epsilon = 1e-6);
    }

    #[test]
    fn test_neutral_combined_roundtrip() {
        let matrix = he_matrix();
        let adj = StainAdjustment::default();
        let input = Vec3::new(0.8, 0.6, 0.75);
        let out = transform_pixel(input, &matrix, &adj);
        assert_relative_eq!(out.x, input.x, epsilon = 1e-4);
        assert_relative_eq!(out.y, input.y, epsilon = 1e-4);
        assert_relative_eq!(out.z, input.z, epsilon = 1e-4);
    }

    #[test]
    fn test_concentrations_non_negative() {
        let matrix = he_matrix();
        for rgb in [
            Vec3::new(0.8, 0.6, 0.75),
            Vec3::new(0.1, 0.9, 0.4),
            Vec3::new(1.0, 1.0, 1.0),
            Vec3::ZERO,
        ] {
            let c = separate(rgb, &matrix);
            assert!(c.x >= 0.0 && c.y >= 0.0 && c.z >= 0.0, "negative c for {rgb:?}");
        }
    }

    #[test]
    fn test_white_input_stays_white() {
        // No absorbance means no stain anywhere.
        let matrix = he_matrix();
        let adj = StainAdjustment::default();
        let out = transform_pixel(Vec3::ONE, &matrix, &adj);
        assert_relative_eq!(out.x, 1.0, epsilon = 1e-5);
        assert_relative_eq!(out.y, 1.0, epsilon = 1e-5);
        assert_relative_eq!(out.z, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_stain1_only_shifts_toward_blue() {
        let matrix = he_matrix();
        let input = Vec3::new(0.8, 0.6, 0.75);

        let combined = transform_pixel(input, &matrix, &StainAdjustment::default());
        let hema_only = transform_pixel(
            input,
            &matrix,
            &StainAdjustment {
                view_mode: StainViewMode::Stain1Only,
                ..StainAdjustment::default()
            },
        );

        // The hematoxylin channel renders relatively more blue than the
        // combined reconstruction.
        let combined_b = combined.z / combined.component_sum();
        let hema_b = hema_only.z / hema_only.component_sum();
        assert!(hema_b > combined_b, "expected blue shift: {hema_b} vs {combined_b}");
    }

    #[test]
    fn test_zero_intensity_erases_stain() {
        let matrix = he_matrix();
        let adj = StainAdjustment {
            hematoxylin: 0.0,
            counterstain: 0.0,
            view_mode: StainViewMode::Combined,
        };
        let out = transform_pixel(Vec3::new(0.3, 0.4, 0.5), &matrix, &adj);
        // Only the residual term survives; output must still be valid color.
        assert!(out.x >= 0.0 && out.x <= 1.0);
        assert!(out.is_finite());
    }

    #[test]
    fn test_residual_not_scaled_by_intensities() {
        let matrix = he_matrix();
        let c = Vec3::new(0.0, 0.0, 0.3);

        let neutral = reconstruct(c, &matrix, &StainAdjustment::default());
        let doubled = reconstruct(
            c,
            &matrix,
            &StainAdjustment {
                hematoxylin: 2.0,
                counterstain: 2.0,
                view_mode: StainViewMode::Combined,
            },
        );
        assert_eq!(neutral, doubled);
    }

    #[test]
    fn test_degraded_identity_matrix_stays_finite() {
        let degraded = StainMatrix {
            basis: Mat3::IDENTITY,
            remix: Mat3::IDENTITY,
            unmix: Mat3::IDENTITY,
            residual: Vec3::new(0.0, 0.0, 1.0),
            degraded: true,
        };
        let out = transform_pixel(Vec3::new(0.5, 0.5, 0.5), &degraded, &StainAdjustment::default());
        assert!(out.is_finite());
    }
}
