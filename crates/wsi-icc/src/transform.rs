//! The reduced ICC transform and the composed tone pipeline.
//!
//! Pipeline order is fixed; see [`apply_pixel`]. Saturation blends from
//! BT.709 luminance — the focus analyzer uses BT.601 for its own luminance,
//! each transform following its own convention.

use tracing::warn;
use wsi_core::ColorParameters;
use wsi_math::{Mat3, Vec3};

use crate::metadata::SlideColorMetadata;

/// BT.709 luminance weights used by the saturation blend.
pub const LUMA_BT709: Vec3 = Vec3::new(0.2126, 0.7152, 0.0722);

/// Display encoding gamma for the de-linearize step.
pub const DISPLAY_GAMMA: f32 = 2.2;

/// Where a slide's color characterization came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IccSourceMode {
    /// Reduced from a profile embedded in the slide file.
    #[default]
    Embedded,
    /// Derived server-side without an embedded profile.
    Derived,
}

/// The reduced ICC transform for one slide.
///
/// Loaded per slide and discarded on slide switch or disable; it never
/// outlives the slide it characterizes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IccTransform {
    /// Per-channel linearization gamma.
    pub gamma: [f32; 3],
    /// Optional color matrix applied in linear light.
    pub matrix: Option<Mat3>,
    /// Origin of the characterization.
    pub source: IccSourceMode,
}

impl IccTransform {
    /// Builds the transform from a parsed metadata payload.
    ///
    /// Returns `None` when the slide has no ICC data — the caller reports
    /// the enable operation as failed and leaves ICC off. A malformed
    /// matrix uniform (wrong length, non-finite values) drops the matrix
    /// but keeps the gamma correction.
    pub fn from_metadata(meta: &SlideColorMetadata) -> Option<Self> {
        if !meta.has_icc {
            return None;
        }
        let ct = meta.color_transform.as_ref()?;

        let source = if meta.profile_info.is_some() {
            IccSourceMode::Embedded
        } else {
            IccSourceMode::Derived
        };

        let (gamma, matrix) = match &ct.webgl {
            Some(webgl) => {
                let matrix = if webgl.u_has_matrix {
                    match webgl.u_color_matrix.as_deref().and_then(Mat3::from_slice) {
                        Some(m) if m.is_finite() => Some(m),
                        _ => {
                            warn!("discarding malformed color matrix uniform");
                            None
                        }
                    }
                } else {
                    None
                };
                (webgl.u_gamma, matrix)
            }
            None => {
                let g = ct.transform.gamma;
                ([g.r, g.g, g.b], None)
            }
        };

        Some(Self { gamma, matrix, source })
    }

    /// Arithmetic mean of the three channel gammas.
    ///
    /// This is the documented CSS approximation: the host filter chain can
    /// only express one gamma term, so the per-channel triple collapses to
    /// its mean on that path.
    #[inline]
    pub fn mean_gamma(&self) -> f32 {
        (self.gamma[0] + self.gamma[1] + self.gamma[2]) / 3.0
    }

    /// True when the full matrix path is available.
    #[inline]
    pub fn has_matrix(&self) -> bool {
        self.matrix.is_some()
    }
}

/// Applies the composed ICC + manual tone pipeline to one pixel.
///
/// Steps, in order:
/// 1. linearize via `pow(color, icc_gamma)` per channel
/// 2. multiply by the color matrix in linear light, when present
/// 3. de-linearize via `pow(color, 1/2.2)`, folding in manual gamma
/// 4. add brightness
/// 5. contrast as an affine transform about 0.5
/// 6. saturation as a blend from BT.709 luminance
/// 7. clamp to [0, 1]
///
/// Manual gamma rides the de-linearize step because the CSS chain — the
/// usual carrier of the gamma term — is suppressed while this pipeline is
/// active on the GPU path.
pub fn apply_pixel(rgb: Vec3, icc: Option<&IccTransform>, tone: &ColorParameters) -> Vec3 {
    let mut c = rgb;

    if let Some(t) = icc {
        c = c.max(0.0).pow_vec(Vec3::from_array(t.gamma));
        if let Some(m) = &t.matrix {
            c = *m * c;
        }
        c = c.max(0.0).powf(1.0 / DISPLAY_GAMMA);
    }

    if tone.gamma != 1.0 {
        c = c.max(0.0).powf(1.0 / tone.gamma);
    }

    c = c + Vec3::splat(tone.brightness);
    c = (c - Vec3::splat(0.5)) * tone.contrast + Vec3::splat(0.5);

    let luma = c.dot(LUMA_BT709);
    c = Vec3::splat(luma).lerp(c, tone.saturation);

    c.clamp01()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::parse_color_metadata;
    use approx::assert_relative_eq;

    fn transform_with_matrix() -> IccTransform {
        let json = r#"{
            "has_icc": true,
            "color_transform": {
                "transform": {"gamma": {"r": 1.0, "g": 1.0, "b": 1.0}},
                "webgl": {
                    "u_gamma": [1.0, 1.0, 1.0],
                    "u_hasMatrix": true,
                    "u_colorMatrix": [1, 0, 0, 0, 1, 0, 0, 0, 1]
                }
            }
        }"#;
        IccTransform::from_metadata(&parse_color_metadata(json).unwrap()).unwrap()
    }

    #[test]
    fn test_no_icc_yields_none() {
        let meta = parse_color_metadata(r#"{"has_icc": false}"#).unwrap();
        assert!(IccTransform::from_metadata(&meta).is_none());

        // has_icc without transform data is also a failed enable.
        let meta = parse_color_metadata(r#"{"has_icc": true}"#).unwrap();
        assert!(IccTransform::from_metadata(&meta).is_none());
    }

    #[test]
    fn test_mean_gamma() {
        let t = IccTransform {
            gamma: [1.0, 1.1, 1.3],
            matrix: None,
            source: IccSourceMode::Derived,
        };
        assert_relative_eq!(t.mean_gamma(), 1.1333333, epsilon = 1e-5);
    }

    #[test]
    fn test_malformed_matrix_dropped_gamma_kept() {
        let json = r#"{
            "has_icc": true,
            "color_transform": {
                "transform": {"gamma": {"r": 1.2, "g": 1.0, "b": 0.9}},
                "webgl": {
                    "u_gamma": [1.2, 1.0, 0.9],
                    "u_hasMatrix": true,
                    "u_colorMatrix": [1, 0, 0]
                }
            }
        }"#;
        let t = IccTransform::from_metadata(&parse_color_metadata(json).unwrap()).unwrap();
        assert!(!t.has_matrix());
        assert_relative_eq!(t.gamma[0], 1.2);
    }

    #[test]
    fn test_identity_pipeline_is_noop() {
        let tone = ColorParameters::default();
        let rgb = Vec3::new(0.25, 0.5, 0.75);
        let out = apply_pixel(rgb, None, &tone);
        assert_relative_eq!(out.x, rgb.x, epsilon = 1e-6);
        assert_relative_eq!(out.y, rgb.y, epsilon = 1e-6);
        assert_relative_eq!(out.z, rgb.z, epsilon = 1e-6);
    }

    #[test]
    fn test_identity_icc_reencodes_through_display_gamma() {
        // Unit gammas and identity matrix still pass through the
        // linearize/de-linearize pair, which is pow(1/2.2) overall.
        let t = transform_with_matrix();
        let tone = ColorParameters::default();
        let out = apply_pixel(Vec3::splat(0.5), Some(&t), &tone);
        assert_relative_eq!(out.x, 0.5f32.powf(1.0 / DISPLAY_GAMMA), epsilon = 1e-5);
    }

    #[test]
    fn test_contrast_pivots_about_half() {
        let tone = ColorParameters { contrast: 2.0, ..ColorParameters::default() };
        let out = apply_pixel(Vec3::splat(0.5), None, &tone);
        assert_relative_eq!(out.x, 0.5, epsilon = 1e-6);

        let brighter = apply_pixel(Vec3::splat(0.6), None, &tone);
        assert_relative_eq!(brighter.x, 0.7, epsilon = 1e-6);
    }

    #[test]
    fn test_zero_saturation_is_bt709_gray() {
        let tone = ColorParameters { saturation: 0.0, ..ColorParameters::default() };
        let rgb = Vec3::new(1.0, 0.0, 0.0);
        let out = apply_pixel(rgb, None, &tone);
        assert_relative_eq!(out.x, 0.2126, epsilon = 1e-4);
        assert_relative_eq!(out.y, 0.2126, epsilon = 1e-4);
        assert_relative_eq!(out.z, 0.2126, epsilon = 1e-4);
    }

    #[test]
    fn test_brightness_is_additive() {
        let tone = ColorParameters { brightness: 0.2, ..ColorParameters::default() };
        let out = apply_pixel(Vec3::splat(0.3), None, &tone);
        assert_relative_eq!(out.x, 0.5, epsilon = 1e-6);
    }

    #[test]
    fn test_output_clamped() {
        let tone = ColorParameters { brightness: 1.0, ..ColorParameters::default() };
        let out = apply_pixel(Vec3::splat(0.9), None, &tone);
        assert_eq!(out, Vec3::ONE);
    }
}
