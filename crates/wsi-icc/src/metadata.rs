//! Per-slide color metadata payload.
//!
//! The slide server exposes one read per slide:
//!
//! ```json
//! {
//!   "has_icc": true,
//!   "profile_info": { "description": "Scanner RGB" },
//!   "color_transform": {
//!     "transform": { "gamma": { "r": 1.02, "g": 0.98, "b": 1.05 } },
//!     "webgl": {
//!       "u_gamma": [1.02, 0.98, 1.05],
//!       "u_hasMatrix": true,
//!       "u_colorMatrix": [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0]
//!     }
//!   }
//! }
//! ```
//!
//! The `webgl` block is optional; servers that only support the CSS
//! approximation omit it. `profile_info` is opaque descriptive data and is
//! carried through untouched.

use serde::Deserialize;

use crate::error::IccResult;

/// Parsed per-slide color metadata.
#[derive(Debug, Clone, Deserialize)]
pub struct SlideColorMetadata {
    /// Whether the slide carries an ICC profile at all.
    pub has_icc: bool,
    /// Opaque profile description, passed through for display.
    #[serde(default)]
    pub profile_info: Option<serde_json::Value>,
    /// The reduced color transform, absent when `has_icc` is false.
    #[serde(default)]
    pub color_transform: Option<ColorTransformPayload>,
}

/// The `color_transform` block.
#[derive(Debug, Clone, Deserialize)]
pub struct ColorTransformPayload {
    /// Per-channel transfer description (CSS path).
    pub transform: TransferPayload,
    /// GPU uniforms (full matrix path), optional.
    #[serde(default)]
    pub webgl: Option<WebglPayload>,
}

/// The `transform` block: per-channel gamma.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct TransferPayload {
    /// Per-channel gamma values.
    pub gamma: ChannelGamma,
}

/// Named per-channel gamma triple.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ChannelGamma {
    /// Red channel gamma.
    pub r: f32,
    /// Green channel gamma.
    pub g: f32,
    /// Blue channel gamma.
    pub b: f32,
}

/// The `webgl` block: shader uniforms for the full GPU path.
#[derive(Debug, Clone, Deserialize)]
pub struct WebglPayload {
    /// Per-channel gamma as a uniform triple.
    pub u_gamma: [f32; 3],
    /// Whether a color matrix accompanies the gammas.
    #[serde(rename = "u_hasMatrix")]
    pub u_has_matrix: bool,
    /// Row-major 3x3 color matrix, present when `u_hasMatrix` is true.
    #[serde(rename = "u_colorMatrix", default)]
    pub u_color_matrix: Option<Vec<f32>>,
}

/// Parses a raw metadata response body.
pub fn parse_color_metadata(json: &str) -> IccResult<SlideColorMetadata> {
    Ok(serde_json::from_str(json)?)
}

/// Source of per-slide color metadata.
///
/// The host supplies the implementation (typically an HTTP client against
/// the slide server). The controller calls it once per enable; the fetch is
/// fire-and-forget from the renderer's perspective — rendering continues
/// with default parameters, and a failure leaves ICC disabled until the
/// enable operation is explicitly re-invoked.
pub trait ProfileSource {
    /// Fetches the color metadata for one slide.
    fn fetch_color_metadata(&self, slide_id: &str) -> IccResult<SlideColorMetadata>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_payload() {
        let json = r#"{
            "has_icc": true,
            "profile_info": {"description": "Scanner RGB"},
            "color_transform": {
                "transform": {"gamma": {"r": 1.02, "g": 0.98, "b": 1.05}},
                "webgl": {
                    "u_gamma": [1.02, 0.98, 1.05],
                    "u_hasMatrix": true,
                    "u_colorMatrix": [1, 0, 0, 0, 1, 0, 0, 0, 1]
                }
            }
        }"#;

        let meta = parse_color_metadata(json).unwrap();
        assert!(meta.has_icc);
        let ct = meta.color_transform.unwrap();
        assert_eq!(ct.transform.gamma.g, 0.98);
        let webgl = ct.webgl.unwrap();
        assert!(webgl.u_has_matrix);
        assert_eq!(webgl.u_color_matrix.unwrap().len(), 9);
    }

    #[test]
    fn test_parse_minimal_payload() {
        let meta = parse_color_metadata(r#"{"has_icc": false}"#).unwrap();
        assert!(!meta.has_icc);
        assert!(meta.color_transform.is_none());
    }

    #[test]
    fn test_parse_without_webgl_block() {
        let json = r#"{
            "has_icc": true,
            "color_transform": {
                "transform": {"gamma": {"r": 1.1, "g": 1.0, "b": 0.9}}
            }
        }"#;
        let meta = parse_color_metadata(json).unwrap();
        assert!(meta.color_transform.unwrap().webgl.is_none());
    }

    #[test]
    fn test_parse_garbage_fails() {
        assert!(parse_color_metadata("not json").is_err());
        assert!(parse_color_metadata(r#"{"has_icc": "maybe"}"#).is_err());
    }
}
