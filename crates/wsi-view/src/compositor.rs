//! Output-path selection.
//!
//! Two carriers exist for the color correction: a CSS filter expression on
//! the host element, or a GPU overlay surface. Applying both would double
//! the transform, so the compositor picks exactly one per frame:
//!
//! - ICC active on the GPU matrix path → overlay carries everything, the
//!   CSS chain is suppressed entirely.
//! - otherwise → the CSS chain runs in fixed order brightness → contrast →
//!   saturate → gamma, where the gamma term is `icc_mean_gamma *
//!   manual_gamma` while ICC is active and `manual_gamma` alone otherwise.
//!
//! Stain and focus overlays are independent surfaces and composite freely
//! alongside either color path.

use wsi_compute::RenderPath;
use wsi_core::{ColorParameters, EnhancementSettings};
use wsi_icc::IccTransform;

/// Per-frame output description handed back to the host.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameOutput {
    /// CSS filter expression for the slide element; empty when nothing to
    /// apply or when the GPU matrix path suppressed it.
    pub css_filter: String,
    /// Execution path serving this frame.
    pub path: RenderPath,
    /// The color overlay surface carries the ICC + tone transform.
    pub color_overlay: bool,
    /// The stain overlay (or rewritten base) carries deconvolved pixels.
    pub stain_overlay: bool,
    /// The focus overlay carries the sharpness heatmap.
    pub focus_overlay: bool,
}

/// Builds the CSS filter chain for the tone parameters.
///
/// Identity terms are elided; an all-identity chain yields an empty string.
/// The gamma term uses the documented mean-gamma approximation of the ICC
/// transform when one is supplied.
pub fn css_filter_chain(tone: &ColorParameters, icc_mean_gamma: Option<f32>) -> String {
    let mut terms = Vec::new();

    if tone.brightness != 0.0 {
        terms.push(format!("brightness({})", 1.0 + tone.brightness));
    }
    if tone.contrast != 1.0 {
        terms.push(format!("contrast({})", tone.contrast));
    }
    if tone.saturation != 1.0 {
        terms.push(format!("saturate({})", tone.saturation));
    }

    let effective_gamma = icc_mean_gamma.unwrap_or(1.0) * tone.gamma;
    if effective_gamma != 1.0 {
        terms.push(format!("gamma({effective_gamma})"));
    }

    terms.join(" ")
}

/// Decides the frame's output paths from the current configuration.
pub fn compose(
    settings: &EnhancementSettings,
    icc: Option<&IccTransform>,
    path: RenderPath,
) -> FrameOutput {
    let icc_active = settings.icc_enabled && icc.is_some();
    let gpu_matrix_path =
        icc_active && path == RenderPath::Gpu && icc.is_some_and(|t| t.has_matrix());

    let css_filter = if gpu_matrix_path {
        // The overlay applies gamma, matrix, and tone in one pass; any CSS
        // term on top would apply the tone twice.
        String::new()
    } else {
        let mean_gamma = if icc_active { icc.map(|t| t.mean_gamma()) } else { None };
        css_filter_chain(&settings.color, mean_gamma)
    };

    FrameOutput {
        css_filter,
        path,
        color_overlay: gpu_matrix_path,
        stain_overlay: settings.stain_enabled,
        focus_overlay: settings.focus_enabled,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wsi_icc::IccSourceMode;
    use wsi_math::Mat3;

    fn icc_with_matrix() -> IccTransform {
        IccTransform {
            gamma: [1.0, 1.0, 1.0],
            matrix: Some(Mat3::IDENTITY),
            source: IccSourceMode::Embedded,
        }
    }

    fn icc_gamma_only() -> IccTransform {
        IccTransform { gamma: [1.2, 1.2, 1.2], matrix: None, source: IccSourceMode::Derived }
    }

    #[test]
    fn test_identity_chain_is_empty() {
        assert_eq!(css_filter_chain(&ColorParameters::default(), None), "");
    }

    #[test]
    fn test_chain_order_fixed() {
        let tone = ColorParameters {
            gamma: 1.2,
            brightness: 0.1,
            contrast: 1.3,
            saturation: 0.8,
        };
        let chain = css_filter_chain(&tone, None);
        let b = chain.find("brightness").unwrap();
        let c = chain.find("contrast").unwrap();
        let s = chain.find("saturate").unwrap();
        let g = chain.find("gamma").unwrap();
        assert!(b < c && c < s && s < g, "wrong order: {chain}");
    }

    #[test]
    fn test_effective_gamma_multiplies_icc_and_manual() {
        let tone = ColorParameters { gamma: 2.0, ..ColorParameters::default() };
        let chain = css_filter_chain(&tone, Some(1.2));
        assert_eq!(chain, "gamma(2.4)");
    }

    #[test]
    fn test_gpu_matrix_path_suppresses_css() {
        let mut settings = EnhancementSettings::default();
        settings.icc_enabled = true;
        settings.color.set_brightness(0.2);

        let icc = icc_with_matrix();
        let out = compose(&settings, Some(&icc), RenderPath::Gpu);
        assert!(out.color_overlay);
        assert!(out.css_filter.is_empty(), "CSS must be suppressed: {}", out.css_filter);
    }

    #[test]
    fn test_gamma_only_icc_stays_on_css() {
        let mut settings = EnhancementSettings::default();
        settings.icc_enabled = true;

        let icc = icc_gamma_only();
        let out = compose(&settings, Some(&icc), RenderPath::Gpu);
        assert!(!out.color_overlay);
        assert_eq!(out.css_filter, "gamma(1.2)");
    }

    #[test]
    fn test_cpu_path_never_takes_color_overlay() {
        let mut settings = EnhancementSettings::default();
        settings.icc_enabled = true;

        let icc = icc_with_matrix();
        let out = compose(&settings, Some(&icc), RenderPath::Cpu);
        assert!(!out.color_overlay);
        // Unit mean gamma and neutral tone: the gamma term elides too.
        assert_eq!(out.css_filter, "");
    }

    #[test]
    fn test_icc_disabled_ignores_transform_gamma() {
        let settings = EnhancementSettings::default();
        let icc = icc_gamma_only();
        let out = compose(&settings, Some(&icc), RenderPath::Cpu);
        assert_eq!(out.css_filter, "");
    }

    #[test]
    fn test_overlay_flags_follow_settings() {
        let mut settings = EnhancementSettings::default();
        settings.stain_enabled = true;
        settings.focus_enabled = true;

        let out = compose(&settings, None, RenderPath::Cpu);
        assert!(out.stain_overlay);
        assert!(out.focus_overlay);
        assert!(!out.color_overlay);
    }
}
