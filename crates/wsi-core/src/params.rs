//! Typed parameter store for the render-enhancement pipeline.
//!
//! Single source of truth for everything the user can adjust: manual tone,
//! stain selection and intensities, and focus-heatmap settings. Each logical
//! parameter has exactly one setter, and every numeric setter clamps
//! out-of-range input into its valid domain instead of rejecting it — a
//! slider dragged past its end stores the end value, never an error.
//!
//! ICC state is deliberately *not* stored next to the tone values: enabling
//! or disabling ICC must never mutate [`ColorParameters`], so the store only
//! records the enabled flag and the transform itself lives with the color
//! engine.

use serde::{Deserialize, Serialize};

/// Manual gamma domain (1.0 is neutral).
pub const GAMMA_RANGE: (f32, f32) = (0.1, 4.0);

/// Additive brightness domain (0.0 is neutral).
pub const BRIGHTNESS_RANGE: (f32, f32) = (-1.0, 1.0);

/// Contrast domain, affine about 0.5 (1.0 is neutral).
pub const CONTRAST_RANGE: (f32, f32) = (0.0, 3.0);

/// Saturation domain (1.0 is neutral).
pub const SATURATION_RANGE: (f32, f32) = (0.0, 3.0);

/// Per-stain intensity domain (1.0 is neutral).
pub const STAIN_INTENSITY_RANGE: (f32, f32) = (0.0, 2.0);

/// Focus overlay opacity domain.
pub const FOCUS_OPACITY_RANGE: (f32, f32) = (0.0, 1.0);

/// Focus gradient threshold domain.
pub const FOCUS_THRESHOLD_RANGE: (f32, f32) = (0.0, 0.5);

/// Focus pre-blur smoothing-scale domain, in pixels.
pub const FOCUS_SMOOTHING_RANGE: (f32, f32) = (1.0, 8.0);

#[inline]
fn clamped(value: f32, range: (f32, f32)) -> f32 {
    value.clamp(range.0, range.1)
}

/// User-controlled manual tone adjustments.
///
/// Persists independently of ICC state; toggling ICC on or off never
/// touches these values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorParameters {
    /// Manual gamma, applied as `v^(1/gamma)`.
    pub gamma: f32,
    /// Additive brightness.
    pub brightness: f32,
    /// Contrast, affine about 0.5.
    pub contrast: f32,
    /// Saturation blend factor from luminance.
    pub saturation: f32,
}

impl Default for ColorParameters {
    fn default() -> Self {
        Self { gamma: 1.0, brightness: 0.0, contrast: 1.0, saturation: 1.0 }
    }
}

impl ColorParameters {
    /// True when every value sits at its neutral point.
    pub fn is_identity(&self) -> bool {
        self.gamma == 1.0
            && self.brightness == 0.0
            && self.contrast == 1.0
            && self.saturation == 1.0
    }

    /// Sets manual gamma, clamped to its domain.
    pub fn set_gamma(&mut self, gamma: f32) {
        self.gamma = clamped(gamma, GAMMA_RANGE);
    }

    /// Sets brightness, clamped to its domain.
    pub fn set_brightness(&mut self, brightness: f32) {
        self.brightness = clamped(brightness, BRIGHTNESS_RANGE);
    }

    /// Sets contrast, clamped to its domain.
    pub fn set_contrast(&mut self, contrast: f32) {
        self.contrast = clamped(contrast, CONTRAST_RANGE);
    }

    /// Sets saturation, clamped to its domain.
    pub fn set_saturation(&mut self, saturation: f32) {
        self.saturation = clamped(saturation, SATURATION_RANGE);
    }
}

/// Supported stain protocols.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum StainKind {
    /// Hematoxylin and eosin.
    #[default]
    He,
    /// Hematoxylin and diaminobenzidine.
    HDab,
}

impl StainKind {
    /// Short display name of the protocol.
    pub fn name(&self) -> &'static str {
        match self {
            Self::He => "H&E",
            Self::HDab => "H-DAB",
        }
    }
}

/// Which reconstruction the stain engine renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StainViewMode {
    /// Both stains plus the residual channel.
    #[default]
    Combined,
    /// First stain only (hematoxylin).
    Stain1Only,
    /// Second stain only (eosin or DAB).
    Stain2Only,
}

/// User-adjustable stain reconstruction parameters.
///
/// Intensities scale the two stain concentrations only; the residual
/// concentration is never user-scaled.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StainAdjustment {
    /// Hematoxylin (stain 1) intensity.
    pub hematoxylin: f32,
    /// Eosin or DAB (stain 2) intensity.
    pub counterstain: f32,
    /// Active reconstruction mode.
    pub view_mode: StainViewMode,
}

impl Default for StainAdjustment {
    fn default() -> Self {
        Self {
            hematoxylin: 1.0,
            counterstain: 1.0,
            view_mode: StainViewMode::Combined,
        }
    }
}

impl StainAdjustment {
    /// Sets hematoxylin intensity, clamped to [0, 2].
    pub fn set_hematoxylin(&mut self, intensity: f32) {
        self.hematoxylin = clamped(intensity, STAIN_INTENSITY_RANGE);
    }

    /// Sets counterstain intensity, clamped to [0, 2].
    pub fn set_counterstain(&mut self, intensity: f32) {
        self.counterstain = clamped(intensity, STAIN_INTENSITY_RANGE);
    }

    /// Sets the reconstruction mode.
    pub fn set_view_mode(&mut self, mode: StainViewMode) {
        self.view_mode = mode;
    }
}

/// Colormap used by the focus-quality overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FocusColormap {
    /// Blue → cyan → green → yellow → red, four linear segments.
    #[default]
    Thermal,
}

/// Focus-quality heatmap parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FocusParameters {
    /// Overlay opacity.
    pub opacity: f32,
    /// Gradient magnitude below this maps to zero sharpness.
    pub threshold: f32,
    /// Pre-blur sample offset scale, in pixels.
    pub smoothing_scale: f32,
    /// Colormap for the sharpness ramp.
    pub colormap: FocusColormap,
}

impl Default for FocusParameters {
    fn default() -> Self {
        Self {
            opacity: 0.6,
            threshold: 0.1,
            smoothing_scale: 2.0,
            colormap: FocusColormap::Thermal,
        }
    }
}

impl FocusParameters {
    /// Sets overlay opacity, clamped to [0, 1].
    pub fn set_opacity(&mut self, opacity: f32) {
        self.opacity = clamped(opacity, FOCUS_OPACITY_RANGE);
    }

    /// Sets the gradient threshold, clamped to [0, 0.5].
    pub fn set_threshold(&mut self, threshold: f32) {
        self.threshold = clamped(threshold, FOCUS_THRESHOLD_RANGE);
    }

    /// Sets the smoothing scale, clamped to [1, 8].
    pub fn set_smoothing_scale(&mut self, scale: f32) {
        self.smoothing_scale = clamped(scale, FOCUS_SMOOTHING_RANGE);
    }

    /// Sets the colormap.
    pub fn set_colormap(&mut self, colormap: FocusColormap) {
        self.colormap = colormap;
    }
}

/// The full mutable configuration of the enhancement pipeline.
///
/// Owned by the controller; engines receive read-only views of the pieces
/// they consume each frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnhancementSettings {
    /// Manual tone adjustments.
    pub color: ColorParameters,
    /// Whether ICC correction is currently enabled.
    pub icc_enabled: bool,
    /// Selected stain protocol.
    pub stain_kind: StainKind,
    /// Whether stain deconvolution is currently enabled.
    pub stain_enabled: bool,
    /// Stain reconstruction parameters.
    pub stain: StainAdjustment,
    /// Whether the focus overlay is currently enabled.
    pub focus_enabled: bool,
    /// Focus heatmap parameters.
    pub focus: FocusParameters,
}

impl EnhancementSettings {
    /// Returns the full current configuration for persistence and testing.
    pub fn snapshot(&self) -> SettingsSnapshot {
        SettingsSnapshot {
            gamma: self.color.gamma,
            brightness: self.color.brightness,
            contrast: self.color.contrast,
            saturation: self.color.saturation,
            icc_enabled: self.icc_enabled,
            stain_kind: self.stain_kind,
            stain_enabled: self.stain_enabled,
            hematoxylin: self.stain.hematoxylin,
            counterstain: self.stain.counterstain,
            view_mode: self.stain.view_mode,
            focus_enabled: self.focus_enabled,
            focus_opacity: self.focus.opacity,
            focus_threshold: self.focus.threshold,
            focus_smoothing: self.focus.smoothing_scale,
            focus_colormap: self.focus.colormap,
        }
    }
}

/// Flat copy of every setting, serializable for persistence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SettingsSnapshot {
    /// Manual gamma.
    pub gamma: f32,
    /// Additive brightness.
    pub brightness: f32,
    /// Contrast about 0.5.
    pub contrast: f32,
    /// Saturation factor.
    pub saturation: f32,
    /// ICC correction enabled.
    pub icc_enabled: bool,
    /// Selected stain protocol.
    pub stain_kind: StainKind,
    /// Stain deconvolution enabled.
    pub stain_enabled: bool,
    /// Hematoxylin intensity.
    pub hematoxylin: f32,
    /// Counterstain intensity.
    pub counterstain: f32,
    /// Stain reconstruction mode.
    pub view_mode: StainViewMode,
    /// Focus overlay enabled.
    pub focus_enabled: bool,
    /// Focus overlay opacity.
    pub focus_opacity: f32,
    /// Focus gradient threshold.
    pub focus_threshold: f32,
    /// Focus smoothing scale.
    pub focus_smoothing: f32,
    /// Focus colormap.
    pub focus_colormap: FocusColormap,
}

impl SettingsSnapshot {
    /// The tone portion of the snapshot, for independence checks.
    pub fn color_parameters(&self) -> ColorParameters {
        ColorParameters {
            gamma: self.gamma,
            brightness: self.brightness,
            contrast: self.contrast,
            saturation: self.saturation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setters_clamp_low() {
        let mut adj = StainAdjustment::default();
        adj.set_hematoxylin(-1.0);
        assert_eq!(adj.hematoxylin, 0.0);
    }

    #[test]
    fn test_setters_clamp_high() {
        let mut adj = StainAdjustment::default();
        adj.set_hematoxylin(5.0);
        assert_eq!(adj.hematoxylin, 2.0);

        let mut focus = FocusParameters::default();
        focus.set_opacity(2.0);
        assert_eq!(focus.opacity, 1.0);
    }

    #[test]
    fn test_in_range_values_stored_exactly() {
        let mut color = ColorParameters::default();
        color.set_gamma(1.8);
        color.set_brightness(-0.25);
        assert_eq!(color.gamma, 1.8);
        assert_eq!(color.brightness, -0.25);
    }

    #[test]
    fn test_focus_threshold_and_smoothing_clamp() {
        let mut focus = FocusParameters::default();
        focus.set_threshold(0.9);
        assert_eq!(focus.threshold, 0.5);
        focus.set_smoothing_scale(0.0);
        assert_eq!(focus.smoothing_scale, 1.0);
        focus.set_smoothing_scale(100.0);
        assert_eq!(focus.smoothing_scale, 8.0);
    }

    #[test]
    fn test_icc_flag_does_not_touch_color() {
        let mut settings = EnhancementSettings::default();
        settings.color.set_gamma(1.4);
        settings.color.set_saturation(1.2);
        let before = settings.snapshot().color_parameters();

        settings.icc_enabled = true;
        let during = settings.snapshot().color_parameters();
        settings.icc_enabled = false;
        let after = settings.snapshot().color_parameters();

        assert_eq!(before, during);
        assert_eq!(before, after);
    }

    #[test]
    fn test_snapshot_roundtrips_through_json() {
        let mut settings = EnhancementSettings::default();
        settings.stain_kind = StainKind::HDab;
        settings.stain.set_view_mode(StainViewMode::Stain2Only);
        let snap = settings.snapshot();

        let json = serde_json::to_string(&snap).unwrap();
        let back: SettingsSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(snap, back);
    }

    #[test]
    fn test_default_is_identity_tone() {
        assert!(ColorParameters::default().is_identity());
    }
}
