//! The enhancement controller: the host-facing control surface.
//!
//! Owns the parameter store, the ICC transform for the current slide, the
//! stain matrix cache, the optional GPU engine, and the per-frame schedule.
//! Everything runs on the host's render thread; the host pushes lifecycle
//! events in and calls [`EnhancementController::render`] once per animation
//! frame with that frame's surfaces.
//!
//! Failure policy: a cosmetic enhancement that cannot be applied degrades
//! or logs — it never blocks the underlying slide view. The only signal
//! callers see is the boolean result of the enable operations.

use tracing::{debug, warn};

use wsi_compute::{GpuCapability, GpuEngine, RenderPath, rgba8_to_f32, rgba_f32_to_u8};
use wsi_core::{
    EnhancementSettings, FocusColormap, RenderSurface, RenderEvent, FrameScheduler,
    SettingsSnapshot, StainKind, StainViewMode, is_readable,
};
use wsi_icc::{IccTransform, ProfileSource, apply_pixel};
use wsi_math::Vec3;
use wsi_stain::{StainMatrix, StainMatrixCache};

use crate::compositor::{self, FrameOutput};

/// Host-facing controller for the whole enhancement pipeline.
pub struct EnhancementController {
    settings: EnhancementSettings,
    capability: GpuCapability,
    gpu: Option<GpuEngine>,
    icc: Option<IccTransform>,
    matrices: StainMatrixCache,
    scheduler: FrameScheduler,
    attached: bool,
}

impl EnhancementController {
    /// Creates the controller from a one-time capability probe result.
    ///
    /// The probe is injected rather than run here so hosts control when
    /// (and whether) GPU detection happens. A probe that reported a GPU
    /// which then fails device creation degrades to the CPU paths.
    pub fn new(capability: GpuCapability) -> Self {
        let gpu = if capability.available {
            match GpuEngine::new(&capability) {
                Ok(engine) => Some(engine),
                Err(err) => {
                    warn!(%err, "GPU engine unavailable, CPU paths active");
                    None
                }
            }
        } else {
            None
        };

        debug!("{}", capability.describe());

        Self {
            settings: EnhancementSettings::default(),
            capability,
            gpu,
            icc: None,
            matrices: StainMatrixCache::new(),
            scheduler: FrameScheduler::new(),
            attached: true,
        }
    }

    /// Execution path frames will take.
    pub fn render_path(&self) -> RenderPath {
        if self.gpu.is_some() { RenderPath::Gpu } else { RenderPath::Cpu }
    }

    /// The injected capability probe result.
    pub fn capability(&self) -> &GpuCapability {
        &self.capability
    }

    /// Full current configuration, for persistence and testing.
    pub fn settings_snapshot(&self) -> SettingsSnapshot {
        self.settings.snapshot()
    }

    // --- manual tone -----------------------------------------------------

    /// Sets manual gamma (clamped).
    pub fn set_gamma(&mut self, gamma: f32) {
        self.settings.color.set_gamma(gamma);
        self.scheduler.request(RenderEvent::Update);
    }

    /// Sets brightness (clamped).
    pub fn set_brightness(&mut self, brightness: f32) {
        self.settings.color.set_brightness(brightness);
        self.scheduler.request(RenderEvent::Update);
    }

    /// Sets contrast (clamped).
    pub fn set_contrast(&mut self, contrast: f32) {
        self.settings.color.set_contrast(contrast);
        self.scheduler.request(RenderEvent::Update);
    }

    /// Sets saturation (clamped).
    pub fn set_saturation(&mut self, saturation: f32) {
        self.settings.color.set_saturation(saturation);
        self.scheduler.request(RenderEvent::Update);
    }

    // --- ICC -------------------------------------------------------------

    /// Enables ICC correction for a slide.
    ///
    /// Fetches the slide's color metadata through the injected source.
    /// Returns `false` — leaving ICC disabled, with no automatic retry —
    /// when the fetch fails or the slide carries no transform data.
    /// Re-enabling with the same slide is idempotent. Never mutates the
    /// manual tone parameters.
    pub fn enable_icc(&mut self, source: &dyn ProfileSource, slide_id: &str) -> bool {
        let meta = match source.fetch_color_metadata(slide_id) {
            Ok(meta) => meta,
            Err(err) => {
                warn!(%err, slide_id, "ICC metadata fetch failed, staying disabled");
                self.settings.icc_enabled = false;
                self.icc = None;
                return false;
            }
        };

        match IccTransform::from_metadata(&meta) {
            Some(transform) => {
                self.icc = Some(transform);
                self.settings.icc_enabled = true;
                self.scheduler.request(RenderEvent::Update);
                true
            }
            None => {
                debug!(slide_id, "slide has no usable color transform");
                self.settings.icc_enabled = false;
                self.icc = None;
                false
            }
        }
    }

    /// Disables ICC correction and discards the slide transform.
    ///
    /// Idempotent; never touches the manual tone parameters.
    pub fn disable_icc(&mut self) {
        self.settings.icc_enabled = false;
        self.icc = None;
        self.scheduler.request(RenderEvent::Update);
    }

    // --- stain deconvolution --------------------------------------------

    /// Enables stain deconvolution for a protocol.
    ///
    /// Always succeeds: a degenerate stain basis renders through the
    /// identity substitute and is reported via the matrix diagnostic.
    pub fn enable_stain(&mut self, kind: StainKind) -> bool {
        self.settings.stain_kind = kind;
        self.settings.stain_enabled = true;
        if self.matrices.get(kind).degraded {
            warn!(stain = kind.name(), "stain basis degraded, rendering through identity");
        }
        self.scheduler.request(RenderEvent::Update);
        true
    }

    /// Disables stain deconvolution.
    pub fn disable_stain(&mut self) {
        self.settings.stain_enabled = false;
        self.scheduler.request(RenderEvent::Update);
    }

    /// Sets hematoxylin intensity (clamped).
    pub fn set_hematoxylin(&mut self, intensity: f32) {
        self.settings.stain.set_hematoxylin(intensity);
        self.scheduler.request(RenderEvent::Update);
    }

    /// Sets counterstain intensity (clamped).
    pub fn set_counterstain(&mut self, intensity: f32) {
        self.settings.stain.set_counterstain(intensity);
        self.scheduler.request(RenderEvent::Update);
    }

    /// Sets the stain view mode.
    pub fn set_view_mode(&mut self, mode: StainViewMode) {
        self.settings.stain.set_view_mode(mode);
        self.scheduler.request(RenderEvent::Update);
    }

    // --- focus -----------------------------------------------------------

    /// Enables the focus-quality overlay.
    pub fn enable_focus(&mut self) -> bool {
        self.settings.focus_enabled = true;
        self.scheduler.request(RenderEvent::Update);
        true
    }

    /// Disables the focus-quality overlay.
    pub fn disable_focus(&mut self) {
        self.settings.focus_enabled = false;
        self.scheduler.request(RenderEvent::Update);
    }

    /// Sets focus overlay opacity (clamped).
    pub fn set_focus_opacity(&mut self, opacity: f32) {
        self.settings.focus.set_opacity(opacity);
        self.scheduler.request(RenderEvent::Update);
    }

    /// Sets the focus gradient threshold (clamped).
    pub fn set_focus_threshold(&mut self, threshold: f32) {
        self.settings.focus.set_threshold(threshold);
        self.scheduler.request(RenderEvent::Update);
    }

    /// Sets the focus smoothing scale (clamped).
    pub fn set_focus_smoothing(&mut self, scale: f32) {
        self.settings.focus.set_smoothing_scale(scale);
        self.scheduler.request(RenderEvent::Update);
    }

    /// Sets the focus colormap.
    pub fn set_focus_colormap(&mut self, colormap: FocusColormap) {
        self.settings.focus.set_colormap(colormap);
        self.scheduler.request(RenderEvent::Update);
    }

    // --- lifecycle -------------------------------------------------------

    /// Receives a host lifecycle event as a recompute trigger.
    ///
    /// Any number of events within one animation frame collapse into a
    /// single recompute. Ignored after [`Self::detach`].
    pub fn notify(&mut self, event: RenderEvent) {
        if self.attached {
            self.scheduler.request(event);
        }
    }

    /// Stops listening to host events, for slide switches and teardown.
    pub fn detach(&mut self) {
        self.attached = false;
        self.scheduler.clear();
    }

    /// Disables every enhancement and detaches from events.
    ///
    /// Called on slide switch so nothing leaks across slides: the ICC
    /// transform is slide-specific and must not survive, and overlay
    /// surfaces are the host's to drop.
    pub fn teardown(&mut self) {
        self.settings.icc_enabled = false;
        self.icc = None;
        self.settings.stain_enabled = false;
        self.settings.focus_enabled = false;
        self.detach();
    }

    /// True when a recompute is scheduled for the next frame.
    pub fn recompute_pending(&self) -> bool {
        self.scheduler.is_pending()
    }

    // --- per-frame work --------------------------------------------------

    /// Runs one animation frame.
    ///
    /// Recomputes the active overlays when any trigger fired since the last
    /// frame, then returns the output description for the host to
    /// composite. With no pending trigger, overlays are left as-is and only
    /// the path decision is returned.
    pub fn render(
        &mut self,
        base: &mut dyn RenderSurface,
        stain_overlay: Option<&mut dyn RenderSurface>,
        focus_overlay: Option<&mut dyn RenderSurface>,
        color_overlay: Option<&mut dyn RenderSurface>,
    ) -> FrameOutput {
        let output = compositor::compose(&self.settings, self.icc.as_ref(), self.render_path());

        if !self.scheduler.begin_frame() {
            return output;
        }

        if output.stain_overlay {
            self.run_stain(base, stain_overlay);
        }
        if output.focus_overlay {
            self.run_focus(base, focus_overlay);
        }
        if output.color_overlay {
            self.run_color(base, color_overlay);
        }

        output
    }

    /// Reads the frame's base pixels, honoring the readability probe.
    ///
    /// Returns `None` — retaining prior output — when the surface refuses
    /// pixel reads. No retry is scheduled; the next host event will try
    /// again against whatever surface exists then.
    fn read_base(&self, base: &dyn RenderSurface) -> Option<Vec<u8>> {
        if !is_readable(base) {
            warn!("base surface is not pixel-readable, retaining prior output");
            return None;
        }
        match base.read_all() {
            Ok(pixels) => Some(pixels),
            Err(err) => {
                warn!(%err, "base surface read failed");
                None
            }
        }
    }

    fn run_stain(&mut self, base: &mut dyn RenderSurface, overlay: Option<&mut dyn RenderSurface>) {
        let matrix = *self.matrices.get(self.settings.stain_kind);
        let adj = self.settings.stain;
        let Some(pixels) = self.read_base(base) else { return };
        let (width, height) = (base.width(), base.height());

        let processed = match self.try_gpu_stain(&pixels, width, height, &matrix) {
            Some(gpu_out) => gpu_out,
            None => {
                let mut cpu = pixels;
                wsi_stain::cpu::process_rgba8(&mut cpu, &matrix, &adj);
                cpu
            }
        };

        let target: &mut dyn RenderSurface = match overlay {
            Some(o) => &mut *o,
            None => &mut *base,
        };
        if let Err(err) = target.write_all(&processed) {
            warn!(%err, "stain output write failed");
        }
    }

    fn try_gpu_stain(
        &self,
        pixels: &[u8],
        width: u32,
        height: u32,
        matrix: &StainMatrix,
    ) -> Option<Vec<u8>> {
        let engine = self.gpu.as_ref()?;
        let floats = rgba8_to_f32(pixels);
        match engine.stain_separation(&floats, width, height, matrix, &self.settings.stain) {
            Ok(out) => Some(rgba_f32_to_u8(&out)),
            Err(err) => {
                warn!(%err, "GPU stain path failed, falling back to CPU");
                None
            }
        }
    }

    fn run_focus(&mut self, base: &mut dyn RenderSurface, overlay: Option<&mut dyn RenderSurface>) {
        let Some(overlay) = overlay else {
            debug!("focus enabled but no overlay surface supplied, skipping");
            return;
        };
        let params = self.settings.focus;
        let Some(pixels) = self.read_base(base) else { return };
        let (width, height) = (base.width(), base.height());

        let heatmap = match self.try_gpu_focus(&pixels, width, height) {
            Some(gpu_out) => gpu_out,
            None => wsi_focus::render_heatmap(&pixels, width, height, &params),
        };

        if let Err(err) = overlay.write_pixels(0, 0, width, height, &heatmap) {
            warn!(%err, "focus overlay write failed");
        }
    }

    fn try_gpu_focus(&self, pixels: &[u8], width: u32, height: u32) -> Option<Vec<u8>> {
        let engine = self.gpu.as_ref()?;
        let floats = rgba8_to_f32(pixels);
        match engine.focus_heatmap(&floats, width, height, &self.settings.focus) {
            Ok(out) => Some(rgba_f32_to_u8(&out)),
            Err(err) => {
                warn!(%err, "GPU focus path failed, falling back to CPU");
                None
            }
        }
    }

    fn run_color(&mut self, base: &mut dyn RenderSurface, overlay: Option<&mut dyn RenderSurface>) {
        let Some(icc) = self.icc else { return };
        let tone = self.settings.color;
        let Some(pixels) = self.read_base(base) else { return };
        let (width, height) = (base.width(), base.height());

        let processed = match self.try_gpu_color(&pixels, width, height, &icc) {
            Some(gpu_out) => gpu_out,
            None => {
                // CPU reference of the same pipeline; identical output,
                // still carried on the overlay path.
                let mut cpu = pixels;
                for px in cpu.chunks_exact_mut(4) {
                    let rgb = Vec3::new(
                        px[0] as f32 / 255.0,
                        px[1] as f32 / 255.0,
                        px[2] as f32 / 255.0,
                    );
                    let out = apply_pixel(rgb, Some(&icc), &tone);
                    px[0] = (out.x * 255.0 + 0.5) as u8;
                    px[1] = (out.y * 255.0 + 0.5) as u8;
                    px[2] = (out.z * 255.0 + 0.5) as u8;
                }
                cpu
            }
        };

        let target: &mut dyn RenderSurface = match overlay {
            Some(o) => &mut *o,
            None => &mut *base,
        };
        if let Err(err) = target.write_all(&processed) {
            warn!(%err, "color output write failed");
        }
    }

    fn try_gpu_color(
        &self,
        pixels: &[u8],
        width: u32,
        height: u32,
        icc: &IccTransform,
    ) -> Option<Vec<u8>> {
        let engine = self.gpu.as_ref()?;
        let floats = rgba8_to_f32(pixels);
        match engine.color_transform(&floats, width, height, icc, &self.settings.color) {
            Ok(out) => Some(rgba_f32_to_u8(&out)),
            Err(err) => {
                warn!(%err, "GPU color path failed, falling back to CPU reference");
                None
            }
        }
    }
}

impl std::fmt::Debug for EnhancementController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnhancementController")
            .field("settings", &self.settings)
            .field("path", &self.render_path())
            .field("attached", &self.attached)
            .finish_non_exhaustive()
    }
}
