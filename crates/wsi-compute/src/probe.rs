//! One-time GPU capability probe.
//!
//! Probed once at startup, injected into whatever needs it, never consulted
//! as mutable global state. A host that already knows it is headless can
//! construct [`GpuCapability::unavailable`] and skip the probe entirely.

/// Result of the one-time GPU context probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GpuCapability {
    /// Whether a usable GPU adapter exists.
    pub available: bool,
    /// Adapter name when available.
    pub adapter_name: Option<String>,
    /// Graphics backend name (Vulkan, Metal, DX12, ...) when available.
    pub backend: Option<String>,
}

impl GpuCapability {
    /// Probes for a GPU adapter.
    ///
    /// Call once at startup and pass the result into engine construction.
    #[cfg(feature = "wgpu")]
    pub fn probe() -> Self {
        pollster::block_on(async {
            let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
                backends: wgpu::Backends::all(),
                ..Default::default()
            });
            match instance
                .request_adapter(&wgpu::RequestAdapterOptions {
                    power_preference: wgpu::PowerPreference::HighPerformance,
                    compatible_surface: None,
                    force_fallback_adapter: false,
                })
                .await
            {
                Some(adapter) => {
                    let info = adapter.get_info();
                    Self {
                        available: true,
                        adapter_name: Some(info.name),
                        backend: Some(info.backend.to_str().to_string()),
                    }
                }
                None => Self::unavailable(),
            }
        })
    }

    /// Probe stub for builds without the `wgpu` feature.
    #[cfg(not(feature = "wgpu"))]
    pub fn probe() -> Self {
        Self::unavailable()
    }

    /// A capability result reporting no GPU.
    pub fn unavailable() -> Self {
        Self { available: false, adapter_name: None, backend: None }
    }

    /// Human-readable description for diagnostics.
    pub fn describe(&self) -> String {
        match (&self.adapter_name, &self.backend) {
            (Some(name), Some(backend)) => format!("[+] GPU: {name} ({backend})"),
            _ => "[-] GPU: unavailable, CPU paths active".to_string(),
        }
    }

    /// Render path this capability supports.
    pub fn render_path(&self) -> RenderPath {
        if self.available { RenderPath::Gpu } else { RenderPath::Cpu }
    }
}

/// Which execution path serves a frame.
///
/// The two paths are mutually exclusive per frame: a frame either runs the
/// GPU pipelines or the CPU fallback, never both.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderPath {
    /// wgpu compute pipelines.
    Gpu,
    /// CPU pixel-buffer fallback.
    Cpu,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailable_capability() {
        let cap = GpuCapability::unavailable();
        assert!(!cap.available);
        assert_eq!(cap.render_path(), RenderPath::Cpu);
        assert!(cap.describe().contains("unavailable"));
    }

    #[test]
    fn test_available_capability_description() {
        let cap = GpuCapability {
            available: true,
            adapter_name: Some("TestAdapter".into()),
            backend: Some("Vulkan".into()),
        };
        assert_eq!(cap.render_path(), RenderPath::Gpu);
        assert!(cap.describe().contains("TestAdapter"));
        assert!(cap.describe().contains("Vulkan"));
    }
}
