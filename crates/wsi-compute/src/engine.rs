//! wgpu compute engine for the enhancement pipelines.
//!
//! One pipeline per effect, compiled once at construction. Per frame the
//! caller uploads the current surface pixels, the engine dispatches a
//! single pass, and the result is read back synchronously — no state
//! survives between frames beyond the compiled pipelines themselves.

use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use tracing::debug;
use wgpu::util::DeviceExt;
use wsi_core::{ColorParameters, FocusParameters, StainAdjustment, StainViewMode};
use wsi_icc::IccTransform;
use wsi_math::Mat3;
use wsi_stain::StainMatrix;
use wsi_stain::deconvolve::TRANSMITTANCE_FLOOR;

use crate::shaders;
use crate::{ComputeError, ComputeResult, GpuCapability};

/// Dimensions uniform: [width, height, 0, 0].
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
struct DimsUniform {
    dims: [u32; 4],
}

/// Color transform parameters.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
struct ColorUniform {
    gamma: [f32; 4],
    tone: [f32; 4],
    matrix: [f32; 16],
}

/// Stain deconvolution parameters.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
struct StainUniform {
    unmix0: [f32; 4],
    unmix1: [f32; 4],
    unmix2: [f32; 4],
    stain1: [f32; 4],
    stain2: [f32; 4],
    residual: [f32; 4],
    factors: [f32; 4],
}

/// Focus heatmap parameters.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
struct FocusUniform {
    params: [f32; 4],
}

/// Packs a row-major [`Mat3`] into a column-major mat4x4 uniform.
fn mat3_to_uniform(m: &Mat3) -> [f32; 16] {
    let mut out = [0.0f32; 16];
    for col in 0..3 {
        for row in 0..3 {
            out[col * 4 + row] = m.m[row][col];
        }
    }
    out[15] = 1.0;
    out
}

fn vec4_of(v: wsi_math::Vec3) -> [f32; 4] {
    [v.x, v.y, v.z, 0.0]
}

struct Pipelines {
    color: wgpu::ComputePipeline,
    stain: wgpu::ComputePipeline,
    focus: wgpu::ComputePipeline,
}

/// GPU engine holding the device, queue, and compiled pipelines.
pub struct GpuEngine {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    pipelines: Pipelines,
}

impl GpuEngine {
    /// Creates the engine from a probed capability.
    ///
    /// Refuses construction when the probe reported no adapter; callers
    /// fall back to the CPU paths in that case.
    pub fn new(capability: &GpuCapability) -> ComputeResult<Self> {
        if !capability.available {
            return Err(ComputeError::BackendNotAvailable(
                "capability probe reported no GPU context".into(),
            ));
        }
        pollster::block_on(Self::new_async())
    }

    async fn new_async() -> ComputeResult<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok_or(ComputeError::NoAdapter)?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("wsi_compute_device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: wgpu::MemoryHints::Performance,
                    ..Default::default()
                },
                None,
            )
            .await
            .map_err(|e| ComputeError::DeviceCreation(e.to_string()))?;

        let device = Arc::new(device);
        let queue = Arc::new(queue);
        let pipelines = Self::create_pipelines(&device);

        debug!(adapter = %adapter.get_info().name, "GPU engine ready");
        Ok(Self { device, queue, pipelines })
    }

    fn create_pipelines(device: &wgpu::Device) -> Pipelines {
        let create = |source: &str, label: &str| -> wgpu::ComputePipeline {
            let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(label),
                source: wgpu::ShaderSource::Wgsl(source.into()),
            });
            device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                label: Some(label),
                layout: None,
                module: &module,
                entry_point: Some("main"),
                compilation_options: Default::default(),
                cache: None,
            })
        };

        Pipelines {
            color: create(shaders::COLOR_TRANSFORM, "color_transform_pipeline"),
            stain: create(shaders::STAIN_SEPARATION, "stain_separation_pipeline"),
            focus: create(shaders::FOCUS_HEATMAP, "focus_heatmap_pipeline"),
        }
    }

    /// Runs the ICC + manual tone pipeline over an RGBA f32 buffer.
    pub fn color_transform(
        &self,
        pixels: &[f32],
        width: u32,
        height: u32,
        icc: &IccTransform,
        tone: &ColorParameters,
    ) -> ComputeResult<Vec<f32>> {
        let uniform = ColorUniform {
            gamma: [
                icc.gamma[0],
                icc.gamma[1],
                icc.gamma[2],
                if icc.has_matrix() { 1.0 } else { 0.0 },
            ],
            tone: [tone.brightness, tone.contrast, tone.saturation, tone.gamma],
            matrix: mat3_to_uniform(&icc.matrix.unwrap_or(Mat3::IDENTITY)),
        };
        self.run(&self.pipelines.color, pixels, width, height, bytemuck::bytes_of(&uniform))
    }

    /// Runs stain deconvolution over an RGBA f32 buffer.
    pub fn stain_separation(
        &self,
        pixels: &[f32],
        width: u32,
        height: u32,
        matrix: &StainMatrix,
        adj: &StainAdjustment,
    ) -> ComputeResult<Vec<f32>> {
        let mode = match adj.view_mode {
            StainViewMode::Combined => 0.0,
            StainViewMode::Stain1Only => 1.0,
            StainViewMode::Stain2Only => 2.0,
        };
        let uniform = StainUniform {
            unmix0: vec4_of(matrix.unmix.row(0)),
            unmix1: vec4_of(matrix.unmix.row(1)),
            unmix2: vec4_of(matrix.unmix.row(2)),
            stain1: vec4_of(matrix.stain1()),
            stain2: vec4_of(matrix.stain2()),
            residual: vec4_of(matrix.residual),
            factors: [adj.hematoxylin, adj.counterstain, mode, TRANSMITTANCE_FLOOR],
        };
        self.run(&self.pipelines.stain, pixels, width, height, bytemuck::bytes_of(&uniform))
    }

    /// Renders the focus heatmap for an RGBA f32 buffer.
    pub fn focus_heatmap(
        &self,
        pixels: &[f32],
        width: u32,
        height: u32,
        params: &FocusParameters,
    ) -> ComputeResult<Vec<f32>> {
        let step = params.smoothing_scale.round().max(1.0);
        let uniform = FocusUniform {
            params: [params.opacity, params.threshold, step, 0.0],
        };
        self.run(&self.pipelines.focus, pixels, width, height, bytemuck::bytes_of(&uniform))
    }

    /// Uploads, dispatches one pass, and reads the result back.
    fn run(
        &self,
        pipeline: &wgpu::ComputePipeline,
        pixels: &[f32],
        width: u32,
        height: u32,
        uniform_bytes: &[u8],
    ) -> ComputeResult<Vec<f32>> {
        let expected = (width as usize) * (height as usize) * 4;
        if pixels.len() != expected {
            return Err(ComputeError::BufferSizeMismatch { expected, actual: pixels.len() });
        }

        let size_bytes = (pixels.len() * 4) as u64;

        let src = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("src_pixels"),
            contents: bytemuck::cast_slice(pixels),
            usage: wgpu::BufferUsages::STORAGE,
        });
        let dst = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("dst_pixels"),
            size: size_bytes,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });
        let dims = DimsUniform { dims: [width, height, 0, 0] };
        let dims_buf = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("dims_uniform"),
            contents: bytemuck::bytes_of(&dims),
            usage: wgpu::BufferUsages::UNIFORM,
        });
        let params_buf = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("params_uniform"),
            contents: uniform_bytes,
            usage: wgpu::BufferUsages::UNIFORM,
        });

        let layout = pipeline.get_bind_group_layout(0);
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("enhancement_bind_group"),
            layout: &layout,
            entries: &[
                wgpu::BindGroupEntry { binding: 0, resource: src.as_entire_binding() },
                wgpu::BindGroupEntry { binding: 1, resource: dst.as_entire_binding() },
                wgpu::BindGroupEntry { binding: 2, resource: dims_buf.as_entire_binding() },
                wgpu::BindGroupEntry { binding: 3, resource: params_buf.as_entire_binding() },
            ],
        });

        let total = width * height;
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some("enhancement_encoder") });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("enhancement_pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            pass.dispatch_workgroups(total.div_ceil(256), 1, 1);
        }

        // Readback through a staging buffer.
        let staging = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("staging_buffer"),
            size: size_bytes,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });
        encoder.copy_buffer_to_buffer(&dst, 0, &staging, 0, size_bytes);
        self.queue.submit(std::iter::once(encoder.finish()));

        let slice = staging.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |r| {
            let _ = tx.send(r);
        });
        self.device.poll(wgpu::Maintain::Wait);

        rx.recv()
            .map_err(|_| ComputeError::OperationFailed("map channel closed".into()))?
            .map_err(|e| ComputeError::OperationFailed(format!("map failed: {e}")))?;

        let data = slice.get_mapped_range();
        let result: Vec<f32> = bytemuck::cast_slice(&data).to_vec();
        drop(data);
        staging.unmap();

        Ok(result)
    }
}

impl std::fmt::Debug for GpuEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GpuEngine").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refuses_unavailable_capability() {
        let err = GpuEngine::new(&GpuCapability::unavailable()).unwrap_err();
        assert!(matches!(err, ComputeError::BackendNotAvailable(_)));
    }

    #[test]
    fn test_mat3_uniform_is_column_major() {
        let m = Mat3::from_rows([[1.0, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 9.0]]);
        let u = mat3_to_uniform(&m);
        // First column of the mat4 holds the first column of the Mat3.
        assert_eq!(&u[0..3], &[1.0, 4.0, 7.0]);
        assert_eq!(&u[4..7], &[2.0, 5.0, 8.0]);
        assert_eq!(u[15], 1.0);
    }
}
