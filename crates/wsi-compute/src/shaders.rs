//! WGSL shader sources for the enhancement compute pipelines.
//!
//! All three pipelines share the same buffer layout: RGBA f32 storage
//! buffers in and out, a `vec4<u32>` dims uniform (width, height, unused,
//! unused), and a pipeline-specific parameter uniform. Alpha passes through
//! except in the focus shader, which synthesizes it.

/// ICC + manual tone transform.
///
/// Mirrors `wsi_icc::apply_pixel`: linearize through per-channel gammas,
/// optional matrix in linear light, de-linearize, manual gamma, brightness,
/// contrast about 0.5, BT.709 saturation blend, clamp.
pub const COLOR_TRANSFORM: &str = r#"
struct ColorParams {
    gamma: vec4<f32>,   // rgb linearization gamma, w: has_matrix flag
    tone: vec4<f32>,    // brightness, contrast, saturation, manual gamma
    matrix: mat4x4<f32>,
}

@group(0) @binding(0) var<storage, read> src: array<f32>;
@group(0) @binding(1) var<storage, read_write> dst: array<f32>;
@group(0) @binding(2) var<uniform> dims: vec4<u32>;  // w, h, 0, 0
@group(0) @binding(3) var<uniform> params: ColorParams;

@compute @workgroup_size(256)
fn main(@builtin(global_invocation_id) id: vec3<u32>) {
    let px = id.x;
    let total = dims.x * dims.y;
    if px >= total { return; }

    let base = px * 4u;
    var c = vec3<f32>(src[base], src[base + 1u], src[base + 2u]);

    c = pow(max(c, vec3<f32>(0.0)), params.gamma.xyz);
    if params.gamma.w > 0.5 {
        c = (params.matrix * vec4<f32>(c, 1.0)).xyz;
    }
    c = pow(max(c, vec3<f32>(0.0)), vec3<f32>(1.0 / 2.2));

    let manual_gamma = params.tone.w;
    if manual_gamma != 1.0 {
        c = pow(max(c, vec3<f32>(0.0)), vec3<f32>(1.0 / manual_gamma));
    }

    c = c + vec3<f32>(params.tone.x);
    c = (c - vec3<f32>(0.5)) * params.tone.y + vec3<f32>(0.5);

    let luma = dot(c, vec3<f32>(0.2126, 0.7152, 0.0722));
    c = mix(vec3<f32>(luma), c, params.tone.z);
    c = clamp(c, vec3<f32>(0.0), vec3<f32>(1.0));

    dst[base] = c.x;
    dst[base + 1u] = c.y;
    dst[base + 2u] = c.z;
    dst[base + 3u] = src[base + 3u];
}
"#;

/// Ruifrok-Johnston stain deconvolution.
///
/// factors: x = stain1 intensity, y = stain2 intensity, z = view mode
/// (0 combined, 1 stain1-only, 2 stain2-only), w = transmittance floor.
pub const STAIN_SEPARATION: &str = r#"
const LN10: f32 = 2.302585093;

struct StainParams {
    unmix0: vec4<f32>,
    unmix1: vec4<f32>,
    unmix2: vec4<f32>,
    stain1: vec4<f32>,
    stain2: vec4<f32>,
    residual: vec4<f32>,
    factors: vec4<f32>,
}

@group(0) @binding(0) var<storage, read> src: array<f32>;
@group(0) @binding(1) var<storage, read_write> dst: array<f32>;
@group(0) @binding(2) var<uniform> dims: vec4<u32>;
@group(0) @binding(3) var<uniform> params: StainParams;

@compute @workgroup_size(256)
fn main(@builtin(global_invocation_id) id: vec3<u32>) {
    let px = id.x;
    let total = dims.x * dims.y;
    if px >= total { return; }

    let base = px * 4u;
    let rgb = vec3<f32>(src[base], src[base + 1u], src[base + 2u]);

    // Optical density, transmittance floored away from the log singularity.
    let t = max(rgb, vec3<f32>(params.factors.w));
    let od = -log(t) / LN10;

    var conc = vec3<f32>(
        dot(params.unmix0.xyz, od),
        dot(params.unmix1.xyz, od),
        dot(params.unmix2.xyz, od),
    );
    conc = max(conc, vec3<f32>(0.0));

    let mode = u32(params.factors.z + 0.5);
    var od_out: vec3<f32>;
    if mode == 1u {
        od_out = params.stain1.xyz * (conc.x * params.factors.x);
    } else if mode == 2u {
        od_out = params.stain2.xyz * (conc.y * params.factors.y);
    } else {
        od_out = params.stain1.xyz * (conc.x * params.factors.x)
            + params.stain2.xyz * (conc.y * params.factors.y)
            + params.residual.xyz * conc.z;
    }

    let out = clamp(exp(-od_out * LN10), vec3<f32>(0.0), vec3<f32>(1.0));
    dst[base] = out.x;
    dst[base + 1u] = out.y;
    dst[base + 2u] = out.z;
    dst[base + 3u] = src[base + 3u];
}
"#;

/// Focus-quality heatmap.
///
/// params: x = opacity, y = threshold, z = smoothing step (whole pixels),
/// w unused. Output alpha = sharpness * opacity; RGB from the thermal map.
pub const FOCUS_HEATMAP: &str = r#"
struct FocusParams {
    params: vec4<f32>,
}

@group(0) @binding(0) var<storage, read> src: array<f32>;
@group(0) @binding(1) var<storage, read_write> dst: array<f32>;
@group(0) @binding(2) var<uniform> dims: vec4<u32>;
@group(0) @binding(3) var<uniform> focus: FocusParams;

fn luma_at(x: i32, y: i32) -> f32 {
    let w = i32(dims.x);
    let h = i32(dims.y);
    let xc = clamp(x, 0, w - 1);
    let yc = clamp(y, 0, h - 1);
    let base = u32(yc * w + xc) * 4u;
    let rgb = vec3<f32>(src[base], src[base + 1u], src[base + 2u]);
    return dot(rgb, vec3<f32>(0.299, 0.587, 0.114));
}

// 3x3 Gaussian tap (4/2/1 weights) spaced `step` pixels apart.
fn blurred_at(x: i32, y: i32, step: i32) -> f32 {
    var acc = 4.0 * luma_at(x, y);
    acc = acc + 2.0 * (luma_at(x - step, y) + luma_at(x + step, y)
        + luma_at(x, y - step) + luma_at(x, y + step));
    acc = acc + luma_at(x - step, y - step) + luma_at(x + step, y - step)
        + luma_at(x - step, y + step) + luma_at(x + step, y + step);
    return acc / 16.0;
}

@compute @workgroup_size(256)
fn main(@builtin(global_invocation_id) id: vec3<u32>) {
    let px = id.x;
    let total = dims.x * dims.y;
    if px >= total { return; }

    let x = i32(px % dims.x);
    let y = i32(px / dims.x);
    let step = i32(focus.params.z + 0.5);

    let b00 = blurred_at(x - step, y - step, step);
    let b10 = blurred_at(x, y - step, step);
    let b20 = blurred_at(x + step, y - step, step);
    let b01 = blurred_at(x - step, y, step);
    let b21 = blurred_at(x + step, y, step);
    let b02 = blurred_at(x - step, y + step, step);
    let b12 = blurred_at(x, y + step, step);
    let b22 = blurred_at(x + step, y + step, step);

    let gx = (b20 + 2.0 * b21 + b22) - (b00 + 2.0 * b01 + b02);
    let gy = (b02 + 2.0 * b12 + b22) - (b00 + 2.0 * b10 + b20);
    let magnitude = sqrt(gx * gx + gy * gy);

    let sharpness = smoothstep(focus.params.y, focus.params.y + 0.3, magnitude);

    // Thermal ramp: blue -> cyan -> green -> yellow -> red.
    var rgb: vec3<f32>;
    if sharpness < 0.25 {
        rgb = vec3<f32>(0.0, sharpness / 0.25, 1.0);
    } else if sharpness < 0.5 {
        rgb = vec3<f32>(0.0, 1.0, 1.0 - (sharpness - 0.25) / 0.25);
    } else if sharpness < 0.75 {
        rgb = vec3<f32>((sharpness - 0.5) / 0.25, 1.0, 0.0);
    } else {
        rgb = vec3<f32>(1.0, 1.0 - (sharpness - 0.75) / 0.25, 0.0);
    }

    let base = px * 4u;
    dst[base] = rgb.x;
    dst[base + 1u] = rgb.y;
    dst[base + 2u] = rgb.z;
    dst[base + 3u] = sharpness * focus.params.x;
}
"#;
