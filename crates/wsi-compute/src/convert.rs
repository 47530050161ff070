//! RGBA8 <-> normalized f32 buffer conversion.
//!
//! Host surfaces speak RGBA8; the compute pipelines and the tone/stain math
//! work in normalized f32. Conversion happens once per frame on each side
//! of the dispatch.

/// Expands RGBA8 bytes to normalized f32 components.
pub fn rgba8_to_f32(rgba: &[u8]) -> Vec<f32> {
    rgba.iter().map(|&v| v as f32 / 255.0).collect()
}

/// Quantizes normalized f32 components back to RGBA8 bytes.
///
/// Values are clamped to [0, 1] before rounding.
pub fn rgba_f32_to_u8(rgba: &[f32]) -> Vec<u8> {
    rgba.iter()
        .map(|&v| (v.clamp(0.0, 1.0) * 255.0 + 0.5) as u8)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_exact_at_8_bits() {
        let bytes: Vec<u8> = (0..=255).collect::<Vec<_>>().repeat(4);
        let floats = rgba8_to_f32(&bytes);
        assert_eq!(rgba_f32_to_u8(&floats), bytes);
    }

    #[test]
    fn test_out_of_range_clamped() {
        assert_eq!(rgba_f32_to_u8(&[-0.5, 1.5]), vec![0, 255]);
    }
}
