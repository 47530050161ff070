//! Host rendering surface contract.
//!
//! The host hands the enhancement core a drawable RGBA surface per frame and
//! receives overlay surfaces back. Surfaces are ephemeral: bound to the
//! current frame dimensions, recreated on resize, never persisted by the
//! engines.
//!
//! A surface may refuse pixel reads. This mirrors cross-origin-restricted
//! canvas sources: drawing into the surface is allowed, but reading it back
//! raises a security error. Engines must probe with [`is_readable`] (a 1x1
//! read) before attempting CPU processing and abort — not busy-retry — when
//! the surface is restricted.

use crate::error::{CoreError, CoreResult};

/// A drawable, optionally readable RGBA8 pixel surface.
///
/// Coordinates are top-left origin. Pixel data is tightly packed RGBA, four
/// bytes per pixel, row-major.
pub trait RenderSurface {
    /// Surface width in pixels.
    fn width(&self) -> u32;

    /// Surface height in pixels.
    fn height(&self) -> u32;

    /// Reads a region as tightly packed RGBA8 bytes.
    ///
    /// Returns [`CoreError::SecurityRestricted`] when the surface does not
    /// permit pixel reads, and [`CoreError::InvalidRegion`] when the region
    /// falls outside the surface.
    fn read_pixels(&self, x: u32, y: u32, w: u32, h: u32) -> CoreResult<Vec<u8>>;

    /// Writes a region of tightly packed RGBA8 bytes.
    fn write_pixels(&mut self, x: u32, y: u32, w: u32, h: u32, data: &[u8]) -> CoreResult<()>;

    /// Reads the entire surface.
    fn read_all(&self) -> CoreResult<Vec<u8>> {
        self.read_pixels(0, 0, self.width(), self.height())
    }

    /// Replaces the entire surface contents.
    fn write_all(&mut self, data: &[u8]) -> CoreResult<()> {
        self.write_pixels(0, 0, self.width(), self.height(), data)
    }
}

/// Probes surface readability with a 1x1 pixel read.
///
/// The read result is discarded; only whether the surface raised a security
/// error matters.
pub fn is_readable(surface: &dyn RenderSurface) -> bool {
    match surface.read_pixels(0, 0, 1, 1) {
        Ok(_) => true,
        Err(err) => !err.is_security_restricted(),
    }
}

fn check_region(x: u32, y: u32, w: u32, h: u32, width: u32, height: u32) -> CoreResult<()> {
    let x_end = x.checked_add(w);
    let y_end = y.checked_add(h);
    match (x_end, y_end) {
        (Some(xe), Some(ye)) if xe <= width && ye <= height && w > 0 && h > 0 => Ok(()),
        _ => Err(CoreError::invalid_region(x, y, w, h, width, height)),
    }
}

/// In-memory [`RenderSurface`] for tests and headless processing.
///
/// # Example
///
/// ```rust
/// use wsi_core::{MemorySurface, RenderSurface};
///
/// let mut surface = MemorySurface::new(4, 4);
/// surface.fill([200, 150, 190, 255]);
/// let px = surface.read_pixels(1, 1, 1, 1).unwrap();
/// assert_eq!(px, vec![200, 150, 190, 255]);
/// ```
#[derive(Debug, Clone)]
pub struct MemorySurface {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
    readable: bool,
}

impl MemorySurface {
    /// Creates a zeroed surface.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; (width as usize) * (height as usize) * 4],
            readable: true,
        }
    }

    /// Creates a surface from existing RGBA8 data.
    pub fn from_pixels(width: u32, height: u32, pixels: Vec<u8>) -> CoreResult<Self> {
        let expected = (width as usize) * (height as usize) * 4;
        if pixels.len() != expected {
            return Err(CoreError::BufferSizeMismatch { expected, actual: pixels.len() });
        }
        Ok(Self { width, height, pixels, readable: true })
    }

    /// Creates a surface that refuses pixel reads, emulating a
    /// cross-origin-restricted source.
    pub fn restricted(width: u32, height: u32) -> Self {
        Self { readable: false, ..Self::new(width, height) }
    }

    /// Fills the whole surface with one RGBA color.
    pub fn fill(&mut self, rgba: [u8; 4]) {
        for px in self.pixels.chunks_exact_mut(4) {
            px.copy_from_slice(&rgba);
        }
    }

    /// Raw pixel data, row-major RGBA8.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }
}

impl RenderSurface for MemorySurface {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn read_pixels(&self, x: u32, y: u32, w: u32, h: u32) -> CoreResult<Vec<u8>> {
        if !self.readable {
            return Err(CoreError::security_restricted("tainted source surface"));
        }
        check_region(x, y, w, h, self.width, self.height)?;

        let mut out = Vec::with_capacity((w as usize) * (h as usize) * 4);
        for row in y..y + h {
            let start = ((row as usize) * (self.width as usize) + x as usize) * 4;
            let end = start + (w as usize) * 4;
            out.extend_from_slice(&self.pixels[start..end]);
        }
        Ok(out)
    }

    fn write_pixels(&mut self, x: u32, y: u32, w: u32, h: u32, data: &[u8]) -> CoreResult<()> {
        check_region(x, y, w, h, self.width, self.height)?;
        let expected = (w as usize) * (h as usize) * 4;
        if data.len() != expected {
            return Err(CoreError::BufferSizeMismatch { expected, actual: data.len() });
        }

        for (i, src_row) in data.chunks_exact((w as usize) * 4).enumerate() {
            let row = y as usize + i;
            let start = (row * (self.width as usize) + x as usize) * 4;
            self.pixels[start..start + src_row.len()].copy_from_slice(src_row);
        }
        Ok(())
    }
}
