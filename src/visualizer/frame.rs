use crate::visualizer::geometry::{CanvasSize, PixelSpan};
use crate::visualizer::palette::Color;

/// Row-major RGBA8 canvas.
#[derive(Debug, Clone, Default)]
pub struct FrameBuffer {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
    #[cfg(test)]
    allocation_count: usize,
}

impl FrameBuffer {
    pub fn new(size: CanvasSize, fill: Color) -> Self {
        let mut frame = Self::default();
        frame.ensure_size(size);
        frame.fill(fill);
        frame
    }

    /// Reallocates only when the size changes. Returns whether it did.
    pub fn ensure_size(&mut self, size: CanvasSize) -> bool {
        let target_len = (size.width as usize)
            .saturating_mul(size.height as usize)
            .saturating_mul(4);
        let resized = self.size() != size || self.pixels.len() != target_len;
        if resized {
            self.pixels = vec![0; target_len];
            self.width = size.width;
            self.height = size.height;
            #[cfg(test)]
            {
                self.allocation_count += 1;
            }
        }
        resized
    }

    pub fn size(&self) -> CanvasSize {
        CanvasSize::new(self.width, self.height)
    }

    pub fn as_rgba(&self) -> &[u8] {
        &self.pixels
    }

    pub fn fill(&mut self, color: Color) {
        let rgba = color.to_rgba_array();
        for px in self.pixels.chunks_exact_mut(4) {
            px.copy_from_slice(&rgba);
        }
    }

    /// Copies `other` without reallocating when the sizes already match.
    pub fn copy_from(&mut self, other: &FrameBuffer) {
        self.ensure_size(other.size());
        self.pixels.copy_from_slice(&other.pixels);
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = self.index(x, y);
        Some(Color::from_rgba_array([
            self.pixels[idx],
            self.pixels[idx + 1],
            self.pixels[idx + 2],
            self.pixels[idx + 3],
        ]))
    }

    /// Fills `span` (clipped to the canvas). Opaque colors overwrite, others
    /// are blended source-over.
    pub fn fill_span(&mut self, span: PixelSpan, color: Color) {
        let Some(span) = span.clamp(self.width, self.height) else {
            return;
        };
        let opaque = color.is_opaque();
        let rgba = color.to_rgba_array();
        for y in span.y..(span.y + span.height) {
            for x in span.x..(span.x + span.width) {
                let idx = self.index(x as u32, y as u32);
                if opaque {
                    self.pixels[idx..idx + 4].copy_from_slice(&rgba);
                } else {
                    self.blend_at(idx, color);
                }
            }
        }
    }

    pub fn blend_pixel(&mut self, x: i32, y: i32, color: Color) {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return;
        }
        let idx = self.index(x as u32, y as u32);
        self.blend_at(idx, color);
    }

    fn blend_at(&mut self, idx: usize, color: Color) {
        let dst = &mut self.pixels[idx..idx + 4];
        let blended = blend(Color::from_rgba_array([dst[0], dst[1], dst[2], dst[3]]), color);
        dst.copy_from_slice(&blended.to_rgba_array());
    }

    fn index(&self, x: u32, y: u32) -> usize {
        ((y as usize) * (self.width as usize) + x as usize) * 4
    }

    #[cfg(test)]
    pub fn allocation_count(&self) -> usize {
        self.allocation_count
    }
}

fn blend(bottom: Color, top: Color) -> Color {
    let sa = top.a as f32 / 255.0;
    let da = bottom.a as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);

    if out_a <= f32::EPSILON {
        return Color::rgba(0, 0, 0, 0);
    }

    let channel = |s: u8, d: u8| -> u8 {
        (((s as f32 * sa) + (d as f32 * da * (1.0 - sa))) / out_a)
            .round()
            .clamp(0.0, 255.0) as u8
    };

    Color {
        r: channel(top.r, bottom.r),
        g: channel(top.g, bottom.g),
        b: channel(top.b, bottom.b),
        a: (out_a * 255.0).round().clamp(0.0, 255.0) as u8,
    }
}
