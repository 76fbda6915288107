use crate::search::UNREACHABLE_COST;
use crate::visualizer::frame::FrameBuffer;
use crate::visualizer::palette::Color;
use crate::visualizer::VisualizerError;
use ab_glyph::{point, Font, FontArc, FontRef, FontVec, OutlinedGlyph, ScaleFont};
use eframe::egui;
use std::borrow::Cow;
use std::path::Path;

/// Label drawn for cells whose cost is unknown or unreachable.
pub const PLACEHOLDER_LABEL: &str = "-";

const BUILTIN_FONT_NAME: &str = "<builtin>";

/// Integer label for a cost; the unreachable sentinel and non-finite values
/// map to [`PLACEHOLDER_LABEL`].
pub fn cost_label(cost: f64) -> String {
    if !cost.is_finite() || cost >= UNREACHABLE_COST {
        return PLACEHOLDER_LABEL.to_string();
    }
    (cost.trunc() as i64).to_string()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextBounds {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl TextBounds {
    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f32 {
        self.max_y - self.min_y
    }

    fn center(&self) -> (f32, f32) {
        (
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    fn union(self, other: TextBounds) -> TextBounds {
        TextBounds {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }
}

/// Rasterizes cost labels into a [`FrameBuffer`].
pub struct CostText {
    font: FontArc,
    font_scale: f32,
    size: f32,
}

impl std::fmt::Debug for CostText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CostText")
            .field("font_scale", &self.font_scale)
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

impl CostText {
    /// Loads the font at `path`, or egui's built-in proportional font when
    /// no path is configured.
    pub fn load(path: Option<&Path>) -> Result<Self, VisualizerError> {
        match path {
            Some(path) => Self::from_file(path),
            None => Self::builtin(),
        }
    }

    fn from_file(path: &Path) -> Result<Self, VisualizerError> {
        let bytes = std::fs::read(path).map_err(|source| VisualizerError::FontRead {
            path: path.to_path_buf(),
            source,
        })?;
        let font = FontVec::try_from_vec(bytes).map_err(|err| VisualizerError::FontLoad {
            font: path.display().to_string(),
            reason: err.to_string(),
        })?;
        tracing::debug!(path = %path.display(), "loaded cost label font");
        Ok(Self {
            font: FontArc::from(font),
            font_scale: 1.0,
            size: 0.0,
        })
    }

    fn builtin() -> Result<Self, VisualizerError> {
        let missing = |reason: &str| VisualizerError::FontLoad {
            font: BUILTIN_FONT_NAME.to_string(),
            reason: reason.to_string(),
        };
        let definitions = egui::FontDefinitions::default();
        let name = definitions
            .families
            .get(&egui::FontFamily::Proportional)
            .and_then(|family| family.first())
            .ok_or_else(|| missing("no proportional font family"))?;
        let data = definitions
            .font_data
            .get(name)
            .ok_or_else(|| missing("font data missing"))?;

        let font = match &data.font {
            Cow::Borrowed(bytes) => {
                FontRef::try_from_slice_and_index(*bytes, data.index).map(FontArc::from)
            }
            Cow::Owned(bytes) => {
                FontVec::try_from_vec_and_index(bytes.clone(), data.index).map(FontArc::from)
            }
        }
        .map_err(|err| missing(&err.to_string()))?;

        Ok(Self {
            font,
            font_scale: data.tweak.scale,
            size: 0.0,
        })
    }

    /// Sets the pixel height used for labels.
    pub fn set_size(&mut self, size: f32) {
        self.size = size.max(0.0);
    }

    fn outline(&self, text: &str) -> Vec<OutlinedGlyph> {
        if text.is_empty() || self.size <= 0.0 {
            return Vec::new();
        }
        let scaled = self.font.as_scaled(self.size * self.font_scale);
        let mut caret = point(0.0, scaled.ascent());
        let mut glyphs = Vec::with_capacity(text.len());
        for ch in text.chars() {
            let mut glyph = scaled.scaled_glyph(ch);
            glyph.position = caret;
            caret.x += scaled.h_advance(glyph.id);
            if let Some(outlined) = scaled.outline_glyph(glyph) {
                glyphs.push(outlined);
            }
        }
        glyphs
    }

    /// Pixel bounds of the inked area of `text`, relative to the caret origin.
    pub fn measure(&self, text: &str) -> Option<TextBounds> {
        bounds_of(&self.outline(text))
    }

    /// Draws `text` with its inked bounds centered on `center`.
    pub fn draw_centered(
        &self,
        frame: &mut FrameBuffer,
        text: &str,
        center: (f32, f32),
        color: Color,
    ) {
        let glyphs = self.outline(text);
        let Some(bounds) = bounds_of(&glyphs) else {
            return;
        };
        let (bx, by) = bounds.center();
        let dx = (center.0 - bx).round() as i32;
        let dy = (center.1 - by).round() as i32;

        for glyph in &glyphs {
            let px = glyph.px_bounds();
            let origin_x = px.min.x as i32 + dx;
            let origin_y = px.min.y as i32 + dy;
            glyph.draw(|x, y, coverage| {
                let alpha = (color.a as f32 * coverage).round().clamp(0.0, 255.0) as u8;
                if alpha == 0 {
                    return;
                }
                frame.blend_pixel(
                    origin_x + x as i32,
                    origin_y + y as i32,
                    Color { a: alpha, ..color },
                );
            });
        }
    }
}

fn bounds_of(glyphs: &[OutlinedGlyph]) -> Option<TextBounds> {
    glyphs
        .iter()
        .map(|glyph| {
            let px = glyph.px_bounds();
            TextBounds {
                min_x: px.min.x,
                min_y: px.min.y,
                max_x: px.max.x,
                max_y: px.max.y,
            }
        })
        .reduce(TextBounds::union)
}
