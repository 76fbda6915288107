use crate::grid::Grid;
use crate::visualizer::frame::FrameBuffer;
use crate::visualizer::geometry::Layout;
use crate::visualizer::palette::{Palette, RenderCategory};

/// Holds the static layer: background plus every cell in its default color.
/// Walls and terminals are drawn live on top, so wall edits never invalidate
/// this cache; only a new layout does.
#[derive(Debug, Default)]
pub struct LayerCompositor {
    static_layer: FrameBuffer,
    #[cfg(test)]
    rebuild_count: usize,
}

impl LayerCompositor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rebuild(&mut self, grid: &Grid, layout: &Layout, palette: &Palette) {
        self.static_layer.ensure_size(layout.canvas());
        self.static_layer.fill(palette.background);
        let empty = palette.color(RenderCategory::Empty);
        for cell in grid.cells() {
            let span = layout.cell_to_pixel_rect(cell).to_span();
            self.static_layer.fill_span(span, empty);
        }
        tracing::debug!(
            grid_size = layout.grid_size(),
            width = layout.canvas().width,
            height = layout.canvas().height,
            "static layer rebuilt"
        );
        #[cfg(test)]
        {
            self.rebuild_count += 1;
        }
    }

    /// Starts a frame from the cached layer without allocating.
    pub fn blit_into(&self, frame: &mut FrameBuffer) {
        frame.copy_from(&self.static_layer);
    }

    pub fn static_layer(&self) -> &FrameBuffer {
        &self.static_layer
    }

    #[cfg(test)]
    pub fn rebuild_count(&self) -> usize {
        self.rebuild_count
    }
}
