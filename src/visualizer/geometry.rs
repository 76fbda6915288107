use crate::grid::CellCoord;
use thiserror::Error;

/// Gap divisor from the classic layout: 800 px and 11 cells give a 4 px gap.
pub const DEFAULT_GAP_DIVISOR: u32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("canvas has zero area ({width}x{height})")]
    ZeroCanvas { width: u32, height: u32 },
    #[error("grid size {size} is too small, at least 2 cells per side are required")]
    GridTooSmall { size: usize },
    #[error("{size} cells do not fit into a {width} px wide canvas")]
    CellsTooSmall { size: usize, width: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CanvasSize {
    pub width: u32,
    pub height: u32,
}

impl CanvasSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelPoint {
    pub x: i32,
    pub y: i32,
}

impl PixelPoint {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Sub-pixel cell rectangle as produced by the layout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl PixelRect {
    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn center_point(&self) -> PixelPoint {
        let (cx, cy) = self.center();
        PixelPoint::new(cx.round() as i32, cy.round() as i32)
    }

    /// Integer pixels `p` with `x <= p < x + width` (same on y). This is the
    /// set [`Layout::pixel_to_cell`] maps back to the cell.
    pub fn to_span(&self) -> PixelSpan {
        let x0 = self.x.ceil() as i32;
        let y0 = self.y.ceil() as i32;
        let x1 = (self.x + self.width).ceil() as i32;
        let y1 = (self.y + self.height).ceil() as i32;
        PixelSpan {
            x: x0,
            y: y0,
            width: (x1 - x0).max(0),
            height: (y1 - y0).max(0),
        }
    }
}

/// Whole-pixel rectangle, half-open on the right and bottom edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelSpan {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl PixelSpan {
    pub fn clamp(self, width: u32, height: u32) -> Option<PixelSpan> {
        let max_w = width as i32;
        let max_h = height as i32;
        let x0 = self.x.clamp(0, max_w);
        let y0 = self.y.clamp(0, max_h);
        let x1 = (self.x + self.width).clamp(0, max_w);
        let y1 = (self.y + self.height).clamp(0, max_h);
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some(PixelSpan {
            x: x0,
            y: y0,
            width: x1 - x0,
            height: y1 - y0,
        })
    }
}

/// Cached mapping between the logical grid and the pixel canvas.
///
/// Columns are laid out along the canvas width; rows reuse the same pitch,
/// so a canvas shorter than it is wide clips the bottom rows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Layout {
    canvas: CanvasSize,
    grid_size: usize,
    cell_size: f32,
    gap: u32,
}

impl Layout {
    pub fn compute(
        canvas: CanvasSize,
        grid_size: usize,
        gap_divisor: u32,
    ) -> Result<Self, LayoutError> {
        if canvas.width == 0 || canvas.height == 0 {
            return Err(LayoutError::ZeroCanvas {
                width: canvas.width,
                height: canvas.height,
            });
        }
        if grid_size < 2 {
            return Err(LayoutError::GridTooSmall { size: grid_size });
        }

        let gaps = (grid_size - 1) as u64;
        let gap = (canvas.width as u64 / (gaps * gap_divisor.max(1) as u64)) as u32;
        let cell_size =
            (canvas.width as f32 - gap as f32 * gaps as f32) / grid_size as f32;
        if cell_size < 1.0 {
            return Err(LayoutError::CellsTooSmall {
                size: grid_size,
                width: canvas.width,
            });
        }

        Ok(Self {
            canvas,
            grid_size,
            cell_size,
            gap,
        })
    }

    pub fn canvas(&self) -> CanvasSize {
        self.canvas
    }

    pub fn grid_size(&self) -> usize {
        self.grid_size
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    pub fn gap(&self) -> u32 {
        self.gap
    }

    fn pitch(&self) -> f32 {
        self.cell_size + self.gap as f32
    }

    fn axis_start(&self, index: usize) -> f32 {
        self.pitch() * index as f32
    }

    pub fn cell_to_pixel_rect(&self, cell: CellCoord) -> PixelRect {
        PixelRect {
            x: self.axis_start(cell.col),
            y: self.axis_start(cell.row),
            width: self.cell_size,
            height: self.cell_size,
        }
    }

    /// Cell under `point`, or `None` for gap bands and anything outside the
    /// grid or canvas.
    pub fn pixel_to_cell(&self, point: PixelPoint) -> Option<CellCoord> {
        if point.x < 0 || point.y < 0 {
            return None;
        }
        if point.x as u32 >= self.canvas.width || point.y as u32 >= self.canvas.height {
            return None;
        }
        let col = self.axis_index(point.x)?;
        let row = self.axis_index(point.y)?;
        if col >= self.grid_size || row >= self.grid_size {
            return None;
        }
        Some(CellCoord::new(col, row))
    }

    // Same float edges as `cell_to_pixel_rect`, so a pixel is hit exactly
    // when `to_span` paints it. The division only picks candidates; rounding
    // can put the true cell one index off.
    fn axis_index(&self, value: i32) -> Option<usize> {
        let value = value as f32;
        let guess = (value / self.pitch()).floor() as usize;
        [guess.saturating_sub(1), guess, guess.saturating_add(1)]
            .into_iter()
            .find(|&index| {
                let start = self.axis_start(index);
                value >= start && value < start + self.cell_size
            })
    }
}
