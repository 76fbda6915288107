pub mod compositor;
pub mod frame;
pub mod geometry;
pub mod palette;
pub mod perf;
pub mod snapshot;
pub mod text;

pub use compositor::LayerCompositor;
pub use frame::FrameBuffer;
pub use geometry::{CanvasSize, Layout, LayoutError, PixelPoint, PixelRect};
pub use palette::{Color, Palette, RenderCategory};
pub use snapshot::SearchSnapshot;

use crate::grid::{CellCoord, Grid};
use crate::search::SharedSearch;
use crate::settings::VisualizerSettings;
use perf::{render_perf_runtime_enabled, RenderPerfSnapshot, RenderPerfStats, DEFAULT_WINDOW_SIZE};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use text::{cost_label, CostText};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VisualizerError {
    #[error(transparent)]
    Geometry(#[from] LayoutError),
    #[error("failed to read font file {}", .path.display())]
    FontRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to load font {font}: {reason}")]
    FontLoad { font: String, reason: String },
    #[error("visualizer rendered before a successful init")]
    NotInitialized,
}

/// What one `render` call drew.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameStats {
    pub revision: u64,
    pub visited: usize,
    pub frontier: usize,
    pub path: usize,
    /// Snapshot entries outside the grid that were not drawn.
    pub skipped_cells: u64,
    pub lock_hold: Duration,
    pub render_time: Duration,
    pub search_available: bool,
}

/// Draws a grid search into an RGBA frame.
///
/// The grid and the search state are borrowed per call and never owned.
/// `render` must be given the same grid topology that `init` saw, except for
/// walls and terminals, which are drawn live every frame.
#[derive(Debug)]
pub struct Visualizer {
    palette: Palette,
    gap_divisor: u32,
    show_costs: bool,
    canvas: CanvasSize,
    layout: Option<Layout>,
    compositor: LayerCompositor,
    frame: FrameBuffer,
    text: CostText,
    perf: RenderPerfStats,
    search_error_reported: bool,
}

impl Visualizer {
    /// Builds the palette and loads the label font. Call [`init`](Self::init)
    /// before the first frame.
    pub fn new(settings: &VisualizerSettings) -> Result<Self, VisualizerError> {
        let text = CostText::load(settings.font_path.as_deref())?;
        let perf = RenderPerfStats::new(
            render_perf_runtime_enabled(settings.perf_debug),
            DEFAULT_WINDOW_SIZE,
        );
        Ok(Self {
            palette: settings.palette,
            gap_divisor: settings.gap_divisor,
            show_costs: settings.show_costs,
            canvas: settings.canvas(),
            layout: None,
            compositor: LayerCompositor::new(),
            frame: FrameBuffer::default(),
            text,
            perf,
            search_error_reported: false,
        })
    }

    /// Computes the layout for `grid` and builds the static layer.
    pub fn init(&mut self, grid: &Grid) -> Result<(), VisualizerError> {
        let layout = Layout::compute(self.canvas, grid.size(), self.gap_divisor)?;
        self.apply_layout(grid, layout);
        Ok(())
    }

    /// Switches to `canvas`. On error the previous canvas and layout stay in
    /// effect.
    pub fn resize(&mut self, canvas: CanvasSize, grid: &Grid) -> Result<(), VisualizerError> {
        let layout = Layout::compute(canvas, grid.size(), self.gap_divisor)?;
        self.canvas = canvas;
        self.apply_layout(grid, layout);
        Ok(())
    }

    fn apply_layout(&mut self, grid: &Grid, layout: Layout) {
        self.frame.ensure_size(layout.canvas());
        self.compositor.rebuild(grid, &layout, &self.palette);
        self.text.set_size(layout.cell_size() / 2.0);
        self.layout = Some(layout);
        tracing::info!(
            grid_size = layout.grid_size(),
            cell_size = layout.cell_size(),
            gap = layout.gap(),
            "visualizer layout ready"
        );
    }

    pub fn render(
        &mut self,
        grid: &Grid,
        search: &SharedSearch,
    ) -> Result<FrameStats, VisualizerError> {
        let started = Instant::now();
        let mut layout = self.layout.ok_or(VisualizerError::NotInitialized)?;
        if layout.grid_size() != grid.size() {
            tracing::debug!(
                from = layout.grid_size(),
                to = grid.size(),
                "grid size changed, rebuilding layout"
            );
            layout = Layout::compute(self.canvas, grid.size(), self.gap_divisor)?;
            self.apply_layout(grid, layout);
        }

        self.compositor.blit_into(&mut self.frame);

        let mut stats = FrameStats::default();
        match SearchSnapshot::capture_with_costs(search, self.show_costs) {
            Ok(snapshot) => {
                self.search_error_reported = false;
                self.draw_search(grid, &layout, &snapshot, &mut stats);
            }
            Err(err) => {
                if !self.search_error_reported {
                    tracing::warn!(?err, "search state unavailable, drawing grid only");
                    self.search_error_reported = true;
                }
            }
        }
        self.draw_grid_overlays(grid, &layout);

        stats.render_time = started.elapsed();
        if self
            .perf
            .finish_frame(stats.render_time, stats.lock_hold, stats.skipped_cells)
        {
            let perf = self.perf.snapshot();
            tracing::debug!(
                avg_ms = perf.avg_ms,
                p95_ms = perf.p95_ms,
                worst_ms = perf.worst_ms,
                lock_hold_avg_ms = perf.lock_hold_avg_ms,
                lock_hold_worst_ms = perf.lock_hold_worst_ms,
                skipped_cells = perf.skipped_cells,
                "render perf window"
            );
        }
        Ok(stats)
    }

    fn draw_search(
        &mut self,
        grid: &Grid,
        layout: &Layout,
        snapshot: &SearchSnapshot,
        stats: &mut FrameStats,
    ) {
        stats.search_available = true;
        stats.revision = snapshot.revision;
        stats.lock_hold = snapshot.lock_hold;
        stats.visited = snapshot.visited.len();
        stats.frontier = snapshot.frontier.len();
        stats.path = snapshot.path.len();

        let layers = [
            (snapshot.visited.as_slice(), RenderCategory::Visited),
            (snapshot.frontier.as_slice(), RenderCategory::Frontier),
            (snapshot.path.as_slice(), RenderCategory::Path),
        ];
        for (cells, category) in layers {
            let color = self.palette.color(category);
            for cell in cells {
                if !paint_cell(&mut self.frame, grid, layout, *cell, color) {
                    stats.skipped_cells += 1;
                }
            }
        }

        let shadows = [
            (snapshot.start, RenderCategory::StartShadow),
            (snapshot.goal, RenderCategory::GoalShadow),
        ];
        for (cell, category) in shadows {
            let Some(cell) = cell else {
                continue;
            };
            if !paint_cell(&mut self.frame, grid, layout, cell, self.palette.color(category)) {
                stats.skipped_cells += 1;
            }
        }

        for (cell, cost) in &snapshot.costs {
            if !grid.contains(*cell) {
                stats.skipped_cells += 1;
                continue;
            }
            let center = layout.cell_to_pixel_rect(*cell).center();
            self.text
                .draw_centered(&mut self.frame, &cost_label(*cost), center, self.palette.text);
        }

        if stats.skipped_cells > 0 {
            tracing::trace!(
                skipped = stats.skipped_cells,
                "snapshot referenced cells outside the grid"
            );
        }
    }

    // Grid topology is stable while a search runs, so no lock is taken here.
    fn draw_grid_overlays(&mut self, grid: &Grid, layout: &Layout) {
        let wall = self.palette.color(RenderCategory::Wall);
        for cell in grid.walls() {
            paint_cell(&mut self.frame, grid, layout, cell, wall);
        }
        if let Some(start) = grid.start() {
            paint_cell(
                &mut self.frame,
                grid,
                layout,
                start,
                self.palette.color(RenderCategory::Start),
            );
        }
        if let Some(goal) = grid.goal() {
            paint_cell(
                &mut self.frame,
                grid,
                layout,
                goal,
                self.palette.color(RenderCategory::Goal),
            );
        }
    }

    /// Cell under a canvas pixel; `None` for gaps, outside points, or before
    /// `init`.
    pub fn cell_coord(&self, point: PixelPoint) -> Option<CellCoord> {
        self.layout.and_then(|layout| layout.pixel_to_cell(point))
    }

    /// Same as [`cell_coord`](Self::cell_coord) with `(-1, -1)` for no cell.
    pub fn cell_coord_or_sentinel(&self, point: PixelPoint) -> (i64, i64) {
        self.cell_coord(point)
            .map(|cell| (cell.col as i64, cell.row as i64))
            .unwrap_or(CellCoord::SENTINEL_XY)
    }

    pub fn frame(&self) -> &FrameBuffer {
        &self.frame
    }

    pub fn layout(&self) -> Option<&Layout> {
        self.layout.as_ref()
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn canvas(&self) -> CanvasSize {
        self.canvas
    }

    pub fn show_costs(&self) -> bool {
        self.show_costs
    }

    pub fn set_show_costs(&mut self, show: bool) {
        self.show_costs = show;
    }

    pub fn perf_snapshot(&self) -> RenderPerfSnapshot {
        self.perf.snapshot()
    }

    #[cfg(test)]
    fn static_rebuilds(&self) -> usize {
        self.compositor.rebuild_count()
    }
}

fn paint_cell(
    frame: &mut FrameBuffer,
    grid: &Grid,
    layout: &Layout,
    cell: CellCoord,
    color: Color,
) -> bool {
    if !grid.contains(cell) {
        return false;
    }
    frame.fill_span(layout.cell_to_pixel_rect(cell).to_span(), color);
    true
}

#[cfg(test)]
mod tests {
    use super::{Visualizer, VisualizerError};
    use crate::grid::{CellCoord, Grid};
    use crate::search::SharedSearch;
    use crate::settings::VisualizerSettings;
    use crate::visualizer::geometry::{CanvasSize, LayoutError, PixelPoint};
    use crate::visualizer::palette::Color;

    fn settings(width: u32) -> VisualizerSettings {
        VisualizerSettings {
            canvas_width: width,
            canvas_height: width,
            ..VisualizerSettings::default()
        }
    }

    fn visualizer(width: u32, grid: &Grid) -> Visualizer {
        let mut vis = Visualizer::new(&settings(width)).expect("visualizer");
        vis.init(grid).expect("init");
        vis
    }

    // Corner pixel of a cell, clear of the centered cost label.
    fn corner_color(vis: &Visualizer, cell: CellCoord) -> Color {
        let span = vis
            .layout()
            .expect("layout")
            .cell_to_pixel_rect(cell)
            .to_span();
        vis.frame()
            .pixel(span.x as u32 + 1, span.y as u32 + 1)
            .expect("pixel")
    }

    #[test]
    fn render_before_init_is_an_error() {
        let mut vis = Visualizer::new(&settings(100)).expect("visualizer");
        let err = vis.render(&Grid::new(5), &SharedSearch::new()).unwrap_err();
        assert!(matches!(err, VisualizerError::NotInitialized));
        assert_eq!(vis.cell_coord(PixelPoint::new(1, 1)), None);
    }

    #[test]
    fn init_rejects_degenerate_geometry() {
        let mut vis = Visualizer::new(&settings(100)).expect("visualizer");
        let err = vis.init(&Grid::new(1)).unwrap_err();
        assert!(matches!(
            err,
            VisualizerError::Geometry(LayoutError::GridTooSmall { size: 1 })
        ));

        let mut vis = Visualizer::new(&settings(0)).expect("visualizer");
        assert!(matches!(
            vis.init(&Grid::new(5)).unwrap_err(),
            VisualizerError::Geometry(LayoutError::ZeroCanvas { .. })
        ));
    }

    #[test]
    fn empty_search_renders_grid_overlays_only() {
        let mut grid = Grid::with_corners(5);
        grid.set_wall(CellCoord::new(2, 2), true);
        let mut vis = visualizer(200, &grid);
        let stats = vis.render(&grid, &SharedSearch::new()).expect("render");

        let palette = *vis.palette();
        assert!(stats.search_available);
        assert_eq!(stats.visited + stats.frontier + stats.path, 0);
        assert_eq!(corner_color(&vis, CellCoord::new(0, 0)), palette.start);
        assert_eq!(corner_color(&vis, CellCoord::new(4, 4)), palette.goal);
        assert_eq!(corner_color(&vis, CellCoord::new(2, 2)), palette.wall);
        assert_eq!(corner_color(&vis, CellCoord::new(1, 3)), palette.empty);
    }

    #[test]
    fn later_categories_cover_earlier_ones() {
        let grid = Grid::new(6);
        let mut vis = visualizer(300, &grid);
        let search = SharedSearch::new();
        let both = CellCoord::new(1, 1);
        let frontier_and_visited = CellCoord::new(2, 1);
        search
            .update(|state| {
                state.record_visit(both, None);
                state.record_visit(frontier_and_visited, Some(both));
                state.push_frontier(frontier_and_visited, 1.0);
                state.push_frontier(both, 1.0);
                state.set_path(vec![both]);
            })
            .expect("update");

        vis.render(&grid, &search).expect("render");
        let palette = *vis.palette();
        assert_eq!(corner_color(&vis, both), palette.path);
        assert_eq!(corner_color(&vis, frontier_and_visited), palette.frontier);
    }

    #[test]
    fn walls_and_terminals_dominate_search_overlays() {
        let mut grid = Grid::with_corners(5);
        let wall = CellCoord::new(3, 1);
        grid.set_wall(wall, true);
        let mut vis = visualizer(250, &grid);
        let search = SharedSearch::new();
        search
            .update(|state| {
                state.record_visit(wall, None);
                state.record_visit(CellCoord::new(0, 0), None);
                state.set_path(vec![CellCoord::new(0, 0), wall]);
            })
            .expect("update");

        vis.render(&grid, &search).expect("render");
        let palette = *vis.palette();
        assert_eq!(corner_color(&vis, wall), palette.wall);
        assert_eq!(corner_color(&vis, CellCoord::new(0, 0)), palette.start);
    }

    #[test]
    fn shadows_blend_over_search_layers() {
        let grid = Grid::new(5);
        let mut vis = visualizer(250, &grid);
        let search = SharedSearch::new();
        let start = CellCoord::new(1, 2);
        search
            .update(|state| state.set_terminals(Some(start), None))
            .expect("update");

        vis.render(&grid, &search).expect("render");
        let palette = *vis.palette();
        let shaded = corner_color(&vis, start);
        assert_ne!(shaded, palette.empty);
        assert_ne!(shaded, palette.start_shadow);
        assert_eq!(shaded.a, 255);
        assert!(shaded.g == 255 && shaded.r < 255);
    }

    #[test]
    fn out_of_range_snapshot_cells_are_skipped() {
        let grid = Grid::new(4);
        let mut vis = visualizer(200, &grid);
        let search = SharedSearch::new();
        search
            .update(|state| {
                state.record_visit(CellCoord::new(9, 0), None);
                state.push_frontier(CellCoord::new(0, 40), 0.0);
                state.set_cost(CellCoord::new(4, 4), 1.0);
                state.set_terminals(None, Some(CellCoord::new(100, 100)));
            })
            .expect("update");

        let stats = vis.render(&grid, &search).expect("render");
        assert_eq!(stats.skipped_cells, 4);
    }

    #[test]
    fn static_layer_is_built_once_across_frames() {
        let grid = Grid::with_corners(8);
        let mut vis = visualizer(400, &grid);
        let search = SharedSearch::new();
        for step in 0..20 {
            search
                .update(|state| state.record_visit(CellCoord::new(step % 8, step / 8), None))
                .expect("update");
            vis.render(&grid, &search).expect("render");
        }
        assert_eq!(vis.static_rebuilds(), 1);
    }

    #[test]
    fn grid_size_change_rebuilds_layout() {
        let grid = Grid::new(4);
        let mut vis = visualizer(200, &grid);
        vis.render(&Grid::new(8), &SharedSearch::new())
            .expect("render");
        assert_eq!(vis.layout().expect("layout").grid_size(), 8);
        assert_eq!(vis.static_rebuilds(), 2);
    }

    #[test]
    fn resize_recomputes_layout_and_frame() {
        let grid = Grid::new(5);
        let mut vis = visualizer(500, &grid);
        vis.resize(CanvasSize::new(250, 250), &grid).expect("resize");
        assert_eq!(vis.frame().size(), CanvasSize::new(250, 250));
        assert_eq!(vis.layout().expect("layout").gap(), 3);
    }

    #[test]
    fn perf_debug_records_every_frame() {
        let grid = Grid::new(4);
        let mut settings = settings(200);
        settings.perf_debug = true;
        let mut vis = Visualizer::new(&settings).expect("visualizer");
        vis.init(&grid).expect("init");
        let search = SharedSearch::new();
        search
            .update(|state| state.record_visit(CellCoord::new(7, 7), None))
            .expect("update");
        for _ in 0..3 {
            vis.render(&grid, &search).expect("render");
        }

        let perf = vis.perf_snapshot();
        assert!(perf.enabled);
        assert_eq!(perf.frame_samples, 3);
        assert_eq!(perf.skipped_cells, 3);
    }

    #[test]
    fn rejected_resize_keeps_previous_canvas() {
        let grid = Grid::new(5);
        let mut vis = visualizer(500, &grid);
        let err = vis
            .resize(CanvasSize::new(0, 0), &grid)
            .unwrap_err();
        assert!(matches!(
            err,
            VisualizerError::Geometry(LayoutError::ZeroCanvas { .. })
        ));
        assert_eq!(vis.canvas(), CanvasSize::new(500, 500));
        assert_eq!(vis.layout().expect("layout").gap(), 6);

        vis.render(&Grid::new(8), &SharedSearch::new())
            .expect("render after rejected resize");
        assert_eq!(vis.layout().expect("layout").grid_size(), 8);
        assert_eq!(vis.frame().size(), CanvasSize::new(500, 500));
    }

    #[test]
    fn cost_labels_change_cell_interior_but_not_corners() {
        let grid = Grid::new(4);
        let mut settings = settings(400);
        settings.palette.text = Color::BLACK;
        let mut vis = Visualizer::new(&settings).expect("visualizer");
        vis.init(&grid).expect("init");
        let search = SharedSearch::new();
        let cell = CellCoord::new(1, 1);
        search
            .update(|state| state.set_cost(cell, 7.9))
            .expect("update");

        vis.render(&grid, &search).expect("render");
        let palette = *vis.palette();
        assert_eq!(corner_color(&vis, cell), palette.empty);

        let span = vis
            .layout()
            .expect("layout")
            .cell_to_pixel_rect(cell)
            .to_span();
        let inked = (span.y..span.y + span.height)
            .flat_map(|y| (span.x..span.x + span.width).map(move |x| (x, y)))
            .filter(|(x, y)| vis.frame().pixel(*x as u32, *y as u32) != Some(palette.empty))
            .count();
        assert!(inked > 0);

        vis.set_show_costs(false);
        vis.render(&grid, &search).expect("render");
        let inked = (span.y..span.y + span.height)
            .flat_map(|y| (span.x..span.x + span.width).map(move |x| (x, y)))
            .filter(|(x, y)| vis.frame().pixel(*x as u32, *y as u32) != Some(palette.empty))
            .count();
        assert_eq!(inked, 0);
    }

    #[test]
    fn hit_testing_matches_reference_scenario() {
        let grid = Grid::new(5);
        let vis = visualizer(500, &grid);
        assert_eq!(
            vis.cell_coord(PixelPoint::new(203, 304)),
            Some(CellCoord::new(2, 3))
        );
        assert_eq!(vis.cell_coord_or_sentinel(PixelPoint::new(198, 100)), (-1, -1));
        assert_eq!(vis.cell_coord_or_sentinel(PixelPoint::new(203, 304)), (2, 3));
    }

    #[test]
    fn poisoned_search_lock_still_renders_grid() {
        let grid = Grid::with_corners(4);
        let mut vis = visualizer(200, &grid);
        let search = SharedSearch::new();
        let poisoner = search.clone();
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.lock().expect("lock");
            panic!("poison the search lock");
        })
        .join();

        let stats = vis.render(&grid, &search).expect("render");
        assert!(!stats.search_available);
        assert_eq!(corner_color(&vis, CellCoord::new(0, 0)), vis.palette().start);
    }
}
