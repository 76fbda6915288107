use search_viz::grid::{CellCoord, Grid};
use search_viz::search::SharedSearch;
use search_viz::settings::VisualizerSettings;
use search_viz::visualizer::geometry::DEFAULT_GAP_DIVISOR;
use search_viz::visualizer::{CanvasSize, Layout, LayoutError, PixelPoint, Visualizer};

const WIDTHS: [u32; 5] = [100, 333, 500, 800, 1024];

fn square(width: u32, size: usize) -> Layout {
    Layout::compute(CanvasSize::new(width, width), size, DEFAULT_GAP_DIVISOR).expect("layout")
}

#[test]
fn cells_and_gaps_fill_the_canvas_width() {
    for width in WIDTHS {
        for size in 2..=64 {
            let layout = square(width, size);
            let covered =
                size as f32 * layout.cell_size() + (size - 1) as f32 * layout.gap() as f32;
            assert!(
                (covered - width as f32).abs() < 0.01,
                "width {width} size {size}: covered {covered}"
            );
        }
    }
}

#[test]
fn every_cell_center_maps_back_to_its_cell() {
    for width in WIDTHS {
        for size in [2, 3, 5, 11, 25, 64] {
            let layout = square(width, size);
            for row in 0..size {
                for col in 0..size {
                    let cell = CellCoord::new(col, row);
                    let center = layout.cell_to_pixel_rect(cell).center_point();
                    assert_eq!(
                        layout.pixel_to_cell(center),
                        Some(cell),
                        "width {width} size {size} center {center:?}"
                    );
                }
            }
        }
    }
}

#[test]
fn gap_bands_hit_no_cell() {
    for width in WIDTHS {
        for size in [2, 4, 5, 8] {
            let layout = square(width, size);
            if layout.gap() < 2 {
                continue;
            }
            let pitch = layout.cell_size() + layout.gap() as f32;
            for col in 0..size - 1 {
                let gap_start = pitch * col as f32 + layout.cell_size();
                let x = gap_start.ceil();
                if x >= pitch * (col + 1) as f32 {
                    continue;
                }
                let point = PixelPoint::new(x as i32, layout.cell_size() as i32 / 2);
                assert_eq!(layout.pixel_to_cell(point), None, "width {width} size {size}");
                let point = PixelPoint::new(layout.cell_size() as i32 / 2, x as i32);
                assert_eq!(layout.pixel_to_cell(point), None, "width {width} size {size}");
            }
        }
    }
}

#[test]
fn points_outside_the_canvas_hit_no_cell() {
    let layout = square(500, 5);
    for point in [
        PixelPoint::new(-1, 10),
        PixelPoint::new(10, -1),
        PixelPoint::new(500, 10),
        PixelPoint::new(10, 500),
        PixelPoint::new(i32::MAX, i32::MAX),
    ] {
        assert_eq!(layout.pixel_to_cell(point), None, "{point:?}");
    }
}

#[test]
fn reference_five_by_five_scenario() {
    let layout = square(500, 5);
    assert_eq!(layout.gap(), 6);
    assert!((layout.cell_size() - 95.2).abs() < 1e-4);
    assert_eq!(
        layout.pixel_to_cell(PixelPoint::new(203, 304)),
        Some(CellCoord::new(2, 3))
    );
    assert_eq!(layout.pixel_to_cell(PixelPoint::new(198, 100)), None);
}

#[test]
fn wide_canvas_clips_rows_beyond_its_height() {
    let layout =
        Layout::compute(CanvasSize::new(500, 300), 5, DEFAULT_GAP_DIVISOR).expect("layout");
    assert_eq!(
        layout.pixel_to_cell(PixelPoint::new(10, 10)),
        Some(CellCoord::new(0, 0))
    );
    assert_eq!(layout.pixel_to_cell(PixelPoint::new(10, 310)), None);
}

#[test]
fn degenerate_layouts_are_rejected() {
    assert_eq!(
        Layout::compute(CanvasSize::new(0, 100), 5, DEFAULT_GAP_DIVISOR),
        Err(LayoutError::ZeroCanvas {
            width: 0,
            height: 100
        })
    );
    assert_eq!(
        Layout::compute(CanvasSize::new(100, 100), 1, DEFAULT_GAP_DIVISOR),
        Err(LayoutError::GridTooSmall { size: 1 })
    );
    assert_eq!(
        Layout::compute(CanvasSize::new(10, 10), 64, DEFAULT_GAP_DIVISOR),
        Err(LayoutError::CellsTooSmall {
            size: 64,
            width: 10
        })
    );
}

#[test]
fn painted_cell_pixels_are_exactly_the_clickable_ones() {
    for (width, height, size) in [(500, 500, 5), (333, 333, 7), (800, 800, 11), (500, 300, 5)] {
        let settings = VisualizerSettings {
            canvas_width: width,
            canvas_height: height,
            grid_size: size,
            show_costs: false,
            ..VisualizerSettings::default()
        };
        let grid = Grid::new(size);
        let mut vis = Visualizer::new(&settings).expect("visualizer");
        vis.init(&grid).expect("init");
        vis.render(&grid, &SharedSearch::new()).expect("render");

        let empty = vis.palette().empty;
        let mut mismatches = Vec::new();
        for y in 0..height {
            for x in 0..width {
                let painted = vis.frame().pixel(x, y) == Some(empty);
                let hit = vis
                    .cell_coord(PixelPoint::new(x as i32, y as i32))
                    .is_some();
                if painted != hit {
                    mismatches.push((x, y));
                }
            }
        }
        assert!(
            mismatches.is_empty(),
            "{width}x{height} size {size}: {} mismatches, first {:?}",
            mismatches.len(),
            mismatches.first()
        );
    }
}
