use anyhow::anyhow;
use eframe::egui;
use rand::Rng;
use search_viz::grid::Grid;
use search_viz::logging;
use search_viz::search::{SearchRunner, SharedSearch};
use search_viz::settings::{resolve_settings_path, VisualizerSettings};
use search_viz::visualizer::{FrameStats, PixelPoint, Visualizer};
use std::sync::Arc;

const WALL_DENSITY: f64 = 0.25;
const STATUS_BAR_HEIGHT: f32 = 28.0;

struct VisualizerApp {
    settings: VisualizerSettings,
    grid: Grid,
    search: SharedSearch,
    runner: Option<SearchRunner>,
    visualizer: Visualizer,
    texture: Option<egui::TextureHandle>,
    last_stats: FrameStats,
}

impl VisualizerApp {
    fn new(settings: VisualizerSettings) -> anyhow::Result<Self> {
        let grid = Grid::with_corners(settings.grid_size);
        let mut visualizer = Visualizer::new(&settings)?;
        visualizer.init(&grid)?;
        Ok(Self {
            settings,
            grid,
            search: SharedSearch::new(),
            runner: None,
            visualizer,
            texture: None,
            last_stats: FrameStats::default(),
        })
    }

    fn is_running(&self) -> bool {
        self.runner
            .as_ref()
            .is_some_and(|runner| !runner.is_finished())
    }

    fn reset_search(&mut self) {
        if let Some(runner) = self.runner.take() {
            runner.stop();
            if let Err(err) = runner.join() {
                tracing::warn!(?err, "search worker ended with an error");
            }
        }
        if let Err(err) = self.search.reset() {
            tracing::error!(?err, "failed to reset search state");
        }
    }

    fn start_search(&mut self) {
        if self.is_running() {
            return;
        }
        self.reset_search();
        match SearchRunner::spawn(
            Arc::new(self.grid.clone()),
            self.search.clone(),
            self.settings.step_delay(),
        ) {
            Ok(runner) => self.runner = Some(runner),
            Err(err) => tracing::warn!(?err, "search not started"),
        }
    }

    fn handle_click(&mut self, point: PixelPoint, modifiers: egui::Modifiers) {
        if self.is_running() {
            tracing::debug!("grid edit ignored while a search runs");
            return;
        }
        let Some(cell) = self.visualizer.cell_coord(point) else {
            return;
        };
        let changed = if modifiers.shift {
            self.grid.set_start(cell)
        } else if modifiers.ctrl || modifiers.command {
            self.grid.set_goal(cell)
        } else {
            self.grid.toggle_wall(cell)
        };
        if changed {
            self.reset_search();
        }
    }

    fn scatter_walls(&mut self) {
        let mut rng = rand::thread_rng();
        let cells: Vec<_> = self.grid.cells().collect();
        for cell in cells {
            if rng.gen_bool(WALL_DENSITY) {
                self.grid.set_wall(cell, true);
            }
        }
    }

    fn handle_keys(&mut self, ctx: &egui::Context) {
        let (space, reset, clear, scatter, labels) = ctx.input(|i| {
            (
                i.key_pressed(egui::Key::Space),
                i.key_pressed(egui::Key::R),
                i.key_pressed(egui::Key::C),
                i.key_pressed(egui::Key::W),
                i.key_pressed(egui::Key::L),
            )
        });
        if labels {
            let show = !self.visualizer.show_costs();
            self.visualizer.set_show_costs(show);
        }
        if space {
            self.start_search();
        }
        if reset {
            self.reset_search();
        }
        if (clear || scatter) && !self.is_running() {
            self.reset_search();
            if clear {
                self.grid.clear_walls();
            }
            if scatter {
                self.scatter_walls();
            }
        }
    }

    fn upload_frame(&mut self, ctx: &egui::Context) {
        let frame = self.visualizer.frame();
        let size = frame.size();
        let image = egui::ColorImage::from_rgba_unmultiplied(
            [size.width as usize, size.height as usize],
            frame.as_rgba(),
        );
        match &mut self.texture {
            Some(texture) => texture.set(image, egui::TextureOptions::NEAREST),
            None => {
                self.texture =
                    Some(ctx.load_texture("search-grid", image, egui::TextureOptions::NEAREST));
            }
        }
    }
}

impl eframe::App for VisualizerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_keys(ctx);

        match self.visualizer.render(&self.grid, &self.search) {
            Ok(stats) => self.last_stats = stats,
            Err(err) => tracing::error!(?err, "render failed"),
        }
        self.upload_frame(ctx);

        let running = self.is_running();
        let perf = self.visualizer.perf_snapshot();
        egui::TopBottomPanel::bottom("status")
            .exact_height(STATUS_BAR_HEIGHT)
            .show(ctx, |ui| {
                let stats = self.last_stats;
                let mut status = format!(
                    "{} | visited {} | frontier {} | path {} | Space: search  R: reset  C: clear  W: walls  L: labels",
                    if running { "searching" } else { "idle" },
                    stats.visited,
                    stats.frontier,
                    stats.path,
                );
                if perf.enabled {
                    status.push_str(&format!(
                        " | render p95 {:.2} ms, lock {:.3} ms",
                        perf.p95_ms, perf.lock_hold_worst_ms
                    ));
                }
                ui.label(status);
            });

        let canvas = self.visualizer.canvas();
        let mut click = None;
        egui::CentralPanel::default()
            .frame(egui::Frame::none())
            .show(ctx, |ui| {
                let Some(texture) = &self.texture else {
                    return;
                };
                let (response, painter) = ui.allocate_painter(
                    egui::vec2(canvas.width as f32, canvas.height as f32),
                    egui::Sense::click(),
                );
                painter.image(
                    texture.id(),
                    response.rect,
                    egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                    egui::Color32::WHITE,
                );
                if response.clicked() {
                    if let Some(pos) = response.interact_pointer_pos() {
                        let local = pos - response.rect.min;
                        let scale_x = canvas.width as f32 / response.rect.width().max(1.0);
                        let scale_y = canvas.height as f32 / response.rect.height().max(1.0);
                        click = Some(PixelPoint::new(
                            (local.x * scale_x).floor() as i32,
                            (local.y * scale_y).floor() as i32,
                        ));
                    }
                }
            });

        if let Some(point) = click {
            let modifiers = ctx.input(|i| i.modifiers);
            self.handle_click(point, modifiers);
        }

        if running {
            ctx.request_repaint();
        }
    }
}

fn main() -> anyhow::Result<()> {
    let settings_path = resolve_settings_path()?;
    let settings = VisualizerSettings::load(&settings_path)?;
    logging::init(settings.debug_logging);
    tracing::info!(path = %settings_path.display(), "settings loaded");

    let canvas = settings.canvas();
    let app = VisualizerApp::new(settings)?;
    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([canvas.width as f32, canvas.height as f32 + STATUS_BAR_HEIGHT])
            .with_resizable(false),
        ..Default::default()
    };

    eframe::run_native(
        "Search Visualizer",
        native_options,
        Box::new(move |_cc| Box::new(app)),
    )
    .map_err(|err| anyhow!("failed to run visualizer window: {err}"))
}
