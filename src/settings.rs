use crate::visualizer::geometry::{CanvasSize, DEFAULT_GAP_DIVISOR};
use crate::visualizer::palette::Palette;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const SETTINGS_FILE_NAME: &str = "search_viz.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualizerSettings {
    #[serde(default = "default_canvas_side")]
    pub canvas_width: u32,
    #[serde(default = "default_canvas_side")]
    pub canvas_height: u32,
    #[serde(default = "default_grid_size")]
    pub grid_size: usize,
    /// Larger values give thinner gaps between cells.
    #[serde(default = "default_gap_divisor")]
    pub gap_divisor: u32,
    #[serde(default = "default_show_costs")]
    pub show_costs: bool,
    /// TTF/OTF used for cost labels. Falls back to the built-in UI font.
    #[serde(default)]
    pub font_path: Option<PathBuf>,
    #[serde(default)]
    pub palette: Palette,
    /// Pause between search steps so progress is visible.
    #[serde(default = "default_step_delay_ms")]
    pub step_delay_ms: u64,
    #[serde(default)]
    pub debug_logging: bool,
    #[serde(default)]
    pub perf_debug: bool,
}

fn default_canvas_side() -> u32 {
    800
}

fn default_grid_size() -> usize {
    11
}

fn default_gap_divisor() -> u32 {
    DEFAULT_GAP_DIVISOR
}

fn default_show_costs() -> bool {
    true
}

fn default_step_delay_ms() -> u64 {
    40
}

impl Default for VisualizerSettings {
    fn default() -> Self {
        Self {
            canvas_width: default_canvas_side(),
            canvas_height: default_canvas_side(),
            grid_size: default_grid_size(),
            gap_divisor: default_gap_divisor(),
            show_costs: default_show_costs(),
            font_path: None,
            palette: Palette::default(),
            step_delay_ms: default_step_delay_ms(),
            debug_logging: false,
            perf_debug: false,
        }
    }
}

impl VisualizerSettings {
    pub fn canvas(&self) -> CanvasSize {
        CanvasSize::new(self.canvas_width, self.canvas_height)
    }

    pub fn step_delay(&self) -> Duration {
        Duration::from_millis(self.step_delay_ms)
    }

    /// Clamps values that cannot produce a usable layout. Returns whether
    /// anything changed.
    pub fn sanitize(&mut self) -> bool {
        let mut changed = false;
        if self.gap_divisor == 0 {
            self.gap_divisor = 1;
            changed = true;
        }
        if self.grid_size < 2 {
            self.grid_size = 2;
            changed = true;
        }
        changed
    }

    /// Missing or empty files yield defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("read settings file {}", path.display()))?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let mut settings: Self = serde_json::from_str(&content)
            .with_context(|| format!("deserialize settings file {}", path.display()))?;
        if settings.sanitize() {
            tracing::warn!(path = %path.display(), "settings adjusted to a usable layout");
        }
        Ok(settings)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create settings folder {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self).context("serialize settings")?;
        std::fs::write(path, json)
            .with_context(|| format!("write settings file {}", path.display()))
    }
}

pub fn settings_path_from_exe_path(exe_path: &Path) -> Result<PathBuf> {
    let parent = exe_path
        .parent()
        .ok_or_else(|| anyhow!("executable path has no parent: {}", exe_path.display()))?;
    Ok(parent.join(SETTINGS_FILE_NAME))
}

pub fn resolve_settings_path() -> Result<PathBuf> {
    let exe_path = std::env::current_exe().context("resolve current executable")?;
    settings_path_from_exe_path(&exe_path)
}
