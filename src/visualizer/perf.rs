use std::collections::VecDeque;
use std::time::Duration;

pub const RENDER_PERF_DEBUG_ENV: &str = "SEARCH_VIZ_PERF_DEBUG";
pub const DEFAULT_WINDOW_SIZE: usize = 120;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RenderPerfSnapshot {
    pub enabled: bool,
    pub avg_ms: f64,
    pub worst_ms: f64,
    pub p95_ms: f64,
    pub lock_hold_avg_ms: f64,
    pub lock_hold_worst_ms: f64,
    pub skipped_cells: u64,
    pub frame_samples: usize,
}

/// Rolling render-time and lock-hold statistics.
#[derive(Debug, Clone)]
pub struct RenderPerfStats {
    enabled: bool,
    window_size: usize,
    frame_ms_window: VecDeque<f64>,
    lock_ms_window: VecDeque<f64>,
    skipped_cells_total: u64,
    frames_since_report: usize,
}

impl RenderPerfStats {
    pub fn new(enabled: bool, rolling_window: usize) -> Self {
        Self {
            enabled,
            window_size: rolling_window.max(1),
            frame_ms_window: VecDeque::with_capacity(rolling_window.max(1)),
            lock_ms_window: VecDeque::with_capacity(rolling_window.max(1)),
            skipped_cells_total: 0,
            frames_since_report: 0,
        }
    }

    /// Records one frame. Returns true once per full window so the caller
    /// can emit a summary.
    pub fn finish_frame(&mut self, render: Duration, lock_hold: Duration, skipped: u64) -> bool {
        if !self.enabled {
            return false;
        }
        Self::push_window(&mut self.frame_ms_window, ms(render), self.window_size);
        Self::push_window(&mut self.lock_ms_window, ms(lock_hold), self.window_size);
        self.skipped_cells_total = self.skipped_cells_total.saturating_add(skipped);
        self.frames_since_report += 1;
        if self.frames_since_report >= self.window_size {
            self.frames_since_report = 0;
            return true;
        }
        false
    }

    pub fn snapshot(&self) -> RenderPerfSnapshot {
        if !self.enabled {
            return RenderPerfSnapshot::default();
        }

        RenderPerfSnapshot {
            enabled: true,
            avg_ms: avg(&self.frame_ms_window),
            worst_ms: max(&self.frame_ms_window),
            p95_ms: p95(&self.frame_ms_window),
            lock_hold_avg_ms: avg(&self.lock_ms_window),
            lock_hold_worst_ms: max(&self.lock_ms_window),
            skipped_cells: self.skipped_cells_total,
            frame_samples: self.frame_ms_window.len(),
        }
    }

    fn push_window(window: &mut VecDeque<f64>, sample: f64, window_size: usize) {
        window.push_back(sample);
        while window.len() > window_size {
            let _ = window.pop_front();
        }
    }
}

pub fn render_perf_runtime_enabled(setting_enabled: bool) -> bool {
    if setting_enabled {
        return true;
    }
    match std::env::var(RENDER_PERF_DEBUG_ENV) {
        Ok(value) => matches!(
            value.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        ),
        Err(_) => false,
    }
}

fn ms(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}

fn avg(window: &VecDeque<f64>) -> f64 {
    if window.is_empty() {
        return 0.0;
    }
    window.iter().sum::<f64>() / window.len() as f64
}

fn max(window: &VecDeque<f64>) -> f64 {
    window.iter().copied().fold(0.0, f64::max)
}

fn p95(window: &VecDeque<f64>) -> f64 {
    if window.is_empty() {
        return 0.0;
    }
    let mut values: Vec<f64> = window.iter().copied().collect();
    values.sort_by(|a, b| a.total_cmp(b));
    let idx = ((values.len() as f64 * 0.95).ceil() as usize).saturating_sub(1);
    values[idx.min(values.len().saturating_sub(1))]
}

#[cfg(test)]
mod tests {
    use super::{RenderPerfStats, DEFAULT_WINDOW_SIZE, RENDER_PERF_DEBUG_ENV};
    use once_cell::sync::Lazy;
    use std::sync::Mutex;
    use std::time::Duration;

    static ENV_MUTEX: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

    #[test]
    fn rolling_window_avg_max_and_p95_respect_window_bounds() {
        let mut stats = RenderPerfStats::new(true, 3);
        for ms in [10, 20, 30, 40] {
            stats.finish_frame(Duration::from_millis(ms), Duration::from_millis(1), 0);
        }
        let snap = stats.snapshot();
        assert_eq!(snap.frame_samples, 3);
        assert!((snap.avg_ms - 30.0).abs() < 0.001);
        assert!((snap.worst_ms - 40.0).abs() < 0.001);
        assert!((snap.p95_ms - 40.0).abs() < 0.001);
        assert!((snap.lock_hold_avg_ms - 1.0).abs() < 0.001);
    }

    #[test]
    fn summary_is_requested_once_per_window() {
        let mut stats = RenderPerfStats::new(true, 2);
        let reports: Vec<bool> = (0..4)
            .map(|_| stats.finish_frame(Duration::ZERO, Duration::ZERO, 1))
            .collect();
        assert_eq!(reports, vec![false, true, false, true]);
        assert_eq!(stats.snapshot().skipped_cells, 4);
    }

    #[test]
    fn disabled_mode_does_not_mutate_counters() {
        let mut stats = RenderPerfStats::new(false, DEFAULT_WINDOW_SIZE);
        assert!(!stats.finish_frame(Duration::from_millis(5), Duration::ZERO, 3));
        assert_eq!(stats.snapshot().frame_samples, 0);
        assert_eq!(stats.snapshot().skipped_cells, 0);
    }

    #[test]
    fn runtime_gate_accepts_env_override() {
        let _guard = ENV_MUTEX.lock().expect("env mutex");
        std::env::set_var(RENDER_PERF_DEBUG_ENV, "1");
        assert!(super::render_perf_runtime_enabled(false));
        std::env::remove_var(RENDER_PERF_DEBUG_ENV);
        assert!(!super::render_perf_runtime_enabled(false));
        assert!(super::render_perf_runtime_enabled(true));
    }
}
