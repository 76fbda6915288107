use crate::grid::{CellCoord, Grid};
use crate::search::state::{SearchState, SharedSearch, UNREACHABLE_COST};
use anyhow::{anyhow, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

const STEP_COST: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Expanded(CellCoord),
    Found,
    Exhausted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome {
    Found { path_len: usize },
    NoPath,
    Cancelled,
}

/// Incremental A* over a [`Grid`]. Every step publishes its effects into the
/// shared state under the search lock.
pub struct AStar {
    grid: Arc<Grid>,
    start: CellCoord,
    goal: CellCoord,
}

impl AStar {
    pub fn new(grid: Arc<Grid>) -> Result<Self> {
        let start = grid.start().ok_or_else(|| anyhow!("grid has no start cell"))?;
        let goal = grid.goal().ok_or_else(|| anyhow!("grid has no goal cell"))?;
        Ok(Self { grid, start, goal })
    }

    fn heuristic(&self, cell: CellCoord) -> f64 {
        cell.manhattan(self.goal) as f64
    }

    /// Clears the shared state and seeds it with the start cell.
    pub fn seed(&self, search: &SharedSearch) -> Result<()> {
        search.update(|state| {
            state.clear();
            state.set_terminals(Some(self.start), Some(self.goal));
            for cell in self.grid.cells().filter(|cell| !self.grid.is_wall(*cell)) {
                state.set_cost(cell, UNREACHABLE_COST);
            }
            state.set_cost(self.start, 0.0);
            state.record_visit(self.start, None);
            state.push_frontier(self.start, self.heuristic(self.start));
        })
    }

    pub fn step(&self, search: &SharedSearch) -> Result<StepOutcome> {
        search.update(|state| self.step_locked(state))
    }

    fn step_locked(&self, state: &mut SearchState) -> StepOutcome {
        while let Some(entry) = state.pop_frontier() {
            let current = entry.cell;
            let current_cost = state.cost(current);
            if entry.priority > current_cost + self.heuristic(current) {
                continue;
            }
            if current == self.goal {
                let path = reconstruct_path(state, current);
                state.set_path(path);
                return StepOutcome::Found;
            }
            for next in self.grid.neighbors(current) {
                let next_cost = current_cost + STEP_COST;
                if next_cost < state.cost(next) {
                    state.set_cost(next, next_cost);
                    state.record_visit(next, Some(current));
                    state.push_frontier(next, next_cost + self.heuristic(next));
                }
            }
            return StepOutcome::Expanded(current);
        }
        StepOutcome::Exhausted
    }

    /// Runs to completion on the calling thread.
    pub fn run(&self, search: &SharedSearch) -> Result<SearchOutcome> {
        self.seed(search)?;
        loop {
            match self.step(search)? {
                StepOutcome::Expanded(_) => {}
                StepOutcome::Found => return found_outcome(search),
                StepOutcome::Exhausted => return Ok(SearchOutcome::NoPath),
            }
        }
    }
}

fn reconstruct_path(state: &SearchState, goal: CellCoord) -> Vec<CellCoord> {
    let mut path = vec![goal];
    let mut cursor = goal;
    while let Some(Some(prev)) = state.came_from().get(&cursor) {
        path.push(*prev);
        cursor = *prev;
    }
    path.reverse();
    path
}

fn found_outcome(search: &SharedSearch) -> Result<SearchOutcome> {
    let path_len = search.lock()?.path().len();
    Ok(SearchOutcome::Found { path_len })
}

/// Background thread driving an [`AStar`] with a delay between steps.
pub struct SearchRunner {
    handle: Option<JoinHandle<Result<SearchOutcome>>>,
    stop: Arc<AtomicBool>,
    finished: Arc<AtomicBool>,
}

impl SearchRunner {
    pub fn spawn(grid: Arc<Grid>, search: SharedSearch, step_delay: Duration) -> Result<Self> {
        let astar = AStar::new(grid)?;
        astar.seed(&search)?;

        let stop = Arc::new(AtomicBool::new(false));
        let finished = Arc::new(AtomicBool::new(false));
        let thread_stop = Arc::clone(&stop);
        let thread_finished = Arc::clone(&finished);

        let handle = std::thread::Builder::new()
            .name("search-worker".into())
            .spawn(move || {
                let outcome = drive(&astar, &search, &thread_stop, step_delay);
                thread_finished.store(true, Ordering::Release);
                match &outcome {
                    Ok(outcome) => tracing::info!(?outcome, "search finished"),
                    Err(err) => tracing::error!(?err, "search worker failed"),
                }
                outcome
            })
            .map_err(|err| anyhow!("failed to spawn search thread: {err}"))?;

        Ok(Self {
            handle: Some(handle),
            stop,
            finished,
        })
    }

    pub fn stop(&self) {
        self.stop.store(true, Ordering::Release);
    }

    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Acquire)
    }

    pub fn join(mut self) -> Result<SearchOutcome> {
        self.join_inner()
    }

    fn join_inner(&mut self) -> Result<SearchOutcome> {
        let Some(handle) = self.handle.take() else {
            return Ok(SearchOutcome::Cancelled);
        };
        handle
            .join()
            .map_err(|_| anyhow!("search thread panicked"))?
    }
}

impl Drop for SearchRunner {
    fn drop(&mut self) {
        self.stop();
        let _ = self.join_inner();
    }
}

fn drive(
    astar: &AStar,
    search: &SharedSearch,
    stop: &AtomicBool,
    step_delay: Duration,
) -> Result<SearchOutcome> {
    loop {
        if stop.load(Ordering::Acquire) {
            return Ok(SearchOutcome::Cancelled);
        }
        match astar.step(search)? {
            StepOutcome::Expanded(_) => {}
            StepOutcome::Found => return found_outcome(search),
            StepOutcome::Exhausted => return Ok(SearchOutcome::NoPath),
        }
        if !step_delay.is_zero() {
            std::thread::sleep(step_delay);
        }
    }
}
