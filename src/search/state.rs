use crate::grid::CellCoord;
use anyhow::{anyhow, Result};
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

/// Cost reported for cells the search has not reached yet.
pub const UNREACHABLE_COST: f64 = f64::MAX;

/// Frontier element. The heap pops the lowest priority first.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrontierEntry {
    pub priority: f64,
    pub cell: CellCoord,
}

impl Eq for FrontierEntry {}

impl Ord for FrontierEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .priority
            .total_cmp(&self.priority)
            .then_with(|| other.cell.cmp(&self.cell))
    }
}

impl PartialOrd for FrontierEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Mutable state of a running search. Only reachable through
/// [`SharedSearch`], so every read and write happens under its lock.
#[derive(Debug, Clone, Default)]
pub struct SearchState {
    came_from: HashMap<CellCoord, Option<CellCoord>>,
    frontier: BinaryHeap<FrontierEntry>,
    path: Vec<CellCoord>,
    costs: HashMap<CellCoord, f64>,
    start: Option<CellCoord>,
    goal: Option<CellCoord>,
    revision: u64,
}

impl SearchState {
    /// Expanded cells mapped to the predecessor used to reach them.
    pub fn came_from(&self) -> &HashMap<CellCoord, Option<CellCoord>> {
        &self.came_from
    }

    /// Frontier entries in heap order (not sorted).
    pub fn frontier(&self) -> impl Iterator<Item = &FrontierEntry> + '_ {
        self.frontier.iter()
    }

    pub fn frontier_len(&self) -> usize {
        self.frontier.len()
    }

    pub fn path(&self) -> &[CellCoord] {
        &self.path
    }

    pub fn costs(&self) -> &HashMap<CellCoord, f64> {
        &self.costs
    }

    pub fn cost(&self, cell: CellCoord) -> f64 {
        self.costs.get(&cell).copied().unwrap_or(UNREACHABLE_COST)
    }

    pub fn start(&self) -> Option<CellCoord> {
        self.start
    }

    pub fn goal(&self) -> Option<CellCoord> {
        self.goal
    }

    /// Bumped on every [`SharedSearch::update`].
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn set_terminals(&mut self, start: Option<CellCoord>, goal: Option<CellCoord>) {
        self.start = start;
        self.goal = goal;
    }

    pub fn record_visit(&mut self, cell: CellCoord, from: Option<CellCoord>) {
        self.came_from.insert(cell, from);
    }

    pub fn push_frontier(&mut self, cell: CellCoord, priority: f64) {
        self.frontier.push(FrontierEntry { priority, cell });
    }

    pub fn pop_frontier(&mut self) -> Option<FrontierEntry> {
        self.frontier.pop()
    }

    pub fn set_cost(&mut self, cell: CellCoord, cost: f64) {
        self.costs.insert(cell, cost);
    }

    pub fn set_path(&mut self, path: Vec<CellCoord>) {
        self.path = path;
    }

    /// Drops all search data but keeps the revision counter monotone.
    pub fn clear(&mut self) {
        let revision = self.revision;
        *self = Self {
            revision,
            ..Self::default()
        };
    }
}

/// Handle to the search state shared between the search thread and the
/// renderer. Cloning shares the same lock.
#[derive(Debug, Clone, Default)]
pub struct SharedSearch {
    inner: Arc<Mutex<SearchState>>,
}

impl SharedSearch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lock(&self) -> Result<MutexGuard<'_, SearchState>> {
        self.inner
            .lock()
            .map_err(|_| anyhow!("search state lock poisoned"))
    }

    /// Runs `f` under the lock and bumps the revision.
    pub fn update<R>(&self, f: impl FnOnce(&mut SearchState) -> R) -> Result<R> {
        let mut state = self.lock()?;
        let out = f(&mut state);
        state.revision = state.revision.wrapping_add(1);
        Ok(out)
    }

    pub fn reset(&self) -> Result<()> {
        self.update(SearchState::clear)
    }
}
