use crate::grid::CellCoord;
use crate::search::SharedSearch;
use anyhow::Result;
use std::time::{Duration, Instant};

/// Owned copy of the search state at one instant.
///
/// Everything the renderer needs, including the cost map, is copied while
/// the lock is held, so no drawing ever touches search-owned data.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchSnapshot {
    pub revision: u64,
    pub visited: Vec<CellCoord>,
    pub frontier: Vec<CellCoord>,
    pub path: Vec<CellCoord>,
    pub costs: Vec<(CellCoord, f64)>,
    pub start: Option<CellCoord>,
    pub goal: Option<CellCoord>,
    pub lock_hold: Duration,
}

impl SearchSnapshot {
    /// Takes the search lock once, copies out, and releases it before
    /// returning.
    pub fn capture(search: &SharedSearch) -> Result<Self> {
        Self::capture_with_costs(search, true)
    }

    /// Like [`capture`](Self::capture) but skips the cost map when labels
    /// are not drawn.
    pub fn capture_with_costs(search: &SharedSearch, with_costs: bool) -> Result<Self> {
        let state = search.lock()?;
        let locked_at = Instant::now();

        let visited = state.came_from().keys().copied().collect();
        let mut frontier = Vec::with_capacity(state.frontier_len());
        frontier.extend(state.frontier().map(|entry| entry.cell));
        let path = state.path().to_vec();
        let costs = if with_costs {
            state
                .costs()
                .iter()
                .map(|(cell, cost)| (*cell, *cost))
                .collect()
        } else {
            Vec::new()
        };
        let revision = state.revision();
        let start = state.start();
        let goal = state.goal();
        drop(state);

        Ok(Self {
            revision,
            visited,
            frontier,
            path,
            costs,
            start,
            goal,
            lock_hold: locked_at.elapsed(),
        })
    }
}
