pub mod astar;
pub mod state;

pub use astar::{AStar, SearchOutcome, SearchRunner, StepOutcome};
pub use state::{FrontierEntry, SearchState, SharedSearch, UNREACHABLE_COST};
