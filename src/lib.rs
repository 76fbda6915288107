//! Live visualizer for grid path searches.
//!
//! A search thread writes into a [`search::SharedSearch`]; the
//! [`visualizer::Visualizer`] copies that state out under a short lock and
//! draws it over a cached grid layer.

pub mod grid;
pub mod logging;
pub mod search;
pub mod settings;
pub mod visualizer;
