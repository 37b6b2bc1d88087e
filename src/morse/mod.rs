//! Morse decompositions of box maps
//!
//! [`compute_morse_graph`] alternates three steps on a grid: image every cell
//! and cover the images to get a [`MapGraph`](crate::graph::MapGraph), keep
//! only the recurrent strongly connected components, and subdivide each of
//! those on its own. Every set ends up either frozen, becoming a vertex of
//! the resulting [`MorseGraph`], or spurious, when its refinement holds no
//! recurrence at all.

mod compute;
mod config;
mod graph;

pub use compute::{compute_morse_graph, compute_morse_graph_with_stats, RefinementStats};
pub use config::{MorseConfig, DEFAULT_FAILURE_LOG_INTERVAL};
pub use graph::{MorseGraph, Vertex};

use thiserror::Error;

use crate::grid::GridError;
use crate::map::MapError;

/// Errors raised by the refinement loop.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MorseError {
    /// Depths or limits are inconsistent.
    #[error("invalid configuration: {reason}")]
    InvalidConfiguration {
        /// What is wrong.
        reason: String,
    },

    /// The map reported that it cannot be evaluated.
    #[error("map is not usable for this computation")]
    MapUnavailable,

    /// A map evaluation failed fatally.
    #[error(transparent)]
    Map(#[from] MapError),

    /// A grid operation failed.
    #[error(transparent)]
    Grid(#[from] GridError),
}
