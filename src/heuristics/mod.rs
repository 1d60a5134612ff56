//! Evolutionary machinery for route optimization.
//!
//! This module exports the genetic operators, the 2-opt refiner, the
//! diversity measures and the evolution loop that ties them together.

pub mod population;
pub mod selection;
pub mod crossover;
pub mod mutation;
pub mod local_search;
pub mod diversity;
pub mod genetic;

pub use crossover::Crossover;
pub use genetic::*;
pub use local_search::*;
pub use mutation::Mutation;
pub use selection::{Selection, TournamentSize};
