//! Geo-Route GA Library
//!
//! A memetic genetic algorithm for the Hallownest route problem: pick the
//! order in which to visit every area of the map, leaving from and returning
//! to a fixed home, so that the summed scores of the traversed edges of an
//! asymmetric integer matrix are as high as possible.
//!
//! # Features
//!
//! - Labeled, asymmetric score matrices (random generation or CSV)
//! - Route rules: special-location placement, a forbidden ordering, a shortcut bonus
//! - Selection: roulette wheel, rank based, tournament
//! - Crossover: PMX, OX, FOMX, CX
//! - Mutation: swap, inversion, scramble, displacement
//! - 2-opt refinement of every child, elitism and fitness sharing
//! - Parameter sweeps with CSV export and SVG visualization
//!
//! # Example
//!
//! ```no_run
//! use geo_route_ga::heuristics::{Crossover, GAConfig, Mutation, Selection, TournamentSize};
//! use geo_route_ga::instance::MatrixGenerator;
//!
//! let config = GAConfig {
//!     seed: Some(42),
//!     ..GAConfig::with_strategies(
//!         Selection::Tournament(TournamentSize::default()),
//!         Crossover::Pmx,
//!         Mutation::Inversion,
//!     )
//! };
//!
//! let result = geo_route_ga::evolve(&config, None, &MatrixGenerator::default()).unwrap();
//! println!("{}", result);
//! ```

pub mod error;
pub mod instance;
pub mod constraints;
pub mod fitness;
pub mod solution;
pub mod heuristics;
pub mod benchmark;
pub mod visualization;

pub use error::{Error, Result};
pub use heuristics::{evolve, GAConfig, GeneticAlgorithm};
pub use instance::{CostMatrix, LocationSet, MatrixGenerator, RouteProblem};
pub use solution::{EvolutionResult, GenerationRecord, Individual};
