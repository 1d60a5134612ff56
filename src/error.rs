//! Error types for run setup and data loading.
//!
//! Only structural problems are errors: a misconfigured run or a malformed
//! matrix fails before the first generation. Constraint violations inside the
//! loop are scored, not raised.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("population size must be at least 1, got {0}")]
    InvalidPopulationSize(usize),

    #[error("no {0} strategy configured")]
    MissingStrategy(&'static str),

    #[error("{name} must be within [0, 1], got {value}")]
    InvalidRate { name: &'static str, value: f64 },

    #[error("elitism size {elitism_size} must be smaller than the population size {population_size}")]
    InvalidElitism {
        elitism_size: usize,
        population_size: usize,
    },

    #[error("tournament size {min}..={max} is invalid for a population of {population_size}")]
    InvalidTournamentSize {
        min: usize,
        max: usize,
        population_size: usize,
    },

    #[error("fitness sharing sigma must be positive and finite, got {0}")]
    InvalidSharingSigma(f64),

    #[error("a route needs a home and at least two other locations, got {0} locations")]
    TooFewLocations(usize),

    #[error("malformed cost matrix: {0}")]
    MatrixShape(String),

    #[error("unknown location '{0}'")]
    UnknownLocation(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
