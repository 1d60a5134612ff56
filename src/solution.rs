//! Individuals, per-generation records and run results.

use serde::{Deserialize, Serialize};

use crate::instance::{CostMatrix, RouteProblem};

/// A route together with its fitness record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Individual {
    /// Home, every other location once, home again
    pub route: Vec<usize>,
    /// Raw (unshared) score
    pub fitness: i64,
    pub took_shortcut: bool,
}

impl Individual {
    pub fn new(route: Vec<usize>, problem: &RouteProblem) -> Self {
        let eval = problem.evaluate(&route);
        Individual {
            route,
            fitness: eval.score,
            took_shortcut: eval.took_shortcut,
        }
    }
}

/// Snapshot of one completed generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRecord {
    pub generation: usize,
    pub best_route: Vec<usize>,
    pub best_fitness: i64,
    pub mean_fitness: f64,
    /// Mean pairwise Hamming distance between routes
    pub genotypic_diversity: f64,
    /// Standard deviation of raw fitness
    pub phenotypic_diversity: f64,
}

/// Outcome of a run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionResult {
    pub best_route: Vec<usize>,
    pub best_labels: Vec<String>,
    pub best_fitness: i64,
    pub took_shortcut: bool,
    /// Generations actually run
    pub generations: usize,
    /// Present when the run was configured to record history
    pub history: Option<Vec<GenerationRecord>>,
    pub matrix: CostMatrix,
    /// Computation time in seconds
    pub computation_time: f64,
}

impl EvolutionResult {
    /// Best fitness of every recorded generation, in order
    pub fn fitness_curve(&self) -> Vec<i64> {
        self.history
            .as_ref()
            .map(|h| h.iter().map(|r| r.best_fitness).collect())
            .unwrap_or_default()
    }
}

impl std::fmt::Display for EvolutionResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Best fitness: {}", self.best_fitness)?;
        writeln!(f, "  Route: {}", self.best_labels.join(" -> "))?;
        writeln!(f, "  Shortcut taken: {}", self.took_shortcut)?;
        writeln!(f, "  Generations: {}", self.generations)?;
        writeln!(f, "  Time: {:.4}s", self.computation_time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::LocationSet;

    fn problem() -> RouteProblem {
        let set = LocationSet::new(vec!["home", "A", "B"], "home").unwrap();
        let matrix = CostMatrix::new(set, vec![vec![0, 10, 1], vec![2, 0, 20], vec![5, 3, 0]]).unwrap();
        RouteProblem::unconstrained("three", matrix).unwrap()
    }

    #[test]
    fn test_individual_creation() {
        let ind = Individual::new(vec![0, 1, 2, 0], &problem());
        assert_eq!(ind.fitness, 35);
        assert!(!ind.took_shortcut);
    }

    #[test]
    fn test_fitness_curve_without_history() {
        let p = problem();
        let result = EvolutionResult {
            best_route: vec![0, 1, 2, 0],
            best_labels: p.labels_of(&[0, 1, 2, 0]),
            best_fitness: 35,
            took_shortcut: false,
            generations: 3,
            history: None,
            matrix: p.matrix.clone(),
            computation_time: 0.0,
        };
        assert!(result.fitness_curve().is_empty());
        assert!(result.to_string().contains("home -> A -> B -> home"));
    }
}
