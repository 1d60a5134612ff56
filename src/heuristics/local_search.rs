//! Local search refinement for routes.
//!
//! This module implements 2-opt segment reversal over the route interior,
//! scored with the full fitness function so shortcut and penalty rules are
//! respected. A move is only accepted when it strictly improves fitness,
//! so refinement never makes a route worse.

use crate::instance::RouteProblem;

/// Trait for route improvement methods
pub trait LocalSearch {
    /// Return an improved copy of `route` (or an equal copy when nothing improves)
    fn refine(&self, problem: &RouteProblem, route: &[usize]) -> Vec<usize>;
    fn name(&self) -> &str;
}

/// 2-Opt Local Search
///
/// Reverses interior segments of at least three locations. First
/// improvement restarts the scan after every accepted move; best improvement
/// applies the best move of a full scan.
#[derive(Debug, Clone)]
pub struct TwoOptSearch {
    /// Use first improvement instead of best improvement
    pub first_improvement: bool,
    /// Maximum number of accepted moves
    pub max_iterations: usize,
}

impl TwoOptSearch {
    pub fn new() -> Self {
        TwoOptSearch {
            first_improvement: true,
            max_iterations: 25,
        }
    }

    pub fn best_improvement() -> Self {
        TwoOptSearch {
            first_improvement: false,
            ..Self::new()
        }
    }

    pub fn with_max_iterations(max_iterations: usize) -> Self {
        TwoOptSearch {
            max_iterations,
            ..Self::new()
        }
    }

    /// One scan over all moves; returns the accepted route and its score.
    fn scan(&self, problem: &RouteProblem, route: &[usize], current: i64) -> Option<(Vec<usize>, i64)> {
        let n = route.len();
        let mut best: Option<(Vec<usize>, i64)> = None;

        for i in 1..n - 2 {
            for j in i + 2..n - 1 {
                let mut candidate = route.to_vec();
                candidate[i..=j].reverse();
                let score = problem.evaluate(&candidate).score;

                let threshold = best.as_ref().map_or(current, |(_, s)| *s);
                if score > threshold {
                    if self.first_improvement {
                        return Some((candidate, score));
                    }
                    best = Some((candidate, score));
                }
            }
        }

        best
    }
}

impl Default for TwoOptSearch {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalSearch for TwoOptSearch {
    fn refine(&self, problem: &RouteProblem, route: &[usize]) -> Vec<usize> {
        let mut best_route = route.to_vec();
        if route.len() < 5 {
            return best_route;
        }

        let mut best_score = problem.evaluate(route).score;
        let mut iterations = 0;

        while iterations < self.max_iterations {
            match self.scan(problem, &best_route, best_score) {
                Some((candidate, score)) => {
                    best_route = candidate;
                    best_score = score;
                    iterations += 1;
                }
                None => break,
            }
        }

        best_route
    }

    fn name(&self) -> &str {
        if self.first_improvement {
            "2-Opt-FI"
        } else {
            "2-Opt-BI"
        }
    }
}
