//! Route scoring.
//!
//! The score of a route is the sum of matrix entries along consecutive
//! pairs. One pair of locations may be taken as a shortcut that bypasses a
//! toll location: the evaluator keeps a second running total where the edge
//! into the shortcut target is taken from the location *before* the shortcut
//! source, and reports whichever total is higher.

use serde::{Deserialize, Serialize};

use crate::constraints::ConstraintReport;
use crate::instance::RouteProblem;

/// `from` immediately followed by `to` may be scored as a bypass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortcutRule {
    pub from: usize,
    pub to: usize,
}

impl ShortcutRule {
    pub fn new(from: usize, to: usize) -> Self {
        ShortcutRule { from, to }
    }
}

/// Score of a route and whether the shortcut total won
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evaluation {
    pub score: i64,
    pub took_shortcut: bool,
}

/// Score `route` under `problem`.
///
/// Routes that break any rule receive [`ConstraintReport::penalty`]
/// regardless of the matrix.
pub fn evaluate(problem: &RouteProblem, route: &[usize]) -> Evaluation {
    if !problem.rules.check(route).all() {
        return Evaluation {
            score: ConstraintReport::penalty(),
            took_shortcut: false,
        };
    }

    let matrix = &problem.matrix;
    let mut total = 0i64;
    let mut total_with_shortcut = 0i64;
    let mut shortcut_seen = false;
    let mut skip_next = false;

    for i in 0..route.len().saturating_sub(1) {
        if skip_next {
            skip_next = false;
            continue;
        }

        let (from, to) = (route[i], route[i + 1]);
        let edge = matrix.get(from, to);

        match problem.shortcut {
            Some(rule) if from == rule.from && to == rule.to => {
                skip_next = true;
                shortcut_seen = true;
                if i > 0 {
                    total_with_shortcut += matrix.get(route[i - 1], to);
                }
            }
            _ => total_with_shortcut += edge,
        }

        total += edge;
    }

    Evaluation {
        score: total.max(total_with_shortcut),
        took_shortcut: shortcut_seen && total_with_shortcut > total,
    }
}

/// Score every route of a population
pub fn evaluate_all(problem: &RouteProblem, routes: &[Vec<usize>]) -> Vec<Evaluation> {
    routes.iter().map(|r| evaluate(problem, r)).collect()
}
