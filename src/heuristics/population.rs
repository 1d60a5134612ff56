//! Initial population construction.
//!
//! Every route is home, a random permutation of the other locations, home.
//! Routes may optionally be nudged toward validity with a deterministic
//! repair that never consumes randomness and never changes which locations
//! the route contains.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::instance::RouteProblem;

/// One random well-formed route
pub fn random_route<R: Rng + ?Sized>(problem: &RouteProblem, rng: &mut R) -> Vec<usize> {
    let home = problem.home();
    let mut interior = problem.locations().interior();
    interior.shuffle(rng);

    let mut route = Vec::with_capacity(interior.len() + 2);
    route.push(home);
    route.extend(interior);
    route.push(home);
    route
}

/// Build `size` routes for `problem`.
pub fn initialize<R: Rng + ?Sized>(
    problem: &RouteProblem,
    size: usize,
    rng: &mut R,
    repair_routes: bool,
) -> Vec<Vec<usize>> {
    let population: Vec<Vec<usize>> = (0..size)
        .map(|_| {
            let mut route = random_route(problem, rng);
            if repair_routes {
                repair(problem, &mut route);
            }
            route
        })
        .collect();

    let valid = population.iter().filter(|r| problem.is_valid(r)).count();
    log::debug!("initialized {} routes ({} valid)", population.len(), valid);

    population
}

/// Move the route toward the ordering rules in place.
///
/// A special location in the first half is swapped with its mirrored interior
/// slot; a forbidden ordering is broken by swapping the two locations. Each
/// pass fixes at most one problem, and the loop is bounded by the interior
/// length, so the result is not guaranteed to be valid.
pub fn repair(problem: &RouteProblem, route: &mut [usize]) {
    if route.len() < 4 {
        return;
    }
    let rules = &problem.rules;
    let interior_len = route.len() - 2;
    let half = crate::constraints::RouteRules::second_half_start(route.len());

    for _ in 0..interior_len {
        if let Some(special) = rules.special {
            if let Some(pos) = route.iter().position(|&l| l == special) {
                if pos > 0 && pos < half {
                    // mirror within the interior: interior index k -> m - 1 - k
                    let mirrored = interior_len - pos + 1;
                    route.swap(pos, mirrored);
                    continue;
                }
            }
        }

        if let Some(order) = rules.forbidden {
            if order.find(route).is_some() {
                let a = route.iter().position(|&l| l == order.first);
                let b = route.iter().position(|&l| l == order.then);
                if let (Some(a), Some(b)) = (a, b) {
                    route.swap(a, b);
                    continue;
                }
            }
        }

        break;
    }
}
