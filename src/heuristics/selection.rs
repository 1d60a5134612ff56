//! Parent selection strategies.
//!
//! All strategies work on a slice of fitness values and tolerate negative
//! entries, since penalized routes and loss-heavy matrices both produce them.
//! - Roulette wheel: probability proportional to (shifted) fitness
//! - Rank based: probability proportional to rank
//! - Tournament: best of a random sample without replacement

use ordered_float::OrderedFloat;
use rand::seq::index;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// How many contestants a tournament draws
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TournamentSize {
    Fixed(usize),
    /// Drawn uniformly from `min..=max` for every tournament
    Random { min: usize, max: usize },
}

impl Default for TournamentSize {
    fn default() -> Self {
        TournamentSize::Random { min: 3, max: 6 }
    }
}

impl TournamentSize {
    pub fn bounds(&self) -> (usize, usize) {
        match *self {
            TournamentSize::Fixed(k) => (k, k),
            TournamentSize::Random { min, max } => (min, max),
        }
    }

    fn draw<R: Rng + ?Sized>(&self, population: usize, rng: &mut R) -> usize {
        let k = match *self {
            TournamentSize::Fixed(k) => k,
            TournamentSize::Random { min, max } if min < max => rng.gen_range(min..=max),
            TournamentSize::Random { min, .. } => min,
        };
        k.clamp(1, population)
    }
}

/// Selection method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Selection {
    RouletteWheel,
    RankBased,
    Tournament(TournamentSize),
}

impl Selection {
    pub fn name(&self) -> &'static str {
        match self {
            Selection::RouletteWheel => "roulette",
            Selection::RankBased => "rank",
            Selection::Tournament(_) => "tournament",
        }
    }

    /// Index of the chosen individual. `fitnesses` must not be empty.
    pub fn select_index<R: Rng + ?Sized>(&self, fitnesses: &[f64], rng: &mut R) -> usize {
        debug_assert!(!fitnesses.is_empty());
        if fitnesses.len() == 1 {
            return 0;
        }

        match self {
            Selection::RouletteWheel => roulette_select(fitnesses, rng),
            Selection::RankBased => rank_select(fitnesses, rng),
            Selection::Tournament(size) => tournament_select(fitnesses, *size, rng),
        }
    }

    pub fn select<'a, T, R: Rng + ?Sized>(
        &self,
        population: &'a [T],
        fitnesses: &[f64],
        rng: &mut R,
    ) -> &'a T {
        &population[self.select_index(fitnesses, rng)]
    }
}

/// Roulette wheel weights: raw fitness when every value is positive,
/// otherwise shifted so the worst individual has weight 1.
pub fn roulette_weights(fitnesses: &[f64]) -> Vec<f64> {
    if fitnesses.iter().all(|&f| f > 0.0) {
        return fitnesses.to_vec();
    }
    let min = fitnesses.iter().copied().fold(f64::INFINITY, f64::min);
    fitnesses.iter().map(|&f| f - min + 1.0).collect()
}

fn pick_weighted<R: Rng + ?Sized>(weights: &[f64], rng: &mut R) -> usize {
    let total: f64 = weights.iter().sum();
    if !total.is_finite() || total <= 0.0 {
        return rng.gen_range(0..weights.len());
    }

    let mut pick = rng.gen::<f64>() * total;
    for (i, &w) in weights.iter().enumerate() {
        pick -= w;
        if pick <= 0.0 {
            return i;
        }
    }
    weights.len() - 1
}

fn roulette_select<R: Rng + ?Sized>(fitnesses: &[f64], rng: &mut R) -> usize {
    pick_weighted(&roulette_weights(fitnesses), rng)
}

fn rank_select<R: Rng + ?Sized>(fitnesses: &[f64], rng: &mut R) -> usize {
    let n = fitnesses.len();
    let mut order: Vec<usize> = (0..n).collect();
    // stable: ties keep population order
    order.sort_by_key(|&i| std::cmp::Reverse(OrderedFloat(fitnesses[i])));

    let total_rank = n * (n + 1) / 2;
    let pick = rng.gen_range(0..total_rank);

    let mut cumulative = 0;
    for (rank, &idx) in order.iter().enumerate() {
        cumulative += n - rank;
        if cumulative > pick {
            return idx;
        }
    }
    order[n - 1]
}

fn tournament_select<R: Rng + ?Sized>(fitnesses: &[f64], size: TournamentSize, rng: &mut R) -> usize {
    let k = size.draw(fitnesses.len(), rng);
    let contestants = index::sample(rng, fitnesses.len(), k);

    let mut best = contestants.index(0);
    for idx in contestants.iter().skip(1) {
        if fitnesses[idx] > fitnesses[best] {
            best = idx;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn counts(selection: Selection, fitnesses: &[f64], draws: usize) -> Vec<usize> {
        let mut rng = ChaCha8Rng::seed_from_u64(17);
        let mut counts = vec![0; fitnesses.len()];
        for _ in 0..draws {
            counts[selection.select_index(fitnesses, &mut rng)] += 1;
        }
        counts
    }

    #[test]
    fn test_roulette_weights() {
        assert_eq!(roulette_weights(&[1.0, 2.0, 3.0]), vec![1.0, 2.0, 3.0]);
        assert_eq!(roulette_weights(&[-200.0, 0.0, 10.0]), vec![1.0, 201.0, 211.0]);
        assert_eq!(roulette_weights(&[-5.0, -5.0]), vec![1.0, 1.0]);
    }

    #[test]
    fn test_roulette_prefers_fitter() {
        let c = counts(Selection::RouletteWheel, &[1.0, 1.0, 100.0], 3000);
        assert!(c[2] > c[0] * 10);
    }

    #[test]
    fn test_roulette_all_negative() {
        let c = counts(Selection::RouletteWheel, &[-200.0, -200.0, -10.0], 3000);
        assert!(c.iter().all(|&n| n > 0));
        assert!(c[2] > c[0]);
    }

    #[test]
    fn test_rank_based() {
        let c = counts(Selection::RankBased, &[-50.0, 30.0, 10.0], 6000);
        // weights 1, 3, 2
        assert!(c[1] > c[2] && c[2] > c[0]);
    }

    #[test]
    fn test_rank_ties_keep_population_order() {
        let c = counts(Selection::RankBased, &[5.0, 5.0, 1.0], 6000);
        // weights 3, 2, 1 by index
        assert!((2700..3300).contains(&c[0]), "{:?}", c);
        assert!((1750..2250).contains(&c[1]), "{:?}", c);
        assert!((800..1200).contains(&c[2]), "{:?}", c);
    }

    #[test]
    fn test_select_returns_member() {
        let population = vec![vec![0, 1, 2, 0], vec![0, 2, 1, 0], vec![0, 1, 2, 0]];
        let fitnesses = [-200.0, 35.0, -7.0];
        let mut rng = ChaCha8Rng::seed_from_u64(21);

        for selection in [Selection::RouletteWheel, Selection::RankBased] {
            for _ in 0..200 {
                let chosen = selection.select(&population, &fitnesses, &mut rng);
                assert!(population.iter().any(|p| std::ptr::eq(p, chosen)));
            }
        }
    }

    #[test]
    fn test_tournament_full_size_picks_best() {
        let fitnesses = [3.0, -1.0, 8.0, 8.0, 2.0];
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let selection = Selection::Tournament(TournamentSize::Fixed(5));
        for _ in 0..50 {
            let idx = selection.select_index(&fitnesses, &mut rng);
            assert_eq!(fitnesses[idx], 8.0);
        }
    }

    #[test]
    fn test_tournament_size_one_is_uniform() {
        let c = counts(Selection::Tournament(TournamentSize::Fixed(1)), &[0.0, 100.0], 2000);
        assert!(c[0] > 800 && c[1] > 800);
    }

    #[test]
    fn test_random_tournament_covers_small_population() {
        let c = counts(Selection::Tournament(TournamentSize::default()), &[1.0, 2.0, 3.0], 500);
        // at least 3 contestants from 3 means the whole population competes
        assert_eq!(c, vec![0, 0, 500]);
    }

    #[test]
    fn test_select_returns_reference() {
        let population = vec!["a", "b", "c"];
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let chosen = Selection::Tournament(TournamentSize::Fixed(3)).select(&population, &[0.0, 5.0, 1.0], &mut rng);
        assert_eq!(*chosen, "b");
    }
}
