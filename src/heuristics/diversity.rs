//! Population diversity measures and fitness sharing.
//!
//! - Genotypic diversity: mean pairwise Hamming distance between routes
//! - Phenotypic diversity: spread of fitness values
//! - Fitness sharing: discounts individuals that sit in crowded regions
//!   of the search space so selection keeps distinct routes alive

use statrs::statistics::Statistics;

/// Number of positions at which two routes differ
pub fn hamming(a: &[usize], b: &[usize]) -> usize {
    a.iter().zip(b).filter(|(x, y)| x != y).count() + a.len().abs_diff(b.len())
}

/// Mean Hamming distance over all unordered pairs; 0.0 for fewer than two routes.
pub fn genotypic_diversity(routes: &[Vec<usize>]) -> f64 {
    if routes.len() < 2 {
        return 0.0;
    }

    let mut total = 0usize;
    let mut pairs = 0usize;
    for i in 0..routes.len() {
        for j in i + 1..routes.len() {
            total += hamming(&routes[i], &routes[j]);
            pairs += 1;
        }
    }
    total as f64 / pairs as f64
}

/// Population standard deviation of fitness; 0.0 for fewer than two values.
pub fn phenotypic_diversity(fitnesses: &[f64]) -> f64 {
    if fitnesses.len() < 2 {
        return 0.0;
    }
    fitnesses.iter().population_std_dev()
}

/// Shared fitness for every individual.
///
/// Distances are normalized by the largest pairwise distance in the
/// population. Each neighbour closer than `sigma` adds `1 - d / sigma` to an
/// individual's niche count, and the niche count always pushes fitness down:
/// positive fitness is divided by `1 + niche`, negative fitness multiplied.
pub fn fitness_shared(routes: &[Vec<usize>], fitnesses: &[f64], sigma: f64) -> Vec<f64> {
    let n = routes.len();
    if n < 2 {
        return fitnesses.to_vec();
    }

    let mut distances = vec![vec![0.0f64; n]; n];
    let mut max_distance = 0.0f64;
    for i in 0..n {
        for j in i + 1..n {
            let d = hamming(&routes[i], &routes[j]) as f64;
            distances[i][j] = d;
            distances[j][i] = d;
            max_distance = max_distance.max(d);
        }
    }
    let scale = if max_distance > 0.0 { max_distance } else { 1.0 };

    fitnesses
        .iter()
        .enumerate()
        .map(|(i, &f)| {
            let niche: f64 = (0..n)
                .filter(|&j| j != i)
                .map(|j| (1.0 - distances[i][j] / scale / sigma).max(0.0))
                .sum();
            if f >= 0.0 {
                f / (1.0 + niche)
            } else {
                f * (1.0 + niche)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hamming() {
        assert_eq!(hamming(&[0, 1, 2, 3, 0], &[0, 1, 2, 3, 0]), 0);
        assert_eq!(hamming(&[0, 1, 2, 3, 0], &[0, 3, 2, 1, 0]), 2);
    }

    #[test]
    fn test_genotypic_diversity() {
        assert_eq!(genotypic_diversity(&[vec![0, 1, 2, 0]]), 0.0);
        let routes = vec![vec![0, 1, 2, 3, 0], vec![0, 1, 2, 3, 0], vec![0, 3, 2, 1, 0]];
        // pairs: 0, 2, 2
        assert!((genotypic_diversity(&routes) - 4.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_phenotypic_diversity() {
        assert_eq!(phenotypic_diversity(&[5.0]), 0.0);
        assert_eq!(phenotypic_diversity(&[3.0, 3.0, 3.0]), 0.0);
        assert!((phenotypic_diversity(&[1.0, 3.0]) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_sharing_single_individual_unchanged() {
        assert_eq!(fitness_shared(&[vec![0, 1, 2, 0]], &[42.0], 0.5), vec![42.0]);
    }

    #[test]
    fn test_sharing_identical_population() {
        let routes = vec![vec![0, 1, 2, 3, 0]; 3];
        // max distance 0: every neighbour contributes a full 1.0
        let shared = fitness_shared(&routes, &[30.0, -30.0, 0.0], 0.5);
        assert_eq!(shared, vec![10.0, -90.0, 0.0]);
    }

    #[test]
    fn test_sharing_never_raises_fitness() {
        let routes = vec![
            vec![0, 1, 2, 3, 4, 0],
            vec![0, 1, 2, 4, 3, 0],
            vec![0, 4, 3, 2, 1, 0],
            vec![0, 2, 1, 3, 4, 0],
        ];
        let fitnesses = [120.0, -200.0, 15.0, 0.5];
        let shared = fitness_shared(&routes, &fitnesses, 0.8);
        for (s, f) in shared.iter().zip(&fitnesses) {
            assert!(s <= f);
        }
    }

    #[test]
    fn test_sharing_distinct_routes_untouched() {
        let routes = vec![vec![0, 1, 2, 3, 0], vec![0, 3, 1, 2, 0]];
        // normalized distance 1.0 with sigma 1.0 gives no niche overlap
        assert_eq!(fitness_shared(&routes, &[10.0, -10.0], 1.0), vec![10.0, -10.0]);
    }
}
