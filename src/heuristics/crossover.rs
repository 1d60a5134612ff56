//! Permutation crossover operators.
//!
//! Every operator works on the interior of a route and leaves both home
//! endpoints untouched, so children are always well-formed when the parents
//! are. Segment operators pick two distinct interior cut points and exchange
//! the inclusive segment between them:
//! - PMX (partially mapped)
//! - OX (order)
//! - FOMX (positional inheritance, gaps filled in the other parent's order)
//! - CX (cycle), which needs no cut points

use std::collections::{HashMap, HashSet};

use rand::seq::index;
use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Crossover {
    /// Partially Mapped Crossover
    Pmx,
    /// Order Crossover
    Ordered,
    /// Fast Ordered Mapped Crossover
    FastOrderedMapped,
    /// Cycle Crossover
    Cycle,
}

impl Crossover {
    pub fn name(&self) -> &'static str {
        match self {
            Crossover::Pmx => "pmx",
            Crossover::Ordered => "ox",
            Crossover::FastOrderedMapped => "fomx",
            Crossover::Cycle => "cx",
        }
    }

    /// Produce two children. Routes with fewer than two interior slots are copied through.
    pub fn apply<R: Rng + ?Sized>(
        &self,
        parent1: &[usize],
        parent2: &[usize],
        rng: &mut R,
    ) -> (Vec<usize>, Vec<usize>) {
        if *self == Crossover::Cycle {
            return cycle_crossover(parent1, parent2);
        }

        let (a, b) = match cut_points(parent1.len(), rng) {
            Some(cuts) => cuts,
            None => return (parent1.to_vec(), parent2.to_vec()),
        };

        match self {
            Crossover::Pmx => pmx_with_cuts(parent1, parent2, a, b),
            Crossover::Ordered => ordered_with_cuts(parent1, parent2, a, b),
            Crossover::FastOrderedMapped => fomx_with_cuts(parent1, parent2, a, b),
            Crossover::Cycle => unreachable!(),
        }
    }
}

/// Two distinct interior positions of a route of length `len`, sorted.
pub fn cut_points<R: Rng + ?Sized>(len: usize, rng: &mut R) -> Option<(usize, usize)> {
    let interior = len.saturating_sub(2);
    if interior < 2 {
        return None;
    }
    let picked = index::sample(rng, interior, 2);
    let (x, y) = (picked.index(0) + 1, picked.index(1) + 1);
    Some((x.min(y), x.max(y)))
}

/// PMX over the inclusive segment `[a, b]`.
pub fn pmx_with_cuts(parent1: &[usize], parent2: &[usize], a: usize, b: usize) -> (Vec<usize>, Vec<usize>) {
    (
        pmx_child(parent1, parent2, a, b),
        pmx_child(parent2, parent1, a, b),
    )
}

fn pmx_child(base: &[usize], donor: &[usize], a: usize, b: usize) -> Vec<usize> {
    let n = base.len();
    let mut child = base.to_vec();
    let mut donor_pos = HashMap::with_capacity(b - a + 1);

    for k in a..=b {
        child[k] = donor[k];
        donor_pos.insert(donor[k], k);
    }

    for k in (1..a).chain(b + 1..n - 1) {
        let mut value = base[k];
        while let Some(&pos) = donor_pos.get(&value) {
            value = base[pos];
        }
        child[k] = value;
    }

    child
}

/// OX over the inclusive segment `[a, b]`.
pub fn ordered_with_cuts(parent1: &[usize], parent2: &[usize], a: usize, b: usize) -> (Vec<usize>, Vec<usize>) {
    (
        ordered_child(parent1, parent2, a, b),
        ordered_child(parent2, parent1, a, b),
    )
}

fn ordered_child(base: &[usize], donor: &[usize], a: usize, b: usize) -> Vec<usize> {
    let n = base.len();
    let mut child = base.to_vec();
    child[a..=b].copy_from_slice(&donor[a..=b]);

    let segment: HashSet<usize> = donor[a..=b].iter().copied().collect();
    let mut fill = base[1..n - 1].iter().filter(|v| !segment.contains(v));

    for k in (1..a).chain(b + 1..n - 1) {
        if let Some(&v) = fill.next() {
            child[k] = v;
        }
    }

    child
}

/// FOMX over the inclusive segment `[a, b]`.
pub fn fomx_with_cuts(parent1: &[usize], parent2: &[usize], a: usize, b: usize) -> (Vec<usize>, Vec<usize>) {
    (
        fomx_child(parent1, parent2, a, b),
        fomx_child(parent2, parent1, a, b),
    )
}

fn fomx_child(base: &[usize], donor: &[usize], a: usize, b: usize) -> Vec<usize> {
    let n = base.len();
    let mut child: Vec<Option<usize>> = vec![None; n];
    child[0] = Some(base[0]);
    child[n - 1] = Some(base[n - 1]);

    let mut used: HashSet<usize> = HashSet::with_capacity(n);
    for k in a..=b {
        child[k] = Some(donor[k]);
        used.insert(donor[k]);
    }

    // keep the base value in place unless the segment already holds it
    for k in (1..a).chain(b + 1..n - 1) {
        if !used.contains(&base[k]) {
            child[k] = Some(base[k]);
        }
    }
    used.extend(child[1..n - 1].iter().flatten().copied());

    let mut fill = donor[1..n - 1].iter().filter(|v| !used.contains(v));
    child
        .into_iter()
        .enumerate()
        .map(|(k, slot)| slot.or_else(|| fill.next().copied()).unwrap_or(base[k]))
        .collect()
}

/// CX on full routes, starting at the first interior position.
pub fn cycle_crossover(parent1: &[usize], parent2: &[usize]) -> (Vec<usize>, Vec<usize>) {
    let n = parent1.len();
    if n < 4 {
        return (parent1.to_vec(), parent2.to_vec());
    }

    let (inner1, inner2) = cycle_crossover_from(&parent1[1..n - 1], &parent2[1..n - 1], 0);

    let wrap = |home: usize, inner: Vec<usize>| {
        let mut route = Vec::with_capacity(n);
        route.push(home);
        route.extend(inner);
        route.push(home);
        route
    };
    (wrap(parent1[0], inner1), wrap(parent2[0], inner2))
}

/// Cycle crossover on plain permutations.
///
/// The cycle through `start` is inherited from each child's own parent; every
/// other position comes from the other parent.
pub fn cycle_crossover_from(parent1: &[usize], parent2: &[usize], start: usize) -> (Vec<usize>, Vec<usize>) {
    let pos_in_p2: HashMap<usize, usize> = parent2.iter().enumerate().map(|(i, &v)| (v, i)).collect();

    let mut child1 = parent2.to_vec();
    let mut child2 = parent1.to_vec();

    let mut pos = start;
    loop {
        child1[pos] = parent1[pos];
        child2[pos] = parent2[pos];
        match pos_in_p2.get(&parent1[pos]) {
            Some(&next) if next != start => pos = next,
            _ => break,
        }
    }

    (child1, child2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::seq::SliceRandom;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    const H: usize = 0;

    fn is_route(route: &[usize], n: usize) -> bool {
        let mut interior = route[1..route.len() - 1].to_vec();
        interior.sort_unstable();
        route.len() == n + 1
            && route[0] == H
            && route[n] == H
            && interior == (1..n).collect::<Vec<_>>()
    }

    fn random_route(n: usize, rng: &mut ChaCha8Rng) -> Vec<usize> {
        let mut interior: Vec<usize> = (1..n).collect();
        interior.shuffle(rng);
        let mut route = vec![H];
        route.extend(interior);
        route.push(H);
        route
    }

    #[test]
    fn test_pmx_segment_swap() {
        let p1 = [H, 1, 2, 3, 4, H];
        let p2 = [H, 4, 3, 2, 1, H];
        let (c1, c2) = pmx_with_cuts(&p1, &p2, 2, 3);
        assert_eq!(c1, vec![H, 1, 3, 2, 4, H]);
        assert_eq!(c2, vec![H, 4, 2, 3, 1, H]);
    }

    #[test]
    fn test_pmx_follows_mapping() {
        let p1 = [H, 1, 2, 3, 4, 5, H];
        let p2 = [H, 3, 4, 5, 1, 2, H];
        let (c1, _) = pmx_with_cuts(&p1, &p2, 1, 2);
        assert_eq!(c1, vec![H, 3, 4, 1, 2, 5, H]);
    }

    #[test]
    fn test_ordered_crossover() {
        let p1 = [H, 1, 2, 3, 4, 5, 6, H];
        let p2 = [H, 6, 5, 4, 3, 2, 1, H];
        let (c1, c2) = ordered_with_cuts(&p1, &p2, 3, 4);
        // segment [4, 3] from p2, the rest in p1 order
        assert_eq!(c1, vec![H, 1, 2, 4, 3, 5, 6, H]);
        assert_eq!(c2, vec![H, 6, 5, 3, 4, 2, 1, H]);
    }

    #[test]
    fn test_fomx_differs_from_pmx() {
        let p1 = [H, 1, 2, 3, 4, 5, 6, H];
        let p2 = [H, 4, 6, 2, 5, 1, 3, H];
        let (fomx, _) = fomx_with_cuts(&p1, &p2, 1, 2);
        let (pmx, _) = pmx_with_cuts(&p1, &p2, 1, 2);
        assert_eq!(fomx, vec![H, 4, 6, 3, 2, 5, 1, H]);
        assert_eq!(pmx, vec![H, 4, 6, 3, 1, 5, 2, H]);
    }

    #[test]
    fn test_cycle_crossover_from_first_position() {
        let p1 = [1, 2, 3, 4, 5, 6, 7, 8];
        let p2 = [4, 1, 2, 3, 6, 5, 8, 7];
        let (c1, c2) = cycle_crossover_from(&p1, &p2, 0);
        assert_eq!(c1, vec![1, 2, 3, 4, 6, 5, 8, 7]);
        assert_eq!(c2, vec![4, 1, 2, 3, 5, 6, 7, 8]);
    }

    #[test]
    fn test_cycle_crossover_keeps_home() {
        let p1 = [H, 1, 2, 3, 4, 5, 6, 7, 8, H];
        let p2 = [H, 4, 1, 2, 3, 6, 5, 8, 7, H];
        let (c1, c2) = cycle_crossover(&p1, &p2);
        assert_eq!(c1, vec![H, 1, 2, 3, 4, 6, 5, 8, 7, H]);
        assert_eq!(c2, vec![H, 4, 1, 2, 3, 5, 6, 7, 8, H]);
    }

    #[test]
    fn test_cut_points() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        for _ in 0..100 {
            let (a, b) = cut_points(11, &mut rng).unwrap();
            assert!(1 <= a && a < b && b <= 9);
        }
        assert!(cut_points(3, &mut rng).is_none());
    }

    #[test]
    fn test_short_routes_are_copied() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let p1 = [H, 1, H];
        let p2 = [H, 1, H];
        for op in [Crossover::Pmx, Crossover::Ordered, Crossover::FastOrderedMapped, Crossover::Cycle] {
            let (c1, c2) = op.apply(&p1, &p2, &mut rng);
            assert_eq!(c1, p1.to_vec());
            assert_eq!(c2, p2.to_vec());
        }
    }

    proptest! {
        #[test]
        fn prop_children_are_routes(seed in any::<u64>(), n in 4usize..14) {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let p1 = random_route(n, &mut rng);
            let p2 = random_route(n, &mut rng);
            for op in [Crossover::Pmx, Crossover::Ordered, Crossover::FastOrderedMapped, Crossover::Cycle] {
                let (c1, c2) = op.apply(&p1, &p2, &mut rng);
                prop_assert!(is_route(&c1, n), "{:?} produced {:?}", op, c1);
                prop_assert!(is_route(&c2, n), "{:?} produced {:?}", op, c2);
            }
        }
    }
}
