//! Mutation operators.
//!
//! Each operator perturbs a copy of the route's interior; the home endpoints
//! never move and the route stays a permutation.

use rand::seq::{index, SliceRandom};
use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mutation {
    /// Exchange two interior locations
    Swap,
    /// Reverse an interior segment
    Inversion,
    /// Shuffle an interior segment
    Scramble,
    /// Move an interior segment to another offset
    Displacement,
}

impl Mutation {
    pub fn name(&self) -> &'static str {
        match self {
            Mutation::Swap => "swap",
            Mutation::Inversion => "inversion",
            Mutation::Scramble => "scramble",
            Mutation::Displacement => "displacement",
        }
    }

    /// With probability `rate`, return a mutated copy of `route`; otherwise an exact copy.
    pub fn apply<R: Rng + ?Sized>(&self, route: &[usize], rate: f64, rng: &mut R) -> Vec<usize> {
        let mut mutated = route.to_vec();
        if route.len() < 4 || rng.gen::<f64>() >= rate {
            return mutated;
        }

        let n = route.len();
        let interior = &mut mutated[1..n - 1];
        match self {
            Mutation::Swap => {
                let (i, j) = distinct_pair(interior.len(), rng);
                interior.swap(i, j);
            }
            Mutation::Inversion => {
                let (i, j) = distinct_pair(interior.len(), rng);
                interior[i..=j].reverse();
            }
            Mutation::Scramble => {
                let (i, j) = distinct_pair(interior.len(), rng);
                interior[i..=j].shuffle(rng);
            }
            Mutation::Displacement => displace(interior, rng),
        }

        mutated
    }
}

/// Two distinct indices below `len`, sorted
fn distinct_pair<R: Rng + ?Sized>(len: usize, rng: &mut R) -> (usize, usize) {
    let picked = index::sample(rng, len, 2);
    let (a, b) = (picked.index(0), picked.index(1));
    (a.min(b), a.max(b))
}

fn displace<R: Rng + ?Sized>(interior: &mut [usize], rng: &mut R) {
    let m = interior.len();
    let seg_len = rng.gen_range(1..m);
    let start = rng.gen_range(0..=m - seg_len);

    let mut rest: Vec<usize> = interior.to_vec();
    let segment: Vec<usize> = rest.drain(start..start + seg_len).collect();

    // any offset in the remainder except the one it came from
    let mut offset = rng.gen_range(0..m - seg_len);
    if offset >= start {
        offset += 1;
    }

    rest.splice(offset..offset, segment);
    interior.copy_from_slice(&rest);
}
