//! Route ordering rules.
//!
//! Rules are soft: a route that breaks any of them is still scored (with a
//! fixed penalty) so selection can rank it against valid routes.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::instance::LocationSet;

/// Score given to a route per rule checked, when any rule fails
pub const INVALID_PENALTY_PER_RULE: i64 = -50;

/// How a forbidden ordering is matched
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderingMode {
    /// `first` immediately followed by `then`
    #[default]
    Adjacent,
    /// `first` anywhere before `then`
    Anywhere,
}

/// A pair of locations that must not appear in this order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForbiddenOrder {
    pub first: usize,
    pub then: usize,
    pub mode: OrderingMode,
}

impl ForbiddenOrder {
    pub fn adjacent(first: usize, then: usize) -> Self {
        ForbiddenOrder { first, then, mode: OrderingMode::Adjacent }
    }

    /// Position of `first` when the ordering occurs
    pub fn find(&self, route: &[usize]) -> Option<usize> {
        match self.mode {
            OrderingMode::Adjacent => route
                .windows(2)
                .position(|w| w[0] == self.first && w[1] == self.then),
            OrderingMode::Anywhere => {
                let first = route.iter().position(|&l| l == self.first)?;
                let then = route.iter().position(|&l| l == self.then)?;
                (first < then).then_some(first)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteRules {
    pub home: usize,
    /// Location that must sit in the second half of the interior
    pub special: Option<usize>,
    pub forbidden: Option<ForbiddenOrder>,
}

/// Outcome of every rule for one route
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConstraintReport {
    pub special_in_second_half: bool,
    pub forbidden_order_absent: bool,
    pub endpoints_at_home: bool,
    pub no_duplicates: bool,
}

impl ConstraintReport {
    pub const RULE_COUNT: usize = 4;

    pub fn all(&self) -> bool {
        self.special_in_second_half
            && self.forbidden_order_absent
            && self.endpoints_at_home
            && self.no_duplicates
    }

    /// Fixed score for a route that fails any rule
    pub fn penalty() -> i64 {
        INVALID_PENALTY_PER_RULE * Self::RULE_COUNT as i64
    }

    pub fn failed(&self) -> Vec<&'static str> {
        [
            (self.special_in_second_half, "special location in first half"),
            (self.forbidden_order_absent, "forbidden ordering"),
            (self.endpoints_at_home, "route does not start and end at home"),
            (self.no_duplicates, "duplicate locations"),
        ]
        .into_iter()
        .filter(|(ok, _)| !ok)
        .map(|(_, name)| name)
        .collect()
    }
}

impl RouteRules {
    /// Only the structural rules (endpoints, no duplicates)
    pub fn new(home: usize) -> Self {
        RouteRules { home, special: None, forbidden: None }
    }

    /// Resting Grounds late in the route, Queen's Gardens never straight into City Storerooms.
    pub fn hallownest(locations: &LocationSet) -> Result<Self> {
        Self::hallownest_with_ordering(locations, OrderingMode::Adjacent)
    }

    /// Canonical rules with a chosen match for the Queen's Gardens / City
    /// Storerooms ordering. `Anywhere` is the stricter historical rule: City
    /// Storerooms may not follow Queen's Gardens at any distance.
    pub fn hallownest_with_ordering(locations: &LocationSet, mode: OrderingMode) -> Result<Self> {
        Ok(RouteRules {
            home: locations.home(),
            special: Some(locations.index_of("RG")?),
            forbidden: Some(ForbiddenOrder {
                first: locations.index_of("QG")?,
                then: locations.index_of("CS")?,
                mode,
            }),
        })
    }

    /// First interior index of the second half, in full-route coordinates.
    pub fn second_half_start(route_len: usize) -> usize {
        route_len / 2
    }

    pub fn check(&self, route: &[usize]) -> ConstraintReport {
        let special_in_second_half = match self.special {
            Some(special) => route
                .iter()
                .position(|&l| l == special)
                .map_or(false, |idx| idx >= Self::second_half_start(route.len())),
            None => true,
        };

        let forbidden_order_absent = self.forbidden.map_or(true, |order| order.find(route).is_none());

        let endpoints_at_home =
            route.first() == Some(&self.home) && route.last() == Some(&self.home);

        let no_duplicates = if route.len() < 2 {
            true
        } else {
            let interior = &route[1..route.len() - 1];
            let mut sorted = interior.to_vec();
            sorted.sort_unstable();
            sorted.dedup();
            sorted.len() == interior.len()
        };

        ConstraintReport {
            special_in_second_half,
            forbidden_order_absent,
            endpoints_at_home,
            no_duplicates,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // H=0, A=1, B=2, S=3, X=4, Y=5
    fn rules() -> RouteRules {
        RouteRules {
            home: 0,
            special: Some(3),
            forbidden: Some(ForbiddenOrder::adjacent(4, 5)),
        }
    }

    #[test]
    fn test_valid_route() {
        let report = rules().check(&[0, 1, 4, 2, 3, 5, 0]);
        assert!(report.all());
        assert!(report.failed().is_empty());
    }

    #[test]
    fn test_special_in_first_half() {
        // interior length 5, special at interior index 1
        let report = rules().check(&[0, 1, 3, 4, 2, 5, 0]);
        assert!(!report.special_in_second_half);
        assert!(!report.all());
    }

    #[test]
    fn test_special_at_half_boundary() {
        // interior length 5: interior index 2 == 5 / 2 is the first accepted slot
        assert!(rules().check(&[0, 1, 2, 3, 4, 5, 0]).special_in_second_half);
        assert!(!rules().check(&[0, 1, 3, 2, 4, 5, 0]).special_in_second_half);
    }

    #[test]
    fn test_missing_special_fails() {
        assert!(!rules().check(&[0, 1, 2, 4, 5, 0]).special_in_second_half);
    }

    #[test]
    fn test_forbidden_adjacency() {
        let report = rules().check(&[0, 1, 2, 4, 5, 3, 0]);
        assert!(!report.forbidden_order_absent);
        // reversed order is allowed
        assert!(rules().check(&[0, 1, 2, 5, 4, 3, 0]).forbidden_order_absent);
        // non-adjacent is allowed in adjacent mode
        assert!(rules().check(&[0, 4, 1, 5, 2, 3, 0]).forbidden_order_absent);
    }

    #[test]
    fn test_forbidden_anywhere() {
        let mut r = rules();
        r.forbidden = Some(ForbiddenOrder { first: 4, then: 5, mode: OrderingMode::Anywhere });
        assert!(!r.check(&[0, 4, 1, 5, 2, 3, 0]).forbidden_order_absent);
        assert!(r.check(&[0, 5, 1, 4, 2, 3, 0]).forbidden_order_absent);
    }

    #[test]
    fn test_hallownest_ordering_modes() {
        let set = LocationSet::hallownest();
        let route: Vec<usize> = ["D", "G", "QG", "FC", "CS", "KS", "DV", "SN", "QS", "RG", "D"]
            .iter()
            .map(|l| set.index_of(l).unwrap())
            .collect();

        let adjacent = RouteRules::hallownest(&set).unwrap();
        assert!(adjacent.check(&route).all());

        let anywhere = RouteRules::hallownest_with_ordering(&set, OrderingMode::Anywhere).unwrap();
        let report = anywhere.check(&route);
        assert!(!report.forbidden_order_absent);
        assert_eq!(report.failed(), vec!["forbidden ordering"]);
    }

    #[test]
    fn test_endpoints_and_duplicates() {
        let report = rules().check(&[1, 0, 2, 4, 3, 5, 1]);
        assert!(!report.endpoints_at_home);

        let report = rules().check(&[0, 1, 1, 4, 3, 5, 0]);
        assert!(!report.no_duplicates);
    }

    #[test]
    fn test_penalty() {
        assert_eq!(ConstraintReport::penalty(), -200);
    }
}
