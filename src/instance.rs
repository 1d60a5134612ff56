//! Locations, score matrices and problem definitions.
//!
//! A [`CostMatrix`] maps ordered location pairs to a signed integer score.
//! Matrices are either generated with a biased random fill or loaded from a
//! labeled CSV file, and are immutable once a run starts. A [`RouteProblem`]
//! bundles the matrix with the route rules and the shortcut rule so every
//! component receives one explicit value instead of shared global state.

use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::constraints::{OrderingMode, RouteRules};
use crate::error::{Error, Result};
use crate::fitness::{self, Evaluation, ShortcutRule};

/// Labels of the canonical Hallownest map, in matrix order.
pub const HALLOWNEST_AREAS: [&str; 10] = ["D", "G", "FC", "QG", "CS", "KS", "DV", "SN", "QS", "RG"];

/// The fixed, finite set of locations a route visits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationSet {
    labels: Vec<String>,
    home: usize,
}

impl LocationSet {
    /// Build a location set; labels must be unique and `home` must be one of them.
    pub fn new<S: Into<String>>(labels: Vec<S>, home: &str) -> Result<Self> {
        let labels: Vec<String> = labels.into_iter().map(Into::into).collect();

        let mut seen = HashSet::new();
        for label in &labels {
            if !seen.insert(label.as_str()) {
                return Err(Error::MatrixShape(format!("duplicate location label '{}'", label)));
            }
        }

        let home = labels
            .iter()
            .position(|l| l == home)
            .ok_or_else(|| Error::UnknownLocation(home.to_string()))?;

        Ok(LocationSet { labels, home })
    }

    /// Dirtmouth (`D`) plus the nine areas a Hallownest route must cover.
    pub fn hallownest() -> Self {
        LocationSet {
            labels: HALLOWNEST_AREAS.iter().map(|s| s.to_string()).collect(),
            home: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn home(&self) -> usize {
        self.home
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn label(&self, index: usize) -> &str {
        &self.labels[index]
    }

    pub fn index_of(&self, label: &str) -> Result<usize> {
        self.labels
            .iter()
            .position(|l| l == label)
            .ok_or_else(|| Error::UnknownLocation(label.to_string()))
    }

    /// Every location except home, in matrix order
    pub fn interior(&self) -> Vec<usize> {
        (0..self.labels.len()).filter(|&i| i != self.home).collect()
    }

    /// Length of a complete route: every location once, plus the return home.
    pub fn route_len(&self) -> usize {
        self.labels.len() + 1
    }
}

/// Square, asymmetric score matrix with a zero diagonal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostMatrix {
    locations: LocationSet,
    values: Vec<Vec<i64>>,
}

impl CostMatrix {
    pub fn new(locations: LocationSet, values: Vec<Vec<i64>>) -> Result<Self> {
        let n = locations.len();
        if values.len() != n {
            return Err(Error::MatrixShape(format!(
                "expected {} rows, found {}",
                n,
                values.len()
            )));
        }
        for (i, row) in values.iter().enumerate() {
            if row.len() != n {
                return Err(Error::MatrixShape(format!(
                    "row '{}' has {} columns, expected {}",
                    locations.label(i),
                    row.len(),
                    n
                )));
            }
            if row[i] != 0 {
                return Err(Error::MatrixShape(format!(
                    "diagonal entry for '{}' is {}, expected 0",
                    locations.label(i),
                    row[i]
                )));
            }
        }

        Ok(CostMatrix { locations, values })
    }

    /// Load a labeled matrix.
    ///
    /// The header row is `,<label>,<label>,...` and each following row is
    /// `<label>,<value>,...` in the same label order.
    pub fn from_csv<P: AsRef<Path>>(path: P, home: &str) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(path)?;

        let labels: Vec<String> = reader.headers()?.iter().skip(1).map(str::to_string).collect();
        let locations = LocationSet::new(labels, home)?;

        let mut values = Vec::with_capacity(locations.len());
        for record in reader.records() {
            let record = record?;
            let row = values.len();
            let label = record.get(0).unwrap_or_default();
            if row >= locations.len() || label != locations.label(row) {
                return Err(Error::MatrixShape(format!(
                    "row {} is labeled '{}', which does not match the header order",
                    row + 1,
                    label
                )));
            }

            let parsed = record
                .iter()
                .skip(1)
                .map(|cell| {
                    cell.parse::<i64>().map_err(|_| {
                        Error::MatrixShape(format!("invalid score '{}' in row '{}'", cell, label))
                    })
                })
                .collect::<Result<Vec<i64>>>()?;
            values.push(parsed);
        }

        Self::new(locations, values)
    }

    /// Write the matrix in the format read by [`CostMatrix::from_csv`].
    pub fn to_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)?;

        let mut header = vec![String::new()];
        header.extend(self.locations.labels().iter().cloned());
        writer.write_record(&header)?;

        for (i, row) in self.values.iter().enumerate() {
            let mut record = vec![self.locations.label(i).to_string()];
            record.extend(row.iter().map(|v| v.to_string()));
            writer.write_record(&record)?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Score gained travelling from `from` to `to`
    #[inline]
    pub fn get(&self, from: usize, to: usize) -> i64 {
        self.values[from][to]
    }

    pub fn get_by_label(&self, from: &str, to: &str) -> Result<i64> {
        Ok(self.get(self.locations.index_of(from)?, self.locations.index_of(to)?))
    }

    pub fn locations(&self) -> &LocationSet {
        &self.locations
    }

    pub fn size(&self) -> usize {
        self.locations.len()
    }

    pub fn rows(&self) -> &[Vec<i64>] {
        &self.values
    }

    pub fn statistics(&self) -> MatrixStatistics {
        let off_diagonal: Vec<i64> = self
            .values
            .iter()
            .enumerate()
            .flat_map(|(i, row)| {
                row.iter()
                    .enumerate()
                    .filter(move |(j, _)| *j != i)
                    .map(|(_, &v)| v)
            })
            .collect();

        let mean_edge = if off_diagonal.is_empty() {
            0.0
        } else {
            off_diagonal.iter().sum::<i64>() as f64 / off_diagonal.len() as f64
        };

        MatrixStatistics {
            size: self.size(),
            home: self.locations.label(self.locations.home()).to_string(),
            negative_edges: off_diagonal.iter().filter(|&&v| v < 0).count(),
            total_edges: off_diagonal.len(),
            min_edge: off_diagonal.iter().copied().min().unwrap_or(0),
            max_edge: off_diagonal.iter().copied().max().unwrap_or(0),
            mean_edge,
        }
    }
}

/// Random matrix generator with a fixed share of negative edges.
///
/// Mirrors the distribution of the hand-made Hallownest matrix: about 7% of
/// the off-diagonal edges lose score, and one structural edge is forced just
/// below the smallest positive value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatrixGenerator {
    /// Lower bound for losses (exclusive upper bound is 0)
    pub min_value: i64,
    /// Upper bound for gains (inclusive)
    pub max_value: i64,
    /// Probability that an off-diagonal edge is a loss
    pub negative_probability: f64,
    /// Edge forced to `floor(min_positive * discount_factor)`
    pub discounted_edge: Option<(String, String)>,
    pub discount_factor: f64,
}

impl Default for MatrixGenerator {
    fn default() -> Self {
        MatrixGenerator {
            min_value: -500,
            max_value: 500,
            negative_probability: 0.07,
            discounted_edge: Some(("G".to_string(), "FC".to_string())),
            discount_factor: 0.968,
        }
    }
}

impl MatrixGenerator {
    pub fn with_bounds(min_value: i64, max_value: i64) -> Self {
        MatrixGenerator {
            min_value,
            max_value,
            ..Default::default()
        }
    }

    /// Fill a matrix for `locations`, drawing every value from `rng`.
    pub fn generate<R: Rng>(&self, locations: &LocationSet, rng: &mut R) -> Result<CostMatrix> {
        if self.max_value < 1 {
            return Err(Error::MatrixShape(format!(
                "max_value must be at least 1, got {}",
                self.max_value
            )));
        }
        if !(0.0..=1.0).contains(&self.negative_probability) {
            return Err(Error::InvalidRate {
                name: "negative_probability",
                value: self.negative_probability,
            });
        }

        let discounted = match &self.discounted_edge {
            Some((from, to)) => match (locations.index_of(from), locations.index_of(to)) {
                (Ok(f), Ok(t)) => Some((f, t)),
                _ => {
                    log::warn!("discounted edge {}->{} is not part of the location set; skipping it", from, to);
                    None
                }
            },
            None => None,
        };

        let n = locations.len();
        let mut values = vec![vec![0i64; n]; n];
        let mut min_positive: Option<i64> = None;

        for (i, row) in values.iter_mut().enumerate() {
            for (j, cell) in row.iter_mut().enumerate() {
                if i == j || discounted == Some((i, j)) {
                    continue;
                }

                if rng.gen::<f64>() < self.negative_probability {
                    *cell = if self.min_value < 0 {
                        rng.gen_range(self.min_value..0)
                    } else {
                        0
                    };
                } else {
                    let value = rng.gen_range(1..=self.max_value);
                    min_positive = Some(min_positive.map_or(value, |m| m.min(value)));
                    *cell = value;
                }
            }
        }

        if let (Some((f, t)), Some(min_positive)) = (discounted, min_positive) {
            values[f][t] = (min_positive as f64 * self.discount_factor).floor() as i64;
        }

        CostMatrix::new(locations.clone(), values)
    }
}

/// A complete problem: the matrix plus the rules every route is judged by
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteProblem {
    pub name: String,
    pub matrix: CostMatrix,
    pub rules: RouteRules,
    pub shortcut: Option<ShortcutRule>,
}

impl RouteProblem {
    pub fn new(
        name: &str,
        matrix: CostMatrix,
        rules: RouteRules,
        shortcut: Option<ShortcutRule>,
    ) -> Result<Self> {
        let n = matrix.size();
        if n < 3 {
            return Err(Error::TooFewLocations(n));
        }

        let mut referenced = vec![rules.home];
        referenced.extend(rules.special);
        if let Some(order) = rules.forbidden {
            referenced.extend([order.first, order.then]);
        }
        if let Some(s) = shortcut {
            referenced.extend([s.from, s.to]);
        }
        if let Some(&bad) = referenced.iter().find(|&&idx| idx >= n) {
            return Err(Error::UnknownLocation(format!("index {}", bad)));
        }
        if rules.home != matrix.locations().home() {
            return Err(Error::MatrixShape(format!(
                "rules use home '{}' but the matrix is anchored at '{}'",
                matrix.locations().label(rules.home),
                matrix.locations().label(matrix.locations().home())
            )));
        }

        Ok(RouteProblem {
            name: name.to_string(),
            matrix,
            rules,
            shortcut,
        })
    }

    /// Routes that only need to start and end at home
    pub fn unconstrained(name: &str, matrix: CostMatrix) -> Result<Self> {
        let rules = RouteRules::new(matrix.locations().home());
        Self::new(name, matrix, rules, None)
    }

    /// The canonical rules: Resting Grounds in the second half, never
    /// Queen's Gardens straight into City Storerooms, and the Queen's Station
    /// to Distant Village shortcut that skips King's Station.
    pub fn hallownest(matrix: CostMatrix) -> Result<Self> {
        Self::hallownest_with_ordering(matrix, OrderingMode::Adjacent)
    }

    /// Canonical rules with the given match for the forbidden ordering
    pub fn hallownest_with_ordering(matrix: CostMatrix, mode: OrderingMode) -> Result<Self> {
        let locations = matrix.locations();
        let rules = RouteRules::hallownest_with_ordering(locations, mode)?;
        let shortcut = ShortcutRule::new(locations.index_of("QS")?, locations.index_of("DV")?);
        Self::new("hallownest", matrix, rules, Some(shortcut))
    }

    /// Canonical rules when the matrix carries every area they mention,
    /// otherwise only the structural rules.
    pub fn from_matrix(matrix: CostMatrix) -> Result<Self> {
        Self::from_matrix_with_ordering(matrix, OrderingMode::Adjacent)
    }

    pub fn from_matrix_with_ordering(matrix: CostMatrix, mode: OrderingMode) -> Result<Self> {
        let locations = matrix.locations();
        let canonical = ["RG", "QG", "CS", "QS", "DV"]
            .iter()
            .all(|label| locations.index_of(label).is_ok());

        if canonical {
            Self::hallownest_with_ordering(matrix, mode)
        } else {
            log::warn!(
                "matrix has no Hallownest areas; evolving with endpoint and permutation rules only"
            );
            Self::unconstrained("custom", matrix)
        }
    }

    pub fn locations(&self) -> &LocationSet {
        self.matrix.locations()
    }

    pub fn home(&self) -> usize {
        self.rules.home
    }

    pub fn route_len(&self) -> usize {
        self.locations().route_len()
    }

    /// Score a route (constraint penalty included)
    pub fn evaluate(&self, route: &[usize]) -> Evaluation {
        fitness::evaluate(self, route)
    }

    /// True when every route rule holds
    pub fn is_valid(&self, route: &[usize]) -> bool {
        self.rules.check(route).all()
    }

    /// Endpoints at home and an interior that is a permutation of all other locations.
    pub fn is_well_formed(&self, route: &[usize]) -> bool {
        let n = self.locations().len();
        if route.len() != n + 1 || route[0] != self.home() || route[n] != self.home() {
            return false;
        }

        let mut seen = vec![false; n];
        for &loc in &route[1..n] {
            if loc >= n || loc == self.home() || seen[loc] {
                return false;
            }
            seen[loc] = true;
        }
        true
    }

    pub fn labels_of(&self, route: &[usize]) -> Vec<String> {
        route.iter().map(|&i| self.locations().label(i).to_string()).collect()
    }

    /// Parse a route written as location labels
    pub fn route_from_labels<S: AsRef<str>>(&self, labels: &[S]) -> Result<Vec<usize>> {
        labels.iter().map(|l| self.locations().index_of(l.as_ref())).collect()
    }
}

/// Summary of a matrix, printed by the `analyze` command
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatrixStatistics {
    pub size: usize,
    pub home: String,
    pub negative_edges: usize,
    pub total_edges: usize,
    pub min_edge: i64,
    pub max_edge: i64,
    pub mean_edge: f64,
}

impl fmt::Display for MatrixStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Matrix: {}x{} (home: {})", self.size, self.size, self.home)?;
        writeln!(
            f,
            "  Negative edges: {} of {} ({:.1}%)",
            self.negative_edges,
            self.total_edges,
            100.0 * self.negative_edges as f64 / self.total_edges.max(1) as f64
        )?;
        writeln!(f, "  Min edge: {}", self.min_edge)?;
        writeln!(f, "  Max edge: {}", self.max_edge)?;
        writeln!(f, "  Mean edge: {:.2}", self.mean_edge)
    }
}
