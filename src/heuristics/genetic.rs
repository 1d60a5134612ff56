//! Genetic Algorithm for constrained route scoring.
//!
//! This module implements a memetic genetic algorithm with:
//! - Pluggable selection, crossover and mutation operators
//! - 2-opt refinement of every child before it joins the population
//! - Elitism
//! - Optional fitness sharing to keep the population diverse
//! - Per-generation history with diversity measures
//!
//! A run owns its problem, population and random generator, so independent
//! runs can execute on separate threads without sharing state.

use std::path::Path;
use std::time::Instant;

use ordered_float::OrderedFloat;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::constraints::OrderingMode;
use crate::error::{Error, Result};
use crate::heuristics::crossover::Crossover;
use crate::heuristics::diversity::{fitness_shared, genotypic_diversity, phenotypic_diversity};
use crate::heuristics::local_search::{LocalSearch, TwoOptSearch};
use crate::heuristics::mutation::Mutation;
use crate::heuristics::population;
use crate::heuristics::selection::Selection;
use crate::instance::{CostMatrix, LocationSet, MatrixGenerator, RouteProblem};
use crate::solution::{EvolutionResult, GenerationRecord, Individual};

/// Genetic Algorithm configuration
///
/// Strategy fields have no default: a configuration file that omits one
/// fails validation instead of silently picking an operator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GAConfig {
    /// Population size
    #[serde(default = "defaults::population_size")]
    pub population_size: usize,
    /// Number of generations
    #[serde(default = "defaults::num_generations")]
    pub num_generations: usize,
    /// Probability that a parent pair is recombined
    #[serde(default = "defaults::crossover_rate")]
    pub crossover_rate: f64,
    /// Probability that a child is mutated
    #[serde(default = "defaults::mutation_rate")]
    pub mutation_rate: f64,
    #[serde(default = "defaults::enabled")]
    pub elitism: bool,
    /// Individuals carried over unchanged when elitism is on
    #[serde(default = "defaults::elitism_size")]
    pub elitism_size: usize,
    pub selection: Option<Selection>,
    pub crossover: Option<Crossover>,
    pub mutation: Option<Mutation>,
    /// Sharing radius on normalized Hamming distance; `None` disables sharing
    #[serde(default)]
    pub sharing_sigma: Option<f64>,
    /// Refine every child with 2-opt
    #[serde(default = "defaults::enabled")]
    pub local_search: bool,
    #[serde(default = "defaults::two_opt_max_iterations")]
    pub two_opt_max_iterations: usize,
    /// Apply the deterministic ordering repair to the initial population
    #[serde(default)]
    pub repair_initial: bool,
    /// How the canonical forbidden ordering is matched by `evolve`
    #[serde(default)]
    pub forbidden_ordering: OrderingMode,
    /// Keep a record of every generation in the result
    #[serde(default = "defaults::enabled")]
    pub record_history: bool,
    /// Log every generation at info level instead of debug
    #[serde(default)]
    pub verbose: bool,
    /// Random seed; fresh entropy when absent
    #[serde(default)]
    pub seed: Option<u64>,
}

mod defaults {
    pub fn population_size() -> usize {
        100
    }
    pub fn num_generations() -> usize {
        50
    }
    pub fn crossover_rate() -> f64 {
        0.8
    }
    pub fn mutation_rate() -> f64 {
        0.05
    }
    pub fn elitism_size() -> usize {
        2
    }
    pub fn two_opt_max_iterations() -> usize {
        25
    }
    pub fn enabled() -> bool {
        true
    }
}

impl Default for GAConfig {
    /// Numeric defaults only; selection, crossover and mutation stay unset.
    fn default() -> Self {
        GAConfig {
            population_size: defaults::population_size(),
            num_generations: defaults::num_generations(),
            crossover_rate: defaults::crossover_rate(),
            mutation_rate: defaults::mutation_rate(),
            elitism: true,
            elitism_size: defaults::elitism_size(),
            selection: None,
            crossover: None,
            mutation: None,
            sharing_sigma: None,
            local_search: true,
            two_opt_max_iterations: defaults::two_opt_max_iterations(),
            repair_initial: false,
            forbidden_ordering: OrderingMode::Adjacent,
            record_history: true,
            verbose: false,
            seed: None,
        }
    }
}

impl GAConfig {
    /// Default numeric settings with the given operators
    pub fn with_strategies(selection: Selection, crossover: Crossover, mutation: Mutation) -> Self {
        GAConfig {
            selection: Some(selection),
            crossover: Some(crossover),
            mutation: Some(mutation),
            ..Default::default()
        }
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Ok(serde_json::from_reader(std::io::BufReader::new(file))?)
    }

    /// Check every setting before a run starts.
    pub fn validate(&self) -> Result<()> {
        if self.population_size == 0 {
            return Err(Error::InvalidPopulationSize(self.population_size));
        }

        self.strategies()?;

        for (name, value) in [
            ("crossover_rate", self.crossover_rate),
            ("mutation_rate", self.mutation_rate),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::InvalidRate { name, value });
            }
        }

        if self.elitism && self.elitism_size >= self.population_size {
            return Err(Error::InvalidElitism {
                elitism_size: self.elitism_size,
                population_size: self.population_size,
            });
        }

        if let Some(Selection::Tournament(size)) = self.selection {
            let (min, max) = size.bounds();
            if min == 0 || min > max || max > self.population_size {
                return Err(Error::InvalidTournamentSize {
                    min,
                    max,
                    population_size: self.population_size,
                });
            }
        }

        if let Some(sigma) = self.sharing_sigma {
            if !(sigma.is_finite() && sigma > 0.0) {
                return Err(Error::InvalidSharingSigma(sigma));
            }
        }

        Ok(())
    }

    fn strategies(&self) -> Result<(Selection, Crossover, Mutation)> {
        Ok((
            self.selection.ok_or(Error::MissingStrategy("selection"))?,
            self.crossover.ok_or(Error::MissingStrategy("crossover"))?,
            self.mutation.ok_or(Error::MissingStrategy("mutation"))?,
        ))
    }

    fn make_rng(&self) -> ChaCha8Rng {
        match self.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        }
    }
}

/// Genetic Algorithm implementation
pub struct GeneticAlgorithm {
    config: GAConfig,
    problem: RouteProblem,
    selection: Selection,
    crossover: Crossover,
    mutation: Mutation,
    local_search: Option<TwoOptSearch>,
    rng: ChaCha8Rng,
    population: Vec<Individual>,
    /// Fitness seen by selection and elitism (shared when sharing is on)
    selection_fitness: Vec<f64>,
    best_individual: Option<Individual>,
    history: Vec<GenerationRecord>,
    generation: usize,
}

impl GeneticAlgorithm {
    /// Validate `config` and seed the run generator from it.
    pub fn new(problem: RouteProblem, config: GAConfig) -> Result<Self> {
        let rng = config.make_rng();
        Self::with_rng(problem, config, rng)
    }

    /// Validate `config` and continue drawing from an existing generator.
    pub fn with_rng(problem: RouteProblem, config: GAConfig, rng: ChaCha8Rng) -> Result<Self> {
        config.validate()?;
        let (selection, crossover, mutation) = config.strategies()?;

        let local_search = config
            .local_search
            .then(|| TwoOptSearch::with_max_iterations(config.two_opt_max_iterations));

        Ok(GeneticAlgorithm {
            config,
            problem,
            selection,
            crossover,
            mutation,
            local_search,
            rng,
            population: Vec::new(),
            selection_fitness: Vec::new(),
            best_individual: None,
            history: Vec::new(),
            generation: 0,
        })
    }

    /// Build and score the initial population.
    pub fn initialize(&mut self) {
        let routes = population::initialize(
            &self.problem,
            self.config.population_size,
            &mut self.rng,
            self.config.repair_initial,
        );
        self.population = routes
            .into_iter()
            .map(|route| Individual::new(route, &self.problem))
            .collect();
        self.selection_fitness = self.population.iter().map(|i| i.fitness as f64).collect();
        self.generation = 0;
        self.history.clear();
        self.best_individual = None;
        self.track_best();

        log::debug!(
            "[GA] Initialized population: {} (best {})",
            self.population.len(),
            self.best_individual.as_ref().map_or(0, |b| b.fitness)
        );
    }

    /// Breed one generation. Does nothing once the generation budget is spent.
    pub fn next_generation(&mut self) {
        if self.population.is_empty() {
            self.initialize();
        }
        if self.is_finished() {
            return;
        }

        let size = self.config.population_size;
        let mut offspring: Vec<Vec<usize>> = Vec::with_capacity(size + 1);

        if self.config.elitism {
            offspring.extend(self.elite_routes());
        }

        while offspring.len() < size {
            let (child1, child2) = self.breed_pair();
            offspring.push(child1);
            offspring.push(child2);
        }
        offspring.truncate(size);

        self.population = offspring
            .into_iter()
            .map(|route| Individual::new(route, &self.problem))
            .collect();

        let raw: Vec<f64> = self.population.iter().map(|i| i.fitness as f64).collect();
        let is_last = self.generation + 1 == self.config.num_generations;
        self.selection_fitness = match self.config.sharing_sigma {
            Some(sigma) if !is_last => {
                let routes: Vec<Vec<usize>> = self.population.iter().map(|i| i.route.clone()).collect();
                fitness_shared(&routes, &raw, sigma)
            }
            _ => raw.clone(),
        };

        self.track_best();
        self.record(&raw);
        self.generation += 1;
    }

    /// Run every remaining generation and return the result.
    pub fn run(&mut self) -> EvolutionResult {
        let start = Instant::now();

        self.initialize();
        while !self.is_finished() {
            self.next_generation();
        }

        let mut result = self.result();
        result.computation_time = start.elapsed().as_secs_f64();
        result
    }

    /// Snapshot of the best individual found so far.
    pub fn result(&self) -> EvolutionResult {
        let best = self
            .best_individual
            .clone()
            .unwrap_or_else(|| Individual::new(Vec::new(), &self.problem));

        EvolutionResult {
            best_labels: self.problem.labels_of(&best.route),
            best_route: best.route,
            best_fitness: best.fitness,
            took_shortcut: best.took_shortcut,
            generations: self.generation,
            history: self.config.record_history.then(|| self.history.clone()),
            matrix: self.problem.matrix.clone(),
            computation_time: 0.0,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.generation >= self.config.num_generations
    }

    /// Best individual by raw fitness across every generation so far
    pub fn best_individual(&self) -> Option<&Individual> {
        self.best_individual.as_ref()
    }

    /// Get current generation
    pub fn current_generation(&self) -> usize {
        self.generation
    }

    pub fn population(&self) -> &[Individual] {
        &self.population
    }

    pub fn problem(&self) -> &RouteProblem {
        &self.problem
    }

    /// Get population diversity (mean pairwise Hamming distance)
    pub fn population_diversity(&self) -> f64 {
        let routes: Vec<Vec<usize>> = self.population.iter().map(|i| i.route.clone()).collect();
        genotypic_diversity(&routes)
    }

    /// Routes of the top individuals by selection fitness, best first
    fn elite_routes(&self) -> Vec<Vec<usize>> {
        let mut order: Vec<usize> = (0..self.population.len()).collect();
        order.sort_by_key(|&i| std::cmp::Reverse(OrderedFloat(self.selection_fitness[i])));
        order
            .into_iter()
            .take(self.config.elitism_size)
            .map(|i| self.population[i].route.clone())
            .collect()
    }

    /// Select, recombine, mutate and refine one pair of children
    fn breed_pair(&mut self) -> (Vec<usize>, Vec<usize>) {
        let p1 = self.selection.select_index(&self.selection_fitness, &mut self.rng);
        let p2 = self.selection.select_index(&self.selection_fitness, &mut self.rng);
        let parent1 = &self.population[p1].route;
        let parent2 = &self.population[p2].route;

        let (child1, child2) = if self.rng.gen::<f64>() < self.config.crossover_rate {
            self.crossover.apply(parent1, parent2, &mut self.rng)
        } else {
            (parent1.clone(), parent2.clone())
        };

        let rate = self.config.mutation_rate;
        let child1 = self.mutation.apply(&child1, rate, &mut self.rng);
        let child2 = self.mutation.apply(&child2, rate, &mut self.rng);

        match &self.local_search {
            Some(search) => (
                search.refine(&self.problem, &child1),
                search.refine(&self.problem, &child2),
            ),
            None => (child1, child2),
        }
    }

    fn generation_best(&self) -> Option<&Individual> {
        // first maximum wins ties
        self.population
            .iter()
            .rev()
            .max_by_key(|ind| ind.fitness)
    }

    fn track_best(&mut self) {
        let Some(candidate) = self.generation_best().cloned() else {
            return;
        };
        let improved = self
            .best_individual
            .as_ref()
            .map_or(true, |best| candidate.fitness > best.fitness);
        if improved {
            self.best_individual = Some(candidate);
        }
    }

    fn record(&mut self, raw: &[f64]) {
        let Some(best) = self.generation_best() else {
            return;
        };
        let routes: Vec<Vec<usize>> = self.population.iter().map(|i| i.route.clone()).collect();

        let record = GenerationRecord {
            generation: self.generation,
            best_route: best.route.clone(),
            best_fitness: best.fitness,
            mean_fitness: raw.iter().sum::<f64>() / raw.len() as f64,
            genotypic_diversity: genotypic_diversity(&routes),
            phenotypic_diversity: phenotypic_diversity(raw),
        };

        if self.config.verbose {
            log::info!(
                "[GA] Gen {}  Best {}  Mean {:.2}  Diversity {:.2}  Route {}",
                record.generation,
                record.best_fitness,
                record.mean_fitness,
                record.genotypic_diversity,
                self.problem.labels_of(&record.best_route).join("-")
            );
        } else {
            log::debug!(
                "[GA] Gen {}  Best {}  Mean {:.2}  Diversity {:.2}",
                record.generation,
                record.best_fitness,
                record.mean_fitness,
                record.genotypic_diversity
            );
        }

        self.history.push(record);
    }
}

/// Run the algorithm on the canonical rules.
///
/// One generator seeded from `config.seed` drives both matrix generation
/// (when `matrix` is `None`) and the evolution itself, so a seed replays the
/// whole run.
pub fn evolve(
    config: &GAConfig,
    matrix: Option<CostMatrix>,
    generator: &MatrixGenerator,
) -> Result<EvolutionResult> {
    config.validate()?;
    let mut rng = config.make_rng();

    let matrix = match matrix {
        Some(matrix) => matrix,
        None => generator.generate(&LocationSet::hallownest(), &mut rng)?,
    };
    let problem = RouteProblem::from_matrix_with_ordering(matrix, config.forbidden_ordering)?;

    let mut ga = GeneticAlgorithm::with_rng(problem, config.clone(), rng)?;
    let result = ga.run();

    log::info!(
        "evolution finished: best {} after {} generations ({:.3}s)",
        result.best_fitness,
        result.generations,
        result.computation_time
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heuristics::selection::TournamentSize;
    use rayon::prelude::*;

    fn create_test_config(seed: u64) -> GAConfig {
        GAConfig {
            population_size: 30,
            num_generations: 15,
            seed: Some(seed),
            ..GAConfig::with_strategies(
                Selection::Tournament(TournamentSize::default()),
                Crossover::Pmx,
                Mutation::Swap,
            )
        }
    }

    #[test]
    fn test_default_config_requires_strategies() {
        assert!(matches!(
            GAConfig::default().validate(),
            Err(Error::MissingStrategy("selection"))
        ));
        let config = GAConfig {
            crossover: None,
            ..create_test_config(1)
        };
        assert!(matches!(config.validate(), Err(Error::MissingStrategy("crossover"))));
    }

    #[test]
    fn test_config_validation() {
        let base = create_test_config(1);
        assert!(base.validate().is_ok());

        let config = GAConfig { population_size: 0, ..base.clone() };
        assert!(matches!(config.validate(), Err(Error::InvalidPopulationSize(0))));

        // a single individual needs elitism off and a one-contestant tournament
        let config = GAConfig { population_size: 1, ..base.clone() };
        assert!(matches!(config.validate(), Err(Error::InvalidElitism { .. })));

        let config = GAConfig { mutation_rate: 1.5, ..base.clone() };
        assert!(matches!(config.validate(), Err(Error::InvalidRate { name: "mutation_rate", .. })));

        let config = GAConfig { elitism_size: 30, ..base.clone() };
        assert!(matches!(config.validate(), Err(Error::InvalidElitism { .. })));

        // elitism size is irrelevant when elitism is off
        let config = GAConfig { elitism: false, elitism_size: 30, ..base.clone() };
        assert!(config.validate().is_ok());

        let config = GAConfig {
            selection: Some(Selection::Tournament(TournamentSize::Fixed(31))),
            ..base.clone()
        };
        assert!(matches!(config.validate(), Err(Error::InvalidTournamentSize { .. })));

        let config = GAConfig {
            selection: Some(Selection::Tournament(TournamentSize::Random { min: 5, max: 3 })),
            ..base.clone()
        };
        assert!(config.validate().is_err());

        let config = GAConfig { sharing_sigma: Some(0.0), ..base };
        assert!(matches!(config.validate(), Err(Error::InvalidSharingSigma(_))));
    }

    #[test]
    fn test_config_from_json() {
        let json = r#"{
            "population_size": 40,
            "selection": "RankBased",
            "crossover": "Cycle",
            "mutation": "Inversion",
            "sharing_sigma": 0.5,
            "seed": 7
        }"#;
        let config: GAConfig = serde_json::from_str(json).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.population_size, 40);
        assert_eq!(config.num_generations, 50);
        assert_eq!(config.crossover_rate, 0.8);
        assert_eq!(config.elitism_size, 2);
        assert_eq!(config.sharing_sigma, Some(0.5));

        let missing: GAConfig = serde_json::from_str(r#"{"selection": "RankBased", "crossover": "Pmx"}"#).unwrap();
        assert!(matches!(missing.validate(), Err(Error::MissingStrategy("mutation"))));
    }

    #[test]
    fn test_config_from_json_file() {
        let path = std::env::temp_dir().join(format!("geo-route-ga-{}-config.json", std::process::id()));
        let config = create_test_config(3);
        std::fs::write(&path, serde_json::to_string_pretty(&config).unwrap()).unwrap();
        let loaded = GAConfig::from_json_file(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_genetic_algorithm() {
        let config = create_test_config(42);
        let result = evolve(&config, None, &MatrixGenerator::default()).unwrap();

        let problem = RouteProblem::hallownest(result.matrix.clone()).unwrap();
        assert!(problem.is_well_formed(&result.best_route));
        assert_eq!(result.best_route.len(), 11);
        assert_eq!(result.best_labels.first().map(String::as_str), Some("D"));
        assert_eq!(result.best_fitness, problem.evaluate(&result.best_route).score);
        assert_eq!(result.generations, 15);

        let history = result.history.as_ref().unwrap();
        assert_eq!(history.len(), 15);
        assert!(history.iter().all(|r| r.best_fitness <= result.best_fitness));
    }

    #[test]
    fn test_seed_reproduces_run() {
        let config = create_test_config(9);
        let a = evolve(&config, None, &MatrixGenerator::default()).unwrap();
        let b = evolve(&config, None, &MatrixGenerator::default()).unwrap();
        assert_eq!(a.matrix, b.matrix);
        assert_eq!(a.best_route, b.best_route);
        assert_eq!(a.history, b.history);
    }

    #[test]
    fn test_elitism_keeps_best() {
        let config = GAConfig {
            mutation_rate: 0.5,
            local_search: false,
            ..create_test_config(5)
        };
        let result = evolve(&config, None, &MatrixGenerator::default()).unwrap();
        let curve = result.fitness_curve();
        assert!(curve.windows(2).all(|w| w[1] >= w[0]), "curve {:?}", curve);
    }

    #[test]
    fn test_every_operator_combination_runs() {
        let selections = [
            Selection::RouletteWheel,
            Selection::RankBased,
            Selection::Tournament(TournamentSize::Fixed(4)),
        ];
        let crossovers = [Crossover::Pmx, Crossover::Ordered, Crossover::FastOrderedMapped, Crossover::Cycle];
        let mutations = [Mutation::Swap, Mutation::Inversion, Mutation::Scramble, Mutation::Displacement];

        for selection in selections {
            for crossover in crossovers {
                for mutation in mutations {
                    let config = GAConfig {
                        population_size: 10,
                        num_generations: 3,
                        seed: Some(1),
                        ..GAConfig::with_strategies(selection, crossover, mutation)
                    };
                    let result = evolve(&config, None, &MatrixGenerator::default()).unwrap();
                    let problem = RouteProblem::hallownest(result.matrix.clone()).unwrap();
                    assert!(problem.is_well_formed(&result.best_route));
                }
            }
        }
    }

    #[test]
    fn test_fitness_sharing_run() {
        let config = GAConfig {
            sharing_sigma: Some(0.5),
            ..create_test_config(11)
        };
        let result = evolve(&config, None, &MatrixGenerator::default()).unwrap();
        let problem = RouteProblem::hallownest(result.matrix.clone()).unwrap();
        // reported fitness is always raw
        assert_eq!(result.best_fitness, problem.evaluate(&result.best_route).score);
    }

    #[test]
    fn test_single_individual_run() {
        let config = GAConfig {
            population_size: 1,
            num_generations: 5,
            elitism: false,
            sharing_sigma: Some(0.5),
            seed: Some(13),
            ..GAConfig::with_strategies(
                Selection::Tournament(TournamentSize::Fixed(1)),
                Crossover::Pmx,
                Mutation::Swap,
            )
        };
        assert!(config.validate().is_ok());

        let result = evolve(&config, None, &MatrixGenerator::default()).unwrap();
        let problem = RouteProblem::hallownest(result.matrix.clone()).unwrap();
        assert!(problem.is_well_formed(&result.best_route));
        assert_eq!(result.generations, 5);

        let history = result.history.unwrap();
        assert_eq!(history.len(), 5);
        assert!(history.iter().all(|r| r.genotypic_diversity == 0.0 && r.phenotypic_diversity == 0.0));
    }

    #[test]
    fn test_forbidden_ordering_reaches_problem() {
        let config = GAConfig {
            forbidden_ordering: OrderingMode::Anywhere,
            ..create_test_config(6)
        };
        let result = evolve(&config, None, &MatrixGenerator::default()).unwrap();
        let problem = RouteProblem::from_matrix_with_ordering(result.matrix.clone(), OrderingMode::Anywhere).unwrap();
        assert_eq!(result.best_fitness, problem.evaluate(&result.best_route).score);

        let json: GAConfig = serde_json::from_str(r#"{"forbidden_ordering": "Anywhere"}"#).unwrap();
        assert_eq!(json.forbidden_ordering, OrderingMode::Anywhere);
        assert_eq!(GAConfig::default().forbidden_ordering, OrderingMode::Adjacent);
    }

    #[test]
    fn test_sharing_skipped_on_final_generation() {
        let mut rng = ChaCha8Rng::seed_from_u64(12);
        let matrix = MatrixGenerator::default()
            .generate(&LocationSet::hallownest(), &mut rng)
            .unwrap();
        let problem = RouteProblem::hallownest(matrix).unwrap();
        let config = GAConfig {
            num_generations: 4,
            sharing_sigma: Some(0.5),
            ..create_test_config(12)
        };

        let mut ga = GeneticAlgorithm::new(problem, config).unwrap();
        ga.initialize();
        for _ in 0..3 {
            ga.next_generation();
            let raw: Vec<f64> = ga.population().iter().map(|i| i.fitness as f64).collect();
            // crowding only ever lowers the selection value
            assert!(ga.selection_fitness.iter().zip(&raw).all(|(s, r)| s <= r));
        }

        ga.next_generation();
        assert!(ga.is_finished());
        let raw: Vec<f64> = ga.population().iter().map(|i| i.fitness as f64).collect();
        assert_eq!(ga.selection_fitness, raw);
    }

    #[test]
    fn test_history_optional() {
        let config = GAConfig {
            record_history: false,
            ..create_test_config(2)
        };
        let result = evolve(&config, None, &MatrixGenerator::default()).unwrap();
        assert!(result.history.is_none());
    }

    #[test]
    fn test_stepwise_generations() {
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let matrix = MatrixGenerator::default()
            .generate(&LocationSet::hallownest(), &mut rng)
            .unwrap();
        let problem = RouteProblem::hallownest(matrix).unwrap();
        let config = GAConfig { num_generations: 3, ..create_test_config(4) };

        let mut ga = GeneticAlgorithm::new(problem, config).unwrap();
        ga.initialize();
        let initial_best = ga.best_individual().unwrap().fitness;
        assert_eq!(ga.population().len(), 30);
        assert!(ga.population_diversity() > 0.0);

        ga.next_generation();
        assert_eq!(ga.current_generation(), 1);
        assert!(ga.best_individual().unwrap().fitness >= initial_best);

        ga.next_generation();
        ga.next_generation();
        ga.next_generation();
        assert!(ga.is_finished());
        assert_eq!(ga.current_generation(), 3);
        assert_eq!(ga.result().history.unwrap().len(), 3);
    }

    #[test]
    fn test_custom_problem() {
        let set = LocationSet::new(vec!["H", "A", "B", "C", "D"], "H").unwrap();
        let values = vec![
            vec![0, 10, -5, 3, 1],
            vec![2, 0, 20, -1, 4],
            vec![5, 3, 0, 7, 2],
            vec![1, 8, 6, 0, 9],
            vec![6, 2, 1, 3, 0],
        ];
        let matrix = CostMatrix::new(set, values).unwrap();
        let problem = RouteProblem::unconstrained("custom", matrix).unwrap();
        let config = GAConfig {
            population_size: 12,
            num_generations: 5,
            elitism_size: 1,
            ..create_test_config(8)
        };

        let mut ga = GeneticAlgorithm::new(problem, config).unwrap();
        let result = ga.run();
        assert!(ga.problem().is_well_formed(&result.best_route));
    }

    #[test]
    fn test_concurrent_runs_match_sequential() {
        let seeds: Vec<u64> = (0..6).collect();
        let sequential: Vec<(Vec<usize>, i64)> = seeds
            .iter()
            .map(|&s| {
                let r = evolve(&create_test_config(s), None, &MatrixGenerator::default()).unwrap();
                (r.best_route, r.best_fitness)
            })
            .collect();
        let parallel: Vec<(Vec<usize>, i64)> = seeds
            .par_iter()
            .map(|&s| {
                let r = evolve(&create_test_config(s), None, &MatrixGenerator::default()).unwrap();
                (r.best_route, r.best_fitness)
            })
            .collect();
        assert_eq!(sequential, parallel);
    }
}
