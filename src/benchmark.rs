//! Hyperparameter sweeps over the genetic algorithm.
//!
//! Provides tools for running every combination of a parameter grid over a
//! set of seeds, collecting per-combination statistics and exporting them.
//! Runs are executed one after another; each seed produces the same matrix
//! for every combination so results are directly comparable.

use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;

use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

use crate::error::Result;
use crate::heuristics::crossover::Crossover;
use crate::heuristics::genetic::{evolve, GAConfig};
use crate::heuristics::mutation::Mutation;
use crate::heuristics::selection::{Selection, TournamentSize};
use crate::instance::MatrixGenerator;

/// Values to try for every tunable setting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepGrid {
    pub population_sizes: Vec<usize>,
    pub generation_counts: Vec<usize>,
    pub mutation_rates: Vec<f64>,
    pub crossover_rates: Vec<f64>,
    pub elitism_sizes: Vec<usize>,
    pub selections: Vec<Selection>,
    pub crossovers: Vec<Crossover>,
    pub mutations: Vec<Mutation>,
    /// Applied to every combination
    pub sharing_sigma: Option<f64>,
}

impl Default for SweepGrid {
    fn default() -> Self {
        SweepGrid {
            population_sizes: vec![50, 100],
            generation_counts: vec![50, 100],
            mutation_rates: vec![0.05, 0.1],
            crossover_rates: vec![0.7, 0.9],
            elitism_sizes: vec![2, 5],
            selections: vec![
                Selection::Tournament(TournamentSize::default()),
                Selection::RouletteWheel,
                Selection::RankBased,
            ],
            crossovers: vec![
                Crossover::Pmx,
                Crossover::FastOrderedMapped,
                Crossover::Ordered,
                Crossover::Cycle,
            ],
            mutations: vec![Mutation::Swap, Mutation::Displacement, Mutation::Inversion],
            sharing_sigma: None,
        }
    }
}

impl SweepGrid {
    /// Number of combinations in the grid
    pub fn len(&self) -> usize {
        self.population_sizes.len()
            * self.generation_counts.len()
            * self.mutation_rates.len()
            * self.crossover_rates.len()
            * self.elitism_sizes.len()
            * self.selections.len()
            * self.crossovers.len()
            * self.mutations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every combination as a run configuration, without a seed
    pub fn combinations(&self) -> Vec<GAConfig> {
        let mut configs = Vec::with_capacity(self.len());
        for &population_size in &self.population_sizes {
            for &num_generations in &self.generation_counts {
                for &mutation_rate in &self.mutation_rates {
                    for &crossover_rate in &self.crossover_rates {
                        for &elitism_size in &self.elitism_sizes {
                            for &selection in &self.selections {
                                for &crossover in &self.crossovers {
                                    for &mutation in &self.mutations {
                                        configs.push(GAConfig {
                                            population_size,
                                            num_generations,
                                            mutation_rate,
                                            crossover_rate,
                                            elitism_size,
                                            sharing_sigma: self.sharing_sigma,
                                            record_history: false,
                                            ..GAConfig::with_strategies(selection, crossover, mutation)
                                        });
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
        configs
    }
}

/// Sweep configuration
#[derive(Debug, Clone)]
pub struct SweepConfig {
    /// Seeds per combination
    pub num_runs: usize,
    /// First seed; run `r` uses `base_seed + r`
    pub base_seed: u64,
    pub generator: MatrixGenerator,
}

impl Default for SweepConfig {
    fn default() -> Self {
        SweepConfig {
            num_runs: 5,
            base_seed: 1,
            generator: MatrixGenerator::default(),
        }
    }
}

/// Result of one run of one combination
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    pub combination: usize,
    pub seed: u64,
    pub population_size: usize,
    pub num_generations: usize,
    pub mutation_rate: f64,
    pub crossover_rate: f64,
    pub elitism_size: usize,
    pub selection: String,
    pub crossover: String,
    pub mutation: String,
    pub best_fitness: i64,
    pub took_shortcut: bool,
    /// Computation time in seconds
    pub time: f64,
}

/// Aggregated statistics for a combination
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombinationStatistics {
    pub combination: usize,
    pub population_size: usize,
    pub num_generations: usize,
    pub mutation_rate: f64,
    pub crossover_rate: f64,
    pub elitism_size: usize,
    pub selection: String,
    pub crossover: String,
    pub mutation: String,
    pub runs: usize,
    pub mean_fitness: f64,
    /// Sample standard deviation; 0 for a single run
    pub std_fitness: f64,
    pub best_fitness: i64,
    pub worst_fitness: i64,
    pub mean_time: f64,
}

/// Sweep engine
pub struct Sweep {
    config: SweepConfig,
    combinations: Vec<GAConfig>,
    results: Vec<RunResult>,
}

impl Sweep {
    pub fn new(grid: &SweepGrid, config: SweepConfig) -> Self {
        Sweep {
            config,
            combinations: grid.combinations(),
            results: Vec::new(),
        }
    }

    /// Total number of runs the sweep will perform
    pub fn total_runs(&self) -> usize {
        self.combinations.len() * self.config.num_runs
    }

    /// Run one combination over every seed.
    pub fn run_combination(&mut self, index: usize) -> Result<()> {
        for r in 0..self.config.num_runs {
            let result = self.run_single(index, self.config.base_seed + r as u64)?;
            self.results.push(result);
        }
        Ok(())
    }

    /// Run every combination; `on_run` is called after each finished run.
    pub fn run_all<F: FnMut(&RunResult)>(&mut self, mut on_run: F) -> Result<()> {
        log::info!(
            "Running sweep: {} combinations x {} seeds",
            self.combinations.len(),
            self.config.num_runs
        );

        for index in 0..self.combinations.len() {
            for r in 0..self.config.num_runs {
                let result = self.run_single(index, self.config.base_seed + r as u64)?;
                on_run(&result);
                self.results.push(result);
            }
        }
        Ok(())
    }

    fn run_single(&self, index: usize, seed: u64) -> Result<RunResult> {
        let config = GAConfig {
            seed: Some(seed),
            ..self.combinations[index].clone()
        };
        let outcome = evolve(&config, None, &self.config.generator)?;

        log::debug!(
            "combination {} seed {}: best {}",
            index,
            seed,
            outcome.best_fitness
        );

        let (selection, crossover, mutation) = strategy_names(&config);
        Ok(RunResult {
            combination: index,
            seed,
            population_size: config.population_size,
            num_generations: config.num_generations,
            mutation_rate: config.mutation_rate,
            crossover_rate: config.crossover_rate,
            elitism_size: config.elitism_size,
            selection,
            crossover,
            mutation,
            best_fitness: outcome.best_fitness,
            took_shortcut: outcome.took_shortcut,
            time: outcome.computation_time,
        })
    }

    /// Compute statistics for each combination, best mean first
    pub fn compute_statistics(&self) -> Vec<CombinationStatistics> {
        let mut by_combination: BTreeMap<usize, Vec<&RunResult>> = BTreeMap::new();
        for result in &self.results {
            by_combination.entry(result.combination).or_default().push(result);
        }

        let mut statistics: Vec<CombinationStatistics> = by_combination
            .into_iter()
            .map(|(combination, runs)| {
                let fitness: Vec<f64> = runs.iter().map(|r| r.best_fitness as f64).collect();
                let times: Vec<f64> = runs.iter().map(|r| r.time).collect();
                let first = runs[0];

                CombinationStatistics {
                    combination,
                    population_size: first.population_size,
                    num_generations: first.num_generations,
                    mutation_rate: first.mutation_rate,
                    crossover_rate: first.crossover_rate,
                    elitism_size: first.elitism_size,
                    selection: first.selection.clone(),
                    crossover: first.crossover.clone(),
                    mutation: first.mutation.clone(),
                    runs: runs.len(),
                    mean_fitness: fitness.iter().mean(),
                    std_fitness: if fitness.len() > 1 { fitness.iter().std_dev() } else { 0.0 },
                    best_fitness: runs.iter().map(|r| r.best_fitness).fold(i64::MIN, i64::max),
                    worst_fitness: runs.iter().map(|r| r.best_fitness).fold(i64::MAX, i64::min),
                    mean_time: times.iter().mean(),
                }
            })
            .collect();

        statistics.sort_by(|a, b| b.mean_fitness.total_cmp(&a.mean_fitness));
        statistics
    }

    /// Combination with the highest mean best fitness
    pub fn best_combination(&self) -> Option<CombinationStatistics> {
        self.compute_statistics().into_iter().next()
    }

    /// Export results to CSV
    pub fn export_to_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = csv::Writer::from_writer(file);

        for result in &self.results {
            writer.serialize(result)?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Export statistics to CSV
    pub fn export_statistics_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = csv::Writer::from_writer(file);

        for stat in self.compute_statistics() {
            writer.serialize(stat)?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Generate summary report
    pub fn generate_report(&self) -> String {
        let mut report = String::new();

        report.push_str("========================================\n");
        report.push_str("       Route GA Sweep Report\n");
        report.push_str("========================================\n");
        report.push_str(&format!(
            "Generated: {}\n",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
        ));
        report.push_str(&format!(
            "Combinations: {}  Seeds per combination: {}  Runs: {}\n\n",
            self.combinations.len(),
            self.config.num_runs,
            self.results.len()
        ));

        let stats = self.compute_statistics();

        report.push_str("Top Combinations:\n");
        report.push_str("-".repeat(100).as_str());
        report.push('\n');
        report.push_str(&format!(
            "{:<5} {:>5} {:>5} {:>6} {:>6} {:>4} {:<11} {:<5} {:<13} {:>10} {:>9} {:>8}\n",
            "#", "Pop", "Gen", "Mut", "Cx", "Eli", "Selection", "Cross", "Mutation", "Mean", "Std", "Best"
        ));
        report.push_str("-".repeat(100).as_str());
        report.push('\n');

        for stat in stats.iter().take(20) {
            report.push_str(&format!(
                "{:<5} {:>5} {:>5} {:>6.2} {:>6.2} {:>4} {:<11} {:<5} {:<13} {:>10.2} {:>9.2} {:>8}\n",
                stat.combination,
                stat.population_size,
                stat.num_generations,
                stat.mutation_rate,
                stat.crossover_rate,
                stat.elitism_size,
                stat.selection,
                stat.crossover,
                stat.mutation,
                stat.mean_fitness,
                stat.std_fitness,
                stat.best_fitness
            ));
        }

        report.push_str("-".repeat(100).as_str());
        report.push('\n');

        if let Some(best) = stats.first() {
            report.push_str(&format!(
                "\nOverall best combination: #{} (mean fitness {:.2} over {} runs)\n",
                best.combination, best.mean_fitness, best.runs
            ));
        }

        report
    }

    /// Get all results
    pub fn results(&self) -> &[RunResult] {
        &self.results
    }
}

fn strategy_names(config: &GAConfig) -> (String, String, String) {
    let selection = match config.selection {
        Some(Selection::Tournament(TournamentSize::Fixed(k))) => format!("tournament-{}", k),
        Some(Selection::Tournament(TournamentSize::Random { min, max })) => {
            format!("tournament-{}..{}", min, max)
        }
        Some(other) => other.name().to_string(),
        None => "-".to_string(),
    };
    (
        selection,
        config.crossover.map_or("-", |c| c.name()).to_string(),
        config.mutation.map_or("-", |m| m.name()).to_string(),
    )
}
