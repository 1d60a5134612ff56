//! Geo-Route GA - Command Line Interface
//!
//! Evolves Hallownest routes, sweeps GA settings and inspects score matrices.

use clap::{Parser, Subcommand, ValueEnum};
use geo_route_ga::benchmark::{Sweep, SweepConfig, SweepGrid};
use geo_route_ga::constraints::OrderingMode;
use geo_route_ga::heuristics::population::random_route;
use geo_route_ga::heuristics::{Crossover, GAConfig, LocalSearch, Mutation, Selection, TournamentSize, TwoOptSearch};
use geo_route_ga::instance::{CostMatrix, LocationSet, MatrixGenerator, RouteProblem};
use geo_route_ga::visualization::Visualizer;
use geo_route_ga::EvolutionResult;

use indicatif::{ProgressBar, ProgressStyle};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use statrs::statistics::Statistics;

use std::fmt::Display;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "geo-route-ga")]
#[command(version = "1.0")]
#[command(about = "A genetic algorithm for high-scoring routes across Hallownest")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evolve a route on a generated or loaded matrix
    Evolve {
        /// JSON configuration used as the base for every other flag
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Score matrix CSV; a matrix is generated when absent
        #[arg(short, long)]
        matrix: Option<PathBuf>,

        /// Home label of the matrix CSV
        #[arg(long, default_value = "D")]
        home: String,

        #[arg(short, long, value_enum, required_unless_present = "config")]
        selection: Option<SelectionArg>,

        #[arg(short = 'x', long, value_enum, required_unless_present = "config")]
        crossover: Option<CrossoverArg>,

        #[arg(short = 'u', long, value_enum, required_unless_present = "config")]
        mutation: Option<MutationArg>,

        /// Fixed tournament size (random in --tournament-min..=--tournament-max otherwise)
        #[arg(long)]
        tournament_size: Option<usize>,

        #[arg(long, default_value = "3")]
        tournament_min: usize,

        #[arg(long, default_value = "6")]
        tournament_max: usize,

        #[arg(short, long)]
        population_size: Option<usize>,

        #[arg(short, long)]
        generations: Option<usize>,

        #[arg(long)]
        crossover_rate: Option<f64>,

        #[arg(long)]
        mutation_rate: Option<f64>,

        /// Number of elites copied into every generation
        #[arg(long)]
        elitism_size: Option<usize>,

        /// Disable elitism
        #[arg(long)]
        no_elitism: bool,

        /// Enable fitness sharing with this niche radius
        #[arg(long)]
        sharing_sigma: Option<f64>,

        /// Skip 2-opt refinement of children
        #[arg(long)]
        no_local_search: bool,

        /// Accepted 2-opt moves per child
        #[arg(long)]
        two_opt_iterations: Option<usize>,

        /// Repair rule violations in the initial population
        #[arg(long)]
        repair: bool,

        /// Forbid City Storerooms anywhere after Queen's Gardens, not only right after
        #[arg(long)]
        forbid_anywhere: bool,

        /// Random seed
        #[arg(long)]
        seed: Option<u64>,

        /// Lower bound of generated scores
        #[arg(long, default_value = "-500", allow_hyphen_values = true)]
        min_value: i64,

        /// Upper bound of generated scores
        #[arg(long, default_value = "500")]
        max_value: i64,

        /// Write the result as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Directory for route and history drawings
        #[arg(long)]
        visualize: Option<PathBuf>,

        /// Log every generation
        #[arg(short, long)]
        verbose: bool,
    },

    /// Sweep GA settings over several seeds
    Sweep {
        /// Output directory for results
        #[arg(short, long, default_value = "results")]
        output: PathBuf,

        /// Seeds per combination
        #[arg(short, long, default_value = "5")]
        runs: usize,

        /// First seed
        #[arg(long, default_value = "1")]
        seed: u64,

        /// Small grid: one value per numeric setting, every operator
        #[arg(long)]
        quick: bool,

        /// Fitness sharing radius applied to every combination
        #[arg(long)]
        sharing_sigma: Option<f64>,

        #[arg(long, default_value = "-500", allow_hyphen_values = true)]
        min_value: i64,

        #[arg(long, default_value = "500")]
        max_value: i64,
    },

    /// Analyze a score matrix
    Analyze {
        /// Score matrix CSV; a matrix is generated when absent
        #[arg(short, long)]
        matrix: Option<PathBuf>,

        #[arg(long, default_value = "D")]
        home: String,

        #[arg(long, default_value = "42")]
        seed: u64,

        #[arg(long, default_value = "-500", allow_hyphen_values = true)]
        min_value: i64,

        #[arg(long, default_value = "500")]
        max_value: i64,
    },

    /// Generate a score matrix and write it as CSV
    Generate {
        #[arg(short, long, default_value = "matrix.csv")]
        output: PathBuf,

        #[arg(long)]
        seed: Option<u64>,

        #[arg(long, default_value = "-500", allow_hyphen_values = true)]
        min_value: i64,

        #[arg(long, default_value = "500")]
        max_value: i64,

        /// Probability that an edge score is forced negative
        #[arg(long, default_value = "0.07")]
        negative_probability: f64,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
enum SelectionArg {
    /// Fitness-proportional roulette wheel
    Roulette,
    /// Linear rank weights
    Rank,
    /// Best of a random tournament
    Tournament,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
enum CrossoverArg {
    /// Partially mapped crossover
    Pmx,
    /// Order crossover
    Ox,
    /// Fast ordered mapped crossover
    Fomx,
    /// Cycle crossover
    Cx,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
enum MutationArg {
    Swap,
    Inversion,
    Scramble,
    Displacement,
}

impl CrossoverArg {
    fn to_crossover(self) -> Crossover {
        match self {
            CrossoverArg::Pmx => Crossover::Pmx,
            CrossoverArg::Ox => Crossover::Ordered,
            CrossoverArg::Fomx => Crossover::FastOrderedMapped,
            CrossoverArg::Cx => Crossover::Cycle,
        }
    }
}

impl MutationArg {
    fn to_mutation(self) -> Mutation {
        match self {
            MutationArg::Swap => Mutation::Swap,
            MutationArg::Inversion => Mutation::Inversion,
            MutationArg::Scramble => Mutation::Scramble,
            MutationArg::Displacement => Mutation::Displacement,
        }
    }
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Evolve {
            config,
            matrix,
            home,
            selection,
            crossover,
            mutation,
            tournament_size,
            tournament_min,
            tournament_max,
            population_size,
            generations,
            crossover_rate,
            mutation_rate,
            elitism_size,
            no_elitism,
            sharing_sigma,
            no_local_search,
            two_opt_iterations,
            repair,
            forbid_anywhere,
            seed,
            min_value,
            max_value,
            output,
            visualize,
            verbose,
        } => {
            let mut ga_config = match &config {
                Some(path) => GAConfig::from_json_file(path).unwrap_or_else(|e| fail("loading configuration", e)),
                None => GAConfig::default(),
            };

            if let Some(selection) = selection {
                let size = match tournament_size {
                    Some(k) => TournamentSize::Fixed(k),
                    None => TournamentSize::Random {
                        min: tournament_min,
                        max: tournament_max,
                    },
                };
                ga_config.selection = Some(match selection {
                    SelectionArg::Roulette => Selection::RouletteWheel,
                    SelectionArg::Rank => Selection::RankBased,
                    SelectionArg::Tournament => Selection::Tournament(size),
                });
            }
            if let Some(crossover) = crossover {
                ga_config.crossover = Some(crossover.to_crossover());
            }
            if let Some(mutation) = mutation {
                ga_config.mutation = Some(mutation.to_mutation());
            }
            if let Some(v) = population_size {
                ga_config.population_size = v;
            }
            if let Some(v) = generations {
                ga_config.num_generations = v;
            }
            if let Some(v) = crossover_rate {
                ga_config.crossover_rate = v;
            }
            if let Some(v) = mutation_rate {
                ga_config.mutation_rate = v;
            }
            if let Some(v) = elitism_size {
                ga_config.elitism_size = v;
            }
            if no_elitism {
                ga_config.elitism = false;
            }
            if sharing_sigma.is_some() {
                ga_config.sharing_sigma = sharing_sigma;
            }
            if no_local_search {
                ga_config.local_search = false;
            }
            if let Some(v) = two_opt_iterations {
                ga_config.two_opt_max_iterations = v;
            }
            if repair {
                ga_config.repair_initial = true;
            }
            if forbid_anywhere {
                ga_config.forbidden_ordering = OrderingMode::Anywhere;
            }
            if seed.is_some() {
                ga_config.seed = seed;
            }
            if verbose {
                ga_config.verbose = true;
            }

            let matrix = matrix.map(|path| load_matrix(&path, &home));
            let generator = MatrixGenerator::with_bounds(min_value, max_value);
            run_evolve(&ga_config, matrix, &generator, output, visualize);
        }

        Commands::Sweep {
            output,
            runs,
            seed,
            quick,
            sharing_sigma,
            min_value,
            max_value,
        } => {
            let grid = if quick { quick_grid() } else { SweepGrid::default() };
            let grid = SweepGrid { sharing_sigma, ..grid };
            let config = SweepConfig {
                num_runs: runs,
                base_seed: seed,
                generator: MatrixGenerator::with_bounds(min_value, max_value),
            };
            run_sweep(&grid, config, &output);
        }

        Commands::Analyze {
            matrix,
            home,
            seed,
            min_value,
            max_value,
        } => {
            let matrix = match matrix {
                Some(path) => load_matrix(&path, &home),
                None => generate_matrix(&MatrixGenerator::with_bounds(min_value, max_value), Some(seed)),
            };
            analyze_matrix(matrix, seed);
        }

        Commands::Generate {
            output,
            seed,
            min_value,
            max_value,
            negative_probability,
        } => {
            let generator = MatrixGenerator {
                negative_probability,
                ..MatrixGenerator::with_bounds(min_value, max_value)
            };
            let matrix = generate_matrix(&generator, seed);
            matrix
                .to_csv(&output)
                .unwrap_or_else(|e| fail("writing matrix", e));
            println!("Matrix saved to {:?}", output);
            println!("{}", matrix.statistics());
        }
    }
}

fn fail<E: Display>(context: &str, e: E) -> ! {
    eprintln!("Error {}: {}", context, e);
    std::process::exit(1);
}

fn load_matrix(path: &Path, home: &str) -> CostMatrix {
    println!("Loading matrix from {:?}...", path);
    CostMatrix::from_csv(path, home).unwrap_or_else(|e| fail("loading matrix", e))
}

fn generate_matrix(generator: &MatrixGenerator, seed: Option<u64>) -> CostMatrix {
    let mut rng = match seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    };
    generator
        .generate(&LocationSet::hallownest(), &mut rng)
        .unwrap_or_else(|e| fail("generating matrix", e))
}

fn quick_grid() -> SweepGrid {
    SweepGrid {
        population_sizes: vec![30],
        generation_counts: vec![20],
        mutation_rates: vec![0.05],
        crossover_rates: vec![0.8],
        elitism_sizes: vec![2],
        ..SweepGrid::default()
    }
}

fn run_evolve(
    config: &GAConfig,
    matrix: Option<CostMatrix>,
    generator: &MatrixGenerator,
    output: Option<PathBuf>,
    visualize: Option<PathBuf>,
) {
    println!(
        "Evolving {} individuals for {} generations...",
        config.population_size, config.num_generations
    );

    let result = geo_route_ga::evolve(config, matrix, generator).unwrap_or_else(|e| fail("evolving", e));

    println!("\n========== Results ==========");
    print!("{}", result);

    let problem = RouteProblem::from_matrix_with_ordering(result.matrix.clone(), config.forbidden_ordering)
        .unwrap_or_else(|e| fail("building problem", e));
    let report = problem.rules.check(&result.best_route);
    if report.all() {
        println!("  All route rules satisfied");
    } else {
        println!("  Violated rules: {}", report.failed().join(", "));
    }

    if let Some(out_path) = output {
        let json = serde_json::to_string_pretty(&result).unwrap_or_else(|e| fail("serializing result", e));
        std::fs::write(&out_path, json).unwrap_or_else(|e| fail("writing output", e));
        println!("\nResult saved to {:?}", out_path);
    }

    if let Some(dir) = visualize {
        std::fs::create_dir_all(&dir).unwrap_or_else(|e| fail("creating visualization directory", e));
        save_drawings(&problem, &result, &dir);
    }
}

fn save_drawings(problem: &RouteProblem, result: &EvolutionResult, dir: &Path) {
    let viz = Visualizer::new();
    let mut drawings = vec![("route", viz.generate_route_svg(problem, &result.best_route))];
    if let Some(history) = &result.history {
        drawings.push(("fitness", viz.generate_fitness_history_svg(history)));
        drawings.push(("diversity", viz.generate_diversity_svg(history)));
    }

    for (name, svg) in drawings {
        let png_path = dir.join(format!("{}.png", name));
        match viz.save_png(&svg, &png_path) {
            Ok(()) => println!("Visualization saved to {:?}", png_path),
            Err(e) => {
                let svg_path = dir.join(format!("{}.svg", name));
                viz.save_svg(&svg, &svg_path).unwrap_or_else(|e| fail("saving SVG", e));
                println!("PNG conversion failed ({}). Saved SVG to {:?}", e, svg_path);
            }
        }
    }
}

fn run_sweep(grid: &SweepGrid, config: SweepConfig, output: &Path) {
    std::fs::create_dir_all(output).unwrap_or_else(|e| fail("creating output directory", e));

    let mut sweep = Sweep::new(grid, config);
    println!("Sweeping {} combinations ({} runs)...", grid.len(), sweep.total_runs());

    let progress = ProgressBar::new(sweep.total_runs() as u64);
    progress.set_style(
        ProgressStyle::with_template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    sweep
        .run_all(|run| {
            progress.set_message(format!("#{} seed {}: {}", run.combination, run.seed, run.best_fitness));
            progress.inc(1);
        })
        .unwrap_or_else(|e| fail("running sweep", e));
    progress.finish_with_message("done");

    let results_path = output.join("results.csv");
    sweep
        .export_to_csv(&results_path)
        .unwrap_or_else(|e| fail("exporting results", e));
    println!("\nResults exported to {:?}", results_path);

    let stats_path = output.join("statistics.csv");
    sweep
        .export_statistics_csv(&stats_path)
        .unwrap_or_else(|e| fail("exporting statistics", e));
    println!("Statistics exported to {:?}", stats_path);

    let report = sweep.generate_report();
    println!("\n{}", report);

    let report_path = output.join("report.txt");
    std::fs::write(&report_path, &report).unwrap_or_else(|e| fail("saving report", e));
    println!("Report saved to {:?}", report_path);
}

fn analyze_matrix(matrix: CostMatrix, seed: u64) {
    println!("========== Matrix Analysis ==========\n");
    println!("{}", matrix.statistics());

    let locations = matrix.locations();
    println!("Best outgoing edge per location:");
    for (i, row) in matrix.rows().iter().enumerate() {
        let best = row
            .iter()
            .enumerate()
            .filter(|&(j, _)| j != i)
            .fold(None, |best: Option<(usize, i64)>, (j, &v)| match best {
                Some((_, b)) if b >= v => best,
                _ => Some((j, v)),
            });
        if let Some((j, v)) = best {
            println!("  {:<4} -> {:<4} {}", locations.label(i), locations.label(j), v);
        }
    }

    let problem = RouteProblem::from_matrix(matrix).unwrap_or_else(|e| fail("building problem", e));
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let two_opt = TwoOptSearch::new();

    let samples = 100;
    let mut random_scores = Vec::with_capacity(samples);
    let mut refined_scores = Vec::with_capacity(samples);
    let mut valid = 0;
    for _ in 0..samples {
        let route = random_route(&problem, &mut rng);
        if problem.is_valid(&route) {
            valid += 1;
        }
        random_scores.push(problem.evaluate(&route).score as f64);
        refined_scores.push(problem.evaluate(&two_opt.refine(&problem, &route)).score as f64);
    }

    let best_refined = refined_scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    println!("\nQuick Route Estimates ({} random routes):", samples);
    println!("  Valid routes: {}", valid);
    println!(
        "  Random: mean {:.2} (std {:.2})",
        random_scores.iter().mean(),
        random_scores.iter().std_dev()
    );
    println!(
        "  Random + {}: mean {:.2}, best {}",
        two_opt.name(),
        refined_scores.iter().mean(),
        best_refined
    );
}
