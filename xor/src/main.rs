use neatpop::evaluation::{Cost, EvaluationError, Evaluator, Sample};
use neatpop::logging::{EvolutionLogger, ReportingLevel, Stats};
use neatpop::{Genome, Population, PopulationConfig};
use neatpop_nn::genomics::{ActivationType, GeneticConfig, History, NNGenome};
use neatpop_nn::networks::FunctionApproximatorNetwork;

use rayon::prelude::*;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use std::error::Error;
use std::fs;
use std::num::NonZeroUsize;

/// Allowed error margin for neural net answers.
const ERROR_MARGIN: f32 = 0.3;
/// Fitness of a network that answers every case within the margin.
const PERFECT_FITNESS: f32 = 16.0;
const MAX_GENERATIONS: usize = 100;
const ITERATIONS: usize = 200;

type XorPopulation = Population<GeneticConfig, History, NNGenome>;

fn dataset() -> Vec<Sample> {
    // The first input is a constant bias.
    vec![
        Sample::new(vec![1.0, 0.0, 0.0], vec![0.0]),
        Sample::new(vec![1.0, 0.0, 1.0], vec![1.0]),
        Sample::new(vec![1.0, 1.0, 0.0], vec![1.0]),
        Sample::new(vec![1.0, 1.0, 1.0], vec![0.0]),
    ]
}

/// Scores `(4 - total error)²`, ignoring errors within the margin.
fn xor_fitness(genome: &NNGenome, dataset: &[Sample], _: Cost) -> Result<f32, EvaluationError> {
    let mut network = FunctionApproximatorNetwork::<1>::from(genome);
    let error: f32 = dataset
        .iter()
        .map(|sample| {
            let error = (network.evaluate_at(&sample.inputs)[0] - sample.outputs[0]).abs();
            if error < ERROR_MARGIN {
                0.0
            } else {
                error
            }
        })
        .sum();
    Ok((dataset.len() as f32 - error).powi(2))
}

fn genetic_config() -> GeneticConfig {
    GeneticConfig {
        input_count: NonZeroUsize::new(3).unwrap(),
        output_count: NonZeroUsize::new(1).unwrap(),
        activation_types: vec![ActivationType::Sigmoid],
        output_activation_types: vec![ActivationType::Sigmoid],
        mate_by_averaging_chance: 0.4,
        suppression_reset_chance: 1.0,
        initial_expression_chance: 1.0,
        weight_bound: 5.0,
        max_gene_addition_mutation_attempts: 20,
        recursion_chance: 0.0,
        excess_gene_factor: 1.0,
        disjoint_gene_factor: 1.0,
        common_weight_factor: 0.4,
    }
}

/// Reads a RON-encoded `PopulationConfig` from the path given as
/// the first argument, or falls back to the defaults.
fn population_config() -> Result<PopulationConfig, Box<dyn Error>> {
    match std::env::args().nth(1) {
        Some(path) => {
            let config: PopulationConfig = ron::from_str(&fs::read_to_string(&path)?)?;
            config.validate()?;
            info!(%path, "loaded population configuration");
            Ok(config)
        }
        None => Ok(PopulationConfig::default()),
    }
}

fn solved(fitness: Option<f32>) -> bool {
    fitness.map_or(false, |f| f >= PERFECT_FITNESS)
}

/// Evolves one population until it solves XOR, returning the
/// generation count, or `None` if it fails.
fn run(genetic_config: &GeneticConfig, population_config: &PopulationConfig) -> Option<usize> {
    let evaluator = Evaluator::new(dataset()).with_fitness_fn(xor_fitness);
    let mut population = XorPopulation::new(population_config.clone(), genetic_config.clone())
        .with_evaluator(evaluator);
    for _ in 0..MAX_GENERATIONS {
        if let Err(e) = population.evolve() {
            warn!(error = %e, generation = population.generation(), "run aborted");
            return None;
        }
        if solved(population.all_time_best().map(|best| best.fitness)) {
            return Some(population.generation());
        }
    }
    None
}

/// Repeats independent runs in parallel and reports how
/// many generations successful runs took.
fn stress_test(genetic_config: &GeneticConfig, population_config: &PopulationConfig) {
    let generations: Vec<Option<usize>> = (0..ITERATIONS)
        .into_par_iter()
        .map(|_| run(genetic_config, population_config))
        .collect();

    let failures = generations.iter().filter(|g| g.is_none()).count();
    let stats = Stats::from(generations.iter().flatten().map(|g| *g as f32));
    info!(
        ?stats,
        failure_rate = failures as f32 * 100.0 / ITERATIONS as f32,
        iterations = ITERATIONS,
        "stress test finished"
    );
}

/// Evolves a single logged population, checkpointing it
/// halfway through, and prints the champion as RON.
fn champion_run(
    genetic_config: &GeneticConfig,
    population_config: &PopulationConfig,
) -> Result<(), Box<dyn Error>> {
    let evaluator = Evaluator::new(dataset()).with_fitness_fn(xor_fitness);
    let mut population = XorPopulation::new(population_config.clone(), genetic_config.clone())
        .with_evaluator(evaluator.clone());
    let mut logger = EvolutionLogger::new(ReportingLevel::SpeciesChampions);

    for generation in 0..MAX_GENERATIONS {
        population.evolve()?;
        population.evaluate()?;
        logger.log(
            &population,
            &|g: &NNGenome| [g.node_count() as f32, g.connection_count() as f32],
            ["nodes", "connections"],
        );
        // The all-time best only catches up on the next evolve.
        if solved(population.champion().and_then(Genome::fitness)) {
            break;
        }
        if generation == MAX_GENERATIONS / 2 {
            let mut buffer = vec![];
            population.save_checkpoint(&mut buffer)?;
            population = XorPopulation::load_checkpoint(buffer.as_slice())?;
            population.set_evaluator(Some(evaluator.clone()));
            info!(bytes = buffer.len(), "restored population from checkpoint");
        }
    }

    if let Some(log) = logger.last() {
        info!("{}", log);
    }
    let champion = population
        .champion()
        .filter(|g| solved(g.fitness()))
        .or_else(|| population.all_time_best().map(|best| &best.genome));
    if let Some(genome) = champion {
        println!("{}", ron::to_string(genome)?);
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let genetic_config = genetic_config();
    let population_config = population_config()?;

    stress_test(&genetic_config, &population_config);
    champion_run(&genetic_config, &population_config)
}
