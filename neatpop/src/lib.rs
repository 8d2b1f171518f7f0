//! A population manager for NeuroEvolution of Augmenting Topologies,
//! following the 2002 paper: <http://nn.cs.utexas.edu/keyword?stanley:ec02>
//!
//! The [`Population`] drives the generational loop: it scores genomes,
//! clusters them into species by genetic distance, tracks stagnation
//! for the whole population and for each species, culls the weakest,
//! and splits the next generation between species in proportion to
//! their shared fitness. Genomes are user-defined via the [`Genome`]
//! trait; a neural network-based genome is supplied by the
//! `neatpop-nn` crate.
//!
//! Fitness can be assigned by hand with [`Population::evaluate_fitness`],
//! or computed against a dataset by an [`Evaluator`](evaluation::Evaluator),
//! which scores the population in parallel.
//!
//! # Example usage: Evolution of XOR function approximator, using `neatpop-nn`
//! ```
//! use neatpop::evaluation::{Cost, Evaluator, Sample};
//! use neatpop::{Population, PopulationConfig};
//! use neatpop_nn::genomics::{ActivationType, GeneticConfig, NNGenome};
//! use std::num::NonZeroUsize;
//!
//! let genetic_config = GeneticConfig {
//!     input_count: NonZeroUsize::new(3).unwrap(),
//!     output_count: NonZeroUsize::new(1).unwrap(),
//!     activation_types: vec![ActivationType::Sigmoid],
//!     output_activation_types: vec![ActivationType::Sigmoid],
//!     mate_by_averaging_chance: 0.4,
//!     suppression_reset_chance: 1.0,
//!     initial_expression_chance: 1.0,
//!     weight_bound: 1.0,
//!     max_gene_addition_mutation_attempts: 20,
//!     excess_gene_factor: 1.0,
//!     disjoint_gene_factor: 1.0,
//!     common_weight_factor: 0.4,
//!     ..GeneticConfig::zero()
//! };
//!
//! let dataset = vec![
//!     Sample::new(vec![1.0, 0.0, 0.0], vec![0.0]),
//!     Sample::new(vec![1.0, 0.0, 1.0], vec![1.0]),
//!     Sample::new(vec![1.0, 1.0, 0.0], vec![1.0]),
//!     Sample::new(vec![1.0, 1.0, 1.0], vec![0.0]),
//! ];
//!
//! let population_config = PopulationConfig {
//!     size: NonZeroUsize::new(50).unwrap(),
//!     ..PopulationConfig::default()
//! };
//!
//! let mut population = Population::<_, _, NNGenome>::new(population_config, genetic_config)
//!     .with_evaluator(Evaluator::new(dataset).with_cost(Cost::Mse));
//! for _ in 0..10 {
//!     if let Err(e) = population.evolve() {
//!         eprintln!("{}", e);
//!         break;
//!     }
//! }
//! if let Some(best) = population.all_time_best() {
//!     println!("Best fitness: {}", best.fitness);
//! }
//! ```

pub mod evaluation;
mod genome;
mod populations;

pub use genome::*;
pub use populations::*;
