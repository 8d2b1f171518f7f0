//! # neatpop-nn
//! A neural network-based implementation of the `neatpop` crate's `Genome` trait.
//!
//! Provides an [`NNGenome`] type usable in `neatpop` `Population`s, and two
//! neural network implementations which can be generated from an [`NNGenome`]:
//! - [`RealTimeNetwork`]: best suited for real-time control tasks, with new inputs
//!   set for each activation, and multiple time-steps involved.
//! - [`FunctionApproximatorNetwork`]: best suited for instantaneous
//!   single-output-per-input function approximation tasks.
//!
//! [`NNGenome`]: crate::genomics::NNGenome
//! [`RealTimeNetwork`]: crate::networks::RealTimeNetwork
//! [`FunctionApproximatorNetwork`]: crate::networks::FunctionApproximatorNetwork
//!
//! # Example usage: Evolution of XOR function approximator
//! ```
//! use neatpop::{Genome, Population, PopulationConfig};
//! use neatpop_nn::{
//!     genomics::{ActivationType, GeneticConfig, NNGenome},
//!     networks::FunctionApproximatorNetwork,
//! };
//! use std::num::NonZeroUsize;
//!
//! // Allowed error margin for neural net answers.
//! const ERROR_MARGIN: f32 = 0.3;
//!
//! fn evaluate_xor(genome: &NNGenome) -> f32 {
//!     let mut network = FunctionApproximatorNetwork::<1>::from(genome);
//!
//!     let values = [
//!         ([1.0, 0.0, 0.0], 0.0),
//!         ([1.0, 0.0, 1.0], 1.0),
//!         ([1.0, 1.0, 0.0], 1.0),
//!         ([1.0, 1.0, 1.0], 0.0),
//!     ];
//!
//!     let errors = values.iter().map(|(input, output)| {
//!         let error = (network.evaluate_at(input)[0] - output).abs();
//!         if error < ERROR_MARGIN { 0.0 } else { error }
//!     });
//!
//!     (4.0 - errors.sum::<f32>()).powf(2.0)
//! }
//!
//! let genetic_config = GeneticConfig {
//!     input_count: NonZeroUsize::new(3).unwrap(),
//!     output_count: NonZeroUsize::new(1).unwrap(),
//!     activation_types: vec![ActivationType::Sigmoid],
//!     output_activation_types: vec![ActivationType::Sigmoid],
//!     mate_by_averaging_chance: 0.4,
//!     suppression_reset_chance: 1.0,
//!     initial_expression_chance: 1.0,
//!     weight_bound: 5.0,
//!     max_gene_addition_mutation_attempts: 20,
//!     recursion_chance: 0.0,
//!     excess_gene_factor: 1.0,
//!     disjoint_gene_factor: 1.0,
//!     common_weight_factor: 0.4,
//! };
//!
//! let population_config = PopulationConfig {
//!     size: NonZeroUsize::new(150).unwrap(),
//!     ..PopulationConfig::default()
//! };
//!
//! let mut population = Population::<_, _, NNGenome>::new(population_config, genetic_config);
//! for _ in 0..20 {
//!     population.evaluate_fitness(evaluate_xor).unwrap();
//!     if let Some(champion) = population.champion() {
//!         if champion.fitness() == Some(16.0) {
//!             println!("Solution found: {}", champion);
//!             break;
//!         }
//!     }
//!     if let Err(e) = population.evolve() {
//!         eprintln!("{}", e);
//!         break;
//!     }
//! }
//! ```

pub mod genomics;
pub mod networks;

/// Identifier type used to designate historically
/// identical mutations for the purposes of
/// genome comparison and genetic tracking.
pub type Innovation = usize;
