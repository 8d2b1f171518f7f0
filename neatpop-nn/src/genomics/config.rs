use crate::genomics::ActivationType;

use serde::{Deserialize, Serialize};

use std::num::NonZeroUsize;

/// Configuration data for genome generation,
/// mating, and genetic distance.
///
/// Mutation rates are not part of this configuration:
/// a population decides when a genome mutates.
///
/// # Note
/// All quantities expressing probabilities
/// should be in the range [0.0, 1.0].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeneticConfig {
    /// Number of inputs in a genome.
    pub input_count: NonZeroUsize,
    /// Number of outputs in a genome.
    pub output_count: NonZeroUsize,
    /// Possible activation types for hidden nodes.
    /// If empty, hidden nodes default to [`Sigmoid`].
    ///
    /// [`Sigmoid`]: crate::genomics::ActivationType
    pub activation_types: Vec<ActivationType>,
    /// Activation types of output nodes, by output index.
    /// Missing entries default to [`Sigmoid`].
    ///
    /// [`Sigmoid`]: crate::genomics::ActivationType
    pub output_activation_types: Vec<ActivationType>,
    /// Chance that common gene weights are averaged during mating,
    /// instead of copying the weight from a randomly chosen parent.
    pub mate_by_averaging_chance: f32,
    /// Chance that a child's suppressed gene is expressed again.
    pub suppression_reset_chance: f32,
    /// Chance that a gene between an input-output node pair
    /// is created during initial genome generation.
    pub initial_expression_chance: f32,
    /// Maximum magnitude of a newly created gene's weight.
    pub weight_bound: f32,
    /// Number of candidate input nodes tried by a
    /// connection addition before it gives up.
    pub max_gene_addition_mutation_attempts: usize,
    /// Chance that a connection addition creates a
    /// self-loop, if possible.
    pub recursion_chance: f32,
    /// Weight of excess genes in genetic distance.
    pub excess_gene_factor: f32,
    /// Weight of disjoint genes in genetic distance.
    pub disjoint_gene_factor: f32,
    /// Weight of the common gene weight average in genetic distance.
    pub common_weight_factor: f32,
}

impl GeneticConfig {
    /// Returns a "zero-valued" configuration: every value
    /// is 0 or empty, and the input and output counts are 1.
    ///
    /// Meant for filling in unused fields, not for experiments.
    ///
    /// # Examples
    /// ```
    /// use neatpop_nn::genomics::GeneticConfig;
    ///
    /// let config = GeneticConfig {
    ///     recursion_chance: 1.0,
    ///     ..GeneticConfig::zero()
    /// };
    /// assert_eq!(config.input_count.get(), 1);
    /// ```
    pub const fn zero() -> GeneticConfig {
        GeneticConfig {
            input_count: NonZeroUsize::MIN,
            output_count: NonZeroUsize::MIN,
            activation_types: vec![],
            output_activation_types: vec![],
            mate_by_averaging_chance: 0.0,
            suppression_reset_chance: 0.0,
            initial_expression_chance: 0.0,
            weight_bound: 0.0,
            max_gene_addition_mutation_attempts: 0,
            recursion_chance: 0.0,
            excess_gene_factor: 0.0,
            disjoint_gene_factor: 0.0,
            common_weight_factor: 0.0,
        }
    }
}
