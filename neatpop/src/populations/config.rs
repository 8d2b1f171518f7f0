use super::errors::ConfigurationError;
use super::selection::Selection;
use crate::genome::{Mutation, MutationError, StructuralLimit};
use crate::Genome;

use serde::{Deserialize, Serialize};

use std::num::NonZeroUsize;

/// Configuration data for population generation
/// and evolution.
///
/// # Note
/// All quantities expressing probabilities
/// should be in the range [0.0, 1.0]. This is
/// checked by [`validate`] at the start of every
/// generation.
///
/// [`validate`]: PopulationConfig::validate
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PopulationConfig {
    /// Size of the population.
    pub size: NonZeroUsize,
    /// Genetic distance threshold, beyond which
    /// genomes are considered as belonging to
    /// different species.
    pub distance_threshold: f32,
    /// Top % of each species which can participate
    /// in mating.
    pub survival_threshold: f32,
    /// Chance that offspring will be the result
    /// of sexual reproduction (as opposed to asexual).
    pub sexual_reproduction_chance: f32,
    /// How parents are picked from a species' breeding pool.
    pub selection: Selection,
    /// Generations the whole population may go without
    /// improving before only the top two species reproduce.
    pub stagnant_limit: usize,
    /// Generations a species may go without improving
    /// before it is removed.
    pub species_stagnant_limit: usize,
    /// Mutation policy applied to offspring.
    pub mutation: MutationConfig,
}

/// Rates and constraints of the offspring mutation policy.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MutationConfig {
    /// Chance of a node addition.
    pub node_addition_chance: f32,
    /// Chance of a connection addition.
    pub connection_addition_chance: f32,
    /// Chance of all weights being perturbed.
    pub weight_mutation_chance: f32,
    /// Per-connection chance of a nudge, as opposed to a reset.
    pub weight_nudge_chance: f32,
    /// Maximum magnitude of a weight nudge.
    pub weight_nudge_power: f32,
    /// Maximum magnitude of a weight.
    pub weight_bound: f32,
    /// Structural mutations the population may apply.
    pub allowed: Vec<Mutation>,
    /// Caps on genome size.
    pub limits: StructuralLimits,
}

/// Caps on the structure of mutated genomes.
/// `None` means unbounded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StructuralLimits {
    pub max_nodes: Option<usize>,
    pub max_connections: Option<usize>,
    pub max_gates: Option<usize>,
}

impl StructuralLimits {
    /// Checks whether applying `mutation` to `genome`
    /// could exceed any of the caps.
    ///
    /// # Examples
    /// ```
    /// # use neatpop_nn::genomics::{GeneticConfig, NNGenome};
    /// use neatpop::{Genome, Mutation, PopulationConfig, StructuralLimits};
    ///
    /// # let genome = NNGenome::new(&GeneticConfig::zero(), &mut rand::thread_rng());
    /// // With `genome` a 1-input, 1-output genome (2 nodes)...
    /// let limits = StructuralLimits {
    ///     max_nodes: Some(2),
    ///     ..StructuralLimits::default()
    /// };
    /// assert!(limits.permits(&genome, Mutation::AddNode).is_err());
    /// assert!(limits.permits(&genome, Mutation::AddConnection).is_ok());
    /// ```
    pub fn permits<G: Genome>(&self, genome: &G, mutation: Mutation) -> Result<(), MutationError> {
        let (nodes, connections, gates) = mutation.growth();
        let exceeded = |count: usize, growth: usize, cap: Option<usize>| {
            growth > 0 && cap.map_or(false, |max| count + growth > max)
        };
        let limit = if exceeded(genome.node_count(), nodes, self.max_nodes) {
            self.max_nodes.map(StructuralLimit::Nodes)
        } else if exceeded(genome.connection_count(), connections, self.max_connections) {
            self.max_connections.map(StructuralLimit::Connections)
        } else if exceeded(genome.gate_count(), gates, self.max_gates) {
            self.max_gates.map(StructuralLimit::Gates)
        } else {
            None
        };
        match limit {
            Some(limit) => Err(MutationError::IncompatibleOperator { mutation, limit }),
            None => Ok(()),
        }
    }
}

impl PopulationConfig {
    /// Returns a "zero-valued" default configuration.
    /// All values are 0, empty, or in the case of
    /// `NonZeroUsize`s, 1.
    ///
    /// # Note
    /// This value is not suitable for use in most experiments.
    /// It is meant as a way to abbreviate configuration
    /// instantiation, or to fill in unused values.
    ///
    /// # Examples
    /// ```
    /// use neatpop::PopulationConfig;
    ///
    /// let cfg1 = PopulationConfig::zero();
    ///
    /// let cfg2 = PopulationConfig {
    ///     // Specify some values here...
    ///     survival_threshold: 0.5,
    ///     // Default the rest...
    ///     ..PopulationConfig::zero()
    /// };
    /// ```
    pub const fn zero() -> PopulationConfig {
        PopulationConfig {
            size: NonZeroUsize::MIN,
            distance_threshold: 0.0,
            survival_threshold: 0.0,
            sexual_reproduction_chance: 0.0,
            selection: Selection::FitnessProportionate,
            stagnant_limit: 0,
            species_stagnant_limit: 0,
            mutation: MutationConfig::zero(),
        }
    }

    /// Checks that every probability lies in [0, 1]
    /// and that the remaining parameters are usable.
    ///
    /// # Examples
    /// ```
    /// use neatpop::PopulationConfig;
    ///
    /// assert!(PopulationConfig::default().validate().is_ok());
    ///
    /// let broken = PopulationConfig {
    ///     survival_threshold: 1.5,
    ///     ..PopulationConfig::default()
    /// };
    /// assert!(broken.validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let probabilities = [
            ("survival_threshold", self.survival_threshold),
            ("sexual_reproduction_chance", self.sexual_reproduction_chance),
            ("node_addition_chance", self.mutation.node_addition_chance),
            (
                "connection_addition_chance",
                self.mutation.connection_addition_chance,
            ),
            ("weight_mutation_chance", self.mutation.weight_mutation_chance),
            ("weight_nudge_chance", self.mutation.weight_nudge_chance),
        ];
        for (name, value) in probabilities {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigurationError::ProbabilityOutOfRange { name, value });
            }
        }
        if !(self.mutation.weight_bound > 0.0) {
            return Err(ConfigurationError::InvalidWeightBound(
                self.mutation.weight_bound,
            ));
        }
        if !(self.mutation.weight_nudge_power >= 0.0) {
            return Err(ConfigurationError::InvalidWeightNudgePower(
                self.mutation.weight_nudge_power,
            ));
        }
        self.selection.validate()
    }
}

impl Default for PopulationConfig {
    fn default() -> PopulationConfig {
        PopulationConfig {
            size: NonZeroUsize::new(150).unwrap_or(NonZeroUsize::MIN),
            distance_threshold: 3.0,
            survival_threshold: 0.5,
            sexual_reproduction_chance: 0.6,
            selection: Selection::FitnessProportionate,
            stagnant_limit: 20,
            species_stagnant_limit: 15,
            mutation: MutationConfig::default(),
        }
    }
}

impl MutationConfig {
    /// Returns a configuration under which nothing mutates
    /// and no structural mutation is allowed.
    pub const fn zero() -> MutationConfig {
        MutationConfig {
            node_addition_chance: 0.0,
            connection_addition_chance: 0.0,
            weight_mutation_chance: 0.0,
            weight_nudge_chance: 0.0,
            weight_nudge_power: 0.0,
            weight_bound: 1.0,
            allowed: Vec::new(),
            limits: StructuralLimits {
                max_nodes: None,
                max_connections: None,
                max_gates: None,
            },
        }
    }
}

impl Default for MutationConfig {
    fn default() -> MutationConfig {
        MutationConfig {
            node_addition_chance: 0.01,
            connection_addition_chance: 0.05,
            weight_mutation_chance: 0.8,
            weight_nudge_chance: 0.9,
            weight_nudge_power: 0.5,
            weight_bound: 1.0,
            allowed: vec![Mutation::AddNode, Mutation::AddConnection],
            limits: StructuralLimits::default(),
        }
    }
}
