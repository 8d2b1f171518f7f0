use crate::evaluation::{Cost, EvaluationError, Sample};

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use std::fmt;

/// An interface for genomes that can be evolved by a [`Population`].
///
/// The population never looks inside a genome: it only measures
/// genetic distance, breeds, mutates, and scores them.
///
/// [`Population`]: crate::Population
pub trait Genome {
    type Config;
    type InnovationHistory: InnovationHistory<Config = Self::Config>;

    /// Returns a randomized genome.
    fn new<R: Rng + ?Sized>(config: &Self::Config, rng: &mut R) -> Self;

    /// Returns the genetic distance between two genomes.
    fn genetic_distance(first: &Self, second: &Self, config: &Self::Config) -> f32;

    /// Combines two genomes and returns a "child" genome.
    /// The child carries no fitness.
    fn mate<R: Rng + ?Sized>(
        parent1: &Self,
        parent2: &Self,
        history: &mut Self::InnovationHistory,
        config: &Self::Config,
        rng: &mut R,
    ) -> Self;

    /// Applies a single structural mutation in place.
    ///
    /// # Errors
    /// Returns [`MutationError::Unapplicable`] if the genome
    /// has no room for the mutation (e.g. it is fully connected).
    fn mutate<R: Rng + ?Sized>(
        &mut self,
        mutation: Mutation,
        history: &mut Self::InnovationHistory,
        config: &Self::Config,
        rng: &mut R,
    ) -> Result<(), MutationError>;

    /// Replaces every connection weight `w` with `f(w)`.
    fn map_weights<F: FnMut(f32) -> f32>(&mut self, f: F);

    /// Number of nodes in the genome.
    fn node_count(&self) -> usize;

    /// Number of connections in the genome.
    fn connection_count(&self) -> usize;

    /// Number of gated connections in the genome.
    fn gate_count(&self) -> usize {
        0
    }

    /// Returns the genome's mean error over `dataset`.
    fn evaluate(&self, dataset: &[Sample], cost: Cost) -> Result<f32, EvaluationError>;

    /// Sets the genome's fitness value.
    fn set_fitness(&mut self, fitness: f32);

    /// Forgets the genome's fitness value.
    fn clear_fitness(&mut self);

    /// Returns the genome's fitness value, if it has been evaluated.
    fn fitness(&self) -> Option<f32>;
}

/// An Innovation History is used to keep track
/// of genetic innovations throught successive
/// generations of genomes.
///
/// The exact function and utility of the
/// InnovationHistory is left to the implementor.
pub trait InnovationHistory {
    type Config;

    fn new(config: &Self::Config) -> Self;
}

/// Structural mutation operators a population may apply.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mutation {
    /// Split an existing connection with a new node.
    AddNode,
    /// Connect two previously unconnected nodes.
    AddConnection,
}

impl Mutation {
    /// Worst-case structural growth caused by the mutation,
    /// as `(nodes, connections, gates)`.
    ///
    /// A node addition disables the split connection and adds two new ones.
    ///
    /// # Examples
    /// ```
    /// use neatpop::Mutation;
    ///
    /// assert_eq!(Mutation::AddNode.growth(), (1, 2, 0));
    /// assert_eq!(Mutation::AddConnection.growth(), (0, 1, 0));
    /// ```
    pub const fn growth(self) -> (usize, usize, usize) {
        match self {
            Mutation::AddNode => (1, 2, 0),
            Mutation::AddConnection => (0, 1, 0),
        }
    }
}

/// A structural cap that a mutation would have exceeded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StructuralLimit {
    Nodes(usize),
    Connections(usize),
    Gates(usize),
}

impl fmt::Display for StructuralLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nodes(max) => write!(f, "node limit of {}", max),
            Self::Connections(max) => write!(f, "connection limit of {}", max),
            Self::Gates(max) => write!(f, "gate limit of {}", max),
        }
    }
}

/// Reasons a mutation was not applied to a genome.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum MutationError {
    /// The mutation would push the genome past a structural cap.
    #[error("{mutation:?} would exceed the {limit}")]
    IncompatibleOperator {
        mutation: Mutation,
        limit: StructuralLimit,
    },
    /// The mutation is not in the population's allowed set.
    #[error("{0:?} is not an allowed mutation")]
    Disallowed(Mutation),
    /// The genome cannot host the mutation.
    #[error("{mutation:?} could not be applied: {reason}")]
    Unapplicable { mutation: Mutation, reason: String },
}
