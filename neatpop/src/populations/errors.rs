use crate::evaluation::EvaluationError;

use thiserror::Error;

/// Errors aborting a call to [`Population::evolve`].
/// The population is left as it was before the call.
///
/// [`Population::evolve`]: crate::Population::evolve
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvolutionError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    Invariant(#[from] InvariantError),
    #[error(transparent)]
    Evaluation(#[from] EvaluationError),
}

/// The population is missing something it needs,
/// or has been given unusable parameters.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    #[error("{unevaluated} genome(s) have no fitness and no evaluator is configured")]
    MissingFitness { unevaluated: usize },
    #[error("{name} must lie in [0, 1], got {value}")]
    ProbabilityOutOfRange { name: &'static str, value: f32 },
    #[error("weight bound must be positive, got {0}")]
    InvalidWeightBound(f32),
    #[error("weight nudge power must be non-negative, got {0}")]
    InvalidWeightNudgePower(f32),
    #[error("invalid selection scheme: {0}")]
    InvalidSelection(String),
}

/// A generational step could not produce a well-formed population.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantError {
    #[error("stagnation narrowing needs {required} species, only {available} exist")]
    InsufficientSpecies { required: usize, available: usize },
    #[error("every species was culled, no breeding pool remains")]
    Extinct,
    #[error("replacement produced {actual} genomes, expected {expected}")]
    MemberCount { expected: usize, actual: usize },
}
