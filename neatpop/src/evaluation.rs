//! Supervised fitness evaluation: datasets, cost
//! functions, and the population-wide evaluator.
use crate::Genome;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use std::fmt;
use std::sync::Arc;

/// Smallest value fed into logarithms and divisions
/// by cost functions.
const EPSILON: f32 = 1e-15;

/// A single input/expected-output pair.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub inputs: Vec<f32>,
    pub outputs: Vec<f32>,
}

impl Sample {
    pub fn new(inputs: Vec<f32>, outputs: Vec<f32>) -> Sample {
        Sample { inputs, outputs }
    }
}

/// Failures while scoring a genome.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum EvaluationError {
    #[error("cannot evaluate against an empty dataset")]
    EmptyDataset,
    #[error("network produced {actual} outputs, the dataset expects {expected}")]
    OutputMismatch { expected: usize, actual: usize },
    #[error("genome {index} scored a non-finite fitness ({value})")]
    NonFiniteFitness { index: usize, value: f32 },
    #[error("fitness function failed: {0}")]
    Failed(String),
}

/// Cost functions measuring the error between
/// expected and produced outputs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cost {
    CrossEntropy,
    Mse,
    Binary,
    Mae,
    Mape,
    Msle,
    Hinge,
}

impl Default for Cost {
    fn default() -> Cost {
        Cost::Mse
    }
}

impl Cost {
    /// Returns the cost of a single prediction.
    ///
    /// # Examples
    /// ```
    /// use neatpop::evaluation::Cost;
    ///
    /// assert_eq!(Cost::Mse.of(&[1.0, 0.0], &[0.5, 0.5]), 0.25);
    /// assert_eq!(Cost::Mae.of(&[1.0, 0.0], &[0.5, 0.5]), 0.5);
    /// assert_eq!(Cost::Binary.of(&[1.0, 0.0], &[0.9, 0.8]), 0.5);
    /// ```
    pub fn of(self, targets: &[f32], outputs: &[f32]) -> f32 {
        let pairs = targets.iter().zip(outputs);
        let total: f32 = match self {
            Cost::CrossEntropy => pairs
                .map(|(t, o)| {
                    let o = o.clamp(EPSILON, 1.0 - EPSILON);
                    -(t * o.ln() + (1.0 - t) * (1.0 - o).ln())
                })
                .sum(),
            Cost::Mse => pairs.map(|(t, o)| (t - o).powi(2)).sum(),
            Cost::Binary => pairs
                .filter(|(t, o)| (*t * 2.0).round() != (*o * 2.0).round())
                .count() as f32,
            Cost::Mae => pairs.map(|(t, o)| (t - o).abs()).sum(),
            Cost::Mape => pairs
                .map(|(t, o)| ((o - t) / t.abs().max(EPSILON)).abs())
                .sum(),
            Cost::Msle => pairs
                .map(|(t, o)| (t.max(EPSILON).ln() - o.max(EPSILON).ln()).powi(2))
                .sum(),
            Cost::Hinge => pairs.map(|(t, o)| (1.0 - t * o).max(0.0)).sum(),
        };
        total / targets.len().max(1) as f32
    }

    /// Returns the mean cost of `predict` over the dataset.
    ///
    /// # Errors
    /// Fails on an empty dataset, or if a prediction has
    /// a different length than its expected output.
    ///
    /// # Examples
    /// ```
    /// use neatpop::evaluation::{Cost, Sample};
    ///
    /// let dataset = [
    ///     Sample::new(vec![0.0], vec![0.0]),
    ///     Sample::new(vec![1.0], vec![1.0]),
    /// ];
    /// let error = Cost::Mse.error(&dataset, |inputs| vec![inputs[0] * 0.5]).unwrap();
    /// assert_eq!(error, 0.125);
    /// ```
    pub fn error<P>(self, dataset: &[Sample], mut predict: P) -> Result<f32, EvaluationError>
    where
        P: FnMut(&[f32]) -> Vec<f32>,
    {
        if dataset.is_empty() {
            return Err(EvaluationError::EmptyDataset);
        }
        let mut total = 0.0;
        for sample in dataset {
            let outputs = predict(&sample.inputs);
            if outputs.len() != sample.outputs.len() {
                return Err(EvaluationError::OutputMismatch {
                    expected: sample.outputs.len(),
                    actual: outputs.len(),
                });
            }
            total += self.of(&sample.outputs, &outputs);
        }
        Ok(total / dataset.len() as f32)
    }
}

/// A function scoring a genome against a dataset.
pub type FitnessFn<G> =
    Arc<dyn Fn(&G, &[Sample], Cost) -> Result<f32, EvaluationError> + Send + Sync>;

/// The default fitness: `1 / (1 + error)`.
///
/// Fitness is positive and grows as the error shrinks,
/// so it can be used directly for fitness sharing.
pub fn inverse_error<G: Genome>(
    genome: &G,
    dataset: &[Sample],
    cost: Cost,
) -> Result<f32, EvaluationError> {
    genome.evaluate(dataset, cost).map(|error| 1.0 / (1.0 + error))
}

/// Scores whole populations against a dataset.
pub struct Evaluator<G> {
    dataset: Vec<Sample>,
    cost: Cost,
    fitness_fn: FitnessFn<G>,
}

impl<G> Clone for Evaluator<G> {
    fn clone(&self) -> Self {
        Evaluator {
            dataset: self.dataset.clone(),
            cost: self.cost,
            fitness_fn: Arc::clone(&self.fitness_fn),
        }
    }
}

impl<G> fmt::Debug for Evaluator<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Evaluator")
            .field("samples", &self.dataset.len())
            .field("cost", &self.cost)
            .finish()
    }
}

impl<G: Genome + 'static> Evaluator<G> {
    /// Creates an evaluator using the default cost ([`Cost::Mse`])
    /// and fitness function ([`inverse_error`]).
    pub fn new(dataset: Vec<Sample>) -> Evaluator<G> {
        Evaluator {
            dataset,
            cost: Cost::default(),
            fitness_fn: Arc::new(inverse_error::<G>),
        }
    }
}

impl<G: Genome> Evaluator<G> {
    pub fn with_cost(mut self, cost: Cost) -> Self {
        self.cost = cost;
        self
    }

    pub fn with_fitness_fn<F>(mut self, fitness_fn: F) -> Self
    where
        F: Fn(&G, &[Sample], Cost) -> Result<f32, EvaluationError> + Send + Sync + 'static,
    {
        self.fitness_fn = Arc::new(fitness_fn);
        self
    }

    pub fn dataset(&self) -> &[Sample] {
        &self.dataset
    }

    pub fn cost(&self) -> Cost {
        self.cost
    }

    /// Scores a single genome.
    pub fn fitness_of(&self, genome: &G) -> Result<f32, EvaluationError> {
        (self.fitness_fn)(genome, &self.dataset, self.cost)
    }

    /// Scores every genome in parallel, then assigns the fitnesses.
    ///
    /// No genome is modified unless all of them were scored
    /// successfully with finite values.
    pub fn evaluate_all(&self, genomes: &mut [G]) -> Result<(), EvaluationError>
    where
        G: Send + Sync,
    {
        let fitnesses = genomes
            .par_iter()
            .enumerate()
            .map(|(index, genome)| {
                let value = self.fitness_of(genome)?;
                if value.is_finite() {
                    Ok(value)
                } else {
                    Err(EvaluationError::NonFiniteFitness { index, value })
                }
            })
            .collect::<Result<Vec<f32>, EvaluationError>>()?;
        for (genome, fitness) in genomes.iter_mut().zip(fitnesses) {
            genome.set_fitness(fitness);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::populations::test_genome::ScalarGenome;

    fn dataset() -> Vec<Sample> {
        vec![
            Sample::new(vec![1.0], vec![1.0]),
            Sample::new(vec![2.0], vec![2.0]),
        ]
    }

    #[test]
    fn cross_entropy_is_finite_at_saturation() {
        let cost = Cost::CrossEntropy.of(&[1.0, 0.0], &[0.0, 1.0]);
        assert!(cost.is_finite());
        assert!(cost > 0.0);
    }

    #[test]
    fn error_rejects_empty_dataset() {
        assert_eq!(
            Cost::Mse.error(&[], |_| vec![]),
            Err(EvaluationError::EmptyDataset)
        );
    }

    #[test]
    fn error_rejects_output_mismatch() {
        assert_eq!(
            Cost::Mse.error(&dataset(), |_| vec![0.0, 0.0]),
            Err(EvaluationError::OutputMismatch {
                expected: 1,
                actual: 2
            })
        );
    }

    #[test]
    fn inverse_error_rewards_exact_predictions() {
        let perfect = ScalarGenome::with_value(1.0);
        let off = ScalarGenome::with_value(0.5);
        let f_perfect = inverse_error(&perfect, &dataset(), Cost::Mse).unwrap();
        let f_off = inverse_error(&off, &dataset(), Cost::Mse).unwrap();
        assert_eq!(f_perfect, 1.0);
        assert!(f_off < f_perfect);
    }

    #[test]
    fn evaluate_all_assigns_every_fitness() {
        let evaluator = Evaluator::new(dataset());
        let mut genomes: Vec<_> = (0..8)
            .map(|i| ScalarGenome::with_value(i as f32 / 4.0))
            .collect();
        evaluator.evaluate_all(&mut genomes).unwrap();
        assert!(genomes.iter().all(|g| g.fitness().is_some()));
        assert_eq!(genomes[4].fitness(), Some(1.0));
    }

    #[test]
    fn evaluate_all_is_all_or_nothing() {
        let evaluator = Evaluator::new(dataset()).with_fitness_fn(|g: &ScalarGenome, _, _| {
            if g.value() > 1.0 {
                Ok(f32::NAN)
            } else {
                Ok(g.value())
            }
        });
        let mut genomes = vec![ScalarGenome::with_value(0.5), ScalarGenome::with_value(2.0)];
        let result = evaluator.evaluate_all(&mut genomes);
        assert!(matches!(
            result,
            Err(EvaluationError::NonFiniteFitness { index: 1, .. })
        ));
        assert!(genomes.iter().all(|g| g.fitness().is_none()));
    }
}
