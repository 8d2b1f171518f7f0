//! A one-dimensional genome for exercising population
//! mechanics without a real network behind it.
use crate::evaluation::{Cost, EvaluationError, Sample};
use crate::genome::{Genome, InnovationHistory, Mutation, MutationError};

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Predicts `value × input` for every input. Two genomes are
/// as distant as their values are.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) struct ScalarGenome {
    value: f32,
    weights: Vec<f32>,
    nodes: usize,
    fitness: Option<f32>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub(crate) struct ScalarHistory {
    pub(crate) mutations: usize,
}

impl InnovationHistory for ScalarHistory {
    type Config = ();

    fn new(_: &()) -> ScalarHistory {
        ScalarHistory::default()
    }
}

impl ScalarGenome {
    pub(crate) fn with_value(value: f32) -> ScalarGenome {
        ScalarGenome {
            value,
            weights: vec![0.0],
            nodes: 2,
            fitness: None,
        }
    }

    pub(crate) fn with_weights(weights: Vec<f32>) -> ScalarGenome {
        ScalarGenome {
            weights,
            ..ScalarGenome::with_value(0.0)
        }
    }

    pub(crate) fn evaluated(value: f32, fitness: f32) -> ScalarGenome {
        ScalarGenome {
            fitness: Some(fitness),
            ..ScalarGenome::with_value(value)
        }
    }

    pub(crate) fn value(&self) -> f32 {
        self.value
    }

    pub(crate) fn weights(&self) -> &[f32] {
        &self.weights
    }
}

impl Genome for ScalarGenome {
    type Config = ();
    type InnovationHistory = ScalarHistory;

    fn new<R: Rng + ?Sized>(_: &(), rng: &mut R) -> ScalarGenome {
        let value = rng.gen_range(-1.0..1.0);
        ScalarGenome {
            weights: vec![value],
            ..ScalarGenome::with_value(value)
        }
    }

    fn genetic_distance(first: &Self, second: &Self, _: &()) -> f32 {
        (first.value - second.value).abs()
    }

    fn mate<R: Rng + ?Sized>(
        parent1: &Self,
        parent2: &Self,
        _: &mut ScalarHistory,
        _: &(),
        _: &mut R,
    ) -> Self {
        ScalarGenome {
            value: (parent1.value + parent2.value) / 2.0,
            weights: parent1.weights.clone(),
            nodes: parent1.nodes.max(parent2.nodes),
            fitness: None,
        }
    }

    fn mutate<R: Rng + ?Sized>(
        &mut self,
        mutation: Mutation,
        history: &mut ScalarHistory,
        _: &(),
        _: &mut R,
    ) -> Result<(), MutationError> {
        match mutation {
            Mutation::AddNode => {
                self.nodes += 1;
                self.weights.push(1.0);
                self.weights.push(1.0);
            }
            Mutation::AddConnection => self.weights.push(0.0),
        }
        history.mutations += 1;
        Ok(())
    }

    fn map_weights<F: FnMut(f32) -> f32>(&mut self, mut f: F) {
        for weight in &mut self.weights {
            *weight = f(*weight);
        }
    }

    fn node_count(&self) -> usize {
        self.nodes
    }

    fn connection_count(&self) -> usize {
        self.weights.len()
    }

    fn evaluate(&self, dataset: &[Sample], cost: Cost) -> Result<f32, EvaluationError> {
        cost.error(dataset, |inputs| {
            inputs.iter().map(|x| x * self.value).collect()
        })
    }

    fn set_fitness(&mut self, fitness: f32) {
        self.fitness = Some(fitness);
    }

    fn clear_fitness(&mut self) {
        self.fitness = None;
    }

    fn fitness(&self) -> Option<f32> {
        self.fitness
    }
}
