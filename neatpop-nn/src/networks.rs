//! Networks are the phenotypes of [`NNGenome`]s. Expressed genes
//! become connections, and genome nodes become network nodes.
//! Suppressed genes are ignored.
//!
//! [`RealTimeNetwork`] suits real-time control tasks, where new
//! inputs are set for each activation over many time-steps.
//! [`FunctionApproximatorNetwork`] suits single-output-per-input
//! function approximation.
//!
//! [`NNGenome`]: crate::genomics::NNGenome
mod function_approximator;

pub use function_approximator::FunctionApproximatorNetwork;

use crate::genomics::{ActivationType, NNGenome, NodeType};
use crate::Innovation;

use std::collections::BTreeMap;
use std::fmt;

/// An outgoing connection, by index of its target node.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Connection {
    pub output: usize,
    pub weight: f32,
}

/// A neural network that is activated one time-step at a time.
///
/// Each activation propagates every node's current
/// activation level one connection forward, so signals
/// take as many activations to reach the outputs as
/// there are connections in their path.
///
/// Nodes are stored inputs first, then outputs, then
/// hidden nodes, each group in ascending innovation order.
#[derive(Clone, Debug)]
pub struct RealTimeNetwork {
    pub(crate) input_count: usize,
    pub(crate) output_count: usize,
    node_ids: Box<[Innovation]>,
    input_sums: Box<[f32]>,
    activation_levels: Box<[f32]>,
    activation_functions: Box<[ActivationType]>,
    pub(crate) connections: Box<[Box<[Connection]>]>,
}

impl From<&NNGenome> for RealTimeNetwork {
    /// Builds the network expressed by `genome`.
    ///
    /// # Examples
    /// ```
    /// use neatpop::Genome;
    /// use neatpop_nn::genomics::{GeneticConfig, NNGenome};
    /// use neatpop_nn::networks::RealTimeNetwork;
    ///
    /// let genome = NNGenome::new(&GeneticConfig::zero(), &mut rand::thread_rng());
    /// let network = RealTimeNetwork::from(&genome);
    /// assert_eq!(network.outputs(), [0.0]);
    /// ```
    fn from(genome: &NNGenome) -> RealTimeNetwork {
        let mut inputs = vec![];
        let mut outputs = vec![];
        let mut hidden = vec![];
        // Genome nodes iterate in ascending innovation order.
        for node in genome.nodes() {
            match node.node_type() {
                NodeType::Sensor => &mut inputs,
                NodeType::Actuator => &mut outputs,
                NodeType::Neuron => &mut hidden,
            }
            .push((node.innovation(), node.activation_type()));
        }
        let (input_count, output_count) = (inputs.len(), outputs.len());
        let (node_ids, activation_functions): (Vec<_>, Vec<_>) =
            inputs.into_iter().chain(outputs).chain(hidden).unzip();

        let index_of: BTreeMap<Innovation, usize> = node_ids
            .iter()
            .enumerate()
            .map(|(index, id)| (*id, index))
            .collect();
        let mut connections = vec![vec![]; node_ids.len()];
        for gene in genome.genes().filter(|g| !g.suppressed()) {
            if let (Some(&input), Some(&output)) =
                (index_of.get(&gene.input()), index_of.get(&gene.output()))
            {
                connections[input].push(Connection {
                    output,
                    weight: gene.weight(),
                });
            }
        }

        let node_count = node_ids.len();
        RealTimeNetwork {
            input_count,
            output_count,
            node_ids: node_ids.into(),
            input_sums: vec![0.0; node_count].into(),
            activation_levels: vec![0.0; node_count].into(),
            activation_functions: activation_functions.into(),
            connections: connections.into_iter().map(Vec::into_boxed_slice).collect(),
        }
    }
}

impl RealTimeNetwork {
    /// Advances the network by one time-step: every node fires
    /// into its connections, then every non-input node
    /// recomputes its activation level.
    ///
    /// # Examples
    /// ```
    /// use neatpop::Genome;
    /// use neatpop_nn::genomics::{GeneticConfig, NNGenome};
    /// use neatpop_nn::networks::RealTimeNetwork;
    ///
    /// let mut genome = NNGenome::new(&GeneticConfig::zero(), &mut rand::thread_rng());
    /// genome.add_gene(0, 0, 1, 1.0).unwrap();
    /// let mut network = RealTimeNetwork::from(&genome);
    ///
    /// network.set_inputs(&[0.0]);
    /// network.activate();
    /// assert_eq!(network.outputs(), [0.5]);
    /// ```
    pub fn activate(&mut self) {
        for (activation, connections) in self.activation_levels.iter().zip(self.connections.iter())
        {
            for connection in connections.iter() {
                self.input_sums[connection.output] += activation * connection.weight;
            }
        }

        let start = self.input_count;
        for ((input_sum, activation), function) in self.input_sums[start..]
            .iter_mut()
            .zip(&mut self.activation_levels[start..])
            .zip(&self.activation_functions[start..])
        {
            *activation = function.apply(*input_sum);
            *input_sum = 0.0;
        }
    }

    /// Resets every activation level and pending input to 0.
    pub fn clear_state(&mut self) {
        self.input_sums.iter_mut().for_each(|x| *x = 0.0);
        self.activation_levels.iter_mut().for_each(|x| *x = 0.0);
    }

    /// Sets the activation levels of the input nodes.
    ///
    /// # Panics
    /// Panics if `values` doesn't hold one value per input.
    pub fn set_inputs(&mut self, values: &[f32]) {
        self.activation_levels[..self.input_count].copy_from_slice(values);
    }

    /// Activation levels of the output nodes.
    pub fn outputs(&self) -> Vec<f32> {
        self.activation_levels[self.input_count..self.input_count + self.output_count].to_vec()
    }

    /// Innovation numbers of the network's nodes, in storage order.
    pub fn node_ids(&self) -> &[Innovation] {
        &self.node_ids
    }
}

impl fmt::Display for RealTimeNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (id, connections) in self.node_ids.iter().zip(self.connections.iter()) {
            write!(f, "{}:", id)?;
            for c in connections.iter() {
                write!(f, " ->{} ({:.3})", self.node_ids[c.output], c.weight)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genomics::GeneticConfig;

    use neatpop::Genome;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use std::num::NonZeroUsize;

    fn sigmoid(x: f32) -> f32 {
        1.0 / (1.0 + (-4.9 * x).exp())
    }

    fn genome(config: &GeneticConfig) -> NNGenome {
        NNGenome::new(config, &mut StdRng::seed_from_u64(0))
    }

    #[test]
    fn from_orders_nodes_and_skips_suppressed_genes() {
        let config = GeneticConfig {
            input_count: NonZeroUsize::new(2).unwrap(),
            output_count: NonZeroUsize::new(2).unwrap(),
            output_activation_types: vec![ActivationType::Sigmoid, ActivationType::Gaussian],
            ..GeneticConfig::zero()
        };
        let mut genome = genome(&config);
        genome.add_node(4, ActivationType::ReLU).unwrap();
        genome.add_gene(0, 0, 2, 1.0).unwrap();
        genome.add_gene(2, 0, 4, 2.5).unwrap();
        genome.add_gene(3, 4, 3, -1.0).unwrap();
        genome.add_gene(1, 0, 3, -1.0).unwrap().set_suppressed(true);

        let network = RealTimeNetwork::from(&genome);
        assert_eq!((network.input_count, network.output_count), (2, 2));
        assert_eq!(network.node_ids(), [0, 1, 2, 3, 4]);
        assert_eq!(network.activation_functions[3], ActivationType::Gaussian);
        assert_eq!(network.activation_functions[4], ActivationType::ReLU);
        assert_eq!(
            network.connections[0].as_ref(),
            [
                Connection {
                    output: 2,
                    weight: 1.0
                },
                Connection {
                    output: 4,
                    weight: 2.5
                }
            ]
        );
        assert_eq!(
            network.connections[4].as_ref(),
            [Connection {
                output: 3,
                weight: -1.0
            }]
        );
    }

    #[test]
    fn activate_without_genes() {
        let mut network = RealTimeNetwork::from(&genome(&GeneticConfig::zero()));
        for _ in 0..10 {
            network.activate();
            assert_eq!(network.outputs()[0], sigmoid(0.0));
        }
    }

    #[test]
    fn activate_with_recursion() {
        let mut genome = genome(&GeneticConfig::zero());
        genome.add_gene(0, 0, 1, 1.0).unwrap();
        genome.add_gene(1, 1, 1, -1.0).unwrap();
        let mut network = RealTimeNetwork::from(&genome);
        let mut previous = 0.0;
        for input in -20..=20 {
            let input = input as f32 / 10.0;
            network.set_inputs(&[input]);
            network.activate();
            assert_eq!(network.outputs()[0], sigmoid(input - previous));
            previous = network.outputs()[0];
        }
    }

    #[test]
    fn signals_take_one_step_per_connection() {
        let mut genome = genome(&GeneticConfig::zero());
        genome.add_node(2, ActivationType::Sigmoid).unwrap();
        genome.add_gene(0, 0, 2, 1.0).unwrap();
        genome.add_gene(1, 2, 1, 1.0).unwrap();
        let mut network = RealTimeNetwork::from(&genome);
        for input in -20..=20 {
            let input = input as f32 / 10.0;
            network.clear_state();
            network.set_inputs(&[input]);
            network.activate();
            network.activate();
            assert_eq!(network.outputs()[0], sigmoid(sigmoid(input)));
        }
    }

    #[test]
    fn activate_multiple_inputs() {
        let config = GeneticConfig {
            input_count: NonZeroUsize::new(3).unwrap(),
            ..GeneticConfig::zero()
        };
        let mut genome = genome(&config);
        genome.add_gene(0, 0, 3, -1.0).unwrap();
        genome.add_gene(1, 1, 3, 1.0).unwrap();
        genome.add_gene(2, 2, 3, 0.5).unwrap();
        let mut network = RealTimeNetwork::from(&genome);
        for x in -20..=20 {
            let (x, y, z) = (x as f32 / 10.0, x as f32 / 20.0, -x as f32 / 5.0);
            network.clear_state();
            network.set_inputs(&[x, y, z]);
            network.activate();
            assert_eq!(network.outputs()[0], sigmoid(-x + y + 0.5 * z));
        }
    }
}
