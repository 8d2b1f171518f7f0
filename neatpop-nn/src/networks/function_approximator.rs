use crate::genomics::NNGenome;
use crate::networks::RealTimeNetwork;

/// A neural network best suited for function approximation.
///
/// Each evaluation clears the network, sets the inputs, and
/// activates it as many times as the longest path from an
/// input to an output is long.
///
/// # Generic parameters
/// `MAX_NODE_VISITS`: the maximum number of times a node
/// can be visited in a path through the network. Setting it
/// to 0 disables the entire network, 1 disallows any cycles,
/// 2 allows a single pass through the longest cycle, etc.
#[derive(Clone, Debug)]
pub struct FunctionApproximatorNetwork<const MAX_NODE_VISITS: u8> {
    network: RealTimeNetwork,
    depth: usize,
}

impl<const MAX_NODE_VISITS: u8> From<&NNGenome> for FunctionApproximatorNetwork<MAX_NODE_VISITS> {
    /// Builds the network expressed by `genome`.
    ///
    /// # Complexity
    /// Finding the depth takes `O(d^(n × MAX_NODE_VISITS))` time,
    /// where `d` is the highest output count in the genome's nodes.
    ///
    /// # Examples
    /// ```
    /// use neatpop::Genome;
    /// use neatpop_nn::genomics::{GeneticConfig, NNGenome};
    /// use neatpop_nn::networks::FunctionApproximatorNetwork;
    ///
    /// let genome = NNGenome::new(&GeneticConfig::zero(), &mut rand::thread_rng());
    /// let network = FunctionApproximatorNetwork::<1>::from(&genome);
    /// assert_eq!(network.depth(), 0);
    /// ```
    fn from(genome: &NNGenome) -> FunctionApproximatorNetwork<MAX_NODE_VISITS> {
        let network = RealTimeNetwork::from(genome);
        let mut visits = vec![0; network.connections.len()];
        let depth = (0..network.input_count)
            .map(|root| Self::longest_path(&network, root, &mut visits, 0))
            .max()
            .unwrap_or(0);

        FunctionApproximatorNetwork { network, depth }
    }
}

impl<const MAX_NODE_VISITS: u8> FunctionApproximatorNetwork<MAX_NODE_VISITS> {
    /// Length of the longest path from `root` to an output
    /// node that visits no node more than `MAX_NODE_VISITS` times.
    fn longest_path(
        network: &RealTimeNetwork,
        root: usize,
        visits: &mut [u8],
        current_depth: usize,
    ) -> usize {
        let mut max_depth = 0;

        for c in network.connections[root].iter() {
            if visits[c.output] < MAX_NODE_VISITS {
                visits[c.output] += 1;
                max_depth =
                    max_depth.max(Self::longest_path(network, c.output, visits, current_depth + 1));
                visits[c.output] -= 1;
            }
        }

        let outputs = network.input_count..network.input_count + network.output_count;
        if max_depth == 0 && outputs.contains(&root) {
            current_depth
        } else {
            max_depth
        }
    }

    /// Returns the approximated function's value
    /// at the point given by `inputs`.
    ///
    /// # Panics
    /// Panics if `inputs` doesn't hold one value per network input.
    ///
    /// # Examples
    /// ```
    /// use neatpop::Genome;
    /// use neatpop_nn::genomics::{ActivationType, GeneticConfig, NNGenome};
    /// use neatpop_nn::networks::FunctionApproximatorNetwork;
    ///
    /// fn sigmoid(x: f32) -> f32 {
    ///     1.0 / (1.0 + (-4.9 * x).exp())
    /// }
    ///
    /// let mut genome = NNGenome::new(&GeneticConfig::zero(), &mut rand::thread_rng());
    /// genome.add_node(2, ActivationType::Sigmoid).unwrap();
    /// genome.add_gene(0, 0, 2, 1.0).unwrap();
    /// genome.add_gene(1, 2, 1, 1.0).unwrap();
    /// let mut network = FunctionApproximatorNetwork::<1>::from(&genome);
    ///
    /// // Two chained sigmoid nodes.
    /// assert_eq!(network.evaluate_at(&[0.3])[0], sigmoid(sigmoid(0.3)));
    /// ```
    pub fn evaluate_at(&mut self, inputs: &[f32]) -> Vec<f32> {
        self.network.clear_state();
        self.network.set_inputs(inputs);
        for _ in 0..self.depth {
            self.network.activate();
        }
        self.network.outputs()
    }

    /// Number of activations per evaluation.
    pub fn depth(&self) -> usize {
        self.depth
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genomics::{ActivationType, GeneticConfig};

    use neatpop::Genome;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn cyclic_genome() -> NNGenome {
        let mut genome = NNGenome::new(&GeneticConfig::zero(), &mut StdRng::seed_from_u64(0));
        genome.add_node(2, ActivationType::Sigmoid).unwrap();
        genome.add_gene(0, 0, 1, 0.0).unwrap();
        genome.add_gene(1, 0, 2, 0.0).unwrap();
        genome.add_gene(2, 1, 1, 0.0).unwrap();
        genome.add_gene(3, 1, 2, 0.0).unwrap();
        genome.add_gene(4, 2, 1, 0.0).unwrap();
        genome.add_gene(5, 2, 2, 0.0).unwrap();
        genome
    }

    #[test]
    fn depth_grows_with_allowed_visits() {
        let genome = cyclic_genome();
        assert_eq!(FunctionApproximatorNetwork::<0>::from(&genome).depth(), 0);
        assert_eq!(FunctionApproximatorNetwork::<1>::from(&genome).depth(), 2);
        assert_eq!(FunctionApproximatorNetwork::<2>::from(&genome).depth(), 4);
        assert_eq!(FunctionApproximatorNetwork::<3>::from(&genome).depth(), 6);
    }

    #[test]
    fn evaluation_is_stateless() {
        let mut genome = NNGenome::new(&GeneticConfig::zero(), &mut StdRng::seed_from_u64(0));
        genome.add_gene(0, 0, 1, 2.0).unwrap();
        let mut network = FunctionApproximatorNetwork::<1>::from(&genome);
        let first = network.evaluate_at(&[0.4]);
        network.evaluate_at(&[-3.0]);
        assert_eq!(network.evaluate_at(&[0.4]), first);
    }
}
