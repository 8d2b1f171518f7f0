use crate::Innovation;

use serde::{Deserialize, Serialize};

use std::collections::BTreeSet;
use std::fmt;

/// The activation function a node's
/// network equivalent will use.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum ActivationType {
    /// 1 / (1 + exp(-4.9x))
    Sigmoid,
    /// x
    Identity,
    /// max(x, 0)
    ReLU,
    /// exp(-x²)
    Gaussian,
    /// sin(πx)
    Sinusoidal,
}

impl ActivationType {
    /// Applies the activation function to `x`.
    ///
    /// # Examples
    /// ```
    /// use neatpop_nn::genomics::ActivationType;
    ///
    /// assert_eq!(ActivationType::Sigmoid.apply(0.0), 0.5);
    /// assert_eq!(ActivationType::ReLU.apply(-3.0), 0.0);
    /// assert_eq!(ActivationType::Gaussian.apply(0.0), 1.0);
    /// ```
    pub fn apply(self, x: f32) -> f32 {
        match self {
            ActivationType::Sigmoid => 1.0 / (1.0 + (-4.9 * x).exp()),
            ActivationType::Identity => x,
            ActivationType::ReLU => x.max(0.0),
            ActivationType::Gaussian => (-x * x).exp(),
            ActivationType::Sinusoidal => (x * std::f32::consts::PI).sin(),
        }
    }
}

/// The role of a node in the network.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeType {
    /// Input nodes.
    Sensor,
    /// Hidden nodes.
    Neuron,
    /// Output nodes.
    Actuator,
}

/// Nodes are the structural elements of genomes
/// between which genes are created.
///
/// A node tracks the innovation numbers of
/// the genes entering and leaving it.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Node {
    id: Innovation,
    inputs: BTreeSet<Innovation>,
    outputs: BTreeSet<Innovation>,
    node_type: NodeType,
    activation_type: ActivationType,
}

impl Node {
    /// Returns a node with no incident genes.
    ///
    /// # Examples
    /// ```
    /// use neatpop_nn::genomics::{ActivationType, Node, NodeType};
    ///
    /// let node = Node::new(5, NodeType::Neuron, ActivationType::Sigmoid);
    /// assert_eq!(node.innovation(), 5);
    /// assert_eq!(node.input_genes().count(), 0);
    /// ```
    pub fn new(id: Innovation, node_type: NodeType, activation_type: ActivationType) -> Node {
        Node {
            id,
            inputs: BTreeSet::new(),
            outputs: BTreeSet::new(),
            node_type,
            activation_type,
        }
    }

    /// Registers a gene entering the node. Returns
    /// `false` if it was already registered.
    pub(super) fn add_input_gene(&mut self, gene: Innovation) -> bool {
        self.inputs.insert(gene)
    }

    /// Registers a gene leaving the node. Returns
    /// `false` if it was already registered.
    pub(super) fn add_output_gene(&mut self, gene: Innovation) -> bool {
        self.outputs.insert(gene)
    }

    pub fn innovation(&self) -> Innovation {
        self.id
    }

    /// Innovation numbers of the genes entering the
    /// node, in ascending order.
    pub fn input_genes(&self) -> impl Iterator<Item = &Innovation> {
        self.inputs.iter()
    }

    /// Innovation numbers of the genes leaving the
    /// node, in ascending order.
    pub fn output_genes(&self) -> impl Iterator<Item = &Innovation> {
        self.outputs.iter()
    }

    pub fn node_type(&self) -> NodeType {
        self.node_type
    }

    pub fn activation_type(&self) -> ActivationType {
        self.activation_type
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}[{:?}, {:?}, IN: {:?}, OUT: {:?}]",
            self.id, self.node_type, self.activation_type, self.inputs, self.outputs,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gene_registration_is_idempotent() {
        let mut node = Node::new(3, NodeType::Neuron, ActivationType::Identity);
        assert!(node.add_input_gene(7));
        assert!(!node.add_input_gene(7));
        assert!(node.add_output_gene(2));
        assert!(node.add_output_gene(1));
        assert_eq!(node.input_genes().copied().collect::<Vec<_>>(), [7]);
        assert_eq!(node.output_genes().copied().collect::<Vec<_>>(), [1, 2]);
    }

    #[test]
    fn activation_functions() {
        assert_eq!(ActivationType::Identity.apply(-1.5), -1.5);
        assert_eq!(ActivationType::ReLU.apply(2.0), 2.0);
        assert!(ActivationType::Sinusoidal.apply(1.0).abs() < 1e-6);
        assert!(ActivationType::Sigmoid.apply(10.0) > 0.99);
    }
}
