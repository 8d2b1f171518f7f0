use crate::Innovation;

use thiserror::Error;

/// The gene being added would leave the genome inconsistent.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum GeneValidityError {
    #[error("duplicate gene insertion with id {0}")]
    DuplicateGeneID(Innovation),
    #[error("gene insertion between nonexistent endpoint(s) {0} -> {1}")]
    NonexistentEndpoints(Innovation, Innovation),
    #[error("gene insertion with id {0} shadows a gene between {1} -> {2}")]
    DuplicateGeneWithEndpoints(Innovation, Innovation, Innovation),
    #[error("gene insertion into sensor node {0}")]
    SensorEndpoint(Innovation),
}

/// The node being added would leave the genome inconsistent.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum NodeValidityError {
    #[error("duplicate node insertion with id {0}")]
    DuplicateNodeID(Innovation),
}

/// A connection addition found nothing to connect.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub(crate) enum GeneAdditionMutationError {
    #[error("gene mutation on fully-connected genome")]
    GenomeFullyConnected,
    #[error("no viable input-output pair found for gene mutation")]
    NoInputOutputPairFound,
}

/// A node addition found no connection to split.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub(crate) enum NodeAdditionMutationError {
    #[error("node mutation on genome without expressed genes")]
    NoExpressedGenes,
}
