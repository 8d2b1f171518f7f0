//! Genomes are the focus of evolution in NEAT.
//! They are a collection of genes and nodes that can be instantiated
//! as a phenotype (a neural network). Genomes can be progressively mutated,
//! thus adding complexity and functionality.

mod config;
mod errors;
mod genes;
mod history;
mod nodes;

pub use config::GeneticConfig;
use errors::{GeneAdditionMutationError, NodeAdditionMutationError};
pub use errors::{GeneValidityError, NodeValidityError};
pub use genes::Gene;
pub use history::History;
pub use nodes::{ActivationType, Node, NodeType};

use crate::networks::FunctionApproximatorNetwork;
use crate::Innovation;

use neatpop::evaluation::{Cost, EvaluationError, Sample};
use neatpop::{Genome, Mutation, MutationError};
use rand::prelude::{IteratorRandom, Rng, SliceRandom};
use serde::{Deserialize, Serialize};

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// A neural network genome: a collection of nodes,
/// and of genes connecting them.
///
/// Suports Serde for convenient genome saving and loading.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct NNGenome {
    genes: BTreeMap<Innovation, Gene>,
    nodes: BTreeMap<Innovation, Node>,
    node_pairings: BTreeSet<(Innovation, Innovation)>,
    fitness: Option<f32>,
}

impl Genome for NNGenome {
    type Config = GeneticConfig;
    type InnovationHistory = History;

    /// Creates a genome with the configured input and output
    /// nodes, each input-output pair being connected with
    /// probability `config.initial_expression_chance`.
    ///
    /// Input nodes are numbered `0..input_count`, and output
    /// nodes follow them. The gene from input `i` to output
    /// index `o` has innovation number `o + i ⨯ output_count`.
    ///
    /// # Examples
    /// ```
    /// use neatpop::Genome;
    /// use neatpop_nn::genomics::{GeneticConfig, NNGenome, NodeType};
    /// use std::num::NonZeroUsize;
    ///
    /// let config = GeneticConfig {
    ///     input_count: NonZeroUsize::new(3).unwrap(),
    ///     output_count: NonZeroUsize::new(2).unwrap(),
    ///     initial_expression_chance: 1.0,
    ///     weight_bound: 5.0,
    ///     ..GeneticConfig::zero()
    /// };
    ///
    /// let genome = NNGenome::new(&config, &mut rand::thread_rng());
    ///
    /// assert_eq!(genome.genes().count(), 6);
    /// assert_eq!(genome.nodes().filter(|n| n.node_type() == NodeType::Sensor).count(), 3);
    /// assert!(genome.genes().all(|g| g.weight().abs() <= 5.0));
    /// ```
    fn new<R: Rng + ?Sized>(config: &GeneticConfig, rng: &mut R) -> NNGenome {
        let input_count = config.input_count.get();
        let output_count = config.output_count.get();

        let mut genome = NNGenome {
            genes: BTreeMap::new(),
            nodes: BTreeMap::new(),
            node_pairings: BTreeSet::new(),
            fitness: None,
        };
        for i in 0..input_count {
            genome
                .nodes
                .insert(i, Node::new(i, NodeType::Sensor, ActivationType::Identity));
        }
        for o in 0..output_count {
            let id = input_count + o;
            let activation = config
                .output_activation_types
                .get(o)
                .copied()
                .unwrap_or(ActivationType::Sigmoid);
            genome
                .nodes
                .insert(id, Node::new(id, NodeType::Actuator, activation));
        }
        for i in 0..input_count {
            for o in 0..output_count {
                if rng.gen::<f32>() < config.initial_expression_chance {
                    let weight = Gene::random_weight(config, rng);
                    genome.add_gene_unchecked(o + i * output_count, i, input_count + o, weight);
                }
            }
        }

        genome
    }

    /// Calculates the _genetic distance_ between `first` and `second`,
    /// weighting excess genes, disjoint genes and the average weight
    /// difference of common genes as specified in `config`.
    ///
    /// A gene missing from the other genome is _excess_ if its
    /// innovation number is higher than all of the other genome's,
    /// and _disjoint_ otherwise.
    ///
    /// # Examples
    /// ```
    /// use neatpop::Genome;
    /// use neatpop_nn::genomics::{ActivationType, GeneticConfig, NNGenome};
    /// use std::num::NonZeroUsize;
    ///
    /// const EXCESS_FACTOR: f32 = 1.5;
    /// const DISJOINT_FACTOR: f32 = 0.5;
    /// const WEIGHT_FACTOR: f32 = 0.25;
    ///
    /// let config = GeneticConfig {
    ///     input_count: NonZeroUsize::new(2).unwrap(),
    ///     excess_gene_factor: EXCESS_FACTOR,
    ///     disjoint_gene_factor: DISJOINT_FACTOR,
    ///     common_weight_factor: WEIGHT_FACTOR,
    ///     ..GeneticConfig::zero()
    /// };
    ///
    /// let mut genome1 = NNGenome::new(&config, &mut rand::thread_rng());
    /// let mut genome2 = genome1.clone();
    /// genome1.add_node(3, ActivationType::Sigmoid).unwrap();
    /// genome2.add_node(3, ActivationType::Sigmoid).unwrap();
    ///
    /// // Common gene, weight difference of 2.0.
    /// genome1.add_gene(0, 0, 2, 1.0).unwrap();
    /// genome2.add_gene(0, 0, 2, -1.0).unwrap();
    /// // Disjoint genes.
    /// genome1.add_gene(1, 1, 2, 3.0).unwrap();
    /// genome2.add_gene(2, 1, 3, 1.0).unwrap();
    /// // Common gene, weight difference of 0.0.
    /// genome1.add_gene(3, 2, 3, 1.0).unwrap();
    /// genome2.add_gene(3, 2, 3, 1.0).unwrap();
    /// // Excess gene.
    /// genome1.add_gene(4, 3, 2, 3.0).unwrap();
    ///
    /// assert_eq!(
    ///     NNGenome::genetic_distance(&genome1, &genome2, &config),
    ///     DISJOINT_FACTOR * 2.0 + EXCESS_FACTOR * 1.0 + WEIGHT_FACTOR * (2.0 + 0.0) / 2.0
    /// );
    /// ```
    fn genetic_distance(first: &NNGenome, second: &NNGenome, config: &GeneticConfig) -> f32 {
        let (disjoint_first, excess_first) = first.count_unmatched_genes(second);
        let (disjoint_second, excess_second) = second.count_unmatched_genes(first);

        let weight_differences: Vec<f32> = first
            .genes
            .iter()
            .filter_map(|(id, gene)| {
                let other = second.genes.get(id)?;
                Some((gene.weight() - other.weight()).abs())
            })
            .collect();
        let average_weight_difference = if weight_differences.is_empty() {
            0.0
        } else {
            weight_differences.iter().sum::<f32>() / weight_differences.len() as f32
        };

        config.disjoint_gene_factor * (disjoint_first + disjoint_second) as f32
            + config.excess_gene_factor * (excess_first + excess_second) as f32
            + config.common_weight_factor * average_weight_difference
    }

    /// Combines two genomes into a child genome.
    ///
    /// The child inherits the structure of the fitter parent, or
    /// of both if they are equally fit. Weights of genes common
    /// to both parents are averaged with probability
    /// `config.mate_by_averaging_chance`, otherwise each is copied
    /// from a random parent. Genes suppressed in either parent
    /// are suppressed in the child, and are expressed again with
    /// probability `config.suppression_reset_chance`.
    ///
    /// # Examples
    /// ```
    /// use neatpop::Genome;
    /// use neatpop_nn::genomics::{GeneticConfig, History, NNGenome};
    /// use std::num::NonZeroUsize;
    ///
    /// let config = GeneticConfig {
    ///     input_count: NonZeroUsize::new(3).unwrap(),
    ///     output_count: NonZeroUsize::new(2).unwrap(),
    ///     initial_expression_chance: 1.0,
    ///     weight_bound: 1.0,
    ///     ..GeneticConfig::zero()
    /// };
    /// let mut rng = rand::thread_rng();
    /// let mut history = History::new(&config);
    ///
    /// let parent = NNGenome::new(&config, &mut rng);
    /// let parent_genes: Vec<_> = parent.genes().cloned().collect();
    ///
    /// // A genome can be "mated" with itself,
    /// // which implies asexual reproduction:
    /// let child = NNGenome::mate(&parent, &parent, &mut history, &config, &mut rng);
    /// assert!(child.genes().all(|g| parent_genes.contains(g)));
    /// assert_eq!(child.fitness(), None);
    /// ```
    fn mate<R: Rng + ?Sized>(
        parent1: &NNGenome,
        parent2: &NNGenome,
        _history: &mut History,
        config: &GeneticConfig,
        rng: &mut R,
    ) -> NNGenome {
        let score = |g: &NNGenome| g.fitness.unwrap_or(f32::NEG_INFINITY);
        let (fitter, other) = if score(parent1) >= score(parent2) {
            (parent1, parent2)
        } else {
            (parent2, parent1)
        };

        let mut child = fitter.clone();
        child.fitness = None;
        if score(fitter) == score(other) {
            child.add_noncommon_structure(other);
        }
        if rng.gen::<f32>() < config.mate_by_averaging_chance {
            child.average_common_genes(other);
        } else {
            child.randomly_choose_common_genes(other, rng);
        }
        child.reset_suppresseds(config, rng);

        child
    }

    fn mutate<R: Rng + ?Sized>(
        &mut self,
        mutation: Mutation,
        history: &mut History,
        config: &GeneticConfig,
        rng: &mut R,
    ) -> Result<(), MutationError> {
        let unapplicable = |reason: String| MutationError::Unapplicable { mutation, reason };
        match mutation {
            Mutation::AddNode => self
                .mutate_add_node(history, config, rng)
                .map(|_| ())
                .map_err(|e| unapplicable(e.to_string())),
            Mutation::AddConnection => self
                .mutate_add_gene(history, config, rng)
                .map(|_| ())
                .map_err(|e| unapplicable(e.to_string())),
        }
    }

    fn map_weights<F: FnMut(f32) -> f32>(&mut self, mut f: F) {
        for gene in self.genes.values_mut() {
            gene.set_weight(f(gene.weight()));
        }
    }

    fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Counts expressed genes only.
    fn connection_count(&self) -> usize {
        self.genes.values().filter(|g| !g.suppressed()).count()
    }

    /// Builds a [`FunctionApproximatorNetwork`] that allows no
    /// cycles, and returns its mean error over `dataset`.
    fn evaluate(&self, dataset: &[Sample], cost: Cost) -> Result<f32, EvaluationError> {
        let input_count = self.input_count();
        if let Some(sample) = dataset.iter().find(|s| s.inputs.len() != input_count) {
            return Err(EvaluationError::Failed(format!(
                "sample has {} inputs, the genome expects {}",
                sample.inputs.len(),
                input_count
            )));
        }
        let mut network = FunctionApproximatorNetwork::<1>::from(self);
        cost.error(dataset, |inputs| network.evaluate_at(inputs))
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

impl NNGenome {
    /// Adds a new gene to the genome.
    ///
    /// # Errors
    /// Fails if the gene's innovation number is already present,
    /// if either endpoint is missing, if a gene already connects
    /// the same endpoints, or if the output is a sensor node.
    ///
    /// # Examples
    /// ```
    /// use neatpop::Genome;
    /// use neatpop_nn::genomics::{GeneticConfig, NNGenome};
    ///
    /// let mut genome = NNGenome::new(&GeneticConfig::zero(), &mut rand::thread_rng());
    ///
    /// genome.add_gene(0, 0, 1, 2.5).unwrap();
    /// assert!(genome.add_gene(0, 1, 1, 1.0).is_err());
    /// assert!(genome.add_gene(1, 0, 1, 1.0).is_err());
    /// assert!(genome.add_gene(1, 1, 0, 1.0).is_err());
    /// assert!(genome.add_gene(1, 1, 7, 1.0).is_err());
    /// ```
    pub fn add_gene(
        &mut self,
        gene_id: Innovation,
        input_id: Innovation,
        output_id: Innovation,
        weight: f32,
    ) -> Result<&mut Gene, GeneValidityError> {
        self.check_gene_viability(gene_id, input_id, output_id)?;
        Ok(self.add_gene_unchecked(gene_id, input_id, output_id, weight))
    }

    fn add_gene_unchecked(
        &mut self,
        gene_id: Innovation,
        input_id: Innovation,
        output_id: Innovation,
        weight: f32,
    ) -> &mut Gene {
        if let Some(input) = self.nodes.get_mut(&input_id) {
            input.add_output_gene(gene_id);
        }
        if let Some(output) = self.nodes.get_mut(&output_id) {
            output.add_input_gene(gene_id);
        }
        self.node_pairings.insert((input_id, output_id));
        self.genes
            .entry(gene_id)
            .or_insert_with(|| Gene::new(gene_id, input_id, output_id, weight))
    }

    fn check_gene_viability(
        &self,
        gene_id: Innovation,
        input_id: Innovation,
        output_id: Innovation,
    ) -> Result<(), GeneValidityError> {
        use GeneValidityError::*;
        if self.genes.contains_key(&gene_id) {
            return Err(DuplicateGeneID(gene_id));
        }
        match (self.nodes.get(&input_id), self.nodes.get(&output_id)) {
            (Some(_), Some(output)) => {
                if self.node_pairings.contains(&(input_id, output_id)) {
                    Err(DuplicateGeneWithEndpoints(gene_id, input_id, output_id))
                } else if output.node_type() == NodeType::Sensor {
                    Err(SensorEndpoint(output_id))
                } else {
                    Ok(())
                }
            }
            _ => Err(NonexistentEndpoints(input_id, output_id)),
        }
    }

    /// Adds a new hidden node to the genome.
    ///
    /// # Errors
    /// Fails if the node's innovation number is already present.
    ///
    /// # Examples
    /// ```
    /// use neatpop::Genome;
    /// use neatpop_nn::genomics::{ActivationType, GeneticConfig, NNGenome};
    ///
    /// let mut genome = NNGenome::new(&GeneticConfig::zero(), &mut rand::thread_rng());
    ///
    /// genome.add_node(2, ActivationType::Sigmoid).unwrap();
    /// assert!(genome.add_node(2, ActivationType::ReLU).is_err());
    /// assert_eq!(genome.nodes().count(), 3);
    /// ```
    pub fn add_node(
        &mut self,
        node_id: Innovation,
        activation_type: ActivationType,
    ) -> Result<&mut Node, NodeValidityError> {
        if self.nodes.contains_key(&node_id) {
            return Err(NodeValidityError::DuplicateNodeID(node_id));
        }
        Ok(self.add_node_unchecked(node_id, activation_type))
    }

    fn add_node_unchecked(
        &mut self,
        node_id: Innovation,
        activation_type: ActivationType,
    ) -> &mut Node {
        self.nodes
            .entry(node_id)
            .or_insert_with(|| Node::new(node_id, NodeType::Neuron, activation_type))
    }

    /// Connects two previously unconnected nodes with a new gene
    /// of random weight. Self-loops are created with probability
    /// `config.recursion_chance`.
    ///
    /// At most `config.max_gene_addition_mutation_attempts`
    /// input nodes are tried before giving up.
    fn mutate_add_gene<R: Rng + ?Sized>(
        &mut self,
        history: &mut History,
        config: &GeneticConfig,
        rng: &mut R,
    ) -> Result<&Gene, GeneAdditionMutationError> {
        let potential_outputs: BTreeSet<Innovation> = self
            .nodes
            .values()
            .filter(|n| n.node_type() != NodeType::Sensor)
            .map(Node::innovation)
            .collect();
        let mut potential_inputs: Vec<Innovation> = self
            .nodes
            .values()
            .filter(|n| n.output_genes().count() < potential_outputs.len())
            .map(Node::innovation)
            .collect();

        if potential_inputs.is_empty() {
            return Err(GeneAdditionMutationError::GenomeFullyConnected);
        }
        potential_inputs.shuffle(rng);

        let pair = potential_inputs
            .iter()
            .take(config.max_gene_addition_mutation_attempts)
            .find_map(|input| {
                self.choose_output_node_for(*input, &potential_outputs, config, rng)
                    .map(|output| (*input, output))
            });
        let (input, output) = pair.ok_or(GeneAdditionMutationError::NoInputOutputPairFound)?;

        let gene_id = history.next_gene_innovation(input, output);
        history.add_gene_innovation(input, output);
        let weight = Gene::random_weight(config, rng);
        Ok(self.add_gene_unchecked(gene_id, input, output, weight))
    }

    fn choose_output_node_for<R: Rng + ?Sized>(
        &self,
        input: Innovation,
        potential_outputs: &BTreeSet<Innovation>,
        config: &GeneticConfig,
        rng: &mut R,
    ) -> Option<Innovation> {
        let can_recurse = potential_outputs.contains(&input)
            && !self.node_pairings.contains(&(input, input));
        if can_recurse && rng.gen::<f32>() < config.recursion_chance {
            return Some(input);
        }
        potential_outputs
            .iter()
            .copied()
            .filter(|output| *output != input && !self.node_pairings.contains(&(input, *output)))
            .choose(rng)
    }

    /// Splits a random expressed gene with a new node.
    ///
    /// The split gene is suppressed. The gene into the new node
    /// has weight 1.0, and the gene out of it a random weight.
    fn mutate_add_node<R: Rng + ?Sized>(
        &mut self,
        history: &mut History,
        config: &GeneticConfig,
        rng: &mut R,
    ) -> Result<&Node, NodeAdditionMutationError> {
        let (split_gene, endpoints) = self
            .genes
            .values()
            .filter(|g| !g.suppressed())
            .map(|g| (g.innovation(), g.endpoints()))
            .choose(rng)
            .ok_or(NodeAdditionMutationError::NoExpressedGenes)?;

        let mut duplicate = false;
        let mut innovations = history.next_node_innovation(split_gene, false);
        if self.nodes.contains_key(&innovations.1) {
            duplicate = true;
            innovations = history.next_node_innovation(split_gene, true);
        }
        history.add_node_innovation(split_gene, endpoints, duplicate);
        let (input_gene, new_node, output_gene) = innovations;

        if let Some(gene) = self.genes.get_mut(&split_gene) {
            gene.set_suppressed(true);
        }
        let activation = config
            .activation_types
            .choose(rng)
            .copied()
            .unwrap_or(ActivationType::Sigmoid);
        self.add_node_unchecked(new_node, activation);
        self.add_gene_unchecked(input_gene, endpoints.0, new_node, 1.0);
        let weight = Gene::random_weight(config, rng);
        self.add_gene_unchecked(output_gene, new_node, endpoints.1, weight);

        Ok(&self.nodes[&new_node])
    }

    /// Counts the genes of `self` missing from `other`,
    /// as `(disjoint, excess)`.
    fn count_unmatched_genes(&self, other: &NNGenome) -> (usize, usize) {
        let other_max = other.genes.keys().next_back().copied();
        self.genes
            .keys()
            .filter(|id| !other.genes.contains_key(id))
            .fold((0, 0), |(disjoint, excess), id| match other_max {
                Some(max) if *id < max => (disjoint + 1, excess),
                _ => (disjoint, excess + 1),
            })
    }

    fn add_noncommon_structure(&mut self, other: &NNGenome) {
        for (id, node) in &other.nodes {
            if !self.nodes.contains_key(id) {
                self.add_node_unchecked(*id, node.activation_type());
            }
        }
        for (id, gene) in &other.genes {
            if self
                .check_gene_viability(*id, gene.input(), gene.output())
                .is_ok()
            {
                self.add_gene_unchecked(*id, gene.input(), gene.output(), gene.weight())
                    .set_suppressed(gene.suppressed());
            }
        }
    }

    fn average_common_genes(&mut self, other: &NNGenome) {
        for (id, others_gene) in &other.genes {
            if let Some(own) = self.genes.get_mut(id) {
                own.set_weight((own.weight() + others_gene.weight()) / 2.0);
                if others_gene.suppressed() {
                    own.set_suppressed(true);
                }
            }
        }
    }

    fn randomly_choose_common_genes<R: Rng + ?Sized>(&mut self, other: &NNGenome, rng: &mut R) {
        for (id, others_gene) in &other.genes {
            if let Some(own) = self.genes.get_mut(id) {
                if rng.gen::<bool>() {
                    own.set_weight(others_gene.weight());
                }
                if others_gene.suppressed() {
                    own.set_suppressed(true);
                }
            }
        }
    }

    fn reset_suppresseds<R: Rng + ?Sized>(&mut self, config: &GeneticConfig, rng: &mut R) {
        for gene in self.genes.values_mut() {
            if gene.suppressed() && rng.gen::<f32>() < config.suppression_reset_chance {
                gene.set_suppressed(false);
            }
        }
    }

    /// Iterates over the genome's genes, by ascending innovation number.
    pub fn genes(&self) -> impl Iterator<Item = &Gene> {
        self.genes.values()
    }

    /// Iterates over the genome's nodes, by ascending innovation number.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Number of sensor nodes.
    pub fn input_count(&self) -> usize {
        self.nodes
            .values()
            .filter(|n| n.node_type() == NodeType::Sensor)
            .count()
    }
}

impl fmt::Display for NNGenome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let genes: Vec<String> = self.genes.values().map(Gene::to_string).collect();
        let nodes: Vec<String> = self.nodes.values().map(Node::to_string).collect();
        f.debug_struct("NNGenome")
            .field("genes", &genes)
            .field("nodes", &nodes)
            .field("fitness", &self.fitness)
            .finish()
    }
}
