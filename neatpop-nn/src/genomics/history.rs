use crate::genomics::GeneticConfig;
use crate::Innovation;

use ahash::RandomState;
use neatpop::InnovationHistory;
use serde::{Deserialize, Serialize};

use std::collections::hash_map::{Entry, HashMap};

/// A `History` keeps track of gene and node innovations in a
/// population, so that identical mutations in different genomes
/// are assigned the same innovation numbers.
///
/// Gene innovations are identified by their endpoints.
/// Node innovations are identified by the gene they split, and
/// record the innovation numbers of the input gene, new node,
/// and output gene, in that order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "HistoryRecord", into = "HistoryRecord")]
pub struct History {
    next_gene_innovation: Innovation,
    next_node_innovation: Innovation,
    gene_innovations: HashMap<(Innovation, Innovation), Innovation, RandomState>,
    gene_endpoints: Vec<(Innovation, Innovation)>,
    node_innovations: HashMap<Innovation, (Innovation, Innovation, Innovation), RandomState>,
}

/// Serialized form of a [`History`]. Gene innovation
/// numbers are positions in `gene_endpoints`.
#[derive(Serialize, Deserialize)]
struct HistoryRecord {
    next_node_innovation: Innovation,
    gene_endpoints: Vec<(Innovation, Innovation)>,
    node_innovations: Vec<(Innovation, (Innovation, Innovation, Innovation))>,
}

impl From<HistoryRecord> for History {
    fn from(record: HistoryRecord) -> History {
        History {
            next_gene_innovation: record.gene_endpoints.len(),
            next_node_innovation: record.next_node_innovation,
            gene_innovations: record
                .gene_endpoints
                .iter()
                .enumerate()
                .map(|(id, endpoints)| (*endpoints, id))
                .collect(),
            gene_endpoints: record.gene_endpoints,
            node_innovations: record.node_innovations.into_iter().collect(),
        }
    }
}

impl From<History> for HistoryRecord {
    fn from(history: History) -> HistoryRecord {
        let mut node_innovations: Vec<_> = history.node_innovations.into_iter().collect();
        node_innovations.sort_unstable();
        HistoryRecord {
            next_node_innovation: history.next_node_innovation,
            gene_endpoints: history.gene_endpoints,
            node_innovations,
        }
    }
}

impl InnovationHistory for History {
    type Config = GeneticConfig;

    fn new(config: &GeneticConfig) -> History {
        History::new(config)
    }
}

impl History {
    /// Creates a history holding the initial genes of `config`.
    ///
    /// The gene from input `i` to output index `o` has innovation
    /// number `o + i ⨯ output_count`, so innovations created by
    /// mutation start at `input_count ⨯ output_count`.
    ///
    /// # Examples
    /// ```
    /// use neatpop_nn::genomics::{GeneticConfig, History};
    /// use std::num::NonZeroUsize;
    ///
    /// let history = History::new(&GeneticConfig {
    ///     input_count: NonZeroUsize::new(3).unwrap(),
    ///     output_count: NonZeroUsize::new(2).unwrap(),
    ///     ..GeneticConfig::zero()
    /// });
    /// assert_eq!(history.max_gene_innovation(), 5);
    /// assert_eq!(history.max_node_innovation(), 4);
    /// ```
    pub fn new(config: &GeneticConfig) -> History {
        let input_count = config.input_count.get();
        let output_count = config.output_count.get();
        let gene_endpoints: Vec<_> = (0..input_count)
            .flat_map(|i| (0..output_count).map(move |o| (i, input_count + o)))
            .collect();
        History {
            next_gene_innovation: gene_endpoints.len(),
            next_node_innovation: input_count + output_count,
            gene_innovations: gene_endpoints
                .iter()
                .enumerate()
                .map(|(id, endpoints)| (*endpoints, id))
                .collect(),
            gene_endpoints,
            node_innovations: HashMap::default(),
        }
    }

    /// Returns the innovation number a gene between the two
    /// nodes has, or would be given if it were new.
    pub(crate) fn next_gene_innovation(&self, input: Innovation, output: Innovation) -> Innovation {
        self.gene_innovations
            .get(&(input, output))
            .copied()
            .unwrap_or(self.next_gene_innovation)
    }

    /// Returns the `(input gene, new node, output gene)` innovation
    /// numbers a split of `split_gene` has, or would be given if
    /// it were new.
    ///
    /// A genome that already split the same gene needs fresh
    /// numbers to avoid duplicating its own structure; it
    /// asks for them by setting `duplicate`.
    pub(crate) fn next_node_innovation(
        &self,
        split_gene: Innovation,
        duplicate: bool,
    ) -> (Innovation, Innovation, Innovation) {
        match self.node_innovations.get(&split_gene) {
            Some(record) if !duplicate => *record,
            _ => (
                self.next_gene_innovation,
                self.next_node_innovation,
                self.next_gene_innovation + 1,
            ),
        }
    }

    /// Records a gene between the two nodes, if it is new.
    pub(crate) fn add_gene_innovation(&mut self, input: Innovation, output: Innovation) {
        if let Entry::Vacant(entry) = self.gene_innovations.entry((input, output)) {
            entry.insert(self.next_gene_innovation);
            self.gene_endpoints.push((input, output));
            self.next_gene_innovation += 1;
        }
    }

    /// Records a split of `split_gene`, which runs between
    /// `endpoints`, if it is new or `duplicate` is set. A
    /// duplicate split replaces the previous record.
    pub(crate) fn add_node_innovation(
        &mut self,
        split_gene: Innovation,
        endpoints: (Innovation, Innovation),
        duplicate: bool,
    ) {
        if duplicate || !self.node_innovations.contains_key(&split_gene) {
            let new_node = self.next_node_innovation;
            self.next_node_innovation += 1;

            let input_gene = self.next_gene_innovation;
            self.add_gene_innovation(endpoints.0, new_node);
            let output_gene = self.next_gene_innovation;
            self.add_gene_innovation(new_node, endpoints.1);

            self.node_innovations
                .insert(split_gene, (input_gene, new_node, output_gene));
        }
    }

    /// Returns the highest gene innovation number generated.
    pub fn max_gene_innovation(&self) -> Innovation {
        self.next_gene_innovation.saturating_sub(1)
    }

    /// Returns the highest node innovation number generated.
    pub fn max_node_innovation(&self) -> Innovation {
        self.next_node_innovation.saturating_sub(1)
    }

    /// Iterates over every gene innovation, as
    /// `((input node, output node), gene innovation)`.
    /// No ordering is guaranteed.
    ///
    /// # Examples
    /// ```
    /// use neatpop::{Genome, Mutation};
    /// use neatpop_nn::genomics::{GeneticConfig, History, NNGenome};
    /// use rand::SeedableRng;
    /// use rand::rngs::StdRng;
    ///
    /// let config = GeneticConfig {
    ///     initial_expression_chance: 1.0,
    ///     ..GeneticConfig::zero()
    /// };
    /// let mut rng = StdRng::seed_from_u64(0);
    /// let mut history = History::new(&config);
    ///
    /// let mut genome = NNGenome::new(&config, &mut rng);
    /// genome.mutate(Mutation::AddNode, &mut history, &config, &mut rng).unwrap();
    ///
    /// // The initial gene, and the two around the new node.
    /// assert_eq!(history.gene_innovation_history().count(), 3);
    /// ```
    pub fn gene_innovation_history(
        &self,
    ) -> impl Iterator<Item = (&(Innovation, Innovation), &Innovation)> {
        self.gene_innovations.iter()
    }

    /// Iterates over every node innovation, as
    /// `(split gene, (input gene, new node, output gene))`.
    /// No ordering is guaranteed.
    pub fn node_innovation_history(
        &self,
    ) -> impl Iterator<Item = (&Innovation, &(Innovation, Innovation, Innovation))> {
        self.node_innovations.iter()
    }
}
