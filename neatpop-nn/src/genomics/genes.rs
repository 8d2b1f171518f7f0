use crate::genomics::GeneticConfig;
use crate::Innovation;

use rand::Rng;
use serde::{Deserialize, Serialize};

use std::fmt;

/// A weighted connection between two nodes.
/// Expressed genes become network connections
/// in the genome's phenotype.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Gene {
    id: Innovation,
    input: Innovation,
    output: Innovation,
    weight: f32,
    suppressed: bool,
}

impl Gene {
    /// Returns a new expressed gene.
    ///
    /// # Examples
    /// ```
    /// use neatpop_nn::genomics::Gene;
    ///
    /// let gene = Gene::new(42, 3, 9, 2.0);
    /// assert_eq!((gene.input(), gene.output()), (3, 9));
    /// assert!(!gene.suppressed());
    /// ```
    pub fn new(id: Innovation, input: Innovation, output: Innovation, weight: f32) -> Gene {
        Gene {
            id,
            input,
            output,
            weight,
            suppressed: false,
        }
    }

    /// Uniform weight in ±`config.weight_bound`.
    pub(super) fn random_weight<R: Rng + ?Sized>(config: &GeneticConfig, rng: &mut R) -> f32 {
        let bound = config.weight_bound;
        if bound > 0.0 {
            rng.gen_range(-bound..=bound)
        } else {
            0.0
        }
    }

    pub fn innovation(&self) -> Innovation {
        self.id
    }

    /// Innovation number of the node the gene leaves from.
    pub fn input(&self) -> Innovation {
        self.input
    }

    /// Innovation number of the node the gene leads into.
    pub fn output(&self) -> Innovation {
        self.output
    }

    pub fn weight(&self) -> f32 {
        self.weight
    }

    pub fn set_weight(&mut self, weight: f32) {
        self.weight = weight;
    }

    /// Suppressed genes are kept in the genome
    /// but are not expressed in its networks.
    pub fn suppressed(&self) -> bool {
        self.suppressed
    }

    /// # Examples
    /// ```
    /// use neatpop_nn::genomics::Gene;
    ///
    /// let mut gene = Gene::new(42, 3, 9, 2.0);
    /// gene.set_suppressed(true);
    /// assert!(gene.suppressed());
    /// ```
    pub fn set_suppressed(&mut self, suppressed: bool) {
        self.suppressed = suppressed;
    }

    pub(super) fn endpoints(&self) -> (Innovation, Innovation) {
        (self.input, self.output)
    }
}

impl fmt::Display for Gene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (open, close) = if self.suppressed { ("(", ")") } else { ("", "") };
        write!(
            f,
            "{}{}[{}->{}, {:.3}]{}",
            open, self.id, self.input, self.output, self.weight, close,
        )
    }
}
