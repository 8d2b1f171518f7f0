use super::Population;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use std::io::{Read, Write};

/// Format version written into every checkpoint.
pub const CHECKPOINT_VERSION: u32 = 1;

/// Failures while saving or restoring a population.
#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("checkpoint I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed checkpoint: {0}")]
    Json(#[from] serde_json::Error),
    #[error("checkpoint has version {found}, expected {expected}")]
    VersionMismatch { found: u64, expected: u32 },
}

#[derive(Serialize)]
struct CheckpointRef<'a, P> {
    version: u32,
    population: &'a P,
}

#[derive(Deserialize)]
struct Envelope {
    version: Option<u64>,
    population: Value,
}

impl<C, H, G> Population<C, H, G> {
    /// Writes a snapshot of the whole population as JSON:
    /// members, species, stagnation, all-time best, configuration
    /// and innovation history. The evaluator is not saved.
    ///
    /// # Examples
    /// ```
    /// # use neatpop_nn::genomics::{GeneticConfig, NNGenome as G};
    /// use neatpop::{Population, PopulationConfig};
    ///
    /// # let genetic_config = GeneticConfig::zero();
    /// // With `G` a suitable type implementing `Genome`...
    /// let population = Population::<_, _, G>::new(PopulationConfig::default(), genetic_config);
    ///
    /// let mut buffer = vec![];
    /// population.save_checkpoint(&mut buffer).unwrap();
    /// let restored = Population::<_, _, G>::load_checkpoint(buffer.as_slice()).unwrap();
    /// assert_eq!(restored.members(), population.members());
    /// ```
    pub fn save_checkpoint<W: Write>(&self, writer: W) -> Result<(), CheckpointError>
    where
        C: Serialize,
        H: Serialize,
        G: Serialize,
    {
        let checkpoint = CheckpointRef {
            version: CHECKPOINT_VERSION,
            population: self,
        };
        serde_json::to_writer(writer, &checkpoint)?;
        Ok(())
    }

    /// Restores a population written by [`save_checkpoint`].
    /// Any evaluator has to be attached again.
    ///
    /// [`save_checkpoint`]: Population::save_checkpoint
    pub fn load_checkpoint<Rd: Read>(reader: Rd) -> Result<Population<C, H, G>, CheckpointError>
    where
        C: DeserializeOwned,
        H: DeserializeOwned,
        G: DeserializeOwned,
    {
        let envelope: Envelope = serde_json::from_reader(reader)?;
        match envelope.version {
            Some(version) if version == u64::from(CHECKPOINT_VERSION) => {
                Ok(serde_json::from_value(envelope.population)?)
            }
            found => Err(CheckpointError::VersionMismatch {
                found: found.unwrap_or(0),
                expected: CHECKPOINT_VERSION,
            }),
        }
    }
}
