use super::errors::InvariantError;
use super::speciation;
use super::species::Species;
use crate::Genome;

use serde::{Deserialize, Serialize};

/// Fitness totals over the species that survived culling.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FitnessSummary {
    /// Number of species left with a breeding pool.
    pub surviving_species: usize,
    /// Sum of every surviving species' average shared fitness.
    pub total_average_fitness: f32,
}

impl FitnessSummary {
    /// Average of the surviving species' average shared fitness.
    ///
    /// # Examples
    /// ```
    /// use neatpop::FitnessSummary;
    ///
    /// let summary = FitnessSummary {
    ///     surviving_species: 4,
    ///     total_average_fitness: 10.0,
    /// };
    /// assert_eq!(summary.population_average(), 2.5);
    /// assert_eq!(FitnessSummary::default().population_average(), 0.0);
    /// ```
    pub fn population_average(&self) -> f32 {
        if self.surviving_species == 0 {
            0.0
        } else {
            self.total_average_fitness / self.surviving_species as f32
        }
    }

    fn include(self, species_average: f32) -> FitnessSummary {
        FitnessSummary {
            surviving_species: self.surviving_species + 1,
            total_average_fitness: self.total_average_fitness + species_average,
        }
    }
}

/// Removes stagnant and empty species, trims the rest down
/// to their breeding pools and computes shared fitness.
///
/// Species whose stagnation exceeds `species_stagnant_limit`
/// are dropped along with their members, unless every species
/// has stagnated: then the one with the best current fitness is
/// kept and its stagnation is reset. Every other species keeps
/// its top `survival_threshold` fraction of members.
///
/// # Errors
/// Returns [`InvariantError::Extinct`] if no species has members.
pub(super) fn cull<G: Genome + Clone>(
    species: &mut Vec<Species<G>>,
    species_stagnant_limit: usize,
    survival_threshold: f32,
) -> Result<FitnessSummary, InvariantError> {
    let stagnant = |s: &Species<G>| s.time_stagnated() > species_stagnant_limit;
    species.retain(|s| !s.is_empty());
    if !species.is_empty() && species.iter().all(|s| stagnant(s)) {
        let best = speciation::rank(species)[0];
        tracing::debug!(
            species = ?species[best].id(),
            "every species stagnated, sparing the fittest"
        );
        species[best].reset_stagnation();
    }
    species.retain(|s| !stagnant(s));
    for s in species.iter_mut() {
        s.sift(survival_threshold);
    }

    let summary = species
        .iter_mut()
        .filter_map(Species::share_fitness)
        .fold(FitnessSummary::default(), FitnessSummary::include);

    if summary.surviving_species == 0 {
        Err(InvariantError::Extinct)
    } else {
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::populations::species::SpeciesID;
    use crate::populations::test_genome::ScalarGenome;

    fn species(index: usize, fitnesses: &[f32], stagnation: usize) -> Species<ScalarGenome> {
        let mut s = Species::founder(SpeciesID(0, index), ScalarGenome::with_value(0.0));
        for f in fitnesses {
            s.add_member(ScalarGenome::evaluated(0.0, *f));
        }
        s.set_stagnation(stagnation);
        s
    }

    #[test]
    fn species_past_stagnant_limit_are_removed() {
        let mut all = vec![species(0, &[4.0], 16), species(1, &[2.0], 15)];
        cull(&mut all, 15, 1.0).unwrap();
        let ids: Vec<_> = all.iter().map(Species::id).collect();
        assert_eq!(ids, [SpeciesID(0, 1)]);
    }

    #[test]
    fn summary_reduces_species_averages() {
        let mut all = vec![
            species(0, &[8.0, 4.0, 2.0, 1.0], 0),
            species(1, &[3.0], 0),
        ];
        let summary = cull(&mut all, 15, 0.5).unwrap();

        // Species 0 keeps [8, 4], shared as [4, 2].
        assert_eq!(all[0].shared_fitness(), [4.0, 2.0]);
        assert_eq!(all[0].average_fitness(), 3.0);
        assert_eq!(all[1].average_fitness(), 3.0);
        assert_eq!(
            summary,
            FitnessSummary {
                surviving_species: 2,
                total_average_fitness: 6.0
            }
        );
    }

    #[test]
    fn average_matches_shared_fitness() {
        let mut all = vec![species(0, &[5.0, 3.0, 1.5], 0)];
        cull(&mut all, 15, 1.0).unwrap();
        let s = &all[0];
        for (genome, shared) in s.members().zip(s.shared_fitness()) {
            assert_eq!(*shared, genome.fitness().unwrap() / 3.0);
        }
        let mean = s.shared_fitness().iter().sum::<f32>() / s.len() as f32;
        assert!((mean - s.average_fitness()).abs() < 1e-6);
    }

    #[test]
    fn species_without_breeding_pool_are_removed() {
        let mut all = vec![species(0, &[], 0), species(1, &[1.0], 0)];
        let summary = cull(&mut all, 15, 0.5).unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(summary.surviving_species, 1);
    }

    #[test]
    fn zero_threshold_keeps_each_leader() {
        let mut all = vec![species(0, &[2.0, 1.0], 0), species(1, &[3.0], 0)];
        let summary = cull(&mut all, 15, 0.0).unwrap();
        assert_eq!(summary.surviving_species, 2);
        assert!(all.iter().all(|s| s.len() == 1));
    }

    #[test]
    fn fittest_species_is_spared_when_all_stagnate() {
        let mut all = vec![
            species(0, &[1.0], 16),
            species(1, &[5.0, 2.0], 20),
            species(2, &[3.0], 17),
        ];
        for s in all.iter_mut() {
            let leader = s.members().next().cloned().unwrap();
            s.set_best(&leader);
        }
        let summary = cull(&mut all, 15, 1.0).unwrap();
        assert_eq!(summary.surviving_species, 1);
        assert_eq!(all[0].id(), SpeciesID(0, 1));
        assert_eq!(all[0].time_stagnated(), 0);
    }

    #[test]
    fn memberless_species_are_extinct() {
        let mut all = vec![species(0, &[], 0), species(1, &[], 30)];
        assert_eq!(cull(&mut all, 15, 0.5), Err(InvariantError::Extinct));
        assert!(all.is_empty());
    }
}
