use super::culling::FitnessSummary;
use super::mutation;
use super::species::Species;
use super::PopulationConfig;
use crate::Genome;

use rand::Rng;

/// Number of offspring slots given to each species.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(super) struct Allotment {
    /// Slots per species, in species-list order. A species'
    /// slots include its unmutated elite.
    pub(super) slots: Vec<usize>,
    /// Extra unmutated children drawn from the best species.
    pub(super) top_up: usize,
    /// Index of the best species.
    pub(super) best: usize,
}

impl Allotment {
    /// Total number of genomes the allotment produces.
    pub(super) fn total(&self) -> usize {
        self.slots.iter().sum::<usize>() + self.top_up
    }

    /// Drops every species (and its entry) that was given no slots.
    pub(super) fn retain_reproducing<G>(&mut self, species: &mut Vec<Species<G>>) {
        self.best = self.slots[..self.best].iter().filter(|n| **n > 0).count();
        let mut slots = self.slots.iter();
        species.retain(|_| slots.next().map_or(false, |n| *n > 0));
        self.slots.retain(|n| *n > 0);
    }
}

/// Splits `size` offspring slots between species in proportion
/// to their average shared fitness.
///
/// `ranking` lists species indices from best to worst. The two
/// best species always get at least one slot. Any other species
/// whose share is too small to breed beyond its elite gets none.
/// Shares are rounded down, then the largest allotments are
/// trimmed until the total fits (ties trim the worse species),
/// and whatever is left is topped up from the best species.
pub(super) fn allot_offspring(
    averages: &[f32],
    ranking: &[usize],
    summary: FitnessSummary,
    size: usize,
) -> Allotment {
    let species_count = averages.len();
    let population_average = summary.population_average();
    let shares: Vec<f32> = if population_average.is_finite() && population_average > 0.0 {
        averages
            .iter()
            .map(|a| a / population_average * size as f32 / summary.surviving_species as f32)
            .collect()
    } else {
        vec![size as f32 / species_count as f32; species_count]
    };

    let mut slots: Vec<usize> = shares.iter().map(|s| s.max(0.0).floor() as usize).collect();
    for (rank, index) in ranking.iter().enumerate() {
        slots[*index] = match (rank, slots[*index]) {
            (0 | 1, n) => n.max(1),
            (_, n) if n >= 2 => n,
            _ => 0,
        };
    }

    while slots.iter().sum::<usize>() > size {
        match ranking.iter().copied().max_by_key(|i| slots[*i]) {
            Some(largest) => slots[largest] -= 1,
            None => break,
        }
    }

    let top_up = size.saturating_sub(slots.iter().sum());
    Allotment {
        slots,
        top_up,
        best: ranking.first().copied().unwrap_or(0),
    }
}

/// Auxiliary type for offspring generation.
/// Handles all the tasks of generating a population's
/// offspring according to the specified configs
/// and allotted offspring.
pub(super) struct OffspringFactory<'a, G: Genome> {
    species: &'a [Species<G>],
    history: &'a mut G::InnovationHistory,
    genetic_config: &'a G::Config,
    population_config: &'a PopulationConfig,
}

impl<'a, G: Genome + Clone> OffspringFactory<'a, G> {
    pub(super) fn new(
        species: &'a [Species<G>],
        history: &'a mut G::InnovationHistory,
        genetic_config: &'a G::Config,
        population_config: &'a PopulationConfig,
    ) -> OffspringFactory<'a, G> {
        OffspringFactory {
            species,
            history,
            genetic_config,
            population_config,
        }
    }

    /// Generates the allotted offspring, species by species,
    /// followed by the top-up children. No offspring carries
    /// a fitness.
    pub(super) fn generate_offspring<R: Rng + ?Sized>(
        &mut self,
        allotment: &Allotment,
        rng: &mut R,
    ) -> Vec<G> {
        let all_species = self.species;
        let mut offspring = Vec::with_capacity(allotment.total());
        for (species, slots) in all_species.iter().zip(&allotment.slots) {
            if *slots == 0 {
                continue;
            }
            offspring.extend(Self::elite(species));
            for _ in 1..*slots {
                if let Some(mut child) = self.child_of(species, rng) {
                    mutation::apply(
                        &mut child,
                        &self.population_config.mutation,
                        self.history,
                        self.genetic_config,
                        rng,
                    );
                    offspring.push(child);
                }
            }
        }

        if let Some(best) = all_species.get(allotment.best) {
            for _ in 0..allotment.top_up {
                offspring.extend(self.child_of(best, rng));
            }
        }
        offspring
    }

    /// Unmutated copy of the species' best genome.
    fn elite(species: &Species<G>) -> Option<G> {
        let mut elite = species.best().or_else(|| species.members().next())?.clone();
        elite.clear_fitness();
        Some(elite)
    }

    fn child_of<R: Rng + ?Sized>(&mut self, species: &Species<G>, rng: &mut R) -> Option<G> {
        species.get_child(
            self.population_config.selection,
            self.population_config.sexual_reproduction_chance,
            self.history,
            self.genetic_config,
            rng,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::populations::species::SpeciesID;
    use crate::populations::test_genome::{ScalarGenome, ScalarHistory};
    use crate::populations::MutationConfig;

    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn summary(averages: &[f32]) -> FitnessSummary {
        FitnessSummary {
            surviving_species: averages.len(),
            total_average_fitness: averages.iter().sum(),
        }
    }

    fn allot(averages: &[f32], ranking: &[usize], size: usize) -> Allotment {
        allot_offspring(averages, ranking, summary(averages), size)
    }

    #[test]
    fn proportional_shares_fill_the_population() {
        let allotment = allot(&[3.0, 1.0], &[0, 1], 8);
        assert_eq!(allotment.slots, [6, 2]);
        assert_eq!(allotment.top_up, 0);
    }

    #[test]
    fn rounding_losses_are_topped_up_from_the_best() {
        let allotment = allot(&[1.0, 1.0, 1.0], &[2, 0, 1], 10);
        assert_eq!(allotment.slots, [3, 3, 3]);
        assert_eq!(allotment.top_up, 1);
        assert_eq!(allotment.best, 2);
        assert_eq!(allotment.total(), 10);
    }

    #[test]
    fn weak_species_are_dropped_but_top_two_kept() {
        let allotment = allot(&[10.0, 0.1, 0.1, 0.5], &[0, 3, 1, 2], 10);
        assert_eq!(allotment.slots[1], 0);
        assert_eq!(allotment.slots[2], 0);
        assert_eq!(allotment.slots[3], 1);
        assert_eq!(allotment.total(), 10);
    }

    #[test]
    fn overshoot_trims_the_worse_of_equals() {
        // Two species with a guaranteed slot each can't fit in 1.
        let allotment = allot(&[1.0, 1.0], &[1, 0], 1);
        assert_eq!(allotment.slots, [0, 1]);
        assert_eq!(allotment.total(), 1);
    }

    #[test]
    fn non_positive_fitness_splits_evenly() {
        let allotment = allot(&[0.0, 0.0], &[0, 1], 6);
        assert_eq!(allotment.slots, [3, 3]);
    }

    #[test]
    fn retain_reproducing_remaps_best() {
        let mut species: Vec<Species<ScalarGenome>> = (0..3)
            .map(|i| Species::new(SpeciesID(0, i), ScalarGenome::evaluated(0.0, 1.0)))
            .collect();
        let mut allotment = Allotment {
            slots: vec![0, 4, 2],
            top_up: 0,
            best: 2,
        };
        allotment.retain_reproducing(&mut species);
        assert_eq!(allotment.slots, [4, 2]);
        assert_eq!(allotment.best, 1);
        let ids: Vec<_> = species.iter().map(Species::id).collect();
        assert_eq!(ids, [SpeciesID(0, 1), SpeciesID(0, 2)]);
    }

    #[test]
    fn offspring_start_with_unmutated_elites() {
        let species = vec![
            Species::new(SpeciesID(0, 0), ScalarGenome::evaluated(1.0, 5.0)),
            Species::new(SpeciesID(0, 1), ScalarGenome::evaluated(9.0, 2.0)),
        ];
        let config = PopulationConfig {
            mutation: MutationConfig {
                weight_mutation_chance: 1.0,
                weight_nudge_chance: 0.0,
                ..MutationConfig::zero()
            },
            ..PopulationConfig::zero()
        };
        let mut history = ScalarHistory::default();
        let allotment = Allotment {
            slots: vec![2, 1],
            top_up: 2,
            best: 0,
        };
        let mut rng = StdRng::seed_from_u64(5);
        let offspring = OffspringFactory::new(&species, &mut history, &(), &config)
            .generate_offspring(&allotment, &mut rng);

        assert_eq!(offspring.len(), 5);
        assert!(offspring.iter().all(|g| g.fitness().is_none()));
        let values: Vec<f32> = offspring.iter().map(ScalarGenome::value).collect();
        assert_eq!(values, [1.0, 1.0, 9.0, 1.0, 1.0]);
        // Only the non-elite child of species 0 had its weight reset.
        assert_eq!(offspring[0].weights(), [0.0]);
        assert_ne!(offspring[1].weights(), [0.0]);
        assert_eq!(offspring[3].weights(), [0.0]);
    }
}
