use super::score;
use super::selection::Selection;
use crate::Genome;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Species identifier. Specifies
/// the generation in which the species
/// was born, and the count of other species
/// generated in the _same generation_ before
/// the one identified (i.e, if it was the
/// third species born in generation 5, it
/// will be species [5, 2]).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct SpeciesID(pub usize, pub usize);

/// Species are collections of reproductively
/// compatible (within a certain [genetic distance])
/// genomes. Membership is determined by calculating
/// the genetic distance to a _representative_,
/// which is the first genome of the species to
/// exist, and stays fixed for the species' lifetime.
///
/// Membership is rebuilt from scratch every generation.
/// The first (and fittest) genome placed in a species
/// each generation decides whether the species improved
/// on its all-time best fitness, or stagnated for one
/// more generation.
///
/// [genetic distance]: crate::PopulationConfig::distance_threshold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Species<G> {
    id: SpeciesID,
    representative: G,
    pub(super) members: Vec<G>,
    shared_fitness: Vec<f32>,
    best: Option<G>,
    all_time_best: Option<f32>,
    average_fitness: f32,
    stagnation: usize,
}

impl<G: Genome + Clone> Species<G> {
    /// Creates a new species with the specified ID and
    /// representative. The representative is also the
    /// species' sole member, its best genome, and sets its
    /// all-time best fitness.
    ///
    /// # Examples
    /// ```
    /// # use neatpop_nn::genomics::{GeneticConfig, NNGenome};
    /// use neatpop::{Genome, Species, SpeciesID};
    ///
    /// # let mut rng = rand::thread_rng();
    /// let mut genome = NNGenome::new(&GeneticConfig::zero(), &mut rng);
    /// genome.set_fitness(3.0);
    /// let species = Species::new(SpeciesID(1, 0), genome);
    ///
    /// assert_eq!(species.members().count(), 1);
    /// assert_eq!(species.all_time_best(), Some(3.0));
    /// assert_eq!(species.time_stagnated(), 0);
    /// ```
    pub fn new(id: SpeciesID, representative: G) -> Species<G> {
        let mut species = Species::founder(id, representative.clone());
        species.set_best(&representative);
        species.all_time_best = representative.fitness();
        species.members.push(representative);
        species
    }

    /// Creates an empty species anchored on `representative`.
    /// Used to seed a brand-new population, whose genomes
    /// are placed during the first speciation.
    pub(super) fn founder(id: SpeciesID, representative: G) -> Species<G> {
        Species {
            id,
            representative,
            members: vec![],
            shared_fitness: vec![],
            best: None,
            all_time_best: None,
            average_fitness: 0.0,
            stagnation: 0,
        }
    }

    /// Returns the species' ID.
    pub fn id(&self) -> SpeciesID {
        self.id
    }

    /// Returns the species' representative.
    pub fn representative(&self) -> &G {
        &self.representative
    }

    /// Returns the genetic distance between the species'
    /// representative and `other`.
    pub fn genetic_distance(&self, other: &G, config: &G::Config) -> f32 {
        G::genetic_distance(&self.representative, other, config)
    }

    /// Returns whether `candidate` is close enough to
    /// the representative to belong to the species.
    ///
    /// # Examples
    /// ```
    /// # use neatpop_nn::genomics::{GeneticConfig, NNGenome};
    /// use neatpop::{Genome, Species, SpeciesID};
    ///
    /// let config = GeneticConfig::zero();
    /// # let mut rng = rand::thread_rng();
    /// let representative = NNGenome::new(&config, &mut rng);
    /// let species = Species::new(SpeciesID(0, 0), representative.clone());
    ///
    /// // Identical genomes have a distance of 0.
    /// assert!(species.is_compatible(&representative, 0.5, &config));
    /// assert!(!species.is_compatible(&representative, 0.0, &config));
    /// ```
    pub fn is_compatible(&self, candidate: &G, threshold: f32, config: &G::Config) -> bool {
        self.genetic_distance(candidate, config) < threshold
    }

    /// Adds a genome to the species.
    pub fn add_member(&mut self, genome: G) {
        self.members.push(genome);
    }

    /// Removes every member, along with any
    /// fitness statistics computed from them.
    pub fn clear_members(&mut self) {
        self.members.clear();
        self.shared_fitness.clear();
        self.best = None;
        self.average_fitness = 0.0;
    }

    /// Records `genome` as the species' current-generation best.
    pub fn set_best(&mut self, genome: &G) {
        self.best = Some(genome.clone());
    }

    /// Records a new all-time best fitness.
    pub fn set_all_time_best(&mut self, fitness: f32) {
        self.all_time_best = Some(fitness);
    }

    pub fn increment_stagnation(&mut self) {
        self.stagnation += 1;
    }

    pub fn reset_stagnation(&mut self) {
        self.stagnation = 0;
    }

    /// Updates the species' records with the first (fittest)
    /// genome placed in it this generation.
    pub(super) fn record_leader(&mut self, leader: &G) {
        self.set_best(leader);
        let fitness = score(leader);
        if self.all_time_best.map_or(true, |best| fitness > best) {
            self.reset_stagnation();
            self.set_all_time_best(fitness);
        } else {
            self.increment_stagnation();
        }
    }

    /// Keeps only the top `survival_threshold` fraction of members
    /// (rounded up, and never fewer than one), which must be sorted
    /// by descending fitness. Returns the number of survivors.
    pub(super) fn sift(&mut self, survival_threshold: f32) -> usize {
        let survivors = self.count_survivors(survival_threshold);
        self.members.truncate(survivors);
        survivors
    }

    pub(super) fn count_survivors(&self, survival_threshold: f32) -> usize {
        ((self.members.len() as f32 * survival_threshold).ceil() as usize)
            .max(1)
            .min(self.members.len())
    }

    /// Computes every member's shared fitness (fitness divided
    /// by member count) and the species' average shared fitness.
    /// Returns the average, or `None` for an empty species.
    pub(super) fn share_fitness(&mut self) -> Option<f32> {
        if self.members.is_empty() {
            return None;
        }
        let count = self.members.len() as f32;
        self.shared_fitness = self.members.iter().map(|g| score(g) / count).collect();
        self.average_fitness = self.shared_fitness.iter().sum::<f32>() / count;
        Some(self.average_fitness)
    }

    /// Breeds a new genome from the species' members. Parents
    /// are picked with `selection`; with `sexual_reproduction_chance`
    /// two parents are mated, otherwise the first is cloned.
    ///
    /// The child carries no fitness. Returns `None` for
    /// an empty species.
    pub fn get_child<R: Rng + ?Sized>(
        &self,
        selection: Selection,
        sexual_reproduction_chance: f32,
        history: &mut G::InnovationHistory,
        config: &G::Config,
        rng: &mut R,
    ) -> Option<G> {
        let parent1 = selection.select(&self.members, rng)?;
        let mut child = if self.members.len() > 1 && rng.gen::<f32>() < sexual_reproduction_chance
        {
            let parent2 = selection.select(&self.members, rng)?;
            G::mate(parent1, parent2, history, config, rng)
        } else {
            parent1.clone()
        };
        child.clear_fitness();
        Some(child)
    }

    /// Returns an iterator over the species' members.
    pub fn members(&self) -> impl Iterator<Item = &G> {
        self.members.iter()
    }

    /// Returns the members' shared fitnesses, in member order.
    /// Empty until the species has been culled this generation.
    pub fn shared_fitness(&self) -> &[f32] {
        &self.shared_fitness
    }

    /// Returns the average shared fitness of the species'
    /// surviving members.
    pub fn average_fitness(&self) -> f32 {
        self.average_fitness
    }

    /// Returns the current generation's best genome.
    pub fn best(&self) -> Option<&G> {
        self.best.as_ref()
    }

    /// Returns the current generation's best fitness.
    pub fn best_fitness(&self) -> Option<f32> {
        self.best.as_ref().and_then(Genome::fitness)
    }

    /// Returns the best fitness the species has ever reached.
    pub fn all_time_best(&self) -> Option<f32> {
        self.all_time_best
    }

    /// Returns the number of generations the species
    /// has gone without improving its all-time best.
    pub fn time_stagnated(&self) -> usize {
        self.stagnation
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    #[cfg(test)]
    pub(super) fn set_stagnation(&mut self, stagnation: usize) {
        self.stagnation = stagnation;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::populations::test_genome::{ScalarGenome, ScalarHistory};

    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn species_with(fitnesses: &[f32]) -> Species<ScalarGenome> {
        let mut species = Species::founder(SpeciesID(0, 0), ScalarGenome::with_value(0.0));
        for f in fitnesses {
            species.add_member(ScalarGenome::evaluated(0.0, *f));
        }
        species
    }

    #[test]
    fn leader_improvement_resets_stagnation() {
        let mut species = species_with(&[]);
        species.set_stagnation(4);
        species.record_leader(&ScalarGenome::evaluated(0.0, 2.0));
        assert_eq!(species.time_stagnated(), 0);
        assert_eq!(species.all_time_best(), Some(2.0));
        assert_eq!(species.best_fitness(), Some(2.0));
    }

    #[test]
    fn leader_without_improvement_stagnates() {
        let mut species = species_with(&[]);
        species.record_leader(&ScalarGenome::evaluated(0.0, 2.0));
        species.record_leader(&ScalarGenome::evaluated(0.0, 2.0));
        species.record_leader(&ScalarGenome::evaluated(0.0, 1.0));
        assert_eq!(species.time_stagnated(), 2);
        assert_eq!(species.all_time_best(), Some(2.0));
        assert_eq!(species.best_fitness(), Some(1.0));
    }

    #[test]
    fn sift_keeps_top_fraction_rounded_up() {
        let mut species = species_with(&[5.0, 4.0, 3.0, 2.0, 1.0]);
        assert_eq!(species.sift(0.5), 3);
        let kept: Vec<_> = species.members().map(|g| g.fitness().unwrap()).collect();
        assert_eq!(kept, [5.0, 4.0, 3.0]);
    }

    #[test]
    fn sift_always_keeps_the_leader() {
        let mut species = species_with(&[3.0, 2.0, 1.0]);
        assert_eq!(species.sift(0.0), 1);
        assert_eq!(species.members().next().and_then(Genome::fitness), Some(3.0));
        assert_eq!(species_with(&[]).sift(0.0), 0);
    }

    #[test]
    fn shared_fitness_is_divided_by_member_count() {
        let mut species = species_with(&[6.0, 3.0, 3.0]);
        let average = species.share_fitness().unwrap();
        assert_eq!(species.shared_fitness(), [2.0, 1.0, 1.0]);
        assert_eq!(species.shared_fitness().iter().sum::<f32>() / 3.0, average);
        assert_eq!(species.average_fitness(), 4.0 / 3.0);
    }

    #[test]
    fn empty_species_has_no_shared_fitness() {
        assert_eq!(species_with(&[]).share_fitness(), None);
    }

    #[test]
    fn clear_members_forgets_statistics() {
        let mut species = species_with(&[2.0]);
        species.record_leader(&ScalarGenome::evaluated(0.0, 2.0));
        species.share_fitness();
        species.clear_members();
        assert!(species.is_empty());
        assert!(species.shared_fitness().is_empty());
        assert_eq!(species.best(), None);
        assert_eq!(species.all_time_best(), Some(2.0));
    }

    #[test]
    fn child_has_no_fitness() {
        let species = species_with(&[2.0, 1.0]);
        let mut rng = StdRng::seed_from_u64(9);
        let mut history = ScalarHistory::default();
        for chance in [0.0, 1.0] {
            let child = species
                .get_child(
                    Selection::FitnessProportionate,
                    chance,
                    &mut history,
                    &(),
                    &mut rng,
                )
                .unwrap();
            assert_eq!(child.fitness(), None);
        }
    }

    #[test]
    fn empty_species_has_no_child() {
        let species = species_with(&[]);
        let mut rng = StdRng::seed_from_u64(9);
        assert!(species
            .get_child(
                Selection::FitnessProportionate,
                1.0,
                &mut ScalarHistory::default(),
                &(),
                &mut rng
            )
            .is_none());
    }
}
