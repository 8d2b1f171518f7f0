//! A Population is a collection of genomes.
//! These are grouped into species, which can
//! be evolved using a genome evaluation function
//! as the source of selective pressure.
mod checkpoint;
mod config;
mod culling;
mod errors;
pub mod logging;
mod mutation;
mod offspring_factory;
mod selection;
mod speciation;
mod species;
#[cfg(test)]
pub(crate) mod test_genome;

use crate::evaluation::{EvaluationError, Evaluator};
use crate::{Genome, InnovationHistory};
pub use checkpoint::{CheckpointError, CHECKPOINT_VERSION};
pub use config::{MutationConfig, PopulationConfig, StructuralLimits};
pub use culling::FitnessSummary;
pub use errors::{ConfigurationError, EvolutionError, InvariantError};
use offspring_factory::OffspringFactory;
pub use selection::Selection;
pub use species::{Species, SpeciesID};

use rand::Rng;
use serde::{Deserialize, Serialize};

/// The fittest genome seen so far, along with its fitness.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Champion<G> {
    pub genome: G,
    pub fitness: f32,
}

/// A population of genomes.
///
/// Every call to [`evolve`] runs one full generation:
/// evaluate, sort, track stagnation, speciate, cull, and
/// replace the members with the next generation's offspring.
///
/// [`evolve`]: Population::evolve
#[derive(Serialize, Deserialize)]
#[serde(bound(
    serialize = "C: Serialize, H: Serialize, G: Serialize",
    deserialize = "C: Deserialize<'de>, H: Deserialize<'de>, G: Deserialize<'de>"
))]
pub struct Population<C, H, G> {
    members: Vec<G>,
    species: Vec<Species<G>>,
    history: H,
    generation: usize,
    stagnation: usize,
    all_time_best: Option<Champion<G>>,
    population_config: PopulationConfig,
    genetic_config: C,
    #[serde(skip)]
    evaluator: Option<Evaluator<G>>,
}

/// Sort key for genomes. Unevaluated genomes rank last.
pub(crate) fn score<G: Genome>(genome: &G) -> f32 {
    genome.fitness().unwrap_or(f32::NEG_INFINITY)
}

/// Sorts genomes by descending fitness, keeping ties in order.
fn sort_by_fitness<G: Genome>(genomes: &mut [G]) {
    genomes.sort_by(|a, b| score(b).total_cmp(&score(a)));
}

impl<C, H, G> Population<C, H, G>
where
    H: InnovationHistory<Config = C>,
    G: Genome<InnovationHistory = H, Config = C> + Clone,
{
    /// Creates a new population using the passed configurations.
    ///
    /// The type of `genetic_config` depends on the implementation
    /// of [`Genome`], and is effectively opaque to the population.
    ///
    /// [`Genome`]: crate::Genome
    ///
    /// # Examples
    /// ```
    /// # use neatpop_nn::genomics::{GeneticConfig, NNGenome as G};
    /// use neatpop::{Population, PopulationConfig};
    ///
    /// let pop_config = PopulationConfig {
    ///     // Set desired configuration
    ///     size: std::num::NonZeroUsize::new(10).unwrap(),
    ///     ..PopulationConfig::zero()
    /// };
    /// # let genetic_config = GeneticConfig::zero();
    ///
    /// // With `G` a suitable type implementing `Genome`...
    /// let population = Population::<_, _, G>::new(pop_config, genetic_config);
    /// assert_eq!(population.members().len(), 10);
    /// assert_eq!(population.generation(), 0);
    /// ```
    pub fn new(population_config: PopulationConfig, genetic_config: C) -> Population<C, H, G> {
        Population::new_with_rng(population_config, genetic_config, &mut rand::thread_rng())
    }

    /// Like [`new`](Population::new), drawing randomness from `rng`.
    pub fn new_with_rng<R: Rng + ?Sized>(
        population_config: PopulationConfig,
        genetic_config: C,
        rng: &mut R,
    ) -> Population<C, H, G> {
        let founder = G::new(&genetic_config, rng);
        let members = std::iter::once(founder.clone())
            .chain((1..population_config.size.get()).map(|_| G::new(&genetic_config, rng)))
            .collect();
        Population {
            members,
            species: vec![Species::founder(SpeciesID(0, 0), founder)],
            history: H::new(&genetic_config),
            generation: 0,
            stagnation: 0,
            all_time_best: None,
            population_config,
            genetic_config,
            evaluator: None,
        }
    }

    /// Attaches the evaluator used to score unevaluated genomes.
    pub fn with_evaluator(mut self, evaluator: Evaluator<G>) -> Self {
        self.evaluator = Some(evaluator);
        self
    }

    /// Replaces the evaluator, e.g. after loading a checkpoint.
    pub fn set_evaluator(&mut self, evaluator: Option<Evaluator<G>>) {
        self.evaluator = evaluator;
    }

    /// Evaluates the fitness of each genome in the
    /// population using the passed function, then
    /// sorts the members by descending fitness.
    ///
    /// The return value of the evaluation function
    /// should be positive.
    ///
    /// # Errors
    /// Fails without touching any genome if some
    /// fitness is not finite.
    ///
    /// # Examples
    /// ```
    /// # use neatpop_nn::genomics::{GeneticConfig, NNGenome as G};
    /// # use neatpop_nn::networks::FunctionApproximatorNetwork;
    /// use neatpop::{Population, PopulationConfig};
    ///
    /// # let genetic_config = GeneticConfig::zero();
    /// // With `G` a suitable type implementing `Genome`...
    /// let mut population = Population::<_, _, G>::new(
    ///     PopulationConfig::zero(),
    ///     genetic_config,
    /// );
    ///
    /// population.evaluate_fitness(|g| {
    ///     # let mut network = FunctionApproximatorNetwork::<1>::from(g);
    ///     # // Networks with outputs closer to 0 are given higher scores.
    ///     # let fitness = 1.0 / (1.0 + network.evaluate_at(&[1.0])[0].abs());
    ///     // Compute genome's fitness...
    ///     return fitness;
    /// }).unwrap();
    /// assert!(population.champion().is_some());
    /// ```
    pub fn evaluate_fitness<E>(&mut self, mut evaluator: E) -> Result<(), EvaluationError>
    where
        E: FnMut(&G) -> f32,
    {
        let fitnesses = self
            .members
            .iter()
            .enumerate()
            .map(|(index, genome)| match evaluator(genome) {
                value if value.is_finite() => Ok(value),
                value => Err(EvaluationError::NonFiniteFitness { index, value }),
            })
            .collect::<Result<Vec<f32>, EvaluationError>>()?;
        for (genome, fitness) in self.members.iter_mut().zip(fitnesses) {
            genome.set_fitness(fitness);
        }
        sort_by_fitness(&mut self.members);
        Ok(())
    }

    /// Scores every member with the attached evaluator,
    /// then sorts them by descending fitness.
    ///
    /// # Errors
    /// Returns [`ConfigurationError::MissingFitness`] if
    /// no evaluator is attached.
    pub fn evaluate(&mut self) -> Result<(), EvolutionError>
    where
        G: Send + Sync,
    {
        match &self.evaluator {
            Some(evaluator) => evaluator.evaluate_all(&mut self.members)?,
            None => {
                return Err(ConfigurationError::MissingFitness {
                    unevaluated: self.members.len(),
                }
                .into())
            }
        }
        sort_by_fitness(&mut self.members);
        Ok(())
    }

    /// Evolves the population by one generation and
    /// returns the new members.
    ///
    /// If any member lacks a fitness, the whole population is
    /// scored with the attached evaluator first. Members are then
    /// sorted by fitness, population-wide stagnation is updated
    /// and genomes are re-speciated. If the population has stagnated
    /// for longer than the [stagnant limit], only the two fittest
    /// species reproduce. Stagnant species and the least fit members
    /// of the rest are culled, and the survivors breed the next
    /// generation in proportion to their shared fitness.
    ///
    /// # Errors
    /// Returns an error if fitness is missing and no evaluator
    /// is attached, the configuration is invalid, evaluation
    /// fails, or the generation can't be bred. The population
    /// is left untouched on error.
    ///
    /// [stagnant limit]: PopulationConfig::stagnant_limit
    ///
    /// # Examples
    /// ```
    /// # use neatpop_nn::genomics::{GeneticConfig, NNGenome as G};
    /// use neatpop::evaluation::{Evaluator, Sample};
    /// use neatpop::{Population, PopulationConfig};
    ///
    /// # let genetic_config = GeneticConfig::zero();
    /// let dataset = vec![Sample::new(vec![1.0], vec![0.0])];
    ///
    /// // With `G` a suitable type implementing `Genome`...
    /// let mut population = Population::<_, _, G>::new(
    ///     PopulationConfig::default(),
    ///     genetic_config,
    /// )
    /// .with_evaluator(Evaluator::new(dataset));
    ///
    /// match population.evolve() {
    ///     Ok(members) => assert_eq!(members.len(), 150),
    ///     Err(e) => eprintln!("{}", e),
    /// }
    /// ```
    pub fn evolve(&mut self) -> Result<&[G], EvolutionError>
    where
        H: Clone,
        G: Send + Sync,
    {
        self.evolve_with_rng(&mut rand::thread_rng())
    }

    /// Like [`evolve`](Population::evolve), drawing randomness from `rng`.
    pub fn evolve_with_rng<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<&[G], EvolutionError>
    where
        H: Clone,
        G: Send + Sync,
    {
        let config = &self.population_config;
        config.validate()?;
        let size = config.size.get();

        let mut members = self.members.clone();
        self.ensure_fitness(&mut members)?;
        sort_by_fitness(&mut members);

        let leader = members.first().ok_or(InvariantError::MemberCount {
            expected: size,
            actual: 0,
        })?;
        let best_fitness = score(leader);
        let (stagnation, all_time_best) = match &self.all_time_best {
            Some(best) if best_fitness <= best.fitness => {
                (self.stagnation + 1, self.all_time_best.clone())
            }
            _ => (
                0,
                Some(Champion {
                    genome: leader.clone(),
                    fitness: best_fitness,
                }),
            ),
        };

        let mut species = self.species.clone();
        let created = speciation::speciate(
            &members,
            &mut species,
            config.distance_threshold,
            self.generation,
            &self.genetic_config,
        );
        if stagnation > config.stagnant_limit {
            tracing::warn!(
                generation = self.generation,
                stagnation,
                "population stagnated, only the top two species reproduce"
            );
            speciation::narrow_to_top_two(&mut species)?;
        }

        let summary = culling::cull(
            &mut species,
            config.species_stagnant_limit,
            config.survival_threshold,
        )?;
        let averages: Vec<f32> = species.iter().map(Species::average_fitness).collect();
        let ranking = speciation::rank(&species);
        let mut allotment = offspring_factory::allot_offspring(&averages, &ranking, summary, size);
        allotment.retain_reproducing(&mut species);

        let mut history = self.history.clone();
        let offspring =
            OffspringFactory::new(&species, &mut history, &self.genetic_config, config)
                .generate_offspring(&allotment, rng);
        if offspring.len() != size {
            return Err(InvariantError::MemberCount {
                expected: size,
                actual: offspring.len(),
            }
            .into());
        }

        tracing::debug!(
            generation = self.generation,
            best_fitness,
            stagnation,
            species = species.len(),
            new_species = created,
            "evolved generation"
        );
        self.members = offspring;
        self.species = species;
        self.history = history;
        self.stagnation = stagnation;
        self.all_time_best = all_time_best;
        self.generation += 1;
        Ok(&self.members)
    }

    /// Scores `members` if any of them lacks a fitness,
    /// and rejects non-finite fitness values.
    fn ensure_fitness(&self, members: &mut [G]) -> Result<(), EvolutionError>
    where
        G: Send + Sync,
    {
        let unevaluated = members.iter().filter(|g| g.fitness().is_none()).count();
        if unevaluated > 0 {
            match &self.evaluator {
                Some(evaluator) => evaluator.evaluate_all(members)?,
                None => return Err(ConfigurationError::MissingFitness { unevaluated }.into()),
            }
        }
        match members
            .iter()
            .enumerate()
            .find_map(|(index, g)| g.fitness().filter(|f| !f.is_finite()).map(|v| (index, v)))
        {
            Some((index, value)) => Err(EvaluationError::NonFiniteFitness { index, value }.into()),
            None => Ok(()),
        }
    }

    /// Applies the population's mutation policy to `genome`.
    ///
    /// # Examples
    /// ```
    /// # use neatpop_nn::genomics::{GeneticConfig, NNGenome as G};
    /// use neatpop::{Genome, Population, PopulationConfig};
    ///
    /// # let genetic_config = GeneticConfig::zero();
    /// // With `G` a suitable type implementing `Genome`...
    /// let mut population = Population::<_, _, G>::new(PopulationConfig::default(), genetic_config);
    /// let mut genome = population.members()[0].clone();
    /// population.mutate(&mut genome, &mut rand::thread_rng());
    /// ```
    pub fn mutate<R: Rng + ?Sized>(&mut self, genome: &mut G, rng: &mut R) {
        mutation::apply(
            genome,
            &self.population_config.mutation,
            &mut self.history,
            &self.genetic_config,
            rng,
        );
    }

    /// Returns the fittest evaluated member, if any.
    pub fn champion(&self) -> Option<&G> {
        self.members
            .iter()
            .filter(|g| g.fitness().is_some())
            .max_by(|a, b| score(*a).total_cmp(&score(*b)))
    }

    /// Returns the fittest genome seen across all generations.
    pub fn all_time_best(&self) -> Option<&Champion<G>> {
        self.all_time_best.as_ref()
    }

    /// Returns the current members. After an evaluation they
    /// are sorted by descending fitness.
    pub fn members(&self) -> &[G] {
        &self.members
    }

    /// Returns an iterator over all current species.
    ///
    /// # Examples
    /// ```
    /// # use neatpop_nn::genomics::{GeneticConfig, NNGenome as G};
    /// use neatpop::{Population, PopulationConfig};
    ///
    /// # let genetic_config = GeneticConfig::zero();
    /// // With `G` a suitable type implementing `Genome`...
    /// let population = Population::<_, _, G>::new(PopulationConfig::zero(), genetic_config);
    ///
    /// for species in population.species() {
    ///     println!(
    ///         "Species {:?} has stagnated for {} generations",
    ///         species.id(),
    ///         species.time_stagnated(),
    ///     );
    /// }
    /// ```
    pub fn species(&self) -> impl Iterator<Item = &Species<G>> {
        self.species.iter()
    }

    /// Returns the current generation number.
    pub fn generation(&self) -> usize {
        self.generation
    }

    /// Returns the number of consecutive generations
    /// without a new all-time best fitness.
    pub fn stagnation(&self) -> usize {
        self.stagnation
    }

    /// Returns the population's innovation history.
    pub fn history(&self) -> &H {
        &self.history
    }

    pub fn config(&self) -> &PopulationConfig {
        &self.population_config
    }

    pub fn genetic_config(&self) -> &C {
        &self.genetic_config
    }

    pub fn evaluator(&self) -> Option<&Evaluator<G>> {
        self.evaluator.as_ref()
    }
}
