use super::{Population, SpeciesID};

use crate::genome::{Genome, InnovationHistory};

use std::fmt;

/// Defines different possible reporting levels for logging.
#[derive(Clone, Copy, Debug)]
pub enum ReportingLevel {
    /// Clones the entire population.
    AllGenomes,
    /// Clones species and their champions.
    SpeciesChampions,
    /// Clones only the population's all-time champion.
    PopulationChampion,
    /// Clones no genomes.
    NoGenomes,
}

/// A snapshot of a population.
#[derive(Clone, Debug)]
pub struct Log<G> {
    pub generation_number: usize,
    pub generation_sample: GenerationMemberRecord<G>,
    pub stagnation: usize,
    pub all_time_best: Option<f32>,
    pub species: Vec<SpeciesRecord>,
    pub genome_stats: Vec<(String, Stats)>,
}

impl<G> fmt::Display for Log<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Log {{\n\
            \tgeneration_number: {:?}\n\
            \tspecies_count: {:?}\n\
            \tstagnation: {:?}\n\
            \tall_time_best: {:?}\n\
            {}}}",
            &self.generation_number,
            &self.species.len(),
            &self.stagnation,
            &self.all_time_best,
            self.genome_stats
                .iter()
                .map(|(name, stats)| format!("\t{}: {:?}\n", name, stats))
                .collect::<Vec<_>>()
                .join("")
        )
    }
}

/// Per-species bookkeeping at the time of a snapshot.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpeciesRecord {
    pub id: SpeciesID,
    pub size: usize,
    pub average_fitness: f32,
    pub all_time_best: Option<f32>,
    pub time_stagnated: usize,
}

/// A struct for reporting basic statistical data.
#[derive(Clone, Debug, PartialEq)]
pub struct Stats {
    pub maximum: f32,
    pub minimum: f32,
    pub mean: f32,
    pub median: f32,
}

impl Stats {
    /// Returns statistics about numbers in a sequence,
    /// or `None` if it is empty.
    ///
    /// # Examples
    /// ```
    /// use neatpop::logging::Stats;
    ///
    /// let stats = Stats::from([-2.0, -1.0, 0.5, 1.0, 1.5].iter().copied()).unwrap();
    /// assert_eq!(stats.maximum, 1.5);
    /// assert_eq!(stats.minimum, -2.0);
    /// assert_eq!(stats.mean, 0.0);
    /// assert_eq!(stats.median, 0.5);
    ///
    /// assert!(Stats::from(std::iter::empty()).is_none());
    /// ```
    pub fn from(data: impl Iterator<Item = f32>) -> Option<Stats> {
        let mut data: Vec<f32> = data.collect();
        if data.is_empty() {
            return None;
        }
        data.sort_by(f32::total_cmp);
        let mid = data.len() / 2;
        let median = if data.len() % 2 == 0 {
            (data[mid - 1] + data[mid]) / 2.0
        } else {
            data[mid]
        };
        Some(Stats {
            maximum: data[data.len() - 1],
            minimum: data[0],
            mean: data.iter().sum::<f32>() / data.len() as f32,
            median,
        })
    }
}

/// A reporting-level dependant store
/// of genomes from a population.
#[derive(Clone, Debug)]
pub enum GenerationMemberRecord<G> {
    /// Species IDs, genomes and stagnation level.
    Species(Vec<(SpeciesID, Vec<G>, usize)>),
    /// Only species IDs, species champions, and stagnation level.
    SpeciesChampions(Vec<(SpeciesID, G, usize)>),
    /// Only the population's all-time champion.
    PopulationChampion(Option<G>),
    /// Empty.
    None,
}

/// A log of the evolution of a population over time.
#[derive(Clone, Debug)]
pub struct EvolutionLogger<G> {
    reporting_level: ReportingLevel,
    logs: Vec<Log<G>>,
}

impl<G: Genome + Clone> EvolutionLogger<G> {
    /// Returns a logger with the appropriate reporting level.
    ///
    /// # Examples
    /// ```
    /// # use neatpop_nn::genomics::NNGenome as G;
    /// use neatpop::logging::{EvolutionLogger, ReportingLevel};
    ///
    /// // With `G` a suitable type implementing `Genome`...
    /// let logger = EvolutionLogger::<G>::new(ReportingLevel::NoGenomes);
    /// ```
    pub fn new(reporting_level: ReportingLevel) -> EvolutionLogger<G> {
        EvolutionLogger {
            reporting_level,
            logs: vec![],
        }
    }

    /// Store a snapshot of a population.
    ///
    /// The `genome_stat_extractor` provides a way of
    /// obtaining arbitrary statistics on the members,
    /// where each statistic is named by `stat_names`.
    ///
    /// # Examples
    /// ```
    /// # use neatpop_nn::genomics::{GeneticConfig, NNGenome as G};
    /// use neatpop::{Genome, Population, PopulationConfig};
    /// use neatpop::logging::{EvolutionLogger, ReportingLevel};
    ///
    /// // With `G` a suitable type implementing `Genome`...
    /// let mut logger = EvolutionLogger::<G>::new(ReportingLevel::NoGenomes);
    /// # let genetic_config = GeneticConfig::zero();
    /// let mut population = Population::<_, _, G>::new(PopulationConfig::zero(), genetic_config);
    ///
    /// // Do something with the population...
    /// # population.evaluate_fitness(|_| 1.0).unwrap();
    /// // Then log a snapshot.
    /// logger.log(&population, &|g| [g.fitness().unwrap_or(0.0)], ["fitness"]);
    /// assert_eq!(logger.iter().count(), 1);
    /// ```
    pub fn log<C, H, GSE, const N: usize>(
        &mut self,
        population: &Population<C, H, G>,
        genome_stat_extractor: &GSE,
        stat_names: [&str; N],
    ) where
        H: InnovationHistory<Config = C>,
        G: Genome<InnovationHistory = H, Config = C>,
        GSE: Fn(&G) -> [f32; N],
    {
        let stats: Vec<[f32; N]> = population
            .members()
            .iter()
            .map(genome_stat_extractor)
            .collect();
        let genome_stats = stat_names
            .iter()
            .cloned()
            .map(String::from)
            .zip(unzip_n_vecs(stats.into_iter()))
            .filter_map(|(name, data)| Some((name, Stats::from(data.into_iter())?)))
            .collect();
        self.logs.push(Log {
            generation_number: population.generation(),
            generation_sample: match self.reporting_level {
                ReportingLevel::AllGenomes => GenerationMemberRecord::Species(
                    population
                        .species()
                        .map(|s| (s.id(), s.members().cloned().collect(), s.time_stagnated()))
                        .collect(),
                ),
                ReportingLevel::SpeciesChampions => GenerationMemberRecord::SpeciesChampions(
                    population
                        .species()
                        .filter_map(|s| Some((s.id(), s.best()?.clone(), s.time_stagnated())))
                        .collect(),
                ),
                ReportingLevel::PopulationChampion => GenerationMemberRecord::PopulationChampion(
                    population.all_time_best().map(|c| c.genome.clone()),
                ),
                ReportingLevel::NoGenomes => GenerationMemberRecord::None,
            },
            stagnation: population.stagnation(),
            all_time_best: population.all_time_best().map(|c| c.fitness),
            species: population
                .species()
                .map(|s| SpeciesRecord {
                    id: s.id(),
                    size: s.len(),
                    average_fitness: s.average_fitness(),
                    all_time_best: s.all_time_best(),
                    time_stagnated: s.time_stagnated(),
                })
                .collect(),
            genome_stats,
        })
    }

    /// Iterate over all logged snapshots.
    ///
    /// # Examples
    /// ```
    /// # use neatpop_nn::genomics::NNGenome as G;
    /// use neatpop::logging::{EvolutionLogger, ReportingLevel};
    ///
    /// // With `G` a suitable type implementing `Genome`...
    /// let logger = EvolutionLogger::<G>::new(ReportingLevel::AllGenomes);
    /// // Log some stuff... then
    /// for log in logger.iter() {
    ///     println!("{}", log);
    /// }
    /// ```
    pub fn iter(&self) -> impl Iterator<Item = &Log<G>> {
        self.logs.iter()
    }

    /// Returns the most recent snapshot.
    pub fn last(&self) -> Option<&Log<G>> {
        self.logs.last()
    }
}

fn unzip_n_vecs<T: Clone, const N: usize>(iter: impl Iterator<Item = [T; N]>) -> Vec<Vec<T>> {
    let mut vecs = vec![Vec::default(); N];
    for items in iter {
        for (vec, item) in vecs.iter_mut().zip(items) {
            vec.push(item);
        }
    }
    vecs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::populations::test_genome::{ScalarGenome, ScalarHistory};
    use crate::PopulationConfig;

    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use std::num::NonZeroUsize;

    #[test]
    fn even_median_averages_middle_values() {
        let stats = Stats::from([4.0, 1.0, 3.0, 2.0].into_iter()).unwrap();
        assert_eq!(stats.median, 2.5);
        assert_eq!(stats.mean, 2.5);
    }

    #[test]
    fn logs_population_snapshot() {
        let mut rng = StdRng::seed_from_u64(0);
        let config = PopulationConfig {
            size: NonZeroUsize::new(8).unwrap(),
            ..PopulationConfig::default()
        };
        let mut population =
            Population::<(), ScalarHistory, ScalarGenome>::new_with_rng(config, (), &mut rng);
        population.evaluate_fitness(|g| g.value() + 2.0).unwrap();
        population.evolve_with_rng(&mut rng).unwrap();

        let mut logger = EvolutionLogger::new(ReportingLevel::SpeciesChampions);
        logger.log(
            &population,
            &|g: &ScalarGenome| [g.connection_count() as f32, g.value()],
            ["connections", "value"],
        );
        let log = logger.last().unwrap();
        assert_eq!(log.generation_number, 1);
        assert_eq!(log.genome_stats.len(), 2);
        assert_eq!(log.species.len(), population.species().count());
        assert_eq!(log.all_time_best, population.all_time_best().map(|c| c.fitness));
        match &log.generation_sample {
            GenerationMemberRecord::SpeciesChampions(champions) => {
                assert_eq!(champions.len(), population.species().count())
            }
            other => panic!("unexpected record {:?}", other),
        }
    }
}
