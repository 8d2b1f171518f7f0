//! Property-based tests for neatpop
//!
//! Uses proptest to verify invariants of the generational loop.

use neatpop::evaluation::{Cost, Evaluator, Sample};
use neatpop::logging::Stats;
use neatpop::{
    ConfigurationError, Genome, MutationConfig, Population, PopulationConfig, Selection,
};
use neatpop_nn::genomics::{GeneticConfig, History, NNGenome};

use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

use std::num::NonZeroUsize;

type NNPopulation = Population<GeneticConfig, History, NNGenome>;

fn genetic_config() -> GeneticConfig {
    GeneticConfig {
        input_count: NonZeroUsize::new(2).unwrap(),
        initial_expression_chance: 1.0,
        weight_bound: 2.0,
        max_gene_addition_mutation_attempts: 10,
        excess_gene_factor: 1.0,
        disjoint_gene_factor: 1.0,
        common_weight_factor: 0.4,
        ..GeneticConfig::zero()
    }
}

fn dataset() -> Vec<Sample> {
    vec![
        Sample::new(vec![0.0, 1.0], vec![1.0]),
        Sample::new(vec![1.0, 0.0], vec![0.0]),
    ]
}

fn population(config: PopulationConfig, rng: &mut StdRng) -> NNPopulation {
    NNPopulation::new_with_rng(config, genetic_config(), rng)
        .with_evaluator(Evaluator::new(dataset()).with_cost(Cost::Mae))
}

fn pool(fitnesses: &[f32], rng: &mut StdRng) -> Vec<NNGenome> {
    fitnesses
        .iter()
        .map(|fitness| {
            let mut genome = NNGenome::new(&genetic_config(), rng);
            genome.set_fitness(*fitness);
            genome
        })
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    // ==================== Generational Loop ====================

    #[test]
    fn population_size_is_preserved(
        size in 1usize..30,
        distance_threshold in 0.05f32..4.0,
        survival_threshold in 0.0f32..=1.0,
        seed in any::<u64>()
    ) {
        let config = PopulationConfig {
            size: NonZeroUsize::new(size).unwrap(),
            distance_threshold,
            survival_threshold,
            mutation: MutationConfig {
                node_addition_chance: 0.2,
                connection_addition_chance: 0.3,
                ..MutationConfig::default()
            },
            ..PopulationConfig::default()
        };
        let mut rng = StdRng::seed_from_u64(seed);
        let mut population = population(config, &mut rng);
        for _ in 0..4 {
            let members = population.evolve_with_rng(&mut rng).unwrap();
            prop_assert_eq!(members.len(), size);
        }
    }

    #[test]
    fn all_time_best_is_monotonic(size in 2usize..20, seed in any::<u64>()) {
        let config = PopulationConfig {
            size: NonZeroUsize::new(size).unwrap(),
            ..PopulationConfig::default()
        };
        let mut rng = StdRng::seed_from_u64(seed);
        let mut population = population(config, &mut rng);
        let mut previous = f32::NEG_INFINITY;
        for _ in 0..6 {
            population.evolve_with_rng(&mut rng).unwrap();
            let best = population.all_time_best().unwrap().fitness;
            prop_assert!(best >= previous);
            prop_assert!(population.stagnation() < population.generation());
            previous = best;
        }
    }

    #[test]
    fn species_partition_survivors(size in 1usize..30, seed in any::<u64>()) {
        let config = PopulationConfig {
            size: NonZeroUsize::new(size).unwrap(),
            distance_threshold: 0.5,
            ..PopulationConfig::default()
        };
        let mut rng = StdRng::seed_from_u64(seed);
        let mut population = population(config, &mut rng);
        for _ in 0..3 {
            population.evolve_with_rng(&mut rng).unwrap();
            let survivors: usize = population.species().map(|s| s.len()).sum();
            prop_assert!(survivors >= 1 && survivors <= size);
            for species in population.species() {
                prop_assert!(!species.is_empty());
                prop_assert_eq!(species.shared_fitness().len(), species.len());
            }
        }
    }

    // ==================== Configuration ====================

    #[test]
    fn out_of_range_probabilities_are_rejected(
        value in prop_oneof![-10.0f32..-0.001, 1.001f32..10.0]
    ) {
        let config = PopulationConfig {
            sexual_reproduction_chance: value,
            ..PopulationConfig::default()
        };
        prop_assert_eq!(
            config.validate(),
            Err(ConfigurationError::ProbabilityOutOfRange {
                name: "sexual_reproduction_chance",
                value,
            })
        );
    }

    #[test]
    fn in_range_probabilities_are_accepted(
        survival in 0.0f32..=1.0,
        sexual in 0.0f32..=1.0,
        node in 0.0f32..=1.0,
        connection in 0.0f32..=1.0
    ) {
        let config = PopulationConfig {
            survival_threshold: survival,
            sexual_reproduction_chance: sexual,
            mutation: MutationConfig {
                node_addition_chance: node,
                connection_addition_chance: connection,
                ..MutationConfig::default()
            },
            ..PopulationConfig::default()
        };
        prop_assert_eq!(config.validate(), Ok(()));
    }

    // ==================== Selection ====================

    #[test]
    fn selection_picks_from_the_pool(
        fitnesses in prop::collection::vec(-10.0f32..10.0, 1..12),
        power in 0.5f32..6.0,
        tournament_size in 1usize..6,
        probability in 0.0f32..=1.0,
        seed in any::<u64>()
    ) {
        let mut rng = StdRng::seed_from_u64(seed);
        let pool = pool(&fitnesses, &mut rng);
        let schemes = [
            Selection::FitnessProportionate,
            Selection::Power { power },
            Selection::Tournament { size: tournament_size, probability },
        ];
        for scheme in schemes {
            let parent = scheme.select(&pool, &mut rng).unwrap();
            prop_assert!(pool.iter().any(|g| std::ptr::eq(g, parent)));
        }
    }

    // ==================== Statistics ====================

    #[test]
    fn stats_are_ordered(data in prop::collection::vec(-100.0f32..100.0, 1..50)) {
        let stats = Stats::from(data.iter().copied()).unwrap();
        prop_assert!(stats.minimum <= stats.median && stats.median <= stats.maximum);
        prop_assert!(stats.mean >= stats.minimum - 1e-2);
        prop_assert!(stats.mean <= stats.maximum + 1e-2);
    }
}
