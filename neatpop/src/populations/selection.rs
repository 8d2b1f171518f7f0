use super::errors::ConfigurationError;
use super::score;
use crate::Genome;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Parent selection schemes over a species' breeding pool.
///
/// Pools are expected to be sorted by descending fitness.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum Selection {
    /// Roulette wheel over fitness, shifted so that
    /// the least fit genome has weight 0.
    FitnessProportionate,
    /// Picks index `floor(r^power × len)`, favouring
    /// the front of the pool as `power` grows.
    Power { power: f32 },
    /// Samples `size` genomes and picks the i-th best
    /// with probability `probability × (1 - probability)^i`.
    Tournament { size: usize, probability: f32 },
}

impl Default for Selection {
    fn default() -> Selection {
        Selection::FitnessProportionate
    }
}

impl Selection {
    /// Picks a genome from `pool`. Returns `None` iff the pool is empty.
    ///
    /// # Examples
    /// ```
    /// # use neatpop_nn::genomics::{GeneticConfig, NNGenome};
    /// use neatpop::{Genome, Selection};
    ///
    /// let mut rng = rand::thread_rng();
    /// # let pool: Vec<NNGenome> = (0..4).map(|_| NNGenome::new(&GeneticConfig::zero(), &mut rng)).collect();
    /// // With `pool` a non-empty slice of genomes...
    /// let parent = Selection::Power { power: 4.0 }.select(&pool, &mut rng);
    /// assert!(parent.is_some());
    /// ```
    pub fn select<'a, G, R>(&self, pool: &'a [G], rng: &mut R) -> Option<&'a G>
    where
        G: Genome,
        R: Rng + ?Sized,
    {
        if pool.is_empty() {
            return None;
        }
        match *self {
            Selection::FitnessProportionate => Self::roulette(pool, rng),
            Selection::Power { power } => {
                let index = (rng.gen::<f32>().powf(power) * pool.len() as f32).floor() as usize;
                pool.get(index.min(pool.len() - 1))
            }
            Selection::Tournament { size, probability } => {
                Self::tournament(pool, size, probability, rng)
            }
        }
    }

    fn roulette<'a, G, R>(pool: &'a [G], rng: &mut R) -> Option<&'a G>
    where
        G: Genome,
        R: Rng + ?Sized,
    {
        let minimum = pool.iter().map(score).fold(f32::INFINITY, f32::min);
        let shift = if minimum < 0.0 { -minimum } else { 0.0 };
        let total: f32 = pool.iter().map(|g| score(g) + shift).sum();
        if !(total > 0.0) || !total.is_finite() {
            return pool.choose(rng);
        }
        let mut target = rng.gen::<f32>() * total;
        for genome in pool {
            target -= score(genome) + shift;
            if target < 0.0 {
                return Some(genome);
            }
        }
        pool.last()
    }

    fn tournament<'a, G, R>(
        pool: &'a [G],
        size: usize,
        probability: f32,
        rng: &mut R,
    ) -> Option<&'a G>
    where
        G: Genome,
        R: Rng + ?Sized,
    {
        let mut entrants: Vec<&G> = (0..size.max(1))
            .filter_map(|_| pool.choose(rng))
            .collect();
        entrants.sort_by(|a, b| score(*b).total_cmp(&score(*a)));
        for (i, entrant) in entrants.iter().enumerate() {
            let chance = probability * (1.0 - probability).powi(i as i32);
            if rng.gen::<f32>() < chance {
                return Some(*entrant);
            }
        }
        entrants.last().copied()
    }

    pub(super) fn validate(&self) -> Result<(), ConfigurationError> {
        match *self {
            Selection::FitnessProportionate => Ok(()),
            Selection::Power { power } if power.is_finite() && power > 0.0 => Ok(()),
            Selection::Power { power } => Err(ConfigurationError::InvalidSelection(format!(
                "power must be positive, got {}",
                power
            ))),
            Selection::Tournament { size, .. } if size == 0 => Err(
                ConfigurationError::InvalidSelection("tournament size must be non-zero".into()),
            ),
            Selection::Tournament { probability, .. } if !(0.0..=1.0).contains(&probability) => {
                Err(ConfigurationError::InvalidSelection(format!(
                    "tournament probability must lie in [0, 1], got {}",
                    probability
                )))
            }
            Selection::Tournament { .. } => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::populations::test_genome::ScalarGenome;

    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn pool(fitnesses: &[f32]) -> Vec<ScalarGenome> {
        fitnesses
            .iter()
            .map(|f| ScalarGenome::evaluated(*f, *f))
            .collect()
    }

    #[test]
    fn empty_pool_selects_nothing() {
        let mut rng = StdRng::seed_from_u64(0);
        let empty: Vec<ScalarGenome> = vec![];
        for selection in [
            Selection::FitnessProportionate,
            Selection::Power { power: 4.0 },
            Selection::Tournament {
                size: 5,
                probability: 0.5,
            },
        ] {
            assert!(selection.select(&empty, &mut rng).is_none());
        }
    }

    #[test]
    fn roulette_never_picks_zero_weight() {
        let mut rng = StdRng::seed_from_u64(1);
        let pool = pool(&[3.0, 1.0, 0.0]);
        for _ in 0..500 {
            let picked = Selection::FitnessProportionate
                .select(&pool, &mut rng)
                .unwrap();
            assert_ne!(picked.fitness(), Some(0.0));
        }
    }

    #[test]
    fn roulette_handles_all_zero_fitness() {
        let mut rng = StdRng::seed_from_u64(2);
        let pool = pool(&[0.0, 0.0]);
        assert!(Selection::FitnessProportionate
            .select(&pool, &mut rng)
            .is_some());
    }

    #[test]
    fn power_favours_the_front() {
        let mut rng = StdRng::seed_from_u64(3);
        let pool = pool(&[4.0, 3.0, 2.0, 1.0]);
        let front = (0..1000)
            .filter(|_| {
                Selection::Power { power: 4.0 }
                    .select(&pool, &mut rng)
                    .unwrap()
                    .fitness()
                    == Some(4.0)
            })
            .count();
        assert!(front > 400, "front picked {} times", front);
    }

    #[test]
    fn certain_tournament_picks_best_entrant() {
        let mut rng = StdRng::seed_from_u64(4);
        let pool = pool(&[1.0]);
        let picked = Selection::Tournament {
            size: 3,
            probability: 1.0,
        }
        .select(&pool, &mut rng)
        .unwrap();
        assert_eq!(picked.fitness(), Some(1.0));
    }

    #[test]
    fn rejects_empty_tournament() {
        assert!(Selection::Tournament {
            size: 0,
            probability: 0.5
        }
        .validate()
        .is_err());
    }
}
