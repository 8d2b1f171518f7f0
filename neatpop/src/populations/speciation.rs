use super::errors::InvariantError;
use super::species::{Species, SpeciesID};
use crate::Genome;

/// Partitions `members` into `species`.
///
/// Every species' membership is rebuilt from scratch. Genomes are
/// expected in descending fitness order, and each one joins the
/// first species whose representative it is compatible with.
/// Genomes compatible with no species found a new one, appended
/// to the end of the list and identified by `generation`.
///
/// Returns the number of species created.
pub(super) fn speciate<G: Genome + Clone>(
    members: &[G],
    species: &mut Vec<Species<G>>,
    distance_threshold: f32,
    generation: usize,
    config: &G::Config,
) -> usize {
    species.iter_mut().for_each(Species::clear_members);
    let mut born = species.iter().filter(|s| s.id().0 == generation).count();
    let mut created = 0;

    for genome in members {
        match species
            .iter_mut()
            .find(|s| s.is_compatible(genome, distance_threshold, config))
        {
            Some(target) => {
                if target.is_empty() {
                    target.record_leader(genome);
                }
                target.add_member(genome.clone());
            }
            None => {
                species.push(Species::new(SpeciesID(generation, born), genome.clone()));
                born += 1;
                created += 1;
            }
        }
    }

    created
}

/// Keeps only the two species with the best current-generation
/// fitness, in their original order. Ties go to the species
/// earlier in the list.
///
/// Fails if fewer than two species have members.
pub(super) fn narrow_to_top_two<G: Genome + Clone>(
    species: &mut Vec<Species<G>>,
) -> Result<(), InvariantError> {
    species.retain(|s| !s.is_empty());
    if species.len() < 2 {
        return Err(InvariantError::InsufficientSpecies {
            required: 2,
            available: species.len(),
        });
    }
    let ranking = rank(species);
    let (first, second) = (ranking[0], ranking[1]);
    let mut index = 0;
    species.retain(|_| {
        let keep = index == first || index == second;
        index += 1;
        keep
    });
    Ok(())
}

/// Returns species indices ordered by descending current-generation
/// best fitness. The sort is stable, so ties keep list order.
pub(super) fn rank<G: Genome + Clone>(species: &[Species<G>]) -> Vec<usize> {
    let best = |i: usize| species[i].best_fitness().unwrap_or(f32::NEG_INFINITY);
    let mut ranking: Vec<usize> = (0..species.len()).collect();
    ranking.sort_by(|a, b| best(*b).total_cmp(&best(*a)));
    ranking
}
