use super::config::MutationConfig;
use crate::{Genome, Mutation, MutationError};

use rand::Rng;

/// Applies the composite NEAT mutation to `genome`.
///
/// A single draw `r` decides every event: a node is added if
/// `r` falls under the node addition chance, a connection if it
/// falls under the connection addition chance, and every weight
/// is perturbed if it falls under the weight mutation chance.
/// The chances are nested, so a low draw fires all three.
///
/// Structural mutations that are disallowed, would break a
/// structural limit, or don't fit the genome are skipped.
pub(super) fn apply<G, R>(
    genome: &mut G,
    config: &MutationConfig,
    history: &mut G::InnovationHistory,
    genetic_config: &G::Config,
    rng: &mut R,
) where
    G: Genome,
    R: Rng + ?Sized,
{
    let r = rng.gen::<f32>();
    if r < config.node_addition_chance {
        structural(genome, Mutation::AddNode, config, history, genetic_config, rng);
    }
    if r < config.connection_addition_chance {
        structural(
            genome,
            Mutation::AddConnection,
            config,
            history,
            genetic_config,
            rng,
        );
    }
    if r < config.weight_mutation_chance {
        perturb_weights(genome, config, rng);
    }
}

fn structural<G, R>(
    genome: &mut G,
    mutation: Mutation,
    config: &MutationConfig,
    history: &mut G::InnovationHistory,
    genetic_config: &G::Config,
    rng: &mut R,
) where
    G: Genome,
    R: Rng + ?Sized,
{
    let outcome = if config.allowed.contains(&mutation) {
        config
            .limits
            .permits(genome, mutation)
            .and_then(|()| genome.mutate(mutation, history, genetic_config, rng))
    } else {
        Err(MutationError::Disallowed(mutation))
    };
    if let Err(e) = outcome {
        tracing::trace!(error = %e, "skipped mutation");
    }
}

/// Nudges each weight by at most the nudge power, or
/// resets it to a uniform value within the weight bound.
fn perturb_weights<G, R>(genome: &mut G, config: &MutationConfig, rng: &mut R)
where
    G: Genome,
    R: Rng + ?Sized,
{
    let bound = config.weight_bound;
    let power = config.weight_nudge_power;
    genome.map_weights(|w| {
        if rng.gen::<f32>() < config.weight_nudge_chance {
            (w + rng.gen_range(-power..=power)).clamp(-bound, bound)
        } else {
            rng.gen_range(-bound..=bound)
        }
    });
}
